//! Builders for the collection policy documents.
//!
//! The same data-access document is granted twice during a deploy: once
//! to the account root + index-function role (vector-store stage), once
//! to the knowledge base's execution role (knowledge-base stage), so the
//! builder lives here rather than in either stage.

use serde_json::{json, Value};

/// Encryption policy for a collection.
///
/// With `kms_key_arn = None` the platform-owned key is used; otherwise
/// the named customer key encrypts the collection.
pub fn encryption_policy_document(collection_name: &str, kms_key_arn: Option<&str>) -> Value {
    let mut document = json!({
        "Rules": [
            {
                "ResourceType": "collection",
                "Resource": [format!("collection/{collection_name}")],
            }
        ],
    });
    match kms_key_arn {
        Some(arn) => document["KmsARN"] = json!(arn),
        None => document["AWSOwnedKey"] = json!(true),
    }
    document
}

/// Network policy for a collection and its dashboard.
///
/// With `vpc_endpoint = None` the collection is reachable from the
/// public internet; otherwise only through the named private endpoint.
/// The two are mutually exclusive.
pub fn network_policy_document(collection_name: &str, vpc_endpoint: Option<&str>) -> Value {
    let mut rule = json!({
        "Rules": [
            {
                "ResourceType": "dashboard",
                "Resource": [format!("collection/{collection_name}")],
            },
            {
                "ResourceType": "collection",
                "Resource": [format!("collection/{collection_name}")],
            }
        ],
    });
    match vpc_endpoint {
        Some(endpoint) => rule["SourceVPCEs"] = json!([endpoint]),
        None => rule["AllowFromPublic"] = json!(true),
    }
    json!([rule])
}

/// Data-access policy granting exactly the index and collection
/// permissions the given principals need.
pub fn data_access_policy_document(collection_name: &str, principal_arns: &[String]) -> Value {
    json!([
        {
            "Rules": [
                {
                    "ResourceType": "index",
                    "Resource": [format!("index/{collection_name}/*")],
                    "Permission": [
                        "aoss:UpdateIndex",
                        "aoss:DescribeIndex",
                        "aoss:ReadDocument",
                        "aoss:WriteDocument",
                        "aoss:CreateIndex",
                        "aoss:DeleteIndex",
                    ],
                },
                {
                    "ResourceType": "collection",
                    "Resource": [format!("collection/{collection_name}")],
                    "Permission": [
                        "aoss:DescribeCollectionItems",
                        "aoss:CreateCollectionItems",
                        "aoss:UpdateCollectionItems",
                    ],
                }
            ],
            "Principal": principal_arns,
        }
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encryption_policy_owned_key() {
        let doc = encryption_policy_document("demo-collection", None);
        assert_eq!(doc["AWSOwnedKey"], true);
        assert!(doc.get("KmsARN").is_none());
        assert_eq!(
            doc["Rules"][0]["Resource"][0],
            "collection/demo-collection"
        );
    }

    #[test]
    fn test_encryption_policy_customer_key() {
        let doc = encryption_policy_document("demo-collection", Some("arn:aws:kms:key/1"));
        assert_eq!(doc["KmsARN"], "arn:aws:kms:key/1");
        assert!(doc.get("AWSOwnedKey").is_none());
    }

    #[test]
    fn test_network_policy_public_and_private_are_exclusive() {
        let public = network_policy_document("demo-collection", None);
        assert_eq!(public[0]["AllowFromPublic"], true);
        assert!(public[0].get("SourceVPCEs").is_none());

        let private = network_policy_document("demo-collection", Some("vpce-0abc"));
        assert_eq!(private[0]["SourceVPCEs"][0], "vpce-0abc");
        assert!(private[0].get("AllowFromPublic").is_none());
    }

    #[test]
    fn test_data_access_policy_permissions() {
        let principals = vec!["arn:aws:iam::111122223333:root".to_string()];
        let doc = data_access_policy_document("demo-collection", &principals);

        let index_rule = &doc[0]["Rules"][0];
        assert_eq!(index_rule["ResourceType"], "index");
        assert_eq!(index_rule["Resource"][0], "index/demo-collection/*");
        assert!(index_rule["Permission"]
            .as_array()
            .unwrap()
            .contains(&serde_json::json!("aoss:CreateIndex")));

        assert_eq!(doc[0]["Principal"][0], "arn:aws:iam::111122223333:root");
    }
}
