//! Environment variable names the deployed functions are configured
//! with.
//!
//! These are the wire contract between the provisioning stages (which
//! set them on the functions) and the handlers (which read them at cold
//! start). Renaming one here without redeploying breaks the handlers at
//! startup, which is exactly when it should break.

/// Vector collection endpoint the index handler talks to.
pub const COLLECTION_HOST: &str = "COLLECTION_HOST";

/// Name of the vector index to create.
pub const VECTOR_INDEX_NAME: &str = "VECTOR_INDEX_NAME";

/// Name of the dense vector field inside the index.
pub const VECTOR_FIELD_NAME: &str = "VECTOR_FIELD_NAME";

/// Region the index handler signs requests for.
pub const REGION_NAME: &str = "REGION_NAME";

/// Knowledge base the query handler retrieves from.
pub const KNOWLEDGE_BASE_ID: &str = "KNOWLEDGE_BASE_ID";

/// Generation model the query handler answers with.
pub const MODEL_ARN: &str = "MODEL_ARN";
