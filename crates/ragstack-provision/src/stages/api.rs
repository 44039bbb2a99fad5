//! API stage: private network, query function and the rate-limited
//! REST API in front of it.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::json;

use ragstack_cloud::{
    FunctionSpec, PolicyStatement, QuotaSettings, RestApiSpec, RoleSpec, RouteSpec,
    SecurityGroupSpec, ThrottleSettings, UsagePlanSpec, VpcEndpointSpec, VpcPlacement, VpcSpec,
};
use ragstack_registry::{ParamKey, ParameterEntry};

use crate::stage::{ProvisionStage, StageContext, StageName};

/// Execution ceiling of the query function: minutes, to tolerate
/// model-inference latency.
const QUERY_FUNCTION_TIMEOUT_SECS: u64 = 5 * 60;

/// Creates the private network, the query function and the HTTP API.
pub struct ApiStage;

#[async_trait]
impl ProvisionStage for ApiStage {
    fn name(&self) -> StageName {
        StageName::Api
    }

    async fn build(&self, ctx: &StageContext) -> crate::error::Result<Vec<ParameterEntry>> {
        let config = &ctx.config;
        let layer_arn = ctx.registry.read(ParamKey::LambdaLayerArn).await?;
        let knowledgebase_id = ctx.registry.read(ParamKey::KnowledgebaseId).await?;
        let model_arn = config.foundation_model_arn(&config.knowledge_base.query_model_id);

        // Private network with isolated subnets only; no egress to the
        // public internet.
        let vpc = ctx
            .cloud
            .create_vpc(VpcSpec {
                name: format!("{}-vpc", config.project),
                cidr: config.vpc_cidr.clone(),
                max_azs: 2,
                subnet_cidr_mask: 28,
            })
            .await?;

        let security_group = ctx
            .cloud
            .create_security_group(SecurityGroupSpec {
                name: format!("{}-sg", config.project),
                vpc_id: vpc.id.clone(),
                description: "Allow traffic within the VPC".to_string(),
                allow_all_outbound: true,
            })
            .await?;

        // Interface endpoint the query function reaches the generation
        // service through.
        let generation_endpoint = ctx
            .cloud
            .create_vpc_endpoint(VpcEndpointSpec {
                name: format!("{}-bdvpce", config.project),
                vpc_id: vpc.id.clone(),
                service: "bedrock-agent-runtime".to_string(),
                security_group_ids: vec![security_group.id.clone()],
                private_dns_enabled: true,
            })
            .await?;

        let query_function_name = format!("{}-QueryKb", config.project);
        let query_role = ctx
            .cloud
            .create_role(RoleSpec {
                name: format!("{query_function_name}-role"),
                assumed_by: "lambda.amazonaws.com".to_string(),
                description: format!("Managed by ragstack - {query_function_name}"),
                statements: vec![
                    PolicyStatement::allow(
                        &["logs:CreateLogStream", "logs:PutLogEvents"],
                        &[&format!(
                            "arn:{}:logs:{}:{}:log-group:/aws/lambda/{}:*",
                            config.partition(),
                            config.region,
                            config.account_id,
                            query_function_name
                        )],
                    ),
                    // Generation calls are pinned to the private endpoint.
                    PolicyStatement::allow(
                        &[
                            "bedrock:RetrieveAndGenerate",
                            "bedrock:Retrieve",
                            "bedrock:InvokeModel",
                        ],
                        &["*"],
                    )
                    .with_conditions(json!({
                        "ForAllValues:StringEquals": {
                            "aws:SourceVpce": generation_endpoint.id
                        }
                    })),
                    PolicyStatement::allow(
                        &[
                            "ec2:CreateNetworkInterface",
                            "ec2:DescribeNetworkInterfaces",
                            "ec2:DeleteNetworkInterface",
                            "ec2:AssignPrivateIpAddresses",
                            "ec2:UnassignPrivateIpAddresses",
                            "ec2:DescribeSubnets",
                        ],
                        &["*"],
                    ),
                ],
            })
            .await?;

        // Environment names are the contract consumed by
        // ragstack_handlers::QueryConfig::from_env.
        let mut environment = BTreeMap::new();
        environment.insert("KNOWLEDGE_BASE_ID".to_string(), knowledgebase_id);
        environment.insert("MODEL_ARN".to_string(), model_arn);
        let query_function = ctx
            .cloud
            .create_function(FunctionSpec {
                name: query_function_name,
                description: "Lambda to query from knowledgebases".to_string(),
                handler: "bootstrap".to_string(),
                role_arn: query_role.arn,
                environment,
                timeout_secs: QUERY_FUNCTION_TIMEOUT_SECS,
                memory_mb: 128,
                layer_arns: vec![layer_arn],
                vpc: Some(VpcPlacement {
                    vpc_id: vpc.id.clone(),
                    security_group_ids: vec![security_group.id.clone()],
                }),
            })
            .await?;

        // The API itself is private: only reachable through its own
        // interface endpoint.
        let api_endpoint = ctx
            .cloud
            .create_vpc_endpoint(VpcEndpointSpec {
                name: format!("{}-apivpce", config.project),
                vpc_id: vpc.id.clone(),
                service: "execute-api".to_string(),
                security_group_ids: vec![security_group.id],
                private_dns_enabled: true,
            })
            .await?;

        let rest_api = ctx
            .cloud
            .create_rest_api(RestApiSpec {
                name: config.api_name(),
                description: "Question answering over the deployed knowledge base".to_string(),
                stage_name: config.api.stage_name.clone(),
                handler_function_arn: query_function.arn.clone(),
                vpc_endpoint_id: Some(api_endpoint.id),
                routes: vec![
                    RouteSpec {
                        path: "/question".to_string(),
                        method: "POST".to_string(),
                        api_key_required: true,
                        request_schema: Some(json!({
                            "title": "postRequestValidatorModel",
                            "type": "object",
                            "required": ["question"],
                            "properties": {
                                "question": {
                                    "type": "string",
                                    "minLength": 1,
                                    "maxLength": 500
                                }
                            }
                        })),
                    },
                    RouteSpec {
                        path: "/health".to_string(),
                        method: "GET".to_string(),
                        api_key_required: false,
                        request_schema: None,
                    },
                ],
                cors_preflight: true,
            })
            .await?;

        let usage_plan = ctx
            .cloud
            .create_usage_plan(UsagePlanSpec {
                name: format!("{}-usage-plan", config.api_name()),
                api_id: rest_api.id.clone(),
                stage_name: config.api.stage_name.clone(),
                throttle: ThrottleSettings {
                    rate_limit: config.api.throttle_rate_limit,
                    burst_limit: config.api.throttle_burst_limit,
                },
                quota: QuotaSettings {
                    limit: config.api.quota_limit,
                    period: config.api.quota_period.as_str().to_string(),
                },
                api_key_name: config.api_key_name(),
            })
            .await?;

        Ok(vec![
            ParameterEntry::new(ParamKey::VpcId, vpc.id, "VPC ID"),
            ParameterEntry::new(
                ParamKey::QueryLambdaArn,
                query_function.arn,
                "Query Lambda Arn",
            ),
            ParameterEntry::new(ParamKey::ApiGateway, rest_api.id, "API Gateway ID"),
            ParameterEntry::new(
                ParamKey::ApiUsagePlanId,
                usage_plan.id,
                "API Usage Plan ID",
            ),
        ])
    }
}
