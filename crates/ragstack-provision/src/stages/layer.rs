//! Layer stage: the shared runtime dependency bundle.

use async_trait::async_trait;
use ragstack_cloud::LayerSpec;
use ragstack_registry::{ParamKey, ParameterEntry};

use crate::stage::{ProvisionStage, StageContext, StageName};

/// Builds the runtime bundle every handler function links against and
/// publishes its ARN.
pub struct LayerStage;

#[async_trait]
impl ProvisionStage for LayerStage {
    fn name(&self) -> StageName {
        StageName::LambdaLayer
    }

    async fn build(&self, ctx: &StageContext) -> crate::error::Result<Vec<ParameterEntry>> {
        let config = &ctx.config;
        let layer = ctx
            .cloud
            .create_layer(LayerSpec {
                name: format!("{}-lambda-layer", config.project),
                description: format!("Shared handler runtime bundle - {}", config.project),
                runtime: "provided.al2023".to_string(),
                architecture: "x86_64".to_string(),
            })
            .await?;

        Ok(vec![ParameterEntry::new(
            ParamKey::LambdaLayerArn,
            layer.arn,
            "Lambda Layer Arn",
        )])
    }
}
