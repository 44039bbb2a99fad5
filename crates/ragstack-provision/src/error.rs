//! Error taxonomy for provisioning.
//!
//! Configuration errors are fatal and fail the deploy immediately.
//! Stage errors stop the run at the failing stage (fail-fast); already
//! completed stages are left untouched — rollback belongs to the
//! platform's transactional update mechanism, not to us.

use ragstack_cloud::CloudError;
use ragstack_registry::{ParamKey, RegistryError};
use thiserror::Error;

use crate::orchestrator::StageOutcome;

/// Errors produced while provisioning.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// The deploy configuration is invalid. Collects every problem so
    /// the operator fixes them in one pass.
    #[error("invalid deploy configuration: {}", problems.join("; "))]
    InvalidConfig { problems: Vec<String> },

    /// Could not read the configuration file.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Could not parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A stage was run before one of its dependencies published its keys.
    #[error("stage '{stage}' cannot run: dependency '{dependency}' has not completed ({source})")]
    DependencyNotSatisfied {
        stage: &'static str,
        dependency: &'static str,
        #[source]
        source: RegistryError,
    },

    /// A stage finished without publishing a key it declares.
    #[error("stage '{stage}' did not publish its declared key '{key}'")]
    MissingDeclaredOutput { stage: &'static str, key: ParamKey },

    /// A stage failed and the run stopped. Later stages never ran; the
    /// outcomes of the stages that completed first are carried here so
    /// a partial deploy is still reportable.
    #[error("stage '{stage}' failed: {source}")]
    Halted {
        stage: &'static str,
        completed: Vec<StageOutcome>,
        #[source]
        source: Box<ProvisionError>,
    },

    /// Registry failure outside the dependency check.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Control-plane failure inside a stage.
    #[error("control plane error: {0}")]
    Cloud(#[from] CloudError),
}

/// Result type for provisioning operations.
pub type Result<T> = std::result::Result<T, ProvisionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_lists_all_problems() {
        let err = ProvisionError::InvalidConfig {
            problems: vec![
                "project name is empty".to_string(),
                "account_id is empty".to_string(),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("project name is empty"));
        assert!(msg.contains("account_id is empty"));
    }

    #[test]
    fn test_dependency_error_names_both_stages() {
        let err = ProvisionError::DependencyNotSatisfied {
            stage: "api",
            dependency: "knowledge_base",
            source: RegistryError::not_found(ParamKey::KnowledgebaseId),
        };
        let msg = err.to_string();
        assert!(msg.contains("api"));
        assert!(msg.contains("knowledge_base"));
    }
}
