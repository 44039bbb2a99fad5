//! ragstack - RAG chatbot backend provisioning CLI
//!
//! ## Commands
//!
//! - `deploy`: Run the four provisioning stages against the control plane
//! - `validate`: Parse and validate a deploy configuration
//! - `params`: Show the published parameters of a deployment

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;

use ragstack_cloud::fakes::MemoryCloud;
use ragstack_cloud::{CloudClient, ControlPlaneConfig, HttpCloudClient};
use ragstack_provision::telemetry::init_tracing;
use ragstack_provision::{DeployConfig, Orchestrator, StageContext, StageStatus};
use ragstack_registry::fakes::MemoryRegistry;
use ragstack_registry::{
    HttpParameterStore, ParamKey, ParameterRegistry, ParameterStoreConfig, RegistryError,
};

#[derive(Parser)]
#[command(name = "ragstack")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Provision a RAG chatbot backend", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the provisioning stages in order
    Deploy {
        /// Path to the deploy configuration
        #[arg(short, long, default_value = "ragstack.toml")]
        config: PathBuf,

        /// Base URL of the parameter service
        #[arg(long, env = "RAGSTACK_PARAM_STORE")]
        param_store: Option<String>,

        /// Base URL of the control plane
        #[arg(long, env = "RAGSTACK_CONTROL_PLANE")]
        control_plane: Option<String>,

        /// Bearer token for both services
        #[arg(long, env = "RAGSTACK_TOKEN")]
        token: Option<String>,

        /// Run against in-memory fakes instead of real services
        #[arg(long)]
        dry_run: bool,
    },

    /// Parse and validate a deploy configuration
    Validate {
        /// Path to the deploy configuration
        #[arg(short, long, default_value = "ragstack.toml")]
        config: PathBuf,
    },

    /// Show the published parameters of a deployment
    Params {
        /// Base URL of the parameter service
        #[arg(long, env = "RAGSTACK_PARAM_STORE")]
        param_store: String,

        /// Bearer token for the parameter service
        #[arg(long, env = "RAGSTACK_TOKEN")]
        token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    match cli.command {
        Commands::Deploy {
            config,
            param_store,
            control_plane,
            token,
            dry_run,
        } => {
            cmd_deploy(
                &config,
                param_store.as_deref(),
                control_plane.as_deref(),
                token.as_deref(),
                dry_run,
            )
            .await
        }
        Commands::Validate { config } => cmd_validate(&config),
        Commands::Params { param_store, token } => {
            cmd_params(&param_store, token.as_deref()).await
        }
    }
}

/// Run the provisioning stages in order.
async fn cmd_deploy(
    config_path: &PathBuf,
    param_store: Option<&str>,
    control_plane: Option<&str>,
    token: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    let config = DeployConfig::load(config_path)
        .with_context(|| format!("failed to load config from {config_path:?}"))?;

    let (registry, cloud): (Arc<dyn ParameterRegistry>, Arc<dyn CloudClient>) = if dry_run {
        println!("Dry run: deploying against in-memory fakes");
        (
            Arc::new(MemoryRegistry::new()),
            Arc::new(MemoryCloud::new(&config.region, &config.account_id)),
        )
    } else {
        let param_store =
            param_store.context("--param-store (or RAGSTACK_PARAM_STORE) is required")?;
        let control_plane =
            control_plane.context("--control-plane (or RAGSTACK_CONTROL_PLANE) is required")?;

        let mut store_config = ParameterStoreConfig::new(param_store);
        let mut plane_config = ControlPlaneConfig::new(control_plane);
        if let Some(token) = token {
            store_config = store_config.with_token(token);
            plane_config = plane_config.with_token(token);
        }
        (
            Arc::new(HttpParameterStore::new(store_config)?),
            Arc::new(HttpCloudClient::new(plane_config)?),
        )
    };

    let ctx = StageContext::new(registry.clone(), cloud, config);
    let report = Orchestrator::new(ctx)
        .run(Orchestrator::default_stages())
        .await
        .context("deploy failed")?;

    println!("Deploy {} completed in {}ms", report.deploy_id, report.duration_ms);
    for outcome in &report.outcomes {
        let marker = match outcome.status {
            StageStatus::Created => "+",
            StageStatus::Updated => "~",
        };
        println!(
            "  {} {} ({}ms)",
            marker, outcome.stage, outcome.duration_ms
        );
        for key in &outcome.published {
            let value = registry.read(*key).await?;
            println!("      {key} = {value}");
        }
    }
    println!(
        "Stages: {} created, {} updated",
        report.created_count(),
        report.updated_count()
    );

    Ok(())
}

/// Parse and validate a deploy configuration.
fn cmd_validate(config_path: &PathBuf) -> Result<()> {
    let config = DeployConfig::load(config_path)
        .with_context(|| format!("failed to load config from {config_path:?}"))?;

    println!("Configuration is valid");
    println!("  project:    {}", config.project);
    println!("  region:     {}", config.region);
    println!("  collection: {}", config.collection_name());
    println!("  index:      {}", config.index_name());
    println!("  api:        {} (stage '{}')", config.api_name(), config.api.stage_name);

    Ok(())
}

/// Show the published parameters of a deployment.
async fn cmd_params(param_store: &str, token: Option<&str>) -> Result<()> {
    let mut store_config = ParameterStoreConfig::new(param_store);
    if let Some(token) = token {
        store_config = store_config.with_token(token);
    }
    let registry = HttpParameterStore::new(store_config)?;

    for key in ParamKey::all() {
        match registry.describe(*key).await {
            Ok(record) => {
                println!("{:<18} {}  ({})", key.to_string(), record.value, record.description);
            }
            Err(RegistryError::KeyNotFound { .. }) => {
                println!("{:<18} (not published)", key.to_string());
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn test_config() -> DeployConfig {
        DeployConfig {
            account_id: "111122223333".to_string(),
            ..DeployConfig::default()
        }
    }

    async fn deploy_to_fakes() -> Arc<MemoryCloud> {
        let registry = Arc::new(MemoryRegistry::new());
        let cloud = Arc::new(MemoryCloud::new("us-east-1", "111122223333"));
        let ctx = StageContext::new(registry, cloud.clone(), test_config());
        Orchestrator::new(ctx)
            .run(Orchestrator::default_stages())
            .await
            .unwrap();
        cloud
    }

    fn env_keys(function: &Value) -> Vec<String> {
        function["environment"]
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect()
    }

    /// The environment the stages set on each function must be exactly
    /// what the handlers read at cold start.
    #[tokio::test]
    async fn test_function_env_matches_handler_contract() {
        let cloud = deploy_to_fakes().await;

        let index_function = cloud
            .resource("function", "chatbotdemo-kb-index-Lambda")
            .unwrap();
        let mut expected = vec![
            ragstack_handlers::env::COLLECTION_HOST.to_string(),
            ragstack_handlers::env::VECTOR_INDEX_NAME.to_string(),
            ragstack_handlers::env::VECTOR_FIELD_NAME.to_string(),
            ragstack_handlers::env::REGION_NAME.to_string(),
        ];
        expected.sort();
        assert_eq!(env_keys(&index_function), expected);

        let query_function = cloud.resource("function", "chatbotdemo-QueryKb").unwrap();
        let mut expected = vec![
            ragstack_handlers::env::KNOWLEDGE_BASE_ID.to_string(),
            ragstack_handlers::env::MODEL_ARN.to_string(),
        ];
        expected.sort();
        assert_eq!(env_keys(&query_function), expected);
    }

    #[tokio::test]
    async fn test_dry_run_deploy_from_config_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("ragstack.toml");
        std::fs::write(
            &config_path,
            r#"
            project = "demo"
            region = "us-east-1"
            account_id = "111122223333"
            vpc_cidr = "10.1.1.0/26"
            "#,
        )
        .unwrap();

        cmd_deploy(&config_path, None, None, None, true)
            .await
            .unwrap();
    }

    #[test]
    fn test_validate_rejects_broken_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("ragstack.toml");
        std::fs::write(
            &config_path,
            r#"
            project = "a-project-name-way-too-long"
            region = "us-east-1"
            account_id = ""
            vpc_cidr = "10.1.1.0/26"
            "#,
        )
        .unwrap();

        let err = cmd_validate(&config_path).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("exceeds 12 characters"), "unexpected error: {msg}");
        assert!(msg.contains("account_id is empty"), "unexpected error: {msg}");
    }
}
