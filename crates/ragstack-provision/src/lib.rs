//! Deployment orchestration for the RAG chatbot backend.
//!
//! A deploy is four stages run in order — lambda layer, vector store,
//! knowledge base, API — each publishing its resource identifiers into
//! the shared parameter registry for later stages and for the runtime
//! handlers. Stages talk to the control plane only through the
//! [`CloudClient`](ragstack_cloud::CloudClient) trait, so the whole
//! pipeline runs against in-memory fakes in tests.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod stage;
pub mod stages;
pub mod telemetry;

pub use config::DeployConfig;
pub use error::{ProvisionError, Result};
pub use orchestrator::{DeployReport, Orchestrator, StageOutcome, StageStatus};
pub use stage::{ProvisionStage, StageContext, StageName};
