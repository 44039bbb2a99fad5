//! Sequential stage orchestrator with idempotent resource publication.
//!
//! Stages run strictly serialized: every stage's side effects have
//! platform-side eventual-consistency windows (policy propagation,
//! index creation), so deploy latency is traded for correctness. On
//! failure the run stops at the failing stage; completed stages and
//! their published keys are left untouched.

use std::collections::HashSet;
use std::time::Instant;

use tracing::{error, info};
use uuid::Uuid;

use crate::error::{ProvisionError, Result};
use crate::stage::{ProvisionStage, StageContext, StageName};
use crate::stages::{ApiStage, KnowledgeBaseStage, LayerStage, VectorStoreStage};
use ragstack_registry::{ParamKey, RegistryError};

/// What happened to one stage during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageStatus {
    /// The stage's keys did not exist before; resources were created.
    Created,
    /// The stage's keys already existed; resources were updated in place.
    Updated,
}

/// Per-stage result within a deploy run.
#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub stage: StageName,
    pub status: StageStatus,
    /// Keys the stage published.
    pub published: Vec<ParamKey>,
    pub duration_ms: u64,
}

/// Result of a complete deploy run.
#[derive(Debug, Clone)]
pub struct DeployReport {
    /// Unique id of this run.
    pub deploy_id: String,
    pub outcomes: Vec<StageOutcome>,
    pub duration_ms: u64,
}

impl DeployReport {
    /// Stages that created resources for the first time.
    pub fn created_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == StageStatus::Created)
            .count()
    }

    /// Stages that updated an already-deployed environment in place.
    pub fn updated_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == StageStatus::Updated)
            .count()
    }
}

/// Deploy orchestrator.
pub struct Orchestrator {
    ctx: StageContext,
}

impl Orchestrator {
    pub fn new(ctx: StageContext) -> Self {
        Self { ctx }
    }

    /// The four stages in their declared order.
    pub fn default_stages() -> Vec<Box<dyn ProvisionStage>> {
        vec![
            Box::new(LayerStage),
            Box::new(VectorStoreStage),
            Box::new(KnowledgeBaseStage),
            Box::new(ApiStage),
        ]
    }

    /// Run the given stages in order.
    ///
    /// For each stage: verify every key of every declared dependency is
    /// readable (either published by an earlier stage of this run or by
    /// a previous deployment), execute the stage's build, publish its
    /// outputs, and check the stage honored its declared-keys contract.
    /// A stage failure stops the run immediately; the resulting
    /// [`ProvisionError::Halted`] carries the outcomes of the stages
    /// that completed before the failure.
    pub async fn run(&self, stages: Vec<Box<dyn ProvisionStage>>) -> Result<DeployReport> {
        let started = Instant::now();
        let deploy_id = Uuid::new_v4().to_string();
        info!(event = "deploy.started", deploy_id = %deploy_id, project = %self.ctx.config.project);

        let mut completed: HashSet<StageName> = HashSet::new();
        let mut outcomes = Vec::new();

        for stage in stages {
            let name = stage.name();
            match self.execute_stage(stage.as_ref(), &completed).await {
                Ok(outcome) => {
                    completed.insert(name);
                    outcomes.push(outcome);
                }
                Err(source) => {
                    error!(event = "stage.failed", stage = %name, error = %source);
                    return Err(ProvisionError::Halted {
                        stage: name.as_str(),
                        completed: outcomes,
                        source: Box::new(source),
                    });
                }
            }
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(event = "deploy.completed", deploy_id = %deploy_id, duration_ms);

        Ok(DeployReport {
            deploy_id,
            outcomes,
            duration_ms,
        })
    }

    async fn execute_stage(
        &self,
        stage: &dyn ProvisionStage,
        completed: &HashSet<StageName>,
    ) -> Result<StageOutcome> {
        let name = stage.name();
        self.check_dependencies(name, completed).await?;

        let status = if self.already_published(name).await? {
            info!(event = "stage.updating", stage = %name, "outputs already published, updating in place");
            StageStatus::Updated
        } else {
            StageStatus::Created
        };

        info!(event = "stage.started", stage = %name);
        let stage_started = Instant::now();

        let entries = stage.build(&self.ctx).await?;

        let mut published = Vec::with_capacity(entries.len());
        for entry in entries {
            published.push(entry.key);
            self.ctx.registry.publish(entry).await?;
        }

        // Contract check: the stage must publish exactly what it declares.
        for key in name.publishes() {
            if !published.contains(key) {
                return Err(ProvisionError::MissingDeclaredOutput {
                    stage: name.as_str(),
                    key: *key,
                });
            }
        }

        let duration_ms = stage_started.elapsed().as_millis() as u64;
        info!(event = "stage.completed", stage = %name, duration_ms, ?status);

        Ok(StageOutcome {
            stage: name,
            status,
            published,
            duration_ms,
        })
    }

    /// Verify every declared dependency has completed.
    ///
    /// A dependency counts as completed if it ran earlier in this run,
    /// or if all of its declared keys are already readable (deployed by
    /// a previous run). A missing key fails fast before the stage makes
    /// any control-plane call.
    async fn check_dependencies(
        &self,
        stage: StageName,
        completed: &HashSet<StageName>,
    ) -> Result<()> {
        for dependency in stage.depends_on() {
            if completed.contains(dependency) {
                continue;
            }
            for key in dependency.publishes() {
                if let Err(source) = self.ctx.registry.read(*key).await {
                    return match source {
                        RegistryError::KeyNotFound { .. } => {
                            Err(ProvisionError::DependencyNotSatisfied {
                                stage: stage.as_str(),
                                dependency: dependency.as_str(),
                                source,
                            })
                        }
                        other => Err(other.into()),
                    };
                }
            }
        }
        Ok(())
    }

    async fn already_published(&self, stage: StageName) -> Result<bool> {
        for key in stage.publishes() {
            if !self.ctx.registry.contains(*key).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
