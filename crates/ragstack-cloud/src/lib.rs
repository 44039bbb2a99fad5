//! Ragstack Cloud: control-plane client layer
//!
//! Provisioning stages never talk to managed services directly; they go
//! through the `CloudClient` trait. The HTTP implementation targets the
//! platform control plane, the in-memory fake backs tests and dry runs.
//!
//! ## Key Components
//!
//! - `CloudClient`: one upsert method per resource kind, plus the
//!   custom-resource `invoke_function` trigger
//! - `types`: resource specs and the attributes reported back
//! - `policy`: collection policy-document builders
//! - `fakes::MemoryCloud`: deterministic in-memory control plane

mod client;
mod error;
pub mod fakes;
mod http;
pub mod policy;
mod types;

pub use client::CloudClient;
pub use error::{CloudError, CloudResult};
pub use http::{ControlPlaneConfig, HttpCloudClient};
pub use types::{
    AccessPolicySpec, BucketAttrs, BucketLogging, BucketSpec, ChunkingConfig, CollectionAttrs,
    CollectionSpec, CollectionType, DataSourceAttrs, DataSourceSpec, Effect, FieldMapping,
    FunctionAttrs, FunctionSpec, KeyAttrs, KnowledgeBaseAttrs, KnowledgeBaseSpec, LayerAttrs,
    LayerSpec, PolicyAttrs, PolicyStatement, QuotaSettings, RestApiAttrs, RestApiSpec, RoleAttrs,
    RoleSpec, RouteSpec, SecurityGroupAttrs, SecurityGroupSpec, SecurityPolicySpec,
    SecurityPolicyType, ThrottleSettings, UsagePlanAttrs, UsagePlanSpec, VpcAttrs,
    VpcEndpointAttrs, VpcEndpointSpec, VpcPlacement, VpcSpec,
};
