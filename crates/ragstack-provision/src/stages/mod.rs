//! The four provisioning stages, in deployment order.

mod api;
mod knowledge_base;
mod layer;
mod vector_store;

pub use api::ApiStage;
pub use knowledge_base::KnowledgeBaseStage;
pub use layer::LayerStage;
pub use vector_store::VectorStoreStage;
