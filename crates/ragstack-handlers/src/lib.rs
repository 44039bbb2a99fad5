//! Runtime handlers for the deployed chatbot backend.
//!
//! Two functions back the system once provisioned: the index handler
//! creates the vector index inside the collection (one-time, triggered
//! by the deploy), and the query handler answers questions over the
//! knowledge base through the REST API. Both read their configuration
//! from the environment the provisioning stages set, and validate all
//! of it eagerly at cold start.

pub mod env;
pub mod error;
pub mod fakes;
pub mod generation;
pub mod index;
pub mod query;
pub mod request;
pub mod vector_index;

pub use error::{HandlerError, Result};
pub use generation::{GenerationClient, HttpGeneration};
pub use index::{IndexConfig, IndexDisposition, IndexHandler};
pub use query::{QueryConfig, QueryHandler};
pub use request::{ApiRequest, ApiResponse};
pub use vector_index::{HttpVectorIndex, VectorIndexApi};
