//! Ragstack Registry: cross-stage parameter hand-off
//!
//! Provisioning stages are independently deployable; they never pass
//! values to each other in memory. Instead each stage publishes its
//! resources' identifying attributes here and later stages read them
//! back, so a downstream stage can be redeployed on its own as long as
//! the upstream keys already exist.
//!
//! ## Key Components
//!
//! - `ParamKey`: typed enumeration of every cross-stage key
//! - `ParameterRegistry`: the publish/read trait
//! - `HttpParameterStore`: client for the managed parameter service
//! - `fakes::MemoryRegistry`: in-memory registry for tests and dry runs

mod error;
pub mod fakes;
mod http;
mod key;
mod registry;

pub use error::{RegistryError, Result};
pub use http::{HttpParameterStore, ParameterStoreConfig};
pub use key::ParamKey;
pub use registry::{ParameterEntry, ParameterRecord, ParameterRegistry};
