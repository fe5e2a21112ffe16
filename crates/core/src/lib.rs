//! `policygate-core` — model primitives shared by the authorization engine.
//!
//! This crate knows nothing about HTTP or policies. It describes *what* can be
//! authorized against (model types, loaded instances, targets) and the lookup
//! seam used to load instances.

pub mod catalog;
pub mod error;
pub mod finder;
pub mod id;
pub mod model;

pub use catalog::ModelCatalog;
pub use error::{CoreError, CoreResult};
pub use finder::{InMemoryModelStore, ModelFinder};
pub use id::{ModelKey, PrincipalId};
pub use model::{ModelInstance, ModelType, Target};
