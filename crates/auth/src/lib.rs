//! `policygate-auth` — declarative per-action authorization.
//!
//! Controllers register their actions together with policy declarations.
//! Registration folds simple declarations into the ability map and audits
//! every action for coverage; at request time [`PolicyCheck`] resolves the
//! declared `(ability, target)` pairs and consults a [`Gate`].
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod ability;
pub mod ability_map;
pub mod controller;
pub mod declaration;
pub mod dispatcher;
pub mod error;
pub mod gate;
pub mod manifest;
pub mod principal;
pub mod report;
pub mod requirement;
pub mod resolver;
pub mod scope;

pub use ability::{Ability, Permission};
pub use ability_map::{AbilityMap, MethodSet};
pub use controller::{ActionDefinition, Capabilities, ControllerPolicies, ControllerPoliciesBuilder};
pub use declaration::{ModelSpec, Policy, RequirementOverride, REQUEST_SOURCE};
pub use dispatcher::PolicyCheck;
pub use error::{AuthzError, ManifestError, PolicyError};
pub use gate::{authorize, Gate, PolicyRegistry};
pub use manifest::Manifest;
pub use principal::Principal;
pub use report::{ActionReport, CoverageReport};
pub use requirement::{audit, classify, Coverage};
pub use resolver::{resolve, Resolution};
pub use scope::{BoundValue, RequestScope, RouteParameter};
