//! GCP naming module
//!
//! Knowledge about the Google Cloud side of a descriptor: which Deployment
//! Manager type provider backs each resource, and how the owning scope maps
//! onto sink and IAM binding types.
//!
//! # Module Structure
//!
//! - [`scope`] - `<collection>/<id>` scope parsing and per-scope types
//! - [`types`] - `gcp-types/*` type strings, roles and path helpers
//!
//! # Example
//!
//! ```ignore
//! use crate::gcp::scope::Scope;
//!
//! let scope: Scope = "folders/123".parse()?;
//! assert_eq!(scope.sink_type(), "gcp-types/logging-v2:folders.sinks");
//! ```

pub mod scope;
pub mod types;
