//! Resource abstraction layer
//!
//! This module provides the data model a template assembles and the
//! data-driven registry of scheduled functions it can deploy.
//!
//! # Architecture
//!
//! - [`record`] - Resource records, output bindings and symbolic references
//! - [`registry`] - Loads and caches function definitions from embedded JSON
//!
//! # Function Definitions
//!
//! Functions are defined in `src/resources/functions.json`: the collection
//! function deployed by the scope-aware template, the optional extensions
//! and the base roles every extension executor receives.
//!
//! # Example
//!
//! ```ignore
//! use crate::resource::{reference, Resource};
//!
//! let subscription = Resource::new(
//!     "pubsub-subscription",
//!     "gcp-types/pubsub-v1:projects.subscriptions",
//!     serde_json::json!({ "topic": reference("pubsub-topic", "name") }),
//! );
//! ```

pub mod record;
pub mod registry;

pub use record::{reference, DanglingReference, Descriptor, Output, Resource};
pub use registry::*;
