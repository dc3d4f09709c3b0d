//! Deployment Manager descriptors for GCP log and asset collection.
//!
//! Given a handful of properties, [`template::generate_config`] builds the
//! ordered resource declarations (Pub/Sub topic and subscription, log sink,
//! poller identity and its roles, optional scheduled functions) and the
//! output bindings that Deployment Manager resolves after creating them.
//!
//! Nothing here talks to GCP: a descriptor is plain data, rendered to YAML
//! or JSON for the provisioning engine.

pub mod config;
pub mod error;
pub mod gcp;
pub mod resource;
pub mod template;

pub use error::InvalidInput;
pub use resource::Descriptor;
pub use template::{generate_config, Environment, Properties, Template};
