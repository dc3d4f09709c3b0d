//! Descriptor templates
//!
//! A template turns one set of input properties into a [`Descriptor`]: the
//! Pub/Sub topic and subscription logs are exported to, the sink feeding
//! them, the poller identity, and optionally a bundle of scheduled
//! functions.
//!
//! # Architecture
//!
//! - [`params`] - Validates and defaults the raw properties
//! - [`base`] - Topic, subscription, sink and poller records
//! - [`extensions`] - Feature-gated function, scheduler and role records
//! - [`outputs`] - Output bindings
//!
//! # Example
//!
//! ```ignore
//! use crate::template::{generate_config, Environment, Template};
//!
//! let properties = serde_json::json!({"project_id": "p1", "region": "us-west2"});
//! let descriptor = generate_config(
//!     Template::Basic,
//!     properties.as_object().unwrap(),
//!     &Environment::default(),
//! )?;
//! println!("{}", descriptor.to_yaml()?);
//! ```

mod base;
mod extensions;
mod outputs;
pub mod params;

pub use params::{Environment, ExtensionParams, Parameters, Properties};

use crate::error::Result;
use crate::gcp::types;
use crate::resource::Descriptor;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Template variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    /// Single project: topic, sink and poller only
    Basic,
    /// Single project plus the registry extension functions
    Extensions,
    /// Project, folder or organization scope plus the collection function
    Scoped,
}

impl Template {
    pub(crate) fn names(self) -> &'static RecordNames {
        match self {
            Template::Basic | Template::Extensions => &PROJECT_NAMES,
            Template::Scoped => &SCOPED_NAMES,
        }
    }
}

/// How a list of role bindings is named
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RoleNaming {
    /// `<base>-<index>`, in the order given
    Positional,
    /// `<base>-<role key>`, suffixed with `-<n>` when two roles share a key
    RoleKeyed,
}

impl RoleNaming {
    /// One record name per role, unique within the list
    pub(crate) fn names(self, base: &str, roles: &[String]) -> Vec<String> {
        match self {
            RoleNaming::Positional => (0..roles.len())
                .map(|index| format!("{}-{}", base, index))
                .collect(),
            RoleNaming::RoleKeyed => types::unique_role_keys(roles)
                .into_iter()
                .map(|key| format!("{}-{}", base, key))
                .collect(),
        }
    }
}

/// Record names used by a template variant. Per-item names are built as
/// `<prefix>-<suffix>`.
#[derive(Debug)]
pub(crate) struct RecordNames {
    pub topic: &'static str,
    pub subscription: &'static str,
    pub sink: &'static str,
    pub sink_publisher: &'static str,
    pub poller: &'static str,
    pub poller_binding: &'static str,
    pub poller_naming: RoleNaming,
    /// Subscriber grant scoped to the subscription itself, for variants
    /// whose poller roles are bound at scope level without it
    pub poller_subscriber: Option<&'static str>,
    pub poller_key: &'static str,
    pub function_account: &'static str,
    pub function_binding: &'static str,
    pub function: &'static str,
    pub scheduler_account: &'static str,
    pub invoker: &'static str,
    pub scheduler_job: &'static str,
}

impl RecordNames {
    pub(crate) fn item(prefix: &str, suffix: &str) -> String {
        format!("{}-{}", prefix, suffix)
    }
}

static PROJECT_NAMES: RecordNames = RecordNames {
    topic: "google_pubsub_topic-this",
    subscription: "google_pubsub_subscription-this",
    sink: "google_logging_project_sink-this",
    sink_publisher: "google_pubsub_topic_iam_member-sink_pubsub",
    poller: "google_service_account-poller",
    poller_binding: "google_project_iam_member-poller",
    poller_naming: RoleNaming::Positional,
    poller_subscriber: None,
    poller_key: "google_service_account_key-poller",
    function_account: "google_service_account-function",
    function_binding: "google_project_iam_member-function",
    function: "google_cloudfunctions_function",
    scheduler_account: "google_service_account-scheduler",
    invoker: "google_cloudfunctions_function_iam_member-invoker",
    scheduler_job: "google_cloud_scheduler_job",
};

static SCOPED_NAMES: RecordNames = RecordNames {
    topic: "pubsub-topic",
    subscription: "pubsub-subscription",
    sink: "logging-sink",
    sink_publisher: "sink-topic-publisher",
    poller: "poller-service-account",
    poller_binding: "poller-role",
    poller_naming: RoleNaming::RoleKeyed,
    poller_subscriber: Some("poller-subscription-subscriber"),
    poller_key: "poller-key",
    function_account: "function-service-account",
    function_binding: "function-role",
    function: "cloud-function",
    scheduler_account: "scheduler-service-account",
    invoker: "scheduler-invoker",
    scheduler_job: "scheduler-job",
};

/// Validate the properties and build the descriptor for a template
pub fn generate_config(
    template: Template,
    properties: &Properties,
    env: &Environment,
) -> Result<Descriptor> {
    let params = Parameters::from_properties(template, properties, env)?;
    Ok(build(&params))
}

/// Build the descriptor for an already validated parameter set
pub fn build(params: &Parameters) -> Descriptor {
    let names = params.template.names();

    let mut resources = base::assemble(params, names);
    let base_count = resources.len();

    if let Some(ext) = &params.extensions {
        resources.extend(extensions::assemble(params, ext, names));
    }

    let descriptor = Descriptor {
        resources,
        outputs: outputs::assemble(params, names),
    };

    let dangling = descriptor.dangling_references();
    for reference in &dangling {
        tracing::warn!(
            "{} references {} before it is declared",
            reference.from,
            reference.to
        );
    }
    let duplicates = descriptor.duplicate_names();
    for name in &duplicates {
        tracing::warn!("Record name {} is declared more than once", name);
    }
    debug_assert!(
        dangling.is_empty(),
        "records referenced before they are declared: {:?}",
        dangling
    );
    debug_assert!(
        duplicates.is_empty(),
        "record names declared more than once: {:?}",
        duplicates
    );

    tracing::info!(
        "Built {:?} descriptor for {}: {} base + {} extension resources, {} outputs",
        params.template,
        params.name,
        base_count,
        descriptor.resources.len() - base_count,
        descriptor.outputs.len()
    );

    descriptor
}
