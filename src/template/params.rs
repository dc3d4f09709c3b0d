//! Template parameters
//!
//! Turns the untyped property mapping handed to a template into a typed,
//! defaulted [`Parameters`] value. Properties may arrive as native JSON or
//! as text (booleans as `"True"`/`"False"`, integers as decimal strings,
//! lists and mappings as JSON), so every accessor accepts both forms.

use super::Template;
use crate::error::{InvalidInput, Result};
use crate::gcp::scope::{Scope, ScopeKind};
use crate::gcp::types;
use crate::resource::registry::{self, FunctionRef};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Raw template properties
pub type Properties = Map<String, Value>;

pub const MAX_NAME_LENGTH: usize = 20;

pub const DEFAULT_NAME: &str = "observe-collection";
pub const DEFAULT_ACK_DEADLINE_SECONDS: u64 = 60;
pub const DEFAULT_MESSAGE_RETENTION_DURATION: &str = "86400s";
pub const DEFAULT_MINIMUM_BACKOFF: &str = "10s";
pub const DEFAULT_MAXIMUM_BACKOFF: &str = "600s";
pub const DEFAULT_SCOPED_REGION: &str = "us-central1";

/// Poller roles granted by the single-project templates, in binding order
pub const PROJECT_POLLER_ROLES: &[&str] = &[
    "roles/pubsub.subscriber",
    "roles/monitoring.viewer",
    "roles/cloudasset.viewer",
    "roles/browser",
];

pub const DEFAULT_POLLER_ROLES: &[&str] = &[
    "roles/monitoring.viewer",
    "roles/cloudasset.viewer",
    "roles/browser",
];

pub const DEFAULT_FUNCTION_ROLES: &[&str] = &[
    "roles/compute.viewer",
    "roles/iam.serviceAccountViewer",
    "roles/cloudscheduler.viewer",
    "roles/cloudasset.viewer",
    "roles/browser",
];

pub const DEFAULT_FUNCTION_BUCKET: &str = "observeinc";
pub const DEFAULT_FUNCTION_OBJECT: &str = "google-cloud-functions-latest.zip";
pub const DEFAULT_FUNCTION_SCHEDULE: &str = "*/5 * * * *";
pub const DEFAULT_FUNCTION_MEMORY_MB: u64 = 512;
pub const DEFAULT_FUNCTION_TIMEOUT_SECONDS: u64 = 300;
pub const DEFAULT_FUNCTION_MAX_INSTANCES: u64 = 5;

/// Deployment-specific environment values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Name of the deployment the template is expanded for
    #[serde(default)]
    pub deployment: Option<String>,
    /// Project that owns the deployment
    #[serde(default)]
    pub project: Option<String>,
}

/// Settings for the scheduled function bundle
#[derive(Debug, Clone)]
pub struct ExtensionParams {
    pub functions: Vec<FunctionRef>,
    pub base_roles: Vec<String>,
    pub bucket: String,
    pub object: String,
    pub schedule: String,
    pub available_memory_mb: u64,
    pub timeout_seconds: u64,
    pub max_instances: u64,
    pub disable_logging: bool,
}

impl ExtensionParams {
    /// Base roles plus every role an enabled function depends on,
    /// deduplicated and sorted
    pub fn roles(&self) -> Vec<String> {
        let all = self
            .base_roles
            .iter()
            .chain(self.functions.iter().flat_map(|f| f.def.roles.iter()));
        types::dedup_roles(all)
    }
}

/// Validated, defaulted configuration for one invocation
#[derive(Debug, Clone)]
pub struct Parameters {
    pub template: Template,
    pub name: String,
    pub scope: Scope,
    /// Owning project, derived from the scope or the environment
    pub project_id: String,
    pub region: String,
    pub labels: BTreeMap<String, String>,
    pub ack_deadline_seconds: u64,
    pub message_retention_duration: String,
    pub minimum_backoff: String,
    pub maximum_backoff: String,
    pub logging_filter: String,
    pub logging_exclusions: Vec<Value>,
    pub poller_roles: Vec<String>,
    pub extensions: Option<ExtensionParams>,
}

impl Parameters {
    pub fn from_properties(
        template: Template,
        properties: &Properties,
        env: &Environment,
    ) -> Result<Self> {
        let props = PropertyReader::new(properties);

        let default_name = match template {
            Template::Scoped => env.deployment.as_deref().unwrap_or(DEFAULT_NAME),
            Template::Basic | Template::Extensions => DEFAULT_NAME,
        };
        let name = props.string("name", default_name)?;
        let len = name.chars().count();
        if len > MAX_NAME_LENGTH {
            return Err(InvalidInput::NameTooLong {
                len,
                max: MAX_NAME_LENGTH,
            });
        }

        let (scope, project_id, region) = match template {
            Template::Basic | Template::Extensions => {
                let project_id = props.required_string("project_id")?;
                let region = props.required_string("region")?;
                (Scope::project(&project_id), project_id, region)
            }
            Template::Scoped => {
                let scope: Scope = props.required_string("resource")?.parse()?;
                let project_id = match scope.kind {
                    ScopeKind::Project => scope.id.clone(),
                    ScopeKind::Folder | ScopeKind::Organization => env
                        .project
                        .clone()
                        .ok_or(InvalidInput::MissingEnvironment("project"))?,
                };
                let region = props.string("region", DEFAULT_SCOPED_REGION)?;
                (scope, project_id, region)
            }
        };

        let poller_roles: Vec<String> = match template {
            Template::Basic | Template::Extensions => {
                PROJECT_POLLER_ROLES.iter().map(|r| r.to_string()).collect()
            }
            Template::Scoped => {
                let roles = props
                    .string_list("poller_roles")?
                    .unwrap_or_else(|| owned(DEFAULT_POLLER_ROLES));
                types::dedup_roles(&roles)
            }
        };

        let params = Self {
            template,
            name,
            scope,
            project_id,
            region,
            labels: props.string_map("labels")?,
            ack_deadline_seconds: props
                .integer("pubsub_ack_deadline_seconds", DEFAULT_ACK_DEADLINE_SECONDS)?,
            message_retention_duration: props.string(
                "pubsub_message_retention_duration",
                DEFAULT_MESSAGE_RETENTION_DURATION,
            )?,
            minimum_backoff: props.string("pubsub_minimum_backoff", DEFAULT_MINIMUM_BACKOFF)?,
            maximum_backoff: props.string("pubsub_maximum_backoff", DEFAULT_MAXIMUM_BACKOFF)?,
            logging_filter: props.string("logging_filter", "")?,
            logging_exclusions: props.list("logging_exclusions")?.unwrap_or_default(),
            poller_roles,
            extensions: read_extensions(template, &props)?,
        };

        tracing::debug!(
            "Parameters for {:?}: name={}, scope={}, project={}, region={}",
            template,
            params.name,
            params.scope,
            params.project_id,
            params.region
        );

        Ok(params)
    }
}

fn read_extensions(template: Template, props: &PropertyReader) -> Result<Option<ExtensionParams>> {
    let (functions, base_roles) = match template {
        Template::Basic => return Ok(None),
        Template::Extensions => {
            if !props.boolean("enable_extensions", true)? {
                return Ok(None);
            }
            let requested = props
                .string_list("extensions")?
                .unwrap_or_else(|| owned(&registry::get_all_extension_keys()));
            let functions = registry::select_extensions(requested.as_slice());
            (functions, registry::get_registry().extension_base_roles.clone())
        }
        Template::Scoped => {
            if !props.boolean("enable_function", true)? {
                return Ok(None);
            }
            let roles = props
                .string_list("function_roles")?
                .unwrap_or_else(|| owned(DEFAULT_FUNCTION_ROLES));
            (vec![registry::collection_function()], roles)
        }
    };

    if functions.is_empty() {
        tracing::warn!("Function bundle enabled but no function selected; skipping it");
        return Ok(None);
    }

    Ok(Some(ExtensionParams {
        functions,
        base_roles,
        bucket: props.string("function_bucket", DEFAULT_FUNCTION_BUCKET)?,
        object: props.string("function_object", DEFAULT_FUNCTION_OBJECT)?,
        schedule: props.string("function_schedule", DEFAULT_FUNCTION_SCHEDULE)?,
        available_memory_mb: props
            .integer("function_available_memory_mb", DEFAULT_FUNCTION_MEMORY_MB)?,
        timeout_seconds: props.integer("function_timeout", DEFAULT_FUNCTION_TIMEOUT_SECONDS)?,
        max_instances: props.integer("function_max_instances", DEFAULT_FUNCTION_MAX_INSTANCES)?,
        disable_logging: props.boolean("function_disable_logging", false)?,
    }))
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Typed, field-by-field access to raw properties
pub struct PropertyReader<'a> {
    properties: &'a Properties,
}

impl<'a> PropertyReader<'a> {
    pub fn new(properties: &'a Properties) -> Self {
        Self { properties }
    }

    /// A present, non-null property
    fn get(&self, field: &str) -> Option<&'a Value> {
        self.properties.get(field).filter(|v| !v.is_null())
    }

    pub fn optional_string(&self, field: &'static str) -> Result<Option<String>> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(InvalidInput::InvalidType {
                field,
                expected: "a string",
            }),
        }
    }

    pub fn string(&self, field: &'static str, default: &str) -> Result<String> {
        Ok(self
            .optional_string(field)?
            .unwrap_or_else(|| default.to_string()))
    }

    pub fn required_string(&self, field: &'static str) -> Result<String> {
        self.optional_string(field)?
            .ok_or(InvalidInput::MissingProperty(field))
    }

    pub fn boolean(&self, field: &'static str, default: bool) -> Result<bool> {
        match self.get(field) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(Value::String(s)) => match s.as_str() {
                "True" => Ok(true),
                "False" => Ok(false),
                _ => Err(InvalidInput::InvalidBool {
                    field,
                    value: s.clone(),
                }),
            },
            Some(other) => Err(InvalidInput::InvalidBool {
                field,
                value: other.to_string(),
            }),
        }
    }

    pub fn integer(&self, field: &'static str, default: u64) -> Result<u64> {
        let invalid = |value: String| InvalidInput::InvalidInteger { field, value };
        match self.get(field) {
            None => Ok(default),
            Some(Value::Number(n)) => n.as_u64().ok_or_else(|| invalid(n.to_string())),
            Some(Value::String(s)) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
                s.parse().map_err(|_| invalid(s.clone()))
            }
            Some(Value::String(s)) => Err(invalid(s.clone())),
            Some(other) => Err(invalid(other.to_string())),
        }
    }

    /// A container property, decoding JSON text when it arrives as a string
    fn decoded(&self, field: &'static str) -> Result<Option<Value>> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::String(text)) => serde_json::from_str(text)
                .map(Some)
                .map_err(|source| InvalidInput::Decode { field, source }),
            Some(value) => Ok(Some(value.clone())),
        }
    }

    pub fn list(&self, field: &'static str) -> Result<Option<Vec<Value>>> {
        match self.decoded(field)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items)),
            Some(_) => Err(InvalidInput::InvalidType {
                field,
                expected: "a list",
            }),
        }
    }

    pub fn string_list(&self, field: &'static str) -> Result<Option<Vec<String>>> {
        let Some(items) = self.list(field)? else {
            return Ok(None);
        };
        items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                _ => Err(InvalidInput::InvalidType {
                    field,
                    expected: "a list of strings",
                }),
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    pub fn string_map(&self, field: &'static str) -> Result<BTreeMap<String, String>> {
        let map = match self.decoded(field)? {
            None | Some(Value::Null) => return Ok(BTreeMap::new()),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(InvalidInput::InvalidType {
                    field,
                    expected: "a mapping",
                })
            }
        };
        map.into_iter()
            .map(|(k, v)| match v {
                Value::String(s) => Ok((k, s)),
                _ => Err(InvalidInput::InvalidType {
                    field,
                    expected: "a mapping of strings to strings",
                }),
            })
            .collect()
    }
}
