//! Resource records
//!
//! The building blocks of a descriptor: declared resources, output bindings
//! and the `$(ref.<name>.<field>)` placeholders that tie them together.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Build a symbolic reference to a field of a declared record.
///
/// The consuming engine resolves these after generation, e.g.
/// `reference("pubsub-topic", "name")` -> `$(ref.pubsub-topic.name)`.
pub fn reference(record: &str, field: &str) -> String {
    format!("$(ref.{}.{})", record, field)
}

/// Record names referenced anywhere inside a string
pub fn referenced_records(text: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("$(ref.") {
        let after = &rest[start + "$(ref.".len()..];
        let Some(end) = after.find(')') else {
            break;
        };
        let inner = &after[..end];
        if let Some((name, _field)) = inner.split_once('.') {
            names.push(name);
        }
        rest = &after[end..];
    }

    names
}

/// One declared target resource
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    pub name: String,
    #[serde(rename = "type")]
    pub typ: String,
    pub properties: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(rename = "accessControl", skip_serializing_if = "Option::is_none")]
    pub access_control: Option<Value>,
}

impl Resource {
    pub fn new(name: impl Into<String>, typ: impl Into<String>, properties: Value) -> Self {
        Self {
            name: name.into(),
            typ: typ.into(),
            properties,
            metadata: None,
            access_control: None,
        }
    }

    /// Add explicit `dependsOn` ordering hints
    pub fn depends_on(mut self, names: &[&str]) -> Self {
        let mut metadata = match self.metadata.take() {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        metadata.insert(
            "dependsOn".to_string(),
            Value::Array(names.iter().map(|n| Value::String(n.to_string())).collect()),
        );
        self.metadata = Some(Value::Object(metadata));
        self
    }

    /// Attach an authorization policy payload.
    ///
    /// The built-in templates never set one; this is for callers adding
    /// their own records to a generated descriptor.
    pub fn with_access_control(mut self, policy: Value) -> Self {
        self.access_control = Some(policy);
        self
    }

    /// Names of every record this one refers to, through references in its
    /// properties or through `dependsOn`
    pub fn dependencies(&self) -> Vec<&str> {
        let mut deps = Vec::new();
        collect_references(&self.properties, &mut deps);
        if let Some(access_control) = &self.access_control {
            collect_references(access_control, &mut deps);
        }
        if let Some(depends_on) = self
            .metadata
            .as_ref()
            .and_then(|m| m.get("dependsOn"))
            .and_then(|v| v.as_array())
        {
            deps.extend(depends_on.iter().filter_map(|v| v.as_str()));
        }
        deps
    }
}

fn collect_references<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) => out.extend(referenced_records(s)),
        Value::Array(items) => items.iter().for_each(|v| collect_references(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_references(v, out)),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// A named value exposed by the descriptor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Output {
    pub name: String,
    pub value: Value,
}

impl Output {
    pub fn literal(name: &str, value: impl Into<Value>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
        }
    }

    pub fn reference(name: &str, record: &str, field: &str) -> Self {
        Self::literal(name, reference(record, field))
    }
}

/// A reference that does not point strictly backwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    pub from: String,
    pub to: String,
}

/// The complete generated output for one invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Descriptor {
    pub resources: Vec<Resource>,
    pub outputs: Vec<Output>,
}

impl Descriptor {
    /// Look up a record by name
    pub fn resource(&self, name: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Record names that appear more than once
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.resources
            .iter()
            .filter(|r| !seen.insert(r.name.as_str()))
            .map(|r| r.name.as_str())
            .collect()
    }

    /// References (from records or outputs) naming a record that is not
    /// declared earlier in the sequence
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        let mut declared: HashSet<&str> = HashSet::new();
        let mut dangling = Vec::new();

        for resource in &self.resources {
            for dep in resource.dependencies() {
                if !declared.contains(dep) {
                    dangling.push(DanglingReference {
                        from: resource.name.clone(),
                        to: dep.to_string(),
                    });
                }
            }
            declared.insert(resource.name.as_str());
        }

        for output in &self.outputs {
            let mut deps = Vec::new();
            collect_references(&output.value, &mut deps);
            for dep in deps {
                if !declared.contains(dep) {
                    dangling.push(DanglingReference {
                        from: format!("outputs.{}", output.name),
                        to: dep.to_string(),
                    });
                }
            }
        }

        dangling
    }

    /// Render as Deployment Manager YAML
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Render as pretty-printed JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
