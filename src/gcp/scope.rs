//! Owning scope
//!
//! The resource hierarchy node collection is attached to: a project, a
//! folder or an organization, written as `<collection>/<id>`.

use super::types;
use crate::error::{InvalidInput, Result};
use std::fmt;
use std::str::FromStr;

/// Kind of resource hierarchy node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Project,
    Folder,
    Organization,
}

impl ScopeKind {
    pub const ALL: [ScopeKind; 3] = [ScopeKind::Project, ScopeKind::Folder, ScopeKind::Organization];

    /// Collection name used in resource paths (`projects`, `folders`, ...)
    pub fn collection(self) -> &'static str {
        match self {
            ScopeKind::Project => "projects",
            ScopeKind::Folder => "folders",
            ScopeKind::Organization => "organizations",
        }
    }

    /// Singular field name used by scope-keyed API parameters
    pub fn singular(self) -> &'static str {
        match self {
            ScopeKind::Project => "project",
            ScopeKind::Folder => "folder",
            ScopeKind::Organization => "organization",
        }
    }

    fn from_collection(collection: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.collection() == collection)
    }
}

/// A parsed `<collection>/<id>` scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub kind: ScopeKind,
    pub id: String,
}

impl Scope {
    pub fn project(id: &str) -> Self {
        Self {
            kind: ScopeKind::Project,
            id: id.to_string(),
        }
    }

    /// Full resource path, e.g. `folders/123`
    pub fn path(&self) -> String {
        format!("{}/{}", self.kind.collection(), self.id)
    }

    /// Sink type for this scope
    pub fn sink_type(&self) -> String {
        types::logging_sink(self.kind.collection())
    }

    /// IAM member binding type for this scope.
    ///
    /// Folders live on the v2 Resource Manager API, projects and
    /// organizations on v1.
    pub fn binding_type(&self) -> &'static str {
        match self.kind {
            ScopeKind::Project => types::PROJECT_IAM_MEMBER,
            ScopeKind::Organization => types::ORGANIZATION_IAM_MEMBER,
            ScopeKind::Folder => types::FOLDER_IAM_MEMBER,
        }
    }

    /// Value of the `resource` property on a scope binding.
    ///
    /// The v2 folder binding takes the full path, v1 bindings the bare id.
    pub fn binding_resource(&self) -> String {
        match self.kind {
            ScopeKind::Folder => self.path(),
            ScopeKind::Project | ScopeKind::Organization => self.id.clone(),
        }
    }
}

impl FromStr for Scope {
    type Err = InvalidInput;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('/').collect();
        let [collection, id] = parts.as_slice() else {
            return Err(InvalidInput::InvalidScope(format!(
                "expected `<type>/<id>` with exactly one '/', got {:?}",
                s
            )));
        };

        let Some(kind) = ScopeKind::from_collection(collection) else {
            return Err(InvalidInput::InvalidScope(format!(
                "type must be one of projects, folders, organizations, got {:?}",
                collection
            )));
        };

        if id.is_empty() {
            return Err(InvalidInput::InvalidScope(format!(
                "id must not be empty in {:?}",
                s
            )));
        }

        Ok(Self {
            kind,
            id: id.to_string(),
        })
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}
