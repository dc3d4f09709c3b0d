//! Deployment Manager type providers
//!
//! Type strings for the `gcp-types/*` providers the templates declare.
//! Schemas can be inspected with
//! `gcloud beta deployment-manager type-providers describe <provider> --project gcp-types`.

use std::collections::{BTreeSet, HashSet};

// =========================================================================
// Pub/Sub
// =========================================================================

pub const PUBSUB_TOPIC: &str = "gcp-types/pubsub-v1:projects.topics";
pub const PUBSUB_SUBSCRIPTION: &str = "gcp-types/pubsub-v1:projects.subscriptions";
pub const PUBSUB_SUBSCRIPTION_IAM_MEMBER: &str =
    "gcp-types/pubsub-v1:virtual.projects.subscriptions.iamMemberBinding";

// =========================================================================
// Logging
// =========================================================================

/// Build the sink type for a scope collection (`projects`, `folders`, ...)
pub fn logging_sink(collection: &str) -> String {
    format!("gcp-types/logging-v2:{}.sinks", collection)
}

// =========================================================================
// IAM
// =========================================================================

pub const SERVICE_ACCOUNT: &str = "gcp-types/iam-v1:projects.serviceAccounts";
pub const SERVICE_ACCOUNT_KEY: &str = "gcp-types/iam-v1:projects.serviceAccounts.keys";

// =========================================================================
// Resource Manager
// =========================================================================

pub const PROJECT_IAM_MEMBER: &str =
    "gcp-types/cloudresourcemanager-v1:virtual.projects.iamMemberBinding";
pub const ORGANIZATION_IAM_MEMBER: &str =
    "gcp-types/cloudresourcemanager-v1:virtual.organizations.iamMemberBinding";
pub const FOLDER_IAM_MEMBER: &str =
    "gcp-types/cloudresourcemanager-v2:virtual.folders.iamMemberBinding";

// =========================================================================
// Cloud Functions / Cloud Scheduler
// =========================================================================

pub const CLOUD_FUNCTION: &str = "gcp-types/cloudfunctions-v1:projects.locations.functions";
pub const CLOUD_FUNCTION_IAM_MEMBER: &str =
    "gcp-types/cloudfunctions-v1:virtual.projects.locations.functions.iamMemberBinding";
pub const SCHEDULER_JOB: &str = "gcp-types/cloudscheduler-v1:projects.locations.jobs";

// =========================================================================
// Roles
// =========================================================================

pub const ROLE_PUBSUB_PUBLISHER: &str = "roles/pubsub.publisher";
pub const ROLE_PUBSUB_SUBSCRIBER: &str = "roles/pubsub.subscriber";
pub const ROLE_FUNCTION_INVOKER: &str = "roles/cloudfunctions.invoker";

/// Build a regional location path: `projects/<project>/locations/<region>`
pub fn location_path(project: &str, region: &str) -> String {
    format!("projects/{}/locations/{}", project, region)
}

/// Build a Cloud Storage object URL
pub fn storage_object_url(bucket: &str, object: &str) -> String {
    format!("gs://{}/{}", bucket, object)
}

/// Reduce a role to a string usable inside a record name.
///
/// `roles/cloudasset.viewer` -> `cloudasset-viewer`
pub fn role_key(role: &str) -> String {
    role.strip_prefix("roles/")
        .unwrap_or(role)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

/// Deduplicate roles and order them lexically.
///
/// Only exact duplicates are removed: custom role ids are case-sensitive,
/// so `log_reader` and `LogReader` are distinct grants.
pub fn dedup_roles<I, S>(roles: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    roles
        .into_iter()
        .map(|role| role.as_ref().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// One unique name-safe key per role, in the order given.
///
/// A role whose [`role_key`] is already taken by an earlier role gets the
/// first free `-<n>` suffix (n >= 2) that no role in the list reduces to.
pub fn unique_role_keys<S: AsRef<str>>(roles: &[S]) -> Vec<String> {
    let reserved: HashSet<String> = roles.iter().map(|r| role_key(r.as_ref())).collect();
    let mut taken: HashSet<String> = HashSet::new();

    roles
        .iter()
        .map(|role| {
            let key = role_key(role.as_ref());
            let mut unique = key.clone();
            let mut n = 2;
            while taken.contains(&unique) {
                unique = format!("{}-{}", key, n);
                if reserved.contains(&unique) {
                    unique = key.clone();
                }
                n += 1;
            }
            taken.insert(unique.clone());
            unique
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_roles_sorts_and_removes_duplicates() {
        let roles = dedup_roles([
            "roles/monitoring.viewer",
            "roles/browser",
            "roles/monitoring.viewer",
        ]);
        assert_eq!(roles, vec!["roles/browser", "roles/monitoring.viewer"]);
    }

    #[test]
    fn test_dedup_roles_keeps_case_and_punctuation_variants() {
        let roles = dedup_roles([
            "organizations/1/roles/log_reader",
            "organizations/1/roles/log.reader",
            "organizations/1/roles/LogReader",
            "organizations/1/roles/logreader",
            "organizations/1/roles/log_reader",
        ]);
        assert_eq!(
            roles,
            vec![
                "organizations/1/roles/LogReader",
                "organizations/1/roles/log.reader",
                "organizations/1/roles/log_reader",
                "organizations/1/roles/logreader",
            ]
        );
    }

    #[test]
    fn test_unique_role_keys_suffixes_collisions() {
        let keys = unique_role_keys(&["roles/a.b", "roles/a_b", "roles/A-B", "roles/a-b-2"]);
        assert_eq!(keys, vec!["a-b", "a-b-3", "a-b-4", "a-b-2"]);
    }

    #[test]
    fn test_unique_role_keys_without_collisions() {
        let keys = unique_role_keys(&["roles/browser", "roles/cloudasset.viewer"]);
        assert_eq!(keys, vec!["browser", "cloudasset-viewer"]);
    }

    #[test]
    fn test_logging_sink_type() {
        assert_eq!(logging_sink("folders"), "gcp-types/logging-v2:folders.sinks");
    }

    #[test]
    fn test_location_path() {
        assert_eq!(
            location_path("p1", "us-west2"),
            "projects/p1/locations/us-west2"
        );
    }

    #[test]
    fn test_role_key_strips_prefix() {
        assert_eq!(role_key("roles/cloudasset.viewer"), "cloudasset-viewer");
        assert_eq!(role_key("roles/iam.serviceAccountViewer"), "iam-serviceaccountviewer");
        assert_eq!(role_key("organizations/1/roles/custom"), "organizations-1-roles-custom");
    }
}
