//! Function bundle records
//!
//! Executor identity and its scope roles, one Cloud Function per enabled
//! function, and the Cloud Scheduler identity and jobs that call them.

use super::params::{ExtensionParams, Parameters};
use super::{RecordNames, RoleNaming};
use crate::gcp::types;
use crate::resource::registry::FunctionDef;
use crate::resource::{reference, Resource};
use serde_json::{json, Map, Value};

/// Runtime of the packaged function source
const FUNCTION_RUNTIME: &str = "python310";
const SCHEDULE_TIME_ZONE: &str = "UTC";

pub(super) fn assemble(
    params: &Parameters,
    ext: &ExtensionParams,
    names: &RecordNames,
) -> Vec<Resource> {
    let mut resources = Vec::new();

    resources.push(Resource::new(
        names.function_account,
        types::SERVICE_ACCOUNT,
        json!({
            "accountId": format!("{}-func", params.name),
            "description": "A service account for the Observe collection functions",
        }),
    ));

    let executor = format!("serviceAccount:{}", reference(names.function_account, "email"));
    let roles = ext.roles();
    let binding_names = RoleNaming::RoleKeyed.names(names.function_binding, &roles);
    for (name, role) in binding_names.into_iter().zip(&roles) {
        resources.push(Resource::new(
            name,
            params.scope.binding_type(),
            json!({
                "resource": params.scope.binding_resource(),
                "role": role,
                "member": executor,
            }),
        ));
    }

    for function in &ext.functions {
        resources.push(cloud_function(params, ext, names, function.key, function.def));
    }

    resources.push(Resource::new(
        names.scheduler_account,
        types::SERVICE_ACCOUNT,
        json!({
            "accountId": format!("{}-sched", params.name),
            "description": "A service account for triggering the Observe collection functions",
        }),
    ));

    let scheduler = format!("serviceAccount:{}", reference(names.scheduler_account, "email"));
    for function in &ext.functions {
        resources.push(Resource::new(
            RecordNames::item(names.invoker, function.key),
            types::CLOUD_FUNCTION_IAM_MEMBER,
            json!({
                "resource": reference(&RecordNames::item(names.function, function.key), "name"),
                "role": types::ROLE_FUNCTION_INVOKER,
                "member": scheduler,
            }),
        ));
    }

    for function in &ext.functions {
        resources.push(scheduler_job(params, ext, names, function.key, &function.def.description));
    }

    for resource in &resources {
        tracing::debug!("Assembled {} ({})", resource.name, resource.typ);
    }

    resources
}

fn cloud_function(
    params: &Parameters,
    ext: &ExtensionParams,
    names: &RecordNames,
    key: &str,
    def: &FunctionDef,
) -> Resource {
    let mut env = Map::new();
    env.insert("PARENT".to_string(), json!(params.scope.path()));
    env.insert("TOPIC_ID".to_string(), json!(reference(names.topic, "name")));
    if ext.disable_logging {
        env.insert("DISABLE_LOGGING".to_string(), json!("true"));
    }

    Resource::new(
        RecordNames::item(names.function, key),
        types::CLOUD_FUNCTION,
        json!({
            "parent": types::location_path(&params.project_id, &params.region),
            "function": format!("{}-{}", params.name, key),
            "description": def.description,
            "sourceArchiveUrl": types::storage_object_url(&ext.bucket, &ext.object),
            "entryPoint": def.entry_point,
            "runtime": FUNCTION_RUNTIME,
            "availableMemoryMb": ext.available_memory_mb,
            "timeout": format!("{}s", ext.timeout_seconds),
            "maxInstances": ext.max_instances,
            "serviceAccountEmail": reference(names.function_account, "email"),
            "labels": params.labels,
            "environmentVariables": Value::Object(env),
            "httpsTrigger": {
                "securityLevel": "SECURE_ALWAYS",
            },
            "ingressSettings": "ALLOW_ALL",
        }),
    )
}

fn scheduler_job(
    params: &Parameters,
    ext: &ExtensionParams,
    names: &RecordNames,
    key: &str,
    description: &str,
) -> Resource {
    let url = reference(&RecordNames::item(names.function, key), "httpsTrigger.url");
    let invoker = RecordNames::item(names.invoker, key);

    Resource::new(
        RecordNames::item(names.scheduler_job, key),
        types::SCHEDULER_JOB,
        json!({
            "parent": types::location_path(&params.project_id, &params.region),
            "name": format!("{}-{}", params.name, key),
            "description": description,
            "schedule": ext.schedule,
            "timeZone": SCHEDULE_TIME_ZONE,
            "httpTarget": {
                "uri": url,
                "httpMethod": "POST",
                "oidcToken": {
                    "serviceAccountEmail": reference(names.scheduler_account, "email"),
                    "audience": url,
                },
            },
        }),
    )
    .depends_on(&[invoker.as_str()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::params::{Environment, Properties};
    use crate::template::Template;

    fn params(template: Template, value: Value) -> Parameters {
        let properties: Properties = value.as_object().cloned().unwrap();
        let env = Environment {
            deployment: None,
            project: Some("host".to_string()),
        };
        Parameters::from_properties(template, &properties, &env).unwrap()
    }

    #[test]
    fn test_scoped_function_bundle() {
        let p = params(
            Template::Scoped,
            json!({
                "name": "obs",
                "resource": "folders/123",
                "region": "europe-west1",
                "function_roles": ["roles/browser", "roles/compute.viewer"]
            }),
        );
        let ext = p.extensions.as_ref().unwrap();
        let resources = assemble(&p, ext, Template::Scoped.names());
        let names: Vec<_> = resources.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "function-service-account",
                "function-role-browser",
                "function-role-compute-viewer",
                "cloud-function-collection",
                "scheduler-service-account",
                "scheduler-invoker-collection",
                "scheduler-job-collection",
            ]
        );

        let binding = &resources[1];
        assert_eq!(binding.typ, types::FOLDER_IAM_MEMBER);
        assert_eq!(binding.properties["resource"], "folders/123");

        let function = &resources[3];
        assert_eq!(function.properties["parent"], "projects/host/locations/europe-west1");
        assert_eq!(function.properties["function"], "obs-collection");
        assert_eq!(
            function.properties["sourceArchiveUrl"],
            "gs://observeinc/google-cloud-functions-latest.zip"
        );
        assert_eq!(function.properties["entryPoint"], "main");
        assert_eq!(function.properties["timeout"], "300s");
        assert_eq!(function.properties["environmentVariables"]["PARENT"], "folders/123");
        assert_eq!(
            function.properties["environmentVariables"]["TOPIC_ID"],
            "$(ref.pubsub-topic.name)"
        );
        assert!(function.properties["environmentVariables"]
            .get("DISABLE_LOGGING")
            .is_none());
        assert_eq!(function.properties["httpsTrigger"]["securityLevel"], "SECURE_ALWAYS");
    }

    #[test]
    fn test_scheduler_job_targets_function() {
        let p = params(
            Template::Scoped,
            json!({"resource": "projects/p1", "function_schedule": "0 * * * *"}),
        );
        let ext = p.extensions.as_ref().unwrap();
        let resources = assemble(&p, ext, Template::Scoped.names());
        let job = resources.last().unwrap();

        assert_eq!(job.typ, types::SCHEDULER_JOB);
        assert_eq!(job.properties["schedule"], "0 * * * *");
        let target = &job.properties["httpTarget"];
        assert_eq!(target["uri"], "$(ref.cloud-function-collection.httpsTrigger.url)");
        assert_eq!(
            target["oidcToken"]["serviceAccountEmail"],
            "$(ref.scheduler-service-account.email)"
        );
        assert_eq!(
            job.metadata.as_ref().unwrap()["dependsOn"],
            json!(["scheduler-invoker-collection"])
        );
    }

    #[test]
    fn test_extension_count_matches_roles_and_functions() {
        let p = params(Template::Extensions, json!({"project_id": "p1", "region": "r"}));
        let ext = p.extensions.as_ref().unwrap();
        let resources = assemble(&p, ext, Template::Extensions.names());
        assert_eq!(
            resources.len(),
            2 + ext.roles().len() + 3 * ext.functions.len()
        );
        assert!(resources
            .iter()
            .any(|r| r.name == "google_cloudfunctions_function-export-service-accounts"));
    }

    #[test]
    fn test_disable_logging_sets_env_var() {
        let p = params(
            Template::Scoped,
            json!({"resource": "projects/p1", "function_disable_logging": true}),
        );
        let ext = p.extensions.as_ref().unwrap();
        let resources = assemble(&p, ext, Template::Scoped.names());
        let function = resources
            .iter()
            .find(|r| r.typ == types::CLOUD_FUNCTION)
            .unwrap();
        assert_eq!(function.properties["environmentVariables"]["DISABLE_LOGGING"], "true");
    }
}
