//! Base records
//!
//! Topic, subscription, log sink and poller identity. Emitted in a fixed
//! order, every reference pointing at a record declared above it.

use super::params::Parameters;
use super::{RecordNames, Template};
use crate::gcp::types;
use crate::resource::{reference, Resource};
use serde_json::{json, Map, Value};

const SINK_DESCRIPTION: &str = "Export logs to the Observe PubSub topic";
const POLLER_DESCRIPTION: &str = "A service account for the Observe Pub/Sub and Logging pollers";

pub(super) fn assemble(params: &Parameters, names: &RecordNames) -> Vec<Resource> {
    let mut resources = vec![
        topic(params, names),
        subscription(params, names),
        sink(params, names),
        sink_publisher(params, names),
        poller_account(params, names),
    ];

    let member = format!("serviceAccount:{}", reference(names.poller, "email"));
    let binding_names = names
        .poller_naming
        .names(names.poller_binding, &params.poller_roles);
    for (name, role) in binding_names.into_iter().zip(&params.poller_roles) {
        resources.push(Resource::new(
            name,
            params.scope.binding_type(),
            json!({
                "resource": params.scope.binding_resource(),
                "role": role,
                "member": member,
            }),
        ));
    }

    if let Some(name) = names.poller_subscriber {
        resources.push(Resource::new(
            name,
            types::PUBSUB_SUBSCRIPTION_IAM_MEMBER,
            json!({
                "resource": reference(names.subscription, "name"),
                "role": types::ROLE_PUBSUB_SUBSCRIBER,
                "member": member,
            }),
        ));
    }

    resources.push(Resource::new(
        names.poller_key,
        types::SERVICE_ACCOUNT_KEY,
        json!({
            "name": "poller",
            "parent": reference(names.poller, "name"),
        }),
    ));

    for resource in &resources {
        tracing::debug!("Assembled {} ({})", resource.name, resource.typ);
    }

    resources
}

fn topic(params: &Parameters, names: &RecordNames) -> Resource {
    let mut properties = json!({
        "topic": params.name,
        "labels": params.labels,
    });

    // The single-project templates pin message storage to the deployment region
    if params.template != Template::Scoped {
        properties["messageStoragePolicy"] = json!({
            "allowedPersistenceRegions": [params.region],
        });
    }

    Resource::new(names.topic, types::PUBSUB_TOPIC, properties)
}

fn subscription(params: &Parameters, names: &RecordNames) -> Resource {
    Resource::new(
        names.subscription,
        types::PUBSUB_SUBSCRIPTION,
        json!({
            "subscription": params.name,
            "labels": params.labels,
            "topic": reference(names.topic, "name"),
            "ackDeadlineSeconds": params.ack_deadline_seconds,
            "messageRetentionDuration": params.message_retention_duration,
            "retryPolicy": {
                "minimumBackoff": params.minimum_backoff,
                "maximumBackoff": params.maximum_backoff,
            },
        }),
    )
}

fn sink(params: &Parameters, names: &RecordNames) -> Resource {
    let mut properties = Map::new();
    match params.template {
        Template::Basic | Template::Extensions => {
            properties.insert("parent".to_string(), json!(params.project_id));
        }
        Template::Scoped => {
            properties.insert(
                params.scope.kind.singular().to_string(),
                json!(params.scope.id),
            );
        }
    }

    let common = json!({
        "name": params.name,
        "sink": params.name,
        "destination": format!("pubsub.googleapis.com/{}", reference(names.topic, "name")),
        "uniqueWriterIdentity": true,
        "filter": params.logging_filter,
        "description": SINK_DESCRIPTION,
        "exclusions": params.logging_exclusions,
    });
    if let Value::Object(common) = common {
        properties.extend(common);
    }

    Resource::new(names.sink, params.scope.sink_type(), Value::Object(properties))
}

/// The sink's writer identity publishes into the topic's project
fn sink_publisher(params: &Parameters, names: &RecordNames) -> Resource {
    Resource::new(
        names.sink_publisher,
        types::PROJECT_IAM_MEMBER,
        json!({
            "resource": params.project_id,
            "role": types::ROLE_PUBSUB_PUBLISHER,
            "member": reference(names.sink, "writerIdentity"),
        }),
    )
}

fn poller_account(params: &Parameters, names: &RecordNames) -> Resource {
    Resource::new(
        names.poller,
        types::SERVICE_ACCOUNT,
        json!({
            "accountId": format!("{}-poll", params.name),
            "description": POLLER_DESCRIPTION,
        }),
    )
}
