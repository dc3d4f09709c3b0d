//! Property-based tests using proptest
//!
//! These tests verify input validation, determinism and reference ordering
//! of generated descriptors using randomized properties.

use gcp_collection::{generate_config, Descriptor, Environment, InvalidInput, Properties, Template};
use proptest::prelude::*;
use serde_json::{json, Value};

const ROLES: &[&str] = &[
    "roles/browser",
    "roles/monitoring.viewer",
    "roles/cloudasset.viewer",
    "roles/compute.viewer",
    "roles/iam.serviceAccountViewer",
    "roles/logging.viewer",
];

fn env() -> Environment {
    Environment {
        deployment: Some("deployment".to_string()),
        project: Some("host-project".to_string()),
    }
}

fn object(value: Value) -> Properties {
    value.as_object().cloned().unwrap_or_default()
}

fn generate(template: Template, value: Value) -> Result<Descriptor, InvalidInput> {
    generate_config(template, &object(value), &env())
}

/// Generate a valid collection name
fn arb_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,19}"
}

/// Generate a valid `<collection>/<id>` scope
fn arb_scope() -> impl Strategy<Value = String> {
    (
        prop_oneof!["projects", "folders", "organizations"],
        "[a-z0-9-]{1,20}",
    )
        .prop_map(|(collection, id)| format!("{}/{}", collection, id))
}

/// Generate a role list, possibly with duplicates
fn arb_roles() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop::sample::select(ROLES), 0..8)
        .prop_map(|roles| roles.into_iter().map(String::from).collect())
}

/// Generate custom role ids that often differ only in case or punctuation
fn arb_custom_roles() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[lL][oO][gG][._]?[rR]", 1..10).prop_map(|ids| {
        ids.into_iter()
            .map(|id| format!("organizations/1/roles/{}", id))
            .collect()
    })
}

fn arb_labels() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-z]{1,8}", "[a-z0-9]{0,8}", 0..4)
        .prop_map(|labels| json!(labels))
}

/// Generate scoped template properties
fn arb_scoped_properties() -> impl Strategy<Value = Value> {
    (
        arb_name(),
        arb_scope(),
        arb_roles(),
        arb_roles(),
        arb_labels(),
        any::<bool>(),
    )
        .prop_map(|(name, resource, poller_roles, function_roles, labels, enabled)| {
            json!({
                "name": name,
                "resource": resource,
                "poller_roles": poller_roles,
                "function_roles": function_roles,
                "labels": labels,
                "enable_function": enabled,
            })
        })
}

/// Generate single-project template properties
fn arb_project_properties() -> impl Strategy<Value = Value> {
    (
        arb_name(),
        "[a-z][a-z0-9-]{5,20}",
        "[a-z]+-[a-z]+[0-9]",
        arb_labels(),
        any::<bool>(),
    )
        .prop_map(|(name, project_id, region, labels, enabled)| {
            json!({
                "name": name,
                "project_id": project_id,
                "region": region,
                "labels": labels,
                "enable_extensions": enabled,
            })
        })
}

fn arb_template() -> impl Strategy<Value = Template> {
    prop_oneof![
        Just(Template::Basic),
        Just(Template::Extensions),
        Just(Template::Scoped),
    ]
}

proptest! {
    /// Names longer than 20 characters are always rejected
    #[test]
    fn long_names_rejected(
        template in arb_template(),
        name in "[a-z]{21,40}"
    ) {
        let result = generate(template, json!({
            "name": name,
            "project_id": "p1",
            "region": "us-west2",
            "resource": "projects/p1",
        }));
        let is_name_too_long = matches!(result, Err(InvalidInput::NameTooLong { .. }));
        prop_assert!(is_name_too_long);
    }

    /// Resources without exactly one separator are rejected
    #[test]
    fn malformed_scope_separator_rejected(
        resource in prop_oneof!["[a-z0-9]{1,12}", "[a-z]{1,8}/[a-z0-9]{1,8}/[a-z0-9]{1,8}"]
    ) {
        let result = generate(Template::Scoped, json!({"resource": resource}));
        let is_invalid_scope = matches!(result, Err(InvalidInput::InvalidScope(_)));
        prop_assert!(is_invalid_scope);
    }

    /// Resources with an unknown scope type are rejected
    #[test]
    fn unknown_scope_type_rejected(
        collection in "[a-z]{1,14}",
        id in "[0-9]{1,8}"
    ) {
        prop_assume!(!["projects", "folders", "organizations"].contains(&collection.as_str()));
        let result = generate(
            Template::Scoped,
            json!({"resource": format!("{}/{}", collection, id)}),
        );
        let is_invalid_scope = matches!(result, Err(InvalidInput::InvalidScope(_)));
        prop_assert!(is_invalid_scope);
    }

    /// Generating twice from the same input gives identical output
    #[test]
    fn scoped_generation_is_deterministic(properties in arb_scoped_properties()) {
        let first = generate(Template::Scoped, properties.clone()).unwrap().to_yaml().unwrap();
        let second = generate(Template::Scoped, properties).unwrap().to_yaml().unwrap();
        prop_assert_eq!(first, second);
    }

    /// Role order given by the caller does not change the output
    #[test]
    fn role_order_does_not_matter(
        properties in arb_scoped_properties(),
        roles in arb_roles()
    ) {
        let mut forward = properties.clone();
        forward["poller_roles"] = json!(roles);
        let mut reversed = properties;
        let mut reversed_roles = roles.clone();
        reversed_roles.reverse();
        reversed["poller_roles"] = json!(reversed_roles);

        let a = generate(Template::Scoped, forward).unwrap();
        let b = generate(Template::Scoped, reversed).unwrap();
        prop_assert_eq!(a, b);
    }

    /// Every reference points at an earlier record and names are unique
    #[test]
    fn references_point_backwards(properties in arb_scoped_properties()) {
        let descriptor = generate(Template::Scoped, properties).unwrap();
        prop_assert!(descriptor.dangling_references().is_empty());
        prop_assert!(descriptor.duplicate_names().is_empty());
    }

    /// Same for the single-project templates
    #[test]
    fn project_references_point_backwards(
        template in prop_oneof![Just(Template::Basic), Just(Template::Extensions)],
        properties in arb_project_properties()
    ) {
        let descriptor = generate(template, properties).unwrap();
        prop_assert!(descriptor.dangling_references().is_empty());
        prop_assert!(descriptor.duplicate_names().is_empty());
    }

    /// Every distinct role gets its own binding, even when role keys collide
    #[test]
    fn distinct_roles_are_all_bound(roles in arb_custom_roles()) {
        let descriptor = generate(Template::Scoped, json!({
            "resource": "organizations/1",
            "enable_function": false,
            "poller_roles": roles,
        })).unwrap();

        let mut expected = roles.clone();
        expected.sort();
        expected.dedup();

        let mut bound: Vec<String> = descriptor
            .resources
            .iter()
            .filter(|r| r.name.starts_with("poller-role-"))
            .filter_map(|r| r.properties["role"].as_str().map(String::from))
            .collect();
        bound.sort();

        prop_assert_eq!(bound, expected);
        prop_assert!(descriptor.duplicate_names().is_empty());
    }

    /// The function gate adds exactly the bundle and nothing else
    #[test]
    fn function_gate_adds_exact_bundle(properties in arb_scoped_properties()) {
        let mut on = properties.clone();
        on["enable_function"] = json!(true);
        let mut off = properties;
        off["enable_function"] = json!(false);

        let with = generate(Template::Scoped, on.clone()).unwrap();
        let without = generate(Template::Scoped, off).unwrap();

        let mut function_roles: Vec<String> = on["function_roles"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|r| r.as_str().map(String::from))
            .collect();
        function_roles.sort();
        function_roles.dedup();

        // executor + roles + function + scheduler account + invoker + job
        let bundle = 2 + function_roles.len() + 3;
        prop_assert_eq!(with.resources.len(), without.resources.len() + bundle);
        prop_assert_eq!(&with.resources[..without.resources.len()], &without.resources[..]);
    }
}
