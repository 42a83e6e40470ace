use std::time::Duration;

use super::*;
use crate::state::test_helpers::{dummy_component, dummy_installation};
use serde_json::json;

fn preparer() -> SchemaPreparer {
    SchemaPreparer::new(Duration::from_secs(1)).expect("client build should succeed")
}

#[test]
fn select_options_uri_requires_select_type_and_uri() {
    assert_eq!(
        select_options_uri(&json!({"type": "select", "uri": "/options"})),
        Some("/options".to_owned())
    );
    assert_eq!(select_options_uri(&json!({"type": "select", "label": "Project"})), None);
    assert_eq!(select_options_uri(&json!({"type": "text", "uri": "/options"})), None);
    assert_eq!(select_options_uri(&json!("not an object")), None);
}

#[test]
fn options_url_joins_base_uri_and_installation_scope() {
    let uuid = uuid::Uuid::nil();
    assert_eq!(
        options_url("https://app.test/", "/options", uuid),
        format!("https://app.test/options?installationId={uuid}")
    );
    // Existing query strings are extended, not clobbered.
    assert_eq!(
        options_url("https://app.test", "/options?team=1", uuid),
        format!("https://app.test/options?team=1&installationId={uuid}")
    );
}

#[test]
fn with_installation_param_uses_correct_separator() {
    let uuid = uuid::Uuid::nil();
    assert_eq!(
        with_installation_param("/stacktrace", uuid),
        format!("/stacktrace?installationId={uuid}")
    );
    assert_eq!(
        with_installation_param("/stacktrace?ref=abc", uuid),
        format!("/stacktrace?ref=abc&installationId={uuid}")
    );
}

#[test]
fn parse_choices_accepts_value_label_pairs() {
    let body = json!({"choices": [["1", "Backend"], ["2", "Frontend"]]});
    let choices = parse_choices(&body).expect("valid choices should parse");
    assert_eq!(choices, json!([["1", "Backend"], ["2", "Frontend"]]));
}

#[test]
fn parse_choices_rejects_missing_or_malformed_entries() {
    let missing = parse_choices(&json!({"results": []})).expect_err("missing choices must fail");
    assert!(matches!(missing, PrepareError::Api(_)));

    let malformed = parse_choices(&json!({"choices": [["only-value"]]})).expect_err("1-tuples must fail");
    assert!(matches!(malformed, PrepareError::Api(_)));

    let not_arrays = parse_choices(&json!({"choices": ["flat"]})).expect_err("non-pair entries must fail");
    assert!(matches!(not_arrays, PrepareError::Api(_)));
}

#[tokio::test]
async fn stacktrace_link_gets_installation_scoped_uri() {
    let install = dummy_installation(1, 10);
    let mut component = dummy_component(1, 10, "stacktrace-link");
    component.schema = json!({"uri": "/stacktrace"});

    preparer()
        .run(&mut component, &install)
        .await
        .expect("stacktrace-link preparation should succeed");

    assert_eq!(
        component.schema["uri"],
        json!(format!("/stacktrace?installationId={}", install.uuid))
    );
}

#[tokio::test]
async fn stacktrace_link_without_uri_is_internal_error() {
    let install = dummy_installation(1, 10);
    let mut component = dummy_component(1, 10, "stacktrace-link");
    component.schema = json!({"label": "Open in app"});

    let err = preparer()
        .run(&mut component, &install)
        .await
        .expect_err("missing uri indicates a corrupt schema");
    assert!(matches!(err, PrepareError::Internal(_)));
}

#[tokio::test]
async fn unknown_kind_is_left_untouched() {
    let install = dummy_installation(1, 10);
    let mut component = dummy_component(1, 10, "dashboard-widget");
    component.schema = json!({"anything": "goes"});
    let before = component.schema.clone();

    preparer()
        .run(&mut component, &install)
        .await
        .expect("unknown kinds are a no-op");
    assert_eq!(component.schema, before);
}

#[tokio::test]
async fn issue_link_without_remote_selects_needs_no_network() {
    let install = dummy_installation(1, 10);
    let mut component = dummy_component(1, 10, "issue-link");
    component.schema = json!({
        "link": {
            "required_fields": [
                {"type": "text", "name": "title"},
                {"type": "select", "name": "priority", "options": [["p1", "High"]]}
            ]
        },
        "create": {
            "optional_fields": [{"type": "textarea", "name": "description"}]
        }
    });
    let before = component.schema.clone();

    // No field carries a uri, so nothing is fetched or rewritten.
    preparer()
        .run(&mut component, &install)
        .await
        .expect("static schemas prepare without I/O");
    assert_eq!(component.schema, before);
}
