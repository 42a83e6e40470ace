use super::*;
use crate::services::component::ComponentError;
use crate::services::prepare::PrepareError;
use crate::state::test_helpers::dummy_component;

fn query(filter: Option<&str>, offset: usize, limit: Option<usize>) -> ComponentListQuery {
    ComponentListQuery { filter: filter.map(str::to_owned), offset, limit }
}

#[test]
fn limit_defaults_and_clamps() {
    assert_eq!(query(None, 0, None).limit(), DEFAULT_PAGE_LIMIT);
    assert_eq!(query(None, 0, Some(10)).limit(), 10);
    assert_eq!(query(None, 0, Some(0)).limit(), 1);
    assert_eq!(query(None, 0, Some(10_000)).limit(), MAX_PAGE_LIMIT);
}

#[test]
fn paginate_slices_without_reordering() {
    let rows = vec![
        dummy_component(1, 10, "issue-link"),
        dummy_component(2, 10, "issue-link"),
        dummy_component(3, 20, "issue-link"),
        dummy_component(4, 20, "issue-link"),
    ];
    let uuids: Vec<_> = rows.iter().map(|r| r.uuid).collect();

    let page = paginate(rows, &[], 1, 2);
    assert_eq!(page.total, 4);
    assert_eq!(page.offset, 1);
    assert_eq!(page.limit, 2);
    let page_uuids: Vec<_> = page.components.iter().map(|c| c.uuid).collect();
    assert_eq!(page_uuids, vec![uuids[1], uuids[2]]);
}

#[test]
fn paginate_past_the_end_is_empty_with_total_intact() {
    let rows = vec![dummy_component(1, 10, "issue-link")];
    let page = paginate(rows, &[], 5, 25);
    assert!(page.components.is_empty());
    assert_eq!(page.total, 1);
}

#[test]
fn render_flags_only_errored_components() {
    let ok = dummy_component(1, 10, "issue-link");
    let bad = dummy_component(2, 10, "alert-rule-action");
    let errors = vec![bad.uuid.to_string()];

    let page = paginate(vec![ok.clone(), bad.clone()], &errors, 0, 25);
    assert_eq!(page.components.len(), 2);
    assert!(!page.components[0].error);
    assert!(page.components[1].error);

    // The error flag rides the component, not its position: slicing to just
    // the errored component keeps the flag.
    let page = paginate(vec![ok, bad.clone()], &errors, 1, 1);
    assert_eq!(page.components[0].uuid, bad.uuid);
    assert!(page.components[0].error);
}

#[test]
fn render_carries_kind_app_and_schema() {
    let mut row = dummy_component(1, 10, "issue-link");
    row.schema = serde_json::json!({"link": {"uri": "/link"}});
    let view = render(row.clone(), &[]);
    assert_eq!(view.uuid, row.uuid);
    assert_eq!(view.kind, "issue-link");
    assert_eq!(view.app, row.app_slug);
    assert_eq!(view.schema, row.schema);

    let serialized = serde_json::to_value(&view).expect("view should serialize");
    assert_eq!(serialized["type"], "issue-link", "kind serializes as `type`");
    assert_eq!(serialized["error"], false);
}

#[test]
fn component_errors_map_to_expected_statuses() {
    assert_eq!(component_error_to_status(ComponentError::AppNotFound(1)), StatusCode::NOT_FOUND);
    assert_eq!(
        component_error_to_status(ComponentError::Database(sqlx::Error::PoolClosed)),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        component_error_to_status(ComponentError::Prepare(PrepareError::Internal("x".into()))),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
