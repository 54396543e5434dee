//! Tests for response post-processing
//!
//! Markers declared on the handling method are merged ahead of the entity's
//! own markers, and the declared return type replaces the erased entity type
//! when it says more about the entity.

mod common;

use brrtinvoker::context::{ContainerResponse, Response};
use brrtinvoker::invoker::post_process;
use brrtinvoker::model::{HandlingMethod, Marker, TypeDescriptor};
use common::endpoints::request;
use serde_json::json;

#[derive(serde::Serialize)]
struct Pet {
    name: String,
}

fn method_with_markers(markers: &[&str]) -> HandlingMethod {
    markers.iter().fold(
        HandlingMethod::new("list_pets", TypeDescriptor::of::<Pet>()),
        |method, name| method.with_marker(Marker::new(*name)),
    )
}

fn response(raw: Response) -> ContainerResponse {
    ContainerResponse::new(&request("list_pets"), Some(raw))
}

fn marker_names(response: &ContainerResponse) -> Vec<&str> {
    response.entity_markers().iter().map(Marker::name).collect()
}

#[test]
fn test_declared_markers_adopted_when_entity_has_none() {
    let processed = post_process(
        &method_with_markers(&["A", "B"]),
        Some(response(Response::ok(json!({ "name": "rex" })))),
    )
    .unwrap();
    assert_eq!(marker_names(&processed), vec!["A", "B"]);
}

#[test]
fn test_declared_markers_go_ahead_of_entity_markers() {
    let raw = Response::ok(json!({ "name": "rex" })).with_marker(Marker::new("C"));
    let processed = post_process(&method_with_markers(&["A", "B"]), Some(response(raw))).unwrap();
    assert_eq!(marker_names(&processed), vec!["A", "B", "C"]);
}

#[test]
fn test_entity_markers_untouched_when_nothing_declared() {
    let raw = Response::ok(json!({ "name": "rex" })).with_marker(Marker::new("C"));
    let processed = post_process(&method_with_markers(&[]), Some(response(raw))).unwrap();
    assert_eq!(marker_names(&processed), vec!["C"]);
}

#[test]
fn test_marker_values_survive_the_merge() {
    let method = HandlingMethod::new("list_pets", TypeDescriptor::of::<Pet>())
        .with_marker(Marker::with_value("CacheControl", json!({ "max_age": 60 })));
    let processed = post_process(&method, Some(response(Response::ok(json!([]))))).unwrap();
    assert_eq!(
        processed.entity_markers()[0].value(),
        Some(&json!({ "max_age": 60 }))
    );
}

#[test]
fn test_declared_type_replaces_erased_entity_type() {
    let processed = post_process(
        &method_with_markers(&[]),
        Some(response(Response::ok(json!({ "name": "rex" })))),
    )
    .unwrap();
    assert_eq!(processed.entity_type(), &TypeDescriptor::of::<Pet>());
}

#[test]
fn test_parameterized_entity_type_is_kept() {
    let raw = Response::typed(200, &vec![Pet {
        name: "rex".to_string(),
    }])
    .unwrap();
    let processed = post_process(&method_with_markers(&[]), Some(response(raw))).unwrap();
    assert_eq!(processed.entity_type(), &TypeDescriptor::of::<Vec<Pet>>());
    assert!(processed.entity_type().is_parameterized());
}

#[test]
fn test_void_or_response_declarations_do_not_override() {
    for declared in [TypeDescriptor::Void, TypeDescriptor::Response] {
        let method = HandlingMethod::new("raw", declared);
        let processed = post_process(&method, Some(response(Response::ok(json!(1))))).unwrap();
        assert_eq!(processed.entity_type(), &TypeDescriptor::untyped());
    }
}

#[test]
fn test_response_without_entity_keeps_its_type() {
    let before = response(Response::no_content());
    let expected = before.entity_type().clone();
    let processed = post_process(&method_with_markers(&["A"]), Some(before)).unwrap();
    assert_eq!(processed.entity_type(), &expected);
    assert_eq!(marker_names(&processed), vec!["A"]);
}

#[test]
fn test_absent_response_passes_through() {
    assert!(post_process(&method_with_markers(&["A"]), None).is_none());
}
