//! End-to-end tests for the application request pipeline
//!
//! # Test Coverage
//!
//! - Filter ordering (global before endpoint-bound) and request aborts
//! - Unknown handlers, handler errors, parameter errors, panics
//! - Suspended requests resolved later, cancelled, or abandoned
//! - Managed-async dispatch on the coroutine pool
//! - Writer interceptors observing post-processed markers and types
//! - Typed handlers and coroutine channel handlers

mod common;

use std::convert::TryFrom;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use brrtinvoker::application::{Application, ApplicationBuilder, BuildError, REQUEST_ID_HEADER};
use brrtinvoker::context::{AsyncResponse, ContainerRequest, Response};
use brrtinvoker::dispatcher::ChannelDispatcher;
use brrtinvoker::extract::{FromStrConverter, ParamSource, ValueExtractor};
use brrtinvoker::ids::RequestId;
use brrtinvoker::invoker::DispatchError;
use brrtinvoker::model::{HandlingMethod, Marker, TypeDescriptor};
use brrtinvoker::provider::{
    BindingTag, InterceptorError, Provider, ReaderInterceptor, ReaderInterceptorContext,
};
use brrtinvoker::runtime_config::RuntimeConfig;
use brrtinvoker::typed::{handling_method, Handler, TypedDispatcher, TypedHandlerRequest};
use common::endpoints::{endpoint, request, resource, respond_with};
use common::providers::{log, recording_filter, Abort, Recording, WriteRecorder};
use common::test_runtime::{capture_logs, setup_may_runtime};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;

fn runtime() -> RuntimeConfig {
    RuntimeConfig {
        stack_size: 0x40000,
        managed_workers: 2,
    }
}

fn recorder_provider(recorder: &Arc<WriteRecorder>) -> Provider {
    Provider::builder("write_recorder")
        .with_writer_interceptor(Arc::clone(recorder))
        .build()
        .unwrap()
}

#[test]
fn test_filters_run_global_first_around_the_handler() {
    setup_may_runtime();
    let _logs = capture_logs();
    let log = log();
    let secured = BindingTag::declare("Secured");
    let bound = Arc::new(Recording {
        label: "bound",
        log: Arc::clone(&log),
    });

    let handler_log = Arc::clone(&log);
    let app = ApplicationBuilder::new()
        .register(
            Provider::builder("bound")
                .bind_to(&secured)
                .with_request_filter(Arc::clone(&bound))
                .with_response_filter(bound)
                .build()
                .unwrap(),
        )
        .register(recording_filter("global", &log))
        .endpoint(
            endpoint("admin").tag(&secured).build(),
            respond_with(move |_, _| {
                handler_log.lock().push("handler".to_string());
                Ok(Some(Response::ok(json!({ "ok": true }))))
            }),
        )
        .config(runtime())
        .build()
        .unwrap();

    let written = app.handle_blocking(request("admin"), resource());

    assert_eq!(written.status, 200);
    assert_eq!(written.body_json(), Some(json!({ "ok": true })));
    assert_eq!(
        *log.lock(),
        vec![
            "request:global",
            "request:bound",
            "handler",
            "response:global",
            "response:bound"
        ]
    );
}

#[test]
fn test_aborting_filter_skips_the_handler() {
    setup_may_runtime();
    let log = log();
    let called = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&called);
    let secured = BindingTag::declare("Secured");

    let app = ApplicationBuilder::new()
        .register(recording_filter("global", &log))
        .register(
            Provider::builder("deny")
                .bind_to(&secured)
                .with_request_filter(Arc::new(Abort(401)))
                .build()
                .unwrap(),
        )
        .endpoint(
            endpoint("admin").tag(&secured).build(),
            respond_with(move |_, _| {
                flag.store(true, Ordering::SeqCst);
                Ok(None)
            }),
        )
        .config(runtime())
        .build()
        .unwrap();

    let written = app.handle_blocking(request("admin"), resource());

    assert_eq!(written.status, 401);
    assert!(!called.load(Ordering::SeqCst));
    assert_eq!(*log.lock(), vec!["request:global", "response:global"]);
}

#[test]
fn test_unknown_handler_is_not_found() {
    setup_may_runtime();
    let app = ApplicationBuilder::new().config(runtime()).build().unwrap();
    let written = app.handle_blocking(request("missing"), resource());
    assert_eq!(written.status, 404);
}

#[test]
fn test_request_id_header_is_adopted() {
    setup_may_runtime();
    let app = ApplicationBuilder::new()
        .endpoint(endpoint("ping").build(), respond_with(|_, _| Ok(None)))
        .config(runtime())
        .build()
        .unwrap();

    let id = RequestId::new().to_string();
    let written =
        app.handle_blocking(request("ping").with_header(REQUEST_ID_HEADER, id.clone()), resource());
    assert_eq!(written.status, 204);
    assert_eq!(written.request_id.to_string(), id);
    assert!(written.body.is_empty());

    let other = RequestId::new().to_string();
    let written = app
        .handle(request("ping").with_header(REQUEST_ID_HEADER, other.clone()), resource())
        .recv()
        .unwrap();
    assert_eq!(written.request_id.to_string(), other);
}

#[test]
fn test_handler_error_becomes_internal_server_error() {
    setup_may_runtime();
    let app = ApplicationBuilder::new()
        .endpoint(
            endpoint("broken").build(),
            respond_with(|_, _| Err(DispatchError::handler("broken", anyhow::anyhow!("db down")))),
        )
        .config(runtime())
        .build()
        .unwrap();

    let written = app.handle_blocking(request("broken"), resource());
    assert_eq!(written.status, 500);
    let body = written.body_json().unwrap();
    assert!(body["error"].as_str().unwrap().contains("db down"));
}

#[test]
fn test_parameter_conversion_failure_is_bad_request() {
    setup_may_runtime();
    let limit =
        ValueExtractor::<u32>::new(Arc::new(FromStrConverter::<u32>::new()), "limit", Some("20"))
            .unwrap();

    let app = ApplicationBuilder::new()
        .endpoint(
            endpoint("list").build(),
            respond_with(move |_, req| {
                let limit = limit.extract_from(req, ParamSource::Query)?;
                Ok(Some(Response::ok(json!({ "limit": limit }))))
            }),
        )
        .config(runtime())
        .build()
        .unwrap();

    let ok = app.handle_blocking(request("list"), resource());
    assert_eq!(ok.body_json(), Some(json!({ "limit": 20 })));

    let bad = app.handle_blocking(request("list").with_query_param("limit", "many"), resource());
    assert_eq!(bad.status, 400);
    let body = bad.body_json().unwrap();
    assert_eq!(body["parameter"], "limit");
}

/// Strips a `v1:` version prefix from the raw request bytes.
struct StripVersion;

impl ReaderInterceptor for StripVersion {
    fn around_read_from(
        &self,
        ctx: &mut ReaderInterceptorContext<'_>,
    ) -> Result<serde_json::Value, InterceptorError> {
        if let Some(inner) = ctx.entity().strip_prefix(b"v1:") {
            let inner = inner.to_vec();
            ctx.set_entity(inner);
        }
        ctx.proceed()
    }
}

#[derive(Debug, Deserialize, PartialEq)]
struct NewPet {
    name: String,
}

fn versioned_app(seen: &Arc<Mutex<Option<NewPet>>>) -> Application {
    let versioned = BindingTag::declare("Versioned");
    let seen = Arc::clone(seen);
    ApplicationBuilder::new()
        .register(
            Provider::builder("strip_version")
                .bind_to(&versioned)
                .with_reader_interceptor(Arc::new(StripVersion))
                .build()
                .unwrap(),
        )
        .endpoint(
            endpoint("add_pet").tag(&versioned).build(),
            respond_with(move |_, req| {
                let pet: Option<NewPet> = req.read_entity()?;
                *seen.lock() = pet;
                Ok(Some(Response::new(201)))
            }),
        )
        .config(runtime())
        .build()
        .unwrap()
}

#[test]
fn test_handler_reads_entity_through_bound_reader() {
    setup_may_runtime();
    let seen = Arc::new(Mutex::new(None));
    let app = versioned_app(&seen);

    let written = app.handle_blocking(
        request("add_pet").with_entity(r#"v1:{"name":"rex"}"#),
        resource(),
    );

    assert_eq!(written.status, 201);
    assert_eq!(
        *seen.lock(),
        Some(NewPet {
            name: "rex".to_string()
        })
    );
}

#[test]
fn test_malformed_entity_is_bad_request() {
    setup_may_runtime();
    let seen = Arc::new(Mutex::new(None));
    let app = versioned_app(&seen);

    let written = app.handle_blocking(request("add_pet").with_entity("v1:{name"), resource());

    assert_eq!(written.status, 400);
    let body = written.body_json().unwrap();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("cannot read request entity"));
    assert!(seen.lock().is_none());
}

#[test]
fn test_suspended_request_is_resolved_later() {
    setup_may_runtime();
    let parked: Arc<Mutex<Option<AsyncResponse>>> = Arc::default();
    let slot = Arc::clone(&parked);
    let recorder = Arc::new(WriteRecorder::default());

    let app = ApplicationBuilder::new()
        .register(recorder_provider(&recorder))
        .endpoint(
            endpoint("slow")
                .handling_method(
                    HandlingMethod::new("slow", TypeDescriptor::untyped())
                        .with_marker(Marker::new("Deferred")),
                )
                .suspended()
                .build(),
            respond_with(move |_, req| {
                *slot.lock() = req.async_response().cloned();
                Ok(Some(Response::ok(json!("ignored"))))
            }),
        )
        .config(runtime())
        .build()
        .unwrap();

    let rx = app.handle(request("slow"), resource());
    assert!(rx.try_recv().is_err());

    let handle = parked.lock().take().expect("handler parked its response");
    assert!(handle.is_suspended());
    assert!(handle.resume(Response::ok(json!({ "done": true }))));
    assert!(handle.is_done());
    assert!(!handle.resume(Response::ok(json!({ "again": true }))));

    let written = rx.recv().unwrap();
    assert_eq!(written.status, 200);
    assert_eq!(written.body_json(), Some(json!({ "done": true })));
    assert_eq!(*recorder.markers.lock(), vec!["Deferred".to_string()]);
}

#[test]
fn test_suspended_handler_may_resume_before_returning() {
    setup_may_runtime();
    let recorder = Arc::new(WriteRecorder::default());
    let app = ApplicationBuilder::new()
        .register(recorder_provider(&recorder))
        .endpoint(
            endpoint("eager")
                .handling_method(
                    HandlingMethod::new("eager", TypeDescriptor::untyped())
                        .with_marker(Marker::new("Eager")),
                )
                .suspended()
                .build(),
            respond_with(|_, req| {
                let handle = req.async_response().expect("async response attached");
                handle.resume(Response::ok(json!(1)));
                Ok(None)
            }),
        )
        .config(runtime())
        .build()
        .unwrap();

    let written = app.handle_blocking(request("eager"), resource());
    assert_eq!(written.status, 200);
    assert_eq!(*recorder.markers.lock(), vec!["Eager".to_string()]);
}

#[test]
fn test_cancelled_request_is_service_unavailable() {
    setup_may_runtime();
    let app = ApplicationBuilder::new()
        .endpoint(
            endpoint("cancel").suspended().build(),
            respond_with(|_, req| {
                let handle = req.async_response().expect("async response attached").clone();
                std::thread::spawn(move || {
                    handle.cancel();
                });
                Ok(None)
            }),
        )
        .config(runtime())
        .build()
        .unwrap();

    let written = app.handle_blocking(request("cancel"), resource());
    assert_eq!(written.status, 503);
}

#[test]
fn test_abandoned_suspended_request_fails() {
    setup_may_runtime();
    let app = ApplicationBuilder::new()
        .endpoint(endpoint("lost").suspended().build(), respond_with(|_, _| Ok(None)))
        .config(runtime())
        .build()
        .unwrap();

    let id = RequestId::new().to_string();
    let written =
        app.handle_blocking(request("lost").with_header(REQUEST_ID_HEADER, id.clone()), resource());
    assert_eq!(written.status, 500);
    assert_eq!(written.request_id.to_string(), id);
}

#[test]
fn test_managed_async_runs_on_the_pool() {
    setup_may_runtime();
    let recorder = Arc::new(WriteRecorder::default());
    let app = ApplicationBuilder::new()
        .register(recorder_provider(&recorder))
        .endpoint(
            endpoint("report")
                .handling_method(
                    HandlingMethod::new("report", TypeDescriptor::untyped())
                        .with_marker(Marker::new("Managed")),
                )
                .managed_async()
                .build(),
            respond_with(|_, _| Ok(Some(Response::ok(json!({ "rows": 3 }))))),
        )
        .config(runtime())
        .build()
        .unwrap();

    let written = app.handle_blocking(request("report"), resource());

    assert_eq!(written.status, 200);
    assert_eq!(written.body_json(), Some(json!({ "rows": 3 })));
    assert_eq!(*recorder.markers.lock(), vec!["Managed".to_string()]);
    assert_eq!(app.managed_pool().metrics().submitted_count(), 1);
}

#[test]
fn test_managed_async_panic_is_internal_server_error() {
    setup_may_runtime();
    let app = ApplicationBuilder::new()
        .endpoint(
            endpoint("explode").managed_async().build(),
            respond_with(|_, _| panic!("managed handler exploded")),
        )
        .config(runtime())
        .build()
        .unwrap();

    let written = app.handle_blocking(request("explode"), resource());
    assert_eq!(written.status, 500);
}

#[test]
fn test_managed_endpoint_requires_workers() {
    let err = ApplicationBuilder::new()
        .endpoint(endpoint("report").managed_async().build(), respond_with(|_, _| Ok(None)))
        .config(RuntimeConfig {
            stack_size: 0x10000,
            managed_workers: 0,
        })
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        BuildError::NoManagedWorkers {
            handler: "report".to_string()
        }
    );
}

#[derive(Debug, Serialize)]
struct Pet {
    id: u64,
    name: String,
}

struct PetQuery {
    id: u64,
}

impl TryFrom<ContainerRequest> for PetQuery {
    type Error = anyhow::Error;

    fn try_from(req: ContainerRequest) -> anyhow::Result<Self> {
        let id = req
            .get_path_param("id")
            .ok_or_else(|| anyhow::anyhow!("missing id"))?
            .parse()?;
        Ok(PetQuery { id })
    }
}

struct FindPets;

impl Handler for FindPets {
    type Request = PetQuery;
    type Response = Vec<Pet>;

    fn handle(&self, req: TypedHandlerRequest<PetQuery>) -> anyhow::Result<Vec<Pet>> {
        Ok(vec![Pet {
            id: req.data.id,
            name: "rex".to_string(),
        }])
    }
}

fn typed_app(recorder: &Arc<WriteRecorder>) -> Application {
    ApplicationBuilder::new()
        .register(recorder_provider(recorder))
        .endpoint(
            endpoint("find_pets")
                .handling_method(
                    handling_method::<FindPets>("find_pets").with_marker(Marker::new("Cacheable")),
                )
                .build(),
            TypedDispatcher::new(FindPets),
        )
        .config(runtime())
        .build()
        .unwrap()
}

#[test]
fn test_writer_sees_recovered_type_and_markers() {
    setup_may_runtime();
    let recorder = Arc::new(WriteRecorder::default());
    let app = typed_app(&recorder);

    let written = app.handle_blocking(request("find_pets").with_path_param("id", "7"), resource());

    assert_eq!(written.status, 200);
    assert_eq!(written.body_json(), Some(json!([{ "id": 7, "name": "rex" }])));
    assert_eq!(*recorder.markers.lock(), vec!["Cacheable".to_string()]);
    assert_eq!(
        recorder.entity_type.lock().clone(),
        Some(TypeDescriptor::of::<Vec<Pet>>())
    );
}

#[test]
fn test_typed_conversion_failure_is_bad_request() {
    setup_may_runtime();
    let recorder = Arc::new(WriteRecorder::default());
    let app = typed_app(&recorder);

    let written =
        app.handle_blocking(request("find_pets").with_path_param("id", "seven"), resource());
    assert_eq!(written.status, 400);
    let body = written.body_json().unwrap();
    assert_eq!(body["error"], "Invalid request data");
    assert!(body["message"].as_str().unwrap().contains("invalid digit"));

    // the error body is not a handler result: no declared type, no handler markers
    assert!(recorder.markers.lock().is_empty());
    assert_eq!(
        recorder.entity_type.lock().clone(),
        Some(TypeDescriptor::untyped())
    );
}

#[test]
fn test_channel_dispatcher_end_to_end() {
    setup_may_runtime();
    let dispatcher = ChannelDispatcher::spawn("echo", &runtime(), |_, req| {
        Ok(Some(Response::ok(json!({ "path": req.path }))))
    })
    .unwrap();

    let app = ApplicationBuilder::new()
        .endpoint(endpoint("echo").build(), dispatcher)
        .config(runtime())
        .build()
        .unwrap();

    let written = app.handle_blocking(request("echo"), resource());
    assert_eq!(written.body_json(), Some(json!({ "path": "/echo" })));
    assert_eq!(app.handler_names(), vec!["echo"]);
}
