//! Shared fixtures for the integration tests.
#![allow(dead_code)]

pub mod test_runtime {
    use std::sync::Once;

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }

    /// Route this thread's events to the libtest writer while the guard lives.
    pub fn capture_logs() -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

pub mod providers {
    use std::sync::Arc;

    use brrtinvoker::context::{ContainerRequest, ContainerResponse, Response};
    use brrtinvoker::model::TypeDescriptor;
    use brrtinvoker::provider::{
        InterceptorError, Provider, ReaderInterceptor, ReaderInterceptorContext, RequestFilter,
        ResponseFilter, WriterInterceptor, WriterInterceptorContext,
    };
    use parking_lot::Mutex;
    use serde_json::Value;

    /// Ordered record of everything the recording providers saw.
    pub type Log = Arc<Mutex<Vec<String>>>;

    pub fn log() -> Log {
        Arc::default()
    }

    /// Appends `request:<label>` / `response:<label>` to a shared log.
    pub struct Recording {
        pub label: &'static str,
        pub log: Log,
    }

    impl RequestFilter for Recording {
        fn filter(&self, _request: &mut ContainerRequest) -> Option<Response> {
            self.log.lock().push(format!("request:{}", self.label));
            None
        }
    }

    impl ResponseFilter for Recording {
        fn filter(&self, _request: &ContainerRequest, _response: &mut ContainerResponse) {
            self.log.lock().push(format!("response:{}", self.label));
        }
    }

    /// Request filter that always aborts with `status`.
    pub struct Abort(pub u16);

    impl RequestFilter for Abort {
        fn filter(&self, _request: &mut ContainerRequest) -> Option<Response> {
            Some(Response::error(self.0, "aborted by filter"))
        }
    }

    /// Interceptor that only hands over to the rest of the chain.
    pub struct Passthrough;

    impl ReaderInterceptor for Passthrough {
        fn around_read_from(
            &self,
            ctx: &mut ReaderInterceptorContext<'_>,
        ) -> Result<Value, InterceptorError> {
            ctx.proceed()
        }
    }

    impl WriterInterceptor for Passthrough {
        fn around_write_to(
            &self,
            ctx: &mut WriterInterceptorContext<'_>,
        ) -> Result<(), InterceptorError> {
            ctx.proceed()
        }
    }

    /// Writer interceptor remembering the markers and entity type it was handed.
    #[derive(Default)]
    pub struct WriteRecorder {
        pub markers: Mutex<Vec<String>>,
        pub entity_type: Mutex<Option<TypeDescriptor>>,
    }

    impl WriterInterceptor for WriteRecorder {
        fn around_write_to(
            &self,
            ctx: &mut WriterInterceptorContext<'_>,
        ) -> Result<(), InterceptorError> {
            *self.markers.lock() = ctx.markers().iter().map(|m| m.name().to_string()).collect();
            *self.entity_type.lock() = Some(ctx.entity_type().clone());
            ctx.proceed()
        }
    }

    /// Global request + response filter recording under `label`.
    pub fn recording_filter(label: &'static str, log: &Log) -> Provider {
        let recording = Arc::new(Recording {
            label,
            log: Arc::clone(log),
        });
        Provider::builder(label)
            .with_request_filter(Arc::clone(&recording))
            .with_response_filter(recording)
            .build()
            .unwrap()
    }

    pub fn writer(name: &'static str, priority: i32) -> Provider {
        Provider::writer_interceptor(name, priority, Passthrough)
    }

    pub fn reader(name: &'static str, priority: i32) -> Provider {
        Provider::reader_interceptor(name, priority, Passthrough)
    }

    pub fn names(providers: &[Provider]) -> Vec<&str> {
        providers.iter().map(Provider::name).collect()
    }
}

pub mod endpoints {
    use std::sync::Arc;

    use brrtinvoker::context::{ContainerRequest, ResourceInstance, Response};
    use brrtinvoker::invoker::{DispatchError, HandlerDispatcher};
    use brrtinvoker::model::{EndpointDescriptor, EndpointDescriptorBuilder, HandlingMethod, TypeDescriptor};
    use http::Method;

    /// Pin a closure to the dispatcher signature.
    pub fn respond_with<F>(f: F) -> F
    where
        F: Fn(&ResourceInstance, &ContainerRequest) -> Result<Option<Response>, DispatchError>
            + Send
            + Sync
            + 'static,
    {
        f
    }

    pub fn shared<F>(f: F) -> Arc<dyn HandlerDispatcher>
    where
        F: Fn(&ResourceInstance, &ContainerRequest) -> Result<Option<Response>, DispatchError>
            + Send
            + Sync
            + 'static,
    {
        Arc::new(f)
    }

    /// `GET /<name>` on `TestResource` with an untyped handling method.
    pub fn endpoint(name: &str) -> EndpointDescriptorBuilder {
        EndpointDescriptor::builder(name, "TestResource")
            .route(Method::GET, format!("/{name}"))
            .handling_method(HandlingMethod::new(name, TypeDescriptor::untyped()))
    }

    /// Sub-resource locator: no handling method.
    pub fn locator(name: &str) -> EndpointDescriptorBuilder {
        EndpointDescriptor::builder(name, "TestResource").route(Method::GET, format!("/{name}"))
    }

    pub fn resource() -> ResourceInstance {
        Arc::new(())
    }

    pub fn request(name: &str) -> ContainerRequest {
        ContainerRequest::new(Method::GET, format!("/{name}"), name)
    }
}
