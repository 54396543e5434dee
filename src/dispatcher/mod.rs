//! # Dispatcher Module
//!
//! [`HandlerDispatcher`](crate::invoker::HandlerDispatcher) implementations that
//! run handlers on `may` coroutines.
//!
//! ## Architecture
//!
//! - Each [`ChannelDispatcher`] owns one handler coroutine
//! - Requests reach it over an MPSC channel together with a one-shot reply sender
//! - The invoker blocks on the reply, which parks only the calling coroutine
//! - Stack size comes from [`RuntimeConfig`](crate::runtime_config::RuntimeConfig)
//!
//! ```rust,no_run
//! use brrtinvoker::dispatcher::ChannelDispatcher;
//! use brrtinvoker::context::Response;
//! use brrtinvoker::runtime_config::RuntimeConfig;
//!
//! let dispatcher = ChannelDispatcher::spawn("get_pet", &RuntimeConfig::from_env(), |_, req| {
//!     Ok(Some(Response::ok(serde_json::json!({ "id": req.get_path_param("id") }))))
//! })
//! .unwrap();
//! ```
//!
//! ## Error Handling
//!
//! - Handler errors become [`DispatchError::Handler`](crate::invoker::DispatchError::Handler)
//! - Handler panics are caught and become `DispatchError::Panicked`
//! - A closed channel becomes `DispatchError::Unavailable`

mod channel;

pub use channel::{ChannelDispatcher, HandlerCall, HandlerReply};
