//! # Typed Module
//!
//! Type-safe handlers on top of [`HandlerDispatcher`](crate::invoker::HandlerDispatcher).
//!
//! A [`Handler`] declares its request type (converted from the
//! [`ContainerRequest`](crate::context::ContainerRequest) with `TryFrom`) and its
//! response type. [`TypedDispatcher`] erases the response into JSON; registering
//! the endpoint with [`handling_method::<H>`](handling_method) keeps the declared
//! type so post-processing can restore it for the writer interceptors.
//!
//! ```rust
//! use std::convert::TryFrom;
//! use brrtinvoker::context::ContainerRequest;
//! use brrtinvoker::typed::{handling_method, Handler, TypedHandlerRequest};
//! use serde::Serialize;
//!
//! struct PetId(String);
//!
//! impl TryFrom<ContainerRequest> for PetId {
//!     type Error = anyhow::Error;
//!     fn try_from(req: ContainerRequest) -> anyhow::Result<Self> {
//!         req.get_path_param("id")
//!             .map(|id| PetId(id.to_string()))
//!             .ok_or_else(|| anyhow::anyhow!("missing id"))
//!     }
//! }
//!
//! #[derive(Serialize)]
//! struct Pet {
//!     id: String,
//! }
//!
//! struct GetPet;
//!
//! impl Handler for GetPet {
//!     type Request = PetId;
//!     type Response = Vec<Pet>;
//!
//!     fn handle(&self, req: TypedHandlerRequest<PetId>) -> anyhow::Result<Vec<Pet>> {
//!         Ok(vec![Pet { id: req.data.0 }])
//!     }
//! }
//!
//! let method = handling_method::<GetPet>("get_pet");
//! assert!(method.response_type().is_parameterized());
//! ```

mod handler;

pub use handler::{handling_method, Handler, TypedDispatcher, TypedHandlerRequest};
