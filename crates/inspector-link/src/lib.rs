//! Inspector link boundary.
//!
//! The engine talks to the instrumented target through this crate's
//! [`InspectorLink`] trait: attach, detach, request/response commands,
//! and a broadcast stream of `(target, method, params)` event tuples.
//! The wire mechanism behind the trait is deliberately opaque; the
//! in-crate [`StubLink`] stands in for it in tests and offline replay.

pub mod commands;
pub mod errors;
pub mod events;
mod link;

pub use errors::{LinkError, LinkErrorKind};
pub use events::LinkEvent;
pub use link::{InspectorLink, NoopLink, StubLink};
