//! Inbound bearer authentication.
//!
//! The [`BearerAuthLayer`] validates the `authorization` metadata of every
//! inbound call before any handler runs, binding the extracted token into a
//! call-scoped [`CallContext`] carried in request extensions. Handlers read
//! it back through [`CallContextExt`] and thread it explicitly into the
//! outbound transport; nothing is ever stored in cross-call state.

mod context;
mod layer;

pub use context::{CallContext, CallContextExt};
pub use layer::{BearerAuthLayer, BearerAuthService, UNSECURED_METHODS};
