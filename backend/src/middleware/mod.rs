//! Request middleware.
//!
//! Purpose: request lifecycle concerns shared by every route (tracing and
//! the fault barrier) plus the per-route session gate.

pub mod recover;
pub mod session_gate;
pub mod trace;

pub use recover::Recover;
pub use session_gate::{AuthenticatedUser, NOT_LOGGED_IN_MESSAGE, SessionGate, Viewer};
pub use trace::Trace;
