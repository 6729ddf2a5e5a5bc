//! Session layer for docchat.
//!
//! - [`SessionController`] - conversation list, active conversation, transcript
//!   and the single-flight `busy` gate
//! - [`AuthGate`] - decides whether the chat screen may be shown at all

mod auth;
mod controller;

pub use auth::{AuthGate, GateDecision, RedirectReason, logout};
pub use controller::{
    LocalIdMinter, PendingSend, SendOutcome, SendRejection, SessionController, SessionError,
};
