//! i3/sway backend.
//!
//! [`ipc`] speaks the raw IPC wire protocol (socket discovery and binary
//! framing); [`link`] builds the [`WmLink`](crate::traits::WmLink)
//! implementation on top of it.

pub mod ipc;
pub mod link;

pub use link::I3Link;
