//! Per-connection streaming recognition
//!
//! `StreamingController` turns a connection's control and audio frames into
//! `ServerEvent`s. It is transport-agnostic; the websocket handler in
//! `crate::http` only moves frames in and events out.

mod controller;
mod messages;

pub use controller::{StreamingController, StreamingSettings};
pub use messages::{ClientMessage, ControlAction, ControlMessage, ServerEvent};
