//! Recognition session management
//!
//! This module provides the per-stream state and the registry that owns it:
//! - `Session`: decoder cache, pending audio and running transcript
//! - `Transcript`: in-order fragment accumulation
//! - `SessionRegistry`: id → session map shared across connections
//! - `Stats`: process-wide counters reported by the health endpoint

mod registry;
mod session;
mod stats;
mod transcript;

pub use registry::{SessionRegistry, SharedSession};
pub use session::Session;
pub use stats::Stats;
pub use transcript::{Transcript, TranscriptUpdate};
