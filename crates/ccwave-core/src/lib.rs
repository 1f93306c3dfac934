//! Core functionalities: settings, capture readers, frame log, decoding session.

pub mod capture;
pub mod config;
pub mod logbuf;
pub mod session;

pub use capture::{CaptureError, CaptureFormat, CaptureReader};
pub use config::{ConfigError, ResolvedSettings, Settings};
pub use logbuf::{FrameLog, LogEntry};
pub use session::Session;
