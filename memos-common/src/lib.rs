//! # memos-import Common Library
//!
//! Shared code for the memos-import service and its collaborators:
//! - Job event model (`EventKind`, `Notification`, `JobEvent`)
//! - Configuration file resolution and logging settings
//! - Server-Sent Events encoding
//! - Common error type and timestamp helpers

pub mod config;
pub mod error;
pub mod events;
pub mod sse;
pub mod time;

pub use error::{Error, Result};
pub use events::{EventKind, JobEvent, Notification};
