//! Non-real-time services: the export trigger loop and capture diagnostics.
//!
//! # Architecture
//!
//! ```text
//! HotkeyListener thread ──HotkeyEvent (mpsc)──▶ ExportService::run()   ← tokio task
//!                                                   └─ spawn_blocking(export_snapshot)
//!
//! StatsReporter::run()  ← tokio task, drains CaptureStats on a timer
//!
//! SharedStatus (Arc<Mutex<ServiceStatus>>) ←── updated after every export,
//!                                          read by StatsReporter on each tick
//! ```

pub mod runner;
pub mod state;

pub use runner::{ExportService, StatsReporter};
pub use state::{new_shared_status, ExportState, ServiceStatus, SharedStatus};
