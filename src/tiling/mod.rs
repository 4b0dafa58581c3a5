//! Tiling job status polling.

pub mod monitor;
pub mod status;

pub use monitor::{MonitorFailure, MonitorHandle, TickOutcome, TilingMonitor, TilingOutcome};
pub use status::{AssetStatusResponse, TilingStatus};
