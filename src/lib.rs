//! loadscope CLI library: offline replay of captured link event logs
//! and report inspection, on top of the measurement engine crates.

pub mod replay;
pub mod telemetry;

pub use loadscope_core_types::{SessionOptions, TargetId};
pub use loadscope_engine::{EngineConfig, SessionEngine};
pub use run_report::RunReport;
