//! Live simulation: per-event score simulators, the central monitor and the
//! session that ties them together.

pub mod monitor;
pub mod session;
pub mod simulator;

pub use monitor::{CycleReport, MonitorReport, ScoreMonitor};
pub use session::{SessionReport, SessionSettings, SimulationSession};
pub use simulator::{EventSimulator, SimulatorReport, SimulatorState};
