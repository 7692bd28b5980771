pub mod cli;
pub mod config;
pub mod error;
#[cfg(feature = "openvr")]
pub mod openvr_backend;
pub mod poll;
pub mod runtime;
pub mod session;

pub use config::RunConfig;
pub use error::{ArgError, SessionError};
pub use poll::{format_reading, poll_loop, BatteryReading, RunningFlag};
pub use runtime::{DeviceIndex, TrackingRuntime};
pub use session::{Controllers, TrackingSession};
