//! Probing procedures for locating edges, corners, holes and tools on a CNC
//! machine. Each procedure drives a [`MotionRuntime`] one MDI line at a time
//! and reduces the probed positions into a [`ProbeResult`].

pub mod direction;
pub mod error;
pub mod history;
pub mod params;
pub mod protocol;
pub mod result;
pub mod routine;
pub mod routines;
pub mod runtime;

pub use direction::Direction;
pub use error::{InRoutine, MotionError, ProbeError};
pub use history::Field;
pub use params::ProbeParameters;
pub use protocol::{serve, ProtocolError, Response};
pub use result::ProbeResult;
pub use routine::Routine;
pub use routines::{CalibrationShape, ProbeRoutines, DEFAULT_TIMEOUT};
pub use runtime::{Axis, MachineStatus, MotionRuntime};
