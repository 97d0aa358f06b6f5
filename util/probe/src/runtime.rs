use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::MotionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis { X, Y, Z }

impl Axis {
    pub fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
    /// Name used for the named parameters holding a position, e.g. `#<_x>`.
    pub fn parameter_name(&self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}
impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        };
        f.write_str(letter)
    }
}

/// The machine controller the routines drive.
#[async_trait]
pub trait MotionRuntime: Send {
    /// Runs one line of MDI code and resolves once the machine has finished it.
    async fn execute(&mut self, line: &str) -> Result<(), MotionError>;
    async fn abort(&mut self);
    /// Where the last probe move triggered, in work coordinates.
    async fn probed_position_with_offsets(&mut self) -> Result<[f64; 3], MotionError>;
    /// Where the last probe move triggered, in machine coordinates.
    async fn probed_position(&mut self) -> Result<[f64; 3], MotionError>;
    async fn reload_display(&mut self) {}
}

/// Read-only machine state.
pub trait MachineStatus: Send {
    /// Current machine position.
    fn position(&self) -> [f64; 3];
    fn is_metric(&self) -> bool {
        true
    }
    /// Soft limits of an axis as (min, max).
    fn axis_limits(&self, axis: Axis) -> Option<(f64, f64)>;
}
