//! A simulated machine for exercising probing routines without hardware.
//!
//! Motion is instantaneous. The workpiece is a set of axis-aligned faces and
//! probe moves stop where the tip first touches one of them.

mod expr;
mod machine;
mod scene;
mod words;

pub use machine::SimulatedMachine;
pub use scene::{Facing, Scene, Surface};
