use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{arc::ArcFeed, coordinates::{Offset, Position}, status::ToolEntry};

/// Interpreter state passed along with each new line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpreterState {
    pub sequence_number: i64,
    /// Active plane as 170, 180 or 190.
    pub plane: i32,
}
impl Default for InterpreterState {
    fn default() -> Self {
        InterpreterState { sequence_number: 0, plane: 170 }
    }
}

/// The calls a g-code interpreter makes while it walks a program.
pub trait CanonCallbacks {
    fn comment(&mut self, _text: &str) {}
    fn message(&mut self, _text: &str) {}
    fn next_line(&mut self, state: &InterpreterState);
    fn set_feed_rate(&mut self, rate: f64);
    fn set_spindle_rate(&mut self, _speed: f64) {}
    fn select_plane(&mut self, _plane: i32) {}
    fn set_plane(&mut self, plane: i32);
    fn change_tool(&mut self, pocket: i32);
    fn get_tool(&self, _pocket: i32) -> ToolEntry {
        ToolEntry::none()
    }
    fn straight_traverse(&mut self, position: Position);
    fn straight_feed(&mut self, position: Position);
    fn straight_probe(&mut self, position: Position) {
        self.straight_feed(position)
    }
    fn rigid_tap(&mut self, x: f64, y: f64, z: f64);
    fn arc_feed(&mut self, arc: &ArcFeed);
    fn dwell(&mut self, seconds: f64);
    fn user_defined_function(&mut self, index: i32, p: f64, q: f64);
    fn set_g5x_offset(&mut self, index: i32, offset: Offset);
    fn set_g92_offset(&mut self, offset: Offset);
    fn set_xy_rotation(&mut self, degrees: f64);
    fn tool_offset(&mut self, offset: Offset);
    fn get_external_angular_units(&self) -> f64 {
        1.0
    }
    fn get_external_length_units(&self) -> f64 {
        1.0
    }
    fn get_axis_mask(&self) -> u32 {
        0
    }
    fn get_block_delete(&self) -> bool {
        false
    }
}

/// Logs every callback and records nothing.
#[derive(Debug, Default)]
pub struct PrintCanon;

impl CanonCallbacks for PrintCanon {
    fn comment(&mut self, text: &str) {
        info!("# {}", text);
    }
    fn next_line(&mut self, state: &InterpreterState) {
        info!("next_line {}", state.sequence_number);
    }
    fn set_feed_rate(&mut self, rate: f64) {
        info!("set feed rate {}", rate);
    }
    fn set_plane(&mut self, plane: i32) {
        info!("set plane {}", plane);
    }
    fn change_tool(&mut self, pocket: i32) {
        info!("change tool {}", pocket);
    }
    fn straight_traverse(&mut self, position: Position) {
        info!("straight_traverse {:?}", position.0);
    }
    fn straight_feed(&mut self, position: Position) {
        info!("straight_feed {:?}", position.0);
    }
    fn rigid_tap(&mut self, x: f64, y: f64, z: f64) {
        info!("rigid_tap {} {} {}", x, y, z);
    }
    fn arc_feed(&mut self, arc: &ArcFeed) {
        info!("arc_feed {:?}", arc);
    }
    fn dwell(&mut self, seconds: f64) {
        if seconds < 0.1 {
            info!("dwell {} ms", 1000.0 * seconds);
        } else {
            info!("dwell {} seconds", seconds);
        }
    }
    fn user_defined_function(&mut self, index: i32, p: f64, q: f64) {
        info!("user defined M{} P{} Q{}", index, p, q);
    }
    fn set_g5x_offset(&mut self, index: i32, offset: Offset) {
        info!("set_g5x_offset {} {:?}", index, offset.0);
    }
    fn set_g92_offset(&mut self, offset: Offset) {
        info!("set_g92_offset {:?}", offset.0);
    }
    fn set_xy_rotation(&mut self, degrees: f64) {
        info!("set_xy_rotation {}", degrees);
    }
    fn tool_offset(&mut self, offset: Offset) {
        info!("tool_offset {:?}", offset.0);
    }
    fn get_axis_mask(&self) -> u32 {
        // XYZ
        7
    }
}
