use serde::{Deserialize, Serialize};

/// One row of the machine tool table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolEntry {
    pub id: i32,
    pub offset: [f64; 9],
    pub diameter: f64,
    pub front_angle: f64,
    pub back_angle: f64,
    pub orientation: i32,
}
impl ToolEntry {
    /// The entry reported for pockets outside the table.
    pub fn none() -> Self {
        ToolEntry {
            id: -1,
            offset: [0.0; 9],
            diameter: 0.0,
            front_angle: 0.0,
            back_angle: 0.0,
            orientation: 0,
        }
    }
}

/// Snapshot of machine state consulted by the canon. Every query may be
/// unavailable, in which case the canon falls back to a default.
pub trait CanonStatus {
    fn tool_table(&self) -> Option<Vec<ToolEntry>> {
        None
    }
    fn angular_units(&self) -> Option<f64> {
        None
    }
    fn linear_units(&self) -> Option<f64> {
        None
    }
    fn axis_mask(&self) -> Option<u32> {
        None
    }
    fn block_delete(&self) -> Option<bool> {
        None
    }
}
