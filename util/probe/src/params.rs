use serde::{Deserialize, Serialize};

use crate::error::ProbeError;

/// Inputs to every probing routine. Lengths are in machine units and
/// velocities in units per minute.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeParameters {
    pub probe_diam: f64,
    pub rapid_vel: f64,
    pub search_vel: f64,
    pub probe_vel: f64,
    pub extra_depth: f64,
    pub latch_return_dist: f64,
    pub max_travel: f64,
    pub max_z: f64,
    pub xy_clearance: f64,
    pub z_clearance: f64,
    pub side_edge_length: f64,
    pub adj_x: f64,
    pub adj_y: f64,
    pub adj_z: f64,
    /// Not read by any routine; kept so front end settings survive a round trip.
    pub adj_angle: f64,
    pub diameter_hint: f64,
    pub x_hint_bp: f64,
    pub y_hint_bp: f64,
    pub x_hint_rv: f64,
    pub y_hint_rv: f64,
    pub cal_diameter: f64,
    pub cal_x_width: f64,
    pub cal_y_width: f64,
    pub cal_offset: f64,

    pub allow_auto_zero: bool,
    pub allow_auto_skew: bool,
    /// Not read by any routine; kept so front end settings survive a round trip.
    pub cal_avg_error: bool,
    pub cal_x_error: bool,
    pub cal_y_error: bool,

    // Tool setter, in machine coordinates.
    pub z_max_clear: Option<f64>,
    pub ts_x: Option<f64>,
    pub ts_y: Option<f64>,
    pub ts_z: Option<f64>,
    pub ts_max: Option<f64>,
    pub ts_diam: Option<f64>,
    pub tool_probe_height: Option<f64>,
    pub tool_block_height: Option<f64>,
    pub tool_diameter: Option<f64>,
    pub tool_number: Option<i32>,
}

pub(crate) fn required(value: Option<f64>, name: &str) -> Result<f64, ProbeError> {
    value.ok_or_else(|| ProbeError::Validation(format!("Missing toolsetter setting: {}", name)))
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    pub fn test_partial_json() {
        let params: ProbeParameters = serde_json::from_str(r#"{"probe_diam": 2, "allow_auto_zero": true, "ts_x": 10.5}"#).unwrap();
        assert_eq!(params.probe_diam, 2.0);
        assert!(params.allow_auto_zero);
        assert_eq!(params.ts_x, Some(10.5));
        assert_eq!(params.ts_y, None);
        assert_eq!(params.max_travel, 0.0);
        let carried: ProbeParameters = serde_json::from_str(r#"{"adj_angle": 1.5, "cal_avg_error": true}"#).unwrap();
        let json = serde_json::to_value(&carried).unwrap();
        assert_eq!(json["adj_angle"], 1.5);
        assert_eq!(json["cal_avg_error"], true);
        assert_eq!(
            required(params.ts_y, "ts_y"),
            Err(ProbeError::Validation("Missing toolsetter setting: ts_y".into()))
        );
    }
}
