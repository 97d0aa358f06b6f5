use serde::{Deserialize, Serialize};

use super::ProbeRoutines;
use crate::{
    direction::Direction,
    error::ProbeError,
    runtime::{MachineStatus, MotionRuntime},
};

/// Shape of a calibration feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationShape {
    /// A ring or pin of diameter `cal_diameter`.
    Round,
    /// A rectangle `cal_x_width` by `cal_y_width`.
    Square,
}

// Calibration measures a feature of known size with the plain probe diameter
// and keeps the size error as the new tip correction. Round features are
// measured twice, the second time from the center found by the first.
impl<R: MotionRuntime, S: MachineStatus> ProbeRoutines<R, S> {
    pub async fn probe_cal_round_pocket(&mut self) -> Result<(), ProbeError> {
        let result = self.cal_round(false).await;
        self.finish(result)
    }
    pub async fn probe_cal_round_boss(&mut self) -> Result<(), ProbeError> {
        let result = self.cal_round(true).await;
        self.finish(result)
    }
    pub async fn probe_cal_square_pocket(&mut self) -> Result<(), ProbeError> {
        let result = self.cal_square(false).await;
        self.finish(result)
    }
    pub async fn probe_cal_square_boss(&mut self) -> Result<(), ProbeError> {
        let result = self.cal_square(true).await;
        self.finish(result)
    }

    /// Size error of the last X and Y length measurement against the
    /// calibration feature: the X error, the Y error, or their average
    /// depending on `cal_x_error` and `cal_y_error`.
    pub fn get_new_offset(&self, shape: CalibrationShape) -> f64 {
        let (base_x, base_y) = match shape {
            CalibrationShape::Round => (self.params.cal_diameter, self.params.cal_diameter),
            CalibrationShape::Square => (self.params.cal_x_width, self.params.cal_y_width),
        };
        let x_error = self.result.lx - base_x;
        let y_error = self.result.ly - base_y;
        if self.params.cal_x_error {
            x_error
        } else if self.params.cal_y_error {
            y_error
        } else {
            (x_error + y_error) / 2.0
        }
    }

    fn apply_calibration(&mut self, shape: CalibrationShape) {
        let offset = self.get_new_offset(shape);
        self.result.offset = offset;
        self.cal_diameter = self.params.probe_diam + offset;
    }

    async fn cal_round(&mut self, boss: bool) -> Result<(), ProbeError> {
        self.cal_diameter = self.params.probe_diam;
        let diameter = self.params.cal_diameter;
        if diameter <= 0.0 {
            return Err(ProbeError::validation("Calibration diameter must be larger than 0"));
        }
        let radius = diameter / 2.0;
        if boss {
            self.outside_xy_boss(radius, radius).await?;
            self.outside_xy_boss(radius, radius).await?;
        } else {
            if self.params.probe_diam >= diameter {
                return Err(ProbeError::validation("Probe diameter too large for cal diameter"));
            }
            self.xy_hole(radius).await?;
            self.xy_hole(radius).await?;
        }
        self.apply_calibration(CalibrationShape::Round);
        self.result.d = diameter;
        Ok(())
    }

    async fn cal_square(&mut self, boss: bool) -> Result<(), ProbeError> {
        self.cal_diameter = self.params.probe_diam;
        let (x, y) = (self.params.cal_x_width, self.params.cal_y_width);
        if x <= 0.0 {
            return Err(ProbeError::validation("Calibration X width must be larger than 0"));
        }
        if y <= 0.0 {
            return Err(ProbeError::validation("Calibration Y width must be larger than 0"));
        }
        if boss {
            self.outside_length(Direction::XMinus, x / 2.0).await?;
            self.outside_length(Direction::YMinus, y / 2.0).await?;
        } else {
            self.inside_length(Direction::XMinus, x / 2.0).await?;
            self.inside_length(Direction::YMinus, y / 2.0).await?;
        }
        self.apply_calibration(CalibrationShape::Square);
        self.result.lx = x;
        self.result.ly = y;
        Ok(())
    }
}
