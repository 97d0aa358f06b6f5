use super::ProbeRoutines;
use crate::{
    direction::Direction,
    error::ProbeError,
    runtime::{MachineStatus, MotionRuntime},
};

// Each of these checks its size hints before any motion, then measures with
// the length probes using half the hint as the edge distance.
impl<R: MotionRuntime, S: MachineStatus> ProbeRoutines<R, S> {
    pub async fn probe_round_boss(&mut self) -> Result<(), ProbeError> {
        let result = self.round_boss().await;
        self.finish(result)
    }
    pub async fn probe_round_pocket(&mut self) -> Result<(), ProbeError> {
        let result = self.round_pocket().await;
        self.finish(result)
    }
    pub async fn probe_rectangular_boss(&mut self) -> Result<(), ProbeError> {
        let result = self.rectangular_boss().await;
        self.finish(result)
    }
    pub async fn probe_rectangular_pocket(&mut self) -> Result<(), ProbeError> {
        let result = self.rectangular_pocket().await;
        self.finish(result)
    }
    pub async fn probe_ridge_x(&mut self) -> Result<(), ProbeError> {
        let result = self.ridge(Direction::XMinus, self.params.x_hint_rv).await;
        self.finish(result)
    }
    pub async fn probe_ridge_y(&mut self) -> Result<(), ProbeError> {
        let result = self.ridge(Direction::YMinus, self.params.y_hint_rv).await;
        self.finish(result)
    }
    pub async fn probe_valley_x(&mut self) -> Result<(), ProbeError> {
        let result = self.valley(Direction::XMinus, self.params.x_hint_rv).await;
        self.finish(result)
    }
    pub async fn probe_valley_y(&mut self) -> Result<(), ProbeError> {
        let result = self.valley(Direction::YMinus, self.params.y_hint_rv).await;
        self.finish(result)
    }

    async fn round_boss(&mut self) -> Result<(), ProbeError> {
        let hint = self.params.diameter_hint;
        if hint <= 0.0 {
            return Err(ProbeError::validation("Boss diameter hint must be larger than 0"));
        }
        self.outside_xy_boss(hint / 2.0, hint / 2.0).await?;
        self.result.d = (self.result.lx + self.result.ly) / 2.0;
        Ok(())
    }

    async fn round_pocket(&mut self) -> Result<(), ProbeError> {
        let hint = self.params.diameter_hint;
        if hint <= 0.0 {
            return Err(ProbeError::validation("Pocket diameter hint must be larger than 0"));
        }
        if self.params.probe_diam >= hint {
            return Err(ProbeError::validation("Probe diameter too large for hole diameter hint"));
        }
        self.inside_length(Direction::XMinus, hint / 2.0).await?;
        self.inside_length(Direction::YMinus, hint / 2.0).await?;
        self.result.d = (self.result.lx + self.result.ly) / 2.0;
        Ok(())
    }

    fn check_rectangle_hints(&self) -> Result<(f64, f64), ProbeError> {
        let (x, y) = (self.params.x_hint_bp, self.params.y_hint_bp);
        if y <= 0.0 {
            return Err(ProbeError::validation("Y length hint must be larger than 0"));
        }
        if x <= 0.0 {
            return Err(ProbeError::validation("X length hint must be larger than 0"));
        }
        Ok((x, y))
    }

    async fn rectangular_boss(&mut self) -> Result<(), ProbeError> {
        let (x, y) = self.check_rectangle_hints()?;
        self.outside_xy_boss(x / 2.0, y / 2.0).await
    }

    async fn rectangular_pocket(&mut self) -> Result<(), ProbeError> {
        let (x, y) = self.check_rectangle_hints()?;
        if self.params.probe_diam >= y / 2.0 {
            return Err(ProbeError::validation("Probe diameter too large for Y length hint"));
        }
        if self.params.probe_diam >= x / 2.0 {
            return Err(ProbeError::validation("Probe diameter too large for X length hint"));
        }
        self.inside_length(Direction::XMinus, x / 2.0).await?;
        self.inside_length(Direction::YMinus, y / 2.0).await
    }

    async fn ridge(&mut self, minus: Direction, hint: f64) -> Result<(), ProbeError> {
        if hint <= 0.0 {
            return Err(ProbeError::Validation(format!("{} length hint must be larger than 0", minus.axis())));
        }
        self.outside_length(minus, hint / 2.0).await
    }

    async fn valley(&mut self, minus: Direction, hint: f64) -> Result<(), ProbeError> {
        let axis = minus.axis();
        if hint <= 0.0 {
            return Err(ProbeError::Validation(format!("{} length hint must be larger than 0", axis)));
        }
        if self.params.probe_diam >= hint / 2.0 {
            return Err(ProbeError::Validation(format!("Probe diameter too large for {} length hint", axis)));
        }
        self.inside_length(minus, hint / 2.0).await
    }
}
