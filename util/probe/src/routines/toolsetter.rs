use super::ProbeRoutines;
use crate::{
    direction::Direction,
    error::{InRoutine, MotionError, ProbeError},
    history::Field,
    params::required,
    runtime::{Axis, MachineStatus, MotionRuntime},
};

/// Whether `value` is above the lower and below the upper soft limit of an
/// axis. An axis without limits accepts anything.
fn within(limits: Option<(f64, f64)>, value: f64) -> (bool, bool) {
    match limits {
        Some((min, max)) => (value >= min, value <= max),
        None => (true, true),
    }
}

impl<R: MotionRuntime, S: MachineStatus> ProbeRoutines<R, S> {
    /// Moves to the tool setter in machine coordinates, raising Z first.
    pub async fn goto_toolsetter(&mut self) -> Result<(), ProbeError> {
        let result = self.goto_toolsetter_moves().await;
        self.finish(result)
    }

    pub async fn wait(&mut self) -> Result<(), ProbeError> {
        let result = self.mdi_wait("G4 P5").await.in_routine("wait");
        self.finish(result)
    }

    /// Measures the current tool's length on the tool setter and stores it in
    /// the tool table.
    pub async fn probe_tool_z(&mut self) -> Result<(), ProbeError> {
        let result = self.tool_length().await;
        self.finish(result)
    }
    pub async fn probe_tool_with_toolsetter(&mut self) -> Result<(), ProbeError> {
        self.probe_tool_z().await
    }

    /// Height of the tool setter.
    pub async fn probe_ts_z(&mut self) -> Result<(), ProbeError> {
        let result = self.setter_height().await;
        self.finish(result)
    }

    /// Measures the tool's length, then its diameter by probing the tool
    /// setter from all four sides with the tool.
    pub async fn probe_tool_z_diam(&mut self) -> Result<(), ProbeError> {
        let result = self.tool_diameter().await;
        self.finish(result)
    }

    /// Height of the material top.
    pub async fn probe_material_z(&mut self) -> Result<(), ProbeError> {
        let result = self.material_height().await;
        self.finish(result)
    }

    async fn goto_toolsetter_moves(&mut self) -> Result<(), ProbeError> {
        let z_max_clear = required(self.params.z_max_clear, "z_max_clear")?;
        let ts_x = required(self.params.ts_x, "ts_x")?;
        let ts_y = required(self.params.ts_y, "ts_y")?;
        let ts_z = required(self.params.ts_z, "ts_z")?;
        required(self.params.ts_max, "ts_max")?;
        let commands = [
            format!("F{}", self.params.rapid_vel),
            format!("G53 G1 Z{}", z_max_clear),
            format!("G53 G1 X{} Y{}", ts_x, ts_y),
            format!("G53 G1 Z{}", ts_z),
        ];
        self.mdi_list(&commands).await.in_routine("goto_toolsetter")
    }

    async fn tool_length(&mut self) -> Result<(), ProbeError> {
        let ts_x = required(self.params.ts_x, "ts_x")?;
        required(self.params.ts_y, "ts_y")?;
        required(self.params.ts_z, "ts_z")?;
        let ts_max = required(self.params.ts_max, "ts_max")?;
        let ts_diam = required(self.params.ts_diam, "ts_diam")?;
        let probe_height = required(self.params.tool_probe_height, "tool_probe_height")?;
        required(self.params.tool_block_height, "tool_block_height")?;
        let tool_diameter = match (self.params.tool_diameter, self.params.tool_number) {
            (Some(diameter), Some(_)) => diameter,
            _ => return Err(ProbeError::validation("No tool diameter found")),
        };

        // a tool wider than the setter is offset so its edge lands on it,
        // away from whichever X limit is too close
        let x_offset = if tool_diameter > ts_diam {
            let limits = self.status.axis_limits(Axis::X);
            let radius = tool_diameter / 2.0;
            if within(limits, ts_x + radius).1 {
                radius
            } else if within(limits, ts_x - radius).0 {
                -radius
            } else {
                return Err(ProbeError::validation("cannot offset enough in X for tool diameter"));
            }
        } else {
            0.0
        };

        let latch = self.params.latch_return_dist;
        let commands = [
            format!("F{}", self.params.rapid_vel),
            "G49".to_string(),
            "G91".to_string(),
            format!("G1 X{}", x_offset),
            format!("G38.2 Z{} F{}", -ts_max, self.params.search_vel),
            format!("G1 Z{} F{}", latch, self.params.rapid_vel),
            format!("F{}", self.params.probe_vel),
            format!("G38.2 Z{}", -1.2 * latch),
            "#<touch_result> = #5063".to_string(),
            // work offset of the active coordinate system in Z, for the G53 height
            "#<zworkoffset> = [#[5203 + #5220 * 20] + #5213 * #5210]".to_string(),
            format!("G10 L1 P#5400 Z[#5063 + #<zworkoffset> - {}]", probe_height),
            format!("G1 Z{} F{}", self.params.z_clearance, self.params.rapid_vel),
            format!("G1 X{}", -x_offset),
            "G90".to_string(),
            "G43".to_string(),
        ];
        self.mdi_list(&commands).await.in_routine("probe_tool_z")?;
        let height = self.runtime.probed_position().await.in_routine("probe_tool_z")?[2];
        self.result.z = height;
        self.push_history(format!(
            "ToolSetter: Calculated Tool Length Z: {:.4} Setter Height: {:.4} Probed Position: {:.4}",
            height - probe_height,
            probe_height,
            height
        ));
        Ok(())
    }

    async fn setter_height(&mut self) -> Result<(), ProbeError> {
        let ts_max = required(self.params.ts_max, "ts_max")?;
        let latch = self.params.latch_return_dist;
        let commands = [
            "G49".to_string(),
            "G91".to_string(),
            format!("G38.2 Z{} F{}", -ts_max, self.params.search_vel),
            format!("G1 Z{} F{}", latch, self.params.rapid_vel),
            format!("F{}", self.params.probe_vel),
            format!("G38.2 Z{}", -1.2 * latch),
            format!("G1 Z{} F{}", self.params.z_clearance, self.params.rapid_vel),
            "G90".to_string(),
        ];
        self.mdi_list(&commands).await.in_routine("probe_ts_z")?;
        let height = self.runtime.probed_position().await.in_routine("probe_ts_z")?[2];
        self.result.th = height;
        self.add_history("Tool Setter height", &[(Field::Z, height)]);
        Ok(())
    }

    async fn material_height(&mut self) -> Result<(), ProbeError> {
        let ts_max = required(self.params.ts_max, "ts_max")?;
        let latch = self.params.latch_return_dist;
        let commands = [
            "G49".to_string(),
            "G92.1".to_string(),
            "G10 L20 P0 Z[#<_abs_z>]".to_string(),
            "G91".to_string(),
            format!("F{}", self.params.search_vel),
            format!("G38.2 Z{}", -ts_max),
            format!("G1 Z{} F{}", latch, self.params.rapid_vel),
            format!("F{}", self.params.probe_vel),
            format!("G38.2 Z{}", -1.2 * latch),
            format!("G1 Z{} F{}", self.params.z_clearance, self.params.rapid_vel),
            "G90".to_string(),
        ];
        self.mdi_list(&commands).await.in_routine("probe_material_z")?;
        let height = self.runtime.probed_position().await.in_routine("probe_material_z")?[2];
        self.result.bh = height;
        self.add_history("Probe Material Top", &[(Field::Z, height)]);
        Ok(())
    }

    async fn tool_diameter(&mut self) -> Result<(), ProbeError> {
        self.tool_length().await?;

        let ts_x = required(self.params.ts_x, "ts_x")?;
        let ts_y = required(self.params.ts_y, "ts_y")?;
        let ts_diam = required(self.params.ts_diam, "ts_diam")?;
        let tool_diameter = self.params.tool_diameter.unwrap_or_default();
        let offset = (tool_diameter + ts_diam) / 2.0;
        let x_limits = self.status.axis_limits(Axis::X);
        if !within(x_limits, ts_x + offset).1 {
            return Err(ProbeError::validation("cannot offset enough in + X for tool radius + toolsetter radius"));
        }
        if !within(x_limits, ts_x - offset).0 {
            return Err(ProbeError::validation("cannot offset enough in - X for tool radius + toolsetter radius"));
        }
        let y_limits = self.status.axis_limits(Axis::Y);
        if !within(y_limits, ts_y + offset).1 {
            return Err(ProbeError::validation(
                "cannot offset enough in + Y for tool radius offset + toolsetter radius",
            ));
        }
        if !within(y_limits, ts_y - offset).0 {
            return Err(ProbeError::validation(
                "cannot offset enough in - Y for tool radius offset + toolsetter radius",
            ));
        }
        self.tool_diameter_moves(ts_diam).await.in_routine("probe_tool_z_diam")
    }

    /// Touches the tool's side against the setter at `direction`, starting
    /// from above the setter's far side.
    async fn tool_side(&mut self, direction: Direction) -> Result<f64, MotionError> {
        self.z_clearance_down().await?;
        self.lower_tool_depth().await?;
        self.probe(direction).await?;
        let position = self.runtime.probed_position_with_offsets().await?;
        let side = position[direction.axis().index()] + direction.sign() * 0.5 * self.params.probe_diam;
        self.raise_tool_depth().await?;
        self.z_clearance_up().await?;
        Ok(side)
    }

    async fn tool_diameter_moves(&mut self, ts_diam: f64) -> Result<(), MotionError> {
        let clearance = self.params.xy_clearance;

        self.rapid_relative(&[(Axis::X, -(0.5 * ts_diam + clearance))]).await?;
        let xp = self.tool_side(Direction::XPlus).await?;
        self.rapid_to(&[(Axis::X, xp)]).await?;
        self.rapid_relative(&[(Axis::X, ts_diam + clearance)]).await?;
        let xm = self.tool_side(Direction::XMinus).await?;
        self.result.xp = xp;
        self.result.xm = xm;
        self.length_x();
        let xc = 0.5 * (xp + xm);
        self.result.xc = xc;
        self.rapid_to(&[(Axis::X, xc)]).await?;

        self.rapid_relative(&[(Axis::Y, -(0.5 * ts_diam + clearance))]).await?;
        let yp = self.tool_side(Direction::YPlus).await?;
        self.rapid_to(&[(Axis::Y, yp)]).await?;
        self.rapid_relative(&[(Axis::Y, ts_diam + clearance)]).await?;
        let ym = self.tool_side(Direction::YMinus).await?;
        self.result.yp = yp;
        self.result.ym = ym;
        self.length_y();
        let yc = 0.5 * (yp + ym);
        self.result.yc = yc;
        let diameter = self.params.probe_diam + (ym - yp - ts_diam);
        self.result.d = diameter;

        let z = self.status.position()[2] - self.params.z_clearance;
        self.result.z = z;
        self.add_history(
            "Tool diameter",
            &[(Field::Xc, xc), (Field::Yc, yc), (Field::Z, z), (Field::D, diameter)],
        );
        self.rapid_to(&[(Axis::Y, yc)]).await
    }
}
