use std::time::Duration;

use itertools::Itertools;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::{
    direction::Direction,
    error::{MotionError, ProbeError},
    history::{format_history, Field},
    params::ProbeParameters,
    result::ProbeResult,
    routine::Routine,
    runtime::{Axis, MachineStatus, MotionRuntime},
};

mod angles;
mod calibration;
mod edges;
mod guards;
mod lengths;
mod toolsetter;

pub use calibration::CalibrationShape;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs probing procedures against a machine.
///
/// Every procedure is a fixed script of motion commands; the first failing
/// command ends it. Procedures take `&mut self`, so only one runs at a time.
pub struct ProbeRoutines<R, S> {
    runtime: R,
    status: S,
    params: ProbeParameters,
    result: ProbeResult,
    cal_diameter: f64,
    timeout: Duration,
    auto_zero: bool,
    history: Vec<String>,
}

impl<R: MotionRuntime, S: MachineStatus> ProbeRoutines<R, S> {
    pub fn new(runtime: R, status: S) -> Self {
        Self::with_parameters(runtime, status, ProbeParameters::default())
    }
    pub fn with_parameters(runtime: R, status: S, params: ProbeParameters) -> Self {
        let mut routines = ProbeRoutines {
            runtime,
            status,
            params: ProbeParameters::default(),
            result: ProbeResult::default(),
            cal_diameter: 0.0,
            timeout: DEFAULT_TIMEOUT,
            auto_zero: false,
            history: Vec::new(),
        };
        routines.set_parameters(params);
        routines
    }
    /// Replaces the parameters. The calibration diameter is reset to the
    /// probe diameter plus the configured calibration offset.
    pub fn set_parameters(&mut self, params: ProbeParameters) {
        self.cal_diameter = params.probe_diam + params.cal_offset;
        self.auto_zero = params.allow_auto_zero;
        self.params = params;
    }
    pub fn parameters(&self) -> &ProbeParameters {
        &self.params
    }
    pub fn result(&self) -> &ProbeResult {
        &self.result
    }
    pub fn result_mut(&mut self) -> &mut ProbeResult {
        &mut self.result
    }
    /// Probe tip diameter corrected by the last calibration.
    pub fn cal_diameter(&self) -> f64 {
        self.cal_diameter
    }
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }
    pub fn last_history(&self) -> Option<&str> {
        self.history.last().map(String::as_str)
    }
    pub fn take_history(&mut self) -> Vec<String> {
        std::mem::take(&mut self.history)
    }
    pub fn runtime(&self) -> &R {
        &self.runtime
    }
    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }
    pub fn status(&self) -> &S {
        &self.status
    }
    pub fn into_parts(self) -> (R, S) {
        (self.runtime, self.status)
    }

    pub async fn run(&mut self, routine: Routine) -> Result<(), ProbeError> {
        debug!("running {}", routine);
        match routine {
            Routine::ProbeXp => self.probe_xp().await,
            Routine::ProbeXm => self.probe_xm().await,
            Routine::ProbeYp => self.probe_yp().await,
            Routine::ProbeYm => self.probe_ym().await,
            Routine::ProbeOutsideXpyp => self.probe_outside_xpyp().await,
            Routine::ProbeOutsideXpym => self.probe_outside_xpym().await,
            Routine::ProbeOutsideXmyp => self.probe_outside_xmyp().await,
            Routine::ProbeOutsideXmym => self.probe_outside_xmym().await,
            Routine::ProbeInsideXpyp => self.probe_inside_xpyp().await,
            Routine::ProbeInsideXpym => self.probe_inside_xpym().await,
            Routine::ProbeInsideXmyp => self.probe_inside_xmyp().await,
            Routine::ProbeInsideXmym => self.probe_inside_xmym().await,
            Routine::ProbeXyHole => self.probe_xy_hole().await,
            Routine::ProbeOutsideXyBoss => {
                let edge = self.params.side_edge_length;
                self.probe_outside_xy_boss(edge, edge).await
            }
            Routine::ProbeOutsideLengthX => self.probe_outside_length_x().await,
            Routine::ProbeOutsideLengthY => self.probe_outside_length_y().await,
            Routine::ProbeInsideLengthX => self.probe_inside_length_x().await,
            Routine::ProbeInsideLengthY => self.probe_inside_length_y().await,
            Routine::ProbeAngleXp => self.probe_angle_xp().await,
            Routine::ProbeAngleXm => self.probe_angle_xm().await,
            Routine::ProbeAngleYp => self.probe_angle_yp().await,
            Routine::ProbeAngleYm => self.probe_angle_ym().await,
            Routine::ProbeDown => self.probe_down().await,
            Routine::GotoToolsetter => self.goto_toolsetter().await,
            Routine::ProbeToolZ => self.probe_tool_z().await,
            Routine::ProbeTsZ => self.probe_ts_z().await,
            Routine::ProbeToolZDiam => self.probe_tool_z_diam().await,
            Routine::ProbeMaterialZ => self.probe_material_z().await,
            Routine::Wait => self.wait().await,
            Routine::ProbeRoundPocket => self.probe_round_pocket().await,
            Routine::ProbeRoundBoss => self.probe_round_boss().await,
            Routine::ProbeRectangularPocket => self.probe_rectangular_pocket().await,
            Routine::ProbeRectangularBoss => self.probe_rectangular_boss().await,
            Routine::ProbeRidgeX => self.probe_ridge_x().await,
            Routine::ProbeRidgeY => self.probe_ridge_y().await,
            Routine::ProbeValleyX => self.probe_valley_x().await,
            Routine::ProbeValleyY => self.probe_valley_y().await,
            Routine::ProbeCalRoundPocket => self.probe_cal_round_pocket().await,
            Routine::ProbeCalSquarePocket => self.probe_cal_square_pocket().await,
            Routine::ProbeCalRoundBoss => self.probe_cal_round_boss().await,
            Routine::ProbeCalSquareBoss => self.probe_cal_square_boss().await,
        }
    }

    /// Outcome of a public procedure. A failed procedure leaves no partial
    /// measurements behind.
    fn finish(&mut self, result: Result<(), ProbeError>) -> Result<(), ProbeError> {
        if let Err(error) = &result {
            warn!("{}", error);
            self.result = ProbeResult::default();
        }
        result
    }

    /// Runs each line of `code` in turn, waiting up to the timeout for each.
    /// The machine is aborted on the first failure.
    pub async fn mdi_wait(&mut self, code: &str) -> Result<(), MotionError> {
        debug!("MDI_WAIT_COMMAND= {:?}, maxt = {:?}", code, self.timeout);
        for line in code.lines().map(str::trim).filter(|line| !line.is_empty()) {
            let result = match timeout(self.timeout, self.runtime.execute(line)).await {
                Ok(result) => result,
                Err(_) => Err(MotionError::Timeout(self.timeout.as_secs_f64())),
            };
            if let Err(error) = result {
                warn!("{:?}: {}", line, error);
                self.runtime.abort().await;
                return Err(error);
            }
        }
        Ok(())
    }

    pub async fn mdi_list<T: AsRef<str>>(&mut self, commands: &[T]) -> Result<(), MotionError> {
        for command in commands {
            let command = command.as_ref();
            if let Err(e) = self.mdi_wait(command).await {
                return Err(MotionError::Runtime(format!("failed: {} cmd: {}", e, command)));
            }
        }
        Ok(())
    }

    /// Finds one edge: a fast search of `max_travel`, a short retract, a slow
    /// confirming probe, then a return to the starting coordinate.
    pub async fn probe(&mut self, direction: Direction) -> Result<(), MotionError> {
        let axis = direction.axis();
        let name = axis.parameter_name();
        let travel = direction.sign() * self.params.max_travel;
        let latch = direction.sign() * self.params.latch_return_dist;
        self.mdi_wait(&format!("#<{name}> = #<_{name}>")).await?;
        self.mdi_wait(&format!("G91\nG38.2 {axis}{travel} F{}", self.params.search_vel)).await?;
        self.mdi_wait(&format!("G1 {axis}{} F{}", -latch, self.params.rapid_vel)).await?;
        self.mdi_wait(&format!("G4 P0.5\nG38.2 {axis}{} F{}", 1.2 * latch, self.params.probe_vel)).await?;
        self.mdi_wait(&format!("G90 G1 {axis}#<{name}> F{}", self.params.rapid_vel)).await
    }

    async fn rapid_relative(&mut self, moves: &[(Axis, f64)]) -> Result<(), MotionError> {
        let words = moves.iter().map(|(axis, distance)| format!("{axis}{distance}")).join(" ");
        self.mdi_wait(&format!("G91\nG1 {words} F{}\nG90", self.params.rapid_vel)).await
    }

    async fn rapid_to(&mut self, targets: &[(Axis, f64)]) -> Result<(), MotionError> {
        let words = targets.iter().map(|(axis, position)| format!("{axis}{position}")).join(" ");
        self.mdi_wait(&format!("G1 {words} F{}", self.params.rapid_vel)).await
    }

    /// Surface position from the last probe, corrected for the tip radius.
    async fn probed_edge(&mut self, direction: Direction) -> Result<f64, MotionError> {
        let position = self.runtime.probed_position_with_offsets().await?;
        Ok(position[direction.axis().index()] + direction.sign() * self.cal_diameter / 2.0)
    }

    async fn probe_edge(&mut self, direction: Direction) -> Result<f64, MotionError> {
        self.probe(direction).await?;
        let edge = self.probed_edge(direction).await?;
        *self.result.edge_mut(direction) = edge;
        Ok(edge)
    }

    fn z_stack(&self) -> f64 {
        self.params.z_clearance + self.params.probe_diam + self.params.extra_depth
    }
    pub async fn z_clearance_up(&mut self) -> Result<(), MotionError> {
        self.rapid_relative(&[(Axis::Z, self.z_stack())]).await
    }
    pub async fn z_clearance_down(&mut self) -> Result<(), MotionError> {
        self.rapid_relative(&[(Axis::Z, -self.z_stack())]).await
    }
    pub async fn raise_tool_depth(&mut self) -> Result<(), MotionError> {
        self.rapid_relative(&[(Axis::Z, self.params.z_clearance)]).await
    }
    pub async fn lower_tool_depth(&mut self) -> Result<(), MotionError> {
        self.rapid_relative(&[(Axis::Z, -self.params.z_clearance)]).await
    }

    /// Span between the X edges, or 0 (leaving `lx` alone) while either edge
    /// is unmeasured.
    pub fn length_x(&mut self) -> f64 {
        self.length(Direction::XMinus)
    }
    pub fn length_y(&mut self) -> f64 {
        self.length(Direction::YMinus)
    }
    fn length(&mut self, direction: Direction) -> f64 {
        let minus = self.result.edge(direction);
        let plus = self.result.edge(direction.opposite());
        if minus == 0.0 || plus == 0.0 {
            return 0.0;
        }
        let length = (minus - plus).abs();
        *self.result.length_mut(direction) = length;
        length
    }

    /// Zeroes the current work system on `axes` at the configured adjustment,
    /// when auto-zero is enabled.
    pub async fn set_zero(&mut self, axes: &[Axis]) -> Result<(), MotionError> {
        if !self.auto_zero {
            return Ok(());
        }
        let mut command = "G10 L20 P0".to_string();
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            if axes.contains(&axis) {
                let adjustment = match axis {
                    Axis::X => self.params.adj_x,
                    Axis::Y => self.params.adj_y,
                    Axis::Z => self.params.adj_z,
                };
                command += &format!(" {axis}{adjustment}");
            }
        }
        self.mdi_wait(&command).await?;
        self.runtime.reload_display().await;
        Ok(())
    }

    /// Records `degrees` and, when auto-skew is enabled, rotates the current
    /// work system by it about the zeroing point (or the current position).
    pub async fn rotate_coord_system(&mut self, degrees: f64) -> Result<(), MotionError> {
        self.result.a = degrees;
        if !self.params.allow_auto_skew {
            return Ok(());
        }
        let (x, y) = if self.auto_zero {
            (self.params.adj_x, self.params.adj_y)
        } else {
            let position = self.status.position();
            (position[0], position[1])
        };
        self.mdi_wait(&format!("G10 L2 P0 X{x} Y{y} R{degrees}")).await?;
        self.runtime.reload_display().await;
        Ok(())
    }

    pub fn add_history(&mut self, title: &str, fields: &[(Field, f64)]) {
        self.push_history(format_history(title, fields, self.status.is_metric()));
    }
    fn push_history(&mut self, entry: String) {
        info!("{}", entry);
        self.history.push(entry);
    }
}

/// Angle in degrees of an edge that rises by `rise` over `run`.
pub(crate) fn edge_angle(rise: f64, run: f64) -> f64 {
    rise.atan2(run).to_degrees()
}
