use super::ProbeRoutines;
use crate::{
    direction::Direction,
    error::{InRoutine, MotionError, ProbeError},
    history::Field,
    runtime::{Axis, MachineStatus, MotionRuntime},
};

impl<R: MotionRuntime, S: MachineStatus> ProbeRoutines<R, S> {
    /// Center and diameter of a hole, starting roughly at its center.
    pub async fn probe_xy_hole(&mut self) -> Result<(), ProbeError> {
        let result = self.xy_hole(self.params.side_edge_length).await;
        self.finish(result)
    }

    /// Center of a boss measured `x` and `y` out from the start point.
    pub async fn probe_outside_xy_boss(&mut self, x: f64, y: f64) -> Result<(), ProbeError> {
        let result = self.outside_xy_boss(x, y).await;
        self.finish(result)
    }

    pub async fn probe_outside_length_x(&mut self) -> Result<(), ProbeError> {
        let result = self.outside_length(Direction::XMinus, self.params.side_edge_length).await;
        self.finish(result)
    }
    pub async fn probe_outside_length_y(&mut self) -> Result<(), ProbeError> {
        let result = self.outside_length(Direction::YMinus, self.params.side_edge_length).await;
        self.finish(result)
    }
    pub async fn probe_inside_length_x(&mut self) -> Result<(), ProbeError> {
        let result = self.inside_length(Direction::XMinus, self.params.side_edge_length).await;
        self.finish(result)
    }
    pub async fn probe_inside_length_y(&mut self) -> Result<(), ProbeError> {
        let result = self.inside_length(Direction::YMinus, self.params.side_edge_length).await;
        self.finish(result)
    }

    /// Probes Z down from the current position and zeroes Z there, ending
    /// `z_clearance` above the surface.
    pub async fn probe_down(&mut self) -> Result<(), ProbeError> {
        let result = self.straight_down().await.in_routine("probe_down");
        self.finish(result)
    }

    pub(super) async fn xy_hole(&mut self, edge: f64) -> Result<(), ProbeError> {
        let approach = edge - self.params.xy_clearance;
        if approach <= 0.0 {
            if self.params.max_travel < edge {
                return Err(ProbeError::validation(
                    "probe_xy_hole: Max travel is less than hole radius while xy_clearance is too large for rapid positioning",
                ));
            }
            if self.params.max_travel < 2.0 * edge - self.params.latch_return_dist {
                return Err(ProbeError::validation(
                    "probe_xy_hole: Max travel is less than hole diameter while xy_clearance is too large for rapid positioning",
                ));
            }
        }
        self.xy_hole_moves(edge, approach).await.in_routine("probe_xy_hole")
    }

    async fn xy_hole_moves(&mut self, edge: f64, approach: f64) -> Result<(), MotionError> {
        let crossing = 2.0 * edge - self.params.latch_return_dist - self.params.xy_clearance;
        self.z_clearance_down().await?;

        if approach > 0.0 {
            self.rapid_relative(&[(Axis::X, -approach)]).await?;
        }
        let xm = self.probe_edge(Direction::XMinus).await?;
        if crossing > 0.0 {
            self.rapid_relative(&[(Axis::X, crossing)]).await?;
        }
        let xp = self.probe_edge(Direction::XPlus).await?;
        let length_x = self.length_x();
        let xc = (xm + xp) / 2.0;
        self.result.xc = xc;
        self.mdi_wait(&format!("G90\nG1 X{xc} F{}", self.params.rapid_vel)).await?;

        if approach > 0.0 {
            self.rapid_relative(&[(Axis::Y, -approach)]).await?;
        }
        let ym = self.probe_edge(Direction::YMinus).await?;
        if crossing > 0.0 {
            self.rapid_relative(&[(Axis::Y, crossing)]).await?;
        }
        let yp = self.probe_edge(Direction::YPlus).await?;
        let length_y = self.length_y();
        let yc = (ym + yp) / 2.0;
        self.result.yc = yc;
        self.result.d = ((xp - xm) + (yp - ym)) / 2.0;
        self.add_history(
            "Inside Hole",
            &[
                (Field::Xm, xm),
                (Field::Xc, xc),
                (Field::Xp, xp),
                (Field::Lx, length_x),
                (Field::Ym, ym),
                (Field::Yc, yc),
                (Field::Yp, yp),
                (Field::Ly, length_y),
                (Field::D, self.result.d),
            ],
        );
        self.z_clearance_up().await?;
        self.rapid_to(&[(Axis::Y, yc)]).await?;
        self.set_zero(&[Axis::X, Axis::Y]).await
    }

    pub(super) async fn outside_xy_boss(&mut self, x: f64, y: f64) -> Result<(), ProbeError> {
        self.outside_length(Direction::XMinus, x).await?;
        self.outside_length(Direction::YMinus, y).await
    }

    /// Measures across a part `edge` either side of the start point along
    /// the axis of `minus`, going over the top between the two probes.
    pub(super) async fn outside_length(&mut self, minus: Direction, edge: f64) -> Result<(), ProbeError> {
        let routine = match minus.axis() {
            Axis::X => "probe_outside_length_x",
            _ => "probe_outside_length_y",
        };
        self.outside_length_moves(minus, edge).await.in_routine(routine)
    }

    async fn outside_length_moves(&mut self, minus: Direction, edge: f64) -> Result<(), MotionError> {
        let axis = minus.axis();
        let plus = minus.opposite();
        let clearance = self.params.xy_clearance;
        self.rapid_relative(&[(axis, -(edge + clearance))]).await?;
        self.z_clearance_down().await?;
        let found_plus = self.probe_edge(plus).await?;
        self.z_clearance_up().await?;
        self.rapid_relative(&[(axis, 2.0 * edge + clearance + self.params.latch_return_dist)]).await?;
        self.z_clearance_down().await?;
        let found_minus = self.probe_edge(minus).await?;
        let center = (found_plus + found_minus) / 2.0;
        *self.result.center_mut(minus) = center;
        let length = self.length(minus);
        self.add_history(
            &format!("Outside Length {}", axis),
            &[
                (Field::edge(minus), found_minus),
                (Field::center(minus), center),
                (Field::edge(plus), found_plus),
                (Field::length(minus), length),
            ],
        );
        self.z_clearance_up().await?;
        self.rapid_to(&[(axis, center)]).await?;
        self.set_zero(&[axis]).await
    }

    /// Measures across a gap from inside it, `edge` either side of the
    /// start point along the axis of `minus`.
    pub(super) async fn inside_length(&mut self, minus: Direction, edge: f64) -> Result<(), ProbeError> {
        let routine = match minus.axis() {
            Axis::X => "probe_inside_length_x",
            _ => "probe_inside_length_y",
        };
        self.inside_length_moves(minus, edge).await.in_routine(routine)
    }

    async fn inside_length_moves(&mut self, minus: Direction, edge: f64) -> Result<(), MotionError> {
        let axis = minus.axis();
        let plus = minus.opposite();
        let clearance = self.params.xy_clearance;
        self.z_clearance_down().await?;
        self.rapid_relative(&[(axis, -(edge - clearance))]).await?;
        let found_minus = self.probe_edge(minus).await?;
        self.rapid_relative(&[(axis, 2.0 * edge - self.params.latch_return_dist - clearance)]).await?;
        let found_plus = self.probe_edge(plus).await?;
        let length = self.length(minus);
        let center = (found_minus + found_plus) / 2.0;
        *self.result.center_mut(minus) = center;
        self.add_history(
            &format!("Inside Length {}", axis),
            &[
                (Field::edge(minus), found_minus),
                (Field::center(minus), center),
                (Field::edge(plus), found_plus),
                (Field::length(minus), length),
            ],
        );
        self.z_clearance_up().await?;
        self.rapid_to(&[(axis, center)]).await?;
        self.set_zero(&[axis]).await
    }

    async fn straight_down(&mut self) -> Result<(), MotionError> {
        let latch = self.params.latch_return_dist;
        self.mdi_wait("G91").await?;
        self.mdi_wait(&format!("G38.2 Z{} F{}", -self.params.max_z, self.params.search_vel))
            .await
            .map_err(|e| MotionError::Runtime(format!("fast probe failed: {}", e)))?;
        self.mdi_wait(&format!("G1 Z{} F{}", latch, self.params.rapid_vel))
            .await
            .map_err(|e| MotionError::Runtime(format!("latch return failed: {}", e)))?;
        self.mdi_wait(&format!("G4 P0.5\nG38.2 Z{} F{}", -1.2 * latch, self.params.probe_vel))
            .await
            .map_err(|e| MotionError::Runtime(format!("slow probe failed: {}", e)))?;
        let z = self.runtime.probed_position_with_offsets().await?[2];
        self.result.z = z;
        self.add_history("Straight Down", &[(Field::Z, z)]);
        self.set_zero(&[Axis::Z]).await?;
        self.rapid_relative(&[(Axis::Z, self.params.z_clearance)])
            .await
            .map_err(|e| MotionError::Runtime(format!("move to Z clearance failed: {}", e)))
    }
}
