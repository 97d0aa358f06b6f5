use super::{edge_angle, ProbeRoutines};
use crate::{
    direction::Direction,
    error::{InRoutine, MotionError, ProbeError},
    history::Field,
    runtime::{Axis, MachineStatus, MotionRuntime},
};

// Each angle probe touches one edge twice, `side_edge_length` apart, and
// rotates the work system by the skew found. Auto-zero is off meanwhile.
impl<R: MotionRuntime, S: MachineStatus> ProbeRoutines<R, S> {
    /// Front left corner.
    pub async fn probe_angle_yp(&mut self) -> Result<(), ProbeError> {
        self.skew(Direction::YPlus, "probe_angle_yp").await
    }
    /// Back right corner.
    pub async fn probe_angle_ym(&mut self) -> Result<(), ProbeError> {
        self.skew(Direction::YMinus, "probe_angle_ym").await
    }
    /// Back left corner.
    pub async fn probe_angle_xp(&mut self) -> Result<(), ProbeError> {
        self.skew(Direction::XPlus, "probe_angle_xp").await
    }
    /// Front right corner.
    pub async fn probe_angle_xm(&mut self) -> Result<(), ProbeError> {
        self.skew(Direction::XMinus, "probe_angle_xm").await
    }

    async fn skew(&mut self, direction: Direction, routine: &'static str) -> Result<(), ProbeError> {
        let auto_zero = std::mem::replace(&mut self.auto_zero, false);
        let result = self.skew_moves(direction).await.in_routine(routine);
        self.auto_zero = auto_zero;
        self.finish(result)
    }

    async fn skew_moves(&mut self, direction: Direction) -> Result<(), MotionError> {
        let axis = direction.axis();
        let edge_length = self.params.side_edge_length;
        // the second touch is made further along the edge, walking clockwise
        let step = match direction {
            Direction::YPlus => (Axis::X, edge_length),
            Direction::YMinus => (Axis::X, -edge_length),
            Direction::XPlus => (Axis::Y, -edge_length),
            Direction::XMinus => (Axis::Y, edge_length),
        };

        self.rapid_relative(&[(axis, -direction.sign() * self.params.xy_clearance)]).await?;
        self.z_clearance_down().await?;
        self.probe(direction).await?;
        let first = self.probed_edge(direction).await?;
        *self.result.center_mut(direction) = first;
        self.rapid_relative(&[step]).await?;
        let second = self.probe_edge(direction).await?;

        let rise = match direction {
            Direction::YPlus => second - first,
            _ => first - second,
        };
        let angle = edge_angle(rise, edge_length);
        self.add_history(
            &format!("Rotation {}", direction.short_name()),
            &[(Field::center(direction), first), (Field::edge(direction), second), (Field::A, angle)],
        );
        self.z_clearance_up().await?;
        self.rotate_coord_system(angle).await
    }
}
