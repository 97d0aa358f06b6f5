use super::ProbeRoutines;
use crate::{
    direction::Direction,
    error::{InRoutine, MotionError, ProbeError},
    history::Field,
    runtime::{Axis, MachineStatus, MotionRuntime},
};

// Edges are probed from `xy_clearance` outside them. Corners are probed
// `side_edge_length` along each edge from the corner.
impl<R: MotionRuntime, S: MachineStatus> ProbeRoutines<R, S> {
    /// Left outside edge, right inside edge.
    pub async fn probe_xp(&mut self) -> Result<(), ProbeError> {
        let result = self.single_edge(Direction::XPlus).await.in_routine("probe_xp");
        self.finish(result)
    }
    /// Right outside edge, left inside edge.
    pub async fn probe_xm(&mut self) -> Result<(), ProbeError> {
        let result = self.single_edge(Direction::XMinus).await.in_routine("probe_xm");
        self.finish(result)
    }
    /// Front outside edge, back inside edge.
    pub async fn probe_yp(&mut self) -> Result<(), ProbeError> {
        let result = self.single_edge(Direction::YPlus).await.in_routine("probe_yp");
        self.finish(result)
    }
    /// Back outside edge, front inside edge.
    pub async fn probe_ym(&mut self) -> Result<(), ProbeError> {
        let result = self.single_edge(Direction::YMinus).await.in_routine("probe_ym");
        self.finish(result)
    }

    /// Front left outside corner.
    pub async fn probe_outside_xpyp(&mut self) -> Result<(), ProbeError> {
        let result = self.outside_corner(Direction::XPlus, Direction::YPlus).await.in_routine("probe_outside_xpyp");
        self.finish(result)
    }
    /// Back left outside corner.
    pub async fn probe_outside_xpym(&mut self) -> Result<(), ProbeError> {
        let result = self.outside_corner(Direction::XPlus, Direction::YMinus).await.in_routine("probe_outside_xpym");
        self.finish(result)
    }
    /// Front right outside corner.
    pub async fn probe_outside_xmyp(&mut self) -> Result<(), ProbeError> {
        let result = self.outside_corner(Direction::XMinus, Direction::YPlus).await.in_routine("probe_outside_xmyp");
        self.finish(result)
    }
    /// Back right outside corner.
    pub async fn probe_outside_xmym(&mut self) -> Result<(), ProbeError> {
        let result = self.outside_corner(Direction::XMinus, Direction::YMinus).await.in_routine("probe_outside_xmym");
        self.finish(result)
    }

    /// Back right inside corner.
    pub async fn probe_inside_xpyp(&mut self) -> Result<(), ProbeError> {
        let result = self.inside_corner(Direction::XPlus, Direction::YPlus).await.in_routine("probe_inside_xpyp");
        self.finish(result)
    }
    /// Front right inside corner.
    pub async fn probe_inside_xpym(&mut self) -> Result<(), ProbeError> {
        let result = self.inside_corner(Direction::XPlus, Direction::YMinus).await.in_routine("probe_inside_xpym");
        self.finish(result)
    }
    /// Back left inside corner.
    pub async fn probe_inside_xmyp(&mut self) -> Result<(), ProbeError> {
        let result = self.inside_corner(Direction::XMinus, Direction::YPlus).await.in_routine("probe_inside_xmyp");
        self.finish(result)
    }
    /// Front left inside corner.
    pub async fn probe_inside_xmym(&mut self) -> Result<(), ProbeError> {
        let result = self.inside_corner(Direction::XMinus, Direction::YMinus).await.in_routine("probe_inside_xmym");
        self.finish(result)
    }

    async fn single_edge(&mut self, direction: Direction) -> Result<(), MotionError> {
        let axis = direction.axis();
        self.rapid_relative(&[(axis, -direction.sign() * self.params.xy_clearance)]).await?;
        self.z_clearance_down().await?;
        let edge = self.probe_edge(direction).await?;
        self.add_history(
            &format!("Outside {}", direction.short_name()),
            &[(Field::edge(direction), edge), (Field::length(direction), 0.0)],
        );
        self.z_clearance_up().await?;
        self.rapid_to(&[(axis, edge)]).await?;
        self.set_zero(&[axis]).await
    }

    async fn outside_corner(&mut self, x: Direction, y: Direction) -> Result<(), MotionError> {
        let edge = self.params.side_edge_length;
        let clearance = self.params.xy_clearance;
        let latch = self.params.latch_return_dist;
        self.rapid_relative(&[(Axis::X, -x.sign() * clearance), (Axis::Y, y.sign() * edge)]).await?;
        self.z_clearance_down().await?;
        let found_x = self.probe_edge(x).await?;
        self.z_clearance_up().await?;
        // over the top of the part to the other side
        self.rapid_relative(&[(Axis::X, x.sign() * (edge + latch)), (Axis::Y, -y.sign() * (edge + clearance))])
            .await?;
        self.z_clearance_down().await?;
        let found_y = self.probe_edge(y).await?;
        self.add_history(
            &format!("Outside {}{}", x.short_name(), y.short_name()),
            &[(Field::edge(x), found_x), (Field::edge(y), found_y)],
        );
        self.z_clearance_up().await?;
        self.rapid_to(&[(Axis::X, found_x), (Axis::Y, found_y)]).await?;
        self.set_zero(&[Axis::X, Axis::Y]).await
    }

    async fn inside_corner(&mut self, x: Direction, y: Direction) -> Result<(), MotionError> {
        let edge = self.params.side_edge_length;
        let clearance = self.params.xy_clearance;
        let latch = self.params.latch_return_dist;
        self.rapid_relative(&[(Axis::X, -x.sign() * clearance), (Axis::Y, -y.sign() * edge)]).await?;
        self.z_clearance_down().await?;
        let found_x = self.probe_edge(x).await?;
        let length_x = self.length_x();
        self.rapid_relative(&[(Axis::X, -x.sign() * (clearance - latch)), (Axis::Y, y.sign() * (edge - clearance))])
            .await?;
        let found_y = self.probe_edge(y).await?;
        let length_y = self.length_y();
        self.add_history(
            &format!("Inside {}{}", x.short_name(), y.short_name()),
            &[
                (Field::edge(x), found_x),
                (Field::Lx, length_x),
                (Field::edge(y), found_y),
                (Field::Ly, length_y),
            ],
        );
        self.z_clearance_up().await?;
        self.rapid_to(&[(Axis::X, found_x), (Axis::Y, found_y)]).await?;
        self.set_zero(&[Axis::X, Axis::Y]).await
    }
}
