use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::{coordinates::Position, transform::{OffsetState, Transform}};

pub const DEFAULT_ARC_DIVISION: u32 = 64;
const CIRCLE_FUZZ: f64 = 1e-6;

/// Arguments of an arc move, in the active plane's own axis order.
///
/// `first_end`/`second_end` are the end point in the plane, `first_axis`/`second_axis`
/// the center, and `axis_end_point` the end along the helix axis. `rotation` is
/// positive for counterclockwise arcs; its magnitude counts turns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcFeed {
    pub first_end: f64,
    pub second_end: f64,
    pub first_axis: f64,
    pub second_axis: f64,
    pub rotation: i32,
    pub axis_end_point: f64,
    #[serde(default)]
    pub a: f64,
    #[serde(default)]
    pub b: f64,
    #[serde(default)]
    pub c: f64,
    #[serde(default)]
    pub u: f64,
    #[serde(default)]
    pub v: f64,
    #[serde(default)]
    pub w: f64,
}

/// Machine axis indices of the (first, second, helix) axes of a plane.
pub fn plane_axes(plane: i32) -> (usize, usize, usize) {
    match plane {
        1 => (0, 1, 2),
        3 => (2, 0, 1),
        _ => (1, 2, 0),
    }
}

/// Splits an arc starting at `start` into chord end points. The final point
/// is exactly the transformed end of the arc.
pub fn arc_to_segments(
    start: &Position,
    arc: &ArcFeed,
    plane: i32,
    offsets: &OffsetState,
    quantum: u32,
) -> Vec<Position> {
    let (x, y, z) = plane_axes(plane);
    let mut end = Position([0.0; 9]);
    end.0[x] = arc.first_end;
    end.0[y] = arc.second_end;
    end.0[z] = arc.axis_end_point;
    end.0[3..].copy_from_slice(&[arc.a, arc.b, arc.c, arc.u, arc.v, arc.w]);
    let end = offsets.transform(&end);

    let mut center = (arc.first_axis + offsets.g92.0[x], arc.second_axis + offsets.g92.0[y]);
    if plane == 1 && !offsets.rotation.is_identity() {
        center = offsets.rotation.rotate(center);
    }
    let (cx, cy) = (center.0 + offsets.g5x.0[x], center.1 + offsets.g5x.0[y]);

    let theta1 = (start.0[y] - cy).atan2(start.0[x] - cx);
    let mut theta2 = (end.0[y] - cy).atan2(end.0[x] - cx);
    if arc.rotation < 0 {
        while theta2 - theta1 > -CIRCLE_FUZZ {
            theta2 -= 2.0 * PI;
        }
    } else {
        while theta2 - theta1 < CIRCLE_FUZZ {
            theta2 += 2.0 * PI;
        }
    }
    if arc.rotation < -1 {
        theta2 += 2.0 * PI * (arc.rotation + 1) as f64;
    }
    if arc.rotation > 1 {
        theta2 += 2.0 * PI * (arc.rotation - 1) as f64;
    }

    let dtheta = theta2 - theta1;
    let steps = usize::max(3, (quantum as f64 * dtheta.abs() / PI) as usize);
    let step_fraction = 1.0 / steps as f64;
    let (step_sin, step_cos) = (dtheta * step_fraction).sin_cos();
    let (mut tx, mut ty) = (start.0[x] - cx, start.0[y] - cy);

    let mut points = Vec::with_capacity(steps);
    for i in 1..steps {
        let f = i as f64 * step_fraction;
        (tx, ty) = (tx * step_cos - ty * step_sin, tx * step_sin + ty * step_cos);
        let mut point = Position([0.0; 9]);
        point.0[x] = tx + cx;
        point.0[y] = ty + cy;
        point.0[z] = start.0[z] + (end.0[z] - start.0[z]) * f;
        for axis in 3..9 {
            point.0[axis] = start.0[axis] + (end.0[axis] - start.0[axis]) * f;
        }
        points.push(point);
    }
    points.push(end);
    points
}

#[cfg(test)]
pub mod test {
    use super::*;

    fn arc(first_end: f64, second_end: f64, rotation: i32) -> ArcFeed {
        ArcFeed {
            first_end,
            second_end,
            first_axis: 0.0,
            second_axis: 0.0,
            rotation,
            axis_end_point: 0.0,
            a: 0.0, b: 0.0, c: 0.0, u: 0.0, v: 0.0, w: 0.0,
        }
    }

    fn start_at(x: f64, y: f64) -> Position {
        Position::new(x, y, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0)
    }

    #[test]
    pub fn test_quarter_circle_counterclockwise() {
        let points = arc_to_segments(&start_at(1.0, 0.0), &arc(0.0, 1.0, 1), 1, &OffsetState::default(), 64);
        assert_eq!(points.len(), 32);
        for point in &points {
            let radius = point.0[0].hypot(point.0[1]);
            assert!((radius - 1.0).abs() < 1e-9);
            assert!(point.0[0] >= -1e-9 && point.0[1] >= -1e-9);
        }
        assert_eq!(points.last().map(|p| p.xy()), Some((0.0, 1.0)));
    }

    #[test]
    pub fn test_clockwise_goes_the_long_way() {
        let points = arc_to_segments(&start_at(1.0, 0.0), &arc(0.0, 1.0, -1), 1, &OffsetState::default(), 64);
        // three quarters of a turn through negative Y
        assert!(points.len() > 90);
        assert!(points[points.len() / 2].0[1] < 0.0);
        assert_eq!(points.last().map(|p| p.xy()), Some((0.0, 1.0)));
    }

    #[test]
    pub fn test_full_circle_and_extra_turns() {
        let one_turn = arc_to_segments(&start_at(1.0, 0.0), &arc(1.0, 0.0, 1), 1, &OffsetState::default(), 64);
        assert_eq!(one_turn.len(), 128);
        let two_turns = arc_to_segments(&start_at(1.0, 0.0), &arc(1.0, 0.0, 2), 1, &OffsetState::default(), 64);
        assert_eq!(two_turns.len(), 256);
    }

    #[test]
    pub fn test_tiny_arc_has_minimum_steps() {
        let angle = 0.01f64;
        let points = arc_to_segments(&start_at(1.0, 0.0), &arc(angle.cos(), angle.sin(), 1), 1, &OffsetState::default(), 64);
        assert_eq!(points.len(), 3);
    }

    #[test]
    pub fn test_helix_interpolates() {
        let mut helix = arc(-1.0, 0.0, 1);
        helix.axis_end_point = 4.0;
        helix.a = 8.0;
        let points = arc_to_segments(&start_at(1.0, 0.0), &helix, 1, &OffsetState::default(), 64);
        assert_eq!(points.len(), 64);
        assert!((points[31].0[2] - 2.0).abs() < 1e-9);
        assert!((points[31].0[3] - 4.0).abs() < 1e-9);
        assert_eq!(points[63].0[2], 4.0);
    }

    #[test]
    pub fn test_xz_plane_maps_axes() {
        // G18: first coordinate is Z, second is X
        let start = Position::new(0.0, 5.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let points = arc_to_segments(&start, &arc(0.0, 1.0, 1), 3, &OffsetState::default(), 64);
        let end = points[points.len() - 1];
        assert_eq!(end.xyz(), [1.0, 0.0, 0.0]);
        assert!(points.iter().all(|p| (p.0[2].hypot(p.0[0]) - 1.0).abs() < 1e-9));
    }
}
