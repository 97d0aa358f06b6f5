use serde::{Deserialize, Serialize};

use crate::coordinates::{Offset, Position};

pub trait Transform<T> {
    fn transform(&self, value: &T) -> T;
}

/// A rotation of the XY plane with its cosine and sine cached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XyRotation {
    degrees: f64,
    cos: f64,
    sin: f64,
}
impl XyRotation {
    pub fn new(degrees: f64) -> Self {
        let theta = degrees.to_radians();
        XyRotation { degrees, cos: theta.cos(), sin: theta.sin() }
    }
    pub fn identity() -> Self {
        XyRotation { degrees: 0.0, cos: 1.0, sin: 0.0 }
    }
    pub fn degrees(&self) -> f64 {
        self.degrees
    }
    pub fn is_identity(&self) -> bool {
        self.degrees == 0.0
    }
    /// The rotation by the negated angle; reuses the cached values so that
    /// applying a rotation and then its inverse only loses rounding error.
    pub fn inverse(&self) -> Self {
        XyRotation { degrees: -self.degrees, cos: self.cos, sin: -self.sin }
    }
    pub fn rotate(&self, (x, y): (f64, f64)) -> (f64, f64) {
        (x * self.cos - y * self.sin, x * self.sin + y * self.cos)
    }
    pub fn rotate_about(&self, (cx, cy): (f64, f64), (x, y): (f64, f64)) -> (f64, f64) {
        let (x, y) = self.rotate((x - cx, y - cy));
        (x + cx, y + cy)
    }
}
impl Default for XyRotation {
    fn default() -> Self {
        Self::identity()
    }
}
impl Serialize for XyRotation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.degrees.serialize(serializer)
    }
}
impl<'de> Deserialize<'de> for XyRotation {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        f64::deserialize(deserializer).map(XyRotation::new)
    }
}

/// Rotation of the XY components of a position around a fixed center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationAbout {
    pub rotation: XyRotation,
    pub center: (f64, f64),
}
impl Transform<Position> for RotationAbout {
    fn transform(&self, value: &Position) -> Position {
        value.with_xy(self.rotation.rotate_about(self.center, value.xy()))
    }
}

/// The coordinate offsets applied to every programmed position.
///
/// Positions are shifted by the g92 offset, rotated in XY, then shifted by the
/// g5x offset. The rotation therefore acts on g92-relative coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OffsetState {
    pub g5x_index: i32,
    pub g5x: Offset,
    pub g92: Offset,
    pub rotation: XyRotation,
}
impl OffsetState {
    /// Undoes the XY rotation around the g5x origin, giving the position the
    /// same move would have had with no rotation active.
    pub fn unrotation(&self) -> RotationAbout {
        RotationAbout {
            rotation: self.rotation.inverse(),
            center: self.g5x.xy(),
        }
    }
    pub fn rotation_about_origin(&self) -> RotationAbout {
        RotationAbout {
            rotation: self.rotation,
            center: self.g5x.xy(),
        }
    }
}
impl Default for OffsetState {
    fn default() -> Self {
        OffsetState {
            g5x_index: 1,
            g5x: Offset::default(),
            g92: Offset::default(),
            rotation: XyRotation::identity(),
        }
    }
}
impl Transform<Position> for OffsetState {
    fn transform(&self, value: &Position) -> Position {
        let mut result = *value + self.g92;
        if !self.rotation.is_identity() {
            result = result.with_xy(self.rotation.rotate(result.xy()));
        }
        result + self.g5x
    }
}

#[cfg(test)]
pub mod test {
    use proptest::prelude::*;

    use super::*;

    fn are_close(a: &Position, b: &Position) -> bool {
        a.0.iter().zip(b.0.iter()).all(|(a, b)| (a - b).abs() < 1e-6)
    }

    fn axes() -> impl Strategy<Value = [f64; 9]> {
        proptest::array::uniform9(-1000.0..1000.0f64)
    }

    #[test]
    pub fn test_quarter_turn_is_counterclockwise() {
        let state = OffsetState { rotation: XyRotation::new(90.0), ..Default::default() };
        let result = state.transform(&Position::new(1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0));
        assert!(are_close(&result, &Position::new(0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0)), "{:?}", result);
    }

    #[test]
    pub fn test_offsets_apply_around_rotation() {
        let mut g92 = Offset::default();
        g92.0[0] = 1.0;
        let mut g5x = Offset::default();
        g5x.0[0] = 10.0;
        g5x.0[3] = 5.0;
        let state = OffsetState { g5x_index: 2, g5x, g92, rotation: XyRotation::new(90.0) };
        let result = state.transform(&Position::default());
        // g92 shifts X to 1, rotation moves it to Y, g5x adds 10 to X and 5 to A
        assert!(are_close(&result, &Position::new(10.0, 1.0, 0.0, 5.0, 0.0, 0.0, 0.0, 0.0, 0.0)), "{:?}", result);
    }

    #[test]
    pub fn test_identity_skips_rotation() {
        let state = OffsetState::default();
        let position = Position::new(1.5, -2.5, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0);
        assert_eq!(state.transform(&position), position);
    }

    proptest! {
        #[test]
        fn unrotation_inverts_rotation(
            position in axes(),
            g5x in axes(),
            g92 in axes(),
            degrees in -720.0..720.0f64,
        ) {
            let state = OffsetState {
                g5x_index: 1,
                g5x: Offset(g5x),
                g92: Offset(g92),
                rotation: XyRotation::new(degrees),
            };
            let moved = state.transform(&Position(position));
            let unrotated = state.unrotation().transform(&moved);
            let unrotated_state = OffsetState { rotation: XyRotation::identity(), ..state };
            prop_assert!(are_close(&unrotated, &unrotated_state.transform(&Position(position))));
            let rotated_again = state.rotation_about_origin().transform(&unrotated);
            prop_assert!(are_close(&rotated_again, &moved));
        }
    }
}
