use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

pub const AXIS_COUNT: usize = 9;
pub const AXIS_CHARACTERS: [char; AXIS_COUNT] = ['X', 'Y', 'Z', 'A', 'B', 'C', 'U', 'V', 'W'];

/// Machine coordinates in XYZABCUVW order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position(pub [f64; AXIS_COUNT]);
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Offset(pub [f64; AXIS_COUNT]);

impl Position {
    pub fn new(x: f64, y: f64, z: f64, a: f64, b: f64, c: f64, u: f64, v: f64, w: f64) -> Self {
        Position([x, y, z, a, b, c, u, v, w])
    }
    pub fn xy(&self) -> (f64, f64) {
        (self.0[0], self.0[1])
    }
    pub fn xyz(&self) -> [f64; 3] {
        [self.0[0], self.0[1], self.0[2]]
    }
    pub fn with_xy(mut self, (x, y): (f64, f64)) -> Self {
        self.0[0] = x;
        self.0[1] = y;
        self
    }
}
impl Offset {
    pub fn xy(&self) -> (f64, f64) {
        (self.0[0], self.0[1])
    }
    pub fn xyz(&self) -> [f64; 3] {
        [self.0[0], self.0[1], self.0[2]]
    }
}
impl Add<Offset> for Position {
    type Output = Position;

    fn add(mut self, rhs: Offset) -> Self::Output {
        for (value, offset) in self.0.iter_mut().zip(rhs.0.iter()) {
            *value += offset;
        }
        self
    }
}
impl Sub<Offset> for Position {
    type Output = Position;

    fn sub(mut self, rhs: Offset) -> Self::Output {
        for (value, offset) in self.0.iter_mut().zip(rhs.0.iter()) {
            *value -= offset;
        }
        self
    }
}
