use serde::{Deserialize, Serialize};

use crate::direction::Direction;

/// Measurements produced by the probing routines.
///
/// `xm`/`xp` and `ym`/`yp` are edges found probing in the minus and plus
/// directions, `xc`/`yc` centers, `lx`/`ly` spans, `d` a diameter and `a` a
/// rotation in degrees. `th` and `bh` are the tool setter and material heights,
/// `offset` the last calibration offset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeResult {
    pub xm: f64,
    pub xc: f64,
    pub xp: f64,
    pub ym: f64,
    pub yc: f64,
    pub yp: f64,
    pub lx: f64,
    pub ly: f64,
    pub z: f64,
    pub d: f64,
    pub a: f64,
    pub delta: f64,
    pub th: f64,
    pub bh: f64,
    pub offset: f64,
}
impl ProbeResult {
    pub fn edge(&self, direction: Direction) -> f64 {
        match direction {
            Direction::XMinus => self.xm,
            Direction::XPlus => self.xp,
            Direction::YMinus => self.ym,
            Direction::YPlus => self.yp,
        }
    }
    pub fn edge_mut(&mut self, direction: Direction) -> &mut f64 {
        match direction {
            Direction::XMinus => &mut self.xm,
            Direction::XPlus => &mut self.xp,
            Direction::YMinus => &mut self.ym,
            Direction::YPlus => &mut self.yp,
        }
    }
    /// Center along the axis `direction` probes.
    pub fn center_mut(&mut self, direction: Direction) -> &mut f64 {
        match direction {
            Direction::XMinus | Direction::XPlus => &mut self.xc,
            Direction::YMinus | Direction::YPlus => &mut self.yc,
        }
    }
    pub fn length_mut(&mut self, direction: Direction) -> &mut f64 {
        match direction {
            Direction::XMinus | Direction::XPlus => &mut self.lx,
            Direction::YMinus | Direction::YPlus => &mut self.ly,
        }
    }
    pub fn clear_x(&mut self) {
        self.xm = 0.0;
        self.xc = 0.0;
        self.xp = 0.0;
        self.lx = 0.0;
    }
    pub fn clear_y(&mut self) {
        self.ym = 0.0;
        self.yc = 0.0;
        self.yp = 0.0;
        self.ly = 0.0;
    }
    pub fn clear_all(&mut self) {
        self.clear_x();
        self.clear_y();
        self.z = 0.0;
        self.d = 0.0;
        self.delta = 0.0;
        self.a = 0.0;
    }
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    pub fn test_clear() {
        let mut result = ProbeResult { xm: 1.0, xp: 2.0, yc: 3.0, ly: 4.0, z: 5.0, a: 6.0, th: 7.0, ..Default::default() };
        result.clear_x();
        assert_eq!((result.xm, result.xp, result.yc), (0.0, 0.0, 3.0));
        result.clear_all();
        assert_eq!(result, ProbeResult { th: 7.0, ..Default::default() });
    }
}
