use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::runtime::Axis;

/// A cardinal probing direction in the XY plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    XMinus,
    XPlus,
    YMinus,
    YPlus,
}

impl Direction {
    pub fn axis(&self) -> Axis {
        match self {
            Direction::XMinus | Direction::XPlus => Axis::X,
            Direction::YMinus | Direction::YPlus => Axis::Y,
        }
    }
    pub fn sign(&self) -> f64 {
        match self {
            Direction::XMinus | Direction::YMinus => -1.0,
            Direction::XPlus | Direction::YPlus => 1.0,
        }
    }
    pub fn opposite(&self) -> Direction {
        match self {
            Direction::XMinus => Direction::XPlus,
            Direction::XPlus => Direction::XMinus,
            Direction::YMinus => Direction::YPlus,
            Direction::YPlus => Direction::YMinus,
        }
    }
    pub fn name(&self) -> &'static str {
        match self {
            Direction::XMinus => "xminus",
            Direction::XPlus => "xplus",
            Direction::YMinus => "yminus",
            Direction::YPlus => "yplus",
        }
    }
    /// Short form used in history titles, e.g. `XP`.
    pub fn short_name(&self) -> &'static str {
        match self {
            Direction::XMinus => "XM",
            Direction::XPlus => "XP",
            Direction::YMinus => "YM",
            Direction::YPlus => "YP",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid probe name: {0}")]
pub struct InvalidDirection(pub String);

impl FromStr for Direction {
    type Err = InvalidDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xminus" => Ok(Direction::XMinus),
            "xplus" => Ok(Direction::XPlus),
            "yminus" => Ok(Direction::YMinus),
            "yplus" => Ok(Direction::YPlus),
            _ => Err(InvalidDirection(s.to_string())),
        }
    }
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    pub fn test_parse() {
        assert_eq!("yminus".parse(), Ok(Direction::YMinus));
        assert_eq!("zplus".parse::<Direction>(), Err(InvalidDirection("zplus".into())));
        assert_eq!(serde_json::to_string(&Direction::XPlus).unwrap(), "\"xplus\"");
        assert_eq!(Direction::XPlus.opposite().sign(), -1.0);
        assert_eq!(Direction::YPlus.axis(), Axis::Y);
    }
}
