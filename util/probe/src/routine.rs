use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::protocol::ProtocolError;

// One table drives the enum, its wire names and `ALL`.
macro_rules! routines {
    ($($variant:ident => $name:literal,)*) => {
        /// A probing procedure that can be run by name.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum Routine {
            $(
                #[serde(rename = $name)]
                $variant,
            )*
        }

        impl Routine {
            pub const ALL: &'static [Routine] = &[$(Routine::$variant,)*];

            pub fn name(&self) -> &'static str {
                match self {
                    $(Routine::$variant => $name,)*
                }
            }
        }
    };
}

routines! {
    ProbeXp => "probe_xp",
    ProbeXm => "probe_xm",
    ProbeYp => "probe_yp",
    ProbeYm => "probe_ym",
    ProbeOutsideXpyp => "probe_outside_xpyp",
    ProbeOutsideXpym => "probe_outside_xpym",
    ProbeOutsideXmyp => "probe_outside_xmyp",
    ProbeOutsideXmym => "probe_outside_xmym",
    ProbeInsideXpyp => "probe_inside_xpyp",
    ProbeInsideXpym => "probe_inside_xpym",
    ProbeInsideXmyp => "probe_inside_xmyp",
    ProbeInsideXmym => "probe_inside_xmym",
    ProbeXyHole => "probe_xy_hole",
    ProbeOutsideXyBoss => "probe_outside_xy_boss",
    ProbeOutsideLengthX => "probe_outside_length_x",
    ProbeOutsideLengthY => "probe_outside_length_y",
    ProbeInsideLengthX => "probe_inside_length_x",
    ProbeInsideLengthY => "probe_inside_length_y",
    ProbeAngleXp => "probe_angle_xp",
    ProbeAngleXm => "probe_angle_xm",
    ProbeAngleYp => "probe_angle_yp",
    ProbeAngleYm => "probe_angle_ym",
    ProbeDown => "probe_down",
    GotoToolsetter => "goto_toolsetter",
    ProbeToolZ => "probe_tool_z",
    ProbeTsZ => "probe_ts_z",
    ProbeToolZDiam => "probe_tool_z_diam",
    ProbeMaterialZ => "probe_material_z",
    Wait => "wait",
    ProbeRoundPocket => "probe_round_pocket",
    ProbeRoundBoss => "probe_round_boss",
    ProbeRectangularPocket => "probe_rectangular_pocket",
    ProbeRectangularBoss => "probe_rectangular_boss",
    ProbeRidgeX => "probe_ridge_x",
    ProbeRidgeY => "probe_ridge_y",
    ProbeValleyX => "probe_valley_x",
    ProbeValleyY => "probe_valley_y",
    ProbeCalRoundPocket => "probe_cal_round_pocket",
    ProbeCalSquarePocket => "probe_cal_square_pocket",
    ProbeCalRoundBoss => "probe_cal_round_boss",
    ProbeCalSquareBoss => "probe_cal_square_boss",
}

impl fmt::Display for Routine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Routine {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            // older front ends send the long name
            "probe_tool_with_toolsetter" => Ok(Routine::ProbeToolZ),
            _ => Routine::ALL
                .iter()
                .copied()
                .find(|routine| routine.name() == s)
                .ok_or_else(|| ProtocolError::UnknownRoutine(s.to_string())),
        }
    }
}

#[cfg(test)]
pub mod test {
    use std::collections::HashSet;

    use super::*;

    #[test]
    pub fn test_names_round_trip() {
        assert_eq!(Routine::ALL.len(), 41);
        let names: HashSet<&str> = Routine::ALL.iter().map(Routine::name).collect();
        assert_eq!(names.len(), Routine::ALL.len());
        for &routine in Routine::ALL {
            assert_eq!(routine.name().parse::<Routine>().unwrap(), routine);
            assert_eq!(serde_json::to_string(&routine).unwrap(), format!("\"{}\"", routine.name()));
        }
        assert_eq!("probe_tool_with_toolsetter".parse::<Routine>().unwrap(), Routine::ProbeToolZ);
        assert!(matches!("probe_sideways".parse::<Routine>(), Err(ProtocolError::UnknownRoutine(name)) if name == "probe_sideways"));
    }
}
