use itertools::Itertools;

use crate::direction::Direction;

/// Result fields that can appear in a history line, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field { Xm, Xc, Xp, Lx, Ym, Yc, Yp, Ly, Z, D, A }

impl Field {
    pub fn edge(direction: Direction) -> Field {
        match direction {
            Direction::XMinus => Field::Xm,
            Direction::XPlus => Field::Xp,
            Direction::YMinus => Field::Ym,
            Direction::YPlus => Field::Yp,
        }
    }
    /// Center of the axis `direction` probes along.
    pub fn center(direction: Direction) -> Field {
        match direction {
            Direction::XMinus | Direction::XPlus => Field::Xc,
            Direction::YMinus | Direction::YPlus => Field::Yc,
        }
    }
    pub fn length(direction: Direction) -> Field {
        match direction {
            Direction::XMinus | Direction::XPlus => Field::Lx,
            Direction::YMinus | Direction::YPlus => Field::Ly,
        }
    }
    pub fn label(&self) -> &'static str {
        match self {
            Field::Xm => "Xm",
            Field::Xc => "Xc",
            Field::Xp => "Xp",
            Field::Lx => "Lx",
            Field::Ym => "Ym",
            Field::Yc => "Yc",
            Field::Yp => "Yp",
            Field::Ly => "Ly",
            Field::Z => "Z",
            Field::D => "D",
            Field::A => "A",
        }
    }
}

/// Formats `Title Xm[1.000] Lx[2.000]`; metric values get three decimals,
/// imperial four.
pub fn format_history(title: &str, fields: &[(Field, f64)], metric: bool) -> String {
    let precision = if metric { 3 } else { 4 };
    std::iter::once(title.to_string())
        .chain(
            fields
                .iter()
                .sorted_by_key(|(field, _)| *field)
                .map(|(field, value)| format!("{}[{:.*}]", field.label(), precision, value)),
        )
        .join(" ")
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    pub fn test_format_history() {
        assert_eq!(
            format_history("Inside Length X", &[(Field::Lx, 20.0), (Field::Xm, -10.0), (Field::Xp, 10.0), (Field::Xc, 0.0)], true),
            "Inside Length X Xm[-10.000] Xc[0.000] Xp[10.000] Lx[20.000]"
        );
        assert_eq!(format_history("Straight Down", &[(Field::Z, 1.23456)], false), "Straight Down Z[1.2346]");
        assert_eq!(format_history("Note", &[], true), "Note");
    }
}
