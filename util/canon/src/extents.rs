use serde::{Deserialize, Serialize};

use crate::segment::MotionSegment;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Extents {
    pub min: [f64; 3],
    pub max: [f64; 3],
}
impl Extents {
    fn unbounded() -> Self {
        Extents {
            min: [f64::INFINITY; 3],
            max: [f64::NEG_INFINITY; 3],
        }
    }
    fn extend_to(&mut self, point: [f64; 3]) {
        for ((min, max), value) in self.min.iter_mut().zip(self.max.iter_mut()).zip(point) {
            *min = f64::min(*min, value);
            *max = f64::max(*max, value);
        }
    }
    pub fn size(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }
}

/// Bounds of the recorded positions, and of the same positions shifted by
/// the tool offset recorded with each move.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtentPair {
    pub extents: Extents,
    pub notool: Extents,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CanonExtents {
    pub as_moved: ExtentPair,
    pub zero_rotation: ExtentPair,
}

/// Bounds over the start and end of every move; dwells and user functions are
/// skipped. No moves gives zero extents.
pub fn calc_extents<'a>(segments: impl IntoIterator<Item = &'a MotionSegment>) -> ExtentPair {
    let mut extents = Extents::unbounded();
    let mut notool = Extents::unbounded();
    let mut any = false;
    for segment in segments {
        let Some(tool_offset) = segment.kind.tool_offset() else { continue };
        any = true;
        for point in [segment.start.xyz(), segment.end.xyz()] {
            extents.extend_to(point);
            notool.extend_to([
                point[0] + tool_offset[0],
                point[1] + tool_offset[1],
                point[2] + tool_offset[2],
            ]);
        }
    }
    if any {
        ExtentPair { extents, notool }
    } else {
        ExtentPair::default()
    }
}

#[cfg(test)]
pub mod test {
    use crate::{coordinates::Position, segment::SegmentKind};

    use super::*;

    fn segment(start: [f64; 3], end: [f64; 3], kind: SegmentKind) -> MotionSegment {
        MotionSegment {
            line: 0,
            start: Position::new(start[0], start[1], start[2], 0.0, 0.0, 0.0, 0.0, 0.0, 0.0),
            end: Position::new(end[0], end[1], end[2], 0.0, 0.0, 0.0, 0.0, 0.0, 0.0),
            kind,
        }
    }

    #[test]
    pub fn test_no_moves_is_zero() {
        let dwell = segment([1.0, 2.0, 3.0], [1.0, 2.0, 3.0], SegmentKind::Dwell { seconds: 1.0, plane: 0 });
        assert_eq!(calc_extents(&[dwell]), ExtentPair::default());
        assert_eq!(calc_extents(&Vec::<MotionSegment>::new()), ExtentPair::default());
    }

    #[test]
    pub fn test_bounds_cover_both_ends() {
        let segments = [
            segment([0.0, 0.0, 0.0], [10.0, -5.0, 1.0], SegmentKind::Traverse { tool_offset: [0.0; 3] }),
            segment([10.0, -5.0, 1.0], [3.0, 4.0, -2.0], SegmentKind::Feed { feed_rate: 1.0, tool_offset: [0.0, 0.0, 0.5] }),
        ];
        let result = calc_extents(&segments);
        assert_eq!(result.extents.min, [0.0, -5.0, -2.0]);
        assert_eq!(result.extents.max, [10.0, 4.0, 1.0]);
        assert_eq!(result.notool.min, [0.0, -5.0, -1.5]);
        assert_eq!(result.notool.max, [10.0, 4.0, 1.5]);
        assert_eq!(result.extents.size(), [10.0, 9.0, 3.0]);
    }
}
