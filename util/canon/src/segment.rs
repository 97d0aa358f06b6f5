use serde::{Deserialize, Serialize};

use crate::coordinates::Position;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SegmentKind {
    Traverse { tool_offset: [f64; 3] },
    Feed { feed_rate: f64, tool_offset: [f64; 3] },
    ArcFeed { feed_rate: f64, tool_offset: [f64; 3] },
    Dwell { seconds: f64, plane: i32 },
    UserDefined,
}
impl SegmentKind {
    /// The tool offset recorded with a move; `None` for segments that do not
    /// describe tool motion.
    pub fn tool_offset(&self) -> Option<[f64; 3]> {
        match self {
            SegmentKind::Traverse { tool_offset }
            | SegmentKind::Feed { tool_offset, .. }
            | SegmentKind::ArcFeed { tool_offset, .. } => Some(*tool_offset),
            SegmentKind::Dwell { .. } | SegmentKind::UserDefined => None,
        }
    }
    pub fn line_type(&self) -> LineType {
        match self {
            SegmentKind::Traverse { .. } => LineType::Traverse,
            SegmentKind::Feed { .. } => LineType::Feed,
            SegmentKind::ArcFeed { .. } => LineType::ArcFeed,
            SegmentKind::Dwell { .. } => LineType::Dwell,
            SegmentKind::UserDefined => LineType::User,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSegment {
    pub line: i64,
    pub start: Position,
    pub end: Position,
    #[serde(flatten)]
    pub kind: SegmentKind,
}
impl MotionSegment {
    pub fn is_move(&self) -> bool {
        self.kind.tool_offset().is_some()
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineType { Traverse, Feed, ArcFeed, Dwell, User }

/// The XY projection of a recorded primitive, for 2D previews.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub kind: LineType,
    pub start: (f64, f64),
    pub end: (f64, f64),
}
impl PathPoint {
    pub fn new(kind: LineType, start: &Position, end: &Position) -> Self {
        PathPoint { kind, start: start.xy(), end: end.xy() }
    }
}
