use tracing::warn;

use crate::{
    arc::{arc_to_segments, ArcFeed, DEFAULT_ARC_DIVISION},
    callbacks::{CanonCallbacks, InterpreterState},
    coordinates::{Offset, Position},
    extents::{calc_extents, CanonExtents},
    segment::{LineType, MotionSegment, PathPoint, SegmentKind},
    status::{CanonStatus, ToolEntry},
    transform::{OffsetState, Transform, XyRotation},
};

/// Records the toolpath of a program as the interpreter reports it.
pub struct Canon {
    status: Option<Box<dyn CanonStatus + Send>>,
    tools: Vec<ToolEntry>,
    arc_division: u32,
    offsets: OffsetState,
    tool_length_offset: Offset,
    last: Position,
    first_move: bool,
    in_arc: bool,
    suppress: u32,
    feed_rate: f64,
    dwell_time: f64,
    plane: i32,
    state: InterpreterState,
    tool_list: Vec<i32>,
    segments: Vec<MotionSegment>,
    zero_rotation: Vec<MotionSegment>,
    path_points: Vec<PathPoint>,
    extents: CanonExtents,
}

impl Canon {
    pub fn new() -> Self {
        Canon {
            status: None,
            tools: Vec::new(),
            arc_division: DEFAULT_ARC_DIVISION,
            offsets: OffsetState::default(),
            tool_length_offset: Offset::default(),
            last: Position::default(),
            first_move: true,
            in_arc: false,
            suppress: 0,
            feed_rate: 1.0,
            dwell_time: 0.0,
            plane: 1,
            state: InterpreterState { sequence_number: -1, ..Default::default() },
            tool_list: Vec::new(),
            segments: Vec::new(),
            zero_rotation: Vec::new(),
            path_points: Vec::new(),
            extents: CanonExtents::default(),
        }
    }
    /// A canon answering tool and unit queries from `status`. The tool table
    /// is copied once, here.
    pub fn with_status(status: impl CanonStatus + Send + 'static) -> Self {
        let mut canon = Self::new();
        canon.tools = status.tool_table().unwrap_or_default();
        canon.status = Some(Box::new(status));
        canon
    }
    pub fn set_arc_division(&mut self, quantum: u32) {
        self.arc_division = quantum;
    }
    /// Forgets everything recorded so far, ready for another pass over a program.
    pub fn clear(&mut self) {
        let status = self.status.take();
        let tools = std::mem::take(&mut self.tools);
        let arc_division = self.arc_division;
        *self = Self::new();
        self.status = status;
        self.tools = tools;
        self.arc_division = arc_division;
    }
    pub fn suppress(&mut self) {
        self.suppress += 1;
    }
    pub fn resume(&mut self) {
        self.suppress = self.suppress.saturating_sub(1);
    }

    pub fn offsets(&self) -> &OffsetState {
        &self.offsets
    }
    pub fn rotate_and_translate(&self, position: &Position) -> Position {
        self.offsets.transform(position)
    }
    pub fn last_position(&self) -> &Position {
        &self.last
    }
    pub fn tool_length_offset(&self) -> &Offset {
        &self.tool_length_offset
    }
    pub fn feed_rate(&self) -> f64 {
        self.feed_rate
    }
    pub fn dwell_time(&self) -> f64 {
        self.dwell_time
    }
    pub fn sequence_number(&self) -> i64 {
        self.state.sequence_number
    }
    pub fn in_arc(&self) -> bool {
        self.in_arc
    }
    pub fn is_first_move(&self) -> bool {
        self.first_move
    }
    pub fn tool_list(&self) -> &[i32] {
        &self.tool_list
    }
    pub fn segments(&self) -> &[MotionSegment] {
        &self.segments
    }
    pub fn segments_of(&self, kind: LineType) -> impl Iterator<Item = &MotionSegment> {
        self.segments.iter().filter(move |segment| segment.kind.line_type() == kind)
    }
    pub fn zero_rotation_segments(&self) -> &[MotionSegment] {
        &self.zero_rotation
    }
    pub fn path_points(&self) -> &[PathPoint] {
        &self.path_points
    }
    pub fn extents(&self) -> &CanonExtents {
        &self.extents
    }

    /// Recomputes the bounds of the recorded moves, both as moved and with the
    /// active XY rotation undone around the g5x origin.
    pub fn calc_extents(&mut self) -> &CanonExtents {
        self.zero_rotation.clear();
        if !self.segments.iter().any(MotionSegment::is_move) {
            self.extents = CanonExtents::default();
            return &self.extents;
        }
        let as_moved = calc_extents(&self.segments);
        self.unrotate_preview();
        let zero_rotation = calc_extents(&self.zero_rotation);
        self.extents = CanonExtents { as_moved, zero_rotation };
        &self.extents
    }
    fn unrotate_preview(&mut self) {
        let unrotation = self.offsets.unrotation();
        self.zero_rotation.extend(
            self.segments
                .iter()
                .filter(|segment| segment.is_move())
                .map(|segment| MotionSegment {
                    start: unrotation.transform(&segment.start),
                    end: unrotation.transform(&segment.end),
                    ..*segment
                }),
        );
    }

    fn recorded_tool_offset(&self) -> [f64; 3] {
        self.tool_length_offset.xyz()
    }
    fn record(&mut self, kind: SegmentKind, end: Position) {
        let start = self.last;
        self.path_points.push(PathPoint::new(kind.line_type(), &start, &end));
        self.segments.push(MotionSegment {
            line: self.state.sequence_number,
            start,
            end,
            kind,
        });
    }
}

impl Default for Canon {
    fn default() -> Self {
        Self::new()
    }
}

impl CanonCallbacks for Canon {
    fn next_line(&mut self, state: &InterpreterState) {
        self.state = *state;
    }
    fn set_feed_rate(&mut self, rate: f64) {
        self.feed_rate = rate / 60.0;
    }
    fn set_plane(&mut self, plane: i32) {
        self.plane = plane;
    }
    fn change_tool(&mut self, pocket: i32) {
        self.first_move = true;
        match self.tool_list.try_reserve(1) {
            Ok(()) => self.tool_list.push(pocket),
            Err(error) => warn!("Failed to record tool change to pocket {}: {}", pocket, error),
        }
    }
    fn get_tool(&self, pocket: i32) -> ToolEntry {
        usize::try_from(pocket)
            .ok()
            .and_then(|index| self.tools.get(index))
            .copied()
            .unwrap_or_else(ToolEntry::none)
    }
    fn straight_traverse(&mut self, position: Position) {
        if self.suppress > 0 {
            return;
        }
        let end = self.rotate_and_translate(&position);
        if !self.first_move {
            let tool_offset = self.recorded_tool_offset();
            self.record(SegmentKind::Traverse { tool_offset }, end);
        }
        self.last = end;
    }
    fn straight_feed(&mut self, position: Position) {
        if self.suppress > 0 {
            return;
        }
        self.first_move = false;
        let end = self.rotate_and_translate(&position);
        let kind = SegmentKind::Feed {
            feed_rate: self.feed_rate,
            tool_offset: self.recorded_tool_offset(),
        };
        self.record(kind, end);
        self.last = end;
    }
    fn rigid_tap(&mut self, x: f64, y: f64, z: f64) {
        if self.suppress > 0 {
            return;
        }
        self.first_move = false;
        let tapped = self.rotate_and_translate(&Position::new(x, y, z, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0));
        let mut end = self.last;
        end.0[..3].copy_from_slice(&tapped.0[..3]);
        let kind = SegmentKind::Feed {
            feed_rate: self.feed_rate,
            tool_offset: self.recorded_tool_offset(),
        };
        self.record(kind, end);
        self.last = end;
    }
    fn arc_feed(&mut self, arc: &ArcFeed) {
        if self.suppress > 0 {
            return;
        }
        self.first_move = false;
        self.in_arc = true;
        let points = arc_to_segments(&self.last, arc, self.plane, &self.offsets, self.arc_division);
        let kind = SegmentKind::ArcFeed {
            feed_rate: self.feed_rate,
            tool_offset: self.recorded_tool_offset(),
        };
        for point in points {
            self.record(kind, point);
            self.last = point;
        }
        self.in_arc = false;
    }
    fn dwell(&mut self, seconds: f64) {
        if self.suppress > 0 {
            return;
        }
        self.dwell_time += seconds;
        let plane = self.state.plane / 10 - 17;
        self.record(SegmentKind::Dwell { seconds, plane }, self.last);
    }
    fn user_defined_function(&mut self, _index: i32, _p: f64, _q: f64) {
        if self.suppress > 0 {
            return;
        }
        self.record(SegmentKind::UserDefined, self.last);
    }
    fn set_g5x_offset(&mut self, index: i32, offset: Offset) {
        self.offsets.g5x_index = index;
        self.offsets.g5x = offset;
    }
    fn set_g92_offset(&mut self, offset: Offset) {
        self.offsets.g92 = offset;
    }
    fn set_xy_rotation(&mut self, degrees: f64) {
        self.offsets.rotation = XyRotation::new(degrees);
    }
    fn tool_offset(&mut self, offset: Offset) {
        self.first_move = true;
        self.last = self.last - offset + self.tool_length_offset;
        self.tool_length_offset = offset;
    }
    fn get_external_angular_units(&self) -> f64 {
        self.status
            .as_ref()
            .and_then(|status| status.angular_units())
            .filter(|units| *units != 0.0)
            .unwrap_or(1.0)
    }
    fn get_external_length_units(&self) -> f64 {
        self.status
            .as_ref()
            .and_then(|status| status.linear_units())
            .filter(|units| *units != 0.0)
            .unwrap_or(1.0)
    }
    fn get_axis_mask(&self) -> u32 {
        self.status.as_ref().and_then(|status| status.axis_mask()).unwrap_or(0)
    }
    fn get_block_delete(&self) -> bool {
        self.status.as_ref().and_then(|status| status.block_delete()).unwrap_or(false)
    }
}

#[cfg(test)]
pub mod test {
    use proptest::prelude::*;

    use super::*;

    fn at(x: f64, y: f64, z: f64) -> Position {
        Position::new(x, y, z, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0)
    }

    fn are_close(a: [f64; 3], b: [f64; 3]) -> bool {
        a.iter().zip(b.iter()).all(|(a, b)| (a - b).abs() < 1e-9)
    }

    struct FakeStatus;
    impl CanonStatus for FakeStatus {
        fn tool_table(&self) -> Option<Vec<ToolEntry>> {
            Some(vec![ToolEntry { id: 0, ..ToolEntry::none() }, ToolEntry { id: 7, diameter: 6.0, ..ToolEntry::none() }])
        }
        fn angular_units(&self) -> Option<f64> {
            Some(0.0)
        }
        fn linear_units(&self) -> Option<f64> {
            Some(25.4)
        }
        fn axis_mask(&self) -> Option<u32> {
            Some(0b111)
        }
    }

    #[test]
    pub fn test_first_traverse_is_not_drawn() {
        let mut canon = Canon::new();
        canon.straight_traverse(at(1.0, 2.0, 3.0));
        assert!(canon.segments().is_empty());
        assert_eq!(canon.last_position().xyz(), [1.0, 2.0, 3.0]);
        canon.straight_feed(at(4.0, 2.0, 3.0));
        canon.straight_traverse(at(0.0, 0.0, 0.0));
        assert_eq!(canon.segments().len(), 2);
        assert_eq!(canon.segments()[1].kind, SegmentKind::Traverse { tool_offset: [0.0; 3] });
        assert_eq!(canon.segments()[1].start.xyz(), [4.0, 2.0, 3.0]);
        assert_eq!(canon.path_points().len(), 2);
    }

    #[test]
    pub fn test_feed_rate_is_per_second() {
        let mut canon = Canon::new();
        canon.set_feed_rate(600.0);
        canon.next_line(&InterpreterState { sequence_number: 12, plane: 170 });
        canon.straight_feed(at(1.0, 0.0, 0.0));
        let segment = canon.segments()[0];
        assert_eq!(segment.line, 12);
        assert_eq!(segment.kind, SegmentKind::Feed { feed_rate: 10.0, tool_offset: [0.0; 3] });
    }

    #[test]
    pub fn test_probe_records_like_feed() {
        let mut canon = Canon::new();
        canon.straight_probe(at(0.0, 0.0, -5.0));
        assert_eq!(canon.segments_of(LineType::Feed).count(), 1);
    }

    #[test]
    pub fn test_rotation_applies_before_work_offset() {
        let mut canon = Canon::new();
        canon.set_xy_rotation(90.0);
        let moved = canon.rotate_and_translate(&at(1.0, 0.0, 0.0));
        assert!(are_close(moved.xyz(), [0.0, 1.0, 0.0]));
        canon.set_g5x_offset(2, Offset([10.0, 20.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]));
        let moved = canon.rotate_and_translate(&at(1.0, 0.0, 0.0));
        assert!(are_close(moved.xyz(), [10.0, 21.0, 0.0]));
        assert_eq!(canon.offsets().g5x_index, 2);
    }

    #[test]
    pub fn test_tool_offset_moves_cursor() {
        let mut canon = Canon::new();
        canon.straight_feed(Position::new(1.0, 1.0, 10.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0));
        canon.tool_offset(Offset([0.0, 0.0, 5.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]));
        assert!(canon.is_first_move());
        assert_eq!(canon.last_position().0, [1.0, 1.0, 5.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
        canon.tool_offset(Offset([0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]));
        assert_eq!(canon.last_position().0, [1.0, 1.0, 8.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0]);
        // the move after a tool offset change is not drawn
        canon.straight_traverse(at(0.0, 0.0, 0.0));
        assert_eq!(canon.segments().len(), 1);
        canon.straight_feed(at(0.0, 0.0, 1.0));
        assert_eq!(canon.segments()[1].kind.tool_offset(), Some([0.0, 0.0, 2.0]));
    }

    #[test]
    pub fn test_change_tool_restarts_path() {
        let mut canon = Canon::new();
        canon.straight_feed(at(1.0, 0.0, 0.0));
        canon.change_tool(3);
        canon.straight_traverse(at(5.0, 5.0, 5.0));
        assert_eq!(canon.segments().len(), 1);
        assert_eq!(canon.tool_list(), &[3]);
    }

    #[test]
    pub fn test_suppressed_motion_is_ignored() {
        let mut canon = Canon::new();
        canon.suppress();
        canon.straight_feed(at(1.0, 0.0, 0.0));
        canon.dwell(2.0);
        canon.rigid_tap(1.0, 1.0, 1.0);
        assert!(canon.segments().is_empty());
        assert_eq!(canon.dwell_time(), 0.0);
        canon.resume();
        canon.straight_feed(at(1.0, 0.0, 0.0));
        assert_eq!(canon.segments().len(), 1);
    }

    #[test]
    pub fn test_dwell_and_user_function_stay_in_place() {
        let mut canon = Canon::new();
        canon.straight_feed(at(1.0, 2.0, 0.0));
        canon.next_line(&InterpreterState { sequence_number: 4, plane: 180 });
        canon.dwell(0.5);
        canon.dwell(1.5);
        canon.user_defined_function(101, 0.0, 0.0);
        assert_eq!(canon.dwell_time(), 2.0);
        let dwell = canon.segments()[1];
        assert_eq!(dwell.kind, SegmentKind::Dwell { seconds: 0.5, plane: 1 });
        assert_eq!(dwell.start, dwell.end);
        assert_eq!(canon.segments()[3].kind, SegmentKind::UserDefined);
        assert_eq!(canon.path_points()[3].kind, LineType::User);
    }

    #[test]
    pub fn test_rigid_tap_keeps_rotary_axes() {
        let mut canon = Canon::new();
        canon.straight_feed(Position::new(0.0, 0.0, 0.0, 45.0, 0.0, 0.0, 0.0, 0.0, 0.0));
        canon.set_g92_offset(Offset([1.0; 9]));
        canon.rigid_tap(1.0, 2.0, -3.0);
        let tap = canon.segments()[1];
        assert_eq!(tap.end.0, [2.0, 3.0, -2.0, 45.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(tap.kind.line_type(), LineType::Feed);
    }

    #[test]
    pub fn test_arc_records_chords() {
        let mut canon = Canon::new();
        canon.straight_feed(at(1.0, 0.0, 0.0));
        canon.arc_feed(&ArcFeed {
            first_end: -1.0,
            second_end: 0.0,
            first_axis: 0.0,
            second_axis: 0.0,
            rotation: 1,
            axis_end_point: 0.0,
            a: 0.0, b: 0.0, c: 0.0, u: 0.0, v: 0.0, w: 0.0,
        });
        assert_eq!(canon.segments_of(LineType::ArcFeed).count(), 64);
        assert!(!canon.in_arc());
        assert_eq!(canon.last_position().xyz(), [-1.0, 0.0, 0.0]);
        let extents = canon.calc_extents();
        assert!(are_close(extents.as_moved.extents.max, [1.0, 1.0, 0.0]));
        assert!(are_close(extents.as_moved.extents.min, [-1.0, 0.0, 0.0]));
    }

    #[test]
    pub fn test_empty_extents_are_zero() {
        let mut canon = Canon::new();
        canon.straight_traverse(at(5.0, 5.0, 5.0));
        canon.dwell(1.0);
        assert_eq!(*canon.calc_extents(), CanonExtents::default());
    }

    #[test]
    pub fn test_zero_rotation_extents() {
        let mut canon = Canon::new();
        canon.set_g5x_offset(1, Offset([10.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]));
        canon.set_xy_rotation(90.0);
        canon.straight_traverse(at(0.0, 0.0, 0.0));
        canon.straight_feed(at(4.0, 2.0, -1.0));
        let extents = *canon.calc_extents();
        assert!(are_close(extents.as_moved.extents.min, [8.0, 0.0, -1.0]));
        assert!(are_close(extents.as_moved.extents.max, [10.0, 4.0, 0.0]));
        assert!(are_close(extents.zero_rotation.extents.min, [10.0, 0.0, -1.0]));
        assert!(are_close(extents.zero_rotation.extents.max, [14.0, 2.0, 0.0]));
        assert_eq!(canon.zero_rotation_segments().len(), 1);

        let again = *canon.calc_extents();
        assert_eq!(again, extents);
        assert_eq!(canon.zero_rotation_segments().len(), 1);
    }

    #[test]
    pub fn test_status_queries_fall_back() {
        let canon = Canon::new();
        assert_eq!(canon.get_external_angular_units(), 1.0);
        assert_eq!(canon.get_external_length_units(), 1.0);
        assert_eq!(canon.get_axis_mask(), 0);
        assert!(!canon.get_block_delete());
        assert_eq!(canon.get_tool(0), ToolEntry::none());

        let canon = Canon::with_status(FakeStatus);
        assert_eq!(canon.get_external_angular_units(), 1.0);
        assert_eq!(canon.get_external_length_units(), 25.4);
        assert_eq!(canon.get_axis_mask(), 7);
        assert!(!canon.get_block_delete());
        assert_eq!(canon.get_tool(1).diameter, 6.0);
        assert_eq!(canon.get_tool(2).id, -1);
        assert_eq!(canon.get_tool(-1).id, -1);
    }

    #[test]
    pub fn test_clear_keeps_configuration() {
        let mut canon = Canon::with_status(FakeStatus);
        canon.set_arc_division(16);
        canon.straight_feed(at(1.0, 0.0, 0.0));
        canon.clear();
        assert!(canon.segments().is_empty());
        assert!(canon.is_first_move());
        assert_eq!(canon.get_tool(1).id, 7);
        assert_eq!(canon.arc_division, 16);
    }

    proptest! {
        #[test]
        fn extents_are_idempotent(
            points in proptest::collection::vec(proptest::array::uniform3(-100.0..100.0f64), 1..20),
            degrees in -180.0..180.0f64,
        ) {
            let mut canon = Canon::new();
            canon.set_xy_rotation(degrees);
            for [x, y, z] in points {
                canon.straight_feed(at(x, y, z));
            }
            let first = *canon.calc_extents();
            let segments = canon.zero_rotation_segments().len();
            prop_assert_eq!(*canon.calc_extents(), first);
            prop_assert_eq!(canon.zero_rotation_segments().len(), segments);
        }
    }
}
