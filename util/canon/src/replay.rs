use serde::{Deserialize, Serialize};

use crate::{
    arc::ArcFeed,
    callbacks::{CanonCallbacks, InterpreterState},
    coordinates::{Offset, Position},
};

/// A recorded interpreter callback, so a program's callbacks can be stored
/// and played back into any canon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CanonEvent {
    Comment { text: String },
    Message { text: String },
    NextLine(InterpreterState),
    SetFeedRate { rate: f64 },
    SetSpindleRate { speed: f64 },
    SelectPlane { plane: i32 },
    SetPlane { plane: i32 },
    ChangeTool { pocket: i32 },
    StraightTraverse { position: Position },
    StraightFeed { position: Position },
    StraightProbe { position: Position },
    RigidTap { x: f64, y: f64, z: f64 },
    ArcFeed(ArcFeed),
    Dwell { seconds: f64 },
    UserDefinedFunction { index: i32, p: f64, q: f64 },
    SetG5xOffset { index: i32, offset: Offset },
    SetG92Offset { offset: Offset },
    SetXyRotation { degrees: f64 },
    ToolOffset { offset: Offset },
}

pub fn replay<'a>(events: impl IntoIterator<Item = &'a CanonEvent>, target: &mut impl CanonCallbacks) {
    for event in events {
        match event {
            CanonEvent::Comment { text } => target.comment(text),
            CanonEvent::Message { text } => target.message(text),
            CanonEvent::NextLine(state) => target.next_line(state),
            CanonEvent::SetFeedRate { rate } => target.set_feed_rate(*rate),
            CanonEvent::SetSpindleRate { speed } => target.set_spindle_rate(*speed),
            CanonEvent::SelectPlane { plane } => target.select_plane(*plane),
            CanonEvent::SetPlane { plane } => target.set_plane(*plane),
            CanonEvent::ChangeTool { pocket } => target.change_tool(*pocket),
            CanonEvent::StraightTraverse { position } => target.straight_traverse(*position),
            CanonEvent::StraightFeed { position } => target.straight_feed(*position),
            CanonEvent::StraightProbe { position } => target.straight_probe(*position),
            CanonEvent::RigidTap { x, y, z } => target.rigid_tap(*x, *y, *z),
            CanonEvent::ArcFeed(arc) => target.arc_feed(arc),
            CanonEvent::Dwell { seconds } => target.dwell(*seconds),
            CanonEvent::UserDefinedFunction { index, p, q } => target.user_defined_function(*index, *p, *q),
            CanonEvent::SetG5xOffset { index, offset } => target.set_g5x_offset(*index, *offset),
            CanonEvent::SetG92Offset { offset } => target.set_g92_offset(*offset),
            CanonEvent::SetXyRotation { degrees } => target.set_xy_rotation(*degrees),
            CanonEvent::ToolOffset { offset } => target.tool_offset(*offset),
        }
    }
}
