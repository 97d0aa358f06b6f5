pub mod arc;
pub mod callbacks;
pub mod canon;
pub mod coordinates;
pub mod extents;
pub mod replay;
pub mod segment;
pub mod status;
pub mod transform;

pub use callbacks::{CanonCallbacks, InterpreterState, PrintCanon};
pub use canon::Canon;
pub use coordinates::{Offset, Position};
pub use extents::{CanonExtents, ExtentPair, Extents};
pub use replay::{replay, CanonEvent};
pub use segment::{LineType, MotionSegment, PathPoint, SegmentKind};
pub use status::{CanonStatus, ToolEntry};
