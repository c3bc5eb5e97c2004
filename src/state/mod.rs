pub mod conversation;
pub mod response;
pub mod segment;
pub mod tags;

pub use conversation::{ConversationState, SessionMode};
pub use response::{StreamOutcome, StreamingResponseParser};
pub use segment::{Segment, StreamControl, StreamSegmentKind};
pub use tags::TagStateMachine;
