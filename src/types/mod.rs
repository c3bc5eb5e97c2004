mod api;

pub use api::{ChatRecord, ChatRequest, ModelInfo, RecordMessage, Role, TagsResponse, Turn};
