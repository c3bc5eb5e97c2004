pub mod editor;
pub mod render;

pub use editor::{LineEditor, LineRead};
pub use render::ResponseRenderer;
