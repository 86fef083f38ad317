pub mod common;
pub mod report;

pub use common::{LineKind, RenderContext};
pub use report::Renderer;
