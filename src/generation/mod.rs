//! Completion and image resolvers.

pub mod completion;
pub mod image;
pub mod prompts;
pub mod stepdown;

pub use completion::{
    CompletionRequest, CompletionResolver, PreviewExample, PreviewRequest, DEFAULT_TEMPERATURE,
};
pub use image::{ImageRequest, ImageResolver, ImageResult};
pub use stepdown::{parse_structured, strip_code_fence, TemperatureLadder};
