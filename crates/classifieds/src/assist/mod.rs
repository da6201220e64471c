//! Model-backed helpers for the listing form: category suggestion and image tagging.

pub mod model;
pub mod router;
pub mod service;


pub use model::{CompletionClient, CompletionRequest, ModelError, OpenAiClient, UserContent};
pub use router::assist_router;
pub use service::{
    image_source, parse_category_reply, parse_descriptive_tags, parse_keyword_tags, AssistError,
    AssistService, CategorySuggestion, ImageInput,
};
