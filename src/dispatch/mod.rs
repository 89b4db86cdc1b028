//! Dispatch module - Prompt templates, retrying image dispatcher and mode orchestration

pub mod dispatcher;
pub mod templates;

pub use dispatcher::{DispatchConfig, Dispatcher, GenerationRequest, ImageResult};
pub use templates::{GenerationMode, ImageKind};
