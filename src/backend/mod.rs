//! Backend module - Traits and HTTP clients for the image and analytics APIs

pub mod analytics;
pub mod openai;
pub mod traits;
