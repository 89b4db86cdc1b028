//! Image kinds, generation modes and their prompt templates

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Square output used for logos and banners
pub const SQUARE_SIZE: &str = "1024x1024";

/// Wide output used for website mockups
pub const WIDE_SIZE: &str = "1792x1024";

/// A single kind of image the relay knows how to ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Logo,
    Banner,
    Website,
}

impl ImageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Logo => "logo",
            Self::Banner => "banner",
            Self::Website => "website",
        }
    }

    /// Output size requested from the image API
    pub fn size(&self) -> &'static str {
        match self {
            Self::Logo | Self::Banner => SQUARE_SIZE,
            Self::Website => WIDE_SIZE,
        }
    }

    /// Wrap the user's text in this kind's fixed template
    pub fn render_prompt(&self, user_prompt: &str) -> String {
        match self {
            Self::Logo => format!(
                "Generate a high-quality logo image based on the user's description.\nUser request: {}",
                user_prompt
            ),
            Self::Banner => format!(
                "Generate a wide banner image (16:9 aspect ratio) based on the user's description.\nUser request: {}",
                user_prompt
            ),
            Self::Website => format!(
                "Generate a website mockup design based on the user's description.\nUser request: {}",
                user_prompt
            ),
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a generation request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// Logo followed by banner
    Design,
    /// A single website mockup
    Website,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Design => "design",
            Self::Website => "website",
        }
    }

    /// Images produced for this mode, in generation order
    pub fn kinds(&self) -> &'static [ImageKind] {
        match self {
            Self::Design => &[ImageKind::Logo, ImageKind::Banner],
            Self::Website => &[ImageKind::Website],
        }
    }
}

impl FromStr for GenerationMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "design" => Ok(Self::Design),
            "website" => Ok(Self::Website),
            other => Err(AppError::InvalidRequest(format!("Invalid chat_type: {}", other))),
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
