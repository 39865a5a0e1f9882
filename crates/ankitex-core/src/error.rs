use std::path::PathBuf;

use thiserror::Error;

use crate::config::{ColorFormat, TextureTopology};

/// Coarse classification of [`AnkiTexError`] variants.
///
/// Every class is fatal for the current conversion; the class only tells the
/// caller what went wrong (bad flags, bad inputs, bad tool output, or the filesystem).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Validation,
    Collaborator,
    Io,
}

#[derive(Debug, Error)]
pub enum AnkiTexError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Image dimensions must be powers of two, got {width}x{height}")]
    NotPowerOfTwo { width: u32, height: u32 },
    #[error("Image dimensions must be at least 4x4, got {width}x{height}")]
    TooSmall { width: u32, height: u32 },
    #[error("Image must be square, got {width}x{height}")]
    NotSquare { width: u32, height: u32 },
    #[error("{topology} textures need {expected} image(s), got {actual}")]
    ImageCount {
        topology: TextureTopology,
        expected: &'static str,
        actual: usize,
    },
    #[error(
        "Image {index} is {format} {width}x{height}, expected {expected_format} {expected_width}x{expected_height} like image 0"
    )]
    InconsistentImageSet {
        index: usize,
        format: ColorFormat,
        width: u32,
        height: u32,
        expected_format: ColorFormat,
        expected_width: u32,
        expected_height: u32,
    },

    #[error("Invalid container: {reason}")]
    InvalidContainer { reason: String },

    #[error("Cannot probe {path}: {reason}")]
    Probe { path: PathBuf, reason: String },
    #[error("{tool} failed: {reason}")]
    Collaborator { tool: String, reason: String },
    #[error("Unexpected codec format in {path}: {reason}")]
    UnexpectedCodecFormat { path: PathBuf, reason: String },
    #[error("Unexpected raw layout in {path}: {reason}")]
    UnexpectedRawLayout { path: PathBuf, reason: String },
}

impl AnkiTexError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AnkiTexError::Io(_) => ErrorCategory::Io,
            AnkiTexError::InvalidConfig(_) => ErrorCategory::Configuration,
            AnkiTexError::NotPowerOfTwo { .. }
            | AnkiTexError::TooSmall { .. }
            | AnkiTexError::NotSquare { .. }
            | AnkiTexError::ImageCount { .. }
            | AnkiTexError::InconsistentImageSet { .. }
            | AnkiTexError::InvalidContainer { .. } => ErrorCategory::Validation,
            AnkiTexError::Image(_)
            | AnkiTexError::Probe { .. }
            | AnkiTexError::Collaborator { .. }
            | AnkiTexError::UnexpectedCodecFormat { .. }
            | AnkiTexError::UnexpectedRawLayout { .. } => ErrorCategory::Collaborator,
        }
    }

    pub(crate) fn collaborator(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        AnkiTexError::Collaborator {
            tool: tool.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnkiTexError>;
