//! Thumbnail target resolutions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use validator::Validate;

/// Default thumbnail width (vertical 9:16).
pub const DEFAULT_TARGET_WIDTH: u32 = 1080;
/// Default thumbnail height (vertical 9:16).
pub const DEFAULT_TARGET_HEIGHT: u32 = 1920;

/// Output resolution of a rendered thumbnail.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Validate,
)]
pub struct TargetSize {
    /// Width in pixels
    #[validate(range(min = 1))]
    pub width: u32,
    /// Height in pixels
    #[validate(range(min = 1))]
    pub height: u32,
}

impl TargetSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Parse a comma-separated list such as `"1080x1920,720x1280"`.
    pub fn parse_list(s: &str) -> Result<Vec<Self>, TargetSizeError> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl Default for TargetSize {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_WIDTH, DEFAULT_TARGET_HEIGHT)
    }
}

impl fmt::Display for TargetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Error parsing a `WIDTHxHEIGHT` string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetSizeError {
    #[error("Expected WIDTHxHEIGHT, got '{0}'")]
    Malformed(String),

    #[error("Dimensions must be positive, got '{0}'")]
    ZeroDimension(String),
}

impl FromStr for TargetSize {
    type Err = TargetSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| TargetSizeError::Malformed(s.to_string()))?;
        let width: u32 = w
            .trim()
            .parse()
            .map_err(|_| TargetSizeError::Malformed(s.to_string()))?;
        let height: u32 = h
            .trim()
            .parse()
            .map_err(|_| TargetSizeError::Malformed(s.to_string()))?;

        if width == 0 || height == 0 {
            return Err(TargetSizeError::ZeroDimension(s.to_string()));
        }

        Ok(Self { width, height })
    }
}
