// Output naming: file format selection and timestamped default file names

use std::path::Path;

use chrono::{Local, NaiveDateTime};

/// Smallest name budget accepted by [`generate_filename`].
pub const MIN_NAME_BUDGET: usize = 30;

/// Default budget, the classic Windows `MAX_PATH`.
pub const DEFAULT_NAME_BUDGET: usize = 260;

/// Image file formats the encoders can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Lossy, quality configurable
    #[default]
    Jpeg,
    /// Uncompressed 24-bit bitmap
    Bmp,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Bmp => "bmp",
        }
    }

    /// Parse an extension or format name ("jpg", "jpeg", "bmp"), case-insensitive.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilenameError {
    #[error("file name needs {needed} bytes but the budget is {budget}")]
    BufferTooSmall { needed: usize, budget: usize },
}

/// `capture_YYYYMMDD_HHMMSS.<ext>` for the current local time.
///
/// `budget` counts one byte reserved for a terminator; budgets below
/// [`MIN_NAME_BUDGET`] are always rejected.
pub fn generate_filename(format: OutputFormat, budget: usize) -> Result<String, FilenameError> {
    generate_filename_at(Local::now().naive_local(), format, budget)
}

/// Same as [`generate_filename`] for a fixed timestamp.
pub fn generate_filename_at(
    timestamp: NaiveDateTime,
    format: OutputFormat,
    budget: usize,
) -> Result<String, FilenameError> {
    let name = format!(
        "capture_{}.{}",
        timestamp.format("%Y%m%d_%H%M%S"),
        format.extension()
    );

    let needed = name.len() + 1;
    if budget < MIN_NAME_BUDGET || needed > budget {
        return Err(FilenameError::BufferTooSmall { needed, budget });
    }
    Ok(name)
}
