//! Error types for the rgealti crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while processing RGE ALTI tiles.
#[derive(Debug, Error)]
pub enum RgeAltiError {
    /// I/O error without a specific file attached.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A tile or directory could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An output file or directory could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The six-line grid header is missing, incomplete or malformed.
    #[error("Invalid grid header: {0}")]
    InvalidHeader(String),

    /// The elevation matrix does not match the header.
    #[error("Invalid grid data: {0}")]
    InvalidData(String),

    /// Every cell of the tile equals the nodata sentinel.
    #[error("no valid cells, min/max/mean are undefined")]
    DegenerateTile,

    /// Coordinate transformation failed or the CRS is unknown.
    #[error("Projection error: {0}")]
    Projection(String),

    /// CSV serialisation error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The input directory contains no `.asc` tiles.
    #[error("No .asc tiles found in {}", .0.display())]
    NoInputFiles(PathBuf),

    /// Processing of a single tile failed.
    #[error("{file}: {source}")]
    Tile {
        file: String,
        #[source]
        source: Box<RgeAltiError>,
    },
}

impl RgeAltiError {
    /// Attach the tile file name to an error raised while processing it.
    pub fn in_tile(self, file: impl Into<String>) -> Self {
        match self {
            // already carries its context
            err @ RgeAltiError::Tile { .. } => err,
            err => RgeAltiError::Tile {
                file: file.into(),
                source: Box::new(err),
            },
        }
    }
}

/// Result type for rgealti operations.
pub type Result<T> = std::result::Result<T, RgeAltiError>;
