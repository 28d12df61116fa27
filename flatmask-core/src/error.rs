//! Error types for overlay construction and tile production

use thiserror::Error;

/// Errors raised while building polygons or configuring an overlay
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("Flatten height count ({heights}) does not match polygon count ({polygons})")]
    HeightCountMismatch { polygons: usize, heights: usize },

    #[error("Invalid overlay options: {0}")]
    InvalidOptions(String),

    #[error("Invalid polygon: {0}")]
    InvalidPolygon(String),

    #[error("Triangulation failed: {0}")]
    Triangulation(String),
}

pub type OverlayResult<T> = Result<T, OverlayError>;

/// Errors delivered through a tile future instead of an image
#[derive(Debug, Error)]
pub enum TileError {
    #[error("Worker task failed: {0}")]
    WorkerFailed(String),

    #[error("Worker pool dropped the task before it completed")]
    WorkerDropped,

    #[error("Failed to build worker pool: {0}")]
    Pool(String),
}

pub type TileResult<T> = Result<T, TileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = OverlayError::HeightCountMismatch { polygons: 2, heights: 3 };
        assert_eq!(
            err.to_string(),
            "Flatten height count (3) does not match polygon count (2)"
        );

        let err = TileError::WorkerFailed("boom".to_string());
        assert_eq!(err.to_string(), "Worker task failed: boom");
    }
}
