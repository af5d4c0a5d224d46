use thiserror::Error;

/// Errors originating from the core pipeline.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid configuration value or structure. Rejected at validation
    /// time, before any frame is decoded.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// The video source could not be opened (missing file, unreadable,
    /// unsupported codec). Fatal: aborts the run before any output.
    #[error("Impossible d'ouvrir la source {path} : {reason}")]
    SourceOpen {
        /// Path that failed to open.
        path: String,
        /// Human-readable reason (probe diagnostic).
        reason: String,
    },

    /// The external encoder binary is not in PATH. Degrades the VIDEO
    /// output only, never fatal for the run.
    #[error("Encodeur ffmpeg introuvable dans le PATH")]
    EncoderUnavailable,

    /// The external encoder exited with a non-zero status. The video
    /// artifact failed; text/image artifacts from the same run stay valid.
    #[error("ffmpeg a terminé avec le statut {status} : {stderr}")]
    EncoderExit {
        /// Process exit code (-1 if killed by signal).
        status: i32,
        /// Captured stderr diagnostic.
        stderr: String,
    },

    /// Invalid width/height dimensions.
    #[error("Dimensions invalides : {width}×{height}")]
    InvalidDimensions {
        /// Width value.
        width: u32,
        /// Height value.
        height: u32,
    },
}
