// error.rs — Crate-wide error type.
//
// Only configuration and I/O problems are errors. Numeric edge cases
// (non-positive luminance reaching a log or a division) are handled in
// place by tone::safe_log / tone::safe_div and never surface here.

use thiserror::Error;

/// Errors produced while configuring or feeding the tone-mapping pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Kernel size is even or zero, or the weight count does not match.
    #[error("invalid kernel: {0}")]
    InvalidKernel(String),

    /// Kernel text could not be read as `N` followed by `N*N` numbers.
    #[error("kernel parse error: {0}")]
    KernelParse(String),

    /// Source image has a channel count other than 3 or 4.
    #[error("unsupported channel count {0}: only 3 or 4 channel images are supported")]
    UnsupportedChannels(u8),

    /// A write was requested but no output path was configured.
    #[error("no output file: pass an output path to enable writing")]
    MissingOutput,

    /// The display window could not be created or updated.
    #[error("window error: {0}")]
    Window(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Decoding or encoding through the `image` crate failed.
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        let e = Error::UnsupportedChannels(2);
        assert!(e.to_string().contains("3 or 4"));

        let e = Error::InvalidKernel("size 4 is even".into());
        assert_eq!(e.to_string(), "invalid kernel: size 4 is even");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let e: Error = io.into();
        assert!(matches!(e, Error::Io(_)));
    }
}
