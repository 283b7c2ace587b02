//! # Error Types
//!
//! This module defines all error types for strumline.
//!
//! Every error carries enough context to find the offending input: the pattern
//! fragment for parse errors, the grid width for tab format errors and the track
//! and tick for timing errors.
//!
//! ## Error Types
//! - `ParseError` - Malformed pluck/strum/tab/chord text
//! - `ConfigError` - Invalid instrument configuration or call arguments
//! - `FormatError` - Tab grid with an inconsistent or indivisible width
//! - `TimingError` - Events out of order when converting to delta time
//!
//! ## Usage
//! ```rust
//! use strumline::{compile_strum, StrumError};
//!
//! match compile_strum(&["1 1/8 nope"]) {
//!     Ok(pattern) => println!("{} groups", pattern.len()),
//!     Err(StrumError::ParseError { fragment, message }) => {
//!         eprintln!("Bad pattern '{}': {}", fragment, message);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StrumError {
    /// Parse error echoing the offending fragment.
    ///
    /// Occurs when pattern specs, chord specs or tab characters are malformed.
    ///
    /// # Example
    /// ```
    /// # use strumline::StrumError;
    /// let err = StrumError::ParseError {
    ///     fragment: "1 x:80".to_string(),
    ///     message: "invalid string set 'x'".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "Parse error in '1 x:80': invalid string set 'x'");
    /// ```
    #[error("Parse error in '{fragment}': {message}")]
    ParseError { fragment: String, message: String },

    /// Invalid configuration or call arguments.
    ///
    /// Unknown note, instrument or percussion names, a bad time signature,
    /// out-of-range channel or volume, and chord specs with the wrong arity.
    ///
    /// # Example
    /// ```
    /// # use strumline::StrumError;
    /// let err = StrumError::ConfigError("channel 16 is out of range 0-15".to_string());
    /// assert_eq!(err.to_string(), "Invalid configuration: channel 16 is out of range 0-15");
    /// ```
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Tab grid format error with the offending width.
    #[error("Tab format error (width {width}): {message}")]
    FormatError { width: usize, message: String },

    /// An event's absolute tick lies before the previous event in the same track.
    ///
    /// This is never clamped: it signals out-of-order manual tick manipulation.
    #[error("Timing error in track '{track}': event at tick {tick} precedes previous event at tick {previous}")]
    TimingError {
        track: String,
        tick: u64,
        previous: u64,
    },

    /// Song document could not be deserialized.
    #[error("Invalid song document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Writing the output file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StrumError {
    pub(crate) fn parse(fragment: impl Into<String>, message: impl Into<String>) -> Self {
        StrumError::ParseError {
            fragment: fragment.into(),
            message: message.into(),
        }
    }
}
