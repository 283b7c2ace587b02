//! # Public API
//!
//! Top-level entry points for rendering song documents.
//!
//! - [`render()`] - Song YAML to a finished [`Sequence`]
//! - [`render_to_file()`] - Song YAML straight to a MIDI file
//!
//! ## Typical Usage
//!
//! ```rust
//! use strumline::render;
//!
//! let source = r#"
//! tempo: 120
//! patterns:
//!   down: { strum: ["1 1/16 6-1:80", "3 1/16 6-1:70"] }
//! score:
//!   - play: down
//!     chords: ["0 2 2 1 0 0", "- 0 2 2 2 0"]
//! "#;
//!
//! let sequence = render(source)?;
//! assert_eq!(sequence.tracks.len(), 2);
//! # Ok::<(), strumline::StrumError>(())
//! ```
//!
//! For finer control build an [`Instrument`](crate::Instrument) and drive it
//! directly.

use std::path::{Path, PathBuf};

use crate::song::Song;
use crate::timeline::Sequence;
use crate::StrumError;

/// Render a song document to a finished sequence.
///
/// # Errors
/// Returns [`StrumError`] if the YAML is malformed, a pattern or tab does not
/// parse, a name is unknown, or the events end up out of order.
pub fn render(source: &str) -> Result<Sequence, StrumError> {
    Song::from_yaml(source)?.render()
}

/// Render a song document and write it as a Standard MIDI File.
///
/// The file goes to `path` if given, else to the song's own `output`.
/// Returns the path written.
pub fn render_to_file(source: &str, path: Option<&Path>) -> Result<PathBuf, StrumError> {
    let sequence = render(source)?;
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| sequence.output.clone())
        .ok_or_else(|| StrumError::ConfigError("no output path given".to_string()))?;
    sequence.write_to_file(&path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_to_song_output() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("song.mid");
        let source = format!("output: {}\nscore:\n  - rest: 1\n", target.display());

        let written = render_to_file(&source, None).unwrap();
        assert_eq!(written, target);
        assert!(target.exists());
    }

    #[test]
    fn test_render_needs_an_output() {
        let result = render_to_file("score: []", None);
        assert!(matches!(result, Err(StrumError::ConfigError(_))));
    }
}
