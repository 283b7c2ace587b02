//! # Timeline Module
//!
//! Turn compiled patterns, chords and tab into timed note events.
//!
//! ## Sub-modules
//! - `config` - `InstrumentConfig` (user-facing, YAML) and its validated form
//! - `types` - `Event`, `Track`, `Sequence` definitions
//! - `strings` - tuning and per-string sustain state
//! - `ramp` - volume ramps and the tempo staircase
//! - `engine` - the `Instrument` itself: `play`, `rest`, `cresc`, `rit`, `tempo`
//! - `tab` - tab grid notation
//! - `finalize` - `finish`: delta conversion, control and metronome tracks
//!
//! ## Example
//! ```rust
//! use strumline::{compile_strum, Instrument, InstrumentConfig};
//!
//! let mut guitar = Instrument::new(InstrumentConfig::default()).unwrap();
//! let pattern = compile_strum(&["1 4/4 6:90 1-3:80"]).unwrap();
//! guitar.play(&pattern, &["0 3 2 0 1 0"]).unwrap();
//!
//! let sequence = guitar.finish().unwrap().unwrap();
//! assert_eq!(sequence.tracks.len(), 2);
//! assert_eq!(guitar.clock(), 768);
//! ```
//!
//! ## Timing
//!
//! Everything runs on an integer tick clock, `ticks-per-beat` ticks to the
//! beat. Pattern offsets are 1-relative beats within the measure, so offset
//! 1 lands on the clock and offset 2.5 lands one and a half beats later.
//! Each chord of `play` and each `rest` moves the clock by one measure.
//!
//! ## Sustain
//!
//! A struck string keeps sounding until it is struck again, muted (velocity
//! 0, `x` in tab) or the instrument is finished. Re-striking always closes the
//! previous note at the same tick as the new one.

mod config;
mod engine;
mod finalize;
mod ramp;
mod strings;
mod tab;
mod types;


pub use config::{
    InstrumentConfig, NameOrNumber, TimeSignature, Voicing, DEFAULT_TICKS_PER_BEAT,
    PERCUSSION_CHANNEL,
};
pub use engine::{Chord, Instrument};
pub use finalize::{to_delta, CONTROL_TRACK, METRONOME_TRACK, METRONOME_VELOCITY, METRONOME_VOICE};
pub use ramp::{micros_per_beat, Ramp, RampTracker};
pub use strings::StringBank;
pub use tab::{Cell, TabGrid, MELODIC_TAB_VELOCITY, PERCUSSION_TAB_VELOCITY};
pub use types::{Event, EventKind, Sequence, Track, TrackEvent};
