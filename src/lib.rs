pub mod api;
pub mod beat;
pub mod error;
pub mod names;
pub mod pattern;
pub mod song;
pub mod timeline;
pub mod writer;

pub use api::{render, render_to_file};
pub use beat::Beat;
pub use error::*;
pub use names::{GeneralMidi, NameResolver};
pub use pattern::{compile_pluck, compile_strum, parse_string_set, ActionGroup, Pattern, Strike};
pub use song::{PatternDef, Song, Step, Voice};
pub use timeline::{
    Chord, Event, EventKind, Instrument, InstrumentConfig, NameOrNumber, Sequence, TimeSignature,
    Track, TrackEvent,
};
pub use writer::{to_smf_bytes, SequenceWriter, SmfWriter};
