//! Event and track type definitions
//!
//! Events are produced in absolute ticks ([`Event`]) while an instrument is
//! being played and converted to delta ticks ([`TrackEvent`]) when the
//! instrument is finished.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::StrumError;
use crate::writer::{SequenceWriter, SmfWriter};

/// What happens at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    NoteOn {
        channel: u8,
        pitch: u8,
        velocity: u8,
    },
    NoteOff {
        channel: u8,
        pitch: u8,
        velocity: u8,
    },
    SetTempo {
        micros_per_beat: u32,
    },
    /// Meter change; `denominator_exp` is the power-of-two exponent of the
    /// beat type (4 → 2, 8 → 3).
    TimeSignature {
        numerator: u8,
        denominator_exp: u8,
        clocks_per_click: u8,
        notated_32nds: u8,
    },
    TrackName(String),
    PatchChange {
        channel: u8,
        patch: u8,
    },
    Text(String),
}

impl EventKind {
    pub fn is_note_on(&self) -> bool {
        matches!(self, EventKind::NoteOn { .. })
    }

    pub fn is_note_off(&self) -> bool {
        matches!(self, EventKind::NoteOff { .. })
    }
}

/// An event at an absolute tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub tick: u64,
    pub kind: EventKind,
}

impl Event {
    pub fn new(tick: u64, kind: EventKind) -> Self {
        Self { tick, kind }
    }
}

/// An event tagged with the ticks elapsed since the previous event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackEvent {
    pub delta: u32,
    pub kind: EventKind,
}

/// A named, delta-timed event list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    pub name: String,
    pub events: Vec<TrackEvent>,
}

impl Track {
    /// Events back in absolute time.
    pub fn absolute_events(&self) -> Vec<Event> {
        let mut tick = 0u64;
        self.events
            .iter()
            .map(|e| {
                tick += e.delta as u64;
                Event::new(tick, e.kind.clone())
            })
            .collect()
    }

    pub fn note_ons(&self) -> impl Iterator<Item = &TrackEvent> {
        self.events.iter().filter(|e| e.kind.is_note_on())
    }
}

/// The finished performance handed to a [`SequenceWriter`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Sequence {
    pub ticks_per_beat: u16,
    pub tracks: Vec<Track>,
    /// Output path from the instrument configuration, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl Sequence {
    pub fn track(&self, name: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.name == name)
    }

    /// Write as a Standard MIDI File.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), StrumError> {
        SmfWriter::new(path.as_ref()).write_sequence(self)
    }
}
