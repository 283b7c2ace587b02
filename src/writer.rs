//! Sequence writers
//!
//! A finished [`Sequence`] is handed to a [`SequenceWriter`]. [`SmfWriter`]
//! encodes it as a format 1 Standard MIDI File using `midly`.

use std::path::{Path, PathBuf};

use midly::num::{u15, u24, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};

use crate::error::StrumError;
use crate::timeline::{EventKind, Sequence, Track};

/// Destination for finished sequences.
pub trait SequenceWriter {
    fn write_sequence(&mut self, sequence: &Sequence) -> Result<(), StrumError>;
}

/// Writes Standard MIDI Files to a path.
#[derive(Debug, Clone)]
pub struct SmfWriter {
    path: PathBuf,
}

impl SmfWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SequenceWriter for SmfWriter {
    fn write_sequence(&mut self, sequence: &Sequence) -> Result<(), StrumError> {
        let bytes = to_smf_bytes(sequence)?;
        std::fs::write(&self.path, &bytes)?;
        log::info!(
            target: "writer",
            "wrote {} track(s), {} bytes to {}",
            sequence.tracks.len(),
            bytes.len(),
            self.path.display()
        );
        Ok(())
    }
}

/// Encode a sequence as Standard MIDI File bytes.
pub fn to_smf_bytes(sequence: &Sequence) -> Result<Vec<u8>, StrumError> {
    let smf = to_smf(sequence)?;
    let mut bytes = Vec::new();
    smf.write_std(&mut bytes)?;
    Ok(bytes)
}

/// Build the `midly` representation of a sequence. Every track gets an
/// end-of-track marker.
pub fn to_smf(sequence: &Sequence) -> Result<Smf<'_>, StrumError> {
    let resolution = checked(sequence.ticks_per_beat as u32, 0x7FFF, "ticks per beat")?;
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(resolution as u16)),
    ));
    for track in &sequence.tracks {
        smf.tracks.push(encode_track(track)?);
    }
    Ok(smf)
}

fn encode_track(track: &Track) -> Result<Vec<midly::TrackEvent<'_>>, StrumError> {
    let mut events = Vec::with_capacity(track.events.len() + 1);
    for event in &track.events {
        let delta = checked(event.delta, 0x0FFF_FFFF, "delta time")?;
        events.push(midly::TrackEvent {
            delta: u28::new(delta),
            kind: encode_kind(&event.kind)?,
        });
    }
    events.push(midly::TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    log::trace!(target: "writer", "track '{}': {} event(s)", track.name, events.len());
    Ok(events)
}

fn encode_kind(kind: &EventKind) -> Result<TrackEventKind<'_>, StrumError> {
    Ok(match kind {
        EventKind::NoteOn {
            channel,
            pitch,
            velocity,
        } => TrackEventKind::Midi {
            channel: channel_of(*channel)?,
            message: MidiMessage::NoteOn {
                key: seven_bit(*pitch, "pitch")?,
                vel: seven_bit(*velocity, "velocity")?,
            },
        },
        EventKind::NoteOff {
            channel,
            pitch,
            velocity,
        } => TrackEventKind::Midi {
            channel: channel_of(*channel)?,
            message: MidiMessage::NoteOff {
                key: seven_bit(*pitch, "pitch")?,
                vel: seven_bit(*velocity, "velocity")?,
            },
        },
        EventKind::PatchChange { channel, patch } => TrackEventKind::Midi {
            channel: channel_of(*channel)?,
            message: MidiMessage::ProgramChange {
                program: seven_bit(*patch, "patch")?,
            },
        },
        EventKind::SetTempo { micros_per_beat } => {
            let micros = checked(*micros_per_beat, 0xFF_FFFF, "microseconds per beat")?;
            TrackEventKind::Meta(MetaMessage::Tempo(u24::new(micros)))
        }
        EventKind::TimeSignature {
            numerator,
            denominator_exp,
            clocks_per_click,
            notated_32nds,
        } => TrackEventKind::Meta(MetaMessage::TimeSignature(
            *numerator,
            *denominator_exp,
            *clocks_per_click,
            *notated_32nds,
        )),
        EventKind::TrackName(name) => TrackEventKind::Meta(MetaMessage::TrackName(name.as_bytes())),
        EventKind::Text(text) => TrackEventKind::Meta(MetaMessage::Text(text.as_bytes())),
    })
}

fn checked(value: u32, max: u32, what: &str) -> Result<u32, StrumError> {
    if value > max {
        return Err(StrumError::ConfigError(format!(
            "{} {} does not fit in a MIDI file (max {})",
            what, value, max
        )));
    }
    Ok(value)
}

fn seven_bit(value: u8, what: &str) -> Result<u7, StrumError> {
    checked(value as u32, 127, what).map(|v| u7::new(v as u8))
}

fn channel_of(channel: u8) -> Result<u4, StrumError> {
    checked(channel as u32, 15, "channel").map(|c| u4::new(c as u8))
}
