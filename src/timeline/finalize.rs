//! Event finalizer
//!
//! Turns an instrument's absolute-time event list into the delta-timed tracks
//! of a [`Sequence`]. Finishing is all-or-nothing: the instrument (and every
//! auxiliary) is only marked drained once every track has been built.

use crate::error::StrumError;

use super::config::{Voicing, PERCUSSION_CHANNEL};
use super::engine::{Instrument, RELEASE_VELOCITY};
use super::ramp::micros_per_beat;
use super::types::{Event, EventKind, Sequence, Track, TrackEvent};

pub const CONTROL_TRACK: &str = "Control";
pub const METRONOME_TRACK: &str = "Metronome";

/// Side stick.
pub const METRONOME_VOICE: u8 = 37;
pub const METRONOME_VELOCITY: u8 = 100;

const ATTRIBUTION: &str = concat!("Generated by strumline ", env!("CARGO_PKG_VERSION"));

/// Convert absolute ticks to deltas.
///
/// Events must already be in time order; an event earlier than its
/// predecessor is a [`StrumError::TimingError`], never clamped.
pub fn to_delta(track: &str, events: &[Event]) -> Result<Vec<TrackEvent>, StrumError> {
    let mut previous = 0u64;
    events
        .iter()
        .map(|event| {
            if event.tick < previous {
                return Err(StrumError::TimingError {
                    track: track.to_string(),
                    tick: event.tick,
                    previous,
                });
            }
            let delta = u32::try_from(event.tick - previous).map_err(|_| {
                StrumError::ConfigError(format!(
                    "gap of {} ticks in track '{}' is too long",
                    event.tick - previous,
                    track
                ))
            })?;
            previous = event.tick;
            Ok(TrackEvent {
                delta,
                kind: event.kind.clone(),
            })
        })
        .collect()
}

impl Instrument {
    /// Close every sounding note and build the finished sequence.
    ///
    /// Tracks come out in this order: control (tempo and meter), this
    /// instrument's notes, the metronome (when there is a lead-in or the
    /// metronome is enabled), then one note track per auxiliary voice.
    ///
    /// Returns `Ok(None)` if the instrument was already finished.
    pub fn finish(&mut self) -> Result<Option<Sequence>, StrumError> {
        if self.drained {
            log::debug!(target: "finalize", "'{}' already finished", self.name());
            return Ok(None);
        }

        let mut tracks = vec![self.control_track()?, self.note_track()?];
        if let Some(metronome) = self.metronome_track()? {
            tracks.push(metronome);
        }
        self.collect_auxiliary_tracks(&mut tracks)?;

        self.commit();
        for track in &tracks {
            log::info!(
                target: "finalize",
                "track '{}': {} event(s)",
                track.name, track.events.len()
            );
        }

        Ok(Some(Sequence {
            ticks_per_beat: self.settings.ticks_per_beat,
            tracks,
            output: self.settings.output.clone(),
        }))
    }

    fn control_track(&self) -> Result<Track, StrumError> {
        let ts = self.settings.time_signature;
        let mut events = Vec::new();
        if self.settings.attribution {
            events.push(Event::new(0, EventKind::Text(ATTRIBUTION.to_string())));
        }
        events.push(Event::new(
            0,
            EventKind::SetTempo {
                micros_per_beat: micros_per_beat(self.ramps.initial_tempo()),
            },
        ));
        events.push(Event::new(
            0,
            EventKind::TimeSignature {
                numerator: ts.beats,
                denominator_exp: ts.denominator_exponent(),
                clocks_per_click: 24,
                notated_32nds: 8,
            },
        ));
        events.extend(
            self.ramps
                .tempo_changes()
                .iter()
                .map(|&(tick, micros_per_beat)| Event::new(tick, EventKind::SetTempo { micros_per_beat })),
        );

        Ok(Track {
            name: CONTROL_TRACK.to_string(),
            events: to_delta(CONTROL_TRACK, &events)?,
        })
    }

    /// The note track, with note-offs for whatever is still sounding at the
    /// clock.
    fn note_track(&self) -> Result<Track, StrumError> {
        let channel = self.settings.channel;
        let mut events = self.events.clone();
        events.extend(self.sounding().iter().flatten().map(|&pitch| {
            Event::new(
                self.clock,
                EventKind::NoteOff {
                    channel,
                    pitch,
                    velocity: RELEASE_VELOCITY,
                },
            )
        }));

        let name = self.name().to_string();
        let mut track_events = vec![TrackEvent {
            delta: 0,
            kind: EventKind::TrackName(name.clone()),
        }];
        if self.settings.voicing == Voicing::Melodic {
            track_events.push(TrackEvent {
                delta: 0,
                kind: EventKind::PatchChange {
                    channel,
                    patch: self.settings.patch,
                },
            });
        }
        track_events.extend(to_delta(&name, &events)?);

        Ok(Track {
            name,
            events: track_events,
        })
    }

    /// One click per beat through the lead-in, or through the whole
    /// performance (less any trailing rests) when the metronome is on.
    fn metronome_track(&self) -> Result<Option<Track>, StrumError> {
        let tpb = self.ticks_per_beat();
        let end = if self.settings.metronome {
            self.clock.saturating_sub(self.trailing_rest)
        } else {
            self.settings.lead_in_beats as u64 * tpb
        };
        if end == 0 {
            return Ok(None);
        }

        let length = (tpb / 4).max(1);
        let mut events = vec![Event::new(0, EventKind::TrackName(METRONOME_TRACK.to_string()))];
        for tick in (0..end).step_by(tpb as usize) {
            events.push(Event::new(
                tick,
                EventKind::NoteOn {
                    channel: PERCUSSION_CHANNEL,
                    pitch: METRONOME_VOICE,
                    velocity: METRONOME_VELOCITY,
                },
            ));
            events.push(Event::new(
                tick + length,
                EventKind::NoteOff {
                    channel: PERCUSSION_CHANNEL,
                    pitch: METRONOME_VOICE,
                    velocity: RELEASE_VELOCITY,
                },
            ));
        }

        Ok(Some(Track {
            name: METRONOME_TRACK.to_string(),
            events: to_delta(METRONOME_TRACK, &events)?,
        }))
    }

    fn collect_auxiliary_tracks(&self, tracks: &mut Vec<Track>) -> Result<(), StrumError> {
        for aux in &self.auxiliaries {
            if aux.drained {
                log::warn!(
                    target: "finalize",
                    "auxiliary '{}' was finished on its own; skipping",
                    aux.name()
                );
                continue;
            }
            if !aux.ramps.tempo_changes().is_empty() {
                log::warn!(
                    target: "finalize",
                    "tempo changes on auxiliary '{}' are ignored",
                    aux.name()
                );
            }
            tracks.push(aux.note_track()?);
            aux.collect_auxiliary_tracks(tracks)?;
        }
        Ok(())
    }

    fn commit(&mut self) {
        self.strings.release_all();
        self.drained = true;
        for aux in &mut self.auxiliaries {
            if !aux.drained {
                aux.commit();
            }
        }
    }
}
