//! Timeline engine
//!
//! An [`Instrument`] owns a clock, a string bank, a ramp tracker and an
//! append-only event list. Every `play` consumes exactly one measure per
//! chord, every `tab` consumes the width of its grid, and nothing is written
//! anywhere until [`Instrument::finish`].

use std::str::FromStr;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::beat::Beat;
use crate::error::StrumError;
use crate::names::{GeneralMidi, NameResolver};
use crate::pattern::Pattern;

use super::config::{InstrumentConfig, Settings, Voicing, PERCUSSION_CHANNEL};
use super::ramp::RampTracker;
use super::strings::StringBank;
use super::types::{Event, EventKind};

/// Velocity used for note-off events.
pub(crate) const RELEASE_VELOCITY: u8 = 0;

/// One fretting per string, lowest string first; `None` leaves the string
/// alone.
///
/// Parsed from text like `"0 3 2 0 1 0"` or `"- 0 2 2 1 0"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chord {
    frets: Vec<Option<i32>>,
}

impl Chord {
    pub fn from_frets(frets: Vec<Option<i32>>) -> Self {
        Self { frets }
    }

    pub fn frets(&self) -> &[Option<i32>] {
        &self.frets
    }

    pub fn len(&self) -> usize {
        self.frets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frets.is_empty()
    }
}

impl FromStr for Chord {
    type Err = StrumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let frets = s
            .split_whitespace()
            .map(|word| match word {
                "-" | "x" | "X" => Ok(None),
                _ => word
                    .parse::<i32>()
                    .map(Some)
                    .map_err(|_| StrumError::parse(s.trim(), format!("invalid fret '{}'", word))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Chord { frets })
    }
}

/// A playable voice: one MIDI channel, its strings and its timeline.
pub struct Instrument {
    pub(crate) settings: Settings,
    pub(crate) strings: StringBank,
    pub(crate) ramps: RampTracker,
    pub(crate) clock: u64,
    /// Ticks of pure rest at the end of the timeline.
    pub(crate) trailing_rest: u64,
    pub(crate) events: Vec<Event>,
    pub(crate) auxiliaries: Vec<Instrument>,
    pub(crate) drained: bool,
    /// Unjittered position of the previous strike.
    last_base: Option<i64>,
    rng: Pcg32,
}

impl std::fmt::Debug for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instrument")
            .field("name", &self.settings.name)
            .field("channel", &self.settings.channel)
            .field("clock", &self.clock)
            .field("events", &self.events.len())
            .field("auxiliaries", &self.auxiliaries.len())
            .field("drained", &self.drained)
            .finish()
    }
}

impl Instrument {
    /// Build an instrument, resolving names with the General MIDI tables.
    pub fn new(config: InstrumentConfig) -> Result<Self, StrumError> {
        Self::with_resolver(config, &GeneralMidi)
    }

    pub fn with_resolver(
        config: InstrumentConfig,
        names: &dyn NameResolver,
    ) -> Result<Self, StrumError> {
        let settings = config.resolve(names)?;
        Ok(Self::from_settings(settings))
    }

    fn from_settings(settings: Settings) -> Self {
        let rng = match settings.seed {
            Some(seed) => Pcg32::seed_from_u64(seed),
            None => Pcg32::from_entropy(),
        };
        let clock = settings.lead_in_beats as u64 * settings.ticks_per_beat as u64;
        log::debug!(
            target: "timeline",
            "instrument '{}' on channel {} with {} string(s), clock starts at {}",
            settings.name, settings.channel, settings.roots.len(), clock
        );
        Self {
            strings: StringBank::new(settings.roots.clone()),
            ramps: RampTracker::new(settings.volume, settings.tempo),
            clock,
            trailing_rest: 0,
            events: Vec::new(),
            auxiliaries: Vec::new(),
            drained: false,
            last_base: None,
            rng,
            settings,
        }
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    pub fn channel(&self) -> u8 {
        self.settings.channel
    }

    pub fn voicing(&self) -> Voicing {
        self.settings.voicing
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn ticks_per_beat(&self) -> u64 {
        self.settings.ticks_per_beat as u64
    }

    pub fn ticks_per_measure(&self) -> u64 {
        self.settings.time_signature.beats as u64 * self.ticks_per_beat()
    }

    pub fn string_count(&self) -> usize {
        self.strings.len()
    }

    /// Currently sounding note per string, lowest string first.
    pub fn sounding(&self) -> &[Option<u8>] {
        self.strings.sounding()
    }

    pub fn volume(&self) -> f64 {
        self.ramps.volume()
    }

    pub fn tempo_bpm(&self) -> f64 {
        self.ramps.tempo()
    }

    /// Events emitted so far, in absolute ticks.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn is_drained(&self) -> bool {
        self.drained
    }

    /// Play `pattern` once per chord, one measure each.
    ///
    /// Chords are given as text (`"0 3 2 0 1 0"`), one fret or `-` per string,
    /// lowest string first. All chords are validated before anything is
    /// emitted.
    pub fn play<S: AsRef<str>>(&mut self, pattern: &Pattern, chords: &[S]) -> Result<(), StrumError> {
        let chords = chords
            .iter()
            .map(|c| c.as_ref().parse::<Chord>())
            .collect::<Result<Vec<_>, _>>()?;
        self.play_chords(pattern, &chords)
    }

    pub fn play_chords(&mut self, pattern: &Pattern, chords: &[Chord]) -> Result<(), StrumError> {
        self.ensure_open()?;
        let resolved = chords
            .iter()
            .map(|chord| self.resolve_chord(chord))
            .collect::<Result<Vec<_>, _>>()?;

        let tpb = self.settings.ticks_per_beat as u32;
        let offsets = pattern
            .groups()
            .iter()
            .map(|group| {
                group
                    .offset
                    .checked_sub(Beat::ONE)
                    .and_then(|beat| beat.to_ticks(tpb))
                    .ok_or_else(|| {
                        StrumError::ConfigError(format!(
                            "pattern offset {} is beyond the tick range",
                            group.offset
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let measure = self.ticks_per_measure();
        for pitches in resolved {
            let measure_start = self.clock as i64;
            for (group, offset) in pattern.groups().iter().zip(&offsets) {
                let base = measure_start.saturating_add(*offset);
                let tick = self.strike_tick(base);
                let dv = self.velocity_jitter();
                for strike in &group.strikes {
                    let Some(index) = self.strings.index_from_high(strike.string) else {
                        continue;
                    };
                    let Some(note) = pitches[index] else {
                        continue;
                    };
                    let velocity = i32::try_from(strike.velocity).unwrap_or(i32::MAX);
                    self.sound_string(index, note, velocity, dv, tick);
                }
            }
            self.advance(measure);
            self.trailing_rest = 0;
        }
        Ok(())
    }

    /// A silent measure.
    pub fn rest(&mut self) -> Result<(), StrumError> {
        self.ensure_open()?;
        let measure = self.ticks_per_measure();
        self.advance(measure);
        self.trailing_rest += measure;
        Ok(())
    }

    /// Scale the volume by `factor` over `measures` measures.
    ///
    /// The ramp starts a beat before the clock and supersedes any ramp in
    /// progress. Factors below 1 make a decrescendo.
    pub fn cresc(&mut self, factor: f64, measures: u32) -> Result<(), StrumError> {
        self.ensure_open()?;
        if !(factor.is_finite() && factor >= 0.0) {
            return Err(StrumError::ConfigError(format!(
                "crescendo factor must be a non-negative number, got {}",
                factor
            )));
        }
        let start = self.clock as i64 - self.ticks_per_beat() as i64;
        let end = start + (measures as u64 * self.ticks_per_measure()) as i64;
        self.ramps.start_volume_ramp(factor, start, end);
        Ok(())
    }

    /// Step the tempo to `factor` times its current value over `measures`
    /// measures, one tempo change per beat from the clock onwards.
    /// Factors above 1 make an accelerando.
    pub fn rit(&mut self, factor: f64, measures: u32) -> Result<(), StrumError> {
        self.ensure_open()?;
        if !(factor.is_finite() && factor > 0.0) {
            return Err(StrumError::ConfigError(format!(
                "ritardando factor must be a positive number, got {}",
                factor
            )));
        }
        let beats = measures as u64 * self.settings.time_signature.beats as u64;
        let (clock, tpb) = (self.clock, self.ticks_per_beat());
        self.ramps.tempo_staircase(factor, beats, clock, tpb);
        Ok(())
    }

    /// Change tempo at the current clock.
    pub fn tempo(&mut self, bpm: f64) -> Result<(), StrumError> {
        self.tempo_at(bpm, self.clock)
    }

    /// Change tempo at an explicit tick. Ticks earlier than a previously
    /// queued change surface as a timing error when the instrument finishes.
    pub fn tempo_at(&mut self, bpm: f64, tick: u64) -> Result<(), StrumError> {
        self.ensure_open()?;
        if !(bpm.is_finite() && bpm > 0.0) {
            return Err(StrumError::ConfigError(format!(
                "tempo must be a positive number of beats per minute, got {}",
                bpm
            )));
        }
        self.ramps.set_tempo(bpm, tick);
        Ok(())
    }

    /// Register an auxiliary voice that is finished along with this one.
    ///
    /// The auxiliary shares this instrument's meter, tempo and resolution.
    /// Its channel follows from registration order: melodic voices take the
    /// next channels after this one, skipping the percussion channel.
    pub fn auxiliary(&mut self, config: InstrumentConfig) -> Result<&mut Instrument, StrumError> {
        self.auxiliary_with_resolver(config, &GeneralMidi)
    }

    pub fn auxiliary_with_resolver(
        &mut self,
        config: InstrumentConfig,
        names: &dyn NameResolver,
    ) -> Result<&mut Instrument, StrumError> {
        self.ensure_open()?;
        let index = self.auxiliaries.len();
        let channel = if config.percussion {
            PERCUSSION_CHANNEL
        } else {
            auxiliary_channel(self.settings.channel, index).ok_or_else(|| {
                StrumError::ConfigError(format!("no free channel for auxiliary voice {}", index + 1))
            })?
        };
        let config = InstrumentConfig {
            time_signature: format!(
                "{}/{}",
                self.settings.time_signature.beats, self.settings.time_signature.beat_type
            ),
            tempo: self.settings.tempo,
            ticks_per_beat: self.settings.ticks_per_beat,
            channel,
            seed: config
                .seed
                .or_else(|| self.settings.seed.map(|s| s.wrapping_add(index as u64 + 1))),
            lead_in_beats: self.settings.lead_in_beats,
            metronome: false,
            ..config
        };
        let aux = Instrument::with_resolver(config, names)?;
        self.auxiliaries.push(aux);
        Ok(&mut self.auxiliaries[index])
    }

    pub fn auxiliaries(&self) -> &[Instrument] {
        &self.auxiliaries
    }

    pub(crate) fn ensure_open(&self) -> Result<(), StrumError> {
        if self.drained {
            return Err(StrumError::ConfigError(format!(
                "instrument '{}' has already been finished",
                self.settings.name
            )));
        }
        Ok(())
    }

    pub(crate) fn advance(&mut self, ticks: u64) {
        self.clock += ticks;
        log::trace!(target: "timeline", "'{}' clock -> {}", self.settings.name, self.clock);
    }

    /// Check arity and pitch range, producing a pitch (or `None`) per string.
    fn resolve_chord(&self, chord: &Chord) -> Result<Vec<Option<u8>>, StrumError> {
        if chord.len() != self.strings.len() {
            return Err(StrumError::ConfigError(format!(
                "chord has {} fret(s) but '{}' has {} string(s)",
                chord.len(),
                self.settings.name,
                self.strings.len()
            )));
        }
        chord
            .frets()
            .iter()
            .enumerate()
            .map(|(index, fret)| match fret {
                Some(fret) => self.strings.pitch(index, *fret).map(Some),
                None => Ok(None),
            })
            .collect()
    }

    /// Apply time randomization to a strike position.
    ///
    /// Jitter never pulls a strike in front of the last emitted event unless
    /// the unjittered position already lies before the previous strike's.
    pub(crate) fn strike_tick(&mut self, base: i64) -> u64 {
        let base = base.max(0);
        let in_order = self.last_base.map_or(true, |previous| base >= previous);
        self.last_base = Some(base);
        let spread = self.settings.time_randomization as i64;
        if spread == 0 {
            return base as u64;
        }
        let last = self.events.last().map(|e| e.tick as i64).unwrap_or(0);
        let floor = if in_order { last } else { base.min(last) };
        let jittered = base.saturating_add(self.rng.gen_range(-spread..=spread));
        jittered.max(floor).max(0) as u64
    }

    /// One velocity offset shared by a whole action group.
    pub(crate) fn velocity_jitter(&mut self) -> i32 {
        let spread = self.settings.volume_randomization as i32;
        if spread == 0 {
            0
        } else {
            self.rng.gen_range(-spread..=spread)
        }
    }

    /// Strike (or, with velocity 0, mute) one string at `tick`.
    ///
    /// Any note still sounding on the string is stopped first, at the same
    /// tick. A strike the volume scales down to 0 mutes as well.
    pub(crate) fn sound_string(&mut self, index: usize, note: u8, velocity: i32, dv: i32, tick: u64) {
        let channel = self.settings.channel;
        if let Some(old) = self.strings.replace(index, None) {
            self.events.push(Event::new(
                tick,
                EventKind::NoteOff {
                    channel,
                    pitch: old,
                    velocity: RELEASE_VELOCITY,
                },
            ));
        }
        if velocity <= 0 {
            return;
        }

        let velocity = if velocity > self.settings.volume_randomization as i32 {
            velocity + dv
        } else {
            velocity
        };
        let velocity = self.ramps.scale_velocity(velocity, tick as i64);
        if velocity == 0 {
            return;
        }
        self.events.push(Event::new(
            tick,
            EventKind::NoteOn {
                channel,
                pitch: note,
                velocity,
            },
        ));
        self.strings.replace(index, Some(note));
    }

    /// An instantaneous percussion hit; nothing is left sounding.
    pub(crate) fn hit(&mut self, voice: u8, velocity: i32, dv: i32, tick: u64) {
        let velocity = if velocity > self.settings.volume_randomization as i32 {
            velocity + dv
        } else {
            velocity
        };
        let velocity = self.ramps.scale_velocity(velocity, tick as i64);
        if velocity == 0 {
            return;
        }
        self.events.push(Event::new(
            tick,
            EventKind::NoteOn {
                channel: self.settings.channel,
                pitch: voice,
                velocity,
            },
        ));
    }
}

/// Channel for the `index`-th melodic auxiliary of a voice on `base`.
pub(crate) fn auxiliary_channel(base: u8, index: usize) -> Option<u8> {
    (base as usize + 1..16)
        .filter(|&c| c != PERCUSSION_CHANNEL as usize)
        .nth(index)
        .map(|c| c as u8)
}
