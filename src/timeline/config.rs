//! Instrument configuration.
//!
//! [`InstrumentConfig`] is what users write (directly or as YAML); it keeps
//! names as names. [`Settings`] is the validated, resolved form the engine
//! runs on.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::StrumError;
use crate::names::NameResolver;

/// MIDI channel reserved for percussion.
pub const PERCUSSION_CHANNEL: u8 = 9;

pub const DEFAULT_TICKS_PER_BEAT: u16 = 192;

/// Time signature (e.g., 4/4, 3/4, 6/8)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    pub beats: u8,
    pub beat_type: u8,
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self {
            beats: 4,
            beat_type: 4,
        }
    }
}

impl TimeSignature {
    /// Parse `"N/D"`.
    pub fn parse(s: &str) -> Result<Self, StrumError> {
        let (beats, beat_type) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| StrumError::ConfigError(format!("Invalid time signature: {}", s)))?;

        let beats: u8 = beats.trim().parse().map_err(|_| {
            StrumError::ConfigError(format!("Invalid time signature beats: {}", s))
        })?;
        let beat_type: u8 = beat_type.trim().parse().map_err(|_| {
            StrumError::ConfigError(format!("Invalid time signature beat type: {}", s))
        })?;
        if beats == 0 || beat_type == 0 {
            return Err(StrumError::ConfigError(format!(
                "Invalid time signature: {}",
                s
            )));
        }

        Ok(TimeSignature { beats, beat_type })
    }

    /// Denominator as the power-of-two exponent used by the meter event.
    /// Unsupported denominators encode as 0.
    pub fn denominator_exponent(&self) -> u8 {
        match self.beat_type {
            2 => 1,
            4 => 2,
            8 => 3,
            16 => 4,
            _ => 0,
        }
    }
}

/// A name, or a number used as-is.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NameOrNumber {
    Number(u8),
    Name(String),
}

impl From<&str> for NameOrNumber {
    fn from(name: &str) -> Self {
        NameOrNumber::Name(name.to_string())
    }
}

impl From<u8> for NameOrNumber {
    fn from(n: u8) -> Self {
        NameOrNumber::Number(n)
    }
}

impl NameOrNumber {
    fn resolve(
        &self,
        lookup: impl FnOnce(&str) -> Result<u8, StrumError>,
    ) -> Result<u8, StrumError> {
        match self {
            NameOrNumber::Number(n) if *n <= 127 => Ok(*n),
            NameOrNumber::Number(n) => Err(StrumError::ConfigError(format!(
                "{} is out of MIDI range 0-127",
                n
            ))),
            NameOrNumber::Name(name) => lookup(name),
        }
    }
}

/// User-facing instrument configuration.
///
/// Deserializes from YAML with kebab-case keys; every key is optional and
/// falls back to a nylon-string guitar in standard tuning at 100 bpm, 4/4.
///
/// ```rust
/// use strumline::InstrumentConfig;
///
/// let config = InstrumentConfig::from_yaml("tempo: 80\ntime-signature: 3/4").unwrap();
/// assert_eq!(config.tempo, 80.0);
/// assert_eq!(config.strings.len(), 6);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InstrumentConfig {
    pub name: String,
    pub time_signature: String,
    pub tempo: f64,
    pub instrument: NameOrNumber,
    pub strings: Vec<NameOrNumber>,
    pub percussion: bool,
    pub volume: f64,
    pub time_randomization: u32,
    pub volume_randomization: u32,
    pub lead_in_beats: u32,
    pub metronome: bool,
    pub output: Option<PathBuf>,
    pub channel: u8,
    pub ticks_per_beat: u16,
    pub seed: Option<u64>,
    pub attribution: bool,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            name: "Guitar".to_string(),
            time_signature: "4/4".to_string(),
            tempo: 100.0,
            instrument: "acoustic guitar (nylon)".into(),
            strings: ["E2", "A2", "D3", "G3", "B3", "E4"]
                .iter()
                .map(|&n| n.into())
                .collect(),
            percussion: false,
            volume: 1.0,
            time_randomization: 0,
            volume_randomization: 0,
            lead_in_beats: 0,
            metronome: false,
            output: None,
            channel: 0,
            ticks_per_beat: DEFAULT_TICKS_PER_BEAT,
            seed: None,
            attribution: true,
        }
    }
}

impl InstrumentConfig {
    pub fn from_yaml(source: &str) -> Result<Self, StrumError> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// A percussion "instrument" whose strings are kit pieces.
    pub fn drums(pieces: &[&str]) -> Self {
        Self {
            name: "Drums".to_string(),
            percussion: true,
            channel: PERCUSSION_CHANNEL,
            strings: pieces.iter().map(|&p| p.into()).collect(),
            ..Self::default()
        }
    }

    /// Validate ranges and resolve every name.
    pub(crate) fn resolve(&self, names: &dyn NameResolver) -> Result<Settings, StrumError> {
        let time_signature = TimeSignature::parse(&self.time_signature)?;

        if !(self.tempo.is_finite() && self.tempo > 0.0) {
            return Err(StrumError::ConfigError(format!(
                "tempo must be a positive number of beats per minute, got {}",
                self.tempo
            )));
        }
        if !(0.0..=1.5).contains(&self.volume) {
            return Err(StrumError::ConfigError(format!(
                "volume {} is out of range 0-1.5",
                self.volume
            )));
        }
        if self.time_randomization > 10 {
            return Err(StrumError::ConfigError(format!(
                "time randomization {} is out of range 0-10",
                self.time_randomization
            )));
        }
        if self.volume_randomization > 6 {
            return Err(StrumError::ConfigError(format!(
                "volume randomization {} is out of range 0-6",
                self.volume_randomization
            )));
        }
        if self.channel > 15 {
            return Err(StrumError::ConfigError(format!(
                "channel {} is out of range 0-15",
                self.channel
            )));
        }
        if self.ticks_per_beat == 0 || self.ticks_per_beat > 0x7FFF {
            return Err(StrumError::ConfigError(format!(
                "ticks per beat {} is out of range 1-32767",
                self.ticks_per_beat
            )));
        }
        if self.strings.is_empty() {
            return Err(StrumError::ConfigError(
                "an instrument needs at least one string".to_string(),
            ));
        }

        let roots = self
            .strings
            .iter()
            .map(|s| {
                if self.percussion {
                    s.resolve(|n| names.percussion_to_voice(n))
                } else {
                    s.resolve(|n| names.note_to_pitch(n))
                }
            })
            .collect::<Result<Vec<u8>, StrumError>>()?;

        let patch = self.instrument.resolve(|n| names.instrument_to_patch(n))?;

        Ok(Settings {
            name: self.name.clone(),
            time_signature,
            tempo: self.tempo,
            patch,
            roots,
            voicing: if self.percussion {
                Voicing::Percussion
            } else {
                Voicing::Melodic
            },
            channel: if self.percussion {
                PERCUSSION_CHANNEL
            } else {
                self.channel
            },
            volume: self.volume,
            time_randomization: self.time_randomization,
            volume_randomization: self.volume_randomization,
            lead_in_beats: self.lead_in_beats,
            metronome: self.metronome,
            output: self.output.clone(),
            ticks_per_beat: self.ticks_per_beat,
            seed: self.seed,
            attribution: self.attribution,
        })
    }
}

/// How tab digits turn into events.
///
/// Melodic strings sustain until re-struck or muted; percussion hits are
/// instantaneous and scale their velocity by the digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Voicing {
    Melodic,
    Percussion,
}

/// Validated configuration with every name resolved.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub name: String,
    pub time_signature: TimeSignature,
    pub tempo: f64,
    pub patch: u8,
    pub roots: Vec<u8>,
    pub voicing: Voicing,
    pub channel: u8,
    pub volume: f64,
    pub time_randomization: u32,
    pub volume_randomization: u32,
    pub lead_in_beats: u32,
    pub metronome: bool,
    pub output: Option<PathBuf>,
    pub ticks_per_beat: u16,
    pub seed: Option<u64>,
    pub attribution: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::GeneralMidi;

    #[test]
    fn test_default_is_standard_guitar() {
        let settings = InstrumentConfig::default().resolve(&GeneralMidi).unwrap();
        assert_eq!(settings.roots, vec![40, 45, 50, 55, 59, 64]);
        assert_eq!(settings.patch, 24);
        assert_eq!(settings.time_signature, TimeSignature { beats: 4, beat_type: 4 });
        assert_eq!(settings.voicing, Voicing::Melodic);
    }

    #[test]
    fn test_time_signature_parsing() {
        assert_eq!(TimeSignature::parse("6/8").unwrap().denominator_exponent(), 3);
        assert_eq!(TimeSignature::parse("3/4").unwrap().beats, 3);
        assert_eq!(TimeSignature::parse("5/3").unwrap().denominator_exponent(), 0);
        assert!(TimeSignature::parse("4").is_err());
        assert!(TimeSignature::parse("0/4").is_err());
        assert!(TimeSignature::parse("a/4").is_err());
    }

    #[test]
    fn test_yaml_loading() {
        let yaml = r#"
name: Banjo
tempo: 140
instrument: banjo
strings: [G4, D3, G3, B3, D4]
time-randomization: 3
"#;
        let config = InstrumentConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.name, "Banjo");
        assert_eq!(config.time_randomization, 3);
        let settings = config.resolve(&GeneralMidi).unwrap();
        assert_eq!(settings.roots, vec![67, 50, 55, 59, 62]);
        assert_eq!(settings.patch, 105);
    }

    #[test]
    fn test_numeric_names() {
        let yaml = "instrument: 25\nstrings: [40, A2]";
        let settings = InstrumentConfig::from_yaml(yaml)
            .unwrap()
            .resolve(&GeneralMidi)
            .unwrap();
        assert_eq!(settings.patch, 25);
        assert_eq!(settings.roots, vec![40, 45]);
    }

    #[test]
    fn test_range_validation() {
        let cases = [
            InstrumentConfig { channel: 16, ..Default::default() },
            InstrumentConfig { volume: 1.6, ..Default::default() },
            InstrumentConfig { time_randomization: 11, ..Default::default() },
            InstrumentConfig { volume_randomization: 7, ..Default::default() },
            InstrumentConfig { tempo: 0.0, ..Default::default() },
            InstrumentConfig { time_signature: "4-4".to_string(), ..Default::default() },
            InstrumentConfig { strings: vec!["Q2".into()], ..Default::default() },
            InstrumentConfig { instrument: "kazoo".into(), ..Default::default() },
            InstrumentConfig { strings: vec![], ..Default::default() },
        ];
        for config in cases {
            match config.resolve(&GeneralMidi) {
                Err(StrumError::ConfigError(_)) => {}
                other => panic!("expected config error, got {:?}", other.map(|_| ())),
            }
        }
    }

    #[test]
    fn test_drums_use_percussion_channel() {
        let config = InstrumentConfig {
            channel: 3,
            ..InstrumentConfig::drums(&["bass drum 1", "acoustic snare", "closed hi-hat"])
        };
        let settings = config.resolve(&GeneralMidi).unwrap();
        assert_eq!(settings.channel, PERCUSSION_CHANNEL);
        assert_eq!(settings.roots, vec![36, 38, 42]);
        assert_eq!(settings.voicing, Voicing::Percussion);
    }
}
