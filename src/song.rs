//! Song documents
//!
//! A song is a YAML document: the instrument configuration at top level,
//! named patterns, a score of steps, and optional auxiliary voices that share
//! the song's patterns.
//!
//! ```yaml
//! name: Guitar
//! tempo: 90
//! patterns:
//!   down: { strum: ["1 1/16 6-1:80", "3 -1/16 1-4:60"] }
//!   bass: { pluck: ["1 6:90", "3 5:80"] }
//! score:
//!   - play: down
//!     chords: ["0 3 2 0 1 0", "- 0 2 2 1 0"]
//!   - cresc: 0.6
//!     measures: 2
//!   - play: bass
//!     chords: ["3 2 0 0 0 3"]
//!     repeat: 2
//!   - rest: 1
//! voices:
//!   - name: Drums
//!     percussion: true
//!     strings: [bass drum 1, closed hi-hat]
//!     score:
//!       - tab: |
//!           |9-9-9-9-|
//!           |9---9---|
//!         measures-per-line: 1
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::StrumError;
use crate::pattern::{compile_pluck, compile_strum, Pattern};
use crate::timeline::{Instrument, InstrumentConfig, Sequence};

/// A named pattern, as strum or pluck specs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PatternDef {
    Strum { strum: Vec<String> },
    Pluck { pluck: Vec<String> },
}

impl PatternDef {
    pub fn compile(&self) -> Result<Pattern, StrumError> {
        match self {
            PatternDef::Strum { strum } => compile_strum(strum.as_slice()),
            PatternDef::Pluck { pluck } => compile_pluck(pluck.as_slice()),
        }
    }
}

fn one() -> u32 {
    1
}

fn four() -> u32 {
    4
}

/// One step of a score.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Step {
    /// Play a named pattern once per chord, `repeat` times over.
    Play {
        play: String,
        chords: Vec<String>,
        #[serde(default = "one")]
        repeat: u32,
    },
    Tab {
        tab: String,
        #[serde(default = "four", rename = "measures-per-line")]
        measures_per_line: u32,
    },
    /// Silent measures.
    Rest { rest: u32 },
    Cresc { cresc: f64, measures: u32 },
    Rit { rit: f64, measures: u32 },
    Tempo {
        tempo: f64,
        #[serde(default)]
        at: Option<u64>,
    },
}

/// An auxiliary voice with its own configuration and score.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Voice {
    #[serde(flatten)]
    pub config: InstrumentConfig,
    #[serde(default)]
    pub score: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Song {
    #[serde(flatten)]
    pub config: InstrumentConfig,
    #[serde(default)]
    pub patterns: BTreeMap<String, PatternDef>,
    #[serde(default)]
    pub score: Vec<Step>,
    #[serde(default)]
    pub voices: Vec<Voice>,
}

impl Song {
    pub fn from_yaml(source: &str) -> Result<Self, StrumError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn compile_patterns(&self) -> Result<BTreeMap<String, Pattern>, StrumError> {
        self.patterns
            .iter()
            .map(|(name, def)| {
                let pattern = def.compile()?;
                log::debug!(target: "pattern", "pattern '{}': {} group(s)", name, pattern.len());
                Ok((name.clone(), pattern))
            })
            .collect()
    }

    /// Build the instrument and its voices and run every score, without
    /// finishing.
    pub fn perform(&self) -> Result<Instrument, StrumError> {
        let patterns = self.compile_patterns()?;
        let mut master = Instrument::new(self.config.clone())?;
        run_score(&mut master, &self.score, &patterns)?;
        for voice in &self.voices {
            let aux = master.auxiliary(voice.config.clone())?;
            run_score(aux, &voice.score, &patterns)?;
        }
        Ok(master)
    }

    /// Perform the song and finish it.
    pub fn render(&self) -> Result<Sequence, StrumError> {
        let mut master = self.perform()?;
        master.finish()?.ok_or_else(|| {
            StrumError::ConfigError(format!("instrument '{}' produced no sequence", master.name()))
        })
    }
}

fn run_score(
    instrument: &mut Instrument,
    score: &[Step],
    patterns: &BTreeMap<String, Pattern>,
) -> Result<(), StrumError> {
    for step in score {
        match step {
            Step::Play {
                play,
                chords,
                repeat,
            } => {
                let pattern = patterns
                    .get(play)
                    .ok_or_else(|| StrumError::ConfigError(format!("Unknown pattern: {}", play)))?;
                for _ in 0..*repeat {
                    instrument.play(pattern, chords.as_slice())?;
                }
            }
            Step::Tab {
                tab,
                measures_per_line,
            } => instrument.tab(*measures_per_line, tab)?,
            Step::Rest { rest } => {
                for _ in 0..*rest {
                    instrument.rest()?;
                }
            }
            Step::Cresc { cresc, measures } => instrument.cresc(*cresc, *measures)?,
            Step::Rit { rit, measures } => instrument.rit(*rit, *measures)?,
            Step::Tempo { tempo, at: Some(tick) } => instrument.tempo_at(*tempo, *tick)?,
            Step::Tempo { tempo, at: None } => instrument.tempo(*tempo)?,
        }
    }
    Ok(())
}
