//! Name resolution for notes, instruments and percussion voices.
//!
//! The timeline engine only deals in numbers. Everything a user spells out by
//! name (a tuning like `E2 A2 D3`, a patch like `acoustic guitar (steel)`, a
//! drum kit like `bass drum 1, closed hi-hat`) goes through a [`NameResolver`].
//! [`GeneralMidi`] is the stock resolver backed by the General MIDI level 1
//! tables.

use crate::error::StrumError;

/// Maps user-facing names to MIDI numbers.
pub trait NameResolver {
    /// Note name (`E2`, `C#4`, `Bb3`) or raw number to a pitch number.
    fn note_to_pitch(&self, name: &str) -> Result<u8, StrumError>;

    /// Instrument name or program number to a patch number (0-127).
    fn instrument_to_patch(&self, name: &str) -> Result<u8, StrumError>;

    /// Percussion name or key number to a percussion voice number.
    fn percussion_to_voice(&self, name: &str) -> Result<u8, StrumError>;
}

/// General MIDI level 1 name tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneralMidi;

/// Program names indexed by patch number.
const PROGRAMS: [&str; 128] = [
    "acoustic grand piano",
    "bright acoustic piano",
    "electric grand piano",
    "honky-tonk piano",
    "electric piano 1",
    "electric piano 2",
    "harpsichord",
    "clavi",
    "celesta",
    "glockenspiel",
    "music box",
    "vibraphone",
    "marimba",
    "xylophone",
    "tubular bells",
    "dulcimer",
    "drawbar organ",
    "percussive organ",
    "rock organ",
    "church organ",
    "reed organ",
    "accordion",
    "harmonica",
    "tango accordion",
    "acoustic guitar (nylon)",
    "acoustic guitar (steel)",
    "electric guitar (jazz)",
    "electric guitar (clean)",
    "electric guitar (muted)",
    "overdriven guitar",
    "distortion guitar",
    "guitar harmonics",
    "acoustic bass",
    "electric bass (finger)",
    "electric bass (pick)",
    "fretless bass",
    "slap bass 1",
    "slap bass 2",
    "synth bass 1",
    "synth bass 2",
    "violin",
    "viola",
    "cello",
    "contrabass",
    "tremolo strings",
    "pizzicato strings",
    "orchestral harp",
    "timpani",
    "string ensemble 1",
    "string ensemble 2",
    "synthstrings 1",
    "synthstrings 2",
    "choir aahs",
    "voice oohs",
    "synth voice",
    "orchestra hit",
    "trumpet",
    "trombone",
    "tuba",
    "muted trumpet",
    "french horn",
    "brass section",
    "synthbrass 1",
    "synthbrass 2",
    "soprano sax",
    "alto sax",
    "tenor sax",
    "baritone sax",
    "oboe",
    "english horn",
    "bassoon",
    "clarinet",
    "piccolo",
    "flute",
    "recorder",
    "pan flute",
    "blown bottle",
    "shakuhachi",
    "whistle",
    "ocarina",
    "lead 1 (square)",
    "lead 2 (sawtooth)",
    "lead 3 (calliope)",
    "lead 4 (chiff)",
    "lead 5 (charang)",
    "lead 6 (voice)",
    "lead 7 (fifths)",
    "lead 8 (bass + lead)",
    "pad 1 (new age)",
    "pad 2 (warm)",
    "pad 3 (polysynth)",
    "pad 4 (choir)",
    "pad 5 (bowed)",
    "pad 6 (metallic)",
    "pad 7 (halo)",
    "pad 8 (sweep)",
    "fx 1 (rain)",
    "fx 2 (soundtrack)",
    "fx 3 (crystal)",
    "fx 4 (atmosphere)",
    "fx 5 (brightness)",
    "fx 6 (goblins)",
    "fx 7 (echoes)",
    "fx 8 (sci-fi)",
    "sitar",
    "banjo",
    "shamisen",
    "koto",
    "kalimba",
    "bag pipe",
    "fiddle",
    "shanai",
    "tinkle bell",
    "agogo",
    "steel drums",
    "woodblock",
    "taiko drum",
    "melodic tom",
    "synth drum",
    "reverse cymbal",
    "guitar fret noise",
    "breath noise",
    "seashore",
    "bird tweet",
    "telephone ring",
    "helicopter",
    "applause",
    "gunshot",
];

/// First key of the percussion map.
const FIRST_PERCUSSION_KEY: u8 = 35;

/// Percussion names starting at key 35.
const PERCUSSION: [&str; 47] = [
    "acoustic bass drum",
    "bass drum 1",
    "side stick",
    "acoustic snare",
    "hand clap",
    "electric snare",
    "low floor tom",
    "closed hi-hat",
    "high floor tom",
    "pedal hi-hat",
    "low tom",
    "open hi-hat",
    "low-mid tom",
    "hi-mid tom",
    "crash cymbal 1",
    "high tom",
    "ride cymbal 1",
    "chinese cymbal",
    "ride bell",
    "tambourine",
    "splash cymbal",
    "cowbell",
    "crash cymbal 2",
    "vibraslap",
    "ride cymbal 2",
    "hi bongo",
    "low bongo",
    "mute hi conga",
    "open hi conga",
    "low conga",
    "high timbale",
    "low timbale",
    "high agogo",
    "low agogo",
    "cabasa",
    "maracas",
    "short whistle",
    "long whistle",
    "short guiro",
    "long guiro",
    "claves",
    "hi wood block",
    "low wood block",
    "mute cuica",
    "open cuica",
    "mute triangle",
    "open triangle",
];

/// Lowercase, drop punctuation, collapse separators.
/// `"Acoustic_Guitar (Nylon)"` and `"acoustic guitar nylon"` compare equal.
fn normalize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_space = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '+' {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '_' || c == '-' {
            pending_space = true;
        }
    }
    out
}

fn parse_number(name: &str, max: u8) -> Option<u8> {
    let trimmed = name.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<u8>().ok().filter(|n| *n <= max)
}

impl NameResolver for GeneralMidi {
    fn note_to_pitch(&self, name: &str) -> Result<u8, StrumError> {
        if let Some(n) = parse_number(name, 127) {
            return Ok(n);
        }
        parse_note_name(name.trim())
            .ok_or_else(|| StrumError::ConfigError(format!("Unknown note: {}", name)))
    }

    fn instrument_to_patch(&self, name: &str) -> Result<u8, StrumError> {
        if let Some(n) = parse_number(name, 127) {
            return Ok(n);
        }
        let wanted = normalize(name);
        PROGRAMS
            .iter()
            .position(|p| normalize(p) == wanted)
            .map(|i| i as u8)
            .ok_or_else(|| StrumError::ConfigError(format!("Unknown instrument: {}", name)))
    }

    fn percussion_to_voice(&self, name: &str) -> Result<u8, StrumError> {
        if let Some(n) = parse_number(name, 127) {
            return Ok(n);
        }
        let wanted = normalize(name);
        PERCUSSION
            .iter()
            .position(|p| normalize(p) == wanted)
            .map(|i| FIRST_PERCUSSION_KEY + i as u8)
            .ok_or_else(|| StrumError::ConfigError(format!("Unknown percussion: {}", name)))
    }
}

/// Parse `<letter><accidentals><octave>`, C4 = 60.
fn parse_note_name(name: &str) -> Option<u8> {
    let mut chars = name.chars().peekable();

    let base: i32 = match chars.next()?.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let mut accidental: i32 = 0;
    while let Some(&c) = chars.peek() {
        accidental = match c {
            '#' | 's' => accidental.checked_add(1)?,
            'b' => accidental.checked_sub(1)?,
            _ => break,
        };
        chars.next();
    }

    let octave_str: String = chars.collect();
    let octave: i32 = octave_str.parse().ok()?;

    let pitch = octave
        .checked_add(1)?
        .checked_mul(12)?
        .checked_add(base)?
        .checked_add(accidental)?;
    u8::try_from(pitch).ok().filter(|p| *p <= 127)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guitar_tuning() {
        let gm = GeneralMidi;
        let tuning: Vec<u8> = ["E2", "A2", "D3", "G3", "B3", "E4"]
            .iter()
            .map(|n| gm.note_to_pitch(n).unwrap())
            .collect();
        assert_eq!(tuning, vec![40, 45, 50, 55, 59, 64]);
    }

    #[test]
    fn test_accidentals_and_numbers() {
        let gm = GeneralMidi;
        assert_eq!(gm.note_to_pitch("C4").unwrap(), 60);
        assert_eq!(gm.note_to_pitch("C#4").unwrap(), 61);
        assert_eq!(gm.note_to_pitch("Bb3").unwrap(), 58);
        assert_eq!(gm.note_to_pitch("c-1").unwrap(), 0);
        assert_eq!(gm.note_to_pitch("62").unwrap(), 62);
        assert!(gm.note_to_pitch("H2").is_err());
        assert!(gm.note_to_pitch("E").is_err());
        assert_eq!(gm.note_to_pitch("G9").unwrap(), 127);
        assert!(gm.note_to_pitch("G#9").is_err());
        assert!(gm.note_to_pitch("C999999999").is_err());
        assert!(gm.note_to_pitch("C-999999999").is_err());
        assert!(gm.note_to_pitch("C2147483647").is_err());
    }

    #[test]
    fn test_instrument_names() {
        let gm = GeneralMidi;
        assert_eq!(gm.instrument_to_patch("acoustic guitar (nylon)").unwrap(), 24);
        assert_eq!(gm.instrument_to_patch("Acoustic_Guitar_Steel").unwrap(), 25);
        assert_eq!(gm.instrument_to_patch("banjo").unwrap(), 105);
        assert_eq!(gm.instrument_to_patch("33").unwrap(), 33);
        assert!(gm.instrument_to_patch("kazoo").is_err());
        assert!(gm.instrument_to_patch("128").is_err());
    }

    #[test]
    fn test_percussion_names() {
        let gm = GeneralMidi;
        assert_eq!(gm.percussion_to_voice("bass drum 1").unwrap(), 36);
        assert_eq!(gm.percussion_to_voice("Closed Hi-Hat").unwrap(), 42);
        assert_eq!(gm.percussion_to_voice("open triangle").unwrap(), 81);
        assert!(gm.percussion_to_voice("gong").is_err());
    }
}
