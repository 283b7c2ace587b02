//! Integration tests for strumline
//!
//! Tests the full pipeline from song documents and instruments to Standard
//! MIDI File bytes, read back with midly.

use midly::num::{u15, u24, u4, u7};
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use strumline::{
    compile_pluck, render, render_to_file, to_smf_bytes, Instrument, InstrumentConfig, StrumError,
};

fn note_on(channel: u8, key: u8, vel: u8) -> TrackEventKind<'static> {
    TrackEventKind::Midi {
        channel: u4::new(channel),
        message: MidiMessage::NoteOn {
            key: u7::new(key),
            vel: u7::new(vel),
        },
    }
}

fn note_off(channel: u8, key: u8) -> TrackEventKind<'static> {
    TrackEventKind::Midi {
        channel: u4::new(channel),
        message: MidiMessage::NoteOff {
            key: u7::new(key),
            vel: u7::new(0),
        },
    }
}

#[test]
fn test_strum_song_to_midi() {
    let source = r#"
tempo: 100
attribution: false
patterns:
  c: { strum: ["1 4/4 6:90 1-3:80"] }
score:
  - play: c
    chords: ["0 3 2 0 1 0"]
"#;
    let sequence = render(source).unwrap();
    let bytes = to_smf_bytes(&sequence).unwrap();
    let smf = Smf::parse(&bytes).unwrap();

    assert_eq!(smf.header.timing, Timing::Metrical(u15::new(192)));
    assert_eq!(smf.tracks.len(), 2);

    let control: Vec<TrackEventKind> = smf.tracks[0].iter().map(|e| e.kind).collect();
    assert_eq!(
        control,
        vec![
            TrackEventKind::Meta(MetaMessage::Tempo(u24::new(600_000))),
            TrackEventKind::Meta(MetaMessage::TimeSignature(4, 2, 24, 8)),
            TrackEventKind::Meta(MetaMessage::EndOfTrack),
        ]
    );

    let notes: Vec<(u32, TrackEventKind)> = smf.tracks[1]
        .iter()
        .map(|e| (e.delta.as_int(), e.kind))
        .collect();
    assert_eq!(
        notes,
        vec![
            (0, TrackEventKind::Meta(MetaMessage::TrackName(b"Guitar"))),
            (
                0,
                TrackEventKind::Midi {
                    channel: u4::new(0),
                    message: MidiMessage::ProgramChange { program: u7::new(24) },
                }
            ),
            (0, note_on(0, 40, 90)),
            (192, note_on(0, 64, 80)),
            (0, note_on(0, 60, 80)),
            (0, note_on(0, 55, 80)),
            (576, note_off(0, 40)),
            (0, note_off(0, 55)),
            (0, note_off(0, 60)),
            (0, note_off(0, 64)),
            (0, TrackEventKind::Meta(MetaMessage::EndOfTrack)),
        ]
    );
}

#[test]
fn test_instrument_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("banjo.mid");

    let config = InstrumentConfig {
        name: "Banjo".to_string(),
        instrument: "banjo".into(),
        strings: vec!["G4".into(), "D3".into(), "G3".into(), "B3".into(), "D4".into()],
        tempo: 120.0,
        channel: 3,
        ..Default::default()
    };
    let mut banjo = Instrument::new(config).unwrap();
    let roll = compile_pluck(&["1 3:80", "1.5 2:80", "2 1:80", "2.5 5:70"]).unwrap();
    banjo.play(&roll, &["0 0 0 0 0", "0 2 0 1 0"]).unwrap();
    banjo.rit(0.5, 1).unwrap();
    banjo.rest().unwrap();

    let sequence = banjo.finish().unwrap().unwrap();
    sequence.write_to_file(&path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    let smf = Smf::parse(&bytes).unwrap();
    assert_eq!(smf.tracks.len(), 2);

    let tempos = smf.tracks[0]
        .iter()
        .filter(|e| matches!(e.kind, TrackEventKind::Meta(MetaMessage::Tempo(_))))
        .count();
    // initial tempo plus one per beat of the ritardando
    assert_eq!(tempos, 5);

    let notes = &smf.tracks[1];
    let ons = notes
        .iter()
        .filter(|e| matches!(e.kind, TrackEventKind::Midi { message: MidiMessage::NoteOn { .. }, .. }))
        .count();
    assert_eq!(ons, 8);
    assert!(notes.iter().all(|e| match e.kind {
        TrackEventKind::Midi { channel, .. } => channel.as_int() == 3,
        _ => true,
    }));
}

#[test]
fn test_render_to_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("drums.mid");
    let source = r#"
name: Drums
percussion: true
strings: [bass drum 1, acoustic snare, closed hi-hat]
metronome: true
score:
  - tab: |
      |9-9-9-9-|9-9-9-9-|
      |----9---|----9---|
      |9-------|9---5---|
    measures-per-line: 2
"#;
    let written = render_to_file(source, Some(&path)).unwrap();
    assert_eq!(written, path);

    let bytes = std::fs::read(&path).unwrap();
    let smf = Smf::parse(&bytes).unwrap();
    // control, drums, metronome
    assert_eq!(smf.tracks.len(), 3);
    let hits = smf.tracks[1]
        .iter()
        .filter(|e| {
            matches!(
                e.kind,
                TrackEventKind::Midi { channel, message: MidiMessage::NoteOn { .. } } if channel.as_int() == 9
            )
        })
        .count();
    assert_eq!(hits, 13);
}

#[test]
fn test_errors_surface_from_render() {
    assert!(matches!(render("tempo: [fast]"), Err(StrumError::Yaml(_))));

    let bad_tab = r#"
score:
  - tab: "0----\n-----\n-----\n-----\n-----\n-----"
    measures-per-line: 1
"#;
    assert!(matches!(render(bad_tab), Err(StrumError::FormatError { width: 5, .. })));

    let bad_chord = r#"
patterns:
  p: { pluck: ["1 1:80"] }
score:
  - play: p
    chords: ["0 0"]
"#;
    assert!(matches!(render(bad_chord), Err(StrumError::ConfigError(_))));
}
