use midi_tokenizer::performance::{quantize, seconds_per_step};
use midi_tokenizer::{Event, MidiTokenizer, Note, Performance, Tokenizer, store};
use proptest::prelude::*;

fn steps_of(performance: &Performance) -> (Vec<(u8, u64)>, Vec<(u8, u64)>) {
    let sps = performance.seconds_per_step();
    let mut starts = Vec::new();
    let mut ends = Vec::new();
    for note in &performance.notes {
        let start = quantize(note.start, sps);
        let end = quantize(note.end, sps).max(start + 1);
        starts.push((note.pitch, start));
        ends.push((note.pitch, end));
    }
    starts.sort();
    ends.sort();
    (starts, ends)
}

#[test]
fn piece_survives_midi_and_token_files() {
    let sps = seconds_per_step(120.0);
    let at = |step: u64| step as f64 * sps;
    let original = Performance::new(
        vec![
            Note::new(60, 80, at(0), at(24)),
            Note::new(64, 70, at(0), at(24)),
            Note::new(67, 60, at(12), at(300)),
            Note::new(60, 100, at(24), at(48)),
        ],
        Some(120.0),
    );

    let dir = tempfile::tempdir().unwrap();
    let midi_path = dir.path().join("piece.mid");
    let token_path = dir.path().join("piece.tokens");
    original.save(&midi_path).unwrap();

    let tokenizer = MidiTokenizer::new();
    let tokens = tokenizer.midi_to_tokens(&midi_path).unwrap();
    store::save_tokens(&token_path, &tokens).unwrap();

    let loaded = store::load_tokens(&token_path).unwrap();
    assert_eq!(loaded, tokens);

    let rebuilt = tokenizer.tokens_to_midi(&loaded);
    assert_eq!(rebuilt.notes.len(), 4);
    assert_eq!(steps_of(&rebuilt), steps_of(&original));

    let rebuilt_path = dir.path().join("rebuilt.mid");
    rebuilt.save(&rebuilt_path).unwrap();
    assert_eq!(tokenizer.midi_to_tokens(&rebuilt_path).unwrap(), tokens);
}

#[test]
fn long_rest_is_chunked() {
    let tokenizer = MidiTokenizer::new();
    let sps = seconds_per_step(120.0);
    let performance = Performance::new(
        vec![
            Note::new(60, 64, 0.0, sps),
            Note::new(62, 64, 251.0 * sps, 252.0 * sps),
        ],
        None,
    );
    let tokens = tokenizer.encode(&performance).unwrap();
    let events = tokenizer.events(&tokens).unwrap();
    let shifts: Vec<Event> = events
        .iter()
        .copied()
        .filter(|e| matches!(e, Event::TimeShift { .. }))
        .collect();
    assert_eq!(
        shifts,
        vec![
            Event::TimeShift { steps: 1 },
            Event::TimeShift { steps: 100 },
            Event::TimeShift { steps: 100 },
            Event::TimeShift { steps: 50 },
            Event::TimeShift { steps: 1 },
        ]
    );
}

#[test]
fn source_tempo_only_changes_seconds() {
    let tokenizer = MidiTokenizer::new();
    // one beat at 90 BPM is 24 steps
    let beat = 60.0 / 90.0;
    let performance = Performance::new(vec![Note::new(60, 64, beat, 2.0 * beat)], Some(90.0));
    let decoded = tokenizer.decode(&tokenizer.encode(&performance).unwrap());
    assert_eq!(decoded.tempo_bpm, Some(120.0));
    assert!((decoded.notes[0].start - 0.5).abs() < 1e-9);
    assert!((decoded.notes[0].end - 1.0).abs() < 1e-9);
}

fn arb_performance() -> impl Strategy<Value = Performance> {
    let note = (0u8..128, 0u8..128, 0.0f64..30.0, 0.0f64..4.0)
        .prop_map(|(pitch, velocity, start, len)| Note::new(pitch, velocity, start, start + len));
    (
        prop::collection::vec(note, 0..40),
        prop::option::of(30.0f64..240.0),
    )
        .prop_map(|(notes, tempo)| Performance::new(notes, tempo))
}

proptest! {
    #[test]
    fn reencoding_decoded_output_is_identity(performance in arb_performance()) {
        let tokenizer = MidiTokenizer::new();
        let tokens = tokenizer.encode(&performance).unwrap();
        let again = tokenizer.encode(&tokenizer.decode(&tokens)).unwrap();
        prop_assert_eq!(again, tokens);
    }

    #[test]
    fn round_trip_keeps_step_structure(performance in arb_performance()) {
        let tokenizer = MidiTokenizer::new();
        let decoded = tokenizer.decode(&tokenizer.encode(&performance).unwrap());
        prop_assert_eq!(decoded.notes.len(), performance.notes.len());
        prop_assert_eq!(steps_of(&decoded), steps_of(&performance));
    }

    #[test]
    fn decoding_arbitrary_ids_never_fails(ids in prop::collection::vec(any::<u16>(), 0..200)) {
        let performance = MidiTokenizer::new().decode(&ids);
        for note in &performance.notes {
            prop_assert!(note.end > note.start);
            prop_assert!((1..=127).contains(&note.velocity));
        }
    }
}
