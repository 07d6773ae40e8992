//! Performance to token sequence.

use tracing::debug;

use crate::base::Token;
use crate::error::{Result, TokenizerError};
use crate::event::{Event, MAX_TIME_SHIFT_STEPS};
use crate::performance::{Performance, quantize, velocity_to_bin};
use crate::vocab::Vocabulary;

// Off sorts before On so a release and a re-strike on the same step come out in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Kind {
    Off = 0,
    On = 1,
}

#[derive(Debug, Clone, Copy)]
struct PointEvent {
    step: u64,
    kind: Kind,
    pitch: u8,
    bin: u8,
}

/// Note boundaries on the step grid, sorted by `(step, kind, pitch)`.
fn point_events(performance: &Performance) -> Result<Vec<PointEvent>> {
    let sps = performance.seconds_per_step();
    let mut points = Vec::with_capacity(performance.notes.len() * 2);
    for note in &performance.notes {
        if !note.start.is_finite() || !note.end.is_finite() {
            return Err(TokenizerError::Encoding(format!(
                "note {} has non-finite time {}..{}",
                note.pitch, note.start, note.end
            )));
        }
        let start_step = quantize(note.start, sps);
        let mut end_step = quantize(note.end, sps);
        if end_step <= start_step {
            end_step = start_step.checked_add(1).ok_or_else(|| {
                TokenizerError::Encoding(format!("note {} starts past the step grid", note.pitch))
            })?;
        }
        points.push(PointEvent {
            step: start_step,
            kind: Kind::On,
            pitch: note.pitch,
            bin: velocity_to_bin(note.velocity),
        });
        points.push(PointEvent {
            step: end_step,
            kind: Kind::Off,
            pitch: note.pitch,
            bin: 0,
        });
    }
    points.sort_by_key(|p| (p.step, p.kind, p.pitch));
    Ok(points)
}

/// Push time shifts covering `gap` steps, at most 100 per event.
fn push_time_shifts(events: &mut Vec<Event>, mut gap: u64) {
    while gap > 0 {
        let chunk = gap.min(MAX_TIME_SHIFT_STEPS as u64);
        events.push(Event::TimeShift { steps: chunk as u8 });
        gap -= chunk;
    }
}

/// The symbolic event stream for a performance, before ID lookup.
pub fn encode_events(performance: &Performance) -> Result<Vec<Event>> {
    let points = point_events(performance)?;
    let mut events = Vec::new();
    let mut current_step = 0;

    for group in points.chunk_by(|a, b| a.step == b.step) {
        let step = group[0].step;
        push_time_shifts(&mut events, step - current_step);
        current_step = step;

        for p in group.iter().filter(|p| p.kind == Kind::Off) {
            events.push(Event::NoteOff { pitch: p.pitch });
        }
        for p in group.iter().filter(|p| p.kind == Kind::On) {
            events.push(Event::Velocity { bin: p.bin });
            events.push(Event::NoteOn { pitch: p.pitch });
        }
    }
    Ok(events)
}

/// Encode a performance into token IDs. Fails as a whole if any event has no ID.
pub fn encode(vocab: &Vocabulary, performance: &Performance) -> Result<Vec<Token>> {
    let events = encode_events(performance)?;
    let tokens = events
        .into_iter()
        .map(|event| {
            vocab
                .encode(event)
                .map_err(|_| TokenizerError::Encoding(event.to_string()))
        })
        .collect::<Result<Vec<_>>>()?;
    debug!(
        "encoded {} notes into {} tokens",
        performance.notes.len(),
        tokens.len()
    );
    Ok(tokens)
}
