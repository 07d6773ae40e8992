//! Notes in continuous time, plus the conversions between seconds and the step grid.

/// Quantization grid resolution.
pub const STEPS_PER_BEAT: u32 = 24;
/// Tempo assumed when the source declares none.
pub const DEFAULT_BPM: f64 = 120.0;
/// Tempo every decoded performance is rebuilt at.
pub const RECONSTRUCT_BPM: f64 = 120.0;

/// A single note interval, times in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub pitch: u8,
    pub velocity: u8,
    pub start: f64,
    pub end: f64,
}

impl Note {
    pub fn new(pitch: u8, velocity: u8, start: f64, end: f64) -> Self {
        Note {
            pitch,
            velocity,
            start,
            end,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// A parsed piece of music: every note from every track, and the declared tempo.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Performance {
    pub notes: Vec<Note>,
    /// First tempo found in the source, if any.
    pub tempo_bpm: Option<f64>,
}

impl Performance {
    pub fn new(notes: Vec<Note>, tempo_bpm: Option<f64>) -> Self {
        Performance { notes, tempo_bpm }
    }

    /// The tempo used for quantization. Anything that is not a positive finite BPM counts
    /// as undeclared.
    pub fn effective_bpm(&self) -> f64 {
        match self.tempo_bpm {
            Some(bpm) if bpm.is_finite() && bpm > 0.0 => bpm,
            _ => DEFAULT_BPM,
        }
    }

    pub fn seconds_per_step(&self) -> f64 {
        seconds_per_step(self.effective_bpm())
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

pub fn seconds_per_step(bpm: f64) -> f64 {
    (60.0 / bpm) / STEPS_PER_BEAT as f64
}

/// Snap a time in seconds to the nearest step, halves to even.
pub fn quantize(time: f64, seconds_per_step: f64) -> u64 {
    if seconds_per_step == 0.0 {
        return 0;
    }
    let step = (time / seconds_per_step).round_ties_even();
    // negative or NaN times land on step 0
    if step > 0.0 { step as u64 } else { 0 }
}

/// Compress a MIDI velocity into one of 32 bins.
pub fn velocity_to_bin(velocity: u8) -> u8 {
    (velocity.clamp(1, 127) as u16 * 32 / 128) as u8
}

/// Representative velocity for a bin: its midpoint.
pub fn bin_to_velocity(bin: u8) -> u8 {
    (bin as u16 * 4 + 2).clamp(1, 127) as u8
}
