//! Ramp tracker: gradual volume and tempo changes.
//!
//! Volume ramps are continuous: the scale factor is interpolated for every
//! note at the tick it sounds. Tempo ramps are a staircase of discrete tempo
//! events, one per beat, since the target format has no continuous tempo.

/// A linear ramp between two ticks. Ticks are signed because a ramp may start
/// a beat before the beginning of the timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ramp {
    pub start_tick: i64,
    pub start_value: f64,
    pub end_tick: i64,
    pub end_value: f64,
}

impl Ramp {
    /// Interpolated value at `tick`, or `None` before the ramp starts.
    pub fn value_at(&self, tick: i64) -> Option<f64> {
        if tick >= self.end_tick {
            Some(self.end_value)
        } else if tick >= self.start_tick {
            let slope =
                (self.end_value - self.start_value) / (self.end_tick - self.start_tick) as f64;
            Some(self.start_value + slope * (tick - self.start_tick) as f64)
        } else {
            None
        }
    }
}

pub const MICROS_PER_MINUTE: f64 = 60_000_000.0;

pub fn micros_per_beat(bpm: f64) -> u32 {
    (MICROS_PER_MINUTE / bpm).round() as u32
}

#[derive(Debug, Clone)]
pub struct RampTracker {
    volume: f64,
    volume_ramp: Option<Ramp>,
    initial_tempo: f64,
    tempo: f64,
    tempo_changes: Vec<(u64, u32)>,
}

impl RampTracker {
    pub fn new(volume: f64, tempo: f64) -> Self {
        Self {
            volume,
            volume_ramp: None,
            initial_tempo: tempo,
            tempo,
            tempo_changes: Vec::new(),
        }
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Start a volume ramp from the current volume to `factor` times it.
    /// Replaces any ramp in progress.
    pub fn start_volume_ramp(&mut self, factor: f64, start_tick: i64, end_tick: i64) {
        let ramp = Ramp {
            start_tick,
            start_value: self.volume,
            end_tick,
            end_value: self.volume * factor,
        };
        if let Some(old) = self.volume_ramp.replace(ramp) {
            log::debug!(target: "timeline", "volume ramp to {:.3} superseded", old.end_value);
        }
        log::debug!(
            target: "timeline",
            "volume ramp {:.3} -> {:.3} over ticks {}..{}",
            ramp.start_value, ramp.end_value, start_tick, end_tick
        );
    }

    /// Volume scale at `tick`, completing the ramp once its end is reached.
    pub fn volume_at(&mut self, tick: i64) -> f64 {
        if let Some(ramp) = self.volume_ramp {
            if let Some(value) = ramp.value_at(tick) {
                self.volume = value;
            }
            if tick >= ramp.end_tick {
                self.volume_ramp = None;
                log::debug!(target: "timeline", "volume ramp complete at {:.3}", self.volume);
            }
        }
        self.volume
    }

    /// Scale a raw velocity by the volume at `tick`, capped at 127.
    pub fn scale_velocity(&mut self, velocity: i32, tick: i64) -> u8 {
        let scaled = (velocity as f64 * self.volume_at(tick)).round();
        scaled.clamp(0.0, 127.0) as u8
    }

    pub fn initial_tempo(&self) -> f64 {
        self.initial_tempo
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn tempo_changes(&self) -> &[(u64, u32)] {
        &self.tempo_changes
    }

    /// Queue a tempo change at `tick`.
    pub fn set_tempo(&mut self, bpm: f64, tick: u64) {
        let micros = micros_per_beat(bpm);
        self.tempo = bpm;
        self.tempo_changes.push((tick, micros));
        log::debug!(target: "timeline", "tempo {:.2} bpm ({} us/beat) at tick {}", bpm, micros, tick);
    }

    /// Step the tempo linearly to `factor` times its current value over
    /// `beats` beats, one tempo change per beat starting at `start_tick`.
    pub fn tempo_staircase(&mut self, factor: f64, beats: u64, start_tick: u64, ticks_per_beat: u64) {
        let from = self.tempo;
        let to = from * factor;
        if beats == 0 {
            self.set_tempo(to, start_tick);
            return;
        }
        let step = (from - to) / beats as f64;
        for i in 0..beats {
            let bpm = if i + 1 == beats {
                to
            } else {
                from - step * (i + 1) as f64
            };
            self.set_tempo(bpm, start_tick + i * ticks_per_beat);
        }
    }
}
