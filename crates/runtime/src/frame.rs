/// Deterministic frame metadata.
///
/// Frames are counted, not timed: playback advances a fixed step per frame
/// regardless of wall-clock, so a recorded frame sequence replays exactly.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Nominal delta time (seconds).
    pub dt_s: f64,
}

pub const DISPLAY_DT_S: f64 = 1.0 / 60.0;

impl Frame {
    pub fn new(index: u64, dt_s: f64) -> Self {
        Self { index, dt_s }
    }

    pub fn first() -> Self {
        Self::new(0, DISPLAY_DT_S)
    }

    /// Nominal elapsed time at the start of this frame.
    pub fn elapsed_s(&self) -> f64 {
        self.index as f64 * self.dt_s
    }

    pub fn next(self) -> Self {
        Self::new(self.index + 1, self.dt_s)
    }
}
