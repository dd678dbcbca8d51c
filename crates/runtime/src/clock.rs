/// Synthetic animation counter: one step per rendered frame.
///
/// Not wall-clock time. Playback speed follows the display refresh rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Clock {
    t: u64,
}

impl Clock {
    /// A fresh clock at frame 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current frame.
    pub fn now(&self) -> u64 {
        self.t
    }

    /// Move to the next frame and return it.
    pub fn advance(&mut self) -> u64 {
        self.t += 1;
        self.t
    }
}
