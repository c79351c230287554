use dynlist_shared::TimerToken;

/// Issues the provider-wide token sequences: correlation tokens for fetch
/// requests and timer tokens for the logical clock. Correlation tokens are
/// decimal strings so they survive hosts that round-trip them as text.
pub struct TokenSource {
    correlation: u64,
    timer: TimerToken,
}

impl TokenSource {
    pub fn new() -> Self {
        Self {
            correlation: 100,
            timer: 0,
        }
    }

    pub fn next_correlation(&mut self) -> String {
        self.correlation += 1;
        self.correlation.to_string()
    }

    pub fn next_timer(&mut self) -> TimerToken {
        self.timer += 1;
        self.timer
    }
}
