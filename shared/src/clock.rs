use std::collections::BTreeSet;

/// Logical timestamp in milliseconds. Purely host-defined; the engine never
/// reads wall-clock time.
pub type LogicalTime = u64;

/// Opaque handle naming one armed timer.
pub type TimerToken = u64;

/// Scheduling capability injected into every engine entry point that arms or
/// cancels timeouts.
///
/// The engine never blocks on a timer: it arms tokens here and the host
/// later feeds due tokens back through `ListProvider::handle_timer`. The
/// host decides how logical time maps to anything real.
pub trait LogicalClock {
    /// Current logical time.
    fn now(&self) -> LogicalTime;

    /// Arm `token` to fire at `time`. Re-arming an already-armed token
    /// moves it.
    fn schedule_at(&mut self, time: LogicalTime, token: TimerToken);

    /// Disarm `token` if it is armed. Unknown tokens are ignored.
    fn cancel(&mut self, token: TimerToken);
}

/// Host-advanced clock. The host moves time forward explicitly and collects
/// the tokens that came due, in firing order. Production and test setups
/// differ only in how the host chooses to advance it.
#[derive(Debug, Default)]
pub struct StepClock {
    now: LogicalTime,
    armed: BTreeSet<(LogicalTime, TimerToken)>,
}

impl StepClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to `time` (a no-op when `time` is in the past) and return
    /// every token that came due, ordered by deadline then token.
    pub fn advance_to(&mut self, time: LogicalTime) -> Vec<TimerToken> {
        if time > self.now {
            self.now = time;
        }
        let mut due = Vec::new();
        while let Some(&(at, token)) = self.armed.iter().next() {
            if at > self.now {
                break;
            }
            self.armed.remove(&(at, token));
            due.push(token);
        }
        due
    }

    pub fn advance_by(&mut self, delta: LogicalTime) -> Vec<TimerToken> {
        self.advance_to(self.now + delta)
    }

    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }
}

impl LogicalClock for StepClock {
    fn now(&self) -> LogicalTime {
        self.now
    }

    fn schedule_at(&mut self, time: LogicalTime, token: TimerToken) {
        self.armed.retain(|&(_, armed)| armed != token);
        self.armed.insert((time, token));
    }

    fn cancel(&mut self, token: TimerToken) {
        self.armed.retain(|&(_, armed)| armed != token);
    }
}
