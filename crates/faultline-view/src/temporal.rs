//! Live/paused state machine owning the cursor and the visible window.
//!
//! Every operation returns a [`Transition`] describing what the caller has to
//! do next (start or stop the live timers, issue a fetch). The controller
//! itself never touches timers or the network.

use tracing::info;

use crate::client::FetchHint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Following wall-clock time; timers keep the cursor and data fresh.
    Live,
    /// Pinned at a historical cursor; data changes only on cursor moves.
    Paused,
}

/// Read-only view of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporalState {
    pub mode: Mode,
    pub cursor: i64,
    pub window_start: i64,
    pub window_end: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Keep,
    Start,
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub timers: TimerCommand,
    pub fetch: Option<FetchHint>,
}

impl Transition {
    pub const NONE: Self = Self {
        timers: TimerCommand::Keep,
        fetch: None,
    };
}

pub struct TemporalController {
    state: TemporalState,
    window_ms: i64,
}

impl TemporalController {
    /// Starts live at `now` with window `[now - window_ms, now]`.
    pub fn new(now: i64, window_ms: i64) -> Self {
        Self {
            state: TemporalState {
                mode: Mode::Live,
                cursor: now,
                window_start: now.saturating_sub(window_ms),
                window_end: now,
            },
            window_ms,
        }
    }

    pub fn state(&self) -> TemporalState {
        self.state
    }

    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    pub fn is_live(&self) -> bool {
        self.state.mode == Mode::Live
    }

    /// Explicit pause/resume. Pausing pins the cursor and issues no fetch;
    /// resuming snaps cursor and window to `now` and restarts the timers.
    pub fn set_live(&mut self, live: bool, now: i64) -> Transition {
        match (self.state.mode, live) {
            (Mode::Live, true) | (Mode::Paused, false) => Transition::NONE,
            (Mode::Live, false) => {
                self.state.mode = Mode::Paused;
                info!(cursor = self.state.cursor, "paused");
                Transition {
                    timers: TimerCommand::Stop,
                    fetch: None,
                }
            }
            (Mode::Paused, true) => {
                self.state.mode = Mode::Live;
                self.follow(now);
                info!(cursor = now, "resumed live");
                Transition {
                    timers: TimerCommand::Start,
                    fetch: None,
                }
            }
        }
    }

    /// Moves the cursor to `ts`, pausing first if live. The cursor may leave
    /// the window; the window itself only moves while live.
    pub fn set_cursor(&mut self, ts: i64) -> Transition {
        let timers = if self.is_live() {
            self.state.mode = Mode::Paused;
            info!(cursor = ts, "paused by cursor move");
            TimerCommand::Stop
        } else {
            TimerCommand::Keep
        };
        self.state.cursor = ts;
        Transition {
            timers,
            fetch: Some(FetchHint::Exact(ts)),
        }
    }

    pub fn step(&mut self, delta_ms: i64) -> Transition {
        self.set_cursor(self.state.cursor.saturating_add(delta_ms))
    }

    /// Window-timer tick. Returns whether anything changed (never while paused).
    pub fn advance(&mut self, now: i64) -> bool {
        if !self.is_live() {
            return false;
        }
        let before = self.state;
        self.follow(now);
        before != self.state
    }

    /// What a fetch issued right now should ask for.
    pub fn fetch_hint(&self) -> FetchHint {
        match self.state.mode {
            Mode::Live => FetchHint::Live {
                advisory_ms: self.state.cursor,
            },
            Mode::Paused => FetchHint::Exact(self.state.cursor),
        }
    }

    fn follow(&mut self, now: i64) {
        self.state.cursor = now;
        self.state.window_start = now.saturating_sub(self.window_ms);
        self.state.window_end = now;
    }
}
