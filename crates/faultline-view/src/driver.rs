//! The single-threaded loop that ties a viewing session together.
//!
//! Three event streams feed it: operator commands, live timer ticks and fetch
//! completions. Each event is handled to completion before the next one is
//! looked at, and the surface is redrawn after every event that changed
//! something. Fetches run as separate tasks so the loop never waits on the
//! network.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use faultline_types::GraphSnapshot;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::client::{FetchHint, SnapshotSource};
use crate::clock::Clock;
use crate::config::ViewConfig;
use crate::error::FetchError;
use crate::render::RenderSurface;
use crate::scheduler::{LiveScheduler, Tick, TickKind};
use crate::selection::SelectionEvent;
use crate::session::{FetchOutcome, FetchTicket, ViewSession};
use crate::temporal::{TemporalController, TimerCommand, Transition};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Explicit resume (`true`) or pause (`false`).
    SetLive(bool),
    /// Scrub to an absolute timestamp.
    SetCursor(i64),
    /// Move the cursor by a signed delta.
    Step(i64),
    Select(SelectionEvent),
    ClearSelection,
    Shutdown,
}

type Completion = (FetchTicket, Result<GraphSnapshot, FetchError>);

enum Event {
    Completed(Completion),
    Tick(Tick),
    Command(Option<Command>),
}

pub struct ViewLoop<R: RenderSurface> {
    session: ViewSession,
    controller: TemporalController,
    scheduler: LiveScheduler,
    ticks: mpsc::UnboundedReceiver<Tick>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions: mpsc::UnboundedReceiver<Completion>,
    source: Arc<dyn SnapshotSource>,
    fetch_timeout: Duration,
    clock: Arc<dyn Clock>,
    surface: R,
}

impl<R: RenderSurface> ViewLoop<R> {
    /// Fails when `config` does not validate; zero cadences would never
    /// tick.
    pub fn new(
        config: &ViewConfig,
        source: Arc<dyn SnapshotSource>,
        clock: Arc<dyn Clock>,
        surface: R,
    ) -> Result<Self, String> {
        config.validate()?;
        let (ticks_tx, ticks) = mpsc::unbounded_channel();
        let (completions_tx, completions) = mpsc::unbounded_channel();
        Ok(Self {
            session: ViewSession::default(),
            controller: TemporalController::new(clock.now_ms(), config.window_span()),
            scheduler: LiveScheduler::new(ticks_tx, config.window_tick(), config.poll_interval()),
            ticks,
            completions_tx,
            completions,
            source,
            fetch_timeout: config.timeout(),
            clock,
            surface,
        })
    }

    /// Runs until `Shutdown` or until every command sender is gone, then
    /// stops the timers and hands the surface back.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) -> io::Result<R> {
        if self.controller.is_live() {
            self.scheduler.start();
        }
        self.render()?;

        loop {
            let event = tokio::select! {
                biased;
                Some(completion) = self.completions.recv() => Event::Completed(completion),
                Some(tick) = self.ticks.recv() => Event::Tick(tick),
                command = commands.recv() => Event::Command(command),
            };

            let changed = match event {
                Event::Completed((ticket, result)) => {
                    self.session.complete_fetch(ticket, result) != FetchOutcome::Stale
                }
                Event::Tick(tick) => self.handle_tick(tick),
                Event::Command(None | Some(Command::Shutdown)) => break,
                Event::Command(Some(command)) => self.handle_command(command),
            };
            if changed {
                self.render()?;
            }
        }

        self.scheduler.stop();
        info!("view loop finished");
        Ok(self.surface)
    }

    fn handle_command(&mut self, command: Command) -> bool {
        debug!(?command, "command");
        match command {
            Command::SetLive(live) => {
                let transition = self.controller.set_live(live, self.clock.now_ms());
                self.apply(transition)
            }
            Command::SetCursor(ts) => {
                let transition = self.controller.set_cursor(ts);
                self.apply(transition)
            }
            Command::Step(delta) => {
                let transition = self.controller.step(delta);
                self.apply(transition)
            }
            Command::Select(event) => self.session.select(&event),
            Command::ClearSelection => self.session.clear_selection(),
            Command::Shutdown => false,
        }
    }

    fn handle_tick(&mut self, tick: Tick) -> bool {
        if !self.scheduler.is_current(&tick) {
            debug!(generation = tick.generation, "ignoring tick from stopped timers");
            return false;
        }
        match tick.kind {
            TickKind::Window => self.controller.advance(self.clock.now_ms()),
            TickKind::Fetch => {
                // An older poll still in flight is superseded by this one.
                self.issue_fetch(self.controller.fetch_hint());
                true
            }
        }
    }

    fn apply(&mut self, transition: Transition) -> bool {
        match transition.timers {
            TimerCommand::Keep => {}
            TimerCommand::Start => {
                self.scheduler.start();
            }
            TimerCommand::Stop => self.scheduler.stop(),
        }
        if let Some(hint) = transition.fetch {
            self.issue_fetch(hint);
        }
        transition != Transition::NONE
    }

    fn issue_fetch(&mut self, hint: FetchHint) {
        let ticket = self.session.begin_fetch(hint);
        let source = Arc::clone(&self.source);
        let completions = self.completions_tx.clone();
        let timeout = self.fetch_timeout;
        tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, source.fetch(hint)).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Network(format!(
                    "no response within {} ms",
                    timeout.as_millis()
                ))),
            };
            // The loop may already be gone; nothing left to update then.
            let _ = completions.send((ticket, result));
        });
    }

    fn render(&mut self) -> io::Result<()> {
        let view = self.session.view(self.controller.state());
        self.surface.render(&view)
    }
}
