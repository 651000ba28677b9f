use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickKind {
    /// Refresh cursor and window.
    Window,
    /// Fetch the live snapshot.
    Fetch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
    pub kind: TickKind,
}

/// The live-mode timers. At most one periodic task runs at a time; both
/// cadences fire immediately on start. Ticks carry the generation that
/// produced them so ticks queued before a stop or restart can be ignored.
pub struct LiveScheduler {
    ticks: mpsc::UnboundedSender<Tick>,
    window_every: Duration,
    fetch_every: Duration,
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl LiveScheduler {
    pub fn new(
        ticks: mpsc::UnboundedSender<Tick>,
        window_every: Duration,
        fetch_every: Duration,
    ) -> Self {
        Self {
            ticks,
            window_every,
            fetch_every,
            generation: 0,
            task: None,
        }
    }

    /// Starts the timers, replacing any running ones. Must be called from
    /// within a tokio runtime.
    pub fn start(&mut self) -> u64 {
        self.abort();
        self.generation += 1;
        let generation = self.generation;
        let ticks = self.ticks.clone();
        let mut window = tokio::time::interval(self.window_every);
        let mut fetch = tokio::time::interval(self.fetch_every);
        window.set_missed_tick_behavior(MissedTickBehavior::Delay);
        fetch.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.task = Some(tokio::spawn(async move {
            loop {
                let kind = tokio::select! {
                    biased;
                    _ = window.tick() => TickKind::Window,
                    _ = fetch.tick() => TickKind::Fetch,
                };
                if ticks.send(Tick { generation, kind }).is_err() {
                    break;
                }
            }
        }));
        info!(
            generation,
            window_ms = self.window_every.as_millis() as u64,
            fetch_ms = self.fetch_every.as_millis() as u64,
            "live timers started"
        );
        generation
    }

    pub fn stop(&mut self) {
        if self.abort() {
            self.generation += 1;
            info!(generation = self.generation, "live timers stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Whether `tick` came from the timers currently running.
    pub fn is_current(&self, tick: &Tick) -> bool {
        self.is_running() && tick.generation == self.generation
    }

    fn abort(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for LiveScheduler {
    fn drop(&mut self) {
        self.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> (LiveScheduler, mpsc::UnboundedReceiver<Tick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            LiveScheduler::new(tx, Duration::from_millis(1_000), Duration::from_millis(2_000)),
            rx,
        )
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Tick>) -> Vec<TickKind> {
        let mut kinds = Vec::new();
        while let Ok(tick) = rx.try_recv() {
            kinds.push(tick.kind);
        }
        kinds
    }

    #[tokio::test(start_paused = true)]
    async fn both_cadences_fire_immediately_then_periodically() {
        let (mut scheduler, mut rx) = scheduler();
        scheduler.start();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(drain(&mut rx), vec![TickKind::Window, TickKind::Fetch]);

        tokio::time::sleep(Duration::from_millis(2_000)).await;
        let kinds = drain(&mut rx);
        assert_eq!(kinds.iter().filter(|k| **k == TickKind::Window).count(), 2);
        assert_eq!(kinds.iter().filter(|k| **k == TickKind::Fetch).count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_silences_ticks_and_invalidates_queued_ones() {
        let (mut scheduler, mut rx) = scheduler();
        scheduler.start();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let queued = rx.try_recv().expect("immediate tick");
        assert!(scheduler.is_current(&queued));

        scheduler.stop();
        assert!(!scheduler.is_running());
        assert!(!scheduler.is_current(&queued));

        drain(&mut rx);
        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_bumps_generation() {
        let (mut scheduler, mut rx) = scheduler();
        let first = scheduler.start();
        let second = scheduler.start();
        assert!(second > first);
        assert!(scheduler.is_running());

        tokio::time::sleep(Duration::from_millis(10)).await;
        let ticks: Vec<Tick> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(ticks.len(), 2);
        assert!(ticks.iter().all(|tick| tick.generation == second));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_scheduler_aborts_task() {
        let (mut scheduler, mut rx) = scheduler();
        scheduler.start();
        drop(scheduler);
        tokio::time::sleep(Duration::from_millis(5_000)).await;
        assert!(drain(&mut rx).is_empty());
    }
}
