use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::error::Result;

use super::notifier::{Notifier, TickReport};

#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    pub period: Duration,
    /// Pause after a failed tick before waiting for the next one.
    pub backoff: Duration,
}

/// One unit of periodic work.
#[async_trait]
pub trait Ticker: Send + Sync {
    async fn tick(&self) -> Result<TickReport>;
}

#[async_trait]
impl<'a> Ticker for Notifier<'a> {
    async fn tick(&self) -> Result<TickReport> {
        Notifier::tick(self).await
    }
}

/// Ticks every `period` until `shutdown` completes. Returns the number of
/// ticks that ran.
///
/// The first tick fires one full period after start. Ticks never overlap;
/// a tick that overruns its period swallows the missed ones.
pub async fn run<T, F>(ticker: &T, schedule: Schedule, shutdown: F) -> u64
where
    T: Ticker + ?Sized,
    F: Future<Output = ()>,
{
    let mut interval = time::interval_at(Instant::now() + schedule.period, schedule.period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tokio::pin!(shutdown);
    let mut ticks = 0;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = interval.tick() => {}
        }

        ticks += 1;
        let outcome = tokio::select! {
            _ = &mut shutdown => break,
            outcome = ticker.tick() => outcome,
        };

        match outcome {
            Ok(report) if report.new_articles() > 0 => tracing::info!(
                native = report.new_native,
                scraped = report.new_scraped,
                sent = report.sent,
                failed = report.failed,
                "Delivered new articles to {} subscriber(s)",
                report.subscribers
            ),
            Ok(_) => tracing::debug!("No new articles"),
            Err(e) => {
                tracing::error!("Tick failed, backing off {:?}: {}", schedule.backoff, e);
                tokio::select! {
                    _ = &mut shutdown => break,
                    _ = time::sleep(schedule.backoff) => {}
                }
            }
        }
    }

    tracing::info!("Scheduler stopped after {} tick(s)", ticks);
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    const PERIOD: Duration = Duration::from_secs(60);
    const BACKOFF: Duration = Duration::from_secs(5);

    fn schedule() -> Schedule {
        Schedule {
            period: PERIOD,
            backoff: BACKOFF,
        }
    }

    /// Plays back scripted outcomes (`true` = success) and records when each tick ran.
    struct ScriptedTicker {
        outcomes: Mutex<VecDeque<bool>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl ScriptedTicker {
        fn new(outcomes: &[bool]) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.iter().copied().collect()),
                calls: Mutex::default(),
            }
        }

        fn calls(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Ticker for ScriptedTicker {
        async fn tick(&self) -> Result<TickReport> {
            self.calls.lock().unwrap().push(Instant::now());
            let ok = self.outcomes.lock().unwrap().pop_front().unwrap_or(true);
            if ok {
                Ok(TickReport::default())
            } else {
                Err(AppError::Config("subscribers unavailable".to_string()))
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_period() {
        let ticker = ScriptedTicker::new(&[]);
        let start = Instant::now();

        let ticks = run(&ticker, schedule(), time::sleep(PERIOD * 5 / 2)).await;

        assert_eq!(ticks, 2);
        let calls = ticker.calls();
        assert_eq!(calls[0] - start, PERIOD);
        assert_eq!(calls[1] - start, PERIOD * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_runs_before_first_period() {
        let ticker = ScriptedTicker::new(&[]);

        let ticks = run(&ticker, schedule(), time::sleep(PERIOD / 2)).await;

        assert_eq!(ticks, 0);
        assert!(ticker.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_ticks_back_off_and_continue() {
        let ticker = ScriptedTicker::new(&[false, false, true, true]);
        let start = Instant::now();

        let ticks = run(&ticker, schedule(), time::sleep(PERIOD * 4 + PERIOD / 2)).await;

        assert_eq!(ticks, 4);
        let calls = ticker.calls();
        for (n, call) in calls.iter().enumerate() {
            assert_eq!(*call - start, PERIOD * (n as u32 + 1));
        }
        assert!(ticker.outcomes.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_longer_than_period_delays_next_tick() {
        let ticker = ScriptedTicker::new(&[false, true]);
        let schedule = Schedule {
            period: Duration::from_secs(10),
            backoff: Duration::from_secs(25),
        };

        let ticks = run(&ticker, schedule, time::sleep(Duration::from_secs(50))).await;

        assert!(ticks >= 2);
        let calls = ticker.calls();
        assert!(calls[1] - calls[0] >= schedule.backoff);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_during_backoff_stops_the_loop() {
        let ticker = ScriptedTicker::new(&[false]);
        let schedule = Schedule {
            period: PERIOD,
            backoff: PERIOD * 10,
        };

        let ticks = run(&ticker, schedule, time::sleep(PERIOD * 2)).await;

        assert_eq!(ticks, 1);
    }
}
