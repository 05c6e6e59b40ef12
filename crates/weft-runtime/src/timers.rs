#![forbid(unsafe_code)]

//! Animation timers.
//!
//! Two background threads (fast and slow cadence) wake on their interval,
//! bump a counter and raise the rerender flag. That is all they touch; the
//! run loop reads the counters into the environment when it renders.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::AnimationConfig;
use crate::environment::AnimationTicks;

/// Stop flag a timer thread waits on.
#[derive(Clone)]
pub(crate) struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    /// A signal and the trigger that sets it.
    pub(crate) fn new() -> (Self, StopTrigger) {
        let inner = Arc::new((Mutex::new(false), Condvar::new()));
        let signal = Self {
            inner: Arc::clone(&inner),
        };
        (signal, StopTrigger { inner })
    }

    /// Wait for the stop signal or `duration`, whichever comes first.
    ///
    /// Returns `true` when stopped. Spurious wakeups keep waiting for the
    /// rest of the interval.
    pub(crate) fn wait_timeout(&self, duration: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let mut stopped = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if *stopped {
            return true;
        }
        let start = Instant::now();
        let mut remaining = duration;
        loop {
            let (guard, result) = cvar
                .wait_timeout(stopped, remaining)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            stopped = guard;
            if *stopped {
                return true;
            }
            if result.timed_out() {
                return false;
            }
            let elapsed = start.elapsed();
            if elapsed >= duration {
                return false;
            }
            remaining = duration - elapsed;
        }
    }
}

/// Sets a [`StopSignal`].
pub(crate) struct StopTrigger {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopTrigger {
    pub(crate) fn stop(&self) {
        let (lock, cvar) = &*self.inner;
        let mut stopped = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *stopped = true;
        cvar.notify_all();
    }
}

struct Ticker {
    trigger: StopTrigger,
    thread: Option<JoinHandle<()>>,
}

/// The two animation timers.
pub struct AnimationClock {
    fast: Arc<AtomicU64>,
    slow: Arc<AtomicU64>,
    tickers: Vec<Ticker>,
}

impl std::fmt::Debug for AnimationClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationClock")
            .field("ticks", &self.ticks())
            .field("running", &self.tickers.len())
            .finish()
    }
}

impl AnimationClock {
    /// A clock with no running timers; counters stay at zero.
    #[must_use]
    pub fn idle() -> Self {
        Self {
            fast: Arc::new(AtomicU64::new(0)),
            slow: Arc::new(AtomicU64::new(0)),
            tickers: Vec::new(),
        }
    }

    /// Start the timers enabled in `config`. Each tick sets `rerender`.
    ///
    /// # Errors
    ///
    /// Fails when a timer thread cannot be spawned; already started timers
    /// are stopped.
    pub fn start(config: &AnimationConfig, rerender: Arc<AtomicBool>) -> io::Result<Self> {
        let mut clock = Self::idle();
        for (name, interval, counter) in [
            ("weft-anim-fast", config.fast, Arc::clone(&clock.fast)),
            ("weft-anim-slow", config.slow, Arc::clone(&clock.slow)),
        ] {
            let Some(interval) = interval.filter(|i| !i.is_zero()) else {
                continue;
            };
            let (signal, trigger) = StopSignal::new();
            let flag = Arc::clone(&rerender);
            let thread = thread::Builder::new()
                .name(name.to_string())
                .spawn(move || {
                    while !signal.wait_timeout(interval) {
                        counter.fetch_add(1, Ordering::Relaxed);
                        flag.store(true, Ordering::Relaxed);
                    }
                })?;
            tracing::debug!(timer = name, ?interval, "animation timer started");
            clock.tickers.push(Ticker {
                trigger,
                thread: Some(thread),
            });
        }
        Ok(clock)
    }

    /// Current counters.
    #[must_use]
    pub fn ticks(&self) -> AnimationTicks {
        AnimationTicks {
            fast: self.fast.load(Ordering::Relaxed),
            slow: self.slow.load(Ordering::Relaxed),
        }
    }

    /// Whether any timer thread is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.tickers.is_empty()
    }

    /// Stop and join every timer.
    pub fn stop(&mut self) {
        for mut ticker in self.tickers.drain(..) {
            ticker.trigger.stop();
            if let Some(handle) = ticker.thread.take() {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for AnimationClock {
    fn drop(&mut self) {
        for ticker in &self.tickers {
            ticker.trigger.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_returns_early_when_stopped() {
        let (signal, trigger) = StopSignal::new();
        let waiter = thread::spawn(move || signal.wait_timeout(Duration::from_secs(30)));
        trigger.stop();
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn wait_times_out() {
        let (signal, _trigger) = StopSignal::new();
        assert!(!signal.wait_timeout(Duration::from_millis(5)));
    }

    #[test]
    fn idle_clock_never_ticks() {
        let clock = AnimationClock::start(&AnimationConfig::default(), Arc::default()).unwrap();
        assert!(!clock.is_running());
        assert_eq!(clock.ticks(), AnimationTicks::default());
    }

    #[test]
    fn fast_timer_ticks_and_requests_render() {
        let rerender = Arc::new(AtomicBool::new(false));
        let config = AnimationConfig {
            fast: Some(Duration::from_millis(2)),
            slow: None,
        };
        let mut clock = AnimationClock::start(&config, Arc::clone(&rerender)).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while clock.ticks().fast == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }
        clock.stop();
        assert!(clock.ticks().fast > 0);
        assert_eq!(clock.ticks().slow, 0);
        assert!(rerender.load(Ordering::Relaxed));

        let settled = clock.ticks();
        thread::sleep(Duration::from_millis(10));
        assert_eq!(clock.ticks(), settled);
    }
}
