//! Tick-driven scheduler and tick sources.
//!
//! The reconciliation loop does no timing of its own.  A [`TickSource`]
//! wakes it; on every wake-up it ticks a [`Scheduler`], which notifies a
//! [`SchedulerDelegate`] for each entry that is due.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  TickSource (IntervalTicker on device, ManualTicks in tests) │
//! │                          │                                   │
//! │                          ▼                                   │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │ Scheduler: "reconnect" every 30 ticks                  │  │
//! │  │            "report"    every 60 ticks                  │  │
//! │  └───────────────────────┬────────────────────────────────┘  │
//! │                          ▼                                   │
//! │                 SchedulerDelegate                            │
//! │          (reconcile worker: try_reconnect / send_report)     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Entries fire on the first tick and then every `every_ticks` ticks.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::app::ports::{ScheduleFiredKind, SchedulerDelegate};

// ═══════════════════════════════════════════════════════════════
//  Schedule types
// ═══════════════════════════════════════════════════════════════

/// A single schedule entry.
#[derive(Debug, Clone)]
pub struct Schedule {
    /// Human-readable label (e.g., "reconnect").
    pub label: &'static str,
    /// What the entry triggers.
    pub kind: ScheduleFiredKind,
    /// Period in ticks.  Zero is treated as one.
    pub every_ticks: u32,
}

impl Schedule {
    pub fn every(label: &'static str, kind: ScheduleFiredKind, every_ticks: u32) -> Self {
        Self {
            label,
            kind,
            every_ticks,
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Maximum number of concurrent schedules (stack-allocated).
const MAX_SCHEDULES: usize = 4;

pub struct Scheduler {
    schedules: [Option<ScheduleEntry>; MAX_SCHEDULES],
}

#[derive(Debug, Clone)]
struct ScheduleEntry {
    schedule: Schedule,
    /// Ticks left until the next fire; zero means due on the next tick.
    countdown: u32,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            schedules: [None, None, None, None],
        }
    }

    /// Add a schedule.  Returns the slot index, or `None` if full.
    pub fn add(&mut self, schedule: Schedule) -> Option<usize> {
        let (i, slot) = self
            .schedules
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| slot.is_none())?;
        info!(
            "Scheduler: added '{}' every {} ticks at slot {}",
            schedule.label, schedule.every_ticks, i
        );
        *slot = Some(ScheduleEntry {
            schedule,
            countdown: 0,
        });
        Some(i)
    }

    /// Remove a schedule by slot index.
    pub fn remove(&mut self, slot: usize) {
        if let Some(s) = self.schedules.get_mut(slot) {
            if let Some(entry) = s.take() {
                info!("Scheduler: removed '{}' from slot {}", entry.schedule.label, slot);
            }
        }
    }

    /// Advance every entry by one tick and notify `delegate` for each one
    /// that is due, in slot order.  The countdown is rearmed before the
    /// delegate runs, so a delegate that panics does not leave its entry
    /// due on every tick.
    pub fn tick(&mut self, delegate: &mut dyn SchedulerDelegate) {
        for entry in self.schedules.iter_mut().flatten() {
            if entry.countdown > 0 {
                entry.countdown -= 1;
                continue;
            }
            entry.countdown = entry.schedule.every_ticks.max(1) - 1;
            debug!("Scheduler: '{}' fired", entry.schedule.label);
            delegate.on_schedule_fired(entry.schedule.label, entry.schedule.kind);
        }
    }

    /// Number of occupied slots.
    pub fn active_count(&self) -> usize {
        self.schedules.iter().flatten().count()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tick sources
// ═══════════════════════════════════════════════════════════════

/// Drives a loop: each `true` is one wake-up, `false` ends the loop.
pub trait TickSource: Send {
    fn next_tick(&mut self) -> bool;
}

/// Shutdown signal shared by every loop.
#[derive(Debug, Default)]
pub struct Shutdown {
    stopped: Mutex<bool>,
    cv: Condvar,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        *self.stopped.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.cv.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        *self.stopped.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep until `deadline` or until triggered.  Returns `true` if
    /// triggered.
    pub fn wait_until(&self, deadline: Instant) -> bool {
        let mut stopped = self.stopped.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if *stopped {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            stopped = self
                .cv
                .wait_timeout(stopped, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}

/// Fixed-interval wake-ups against absolute deadlines, so time spent
/// inside a step does not accumulate as drift.  The first tick is
/// immediate.
pub struct IntervalTicker {
    interval: Duration,
    next: Option<Instant>,
    shutdown: Arc<Shutdown>,
}

impl IntervalTicker {
    pub fn new(interval: Duration, shutdown: Arc<Shutdown>) -> Self {
        Self {
            interval,
            next: None,
            shutdown,
        }
    }
}

impl TickSource for IntervalTicker {
    fn next_tick(&mut self) -> bool {
        let Some(deadline) = self.next else {
            self.next = Some(Instant::now() + self.interval);
            return !self.shutdown.is_triggered();
        };
        if self.shutdown.wait_until(deadline) {
            return false;
        }
        let mut next = deadline + self.interval;
        let now = Instant::now();
        if next <= now {
            debug!("ticker: overran by {} ms, resyncing", (now - next).as_millis());
            next = now + self.interval;
        }
        self.next = Some(next);
        true
    }
}

/// A fixed number of immediate ticks.
#[derive(Debug, Clone, Copy)]
pub struct ManualTicks {
    remaining: u32,
}

impl ManualTicks {
    pub fn new(count: u32) -> Self {
        Self { remaining: count }
    }
}

impl TickSource for ManualTicks {
    fn next_tick(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
