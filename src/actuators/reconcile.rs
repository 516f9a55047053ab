//! Background reconciliation loop, one per supervisor.
//!
//! Each wake-up ticks a two-entry [`Scheduler`]: `reconnect` tries to
//! bring lost hardware back, `report` pushes the status snapshot to the
//! cloud when the link is up.  Both fire on the first wake-up.  A panic
//! inside one step is caught and logged; the loop carries on until its
//! tick source ends.  Once the driver is known to be missing from the
//! build, the `reconnect` entry is dropped.  A report that outlasts
//! `report_timeout_ms` counts as [`LinkError::Timeout`].

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};

use crate::actuators::{Actuator, ActuatorSupervisor};
use crate::app::ports::{CloudLink, LinkError, ScheduleFiredKind, SchedulerDelegate};
use crate::config::ReconcileConfig;
use crate::error::Error;
use crate::scheduler::{Schedule, Scheduler, TickSource};
use crate::thing_model::TSL_SEND_MODE;

const RECONCILE_STACK_KB: usize = 8;

pub struct ReconcileTask<A: Actuator> {
    supervisor: Arc<ActuatorSupervisor<A>>,
    link: Arc<dyn CloudLink>,
    scheduler: Scheduler,
    reconnect_slot: Option<usize>,
    report_timeout: Duration,
}

impl<A: Actuator> ReconcileTask<A> {
    pub fn new(
        supervisor: Arc<ActuatorSupervisor<A>>,
        link: Arc<dyn CloudLink>,
        cfg: &ReconcileConfig,
    ) -> Self {
        let mut scheduler = Scheduler::new();
        let reconnect_slot = scheduler.add(Schedule::every(
            "reconnect",
            ScheduleFiredKind::Reconnect,
            cfg.reconnect_every_ticks,
        ));
        scheduler.add(Schedule::every(
            "report",
            ScheduleFiredKind::Report,
            cfg.report_every_ticks,
        ));
        Self {
            supervisor,
            link,
            scheduler,
            reconnect_slot,
            report_timeout: cfg.report_timeout(),
        }
    }

    /// One wake-up.
    pub fn step(&mut self) {
        let mut worker = Worker {
            supervisor: &self.supervisor,
            link: &*self.link,
            report_timeout: self.report_timeout,
        };
        let scheduler = &mut self.scheduler;
        if panic::catch_unwind(AssertUnwindSafe(|| scheduler.tick(&mut worker))).is_err() {
            error!("{}: reconcile step panicked, continuing", A::NAME);
        }

        if self.reconnect_slot.is_some() && self.supervisor.is_hardware_absent() {
            if let Some(slot) = self.reconnect_slot.take() {
                self.scheduler.remove(slot);
            }
            info!(
                "{}: driver absent, reconnects stopped ({} entries left)",
                A::NAME,
                self.scheduler.active_count()
            );
        }
    }

    /// Step once per tick until `ticks` runs out.
    pub fn run(mut self, mut ticks: impl TickSource) {
        info!("{}: reconcile loop started", A::NAME);
        while ticks.next_tick() {
            self.step();
        }
        info!("{}: reconcile loop stopped", A::NAME);
    }

    pub fn spawn(self, ticks: impl TickSource + 'static) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("reconcile-{}", A::NAME))
            .stack_size(RECONCILE_STACK_KB * 1024)
            .spawn(move || self.run(ticks))
    }
}

struct Worker<'a, A: Actuator> {
    supervisor: &'a ActuatorSupervisor<A>,
    link: &'a dyn CloudLink,
    report_timeout: Duration,
}

impl<A: Actuator> Worker<'_, A> {
    fn reconnect(&self) {
        if self.supervisor.is_hardware_available() {
            return;
        }
        if self.supervisor.try_reconnect() {
            info!("{}: hardware back online", A::NAME);
        }
    }

    fn report(&self) {
        if !self.link.is_connected() {
            debug!("{}: link down, report skipped", A::NAME);
            return;
        }
        let report = match self.supervisor.report() {
            Ok(r) => r,
            Err(e) => {
                warn!("{}: report skipped: {}", A::NAME, e);
                return;
            }
        };

        let started = Instant::now();
        let sent = self.link.send_report(TSL_SEND_MODE, &report);
        let elapsed = started.elapsed();
        let sent = match sent {
            Ok(()) if elapsed > self.report_timeout => {
                debug!(
                    "{}: report took {} ms (timeout {} ms)",
                    A::NAME,
                    elapsed.as_millis(),
                    self.report_timeout.as_millis()
                );
                Err(LinkError::Timeout)
            }
            other => other,
        };
        match sent {
            Ok(()) => debug!("{}: status reported", A::NAME),
            Err(e) => warn!("{}: report failed: {}", A::NAME, Error::from(e)),
        }
    }
}

impl<A: Actuator> SchedulerDelegate for Worker<'_, A> {
    fn on_schedule_fired(&mut self, _label: &str, kind: ScheduleFiredKind) {
        match kind {
            ScheduleFiredKind::Reconnect => self.reconnect(),
            ScheduleFiredKind::Report => self.report(),
        }
    }
}
