//! Generic actuator supervisor.
//!
//! Holds the desired state and the hardware handle of one actuator behind a
//! single lock.  Desired state is the source of truth: it is recorded
//! before any hardware I/O and survives every hardware fault.  The handle
//! is a best-effort mirror that is demoted on the first failed write and
//! brought back by [`ActuatorSupervisor::try_reconnect`].
//!
//! Every mutator is total: it returns `true` when the hardware now matches
//! the desired state and `false` otherwise.  Nothing here panics or
//! propagates a hardware error to the caller.
//!
//! A lock poisoned by a panicking holder is reported as unavailable by
//! [`ActuatorSupervisor::get_status`] until the next mutator recovers it.
//! Recovery keeps the desired state and drops the driver, since the
//! hardware may have been left mid-write; the following reconnect
//! reapplies the state.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::actuators::fan::{Fan, FanMode};
use crate::actuators::Actuator;
use crate::app::ports::PeripheralPort;
use crate::drivers::handle::HardwareHandle;
use crate::error::Error;
use crate::thing_model::Report;

/// Lock-guarded snapshot returned by [`ActuatorSupervisor::get_status`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuatorStatus<S> {
    pub state: S,
    pub hardware_available: bool,
}

struct Inner<A: Actuator> {
    desired: A::State,
    handle: HardwareHandle<A::Driver>,
}

pub struct ActuatorSupervisor<A: Actuator> {
    actuator: A,
    port: Arc<dyn PeripheralPort>,
    inner: Mutex<Inner<A>>,
}

impl<A: Actuator> ActuatorSupervisor<A> {
    /// Create the supervisor and try to open the hardware once.  A failed
    /// open leaves the supervisor running with hardware unavailable.
    pub fn new(actuator: A, port: Arc<dyn PeripheralPort>, call_budget: Duration) -> Self {
        let handle =
            HardwareHandle::acquire(actuator.peripheral(), call_budget, || actuator.open(&*port));
        if handle.is_connected() {
            info!("{}: hardware ready on {}", A::NAME, actuator.peripheral());
        } else {
            warn!("{}: starting without hardware", A::NAME);
        }
        Self {
            actuator,
            port,
            inner: Mutex::new(Inner {
                desired: A::State::default(),
                handle,
            }),
        }
    }

    /// Record the switch state and drive the hardware towards it.
    pub fn set_on(&self, on: bool) -> bool {
        let mut inner = self.lock();
        A::set_on(&mut inner.desired, on);
        let ok = self.converge(&mut inner);
        if ok {
            info!("{}: switched {}", A::NAME, if on { "on" } else { "off" });
        }
        ok
    }

    pub fn get_status(&self) -> Result<ActuatorStatus<A::State>, Error> {
        let inner = self.inner.lock().map_err(|_| {
            warn!("{}: state lock poisoned", A::NAME);
            Error::Unavailable(A::NAME)
        })?;
        Ok(ActuatorStatus {
            state: inner.desired,
            hardware_available: inner.handle.is_connected(),
        })
    }

    /// Thing-model points for the current status.
    pub fn report(&self) -> Result<Report, Error> {
        self.get_status().map(|status| A::report(&status))
    }

    pub fn is_hardware_available(&self) -> bool {
        self.get_status().is_ok_and(|s| s.hardware_available)
    }

    /// Whether the driver module is missing from the build.  Such hardware
    /// never comes back.
    pub fn is_hardware_absent(&self) -> bool {
        self.inner.lock().is_ok_and(|inner| inner.handle.is_absent())
    }

    /// Reopen lost hardware and re-apply the desired state once.
    pub fn try_reconnect(&self) -> bool {
        let mut inner = self.lock();
        if inner.handle.is_connected() {
            return true;
        }
        self.reconnect_locked(&mut inner)
    }

    fn lock(&self) -> MutexGuard<'_, Inner<A>> {
        self.inner.lock().unwrap_or_else(|poisoned| {
            error!("{}: state lock poisoned, recovering without hardware", A::NAME);
            let mut inner = poisoned.into_inner();
            inner.handle.release();
            self.inner.clear_poison();
            inner
        })
    }

    /// Bring the hardware in line with `desired`.  A reconnect already
    /// applies the state, so the write is not repeated after one.
    fn converge(&self, inner: &mut Inner<A>) -> bool {
        if inner.handle.is_connected() {
            return self.apply_locked(inner);
        }
        if self.reconnect_locked(inner) {
            return true;
        }
        // Nothing to switch off on hardware that does not exist.
        inner.handle.is_absent() && !A::is_on(&inner.desired)
    }

    fn reconnect_locked(&self, inner: &mut Inner<A>) -> bool {
        if !inner
            .handle
            .reacquire(|| self.actuator.open(&*self.port))
        {
            debug!("{}: reconnect failed", A::NAME);
            return false;
        }
        info!("{}: hardware reconnected, restoring {:?}", A::NAME, inner.desired);
        self.apply_locked(inner)
    }

    fn apply_locked(&self, inner: &mut Inner<A>) -> bool {
        let desired = inner.desired;
        inner
            .handle
            .apply(|driver| self.actuator.apply(&desired, driver))
            .is_ok()
    }

    #[cfg(test)]
    pub(crate) fn poison(&self) {
        std::thread::scope(|s| {
            let _ = s
                .spawn(|| {
                    let _guard = self.inner.lock();
                    panic!("poisoning {} for test", A::NAME);
                })
                .join();
        });
    }
}

// ── Fan-only operations ───────────────────────────────────────

impl ActuatorSupervisor<Fan> {
    /// Validate and store a speed level.  While off, the level is only
    /// recorded; it reaches the hardware on the next switch-on.
    pub fn set_mode(&self, level: i64) -> bool {
        match FanMode::try_from(level) {
            Ok(mode) => self.set_fan_mode(mode),
            Err(e) => {
                warn!("fan: {}", e);
                false
            }
        }
    }

    pub fn set_fan_mode(&self, mode: FanMode) -> bool {
        let mut inner = self.lock();
        inner.desired.mode = mode;
        if !inner.desired.on {
            info!("fan: mode {} stored, applies on switch-on", mode.level());
            return true;
        }
        let ok = self.converge(&mut inner);
        if ok {
            info!("fan: mode {} ({}% duty)", mode.level(), mode.duty_percent());
        }
        ok
    }
}
