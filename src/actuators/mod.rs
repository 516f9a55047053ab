//! Supervised actuators.
//!
//! Each physical actuator is described by an [`Actuator`] strategy: what
//! its desired state looks like, how its peripheral is opened, and which
//! single write brings the hardware in line with that state.  The generic
//! [`ActuatorSupervisor`] owns one desired state plus one hardware handle
//! and keeps them convergent; [`ReconcileTask`] runs the periodic
//! reconnect/report loop beside it.

pub mod buzzer;
pub mod fan;
pub mod reconcile;
pub mod supervisor;

pub use buzzer::{Buzzer, BuzzerState};
pub use fan::{Fan, FanMode, FanState};
pub use reconcile::ReconcileTask;
pub use supervisor::{ActuatorStatus, ActuatorSupervisor};

use core::fmt::Debug;

use crate::app::ports::PeripheralPort;
use crate::drivers::handle::Peripheral;
use crate::error::{AcquireError, ActuatorError};
use crate::thing_model::Report;

pub type BuzzerSupervisor = ActuatorSupervisor<Buzzer>;
pub type FanSupervisor = ActuatorSupervisor<Fan>;

/// Per-actuator strategy plugged into [`ActuatorSupervisor`].
pub trait Actuator: Send + Sync + 'static {
    /// Logically desired state.  Plain data; the supervisor stores it.
    type State: Copy + Debug + PartialEq + Default + Send;
    /// Open driver object held by the hardware handle.
    type Driver: Send;

    /// Log prefix and thread name suffix.
    const NAME: &'static str;

    fn peripheral(&self) -> Peripheral;

    fn open(&self, port: &dyn PeripheralPort) -> Result<Self::Driver, AcquireError>;

    /// Issue the one write implied by `state`.
    fn apply(&self, state: &Self::State, driver: &mut Self::Driver) -> Result<(), ActuatorError>;

    fn is_on(state: &Self::State) -> bool;

    fn set_on(state: &mut Self::State, on: bool);

    /// Thing-model points for a status snapshot.
    fn report(status: &ActuatorStatus<Self::State>) -> Report;
}
