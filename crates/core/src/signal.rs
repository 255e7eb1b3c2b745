//! Per-window active/inactive signal.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use metrics::Gauge;
use tracing::trace;

/// Value of an inactive window.
pub const INACTIVE: f64 = 0.0;
/// Value of an active window.
pub const ACTIVE: f64 = 1.0;

/// The mutable state of one window: `0.0` inactive, `1.0` active.
///
/// The value lives in an atomic so scrapes read it without locking. Every
/// write is mirrored to the exported gauge. Clones share the same value.
#[derive(Clone)]
pub struct SignalState {
    value: Arc<AtomicU64>,
    gauge: Gauge,
}

impl SignalState {
    /// Wrap an exported gauge. The signal starts inactive.
    pub fn new(gauge: Gauge) -> Self {
        let signal = Self {
            value: Arc::new(AtomicU64::new(INACTIVE.to_bits())),
            gauge,
        };
        signal.gauge.set(INACTIVE);
        signal
    }

    /// A signal that is not exported anywhere.
    pub fn detached() -> Self {
        Self::new(Gauge::noop())
    }

    /// Current value.
    pub fn value(&self) -> f64 {
        f64::from_bits(self.value.load(Ordering::Acquire))
    }

    pub fn is_active(&self) -> bool {
        self.value() == ACTIVE
    }

    pub(crate) fn set_active(&self) {
        trace!("set_active");
        self.store(ACTIVE);
    }

    pub(crate) fn set_inactive(&self) {
        trace!("set_inactive");
        self.store(INACTIVE);
    }

    fn store(&self, value: f64) {
        self.value.store(value.to_bits(), Ordering::Release);
        self.gauge.set(value);
    }
}

impl fmt::Debug for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalState")
            .field("value", &self.value())
            .finish()
    }
}
