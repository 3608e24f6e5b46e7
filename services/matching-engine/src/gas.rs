//! Gas metering
//!
//! Every operation costs a fixed, documented amount regardless of how many
//! passive orders it sweeps. Each entry point charges its price up front and
//! then switches the meter to the absorbing mode, so internal work (and
//! nested operations such as the cancel inside a cancel-replace) never
//! reaches the caller's gas accounting.

/// Fixed gas price of a new order
pub const GAS_NEW_ORDER: u64 = 25_000;
/// Fixed gas price of a cancel-replace
pub const GAS_CANCEL_REPLACE_ORDER: u64 = 25_000;
/// Fixed gas price of a cancel
pub const GAS_CANCEL_ORDER: u64 = 12_500;

/// Tracks gas charged to the current transaction
///
/// In the limited mode, consumption accumulates and exceeding the limit is a
/// transaction abort (panic). In the absorbing mode, consumption is dropped
/// entirely; `charged()` keeps reporting what the limited phase billed.
#[derive(Debug, Clone)]
pub struct GasMeter {
    limit: Option<u64>,
    charged: u64,
}

impl GasMeter {
    /// Meter with a hard limit
    pub fn limited(limit: u64) -> Self {
        Self {
            limit: Some(limit),
            charged: 0,
        }
    }

    /// Meter that absorbs all consumption without accounting
    pub fn unbounded() -> Self {
        Self {
            limit: None,
            charged: 0,
        }
    }

    /// Charge gas against the limit
    ///
    /// # Panics
    /// Panics when the limit is exceeded; the enclosing transaction aborts.
    pub fn consume(&mut self, amount: u64, descriptor: &str) {
        let Some(limit) = self.limit else {
            return;
        };
        self.charged = self
            .charged
            .checked_add(amount)
            .unwrap_or_else(|| panic!("out of gas: {descriptor}"));
        assert!(self.charged <= limit, "out of gas: {descriptor}");
    }

    /// Switch to the absorbing mode, freezing the billed total
    pub fn set_unbounded(&mut self) {
        self.limit = None;
    }

    /// Gas billed while the meter was limited
    pub fn charged(&self) -> u64 {
        self.charged
    }
}
