use tracing::info;

use crate::{Engine, Error, Result};

impl Engine {
    /// Scales every non-zero score by `factor`, truncating toward zero, and
    /// deletes scores whose new magnitude is at most `deadzone`.
    ///
    /// Returns the number of slots whose value changed, deletions included.
    ///
    /// # Consistency
    ///
    /// There is no global lock. Each block is swept under its own write
    /// guard, so concurrent writers only wait while their block is being
    /// processed. Blocks created while the sweep is running may or may not
    /// be visited; a write that lands in an already swept block is not
    /// decayed until the next call.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `factor` is not a finite number in
    /// `[0.0, 1.0]`. Nothing is modified in that case.
    pub fn decay(&self, factor: f64, deadzone: u16) -> Result<u64> {
        if !factor.is_finite() || !(0.0..=1.0).contains(&factor) {
            return Err(Error::InvalidArgument(format!(
                "decay factor {factor} outside [0.0, 1.0]"
            )));
        }

        let mut modified = 0u64;
        let mut zeroed = 0u64;

        for (_, b) in self.dir.blocks() {
            if b.live() == 0 {
                continue;
            }
            let outcome = b.decay(factor, deadzone);
            modified += u64::from(outcome.modified);
            zeroed += u64::from(outcome.zeroed);
            self.adjust_count(-i64::from(outcome.zeroed));
        }

        info!(factor, deadzone, modified, zeroed, "decay pass finished");
        Ok(modified)
    }
}
