//! Fee-rate arithmetic on top of size estimation.

use omni_core::constants::MIN_RELAY_SAT_PER_VB;
use omni_core::error::SizeError;
use serde::{Deserialize, Serialize};

use crate::size::{PlaceholderSizer, estimate_vsize};
use crate::skeleton::TransactionSkeleton;

/// Fee rate in satoshis per virtual byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FeeRate {
    sat_per_vb: u64,
}

/// The relay floor.
pub const MIN_RELAY_FEE_RATE: FeeRate = FeeRate::from_sat_per_vb(MIN_RELAY_SAT_PER_VB);

impl FeeRate {
    pub const fn from_sat_per_vb(sat_per_vb: u64) -> Self {
        Self { sat_per_vb }
    }

    pub fn sat_per_vb(&self) -> u64 {
        self.sat_per_vb
    }

    /// Fee in satoshis for `vsize` virtual bytes.
    pub fn fee_for_vsize(&self, vsize: usize) -> Result<u64, SizeError> {
        (vsize as u64)
            .checked_mul(self.sat_per_vb)
            .ok_or(SizeError::ValueOverflow)
    }

    /// Estimated fee for `skeleton` once signed.
    pub fn estimate_fee(
        &self,
        skeleton: &TransactionSkeleton,
        sizer: &dyn PlaceholderSizer,
    ) -> Result<u64, SizeError> {
        self.fee_for_vsize(estimate_vsize(skeleton, sizer)?)
    }
}

impl Default for FeeRate {
    fn default() -> Self {
        MIN_RELAY_FEE_RATE
    }
}
