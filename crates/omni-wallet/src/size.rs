//! Virtual-size estimation for unsigned transactions.
//!
//! Signatures only exist after signing, but the fee has to be chosen before.
//! The estimator fills a scratch copy of the unsigned transaction with
//! zero-filled placeholders of the right length for each input's spend type
//! and measures its weight. Non-witness bytes weigh four units, witness bytes
//! one; the virtual size is `ceil(weight / 4)`.
//!
//! | Spend type  | Witness | Sigscript |
//! |-------------|---------|-----------|
//! | P2TR        | 64      | 0         |
//! | P2PKH       | 0       | 106       |
//! | P2WPKH      | 108     | 0         |
//! | P2SH-P2WPKH | 108     | 23        |
//!
//! The caller's skeleton is never touched, so estimating several skeletons,
//! or the same one, from many threads is fine.

use bitcoin::{ScriptBuf, TxIn, TxOut};
use omni_core::constants::{
    P2PKH_SIG_SCRIPT_SIZE, P2SH_P2WPKH_SIG_SCRIPT_SIZE, P2WPKH_WITNESS_SIZE, TAPROOT_WITNESS_SIZE,
};
use omni_core::error::SizeError;
use tracing::debug;

use crate::script_type::ScriptType;
use crate::skeleton::TransactionSkeleton;

/// Placeholder byte counts for one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSigSize {
    /// Length of the single witness stack item (0 = no witness).
    pub witness: usize,
    /// Length of the sigscript.
    pub sig_script: usize,
}

impl InputSigSize {
    pub const TAPROOT: Self = Self::new(TAPROOT_WITNESS_SIZE, 0);
    pub const P2PKH: Self = Self::new(0, P2PKH_SIG_SCRIPT_SIZE);
    pub const P2WPKH: Self = Self::new(P2WPKH_WITNESS_SIZE, 0);
    pub const P2SH_P2WPKH: Self = Self::new(P2WPKH_WITNESS_SIZE, P2SH_P2WPKH_SIG_SCRIPT_SIZE);

    pub const fn new(witness: usize, sig_script: usize) -> Self {
        Self { witness, sig_script }
    }

    /// Placeholder sizes for spending an output of type `script_type`.
    pub fn for_script_type(script_type: ScriptType) -> Self {
        match script_type {
            ScriptType::P2tr => Self::TAPROOT,
            ScriptType::P2pkh => Self::P2PKH,
            ScriptType::P2wpkh => Self::P2WPKH,
            ScriptType::P2shP2wpkh => Self::P2SH_P2WPKH,
        }
    }

    fn apply(self, txin: &mut TxIn) {
        txin.script_sig = ScriptBuf::from_bytes(vec![0u8; self.sig_script]);
        if self.witness > 0 {
            txin.witness.push(vec![0u8; self.witness]);
        }
    }
}

/// Chooses placeholder sizes for each input.
pub trait PlaceholderSizer {
    fn size_for(&self, index: usize, prev_out: &TxOut) -> Result<InputSigSize, SizeError>;
}

/// The same sizes for every input.
impl PlaceholderSizer for InputSigSize {
    fn size_for(&self, _index: usize, _prev_out: &TxOut) -> Result<InputSigSize, SizeError> {
        Ok(*self)
    }
}

/// Sizes chosen from the previous output's script pattern.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByScriptType;

impl PlaceholderSizer for ByScriptType {
    fn size_for(&self, index: usize, prev_out: &TxOut) -> Result<InputSigSize, SizeError> {
        let script_type = ScriptType::classify(&prev_out.script_pubkey).ok_or_else(|| {
            SizeError::UnsupportedScript {
                index,
                script_hex: prev_out.script_pubkey.to_hex_string(),
            }
        })?;
        debug!(index, ?script_type, "size: input classified");
        Ok(InputSigSize::for_script_type(script_type))
    }
}

/// Weight units of `skeleton` once every input carries its placeholder.
pub fn estimate_weight(skeleton: &TransactionSkeleton, sizer: &dyn PlaceholderSizer) -> Result<u64, SizeError> {
    let mut scratch = skeleton.to_unsigned_transaction();
    for (index, (txin, input)) in scratch.input.iter_mut().zip(skeleton.inputs()).enumerate() {
        sizer.size_for(index, &input.prev_out)?.apply(txin);
    }
    Ok(scratch.weight().to_wu())
}

/// Virtual bytes of `skeleton` once every input carries its placeholder.
pub fn estimate_vsize(skeleton: &TransactionSkeleton, sizer: &dyn PlaceholderSizer) -> Result<usize, SizeError> {
    let weight = estimate_weight(skeleton, sizer)?;
    let vsize = weight.div_ceil(4) as usize;
    debug!(inputs = skeleton.inputs().len(), outputs = skeleton.outputs().len(), weight, vsize, "size: estimated");
    Ok(vsize)
}

impl TransactionSkeleton {
    /// [`estimate_vsize`] with placeholders chosen per script type.
    pub fn estimate_vsize(&self) -> Result<usize, SizeError> {
        estimate_vsize(self, &ByScriptType)
    }
}
