//! Classification of previous-output scripts for size estimation.

use bitcoin::Script;
use serde::{Deserialize, Serialize};

/// Spend type of a previous output, as far as signature placement goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptType {
    /// Legacy pay-to-pubkey-hash; signature lives in the sigscript.
    P2pkh,
    /// P2WPKH wrapped in P2SH; witness plus a redeem-script push.
    P2shP2wpkh,
    /// Native segwit v0 pay-to-witness-pubkey-hash.
    P2wpkh,
    /// Segwit v1 key-path spend.
    P2tr,
}

impl ScriptType {
    /// Classify `script`, or `None` for script kinds the estimator cannot size.
    ///
    /// Every P2SH output is assumed to wrap P2WPKH; the wallet never produces
    /// any other redeem script.
    pub fn classify(script: &Script) -> Option<Self> {
        if script.is_p2tr() {
            Some(Self::P2tr)
        } else if script.is_p2wpkh() {
            Some(Self::P2wpkh)
        } else if script.is_p2pkh() {
            Some(Self::P2pkh)
        } else if script.is_p2sh() {
            Some(Self::P2shP2wpkh)
        } else {
            None
        }
    }

}
