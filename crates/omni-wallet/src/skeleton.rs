//! Unsigned transaction skeletons.
//!
//! A skeleton is built append-only: inputs carry the previous output they
//! spend (value and script) so that size estimation can classify them, and
//! outputs carry a destination script and a value. Nothing here signs.

use std::str::FromStr;

use bitcoin::absolute::LockTime;
use bitcoin::consensus;
use bitcoin::script::PushBytesBuf;
use bitcoin::transaction::Version;
use bitcoin::{Address, Amount, Network, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness};
use omni_core::error::SizeError;
use tracing::debug;

use crate::resolver::PrevOutResolver;

/// An input waiting for a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedInput {
    /// The output being spent.
    pub outpoint: OutPoint,
    /// Value and script of the output being spent.
    pub prev_out: TxOut,
}

/// A destination script and its value. A zero value marks a data carrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedOutput {
    pub script_pubkey: ScriptBuf,
    pub value: Amount,
}

impl UnsignedOutput {
    /// `true` for an OP_RETURN output carrying no value.
    pub fn is_data_carrier(&self) -> bool {
        self.value == Amount::ZERO && self.script_pubkey.is_op_return()
    }
}

/// Ordered inputs and outputs of a transaction under construction.
#[derive(Debug, Clone)]
pub struct TransactionSkeleton {
    network: Network,
    inputs: Vec<UnsignedInput>,
    outputs: Vec<UnsignedOutput>,
}

impl TransactionSkeleton {
    /// Create an empty skeleton for `network`.
    ///
    /// The network only affects address parsing, never sizing.
    pub fn new(network: Network) -> Self {
        Self {
            network,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn inputs(&self) -> &[UnsignedInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[UnsignedOutput] {
        &self.outputs
    }

    /// Spend `outpoint`, whose value and script are already known.
    pub fn add_input(&mut self, outpoint: OutPoint, prev_out: TxOut) -> &mut Self {
        debug!(%outpoint, value = prev_out.value.to_sat(), "skeleton: input added");
        self.inputs.push(UnsignedInput { outpoint, prev_out });
        self
    }

    /// Spend output `vout` of a hex-encoded, consensus-serialized transaction.
    pub fn add_input_from_prev_tx(&mut self, raw_prev_tx: &str, vout: u32) -> Result<&mut Self, SizeError> {
        let prev_tx = decode_raw_tx(raw_prev_tx)?;
        let txid = prev_tx.compute_txid();
        let prev_out = prev_tx
            .output
            .get(vout as usize)
            .cloned()
            .ok_or_else(|| SizeError::MissingPrevOut {
                txid: txid.to_string(),
                vout,
            })?;
        Ok(self.add_input(OutPoint::new(txid, vout), prev_out))
    }

    /// Spend `outpoint`, looking its previous output up through `resolver`.
    pub fn add_input_resolved(
        &mut self,
        outpoint: OutPoint,
        resolver: &dyn PrevOutResolver,
    ) -> Result<&mut Self, SizeError> {
        let prev_out = resolver.resolve(&outpoint)?;
        Ok(self.add_input(outpoint, prev_out))
    }

    /// Pay `sats` to `address`, which must belong to this skeleton's network.
    pub fn add_output_address(&mut self, address: &str, sats: u64) -> Result<&mut Self, SizeError> {
        let address = Address::from_str(address)
            .and_then(|a| a.require_network(self.network))
            .map_err(|e| SizeError::InvalidAddress(format!("{address}: {e}")))?;
        Ok(self.add_output_script(address.script_pubkey(), sats))
    }

    /// Pay `sats` to a literal script.
    pub fn add_output_script(&mut self, script_pubkey: ScriptBuf, sats: u64) -> &mut Self {
        self.outputs.push(UnsignedOutput {
            script_pubkey,
            value: Amount::from_sat(sats),
        });
        self
    }

    /// Append a zero-value OP_RETURN output carrying `data`.
    pub fn add_op_return(&mut self, data: &[u8]) -> Result<&mut Self, SizeError> {
        let push = PushBytesBuf::try_from(data.to_vec())
            .map_err(|e| SizeError::InvalidScript(e.to_string()))?;
        Ok(self.add_output_script(ScriptBuf::new_op_return(push), 0))
    }

    /// Sum of the values of all spent outputs.
    pub fn total_input_value(&self) -> Result<u64, SizeError> {
        self.inputs.iter().try_fold(0u64, |acc, i| {
            acc.checked_add(i.prev_out.value.to_sat())
                .ok_or(SizeError::ValueOverflow)
        })
    }

    /// Sum of the values of all outputs.
    pub fn total_output_value(&self) -> Result<u64, SizeError> {
        self.outputs.iter().try_fold(0u64, |acc, o| {
            acc.checked_add(o.value.to_sat()).ok_or(SizeError::ValueOverflow)
        })
    }

    /// The transaction as it stands: version 2, no lock time, empty
    /// sigscripts and witnesses.
    pub fn to_unsigned_transaction(&self) -> Transaction {
        Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input: self
                .inputs
                .iter()
                .map(|i| TxIn {
                    previous_output: i.outpoint,
                    script_sig: ScriptBuf::new(),
                    sequence: Sequence::MAX,
                    witness: Witness::new(),
                })
                .collect(),
            output: self
                .outputs
                .iter()
                .map(|o| TxOut {
                    value: o.value,
                    script_pubkey: o.script_pubkey.clone(),
                })
                .collect(),
        }
    }

    /// Consensus bytes of [`to_unsigned_transaction`](Self::to_unsigned_transaction).
    pub fn serialize(&self) -> Vec<u8> {
        consensus::serialize(&self.to_unsigned_transaction())
    }
}

/// Decode a hex-encoded, consensus-serialized transaction.
pub(crate) fn decode_raw_tx(raw: &str) -> Result<Transaction, SizeError> {
    let bytes = hex::decode(raw.trim()).map_err(|e| SizeError::MalformedPrevTx(e.to_string()))?;
    consensus::deserialize(&bytes).map_err(|e| SizeError::MalformedPrevTx(e.to_string()))
}
