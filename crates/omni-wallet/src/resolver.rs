//! Previous-output resolution.
//!
//! Size estimation needs the script of every spent output. Resolvers turn an
//! outpoint into that output; [`CachedResolver`] memoizes a slow one.

use std::collections::HashMap;

use bitcoin::{OutPoint, Transaction, TxOut, Txid};
use omni_core::cache::MemoCache;
use omni_core::error::SizeError;
use tracing::debug;

use crate::skeleton::decode_raw_tx;

/// Looks up the output an outpoint refers to.
pub trait PrevOutResolver {
    fn resolve(&self, outpoint: &OutPoint) -> Result<TxOut, SizeError>;
}

/// Resolves outpoints against a set of known previous transactions.
#[derive(Debug, Default, Clone)]
pub struct RawTxResolver {
    txs: HashMap<Txid, Transaction>,
}

impl RawTxResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a decoded transaction and return its txid.
    pub fn add_tx(&mut self, tx: Transaction) -> Txid {
        let txid = tx.compute_txid();
        self.txs.insert(txid, tx);
        txid
    }

    /// Register a hex-encoded, consensus-serialized transaction.
    pub fn add_raw_tx(&mut self, raw: &str) -> Result<Txid, SizeError> {
        Ok(self.add_tx(decode_raw_tx(raw)?))
    }
}

impl PrevOutResolver for RawTxResolver {
    fn resolve(&self, outpoint: &OutPoint) -> Result<TxOut, SizeError> {
        let tx = self
            .txs
            .get(&outpoint.txid)
            .ok_or_else(|| SizeError::UnknownPrevOut(outpoint.to_string()))?;
        tx.output
            .get(outpoint.vout as usize)
            .cloned()
            .ok_or_else(|| SizeError::MissingPrevOut {
                txid: outpoint.txid.to_string(),
                vout: outpoint.vout,
            })
    }
}

/// Memoizes another resolver for the lifetime of this object.
#[derive(Debug)]
pub struct CachedResolver<R> {
    inner: R,
    cache: MemoCache<OutPoint, TxOut>,
}

impl<R: PrevOutResolver> CachedResolver<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            cache: MemoCache::new(),
        }
    }

    /// Number of outpoints resolved so far.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

impl<R: PrevOutResolver> PrevOutResolver for CachedResolver<R> {
    fn resolve(&self, outpoint: &OutPoint) -> Result<TxOut, SizeError> {
        self.cache.get_or_try_insert_with(*outpoint, || {
            debug!(%outpoint, "resolver: cache miss");
            self.inner.resolve(outpoint)
        })
    }
}
