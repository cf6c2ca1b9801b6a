//! Greedy coin selection with an exact-match shortcut.
//!
//! Coins are ordered by balance descending and the smallest qualifying prefix
//! is taken, which bounds the number of inputs. Before that, any single coin
//! whose balance equals the target exactly is preferred on its own: moving one
//! whole object is cheaper than a multi-input pay.

use omni_core::error::CoinSelectionError;
use omni_core::traits::{Balance, CoinSource};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A spendable coin object as reported by an object-model chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinRecord {
    /// Fully qualified asset type, e.g. `0x2::sui::SUI`.
    pub coin_type: String,
    /// Object identifier of the coin.
    pub object_id: String,
    /// Object version.
    pub version: u64,
    /// Object digest.
    pub digest: String,
    /// Balance in the asset's smallest unit.
    pub balance: u64,
}

impl Balance for CoinRecord {
    fn balance(&self) -> u64 {
        self.balance
    }
}

/// Result of coin selection: which coins to spend and what they add up to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickedCoins<C> {
    /// Selected coins, largest first.
    pub coins: Vec<C>,
    /// Sum of the balances of `coins`, saturating at `u64::MAX`.
    pub total: u64,
    /// The amount the recipient must receive.
    pub amount: u64,
    /// A single coin matches `amount` exactly and can be transferred as is.
    pub can_use_transfer_object: bool,
}

impl<C> PickedCoins<C> {
    /// What is left over once `amount` is paid.
    pub fn change(&self) -> u64 {
        self.total.saturating_sub(self.amount)
    }
}

/// Select coins paying `amount`.
///
/// When `is_native` is set the fee is paid in the same asset, so
/// `extra_reserve` must be covered as well; otherwise it is ignored and gas
/// coins are picked separately. The exact-match shortcut only compares against
/// `amount`.
///
/// The input does not need to be sorted; a stable descending copy is made.
///
/// # Errors
/// [`CoinSelectionError::InsufficientBalance`] when all coins together fall
/// short, including when `coins` is empty.
/// [`CoinSelectionError::AmountOverflow`] when `amount + extra_reserve` does
/// not fit in a `u64`.
pub fn pickup_coins<C: Balance + Clone>(
    coins: &[C],
    amount: u64,
    extra_reserve: u64,
    is_native: bool,
) -> Result<PickedCoins<C>, CoinSelectionError> {
    let need = if is_native {
        amount
            .checked_add(extra_reserve)
            .ok_or(CoinSelectionError::AmountOverflow)?
    } else {
        amount
    };

    if need == 0 {
        return Ok(PickedCoins {
            coins: Vec::new(),
            total: 0,
            amount,
            can_use_transfer_object: false,
        });
    }

    let mut sorted: Vec<&C> = coins.iter().collect();
    sorted.sort_by(|a, b| b.balance().cmp(&a.balance()));

    // Equal balances sit before the first smaller one, so stop there.
    for coin in &sorted {
        let balance = coin.balance();
        if balance < amount {
            break;
        }
        if balance == amount {
            debug!(amount, "coin_selection: exact match");
            return Ok(PickedCoins {
                coins: vec![(*coin).clone()],
                total: balance,
                amount,
                can_use_transfer_object: true,
            });
        }
    }

    let mut picked = Vec::new();
    let mut total: u64 = 0;
    for coin in sorted {
        // Wrapping past u64::MAX means need is already covered.
        total = total.saturating_add(coin.balance());
        picked.push(coin.clone());
        if total >= need {
            debug!(amount, need, total, count = picked.len(), "coin_selection: prefix selected");
            return Ok(PickedCoins {
                coins: picked,
                total,
                amount,
                can_use_transfer_object: false,
            });
        }
    }

    debug!(have = total, need, "coin_selection: insufficient balance");
    Err(CoinSelectionError::InsufficientBalance { have: total, need })
}

/// Fetch `owner`'s coins of `coin_type` from `source` and select from them.
pub fn pickup_coins_from_source<S: CoinSource>(
    source: &S,
    owner: &str,
    coin_type: &str,
    amount: u64,
    extra_reserve: u64,
    is_native: bool,
) -> Result<PickedCoins<S::Coin>, CoinSelectionError> {
    let coins = source.coins(owner, coin_type)?;
    debug!(owner, coin_type, available = coins.len(), "coin_selection: coins fetched");
    pickup_coins(&coins, amount, extra_reserve, is_native)
}
