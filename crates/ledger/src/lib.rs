//! Fund custody boundary for the Team DAO governance engine.
//!
//! The governance core treats fund movement as a single atomic
//! capability: `transfer(from, to, amount)` either moves the full
//! amount or fails with a typed error and no side effects. Everything
//! below that line — real ledgers, on-chain escrow, bank adapters — is
//! an external concern behind the [`FundLedger`] trait.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

/// Ledger account identifier.
///
/// Team prize pools and player wallets share one flat account space;
/// the governance engine derives pool account names from team names.
pub type AccountId = String;

/// Errors surfaced by a fund ledger
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("Unknown account: {0}")]
    UnknownAccount(AccountId),

    #[error("Insufficient funds in {account}: requested {requested}, available {available}")]
    InsufficientFunds {
        account: AccountId,
        requested: u64,
        available: u64,
    },

    #[error("Ledger backend error: {0}")]
    Backend(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// The atomic fund-transfer capability the governance engine relies on.
#[async_trait]
pub trait FundLedger: Send + Sync + 'static {
    /// Move `amount` from one account to another.
    ///
    /// Atomic: on any error the balances of both accounts are
    /// unchanged. Transferring zero is a no-op that still validates
    /// the source account.
    async fn transfer(&self, from: &AccountId, to: &AccountId, amount: u64) -> LedgerResult<()>;

    /// Credit an account, creating it if it does not exist.
    async fn deposit(&self, account: &AccountId, amount: u64) -> LedgerResult<()>;

    /// Current balance of an account.
    async fn balance(&self, account: &AccountId) -> LedgerResult<u64>;
}

/// In-memory [`FundLedger`] implementation.
///
/// Balances live under a single lock, so a transfer observes and
/// updates both accounts in one critical section.
pub struct MemoryLedger {
    balances: RwLock<HashMap<AccountId, u64>>,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            balances: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FundLedger for MemoryLedger {
    async fn transfer(&self, from: &AccountId, to: &AccountId, amount: u64) -> LedgerResult<()> {
        let mut balances = self.balances.write().await;

        let available = *balances
            .get(from)
            .ok_or_else(|| LedgerError::UnknownAccount(from.clone()))?;
        if available < amount {
            return Err(LedgerError::InsufficientFunds {
                account: from.clone(),
                requested: amount,
                available,
            });
        }

        balances.insert(from.clone(), available - amount);
        *balances.entry(to.clone()).or_insert(0) += amount;
        debug!(%from, %to, amount, "transfer applied");
        Ok(())
    }

    async fn deposit(&self, account: &AccountId, amount: u64) -> LedgerResult<()> {
        let mut balances = self.balances.write().await;
        *balances.entry(account.clone()).or_insert(0) += amount;
        Ok(())
    }

    async fn balance(&self, account: &AccountId) -> LedgerResult<u64> {
        let balances = self.balances.read().await;
        balances
            .get(account)
            .copied()
            .ok_or_else(|| LedgerError::UnknownAccount(account.clone()))
    }
}
