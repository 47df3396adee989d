//! Business side of the protected endpoints (in-memory account book).

use std::collections::HashMap;

use tokio::sync::Mutex;

use accessgate_core::{AccountId, Amount, DomainError, DomainResult};

/// Balance every account starts with when first touched.
pub const OPENING_BALANCE: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountSnapshot {
    pub balance: f64,
    pub active: bool,
}

/// In-memory balances keyed by account id.
///
/// Accounts open lazily with [`OPENING_BALANCE`] on their first debit;
/// reads never create entries. There is no persistence.
#[derive(Debug, Default)]
pub struct AccountBook {
    balances: Mutex<HashMap<AccountId, f64>>,
}

impl AccountBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view; an account nobody has debited reports [`OPENING_BALANCE`].
    pub async fn get(&self, id: &AccountId) -> AccountSnapshot {
        let balance = self
            .balances
            .lock()
            .await
            .get(id)
            .copied()
            .unwrap_or(OPENING_BALANCE);
        AccountSnapshot {
            balance,
            active: true,
        }
    }

    /// Debit `amount` from the account. Returns the new balance.
    pub async fn transfer_out(&self, id: &AccountId, amount: Amount) -> DomainResult<f64> {
        let mut balances = self.balances.lock().await;
        let balance = balances.entry(id.clone()).or_insert(OPENING_BALANCE);
        if amount.value() > *balance {
            return Err(DomainError::rejected(format!(
                "insufficient funds: balance {balance}, requested {amount}"
            )));
        }
        *balance -= amount.value();
        Ok(*balance)
    }

    /// Current balance without opening the account.
    pub async fn peek(&self, id: &AccountId) -> Option<f64> {
        self.balances.lock().await.get(id).copied()
    }
}
