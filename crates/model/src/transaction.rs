use {
    crate::{address::Address, pool_id::PoolId, tx_hash::TxHash},
    bigdecimal::BigDecimal,
    chrono::{DateTime, Utc},
};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, sqlx::Type)]
#[sqlx(type_name = "transaction_type")]
#[sqlx(rename_all = "snake_case")]
pub enum TransactionType {
    #[default]
    Swap,
    AddLiquidity,
    RemoveLiquidity,
    CreatePool,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, sqlx::Type)]
#[sqlx(type_name = "transaction_status")]
#[sqlx(rename_all = "snake_case")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Confirmed,
    Failed,
}

impl TransactionStatus {
    /// `Pending -> Confirmed` or `Pending -> Failed` only; never backwards
    /// (§3). Terminal states don't transition at all, including to
    /// themselves, so a double-confirm is also rejected.
    pub fn can_transition_to(self, next: TransactionStatus) -> bool {
        matches!(
            (self, next),
            (TransactionStatus::Pending, TransactionStatus::Confirmed)
                | (TransactionStatus::Pending, TransactionStatus::Failed)
        )
    }
}

/// An immutable log entry. Once inserted, only `status` (and the fields that
/// accompany a confirmation) ever change, and only forward per
/// [`TransactionStatus::can_transition_to`].
#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct Transaction {
    pub id: i64,
    pub tx_hash: TxHash,
    pub tx_type: TransactionType,
    pub status: TransactionStatus,
    pub user: Address,
    pub pool_id: Option<PoolId>,
    pub amount_in: Option<BigDecimal>,
    pub amount_out: Option<BigDecimal>,
    pub gas_used: Option<BigDecimal>,
    pub gas_price: Option<BigDecimal>,
    pub block_number: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug)]
pub struct NewTransaction {
    pub tx_hash: TxHash,
    pub tx_type: TransactionType,
    pub user: Address,
    pub pool_id: Option<PoolId>,
    pub amount_in: Option<BigDecimal>,
    pub amount_out: Option<BigDecimal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_only_moves_forward_from_pending() {
        assert!(TransactionStatus::Pending.can_transition_to(TransactionStatus::Confirmed));
        assert!(TransactionStatus::Pending.can_transition_to(TransactionStatus::Failed));
        assert!(!TransactionStatus::Confirmed.can_transition_to(TransactionStatus::Failed));
        assert!(!TransactionStatus::Failed.can_transition_to(TransactionStatus::Confirmed));
        assert!(!TransactionStatus::Pending.can_transition_to(TransactionStatus::Pending));
    }
}
