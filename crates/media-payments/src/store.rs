//! Payment Record Store
//!
//! Durable ledger of payment attempts, access grants, and watch history.
//! The reconcile path needs the mark-paid and grant-upsert writes to commit
//! as one unit, so the store exposes them as a single `settle` operation; a
//! SQL-backed implementation would run it as a multi-statement transaction.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{PaymentError, Result};
use crate::model::{
    AccessGrant, NewPaymentAttempt, PaymentAttempt, PaymentStatus, TransactionToken, WatchRecord,
};

/// Outcome of the atomic settle step
#[derive(Clone, Debug)]
pub enum Settlement {
    /// Attempt moved to `Paid` and the grant was written
    Settled {
        attempt: PaymentAttempt,
        grant: AccessGrant,
    },

    /// Attempt was already `Paid`; nothing changed (duplicate delivery)
    AlreadySettled { attempt: PaymentAttempt },
}

impl Settlement {
    pub fn attempt(&self) -> &PaymentAttempt {
        match self {
            Settlement::Settled { attempt, .. } | Settlement::AlreadySettled { attempt } => attempt,
        }
    }
}

/// Payment storage trait
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Get the attempt for a (user, item) pair, any status
    async fn find_attempt(&self, user_id: &str, media_id: &str)
    -> Result<Option<PaymentAttempt>>;

    /// Create a pending attempt for a pair.
    ///
    /// The store enforces uniqueness on (user, item): if a row already
    /// exists, the existing row is returned and `new` is discarded, so
    /// racing creators converge on one attempt.
    async fn create_attempt(&self, new: NewPaymentAttempt) -> Result<PaymentAttempt>;

    /// Atomically mark the attempt matching `token` as `Paid`, attach the
    /// raw gateway payload, and upsert the access grant for its
    /// (user, item) pair. Both writes commit together or neither does.
    ///
    /// Settling an already-paid attempt is a no-op, not an error.
    async fn settle(&self, token: &TransactionToken, payload: serde_json::Value)
    -> Result<Settlement>;

    /// Get the grant for a (user, item) pair
    async fn find_grant(&self, user_id: &str, media_id: &str) -> Result<Option<AccessGrant>>;

    /// Get the watch record for a (user, item) pair
    async fn find_watch(&self, user_id: &str, media_id: &str) -> Result<Option<WatchRecord>>;

    /// Create a watch record for a pair
    async fn create_watch(&self, user_id: &str, media_id: &str) -> Result<WatchRecord>;

    /// All watch records for a user, most recent first
    async fn watch_history(&self, user_id: &str) -> Result<Vec<WatchRecord>>;
}

type PairKey = (String, String);

#[derive(Default)]
struct LedgerState {
    attempts: HashMap<PairKey, PaymentAttempt>,
    by_token: HashMap<TransactionToken, PairKey>,
    grants: HashMap<PairKey, AccessGrant>,
    watches: HashMap<PairKey, WatchRecord>,
}

/// In-memory payment store (for development and tests)
///
/// One `RwLock` guards the whole ledger; `settle` holds the write guard
/// across both mutations, which is what makes them a unit.
pub struct MemoryPaymentStore {
    state: RwLock<LedgerState>,
}

impl Default for MemoryPaymentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryPaymentStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LedgerState::default()),
        }
    }

    fn mark_paid(
        state: &mut LedgerState,
        key: &PairKey,
        payload: serde_json::Value,
    ) -> Result<PaymentAttempt> {
        let attempt = state.attempts.get_mut(key).ok_or_else(|| {
            PaymentError::Consistency(format!("attempt missing for pair {key:?}"))
        })?;
        attempt.status = PaymentStatus::Paid;
        attempt.gateway_payload = Some(payload);
        Ok(attempt.clone())
    }

    fn upsert_grant(state: &mut LedgerState, key: &PairKey) -> AccessGrant {
        state
            .grants
            .entry(key.clone())
            .or_insert_with(|| AccessGrant::new(key.0.clone(), key.1.clone()))
            .clone()
    }
}

#[async_trait]
impl PaymentStore for MemoryPaymentStore {
    async fn find_attempt(
        &self,
        user_id: &str,
        media_id: &str,
    ) -> Result<Option<PaymentAttempt>> {
        let state = self.state.read().unwrap();
        Ok(state
            .attempts
            .get(&(user_id.to_string(), media_id.to_string()))
            .cloned())
    }

    async fn create_attempt(&self, new: NewPaymentAttempt) -> Result<PaymentAttempt> {
        let mut state = self.state.write().unwrap();
        let key = (new.user_id.clone(), new.media_id.clone());

        if let Some(existing) = state.attempts.get(&key) {
            return Ok(existing.clone());
        }

        let attempt = PaymentAttempt::pending(new);
        state
            .by_token
            .insert(attempt.transaction_token.clone(), key.clone());
        state.attempts.insert(key, attempt.clone());
        Ok(attempt)
    }

    async fn settle(
        &self,
        token: &TransactionToken,
        payload: serde_json::Value,
    ) -> Result<Settlement> {
        let mut state = self.state.write().unwrap();

        let key = state
            .by_token
            .get(token)
            .cloned()
            .ok_or_else(|| PaymentError::NotFound(format!("no payment attempt for {token}")))?;

        let current = state
            .attempts
            .get(&key)
            .ok_or_else(|| PaymentError::Consistency(format!("attempt missing for {token}")))?;

        if current.is_paid() {
            return Ok(Settlement::AlreadySettled {
                attempt: current.clone(),
            });
        }

        // Both mutations happen under the one write guard taken above.
        let attempt = Self::mark_paid(&mut state, &key, payload)?;
        let grant = Self::upsert_grant(&mut state, &key);

        Ok(Settlement::Settled { attempt, grant })
    }

    async fn find_grant(&self, user_id: &str, media_id: &str) -> Result<Option<AccessGrant>> {
        let state = self.state.read().unwrap();
        Ok(state
            .grants
            .get(&(user_id.to_string(), media_id.to_string()))
            .cloned())
    }

    async fn find_watch(&self, user_id: &str, media_id: &str) -> Result<Option<WatchRecord>> {
        let state = self.state.read().unwrap();
        Ok(state
            .watches
            .get(&(user_id.to_string(), media_id.to_string()))
            .cloned())
    }

    async fn create_watch(&self, user_id: &str, media_id: &str) -> Result<WatchRecord> {
        let mut state = self.state.write().unwrap();
        let key = (user_id.to_string(), media_id.to_string());

        let record = state
            .watches
            .entry(key)
            .or_insert_with(|| WatchRecord::new(user_id, media_id))
            .clone();
        Ok(record)
    }

    async fn watch_history(&self, user_id: &str) -> Result<Vec<WatchRecord>> {
        let state = self.state.read().unwrap();
        let mut records: Vec<WatchRecord> = state
            .watches
            .values()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.watched_at.cmp(&a.watched_at));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn new_attempt(user: &str, media: &str) -> NewPaymentAttempt {
        NewPaymentAttempt {
            user_id: user.into(),
            media_id: media.into(),
            amount: dec!(100),
            transaction_token: TransactionToken::generate(),
        }
    }

    #[tokio::test]
    async fn test_create_attempt_converges_on_first_row() {
        let store = MemoryPaymentStore::new();

        let first = store.create_attempt(new_attempt("u1", "m1")).await.unwrap();
        let second = store.create_attempt(new_attempt("u1", "m1")).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.transaction_token, second.transaction_token);
    }

    #[tokio::test]
    async fn test_settle_writes_attempt_and_grant_together() {
        let store = MemoryPaymentStore::new();
        let attempt = store.create_attempt(new_attempt("u1", "m1")).await.unwrap();

        let payload = serde_json::json!({"status": "VALID", "tran_id": attempt.transaction_token.as_str()});
        let settlement = store
            .settle(&attempt.transaction_token, payload.clone())
            .await
            .unwrap();

        match settlement {
            Settlement::Settled { attempt, grant } => {
                assert_eq!(attempt.status, PaymentStatus::Paid);
                assert_eq!(attempt.gateway_payload, Some(payload));
                assert_eq!(grant.user_id, "u1");
                assert_eq!(grant.media_id, "m1");
            }
            Settlement::AlreadySettled { .. } => panic!("first settle must write"),
        }

        assert!(store.find_grant("u1", "m1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_settle_twice_is_a_clean_noop() {
        let store = MemoryPaymentStore::new();
        let attempt = store.create_attempt(new_attempt("u1", "m1")).await.unwrap();
        let payload = serde_json::json!({"status": "VALID"});

        store
            .settle(&attempt.transaction_token, payload.clone())
            .await
            .unwrap();
        let first_grant = store.find_grant("u1", "m1").await.unwrap().unwrap();

        let second = store
            .settle(&attempt.transaction_token, payload)
            .await
            .unwrap();
        assert!(matches!(second, Settlement::AlreadySettled { .. }));

        let grant_after = store.find_grant("u1", "m1").await.unwrap().unwrap();
        assert_eq!(first_grant.id, grant_after.id);
    }

    #[tokio::test]
    async fn test_settle_unknown_token_is_not_found() {
        let store = MemoryPaymentStore::new();
        let err = store
            .settle(&TransactionToken::generate(), serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::NotFound(_)));
        assert!(store.find_grant("u1", "m1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_watch_find_or_create_is_idempotent() {
        let store = MemoryPaymentStore::new();

        let first = store.create_watch("u1", "m1").await.unwrap();
        let second = store.create_watch("u1", "m1").await.unwrap();
        assert_eq!(first.id, second.id);

        store.create_watch("u1", "m2").await.unwrap();
        let history = store.watch_history("u1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(store.watch_history("u2").await.unwrap().is_empty());
    }
}
