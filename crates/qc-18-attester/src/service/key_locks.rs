//! Per-key mutual exclusion
//!
//! Attempts for the same key run one at a time from duty resolution to
//! history commit; attempts for different keys never wait on each other.

use crate::domain::ValidatorPubkey;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Default)]
pub struct KeyLocks {
    locks: Mutex<HashMap<ValidatorPubkey, Arc<AsyncMutex<()>>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `pubkey`. Released when the guard drops.
    pub async fn acquire(&self, pubkey: &ValidatorPubkey) -> OwnedMutexGuard<()> {
        let lock = self.locks.lock().entry(*pubkey).or_default().clone();
        lock.lock_owned().await
    }

    /// True if an attempt for `pubkey` currently holds the lock.
    #[cfg(test)]
    pub fn is_locked(&self, pubkey: &ValidatorPubkey) -> bool {
        self.locks
            .lock()
            .get(pubkey)
            .map(|lock| lock.try_lock().is_err())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_waits() {
        let locks = Arc::new(KeyLocks::new());
        let key = ValidatorPubkey::new([1; 48]);

        let guard = locks.acquire(&key).await;
        assert!(locks.is_locked(&key));

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire(&key).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
        assert!(!locks.is_locked(&key));
    }

    #[tokio::test]
    async fn test_different_keys_do_not_contend() {
        let locks = KeyLocks::new();
        let _a = locks.acquire(&ValidatorPubkey::new([1; 48])).await;

        let b = tokio::time::timeout(
            Duration::from_millis(50),
            locks.acquire(&ValidatorPubkey::new([2; 48])),
        )
        .await;
        assert!(b.is_ok());
    }
}
