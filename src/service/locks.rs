// service/locks.rs
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Keyed async mutexes. Holding the guard for a key serializes the
/// read-validate-write of that entity within this process; other keys are
/// unaffected.
#[derive(Debug, Default)]
pub struct EntityLocks {
    slots: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl EntityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: impl ToString) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().await;
            // drop slots nobody holds or waits on
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            slots.entry(key.to_string()).or_default().clone()
        };
        slot.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_waits_for_release() {
        let locks = Arc::new(EntityLocks::new());
        let guard = locks.lock("b1").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock("b1").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn different_keys_do_not_block() {
        let locks = EntityLocks::new();
        let _first = locks.lock("b1").await;
        let second = tokio::time::timeout(Duration::from_millis(100), locks.lock("b2")).await;
        assert!(second.is_ok());
    }
}
