use async_trait::async_trait;
use roster_core::PersistableRecord;

use crate::error::StoreError;
use crate::store::{StoredUser, UserStore};

/// In-process [`UserStore`] with the same transaction semantics as the
/// PostgreSQL store. Used for dry runs and tests.
///
/// Like a serial column, ids consumed by a rolled-back transaction are not reused.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    committed: Vec<StoredUser>,
    pending: Option<Vec<StoredUser>>,
    last_id: i32,
    commits: usize,
    rollbacks: usize,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed rows, in insertion order.
    pub fn users(&self) -> &[StoredUser] {
        &self.committed
    }

    pub fn commit_count(&self) -> usize {
        self.commits
    }

    pub fn rollback_count(&self) -> usize {
        self.rollbacks
    }

    pub fn in_transaction(&self) -> bool {
        self.pending.is_some()
    }

    fn visible(&self) -> impl Iterator<Item = &StoredUser> {
        self.committed
            .iter()
            .chain(self.pending.iter().flatten())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn begin(&mut self) -> Result<(), StoreError> {
        if self.pending.is_some() {
            return Err(StoreError::TransactionActive);
        }
        self.pending = Some(Vec::new());
        Ok(())
    }

    async fn insert_user(&mut self, record: &PersistableRecord) -> Result<(), StoreError> {
        self.last_id += 1;
        let user = StoredUser::from_record(self.last_id, record);
        match self.pending.as_mut() {
            Some(pending) => pending.push(user),
            None => self.committed.push(user),
        }
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        let pending = self.pending.take().ok_or(StoreError::NoTransaction)?;
        self.committed.extend(pending);
        self.commits += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.pending.take().ok_or(StoreError::NoTransaction)?;
        self.rollbacks += 1;
        Ok(())
    }

    async fn count_users(&mut self) -> Result<i64, StoreError> {
        Ok(self.visible().count() as i64)
    }

    async fn count_in_age_range(&mut self, min: i32, max: i32) -> Result<i64, StoreError> {
        Ok(self
            .visible()
            .filter(|u| u.age >= min && u.age <= max)
            .count() as i64)
    }
}
