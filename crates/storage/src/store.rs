use async_trait::async_trait;
use roster_core::PersistableRecord;
use serde::Serialize;

use crate::error::StoreError;

/// A persisted `users` row. The id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredUser {
    pub id: i32,
    pub name: String,
    pub age: i32,
    pub address: Option<serde_json::Value>,
    pub additional_info: Option<serde_json::Value>,
}

impl StoredUser {
    pub fn from_record(id: i32, record: &PersistableRecord) -> Self {
        Self {
            id,
            name: record.name.clone(),
            age: record.age,
            address: record.address.clone(),
            additional_info: record.additional_info.clone(),
        }
    }
}

/// Storage capability for the `users` table, bound to a single connection.
///
/// Transaction control is explicit: callers pair every `begin` with exactly one
/// `commit` or `rollback`. Inserts outside a transaction autocommit.
#[async_trait]
pub trait UserStore: Send {
    async fn begin(&mut self) -> Result<(), StoreError>;

    async fn insert_user(&mut self, record: &PersistableRecord) -> Result<(), StoreError>;

    async fn commit(&mut self) -> Result<(), StoreError>;

    async fn rollback(&mut self) -> Result<(), StoreError>;

    /// Total number of rows visible to this connection.
    async fn count_users(&mut self) -> Result<i64, StoreError>;

    /// Rows with `min <= age <= max`.
    async fn count_in_age_range(&mut self, min: i32, max: i32) -> Result<i64, StoreError>;
}
