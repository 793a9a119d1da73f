//! In-memory storage backend.
//!
//! Used by unit and property tests. Writers stage changes against a clone of
//! the state while holding the store lock, so write transactions are fully
//! serialized and commit atomically — the same isolation the LMDB backend
//! provides with its single-writer transactions.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use taskpay_types::{TaskId, UserId, WithdrawalId};

use crate::{
    ReadTxn, Store, StoreError, TaskRecord, UserRecord, WithdrawalRecord, WriteTxn,
};

#[derive(Clone, Default)]
struct Inner {
    users: BTreeMap<UserId, UserRecord>,
    handles: BTreeMap<String, UserId>,
    tasks: BTreeMap<u64, TaskRecord>,
    withdrawals: BTreeMap<u64, WithdrawalRecord>,
    meta: BTreeMap<String, Vec<u8>>,
    task_seq: u64,
    withdrawal_seq: u64,
}

impl Inner {
    fn get_user(&self, id: &UserId) -> Option<UserRecord> {
        self.users.get(id).cloned()
    }

    fn lookup_handle(&self, handle: &str) -> Option<UserId> {
        self.handles.get(handle).cloned()
    }

    fn get_task(&self, id: TaskId) -> Option<TaskRecord> {
        self.tasks.get(&id.value()).cloned()
    }

    fn get_withdrawal(&self, id: WithdrawalId) -> Option<WithdrawalRecord> {
        self.withdrawals.get(&id.value()).cloned()
    }
}

/// An in-memory [`Store`] for tests.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))
    }
}

impl Store for MemoryStore {
    fn read(&self) -> Result<Box<dyn ReadTxn + '_>, StoreError> {
        let snapshot = self.lock()?.clone();
        Ok(Box::new(MemoryReadTxn { snapshot }))
    }

    fn write(&self) -> Result<Box<dyn WriteTxn + '_>, StoreError> {
        let guard = self.lock()?;
        let staged = guard.clone();
        Ok(Box::new(MemoryWriteTxn { guard, staged }))
    }
}

struct MemoryReadTxn {
    snapshot: Inner,
}

struct MemoryWriteTxn<'a> {
    guard: MutexGuard<'a, Inner>,
    staged: Inner,
}

macro_rules! impl_read_txn {
    ($ty:ty, $field:ident) => {
        impl ReadTxn for $ty {
            fn get_user(&self, id: &UserId) -> Result<Option<UserRecord>, StoreError> {
                Ok(self.$field.get_user(id))
            }

            fn lookup_handle(&self, handle: &str) -> Result<Option<UserId>, StoreError> {
                Ok(self.$field.lookup_handle(handle))
            }

            fn iter_users(&self) -> Result<Vec<UserRecord>, StoreError> {
                Ok(self.$field.users.values().cloned().collect())
            }

            fn user_count(&self) -> Result<u64, StoreError> {
                Ok(self.$field.users.len() as u64)
            }

            fn get_task(&self, id: TaskId) -> Result<Option<TaskRecord>, StoreError> {
                Ok(self.$field.get_task(id))
            }

            fn iter_tasks(&self) -> Result<Vec<TaskRecord>, StoreError> {
                Ok(self.$field.tasks.values().cloned().collect())
            }

            fn get_withdrawal(
                &self,
                id: WithdrawalId,
            ) -> Result<Option<WithdrawalRecord>, StoreError> {
                Ok(self.$field.get_withdrawal(id))
            }

            fn iter_withdrawals(&self) -> Result<Vec<WithdrawalRecord>, StoreError> {
                Ok(self.$field.withdrawals.values().cloned().collect())
            }

            fn iter_withdrawals_for(
                &self,
                user: &UserId,
            ) -> Result<Vec<WithdrawalRecord>, StoreError> {
                Ok(self
                    .$field
                    .withdrawals
                    .values()
                    .filter(|w| &w.user == user)
                    .cloned()
                    .collect())
            }

            fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
                Ok(self.$field.meta.get(key).cloned())
            }
        }
    };
}

impl_read_txn!(MemoryReadTxn, snapshot);
impl_read_txn!(MemoryWriteTxn<'_>, staged);

impl WriteTxn for MemoryWriteTxn<'_> {
    fn put_user(&mut self, record: &UserRecord) -> Result<(), StoreError> {
        self.staged.users.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn delete_user(&mut self, id: &UserId) -> Result<(), StoreError> {
        self.staged.users.remove(id);
        Ok(())
    }

    fn put_handle(&mut self, handle: &str, id: &UserId) -> Result<(), StoreError> {
        self.staged.handles.insert(handle.to_owned(), id.clone());
        Ok(())
    }

    fn delete_handle(&mut self, handle: &str) -> Result<(), StoreError> {
        self.staged.handles.remove(handle);
        Ok(())
    }

    fn put_task(&mut self, record: &TaskRecord) -> Result<(), StoreError> {
        self.staged.tasks.insert(record.id.value(), record.clone());
        Ok(())
    }

    fn delete_task(&mut self, id: TaskId) -> Result<(), StoreError> {
        self.staged
            .tasks
            .remove(&id.value())
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("task {id}")))
    }

    fn put_withdrawal(&mut self, record: &WithdrawalRecord) -> Result<(), StoreError> {
        self.staged
            .withdrawals
            .insert(record.id.value(), record.clone());
        Ok(())
    }

    fn next_task_id(&mut self) -> Result<TaskId, StoreError> {
        self.staged.task_seq += 1;
        Ok(TaskId::new(self.staged.task_seq))
    }

    fn next_withdrawal_id(&mut self) -> Result<WithdrawalId, StoreError> {
        self.staged.withdrawal_seq += 1;
        Ok(WithdrawalId::new(self.staged.withdrawal_seq))
    }

    fn put_meta(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.staged.meta.insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    fn as_read(&self) -> &dyn ReadTxn {
        self
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryWriteTxn { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskpay_types::Timestamp;

    #[test]
    fn uncommitted_writes_are_invisible() {
        let store = MemoryStore::new();
        let user = UserRecord::new(UserId::new("1"), Timestamp::EPOCH);
        {
            let mut txn = store.write().unwrap();
            txn.put_user(&user).unwrap();
            // dropped without commit
        }
        let txn = store.read().unwrap();
        assert!(txn.get_user(&UserId::new("1")).unwrap().is_none());
    }

    #[test]
    fn committed_writes_are_visible() {
        let store = MemoryStore::new();
        let user = UserRecord::new(UserId::new("1"), Timestamp::EPOCH);
        let mut txn = store.write().unwrap();
        txn.put_user(&user).unwrap();
        txn.commit().unwrap();

        let txn = store.read().unwrap();
        assert!(txn.get_user(&UserId::new("1")).unwrap().is_some());
    }

    #[test]
    fn sequences_increment_per_commit() {
        let store = MemoryStore::new();
        let mut txn = store.write().unwrap();
        assert_eq!(txn.next_task_id().unwrap(), TaskId::new(1));
        assert_eq!(txn.next_task_id().unwrap(), TaskId::new(2));
        txn.commit().unwrap();

        let mut txn = store.write().unwrap();
        assert_eq!(txn.next_task_id().unwrap(), TaskId::new(3));
    }

    #[test]
    fn delete_missing_task_is_not_found() {
        let store = MemoryStore::new();
        let mut txn = store.write().unwrap();
        assert!(matches!(
            txn.delete_task(TaskId::new(9)),
            Err(StoreError::NotFound(_))
        ));
    }
}
