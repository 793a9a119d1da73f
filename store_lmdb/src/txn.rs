//! Read and write transaction implementations over heed transactions.

use heed::types::{Bytes, Str};
use heed::{Database, RoTxn, RwTxn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use taskpay_store::{
    ReadTxn, StoreError, TaskRecord, UserRecord, WithdrawalRecord, WriteTxn,
};
use taskpay_types::{TaskId, UserId, WithdrawalId};

const TASK_SEQ_KEY: &str = "seq:task";
const WITHDRAWAL_SEQ_KEY: &str = "seq:withdrawal";

/// All named database handles of one environment. `Database` is `Copy`, so
/// this travels by value into every transaction.
#[derive(Clone, Copy)]
pub(crate) struct Databases {
    pub users: Database<Str, Bytes>,
    pub handles: Database<Str, Str>,
    pub tasks: Database<Bytes, Bytes>,
    pub withdrawals: Database<Bytes, Bytes>,
    pub meta: Database<Str, Bytes>,
}

pub(crate) fn backend(e: heed::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    bincode::serialize(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode_u64(bytes: &[u8]) -> Result<u64, StoreError> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StoreError::Serialization("sequence value is not 8 bytes".into()))?;
    Ok(u64::from_be_bytes(arr))
}

// ── Shared read paths ──────────────────────────────────────────────────

fn get_user(txn: &RoTxn<'_>, dbs: &Databases, id: &UserId) -> Result<Option<UserRecord>, StoreError> {
    match dbs.users.get(txn, id.as_str()).map_err(backend)? {
        Some(bytes) => Ok(Some(decode(bytes)?)),
        None => Ok(None),
    }
}

fn lookup_handle(txn: &RoTxn<'_>, dbs: &Databases, handle: &str) -> Result<Option<UserId>, StoreError> {
    Ok(dbs
        .handles
        .get(txn, handle)
        .map_err(backend)?
        .map(|id| UserId::new(id.to_owned())))
}

fn iter_users(txn: &RoTxn<'_>, dbs: &Databases) -> Result<Vec<UserRecord>, StoreError> {
    let mut records = Vec::new();
    for item in dbs.users.iter(txn).map_err(backend)? {
        let (_, bytes) = item.map_err(backend)?;
        records.push(decode(bytes)?);
    }
    Ok(records)
}

fn user_count(txn: &RoTxn<'_>, dbs: &Databases) -> Result<u64, StoreError> {
    dbs.users.len(txn).map_err(backend)
}

fn get_task(txn: &RoTxn<'_>, dbs: &Databases, id: TaskId) -> Result<Option<TaskRecord>, StoreError> {
    match dbs
        .tasks
        .get(txn, &id.value().to_be_bytes())
        .map_err(backend)?
    {
        Some(bytes) => Ok(Some(decode(bytes)?)),
        None => Ok(None),
    }
}

fn iter_tasks(txn: &RoTxn<'_>, dbs: &Databases) -> Result<Vec<TaskRecord>, StoreError> {
    let mut records = Vec::new();
    for item in dbs.tasks.iter(txn).map_err(backend)? {
        let (_, bytes) = item.map_err(backend)?;
        records.push(decode(bytes)?);
    }
    Ok(records)
}

fn get_withdrawal(
    txn: &RoTxn<'_>,
    dbs: &Databases,
    id: WithdrawalId,
) -> Result<Option<WithdrawalRecord>, StoreError> {
    match dbs
        .withdrawals
        .get(txn, &id.value().to_be_bytes())
        .map_err(backend)?
    {
        Some(bytes) => Ok(Some(decode(bytes)?)),
        None => Ok(None),
    }
}

fn iter_withdrawals(txn: &RoTxn<'_>, dbs: &Databases) -> Result<Vec<WithdrawalRecord>, StoreError> {
    let mut records = Vec::new();
    for item in dbs.withdrawals.iter(txn).map_err(backend)? {
        let (_, bytes) = item.map_err(backend)?;
        records.push(decode(bytes)?);
    }
    Ok(records)
}

fn get_meta(txn: &RoTxn<'_>, dbs: &Databases, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
    Ok(dbs
        .meta
        .get(txn, key)
        .map_err(backend)?
        .map(|bytes| bytes.to_vec()))
}

// ── Read transaction ───────────────────────────────────────────────────

pub(crate) struct LmdbReadTxn<'a> {
    txn: RoTxn<'a>,
    dbs: Databases,
}

impl<'a> LmdbReadTxn<'a> {
    pub fn new(txn: RoTxn<'a>, dbs: Databases) -> Self {
        Self { txn, dbs }
    }
}

impl ReadTxn for LmdbReadTxn<'_> {
    fn get_user(&self, id: &UserId) -> Result<Option<UserRecord>, StoreError> {
        get_user(&self.txn, &self.dbs, id)
    }

    fn lookup_handle(&self, handle: &str) -> Result<Option<UserId>, StoreError> {
        lookup_handle(&self.txn, &self.dbs, handle)
    }

    fn iter_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        iter_users(&self.txn, &self.dbs)
    }

    fn user_count(&self) -> Result<u64, StoreError> {
        user_count(&self.txn, &self.dbs)
    }

    fn get_task(&self, id: TaskId) -> Result<Option<TaskRecord>, StoreError> {
        get_task(&self.txn, &self.dbs, id)
    }

    fn iter_tasks(&self) -> Result<Vec<TaskRecord>, StoreError> {
        iter_tasks(&self.txn, &self.dbs)
    }

    fn get_withdrawal(&self, id: WithdrawalId) -> Result<Option<WithdrawalRecord>, StoreError> {
        get_withdrawal(&self.txn, &self.dbs, id)
    }

    fn iter_withdrawals(&self) -> Result<Vec<WithdrawalRecord>, StoreError> {
        iter_withdrawals(&self.txn, &self.dbs)
    }

    fn iter_withdrawals_for(&self, user: &UserId) -> Result<Vec<WithdrawalRecord>, StoreError> {
        let mut records = iter_withdrawals(&self.txn, &self.dbs)?;
        records.retain(|w| &w.user == user);
        Ok(records)
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        get_meta(&self.txn, &self.dbs, key)
    }
}

// ── Write transaction ──────────────────────────────────────────────────

pub(crate) struct LmdbWriteTxn<'a> {
    txn: RwTxn<'a>,
    dbs: Databases,
}

impl<'a> LmdbWriteTxn<'a> {
    pub fn new(txn: RwTxn<'a>, dbs: Databases) -> Self {
        Self { txn, dbs }
    }

    fn bump_seq(&mut self, key: &str) -> Result<u64, StoreError> {
        let current = match self.dbs.meta.get(&self.txn, key).map_err(backend)? {
            Some(bytes) => decode_u64(bytes)?,
            None => 0,
        };
        let next = current + 1;
        self.dbs
            .meta
            .put(&mut self.txn, key, &next.to_be_bytes())
            .map_err(backend)?;
        Ok(next)
    }
}

impl ReadTxn for LmdbWriteTxn<'_> {
    fn get_user(&self, id: &UserId) -> Result<Option<UserRecord>, StoreError> {
        get_user(&self.txn, &self.dbs, id)
    }

    fn lookup_handle(&self, handle: &str) -> Result<Option<UserId>, StoreError> {
        lookup_handle(&self.txn, &self.dbs, handle)
    }

    fn iter_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        iter_users(&self.txn, &self.dbs)
    }

    fn user_count(&self) -> Result<u64, StoreError> {
        user_count(&self.txn, &self.dbs)
    }

    fn get_task(&self, id: TaskId) -> Result<Option<TaskRecord>, StoreError> {
        get_task(&self.txn, &self.dbs, id)
    }

    fn iter_tasks(&self) -> Result<Vec<TaskRecord>, StoreError> {
        iter_tasks(&self.txn, &self.dbs)
    }

    fn get_withdrawal(&self, id: WithdrawalId) -> Result<Option<WithdrawalRecord>, StoreError> {
        get_withdrawal(&self.txn, &self.dbs, id)
    }

    fn iter_withdrawals(&self) -> Result<Vec<WithdrawalRecord>, StoreError> {
        iter_withdrawals(&self.txn, &self.dbs)
    }

    fn iter_withdrawals_for(&self, user: &UserId) -> Result<Vec<WithdrawalRecord>, StoreError> {
        let mut records = iter_withdrawals(&self.txn, &self.dbs)?;
        records.retain(|w| &w.user == user);
        Ok(records)
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        get_meta(&self.txn, &self.dbs, key)
    }
}

impl WriteTxn for LmdbWriteTxn<'_> {
    fn put_user(&mut self, record: &UserRecord) -> Result<(), StoreError> {
        let bytes = encode(record)?;
        self.dbs
            .users
            .put(&mut self.txn, record.id.as_str(), &bytes)
            .map_err(backend)
    }

    fn delete_user(&mut self, id: &UserId) -> Result<(), StoreError> {
        self.dbs
            .users
            .delete(&mut self.txn, id.as_str())
            .map_err(backend)?;
        Ok(())
    }

    fn put_handle(&mut self, handle: &str, id: &UserId) -> Result<(), StoreError> {
        self.dbs
            .handles
            .put(&mut self.txn, handle, id.as_str())
            .map_err(backend)
    }

    fn delete_handle(&mut self, handle: &str) -> Result<(), StoreError> {
        self.dbs
            .handles
            .delete(&mut self.txn, handle)
            .map_err(backend)?;
        Ok(())
    }

    fn put_task(&mut self, record: &TaskRecord) -> Result<(), StoreError> {
        let bytes = encode(record)?;
        self.dbs
            .tasks
            .put(&mut self.txn, &record.id.value().to_be_bytes(), &bytes)
            .map_err(backend)
    }

    fn delete_task(&mut self, id: TaskId) -> Result<(), StoreError> {
        let deleted = self
            .dbs
            .tasks
            .delete(&mut self.txn, &id.value().to_be_bytes())
            .map_err(backend)?;
        if !deleted {
            return Err(StoreError::NotFound(format!("task {id}")));
        }
        Ok(())
    }

    fn put_withdrawal(&mut self, record: &WithdrawalRecord) -> Result<(), StoreError> {
        let bytes = encode(record)?;
        self.dbs
            .withdrawals
            .put(&mut self.txn, &record.id.value().to_be_bytes(), &bytes)
            .map_err(backend)
    }

    fn next_task_id(&mut self) -> Result<TaskId, StoreError> {
        self.bump_seq(TASK_SEQ_KEY).map(TaskId::new)
    }

    fn next_withdrawal_id(&mut self) -> Result<WithdrawalId, StoreError> {
        self.bump_seq(WITHDRAWAL_SEQ_KEY).map(WithdrawalId::new)
    }

    fn put_meta(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.dbs
            .meta
            .put(&mut self.txn, key, value)
            .map_err(backend)
    }

    fn as_read(&self) -> &dyn ReadTxn {
        self
    }

    fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.txn.commit().map_err(backend)
    }
}
