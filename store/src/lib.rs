//! Abstract storage traits for the TaskPay service.
//!
//! Every storage backend (LMDB for production, in-memory for testing)
//! implements these traits. The rest of the codebase depends only on the
//! traits. Transactions are the unit of atomicity: every ledger operation
//! reads and writes through a single [`WriteTxn`] and commits once, so two
//! concurrent identical requests produce exactly one net effect.

pub mod error;
pub mod memory;
pub mod task;
pub mod user;
pub mod withdrawal;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use task::TaskRecord;
pub use user::UserRecord;
pub use withdrawal::WithdrawalRecord;

use taskpay_types::{TaskId, UserId, WithdrawalId};

/// A storage backend holding the user, task, and withdrawal record types.
pub trait Store: Send + Sync {
    /// Open a read-only transaction (a consistent snapshot).
    fn read(&self) -> Result<Box<dyn ReadTxn + '_>, StoreError>;

    /// Open a write transaction. Backends serialize writers: the handle is
    /// exclusive, and nothing becomes visible until [`WriteTxn::commit`].
    fn write(&self) -> Result<Box<dyn WriteTxn + '_>, StoreError>;
}

/// Read operations available inside any transaction.
pub trait ReadTxn {
    fn get_user(&self, id: &UserId) -> Result<Option<UserRecord>, StoreError>;
    /// Resolve a lowercase username to its owning user id.
    fn lookup_handle(&self, handle: &str) -> Result<Option<UserId>, StoreError>;
    fn iter_users(&self) -> Result<Vec<UserRecord>, StoreError>;
    fn user_count(&self) -> Result<u64, StoreError>;

    fn get_task(&self, id: TaskId) -> Result<Option<TaskRecord>, StoreError>;
    fn iter_tasks(&self) -> Result<Vec<TaskRecord>, StoreError>;

    fn get_withdrawal(&self, id: WithdrawalId) -> Result<Option<WithdrawalRecord>, StoreError>;
    fn iter_withdrawals(&self) -> Result<Vec<WithdrawalRecord>, StoreError>;
    fn iter_withdrawals_for(&self, user: &UserId) -> Result<Vec<WithdrawalRecord>, StoreError>;

    /// Read an operational metadata value (sequence counters, bootstrap flags).
    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
}

/// Write operations. Changes are staged in the transaction and become
/// visible atomically on [`WriteTxn::commit`]; dropping the handle without
/// committing discards them.
pub trait WriteTxn: ReadTxn {
    fn put_user(&mut self, record: &UserRecord) -> Result<(), StoreError>;
    fn delete_user(&mut self, id: &UserId) -> Result<(), StoreError>;
    fn put_handle(&mut self, handle: &str, id: &UserId) -> Result<(), StoreError>;
    fn delete_handle(&mut self, handle: &str) -> Result<(), StoreError>;

    fn put_task(&mut self, record: &TaskRecord) -> Result<(), StoreError>;
    /// Delete a task; `NotFound` if no such task exists.
    fn delete_task(&mut self, id: TaskId) -> Result<(), StoreError>;

    fn put_withdrawal(&mut self, record: &WithdrawalRecord) -> Result<(), StoreError>;

    /// Allocate the next task id from the store-level sequence.
    fn next_task_id(&mut self) -> Result<TaskId, StoreError>;
    /// Allocate the next withdrawal id from the store-level sequence.
    fn next_withdrawal_id(&mut self) -> Result<WithdrawalId, StoreError>;

    fn put_meta(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// View this write transaction as a plain reader.
    fn as_read(&self) -> &dyn ReadTxn;

    /// Atomically publish every staged change.
    fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
