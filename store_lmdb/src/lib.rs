//! LMDB storage backend for the TaskPay service.
//!
//! Implements the storage traits from `taskpay-store` using the `heed` LMDB
//! bindings. Each logical store maps to one named LMDB database within a
//! single environment. LMDB's single-writer model makes every write
//! transaction an exclusive, atomic unit — exactly the guarantee the
//! ledger's read-modify-write operations require.

pub mod environment;
pub mod error;
mod txn;

pub use environment::LmdbStore;
pub use error::LmdbError;
