//! LMDB environment setup.

use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvOpenOptions};
use std::path::Path;

use taskpay_store::{ReadTxn, Store, StoreError, WriteTxn};

use crate::error::LmdbError;
use crate::txn::{backend, Databases, LmdbReadTxn, LmdbWriteTxn};

/// Number of named databases the environment must hold.
const MAX_DBS: u32 = 8;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbStore {
    env: Env,
    dbs: Databases,
}

impl LmdbStore {
    /// Open or create an LMDB environment at the given path.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;
        // SAFETY: each environment path is opened exactly once per process;
        // this constructor is the only place the service opens its store.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let users: Database<Str, Bytes> = env.create_database(&mut wtxn, Some("users"))?;
        let handles: Database<Str, Str> = env.create_database(&mut wtxn, Some("handles"))?;
        let tasks: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some("tasks"))?;
        let withdrawals: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some("withdrawals"))?;
        let meta: Database<Str, Bytes> = env.create_database(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        Ok(Self {
            env,
            dbs: Databases {
                users,
                handles,
                tasks,
                withdrawals,
                meta,
            },
        })
    }
}

impl Store for LmdbStore {
    fn read(&self) -> Result<Box<dyn ReadTxn + '_>, StoreError> {
        let txn = self.env.read_txn().map_err(backend)?;
        Ok(Box::new(LmdbReadTxn::new(txn, self.dbs)))
    }

    fn write(&self) -> Result<Box<dyn WriteTxn + '_>, StoreError> {
        let txn = self.env.write_txn().map_err(backend)?;
        Ok(Box::new(LmdbWriteTxn::new(txn, self.dbs)))
    }
}
