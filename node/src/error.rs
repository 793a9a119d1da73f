use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] taskpay_store::StoreError),

    #[error("failed to open store: {0}")]
    Lmdb(#[from] taskpay_store_lmdb::LmdbError),

    #[error("ledger error: {0}")]
    Ledger(#[from] taskpay_ledger::LedgerError),

    #[error("RPC server error: {0}")]
    Rpc(#[from] taskpay_rpc::RpcError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
