use thiserror::Error;

/// Errors opening or preparing the LMDB environment.
///
/// Runtime transaction errors surface through `StoreError` instead.
#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(#[from] heed::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
