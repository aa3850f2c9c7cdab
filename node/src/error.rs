use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("store error: {0}")]
    Store(#[from] tally_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] tally_store_lmdb::LmdbError),

    #[error("oracle error: {0}")]
    Oracle(#[from] tally_oracle::OracleError),

    #[error("state error: {0}")]
    State(#[from] tally_state::StateError),

    #[error("invalid block: {0}")]
    InvalidBlock(String),

    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("mempool full: {0}")]
    MempoolFull(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
