//! LMDB environment setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::account::LmdbAccountStore;
use crate::meta::LmdbMetaStore;
use crate::migration::Migrator;
use crate::vote::LmdbVoteStore;
use crate::write_batch::WriteBatch;
use crate::LmdbError;

/// Number of named databases the node opens.
const MAX_DBS: u32 = 3;

/// Default map size: 1 GiB.
pub const DEFAULT_MAP_SIZE: usize = 1 << 30;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    path: PathBuf,
    pub(crate) accounts_db: Database<Bytes, Bytes>,
    pub(crate) votes_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;
        // SAFETY: the node opens each data directory once per process and
        // never truncates the memory-mapped file while it is open.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let accounts_db = env.create_database(&mut wtxn, Some("accounts"))?;
        let votes_db = env.create_database(&mut wtxn, Some("votes"))?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        let this = Self {
            env: Arc::new(env),
            path: path.to_path_buf(),
            accounts_db,
            votes_db,
            meta_db,
        };
        Migrator::run(&this.meta_store())?;

        tracing::info!(path = %path.display(), map_size, "opened LMDB environment");
        Ok(this)
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn account_store(&self) -> LmdbAccountStore {
        LmdbAccountStore {
            env: Arc::clone(&self.env),
            accounts_db: self.accounts_db,
        }
    }

    pub fn vote_store(&self) -> LmdbVoteStore {
        LmdbVoteStore {
            env: Arc::clone(&self.env),
            votes_db: self.votes_db,
        }
    }

    pub fn meta_store(&self) -> LmdbMetaStore {
        LmdbMetaStore {
            env: Arc::clone(&self.env),
            meta_db: self.meta_db,
        }
    }

    /// Begin a write batch; see [`WriteBatch`].
    pub fn write_batch(&self) -> Result<WriteBatch<'_>, LmdbError> {
        WriteBatch::new(self)
    }
}
