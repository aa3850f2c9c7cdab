//! LMDB implementation of AccountStore.
//!
//! Key: the 20 address bytes. Value: bincode of [`AccountInfo`].

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use tally_store::{AccountInfo, AccountStore, StoreError};
use tally_types::Address;

use crate::LmdbError;

pub struct LmdbAccountStore {
    pub(crate) env: Arc<Env>,
    pub(crate) accounts_db: Database<Bytes, Bytes>,
}

impl AccountStore for LmdbAccountStore {
    fn get_account(&self, address: &Address) -> Result<Option<AccountInfo>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .accounts_db
            .get(&rtxn, address.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => {
                let info: AccountInfo = bincode::deserialize(bytes).map_err(LmdbError::from)?;
                Ok(Some(info))
            }
            None => Ok(None),
        }
    }

    fn put_account(&self, info: &AccountInfo) -> Result<(), StoreError> {
        let bytes = bincode::serialize(info).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.accounts_db
            .put(&mut wtxn, info.address.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn account_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.accounts_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;
    use tally_types::Wei;

    #[test]
    fn put_then_get_account() {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = LmdbEnvironment::open(dir.path(), 10 * 1024 * 1024).expect("open env");
        let store = env.account_store();

        let info = AccountInfo {
            address: Address::repeat(4),
            balance: Wei::new(1_234),
            nonce: 7,
        };
        store.put_account(&info).unwrap();

        assert_eq!(store.get_account(&info.address).unwrap(), Some(info));
        assert_eq!(store.get_account(&Address::repeat(5)).unwrap(), None);
        assert_eq!(store.account_count().unwrap(), 1);
        assert_eq!(store.balance(&Address::repeat(4)).unwrap(), Wei::new(1_234));
    }
}
