//! Metadata storage trait.

use crate::StoreError;

/// Key under which the schema version is stored.
pub const SCHEMA_VERSION_KEY: &str = "schema_version";

/// Generic key-value store for internal bookkeeping that doesn't belong in
/// any domain-specific store (schema version, persisted round view).
pub trait MetaStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    fn get_schema_version(&self) -> Result<Option<u32>, StoreError> {
        match self.get_meta(SCHEMA_VERSION_KEY)? {
            None => Ok(None),
            Some(bytes) => {
                let raw: [u8; 4] = bytes.as_slice().try_into().map_err(|_| {
                    StoreError::Corruption(format!("schema version has {} bytes", bytes.len()))
                })?;
                Ok(Some(u32::from_be_bytes(raw)))
            }
        }
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        self.put_meta(SCHEMA_VERSION_KEY, &version.to_be_bytes())
    }
}
