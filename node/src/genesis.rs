//! Chain head bookkeeping and genesis initialisation.
//!
//! The head is two meta entries written in the same change set as each
//! block's state: the last committed block number and the round view after
//! it. A store without them has never seen genesis.

use std::collections::HashSet;

use tally_oracle::RoundView;
use tally_store::{ChangeSet, StateStore};

use crate::config::GenesisConfig;
use crate::NodeError;

pub const LAST_BLOCK_KEY: &str = "last_block";
pub const ROUND_VIEW_KEY: &str = "round_view";

/// Last committed block and the round view that follows it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainHead {
    pub last_block: u64,
    pub view: RoundView,
}

impl ChainHead {
    pub fn genesis() -> Self {
        Self {
            last_block: 0,
            view: RoundView::genesis(),
        }
    }

    /// Meta entries that persist this head.
    pub fn meta_entries(&self) -> Result<Vec<(String, Vec<u8>)>, NodeError> {
        let view = bincode::serialize(&self.view).map_err(|e| NodeError::Encoding(e.to_string()))?;
        Ok(vec![
            (LAST_BLOCK_KEY.to_string(), self.last_block.to_be_bytes().to_vec()),
            (ROUND_VIEW_KEY.to_string(), view),
        ])
    }
}

/// Read the persisted head, if genesis has been applied.
pub fn load_head(store: &dyn StateStore) -> Result<Option<ChainHead>, NodeError> {
    let Some(raw) = store.get_meta(LAST_BLOCK_KEY)? else {
        return Ok(None);
    };
    let bytes: [u8; 8] = raw
        .as_slice()
        .try_into()
        .map_err(|_| NodeError::Encoding(format!("{LAST_BLOCK_KEY} has {} bytes", raw.len())))?;
    let view_bytes = store
        .get_meta(ROUND_VIEW_KEY)?
        .ok_or_else(|| NodeError::Encoding(format!("{ROUND_VIEW_KEY} missing")))?;
    let view: RoundView =
        bincode::deserialize(&view_bytes).map_err(|e| NodeError::Encoding(e.to_string()))?;
    Ok(Some(ChainHead {
        last_block: u64::from_be_bytes(bytes),
        view,
    }))
}

/// Fund the genesis accounts and write the genesis head, atomically.
pub fn apply_genesis(store: &dyn StateStore, genesis: &GenesisConfig) -> Result<ChainHead, NodeError> {
    let mut seen = HashSet::new();
    let mut accounts = Vec::with_capacity(genesis.accounts.len());
    for account in &genesis.accounts {
        if !seen.insert(account.address) {
            return Err(NodeError::Config(format!(
                "genesis account {} listed twice",
                account.address
            )));
        }
        accounts.push(tally_store::AccountInfo {
            address: account.address,
            balance: account.balance(),
            nonce: 0,
        });
    }

    let head = ChainHead::genesis();
    let changes = ChangeSet {
        accounts,
        votes: Vec::new(),
        meta: head.meta_entries()?,
    };
    store.apply_changes(&changes)?;
    tracing::info!(
        accounts = changes.accounts.len(),
        voters = genesis.voters.len(),
        "genesis applied"
    );
    Ok(head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenesisAccount;
    use tally_nullables::NullStore;
    use tally_store::AccountStore;
    use tally_types::amount::TOKEN_UNIT;
    use tally_types::{Address, Round, Wei};

    #[test]
    fn fresh_store_has_no_head() {
        assert_eq!(load_head(&NullStore::new()).unwrap(), None);
    }

    #[test]
    fn genesis_funds_accounts_and_writes_head() {
        let store = NullStore::new();
        let genesis = GenesisConfig {
            accounts: vec![GenesisAccount {
                address: Address::repeat(1),
                balance_tokens: 3,
            }],
            voters: vec![Address::repeat(1)],
        };
        apply_genesis(&store, &genesis).unwrap();

        assert_eq!(store.balance(&Address::repeat(1)).unwrap(), Wei::new(3 * TOKEN_UNIT));
        assert_eq!(load_head(&store).unwrap(), Some(ChainHead::genesis()));
    }

    #[test]
    fn duplicate_genesis_account_rejected() {
        let store = NullStore::new();
        let account = GenesisAccount {
            address: Address::repeat(1),
            balance_tokens: 3,
        };
        let genesis = GenesisConfig {
            accounts: vec![account.clone(), account],
            voters: Vec::new(),
        };
        assert!(matches!(apply_genesis(&store, &genesis), Err(NodeError::Config(_))));
        assert_eq!(load_head(&store).unwrap(), None);
    }

    #[test]
    fn head_roundtrips_through_meta() {
        let store = NullStore::new();
        let head = ChainHead {
            last_block: 42,
            view: RoundView {
                round: Round::new(4),
                round_start_block: 40,
                ..RoundView::genesis()
            },
        };
        store
            .apply_changes(&ChangeSet {
                meta: head.meta_entries().unwrap(),
                ..ChangeSet::default()
            })
            .unwrap();
        assert_eq!(load_head(&store).unwrap(), Some(head));
    }
}
