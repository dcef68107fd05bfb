//! # LedgerDb: Persistent Storage Engine
//!
//! Wraps a sled `Db` with two named trees (see the module docs for the
//! layout). Reads decode straight into the token model; writes only ever
//! arrive as a whole [`ChangeSet`], applied in a single multi-tree sled
//! transaction and flushed before returning. Either every key of an
//! invocation lands on disk or none does.

use sled::transaction::{TransactionError, TransactionResult};
use sled::{Db, Transactional, Tree};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::path::Path;

use crate::config::{ACCOUNTS_TREE, GLOBAL_ATTRIBUTE_KEY, MAX_ID_KEY, METADATA_TREE};
use crate::token::{Account, LedgerMetadata, TokenId};

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// A stored record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type DbResult<T> = Result<T, DbError>;

// ---------------------------------------------------------------------------
// Change Sets & Snapshots
// ---------------------------------------------------------------------------

/// Fully encoded writes of one invocation, ready to apply atomically.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub accounts: Vec<(String, Vec<u8>)>,
    pub metadata: Vec<(String, Vec<u8>)>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty() && self.metadata.is_empty()
    }
}

/// Raw byte-level copy of both trees, for before/after comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LedgerSnapshot {
    pub accounts: BTreeMap<Vec<u8>, Vec<u8>>,
    pub metadata: BTreeMap<Vec<u8>, Vec<u8>>,
}

// ---------------------------------------------------------------------------
// LedgerDb
// ---------------------------------------------------------------------------

/// Persistent storage for accounts and ledger singletons.
///
/// sled handles are reference counted, so cloning a `LedgerDb` is cheap
/// and every clone sees the same data.
#[derive(Debug, Clone)]
pub struct LedgerDb {
    db: Db,
    accounts: Tree,
    metadata: Tree,
}

impl LedgerDb {
    /// Open or create a database at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Create a temporary database that is removed when dropped.
    pub fn open_temporary() -> DbResult<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> DbResult<Self> {
        let accounts = db.open_tree(ACCOUNTS_TREE)?;
        let metadata = db.open_tree(METADATA_TREE)?;
        Ok(Self {
            db,
            accounts,
            metadata,
        })
    }

    // -- Account reads ------------------------------------------------------

    /// Retrieve the token set of an account, `None` if it was never written.
    pub fn get_account(&self, account_id: &str) -> DbResult<Option<Account>> {
        match self.accounts.get(account_id.as_bytes())? {
            Some(bytes) => {
                let account: Account = serde_json::from_slice(&bytes).map_err(|e| {
                    DbError::Serialization(format!("account {account_id}: {e}"))
                })?;
                Ok(Some(account))
            }
            None => Ok(None),
        }
    }

    /// Ids of every account ever written, in key order.
    pub fn account_ids(&self) -> DbResult<Vec<String>> {
        let mut ids = Vec::new();
        for entry in self.accounts.iter() {
            let (key, _) = entry?;
            ids.push(String::from_utf8_lossy(&key).into_owned());
        }
        Ok(ids)
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    // -- Metadata reads -----------------------------------------------------

    /// Raw text value stored under a metadata key.
    pub fn get_metadata(&self, key: &str) -> DbResult<Option<String>> {
        match self.metadata.get(key.as_bytes())? {
            Some(bytes) => {
                let text = String::from_utf8(bytes.to_vec())
                    .map_err(|e| DbError::Serialization(format!("metadata {key}: {e}")))?;
                Ok(Some(text))
            }
            None => Ok(None),
        }
    }

    /// Ledger metadata, `None` before issuance.
    pub fn get_ledger_metadata(&self) -> DbResult<Option<LedgerMetadata>> {
        match self.get_metadata(GLOBAL_ATTRIBUTE_KEY)? {
            Some(text) => serde_json::from_str(&text)
                .map(Some)
                .map_err(|e| DbError::Serialization(format!("{GLOBAL_ATTRIBUTE_KEY}: {e}"))),
            None => Ok(None),
        }
    }

    /// Last assigned token id, `None` before anything was minted.
    pub fn get_max_id(&self) -> DbResult<Option<TokenId>> {
        match self.get_metadata(MAX_ID_KEY)? {
            Some(text) => TokenId::parse_canonical(&text)
                .map(Some)
                .ok_or_else(|| DbError::Serialization(format!("{MAX_ID_KEY}: {text:?}"))),
            None => Ok(None),
        }
    }

    /// Last diagnostic verdict recorded under `key`.
    pub fn get_verdict(&self, key: &str) -> DbResult<Option<bool>> {
        match self.get_metadata(key)? {
            Some(text) => serde_json::from_str(&text)
                .map(Some)
                .map_err(|e| DbError::Serialization(format!("{key}: {e}"))),
            None => Ok(None),
        }
    }

    // -- Writes -------------------------------------------------------------

    /// Apply every write of a change set atomically, then flush.
    pub fn apply(&self, changes: &ChangeSet) -> DbResult<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let result: TransactionResult<(), Infallible> = (&self.accounts, &self.metadata)
            .transaction(|(accounts, metadata)| {
                for (key, value) in &changes.accounts {
                    accounts.insert(key.as_bytes(), value.as_slice())?;
                }
                for (key, value) in &changes.metadata {
                    metadata.insert(key.as_bytes(), value.as_slice())?;
                }
                Ok(())
            });

        match result {
            Ok(()) => {}
            Err(TransactionError::Storage(e)) => return Err(DbError::Sled(e)),
            Err(TransactionError::Abort(never)) => match never {},
        }

        self.db.flush()?;
        Ok(())
    }

    // -- Utility operations -------------------------------------------------

    /// Byte-for-byte copy of both trees.
    pub fn snapshot(&self) -> DbResult<LedgerSnapshot> {
        let mut snapshot = LedgerSnapshot::default();
        for entry in self.accounts.iter() {
            let (key, value) = entry?;
            snapshot.accounts.insert(key.to_vec(), value.to_vec());
        }
        for entry in self.metadata.iter() {
            let (key, value) = entry?;
            snapshot.metadata.insert(key.to_vec(), value.to_vec());
        }
        Ok(snapshot)
    }

    /// Force a flush of all pending writes to disk.
    pub fn flush(&self) -> DbResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
