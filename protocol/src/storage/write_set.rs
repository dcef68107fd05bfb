//! In-memory write buffer for one invocation.
//!
//! Every protocol operation reads and writes through a [`WriteSet`]. Reads
//! see staged values first and fall back to the database, so an operation
//! observes its own writes. Nothing reaches disk until [`WriteSet::commit`];
//! dropping the set instead discards every staged change, which is how an
//! aborted invocation leaves durable state untouched.

use std::collections::BTreeMap;

use super::db::{ChangeSet, DbError, DbResult, LedgerDb};
use crate::token::Account;

/// Staged account and metadata writes layered over a [`LedgerDb`].
#[derive(Debug)]
pub struct WriteSet<'a> {
    db: &'a LedgerDb,
    accounts: BTreeMap<String, Account>,
    metadata: BTreeMap<String, String>,
}

impl<'a> WriteSet<'a> {
    pub fn new(db: &'a LedgerDb) -> Self {
        Self {
            db,
            accounts: BTreeMap::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Current view of an account: staged copy if any, else the stored one.
    pub fn account(&self, account_id: &str) -> DbResult<Option<Account>> {
        match self.accounts.get(account_id) {
            Some(account) => Ok(Some(account.clone())),
            None => self.db.get_account(account_id),
        }
    }

    /// Stage a full replacement of an account's token set.
    pub fn put_account(&mut self, account_id: &str, account: Account) {
        self.accounts.insert(account_id.to_string(), account);
    }

    /// Current view of a metadata key.
    pub fn metadata(&self, key: &str) -> DbResult<Option<String>> {
        match self.metadata.get(key) {
            Some(value) => Ok(Some(value.clone())),
            None => self.db.get_metadata(key),
        }
    }

    /// Stage a metadata value.
    pub fn put_metadata(&mut self, key: &str, value: String) {
        self.metadata.insert(key.to_string(), value);
    }

    /// Accounts with a staged write, in key order.
    pub fn staged_accounts(&self) -> Vec<String> {
        self.accounts.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty() && self.metadata.is_empty()
    }

    /// Encode every staged value into a [`ChangeSet`].
    pub fn to_change_set(&self) -> DbResult<ChangeSet> {
        let mut changes = ChangeSet::default();
        for (id, account) in &self.accounts {
            let bytes = serde_json::to_vec(account)
                .map_err(|e| DbError::Serialization(format!("account {id}: {e}")))?;
            changes.accounts.push((id.clone(), bytes));
        }
        for (key, value) in &self.metadata {
            changes
                .metadata
                .push((key.clone(), value.clone().into_bytes()));
        }
        Ok(changes)
    }

    /// Durably apply every staged write in one atomic step.
    pub fn commit(self) -> DbResult<()> {
        let changes = self.to_change_set()?;
        self.db.apply(&changes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_ID_KEY;
    use crate::token::{Token, TokenId};

    fn account_with(id: u64) -> Account {
        let mut account = Account::new();
        account.insert(Token {
            id: TokenId::new(id),
            commit: format!("C{id}"),
            encrypt_value: "E".into(),
            from_pubkey: "K".into(),
            hash: "H".into(),
        });
        account
    }

    #[test]
    fn reads_see_staged_writes() {
        let db = LedgerDb::open_temporary().unwrap();
        let mut writes = WriteSet::new(&db);

        assert!(writes.account("alice").unwrap().is_none());
        writes.put_account("alice", account_with(1));
        assert_eq!(writes.account("alice").unwrap().unwrap().len(), 1);

        writes.put_metadata(MAX_ID_KEY, "1".into());
        assert_eq!(writes.metadata(MAX_ID_KEY).unwrap().as_deref(), Some("1"));

        // Nothing durable yet.
        assert!(db.get_account("alice").unwrap().is_none());
        assert!(db.get_metadata(MAX_ID_KEY).unwrap().is_none());
    }

    #[test]
    fn drop_discards_staged_writes() {
        let db = LedgerDb::open_temporary().unwrap();
        let before = db.snapshot().unwrap();
        {
            let mut writes = WriteSet::new(&db);
            writes.put_account("alice", account_with(1));
            writes.put_metadata(MAX_ID_KEY, "1".into());
        }
        assert_eq!(db.snapshot().unwrap(), before);
    }

    #[test]
    fn commit_makes_writes_durable() {
        let db = LedgerDb::open_temporary().unwrap();
        let mut writes = WriteSet::new(&db);
        writes.put_account("alice", account_with(1));
        writes.put_metadata(MAX_ID_KEY, "1".into());
        writes.commit().unwrap();

        assert_eq!(db.get_account("alice").unwrap().unwrap().len(), 1);
        assert_eq!(db.get_max_id().unwrap(), Some(TokenId::new(1)));
    }

    #[test]
    fn restaging_an_account_keeps_one_write() {
        let db = LedgerDb::open_temporary().unwrap();
        let mut writes = WriteSet::new(&db);
        writes.put_account("bob", account_with(1));
        writes.put_account("bob", account_with(2));

        let changes = writes.to_change_set().unwrap();
        assert_eq!(changes.accounts.len(), 1);
        assert_eq!(writes.staged_accounts(), vec!["bob".to_string()]);
    }
}
