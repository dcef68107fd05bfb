//! Account reads and writes for one invocation.

use super::error::{LedgerError, LedgerResult};
use crate::storage::WriteSet;
use crate::token::{Account, Token, TokenId};

/// Account operations staged into an invocation's [`WriteSet`].
///
/// Reads observe earlier writes of the same invocation. Nothing becomes
/// durable until the owning write set is committed.
pub struct AccountLedger<'w, 'a> {
    writes: &'w mut WriteSet<'a>,
}

impl<'w, 'a> AccountLedger<'w, 'a> {
    pub fn new(writes: &'w mut WriteSet<'a>) -> Self {
        Self { writes }
    }

    /// Read access to the underlying write set.
    pub fn writes(&self) -> &WriteSet<'a> {
        &*self.writes
    }

    /// Current token set of an account, if it exists.
    pub fn load(&self, account_id: &str) -> LedgerResult<Option<Account>> {
        Ok(self.writes.account(account_id)?)
    }

    /// Remove a token from an account and return it.
    pub fn consume(&mut self, account_id: &str, token_id: &str) -> LedgerResult<Token> {
        let mut account = self
            .load(account_id)?
            .ok_or_else(|| LedgerError::SourceAccountNotFound(account_id.to_string()))?;
        let token = take_token(&mut account, token_id)?;
        self.save(account_id, account);
        Ok(token)
    }

    /// Append a token, creating the account if absent.
    pub fn add(&mut self, account_id: &str, token: Token) -> LedgerResult<()> {
        let mut account = self.load(account_id)?.unwrap_or_default();
        account.insert(token);
        self.save(account_id, account);
        Ok(())
    }

    /// Replace an account's full token set.
    pub fn save(&mut self, account_id: &str, account: Account) {
        self.writes.put_account(account_id, account);
    }
}

/// Remove the token named by `raw_id` from a working copy of an account.
///
/// Only the canonical decimal form names a token; anything else is reported
/// as missing under the id the client sent.
pub fn take_token(account: &mut Account, raw_id: &str) -> LedgerResult<Token> {
    TokenId::parse_canonical(raw_id)
        .and_then(|id| account.remove(&id))
        .ok_or_else(|| LedgerError::TokenNotFound {
            id: raw_id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LedgerDb;

    fn token(id: u64, commit: &str) -> Token {
        Token {
            id: TokenId::new(id),
            commit: commit.into(),
            encrypt_value: "E".into(),
            from_pubkey: "K".into(),
            hash: "tx".into(),
        }
    }

    #[test]
    fn add_creates_missing_account() {
        let db = LedgerDb::open_temporary().unwrap();
        let mut writes = WriteSet::new(&db);
        let mut accounts = AccountLedger::new(&mut writes);

        assert!(accounts.load("bob").unwrap().is_none());
        accounts.add("bob", token(3, "C3")).unwrap();
        accounts.add("bob", token(4, "C4")).unwrap();
        assert_eq!(accounts.load("bob").unwrap().unwrap().len(), 2);
    }

    #[test]
    fn consume_removes_exactly_once() {
        let db = LedgerDb::open_temporary().unwrap();
        let mut writes = WriteSet::new(&db);
        let mut accounts = AccountLedger::new(&mut writes);
        accounts.add("alice", token(1, "C1")).unwrap();

        let spent = accounts.consume("alice", "1").unwrap();
        assert_eq!(spent.commit, "C1");

        let err = accounts.consume("alice", "1").unwrap_err();
        assert!(matches!(err, LedgerError::TokenNotFound { ref id } if id == "1"));
        assert!(accounts.load("alice").unwrap().unwrap().is_empty());

        // Staged only: the database still has nothing.
        assert!(accounts.writes().staged_accounts().contains(&"alice".to_string()));
        assert!(db.get_account("alice").unwrap().is_none());
    }

    #[test]
    fn consume_from_missing_account() {
        let db = LedgerDb::open_temporary().unwrap();
        let mut writes = WriteSet::new(&db);
        let mut accounts = AccountLedger::new(&mut writes);

        let err = accounts.consume("nobody", "1").unwrap_err();
        assert!(matches!(err, LedgerError::SourceAccountNotFound(ref a) if a == "nobody"));
    }

    #[test]
    fn non_canonical_id_does_not_alias() {
        let mut account = Account::new();
        account.insert(token(1, "C1"));

        let err = take_token(&mut account, "01").unwrap_err();
        assert!(matches!(err, LedgerError::TokenNotFound { ref id } if id == "01"));
        assert_eq!(account.len(), 1);
    }
}
