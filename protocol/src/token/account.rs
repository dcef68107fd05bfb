//! Per-participant token sets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::id::TokenId;
use super::output::Token;

/// The set of unspent tokens one account can spend.
///
/// Keyed by [`TokenId`] for constant-ish lookup and removal while inputs are
/// resolved. Persisted as `{"tokens": [...]}` in ascending id order. Every
/// token appended to an account carries a freshly allocated id, which is
/// larger than any id already in existence, so ascending id order is the
/// order tokens were inserted in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AccountRecord", into = "AccountRecord")]
pub struct Account {
    tokens: BTreeMap<TokenId, Token>,
}

/// On-disk shape of an [`Account`].
#[derive(Serialize, Deserialize)]
struct AccountRecord {
    tokens: Vec<Token>,
}

impl TryFrom<AccountRecord> for Account {
    type Error = String;

    fn try_from(record: AccountRecord) -> Result<Self, Self::Error> {
        let mut account = Account::new();
        for token in record.tokens {
            let id = token.id;
            if account.tokens.insert(id, token).is_some() {
                return Err(format!("duplicate token id {id} in account record"));
            }
        }
        Ok(account)
    }
}

impl From<Account> for AccountRecord {
    fn from(account: Account) -> Self {
        AccountRecord {
            tokens: account.tokens.into_values().collect(),
        }
    }
}

impl Account {
    /// An account holding no tokens.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a token. Returns the token it displaced if the id was already held.
    pub fn insert(&mut self, token: Token) -> Option<Token> {
        self.tokens.insert(token.id, token)
    }

    /// Remove and return the token with the given id.
    pub fn remove(&mut self, id: &TokenId) -> Option<Token> {
        self.tokens.remove(id)
    }

    pub fn get(&self, id: &TokenId) -> Option<&Token> {
        self.tokens.get(id)
    }

    pub fn contains(&self, id: &TokenId) -> bool {
        self.tokens.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens in insertion (ascending id) order.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.tokens.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = TokenId> + '_ {
        self.tokens.keys().copied()
    }
}
