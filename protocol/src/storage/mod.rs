//! # Storage Module
//!
//! Durable ledger state on top of sled, plus the in-memory write buffer
//! that makes every invocation all-or-nothing.
//!
//! ```text
//! db.rs: LedgerDb: the `accounts` and `metadata` trees
//! write_set.rs: WriteSet: read-your-writes overlay, committed in one
//!                sled transaction or dropped
//! ```
//!
//! ## Layout
//!
//! | Tree       | Key                   | Value                          |
//! |------------|-----------------------|--------------------------------|
//! | `accounts` | account id (UTF-8)    | JSON `{"tokens":[Token, ...]}` |
//! | `metadata` | `max_id`              | decimal string                 |
//! | `metadata` | `global_attribute`    | JSON `{name, symbol, version}` |
//! | `metadata` | `bpRangeproofVerify`  | `true` / `false`               |
//! | `metadata` | `pedersenTallyVerify` | `true` / `false`               |
//!
//! Values are JSON text rather than a binary codec: the records are small
//! and other tooling reads them directly.

pub mod db;
pub mod write_set;

pub use db::{ChangeSet, DbError, DbResult, LedgerDb, LedgerSnapshot};
pub use write_set::WriteSet;
