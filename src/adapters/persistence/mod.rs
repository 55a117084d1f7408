//! Persistence Adapters - File-based Storage
//!
//! Atomic JSON for the settings document, append-only JSONL for the
//! activity journal, and a line-delimited text file for accounts.
//! No database dependency.

pub mod accounts;
pub mod activity_journal;
pub mod settings_store;

pub use accounts::FileAccountStore;
pub use activity_journal::ActivityJournal;
pub use settings_store::SettingsStore;
