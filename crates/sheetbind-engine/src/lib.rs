//! sheetbind_engine - Addresses, aliases, expressions and dependency scheduling.

pub(crate) mod builtins;
pub mod engine;
