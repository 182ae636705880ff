//! Per-sheet alias table: a bijection between symbolic names and cell addresses.
//!
//! Uniqueness is enforced when an alias is set rather than when it is used, because
//! expressions refer to aliases by name and resolution must stay deterministic.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use super::address::{CellAddress, is_address_syntax};
use super::error::{EngineError, EngineResult};

fn identifier_re() -> &'static Regex {
    static IDENT_RE: OnceLock<Regex> = OnceLock::new();
    IDENT_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex must compile")
    })
}

/// True if `text` is a plain identifier (`[A-Za-z_][A-Za-z0-9_]*`).
pub fn is_identifier(text: &str) -> bool {
    identifier_re().is_match(text)
}

/// Words the expression grammar gives a meaning of their own.
pub fn is_keyword(text: &str) -> bool {
    text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("false")
}

/// Check that `name` could be bound as an alias.
pub fn validate_alias_name(name: &str) -> EngineResult<()> {
    if is_address_syntax(name) || is_keyword(name) {
        return Err(EngineError::ReservedName(name.to_string()));
    }
    if !is_identifier(name) {
        return Err(EngineError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AliasTable {
    by_name: BTreeMap<String, CellAddress>,
    by_address: BTreeMap<CellAddress, String>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `address`, or remove the alias at `address` when `name` is empty.
    ///
    /// Returns the alias previously bound at `address`, if any. On error the table is
    /// left untouched.
    pub fn set_alias(&mut self, address: CellAddress, name: &str) -> EngineResult<Option<String>> {
        if name.is_empty() {
            return Ok(self.remove(address));
        }

        validate_alias_name(name)?;

        if let Some(existing) = self.by_name.get(name) {
            if *existing != address {
                return Err(EngineError::AmbiguousAlias {
                    name: name.to_string(),
                    existing: *existing,
                });
            }
            return Ok(Some(name.to_string()));
        }

        let previous = self.remove(address);
        self.by_name.insert(name.to_string(), address);
        self.by_address.insert(address, name.to_string());
        Ok(previous)
    }

    /// Remove the alias at `address` in both directions.
    pub fn remove(&mut self, address: CellAddress) -> Option<String> {
        let name = self.by_address.remove(&address)?;
        self.by_name.remove(&name);
        Some(name)
    }

    pub fn resolve(&self, name: &str) -> EngineResult<CellAddress> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| EngineError::UnknownAlias(name.to_string()))
    }

    pub fn name_of(&self, address: CellAddress) -> Option<&str> {
        self.by_address.get(&address).map(String::as_str)
    }

    /// Aliases sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, CellAddress)> {
        self.by_name.iter().map(|(name, addr)| (name.as_str(), *addr))
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Build a new table with every address mapped through `f`; `None` drops the alias.
    /// `f` must be injective over the addresses it keeps.
    pub fn remap(&self, mut f: impl FnMut(CellAddress) -> Option<CellAddress>) -> AliasTable {
        let mut table = AliasTable::new();
        for (name, addr) in &self.by_name {
            if let Some(new_addr) = f(*addr) {
                table.by_name.insert(name.clone(), new_addr);
                table.by_address.insert(new_addr, name.clone());
            }
        }
        table
    }
}
