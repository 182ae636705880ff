use std::collections::BTreeMap;

use sheetbind_engine::engine::{
    AliasTable, CellAddress, CellRange, EngineError, EngineResult, Value, is_address_syntax,
};

use super::cell::Cell;

/// A sparse grid of cells with its alias table.
#[derive(Clone, Debug, PartialEq)]
pub struct Sheet {
    name: String,
    label: String,
    cells: BTreeMap<CellAddress, Cell>,
    aliases: AliasTable,
}

impl Sheet {
    pub fn new(name: &str) -> Self {
        Sheet {
            name: name.to_string(),
            label: name.to_string(),
            cells: BTreeMap::new(),
            aliases: AliasTable::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn set_label(&mut self, label: &str) {
        self.label = label.to_string();
    }

    pub fn cell(&self, address: CellAddress) -> Option<&Cell> {
        self.cells.get(&address)
    }

    pub(crate) fn cell_mut(&mut self, address: CellAddress) -> Option<&mut Cell> {
        self.cells.get_mut(&address)
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (CellAddress, &Cell)> {
        self.cells.iter().map(|(addr, cell)| (*addr, cell))
    }

    pub(crate) fn cells_mut(&mut self) -> impl Iterator<Item = (CellAddress, &mut Cell)> {
        self.cells.iter_mut().map(|(addr, cell)| (*addr, cell))
    }

    /// Occupied cells inside `range`, row-major.
    pub fn cells_in(&self, range: CellRange) -> impl Iterator<Item = (CellAddress, &Cell)> {
        self.cells
            .range(range.start..=range.end)
            .filter(move |(addr, _)| range.contains(**addr))
            .map(|(addr, cell)| (*addr, cell))
    }

    /// Store a cell. An empty cell is only kept while it carries an alias.
    pub(crate) fn put_cell(&mut self, address: CellAddress, cell: Cell) {
        if cell.is_empty() && self.aliases.name_of(address).is_none() {
            self.cells.remove(&address);
        } else {
            self.cells.insert(address, cell);
        }
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Set or clear (empty `name`) the alias at `address`, returning the previous name.
    pub(crate) fn set_alias(
        &mut self,
        address: CellAddress,
        name: &str,
    ) -> EngineResult<Option<String>> {
        let previous = self.aliases.set_alias(address, name)?;
        if name.is_empty() {
            if self.cells.get(&address).is_some_and(Cell::is_empty) {
                self.cells.remove(&address);
            }
        } else {
            self.cells.entry(address).or_insert_with(Cell::empty);
        }
        Ok(previous)
    }

    /// Replace cells and aliases wholesale (structural edits).
    pub(crate) fn replace(&mut self, cells: BTreeMap<CellAddress, Cell>, aliases: AliasTable) {
        self.cells = cells;
        self.aliases = aliases;
    }

    /// Interpret `text` as an address, or else as an alias of this sheet.
    pub fn lookup(&self, text: &str) -> EngineResult<CellAddress> {
        let text = text.trim();
        if is_address_syntax(text) {
            CellAddress::parse(text)
        } else {
            self.aliases.resolve(text)
        }
    }

    /// Value at `address` for evaluation: errors of formula cells are passed on.
    pub fn read(&self, address: CellAddress) -> Result<Value, EngineError> {
        match self.cells.get(&address).and_then(Cell::formula) {
            Some(formula) => formula.read(),
            None => Ok(self.cells.get(&address).map(Cell::value).unwrap_or_default()),
        }
    }
}
