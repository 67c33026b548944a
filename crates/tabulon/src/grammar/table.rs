use crate::grammar::{ProductionId, StateId, SymbolId};
use smallvec::SmallVec;

/// One parse action. Each `(state, symbol)` pair resolves to at most one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Shift {
        state: StateId,
        /// Clear for tokens that must be re-lexed on incremental re-parse.
        reusable: bool,
    },
    Reduce {
        symbol: SymbolId,
        child_count: u16,
        production: ProductionId,
    },
    Accept,
    Recover,
}

/// A table slot: an action for terminal columns, a goto for non-terminal
/// columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TableEntry {
    Action(Action),
    Goto(StateId),
}

#[derive(Debug, Clone)]
struct Group {
    entry: TableEntry,
    symbols: SmallVec<[SymbolId; 4]>,
}

/// Compiled shift/reduce table.
///
/// The first `large_state_count` states are dense rows indexed by symbol;
/// the rest live in a shared pool of run-length groups, reached through a
/// per-state offset range.
#[derive(Debug, Clone)]
pub(crate) struct ActionTable {
    symbol_count: usize,
    large_state_count: usize,
    /// `large_state_count * symbol_count`, row-major.
    dense: Vec<Option<TableEntry>>,
    groups: Vec<Group>,
    /// Per small state: range into `groups`.
    offsets: Vec<(u32, u32)>,
}

impl ActionTable {
    pub(crate) fn new(symbol_count: usize, large_state_count: usize) -> Self {
        Self {
            symbol_count,
            large_state_count,
            dense: vec![None; large_state_count * symbol_count],
            groups: Vec::new(),
            offsets: Vec::new(),
        }
    }

    pub(crate) fn set_dense(&mut self, state: usize, symbol: usize, entry: TableEntry) {
        self.dense[state * self.symbol_count + symbol] = Some(entry);
    }

    /// Append one small state's groups; rows must arrive in state order.
    pub(crate) fn push_small_row(
        &mut self,
        groups: impl IntoIterator<Item = (TableEntry, SmallVec<[SymbolId; 4]>)>,
    ) {
        let start = self.groups.len() as u32;
        for (entry, symbols) in groups {
            self.groups.push(Group { entry, symbols });
        }
        let end = self.groups.len() as u32;
        self.offsets.push((start, end));
    }

    pub(crate) fn state_count(&self) -> usize {
        self.large_state_count + self.offsets.len()
    }

    /// Resolve `(state, symbol)` to its unique entry, if any.
    pub(crate) fn entry(&self, state: StateId, symbol: SymbolId) -> Option<TableEntry> {
        let s = state.index();
        if s < self.large_state_count {
            return self.dense[s * self.symbol_count + symbol.index()];
        }
        let (start, end) = *self.offsets.get(s - self.large_state_count)?;
        self.groups[start as usize..end as usize]
            .iter()
            .find(|g| g.symbols.contains(&symbol))
            .map(|g| g.entry)
    }

}
