//! Loaded grammar tables: symbols, lexer automaton, action table, field
//! maps, and alias sequences.
//!
//! A [`Grammar`] is built once from a [`GrammarTables`] description, fully
//! validated in the process, and never mutated afterwards. Wrap it in an
//! `Arc` and share it freely: concurrent parses of the same grammar need no
//! locking (see the crate docs on concurrency).

mod ids;
mod lex;
mod raw;
mod table;

pub use ids::{FieldId, LexStateId, ProductionId, StateId, SymbolId};
pub use raw::{
    CharSpec, EntrySpec, GrammarTables, LexStateSpec, LexTransitionSpec, ProductionSpec,
    SparseRowSpec, SymbolSpec,
};
pub use table::Action;

pub(crate) use lex::{CharMatch, LexState, LexTable, LexTransition};
pub(crate) use table::{ActionTable, TableEntry};

use crate::error::GrammarError;
use ahash::RandomState;
use hashbrown::{HashMap, HashSet};
use lasso::{Reader, Resolver};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy)]
struct SymbolInfo {
    name: lasso::Spur,
    visible: bool,
    named: bool,
}

#[derive(Debug, Clone, Default)]
struct Production {
    fields: Box<[(FieldId, u16)]>,
    aliases: Box<[(u16, SymbolId)]>,
}

/// A validated, immutable compiled grammar.
pub struct Grammar {
    names: lasso::RodeoReader,
    symbols: Vec<SymbolInfo>,
    token_count: u16,
    lex: LexTable,
    table: ActionTable,
    productions: Vec<Production>,
    field_names: Vec<lasso::Spur>,
    field_ids: HashMap<lasso::Spur, FieldId, RandomState>,
    start_state: StateId,
}

impl Grammar {
    /// Validate a table description and build the runtime representation.
    ///
    /// # Errors
    ///
    /// Any dangling id, shape mismatch, misplaced column entry, or ambiguous
    /// `(state, symbol)` pair rejects the whole artifact: a table that fails
    /// here is corrupt or produced for a different engine revision.
    pub fn new(tables: GrammarTables) -> Result<Self, GrammarError> {
        if tables.symbols.is_empty() {
            return Err(GrammarError::NoSymbols);
        }
        if tables.lex_states.is_empty() {
            return Err(GrammarError::NoLexStates);
        }
        let symbol_count = tables.symbols.len();
        if tables.token_count == 0 || usize::from(tables.token_count) > symbol_count {
            return Err(GrammarError::TokenCountOutOfRange {
                token_count: tables.token_count,
                symbol_count,
            });
        }

        let state_count = usize::from(tables.large_state_count) + tables.sparse_rows.len();
        if tables.start_state as usize >= state_count {
            return Err(GrammarError::StateOutOfRange {
                state: tables.start_state,
                context: "start state",
            });
        }
        if tables.lex_modes.len() != state_count {
            return Err(GrammarError::LexModeCountMismatch {
                expected: state_count,
                actual: tables.lex_modes.len(),
            });
        }

        let mut rodeo = lasso::Rodeo::default();
        let symbols: Vec<SymbolInfo> = tables
            .symbols
            .iter()
            .map(|spec| SymbolInfo {
                name: rodeo.get_or_intern(spec.name.as_str()),
                visible: spec.visible,
                named: spec.named,
            })
            .collect();

        let lex = Self::build_lex(&tables)?;
        let table = Self::build_table(&tables, symbol_count, state_count)?;
        let productions = Self::build_productions(&tables, symbol_count)?;

        let field_names: Vec<lasso::Spur> = tables
            .field_names
            .iter()
            .map(|name| rodeo.get_or_intern(name.as_str()))
            .collect();
        let mut field_ids = HashMap::with_hasher(RandomState::new());
        for (idx, spur) in field_names.iter().enumerate() {
            field_ids.insert(*spur, FieldId(idx as u16));
        }

        Ok(Self {
            names: rodeo.into_reader(),
            symbols,
            token_count: tables.token_count,
            lex,
            table,
            productions,
            field_names,
            field_ids,
            start_state: StateId(tables.start_state),
        })
    }

    fn build_lex(tables: &GrammarTables) -> Result<LexTable, GrammarError> {
        let lex_state_count = tables.lex_states.len();
        let mut states = Vec::with_capacity(lex_state_count);
        for spec in &tables.lex_states {
            if let Some(accept) = spec.accept {
                if usize::from(accept) >= usize::from(tables.token_count) {
                    return Err(GrammarError::SymbolOutOfRange {
                        symbol: accept,
                        context: "lex accept",
                    });
                }
            }
            let mut transitions = Vec::with_capacity(spec.transitions.len());
            for t in &spec.transitions {
                if usize::from(t.target) >= lex_state_count {
                    return Err(GrammarError::LexStateOutOfRange { lex_state: t.target });
                }
                let on = match &t.on {
                    CharSpec::Eof => CharMatch::Eof,
                    CharSpec::Ranges(ranges) => {
                        CharMatch::Ranges(ranges.iter().cloned().collect())
                    }
                };
                transitions.push(LexTransition {
                    on,
                    target: LexStateId(t.target),
                    skip: t.skip,
                });
            }
            states.push(LexState {
                accept: spec.accept.map(SymbolId),
                transitions,
            });
        }

        let mut modes = Vec::with_capacity(tables.lex_modes.len());
        for &mode in &tables.lex_modes {
            if usize::from(mode) >= lex_state_count {
                return Err(GrammarError::LexStateOutOfRange { lex_state: mode });
            }
            modes.push(LexStateId(mode));
        }
        Ok(LexTable::new(states, modes))
    }

    fn build_table(
        tables: &GrammarTables,
        symbol_count: usize,
        state_count: usize,
    ) -> Result<ActionTable, GrammarError> {
        let large = usize::from(tables.large_state_count);
        if tables.dense_rows.len() != large {
            return Err(GrammarError::DenseShapeMismatch {
                detail: "row count differs from large_state_count",
            });
        }

        let check_entry = |state: u16, symbol: u16, entry: &EntrySpec| {
            let terminal = usize::from(symbol) < usize::from(tables.token_count);
            match entry {
                EntrySpec::Goto { state: target } => {
                    if terminal {
                        return Err(GrammarError::MisplacedEntry {
                            state,
                            symbol,
                            detail: "goto in a terminal column",
                        });
                    }
                    if usize::from(*target) >= state_count {
                        return Err(GrammarError::StateOutOfRange {
                            state: *target,
                            context: "goto target",
                        });
                    }
                }
                EntrySpec::Shift { state: target, .. } => {
                    if !terminal {
                        return Err(GrammarError::MisplacedEntry {
                            state,
                            symbol,
                            detail: "shift in a non-terminal column",
                        });
                    }
                    if usize::from(*target) >= state_count {
                        return Err(GrammarError::StateOutOfRange {
                            state: *target,
                            context: "shift target",
                        });
                    }
                }
                EntrySpec::Reduce {
                    symbol: head,
                    production,
                    ..
                } => {
                    if !terminal {
                        return Err(GrammarError::MisplacedEntry {
                            state,
                            symbol,
                            detail: "reduce in a non-terminal column",
                        });
                    }
                    let head_usize = usize::from(*head);
                    if head_usize < usize::from(tables.token_count) || head_usize >= symbol_count {
                        return Err(GrammarError::SymbolOutOfRange {
                            symbol: *head,
                            context: "reduce head",
                        });
                    }
                    if usize::from(*production) >= tables.productions.len().max(1) {
                        return Err(GrammarError::SymbolOutOfRange {
                            symbol: *production,
                            context: "production id",
                        });
                    }
                }
                EntrySpec::Accept | EntrySpec::Recover => {
                    if !terminal {
                        return Err(GrammarError::MisplacedEntry {
                            state,
                            symbol,
                            detail: "action in a non-terminal column",
                        });
                    }
                }
            }
            Ok(())
        };

        let mut table = ActionTable::new(symbol_count, large);
        for (state, row) in tables.dense_rows.iter().enumerate() {
            if row.len() != symbol_count {
                return Err(GrammarError::DenseShapeMismatch {
                    detail: "row length differs from symbol count",
                });
            }
            for (symbol, slot) in row.iter().enumerate() {
                if let Some(entry) = slot {
                    check_entry(state as u16, symbol as u16, entry)?;
                    table.set_dense(state, symbol, compile_entry(entry));
                }
            }
        }

        for (row_idx, row) in tables.sparse_rows.iter().enumerate() {
            let state = (large + row_idx) as u16;
            let mut seen: HashSet<u16, RandomState> = HashSet::with_hasher(RandomState::new());
            let mut groups: Vec<(TableEntry, SmallVec<[SymbolId; 4]>)> = Vec::new();
            for (entry, symbols) in &row.groups {
                let mut ids: SmallVec<[SymbolId; 4]> = SmallVec::new();
                for &symbol in symbols {
                    if usize::from(symbol) >= symbol_count {
                        return Err(GrammarError::SymbolOutOfRange {
                            symbol,
                            context: "sparse row",
                        });
                    }
                    if !seen.insert(symbol) {
                        return Err(GrammarError::AmbiguousEntry { state, symbol });
                    }
                    check_entry(state, symbol, entry)?;
                    ids.push(SymbolId(symbol));
                }
                groups.push((compile_entry(entry), ids));
            }
            table.push_small_row(groups);
        }

        Ok(table)
    }

    fn build_productions(
        tables: &GrammarTables,
        symbol_count: usize,
    ) -> Result<Vec<Production>, GrammarError> {
        let mut productions = Vec::with_capacity(tables.productions.len());
        for spec in &tables.productions {
            for &(field, _) in &spec.fields {
                if usize::from(field) >= tables.field_names.len() {
                    return Err(GrammarError::FieldOutOfRange { field });
                }
            }
            for &(_, symbol) in &spec.aliases {
                if usize::from(symbol) >= symbol_count {
                    return Err(GrammarError::SymbolOutOfRange {
                        symbol,
                        context: "alias sequence",
                    });
                }
            }
            productions.push(Production {
                fields: spec
                    .fields
                    .iter()
                    .map(|&(field, child)| (FieldId(field), child))
                    .collect(),
                aliases: spec
                    .aliases
                    .iter()
                    .map(|&(child, symbol)| (child, SymbolId(symbol)))
                    .collect(),
            });
        }
        Ok(productions)
    }

    /// Human-readable symbol name.
    #[must_use]
    pub fn symbol_name(&self, symbol: SymbolId) -> &str {
        if symbol == SymbolId::ERROR {
            return "ERROR";
        }
        self.symbols
            .get(symbol.index())
            .map_or("?", |info| self.names.resolve(&info.name))
    }

    #[must_use]
    pub fn is_terminal(&self, symbol: SymbolId) -> bool {
        symbol.0 < self.token_count
    }

    #[must_use]
    pub fn is_visible(&self, symbol: SymbolId) -> bool {
        symbol == SymbolId::ERROR
            || self
                .symbols
                .get(symbol.index())
                .is_some_and(|info| info.visible)
    }

    #[must_use]
    pub fn is_named(&self, symbol: SymbolId) -> bool {
        symbol == SymbolId::ERROR
            || self
                .symbols
                .get(symbol.index())
                .is_some_and(|info| info.named)
    }

    /// Number of parser states (dense plus sparse).
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.table.state_count()
    }

    #[must_use]
    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// Resolve a field name to its id.
    #[must_use]
    pub fn field_id(&self, name: &str) -> Option<FieldId> {
        let spur = self.names.get(name)?;
        self.field_ids.get(&spur).copied()
    }

    #[must_use]
    pub fn field_name(&self, field: FieldId) -> &str {
        self.field_names
            .get(field.index())
            .map_or("?", |spur| self.names.resolve(spur))
    }

    pub(crate) const fn start_state(&self) -> StateId {
        self.start_state
    }

    pub(crate) fn lex_table(&self) -> &LexTable {
        &self.lex
    }

    pub(crate) fn action_table(&self) -> &ActionTable {
        &self.table
    }

    pub(crate) fn field_entries(&self, production: ProductionId) -> &[(FieldId, u16)] {
        match self.productions.get(production.index()) {
            Some(p) => &p.fields,
            None => &[],
        }
    }

    pub(crate) fn alias_entries(&self, production: ProductionId) -> &[(u16, SymbolId)] {
        match self.productions.get(production.index()) {
            Some(p) => &p.aliases,
            None => &[],
        }
    }
}

fn compile_entry(entry: &EntrySpec) -> TableEntry {
    match *entry {
        EntrySpec::Shift { state, reusable } => TableEntry::Action(Action::Shift {
            state: StateId(state),
            reusable,
        }),
        EntrySpec::Reduce {
            symbol,
            child_count,
            production,
        } => TableEntry::Action(Action::Reduce {
            symbol: SymbolId(symbol),
            child_count,
            production: ProductionId(production),
        }),
        EntrySpec::Accept => TableEntry::Action(Action::Accept),
        EntrySpec::Recover => TableEntry::Action(Action::Recover),
        EntrySpec::Goto { state } => TableEntry::Goto(StateId(state)),
    }
}

impl std::fmt::Debug for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grammar")
            .field("symbols", &self.symbols.len())
            .field("tokens", &self.token_count)
            .field("states", &self.state_count())
            .field("lex_states", &self.lex.state_count())
            .finish()
    }
}
