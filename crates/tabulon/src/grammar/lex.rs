use crate::grammar::{LexStateId, StateId, SymbolId};
use smallvec::SmallVec;
use std::ops::RangeInclusive;

/// What a compiled lexer transition matches.
#[derive(Debug, Clone)]
pub(crate) enum CharMatch {
    Eof,
    Ranges(SmallVec<[RangeInclusive<char>; 2]>),
}

impl CharMatch {
    /// `ch` is `None` at end of input.
    pub(crate) fn matches(&self, ch: Option<char>) -> bool {
        match (self, ch) {
            (Self::Eof, None) => true,
            (Self::Ranges(ranges), Some(c)) => ranges.iter().any(|r| r.contains(&c)),
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct LexTransition {
    pub(crate) on: CharMatch,
    pub(crate) target: LexStateId,
    pub(crate) skip: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct LexState {
    pub(crate) accept: Option<SymbolId>,
    /// Checked in priority order; the first match wins.
    pub(crate) transitions: Vec<LexTransition>,
}

impl LexState {
    pub(crate) fn step(&self, ch: Option<char>) -> Option<&LexTransition> {
        self.transitions.iter().find(|t| t.on.matches(ch))
    }
}

/// The compiled lexer automaton plus the per-parser-state mode table.
#[derive(Debug, Clone)]
pub(crate) struct LexTable {
    pub(crate) states: Vec<LexState>,
    modes: Vec<LexStateId>,
}

impl LexTable {
    pub(crate) fn new(states: Vec<LexState>, modes: Vec<LexStateId>) -> Self {
        Self { states, modes }
    }

    /// Entry lex state for a parser state.
    pub(crate) fn mode(&self, state: StateId) -> LexStateId {
        self.modes[state.index()]
    }

    pub(crate) fn state(&self, id: LexStateId) -> &LexState {
        &self.states[id.index()]
    }

    pub(crate) fn state_count(&self) -> usize {
        self.states.len()
    }
}
