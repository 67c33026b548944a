#[cfg(feature = "serialize")]
use serde::{Deserialize, Serialize};

/// Identifier of a terminal or non-terminal symbol.
///
/// Symbol 0 is the reserved end-of-input terminal. [`SymbolId::ERROR`] is an
/// out-of-band id naming ERROR nodes; it never appears in a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct SymbolId(pub u16);

impl SymbolId {
    pub const END: Self = Self(0);
    pub const ERROR: Self = Self(u16::MAX);

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Row index in the parse-action table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct StateId(pub u16);

impl StateId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// State of the lexer automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct LexStateId(pub u16);

impl LexStateId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier of a production, keying its field map and alias sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct ProductionId(pub u16);

impl ProductionId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier of a field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(Serialize, Deserialize))]
pub struct FieldId(pub u16);

impl FieldId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}
