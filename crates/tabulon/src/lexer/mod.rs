//! The lexer automaton driver.
//!
//! Interprets compiled per-state character-dispatch rows to produce one
//! token at a time. The driver is a pure function over the grammar's lex
//! table and the input text; all tokenization behavior, including trivia
//! skipping and the end-of-input terminal, comes from the table.

use crate::grammar::{Grammar, LexStateId, SymbolId};
use crate::syntax::{TextRange, TextSize};

/// One lexed token, before the parser turns it into a leaf node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Lexeme {
    pub(crate) symbol: SymbolId,
    /// Where lexing began: the content start minus any skipped trivia.
    pub(crate) padded_start: TextSize,
    /// Content range of the token text.
    pub(crate) range: TextRange,
    /// The entry lex state the token was produced in.
    pub(crate) lex_state: LexStateId,
    /// Bytes examined beyond `range.end()` while hunting for a longer match
    /// (including the character that terminated the walk). An edit inside
    /// this window invalidates the token for incremental reuse.
    pub(crate) lookahead: TextSize,
}

/// No transition accepted and no accepting state was reached.
///
/// Always converted into a recovery step by the parser; never surfaced raw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NoMatch {
    /// Start of the failed token (after any skipped trivia).
    pub(crate) offset: TextSize,
}

/// Run the automaton from `start` in the given lex state.
///
/// Maximal munch: acceptance is recorded on entering an accepting state and
/// overridden by any later acceptance reached by advancing further. Skip
/// transitions discard the accumulated span (whitespace and other token-free
/// input) and restart the token after it. End-of-input is a distinguished
/// pseudo-character that can drive transitions like any other; the reserved
/// end terminal (symbol 0) is produced through the table, not special-cased.
pub(crate) fn next_token(
    grammar: &Grammar,
    text: &str,
    start: TextSize,
    mode: LexStateId,
) -> Result<Lexeme, NoMatch> {
    let lex = grammar.lex_table();
    let mut pos = start.as_usize();
    let mut token_start = pos;
    let mut state = mode;
    let mut best: Option<(SymbolId, usize)> = None;
    let mut examined_end = pos;
    // Bounds the EOF transition chain; a well-formed table terminates in one
    // hop, a corrupt one must not hang the parse.
    let mut eof_hops = 0usize;

    loop {
        let row = lex.state(state);
        if let Some(symbol) = row.accept {
            best = Some((symbol, pos));
        }

        let ch = text[pos..].chars().next();
        examined_end = pos + ch.map_or(0, char::len_utf8);

        let Some(transition) = row.step(ch) else {
            break;
        };
        match ch {
            Some(c) => {
                pos += c.len_utf8();
            }
            None => {
                eof_hops += 1;
                if eof_hops > lex.state_count() {
                    break;
                }
            }
        }
        if transition.skip {
            token_start = pos;
            best = None;
        }
        state = transition.target;
    }

    match best {
        // A zero-length match is only meaningful for the end terminal;
        // anywhere else it cannot make progress and reads as no match.
        Some((symbol, end)) if end > token_start || symbol == SymbolId::END => Ok(Lexeme {
            symbol,
            padded_start: start,
            range: TextRange::new(TextSize::of_len(token_start), TextSize::of_len(end)),
            lex_state: mode,
            lookahead: TextSize::of_len(examined_end) - TextSize::of_len(end),
        }),
        _ => Err(NoMatch {
            offset: TextSize::of_len(token_start),
        }),
    }
}
