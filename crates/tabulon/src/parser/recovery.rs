//! Bounded error recovery: resynchronize past malformed input instead of
//! aborting.
//!
//! Entered when the action table has no entry for the current
//! `(state, lookahead)` pair, or holds an explicit `Recover` action. The
//! controller alternates two moves until one yields a state with a valid
//! action or the budget runs out:
//!
//! - discard the lookahead (and any unlexable bytes) into a pending error
//!   span and lex a fresh token;
//! - pop stack entries, abandoning partially built subtrees, until an
//!   enclosing state accepts the lookahead.
//!
//! Either way the damage is wrapped in an ERROR node attached as an extra
//! child of the nearest enclosing stack entry, so accepted structure outside
//! the error span survives untouched.

use crate::error::{ParseError, ParseMetrics};
use crate::grammar::{Action, Grammar, SymbolId, TableEntry};
use crate::lexer;
use crate::parser::{Lookahead, ParseConfig, StackEntry};
use crate::syntax::{LeafInfo, Node, TextRange, TextSize};
use std::sync::Arc;

pub(super) enum Outcome {
    /// The lookahead is now valid in the top state; parsing continues.
    Resumed,
    /// Budget exhausted: the caller wraps the remaining input and finishes
    /// with the partial tree.
    Exhausted {
        skipped: Vec<Arc<Node>>,
        span: Option<TextRange>,
    },
}

/// True when the state holds a real action for the symbol (`Recover`
/// entries mark error rows and do not count as resynchronization targets).
fn resynchronizes(grammar: &Grammar, state: crate::grammar::StateId, symbol: SymbolId) -> bool {
    matches!(
        grammar.action_table().entry(state, symbol),
        Some(TableEntry::Action(action)) if !matches!(action, Action::Recover)
    )
}

#[allow(clippy::too_many_arguments)]
pub(super) fn recover(
    grammar: &Grammar,
    config: &ParseConfig,
    text: &str,
    stack: &mut Vec<StackEntry>,
    pos: &mut TextSize,
    lookahead: &mut Option<Lookahead>,
    errors: &mut Vec<ParseError>,
    metrics: &mut ParseMetrics,
) -> Outcome {
    metrics.recoveries += 1;
    let mut skipped: Vec<Arc<Node>> = Vec::new();
    let mut span: Option<TextRange> = None;
    let mut tokens_skipped = 0usize;

    loop {
        let top_state = stack.last().map_or(grammar.start_state(), |e| e.state);

        if let Some(Lookahead::Token(lexeme, _)) = lookahead {
            // Cheapest resynchronization: the current state accepts the
            // token once the junk before it is set aside.
            if resynchronizes(grammar, top_state, lexeme.symbol) {
                if let Some(span) = span {
                    attach_error(stack, span, std::mem::take(&mut skipped), errors);
                }
                return Outcome::Resumed;
            }

            // Otherwise unwind: find an enclosing state that accepts it.
            let max_depth = config.max_pops.min(stack.len().saturating_sub(1));
            for depth in 1..=max_depth {
                let candidate = stack[stack.len() - 1 - depth].state;
                if !resynchronizes(grammar, candidate, lexeme.symbol) {
                    continue;
                }
                let mut children: Vec<Arc<Node>> = stack
                    .split_off(stack.len() - depth)
                    .into_iter()
                    .flat_map(|entry| entry.nodes)
                    .collect();
                let mut range = span;
                for child in &children {
                    let covered = range.map_or(child.range(), |r| r.cover(child.range()));
                    range = Some(covered);
                }
                children.append(&mut skipped);
                children.sort_by_key(|n| n.range().start());
                let range = range.unwrap_or_else(|| TextRange::empty(lexeme.padded_start));
                attach_error(stack, range, children, errors);
                return Outcome::Resumed;
            }
        }

        // Nothing accepts the lookahead: discard it and lex again.
        if tokens_skipped >= config.max_skipped_tokens {
            errors.push(ParseError::Malformed {
                offset: *pos,
                state: top_state,
            });
            return Outcome::Exhausted { skipped, span };
        }

        match lookahead.take() {
            Some(Lookahead::Token(lexeme, _)) => {
                if lexeme.symbol == SymbolId::END {
                    // End of input cannot be skipped.
                    errors.push(ParseError::Malformed {
                        offset: *pos,
                        state: top_state,
                    });
                    return Outcome::Exhausted { skipped, span };
                }
                let leaf = Node::leaf(
                    lexeme.symbol,
                    lexeme.range,
                    lexeme.range.start() - lexeme.padded_start,
                    LeafInfo {
                        lex_state: lexeme.lex_state,
                        reusable: false,
                        lookahead: lexeme.lookahead,
                    },
                );
                skipped.push(leaf);
                span = Some(span.map_or(lexeme.range, |s| s.cover(lexeme.range)));
                *pos = lexeme.range.end();
            }
            Some(Lookahead::Unlexable { offset, len }) => {
                if len == TextSize::zero() {
                    // No progress is possible (corrupt end-of-input row).
                    errors.push(ParseError::Malformed {
                        offset: *pos,
                        state: top_state,
                    });
                    return Outcome::Exhausted { skipped, span };
                }
                let bad = TextRange::at(offset, len);
                span = Some(span.map_or(bad, |s| s.cover(bad)));
                *pos = bad.end();
            }
            None => unreachable!("recovery entered without a lookahead"),
        }
        tokens_skipped += 1;

        let mode = grammar.lex_table().mode(top_state);
        *lookahead = Some(match lexer::next_token(grammar, text, *pos, mode) {
            Ok(lexeme) => Lookahead::Token(lexeme, None),
            Err(no_match) => {
                let len = text[no_match.offset.as_usize()..]
                    .chars()
                    .next()
                    .map_or(TextSize::zero(), |c| TextSize::of_len(c.len_utf8()));
                // Trivia before the failure is consumed with it.
                *pos = no_match.offset;
                Lookahead::Unlexable {
                    offset: no_match.offset,
                    len,
                }
            }
        });
    }
}

/// Wrap damage into an ERROR node on the nearest enclosing stack entry; a
/// later reduce collects it as an extra child.
fn attach_error(
    stack: &mut [StackEntry],
    span: TextRange,
    children: Vec<Arc<Node>>,
    errors: &mut Vec<ParseError>,
) {
    let node = Node::error(span, children);
    errors.push(ParseError::SkippedText { span });
    if let Some(top) = stack.last_mut() {
        top.nodes.push(node);
    }
}
