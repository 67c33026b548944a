//! The shift/reduce stack machine.
//!
//! Drives the action table over the token stream: shifts build leaves,
//! reduces build interior nodes (resolving fields and aliases as they go),
//! and the final accept re-roots the single remaining node over the whole
//! input. Recovery handles every `(state, lookahead)` pair the table has no
//! answer for; only an internally inconsistent table aborts the parse.

mod fields;
mod recovery;

use crate::error::{ParseError, ParseFault, ParseMetrics, ParseResult};
use crate::grammar::{Action, FieldId, Grammar, StateId, SymbolId, TableEntry};
use crate::incremental::{Edit, ReuseStream};
use crate::lexer::{self, Lexeme};
use crate::syntax::{LeafInfo, Node, TextRange, TextSize, Tree};
use smallvec::{smallvec, SmallVec};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Tuning knobs for one parser instance.
#[derive(Debug, Clone)]
pub struct ParseConfig {
    /// Recovery: tokens (or unlexable characters) discarded per session
    /// before giving up.
    pub max_skipped_tokens: usize,
    /// Recovery: stack entries unwound per resynchronization attempt.
    pub max_pops: usize,
    /// Advisory time budget, checked only between steps; a single
    /// lex/shift/reduce step is never interrupted.
    pub timeout: Option<Duration>,
    /// Cooperative cancellation flag, checked only between steps.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            max_skipped_tokens: 32,
            max_pops: 16,
            timeout: None,
            cancel: None,
        }
    }
}

/// One stack slot: the automaton state plus the nodes built at this
/// position. Shifts and reduces contribute exactly one node; error nodes
/// ride along as extras until a reduce collects them.
pub(crate) struct StackEntry {
    pub(crate) state: StateId,
    pub(crate) nodes: SmallVec<[Arc<Node>; 2]>,
}

/// The token under consideration, not yet consumed.
pub(crate) enum Lookahead {
    /// A lexed token; the node is present when it came from the reuse
    /// stream, already relocated to its post-edit position.
    Token(Lexeme, Option<Arc<Node>>),
    /// Input the lexer could not match; handled entirely by recovery.
    Unlexable { offset: TextSize, len: TextSize },
}

/// A parser for one loaded grammar.
///
/// Holds no parse state of its own: `parse` borrows the shared grammar and
/// keeps everything else on the call stack, so one parser (or one grammar
/// behind several parsers) can serve concurrent parses on separate threads.
pub struct Parser {
    grammar: Arc<Grammar>,
    config: ParseConfig,
}

impl Parser {
    #[must_use]
    pub fn new(grammar: Arc<Grammar>) -> Self {
        Self {
            grammar,
            config: ParseConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(grammar: Arc<Grammar>, config: ParseConfig) -> Self {
        Self { grammar, config }
    }

    #[must_use]
    pub fn grammar(&self) -> &Arc<Grammar> {
        &self.grammar
    }

    /// Parse `text` from scratch.
    ///
    /// # Errors
    ///
    /// Only fatal conditions: an inconsistent table, cancellation, or the
    /// advisory timeout. Malformed *input* is not an error here; the result
    /// carries a tree with ERROR nodes and `has_errors()` set.
    pub fn parse(&self, text: &str) -> Result<ParseResult, ParseFault> {
        self.run(text, ReuseStream::empty())
    }

    /// Re-parse `text` after `edits` were applied to the text `old` was
    /// produced from, reusing unaffected tokens from the old tree.
    ///
    /// Produces a tree structurally identical to `parse(text)`.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Parser::parse`].
    pub fn reparse(
        &self,
        old: &Tree,
        edits: &[Edit],
        text: &str,
    ) -> Result<ParseResult, ParseFault> {
        self.run(text, ReuseStream::from_tree(old, edits))
    }

    fn run(&self, text: &str, mut reuse: ReuseStream) -> Result<ParseResult, ParseFault> {
        let grammar = &*self.grammar;
        let table = grammar.action_table();
        let lex = grammar.lex_table();
        let text_len = TextSize::of_len(text.len());
        let full_range = TextRange::new(TextSize::zero(), text_len);

        let started = Instant::now();
        let deadline = self.config.timeout.map(|t| started + t);
        let mut metrics = ParseMetrics::default();
        let mut errors: Vec<ParseError> = Vec::new();

        let mut stack: Vec<StackEntry> = vec![StackEntry {
            state: grammar.start_state(),
            nodes: SmallVec::new(),
        }];
        let mut pos = TextSize::zero();
        let mut lookahead: Option<Lookahead> = None;

        let root = loop {
            if let Some(cancel) = &self.config.cancel {
                if cancel.load(Ordering::Relaxed) {
                    return Err(ParseFault::Cancelled);
                }
            }
            if deadline.is_some_and(|d| Instant::now() > d) {
                return Err(ParseFault::TimedOut);
            }

            let state = stack.last().map_or(grammar.start_state(), |e| e.state);
            let mode = lex.mode(state);

            // A context change after a reduce invalidates a cached token:
            // the new state may lex the same input differently.
            let stale = matches!(
                &lookahead,
                Some(Lookahead::Token(lexeme, _)) if lexeme.lex_state != mode
            );
            if stale {
                lookahead = None;
            }
            if lookahead.is_none() {
                lookahead = Some(self.fetch(text, pos, mode, state, &mut reuse));
            }

            let entry = match lookahead.as_ref() {
                Some(Lookahead::Token(lexeme, _)) => table.entry(state, lexeme.symbol),
                Some(Lookahead::Unlexable { .. }) => None,
                None => unreachable!(),
            };

            match entry {
                Some(TableEntry::Action(Action::Shift {
                    state: target,
                    reusable,
                })) => {
                    let Some(Lookahead::Token(lexeme, cached)) = lookahead.take() else {
                        unreachable!()
                    };
                    metrics.tokens_consumed += 1;
                    let node = match cached {
                        Some(node) => {
                            metrics.tokens_reused += 1;
                            node
                        }
                        None => {
                            metrics.nodes_created += 1;
                            Node::leaf(
                                lexeme.symbol,
                                lexeme.range,
                                lexeme.range.start() - lexeme.padded_start,
                                LeafInfo {
                                    lex_state: lexeme.lex_state,
                                    reusable,
                                    lookahead: lexeme.lookahead,
                                },
                            )
                        }
                    };
                    pos = lexeme.range.end();
                    stack.push(StackEntry {
                        state: target,
                        nodes: smallvec![node],
                    });
                }

                Some(TableEntry::Action(Action::Reduce {
                    symbol,
                    child_count,
                    production,
                })) => {
                    // The lookahead is re-examined against the post-reduce
                    // state; input does not advance.
                    self.reduce(
                        &mut stack,
                        symbol,
                        child_count,
                        production,
                        pos,
                        &mut metrics,
                    )?;
                }

                Some(TableEntry::Action(Action::Accept)) => {
                    let nodes: Vec<Arc<Node>> = stack
                        .drain(..)
                        .flat_map(|entry| entry.nodes.into_iter())
                        .collect();
                    break assemble_root(nodes, full_range);
                }

                Some(TableEntry::Action(Action::Recover)) | None => {
                    match recovery::recover(
                        grammar,
                        &self.config,
                        text,
                        &mut stack,
                        &mut pos,
                        &mut lookahead,
                        &mut errors,
                        &mut metrics,
                    ) {
                        recovery::Outcome::Resumed => {}
                        recovery::Outcome::Exhausted { skipped, span } => {
                            let error_start = span.map_or(pos, TextRange::start);
                            let tail = TextRange::new(error_start.min(text_len), text_len);
                            let mut nodes: Vec<Arc<Node>> = stack
                                .drain(..)
                                .flat_map(|entry| entry.nodes.into_iter())
                                .collect();
                            if !tail.is_empty() || !skipped.is_empty() {
                                nodes.push(Node::error(tail, skipped));
                            }
                            break assemble_root(nodes, full_range);
                        }
                    }
                }

                Some(TableEntry::Goto(_)) => {
                    let symbol = match lookahead.as_ref() {
                        Some(Lookahead::Token(lexeme, _)) => lexeme.symbol,
                        _ => SymbolId::ERROR,
                    };
                    return Err(ParseFault::TableInconsistency {
                        state,
                        symbol,
                        detail: "goto entry in place of an action",
                    });
                }
            }
        };

        metrics.parse_time = started.elapsed();
        let tree = Tree::new(
            Arc::clone(&self.grammar),
            Arc::from(text),
            root,
        );
        Ok(ParseResult {
            tree,
            errors,
            metrics,
        })
    }

    fn fetch(
        &self,
        text: &str,
        pos: TextSize,
        mode: crate::grammar::LexStateId,
        state: StateId,
        reuse: &mut ReuseStream,
    ) -> Lookahead {
        let table = self.grammar.action_table();
        let reusable_here = |symbol: SymbolId| {
            !matches!(
                table.entry(state, symbol),
                None | Some(TableEntry::Goto(_))
                    | Some(TableEntry::Action(Action::Shift {
                        reusable: false,
                        ..
                    }))
            )
        };
        if let Some((lexeme, node)) = reuse.take(pos, mode, reusable_here) {
            return Lookahead::Token(lexeme, Some(node));
        }
        match lexer::next_token(&self.grammar, text, pos, mode) {
            Ok(lexeme) => Lookahead::Token(lexeme, None),
            Err(no_match) => {
                let len = text[no_match.offset.as_usize()..]
                    .chars()
                    .next()
                    .map_or(TextSize::zero(), |c| TextSize::of_len(c.len_utf8()));
                Lookahead::Unlexable {
                    offset: no_match.offset,
                    len,
                }
            }
        }
    }

    fn reduce(
        &self,
        stack: &mut Vec<StackEntry>,
        symbol: SymbolId,
        child_count: u16,
        production: crate::grammar::ProductionId,
        pos: TextSize,
        metrics: &mut ParseMetrics,
    ) -> Result<(), ParseFault> {
        let grammar = &*self.grammar;
        let table = grammar.action_table();
        let count = usize::from(child_count);
        if count > stack.len().saturating_sub(1) {
            return Err(ParseFault::TableInconsistency {
                state: stack.last().map_or(grammar.start_state(), |e| e.state),
                symbol,
                detail: "reduce pops more entries than the stack holds",
            });
        }

        let mut children: Vec<Arc<Node>> = stack
            .split_off(stack.len() - count)
            .into_iter()
            .flat_map(|entry| entry.nodes.into_iter())
            .collect();

        let exposed = stack.last().map_or(grammar.start_state(), |e| e.state);
        let target = match table.entry(exposed, symbol) {
            Some(TableEntry::Goto(state)) => state,
            Some(TableEntry::Action(_)) => {
                return Err(ParseFault::TableInconsistency {
                    state: exposed,
                    symbol,
                    detail: "action entry in place of a goto",
                })
            }
            None => {
                return Err(ParseFault::TableInconsistency {
                    state: exposed,
                    symbol,
                    detail: "missing goto after reduce",
                })
            }
        };

        let nodes: SmallVec<[Arc<Node>; 2]> = if grammar.is_visible(symbol) {
            let range = children
                .iter()
                .map(|c| c.range())
                .reduce(TextRange::cover)
                .unwrap_or_else(|| TextRange::empty(pos));
            let field_map = fields::attach(grammar, production, &mut children);
            metrics.nodes_created += 1;
            smallvec![Node::interior(symbol, range, children, field_map)]
        } else {
            // Invisible head: the children splice into the enclosing node.
            children.into_iter().collect()
        };
        stack.push(StackEntry {
            state: target,
            nodes,
        });
        Ok(())
    }
}

/// Build the root from whatever the stack yielded: the accepted node
/// stretched over the full input, with any recovery extras merged in by
/// position, or an ERROR root when nothing was accepted.
fn assemble_root(nodes: Vec<Arc<Node>>, full_range: TextRange) -> Arc<Node> {
    let principal_count = nodes.iter().filter(|n| !n.is_error()).count();
    if principal_count == 1 {
        let mut extras: Vec<Arc<Node>> = Vec::new();
        let mut principal: Option<Arc<Node>> = None;
        for node in nodes {
            if node.is_error() {
                extras.push(node);
            } else {
                principal = Some(node);
            }
        }
        let principal = principal.expect("counted above");
        if extras.is_empty() {
            return Node::with_range(&principal, full_range);
        }
        return merge_extras(&principal, extras, full_range);
    }
    Node::error(full_range, nodes)
}

/// Re-root `principal` with the error extras inserted among its children in
/// document order, remapping field indices to the new positions.
fn merge_extras(
    principal: &Arc<Node>,
    extras: Vec<Arc<Node>>,
    full_range: TextRange,
) -> Arc<Node> {
    let mut tagged: Vec<(Option<u16>, Arc<Node>)> = principal
        .children()
        .iter()
        .enumerate()
        .map(|(i, child)| (Some(i as u16), Arc::clone(child)))
        .collect();
    tagged.extend(extras.into_iter().map(|extra| (None, extra)));
    tagged.sort_by_key(|(_, node)| node.range().start());

    let remap: Vec<(u16, u16)> = tagged
        .iter()
        .enumerate()
        .filter_map(|(new, (old, _))| old.map(|old| (old, new as u16)))
        .collect();
    let field_map: Box<[(FieldId, u16)]> = principal
        .fields()
        .iter()
        .filter_map(|&(field, old)| {
            remap
                .iter()
                .find(|(o, _)| *o == old)
                .map(|&(_, new)| (field, new))
        })
        .collect();

    let children: Vec<Arc<Node>> = tagged.into_iter().map(|(_, node)| node).collect();
    Node::interior(principal.symbol(), full_range, children, field_map)
}
