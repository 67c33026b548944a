//! Shared test fixture: hand-authored tables for a small arithmetic
//! language, playing the role of an external grammar compiler.
//!
//! The language: statements are either an assignment `identifier = expr` or
//! a bare expression; expressions are numbers, identifiers, unary `+`/`-`,
//! left-associative binary `+ - * / **` (with `**` binding tightest of the
//! binary operators and unary binding tighter still), and parenthesized
//! groups. Whitespace and `{...}` comments are trivia. `_statement` and
//! `_expression` are invisible and splice their children.

#![allow(dead_code)]

use std::sync::Arc;
use tabulon::grammar::{
    CharSpec, EntrySpec, GrammarTables, LexStateSpec, LexTransitionSpec, ProductionSpec,
    SparseRowSpec, SymbolSpec,
};
use tabulon::{Grammar, NodeRef, Parser};

// Terminal symbols.
pub const END: u16 = 0;
pub const PLUS: u16 = 1;
pub const MINUS: u16 = 2;
pub const STAR: u16 = 3;
pub const SLASH: u16 = 4;
pub const STAR_STAR: u16 = 5;
pub const NUMBER: u16 = 6;
pub const IDENTIFIER: u16 = 7;
pub const EQ: u16 = 8;
pub const LPAREN: u16 = 9;
pub const RPAREN: u16 = 10;
pub const TOKEN_COUNT: u16 = 11;

// Non-terminals.
pub const SOURCE_FILE: u16 = 11;
pub const STATEMENT: u16 = 12;
pub const EXPRESSION: u16 = 13;
pub const ASSIGNMENT: u16 = 14;
pub const UNARY: u16 = 15;
pub const BINARY: u16 = 16;
pub const PARENS: u16 = 17;

// Field ids.
pub const F_LHS: u16 = 0;
pub const F_OP: u16 = 1;
pub const F_RHS: u16 = 2;
pub const F_EXPR: u16 = 3;

// Production ids key field maps; one id per field shape.
pub const P_DEFAULT: u16 = 0;
pub const P_BINARY: u16 = 1;
pub const P_UNARY: u16 = 2;
pub const P_ASSIGNMENT: u16 = 3;
pub const P_PARENS: u16 = 4;

/// Lookaheads an expression can be followed by.
const FOLLOW_EXPR: [u16; 7] = [END, PLUS, MINUS, STAR, SLASH, STAR_STAR, RPAREN];

fn reduce_expr() -> EntrySpec {
    EntrySpec::reduce(EXPRESSION, 1, P_DEFAULT)
}

/// Operand-position row: shifts that start an expression, plus the gotos
/// shared by every such state. `expr_goto` is where the finished expression
/// lands.
fn operand_row(expr_goto: u16) -> SparseRowSpec {
    SparseRowSpec::default()
        .group(EntrySpec::shift(4), &[PLUS])
        .group(EntrySpec::shift(5), &[MINUS])
        .group(EntrySpec::shift(3), &[NUMBER])
        .group(EntrySpec::shift(15), &[IDENTIFIER])
        .group(EntrySpec::shift(6), &[LPAREN])
        .group(EntrySpec::goto(expr_goto), &[EXPRESSION])
        .group(EntrySpec::goto(8), &[UNARY])
        .group(EntrySpec::goto(9), &[BINARY])
        .group(EntrySpec::goto(10), &[PARENS])
}

/// Operator shifts out of a state holding a finished expression. The `*`
/// shift is flagged non-reusable: lexing `*` depends on whether `**` could
/// follow, so incremental re-parse must re-lex it.
fn operator_groups(row: SparseRowSpec) -> SparseRowSpec {
    row.group(EntrySpec::shift(20), &[PLUS, MINUS])
        .group(
            EntrySpec::Shift {
                state: 19,
                reusable: false,
            },
            &[STAR],
        )
        .group(EntrySpec::shift(19), &[SLASH])
        .group(EntrySpec::shift(21), &[STAR_STAR])
}

/// The parse-action table. States 0 and 1 are dense; 2..=26 are sparse.
///
/// State map: 0 recover row, 1 start; 2 `id` after start (assignment head or
/// expression); 3 `number`; 4/5 unary operand; 6 group operand; 7 finished
/// statement expression; 8/9/10 unit reductions; 11 assignment statement;
/// 12 finished statement; 13 accept; 14 assignment rhs operand; 15 `id` as
/// expression; 16/17 finished unary; 18 group body; 19/20/21 binary rhs
/// operand (by precedence tier); 22 finished assignment rhs; 23 closed
/// group; 24/25/26 finished binary (by precedence tier).
fn parse_table() -> (u16, Vec<Vec<Option<EntrySpec>>>, Vec<SparseRowSpec>) {
    let symbol_count = 18usize;

    let mut recover_row: Vec<Option<EntrySpec>> = vec![None; symbol_count];
    for terminal in 0..TOKEN_COUNT {
        recover_row[terminal as usize] = Some(EntrySpec::Recover);
    }

    let mut start_row: Vec<Option<EntrySpec>> = vec![None; symbol_count];
    start_row[PLUS as usize] = Some(EntrySpec::shift(4));
    start_row[MINUS as usize] = Some(EntrySpec::shift(5));
    start_row[NUMBER as usize] = Some(EntrySpec::shift(3));
    start_row[IDENTIFIER as usize] = Some(EntrySpec::shift(2));
    start_row[LPAREN as usize] = Some(EntrySpec::shift(6));
    start_row[SOURCE_FILE as usize] = Some(EntrySpec::goto(13));
    start_row[STATEMENT as usize] = Some(EntrySpec::goto(12));
    start_row[EXPRESSION as usize] = Some(EntrySpec::goto(7));
    start_row[ASSIGNMENT as usize] = Some(EntrySpec::goto(11));
    start_row[UNARY as usize] = Some(EntrySpec::goto(8));
    start_row[BINARY as usize] = Some(EntrySpec::goto(9));
    start_row[PARENS as usize] = Some(EntrySpec::goto(10));

    let sparse = vec![
        // 2: assignment head or plain identifier expression
        SparseRowSpec::default()
            .group(EntrySpec::shift(14), &[EQ])
            .group(reduce_expr(), &FOLLOW_EXPR),
        // 3: number
        SparseRowSpec::default().group(reduce_expr(), &FOLLOW_EXPR),
        // 4, 5: unary operand
        operand_row(16),
        operand_row(17),
        // 6: group operand
        operand_row(18),
        // 7: expression at statement level
        operator_groups(
            SparseRowSpec::default().group(EntrySpec::reduce(STATEMENT, 1, P_DEFAULT), &[END]),
        ),
        // 8, 9, 10: unit reductions to _expression
        SparseRowSpec::default().group(reduce_expr(), &FOLLOW_EXPR),
        SparseRowSpec::default().group(reduce_expr(), &FOLLOW_EXPR),
        SparseRowSpec::default().group(reduce_expr(), &FOLLOW_EXPR),
        // 11: assignment as statement
        SparseRowSpec::default().group(EntrySpec::reduce(STATEMENT, 1, P_DEFAULT), &[END]),
        // 12: statement as source file
        SparseRowSpec::default().group(EntrySpec::reduce(SOURCE_FILE, 1, P_DEFAULT), &[END]),
        // 13: done
        SparseRowSpec::default().group(EntrySpec::Accept, &[END]),
        // 14: assignment rhs operand
        operand_row(22),
        // 15: identifier as expression
        SparseRowSpec::default().group(reduce_expr(), &FOLLOW_EXPR),
        // 16, 17: finished unary; unary outbinds every binary operator
        SparseRowSpec::default().group(EntrySpec::reduce(UNARY, 2, P_UNARY), &FOLLOW_EXPR),
        SparseRowSpec::default().group(EntrySpec::reduce(UNARY, 2, P_UNARY), &FOLLOW_EXPR),
        // 18: group body
        operator_groups(SparseRowSpec::default().group(EntrySpec::shift(23), &[RPAREN])),
        // 19, 20, 21: binary rhs operand per precedence tier
        operand_row(24),
        operand_row(25),
        operand_row(26),
        // 22: finished assignment rhs
        operator_groups(
            SparseRowSpec::default().group(EntrySpec::reduce(ASSIGNMENT, 3, P_ASSIGNMENT), &[END]),
        ),
        // 23: closed group
        SparseRowSpec::default().group(EntrySpec::reduce(PARENS, 3, P_PARENS), &FOLLOW_EXPR),
        // 24: `*`/`/` tier: left associative, only `**` binds tighter
        SparseRowSpec::default()
            .group(EntrySpec::shift(21), &[STAR_STAR])
            .group(
                EntrySpec::reduce(BINARY, 3, P_BINARY),
                &[END, PLUS, MINUS, STAR, SLASH, RPAREN],
            ),
        // 25: `+`/`-` tier: `*`, `/`, `**` bind tighter
        SparseRowSpec::default()
            .group(
                EntrySpec::Shift {
                    state: 19,
                    reusable: false,
                },
                &[STAR],
            )
            .group(EntrySpec::shift(19), &[SLASH])
            .group(EntrySpec::shift(21), &[STAR_STAR])
            .group(
                EntrySpec::reduce(BINARY, 3, P_BINARY),
                &[END, PLUS, MINUS, RPAREN],
            ),
        // 26: `**` tier: left associative, nothing binds tighter
        SparseRowSpec::default().group(EntrySpec::reduce(BINARY, 3, P_BINARY), &FOLLOW_EXPR),
    ];

    (2, vec![recover_row, start_row], sparse)
}

/// The lexer automaton: operators, numbers, identifiers, whitespace and
/// `{...}` comments as skipped trivia, `**` via accept-and-keep-scanning.
fn lex_states() -> Vec<LexStateSpec> {
    let entry = LexStateSpec {
        accept: None,
        transitions: vec![
            LexTransitionSpec::advance(CharSpec::Eof, 1),
            LexTransitionSpec::skip(CharSpec::one_of(" \t\r\n"), 0),
            LexTransitionSpec::advance(CharSpec::char('+'), 2),
            LexTransitionSpec::advance(CharSpec::char('-'), 3),
            LexTransitionSpec::advance(CharSpec::char('*'), 4),
            LexTransitionSpec::advance(CharSpec::char('/'), 5),
            LexTransitionSpec::advance(CharSpec::char('='), 8),
            LexTransitionSpec::advance(CharSpec::char('('), 9),
            LexTransitionSpec::advance(CharSpec::char(')'), 10),
            LexTransitionSpec::advance(CharSpec::char('{'), 11),
            LexTransitionSpec::advance(CharSpec::range('0', '9'), 7),
            LexTransitionSpec::advance(
                CharSpec::Ranges(vec!['a'..='z', '_'..='_']),
                12,
            ),
        ],
    };
    let accept = |symbol: u16, transitions: Vec<LexTransitionSpec>| LexStateSpec {
        accept: Some(symbol),
        transitions,
    };
    vec![
        entry,
        accept(END, vec![]),
        accept(PLUS, vec![]),
        accept(MINUS, vec![]),
        // `*` alone is one token, but a second `*` upgrades it to `**`.
        accept(STAR, vec![LexTransitionSpec::advance(CharSpec::char('*'), 6)]),
        accept(SLASH, vec![]),
        accept(STAR_STAR, vec![]),
        accept(
            NUMBER,
            vec![LexTransitionSpec::advance(CharSpec::range('0', '9'), 7)],
        ),
        accept(EQ, vec![]),
        accept(LPAREN, vec![]),
        accept(RPAREN, vec![]),
        // Comment body: everything up to the closing brace is discarded.
        LexStateSpec {
            accept: None,
            transitions: vec![
                LexTransitionSpec::skip(CharSpec::char('}'), 0),
                LexTransitionSpec::advance(
                    CharSpec::Ranges(vec!['\u{0}'..='|', '~'..='\u{10FFFF}']),
                    11,
                ),
            ],
        },
        accept(
            IDENTIFIER,
            vec![LexTransitionSpec::advance(
                CharSpec::Ranges(vec!['a'..='z', '_'..='_']),
                12,
            )],
        ),
    ]
}

/// The full table artifact for the arithmetic language.
pub fn arith_tables() -> GrammarTables {
    let (large_state_count, dense_rows, sparse_rows) = parse_table();
    let state_count = usize::from(large_state_count) + sparse_rows.len();
    GrammarTables {
        symbols: vec![
            SymbolSpec::hidden("end"),
            SymbolSpec::anonymous("+"),
            SymbolSpec::anonymous("-"),
            SymbolSpec::anonymous("*"),
            SymbolSpec::anonymous("/"),
            SymbolSpec::anonymous("**"),
            SymbolSpec::named("number"),
            SymbolSpec::named("identifier"),
            SymbolSpec::anonymous("="),
            SymbolSpec::anonymous("("),
            SymbolSpec::anonymous(")"),
            SymbolSpec::named("source_file"),
            SymbolSpec::hidden("_statement"),
            SymbolSpec::hidden("_expression"),
            SymbolSpec::named("assignment"),
            SymbolSpec::named("unary_expression"),
            SymbolSpec::named("binary_expression"),
            SymbolSpec::named("parentheses_expression"),
        ],
        token_count: TOKEN_COUNT,
        lex_states: lex_states(),
        lex_modes: vec![0; state_count],
        large_state_count,
        dense_rows,
        sparse_rows,
        productions: vec![
            ProductionSpec::default(),
            ProductionSpec::default()
                .field(F_LHS, 0)
                .field(F_OP, 1)
                .field(F_RHS, 2),
            ProductionSpec::default().field(F_OP, 0).field(F_EXPR, 1),
            ProductionSpec::default().field(F_LHS, 0).field(F_RHS, 2),
            ProductionSpec::default().field(F_EXPR, 1),
        ],
        field_names: vec!["lhs".into(), "op".into(), "rhs".into(), "expr".into()],
        start_state: 1,
    }
}

pub fn arith_grammar() -> Arc<Grammar> {
    Arc::new(Grammar::new(arith_tables()).expect("fixture tables are valid"))
}

pub fn arith_parser() -> Parser {
    Parser::new(arith_grammar())
}

/// Recursively compare two trees: kinds, spans, field annotations, error
/// markers. The incremental-equivalence property is checked with this.
pub fn assert_trees_identical(a: NodeRef<'_>, b: NodeRef<'_>) {
    assert_eq!(a.kind(), b.kind(), "kind mismatch at {}", a.range());
    assert_eq!(a.range(), b.range(), "range mismatch at {}", a.kind());
    assert_eq!(a.is_error(), b.is_error(), "error flag mismatch at {}", a.range());
    assert_eq!(
        a.child_count(),
        b.child_count(),
        "arity mismatch at {} {}",
        a.kind(),
        a.range()
    );
    for i in 0..a.child_count() {
        assert_eq!(
            a.field_for_child(i),
            b.field_for_child(i),
            "field mismatch at child {i} of {}",
            a.kind()
        );
        assert_trees_identical(a.child(i).unwrap(), b.child(i).unwrap());
    }
}
