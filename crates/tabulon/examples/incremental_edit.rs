//! Re-parse after an edit, reusing tokens the edit did not touch.

use std::sync::Arc;
use tabulon::grammar::{
    CharSpec, EntrySpec, GrammarTables, LexStateSpec, LexTransitionSpec, ProductionSpec,
    SparseRowSpec, SymbolSpec,
};
use tabulon::{Edit, Grammar, Parser, TextRange, TextSize};

const PLUS: u16 = 1;
const NUMBER: u16 = 2;
const SUM: u16 = 3;

fn sum_tables() -> GrammarTables {
    GrammarTables {
        symbols: vec![
            SymbolSpec::hidden("end"),
            SymbolSpec::anonymous("+"),
            SymbolSpec::named("number"),
            SymbolSpec::named("sum"),
        ],
        token_count: 3,
        lex_states: vec![
            LexStateSpec {
                accept: None,
                transitions: vec![
                    LexTransitionSpec::advance(CharSpec::Eof, 1),
                    LexTransitionSpec::skip(CharSpec::one_of(" \t\n"), 0),
                    LexTransitionSpec::advance(CharSpec::char('+'), 2),
                    LexTransitionSpec::advance(CharSpec::range('0', '9'), 3),
                ],
            },
            LexStateSpec {
                accept: Some(0),
                transitions: vec![],
            },
            LexStateSpec {
                accept: Some(PLUS),
                transitions: vec![],
            },
            LexStateSpec {
                accept: Some(NUMBER),
                transitions: vec![LexTransitionSpec::advance(CharSpec::range('0', '9'), 3)],
            },
        ],
        lex_modes: vec![0; 5],
        large_state_count: 0,
        dense_rows: vec![],
        sparse_rows: vec![
            SparseRowSpec::default()
                .group(EntrySpec::shift(1), &[NUMBER])
                .group(EntrySpec::goto(2), &[SUM]),
            SparseRowSpec::default().group(EntrySpec::reduce(SUM, 1, 0), &[0, PLUS]),
            SparseRowSpec::default()
                .group(EntrySpec::Accept, &[0])
                .group(EntrySpec::shift(3), &[PLUS]),
            SparseRowSpec::default().group(EntrySpec::shift(4), &[NUMBER]),
            SparseRowSpec::default().group(EntrySpec::reduce(SUM, 3, 1), &[0, PLUS]),
        ],
        productions: vec![
            ProductionSpec::default(),
            ProductionSpec::default().field(0, 0).field(1, 2),
        ],
        field_names: vec!["lhs".into(), "rhs".into()],
        start_state: 0,
    }
}

fn main() {
    let grammar = Arc::new(Grammar::new(sum_tables()).expect("valid tables"));
    let parser = Parser::new(grammar);

    let before = "1+2+3+4+5";
    let first = parser.parse(before).expect("no table faults");
    println!("parsed   {before:?}");
    println!("  {}", first.tree.root().to_sexp());

    // Replace the middle "3" with "42".
    let after = "1+2+42+4+5";
    let edit = Edit::replace(
        TextRange::at(TextSize::new(4), TextSize::new(1)),
        TextSize::new(2),
    );
    let second = parser
        .reparse(&first.tree, &[edit], after)
        .expect("no table faults");

    println!("reparsed {after:?}");
    println!("  {}", second.tree.root().to_sexp());
    println!(
        "  tokens: {} consumed, {} reused from the old tree",
        second.metrics.tokens_consumed, second.metrics.tokens_reused
    );
}
