//! Evaluate sums by walking the syntax tree.
//!
//! The tables here play the part of an external grammar compiler's output:
//! a left-associative `sum -> sum "+" number | number` grammar with
//! `lhs`/`rhs` fields on the binary production.

use std::sync::Arc;
use tabulon::grammar::{
    CharSpec, EntrySpec, GrammarTables, LexStateSpec, LexTransitionSpec, ProductionSpec,
    SparseRowSpec, SymbolSpec,
};
use tabulon::{Grammar, NodeRef, Parser};

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

fn eval(node: NodeRef<'_>) -> f64 {
    match node.kind() {
        "number" => node.text().parse().unwrap_or(0.0),
        "sum" => {
            if let (Some(lhs), Some(rhs)) = (node.child_by_field("lhs"), node.child_by_field("rhs"))
            {
                eval(lhs) + eval(rhs)
            } else {
                // Unit production: a sum wrapping a single number.
                node.child(0).map_or(0.0, eval)
            }
        }
        _ => 0.0,
    }
}

fn main() {
    let grammar = Arc::new(Grammar::new(sum_tables()).expect("valid tables"));
    let parser = Parser::new(grammar);

    for input in ["1+2", "10 + 20 + 12", "7"] {
        let result = parser.parse(input).expect("no table faults");
        println!("{input} = {}", eval(result.tree.root()));
        println!("  tree: {}", result.tree.root().to_sexp());
    }
}
