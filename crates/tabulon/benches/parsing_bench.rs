//! Parse and re-parse throughput over a hand-authored sum grammar.

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use std::sync::Arc;
use tabulon::grammar::{
    CharSpec, EntrySpec, GrammarTables, LexStateSpec, LexTransitionSpec, ProductionSpec,
    SparseRowSpec, SymbolSpec,
};
use tabulon::{Edit, Grammar, Parser, TextRange, TextSize};

const PLUS: u16 = 1;
const NUMBER: u16 = 2;
const SUM: u16 = 3;

/// `sum -> sum "+" number | number`, left associative.
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

fn long_sum(terms: usize) -> String {
    let mut text = String::from("1");
    for i in 0..terms {
        text.push('+');
        text.push_str(&(i % 100).to_string());
    }
    text
}

fn bench_parse(c: &mut Criterion) {
    let parser = Parser::new(Arc::new(Grammar::new(sum_tables()).unwrap()));
    let text = long_sum(500);

    c.bench_function("parse_500_terms", |b| {
        b.iter(|| {
            let result = parser.parse(black_box(&text)).unwrap();
            black_box(result.tree);
        });
    });
}

fn bench_reparse(c: &mut Criterion) {
    let parser = Parser::new(Arc::new(Grammar::new(sum_tables()).unwrap()));
    let text = long_sum(500);
    let old = parser.parse(&text).unwrap();

    // Replace one digit in the middle.
    let offset = text.len() / 2;
    let offset = (offset..).find(|&i| text.as_bytes()[i].is_ascii_digit()).unwrap();
    let mut edited = text.clone();
    edited.replace_range(offset..=offset, "7");
    let edit = Edit::replace(
        TextRange::at(TextSize::of_len(offset), TextSize::new(1)),
        TextSize::new(1),
    );

    c.bench_function("reparse_after_one_digit_edit", |b| {
        b.iter(|| {
            let result = parser
                .reparse(black_box(&old.tree), &[edit], black_box(&edited))
                .unwrap();
            black_box(result.metrics.tokens_reused);
        });
    });
}

criterion_group!(benches, bench_parse, bench_reparse);
criterion_main!(benches);
