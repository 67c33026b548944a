//! Incremental re-parse: equivalence with from-scratch parsing, and actual
//! token reuse outside the edited region.

mod common;

use common::{arith_parser, assert_trees_identical};
use proptest::prelude::*;
use tabulon::{Edit, TextRange, TextSize};

fn size(n: usize) -> TextSize {
    TextSize::of_len(n)
}

/// Apply an edit to a string, returning the new text.
fn splice(text: &str, edit: Edit, insert: &str) -> String {
    let mut out = String::new();
    out.push_str(&text[..edit.start.as_usize()]);
    out.push_str(insert);
    out.push_str(&text[edit.old_end.as_usize()..]);
    out
}

fn check_equivalence(old_text: &str, edit: Edit, insert: &str) {
    let parser = arith_parser();
    let old = parser.parse(old_text).unwrap();
    let new_text = splice(old_text, edit, insert);

    let incremental = parser.reparse(&old.tree, &[edit], &new_text).unwrap();
    let scratch = parser.parse(&new_text).unwrap();

    assert_trees_identical(incremental.tree.root(), scratch.tree.root());
    assert_eq!(incremental.errors, scratch.errors);
}

#[test]
fn replacing_an_operand_reuses_the_prefix() {
    let parser = arith_parser();
    let old = parser.parse("x=1+2").unwrap();

    // "x=1+2" -> "x=1+42"
    let edit = Edit::replace(TextRange::new(size(4), size(5)), size(2));
    let result = parser.reparse(&old.tree, &[edit], "x=1+42").unwrap();

    assert!(result.is_clean());
    let scratch = parser.parse("x=1+42").unwrap();
    assert_trees_identical(result.tree.root(), scratch.tree.root());
    // `x` and `=` sit safely before the damage.
    assert!(result.metrics.tokens_reused >= 2);
}

#[test]
fn inserting_at_the_front_shifts_reused_tokens() {
    let parser = arith_parser();
    let old = parser.parse("1+2").unwrap();

    let edit = Edit::insert(size(0), size(2));
    let result = parser.reparse(&old.tree, &[edit], "9+1+2").unwrap();

    assert!(result.is_clean());
    let scratch = parser.parse("9+1+2").unwrap();
    assert_trees_identical(result.tree.root(), scratch.tree.root());
    assert!(result.metrics.tokens_reused >= 2);
}

#[test]
fn unedited_reparse_reuses_every_token() {
    let parser = arith_parser();
    let old = parser.parse("x=1+2").unwrap();

    let result = parser.reparse(&old.tree, &[], "x=1+2").unwrap();
    assert_trees_identical(result.tree.root(), old.tree.root());
    assert_eq!(result.metrics.tokens_reused, result.metrics.tokens_consumed);
}

#[test]
fn non_reusable_star_is_relexed() {
    let parser = arith_parser();
    let old = parser.parse("1*2+3").unwrap();

    // Edit far from the `*`: the star was shifted through a non-reusable
    // action, so it must come from the lexer again, not the old tree.
    let edit = Edit::replace(TextRange::new(size(4), size(5)), size(1));
    let new_text = "1*2+9";
    let result = parser.reparse(&old.tree, &[edit], new_text).unwrap();

    let scratch = parser.parse(new_text).unwrap();
    assert_trees_identical(result.tree.root(), scratch.tree.root());
    // `1` still reuses; `*` and everything in the edit's shadow cannot.
    assert!(result.metrics.tokens_reused >= 1);
    assert!(result.metrics.tokens_reused < result.metrics.tokens_consumed);
}

#[test]
fn edit_adjacent_to_a_token_invalidates_it() {
    // Appending a digit must extend the previous number, not produce two.
    check_equivalence("1+2", Edit::insert(size(3), size(1)), "3");
}

#[test]
fn edit_inside_lexer_lookahead_invalidates_the_star() {
    // "1*2" -> "1**2": the old `*` token saw `2` as its lookahead; editing
    // that position must re-lex it into `**`.
    check_equivalence("1*2", Edit::insert(size(2), size(1)), "*");
}

#[test]
fn deleting_across_tokens() {
    check_equivalence("x=1+2", Edit::delete(TextRange::new(size(3), size(5))), "");
}

#[test]
fn editing_inside_trivia() {
    check_equivalence("1 + {c} 2", Edit::insert(size(5), size(2)), "xy");
}

#[test]
fn reparse_of_malformed_input_stays_equivalent() {
    check_equivalence("1+", Edit::insert(size(2), size(1)), "2");
    check_equivalence("1 ) 2", Edit::insert(size(0), size(2)), "x=");
}

#[test]
fn sequential_edits_compose() {
    let parser = arith_parser();
    let old = parser.parse("1+2*3").unwrap();

    // First replace "2" with "42" (coords in the original text), then
    // insert "0" after the "4" (coords after the first edit).
    let edits = [
        Edit::replace(TextRange::new(size(2), size(3)), size(2)),
        Edit::insert(size(3), size(1)),
    ];
    let new_text = "1+402*3";
    let result = parser.reparse(&old.tree, &edits, new_text).unwrap();
    let scratch = parser.parse(new_text).unwrap();
    assert_trees_identical(result.tree.root(), scratch.tree.root());
}

proptest! {
    /// The core correctness property: for arbitrary text and an arbitrary
    /// single edit, `reparse` is structurally identical to a from-scratch
    /// parse of the edited text, malformed inputs included.
    #[test]
    fn reparse_matches_scratch_parse(
        text in proptest::string::string_regex("[0-9+*/()= a-z{}-]{0,24}").unwrap(),
        cut_start in 0usize..24,
        cut_len in 0usize..8,
        insert in proptest::string::string_regex("[0-9+*/()= a-z-]{0,6}").unwrap(),
    ) {
        let start = cut_start.min(text.len());
        let end = (start + cut_len).min(text.len());
        let edit = Edit {
            start: size(start),
            old_end: size(end),
            new_end: size(start + insert.len()),
        };

        let parser = arith_parser();
        let old = parser.parse(&text).unwrap();
        let new_text = splice(&text, edit, &insert);

        let incremental = parser.reparse(&old.tree, &[edit], &new_text).unwrap();
        let scratch = parser.parse(&new_text).unwrap();
        assert_trees_identical(incremental.tree.root(), scratch.tree.root());
    }
}
