//! End-to-end highlighting scenarios: reference and candidate text in, labelled
//! spans out

use rstest::rstest;
use rubyle::diff::{classify, highlight, resolve, HighlightSpan, MatchLabel, NodeIndex};
use rubyle::error::SubmitError;
use rubyle::formats::to_tags;
use rubyle::parser::{parse, ParseOptions};
use rubyle::session::{Session, Settings};

const FIBONACCI: &str = "def fibo(n)\n  if n <= 2\n    1\n  else\n    fibo(n - 1) + fibo(n - 2)\n  end\nend\n\nfibo 10\n";

fn spans(reference: &str, candidate: &str) -> Vec<HighlightSpan> {
    let options = ParseOptions::default();
    let reference = parse(reference, &options).unwrap();
    let index = NodeIndex::build(reference.root());
    highlight(candidate, &index, &options).unwrap()
}

fn tags(reference: &str, candidate: &str) -> String {
    to_tags(candidate, &spans(reference, candidate))
}

#[test]
fn test_identical_command_call_is_one_strong_span() {
    assert_eq!(
        spans("fibo 10", "fibo 10"),
        vec![HighlightSpan::labeled(0, 7, MatchLabel::Strong)]
    );
}

#[test]
fn test_swapped_operands_are_weak() {
    let reference = "fibo(n - 1) + fibo(n - 2)";
    let candidate = "fibo(n - 2) + fibo(n - 1)";
    assert_eq!(
        spans(reference, candidate),
        vec![
            HighlightSpan::labeled(0, 11, MatchLabel::Weak),
            HighlightSpan::plain(11, 14),
            HighlightSpan::labeled(14, 25, MatchLabel::Weak),
        ]
    );
}

#[test]
fn test_unbalanced_guess_is_rejected() {
    let mut session = Session::start(FIBONACCI, &Settings::default()).unwrap();
    let err = session.submit("def fibo(n").unwrap_err();
    match err {
        SubmitError::Syntax(syntax) => assert_eq!(syntax.message, "unexpected end of input"),
        other => panic!("expected a syntax error, got {other:?}"),
    }
    assert!(session.guesses().is_empty());
}

#[test]
fn test_interpolated_guess_is_rejected() {
    let mut session = Session::start(r#"puts "\#{n}""#, &Settings::default()).unwrap();
    let err = session.submit(r##"puts "#{n}""##).unwrap_err();
    match err {
        SubmitError::Syntax(syntax) => {
            assert_eq!(syntax.message, "string interpolation is not supported")
        }
        other => panic!("expected a syntax error, got {other:?}"),
    }
    assert!(session.guesses().is_empty());
}

#[test]
fn test_unrelated_arithmetic_stays_plain() {
    assert_eq!(spans("fibo 10", "1 + 1"), vec![HighlightSpan::plain(0, 5)]);
}

#[rstest]
#[case::same_position("fibo(n - 1)", "fibo(n - 1)", "<strong>fibo(n - 1)</strong>")]
#[case::nested_elsewhere("fibo(n - 1)", "puts(n - 1)", "puts(<strong>n - 1</strong>)")]
#[case::moved_into_command("fibo 10", "puts fibo 10", "puts <weak>fibo 10</weak>")]
#[case::whitespace_does_not_matter("fibo(n-1)", "fibo( n - 1 )", "<strong>fibo( n - 1 )</strong>")]
#[case::literal_leaves("[1, 2]", "[2, 1]", "[<weak>2</weak>, <weak>1</weak>]")]
#[case::second_statement("x = 1\nputs x", "puts 1", "puts <weak>1</weak>")]
#[case::spaced_negative_argument("fibo(-1)", "fibo -1", "<strong>fibo -1</strong>")]
#[case::spaced_array_argument("puts([1, 2])", "puts [1, 2]", "<strong>puts [1, 2]</strong>")]
fn test_tagged_highlights(#[case] reference: &str, #[case] candidate: &str, #[case] expected: &str) {
    assert_eq!(tags(reference, candidate), expected);
}

#[rstest]
#[case::call_vs_local("n = 1\nn", "n")]
#[case::different_literal("fibo 10", "fibo 11")]
fn test_no_structural_match_at_root(#[case] reference: &str, #[case] candidate: &str) {
    let options = ParseOptions::default();
    let reference = parse(reference, &options).unwrap();
    let candidate = parse(candidate, &options).unwrap();
    let index = NodeIndex::build(reference.root());
    let highlights = classify(candidate.root(), &index);
    assert!(highlights.iter().all(|h| h.range.as_range() != (0..candidate.source().len())));
}

#[test]
fn test_fibonacci_guess_progression() {
    insta::assert_snapshot!(tags(FIBONACCI, "def fibo(n)\n  fibo(n - 2) + fibo(n - 1)\nend"), @r###"
    def fibo<strong>(n)</strong>
      <weak>fibo(n - 2)</weak> + <weak>fibo(n - 1)</weak>
    end
    "###);
}

#[test]
fn test_resolve_accepts_any_highlight_order() {
    let options = ParseOptions::default();
    let reference = parse("fibo(n - 1) + fibo(n - 2)", &options).unwrap();
    let candidate = parse("fibo(n - 2) + fibo(n - 1)", &options).unwrap();
    let index = NodeIndex::build(reference.root());

    let mut highlights = classify(candidate.root(), &index);
    let in_order = resolve(candidate.source(), &highlights);
    highlights.reverse();
    assert_eq!(resolve(candidate.source(), &highlights), in_order);
}
