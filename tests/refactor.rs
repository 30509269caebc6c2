//! Refactoring tests.
//!
//! Every refactor is checked two ways: the edited tree's text, and the
//! returned edits applied to an untouched copy of the original text. Both
//! must produce the same file.

use steptool::patch::{apply_edits, Edit, Span};
use steptool::report::CollectingReporter;
use steptool::text::extract_span_str;
use steptool::{iter_steps, RefactorEngine, SourceTree, SpanCalculator};
use steptool_python_cst::NodeId;

// ============================================================================
// Test Infrastructure
// ============================================================================

/// Run one refactor and check that both ways of consuming it agree.
fn refactor(source: &str, old: &str, new: &str, params: &[i64]) -> (Vec<Edit>, String) {
    let reporter = CollectingReporter::new();
    let mut tree = SourceTree::parse_source("steps.py", source).unwrap();
    let engine = RefactorEngine::new(&reporter);
    let edits = engine.refactor_step(&mut tree, old, new, params);
    let dumped = tree.dumps();
    let patched = apply_edits(source, &edits).unwrap();
    assert_eq!(patched, dumped, "edits and tree disagree");
    (edits, dumped)
}

// ============================================================================
// Step Text
// ============================================================================

#[test]
fn rename_keeps_quotes_and_everything_else() {
    let source = "\
# Greetings
@step('Say <greeting> to <name>')
def say(greeting, name):
    print(greeting, name)  # keep me
";
    let (edits, dumped) = refactor(source, "Say <greeting> to <name>", "Greet <name>", &[0, 1]);
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].new_text, "'Greet <name>'");
    assert_eq!(edits[0].span, Span::new(2, 6, 2, 32));
    assert_eq!(
        extract_span_str(source, &edits[0].span),
        Some("'Say <greeting> to <name>'")
    );
    assert_eq!(dumped, source.replace("Say <greeting> to <name>", "Greet <name>"));
}

#[test]
fn list_element_is_edited_alone() {
    let source = "@step([\"a foo\", \"a bar\"])\ndef f():\n    pass\n";
    let (edits, dumped) = refactor(source, "a bar", "a baz", &[]);
    assert_eq!(edits, vec![Edit::new(Span::new(1, 16, 1, 23), "\"a baz\"")]);
    assert_eq!(dumped, "@step([\"a foo\", \"a baz\"])\ndef f():\n    pass\n");
}

#[test]
fn multi_line_list() {
    let source = "\
@step([
    'first alias',   # one
    'second alias',  # two
])
def aliased():
    pass
";
    let (edits, dumped) = refactor(source, "first alias", "renamed alias", &[]);
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].span, Span::new(2, 4, 2, 17));
    assert_eq!(dumped, source.replace("'first alias'", "'renamed alias'"));
}

#[test]
fn parenthesized_argument() {
    let source = "@step((\n    'wrapped'\n))\ndef f():\n    pass\n";
    let (edits, dumped) = refactor(source, "wrapped", "unwrapped", &[]);
    assert_eq!(edits[0].span, Span::new(2, 4, 2, 13));
    assert_eq!(dumped, "@step((\n    'unwrapped'\n))\ndef f():\n    pass\n");
}

#[test]
fn only_first_matching_function_changes() {
    let source = "\
@step('same')
def first():
    pass

@step('same')
def second():
    pass
";
    let (edits, dumped) = refactor(source, "same", "changed", &[]);
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].span.start_line, 1);
    assert_eq!(
        dumped,
        source.replacen("@step('same')", "@step('changed')", 1)
    );
}

#[test]
fn string_prefix_is_not_rewritten() {
    let source = "@step(u'u')\ndef f():\n    pass\n";
    let (edits, dumped) = refactor(source, "u", "go", &[]);
    assert_eq!(edits, vec![Edit::new(Span::new(1, 6, 1, 10), "u'go'")]);
    assert_eq!(dumped, "@step(u'go')\ndef f():\n    pass\n");

    let source = "@step(r'''r''')\ndef f():\n    pass\n";
    let (_, dumped) = refactor(source, "r", "raw", &[]);
    assert_eq!(dumped, "@step(r'''raw''')\ndef f():\n    pass\n");
}

#[test]
fn concatenated_step_text_is_reported() {
    let source = "@step('a ' 'b')\ndef f():\n    pass\n";
    let reporter = CollectingReporter::new();
    let mut tree = SourceTree::parse_source("steps.py", source).unwrap();
    let engine = RefactorEngine::new(&reporter);
    assert_eq!(engine.find_step(&tree, "a b").map(|m| m.function_name), Some("f".to_string()));

    let edits = engine.refactor_step(&mut tree, "a b", "c", &[]);
    assert!(edits.is_empty());
    assert_eq!(tree.dumps(), source);
    assert_eq!(
        reporter.messages(),
        vec!["Step text must be a single string literal to be refactored - steps.py"]
    );
}

#[test]
fn matches_whole_text_only() {
    let source = "@step('a step')\ndef f():\n    pass\n";
    let (edits, dumped) = refactor(source, "a", "b", &[]);
    assert!(edits.is_empty());
    assert_eq!(dumped, source);
}

#[test]
fn no_match_is_a_no_op() {
    let source = "@step('present')\ndef f(a):\n    pass\n";
    let (edits, dumped) = refactor(source, "nonexistent", "x", &[]);
    assert!(edits.is_empty());
    assert_eq!(dumped, source);
}

#[test]
fn async_functions_and_dotted_decorators() {
    let source = "@step('async')\nasync def f(a):\n    pass\n";
    let (edits, _) = refactor(source, "async", "still async", &[0]);
    assert_eq!(edits[0].new_text, "'still async'");

    let reporter = CollectingReporter::new();
    let mut tree =
        SourceTree::parse_source("s.py", "@gauge.step('dotted')\ndef f():\n    pass\n").unwrap();
    let engine = RefactorEngine::with_decorator("gauge.step", &reporter);
    let edits = engine.refactor_step(&mut tree, "dotted", "done", &[]);
    assert_eq!(edits.len(), 1);
    assert_eq!(tree.dumps(), "@gauge.step('done')\ndef f():\n    pass\n");
}

#[test]
fn rejected_decorators_are_reported_and_skipped() {
    let source = "\
@step('one', 'two')
def broken():
    pass

@step('target')
def target():
    pass
";
    let reporter = CollectingReporter::new();
    let mut tree = SourceTree::parse_source("steps.py", source).unwrap();
    let edits = RefactorEngine::new(&reporter).refactor_step(&mut tree, "target", "hit", &[]);
    assert_eq!(edits.len(), 1);
    assert_eq!(
        reporter.messages(),
        vec!["Decorator step accepts only one argument - steps.py"]
    );
}

// ============================================================================
// Parameters
// ============================================================================

#[test]
fn identity_remap_produces_one_edit() {
    let source = "@step('old')\ndef f(a, b, c):\n    pass\n";
    let (edits, dumped) = refactor(source, "old", "new", &[0, 1, 2]);
    assert_eq!(edits.len(), 1);
    assert_eq!(dumped, "@step('new')\ndef f(a, b, c):\n    pass\n");
}

#[test]
fn new_parameter_is_synthesized() {
    let source = "@step('old <x>')\ndef f(a, b):\n    pass\n";
    let (edits, dumped) = refactor(source, "old <x>", "new <y> <x>", &[-1, 1]);
    assert_eq!(edits.len(), 2);
    assert_eq!(edits[1], Edit::new(Span::new(2, 6, 2, 10), "arg1, b"));
    assert_eq!(dumped, "@step('new <y> <x>')\ndef f(arg1, b):\n    pass\n");
}

#[test]
fn indices_refer_to_old_positions() {
    let source = "@step('old')\ndef f(a, b):\n    pass\n";
    let (edits, _) = refactor(source, "old", "new", &[-1, 0]);
    assert_eq!(edits[1].new_text, "arg1, a");
}

#[test]
fn reorder_parameters() {
    let source = "@step('Say <greeting> to <name>')\ndef say(greeting, name):\n    pass\n";
    let (edits, dumped) = refactor(
        source,
        "Say <greeting> to <name>",
        "Say hi to <name> with <greeting>",
        &[1, 0],
    );
    assert_eq!(edits[1].new_text, "name, greeting");
    assert_eq!(
        dumped,
        "@step('Say hi to <name> with <greeting>')\ndef say(name, greeting):\n    pass\n"
    );
}

#[test]
fn annotations_and_defaults_are_not_kept() {
    let source = "@step('s')\ndef f(a: int, b: str = 'x') -> None:\n    pass\n";
    let (edits, dumped) = refactor(source, "s", "t", &[1, 0]);
    assert_eq!(edits[1].new_text, "b, a");
    assert_eq!(dumped, "@step('t')\ndef f(b, a) -> None:\n    pass\n");
}

#[test]
fn remove_every_parameter() {
    let source = "@step('s <a> <b>')\ndef f(a, b):\n    pass\n";
    let (edits, dumped) = refactor(source, "s <a> <b>", "s", &[]);
    assert_eq!(edits[1], Edit::new(Span::new(2, 6, 2, 10), ""));
    assert_eq!(dumped, "@step('s')\ndef f():\n    pass\n");
}

#[test]
fn add_parameter_to_empty_list() {
    let source = "@step('s')\ndef f():\n    pass\n";
    let (edits, dumped) = refactor(source, "s", "s <x>", &[-1]);
    assert_eq!(edits[1], Edit::new(Span::new(2, 6, 2, 6), "arg1"));
    assert_eq!(dumped, "@step('s <x>')\ndef f(arg1):\n    pass\n");
}

#[test]
fn multi_line_parameters() {
    let source = "\
@step('s <a> <b>')
def f(
    a,  # first
    b,
):
    pass
";
    let (edits, dumped) = refactor(source, "s <a> <b>", "s <b> <a>", &[1, 0]);
    assert_eq!(edits[1].span, Span::new(3, 4, 4, 6));
    assert_eq!(
        dumped,
        "@step('s <b> <a>')\ndef f(\n    b, a\n):\n    pass\n"
    );
}

#[test]
fn shorter_mapping_than_parameters() {
    let source = "@step('s')\ndef f(a, b, c):\n    pass\n";
    let (edits, dumped) = refactor(source, "s", "s", &[0, 1]);
    assert_eq!(edits.len(), 2);
    assert_eq!(dumped, "@step('s')\ndef f(a, b):\n    pass\n");
}

#[test]
fn out_of_range_index_adds_parameter() {
    let source = "@step('s')\ndef f(a):\n    pass\n";
    let (edits, _) = refactor(source, "s", "s", &[0, 7]);
    assert_eq!(edits[1].new_text, "a, arg2");
}

// ============================================================================
// Spans and Discovery After Editing
// ============================================================================

#[test]
fn sentinel_for_unknown_nodes() {
    let source = "@step('s')\ndef f():\n    pass\n";
    let tree = SourceTree::parse_source("s.py", source).unwrap();
    let module = tree.module();
    let unknown = SpanCalculator::span_of(&module, NodeId::new(u32::MAX));
    assert_eq!(unknown, Span::new(0, 0, 0, 0));
    let function = module.functions().next().unwrap();
    let known = SpanCalculator::span_of(&module, function.id);
    assert!(known.start_line >= 1);
    assert_ne!(known, unknown);
}

#[test]
fn discovery_sees_the_edit() {
    let source = "@step('before')\ndef f(a):\n    pass\n";
    let reporter = CollectingReporter::new();
    let mut tree = SourceTree::parse_source("s.py", source).unwrap();
    RefactorEngine::new(&reporter).refactor_step(&mut tree, "before", "after", &[-1, 0]);
    let steps: Vec<_> = iter_steps(&tree, "step", &reporter).collect();
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].steps.texts(), vec!["after"]);
    assert_eq!(steps[0].span.get(), Span::new(1, 0, 3, 8));
}

#[test]
fn deferred_span_tracks_later_edits() {
    let source = "@step('short')\ndef f(a): return a\n";
    let reporter = CollectingReporter::new();
    let mut tree = SourceTree::parse_source("s.py", source).unwrap();
    let span = iter_steps(&tree, "step", &reporter).next().unwrap().span;
    assert_eq!(span.get(), Span::new(1, 0, 2, 18));

    RefactorEngine::new(&reporter).refactor_step(&mut tree, "short", "short", &[-1, 0]);
    assert_eq!(tree.dumps(), "@step('short')\ndef f(arg1, a): return a\n");
    assert_eq!(span.get(), Span::new(1, 0, 2, 24));
}

#[test]
fn unicode_columns() {
    let source = "@step('héllo <wörld>')\ndef f(wörld):\n    pass\n";
    let (edits, dumped) = refactor(source, "héllo <wörld>", "hi <wörld>", &[0, -1]);
    assert_eq!(edits[0].span, Span::new(1, 6, 1, 21));
    assert_eq!(edits[1].span, Span::new(2, 6, 2, 11));
    assert_eq!(dumped, "@step('hi <wörld>')\ndef f(wörld, arg2):\n    pass\n");
}
