//! Finding step decorators and reading their arguments.
//!
//! [`DecoratorScanner`] walks the top level of a module and pairs every
//! function carrying the step decorator with that decorator.
//! [`StepArgumentResolver`] turns the decorator's single literal argument
//! into [`StepIdentifiers`], reporting anything it has to reject.

use std::path::Path;

use steptool_python_cst::{evaluate, Decorator, Expression, FunctionDef, Literal, Module, Statement};

use crate::report::Reporter;

/// Decorator name used when none is configured.
pub const DEFAULT_DECORATOR: &str = "step";

// ============================================================================
// Scanner
// ============================================================================

/// A top-level function together with its first step decorator.
#[derive(Debug, Clone, Copy)]
pub struct DecoratorMatch<'m> {
    /// Index of the function in [`Module::body`].
    pub statement_index: usize,
    pub function: &'m FunctionDef,
    pub decorator: &'m Decorator,
    /// Index of the decorator in [`FunctionDef::decorators`].
    pub decorator_index: usize,
}

/// Iterator over the step-decorated top-level functions of a module, in
/// source order.
///
/// Nested functions and methods are never visited. A decorator matches when
/// its full dotted name equals the configured name; only the first matching
/// decorator of each function is yielded.
pub struct DecoratorScanner<'m> {
    module: &'m Module,
    decorator: &'m str,
    next: usize,
}

impl<'m> DecoratorScanner<'m> {
    pub fn new(module: &'m Module, decorator: &'m str) -> Self {
        Self::starting_at(module, decorator, 0)
    }

    /// Resume a scan at statement `index`.
    pub fn starting_at(module: &'m Module, decorator: &'m str, index: usize) -> Self {
        DecoratorScanner {
            module,
            decorator,
            next: index,
        }
    }
}

impl<'m> Iterator for DecoratorScanner<'m> {
    type Item = DecoratorMatch<'m>;

    fn next(&mut self) -> Option<Self::Item> {
        let module = self.module;
        while let Some(stmt) = module.body.get(self.next) {
            let statement_index = self.next;
            self.next += 1;
            let Statement::FunctionDef(function) = stmt else {
                continue;
            };
            let found = function
                .decorators
                .iter()
                .enumerate()
                .find(|(_, d)| d.name().as_deref() == Some(self.decorator));
            if let Some((decorator_index, decorator)) = found {
                return Some(DecoratorMatch {
                    statement_index,
                    function,
                    decorator,
                    decorator_index,
                });
            }
        }
        None
    }
}

// ============================================================================
// Literal values
// ============================================================================

/// What a decorator argument evaluated to, as far as steps are concerned.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Str(String),
    StrList(Vec<String>),
    Other,
}

impl LiteralValue {
    pub fn from_literal(literal: Literal) -> Self {
        match literal {
            Literal::Str(s) => LiteralValue::Str(s),
            Literal::List(items) => items
                .into_iter()
                .map(|item| match item {
                    Literal::Str(s) => Some(s),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()
                .map_or(LiteralValue::Other, LiteralValue::StrList),
            _ => LiteralValue::Other,
        }
    }

    /// Evaluate an expression; anything that is not a literal is `Other`.
    pub fn of(expr: &Expression) -> Self {
        evaluate(expr).map_or(LiteralValue::Other, Self::from_literal)
    }
}

/// The step text(s) a function implements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepIdentifiers {
    /// `@step("text")`
    Single(String),
    /// `@step(["text", "alias", ...])`
    Many(Vec<String>),
}

impl StepIdentifiers {
    /// Every text, in declaration order.
    pub fn texts(&self) -> Vec<&str> {
        match self {
            StepIdentifiers::Single(text) => vec![text.as_str()],
            StepIdentifiers::Many(texts) => texts.iter().map(String::as_str).collect(),
        }
    }

    /// True for the list form, whose texts are aliases of one another.
    pub fn has_alias(&self) -> bool {
        matches!(self, StepIdentifiers::Many(_))
    }

    /// True for `""` and `[]`, which discovery skips.
    pub fn is_empty(&self) -> bool {
        match self {
            StepIdentifiers::Single(text) => text.is_empty(),
            StepIdentifiers::Many(texts) => texts.is_empty(),
        }
    }

    /// Where `text` sits: `Some(None)` for an exact single match,
    /// `Some(Some(i))` for element `i` of a list, `None` otherwise.
    pub fn locate(&self, text: &str) -> Option<Option<usize>> {
        match self {
            StepIdentifiers::Single(single) => (single == text).then_some(None),
            StepIdentifiers::Many(texts) => texts.iter().position(|t| t == text).map(Some),
        }
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Reads and validates step decorator arguments.
pub struct StepArgumentResolver<'r> {
    reporter: &'r dyn Reporter,
}

impl<'r> StepArgumentResolver<'r> {
    pub fn new(reporter: &'r dyn Reporter) -> Self {
        StepArgumentResolver { reporter }
    }

    /// The identifiers passed to `decorator`, or `None` after reporting why
    /// they were rejected. `file` only appears in the report.
    pub fn resolve(&self, decorator: &Decorator, file: &Path) -> Option<StepIdentifiers> {
        let Some(value) = single_argument(decorator) else {
            self.reporter.report(&format!(
                "Decorator step accepts only one argument - {}",
                file.display()
            ));
            return None;
        };
        match LiteralValue::of(value) {
            LiteralValue::Str(text) => Some(StepIdentifiers::Single(text)),
            LiteralValue::StrList(texts) => Some(StepIdentifiers::Many(texts)),
            LiteralValue::Other => {
                self.reporter.report(&format!(
                    "Decorator step accepts either a string or a list of strings - {}",
                    file.display()
                ));
                None
            }
        }
    }
}

/// The value of the only argument of a decorator call, if it has exactly one
/// positional argument and nothing else.
pub(crate) fn single_argument(decorator: &Decorator) -> Option<&Expression> {
    match decorator.call()?.args.as_slice() {
        [arg] if arg.is_positional() => Some(&arg.value),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::CollectingReporter;
    use steptool_python_cst::parse_module;

    fn names(source: &str, decorator: &str) -> Vec<(String, usize)> {
        let module = parse_module(source).unwrap();
        DecoratorScanner::new(&module, decorator)
            .map(|m| (m.function.name().to_string(), m.decorator_index))
            .collect()
    }

    mod scanner {
        use super::*;

        #[test]
        fn top_level_functions_in_order() {
            let source = "\
@step('one')
def one():
    pass

def plain():
    pass

@other
@step('two')
async def two():
    pass
";
            assert_eq!(
                names(source, "step"),
                vec![("one".to_string(), 0), ("two".to_string(), 1)]
            );
        }

        #[test]
        fn nested_and_methods_ignored() {
            let source = "\
class Steps:
    @step('method')
    def method(self):
        pass

def outer():
    @step('inner')
    def inner():
        pass
";
            assert!(names(source, "step").is_empty());
        }

        #[test]
        fn first_matching_decorator_only() {
            let source = "@step('a')\n@step('b')\ndef f():\n    pass\n";
            assert_eq!(names(source, "step"), vec![("f".to_string(), 0)]);
        }

        #[test]
        fn dotted_names_match_in_full() {
            let source = "@gauge.step('a')\ndef f():\n    pass\n@step('b')\ndef g():\n    pass\n";
            assert_eq!(names(source, "gauge.step"), vec![("f".to_string(), 0)]);
            assert_eq!(names(source, "step"), vec![("g".to_string(), 0)]);
        }

        #[test]
        fn opaque_decorators_never_match() {
            let source = "@steps[0]('a')\ndef f():\n    pass\n";
            assert!(names(source, "step").is_empty());
        }

        #[test]
        fn resume_from_index() {
            let source = "@step('a')\ndef a():\n    pass\n@step('b')\ndef b():\n    pass\n";
            let module = parse_module(source).unwrap();
            let mut scanner = DecoratorScanner::new(&module, "step");
            let first = scanner.next().unwrap();
            let resumed: Vec<_> =
                DecoratorScanner::starting_at(&module, "step", first.statement_index + 1)
                    .map(|m| m.function.name())
                    .collect();
            assert_eq!(resumed, vec!["b"]);
        }
    }

    mod literal_values {
        use super::*;

        #[test]
        fn string_and_string_list() {
            assert_eq!(
                LiteralValue::from_literal(Literal::Str("a".into())),
                LiteralValue::Str("a".into())
            );
            assert_eq!(
                LiteralValue::from_literal(Literal::List(vec![
                    Literal::Str("a".into()),
                    Literal::Str("b".into())
                ])),
                LiteralValue::StrList(vec!["a".into(), "b".into()])
            );
        }

        #[test]
        fn everything_else_is_other() {
            assert_eq!(LiteralValue::from_literal(Literal::Int(1)), LiteralValue::Other);
            assert_eq!(
                LiteralValue::from_literal(Literal::Tuple(vec![Literal::Str("a".into())])),
                LiteralValue::Other
            );
            assert_eq!(
                LiteralValue::from_literal(Literal::List(vec![
                    Literal::Str("a".into()),
                    Literal::Int(2)
                ])),
                LiteralValue::Other
            );
        }
    }

    mod identifiers {
        use super::*;

        #[test]
        fn locate_single_and_many() {
            let single = StepIdentifiers::Single("a foo".into());
            assert_eq!(single.locate("a foo"), Some(None));
            assert_eq!(single.locate("foo"), None);

            let many = StepIdentifiers::Many(vec!["a foo".into(), "a bar".into()]);
            assert_eq!(many.locate("a bar"), Some(Some(1)));
            assert_eq!(many.locate("a baz"), None);
            assert!(many.has_alias());
            assert!(!single.has_alias());
        }

        #[test]
        fn empty_forms() {
            assert!(StepIdentifiers::Single(String::new()).is_empty());
            assert!(StepIdentifiers::Many(vec![]).is_empty());
            assert!(!StepIdentifiers::Many(vec![String::new()]).is_empty());
        }
    }

    mod resolver {
        use super::*;

        const ONLY_ONE: &str = "Decorator step accepts only one argument - steps.py";
        const STRING_OR_LIST: &str =
            "Decorator step accepts either a string or a list of strings - steps.py";

        fn resolve(decorator_source: &str) -> (Option<StepIdentifiers>, Vec<String>) {
            let source = format!("{}\ndef f():\n    pass\n", decorator_source);
            let module = parse_module(&source).unwrap();
            let reporter = CollectingReporter::new();
            let resolver = StepArgumentResolver::new(&reporter);
            let m = DecoratorScanner::new(&module, "step").next().unwrap();
            let result = resolver.resolve(m.decorator, Path::new("steps.py"));
            (result, reporter.take())
        }

        #[test]
        fn single_string() {
            let (result, messages) = resolve("@step(\"Say <greeting> to <name>\")");
            assert_eq!(
                result,
                Some(StepIdentifiers::Single("Say <greeting> to <name>".into()))
            );
            assert!(messages.is_empty());
        }

        #[test]
        fn list_of_strings() {
            let (result, messages) = resolve("@step(['a', \"b\",])");
            assert_eq!(
                result,
                Some(StepIdentifiers::Many(vec!["a".into(), "b".into()]))
            );
            assert!(messages.is_empty());
        }

        #[test]
        fn parenthesized_and_concatenated() {
            let (result, _) = resolve("@step(('a '\n      'b'))");
            assert_eq!(result, Some(StepIdentifiers::Single("a b".into())));
        }

        #[test]
        fn argument_count_errors() {
            for decorator in [
                "@step()",
                "@step('a', 'b')",
                "@step",
                "@step(text='a')",
                "@step(*texts)",
            ] {
                let (result, messages) = resolve(decorator);
                assert_eq!(result, None, "{}", decorator);
                assert_eq!(messages, vec![ONLY_ONE], "{}", decorator);
            }
        }

        #[test]
        fn argument_type_errors() {
            for decorator in [
                "@step(1)",
                "@step({'a': 1})",
                "@step(name)",
                "@step('a'.upper())",
                "@step(('a', 'b'))",
                "@step(['a', 1])",
                "@step(f'a')",
                "@step(b'a')",
            ] {
                let (result, messages) = resolve(decorator);
                assert_eq!(result, None, "{}", decorator);
                assert_eq!(messages, vec![STRING_OR_LIST], "{}", decorator);
            }
        }
    }
}
