//! Step discovery for one parsed file.

use std::path::PathBuf;

use tracing::trace;

use crate::report::Reporter;
use crate::scan::{DecoratorScanner, StepArgumentResolver, StepIdentifiers};
use crate::source_tree::SourceTree;
use crate::span::{SpanCalculator, StepSpan};

/// One step implementation: the texts it declares, the function that
/// implements them, and where that function lives.
#[derive(Debug, Clone)]
pub struct FunctionSteps {
    pub steps: StepIdentifiers,
    pub function_name: String,
    pub file_path: PathBuf,
    /// Span of the whole function, decorators included. Deferred when
    /// produced by [`iter_steps`].
    pub span: StepSpan,
}

/// Lazily iterate over the steps defined in `tree`.
///
/// Functions whose decorator argument is rejected are reported and skipped,
/// as are functions declaring `""` or `[]`. The tree is borrowed afresh for
/// every item, so it may be inspected between calls to `next`.
pub fn iter_steps<'a>(
    tree: &'a SourceTree,
    decorator: &'a str,
    reporter: &'a dyn Reporter,
) -> StepIter<'a> {
    StepIter {
        tree,
        decorator,
        resolver: StepArgumentResolver::new(reporter),
        next: 0,
    }
}

/// Iterator returned by [`iter_steps`].
pub struct StepIter<'a> {
    tree: &'a SourceTree,
    decorator: &'a str,
    resolver: StepArgumentResolver<'a>,
    next: usize,
}

impl Iterator for StepIter<'_> {
    type Item = FunctionSteps;

    fn next(&mut self) -> Option<Self::Item> {
        let module = self.tree.module();
        for found in DecoratorScanner::starting_at(&module, self.decorator, self.next) {
            self.next = found.statement_index + 1;
            let Some(steps) = self
                .resolver
                .resolve(found.decorator, self.tree.file_path())
            else {
                continue;
            };
            if steps.is_empty() {
                trace!(function = found.function.name(), "Skipping empty step");
                continue;
            }
            return Some(FunctionSteps {
                steps,
                function_name: found.function.name().to_string(),
                file_path: self.tree.file_path().to_path_buf(),
                span: StepSpan::Deferred(SpanCalculator::lazy(self.tree, found.function.id)),
            });
        }
        self.next = module.body.len();
        None
    }
}
