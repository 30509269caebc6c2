//! Renaming steps and remapping their parameters.
//!
//! [`RefactorEngine::refactor_step`] edits the live tree and also returns the
//! same change as [`Edit`]s addressed against the text as it was before the
//! call. Applying those edits to the original text with
//! [`apply_edits`](crate::patch::apply_edits) gives exactly
//! [`SourceTree::dumps`] of the edited tree.

use std::path::Path;

use steptool_python_cst::{Expression, FunctionDef, Module, NodeId, StringLiteral};
use tracing::{debug, info, warn};

use crate::patch::Edit;
use crate::report::Reporter;
use crate::scan::{
    single_argument, DecoratorScanner, StepArgumentResolver, StepIdentifiers, DEFAULT_DECORATOR,
};
use crate::source_tree::SourceTree;
use crate::span::SpanCalculator;

/// The string literal holding the step text to rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StepTarget {
    function: NodeId,
    decorator_index: usize,
    /// Element of a list argument, `None` for a plain string argument.
    element: Option<usize>,
    literal: NodeId,
}

/// A step found by [`RefactorEngine::find_step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepMatch {
    pub function_name: String,
    /// Bare names of the function's current parameters.
    pub params: Vec<String>,
    pub steps: StepIdentifiers,
}

/// Rewrites step texts and parameter lists in place.
pub struct RefactorEngine<'r> {
    decorator: String,
    reporter: &'r dyn Reporter,
}

impl<'r> RefactorEngine<'r> {
    pub fn new(reporter: &'r dyn Reporter) -> Self {
        Self::with_decorator(DEFAULT_DECORATOR, reporter)
    }

    pub fn with_decorator(decorator: impl Into<String>, reporter: &'r dyn Reporter) -> Self {
        RefactorEngine {
            decorator: decorator.into(),
            reporter,
        }
    }

    /// The first step declaring `text`, without changing anything.
    pub fn find_step(&self, tree: &SourceTree, text: &str) -> Option<StepMatch> {
        let module = tree.module();
        let resolver = StepArgumentResolver::new(self.reporter);
        DecoratorScanner::new(&module, &self.decorator).find_map(|found| {
            let steps = resolver.resolve(found.decorator, tree.file_path())?;
            steps.locate(text)?;
            Some(StepMatch {
                function_name: found.function.name().to_string(),
                params: found.function.params.names().iter().map(|s| s.to_string()).collect(),
                steps,
            })
        })
    }

    /// Replace `old_text` with `new_text` in the first step declaring
    /// `old_text`, and rebuild that function's parameter list.
    ///
    /// Entry `i` of `move_param_from_idx` names the old parameter that ends
    /// up at position `i`; a negative entry introduces a new parameter
    /// `arg{i+1}`. Old entries past the end of the old list are treated as
    /// new parameters. When the mapping is the identity over the old list the
    /// parameters are left alone.
    ///
    /// Only the text between the quotes changes; the string prefix and quote
    /// style stay as written. A step written as adjacent string literals, or
    /// with escapes that hide `old_text`, is reported and skipped.
    ///
    /// Returns the step text edit followed by the parameter edit, if any.
    /// Returns nothing, and leaves the tree untouched, when no step declares
    /// `old_text`.
    pub fn refactor_step(
        &self,
        tree: &mut SourceTree,
        old_text: &str,
        new_text: &str,
        move_param_from_idx: &[i64],
    ) -> Vec<Edit> {
        let file_path = tree.file_path().to_path_buf();
        let mut module = tree.module_mut();

        let Some(target) = self.locate(&module, &file_path, old_text) else {
            debug!(step = old_text, file = %file_path.display(), "No step to refactor");
            return Vec::new();
        };
        let Some(def) = module.functions().find(|def| def.id == target.function) else {
            return Vec::new();
        };

        let old_params: Vec<String> = def.params.names().iter().map(|s| s.to_string()).collect();
        let params_id = def.params.id;
        let step_span = SpanCalculator::span_of(&module, target.literal);
        let params_span = (!is_identity(move_param_from_idx, old_params.len()))
            .then(|| SpanCalculator::span_of(&module, params_id));

        let mut edits = Vec::with_capacity(2);
        let Some(literal) = module
            .function_mut(target.function)
            .and_then(|def| literal_mut(def, target.decorator_index, target.element))
        else {
            return edits;
        };
        let Some(new_body) = literal.body().map(|body| body.replace(old_text, new_text)) else {
            return edits;
        };
        literal.set_body(&new_body);
        edits.push(Edit::new(step_span, literal.value()));

        if let Some(params_span) = params_span {
            let names = remap_params(&old_params, move_param_from_idx);
            if let Some((def, ids)) = module.function_and_ids(target.function) {
                def.params.replace_with_names(&names, ids);
                edits.push(Edit::new(params_span, def.params.code()));
            }
        }

        info!(
            file = %file_path.display(),
            old = old_text,
            new = new_text,
            edits = edits.len(),
            "Refactored step"
        );
        edits
    }

    fn locate(&self, module: &Module, file_path: &Path, old_text: &str) -> Option<StepTarget> {
        let resolver = StepArgumentResolver::new(self.reporter);
        for found in DecoratorScanner::new(module, &self.decorator) {
            let Some(steps) = resolver.resolve(found.decorator, file_path) else {
                continue;
            };
            let Some(element) = steps.locate(old_text) else {
                continue;
            };
            let Some(string) = literal(found.function, found.decorator_index, element) else {
                continue;
            };
            if !string.body().is_some_and(|body| body.contains(old_text)) {
                self.reporter.report(&format!(
                    "Step text must be a single string literal to be refactored - {}",
                    file_path.display()
                ));
                continue;
            }
            return Some(StepTarget {
                function: found.function.id,
                decorator_index: found.decorator_index,
                element,
                literal: string.id,
            });
        }
        None
    }
}

/// True when the mapping keeps every old parameter where it is.
fn is_identity(move_param_from_idx: &[i64], old_len: usize) -> bool {
    move_param_from_idx.len() == old_len
        && move_param_from_idx
            .iter()
            .enumerate()
            .all(|(i, &from)| usize::try_from(from).is_ok_and(|from| from == i))
}

/// The new parameter names for a remapping.
fn remap_params(old_params: &[String], move_param_from_idx: &[i64]) -> Vec<String> {
    move_param_from_idx
        .iter()
        .enumerate()
        .map(|(i, &from)| {
            let old = usize::try_from(from)
                .ok()
                .and_then(|from| old_params.get(from));
            match old {
                Some(name) => name.clone(),
                None => {
                    if from >= 0 {
                        warn!(index = from, "Parameter index out of range, adding a new parameter");
                    }
                    format!("arg{}", i + 1)
                }
            }
        })
        .collect()
}

fn step_argument_mut(def: &mut FunctionDef, decorator_index: usize) -> Option<&mut Expression> {
    let call = def.decorators.get_mut(decorator_index)?.call_mut()?;
    match call.args.as_mut_slice() {
        [arg] if arg.is_positional() => Some(arg.value.unparenthesized_mut()),
        _ => None,
    }
}

fn literal(
    def: &FunctionDef,
    decorator_index: usize,
    element: Option<usize>,
) -> Option<&StringLiteral> {
    let value = single_argument(def.decorators.get(decorator_index)?)?.unparenthesized();
    let value = match element {
        None => value,
        Some(i) => match value {
            Expression::List(list) => list.elements.get(i)?.value.unparenthesized(),
            _ => return None,
        },
    };
    match value {
        Expression::String(s) => Some(s),
        _ => None,
    }
}

fn literal_mut(
    def: &mut FunctionDef,
    decorator_index: usize,
    element: Option<usize>,
) -> Option<&mut StringLiteral> {
    let value = step_argument_mut(def, decorator_index)?;
    let value = match element {
        None => value,
        Some(i) => match value {
            Expression::List(list) => list.elements.get_mut(i)?.value.unparenthesized_mut(),
            _ => return None,
        },
    };
    match value {
        Expression::String(s) => Some(s),
        _ => None,
    }
}
