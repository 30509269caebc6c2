//! Where discovered steps end up.
//!
//! The loader hands every discovered step to a [`StepSink`]. [`StepRegistry`]
//! is the in-memory sink used by the CLI and by tests.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::output::StepItem;
use crate::scan::StepIdentifiers;
use crate::span::StepSpan;

/// Receives discovered steps.
pub trait StepSink {
    /// Register one step implementation.
    fn add_step(
        &mut self,
        identifiers: StepIdentifiers,
        function_name: &str,
        file_path: &Path,
        span: StepSpan,
    );

    /// Forget every step registered for `file_path`.
    fn remove_steps(&mut self, file_path: &Path);
}

/// One registered step text.
#[derive(Debug, Clone)]
pub struct StepInfo {
    pub text: String,
    pub function_name: String,
    pub file_path: PathBuf,
    pub span: StepSpan,
    /// True when declared in a list together with other texts.
    pub has_alias: bool,
    /// Every text of the declaring list, this one included. Empty for a
    /// plain string declaration.
    pub aliases: Vec<String>,
}

impl StepInfo {
    /// The JSON form of this step.
    pub fn to_item(&self) -> StepItem {
        StepItem {
            text: self.text.clone(),
            function: self.function_name.clone(),
            file: self.file_path.display().to_string(),
            span: self.span.get(),
            has_alias: self.has_alias,
        }
    }
}

/// An in-memory [`StepSink`] keeping steps in registration order.
#[derive(Debug, Default)]
pub struct StepRegistry {
    steps: Vec<StepInfo>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every implementation of `text`.
    pub fn get_infos(&self, text: &str) -> Vec<&StepInfo> {
        self.steps.iter().filter(|info| info.text == text).collect()
    }

    pub fn is_implemented(&self, text: &str) -> bool {
        self.steps.iter().any(|info| info.text == text)
    }

    /// True when more than one function implements `text`.
    pub fn has_multiple_implementations(&self, text: &str) -> bool {
        self.steps.iter().filter(|info| info.text == text).nth(1).is_some()
    }

    pub fn all_steps(&self) -> &[StepInfo] {
        &self.steps
    }

    pub fn steps_in_file(&self, file_path: &Path) -> Vec<&StepInfo> {
        self.steps
            .iter()
            .filter(|info| info.file_path == file_path)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn clear(&mut self) {
        self.steps.clear();
    }
}

impl StepSink for StepRegistry {
    fn add_step(
        &mut self,
        identifiers: StepIdentifiers,
        function_name: &str,
        file_path: &Path,
        span: StepSpan,
    ) {
        let has_alias = identifiers.has_alias();
        let texts: Vec<String> = match identifiers {
            StepIdentifiers::Single(text) => vec![text],
            StepIdentifiers::Many(texts) => texts,
        };
        let aliases = if has_alias { texts.clone() } else { Vec::new() };
        for text in texts {
            debug!(
                step = %text,
                function = function_name,
                file = %file_path.display(),
                "Registered step"
            );
            self.steps.push(StepInfo {
                text,
                function_name: function_name.to_string(),
                file_path: file_path.to_path_buf(),
                span: span.clone(),
                has_alias,
                aliases: aliases.clone(),
            });
        }
    }

    fn remove_steps(&mut self, file_path: &Path) {
        let before = self.steps.len();
        self.steps.retain(|info| info.file_path != file_path);
        debug!(
            file = %file_path.display(),
            removed = before - self.steps.len(),
            "Removed steps"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::Span;

    fn registry() -> StepRegistry {
        let mut registry = StepRegistry::new();
        registry.add_step(
            StepIdentifiers::Single("say hello".into()),
            "hello",
            Path::new("a.py"),
            Span::new(1, 0, 3, 8).into(),
        );
        registry.add_step(
            StepIdentifiers::Many(vec!["a foo".into(), "a bar".into()]),
            "foo",
            Path::new("b.py"),
            Span::new(5, 0, 7, 8).into(),
        );
        registry.add_step(
            StepIdentifiers::Single("say hello".into()),
            "hello_again",
            Path::new("b.py"),
            Span::new(9, 0, 11, 8).into(),
        );
        registry
    }

    #[test]
    fn list_expands_to_aliases() {
        let registry = registry();
        assert_eq!(registry.len(), 4);
        let foo = registry.get_infos("a foo");
        assert_eq!(foo.len(), 1);
        assert!(foo[0].has_alias);
        assert_eq!(foo[0].aliases, vec!["a foo", "a bar"]);
        assert_eq!(foo[0].span.get(), Span::new(5, 0, 7, 8));
        let hello = registry.get_infos("say hello");
        assert!(!hello[0].has_alias);
        assert!(hello[0].aliases.is_empty());
    }

    #[test]
    fn queries() {
        let registry = registry();
        assert!(registry.is_implemented("a bar"));
        assert!(!registry.is_implemented("a baz"));
        assert!(registry.has_multiple_implementations("say hello"));
        assert!(!registry.has_multiple_implementations("a foo"));
        assert_eq!(registry.steps_in_file(Path::new("b.py")).len(), 3);
        let order: Vec<&str> = registry.all_steps().iter().map(|s| s.text.as_str()).collect();
        assert_eq!(order, vec!["say hello", "a foo", "a bar", "say hello"]);
    }

    #[test]
    fn remove_only_touches_one_file() {
        let mut registry = registry();
        registry.remove_steps(Path::new("b.py"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.all_steps()[0].function_name, "hello");
        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn item_for_output() {
        let registry = registry();
        let item = registry.get_infos("a bar")[0].to_item();
        assert_eq!(item.text, "a bar");
        assert_eq!(item.function, "foo");
        assert_eq!(item.file, "b.py");
        assert!(item.has_alias);
    }
}
