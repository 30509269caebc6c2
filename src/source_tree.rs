//! Parsed step files.
//!
//! A [`SourceTree`] owns the lossless syntax tree of exactly one file. The
//! tree sits behind `Rc<RefCell<..>>` so that deferred spans handed out during
//! discovery can look at it again later, after the caller has moved on.

use std::cell::{Ref, RefCell, RefMut};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use steptool_python_cst::{parse_module, Module, ParserError, HERE_MARKER};
use tracing::debug;

use crate::report::Reporter;

/// One parsed source file.
#[derive(Debug)]
pub struct SourceTree {
    module: Rc<RefCell<Module>>,
    file_path: PathBuf,
}

impl SourceTree {
    /// Parse `content`, or the file at `file_path` when `content` is `None`.
    ///
    /// Failures to read or parse are reported and yield `None`. `file_path`
    /// is otherwise only used in messages and as the default target of
    /// [`SourceTree::save`].
    pub fn parse(
        file_path: impl Into<PathBuf>,
        content: Option<&str>,
        reporter: &dyn Reporter,
    ) -> Option<Self> {
        let file_path = file_path.into();
        let owned;
        let text = match content {
            Some(text) => text,
            None => match fs::read_to_string(&file_path) {
                Ok(text) => {
                    owned = text;
                    owned.as_str()
                }
                Err(err) => {
                    reporter.report(&format!(
                        "Failed to read {}: {}",
                        file_path.display(),
                        err
                    ));
                    return None;
                }
            },
        };
        match Self::parse_source(&file_path, text) {
            Ok(tree) => Some(tree),
            Err(err) => {
                reporter.report(&parse_failure_message(&file_path, &err));
                None
            }
        }
    }

    /// Parse `content` and return the parser error on failure.
    pub fn parse_source(file_path: impl Into<PathBuf>, content: &str) -> Result<Self, ParserError> {
        let file_path = file_path.into();
        let module = parse_module(content)?;
        debug!(
            file = %file_path.display(),
            statements = module.body.len(),
            "Parsed source file"
        );
        Ok(SourceTree {
            module: Rc::new(RefCell::new(module)),
            file_path,
        })
    }

    /// The path this tree was parsed from.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// The current source text, including any edits made to the tree.
    pub fn dumps(&self) -> String {
        self.module.borrow().code()
    }

    /// Write [`SourceTree::dumps`] to `path`, or back to the original file.
    pub fn save(&self, path: Option<&Path>) -> io::Result<()> {
        let target = path.unwrap_or(&self.file_path);
        fs::write(target, self.dumps())?;
        debug!(file = %target.display(), "Saved source file");
        Ok(())
    }

    /// Shared access to the syntax tree.
    pub fn module(&self) -> Ref<'_, Module> {
        self.module.borrow()
    }

    /// Exclusive access to the syntax tree.
    pub fn module_mut(&mut self) -> RefMut<'_, Module> {
        self.module.borrow_mut()
    }

    pub(crate) fn shared_module(&self) -> Rc<RefCell<Module>> {
        Rc::clone(&self.module)
    }
}

/// `"Failed to parse <path>: <error>"`, with the error cut off after its
/// "here" marker so the trailing source listing is not repeated.
pub fn parse_failure_message(file_path: &Path, err: &ParserError) -> String {
    let mut message = err.to_string();
    if let Some(index) = message.find(HERE_MARKER) {
        if index > 0 {
            message.truncate(index + HERE_MARKER.len());
        }
    }
    format!("Failed to parse {}: {}", file_path.display(), message)
}
