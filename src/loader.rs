//! Loading step files into a [`StepSink`].

use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::Config;
use crate::registry::StepSink;
use crate::report::Reporter;
use crate::source_tree::SourceTree;
use crate::steps::iter_steps;

/// Register every step of a parsed file. Returns the number of step
/// implementations added.
pub fn load_steps(
    tree: &SourceTree,
    sink: &mut dyn StepSink,
    decorator: &str,
    reporter: &dyn Reporter,
) -> usize {
    let mut count = 0;
    for function_steps in iter_steps(tree, decorator, reporter) {
        sink.add_step(
            function_steps.steps,
            &function_steps.function_name,
            &function_steps.file_path,
            function_steps.span,
        );
        count += 1;
    }
    debug!(file = %tree.file_path().display(), steps = count, "Loaded steps");
    count
}

/// Re-parse one file, from `content` when given, and replace its steps.
///
/// When the file does not parse, its previously registered steps are kept
/// and `false` is returned.
pub fn reload_steps(
    file_path: &Path,
    content: Option<&str>,
    sink: &mut dyn StepSink,
    config: &Config,
    reporter: &dyn Reporter,
) -> bool {
    let Some(tree) = SourceTree::parse(file_path, content, reporter) else {
        return false;
    };
    sink.remove_steps(file_path);
    load_steps(&tree, sink, &config.decorator, reporter);
    true
}

/// Walk `dir` and load every step file in it. Returns the number of files
/// that parsed.
///
/// Directories named in the configured exclude list are not entered.
/// Entries that cannot be read are reported and skipped.
pub fn load_files(
    dir: &Path,
    sink: &mut dyn StepSink,
    config: &Config,
    reporter: &dyn Reporter,
) -> usize {
    let mut loaded = 0;
    let walker = WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !config.is_excluded(&entry.file_name().to_string_lossy())
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                reporter.report(&format!("Failed to read {}: {}", dir.display(), err));
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || !config.matches_extension(path) {
            continue;
        }
        if let Some(tree) = SourceTree::parse(path, None, reporter) {
            load_steps(&tree, sink, &config.decorator, reporter);
            loaded += 1;
        }
    }

    info!(dir = %dir.display(), files = loaded, "Loaded step files");
    loaded
}
