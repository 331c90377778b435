//! The structured in-place file patcher (spec §4.G).
//!
//! A diff is one or more concatenated blocks of the form:
//!
//! ```text
//! <<<<<<< ORIGINAL
//! <search text, possibly multiline>
//! =======
//! <replacement text, possibly multiline>
//! >>>>>>> UPDATED
//! ```
//!
//! Blocks are applied to the target file in document order. A block whose
//! search text is not found in the file's current bytes is skipped with a
//! warning; the file is left byte-identical for that block.

pub mod error;

pub use error::PatchError;

use std::path::{Component, Path, PathBuf};

const BEGIN_MARKER: &str = "<<<<<<< ORIGINAL";
const SEP_MARKER: &str = "=======";
const END_MARKER: &str = ">>>>>>> UPDATED";

/// Line-encoded sentinel the diff may use in place of a literal newline so
/// it can travel as a single command-line argument (spec §4.G).
const NEWLINE_SENTINEL: &str = "<NL>";

/// Result of a successful `apply_patch` call. Diagnostics the caller should
/// surface verbatim to the user live in `warnings`.
#[derive(Debug, Clone, Default)]
pub struct PatchReport {
    /// `true` when the target file did not exist and was created empty
    /// before any blocks were applied.
    pub created_file: bool,
    /// One `WARNING: Search text not found: '...'` line per missed block.
    pub warnings: Vec<String>,
    /// Number of blocks whose search text was found and replaced.
    pub applied_blocks: usize,
}

struct Block {
    search: String,
    replacement: String,
}

/// Apply `diff_text` to `target` (resolved relative to `cwd` if not already
/// absolute). `target` must be a strict descendant of `cwd`.
pub fn apply_patch(cwd: &Path, target: &Path, diff_text: &str) -> Result<PatchReport, PatchError> {
    let absolute_target = lexically_normalize(&if target.is_absolute() {
        target.to_path_buf()
    } else {
        cwd.join(target)
    });
    let absolute_cwd = lexically_normalize(cwd);

    if absolute_target == absolute_cwd {
        return Err(PatchError::PathIsCwd);
    }
    if !absolute_target.starts_with(&absolute_cwd) {
        return Err(PatchError::PathOutsideCwd);
    }

    let blocks = parse_blocks(diff_text);
    if blocks.is_empty() {
        return Err(PatchError::NoValidBlocks);
    }

    let mut report = PatchReport::default();
    let mut contents = if absolute_target.exists() {
        std::fs::read_to_string(&absolute_target).unwrap_or_default()
    } else {
        report.created_file = true;
        String::new()
    };

    for block in &blocks {
        if block.search.trim().is_empty() {
            // Open question (spec §9) resolved: empty ORIGINAL means append
            // the replacement once, never search.
            contents.push_str(&block.replacement);
            report.applied_blocks += 1;
            continue;
        }

        match contents.find(block.search.as_str()) {
            Some(pos) => {
                contents.replace_range(pos..pos + block.search.len(), &block.replacement);
                report.applied_blocks += 1;
            }
            None => {
                let preview: String = block.search.chars().take(80).collect();
                report
                    .warnings
                    .push(format!("WARNING: Search text not found: '{preview}'"));
            }
        }
    }

    if let Some(parent) = absolute_target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&absolute_target, contents)?;

    Ok(report)
}

/// Splits `<NL>`-encoded newlines back to real ones, then parses the
/// conflict-marker blocks in document order. Malformed trailing markers
/// (a `BEGIN` with no matching `SEP`/`END`) are dropped rather than
/// producing a partial block.
fn parse_blocks(diff_text: &str) -> Vec<Block> {
    let normalized = diff_text.replace(NEWLINE_SENTINEL, "\n");
    let lines: Vec<&str> = normalized.lines().collect();

    let mut blocks = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if lines[i] != BEGIN_MARKER {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < lines.len() && lines[j] != SEP_MARKER {
            j += 1;
        }
        if j >= lines.len() {
            break;
        }
        let search_lines = &lines[i + 1..j];

        let mut k = j + 1;
        while k < lines.len() && lines[k] != END_MARKER {
            k += 1;
        }
        if k >= lines.len() {
            break;
        }
        let replacement_lines = &lines[j + 1..k];

        blocks.push(Block {
            search: search_lines.join("\n"),
            replacement: replacement_lines.join("\n"),
        });

        i = k + 1;
    }

    blocks
}

/// Normalizes `.`/`..` components without touching the filesystem (the
/// target file may not exist yet, so `canonicalize` isn't an option).
fn lexically_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}
