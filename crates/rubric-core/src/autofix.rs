//! Text edits and their application
//!
//! Rules never touch the syntax tree; corrections are byte-range
//! replacements collected in a [`Corrector`] and applied in one pass against
//! the original text, so every range stays valid no matter how many edits
//! precede it.

use biome_text_size::TextRange;
use std::path::Path;

use crate::{Result, RubricError};

/// Replace `range` of the original source with `replacement`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub range: TextRange,
    pub replacement: String,
}

impl Edit {
    pub fn new(range: TextRange, replacement: impl Into<String>) -> Self {
        Self {
            range,
            replacement: replacement.into(),
        }
    }

    /// Edits conflict when their ranges share at least one byte
    ///
    /// Two insertions at the same offset also conflict, since their order
    /// would be ambiguous.
    pub fn conflicts_with(&self, other: &Edit) -> bool {
        let (start, end) = self.span();
        let (other_start, other_end) = other.span();
        if start == end && other_start == other_end {
            return start == other_start;
        }
        start < other_end && other_start < end
    }

    /// Get the span of this edit as (start, end) byte offsets
    pub fn span(&self) -> (usize, usize) {
        (usize::from(self.range.start()), usize::from(self.range.end()))
    }
}

/// Pairwise non-overlapping edits for one source text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corrector {
    edits: Vec<Edit>,
}

impl Corrector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edit
    ///
    /// A rule proposing overlapping edits is a bug in the rule; debug builds
    /// assert on it.
    pub fn replace(&mut self, range: TextRange, replacement: impl Into<String>) {
        let edit = Edit::new(range, replacement);
        debug_assert!(
            !self.edits.iter().any(|existing| existing.conflicts_with(&edit)),
            "overlapping edit {edit:?}"
        );
        self.edits.push(edit);
    }

    /// Move all edits of `other` into this corrector if none of them
    /// conflicts with an edit already here; otherwise leave both unchanged
    ///
    /// Returns whether the merge happened.
    pub fn merge(&mut self, other: &mut Corrector) -> bool {
        let conflicting = other
            .edits
            .iter()
            .any(|edit| self.edits.iter().any(|existing| existing.conflicts_with(edit)));
        if conflicting {
            return false;
        }
        self.edits.append(&mut other.edits);
        true
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Apply all edits to `source`, which must be the text the ranges were
    /// taken from
    pub fn apply(&self, source: &str) -> Result<String> {
        let mut edits: Vec<&Edit> = self.edits.iter().collect();
        edits.sort_by_key(|edit| edit.span());

        let mut output = String::with_capacity(source.len());
        let mut cursor = 0;
        for edit in edits {
            let (start, end) = edit.span();
            if start < cursor {
                return Err(RubricError::autofix_error(format!(
                    "edit at {start}..{end} overlaps a previous edit"
                )));
            }
            let (Some(kept), Some(_)) = (source.get(cursor..start), source.get(start..end)) else {
                return Err(RubricError::autofix_error(format!(
                    "edit at {start}..{end} is outside the source ({} bytes)",
                    source.len()
                )));
            };
            output.push_str(kept);
            output.push_str(&edit.replacement);
            cursor = end;
        }
        output.push_str(&source[cursor..]);
        Ok(output)
    }
}

/// Generate a unified diff between original and modified content
pub fn generate_unified_diff(
    original: &str,
    modified: &str,
    file_path: &Path,
    colorize: bool,
) -> String {
    use similar::{ChangeTag, TextDiff};

    let diff = TextDiff::from_lines(original, modified);
    let mut output = String::new();

    if colorize {
        output.push_str(&format!("\x1b[1m--- {}\x1b[0m\n", file_path.display()));
        output.push_str(&format!("\x1b[1m+++ {} (fixed)\x1b[0m\n", file_path.display()));
    } else {
        output.push_str(&format!("--- {}\n", file_path.display()));
        output.push_str(&format!("+++ {} (fixed)\n", file_path.display()));
    }

    for group in diff.grouped_ops(3) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let old_start = first.old_range().start;
        let new_start = first.new_range().start;
        let old_len = last.old_range().end - old_start;
        let new_len = last.new_range().end - new_start;

        let header = format!(
            "@@ -{},{} +{},{} @@",
            old_start + 1,
            old_len,
            new_start + 1,
            new_len
        );
        if colorize {
            output.push_str(&format!("\x1b[36m{header}\x1b[0m\n"));
        } else {
            output.push_str(&header);
            output.push('\n');
        }

        for op in &group {
            for change in diff.iter_changes(op) {
                let (sign, color) = match change.tag() {
                    ChangeTag::Delete => ('-', "\x1b[31m"),
                    ChangeTag::Insert => ('+', "\x1b[32m"),
                    ChangeTag::Equal => (' ', ""),
                };
                let line = change.value();
                if colorize && !color.is_empty() {
                    output.push_str(&format!("{color}{sign}{line}\x1b[0m"));
                } else {
                    output.push(sign);
                    output.push_str(line);
                }
                if !line.ends_with('\n') {
                    output.push('\n');
                }
            }
        }
    }

    output
}
