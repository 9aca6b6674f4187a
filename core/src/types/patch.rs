// src/types/patch.rs
use serde::{Deserialize, Serialize};

use crate::parse::ast::FileId;
use similar::TextDiff;

/// A patch that applies multiple edits (hunks) to a single file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilePatch {
    pub file_id: FileId,
    pub hunks: Vec<PatchHunk>,
}

/// A single edit operation inside a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchHunk {
    pub range: PatchRange,
    pub replacement: String,
}

/// Where a hunk applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatchRange {
    /// Replace the byte range [start, end) with `replacement`.
    ReplaceBytes { start: usize, end: usize },
}

impl PatchRange {
    fn bounds(&self) -> (usize, usize) {
        match *self {
            PatchRange::ReplaceBytes { start, end } => (start, end),
        }
    }
}

impl FilePatch {
    /// Build a single-hunk patch replacing `[start, end)`.
    pub fn replace(file_id: FileId, start: usize, end: usize, replacement: String) -> Self {
        Self {
            file_id,
            hunks: vec![PatchHunk {
                range: PatchRange::ReplaceBytes { start, end },
                replacement,
            }],
        }
    }
}

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

/// Pick the hunks that can be applied together.
///
/// Hunks are ordered by start offset, wider hunks first on ties, and a hunk
/// is kept only if it starts at or after the end of the previously kept one.
/// An enclosing edit therefore wins over the edits nested inside it; the
/// nested ones are picked up by a later pass over the rewritten text.
pub fn non_overlapping_hunks(len: usize, hunks: &[PatchHunk]) -> Vec<(usize, usize, &str)> {
    let mut normalized: Vec<(usize, usize, &str)> = hunks
        .iter()
        .filter_map(|h| {
            let (start, end) = h.range.bounds();
            let s = start.min(len);
            let e = end.min(len);
            (s <= e).then_some((s, e, h.replacement.as_str()))
        })
        .collect();

    normalized.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

    let mut kept: Vec<(usize, usize, &str)> = Vec::with_capacity(normalized.len());
    let mut last_end = 0usize;
    for (start, end, repl) in normalized {
        if !kept.is_empty() && start < last_end {
            continue;
        }
        last_end = end;
        kept.push((start, end, repl));
    }
    kept
}

/// Apply a `FilePatch` to an in-memory file contents and return the new contents.
///
/// Works in byte offsets. Overlapping hunks are resolved with
/// [`non_overlapping_hunks`]; the survivors are applied right to left so
/// earlier ranges don't shift later ones.
pub fn apply_file_patch(original: &str, patch: &FilePatch) -> String {
    let mut text = original.to_string();

    for (start, end, repl) in non_overlapping_hunks(original.len(), &patch.hunks)
        .into_iter()
        .rev()
    {
        if !text.is_char_boundary(start) || !text.is_char_boundary(end) {
            continue;
        }
        text.replace_range(start..end, repl);
    }

    text
}

/// Build a unified diff string between `before` and `after` using `similar`.
pub fn make_unified_diff(path: &str, before: &str, after: &str) -> String {
    TextDiff::from_lines(before, after)
        .unified_diff()
        .context_radius(3)
        .header(path, path)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hunk(start: usize, end: usize, replacement: &str) -> PatchHunk {
        PatchHunk {
            range: PatchRange::ReplaceBytes { start, end },
            replacement: replacement.to_string(),
        }
    }

    #[test]
    fn replace_builds_single_hunk() {
        let patch = FilePatch::replace(FileId(3), 2, 5, "x".to_string());
        assert_eq!(patch.file_id, FileId(3));
        assert_eq!(patch.hunks, vec![hunk(2, 5, "x")]);
    }

    #[test]
    fn apply_file_patch_replace_bytes() {
        let patch = FilePatch {
            file_id: FileId(1),
            hunks: vec![hunk(0, 5, "hi")],
        };
        assert_eq!(apply_file_patch("hello world", &patch), "hi world");
    }

    #[test]
    fn apply_file_patch_replace_bytes_beyond_end() {
        let patch = FilePatch {
            file_id: FileId(1),
            hunks: vec![hunk(0, 100, "hi")],
        };
        // End is clamped to the text length
        assert_eq!(apply_file_patch("hello", &patch), "hi");
    }

    #[test]
    fn apply_file_patch_multiple_disjoint_hunks() {
        let patch = FilePatch {
            file_id: FileId(1),
            hunks: vec![hunk(6, 11, "there"), hunk(0, 5, "hey")],
        };
        assert_eq!(apply_file_patch("hello world", &patch), "hey there");
    }

    #[test]
    fn apply_file_patch_prefers_enclosing_hunk() {
        // outer(inner) where both the outer span and the inner span are rewritten
        let original = "outer(inner)";
        let patch = FilePatch {
            file_id: FileId(1),
            hunks: vec![hunk(6, 11, "INNER"), hunk(0, 12, "REPLACED")],
        };
        assert_eq!(apply_file_patch(original, &patch), "REPLACED");
    }

    #[test]
    fn apply_file_patch_skips_partial_overlap() {
        let patch = FilePatch {
            file_id: FileId(1),
            hunks: vec![hunk(0, 4, "A"), hunk(2, 6, "B")],
        };
        assert_eq!(apply_file_patch("abcdefgh", &patch), "Aefgh");
    }

    #[test]
    fn apply_file_patch_ignores_non_char_boundary() {
        let original = "é!";
        let patch = FilePatch {
            file_id: FileId(1),
            hunks: vec![hunk(1, 2, "x")],
        };
        assert_eq!(apply_file_patch(original, &patch), original);
    }

    #[test]
    fn apply_file_patch_empty_patch_is_identity() {
        let patch = FilePatch {
            file_id: FileId(1),
            hunks: vec![],
        };
        assert_eq!(apply_file_patch("unchanged", &patch), "unchanged");
    }

    #[test]
    fn non_overlapping_hunks_keeps_adjacent_edits() {
        let hunks = vec![hunk(0, 3, "a"), hunk(3, 6, "b")];
        let kept = non_overlapping_hunks(10, &hunks);
        assert_eq!(kept, vec![(0, 3, "a"), (3, 6, "b")]);
    }

    #[test]
    fn patch_range_serializes_with_kind_tag() {
        let range = PatchRange::ReplaceBytes { start: 1, end: 4 };
        let json = serde_json::to_string(&range).unwrap();
        assert!(json.contains("\"kind\":\"replace_bytes\""));
        let back: PatchRange = serde_json::from_str(&json).unwrap();
        assert_eq!(back, range);
    }

    #[test]
    fn make_unified_diff_shows_changed_lines() {
        let diff = make_unified_diff(
            "src/a.ts",
            "items.forEach(async (x) => await x);\n",
            "for (let x of items) {await x};\n",
        );
        assert!(diff.contains("--- src/a.ts"));
        assert!(diff.contains("+++ src/a.ts"));
        assert!(diff.contains("-items.forEach"));
        assert!(diff.contains("+for (let x of items)"));
    }

    #[test]
    fn make_unified_diff_identical_inputs_is_empty() {
        let diff = make_unified_diff("a.ts", "same\n", "same\n");
        assert!(!diff.contains("@@"));
    }
}
