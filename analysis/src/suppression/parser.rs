//! Scanning JavaScript/TypeScript source for suppression comments.

use crate::suppression::model::{Suppression, SuppressionScope};

const SUPPRESSION_MARKER: &str = "loopfix-ignore:";

/// Header comments past this line never apply file-wide.
const FILE_LEVEL_MAX_LINE: u32 = 10;

/// Find every `loopfix-ignore:` directive in `source`.
///
/// The marker only counts inside a `//` or `/* */` comment on the same
/// line. Scope is decided from the comment's position:
///
/// ```text
/// // loopfix-ignore: typescript.no_async_in_foreach - header, whole file
/// run(); // loopfix-ignore: * - this line only
/// // loopfix-ignore: no_async_in_foreach -- the next line
/// ```
pub fn parse_suppressions(source: &str) -> Vec<Suppression> {
    let mut suppressions = Vec::new();
    let mut seen_code = false;

    for (idx, line) in source.lines().enumerate() {
        let line_num = (idx + 1) as u32;

        if let Some(pos) = line.find(SUPPRESSION_MARKER) {
            let before = &line[..pos];
            if let Some(comment_start) = comment_start(before) {
                let has_code_before = !before[..comment_start].trim().is_empty();
                let scope = if has_code_before {
                    SuppressionScope::SameLine
                } else if !seen_code && line_num <= FILE_LEVEL_MAX_LINE {
                    SuppressionScope::File
                } else {
                    SuppressionScope::NextLine
                };

                let (rule_ids, reason) = parse_rule_ids_and_reason(&line[pos + SUPPRESSION_MARKER.len()..]);
                suppressions.push(Suppression {
                    rule_ids,
                    scope,
                    comment_line: line_num,
                    reason,
                });
            }
        }

        if !seen_code && is_code_line(line) {
            seen_code = true;
        }
    }

    suppressions
}

/// Byte offset of the comment opener that precedes the marker.
fn comment_start(before_marker: &str) -> Option<usize> {
    match (before_marker.rfind("//"), before_marker.rfind("/*")) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

/// Header lines that do not end the file-level window: blanks, comments,
/// a shebang, directive prologues and imports.
fn is_code_line(line: &str) -> bool {
    let trimmed = line.trim();
    let header = trimmed.is_empty()
        || trimmed.starts_with("//")
        || trimmed.starts_with("/*")
        || trimmed.starts_with('*')
        || trimmed.starts_with("#!")
        || trimmed.starts_with("'use ")
        || trimmed.starts_with("\"use ")
        || trimmed.starts_with("import ");
    !header
}

/// Split `ids, more - reason` into the id list and the reason.
fn parse_rule_ids_and_reason(text: &str) -> (Vec<String>, Option<String>) {
    let text = text.trim().trim_end_matches("*/").trim_end();
    // dangling separator with no reason
    let text = text
        .strip_suffix(" --")
        .or_else(|| text.strip_suffix(" -"))
        .unwrap_or(text);

    let (ids, reason) = match text.find(" -- ").map(|p| (p, 4)).or_else(|| text.find(" - ").map(|p| (p, 3))) {
        Some((pos, sep)) => (&text[..pos], Some(text[pos + sep..].trim().to_string())),
        None => (text, None),
    };

    let rule_ids = ids
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    (rule_ids, reason.filter(|r| !r.is_empty()))
}
