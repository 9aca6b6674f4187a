//! Suppression directives found in source comments.

use serde::{Deserialize, Serialize};

/// One `loopfix-ignore:` comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suppression {
    /// Rule patterns this comment silences.
    ///
    /// An empty list and `*` both match every rule. `typescript.*` matches
    /// every rule in that family; a bare `no_async_in_foreach` matches the
    /// rule whose id ends in `.no_async_in_foreach`.
    pub rule_ids: Vec<String>,

    pub scope: SuppressionScope,

    /// 1-based line of the comment.
    pub comment_line: u32,

    /// Text after ` - ` or ` -- `, if any.
    pub reason: Option<String>,
}

impl Suppression {
    /// Whether this directive names `rule_id`.
    pub fn matches_rule(&self, rule_id: &str) -> bool {
        if self.rule_ids.is_empty() {
            return true;
        }

        self.rule_ids.iter().any(|pattern| {
            if pattern == "*" || pattern == rule_id {
                return true;
            }
            if let Some(family) = pattern.strip_suffix('*') {
                if family.ends_with('.') && rule_id.starts_with(family) {
                    return true;
                }
            }
            !pattern.contains('.')
                && rule_id
                    .rsplit_once('.')
                    .is_some_and(|(_, short)| short == pattern)
        })
    }

    /// Whether this directive covers a finding reported on `line` (1-based).
    pub fn covers_line(&self, line: Option<u32>) -> bool {
        match self.scope {
            SuppressionScope::File => true,
            SuppressionScope::NextLine => line == Some(self.comment_line + 1),
            SuppressionScope::SameLine => line == Some(self.comment_line),
        }
    }
}

/// Where a suppression applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuppressionScope {
    /// The whole file. The comment sits in the file header: within the first
    /// lines and before any code.
    File,
    /// The line after a comment that stands on its own line.
    NextLine,
    /// The line the comment trails.
    SameLine,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suppression(ids: &[&str], scope: SuppressionScope, line: u32) -> Suppression {
        Suppression {
            rule_ids: ids.iter().map(|s| s.to_string()).collect(),
            scope,
            comment_line: line,
            reason: None,
        }
    }

    const RULE: &str = "typescript.no_async_in_foreach";

    #[test]
    fn exact_id_matches() {
        let s = suppression(&[RULE], SuppressionScope::File, 1);
        assert!(s.matches_rule(RULE));
        assert!(!s.matches_rule("typescript.other"));
    }

    #[test]
    fn wildcards_match() {
        assert!(suppression(&["*"], SuppressionScope::File, 1).matches_rule(RULE));
        assert!(suppression(&[], SuppressionScope::File, 1).matches_rule(RULE));
        assert!(suppression(&["typescript.*"], SuppressionScope::File, 1).matches_rule(RULE));
        assert!(!suppression(&["python.*"], SuppressionScope::File, 1).matches_rule(RULE));
    }

    #[test]
    fn short_form_matches_the_last_segment_only() {
        assert!(suppression(&["no_async_in_foreach"], SuppressionScope::File, 1).matches_rule(RULE));
        assert!(!suppression(&["async_in_foreach"], SuppressionScope::File, 1).matches_rule(RULE));
    }

    #[test]
    fn line_coverage_follows_scope() {
        let next = suppression(&["*"], SuppressionScope::NextLine, 4);
        assert!(next.covers_line(Some(5)));
        assert!(!next.covers_line(Some(4)));
        assert!(!next.covers_line(None));

        let same = suppression(&["*"], SuppressionScope::SameLine, 4);
        assert!(same.covers_line(Some(4)));
        assert!(!same.covers_line(Some(5)));

        assert!(suppression(&["*"], SuppressionScope::File, 2).covers_line(None));
    }

    #[test]
    fn suppression_serializes_scope_by_name() {
        let s = Suppression {
            reason: Some("sequential on purpose".to_string()),
            ..suppression(&[RULE], SuppressionScope::NextLine, 7)
        };
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["scope"], "NextLine");
        assert_eq!(json["reason"], "sequential on purpose");
    }
}
