//! Dropping findings silenced by suppression comments.

use crate::rules::finding::RuleFinding;
use crate::suppression::model::Suppression;

/// Keep the findings no suppression in the same file covers.
pub fn filter_suppressed_findings(
    findings: Vec<RuleFinding>,
    suppressions: &[Suppression],
) -> Vec<RuleFinding> {
    if suppressions.is_empty() {
        return findings;
    }

    findings
        .into_iter()
        .filter(|finding| {
            let silenced = suppressions
                .iter()
                .any(|s| s.matches_rule(&finding.rule_id) && s.covers_line(finding.line));
            if silenced {
                tracing::debug!(
                    rule_id = %finding.rule_id,
                    path = %finding.file_path,
                    line = ?finding.line,
                    "finding suppressed by comment"
                );
            }
            !silenced
        })
        .collect()
}
