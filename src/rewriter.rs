//! Anchor-based literal patching
//!
//! Two narrow operations: insert a line after the first line containing an
//! anchor substring, and replace a literal substring (first match or every
//! match). No pattern language: behavior must be predictable enough to
//! audit by eye, and every rule reports where it matched so a human can
//! catch an unrelated incidental match.

use crate::document::Document;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplaceScope {
    /// Replace only the first occurrence in the first matching line.
    #[default]
    First,
    /// Replace every occurrence in every line.
    All,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PatchRule {
    /// Insert `line` immediately after the first line containing `anchor`.
    AnchorInsert { anchor: String, line: String },

    /// Replace literal `old` with `new`, per `scope`. When `expect` is
    /// set, a differing match count fails the rule instead of applying.
    Replace {
        old: String,
        new: String,
        #[serde(default)]
        scope: ReplaceScope,
        #[serde(default)]
        expect: Option<usize>,
    },
}

impl PatchRule {
    /// Short rule description for reports and errors.
    pub fn describe(&self) -> String {
        match self {
            PatchRule::AnchorInsert { anchor, .. } => format!("insert after '{anchor}'"),
            PatchRule::Replace { old, new, .. } => format!("replace '{old}' -> '{new}'"),
        }
    }
}

/// A line where a rule's needle occurred, for the report surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchMatch {
    pub line_number: usize,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct PatchOutcome {
    pub rule: String,
    /// Every line the needle occurred on, whether or not it was edited.
    pub matches: Vec<PatchMatch>,
    /// Occurrences actually rewritten or lines inserted.
    pub applied: usize,
    /// True when an AnchorInsert found its line already in place.
    pub already_present: bool,
}

impl PatchOutcome {
    pub fn was_noop(&self) -> bool {
        self.applied == 0 && !self.already_present
    }
}

pub struct PatternRewriter;

impl PatternRewriter {
    pub fn apply(document: &mut Document, rule: &PatchRule) -> Result<PatchOutcome, EngineError> {
        match rule {
            PatchRule::AnchorInsert { anchor, line } => {
                Ok(Self::apply_anchor_insert(document, anchor, line))
            }
            PatchRule::Replace {
                old,
                new,
                scope,
                expect,
            } => Self::apply_replace(document, rule, old, new, *scope, *expect),
        }
    }

    fn apply_anchor_insert(document: &mut Document, anchor: &str, line: &str) -> PatchOutcome {
        let matches = find_matches(document, anchor);

        let Some(first) = matches.first() else {
            // No anchor: a reported no-op, never fatal.
            return PatchOutcome {
                rule: format!("insert after '{anchor}'"),
                matches,
                applied: 0,
                already_present: false,
            };
        };

        // Reruns must converge: if the line is already right after the
        // anchor, there is nothing to do.
        let after = first.line_number + 1;
        if document.lines().get(after - 1).map(String::as_str) == Some(line) {
            return PatchOutcome {
                rule: format!("insert after '{anchor}'"),
                matches,
                applied: 0,
                already_present: true,
            };
        }

        document.insert_line(after, line.to_string());
        PatchOutcome {
            rule: format!("insert after '{anchor}'"),
            matches,
            applied: 1,
            already_present: false,
        }
    }

    fn apply_replace(
        document: &mut Document,
        rule: &PatchRule,
        old: &str,
        new: &str,
        scope: ReplaceScope,
        expect: Option<usize>,
    ) -> Result<PatchOutcome, EngineError> {
        let matches = find_matches(document, old);
        let total_occurrences: usize = matches
            .iter()
            .map(|m| m.text.matches(old).count())
            .sum();

        if let Some(expected) = expect
            && total_occurrences != expected
        {
            return Err(EngineError::AmbiguousPatchMatch {
                rule: rule.describe(),
                expected,
                found: total_occurrences,
            });
        }

        let applied = match scope {
            ReplaceScope::First => {
                if let Some(first) = matches.first() {
                    let rewritten = first.text.replacen(old, new, 1);
                    document.replace_line(first.line_number, rewritten);
                    1
                } else {
                    0
                }
            }
            ReplaceScope::All => {
                for m in &matches {
                    let rewritten = m.text.replace(old, new);
                    document.replace_line(m.line_number, rewritten);
                }
                total_occurrences
            }
        };

        Ok(PatchOutcome {
            rule: rule.describe(),
            matches,
            applied,
            already_present: false,
        })
    }
}

fn find_matches(document: &Document, needle: &str) -> Vec<PatchMatch> {
    document
        .lines()
        .iter()
        .enumerate()
        .filter(|(_, line)| line.contains(needle))
        .map(|(i, line)| PatchMatch {
            line_number: i + 1,
            text: line.clone(),
        })
        .collect()
}
