//! Declarative run plans
//!
//! A run plan is a TOML file describing one decomposition run: the source
//! document, where extracted documents go, the payload dialect, the
//! preamble, the regions to extract and remove, and the patch rules to
//! apply to what remains. All line numbers refer to the source document as
//! it exists before the run mutates anything.

use crate::extractor::DialectConfig;
use crate::preamble::Preamble;
use crate::region::Region;
use crate::rewriter::PatchRule;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunPlan {
    /// The monolith being decomposed.
    pub source: PathBuf,

    /// Directory extracted documents are written into.
    pub dest_dir: PathBuf,

    /// Appended to a region name to form its file name.
    #[serde(default)]
    pub dest_suffix: String,

    /// Phase label, recorded on the backup snapshot.
    pub label: String,

    #[serde(default)]
    pub dialect: DialectConfig,

    #[serde(default)]
    pub preamble: Preamble,

    #[serde(default)]
    pub extract: Vec<Region>,

    #[serde(default)]
    pub remove: Vec<Region>,

    #[serde(default)]
    pub patch: Vec<PatchRule>,
}

impl RunPlan {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan file: {}", path.display()))?;

        let plan: RunPlan = toml::from_str(&content)
            .with_context(|| format!("Failed to parse plan file: {}", path.display()))?;

        plan.validate()?;
        Ok(plan)
    }

    fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            anyhow::bail!("Plan label must not be empty");
        }
        if self.extract.is_empty() && self.remove.is_empty() && self.patch.is_empty() {
            anyhow::bail!("Plan contains no extract, remove, or patch entries");
        }
        Ok(())
    }

    /// Name-to-path resolution for extracted documents.
    pub fn dest_for(&self, name: &str) -> PathBuf {
        self.dest_dir.join(format!("{}{}", name, self.dest_suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewriter::ReplaceScope;

    const PLAN: &str = r#"
source = "App.tsx"
dest_dir = "components/views"
dest_suffix = ".tsx"
label = "phase4"

[dialect]
declaration_keyword = "const"
visibility_marker = "export "

[preamble]
header = ["import React from 'react';"]

[preamble.supplements]
EventsView = ["import { api } from './services/api';"]

[[extract]]
name = "EventsView"
start = 959
end = 1093

[[remove]]
name = "EventsView"
start = 959
end = 1093

[[patch]]
kind = "anchor-insert"
anchor = "from './components/ui';"
line = "import { EventsView } from './components/views';"

[[patch]]
kind = "replace"
old = "view === 'events'"
new = "activeView === 'events'"
scope = "all"
expect = 2
"#;

    #[test]
    fn test_parse_full_plan() {
        let plan: RunPlan = toml::from_str(PLAN).unwrap();

        assert_eq!(plan.label, "phase4");
        assert_eq!(plan.extract.len(), 1);
        assert_eq!(plan.extract[0].name, "EventsView");
        assert_eq!(plan.extract[0].start, 959);
        assert_eq!(plan.remove.len(), 1);
        assert_eq!(plan.patch.len(), 2);

        match &plan.patch[1] {
            PatchRule::Replace { scope, expect, .. } => {
                assert_eq!(*scope, ReplaceScope::All);
                assert_eq!(*expect, Some(2));
            }
            other => panic!("expected replace rule, got {other:?}"),
        }
    }

    #[test]
    fn test_replace_scope_defaults_to_first() {
        let plan: RunPlan = toml::from_str(
            r#"
source = "a.txt"
dest_dir = "out"
label = "p1"

[[patch]]
kind = "replace"
old = "x"
new = "y"
"#,
        )
        .unwrap();

        match &plan.patch[0] {
            PatchRule::Replace { scope, expect, .. } => {
                assert_eq!(*scope, ReplaceScope::First);
                assert!(expect.is_none());
            }
            other => panic!("expected replace rule, got {other:?}"),
        }
    }

    #[test]
    fn test_dest_for_joins_name_and_suffix() {
        let plan: RunPlan = toml::from_str(PLAN).unwrap();
        assert_eq!(
            plan.dest_for("EventsView"),
            PathBuf::from("components/views/EventsView.tsx")
        );
    }

    #[test]
    fn test_empty_plan_rejected() {
        let plan: RunPlan = toml::from_str(
            r#"
source = "a.txt"
dest_dir = "out"
label = "p1"
"#,
        )
        .unwrap();
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_blank_label_rejected() {
        let plan: RunPlan = toml::from_str(
            r#"
source = "a.txt"
dest_dir = "out"
label = "  "

[[remove]]
name = "X"
start = 1
end = 2
"#,
        )
        .unwrap();
        assert!(plan.validate().is_err());
    }
}
