//! Preamble synthesis for extracted documents
//!
//! Every extracted document starts with a fixed header plus whatever
//! supplementary declaration lines the plan keys to the region's name.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preamble {
    /// Declaration lines shared by every extracted document.
    #[serde(default)]
    pub header: Vec<String>,

    /// Extra declaration lines for specific region names.
    #[serde(default)]
    pub supplements: BTreeMap<String, Vec<String>>,
}

impl Preamble {
    /// Header lines followed by the named supplement, with supplement lines
    /// that duplicate a header line dropped.
    pub fn resolve(&self, name: &str) -> Vec<String> {
        let mut lines = self.header.clone();
        if let Some(extra) = self.supplements.get(name) {
            for line in extra {
                if !lines.contains(line) {
                    lines.push(line.clone());
                }
            }
        }
        lines
    }
}
