//! Region extraction
//!
//! Copies a region's lines into a new self-contained document: resolved
//! preamble first, then the body, with the region's declaration line marked
//! externally visible if it was not already. The declaration is located by
//! structural match on `"<keyword> <name>"`, never by a fixed offset,
//! which would break as soon as the body has been re-sliced.

use crate::document::Document;
use crate::error::EngineError;
use crate::region::Region;
use serde::{Deserialize, Serialize};

/// How declarations look in the payload dialect. The engine never parses
/// the payload; these two strings are all it knows about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialectConfig {
    /// Keyword introducing a unit declaration, e.g. `const` or `fn`.
    pub declaration_keyword: String,
    /// Prefix that marks a declaration externally visible, e.g. `export `.
    pub visibility_marker: String,
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self {
            declaration_keyword: "const".to_string(),
            visibility_marker: "export ".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub name: String,
    pub content: String,
    pub body_lines: usize,
    /// True when the extractor had to rewrite the declaration line to add
    /// the visibility marker.
    pub marker_added: bool,
}

pub struct RegionExtractor<'a> {
    dialect: &'a DialectConfig,
}

impl<'a> RegionExtractor<'a> {
    pub fn new(dialect: &'a DialectConfig) -> Self {
        Self { dialect }
    }

    pub fn extract(
        &self,
        document: &Document,
        region: &Region,
        preamble_lines: &[String],
    ) -> Result<ExtractedDocument, EngineError> {
        let mut body: Vec<String> = document.slice(region.start, region.end).to_vec();

        // Trailing blank lines in the slice would float between body and
        // the final newline; drop them.
        while body.last().is_some_and(|l| l.trim().is_empty()) {
            body.pop();
        }

        let marker_added = self.ensure_visibility_marker(&mut body, &region.name)?;

        let mut lines: Vec<String> = preamble_lines
            .iter()
            .filter(|l| !body.contains(*l))
            .cloned()
            .collect();
        if !lines.is_empty() {
            lines.push(String::new());
        }
        let body_lines = body.len();
        lines.extend(body);

        let mut content = lines.join("\n");
        if !content.ends_with('\n') {
            content.push('\n');
        }

        Ok(ExtractedDocument {
            name: region.name.clone(),
            content,
            body_lines,
            marker_added,
        })
    }

    /// Make sure the body declares `name` as externally visible. Returns
    /// true if the declaration line had to be rewritten, false if the
    /// marker was already present.
    fn ensure_visibility_marker(
        &self,
        body: &mut [String],
        name: &str,
    ) -> Result<bool, EngineError> {
        let declaration = format!("{} {}", self.dialect.declaration_keyword, name);
        let visible = format!("{}{}", self.dialect.visibility_marker, declaration);

        if body.iter().any(|l| l.contains(&visible)) {
            return Ok(false);
        }

        for line in body.iter_mut() {
            if line.contains(&declaration) {
                *line = line.replacen(&declaration, &visible, 1);
                return Ok(true);
            }
        }

        Err(EngineError::MissingDeclaration {
            name: name.to_string(),
            keyword: self.dialect.declaration_keyword.clone(),
        })
    }
}
