//! Named line regions and their validation
//!
//! A `Region` is a named inclusive span of 1-indexed line numbers. Spans are
//! only meaningful against the document revision they were resolved from, so
//! validation produces a `RegionSet` stamped with that revision; mutating
//! components refuse sets resolved against any other revision.

use crate::document::Document;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub start: usize,
    pub end: usize,
}

impl Region {
    pub fn new(name: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            name: name.into(),
            start,
            end,
        }
    }

    pub fn line_count(&self) -> usize {
        self.end - self.start + 1
    }
}

/// A batch of validated regions, stamped with the document revision the
/// line numbers refer to.
#[derive(Debug, Clone)]
pub struct RegionSet {
    regions: Vec<Region>,
    revision: u64,
}

impl RegionSet {
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

pub struct LineAddressIndex;

impl LineAddressIndex {
    /// Validate a batch of spans against `document`: each must satisfy
    /// `1 <= start <= end <= line_count`, and no two may overlap. Regions
    /// are returned in the order supplied; nothing is clamped or reordered.
    pub fn resolve(document: &Document, regions: &[Region]) -> Result<RegionSet, EngineError> {
        let document_lines = document.line_count();

        for region in regions {
            if region.start == 0 || region.start > region.end || region.end > document_lines {
                return Err(EngineError::RegionBounds {
                    name: region.name.clone(),
                    start: region.start,
                    end: region.end,
                    document_lines,
                });
            }
        }

        // Pairwise disjointness, checked on a start-sorted view so each
        // region only needs comparing with its successor.
        let mut by_start: Vec<&Region> = regions.iter().collect();
        by_start.sort_by_key(|r| r.start);
        for pair in by_start.windows(2) {
            if pair[1].start <= pair[0].end {
                return Err(EngineError::RegionOverlap {
                    first: pair[0].name.clone(),
                    second: pair[1].name.clone(),
                });
            }
        }

        Ok(RegionSet {
            regions: regions.to_vec(),
            revision: document.revision(),
        })
    }
}
