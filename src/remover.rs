//! Region removal
//!
//! Deletes a validated batch of regions from a document in one pass.
//! Regions are processed in descending start order: deleting a span never
//! shifts line numbers below it, so every still-pending span stays valid.
//! Ascending or unsorted order would silently delete the wrong lines once
//! the first removal shifted everything after it.

use crate::document::Document;
use crate::error::EngineError;
use crate::region::RegionSet;

#[derive(Debug, Clone)]
pub struct RegionRemoval {
    pub name: String,
    pub lines_removed: usize,
}

#[derive(Debug, Clone)]
pub struct RemovalReport {
    /// Per-region counts, in processing (descending start) order.
    pub regions: Vec<RegionRemoval>,
    pub lines_before: usize,
    pub lines_after: usize,
}

impl RemovalReport {
    pub fn total_removed(&self) -> usize {
        self.regions.iter().map(|r| r.lines_removed).sum()
    }
}

pub struct RegionRemover;

impl RegionRemover {
    pub fn remove(
        document: &mut Document,
        regions: &RegionSet,
    ) -> Result<RemovalReport, EngineError> {
        // Spans are only valid against the revision they were resolved
        // from; refuse anything else rather than corrupt the document.
        if regions.revision() != document.revision() {
            return Err(EngineError::StaleAddresses {
                resolved: regions.revision(),
                current: document.revision(),
            });
        }

        let lines_before = document.line_count();

        let mut ordered: Vec<_> = regions.regions().to_vec();
        ordered.sort_by(|a, b| b.start.cmp(&a.start));

        let mut removed = Vec::with_capacity(ordered.len());
        for region in &ordered {
            document.remove_span(region.start, region.end);
            removed.push(RegionRemoval {
                name: region.name.clone(),
                lines_removed: region.line_count(),
            });
        }

        Ok(RemovalReport {
            regions: removed,
            lines_before,
            lines_after: document.line_count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::{LineAddressIndex, Region};

    fn doc(line_count: usize) -> Document {
        let lines = (1..=line_count).map(|i| format!("line {i}")).collect();
        Document::from_lines("test.txt", lines)
    }

    #[test]
    fn test_remove_single_region() {
        let mut document = doc(10);
        let set =
            LineAddressIndex::resolve(&document, &[Region::new("X", 3, 5)]).unwrap();

        let report = RegionRemover::remove(&mut document, &set).unwrap();

        assert_eq!(report.total_removed(), 3);
        assert_eq!(report.lines_before, 10);
        assert_eq!(report.lines_after, 7);
        let expected: Vec<String> = [1, 2, 6, 7, 8, 9, 10]
            .iter()
            .map(|i| format!("line {i}"))
            .collect();
        assert_eq!(document.lines(), expected.as_slice());
    }

    #[test]
    fn test_remove_two_regions_matches_original_addresses() {
        // Regions A(5-8) and B(10-12) on a 15-line document: the result
        // must equal the original minus exactly those spans, i.e. lines
        // [1-4, 9, 13-15].
        let mut document = doc(15);
        let set = LineAddressIndex::resolve(
            &document,
            &[Region::new("A", 5, 8), Region::new("B", 10, 12)],
        )
        .unwrap();

        let report = RegionRemover::remove(&mut document, &set).unwrap();

        let expected: Vec<String> = [1, 2, 3, 4, 9, 13, 14, 15]
            .iter()
            .map(|i| format!("line {i}"))
            .collect();
        assert_eq!(document.lines(), expected.as_slice());
        assert_eq!(report.total_removed(), 7);

        // Processing order is descending start: B before A.
        assert_eq!(report.regions[0].name, "B");
        assert_eq!(report.regions[1].name, "A");
    }

    #[test]
    fn test_supplied_order_does_not_matter() {
        let mut doc_a = doc(15);
        let set_a = LineAddressIndex::resolve(
            &doc_a,
            &[Region::new("A", 5, 8), Region::new("B", 10, 12)],
        )
        .unwrap();
        RegionRemover::remove(&mut doc_a, &set_a).unwrap();

        let mut doc_b = doc(15);
        let set_b = LineAddressIndex::resolve(
            &doc_b,
            &[Region::new("B", 10, 12), Region::new("A", 5, 8)],
        )
        .unwrap();
        RegionRemover::remove(&mut doc_b, &set_b).unwrap();

        assert_eq!(doc_a.lines(), doc_b.lines());
    }

    #[test]
    fn test_ascending_order_would_corrupt() {
        // Regression pin for the descending-order requirement: simulate a
        // naive ascending pass with raw span deletion and show it deletes
        // the wrong lines.
        let mut naive = doc(15);
        naive.remove_span(2, 4); // A first...
        naive.remove_span(8, 10); // ...then B against shifted numbering

        let mut correct = doc(15);
        let set = LineAddressIndex::resolve(
            &correct,
            &[Region::new("A", 2, 4), Region::new("B", 8, 10)],
        )
        .unwrap();
        RegionRemover::remove(&mut correct, &set).unwrap();

        assert_ne!(naive.lines(), correct.lines());
        // The ascending pass wrongly keeps B's lines and deletes lines
        // that should have survived.
        assert!(naive.lines().contains(&"line 8".to_string()));
        assert!(!naive.lines().contains(&"line 12".to_string()));
        assert!(!correct.lines().contains(&"line 8".to_string()));
        assert!(correct.lines().contains(&"line 12".to_string()));
    }

    #[test]
    fn test_stale_region_set_rejected() {
        let mut document = doc(10);
        let set =
            LineAddressIndex::resolve(&document, &[Region::new("X", 3, 5)]).unwrap();

        // Mutate the document after the spans were resolved.
        document.remove_span(1, 1);

        let err = RegionRemover::remove(&mut document, &set).unwrap_err();
        assert!(matches!(
            err,
            EngineError::StaleAddresses {
                resolved: 0,
                current: 1
            }
        ));
    }

    #[test]
    fn test_empty_region_set_is_noop() {
        let mut document = doc(5);
        let set = LineAddressIndex::resolve(&document, &[]).unwrap();

        let report = RegionRemover::remove(&mut document, &set).unwrap();
        assert_eq!(report.total_removed(), 0);
        assert_eq!(document.line_count(), 5);
    }
}
