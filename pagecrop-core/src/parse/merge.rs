use tracing::debug;

use crate::{error::PagecropError, layout::element::CandidateRegion};

/// Consolidates overlapping candidates into single regions.
///
/// Single forward pass over the candidates in detector order: each candidate
/// is compared against the already-accepted regions and folded into the
/// first one whose overlap percentage exceeds the threshold (the accepted
/// region's box grows to the union); otherwise it is appended as a new
/// region. A freshly grown region is *not* re-checked against earlier
/// accepted regions or later candidates, so the result depends on detector
/// output order. Downstream consumers rely on this exact behavior.
pub fn merge_regions(
    candidates: Vec<CandidateRegion>,
    merge_threshold: f32,
) -> Result<Vec<CandidateRegion>, PagecropError> {
    let mut accepted: Vec<CandidateRegion> = Vec::new();

    'next: for candidate in candidates {
        for region in accepted.iter_mut() {
            let overlap = region.bbox.overlap_percentage(&candidate.bbox)?;
            if overlap > merge_threshold {
                debug!(
                    "merging {} candidate into accepted region, overlap {:.3}",
                    candidate.label.name(),
                    overlap
                );
                region.absorb(candidate);
                continue 'next;
            }
        }
        accepted.push(candidate);
    }

    Ok(accepted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::{bbox::Bbox, labels::LabelKind},
        layout::element::Detection,
    };
    use glam::Vec2;

    fn candidate(x1: f32, y1: f32, x2: f32, y2: f32) -> CandidateRegion {
        CandidateRegion::from_detection(Detection {
            label: LabelKind::Figure,
            proba: 0.9,
            bbox: Bbox::new(Vec2::new(x1, y1), Vec2::new(x2, y2)),
        })
    }

    #[test]
    fn test_overlapping_candidates_merge_to_union() {
        // Overlap 40000/210000 ~ 0.190 > 0.1, so the pair collapses into one
        // region spanning both boxes.
        let merged = merge_regions(
            vec![
                candidate(100.0, 100.0, 500.0, 500.0),
                candidate(300.0, 300.0, 600.0, 600.0),
            ],
            0.1,
        )
        .unwrap();

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].bbox.min, Vec2::new(100.0, 100.0));
        assert_eq!(merged[0].bbox.max, Vec2::new(600.0, 600.0));
        assert_eq!(merged[0].sources.len(), 2);
    }

    #[test]
    fn test_disjoint_candidates_stay_separate() {
        let merged = merge_regions(
            vec![
                candidate(0.0, 0.0, 100.0, 100.0),
                candidate(500.0, 500.0, 600.0, 600.0),
            ],
            0.1,
        )
        .unwrap();

        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_contained_candidate_always_merges() {
        // Containment saturates overlap to 1.0 regardless of size ratio.
        let merged = merge_regions(
            vec![
                candidate(0.0, 0.0, 1000.0, 1000.0),
                candidate(10.0, 10.0, 20.0, 20.0),
            ],
            0.1,
        )
        .unwrap();

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].bbox.max, Vec2::new(1000.0, 1000.0));
    }

    #[test]
    fn test_first_match_wins() {
        // The third candidate overlaps both accepted regions; it folds into
        // the first one in list order only.
        let merged = merge_regions(
            vec![
                candidate(0.0, 0.0, 100.0, 100.0),
                candidate(150.0, 0.0, 250.0, 100.0),
                candidate(60.0, 0.0, 200.0, 100.0),
            ],
            0.1,
        )
        .unwrap();

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].bbox.min, Vec2::new(0.0, 0.0));
        assert_eq!(merged[0].bbox.max, Vec2::new(200.0, 100.0));
        assert_eq!(merged[0].sources.len(), 2);
        // The second region keeps its original extent
        assert_eq!(merged[1].bbox.min, Vec2::new(150.0, 0.0));
        assert_eq!(merged[1].bbox.max, Vec2::new(250.0, 100.0));
    }

    #[test]
    fn test_no_fixed_point_iteration() {
        // The third candidate grows region A to (0,0)-(300,100), whose box
        // now overlaps region B well above the threshold. Accepted regions
        // are never re-compared after growing, so A and B remain distinct.
        let merged = merge_regions(
            vec![
                candidate(0.0, 0.0, 100.0, 100.0),
                candidate(230.0, 0.0, 400.0, 100.0),
                candidate(50.0, 0.0, 300.0, 100.0),
            ],
            0.1,
        )
        .unwrap();

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].bbox.max, Vec2::new(300.0, 100.0));
        assert_eq!(merged[1].bbox.min, Vec2::new(230.0, 0.0));
    }

    #[test]
    fn test_below_threshold_not_merged() {
        // Thin sliver of overlap stays below the threshold.
        let merged = merge_regions(
            vec![
                candidate(0.0, 0.0, 100.0, 100.0),
                candidate(95.0, 0.0, 200.0, 100.0),
            ],
            0.1,
        )
        .unwrap();

        assert_eq!(merged.len(), 2);
    }
}
