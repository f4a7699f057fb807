//! Picks the subject mask out of a set of region proposals.
//!
//! Each candidate is scored as
//!
//! ```text
//! combined = 0.4 * stability + 0.3 * area + 0.3 * center
//! area     = min(area_px / (0.8 * W * H), 1)
//! center   = 1 - |centroid - c| / |c|        where c = (W / 2, H / 2)
//! ```
//!
//! Only candidates with `stability > threshold` and at least one foreground
//! pixel are eligible. The highest combined score wins; on ties the earliest
//! candidate is kept.

use crate::imageops_ai::mask::foreground_stats;
use crate::types::RegionProposal;

pub const STABILITY_WEIGHT: f64 = 0.4;
pub const AREA_WEIGHT: f64 = 0.3;
pub const CENTER_WEIGHT: f64 = 0.3;
/// Fraction of the frame at which the area score saturates.
pub const AREA_CAP_FRACTION: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateScore {
    pub stability: f64,
    pub area: f64,
    pub center: f64,
    pub combined: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    /// Position of the winner in the input slice.
    pub index: usize,
    pub score: CandidateScore,
}

/// Scores one candidate against a `width` x `height` frame.
///
/// Returns `None` when the mask has no foreground pixels, since there is no
/// centroid to measure.
pub fn score_candidate(proposal: &RegionProposal, width: u32, height: u32) -> Option<CandidateScore> {
    let stats = foreground_stats(&proposal.mask)?;

    let max_area = f64::from(width) * f64::from(height) * AREA_CAP_FRACTION;
    let area = if max_area > 0.0 {
        (proposal.area_px as f64 / max_area).min(1.0)
    } else {
        0.0
    };

    let center_x = f64::from(width / 2);
    let center_y = f64::from(height / 2);
    let max_distance = center_x.hypot(center_y);
    let distance = (stats.centroid.0 - center_x).hypot(stats.centroid.1 - center_y);
    let center = if max_distance > 0.0 {
        1.0 - distance / max_distance
    } else {
        1.0
    };

    let stability = f64::from(proposal.stability_score);
    let combined = STABILITY_WEIGHT * stability + AREA_WEIGHT * area + CENTER_WEIGHT * center;

    Some(CandidateScore {
        stability,
        area,
        center,
        combined,
    })
}

#[derive(Debug, Clone, Copy)]
pub struct MaskCandidateSelector {
    confidence_threshold: f32,
}

impl MaskCandidateSelector {
    pub const fn new(confidence_threshold: f32) -> Self {
        Self {
            confidence_threshold,
        }
    }

    pub const fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    pub fn is_eligible(&self, proposal: &RegionProposal) -> bool {
        proposal.stability_score > self.confidence_threshold
    }

    /// Chooses the best candidate for a `width` x `height` frame, or `None`
    /// if no candidate is eligible.
    pub fn select(&self, candidates: &[RegionProposal], width: u32, height: u32) -> Option<Selection> {
        let mut best: Option<Selection> = None;

        for (index, proposal) in candidates.iter().enumerate() {
            if !self.is_eligible(proposal) {
                tracing::debug!(
                    index,
                    stability = proposal.stability_score,
                    threshold = self.confidence_threshold,
                    "candidate below confidence threshold"
                );
                continue;
            }
            let Some(score) = score_candidate(proposal, width, height) else {
                tracing::debug!(index, "candidate has no foreground pixels");
                continue;
            };
            tracing::debug!(
                index,
                stability = score.stability,
                area = score.area,
                center = score.center,
                combined = score.combined,
                "scored candidate"
            );

            if best.map_or(true, |b| score.combined > b.score.combined) {
                best = Some(Selection { index, score });
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::rect_mask;

    fn proposal(x: u32, y: u32, w: u32, h: u32, stability: f32) -> RegionProposal {
        RegionProposal::from_mask(rect_mask(100, 100, x, y, w, h), stability)
    }

    #[test]
    fn test_centered_full_area_candidate_scores() {
        // 90x90 block: area capped at 1.0, centroid at (49.5, 49.5).
        let p = proposal(5, 5, 90, 90, 1.0);
        let score = score_candidate(&p, 100, 100).expect("non-empty");

        assert_eq!(score.area, 1.0);
        let expected_center = 1.0 - (0.5f64.hypot(0.5)) / 50f64.hypot(50.0);
        assert!((score.center - expected_center).abs() < 1e-9);
        assert!((score.combined - (0.4 + 0.3 + 0.3 * expected_center)).abs() < 1e-9);
    }

    #[test]
    fn test_area_score_uses_eighty_percent_cap() {
        let p = proposal(0, 0, 40, 100, 0.9);
        let score = score_candidate(&p, 100, 100).expect("non-empty");
        assert!((score.area - 4000.0 / 8000.0).abs() < 1e-12);
    }

    #[test]
    fn test_higher_combined_score_wins_in_either_order() {
        let strong = proposal(30, 30, 40, 40, 0.95);
        let weak = proposal(0, 0, 20, 20, 0.6);
        let selector = MaskCandidateSelector::new(0.5);

        let forward = [strong.clone(), weak.clone()];
        let reversed = [weak, strong];

        assert_eq!(selector.select(&forward, 100, 100).map(|s| s.index), Some(0));
        assert_eq!(selector.select(&reversed, 100, 100).map(|s| s.index), Some(1));
    }

    #[test]
    fn test_threshold_is_strict() {
        let selector = MaskCandidateSelector::new(0.5);
        let at_threshold = [proposal(30, 30, 40, 40, 0.5)];
        assert_eq!(selector.select(&at_threshold, 100, 100), None);

        let above = [proposal(30, 30, 40, 40, 0.500_001)];
        assert!(selector.select(&above, 100, 100).is_some());
    }

    #[test]
    fn test_empty_mask_is_never_selected() {
        let selector = MaskCandidateSelector::new(0.5);
        let candidates = [
            RegionProposal::new(rect_mask(100, 100, 0, 0, 0, 0), 1.0, 5000),
            proposal(0, 0, 10, 10, 0.6),
        ];

        let selection = selector.select(&candidates, 100, 100).expect("second is eligible");
        assert_eq!(selection.index, 1);
    }

    #[test]
    fn test_only_empty_masks_yields_no_selection() {
        let selector = MaskCandidateSelector::new(0.1);
        let candidates = [RegionProposal::new(rect_mask(10, 10, 0, 0, 0, 0), 0.99, 0)];
        assert_eq!(selector.select(&candidates, 10, 10), None);
    }

    #[test]
    fn test_ties_keep_first_candidate() {
        let selector = MaskCandidateSelector::new(0.5);
        let a = proposal(30, 30, 40, 40, 0.8);
        let candidates = [a.clone(), a];

        assert_eq!(selector.select(&candidates, 100, 100).map(|s| s.index), Some(0));
    }

    #[test]
    fn test_single_pixel_frame_has_full_center_score() {
        let p = RegionProposal::from_mask(rect_mask(1, 1, 0, 0, 1, 1), 0.9);
        let score = score_candidate(&p, 1, 1).expect("non-empty");
        assert_eq!(score.center, 1.0);
    }
}
