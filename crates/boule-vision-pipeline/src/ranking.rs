//! Ordering of candidate pieces by distance to the target.

use boule_vision_core::{DetectedObject, MeasureResult, Real, pixel_distance};
use serde::{Deserialize, Serialize};

use crate::config::ScaleConfig;
use crate::distance::DistanceEstimator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    Meters,
}

/// Distance from one candidate to the target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceResult {
    /// Index of the candidate in the input slice.
    pub candidate: usize,
    pub distance: Real,
    pub unit: DistanceUnit,
    /// Lower of the candidate's and the target's detection confidence.
    pub confidence: Real,
}

/// Distance between two candidates, `first < second`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairDistance {
    pub first: usize,
    pub second: usize,
    pub distance: Real,
    pub unit: DistanceUnit,
    pub confidence: Real,
}

/// Ranks candidates by distance to a target piece.
///
/// With `use_reference_size` the target's known real diameter over its pixel
/// diameter sets the frame's scale. Otherwise raw pixel distances are
/// multiplied by the configured fallback scale, an uncalibrated
/// approximation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankingEngine {
    scale: ScaleConfig,
}

impl RankingEngine {
    pub fn new(scale: ScaleConfig) -> Self {
        Self { scale }
    }

    fn measure(
        &self,
        a: &DetectedObject,
        b: &DetectedObject,
        target: &DetectedObject,
        use_reference_size: bool,
    ) -> MeasureResult<Real> {
        if use_reference_size {
            DistanceEstimator::distance_2d(
                &a.center,
                &b.center,
                self.scale.cochonnet_diameter_m,
                target.diameter_px(),
            )
        } else {
            Ok(pixel_distance(&a.center, &b.center) * self.scale.fallback_meters_per_pixel)
        }
    }

    fn log_scale_policy(&self, use_reference_size: bool) {
        if !use_reference_size {
            log::debug!(
                "ranking with uncalibrated fallback scale {} m/px",
                self.scale.fallback_meters_per_pixel
            );
        }
    }

    /// Candidates sorted closest first; ties keep input order.
    ///
    /// Without a target there is nothing to rank against and the result is
    /// empty.
    pub fn rank(
        &self,
        candidates: &[DetectedObject],
        target: Option<&DetectedObject>,
        use_reference_size: bool,
    ) -> MeasureResult<Vec<DistanceResult>> {
        let Some(target) = target else {
            return Ok(Vec::new());
        };
        self.log_scale_policy(use_reference_size);

        let mut results = candidates
            .iter()
            .enumerate()
            .map(|(candidate, c)| {
                Ok(DistanceResult {
                    candidate,
                    distance: self.measure(c, target, target, use_reference_size)?,
                    unit: DistanceUnit::Meters,
                    confidence: c.confidence.min(target.confidence),
                })
            })
            .collect::<MeasureResult<Vec<_>>>()?;

        // `sort_by` is stable.
        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Ok(results)
    }

    /// Closest candidate to the target, if any.
    pub fn closest(
        &self,
        candidates: &[DetectedObject],
        target: Option<&DetectedObject>,
        use_reference_size: bool,
    ) -> MeasureResult<Option<DistanceResult>> {
        Ok(self
            .rank(candidates, target, use_reference_size)?
            .into_iter()
            .next())
    }

    /// Distances between every pair of candidates in input order, using the
    /// same scale policy as [`Self::rank`].
    pub fn pairwise(
        &self,
        candidates: &[DetectedObject],
        target: Option<&DetectedObject>,
        use_reference_size: bool,
    ) -> MeasureResult<Vec<PairDistance>> {
        let Some(target) = target else {
            return Ok(Vec::new());
        };
        self.log_scale_policy(use_reference_size);

        let mut pairs = Vec::with_capacity(candidates.len() * candidates.len().saturating_sub(1) / 2);
        for (i, a) in candidates.iter().enumerate() {
            for (j, b) in candidates.iter().enumerate().skip(i + 1) {
                pairs.push(PairDistance {
                    first: i,
                    second: j,
                    distance: self.measure(a, b, target, use_reference_size)?,
                    unit: DistanceUnit::Meters,
                    confidence: a.confidence.min(b.confidence),
                });
            }
        }
        Ok(pairs)
    }

    /// Distances between every pair of candidates, each scaled by the pair's
    /// own size: the known boule diameter over the mean of their pixel
    /// diameters. Needs no target.
    pub fn pairwise_by_boule_size(
        &self,
        candidates: &[DetectedObject],
    ) -> MeasureResult<Vec<PairDistance>> {
        let mut pairs = Vec::with_capacity(candidates.len() * candidates.len().saturating_sub(1) / 2);
        for (i, a) in candidates.iter().enumerate() {
            for (j, b) in candidates.iter().enumerate().skip(i + 1) {
                pairs.push(PairDistance {
                    first: i,
                    second: j,
                    distance: DistanceEstimator::distance_2d(
                        &a.center,
                        &b.center,
                        self.scale.boule_diameter_m,
                        a.radius + b.radius,
                    )?,
                    unit: DistanceUnit::Meters,
                    confidence: a.confidence.min(b.confidence),
                });
            }
        }
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boule_vision_core::{PieceClass, Pt2};
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    fn boule(x: Real, y: Real, confidence: Real) -> DetectedObject {
        DetectedObject::new(Pt2::new(x, y), 20.0, confidence, Some(PieceClass::Boule)).unwrap()
    }

    fn cochonnet() -> DetectedObject {
        DetectedObject::new(Pt2::new(0.0, 0.0), 15.0, 0.8, Some(PieceClass::Cochonnet)).unwrap()
    }

    #[test]
    fn missing_target_yields_empty_ranking() {
        let engine = RankingEngine::default();
        let candidates = vec![boule(1.0, 1.0, 0.9)];
        assert!(engine.rank(&candidates, None, true).unwrap().is_empty());
        assert!(engine.pairwise(&candidates, None, true).unwrap().is_empty());
        assert_eq!(engine.closest(&candidates, None, true).unwrap(), None);
    }

    #[test]
    fn reference_size_sets_scale() {
        let engine = RankingEngine::default();
        let target = cochonnet();
        let candidates = vec![boule(300.0, 0.0, 0.95), boule(0.0, 60.0, 0.5)];

        let ranked = engine.rank(&candidates, Some(&target), true).unwrap();
        // 0.03 m over a 30 px diameter: 1 mm per pixel.
        assert_eq!(ranked[0].candidate, 1);
        assert!((ranked[0].distance - 0.06).abs() < 1e-12);
        assert_eq!(ranked[0].confidence, 0.5);
        assert_eq!(ranked[1].candidate, 0);
        assert!((ranked[1].distance - 0.3).abs() < 1e-12);
        assert_eq!(ranked[1].confidence, 0.8);
        assert_eq!(ranked[1].unit, DistanceUnit::Meters);
    }

    #[test]
    fn fallback_scale_ignores_target_size() {
        let engine = RankingEngine::new(ScaleConfig {
            fallback_meters_per_pixel: 0.002,
            ..Default::default()
        });
        let ranked = engine
            .rank(&[boule(30.0, 40.0, 0.9)], Some(&cochonnet()), false)
            .unwrap();
        assert!((ranked[0].distance - 0.1).abs() < 1e-12);
    }

    #[test]
    fn ties_keep_input_order() {
        let engine = RankingEngine::default();
        let candidates = vec![
            boule(100.0, 0.0, 0.9),
            boule(0.0, 50.0, 0.9),
            boule(0.0, -100.0, 0.9),
            boule(-50.0, 0.0, 0.9),
        ];
        let order: Vec<usize> = engine
            .rank(&candidates, Some(&cochonnet()), true)
            .unwrap()
            .iter()
            .map(|r| r.candidate)
            .collect();
        assert_eq!(order, vec![1, 3, 0, 2]);
    }

    #[test]
    fn ranking_is_sorted_for_any_permutation() {
        let engine = RankingEngine::default();
        let target = cochonnet();
        let mut rng = StdRng::seed_from_u64(42);
        let mut candidates: Vec<DetectedObject> = (0..40_u32)
            .map(|i| {
                // Snap to a coarse grid so equal distances occur.
                let x = Real::from(rng.random_range(-5..=5_i32)) * 10.0;
                let y = Real::from(rng.random_range(-5..=5_i32)) * 10.0;
                boule(x, y, 0.5 + Real::from(i % 5) * 0.1)
            })
            .collect();

        let baseline: Vec<Real> = engine
            .rank(&candidates, Some(&target), true)
            .unwrap()
            .iter()
            .map(|r| r.distance)
            .collect();

        for _ in 0..10 {
            candidates.shuffle(&mut rng);
            let ranked = engine.rank(&candidates, Some(&target), true).unwrap();
            assert!(ranked.windows(2).all(|w| w[0].distance <= w[1].distance));
            let distances: Vec<Real> = ranked.iter().map(|r| r.distance).collect();
            assert_eq!(distances, baseline);
            for w in ranked.windows(2) {
                if w[0].distance == w[1].distance {
                    assert!(w[0].candidate < w[1].candidate);
                }
            }
        }
    }

    #[test]
    fn pairwise_covers_each_pair_once() {
        let engine = RankingEngine::default();
        let candidates = vec![
            boule(0.0, 0.0, 0.9),
            boule(30.0, 0.0, 0.7),
            boule(30.0, 40.0, 0.8),
        ];
        let pairs = engine.pairwise(&candidates, Some(&cochonnet()), true).unwrap();
        let idx: Vec<(usize, usize)> = pairs.iter().map(|p| (p.first, p.second)).collect();
        assert_eq!(idx, vec![(0, 1), (0, 2), (1, 2)]);
        assert!((pairs[1].distance - 0.05).abs() < 1e-12);
        assert_eq!(pairs[2].confidence, 0.7);
    }

    #[test]
    fn boule_size_scales_each_pair() {
        let engine = RankingEngine::new(ScaleConfig {
            boule_diameter_m: 0.08,
            ..Default::default()
        });
        let sized = |x: Real, radius: Real| {
            DetectedObject::new(Pt2::new(x, 0.0), radius, 0.9, Some(PieceClass::Boule)).unwrap()
        };
        let candidates = vec![sized(0.0, 40.0), sized(400.0, 40.0), sized(1000.0, 20.0)];
        let pairs = engine.pairwise_by_boule_size(&candidates).unwrap();

        assert_eq!(pairs.len(), 3);
        // 80 px diameter for 0.08 m: 1 mm per pixel.
        assert!((pairs[0].distance - 0.4).abs() < 1e-12);
        // Mean diameter 60 px: 0.08 / 60 m per pixel.
        assert!((pairs[2].distance - 600.0 * 0.08 / 60.0).abs() < 1e-12);
        assert!(engine.pairwise_by_boule_size(&candidates[..1]).unwrap().is_empty());
    }
}
