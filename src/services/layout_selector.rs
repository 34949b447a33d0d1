//! 排版方式选择 - 业务能力层
//!
//! 根据剩余图片数量和配置权重，为下一页挑选网格排版方式。
//! 权重是相对值，内部按总和归一化；随机源由调用方注入，测试可复现。

use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;
use tracing::warn;

use crate::error::{AppError, AppResult, ConfigError};
use crate::models::layout::{LayoutArrangement, LayoutWeights};

const SMALL_CANDIDATES: [LayoutArrangement; 2] = [LayoutArrangement::Single, LayoutArrangement::Double];
const SMALL_DEFAULTS: [f64; 2] = [0.5, 0.5];

const ALL_CANDIDATES: [LayoutArrangement; 3] = LayoutArrangement::ALL;
const ALL_DEFAULTS: [f64; 3] = [0.33, 0.33, 0.34];

/// 排版方式选择器
#[derive(Debug, Clone, Default)]
pub struct LayoutSelector {
    weights: LayoutWeights,
}

impl LayoutSelector {
    pub fn new(weights: LayoutWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &LayoutWeights {
        &self.weights
    }

    /// 为剩余 `remaining` 张图片选择排版方式
    ///
    /// - 1 张：Single
    /// - 2 张：Double
    /// - 3 张：在 Single / Double 中按权重抽取
    /// - 更多：在 Single / Double / Four 中按权重抽取
    pub fn select<R: Rng>(&self, remaining: usize, rng: &mut R) -> LayoutArrangement {
        let (candidates, defaults): (&[LayoutArrangement], &[f64]) = match remaining {
            0 | 1 => return LayoutArrangement::Single,
            2 => return LayoutArrangement::Double,
            3 => (&SMALL_CANDIDATES[..], &SMALL_DEFAULTS[..]),
            _ => (&ALL_CANDIDATES[..], &ALL_DEFAULTS[..]),
        };

        let weights = self.candidate_weights(candidates, defaults);
        match Self::weighted_index(&weights) {
            Ok(distribution) => candidates[distribution.sample(rng)],
            Err(e) => {
                warn!("{}，改用均匀分布", e);
                candidates[rng.random_range(0..candidates.len())]
            }
        }
    }

    /// 候选排版方式的有效权重：缺省取默认值，负数或非有限值按 0 处理
    fn candidate_weights(&self, candidates: &[LayoutArrangement], defaults: &[f64]) -> Vec<f64> {
        candidates
            .iter()
            .zip(defaults)
            .map(|(&arrangement, &default)| match self.weights.get(arrangement) {
                None => default,
                Some(w) if w.is_finite() && w >= 0.0 => w,
                Some(w) => {
                    warn!("排版方式 {} 的权重 {} 非法，按 0 处理", arrangement, w);
                    0.0
                }
            })
            .collect()
    }

    fn weighted_index(weights: &[f64]) -> AppResult<WeightedIndex<f64>> {
        WeightedIndex::new(weights).map_err(|_| AppError::from(ConfigError::DegenerateWeights))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn count_draws(selector: &LayoutSelector, remaining: usize, draws: usize) -> HashMap<LayoutArrangement, usize> {
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts = HashMap::new();
        for _ in 0..draws {
            *counts.entry(selector.select(remaining, &mut rng)).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn test_small_remaining_is_deterministic() {
        let selector = LayoutSelector::new(LayoutWeights::new(0.0, 0.0, 1.0));
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(selector.select(1, &mut rng), LayoutArrangement::Single);
            assert_eq!(selector.select(2, &mut rng), LayoutArrangement::Double);
        }
    }

    #[test]
    fn test_three_remaining_never_picks_four() {
        let selector = LayoutSelector::new(LayoutWeights::new(0.0, 0.0, 100.0));
        let counts = count_draws(&selector, 3, 1000);
        assert_eq!(counts.get(&LayoutArrangement::Four), None);
    }

    #[test]
    fn test_zero_double_weight_always_single() {
        let selector = LayoutSelector::new(LayoutWeights {
            single: Some(1.0),
            double: Some(0.0),
            four: None,
        });
        let counts = count_draws(&selector, 3, 10_000);
        assert_eq!(counts.get(&LayoutArrangement::Single), Some(&10_000));
    }

    #[test]
    fn test_weights_are_relative() {
        let selector = LayoutSelector::new(LayoutWeights::new(3.0, 1.0, 0.0));
        let counts = count_draws(&selector, 10, 10_000);
        let single = *counts.get(&LayoutArrangement::Single).unwrap_or(&0);
        assert!((7000..8000).contains(&single), "single = {}", single);
        assert_eq!(counts.get(&LayoutArrangement::Four), None);
    }

    #[test]
    fn test_all_zero_weights_fall_back_to_uniform() {
        let selector = LayoutSelector::new(LayoutWeights::new(0.0, 0.0, 0.0));
        let counts = count_draws(&selector, 5, 3000);
        for arrangement in LayoutArrangement::ALL {
            let n = *counts.get(&arrangement).unwrap_or(&0);
            assert!(n > 800, "{} = {}", arrangement, n);
        }
    }

    #[test]
    fn test_missing_weights_use_defaults() {
        let selector = LayoutSelector::default();
        let counts = count_draws(&selector, 8, 3000);
        assert_eq!(counts.len(), 3);
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let selector = LayoutSelector::new(LayoutWeights::new(0.3, 0.4, 0.3));
        let mut a = StdRng::seed_from_u64(2024);
        let mut b = StdRng::seed_from_u64(2024);
        let first: Vec<_> = (0..50).map(|_| selector.select(6, &mut a)).collect();
        let second: Vec<_> = (0..50).map(|_| selector.select(6, &mut b)).collect();
        assert_eq!(first, second);
    }
}
