//! Beach scoring and ranking
//!
//! Two scoring policies exist: an unbounded comparison score for
//! side-by-side views and a 0-100 suitability score for swim
//! recommendations. Ranking is a stable descending sort on either.

use crate::beaches::types::{EnrichedBeach, ScoredBeach};
use crate::config::badevand::SWIMMING_BAN_MARKER;

/// Scoring policy applied when ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorePolicy {
    Comparison,
    Suitability,
}

impl ScorePolicy {
    pub fn score(&self, beach: &EnrichedBeach) -> f64 {
        match self {
            ScorePolicy::Comparison => comparison_score(beach),
            ScorePolicy::Suitability => suitability_score(beach),
        }
    }
}

/// `50` for good water, plus twice the water temperature, minus three times the wind speed
pub fn comparison_score(beach: &EnrichedBeach) -> f64 {
    let quality = if beach.water_quality.is_good() { 50.0 } else { 0.0 };
    quality + 2.0 * finite_or_zero(beach.water_temperature) - 3.0 * finite_or_zero(beach.wind_speed)
}

/// Suitability for swimming today, clamped to `[0, 100]`
pub fn suitability_score(beach: &EnrichedBeach) -> f64 {
    unclamped_suitability(beach).clamp(0.0, 100.0)
}

pub(crate) fn unclamped_suitability(beach: &EnrichedBeach) -> f64 {
    let mut score = 50.0;

    if beach.water_quality.is_good() {
        score += 30.0;
    }
    score += temperature_points(beach.water_temperature);
    score += wind_points(beach.wind_speed);

    if has_swimming_ban(&beach.comments) {
        score -= 40.0;
    }

    score
}

// NaN compares false everywhere, so unparsed readings earn nothing
fn temperature_points(water_temperature: f64) -> f64 {
    if (18.0..=22.0).contains(&water_temperature) {
        30.0
    } else if water_temperature >= 15.0 {
        20.0
    } else if water_temperature >= 12.0 {
        10.0
    } else {
        0.0
    }
}

fn wind_points(wind_speed: f64) -> f64 {
    match wind_speed {
        w if w <= 3.0 => 20.0,
        w if w <= 5.0 => 15.0,
        w if w <= 7.0 => 10.0,
        w if w <= 10.0 => 5.0,
        _ => 0.0,
    }
}

pub fn has_swimming_ban(comments: &str) -> bool {
    comments.to_lowercase().contains(SWIMMING_BAN_MARKER)
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Score every beach and sort by score, highest first
///
/// Equal scores keep their input order. Ranks are 1-based.
pub fn rank(beaches: Vec<EnrichedBeach>, policy: ScorePolicy) -> Vec<ScoredBeach> {
    let mut scored: Vec<ScoredBeach> = beaches
        .into_iter()
        .map(|beach| ScoredBeach {
            score: policy.score(&beach),
            beach,
            rank: 0,
        })
        .collect();

    // sort_by is stable; scores are finite so total_cmp agrees with <
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));

    for (position, entry) in scored.iter_mut().enumerate() {
        entry.rank = position + 1;
    }

    scored
}

/// Narrowing stages of the swim recommendation pipeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwimFilter {
    pub only_good_quality: bool,
    pub min_water_temperature: f64,
    pub max_wind_speed: f64,
}

impl SwimFilter {
    /// Apply quality, temperature and wind stages in that order
    pub fn apply(&self, beaches: Vec<EnrichedBeach>) -> Vec<EnrichedBeach> {
        beaches
            .into_iter()
            .filter(|b| !self.only_good_quality || b.water_quality.is_good())
            .filter(|b| b.water_temperature >= self.min_water_temperature)
            .filter(|b| b.wind_speed <= self.max_wind_speed)
            .collect()
    }
}
