//! Per-tool beach pipelines
//!
//! Each pipeline takes the freshly fetched records and validated criteria
//! and produces the beach list a tool returns.

use crate::beaches::ranking::{rank, ScorePolicy, SwimFilter};
use crate::beaches::transform::{filter_by_municipality, filter_by_water_quality, transform};
use crate::beaches::types::{EnrichedBeach, RawBeachRecord, ScoredBeach, WaterQuality};

/// Number of recommendations the swim widget highlights
pub const BEST_TOP_N: usize = 6;

pub const DEFAULT_COMPARE_LIMIT: usize = 3;
pub const DEFAULT_MIN_TEMP: f64 = 12.0;
pub const DEFAULT_MAX_WIND: f64 = 10.0;

/// Criteria for the map view
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapCriteria {
    pub municipality: Option<String>,
    pub water_quality: Option<WaterQuality>,
}

/// Criteria for the side-by-side comparison
#[derive(Debug, Clone, PartialEq)]
pub struct CompareCriteria {
    pub municipality: Option<String>,
    pub limit: usize,
}

impl Default for CompareCriteria {
    fn default() -> Self {
        Self {
            municipality: None,
            limit: DEFAULT_COMPARE_LIMIT,
        }
    }
}

/// Criteria for the swim recommendations
#[derive(Debug, Clone, PartialEq)]
pub struct BestCriteria {
    pub municipality: Option<String>,
    pub filter: SwimFilter,
}

impl Default for BestCriteria {
    fn default() -> Self {
        Self {
            municipality: None,
            filter: SwimFilter {
                only_good_quality: true,
                min_water_temperature: DEFAULT_MIN_TEMP,
                max_wind_speed: DEFAULT_MAX_WIND,
            },
        }
    }
}

fn enrich(records: &[RawBeachRecord], municipality: Option<&str>) -> Vec<EnrichedBeach> {
    let beaches = records.iter().map(transform).collect();
    filter_by_municipality(beaches, municipality)
}

/// Filtered, unranked beaches for the map
pub fn map_view(records: &[RawBeachRecord], criteria: &MapCriteria) -> Vec<EnrichedBeach> {
    let beaches = enrich(records, criteria.municipality.as_deref());
    filter_by_water_quality(beaches, criteria.water_quality)
}

/// Top `limit` beaches by comparison score
pub fn compare(records: &[RawBeachRecord], criteria: &CompareCriteria) -> Vec<ScoredBeach> {
    let beaches = enrich(records, criteria.municipality.as_deref());
    let mut ranked = rank(beaches, ScorePolicy::Comparison);
    ranked.truncate(criteria.limit);
    ranked
}

/// Every beach passing the swim filter, ranked by suitability
pub fn best_for_swimming(records: &[RawBeachRecord], criteria: &BestCriteria) -> Vec<ScoredBeach> {
    let beaches = enrich(records, criteria.municipality.as_deref());
    rank(criteria.filter.apply(beaches), ScorePolicy::Suitability)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beaches::transform::tests::{observation, raw_beach};

    fn records() -> Vec<RawBeachRecord> {
        vec![
            raw_beach(1, "Aarhus", vec![observation("2", "16", "6")]),
            raw_beach(2, "Odense", vec![observation("1", "21", "1")]),
            raw_beach(3, "Aarhus", vec![observation("2", "20", "2")]),
            raw_beach(4, "Aalborg", vec![observation("2", "13", "9")]),
            raw_beach(5, "Odense", vec![observation("2", "19", "14")]),
        ]
    }

    #[test]
    fn test_map_view_filters_commute() {
        let records = records();
        let criteria = MapCriteria {
            municipality: Some("odense".to_string()),
            water_quality: Some(WaterQuality::Good),
        };

        let ids: Vec<_> = map_view(&records, &criteria).into_iter().map(|b| b.id).collect();
        assert_eq!(ids, vec!["5"]);

        let all: Vec<_> = records.iter().map(transform).collect();
        let reversed = filter_by_municipality(
            filter_by_water_quality(all, Some(WaterQuality::Good)),
            Some("odense"),
        );
        assert_eq!(reversed.into_iter().map(|b| b.id).collect::<Vec<_>>(), vec!["5"]);
    }

    #[test]
    fn test_map_view_without_criteria_keeps_everything() {
        assert_eq!(map_view(&records(), &MapCriteria::default()).len(), 5);
    }

    #[test]
    fn test_compare_default_limit() {
        let ranked = compare(&records(), &CompareCriteria::default());

        assert_eq!(ranked.len(), 3);
        // 3: 84, 1: 64, 4: 49, 5: 46, 2: 39
        let ids: Vec<_> = ranked.iter().map(|s| s.beach.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "4"]);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_best_for_swimming_defaults() {
        let ranked = best_for_swimming(&records(), &BestCriteria::default());

        // 2 is poor quality, 5 is too windy; 1 and 3 both clamp to 100
        let ids: Vec<_> = ranked.iter().map(|s| s.beach.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3", "4"]);
        assert_eq!(ranked[0].score, 100.0);
        assert_eq!(ranked[1].score, 100.0);
        assert_eq!(ranked[2].score, 95.0);
    }

    #[test]
    fn test_best_for_swimming_open_filters() {
        let criteria = BestCriteria {
            municipality: None,
            filter: SwimFilter {
                only_good_quality: false,
                min_water_temperature: 0.0,
                max_wind_speed: 20.0,
            },
        };

        let ranked = best_for_swimming(&records(), &criteria);
        assert_eq!(ranked.len(), 5);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_pipelines_leave_records_untouched() {
        let records = records();
        let before = serde_json::to_string(&records).unwrap();

        let _ = compare(&records, &CompareCriteria::default());
        let _ = best_for_swimming(&records, &BestCriteria::default());

        assert_eq!(serde_json::to_string(&records).unwrap(), before);
    }
}
