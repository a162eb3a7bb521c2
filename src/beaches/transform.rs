//! Beach enrichment and filtering
//!
//! Turns raw upstream records into [`EnrichedBeach`] values and narrows
//! beach lists by municipality and water quality. Every function here is
//! pure and order-preserving.

use crate::beaches::types::{DailyObservation, EnrichedBeach, RawBeachRecord, WaterQuality};
use crate::config::badevand::THUMBNAILS;

/// Enrich a raw record with parsed current conditions
///
/// Never fails: numeric fields that do not parse become `NaN`, unknown
/// quality codes become [`WaterQuality::Unknown`].
pub fn transform(raw: &RawBeachRecord) -> EnrichedBeach {
    let forecast = if raw.data.is_empty() {
        vec![DailyObservation::unknown()]
    } else {
        raw.data.clone()
    };
    let today = &forecast[0];

    let description = [&raw.description, &raw.comments]
        .into_iter()
        .find(|text| !text.is_empty())
        .cloned()
        .unwrap_or_else(|| format!("Badestrand i {}", raw.municipality));

    EnrichedBeach {
        id: raw.id.to_string(),
        name: raw.name.clone(),
        municipality: raw.municipality.clone(),
        description,
        coords: [raw.longitude, raw.latitude],
        water_quality: WaterQuality::from_code(&today.water_quality),
        water_temperature: parse_measurement(&today.water_temperature),
        air_temperature: parse_measurement(&today.air_temperature),
        wind_speed: parse_measurement(&today.wind_speed),
        comments: raw.comments.clone(),
        facilities: raw.facilities.clone(),
        links: raw.links.clone(),
        forecast,
        thumbnail: thumbnail_for(raw.id).to_string(),
    }
}

/// Pick the thumbnail image for a beach id
pub fn thumbnail_for(id: u64) -> &'static str {
    THUMBNAILS[(id % THUMBNAILS.len() as u64) as usize]
}

fn parse_measurement(value: &str) -> f64 {
    value.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// Keep beaches whose municipality contains `needle`, ignoring case
pub fn filter_by_municipality(beaches: Vec<EnrichedBeach>, needle: Option<&str>) -> Vec<EnrichedBeach> {
    let Some(needle) = needle else {
        return beaches;
    };
    let needle = needle.to_lowercase();

    beaches
        .into_iter()
        .filter(|b| b.municipality.to_lowercase().contains(&needle))
        .collect()
}

/// Keep beaches whose current water quality equals `quality`
pub fn filter_by_water_quality(
    beaches: Vec<EnrichedBeach>,
    quality: Option<WaterQuality>,
) -> Vec<EnrichedBeach> {
    match quality {
        Some(quality) => beaches
            .into_iter()
            .filter(|b| b.water_quality == quality)
            .collect(),
        None => beaches,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    pub(crate) fn observation(quality: &str, water: &str, wind: &str) -> DailyObservation {
        DailyObservation {
            date: "2024-07-01".to_string(),
            water_quality: quality.to_string(),
            water_temperature: water.to_string(),
            air_temperature: "20".to_string(),
            wind_speed: wind.to_string(),
            ..Default::default()
        }
    }

    pub(crate) fn raw_beach(id: u64, municipality: &str, data: Vec<DailyObservation>) -> RawBeachRecord {
        RawBeachRecord {
            id,
            municipality: municipality.to_string(),
            municipality_url: String::new(),
            name: format!("Strand {}", id),
            description: String::new(),
            latitude: 55.6,
            longitude: 12.5,
            comments: String::new(),
            facilities: String::new(),
            links: vec![],
            data,
        }
    }

    #[test]
    fn test_transform_parses_current_conditions() {
        let raw = raw_beach(7, "Køge", vec![observation("1", "17.4", "6.1"), observation("2", "15", "2")]);
        let beach = transform(&raw);

        assert_eq!(beach.id, "7");
        assert_eq!(beach.coords, [12.5, 55.6]);
        assert_eq!(beach.water_quality, WaterQuality::Poor);
        assert_eq!(beach.water_temperature, 17.4);
        assert_eq!(beach.wind_speed, 6.1);
        assert_eq!(beach.forecast.len(), 2);
        assert_eq!(beach.description, "Badestrand i Køge");
    }

    #[test]
    fn test_transform_without_observations_uses_defaults() {
        let beach = transform(&raw_beach(1, "Aarhus", vec![]));

        assert_eq!(beach.water_quality, WaterQuality::Good);
        assert_eq!(beach.water_temperature, 12.0);
        assert_eq!(beach.air_temperature, 15.0);
        assert_eq!(beach.wind_speed, 5.0);
        assert_eq!(beach.forecast, vec![DailyObservation::unknown()]);
    }

    #[test]
    fn test_transform_malformed_numbers() {
        let beach = transform(&raw_beach(3, "Aarhus", vec![observation("x", "varm", "")]));

        assert_eq!(beach.water_quality, WaterQuality::Unknown);
        assert!(beach.water_temperature.is_nan());
        assert!(beach.wind_speed.is_nan());
    }

    #[test]
    fn test_description_fallback_order() {
        let mut raw = raw_beach(2, "Odense", vec![]);
        raw.comments = "Blå flag".to_string();
        assert_eq!(transform(&raw).description, "Blå flag");

        raw.description = "Lang sandstrand".to_string();
        assert_eq!(transform(&raw).description, "Lang sandstrand");
    }

    #[test]
    fn test_thumbnail_is_deterministic() {
        assert_eq!(thumbnail_for(5), thumbnail_for(5));
        assert_eq!(thumbnail_for(5), THUMBNAILS[1]);
        assert_eq!(thumbnail_for(8), THUMBNAILS[0]);
    }

    #[test]
    fn test_filter_by_municipality_case_insensitive() {
        let beaches = vec![
            transform(&raw_beach(1, "Københavns Kommune", vec![])),
            transform(&raw_beach(2, "Aarhus", vec![])),
            transform(&raw_beach(3, "KØBENHAVN", vec![])),
        ];

        let ids: Vec<_> = filter_by_municipality(beaches.clone(), Some("københavn"))
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec!["1", "3"]);

        assert_eq!(filter_by_municipality(beaches, None).len(), 3);
    }

    #[test]
    fn test_filter_by_water_quality() {
        let beaches = vec![
            transform(&raw_beach(1, "A", vec![observation("1", "18", "2")])),
            transform(&raw_beach(2, "A", vec![observation("2", "18", "2")])),
            transform(&raw_beach(3, "A", vec![observation("?", "18", "2")])),
        ];

        let poor = filter_by_water_quality(beaches.clone(), Some(WaterQuality::Poor));
        assert_eq!(poor.len(), 1);
        assert_eq!(poor[0].id, "1");

        assert_eq!(filter_by_water_quality(beaches, None).len(), 3);
    }

    const MUNICIPALITIES: [&str; 4] = ["Aarhus", "Odense", "Køge", "Aalborg"];

    proptest! {
        #[test]
        fn filters_commute_and_keep_order(
            rows in prop::collection::vec((0usize..4, 0i64..4), 0..24),
            needle in prop::option::of(prop::sample::select(vec!["aa", "ODENSE", "køge", "x"])),
            class in prop::option::of(1i64..3),
        ) {
            let beaches: Vec<_> = rows
                .iter()
                .enumerate()
                .map(|(id, &(m, q))| {
                    let data = vec![observation(&q.to_string(), "16", "4")];
                    transform(&raw_beach(id as u64, MUNICIPALITIES[m], data))
                })
                .collect();
            let quality = class.map(WaterQuality::from_class);

            let ids = |beaches: Vec<EnrichedBeach>| -> Vec<u64> {
                beaches.into_iter().map(|b| b.id.parse().unwrap()).collect()
            };
            let town_first = ids(filter_by_water_quality(
                filter_by_municipality(beaches.clone(), needle),
                quality,
            ));
            let quality_first = ids(filter_by_municipality(
                filter_by_water_quality(beaches, quality),
                needle,
            ));

            prop_assert_eq!(&town_first, &quality_first);
            prop_assert!(town_first.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
