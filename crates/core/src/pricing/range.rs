use crate::domain::hotel::{CityPriceStats, Hotel};
use crate::domain::pricing::PriceRange;

// Heuristic spread used when a city has no aggregate stats yet.
const HEURISTIC_MIN_FACTOR: f64 = 0.8;
const HEURISTIC_MAX_FACTOR: f64 = 1.5;

/// City baseline, or a range derived from the hotel's own nightly price when the city has no
/// aggregate stats.
pub fn base_range(stats: Option<CityPriceStats>, hotel: &Hotel) -> PriceRange {
    match stats {
        Some(s) => PriceRange {
            min: s.min,
            avg: s.avg,
            max: s.max,
        },
        None => {
            let base = hotel.price_per_night;
            PriceRange {
                min: base * HEURISTIC_MIN_FACTOR,
                avg: base,
                max: base * HEURISTIC_MAX_FACTOR,
            }
        }
    }
}

/// Applies the demand multiplier, rounding each bound to a whole currency unit.
pub fn adjust(base: &PriceRange, multiplier: f64) -> PriceRange {
    PriceRange {
        min: (base.min * multiplier).round(),
        avg: (base.avg * multiplier).round(),
        max: (base.max * multiplier).round(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn hotel(price: f64) -> Hotel {
        Hotel {
            id: Uuid::nil(),
            name: "Haveli".to_string(),
            city: "Jaipur".to_string(),
            rating: Some(4.4),
            review_count: 120,
            price_per_night: price,
        }
    }

    #[test]
    fn scales_and_rounds() {
        let base = PriceRange {
            min: 4000.0,
            avg: 5000.0,
            max: 7500.0,
        };
        let adjusted = adjust(&base, 1.5);
        assert_eq!(
            adjusted,
            PriceRange {
                min: 6000.0,
                avg: 7500.0,
                max: 11250.0
            }
        );

        let adjusted = adjust(&base, 1.2);
        assert_eq!((adjusted.min, adjusted.avg, adjusted.max), (4800.0, 6000.0, 9000.0));
    }

    #[test]
    fn neutral_multiplier_rounds_fractional_averages() {
        let base = PriceRange {
            min: 1999.0,
            avg: 3333.4,
            max: 5200.0,
        };
        let adjusted = adjust(&base, 1.0);
        assert_eq!(adjusted.avg, 3333.0);
    }

    #[test]
    fn prefers_city_stats() {
        let stats = CityPriceStats {
            min: 4000.0,
            avg: 5000.0,
            max: 7500.0,
        };
        let range = base_range(Some(stats), &hotel(9000.0));
        assert_eq!((range.min, range.avg, range.max), (4000.0, 5000.0, 7500.0));
    }

    #[test]
    fn falls_back_to_hotel_price_heuristic() {
        let range = base_range(None, &hotel(5000.0));
        assert!((range.min - 4000.0).abs() < 1e-6);
        assert_eq!(range.avg, 5000.0);
        assert!((range.max - 7500.0).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn adjusted_range_keeps_order(
            min in 0.0f64..50_000.0,
            avg_gap in 0.0f64..50_000.0,
            max_gap in 0.0f64..50_000.0,
            multiplier in 1.0f64..3.0,
        ) {
            let base = PriceRange { min, avg: min + avg_gap, max: min + avg_gap + max_gap };
            let adjusted = adjust(&base, multiplier);
            prop_assert!(adjusted.min <= adjusted.avg);
            prop_assert!(adjusted.avg <= adjusted.max);
        }
    }
}
