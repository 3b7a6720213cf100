use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use daytime::geo::{Calculator, Location, SolarModel, Status, SunriseModel};
use daytime::testing::FixedSolarModel;
use proptest::prelude::*;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Any instant during 2024
fn instant_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..366 * 86_400).prop_map(|secs| base() + Duration::seconds(secs))
}

/// Sunrise between 03:00 and 08:59, sunset between 15:00 and 20:59 (UTC)
fn sun_strategy() -> impl Strategy<Value = ((u32, u32), (u32, u32))> {
    ((3u32..9, 0u32..60), (15u32..21, 0u32..60))
}

fn calculator(sunrise: (u32, u32), sunset: (u32, u32), offset_minutes: i64) -> Calculator {
    Calculator::new(
        Box::new(FixedSolarModel::utc(sunrise, sunset)),
        Location::new(0.0, 0.0),
        Duration::minutes(offset_minutes),
    )
}

fn at(date: NaiveDate, (h, m): (u32, u32)) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(h, m, 0).unwrap())
}

/// Property tests for the ordering policy
mod ordering_tests {
    use super::*;

    proptest! {
        /// With both adjusted boundaries ahead, the earlier one (sunrise) wins.
        #[test]
        fn test_earlier_boundary_wins(
            (sunrise, sunset) in sun_strategy(),
            offset in 0i64..=120,
            day in 0i64..365,
            lead in 1i64..180,
        ) {
            let date = base().date_naive() + Duration::days(day);
            let adjusted_sunrise = at(date, sunrise) + Duration::minutes(offset);
            let now = adjusted_sunrise - Duration::minutes(lead);
            prop_assume!(now.date_naive() == date);

            let next = calculator(sunrise, sunset, offset).compute_next(&now).unwrap();
            prop_assert_eq!(next.status, Status::Daytime);
            prop_assert_eq!(next.at, adjusted_sunrise);
        }

        /// The next transition is always strictly after now and never more
        /// than two days away.
        #[test]
        fn test_next_is_strictly_later(
            (sunrise, sunset) in sun_strategy(),
            offset in 0i64..=360,
            now in instant_strategy(),
        ) {
            let next = calculator(sunrise, sunset, offset).compute_next(&now).unwrap();
            prop_assert!(next.at > now);
            prop_assert!(next.at - now <= Duration::days(2));
        }

        /// Same inputs, same answer.
        #[test]
        fn test_compute_next_is_deterministic(
            (sunrise, sunset) in sun_strategy(),
            offset in 0i64..=360,
            now in instant_strategy(),
        ) {
            let calc = calculator(sunrise, sunset, offset);
            prop_assert_eq!(calc.compute_next(&now).unwrap(), calc.compute_next(&now).unwrap());
        }

        /// Feeding each transition back in as "now" always makes progress, even
        /// when the offset inverts the daytime window.
        #[test]
        fn test_chained_transitions_never_stall(
            (sunrise, sunset) in sun_strategy(),
            offset in 0i64..=360,
            now in instant_strategy(),
        ) {
            let calc = calculator(sunrise, sunset, offset);
            let mut reference = now;
            for _ in 0..8 {
                let next = calc.compute_next(&reference).unwrap();
                prop_assert!(next.at > reference);
                reference = next.at;
            }
            // Eight transitions cover at least three days
            prop_assert!(reference - now >= Duration::days(3));
        }
    }
}

/// Property tests for the astronomical model
mod solar_model_tests {
    use super::*;

    proptest! {
        /// Away from the polar circles the sun always rises before it sets and
        /// the result does not change between calls.
        #[test]
        fn test_mid_latitudes_produce_ordered_events(
            lat in -60.0f64..60.0,
            lon in -180.0f64..=180.0,
            day in 0i64..365,
        ) {
            let date = base().date_naive() + Duration::days(day);
            let first = SunriseModel.sun_times(date, lat, lon).unwrap();
            let second = SunriseModel.sun_times(date, lat, lon).unwrap();
            prop_assert!(first.sunrise < first.sunset);
            prop_assert_eq!(first, second);
        }

        /// The calculator on top of the real model keeps the same guarantees.
        #[test]
        fn test_real_model_next_is_strictly_later(
            lat in -60.0f64..60.0,
            lon in -180.0f64..=180.0,
            offset in 0i64..=90,
            now in instant_strategy(),
        ) {
            let calc = Calculator::with_sunrise_model(Location::new(lat, lon), Duration::minutes(offset));
            let next = calc.compute_next(&now).unwrap();
            prop_assert!(next.at > now);
        }
    }
}
