//! Property tests for batch scheduling: outcomes follow input order no matter
//! how rayon interleaves the work, and only unknown assets fail.

use bri_core::config::{BriConfig, BriConfigSpec, HorizonConfig, WindowConfig};
use bri_core::data::InMemoryProvider;
use bri_core::PriceSeries;
use bri_runner::{run_batch, BatchOptions};
use chrono::NaiveDate;
use proptest::prelude::*;

const KNOWN: [&str; 4] = ["AAA", "BBB", "CCC", "DDD"];

fn tiny_config() -> BriConfig {
    BriConfigSpec {
        windows: WindowConfig::new(
            HorizonConfig::new(3, 6).unwrap(),
            HorizonConfig::new(4, 8).unwrap(),
            HorizonConfig::new(5, 10).unwrap(),
        ),
        ..Default::default()
    }
    .build()
    .unwrap()
}

fn provider() -> InMemoryProvider {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    KNOWN
        .iter()
        .enumerate()
        .fold(InMemoryProvider::new(), |p, (k, id)| {
            let dates = (0..40).map(|i| base + chrono::Duration::days(i)).collect();
            let prices = (0..40)
                .map(|i| 100.0 + (k as f64 + 1.0) * (i as f64 * 0.3).sin())
                .collect();
            p.with_series(*id, PriceSeries::new(dates, prices).unwrap())
        })
}

fn asset_list() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop_oneof![
            prop::sample::select(KNOWN.to_vec()).prop_map(String::from),
            "[X-Z]{3}".prop_map(|s| format!("MISSING_{s}")),
        ],
        0..12,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn batch_output_order_matches_input(assets in asset_list()) {
        let report = run_batch(&assets, &provider(), &tiny_config(), &BatchOptions::default());

        let ids: Vec<&str> = report.outcomes.iter().map(|o| o.asset_id()).collect();
        let expected: Vec<&str> = assets.iter().map(|s| s.as_str()).collect();
        prop_assert_eq!(ids, expected);

        for outcome in &report.outcomes {
            let known = KNOWN.contains(&outcome.asset_id());
            prop_assert_eq!(outcome.is_success(), known);
        }
        prop_assert_eq!(report.succeeded() + report.failed(), assets.len());
    }
}
