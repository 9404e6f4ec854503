use super::types::{InvestmentResult, PeriodResult, TimelineEntry};

const MONTHS_PER_YEAR: u32 = 12;

/// Years shown on the plain savings timeline.
pub const TIMELINE_YEARS: u32 = 5;

/// Terminal summary of a projection. `None` for an empty series.
pub fn derive_summary(series: &[PeriodResult]) -> Option<InvestmentResult> {
    series.last().map(|last| InvestmentResult {
        total_invested: last.invested,
        final_value: last.value,
        gain: last.gain,
    })
}

/// `gain / total_invested * 100`, or `None` when nothing was invested.
pub fn return_percentage(result: &InvestmentResult) -> Option<f64> {
    percentage_of(result.gain, result.total_invested)
}

pub fn year_return_percentage(period: &PeriodResult) -> Option<f64> {
    percentage_of(period.gain, period.invested)
}

/// Snapshot for a zero-based year index.
pub fn period_snapshot(series: &[PeriodResult], year_index: usize) -> Option<&PeriodResult> {
    series.get(year_index)
}

/// Linear accumulation with no growth: `monthly_saving * years * 12`.
pub fn saving_for_period(monthly_saving: f64, years: u32) -> f64 {
    monthly_saving * f64::from(years) * f64::from(MONTHS_PER_YEAR)
}

/// Cumulative savings for each year from 1 up to `years_up_to` (capped at five).
///
/// This path deliberately ignores market returns; it backs the plain savings
/// calculator, not the investment projection.
pub fn fixed_timeline(monthly_saving: f64, years_up_to: u32) -> Vec<TimelineEntry> {
    if !monthly_saving.is_finite() || monthly_saving <= 0.0 {
        return Vec::new();
    }

    (1..=years_up_to.min(TIMELINE_YEARS))
        .map(|year| TimelineEntry {
            year,
            months: year * MONTHS_PER_YEAR,
            total_saved: saving_for_period(monthly_saving, year),
        })
        .collect()
}

fn percentage_of(gain: f64, invested: f64) -> Option<f64> {
    if invested == 0.0 || !invested.is_finite() || !gain.is_finite() {
        return None;
    }
    Some(gain / invested * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::simulate_with_rng;
    use crate::core::types::{ContributionStrategy, ProjectionInput, RiskProfile};
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn fixed_timeline_is_linear_without_randomness() {
        let timeline = fixed_timeline(500.0, 5);
        assert_eq!(timeline.len(), 5);
        assert_eq!(timeline[2].year, 3);
        assert_eq!(timeline[2].months, 36);
        assert_eq!(timeline[2].total_saved, 18_000.0);
        assert_eq!(timeline[4].total_saved, 30_000.0);
    }

    #[test]
    fn fixed_timeline_caps_at_five_years_and_skips_non_positive_amounts() {
        assert_eq!(fixed_timeline(100.0, 12).len(), 5);
        assert_eq!(fixed_timeline(100.0, 2).len(), 2);
        assert!(fixed_timeline(0.0, 5).is_empty());
        assert!(fixed_timeline(-50.0, 5).is_empty());
        assert!(fixed_timeline(f64::NAN, 5).is_empty());
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_fixed_timeline_matches_product(monthly in 1_u32..100_000) {
            let monthly = f64::from(monthly);
            for entry in fixed_timeline(monthly, TIMELINE_YEARS) {
                prop_assert_eq!(entry.total_saved, monthly * f64::from(entry.year * 12));
                prop_assert_eq!(entry.total_saved, saving_for_period(monthly, entry.year));
            }
        }

        #[test]
        fn prop_return_percentage_is_finite_or_unavailable(
            invested in 0_u32..1_000_000,
            value in 0_u32..2_000_000,
        ) {
            let result = InvestmentResult {
                total_invested: f64::from(invested),
                final_value: f64::from(value),
                gain: f64::from(value) - f64::from(invested),
            };
            match return_percentage(&result) {
                Some(pct) => {
                    prop_assert!(invested > 0);
                    prop_assert!(pct.is_finite());
                }
                None => prop_assert_eq!(invested, 0),
            }
        }
    }

    #[test]
    fn return_percentage_is_unavailable_for_zero_investment() {
        let result = InvestmentResult {
            total_invested: 0.0,
            final_value: 0.0,
            gain: 0.0,
        };
        assert_eq!(return_percentage(&result), None);

        let result = InvestmentResult {
            total_invested: 0.0,
            final_value: 10.0,
            gain: 10.0,
        };
        assert_eq!(return_percentage(&result), None);
    }

    #[test]
    fn return_percentage_of_known_result() {
        let result = InvestmentResult {
            total_invested: 6_000.0,
            final_value: 6_600.0,
            gain: 600.0,
        };
        assert_approx(return_percentage(&result).expect("invested > 0"), 10.0);

        let loss = PeriodResult::new(2, 1_000.0, 950.0);
        assert_approx(year_return_percentage(&loss).expect("invested > 0"), -5.0);
    }

    #[test]
    fn summary_and_snapshots_come_from_the_series_unchanged() {
        let input = ProjectionInput {
            amount: 250.0,
            horizon_years: 6,
            risk_profile: RiskProfile::Moderate,
            strategy: ContributionStrategy::RecurringMonthly,
        };
        let series = simulate_with_rng(&input, &mut StdRng::seed_from_u64(3));

        let summary = derive_summary(&series).expect("non-empty series");
        let last = series.last().expect("non-empty series");
        assert_eq!(summary.total_invested, last.invested);
        assert_eq!(summary.final_value, last.value);
        assert_eq!(summary.gain, summary.final_value - summary.total_invested);

        assert_eq!(period_snapshot(&series, 2), Some(&series[2]));
        assert_eq!(period_snapshot(&series, 6), None);
    }

    #[test]
    fn empty_series_has_no_summary() {
        assert_eq!(derive_summary(&[]), None);
        assert_eq!(period_snapshot(&[], 0), None);
    }

    #[test]
    fn saving_for_period_handles_extreme_horizons() {
        let total = saving_for_period(1.0, u32::MAX);
        assert_eq!(total, f64::from(u32::MAX) * 12.0);
        assert!(total.is_finite());
    }
}
