use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::types::{
    ContributionStrategy, PeriodResult, ProjectionInput, ProjectionSeries, RiskProfile,
};

const MONTHS_PER_YEAR: u32 = 12;

/// Source of randomness for a simulation run.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct SimulationConfig {
    /// Replays the same return path when set; otherwise the thread-local generator is used.
    pub seed: Option<u64>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum MonthlyTiming {
    /// The contribution compounds together with the balance in the month it is made.
    ContributeThenGrow,
    /// The balance compounds first; the contribution is added uncompounded.
    GrowThenContribute,
}

pub fn simulate(input: &ProjectionInput) -> ProjectionSeries {
    simulate_with_rng(input, &mut rand::thread_rng())
}

pub fn simulate_with_config(input: &ProjectionInput, config: SimulationConfig) -> ProjectionSeries {
    match config.seed {
        Some(seed) => simulate_with_rng(input, &mut StdRng::seed_from_u64(seed)),
        None => simulate(input),
    }
}

pub fn simulate_with_rng<R: Rng + ?Sized>(
    input: &ProjectionInput,
    rng: &mut R,
) -> ProjectionSeries {
    let series = match input.strategy {
        ContributionStrategy::LumpSum => simulate_lump_sum(input, rng),
        ContributionStrategy::DollarCostAveraging => {
            simulate_monthly(input, rng, MonthlyTiming::ContributeThenGrow)
        }
        ContributionStrategy::RecurringMonthly => {
            simulate_monthly(input, rng, MonthlyTiming::GrowThenContribute)
        }
    };

    if let Some(last) = series.last() {
        debug!(
            "simulated {:?} over {} years ({:?}): invested {:.2}, value {:.2}",
            input.strategy, input.horizon_years, input.risk_profile, last.invested, last.value
        );
    }
    series
}

/// Draws one annual return: the band midpoint plus uniform noise of width `volatility`.
pub fn sample_annual_return<R: Rng + ?Sized>(profile: RiskProfile, rng: &mut R) -> f64 {
    let u: f64 = rng.gen_range(0.0..1.0);
    profile.base_return() + (u - 0.5) * profile.params().volatility
}

/// Monthly rate that compounds to `annual_return` over twelve months.
pub fn monthly_rate(annual_return: f64) -> f64 {
    (1.0 + annual_return).powf(1.0 / f64::from(MONTHS_PER_YEAR)) - 1.0
}

fn simulate_monthly<R: Rng + ?Sized>(
    input: &ProjectionInput,
    rng: &mut R,
    timing: MonthlyTiming,
) -> ProjectionSeries {
    let monthly_amount = input.amount;
    let mut series = Vec::with_capacity(input.horizon_years as usize);
    let mut value = 0.0;

    for year in 1..=input.horizon_years {
        let rate = monthly_rate(sample_annual_return(input.risk_profile, rng));
        for _ in 0..MONTHS_PER_YEAR {
            value = match timing {
                MonthlyTiming::ContributeThenGrow => (value + monthly_amount) * (1.0 + rate),
                MonthlyTiming::GrowThenContribute => value * (1.0 + rate) + monthly_amount,
            };
        }
        let invested = monthly_amount * f64::from(year) * f64::from(MONTHS_PER_YEAR);
        series.push(PeriodResult::new(year, invested, value));
    }

    series
}

fn simulate_lump_sum<R: Rng + ?Sized>(input: &ProjectionInput, rng: &mut R) -> ProjectionSeries {
    let invested = input.amount;
    let mut series = Vec::with_capacity(input.horizon_years as usize);
    let mut value = invested;

    for year in 1..=input.horizon_years {
        let annual_return = sample_annual_return(input.risk_profile, rng);
        value *= 1.0 + annual_return;
        series.push(PeriodResult::new(year, invested, value));
    }

    series
}
