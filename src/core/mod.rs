mod advisor;
mod engine;
mod metrics;
mod names;
mod types;
mod waves;

pub use advisor::{BotMessage, MessageKind, recommend};
pub use engine::{
    SimulationConfig, monthly_rate, sample_annual_return, simulate, simulate_with_config,
    simulate_with_rng,
};
pub use metrics::{
    TIMELINE_YEARS, derive_summary, fixed_timeline, period_snapshot, return_percentage,
    saving_for_period, year_return_percentage,
};
pub use names::{
    SAVER_SLOTS, aggregate, canonical_slot, coerce_amount, coerce_count, individual_savers,
    parse_names, resolve_people_count,
};
pub use types::{
    CanonicalSlot, CompanyInfo, ContributionStrategy, Contributor, ContributorList,
    GROWTH_COMPANY, InvestmentResult, PeriodResult, ProjectionInput, ProjectionSeries, RiskParams,
    RiskProfile, SaverCard, SavingsAggregate, TimelineEntry,
};
pub use waves::{WavePoint, label_waves};
