use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskProfile {
    Conservative,
    Moderate,
    Aggressive,
}

/// Expected-return band and noise amplitude of a risk profile, as decimal fractions.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RiskParams {
    pub min_annual_return: f64,
    pub max_annual_return: f64,
    pub volatility: f64,
    pub description: &'static str,
}

const CONSERVATIVE: RiskParams = RiskParams {
    min_annual_return: 0.03,
    max_annual_return: 0.05,
    volatility: 0.08,
    description: "Safe holdings such as government bonds and low-risk ETFs",
};

const MODERATE: RiskParams = RiskParams {
    min_annual_return: 0.05,
    max_annual_return: 0.07,
    volatility: 0.12,
    description: "Balanced mix of equities and bonds through diversified ETFs",
};

const AGGRESSIVE: RiskParams = RiskParams {
    min_annual_return: 0.07,
    max_annual_return: 0.10,
    volatility: 0.18,
    description: "Aggressive equity portfolio, sector ETFs, high growth",
};

impl RiskProfile {
    pub fn params(self) -> &'static RiskParams {
        match self {
            RiskProfile::Conservative => &CONSERVATIVE,
            RiskProfile::Moderate => &MODERATE,
            RiskProfile::Aggressive => &AGGRESSIVE,
        }
    }

    /// Midpoint of the expected-return band.
    pub fn base_return(self) -> f64 {
        let p = self.params();
        (p.min_annual_return + p.max_annual_return) / 2.0
    }
}

/// Company whose shares the investment bot talks about.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfo {
    pub key: &'static str,
    pub name: &'static str,
    pub full_name: &'static str,
    pub description: &'static str,
    pub sector: &'static str,
    /// Ticker used for the live monthly chart.
    pub symbol: &'static str,
}

pub const GROWTH_COMPANY: CompanyInfo = CompanyInfo {
    key: "growth",
    name: "Growth",
    full_name: "Growth Corporation",
    description: "Growth-focused company betting on technological innovation and market expansion.",
    sector: "Technology and Growth",
    symbol: "VUG",
};

static COMPANIES: [CompanyInfo; 1] = [GROWTH_COMPANY];

impl CompanyInfo {
    /// Case-insensitive lookup by key; unknown keys fall back to the growth company.
    pub fn lookup(key: &str) -> &'static CompanyInfo {
        let key = key.trim();
        COMPANIES
            .iter()
            .find(|c| c.key.eq_ignore_ascii_case(key))
            .unwrap_or(&COMPANIES[0])
    }

    pub fn is_growth(&self) -> bool {
        self.key == GROWTH_COMPANY.key
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContributionStrategy {
    LumpSum,
    DollarCostAveraging,
    RecurringMonthly,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ProjectionInput {
    /// Monthly contribution for the monthly strategies, deposited capital for lump sum.
    pub amount: f64,
    pub horizon_years: u32,
    pub risk_profile: RiskProfile,
    pub strategy: ContributionStrategy,
}

impl ProjectionInput {
    /// Builds an input from the monthly figure entered on the investment form.
    ///
    /// Lump sum treats the monthly figure as an equivalent total capital of
    /// `monthly * years * 12`, deposited up front.
    pub fn from_monthly(
        monthly_amount: f64,
        horizon_years: u32,
        risk_profile: RiskProfile,
        strategy: ContributionStrategy,
    ) -> Self {
        let amount = match strategy {
            ContributionStrategy::LumpSum => monthly_amount * f64::from(horizon_years) * 12.0,
            ContributionStrategy::DollarCostAveraging | ContributionStrategy::RecurringMonthly => {
                monthly_amount
            }
        };
        Self {
            amount,
            horizon_years,
            risk_profile,
            strategy,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodResult {
    pub year: u32,
    pub invested: f64,
    pub value: f64,
    pub gain: f64,
}

impl PeriodResult {
    pub fn new(year: u32, invested: f64, value: f64) -> Self {
        Self {
            year,
            invested,
            value,
            gain: value - invested,
        }
    }
}

/// Year-by-year output of one simulation run, years `1..=horizon`.
pub type ProjectionSeries = Vec<PeriodResult>;

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentResult {
    pub total_invested: f64,
    pub final_value: f64,
    pub gain: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub enum CanonicalSlot {
    L,
    X,
    Y,
    D,
    Other,
}

impl CanonicalSlot {
    /// Display order of the named slots.
    pub const ORDER: [CanonicalSlot; 4] = [
        CanonicalSlot::L,
        CanonicalSlot::X,
        CanonicalSlot::Y,
        CanonicalSlot::D,
    ];

    pub fn code(self) -> Option<&'static str> {
        match self {
            CanonicalSlot::L => Some("L"),
            CanonicalSlot::X => Some("X"),
            CanonicalSlot::Y => Some("Y"),
            CanonicalSlot::D => Some("D"),
            CanonicalSlot::Other => None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contributor {
    pub raw_label: String,
    pub canonical_slot: CanonicalSlot,
}

impl Contributor {
    /// Canonical code for named slots, the trimmed input otherwise.
    pub fn label(&self) -> &str {
        self.canonical_slot.code().unwrap_or(self.raw_label.as_str())
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ContributorList(pub Vec<Contributor>);

impl ContributorList {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Contributor> {
        self.0.iter()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.0.iter().map(Contributor::label).collect()
    }

    /// Comma-joined labels, the form saved alongside the rest of the state.
    pub fn to_raw(&self) -> String {
        self.labels().join(", ")
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsAggregate {
    pub people_count: u32,
    pub per_person_monthly: f64,
    pub monthly_total: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub year: u32,
    pub months: u32,
    pub total_saved: f64,
}

/// One of the four individual saver boxes on the group view.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaverCard {
    pub name: String,
    pub monthly: f64,
    pub one_year: f64,
    pub three_years: f64,
    pub total: f64,
}
