use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;

use crate::core::{
    BotMessage, CompanyInfo, ContributionStrategy, ContributorList, GROWTH_COMPANY,
    InvestmentResult, PeriodResult, ProjectionInput, RiskProfile, SaverCard, SavingsAggregate,
    SimulationConfig, TIMELINE_YEARS, TimelineEntry, WavePoint, aggregate, coerce_amount,
    coerce_count, derive_summary, fixed_timeline, individual_savers, label_waves, parse_names,
    recommend, return_percentage, saving_for_period, simulate_with_config, year_return_percentage,
};
use crate::market::{
    DEFAULT_EUR_USD, ExchangeRates, HttpQuoteSource, HttpRateSource, MonthlyQuote, QUOTE_TTL,
    QuoteStats, Quotes, RATE_TTL, eur_to_usd, simulated_history, usd_to_eur,
};
use crate::store::{JsonFileStore, MemoryStore, SavedState, StateStore};

/// Smallest monthly amount the investment form accepts.
pub const MIN_MONTHLY_AMOUNT: f64 = 100.0;
pub const MAX_HORIZON_YEARS: u32 = 100;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliRiskProfile {
    Conservative,
    Moderate,
    Aggressive,
}

impl From<CliRiskProfile> for RiskProfile {
    fn from(value: CliRiskProfile) -> Self {
        match value {
            CliRiskProfile::Conservative => RiskProfile::Conservative,
            CliRiskProfile::Moderate => RiskProfile::Moderate,
            CliRiskProfile::Aggressive => RiskProfile::Aggressive,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliStrategy {
    Lump,
    Dca,
    Monthly,
}

impl From<CliStrategy> for ContributionStrategy {
    fn from(value: CliStrategy) -> Self {
        match value {
            CliStrategy::Lump => ContributionStrategy::LumpSum,
            CliStrategy::Dca => ContributionStrategy::DollarCostAveraging,
            CliStrategy::Monthly => ContributionStrategy::RecurringMonthly,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiRiskProfile {
    #[serde(alias = "low")]
    Conservative,
    #[serde(alias = "medium", alias = "balanced")]
    Moderate,
    #[serde(alias = "high")]
    Aggressive,
}

impl From<ApiRiskProfile> for CliRiskProfile {
    fn from(value: ApiRiskProfile) -> Self {
        match value {
            ApiRiskProfile::Conservative => CliRiskProfile::Conservative,
            ApiRiskProfile::Moderate => CliRiskProfile::Moderate,
            ApiRiskProfile::Aggressive => CliRiskProfile::Aggressive,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiStrategy {
    #[serde(alias = "lump", alias = "lumpSum", alias = "lump_sum")]
    LumpSum,
    #[serde(
        alias = "dca",
        alias = "dollarCostAveraging",
        alias = "dollar_cost_averaging"
    )]
    DollarCostAveraging,
    #[serde(alias = "monthly", alias = "recurringMonthly", alias = "recurring_monthly")]
    RecurringMonthly,
}

impl From<ApiStrategy> for CliStrategy {
    fn from(value: ApiStrategy) -> Self {
        match value {
            ApiStrategy::LumpSum => CliStrategy::Lump,
            ApiStrategy::DollarCostAveraging => CliStrategy::Dca,
            ApiStrategy::RecurringMonthly => CliStrategy::Monthly,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct InvestPayload {
    amount: Option<f64>,
    years: Option<u32>,
    risk_profile: Option<ApiRiskProfile>,
    strategy: Option<ApiStrategy>,
    seed: Option<u64>,
    company: Option<String>,
}

/// Savings form fields as the user typed them. Values that are not usable
/// numbers become 0 instead of failing the request.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SavingsPayload {
    monthly_saving: Option<Value>,
    is_group: Option<Value>,
    people_count: Option<Value>,
    per_person_amount: Option<Value>,
    investor_names: Option<Value>,
    years: Option<Value>,
}

impl SavingsPayload {
    fn into_state(self) -> SavedState {
        SavedState {
            monthly_saving: amount_field(self.monthly_saving.as_ref()),
            is_group: flag_field(self.is_group.as_ref()),
            people_count: count_field(self.people_count.as_ref()),
            per_person_amount: amount_field(self.per_person_amount.as_ref()),
            investor_names: self
                .investor_names
                .as_ref()
                .map(field_text)
                .unwrap_or_default(),
            years: count_field(self.years.as_ref()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConvertPayload {
    eur: Option<f64>,
    usd: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuotesPayload {
    company: Option<String>,
}

#[derive(Parser, Debug)]
#[command(
    name = "savebot",
    about = "Savings calculator and investment projection bot (lump sum, DCA, recurring monthly)"
)]
struct Cli {
    #[arg(
        long,
        default_value_t = 500.0,
        help = "Monthly amount to invest; lump sum deposits amount * years * 12 up front"
    )]
    amount: f64,
    #[arg(long, default_value_t = 5, help = "Investment horizon in years")]
    years: u32,
    #[arg(long, value_enum, default_value_t = CliRiskProfile::Moderate)]
    risk_profile: CliRiskProfile,
    #[arg(long, value_enum, default_value_t = CliStrategy::Dca)]
    strategy: CliStrategy,
    #[arg(long, help = "Seed for a reproducible return path")]
    seed: Option<u64>,
    #[arg(
        long,
        default_value = "growth",
        help = "Company the bot comments on; unknown keys use the growth company"
    )]
    company: String,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InputError {
    #[error("--amount must be a finite number")]
    AmountNotFinite,
    #[error("--amount must be at least {min} (got {amount})")]
    AmountTooSmall { amount: f64, min: f64 },
    #[error("--years must be >= 1")]
    HorizonTooShort,
    #[error("--years must be <= {max} (got {years})")]
    HorizonTooLong { years: u32, max: u32 },
}

#[derive(Debug)]
struct InvestRequest {
    company: &'static CompanyInfo,
    monthly_amount: f64,
    input: ProjectionInput,
    config: SimulationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    #[serde(flatten)]
    result: InvestmentResult,
    return_percentage: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectionRow {
    #[serde(flatten)]
    period: PeriodResult,
    return_percentage: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InvestResponse {
    company: &'static CompanyInfo,
    risk_profile: RiskProfile,
    strategy: ContributionStrategy,
    monthly_amount: f64,
    invested_amount: f64,
    years: u32,
    seed: Option<u64>,
    summary: Option<SummaryResponse>,
    projection: Vec<ProjectionRow>,
    waves: Vec<WavePoint>,
    messages: Vec<BotMessage>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SavingsResponse {
    is_group: bool,
    contributors: ContributorList,
    names: Vec<String>,
    aggregate: SavingsAggregate,
    monthly_saving: f64,
    years: u32,
    months: u32,
    total_saved: f64,
    per_person_total: f64,
    timeline: Vec<TimelineEntry>,
    savers: Vec<SaverCard>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuotesResponse {
    company: &'static CompanyInfo,
    /// `false` when the provider was unreachable and the history is simulated.
    live: bool,
    history: Vec<MonthlyQuote>,
    stats: Option<QuoteStats>,
}

#[derive(Debug, Serialize, PartialEq)]
struct ConvertResponse {
    rate: f64,
    eur: f64,
    usd: f64,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// `None` keeps the saved calculator state in memory only.
    pub state_path: Option<PathBuf>,
    pub default_rate: f64,
    pub rate_ttl: Duration,
    pub quote_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            state_path: Some(PathBuf::from("savebot-state.json")),
            default_rate: DEFAULT_EUR_USD,
            rate_ttl: RATE_TTL,
            quote_ttl: QUOTE_TTL,
        }
    }
}

struct AppState {
    rates: ExchangeRates<HttpRateSource>,
    quotes: Quotes<HttpQuoteSource>,
    store: Box<dyn StateStore>,
    default_rate: f64,
}

impl AppState {
    fn new(config: &ServerConfig, store: Box<dyn StateStore>) -> Self {
        Self {
            rates: ExchangeRates::new(HttpRateSource::new(), config.default_rate)
                .with_ttl(config.rate_ttl),
            quotes: Quotes::new(HttpQuoteSource::new()).with_ttl(config.quote_ttl),
            store,
            default_rate: config.default_rate,
        }
    }
}

type SharedState = Arc<AppState>;

fn build_inputs(cli: Cli) -> Result<InvestRequest, InputError> {
    if !cli.amount.is_finite() {
        return Err(InputError::AmountNotFinite);
    }

    if cli.amount < MIN_MONTHLY_AMOUNT {
        return Err(InputError::AmountTooSmall {
            amount: cli.amount,
            min: MIN_MONTHLY_AMOUNT,
        });
    }

    if cli.years < 1 {
        return Err(InputError::HorizonTooShort);
    }

    if cli.years > MAX_HORIZON_YEARS {
        return Err(InputError::HorizonTooLong {
            years: cli.years,
            max: MAX_HORIZON_YEARS,
        });
    }

    Ok(InvestRequest {
        company: CompanyInfo::lookup(&cli.company),
        monthly_amount: cli.amount,
        input: ProjectionInput::from_monthly(
            cli.amount,
            cli.years,
            cli.risk_profile.into(),
            cli.strategy.into(),
        ),
        config: SimulationConfig { seed: cli.seed },
    })
}

/// Parses command-line arguments and returns the projection as pretty JSON.
pub fn run_cli<I, T>(args: I) -> Result<String, String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;
    let request = build_inputs(cli).map_err(|e| e.to_string())?;
    serde_json::to_string_pretty(&build_invest_response(&request))
        .map_err(|e| format!("failed to encode projection: {e}"))
}

pub async fn run_http_server(config: ServerConfig) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let store: Box<dyn StateStore> = match &config.state_path {
        Some(path) => {
            let store = JsonFileStore::new(path);
            info!("saving calculator state to {}", store.path().display());
            Box::new(store)
        }
        None => {
            info!("calculator state is kept in memory only");
            Box::new(MemoryStore::default())
        }
    };
    let state = Arc::new(AppState::new(&config, store));

    let app = Router::new()
        .route(
            "/api/invest",
            get(invest_get_handler).post(invest_post_handler),
        )
        .route(
            "/api/savings",
            get(savings_get_handler).post(savings_post_handler),
        )
        .route("/api/convert", get(convert_handler))
        .route("/api/quotes", get(quotes_handler))
        .route("/api/state", get(load_state_handler).put(save_state_handler))
        .fallback(not_found_handler)
        .with_state(state);

    let listener = TcpListener::bind(addr).await?;
    info!("savebot HTTP API listening on http://{addr}");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn invest_get_handler(Query(payload): Query<InvestPayload>) -> Response {
    invest_handler_impl(payload)
}

async fn invest_post_handler(Json(payload): Json<InvestPayload>) -> Response {
    invest_handler_impl(payload)
}

fn invest_handler_impl(payload: InvestPayload) -> Response {
    match invest_request_from_payload(payload) {
        Ok(request) => json_response(StatusCode::OK, build_invest_response(&request)),
        Err(e) => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}

async fn savings_get_handler(Query(payload): Query<SavingsPayload>) -> Response {
    json_response(StatusCode::OK, build_savings_response(payload.into_state()))
}

async fn savings_post_handler(Json(payload): Json<SavingsPayload>) -> Response {
    json_response(StatusCode::OK, build_savings_response(payload.into_state()))
}

async fn convert_handler(
    State(state): State<SharedState>,
    Query(payload): Query<ConvertPayload>,
) -> Response {
    let default_rate = state.default_rate;
    let rates_state = Arc::clone(&state);
    let rate = tokio::task::spawn_blocking(move || rates_state.rates.current(Instant::now()))
        .await
        .unwrap_or_else(|e| {
            warn!("exchange rate task failed: {e}");
            default_rate
        });

    json_response(StatusCode::OK, convert(rate, &payload))
}

async fn quotes_handler(
    State(state): State<SharedState>,
    Query(payload): Query<QuotesPayload>,
) -> Response {
    let company = CompanyInfo::lookup(payload.company.as_deref().unwrap_or_default());
    let quotes_state = Arc::clone(&state);
    let live = tokio::task::spawn_blocking(move || {
        quotes_state.quotes.history(company.symbol, Instant::now())
    })
    .await
    .unwrap_or_else(|e| {
        warn!("quote task failed: {e}");
        None
    });

    json_response(StatusCode::OK, build_quotes_response(company, live))
}

async fn load_state_handler(State(state): State<SharedState>) -> Response {
    json_response(StatusCode::OK, state.store.load().unwrap_or_default())
}

async fn save_state_handler(
    State(state): State<SharedState>,
    Json(payload): Json<SavingsPayload>,
) -> Response {
    let normalized = payload.into_state().normalized();
    match state.store.save(&normalized) {
        Ok(()) => json_response(StatusCode::OK, normalized),
        Err(e) => {
            warn!("{e}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn invest_request_from_json(json: &str) -> Result<InvestRequest, String> {
    let payload = serde_json::from_str::<InvestPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    invest_request_from_payload(payload).map_err(|e| e.to_string())
}

fn invest_request_from_payload(payload: InvestPayload) -> Result<InvestRequest, InputError> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.amount {
        cli.amount = v;
    }
    if let Some(v) = payload.years {
        cli.years = v;
    }
    if let Some(v) = payload.risk_profile {
        cli.risk_profile = v.into();
    }
    if let Some(v) = payload.strategy {
        cli.strategy = v.into();
    }
    if let Some(v) = payload.seed {
        cli.seed = Some(v);
    }
    if let Some(v) = payload.company {
        cli.company = v;
    }

    build_inputs(cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        amount: 500.0,
        years: 5,
        risk_profile: CliRiskProfile::Moderate,
        strategy: CliStrategy::Dca,
        seed: None,
        company: GROWTH_COMPANY.key.to_string(),
    }
}

fn build_invest_response(request: &InvestRequest) -> InvestResponse {
    let input = &request.input;
    let series = simulate_with_config(input, request.config);
    let summary = derive_summary(&series);

    let messages = summary
        .map(|result| {
            recommend(
                &result,
                request.company,
                input.risk_profile,
                input.strategy,
                input.amount,
                input.horizon_years,
            )
        })
        .unwrap_or_default();

    InvestResponse {
        company: request.company,
        risk_profile: input.risk_profile,
        strategy: input.strategy,
        monthly_amount: request.monthly_amount,
        invested_amount: input.amount,
        years: input.horizon_years,
        seed: request.config.seed,
        summary: summary.map(|result| SummaryResponse {
            result,
            return_percentage: return_percentage(&result),
        }),
        projection: series
            .iter()
            .map(|period| ProjectionRow {
                period: *period,
                return_percentage: year_return_percentage(period),
            })
            .collect(),
        waves: label_waves(&series),
        messages,
    }
}

fn build_savings_response(payload: SavedState) -> SavingsResponse {
    let state = payload.normalized();
    let contributors = parse_names(&state.investor_names);
    let group = aggregate(state.people_count, state.per_person_amount);
    let monthly_saving = state.effective_monthly();
    let savers = if state.is_group {
        individual_savers(group.per_person_monthly, &contributors, state.years)
    } else {
        Vec::new()
    };

    SavingsResponse {
        is_group: state.is_group,
        names: contributors.labels().into_iter().map(str::to_string).collect(),
        contributors,
        aggregate: group,
        monthly_saving,
        years: state.years,
        months: state.years.saturating_mul(12),
        total_saved: saving_for_period(monthly_saving, state.years),
        per_person_total: group.per_person_total(state.years),
        timeline: fixed_timeline(monthly_saving, TIMELINE_YEARS),
        savers,
    }
}

fn build_quotes_response(
    company: &'static CompanyInfo,
    live: Option<Vec<MonthlyQuote>>,
) -> QuotesResponse {
    let (live, history) = match live {
        Some(history) => (true, history),
        None => (false, simulated_history(&mut rand::thread_rng())),
    };

    QuotesResponse {
        company,
        live,
        stats: QuoteStats::from_quotes(&history),
        history,
    }
}

fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn amount_field(value: Option<&Value>) -> f64 {
    value.map_or(0.0, |v| coerce_amount(&field_text(v)))
}

fn count_field(value: Option<&Value>) -> u32 {
    value.map_or(0, |v| coerce_count(&field_text(v)))
}

fn flag_field(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "on" | "yes"
        ),
        _ => false,
    }
}

fn convert(rate: f64, payload: &ConvertPayload) -> ConvertResponse {
    match (payload.eur, payload.usd) {
        (Some(eur), _) => ConvertResponse {
            rate,
            eur,
            usd: eur_to_usd(eur, rate),
        },
        (None, Some(usd)) => ConvertResponse {
            rate,
            eur: usd_to_eur(usd, rate),
            usd,
        },
        (None, None) => ConvertResponse {
            rate,
            eur: 0.0,
            usd: 0.0,
        },
    }
}
