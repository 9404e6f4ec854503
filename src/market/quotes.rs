use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Datelike, Utc};
use log::warn;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::cache::TtlCache;
use super::{FETCH_TIMEOUT, FetchError, get_json};

pub const QUOTE_TTL: Duration = Duration::from_secs(5 * 60);

/// Months of history kept for the company chart.
pub const QUOTE_MONTHS: usize = 12;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const SIMULATED_BASE_PRICE: f64 = 150.0;

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct MonthlyQuote {
    /// Calendar month, 1-12.
    pub month: u32,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl MonthlyQuote {
    fn is_complete(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
    }
}

pub trait QuoteSource {
    fn fetch_monthly(&self, symbol: &str) -> Result<Vec<MonthlyQuote>, FetchError>;
}

/// One year of monthly bars from the public chart endpoint. Blocking; call it
/// from a blocking thread.
pub struct HttpQuoteSource {
    base_url: String,
    timeout: Duration,
}

impl HttpQuoteSource {
    pub fn new() -> Self {
        Self::with_base_url(CHART_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: FETCH_TIMEOUT,
        }
    }
}

impl Default for HttpQuoteSource {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteColumns>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteColumns {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
}

impl QuoteSource for HttpQuoteSource {
    fn fetch_monthly(&self, symbol: &str) -> Result<Vec<MonthlyQuote>, FetchError> {
        let url = format!("{}/{symbol}?interval=1mo&range=1y", self.base_url);
        let body: ChartResponse = get_json(&url, self.timeout)?;
        let result = body
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| FetchError::MissingData("chart.result".to_string()))?;
        Ok(chart_rows(result))
    }
}

fn chart_rows(result: ChartResult) -> Vec<MonthlyQuote> {
    let columns = result.indicators.quote.into_iter().next().unwrap_or_default();
    result
        .timestamp
        .iter()
        .enumerate()
        .filter_map(|(idx, ts)| {
            let month = DateTime::<Utc>::from_timestamp(*ts, 0)?.month();
            let volume = cell(&columns.volume, idx);
            Some(MonthlyQuote {
                month,
                open: cell(&columns.open, idx),
                high: cell(&columns.high, idx),
                low: cell(&columns.low, idx),
                close: cell(&columns.close, idx),
                volume: if volume.is_finite() && volume > 0.0 {
                    volume as u64
                } else {
                    0
                },
            })
        })
        .collect()
}

/// Missing or null cells read as 0 so the row is dropped as incomplete.
fn cell(column: &[Option<f64>], idx: usize) -> f64 {
    column.get(idx).copied().flatten().unwrap_or(0.0)
}

/// Monthly quotes per symbol with a short cache. `None` tells the caller to
/// fall back to [`simulated_history`].
pub struct Quotes<S> {
    source: S,
    ttl: Duration,
    cache: Mutex<HashMap<String, TtlCache<Vec<MonthlyQuote>>>>,
}

impl<S: QuoteSource> Quotes<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            ttl: QUOTE_TTL,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn history(&self, symbol: &str, now: Instant) -> Option<Vec<MonthlyQuote>> {
        let fresh = self
            .cache()
            .get(symbol)
            .filter(|c| c.is_fresh(now))
            .map(|c| c.value.clone());
        if fresh.is_some() {
            return fresh;
        }

        let fetched = self
            .source
            .fetch_monthly(symbol)
            .map(recent_complete)
            .and_then(|quotes| {
                if quotes.is_empty() {
                    Err(FetchError::MissingData(format!("quotes for {symbol}")))
                } else {
                    Ok(quotes)
                }
            });

        match fetched {
            Ok(quotes) => {
                self.cache().insert(
                    symbol.to_string(),
                    TtlCache::new(quotes.clone(), now, self.ttl),
                );
                Some(quotes)
            }
            Err(e) => {
                warn!("quote fetch for {symbol} failed: {e}");
                self.cache().get(symbol).map(|c| c.value.clone())
            }
        }
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, TtlCache<Vec<MonthlyQuote>>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Twelve months of made-up bars starting at 150: each close moves between
/// -6% and +9% and each open continues the previous close.
pub fn simulated_history<R: Rng + ?Sized>(rng: &mut R) -> Vec<MonthlyQuote> {
    let mut quotes: Vec<MonthlyQuote> = Vec::with_capacity(QUOTE_MONTHS);
    let mut price = SIMULATED_BASE_PRICE;

    for month in 1..=QUOTE_MONTHS as u32 {
        let change = (rng.gen_range(0.0..1.0) - 0.4) * 0.15;
        price *= 1.0 + change;
        let open = quotes.last().map_or(SIMULATED_BASE_PRICE, |q| q.close);
        quotes.push(MonthlyQuote {
            month,
            open,
            high: price * (1.0 + rng.gen_range(0.0..0.05)),
            low: price * (1.0 - rng.gen_range(0.0..0.05)),
            close: price,
            volume: rng.gen_range(2_000_000..7_000_000),
        });
    }

    quotes
}

/// Last twelve rows, dropping any with missing prices.
pub fn recent_complete(quotes: Vec<MonthlyQuote>) -> Vec<MonthlyQuote> {
    let start = quotes.len().saturating_sub(QUOTE_MONTHS);
    quotes
        .into_iter()
        .skip(start)
        .filter(MonthlyQuote::is_complete)
        .collect()
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteStats {
    pub latest_close: f64,
    pub change_pct: f64,
    pub total_volume: u64,
    pub average_close: f64,
}

impl QuoteStats {
    pub fn from_quotes(quotes: &[MonthlyQuote]) -> Option<Self> {
        let latest = quotes.last()?;
        let previous = if quotes.len() >= 2 {
            &quotes[quotes.len() - 2]
        } else {
            &quotes[0]
        };

        let change_pct = if previous.close > 0.0 {
            (latest.close - previous.close) / previous.close * 100.0
        } else {
            0.0
        };

        Some(Self {
            latest_close: latest.close,
            change_pct,
            total_volume: quotes.iter().map(|q| q.volume).sum(),
            average_close: quotes.iter().map(|q| q.close).sum::<f64>() / quotes.len() as f64,
        })
    }
}
