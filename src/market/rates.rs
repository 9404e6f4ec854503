use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use log::warn;
use serde::Deserialize;

use super::cache::TtlCache;
use super::{FETCH_TIMEOUT, FetchError, get_json};

pub const DEFAULT_EUR_USD: f64 = 1.08;
pub const RATE_TTL: Duration = Duration::from_secs(60 * 60);

const RATES_URL: &str = "https://api.exchangerate-api.com/v4/latest/EUR";

pub trait RateSource {
    /// USD per one EUR.
    fn fetch_eur_usd(&self) -> Result<f64, FetchError>;
}

/// Blocking HTTP source; call it from a blocking thread, never from async code.
pub struct HttpRateSource {
    url: String,
    timeout: Duration,
}

impl HttpRateSource {
    pub fn new() -> Self {
        Self::with_url(RATES_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: FETCH_TIMEOUT,
        }
    }
}

impl Default for HttpRateSource {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct LatestRates {
    rates: RateTable,
}

#[derive(Debug, Deserialize)]
struct RateTable {
    #[serde(rename = "USD")]
    usd: Option<f64>,
}

impl RateSource for HttpRateSource {
    fn fetch_eur_usd(&self) -> Result<f64, FetchError> {
        let body: LatestRates = get_json(&self.url, self.timeout)?;
        match body.rates.usd {
            Some(rate) if rate.is_finite() && rate > 0.0 => Ok(rate),
            _ => Err(FetchError::MissingData("rates.USD".to_string())),
        }
    }
}

/// EUR/USD rate with an hourly cache, degrading to the stale cache and then
/// to a configured default when the source fails.
///
/// The cache lock is only held to read or store a rate, never across a fetch.
pub struct ExchangeRates<S> {
    source: S,
    default_rate: f64,
    ttl: Duration,
    cache: Mutex<Option<TtlCache<f64>>>,
}

impl<S: RateSource> ExchangeRates<S> {
    pub fn new(source: S, default_rate: f64) -> Self {
        Self {
            source,
            default_rate,
            ttl: RATE_TTL,
            cache: Mutex::new(None),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn current(&self, now: Instant) -> f64 {
        let fresh = self
            .cache()
            .as_ref()
            .filter(|c| c.is_fresh(now))
            .map(|c| c.value);
        if let Some(rate) = fresh {
            return rate;
        }

        match self.source.fetch_eur_usd() {
            Ok(rate) => {
                *self.cache() = Some(TtlCache::new(rate, now, self.ttl));
                rate
            }
            Err(e) => {
                warn!("exchange rate fetch failed, using fallback: {e}");
                self.cache()
                    .as_ref()
                    .map(|c| c.value)
                    .unwrap_or(self.default_rate)
            }
        }
    }

    fn cache(&self) -> MutexGuard<'_, Option<TtlCache<f64>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub fn eur_to_usd(eur: f64, rate: f64) -> f64 {
    if !(rate.is_finite() && rate > 0.0) {
        return 0.0;
    }
    amount_or_zero(eur) * rate
}

pub fn usd_to_eur(usd: f64, rate: f64) -> f64 {
    if !(rate.is_finite() && rate > 0.0) {
        return 0.0;
    }
    amount_or_zero(usd) / rate
}

fn amount_or_zero(amount: f64) -> f64 {
    if amount.is_finite() && amount > 0.0 {
        amount
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;

    struct ScriptedSource {
        replies: RefCell<VecDeque<Result<f64, FetchError>>>,
        calls: Cell<u32>,
    }

    impl ScriptedSource {
        fn new(replies: Vec<Result<f64, FetchError>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                calls: Cell::new(0),
            }
        }
    }

    impl RateSource for ScriptedSource {
        fn fetch_eur_usd(&self) -> Result<f64, FetchError> {
            self.calls.set(self.calls.get() + 1);
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err(FetchError::Status(503)))
        }
    }

    #[test]
    fn fresh_cache_skips_the_source() {
        let rates = ExchangeRates::new(ScriptedSource::new(vec![Ok(1.12)]), DEFAULT_EUR_USD);
        let start = Instant::now();

        assert_eq!(rates.current(start), 1.12);
        assert_eq!(rates.current(start + Duration::from_secs(30 * 60)), 1.12);
        assert_eq!(rates.source.calls.get(), 1);
    }

    #[test]
    fn expired_cache_refetches() {
        let rates = ExchangeRates::new(
            ScriptedSource::new(vec![Ok(1.12), Ok(1.15)]),
            DEFAULT_EUR_USD,
        );
        let start = Instant::now();

        assert_eq!(rates.current(start), 1.12);
        assert_eq!(rates.current(start + RATE_TTL), 1.15);
        assert_eq!(rates.source.calls.get(), 2);
    }

    #[test]
    fn failure_falls_back_to_stale_cache_then_default() {
        let start = Instant::now();

        let rates = ExchangeRates::new(
            ScriptedSource::new(vec![Ok(1.12), Err(FetchError::Status(500))]),
            DEFAULT_EUR_USD,
        )
        .with_ttl(Duration::from_secs(1));
        assert_eq!(rates.current(start), 1.12);
        assert_eq!(rates.current(start + Duration::from_secs(5)), 1.12);

        let cold = ExchangeRates::new(
            ScriptedSource::new(vec![Err(FetchError::MissingData("rates.USD".into()))]),
            DEFAULT_EUR_USD,
        );
        assert_eq!(cold.current(start), DEFAULT_EUR_USD);
        assert_eq!(cold.source.calls.get(), 1);
    }

    struct OverlapSource {
        inside: AtomicUsize,
        overlapped: AtomicBool,
    }

    impl RateSource for OverlapSource {
        fn fetch_eur_usd(&self) -> Result<f64, FetchError> {
            self.inside.fetch_add(1, Ordering::SeqCst);
            let deadline = Instant::now() + Duration::from_secs(2);
            while Instant::now() < deadline {
                if self.inside.load(Ordering::SeqCst) >= 2 {
                    self.overlapped.store(true, Ordering::SeqCst);
                    break;
                }
                thread::sleep(Duration::from_millis(5));
            }
            Ok(1.1)
        }
    }

    #[test]
    fn concurrent_callers_fetch_without_waiting_on_each_other() {
        let rates = ExchangeRates::new(
            OverlapSource {
                inside: AtomicUsize::new(0),
                overlapped: AtomicBool::new(false),
            },
            DEFAULT_EUR_USD,
        );
        let now = Instant::now();

        thread::scope(|scope| {
            let a = scope.spawn(|| rates.current(now));
            let b = scope.spawn(|| rates.current(now));
            assert_eq!(a.join().expect("thread a"), 1.1);
            assert_eq!(b.join().expect("thread b"), 1.1);
        });

        assert!(rates.source.overlapped.load(Ordering::SeqCst));
        assert_eq!(rates.current(now), 1.1);
    }

    #[test]
    fn conversions_guard_bad_rates_and_amounts() {
        assert!((eur_to_usd(100.0, 1.08) - 108.0).abs() < 1e-9);
        assert!((usd_to_eur(108.0, 1.08) - 100.0).abs() < 1e-9);
        assert_eq!(eur_to_usd(100.0, 0.0), 0.0);
        assert_eq!(usd_to_eur(100.0, f64::NAN), 0.0);
        assert_eq!(eur_to_usd(-5.0, 1.08), 0.0);
    }
}
