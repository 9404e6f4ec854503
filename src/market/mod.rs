//! Exchange-rate and quote providers used around the calculator. Every value
//! here is resolved before it reaches `core`.

use std::time::Duration;

use serde::de::DeserializeOwned;

mod cache;
mod quotes;
mod rates;

pub use cache::TtlCache;
pub use quotes::{
    HttpQuoteSource, MonthlyQuote, QUOTE_MONTHS, QUOTE_TTL, QuoteSource, QuoteStats, Quotes,
    recent_complete, simulated_history,
};
pub use rates::{
    DEFAULT_EUR_USD, ExchangeRates, HttpRateSource, RATE_TTL, RateSource, eur_to_usd, usd_to_eur,
};

/// Upper bound on one provider request.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("request failed with status {0}")]
    Status(u16),
    #[error("response is missing {0}")]
    MissingData(String),
}

/// Blocking GET that decodes a JSON body. Call it from a blocking thread only.
fn get_json<T: DeserializeOwned>(url: &str, timeout: Duration) -> Result<T, FetchError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("savebot/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let resp = client.get(url).send()?;
    if !resp.status().is_success() {
        return Err(FetchError::Status(resp.status().as_u16()));
    }
    Ok(resp.json()?)
}
