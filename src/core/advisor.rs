use serde::Serialize;

use super::metrics::return_percentage;
use super::types::{CompanyInfo, ContributionStrategy, InvestmentResult, RiskProfile};

const LARGE_LUMP_SUM: f64 = 50_000.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Success,
    Info,
    Warning,
    Suggestion,
    Tip,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BotMessage {
    pub kind: MessageKind,
    pub text: String,
}

impl BotMessage {
    fn new(kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Commentary shown next to an investment projection.
pub fn recommend(
    result: &InvestmentResult,
    company: &CompanyInfo,
    risk_profile: RiskProfile,
    strategy: ContributionStrategy,
    amount: f64,
    years: u32,
) -> Vec<BotMessage> {
    let name = company.name;
    let mut messages = vec![BotMessage::new(
        MessageKind::Info,
        format!("Investing in {name} shares: {}", company.description),
    )];

    messages.push(match return_percentage(result) {
        Some(pct) if pct > 50.0 => BotMessage::new(
            MessageKind::Success,
            format!("Excellent! Your {name} investment returned {pct:.2}%."),
        ),
        Some(pct) if pct > 20.0 => BotMessage::new(
            MessageKind::Info,
            format!("Good result: {pct:.2}% over {years} years with {name} shares."),
        ),
        Some(pct) => BotMessage::new(
            MessageKind::Warning,
            format!("Modest return of {pct:.2}%. Consider a longer horizon for {name}."),
        ),
        None => BotMessage::new(
            MessageKind::Warning,
            "Return is not available: nothing was invested.",
        ),
    });

    if strategy == ContributionStrategy::LumpSum && amount > LARGE_LUMP_SUM {
        messages.push(BotMessage::new(
            MessageKind::Info,
            format!(
                "For large amounts in {name}, dollar-cost averaging reduces market timing risk."
            ),
        ));
    }

    if risk_profile == RiskProfile::Conservative && years > 10 {
        messages.push(BotMessage::new(
            MessageKind::Suggestion,
            format!("With a long horizon you could consider a moderate profile for {name}."),
        ));
    }

    if risk_profile == RiskProfile::Aggressive && years < 3 {
        messages.push(BotMessage::new(
            MessageKind::Warning,
            format!(
                "Aggressive positions in {name} shares need 5-10 years to ride out volatility."
            ),
        ));
    }

    if company.is_growth() {
        messages.push(BotMessage::new(
            MessageKind::Tip,
            format!(
                "{name} is a growth company: its shares can be volatile but offer long-term upside."
            ),
        ));
    }

    messages.push(BotMessage::new(
        MessageKind::Tip,
        risk_profile.params().description,
    ));
    messages.push(BotMessage::new(
        MessageKind::Tip,
        "Diversify, and only invest what you can afford to lose.",
    ));

    messages
}
