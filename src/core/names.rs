use super::metrics::saving_for_period;
use super::types::{CanonicalSlot, Contributor, ContributorList, SaverCard, SavingsAggregate};

/// Number of individual saver boxes on the group view.
pub const SAVER_SLOTS: usize = 4;

/// Historical names and one-letter codes, matched case-insensitively on the whole label.
const ALIASES: [(&str, CanonicalSlot); 9] = [
    ("l", CanonicalSlot::L),
    ("leo", CanonicalSlot::L),
    ("simone", CanonicalSlot::L),
    ("michela", CanonicalSlot::L),
    ("x", CanonicalSlot::X),
    ("pietro", CanonicalSlot::X),
    ("y", CanonicalSlot::Y),
    ("d", CanonicalSlot::D),
    ("davide", CanonicalSlot::D),
];

pub fn canonical_slot(label: &str) -> CanonicalSlot {
    let lowered = label.trim().to_lowercase();
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, slot)| *slot)
        .unwrap_or(CanonicalSlot::Other)
}

/// Splits a comma-separated name string into display order: L, X, Y, D (first
/// match of each), then every other name in input order.
pub fn parse_names(raw: &str) -> ContributorList {
    let entries: Vec<Contributor> = raw
        .split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(|label| Contributor {
            raw_label: label.to_string(),
            canonical_slot: canonical_slot(label),
        })
        .collect();

    let mut ordered = Vec::with_capacity(entries.len());
    for slot in CanonicalSlot::ORDER {
        if let Some(found) = entries.iter().find(|c| c.canonical_slot == slot) {
            ordered.push(found.clone());
        }
    }
    ordered.extend(
        entries
            .into_iter()
            .filter(|c| c.canonical_slot == CanonicalSlot::Other),
    );

    ContributorList(ordered)
}

pub fn aggregate(people_count: u32, per_person_amount: f64) -> SavingsAggregate {
    let per_person_monthly = non_negative(per_person_amount);
    SavingsAggregate {
        people_count,
        per_person_monthly,
        monthly_total: f64::from(people_count) * per_person_monthly,
    }
}

impl SavingsAggregate {
    pub fn total_over(&self, years: u32) -> f64 {
        saving_for_period(self.monthly_total, years)
    }

    pub fn per_person_total(&self, years: u32) -> f64 {
        saving_for_period(self.per_person_monthly, years)
    }
}

/// Entered names win over a manually typed head count.
pub fn resolve_people_count(names: &ContributorList, manual_count: u32) -> u32 {
    if names.is_empty() {
        manual_count
    } else {
        u32::try_from(names.len()).unwrap_or(u32::MAX)
    }
}

/// Leading-digit integer parse; anything unparsable or negative is 0.
pub fn coerce_count(raw: &str) -> u32 {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix('+')
        .unwrap_or(trimmed)
        .chars()
        .take_while(char::is_ascii_digit)
        .collect::<String>();
    digits.parse::<u32>().unwrap_or(0)
}

pub fn coerce_amount(raw: &str) -> f64 {
    raw.trim().parse::<f64>().map(non_negative).unwrap_or(0.0)
}

/// Four saver boxes filled in display order; empty when nobody contributes.
pub fn individual_savers(
    per_person_amount: f64,
    names: &ContributorList,
    years: u32,
) -> Vec<SaverCard> {
    let monthly = non_negative(per_person_amount);
    if monthly == 0.0 {
        return Vec::new();
    }

    let labels = names.labels();
    (0..SAVER_SLOTS)
        .map(|idx| SaverCard {
            name: labels.get(idx).map(|s| s.to_string()).unwrap_or_default(),
            monthly,
            one_year: saving_for_period(monthly, 1),
            three_years: saving_for_period(monthly, 3),
            total: saving_for_period(monthly, years),
        })
        .collect()
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
