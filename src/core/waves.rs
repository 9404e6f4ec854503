use serde::Serialize;

use super::types::PeriodResult;

const IMPULSE_SHARE: f64 = 0.625;
const IMPULSE_LABELS: [&str; 5] = ["1", "2", "3", "4", "5"];
const CORRECTIVE_LABELS: [&str; 3] = ["A", "B", "C"];

/// A projection year tagged with its position in a five-up, three-down wave cycle.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WavePoint {
    pub year: u32,
    pub value: f64,
    pub invested: f64,
    pub change_pct: f64,
    pub wave: &'static str,
}

pub fn label_waves(series: &[PeriodResult]) -> Vec<WavePoint> {
    let n = series.len() as f64;
    let impulse_span = n * IMPULSE_SHARE;
    let corrective_span = n - impulse_span;

    series
        .iter()
        .enumerate()
        .map(|(idx, period)| {
            let change_pct = match idx.checked_sub(1).map(|prev| series[prev].value) {
                Some(prev) if prev != 0.0 => (period.value - prev) / prev * 100.0,
                _ => 0.0,
            };

            let i = idx as f64;
            let wave = if i < impulse_span {
                pick(&IMPULSE_LABELS, i / impulse_span)
            } else {
                pick(&CORRECTIVE_LABELS, (i - impulse_span) / corrective_span)
            };

            WavePoint {
                year: period.year,
                value: period.value,
                invested: period.invested,
                change_pct,
                wave,
            }
        })
        .collect()
}

fn pick(labels: &[&'static str], fraction: f64) -> &'static str {
    let last = labels.len() - 1;
    let phase = (fraction * labels.len() as f64).floor() as usize;
    labels[phase.min(last)]
}
