use super::Triple;
use crate::sample::{Sample, Value};

/// All observed values for one timer key, folded once sorted.
pub type Acc = Vec<Value>;

pub fn append(acc: &mut Acc, sample: &Sample) {
    acc.push(sample.value);
}

fn stdev(values: &[f64], mean: f64) -> f64 {
    let n = values.len();
    if n <= 1 {
        return 0.0;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_sq / (n as f64 - 1.0)).sqrt()
}

/// Produces the base six triples plus the inner-percentile six, all at
/// `now`. `percentile` is the configured inner percentile `P` (1..99).
pub fn emit(key: &str, mut values: Acc, now: i64, percentile: u32) -> Vec<Triple> {
    values.sort_by(|a, b| a.as_f64().total_cmp(&b.as_f64()));
    let n = values.len();
    let numeric: Vec<f64> = values.iter().map(|v| v.as_f64()).collect();

    let sum: f64 = numeric.iter().sum();
    let mean = sum / n as f64;
    let lower = values[0];
    let upper = values[n - 1];
    let sample_stdev = stdev(&numeric, mean);

    let mut out = vec![
        Triple::new(format!("timers.{key}.sum"), Value::Float(sum), now),
        Triple::new(format!("timers.{key}.mean"), Value::Float(mean), now),
        Triple::new(format!("timers.{key}.lower"), lower, now),
        Triple::new(format!("timers.{key}.upper"), upper, now),
        Triple::new(format!("timers.{key}.count"), Value::Int(n as i64), now),
        Triple::new(format!("timers.{key}.stdev"), Value::Float(sample_stdev), now),
    ];

    // A single-sample window has no meaningful inner slice: every percentile
    // suffix equals its base counterpart.
    if n == 1 {
        out.push(Triple::new(
            format!("timers.{key}.sum_{percentile}"),
            Value::Float(sum),
            now,
        ));
        out.push(Triple::new(
            format!("timers.{key}.mean_{percentile}"),
            Value::Float(mean),
            now,
        ));
        out.push(Triple::new(format!("timers.{key}.lower_{percentile}"), lower, now));
        out.push(Triple::new(format!("timers.{key}.upper_{percentile}"), upper, now));
        out.push(Triple::new(
            format!("timers.{key}.count_{percentile}"),
            Value::Int(1),
            now,
        ));
        out.push(Triple::new(
            format!("timers.{key}.stdev_{percentile}"),
            Value::Float(0.0),
            now,
        ));
        return out;
    }

    let inner = ((n as f64) * (percentile as f64 / 100.0)).floor() as usize;
    let lower_idx = (n - inner) / 2;
    let upper_idx = lower_idx + inner;
    let slice = &values[lower_idx..upper_idx];
    let slice_numeric: Vec<f64> = slice.iter().map(|v| v.as_f64()).collect();

    let sum_p: f64 = slice_numeric.iter().sum();
    let mean_p = if inner > 0 { sum_p / inner as f64 } else { sum_p };
    let lower_p = values[lower_idx];
    let upper_p = values[upper_idx];
    let stdev_p = stdev(&slice_numeric, mean_p);

    out.push(Triple::new(
        format!("timers.{key}.sum_{percentile}"),
        Value::Float(sum_p),
        now,
    ));
    out.push(Triple::new(
        format!("timers.{key}.mean_{percentile}"),
        Value::Float(mean_p),
        now,
    ));
    out.push(Triple::new(format!("timers.{key}.lower_{percentile}"), lower_p, now));
    out.push(Triple::new(format!("timers.{key}.upper_{percentile}"), upper_p, now));
    out.push(Triple::new(
        format!("timers.{key}.count_{percentile}"),
        Value::Int(inner as i64),
        now,
    ));
    out.push(Triple::new(
        format!("timers.{key}.stdev_{percentile}"),
        Value::Float(stdev_p),
        now,
    ));

    out
}
