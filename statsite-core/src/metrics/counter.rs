use super::Triple;
use crate::sample::{Sample, Value};

/// Running sum of `value * sample_rate` for one counter key.
///
/// Always accumulated as `f64`: a sample rate divides a count, so even an
/// all-integer, no-rate batch is summed the same way a rated one is — the
/// fold never special-cases the unrated path to keep an integer sum.
pub type Acc = f64;

pub fn append(sum: &mut Acc, sample: &Sample) {
    let rate = sample.flag.map(Value::as_f64).unwrap_or(1.0);
    *sum += sample.value.as_f64() * rate;
}

pub fn emit(key: &str, sum: Acc, now: i64) -> Vec<Triple> {
    vec![Triple::new(format!("counts.{key}"), Value::Float(sum), now)]
}
