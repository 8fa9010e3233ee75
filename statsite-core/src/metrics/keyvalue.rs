use super::Triple;
use crate::sample::{Sample, Value};

/// KeyValue is never aggregated: every sample that lands in a window flushes
/// as its own triple, in the order it was appended.
pub type Acc = Vec<(Value, i64)>;

pub fn append(acc: &mut Acc, sample: &Sample, now: i64) {
    let effective_timestamp = sample.flag.map(|f| f.as_f64() as i64).unwrap_or(now);
    acc.push((sample.value, effective_timestamp));
}

pub fn emit(key: &str, acc: Acc) -> Vec<Triple> {
    acc.into_iter()
        .map(|(value, ts)| Triple::new(format!("kv.{key}"), value, ts))
        .collect()
}
