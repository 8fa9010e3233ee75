//! Groups a frozen buffer by `(kind, key)` and applies each kind's fold
//! rules, producing the flat triple list a [`crate::sink::GraphiteSink`]
//! forwards downstream.

use std::collections::HashMap;

use crate::buffer::Buffer;
use crate::metrics::{counter, keyvalue, timer, Triple};
use crate::sample::{Kind, Sample};

enum Acc {
    Counter(counter::Acc),
    Timer(timer::Acc),
    KeyValue(keyvalue::Acc),
}

/// Folds a frozen `buffer` into output triples. `now` is captured once and
/// shared by every triple the fold produces; `percentile` is the configured
/// Timer inner percentile.
pub fn fold(buffer: Buffer, now: i64, percentile: u32) -> Vec<Triple> {
    let mut groups: HashMap<(Kind, String), Acc> = HashMap::new();

    for sample in buffer.into_samples() {
        let group_key = (sample.kind, sample.key.clone());
        let acc = groups.entry(group_key).or_insert_with(|| match sample.kind {
            Kind::Counter => Acc::Counter(0.0),
            Kind::Timer => Acc::Timer(Vec::new()),
            Kind::KeyValue => Acc::KeyValue(Vec::new()),
        });
        match acc {
            Acc::Counter(sum) => counter::append(sum, &sample),
            Acc::Timer(values) => timer::append(values, &sample),
            Acc::KeyValue(pairs) => keyvalue::append(pairs, &sample, now),
        }
    }

    let mut triples = Vec::new();
    for ((_, key), acc) in groups {
        let mut group_triples = match acc {
            Acc::Counter(sum) => counter::emit(&key, sum, now),
            Acc::Timer(values) => timer::emit(&key, values, now, percentile),
            Acc::KeyValue(pairs) => keyvalue::emit(&key, pairs),
        };
        triples.append(&mut group_triples);
    }
    triples
}
