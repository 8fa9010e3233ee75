use std::fmt;

/// One of the three metric kinds a sample can carry.
///
/// Closed by design: new kinds are added here at source time, not
/// discovered from a runtime registry (the short token that spells a kind
/// on the wire is mapped in [`crate::parser`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Counter,
    Timer,
    KeyValue,
}

impl Kind {
    /// The namespace segment this kind contributes to an output name,
    /// e.g. `counts` for [`Kind::Counter`].
    pub fn namespace(self) -> &'static str {
        match self {
            Kind::Counter => "counts",
            Kind::Timer => "timers",
            Kind::KeyValue => "kv",
        }
    }
}

/// A signed real number, tagged by how it was written on the wire.
///
/// A token with no decimal point parses to [`Value::Int`]; one with a `.`
/// parses to [`Value::Float`]. Kept distinct rather than collapsed to
/// `f64` so kinds that pass values straight through (KeyValue, and a
/// Timer's `.lower`/`.upper`) can preserve the caller's original type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
}

impl Value {
    pub fn as_f64(self) -> f64 {
        match self {
            Value::Int(i) => i as f64,
            Value::Float(f) => f,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
        }
    }
}

/// One parsed metric observation, bound to exactly one [`crate::buffer::Buffer`]
/// at parse completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub key: String,
    pub value: Value,
    pub kind: Kind,
    /// Kind-specific meaning: Counter's sample rate in `(0, 1]`, KeyValue's
    /// explicit epoch-seconds timestamp. Unused by Timer.
    pub flag: Option<Value>,
}

impl Sample {
    pub fn new(key: impl Into<String>, value: Value, kind: Kind, flag: Option<Value>) -> Self {
        Self {
            key: key.into(),
            value,
            kind,
            flag,
        }
    }
}
