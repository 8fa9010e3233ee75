//! UDP and TCP ingest endpoints. Both share the parse-then-enqueue path:
//! bytes in, `statsite_core::parse_batch`, `AggregatorHandle::add` per
//! sample.

pub mod tcp;
pub mod udp;
