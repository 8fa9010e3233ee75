mod graphite;

pub use graphite::GraphiteSink;
