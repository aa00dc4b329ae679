//! Benchmark-only crate; see `benches/attention.rs`.
