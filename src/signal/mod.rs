//! Location signals and verdicts.
//!
//! A [`GeoSignal`] is one source's estimate. The resolver turns a set of signals into one
//! answer, and the pipeline wraps that answer into a [`GeoVerdict`] before publishing it.

mod types;

pub use types::{GeoSignal, GeoVerdict, InvalidSignal, SignalSource};
