//! Batch fan-out over a bounded pool of concurrent probes.
//!
//! Probes are fully independent (distinct codes write distinct
//! directories), so execution order is unconstrained; only the *reported*
//! order matters, and `buffered` hands results back in input order while
//! keeping up to `workers` probes in flight.

use futures::stream::{self, StreamExt};

use crate::probe::{ProbeReport, Prober};

/// Default number of probes in flight.
pub const DEFAULT_WORKERS: usize = 8;

/// Probe every candidate and return exactly one report per input code, in
/// input order. A failing probe never cancels its siblings; the batch
/// always runs to completion.
pub async fn run_batch(prober: &Prober, codes: &[String], workers: usize) -> Vec<ProbeReport> {
    stream::iter(codes)
        .map(|code| prober.probe(code))
        .buffered(workers.max(1))
        .collect()
        .await
}
