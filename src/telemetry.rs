//! Telemetry metric name constants.
//!
//! Consumers install their own `metrics` recorder (e.g. prometheus, statsd);
//! without a recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `huginn_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `status`: outcome: "ok", "error" or "cancelled"
//! - `source`: item source name (e.g. "firebase")

/// Total upstream item fetches.
///
/// Labels: `status` ("ok" | "error" | "cancelled").
pub const FETCHES_TOTAL: &str = "huginn_fetches_total";

/// Upstream item fetch duration in seconds.
pub const FETCH_DURATION_SECONDS: &str = "huginn_fetch_duration_seconds";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `source`.
pub const RETRIES_TOTAL: &str = "huginn_retries_total";

/// Item lookups answered from the cache.
pub const CACHE_HITS_TOTAL: &str = "huginn_cache_hits_total";

/// Item lookups that fell through to the upstream.
pub const CACHE_MISSES_TOTAL: &str = "huginn_cache_misses_total";

/// Failed cache writes after a successful fetch.
pub const CACHE_WRITE_ERRORS_TOTAL: &str = "huginn_cache_write_errors_total";
