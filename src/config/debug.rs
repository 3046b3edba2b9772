//! Debugging feature flags.

#[allow(dead_code)]
pub struct LogFlags {
    /// Emit verbose logging for live kline connections and every tick.
    pub log_stream: bool,

    /// Page requests, merge counts and pagination state transitions.
    pub log_pagination: bool,

    /// Exact vs nearest-neighbour matches while grouping insights.
    pub log_bucketizer: bool,

    /// Per-trigger projection summaries. Noisy: fires on every crosshair move.
    pub log_overlay: bool,

    /// Market switches and generation bumps.
    pub log_engine_core: bool,

    pub log_demo: bool,
}

pub const DF: LogFlags = LogFlags {
    log_engine_core: true,
    log_pagination: true,

    log_stream: false,
    log_bucketizer: false,
    log_overlay: false,
    log_demo: false,
};
