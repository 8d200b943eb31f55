use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting logger for pipeline events.
///
/// Decouples the sampling loop from specific output mechanisms (stdout, GUI
/// signals, log crate) so each caller can observe pipeline behavior without
/// changing the orchestration code.
pub trait PipelineLogger: Send {
    /// Report that another analysis cycle completed. A live pipeline has no
    /// fixed total, so this carries the running count only.
    fn cycle(&mut self, completed: u64);

    /// Record how long a named pipeline stage took for one cycle.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. ticks dropped during a cycle).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events. Used where the caller has its own
/// progress channel, and by tests where logger output is irrelevant.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn cycle(&mut self, _completed: u64) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI-oriented logger that tracks per-stage timing and metrics and prints a
/// summary at the end of the run.
///
/// Cycle progress is throttled to every `throttle_cycles` completions to
/// avoid flooding the log at sampling rate.
pub struct StdoutPipelineLogger {
    throttle_cycles: u64,
    timings: HashMap<String, Vec<f64>>,
    metrics: HashMap<String, Vec<f64>>,
    start_time: Instant,
    cycles: u64,
    messages: Vec<String>,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_cycles: u64) -> Self {
        Self {
            throttle_cycles: throttle_cycles.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            cycles: 0,
            messages: Vec::new(),
        }
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let cycles = self.cycles;
        let mut lines = Vec::new();

        lines.push(format!(
            "Pipeline summary ({cycles} cycles, {:.1}s total):",
            elapsed_ms / 1000.0
        ));

        let mut stages: Vec<_> = self.timings.keys().collect();
        stages.sort();
        for stage in stages {
            let durations = &self.timings[stage];
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = if durations.is_empty() {
                0.0
            } else {
                total_ms / durations.len() as f64
            };
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:12}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms  ({pct:4.1}%)"
            ));
        }

        let mut metric_names: Vec<_> = self.metrics.keys().collect();
        metric_names.sort();
        for name in metric_names {
            let values = &self.metrics[name];
            let avg = if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            };
            lines.push(format!("  {name}: avg {avg:.1}"));
        }

        if cycles > 0 && elapsed_ms > 0.0 {
            let rate = cycles as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Effective rate: {rate:.1} cycles/s"));
        }

        Some(lines.join("\n"))
    }

    /// Returns the timing data for a given stage.
    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }

    /// Returns the metric data for a given name.
    pub fn metrics_for(&self, name: &str) -> Option<&[f64]> {
        self.metrics.get(name).map(|v| v.as_slice())
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(15)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn cycle(&mut self, completed: u64) {
        self.cycles = completed;
        if completed % self.throttle_cycles == 0 {
            log::info!("Processed {completed} cycles");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics
            .entry(name.to_string())
            .or_default()
            .push(value);
    }

    fn info(&mut self, message: &str) {
        self.messages.push(message.to_string());
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- NullPipelineLogger tests ---

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullPipelineLogger;
        logger.cycle(1);
        logger.timing("analyze", 5.0);
        logger.metric("dropped_ticks", 3.0);
        logger.info("hello");
        logger.summary();
        // No panics = success
    }

    // --- StdoutPipelineLogger tests ---

    #[test]
    fn test_timing_records_values() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.timing("analyze", 20.0);
        logger.timing("analyze", 30.0);
        logger.timing("present", 5.0);

        let analyze = logger.timings_for("analyze").unwrap();
        assert_eq!(analyze.len(), 2);
        assert!((analyze[0] - 20.0).abs() < f64::EPSILON);
        assert!((analyze[1] - 30.0).abs() < f64::EPSILON);

        let present = logger.timings_for("present").unwrap();
        assert_eq!(present.len(), 1);
        assert!((present[0] - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_metric_records_values() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.metric("dropped_ticks", 3.0);
        logger.metric("dropped_ticks", 4.0);

        let values = logger.metrics_for("dropped_ticks").unwrap();
        assert_eq!(values.len(), 2);
        let avg = values.iter().sum::<f64>() / values.len() as f64;
        assert!((avg - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_summary_includes_stages_and_metrics() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.cycle(10);
        logger.timing("acquire", 2.0);
        logger.timing("analyze", 30.0);
        logger.metric("dropped_ticks", 2.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Pipeline summary"));
        assert!(summary.contains("acquire"));
        assert!(summary.contains("analyze"));
        assert!(summary.contains("dropped_ticks"));
        assert!(summary.contains("avg 2.0"));
    }

    #[test]
    fn test_summary_includes_rate() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.cycle(100);
        logger.timing("analyze", 10.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("cycles/s"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        let logger = StdoutPipelineLogger::new(10);
        assert!(logger.summary_string().is_none());
    }

    #[test]
    fn test_cycle_tracks_count() {
        let mut logger = StdoutPipelineLogger::new(10);
        for i in 1..=20 {
            logger.cycle(i);
        }
        assert_eq!(logger.cycles, 20);
    }

    #[test]
    fn test_info_stores_messages() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.info("starting stream");
        assert_eq!(logger.messages.len(), 1);
        assert_eq!(logger.messages[0], "starting stream");
    }

    #[test]
    fn test_default_throttle() {
        let logger = StdoutPipelineLogger::default();
        assert_eq!(logger.throttle_cycles, 15);
    }

    #[test]
    fn test_zero_throttle_clamped_to_one() {
        let logger = StdoutPipelineLogger::new(0);
        assert_eq!(logger.throttle_cycles, 1);
    }
}
