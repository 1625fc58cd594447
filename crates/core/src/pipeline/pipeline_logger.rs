use std::collections::HashMap;
use std::time::Instant;

use crate::control::domain::rc_command::RcCommand;

/// Observer for the tracking loop.
///
/// Keeps reporting out of the use case so the CLI, tests and replays can
/// each decide what to do with per-tick data.
pub trait PipelineLogger: Send {
    /// Called once per tick with the command that was sent.
    fn tick(&mut self, tick: usize, faces: usize, command: &RcCommand);

    /// How long a named stage took for one tick.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// A point-in-time value (face count, yaw, ...).
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// End-of-run report. Default: no-op.
    fn summary(&self) {}
}

/// Discards everything.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn tick(&mut self, _tick: usize, _faces: usize, _command: &RcCommand) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running aggregate of one stage or metric; constant size however long
/// the flight lasts.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunningStats {
    pub count: usize,
    pub sum: f64,
    pub max: f64,
}

impl RunningStats {
    fn record(&mut self, value: f64) {
        self.max = if self.count == 0 {
            value
        } else {
            self.max.max(value)
        };
        self.count += 1;
        self.sum += value;
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Aggregates per-stage timings and metrics and logs a status line every
/// `throttle_ticks` ticks plus a summary at the end of the flight.
pub struct StdoutPipelineLogger {
    throttle_ticks: usize,
    timings: HashMap<String, RunningStats>,
    metrics: HashMap<String, RunningStats>,
    start_time: Instant,
    ticks: usize,
    ticks_without_face: usize,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_ticks: usize) -> Self {
        Self {
            throttle_ticks: throttle_ticks.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            ticks: 0,
            ticks_without_face: 0,
        }
    }

    /// Formatted report, or `None` before any tick was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.ticks == 0 && self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Tracking summary ({} ticks, {:.1}s, face lost on {} ticks):",
            self.ticks,
            elapsed_ms / 1000.0,
            self.ticks_without_face
        )];

        let mut stages: Vec<_> = self.timings.iter().collect();
        stages.sort_by(|a, b| a.0.cmp(b.0));
        for (stage, stats) in stages {
            lines.push(format!(
                "  {stage:8}: avg {:6.1}ms  max {:6.1}ms  total {:7.0}ms",
                stats.mean(),
                stats.max,
                stats.sum
            ));
        }

        let mut metrics: Vec<_> = self.metrics.iter().collect();
        metrics.sort_by(|a, b| a.0.cmp(b.0));
        for (name, stats) in metrics {
            lines.push(format!("  {name}: avg {:.1}", stats.mean()));
        }

        if self.ticks > 0 && elapsed_ms > 0.0 {
            let rate = self.ticks as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Control rate: {rate:.1} Hz"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<&RunningStats> {
        self.timings.get(stage)
    }

    pub fn metrics_for(&self, name: &str) -> Option<&RunningStats> {
        self.metrics.get(name)
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn tick(&mut self, tick: usize, faces: usize, command: &RcCommand) {
        self.ticks += 1;
        if faces == 0 {
            self.ticks_without_face += 1;
        }
        if tick % self.throttle_ticks == 0 {
            log::info!("tick {tick}: {faces} face(s), {command}");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .record(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().record(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
