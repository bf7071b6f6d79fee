//! Telemetry system for bindgate
//!
//! Collects pipeline events in process and keeps running counters for the
//! end-of-run summary.

use crate::pipeline::{GateKind, RunState};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    NodeSubmitted {
        node: String,
        timestamp: Instant,
    },
    GateDecision {
        node: String,
        gate: GateKind,
        accepted: bool,
        timestamp: Instant,
    },
    DeployCompleted {
        node: String,
        duration_ms: u64,
        success: bool,
        timestamp: Instant,
    },
    RunFinished {
        root: String,
        state: RunState,
        timestamp: Instant,
    },
}

/// Telemetry statistics
#[derive(Debug, Clone, Default)]
pub struct TelemetryStats {
    pub nodes_submitted: usize,
    pub gate_accepts: usize,
    pub gate_rejects: usize,
    pub deployments_succeeded: usize,
    pub deployments_failed: usize,
    pub deploy_time_ms: u64,
    pub runs_verified: usize,
    pub runs_failed: usize,
}

/// Telemetry collector
#[derive(Debug, Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
    stats: Arc<Mutex<TelemetryStats>>,
    start_time: Instant,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TelemetryCollector {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(Mutex::new(TelemetryStats::default())),
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: TelemetryEvent) {
        {
            let mut stats = lock(&self.stats);
            match &event {
                TelemetryEvent::NodeSubmitted { .. } => {
                    stats.nodes_submitted += 1;
                }
                TelemetryEvent::GateDecision { accepted, .. } => {
                    if *accepted {
                        stats.gate_accepts += 1;
                    } else {
                        stats.gate_rejects += 1;
                    }
                }
                TelemetryEvent::DeployCompleted { success, duration_ms, .. } => {
                    stats.deploy_time_ms += *duration_ms;
                    if *success {
                        stats.deployments_succeeded += 1;
                    } else {
                        stats.deployments_failed += 1;
                    }
                }
                TelemetryEvent::RunFinished { state, .. } => match state {
                    RunState::Verified => stats.runs_verified += 1,
                    RunState::Failed => stats.runs_failed += 1,
                    _ => {}
                },
            }
        }

        lock(&self.events).push(event);
    }

    /// Shorthand for a gate decision event
    pub fn gate_decision(&self, node: &str, gate: GateKind, accepted: bool) {
        self.record(TelemetryEvent::GateDecision {
            node: node.to_string(),
            gate,
            accepted,
            timestamp: Instant::now(),
        });
    }

    /// Get current statistics
    pub fn get_stats(&self) -> TelemetryStats {
        lock(&self.stats).clone()
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    /// Get event count
    pub fn event_count(&self) -> usize {
        lock(&self.events).len()
    }

    /// Get recent events (last n)
    pub fn recent_events(&self, n: usize) -> Vec<TelemetryEvent> {
        let events = lock(&self.events);
        let start = events.len().saturating_sub(n);
        events[start..].to_vec()
    }

    /// Fraction of deployments that passed (1.0 when none ran)
    pub fn deploy_success_rate(&self) -> f64 {
        let stats = lock(&self.stats);
        let total = stats.deployments_succeeded + stats.deployments_failed;
        if total == 0 {
            1.0
        } else {
            stats.deployments_succeeded as f64 / total as f64
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Simple telemetry display
pub struct TelemetryDisplay {
    collector: TelemetryCollector,
    verbosity: crate::cli::Verbosity,
}

impl TelemetryDisplay {
    /// Create a new display
    pub fn new(collector: TelemetryCollector, verbosity: crate::cli::Verbosity) -> Self {
        Self {
            collector,
            verbosity,
        }
    }

    /// Display summary statistics
    pub fn display_summary(&self) {
        if !self.verbosity.show_summary() {
            return;
        }
        let stats = self.collector.get_stats();
        let elapsed = self.collector.elapsed();

        println!("\nRun Summary");
        println!("─────────────────────────────────────");
        println!("Duration:          {:?}", elapsed);
        println!("Nodes submitted:   {}", stats.nodes_submitted);
        println!("Gate accepts:      {}", stats.gate_accepts);
        println!("Gate rejects:      {}", stats.gate_rejects);
        println!("Deployments:       {}", stats.deployments_succeeded + stats.deployments_failed);
        println!("Deploy success:    {:.1}%", self.collector.deploy_success_rate() * 100.0);
        println!("Deploy time:       {}ms", stats.deploy_time_ms);
        println!();
    }
}
