//! Load Report - Per-Task Request Counters

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::usecases::load_plan::LoadTask;

#[derive(Debug, Default)]
struct TaskCounters {
  sent: AtomicU64,
  failed: AtomicU64,
}

/// Sent/failed request counts per task, shared by all virtual users.
#[derive(Debug, Default)]
pub struct LoadReport {
  counters: [TaskCounters; LoadTask::ALL.len()],
}

/// Totals for one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
  pub task: String,
  pub sent: u64,
  pub failed: u64,
}

fn slot(task: LoadTask) -> usize {
  match task {
    LoadTask::HealthCheck => 0,
    LoadTask::UserLifecycle => 1,
    LoadTask::FlightReads => 2,
    LoadTask::IdempotencyCollision => 3,
  }
}

impl LoadReport {
  pub fn new() -> Self {
    Self::default()
  }

  /// Count one request of `task`.
  pub fn record(&self, task: LoadTask, ok: bool) {
    let counters = &self.counters[slot(task)];
    counters.sent.fetch_add(1, Ordering::Relaxed);
    if !ok {
      counters.failed.fetch_add(1, Ordering::Relaxed);
    }
  }

  pub fn sent(&self, task: LoadTask) -> u64 {
    self.counters[slot(task)].sent.load(Ordering::Relaxed)
  }

  pub fn failed(&self, task: LoadTask) -> u64 {
    self.counters[slot(task)].failed.load(Ordering::Relaxed)
  }

  pub fn total_sent(&self) -> u64 {
    LoadTask::ALL.iter().map(|t| self.sent(*t)).sum()
  }

  pub fn total_failed(&self) -> u64 {
    LoadTask::ALL.iter().map(|t| self.failed(*t)).sum()
  }

  /// Per-task totals in reporting order.
  pub fn summary(&self) -> Vec<TaskSummary> {
    LoadTask::ALL
      .iter()
      .map(|t| TaskSummary {
        task: t.to_string(),
        sent: self.sent(*t),
        failed: self.failed(*t),
      })
      .collect()
  }
}

impl fmt::Display for LoadReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for row in self.summary() {
      writeln!(f, "{:<24} sent={:<8} failed={}", row.task, row.sent, row.failed)?;
    }
    write!(f, "{:<24} sent={:<8} failed={}", "total", self.total_sent(), self.total_failed())
  }
}
