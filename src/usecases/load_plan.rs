//! Load Plan - Weighted Task Mix for Synthetic Load
//!
//! Decides which scenario a virtual user runs next. Weights follow the
//! production traffic shape: reads dominate, user management is frequent,
//! health checks and deliberate idempotency collisions are rare.
//! Selection is smooth weighted round-robin, so every window of
//! `total_weight` picks contains each task exactly `weight` times.

use std::fmt;

/// One scenario a virtual user can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadTask {
  /// `GET /ping` on every service.
  HealthCheck,
  /// Create a user, read it back, link a Telegram chat.
  UserLifecycle,
  /// Read one airport's flights, unfiltered and arrivals only.
  FlightReads,
  /// Create the same user under a fixed idempotency key.
  IdempotencyCollision,
}

impl LoadTask {
  /// Every task, in reporting order.
  pub const ALL: [LoadTask; 4] = [
    LoadTask::HealthCheck,
    LoadTask::UserLifecycle,
    LoadTask::FlightReads,
    LoadTask::IdempotencyCollision,
  ];

  /// Relative frequency of the task.
  pub fn weight(self) -> u32 {
    match self {
      Self::HealthCheck => 1,
      Self::UserLifecycle => 5,
      Self::FlightReads => 10,
      Self::IdempotencyCollision => 2,
    }
  }
}

impl fmt::Display for LoadTask {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::HealthCheck => write!(f, "health_check"),
      Self::UserLifecycle => write!(f, "user_lifecycle"),
      Self::FlightReads => write!(f, "flight_reads"),
      Self::IdempotencyCollision => write!(f, "idempotency_collision"),
    }
  }
}

/// Per-user task scheduler.
#[derive(Debug, Clone)]
pub struct LoadPlan {
  /// (task, current score) pairs.
  scores: Vec<(LoadTask, i64)>,
  /// Sum of all weights.
  total_weight: u32,
}

impl Default for LoadPlan {
  fn default() -> Self {
    Self::new()
  }
}

impl LoadPlan {
  /// Plan over every task with its default weight.
  pub fn new() -> Self {
    Self::with_tasks(&LoadTask::ALL)
  }

  /// Plan over a subset of tasks.
  pub fn with_tasks(tasks: &[LoadTask]) -> Self {
    Self {
      scores: tasks.iter().map(|t| (*t, 0)).collect(),
      total_weight: tasks.iter().map(|t| t.weight()).sum(),
    }
  }

  /// Sum of the weights in this plan.
  pub fn total_weight(&self) -> u32 {
    self.total_weight
  }

  /// Next task to run; `None` only for an empty plan.
  pub fn next_task(&mut self) -> Option<LoadTask> {
    for (task, score) in self.scores.iter_mut() {
      *score += i64::from(task.weight());
    }
    let (idx, _) = self
      .scores
      .iter()
      .enumerate()
      .max_by(|(ia, (_, a)), (ib, (_, b))| a.cmp(b).then(ib.cmp(ia)))?;
    let entry = &mut self.scores[idx];
    entry.1 -= i64::from(self.total_weight);
    Some(entry.0)
  }
}

/// Round-robin picker over a fixed list (airports, ping targets).
#[derive(Debug, Clone)]
pub struct RoundRobin<T> {
  items: Vec<T>,
  cursor: usize,
}

impl<T: Clone> RoundRobin<T> {
  /// Start at `offset` so concurrent users spread across the list.
  pub fn new(items: Vec<T>, offset: usize) -> Self {
    let cursor = if items.is_empty() { 0 } else { offset % items.len() };
    Self { items, cursor }
  }

  /// Next item; `None` for an empty list.
  pub fn next_item(&mut self) -> Option<T> {
    let item = self.items.get(self.cursor)?.clone();
    self.cursor = (self.cursor + 1) % self.items.len();
    Some(item)
  }
}
