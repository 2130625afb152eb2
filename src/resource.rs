//! Resource limits: the depth ceiling and optional step/time budgets.
//!
//! Grounds on `ouros::resource::{ResourceTracker, ResourceLimits,
//! DEFAULT_MAX_RECURSION_DEPTH}`. The core is single-threaded and
//! cooperative (spec §5); nothing here models cancellation or suspension,
//! only a cheap per-frame counter check.

use std::{
    fmt,
    time::{Duration, Instant},
};

/// Default stack-depth ceiling, per spec §5 ("default ≈ 500").
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 500;

#[derive(Debug, Clone)]
pub enum ResourceError {
    Recursion { limit: usize, depth: usize },
    Steps { limit: u64, count: u64 },
    Time { limit: Duration, elapsed: Duration },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recursion { limit, depth } => write!(f, "recursion depth {depth} exceeded limit {limit}"),
            Self::Steps { limit, count } => write!(f, "step count {count} exceeded limit {limit}"),
            Self::Time { limit, elapsed } => write!(f, "elapsed {elapsed:?} exceeded limit {limit:?}"),
        }
    }
}

impl std::error::Error for ResourceError {}

/// Caller-tunable limits for one top-level call.
#[derive(Debug, Clone)]
pub struct ResourceLimits {
    pub max_depth: usize,
    pub max_steps: Option<u64>,
    pub max_wall_time: Option<Duration>,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_RECURSION_DEPTH,
            max_steps: None,
            max_wall_time: None,
        }
    }
}

impl ResourceLimits {
    /// No limits at all; used by embeddings that trust their own programs
    /// (ground: `ouros::resource::NoLimitTracker`).
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            max_depth: usize::MAX,
            max_steps: None,
            max_wall_time: None,
        }
    }
}

/// Mutable, per-call tracker. Created fresh for each `Runner::call`; never
/// shared across backtracking branches, since depth/step counts are walked
/// forward through recursion and unwound automatically by the Rust call
/// stack itself (no explicit "restore" needed on backtrack).
#[derive(Debug)]
pub struct ResourceTracker {
    limits: ResourceLimits,
    depth: usize,
    steps: u64,
    started: Option<Instant>,
}

impl ResourceTracker {
    #[must_use]
    pub fn new(limits: ResourceLimits) -> Self {
        let started = limits.max_wall_time.map(|_| Instant::now());
        Self {
            limits,
            depth: 0,
            steps: 0,
            started,
        }
    }

    /// Call on method-frame entry; returns an error if the ceiling is hit.
    /// The caller decrements on the way back out by letting the Rust guard
    /// (`DepthGuard`) drop.
    pub fn enter_frame(&mut self) -> Result<DepthGuard<'_>, ResourceError> {
        if self.depth >= self.limits.max_depth {
            return Err(ResourceError::Recursion {
                limit: self.limits.max_depth,
                depth: self.depth,
            });
        }
        self.depth += 1;
        Ok(DepthGuard { tracker: self })
    }

    pub fn tick_step(&mut self) -> Result<(), ResourceError> {
        self.steps += 1;
        if let Some(limit) = self.limits.max_steps {
            if self.steps > limit {
                return Err(ResourceError::Steps {
                    limit,
                    count: self.steps,
                });
            }
        }
        if let (Some(limit), Some(started)) = (self.limits.max_wall_time, self.started) {
            let elapsed = started.elapsed();
            if elapsed > limit {
                return Err(ResourceError::Time { limit, elapsed });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// RAII guard that decrements the tracked depth when a frame returns
/// (whichever way: success or failure) so depth is exact, not approximate,
/// across backtracking.
pub struct DepthGuard<'a> {
    tracker: &'a mut ResourceTracker,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.tracker.depth -= 1;
    }
}
