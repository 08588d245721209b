use crate::types::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one user turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
    Completed,
    TurnsExceeded,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::TurnsExceeded | RunState::Failed
        )
    }

    /// `Idle -> Running`
    pub fn start(self) -> Result<RunState> {
        match self {
            RunState::Idle => Ok(RunState::Running),
            other => Err(AppError::Internal(format!(
                "Cannot start a run from state {}",
                other
            ))),
        }
    }

    /// `Running -> {Completed, TurnsExceeded, Failed}` according to the outcome
    pub fn finish<T>(self, outcome: &Result<T>) -> Result<RunState> {
        if self != RunState::Running {
            return Err(AppError::Internal(format!(
                "Cannot finish a run from state {}",
                self
            )));
        }
        Ok(match outcome {
            Ok(_) => RunState::Completed,
            Err(AppError::MaxTurnsExceeded(_)) => RunState::TurnsExceeded,
            Err(_) => RunState::Failed,
        })
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Completed => "completed",
            RunState::TurnsExceeded => "turns_exceeded",
            RunState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Counts inferences, tool calls, sub-agent calls and handoffs against a maximum
#[derive(Debug, Clone)]
pub struct TurnBudget {
    max: usize,
    used: usize,
}

impl TurnBudget {
    pub fn new(max: usize) -> Self {
        Self { max, used: 0 }
    }

    /// Account for one more step; fails once `max` steps have been taken
    pub fn consume(&mut self) -> Result<()> {
        if self.used >= self.max {
            return Err(AppError::MaxTurnsExceeded(self.max));
        }
        self.used += 1;
        Ok(())
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn remaining(&self) -> usize {
        self.max - self.used
    }

    pub fn max(&self) -> usize {
        self.max
    }
}
