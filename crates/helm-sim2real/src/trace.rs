//! Bounded execution traces.
//!
//! A trace is opened by the runner, receives one entry per target per frame
//! while open, and is handed back whole when closed. Past the configured
//! capacity the oldest entries are evicted first. A closed trace is a plain
//! value with no mutating API.

use std::collections::VecDeque;

use helm_interp::{ExecutionTickResult, TargetKind};
use helm_ir::OutputFrame;
use serde::{Deserialize, Serialize};

use crate::config::RunnerMode;

#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("A trace is already being recorded: {0}")]
    AlreadyActive(String),

    #[error("No trace is being recorded")]
    NotActive,

    #[error("Trace serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BytecodeTraceEntry {
    pub frame: OutputFrame,
    pub result: ExecutionTickResult,
    pub target: TargetKind,
    pub start_time: u64,
    pub end_time: u64,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BytecodeTrace {
    id: String,
    mode: RunnerMode,
    started_at: u64,
    ended_at: Option<u64>,
    max_entries: usize,
    /// Entries evicted to stay within `max_entries`.
    evicted: u64,
    entries: VecDeque<BytecodeTraceEntry>,
}

impl BytecodeTrace {
    pub(crate) fn open(id: String, mode: RunnerMode, started_at: u64, max_entries: usize) -> Self {
        Self {
            id,
            mode,
            started_at,
            ended_at: None,
            max_entries: max_entries.max(1),
            evicted: 0,
            entries: VecDeque::new(),
        }
    }

    pub(crate) fn push(&mut self, entry: BytecodeTraceEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
            self.evicted += 1;
        }
    }

    pub(crate) fn close(mut self, ended_at: u64) -> Self {
        self.ended_at = Some(ended_at);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mode(&self) -> RunnerMode {
        self.mode
    }

    pub fn started_at(&self) -> u64 {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<u64> {
        self.ended_at
    }

    pub fn is_ended(&self) -> bool {
        self.ended_at.is_some()
    }

    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn entries(&self) -> impl Iterator<Item = &BytecodeTraceEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json_string(&self) -> Result<String, TraceError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, TraceError> {
        Ok(serde_json::from_str(s)?)
    }
}
