// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Task configuration.

use tracing::warn;

/// Default stack reserved for a spawned task.
pub const DEFAULT_STACK_SIZE: usize = 64 * 1024;

/// Highest priority level that maps onto a distinct OS scheduling weight.
pub const MAX_PRIORITY: u8 = 19;

/// Scheduling priority of a spawned task.
///
/// Higher levels are more urgent. Levels are relative among spawned tasks:
/// a task never runs at a higher OS priority than the task that spawned it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    /// Keep the spawner's scheduling priority.
    #[default]
    Inherit,
    /// Explicit level, `0..=MAX_PRIORITY`. Larger values are clamped.
    Level(u8),
}

/// How `spawn_task` creates a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskConfig {
    pub name: String,
    pub stack_size: usize,
    pub priority: Priority,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            name: "handoff-task".to_string(),
            stack_size: DEFAULT_STACK_SIZE,
            priority: Priority::Inherit,
        }
    }
}

impl TaskConfig {
    /// Defaults overridden by `HANDOFF_STACK_SIZE` and `HANDOFF_PRIORITY`.
    /// Unparsable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("HANDOFF_STACK_SIZE").ok().as_deref(),
            std::env::var("HANDOFF_PRIORITY").ok().as_deref(),
        )
    }

    fn from_vars(stack_size: Option<&str>, priority: Option<&str>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = stack_size {
            match raw.trim().parse() {
                Ok(size) => config.stack_size = size,
                Err(_) => warn!(value = raw, "ignoring invalid HANDOFF_STACK_SIZE"),
            }
        }
        if let Some(raw) = priority {
            match raw.trim().parse() {
                Ok(level) => config.priority = Priority::Level(level),
                Err(_) => warn!(value = raw, "ignoring invalid HANDOFF_PRIORITY"),
            }
        }
        config
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = stack_size;
        self
    }

    pub fn with_priority(mut self, level: u8) -> Self {
        self.priority = Priority::Level(level);
        self
    }
}
