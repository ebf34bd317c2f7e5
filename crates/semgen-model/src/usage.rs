//! Token usage accounting

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Cumulative LLM token usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens
    pub prompt: u64,
    /// Completion tokens
    pub completion: u64,
    /// Total tokens
    pub total: u64,
}

impl TokenUsage {
    /// Usage from prompt and completion counts
    #[inline]
    #[must_use]
    pub fn new(prompt: u64, completion: u64) -> Self {
        Self {
            prompt,
            completion,
            total: prompt + completion,
        }
    }

    /// Whether nothing was consumed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0 && self.prompt == 0 && self.completion == 0
    }
}

impl Add for TokenUsage {
    type Output = TokenUsage;

    fn add(mut self, rhs: TokenUsage) -> TokenUsage {
        self += rhs;
        self
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: TokenUsage) {
        self.prompt = self.prompt.saturating_add(rhs.prompt);
        self.completion = self.completion.saturating_add(rhs.completion);
        self.total = self.total.saturating_add(rhs.total);
    }
}
