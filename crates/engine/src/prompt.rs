// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Injectable user-confirmation channel.
//!
//! The engine never reads a terminal itself; the CLI supplies an
//! interactive prompter, non-interactive runs get [`AutoDecline`].

use async_trait::async_trait;

#[async_trait]
pub trait Prompter: Send + Sync {
    /// Ask the user a yes/no question; `false` aborts the operation.
    async fn confirm(&self, question: &str) -> bool;
}

/// Declines every prompt. Safe default for non-interactive runs.
pub struct AutoDecline;

#[async_trait]
impl Prompter for AutoDecline {
    async fn confirm(&self, _question: &str) -> bool {
        false
    }
}

/// Accepts every prompt (tests and `--allow-consecutive` style bypasses).
pub struct AutoAccept;

#[async_trait]
impl Prompter for AutoAccept {
    async fn confirm(&self, _question: &str) -> bool {
        true
    }
}
