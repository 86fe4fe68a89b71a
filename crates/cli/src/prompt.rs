// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interactive confirmation on the terminal.

use async_trait::async_trait;
use pcs_engine::Prompter;
use std::io::{IsTerminal, Write};

/// Asks yes/no questions on the controlling terminal.
///
/// Falls back to declining when stdin is not a terminal, so scripted
/// runs never hang waiting for input.
pub struct StdinPrompter;

impl StdinPrompter {
    fn ask_blocking(question: &str) -> bool {
        if !std::io::stdin().is_terminal() {
            return false;
        }
        eprint!("{question} [y/N] ");
        let _ = std::io::stderr().flush();
        let mut answer = String::new();
        if std::io::stdin().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

#[async_trait]
impl Prompter for StdinPrompter {
    async fn confirm(&self, question: &str) -> bool {
        let question = question.to_string();
        tokio::task::spawn_blocking(move || Self::ask_blocking(&question))
            .await
            .unwrap_or(false)
    }
}
