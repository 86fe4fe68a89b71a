// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted executor for tests.
//!
//! Commands are matched by substring. `on()` responses answer every
//! matching command; `on_once()` responses are consumed in order, which
//! lets a test script different results for repeated invocations (e.g.
//! a listing that shrinks after a cleanup pass).

use crate::error::ExecError;
use crate::executor::{Executor, RunOptions};
use crate::process::Process;
use async_trait::async_trait;
use parking_lot::Mutex;
use pcs_core::{CommandResult, Host};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Clone)]
struct Scripted {
    pattern: String,
    result: CommandResult,
}

/// Test double for [`Executor`] with scripted responses.
pub struct FakeExecutor {
    host: Host,
    once: Mutex<VecDeque<Scripted>>,
    always: Mutex<Vec<Scripted>>,
    /// Every command the code under test ran, in order.
    pub commands: Mutex<Vec<String>>,
    process_lines: Mutex<Vec<String>>,
    silent_process: bool,
    terminated: Arc<AtomicBool>,
}

impl FakeExecutor {
    pub fn new(host: Host) -> Self {
        Self {
            host,
            once: Mutex::new(VecDeque::new()),
            always: Mutex::new(Vec::new()),
            commands: Mutex::new(Vec::new()),
            process_lines: Mutex::new(Vec::new()),
            silent_process: false,
            terminated: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Respond to every command containing `pattern`.
    pub fn on(
        self,
        pattern: impl Into<String>,
        exit_code: i32,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        self.always.lock().push(Scripted {
            pattern: pattern.into(),
            result: CommandResult::new(exit_code, stdout, stderr),
        });
        self
    }

    /// Respond once to the next command containing `pattern`.
    pub fn on_once(
        self,
        pattern: impl Into<String>,
        exit_code: i32,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        self.once.lock().push_back(Scripted {
            pattern: pattern.into(),
            result: CommandResult::new(exit_code, stdout, stderr),
        });
        self
    }

    /// Script the stdout lines of the next started process.
    pub fn with_process_lines(self, lines: Vec<&str>) -> Self {
        *self.process_lines.lock() = lines.into_iter().map(String::from).collect();
        self
    }

    /// Started processes produce no output and never exit on their own.
    pub fn with_silent_process(mut self) -> Self {
        self.silent_process = true;
        self
    }

    /// True once `terminate_all` (or a process terminate) ran.
    pub fn terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }

    /// Commands recorded so far.
    pub fn recorded(&self) -> Vec<String> {
        self.commands.lock().clone()
    }

    fn lookup(&self, cmd: &str) -> CommandResult {
        {
            let mut once = self.once.lock();
            if let Some(pos) = once.iter().position(|s| cmd.contains(&s.pattern)) {
                if let Some(scripted) = once.remove(pos) {
                    return scripted.result;
                }
            }
        }
        let always = self.always.lock();
        for scripted in always.iter() {
            if cmd.contains(&scripted.pattern) {
                return scripted.result.clone();
            }
        }
        CommandResult::new(0, "", "")
    }
}

#[async_trait]
impl Executor for FakeExecutor {
    fn host(&self) -> Host {
        self.host
    }

    async fn run(&self, cmd: &str, _opts: RunOptions) -> Result<CommandResult, ExecError> {
        self.commands.lock().push(cmd.to_string());
        Ok(self.lookup(cmd))
    }

    async fn start_process(
        &self,
        cmd: &str,
        _opts: RunOptions,
    ) -> Result<Box<dyn Process>, ExecError> {
        self.commands.lock().push(cmd.to_string());
        Ok(Box::new(FakeProcess {
            lines: self.process_lines.lock().clone().into(),
            silent: self.silent_process,
            terminated: Arc::clone(&self.terminated),
        }))
    }

    async fn terminate_all(&self) {
        self.terminated.store(true, Ordering::SeqCst);
    }
}

struct FakeProcess {
    lines: VecDeque<String>,
    silent: bool,
    terminated: Arc<AtomicBool>,
}

#[async_trait]
impl Process for FakeProcess {
    async fn next_stdout_line(&mut self) -> Result<Option<String>, ExecError> {
        if self.silent {
            std::future::pending::<()>().await;
        }
        Ok(self.lines.pop_front())
    }

    async fn next_stderr_line(&mut self) -> Result<Option<String>, ExecError> {
        Ok(None)
    }

    async fn wait(&mut self) -> Result<CommandResult, ExecError> {
        if self.silent {
            std::future::pending::<()>().await;
        }
        Ok(CommandResult::new(0, "", ""))
    }

    async fn terminate(&mut self) {
        self.terminated.store(true, Ordering::SeqCst);
    }
}
