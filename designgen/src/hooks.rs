//! Post-generation hooks.
//!
//! Hooks run synchronously, in configured order, after artifacts and stores
//! have been written. The first failure stops the sequence; files already
//! written stay in place.

use crate::config::HookConfig;
use crate::error::HookExecutionError;
use std::process::Command;

/// Exit status of one hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookStatus {
    /// Exit code; `None` when terminated by a signal.
    pub code: Option<i32>,
}

impl HookStatus {
    /// Whether the hook exited with code 0.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Executes one hook command.
pub trait HookRunner {
    /// Run the hook to completion and return its exit status.
    fn run(&mut self, hook: &HookConfig) -> std::io::Result<HookStatus>;
}

/// Runs hooks as child processes in the current directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessHookRunner;

impl HookRunner for ProcessHookRunner {
    fn run(&mut self, hook: &HookConfig) -> std::io::Result<HookStatus> {
        let status = Command::new(&hook.command).args(&hook.args).status()?;
        Ok(HookStatus {
            code: status.code(),
        })
    }
}

/// Outcome of the hook sequence.
#[derive(Debug, Default)]
pub struct HookReport {
    /// Hooks that ran to completion successfully.
    pub ran: Vec<String>,

    /// Hooks not started because an earlier one failed.
    pub skipped: Vec<String>,

    /// The failure that stopped the sequence.
    pub failure: Option<HookExecutionError>,
}

impl HookReport {
    /// Whether every hook succeeded.
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Run `hooks` in order, stopping at the first failure.
pub fn run_hooks(hooks: &[HookConfig], runner: &mut dyn HookRunner) -> HookReport {
    let mut report = HookReport::default();

    for (index, hook) in hooks.iter().enumerate() {
        tracing::info!(hook = %hook.name, command = %hook.command, "running hook");

        let failure = match runner.run(hook) {
            Ok(status) if status.success() => None,
            Ok(status) => Some(HookExecutionError::Failed {
                hook: hook.name.clone(),
                code: status.code,
            }),
            Err(e) => Some(HookExecutionError::Spawn {
                hook: hook.name.clone(),
                source: e,
            }),
        };

        match failure {
            None => report.ran.push(hook.name.clone()),
            Some(error) => {
                tracing::warn!(hook = %hook.name, error = %error, "hook failed; skipping remaining hooks");
                report.skipped = hooks[index + 1..].iter().map(|h| h.name.clone()).collect();
                report.failure = Some(error);
                break;
            }
        }
    }

    report
}
