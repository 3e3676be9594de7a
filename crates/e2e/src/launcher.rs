//! Fire-and-forget process launching for report viewers
//!
//! Every launch is detached: stdio goes to null, the child gets its own process
//! group, and the `Child` is dropped without waiting. Nothing here can fail the
//! caller.

use chrono::Utc;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

use storefront_common::{Platform, ProcessHandle};

use crate::config::{CommandSpec, HarnessConfig, ReportToolConfig};
use crate::error::{E2eError, E2eResult};

/// Debug log written next to the generated report
pub const AUTO_OPEN_LOG: &str = "auto-open.log";

/// Entry point of a generated report tree
pub const REPORT_ENTRY_POINT: &str = "index.html";

/// Direct file-open chain for a platform, tried in order
pub fn default_file_openers(platform: Platform) -> Vec<CommandSpec> {
    match platform {
        Platform::Windows => vec![CommandSpec::new("cmd", &["/C", "start", "", "{target}"])],
        Platform::MacOs => vec![CommandSpec::new("open", &["-a", "Google Chrome", "{target}"])],
        Platform::Unix => vec![
            CommandSpec::new("google-chrome", &["{target}"]),
            CommandSpec::new("chromium-browser", &["{target}"]),
            CommandSpec::new("xdg-open", &["{target}"]),
        ],
    }
}

/// Spawns report viewers without ever blocking on them
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    platform: Platform,
    report_tool: ReportToolConfig,
    file_openers: Vec<CommandSpec>,
}

impl ProcessLauncher {
    pub fn new(
        platform: Platform,
        report_tool: ReportToolConfig,
        file_openers: Option<Vec<CommandSpec>>,
    ) -> Self {
        Self {
            platform,
            report_tool,
            file_openers: file_openers.unwrap_or_else(|| default_file_openers(platform)),
        }
    }

    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(
            Platform::current(),
            config.report_tool.clone(),
            config.launcher.file_openers.clone(),
        )
    }

    /// Spawn a detached process and forget it.
    pub fn launch_detached(&self, program: &str, args: &[String]) -> E2eResult<ProcessHandle> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        detach(&mut cmd);

        let child = cmd.spawn().map_err(|e| E2eError::Spawn {
            command: program.to_string(),
            reason: e.to_string(),
        })?;
        debug!("Spawned {} (pid {})", program, child.id());
        drop(child);

        Ok(ProcessHandle {
            command: program.to_string(),
            args: args.to_vec(),
            platform: self.platform,
            detached: true,
            outcome_logged: false,
        })
    }

    /// Open a single file through the platform chain.
    pub fn open_file(&self, target: &Path) -> Option<ProcessHandle> {
        self.open_with_chain(target, &LaunchLog::disabled())
    }

    /// Open a generated report tree.
    ///
    /// Tries the report tool's own `open` command on `report_dir` first, then
    /// the platform chain on its `index.html`. Every attempt is appended to
    /// `report_dir/auto-open.log`.
    pub fn open_best_effort(&self, report_dir: &Path) -> Option<ProcessHandle> {
        let log = LaunchLog::new(report_dir.join(AUTO_OPEN_LOG));

        let mut serve_args = self.report_tool.args.clone();
        serve_args.push("open".to_string());
        serve_args.push(report_dir.to_string_lossy().into_owned());

        match self.launch_detached(&self.report_tool.program, &serve_args) {
            Ok(mut handle) => {
                handle.outcome_logged = log.append(&format!(
                    "Spawned `{}` as detached process.",
                    handle.command_line()
                ));
                info!("Opening report with `{}`", handle.command_line());
                return Some(handle);
            }
            Err(e) => {
                log.append(&format!("Failed to spawn report tool open: {}", e));
            }
        }

        let handle = self.open_with_chain(&report_dir.join(REPORT_ENTRY_POINT), &log);
        if handle.is_none() {
            warn!(
                "Could not automatically open report. See {} for details.",
                log.path().map(|p| p.display().to_string()).unwrap_or_default()
            );
        }
        handle
    }

    fn open_with_chain(&self, target: &Path, log: &LaunchLog) -> Option<ProcessHandle> {
        for opener in &self.file_openers {
            let (program, args) = opener.render(target);
            match self.launch_detached(&program, &args) {
                Ok(mut handle) => {
                    handle.outcome_logged = log.append(&format!(
                        "Spawned fallback open command `{}` as detached process.",
                        handle.command_line()
                    ));
                    info!("Opened {} with {}", target.display(), program);
                    return Some(handle);
                }
                Err(e) => {
                    log.append(&format!("Fallback spawn failed: {}", e));
                    debug!("{}", e);
                }
            }
        }

        warn!("Could not automatically open {}", target.display());
        None
    }
}

#[cfg(unix)]
fn detach(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(windows)]
fn detach(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;
    const DETACHED_PROCESS: u32 = 0x0000_0008;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
}

#[cfg(not(any(unix, windows)))]
fn detach(_cmd: &mut Command) {}

/// Append-only plain-text log; write failures are ignored
struct LaunchLog {
    path: Option<PathBuf>,
}

impl LaunchLog {
    fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    fn disabled() -> Self {
        Self { path: None }
    }

    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn append(&self, msg: &str) -> bool {
        let Some(path) = &self.path else {
            return false;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut f| writeln!(f, "{} - {}", Utc::now().to_rfc3339(), msg))
            .is_ok()
    }
}
