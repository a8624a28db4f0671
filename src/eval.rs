use std::convert::Infallible;
use std::ffi::{CString, NulError};
use std::io::{self, Write};
use std::os::fd::{AsRawFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;

use log::debug;
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};
use thiserror::Error;

use crate::builtin;
use crate::global::State;
use crate::redirs::{self, RedirError};
use crate::types::{Connector, Pipeline, SeqItem, Stage};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("command not found: {0}")]
    CommandNotFound(String),
    #[error("{0}")]
    Redir(#[from] RedirError),
    #[error("nul byte in argument: {0}")]
    Nul(#[from] NulError),
    #[error("{0}")]
    Nix(#[from] Errno),
}

/// Evaluate one line's sequence items left to right with `&&` / `||`
/// short-circuit. A skipped item leaves the carried status untouched.
pub fn eval_sequence(state: &mut State, items: &[SeqItem]) -> i32 {
    let mut last_status = 0;
    let mut prev = Connector::None;
    for item in items {
        let skip = match prev {
            Connector::And => last_status != 0,
            Connector::Or => last_status == 0,
            Connector::None => false,
        };
        if !skip {
            last_status = eval_pipeline(state, &item.pipeline);
            debug!("pipeline finished with status {}", last_status);
        }
        prev = item.connector;
    }
    last_status
}

/// Run one pipeline and return its exit status: the last stage's exit code,
/// 127 for an unknown command, 126 for a spawn/exec failure, 1 for a
/// redirection failure, `128 + signo` for a signaled last stage.
pub fn eval_pipeline(state: &mut State, pipeline: &Pipeline) -> i32 {
    let stages = &pipeline.stages;
    debug_assert!(!stages.is_empty());

    // A sole builtin stage runs in the shell's own process; nothing to
    // interrupt, so no process-group handle is published.
    if stages.len() == 1 {
        if let Some(func) = builtin::lookup(&stages[0].argv[0]) {
            return run_builtin(state, &stages[0], func);
        }
    }

    let prepared = match prepare(state, pipeline) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("minish: {}", e);
            return match e {
                ExecError::CommandNotFound(_) => 127,
                _ => 1,
            };
        }
    };
    run_stages(state, prepared)
}

fn run_builtin(state: &mut State, stage: &Stage, func: builtin::Builtin) -> i32 {
    let mut out = match redirs::builtin_output(stage) {
        Ok(out) => out,
        Err(e) => {
            eprintln!("minish: {}", e);
            return 1;
        }
    };
    func(state, &stage.argv[1..], out.as_mut())
}

/// One stage, ready to spawn: resolved argv/path plus the fds to bind onto
/// stdin/stdout. `None` means "inherit the shell's stream". Every fd here
/// closes on drop, so an abort mid-construction leaks nothing.
struct PreparedStage {
    argv: Vec<CString>,
    path: CString,
    stdin: Option<OwnedFd>,
    stdout: Option<OwnedFd>,
}

/// Prepared step: builtin substitution, program lookup, redirect files and
/// inter-stage pipes, all before anything is spawned.
fn prepare(state: &mut State, pipeline: &Pipeline) -> Result<Vec<PreparedStage>, ExecError> {
    let n = pipeline.stages.len();

    // O_CLOEXEC, so a child only keeps the ends it dup2s onto fd 0/1 and
    // every unrelated pipe end vanishes at exec.
    let mut pipes: Vec<(Option<OwnedFd>, Option<OwnedFd>)> = Vec::with_capacity(n - 1);
    for _ in 1..n {
        let (r, w) = unistd::pipe2(OFlag::O_CLOEXEC)?;
        pipes.push((Some(r), Some(w)));
    }

    let mut prepared = Vec::with_capacity(n);
    for (i, stage) in pipeline.stages.iter().enumerate() {
        let argv_strings = if n > 1 {
            builtin::external_equivalent(&stage.argv)
        } else {
            stage.argv.clone()
        };
        let name = &argv_strings[0];
        let path = state
            .search_cache
            .resolve(name)
            .ok_or_else(|| ExecError::CommandNotFound(name.clone()))?;

        let files = redirs::open_stage_files(stage, i == 0, i == n - 1)?;
        let stdin = if i == 0 {
            files.stdin.map(OwnedFd::from)
        } else {
            pipes[i - 1].0.take()
        };
        let stdout = if i == n - 1 {
            files.stdout.map(OwnedFd::from)
        } else {
            pipes[i].1.take()
        };

        let argv: Vec<CString> = argv_strings
            .iter()
            .map(|s| CString::new(s.as_bytes()))
            .collect::<Result<_, _>>()?;
        prepared.push(PreparedStage {
            argv,
            path: CString::new(path.as_os_str().as_bytes())?,
            stdin,
            stdout,
        });
    }
    Ok(prepared)
}

/// Spawning through Done: fork every stage into one process group, publish
/// the group, drop the parent's fd copies, reap, clear the group.
fn run_stages(state: &mut State, prepared: Vec<PreparedStage>) -> i32 {
    let mut pids: Vec<Pid> = Vec::with_capacity(prepared.len());
    let mut pgid: Option<Pid> = None;
    let mut fork_err: Option<Errno> = None;

    for stage in &prepared {
        match unsafe { unistd::fork() } {
            Ok(ForkResult::Child) => {
                // Both sides setpgid to close the race between exec and the
                // parent's bookkeeping.
                let _ = unistd::setpgid(Pid::from_raw(0), pgid.unwrap_or(Pid::from_raw(0)));
                exec_stage(stage);
            }
            Ok(ForkResult::Parent { child }) => {
                let gid = pgid.unwrap_or(child);
                let _ = unistd::setpgid(child, gid);
                if pgid.is_none() {
                    pgid = Some(gid);
                    state.foreground.set(gid);
                    debug!("published foreground process group {}", gid);
                }
                debug!("spawned {:?} (pid {})", stage.path, child);
                pids.push(child);
            }
            Err(e) => {
                // Already-started stages are still reaped below.
                fork_err = Some(e);
                break;
            }
        }
    }

    // Release the parent's pipe and file ends before waiting, or a child
    // reading a pipe whose write end we still hold would block forever.
    drop(prepared);

    let status = reap(&pids);
    state.foreground.clear();
    match fork_err {
        Some(e) => {
            eprintln!("minish: fork: {}", e);
            126
        }
        None => status,
    }
}

/// Wait for every child; the pipeline's status is the last stage's.
fn reap(pids: &[Pid]) -> i32 {
    let mut status = 0;
    for &pid in pids {
        status = loop {
            match waitpid(pid, None) {
                Ok(WaitStatus::Exited(_, code)) => break code,
                Ok(WaitStatus::Signaled(_, sig, _)) => break 128 + sig as i32,
                Ok(_) => continue,
                Err(Errno::EINTR) => continue,
                Err(_) => break 1,
            }
        };
    }
    status
}

/// Child side: bind stdin/stdout and exec. Never returns.
fn exec_stage(stage: &PreparedStage) -> ! {
    let result = (|| -> nix::Result<Infallible> {
        if let Some(fd) = &stage.stdin {
            unistd::dup2(fd.as_raw_fd(), libc::STDIN_FILENO)?;
        }
        if let Some(fd) = &stage.stdout {
            unistd::dup2(fd.as_raw_fd(), libc::STDOUT_FILENO)?;
        }
        unistd::execv(&stage.path, &stage.argv)
    })();
    let _ = writeln!(
        io::stderr(),
        "minish: exec {}: {}",
        stage.path.to_string_lossy(),
        result.unwrap_err()
    );
    unsafe { libc::_exit(126) }
}
