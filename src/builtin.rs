use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::{env, process};

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

use crate::global::State;

/// Column set rendered by `ps`, both in-process and as a pipeline stage.
const PS_COLUMNS: &str = "pid,ppid,stat,tty,time,cmd";

pub type Builtin = fn(&mut State, &[String], &mut dyn Write) -> i32;

/// Recognize a builtin by command name.
pub fn lookup(name: &str) -> Option<Builtin> {
    match name {
        "cd" => Some(builtin_cd),
        "pwd" => Some(builtin_pwd),
        "echo" => Some(builtin_echo),
        "kill" => Some(builtin_kill),
        "ps" => Some(builtin_ps),
        "exit" => Some(builtin_exit),
        _ => None,
    }
}

/// Substitution applied to stages of a multi-stage pipeline: builtins cannot
/// run in-process there (pipe plumbing needs a separate OS process), so they
/// are swapped for fixed external equivalents. `cd` and `exit` have no
/// equivalent and fall through to normal lookup.
pub fn external_equivalent(argv: &[String]) -> Vec<String> {
    let mut out: Vec<String> = match argv[0].as_str() {
        "echo" => vec!["/bin/echo".into()],
        "pwd" => vec!["/bin/pwd".into()],
        "kill" => vec!["/bin/kill".into()],
        "ps" => vec!["/bin/ps".into(), "-o".into(), PS_COLUMNS.into()],
        _ => return argv.to_vec(),
    };
    out.extend(argv[1..].iter().cloned());
    out
}

fn builtin_cd(_: &mut State, args: &[String], _: &mut dyn Write) -> i32 {
    let dir = match args.first() {
        Some(arg) => expand_tilde(arg),
        None => env::var_os("HOME").map(PathBuf::from).unwrap_or_default(),
    };
    if dir.as_os_str().is_empty() {
        eprintln!("cd: no path");
        return 1;
    }
    if let Err(e) = env::set_current_dir(&dir) {
        eprintln!("cd: {}: {}", dir.display(), e);
        return 1;
    }
    0
}

fn expand_tilde(arg: &str) -> PathBuf {
    if let Some(rest) = arg.strip_prefix('~') {
        if let Some(home) = env::var_os("HOME") {
            return Path::new(&home).join(rest.trim_start_matches('/'));
        }
    }
    PathBuf::from(arg)
}

fn builtin_pwd(_: &mut State, _: &[String], out: &mut dyn Write) -> i32 {
    match env::current_dir() {
        Ok(dir) => {
            if let Err(e) = writeln!(out, "{}", dir.display()) {
                eprintln!("pwd: {}", e);
                return 1;
            }
            0
        }
        Err(e) => {
            eprintln!("pwd: {}", e);
            1
        }
    }
}

fn builtin_echo(_: &mut State, args: &[String], out: &mut dyn Write) -> i32 {
    let (newline, words) = match args.first().map(String::as_str) {
        Some("-n") => (false, &args[1..]),
        _ => (true, args),
    };
    let mut text = words.join(" ");
    if newline {
        text.push('\n');
    }
    match out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("echo: {}", e);
            1
        }
    }
}

fn builtin_kill(_: &mut State, args: &[String], _: &mut dyn Write) -> i32 {
    let mut args = args;
    let mut sig = Signal::SIGTERM;
    if let Some(spec) = args.first().and_then(|a| a.strip_prefix('-')) {
        sig = match parse_signal(spec) {
            Some(s) => s,
            None => {
                eprintln!("kill: invalid signal: {}", spec);
                return 1;
            }
        };
        args = &args[1..];
    }
    let pid = match args.first().map(|a| a.parse::<i32>()) {
        Some(Ok(pid)) => pid,
        Some(Err(_)) => {
            eprintln!("kill: invalid pid: {}", args[0]);
            return 1;
        }
        None => {
            eprintln!("kill: usage: kill [-SIGNAL] pid");
            return 1;
        }
    };
    if let Err(e) = signal::kill(Pid::from_raw(pid), sig) {
        eprintln!("kill: {}: {}", pid, e);
        return 1;
    }
    0
}

/// Accept `-9`, `-TERM` and `-SIGTERM` forms.
pub fn parse_signal(spec: &str) -> Option<Signal> {
    if let Ok(n) = spec.parse::<i32>() {
        return Signal::try_from(n).ok();
    }
    let name = spec.strip_prefix("SIG").unwrap_or(spec);
    let sig = match name {
        "HUP" => Signal::SIGHUP,
        "INT" => Signal::SIGINT,
        "QUIT" => Signal::SIGQUIT,
        "KILL" => Signal::SIGKILL,
        "USR1" => Signal::SIGUSR1,
        "USR2" => Signal::SIGUSR2,
        "TERM" => Signal::SIGTERM,
        "CONT" => Signal::SIGCONT,
        "STOP" => Signal::SIGSTOP,
        _ => return None,
    };
    Some(sig)
}

fn builtin_ps(_: &mut State, _: &[String], out: &mut dyn Write) -> i32 {
    // Delegate to the system ps; capture and forward to the resolved output.
    let output = match Command::new("ps").args(["-o", PS_COLUMNS]).output() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("ps: {}", e);
            return 1;
        }
    };
    if !output.status.success() {
        eprintln!("ps: exited with {}", output.status);
        return 1;
    }
    match out.write_all(&output.stdout).and_then(|_| out.flush()) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("ps: {}", e);
            1
        }
    }
}

fn builtin_exit(_: &mut State, _: &[String], _: &mut dyn Write) -> i32 {
    process::exit(0)
}
