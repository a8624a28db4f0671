use std::fs::{File, OpenOptions};
use std::io::{self, Write};

use thiserror::Error;

use crate::types::Stage;

/// A redirection open failure: a runtime error scoped to one pipeline,
/// distinct from a parse error.
#[derive(Debug, Error)]
#[error("{path}: {source}")]
pub struct RedirError {
    pub path: String,
    pub source: io::Error,
}

/// File bindings for one stage. `None` means "use the pipe end for this
/// position, or inherit the shell's own stream at the pipeline's edge".
/// Both handles close on drop, on every exit path.
#[derive(Debug, Default)]
pub struct StageIo {
    pub stdin: Option<File>,
    pub stdout: Option<File>,
}

/// Open the files a stage's redirections name. Input files are honored on
/// the first stage only and output files on the last stage only; interior
/// redirections are superseded by the pipe wiring.
pub fn open_stage_files(stage: &Stage, is_first: bool, is_last: bool) -> Result<StageIo, RedirError> {
    let mut io = StageIo::default();
    if is_first {
        if let Some(path) = &stage.stdin_file {
            io.stdin = Some(File::open(path).map_err(|e| RedirError {
                path: path.clone(),
                source: e,
            })?);
        }
    }
    if is_last {
        if let Some(path) = &stage.stdout_file {
            io.stdout = Some(open_output(path, stage.append)?);
        }
    }
    Ok(io)
}

fn open_output(path: &str, append: bool) -> Result<File, RedirError> {
    let mut opts = OpenOptions::new();
    opts.write(true).create(true);
    if append {
        opts.append(true);
    } else {
        opts.truncate(true);
    }
    opts.open(path).map_err(|e| RedirError {
        path: path.to_string(),
        source: e,
    })
}

/// Resolve the output stream for an in-process builtin: the declared output
/// file if any, otherwise the shell's stdout.
pub fn builtin_output(stage: &Stage) -> Result<Box<dyn Write>, RedirError> {
    match &stage.stdout_file {
        Some(path) => Ok(Box::new(open_output(path, stage.append)?)),
        None => Ok(Box::new(io::stdout())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn tmp_path(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("minish-redirs-{}-{}", std::process::id(), name));
        p
    }

    fn stage_with_out(path: &str, append: bool) -> Stage {
        Stage {
            argv: vec!["x".into()],
            stdin_file: None,
            stdout_file: Some(path.to_string()),
            append,
        }
    }

    #[test]
    fn missing_input_file_is_an_error() {
        let stage = Stage {
            argv: vec!["cat".into()],
            stdin_file: Some("/no/such/minish/file".into()),
            stdout_file: None,
            append: false,
        };
        let err = open_stage_files(&stage, true, true).unwrap_err();
        assert!(err.to_string().contains("/no/such/minish/file"));
    }

    #[test]
    fn truncate_then_append() {
        let path = tmp_path("append");
        let spec = path.to_str().unwrap();

        let mut io = open_stage_files(&stage_with_out(spec, false), true, true).unwrap();
        io.stdout.as_mut().unwrap().write_all(b"one\n").unwrap();
        drop(io);

        let mut io = open_stage_files(&stage_with_out(spec, true), true, true).unwrap();
        io.stdout.as_mut().unwrap().write_all(b"two\n").unwrap();
        drop(io);

        let mut content = String::new();
        File::open(&path).unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "one\ntwo\n");

        let mut io = open_stage_files(&stage_with_out(spec, false), true, true).unwrap();
        io.stdout.as_mut().unwrap().write_all(b"three\n").unwrap();
        drop(io);

        let mut content = String::new();
        File::open(&path).unwrap().read_to_string(&mut content).unwrap();
        assert_eq!(content, "three\n");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn interior_redirections_are_ignored() {
        let stage = Stage {
            argv: vec!["x".into()],
            stdin_file: Some("/no/such/in".into()),
            stdout_file: Some("/no/such/out".into()),
            append: false,
        };
        // Neither end of an interior stage touches the filesystem.
        let io = open_stage_files(&stage, false, false).unwrap();
        assert!(io.stdin.is_none());
        assert!(io.stdout.is_none());
    }
}
