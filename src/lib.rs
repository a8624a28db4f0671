//! minish: a small job-control shell.
//!
//! One line of input becomes a sequence of pipelines joined by `&&` / `||`;
//! each pipeline runs as one child process per stage, wired together with
//! pipes and redirections and placed in its own process group so an
//! interrupt reaches every stage at once.
//!
//! # Architecture
//!
//! - **[`lexer`]** — raw line to word/operator tokens: quoting, escaping, `$NAME` expansion.
//! - **[`parser`]** — tokens to `&&`/`||` sequence items of `|`-separated stages.
//! - **[`redirs`]** — opening the files a stage's `<` / `>` / `>>` name.
//! - **[`builtin`]** — `cd`, `pwd`, `echo`, `kill`, `ps`, `exit`, plus the
//!   external-equivalent substitution used inside multi-stage pipelines.
//! - **[`eval`]** — the executor: prepare, fork, wire, reap.
//! - **[`job`]** — the foreground process-group handle and the SIGINT listener.
//! - **[`search`]** — `$PATH` lookup cache consulted before exec.
//! - **[`global`]** — shell-wide state and the prompt.
//! - **[`logging`]** — stderr logging, level from `MINISH_LOG`.

pub mod builtin;
pub mod eval;
pub mod global;
pub mod job;
pub mod lexer;
pub mod logging;
pub mod parser;
pub mod redirs;
pub mod search;
pub mod types;

use types::SeqItem;

/// Lex and parse one input line into its sequence items.
pub fn parse_line(line: &str) -> Result<Vec<SeqItem>, parser::ParseError> {
    parser::parse_sequence(&lexer::tokenize(line))
}
