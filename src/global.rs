use std::io::{self, Write};
use std::sync::Arc;
use std::env;

use crate::job::Foreground;
use crate::search::SearchCache;

/// Shell-wide state threaded through the read-eval loop. The foreground
/// handle is the only piece shared with the signal listener thread.
pub struct State {
    pub search_cache: SearchCache,
    pub foreground: Arc<Foreground>,
}

impl State {
    pub fn new() -> State {
        State {
            search_cache: SearchCache::new(),
            foreground: Arc::new(Foreground::new()),
        }
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

/// Write the prompt (current directory basename) and flush.
pub fn print_prompt() {
    let base = env::current_dir()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "/".to_string());
    print!("{}$ ", base);
    let _ = io::stdout().flush();
}
