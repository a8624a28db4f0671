use std::io;
use std::sync::{Arc, Mutex};
use std::thread;

use log::{debug, warn};
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use signal_hook::consts::SIGINT;
use signal_hook::iterator::Signals;

use crate::global::print_prompt;

/// The foreground process-group handle: the single piece of state shared
/// between the read-eval loop and the asynchronous interrupt path. `None`
/// while the shell is idle.
#[derive(Debug, Default)]
pub struct Foreground {
    pgid: Mutex<Option<Pid>>,
}

impl Foreground {
    pub fn new() -> Foreground {
        Foreground::default()
    }

    pub fn set(&self, pgid: Pid) {
        *self.lock() = Some(pgid);
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    pub fn get(&self) -> Option<Pid> {
        *self.lock()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Pid>> {
        // A poisoned lock only means a panicking thread held a plain Option.
        self.pgid.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Spawn the SIGINT listener: forwards the interrupt to the whole foreground
/// process group, or redraws the prompt when nothing is running. The listener
/// never terminates the shell; only `exit`/EOF does.
pub fn spawn_interrupt_listener(fg: Arc<Foreground>) -> io::Result<()> {
    let mut signals = Signals::new([SIGINT])?;
    thread::Builder::new()
        .name("sigint-listener".to_string())
        .spawn(move || {
            for _ in signals.forever() {
                match fg.get() {
                    Some(pgid) => {
                        debug!("forwarding SIGINT to process group {}", pgid);
                        if let Err(e) = killpg(pgid, Signal::SIGINT) {
                            warn!("killpg({}): {}", pgid, e);
                        }
                    }
                    None => {
                        println!();
                        print_prompt();
                    }
                }
            }
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_starts_idle() {
        let fg = Foreground::new();
        assert_eq!(fg.get(), None);
    }

    #[test]
    fn publish_and_clear() {
        let fg = Foreground::new();
        fg.set(Pid::from_raw(1234));
        assert_eq!(fg.get(), Some(Pid::from_raw(1234)));
        fg.clear();
        assert_eq!(fg.get(), None);
    }

    #[test]
    fn shared_across_threads() {
        let fg = Arc::new(Foreground::new());
        let fg2 = Arc::clone(&fg);
        let t = thread::spawn(move || fg2.set(Pid::from_raw(42)));
        t.join().unwrap();
        assert_eq!(fg.get(), Some(Pid::from_raw(42)));
    }
}
