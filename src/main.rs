use std::io::{self, BufRead};
use std::sync::Arc;

use log::warn;

use minish::global::{print_prompt, State};
use minish::{eval, job, logging, parse_line};

fn main() {
    logging::init();

    let mut state = State::new();
    if let Err(e) = job::spawn_interrupt_listener(Arc::clone(&state.foreground)) {
        warn!("could not install interrupt listener: {}", e);
    }

    let stdin = io::stdin();
    let mut stdin = stdin.lock();
    let mut line = String::new();
    loop {
        print_prompt();
        line.clear();
        match stdin.read_line(&mut line) {
            // EOF ends the session with a trailing newline, status 0.
            Ok(0) => {
                println!();
                return;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("minish: read: {}", e);
                return;
            }
        }
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(&line) {
            Ok(items) => {
                eval::eval_sequence(&mut state, &items);
            }
            Err(e) => eprintln!("minish: {}", e),
        }
    }
}
