//! Headless to-do front end.
//!
//! # Responsibility
//! - Drive `todo_core` from stdin commands for smoke checks and manual use.
//! - Print reminders as they arrive, independent of command input.

use log::info;
use std::io::{self, BufRead, Write};
use std::thread;
use todo_core::{default_log_level, init_logging, AppContext, AppResult, CoreConfig, Task};

const HELP: &str = "commands: list | add <text> | rm <n> | done <n> | at <HH:MM> <text> | find [query] | help | quit";

fn main() {
    println!("todo_core version={}", todo_core::core_version());
    start_logging();

    let (mut app, reminders) = match AppContext::open(&CoreConfig::default()) {
        Ok(opened) => opened,
        Err(err) => {
            eprintln!("Error loading tasks: {err}");
            return;
        }
    };

    // Why: reminders must print even while the loop blocks on stdin.
    thread::spawn(move || {
        for event in reminders {
            println!("\n{}", event.message());
        }
    });

    println!("{HELP}");
    print_tasks(&app.tasks().unwrap_or_default());

    let stdin = io::stdin();
    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                eprintln!("Error reading input: {err}");
                break;
            }
        }

        let (command, rest) = split_command(&line);
        let outcome = match command {
            "" => continue,
            "quit" | "exit" => break,
            "help" => {
                println!("{HELP}");
                continue;
            }
            "list" => app.tasks().map(|tasks| print_tasks(&tasks)),
            "add" => app.add(rest).and_then(|()| app.tasks().map(|t| print_tasks(&t))),
            "rm" => app
                .remove(parse_position(rest))
                .and_then(|_| app.tasks().map(|t| print_tasks(&t))),
            "done" => app
                .toggle_completion(parse_position(rest))
                .and_then(|_| app.tasks().map(|t| print_tasks(&t))),
            "at" => {
                let (time, text) = split_command(rest);
                app.schedule(text, time)
                    .and_then(|()| app.tasks().map(|t| print_tasks(&t)))
            }
            "find" => app.filter(rest).map(|tasks| print_tasks(&tasks)),
            other => {
                println!("unknown command `{other}`; {HELP}");
                continue;
            }
        };
        report(outcome);
    }

    app.shutdown();
    info!("event=cli_exit module=cli status=ok");
}

fn start_logging() {
    let log_dir = match std::env::current_dir() {
        Ok(cwd) => cwd.join("logs"),
        Err(err) => {
            eprintln!("Logging disabled: {err}");
            return;
        }
    };
    if let Err(err) = init_logging(default_log_level(), &log_dir.to_string_lossy()) {
        eprintln!("Logging disabled: {err}");
    }
}

fn split_command(line: &str) -> (&str, &str) {
    let trimmed = line.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((head, tail)) => (head, tail.trim()),
        None => (trimmed, ""),
    }
}

/// Parses a 1-based list number; anything else counts as no selection.
fn parse_position(raw: &str) -> Option<usize> {
    raw.trim()
        .parse::<usize>()
        .ok()
        .and_then(|number| number.checked_sub(1))
}

fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("(no tasks)");
        return;
    }
    for (index, task) in tasks.iter().enumerate() {
        println!("{:>3}. {}", index + 1, task.display_label());
    }
}

fn report(outcome: AppResult<()>) {
    if let Err(err) = outcome {
        println!("{err}");
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_position, split_command};

    #[test]
    fn split_command_separates_head_and_rest() {
        assert_eq!(split_command("  at 9:30  Standup call \n"), ("at", "9:30  Standup call"));
        assert_eq!(split_command("list\n"), ("list", ""));
        assert_eq!(split_command("   "), ("", ""));
    }

    #[test]
    fn parse_position_is_one_based() {
        assert_eq!(parse_position("1"), Some(0));
        assert_eq!(parse_position(" 3 "), Some(2));
        assert_eq!(parse_position("0"), None);
        assert_eq!(parse_position("x"), None);
    }
}
