use std::borrow::Cow::{self, Borrowed, Owned};

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use vault_chat_core::{keywords, Role};

/// Completion and hints for slash commands.
#[derive(Clone)]
struct CommandHelper {
    commands: Vec<String>,
}

impl CommandHelper {
    fn new() -> Self {
        Self {
            commands: keywords().into_iter().map(str::to_string).collect(),
        }
    }
}

impl Helper for CommandHelper {}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(' ') {
            return Ok((0, vec![]));
        }
        let candidates = self
            .commands
            .iter()
            .filter(|cmd| cmd.starts_with(line))
            .map(|cmd| Pair {
                display: cmd.clone(),
                replacement: cmd.clone(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for CommandHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CommandHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if !line.starts_with('/') || line.contains(' ') {
            return None;
        }
        self.commands
            .iter()
            .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
            .map(|cmd| cmd[line.len()..].to_string())
    }
}

impl Validator for CommandHelper {}

/// Print one chat message with a role label.
pub fn show(role: Role, text: &str) {
    let label = format!("[{}]", role);
    let label = match role {
        Role::User => label.green(),
        Role::Assistant => label.bright_blue(),
        Role::Tool => label.bright_magenta(),
        Role::System => label.bright_black(),
    };
    println!("{}", label);
    for line in text.lines() {
        println!("{}", line);
    }
    println!();
}

pub fn show_error(text: &str) {
    eprintln!("{}", text.red());
    println!();
}

/// Read lines until EOF or `exit`, passing each non-empty line to `handle`.
pub fn run(banner: &str, complete_commands: bool, mut handle: impl FnMut(&str)) -> rustyline::Result<()> {
    let mut rl: Editor<CommandHelper, DefaultHistory> = Editor::new()?;
    if complete_commands {
        rl.set_helper(Some(CommandHelper::new()));
    }

    println!("{}", banner.bright_magenta().bold());
    println!("{}", "Type 'exit' or press CTRL-D to quit.".bright_black());
    println!();

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == "exit" || trimmed == "quit" {
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);
                handle(trimmed);
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'exit' to quit.".yellow());
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err),
        }
    }
    Ok(())
}
