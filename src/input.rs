use crate::commands::dispatcher::CommandDispatcher;
use crate::core::AetherError;

use console::style;
use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::{Highlighter, MatchingBracketHighlighter};
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::history::FileHistory;
use rustyline::validate::{self, Validator};
use rustyline::{CompletionType, Config, Context, EditMode, Editor, Helper};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Completes `/command` names, and file paths for everything else
/// (`/import` and `/export` take paths).
pub struct PromptCompleter {
    filename_completer: FilenameCompleter,
    commands: CommandDispatcher,
}

impl PromptCompleter {
    pub fn new(commands: CommandDispatcher) -> Self {
        Self {
            filename_completer: FilenameCompleter::new(),
            commands,
        }
    }
}

impl Completer for PromptCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        if let Some(command_part) = line.get(1..pos).filter(|_| line.starts_with('/')) {
            if !command_part.contains(' ') {
                let matches: Vec<Pair> = self
                    .commands
                    .get_command_names()
                    .into_iter()
                    .filter(|cmd| cmd.starts_with(command_part))
                    .map(|cmd| Pair {
                        display: cmd.clone(),
                        replacement: cmd,
                    })
                    .collect();
                return Ok((1, matches));
            }
        }

        self.filename_completer.complete(line, pos, ctx)
    }
}

pub struct PromptHelper {
    completer: PromptCompleter,
    highlighter: MatchingBracketHighlighter,
    hinter: HistoryHinter,
}

impl PromptHelper {
    pub fn new(commands: CommandDispatcher) -> Self {
        Self {
            completer: PromptCompleter::new(commands),
            highlighter: MatchingBracketHighlighter::new(),
            hinter: HistoryHinter::new(),
        }
    }
}

impl Helper for PromptHelper {}

impl Completer for PromptHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        self.completer.complete(line, pos, ctx)
    }
}

impl Hinter for PromptHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<String> {
        self.hinter.hint(line, pos, ctx)
    }
}

impl Highlighter for PromptHelper {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        self.highlighter.highlight(line, pos)
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Owned(style(hint).dim().to_string())
    }
}

impl Validator for PromptHelper {
    fn validate(
        &self,
        _ctx: &mut validate::ValidationContext,
    ) -> rustyline::Result<validate::ValidationResult> {
        Ok(validate::ValidationResult::Valid(None))
    }
}

pub type PromptEditor = Editor<PromptHelper, FileHistory>;

/// Creates a configured rustyline editor and loads its history.
pub fn create_editor(
    commands: CommandDispatcher,
    history_path: &Path,
) -> Result<PromptEditor, AetherError> {
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .edit_mode(EditMode::Emacs)
        .build();

    let mut editor = Editor::with_config(config)
        .map_err(|e| AetherError::Input(format!("Failed to create line editor: {}", e)))?;
    editor.set_helper(Some(PromptHelper::new(commands)));

    if let Err(e) = editor.load_history(history_path) {
        tracing::debug!(path = %history_path.display(), error = %e, "no input history loaded");
    }

    Ok(editor)
}

/// Reads one line. `None` means the user asked to leave (Ctrl-C / Ctrl-D).
pub fn read_input(editor: &mut PromptEditor) -> Result<Option<String>, AetherError> {
    let prompt = if cfg!(windows) && std::env::var("PSModulePath").is_ok() {
        "> ".to_string()
    } else {
        style("> ").bold().cyan().to_string()
    };
    match editor.readline(&prompt) {
        Ok(line) => {
            if !line.trim().is_empty() {
                editor
                    .add_history_entry(&line)
                    .map_err(|e| AetherError::Input(format!("Failed to add history entry: {}", e)))?;
            }
            Ok(Some(line))
        }
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
            println!("Exiting...");
            Ok(None)
        }
        Err(err) => Err(AetherError::Input(format!("Input error: {}", err))),
    }
}

pub fn save_history(editor: &mut PromptEditor, history_path: &PathBuf) -> Result<(), AetherError> {
    if let Some(parent) = history_path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    editor
        .save_history(history_path)
        .map_err(|e| AetherError::Input(format!("Failed to save history: {}", e)))
}
