use super::{
    ChatState,
    handler::{
        ApplyCommand, ClearCommand, DraftCommand, ExportCommand, HelpCommand, HistoryCommand,
        ImportCommand, ModelCommand, ModelsCommand, ParamsCommand, PromptCommand, PromptsCommand,
        QuitCommand, ResetCommand, SearchCommand, SendCommand, TemplateCommand, TemplatesCommand,
    },
    registry::CommandRegistry,
};
use crate::core::AetherError;
use std::sync::Arc;

#[derive(Clone)]
pub struct CommandDispatcher {
    registry: Arc<CommandRegistry>,
}

impl CommandDispatcher {
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self { registry }
    }

    /// Runs a `/command args` line. `line` excludes the leading slash; the
    /// handler receives everything after the command name as typed.
    pub fn execute_line(
        &self,
        line: &str,
        state: &mut ChatState,
    ) -> Result<Option<String>, AetherError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        let (command, args) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        self.execute(command, args.trim(), state)
    }

    pub fn execute(
        &self,
        command: &str,
        args: &str,
        state: &mut ChatState,
    ) -> Result<Option<String>, AetherError> {
        self.registry.execute(command, args, state)
    }

    pub fn get_command_names(&self) -> Vec<String> {
        self.registry.get_command_names()
    }
}

pub fn create_command_registry() -> CommandDispatcher {
    let mut registry = CommandRegistry::new();

    registry.register("quit", QuitCommand);
    registry.register("clear", ClearCommand);
    registry.register("reset", ResetCommand);
    registry.register("model", ModelCommand);
    registry.register("models", ModelsCommand);
    registry.register("params", ParamsCommand);
    registry.register("templates", TemplatesCommand);
    registry.register("template", TemplateCommand);
    registry.register("apply", ApplyCommand);
    registry.register("draft", DraftCommand);
    registry.register("send", SendCommand);
    registry.register("prompts", PromptsCommand);
    registry.register("prompt", PromptCommand);
    registry.register("history", HistoryCommand);
    registry.register("search", SearchCommand);
    registry.register("export", ExportCommand);
    registry.register("import", ImportCommand);

    let mut lines = registry.help_lines();
    lines.push(HelpCommand::USAGE);
    lines.sort_unstable();
    registry.register("help", HelpCommand::new(lines));

    CommandDispatcher::new(Arc::new(registry))
}
