use crate::commands::handler::CommandHandler;
use crate::core::AetherError;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Default)]
pub struct CommandRegistry {
    handlers: BTreeMap<String, Arc<dyn CommandHandler + Send + Sync>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<C: CommandHandler + Send + Sync + 'static>(&mut self, name: &str, command: C) {
        self.handlers.insert(name.to_string(), Arc::new(command));
    }

    pub fn execute(
        &self,
        name: &str,
        args: &str,
        state: &mut super::ChatState,
    ) -> Result<Option<String>, AetherError> {
        self.handlers
            .get(name)
            .ok_or_else(|| AetherError::Input(format!("Unknown command: {}", name)))
            .and_then(|handler| handler.execute(state, args))
    }

    /// Registered names in alphabetical order.
    pub fn get_command_names(&self) -> Vec<String> {
        self.handlers.keys().cloned().collect()
    }

    /// One usage line per command, alphabetical.
    pub fn help_lines(&self) -> Vec<&'static str> {
        self.handlers.values().map(|handler| handler.help()).collect()
    }
}
