use super::ChatState;
use crate::core::{AetherError, ParameterUpdate};
use crate::display;
use crate::session::SessionAction;
use crate::template;
use crate::transcript;

use console::style;
use std::path::Path;

pub trait CommandHandler {
    fn execute(&self, state: &mut ChatState, args: &str) -> Result<Option<String>, AetherError>;
    fn help(&self) -> &'static str;
}

fn words(args: &str) -> Vec<&str> {
    args.split_whitespace().collect()
}

/// Splits off the first word; the remainder keeps its inner spacing.
fn split_first_word(args: &str) -> (&str, &str) {
    let args = args.trim();
    match args.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim()),
        None => (args, ""),
    }
}

pub struct QuitCommand;
pub struct HelpCommand {
    lines: Vec<&'static str>,
}
pub struct ClearCommand;
pub struct ResetCommand;
pub struct ModelCommand;
pub struct ModelsCommand;
pub struct ParamsCommand;
pub struct TemplatesCommand;
pub struct TemplateCommand;
pub struct ApplyCommand;
pub struct DraftCommand;
pub struct SendCommand;
pub struct PromptsCommand;
pub struct PromptCommand;
pub struct HistoryCommand;
pub struct SearchCommand;
pub struct ExportCommand;
pub struct ImportCommand;

impl CommandHandler for QuitCommand {
    fn execute(&self, state: &mut ChatState, _args: &str) -> Result<Option<String>, AetherError> {
        state.should_continue = false;
        Ok(None)
    }

    fn help(&self) -> &'static str {
        "/quit - Exit the chat session"
    }
}

impl HelpCommand {
    pub const USAGE: &'static str = "/help - Show available commands";

    pub fn new(lines: Vec<&'static str>) -> Self {
        Self { lines }
    }
}

impl CommandHandler for HelpCommand {
    fn execute(&self, _state: &mut ChatState, _args: &str) -> Result<Option<String>, AetherError> {
        let title = style("Available Commands").bold().underlined();
        let mut help_text = vec![title.to_string()];
        help_text.extend(self.lines.iter().map(|line| style(line).to_string()));
        help_text.push(
            style("Anything not starting with '/' is sent as a prompt.")
                .dim()
                .to_string(),
        );
        Ok(Some(help_text.join("\n")))
    }

    fn help(&self) -> &'static str {
        Self::USAGE
    }
}

impl CommandHandler for ClearCommand {
    fn execute(&self, state: &mut ChatState, _args: &str) -> Result<Option<String>, AetherError> {
        state.session.dispatch(SessionAction::ClearMessages);
        Ok(Some("Chat cleared.".to_string()))
    }

    fn help(&self) -> &'static str {
        "/clear - Clear the conversation, keeping model and parameters"
    }
}

impl CommandHandler for ResetCommand {
    fn execute(&self, state: &mut ChatState, _args: &str) -> Result<Option<String>, AetherError> {
        state.session.dispatch(SessionAction::ResetSession);
        state.draft = None;
        Ok(Some("Session reset to defaults.".to_string()))
    }

    fn help(&self) -> &'static str {
        "/reset - Reset model, parameters, template and conversation"
    }
}

impl CommandHandler for ModelCommand {
    fn execute(&self, state: &mut ChatState, args: &str) -> Result<Option<String>, AetherError> {
        let Some(id) = words(args).first().copied() else {
            return Ok(Some(match &state.session.state().selected_model {
                Some(model) => format!("Current model: {}", model),
                None => "No model selected. Use /models to list them.".to_string(),
            }));
        };

        if !state.models.models.is_empty() && state.models.find(id).is_none() {
            return Err(AetherError::Input(format!(
                "Unknown model: {} (see /models)",
                id
            )));
        }
        state.session.dispatch(SessionAction::SetModel(id.to_string()));
        Ok(Some(format!("Model changed to: {}", id)))
    }

    fn help(&self) -> &'static str {
        "/model [id] - Show or select the model"
    }
}

impl CommandHandler for ModelsCommand {
    fn execute(&self, state: &mut ChatState, _args: &str) -> Result<Option<String>, AetherError> {
        if state.models.models.is_empty() {
            return Ok(Some("No models available.".to_string()));
        }
        let selected = state.session.state().selected_model.as_deref();
        let lines: Vec<String> = state
            .models
            .models
            .iter()
            .map(|model| display::format_model(model, selected == Some(model.id.as_str())))
            .collect();
        Ok(Some(lines.join("\n")))
    }

    fn help(&self) -> &'static str {
        "/models - List available models"
    }
}

/// Builds a single-field update, enforcing the ranges offered to the user.
pub fn parameter_update(field: &str, value: &str) -> Result<ParameterUpdate, AetherError> {
    fn ranged(field: &str, value: &str, min: f64, max: f64) -> Result<f64, AetherError> {
        let parsed: f64 = value
            .parse()
            .map_err(|_| AetherError::Input(format!("{} expects a number, got '{}'", field, value)))?;
        if !(min..=max).contains(&parsed) {
            return Err(AetherError::Input(format!(
                "{} must be between {} and {}",
                field, min, max
            )));
        }
        Ok(parsed)
    }

    let mut update = ParameterUpdate::default();
    match field {
        "temperature" => update.temperature = Some(ranged(field, value, 0.0, 2.0)?),
        "max_tokens" | "maxTokens" => {
            let tokens: u32 = value.parse().map_err(|_| {
                AetherError::Input(format!("{} expects a whole number, got '{}'", field, value))
            })?;
            if !(1..=8192).contains(&tokens) {
                return Err(AetherError::Input(format!(
                    "{} must be between 1 and 8192",
                    field
                )));
            }
            update.max_tokens = Some(tokens);
        }
        "top_p" | "topP" => update.top_p = Some(ranged(field, value, 0.0, 1.0)?),
        "frequency_penalty" | "frequencyPenalty" => {
            update.frequency_penalty = Some(ranged(field, value, -2.0, 2.0)?)
        }
        "presence_penalty" | "presencePenalty" => {
            update.presence_penalty = Some(ranged(field, value, -2.0, 2.0)?)
        }
        other => {
            return Err(AetherError::Input(format!("Unknown parameter: {}", other)));
        }
    }
    Ok(update)
}

impl CommandHandler for ParamsCommand {
    fn execute(&self, state: &mut ChatState, args: &str) -> Result<Option<String>, AetherError> {
        match words(args)[..] {
            [] => Ok(Some(display::format_parameters(
                &state.session.state().parameters,
            ))),
            [field, value] => {
                let update = parameter_update(field, value)?;
                state.session.dispatch(SessionAction::UpdateParameters(update));
                Ok(Some(display::format_parameters(
                    &state.session.state().parameters,
                )))
            }
            _ => Err(AetherError::Input(
                "Usage: /params [name value]".to_string(),
            )),
        }
    }

    fn help(&self) -> &'static str {
        "/params [name value] - Show or change a generation parameter"
    }
}

impl CommandHandler for TemplatesCommand {
    fn execute(&self, state: &mut ChatState, _args: &str) -> Result<Option<String>, AetherError> {
        if state.templates.templates.is_empty() {
            return Ok(Some("No templates available.".to_string()));
        }
        let current = state.session.state().current_template.as_deref();
        let lines: Vec<String> = state
            .templates
            .templates
            .iter()
            .map(|t| display::format_template(t, current == Some(t.id.as_str())))
            .collect();
        Ok(Some(lines.join("\n")))
    }

    fn help(&self) -> &'static str {
        "/templates - List prompt templates"
    }
}

impl CommandHandler for TemplateCommand {
    fn execute(&self, state: &mut ChatState, args: &str) -> Result<Option<String>, AetherError> {
        match words(args)[..] {
            [] => {
                let Some(id) = state.session.state().current_template.clone() else {
                    return Ok(Some("No template selected.".to_string()));
                };
                match state.templates.find(&id) {
                    Some(t) => Ok(Some(display::format_template_form(t))),
                    None => Ok(Some(format!("Template {} is not in the catalog.", id))),
                }
            }
            ["clear"] => {
                state.session.dispatch(SessionAction::SetTemplate(None));
                Ok(Some("Template cleared.".to_string()))
            }
            [id] => {
                let Some(t) = state.templates.find(id).cloned() else {
                    return Err(AetherError::Input(format!(
                        "Unknown template: {} (see /templates)",
                        id
                    )));
                };
                state
                    .session
                    .dispatch(SessionAction::SetTemplate(Some(t.id.clone())));
                if t.parameters.is_empty() {
                    state.draft = Some(t.content.clone());
                    Ok(Some(format!("Loaded {} into the draft.", t.name)))
                } else {
                    Ok(Some(display::format_template_form(&t)))
                }
            }
            _ => Err(AetherError::Input(
                "Usage: /template [id|clear]".to_string(),
            )),
        }
    }

    fn help(&self) -> &'static str {
        "/template [id|clear] - Select, show or clear the active template"
    }
}

impl CommandHandler for ApplyCommand {
    fn execute(&self, state: &mut ChatState, args: &str) -> Result<Option<String>, AetherError> {
        let id = state
            .session
            .state()
            .current_template
            .clone()
            .ok_or_else(|| AetherError::Input("No template selected".to_string()))?;
        let t = state
            .templates
            .find(&id)
            .ok_or_else(|| AetherError::Input(format!("Template {} is not in the catalog", id)))?;

        let mut values = template::defaults(t);
        values.extend(template::parse_assignments(t, args)?);
        let rendered = template::render(t, &values);
        let mut output = format!("{}\n{}", style("Draft:").bold().cyan(), rendered);
        let unfilled = template::placeholders(&rendered);
        if !unfilled.is_empty() {
            output.push_str(&format!(
                "\n{}",
                style(format!("Unfilled placeholders: {}", unfilled.join(", "))).yellow()
            ));
        }
        state.draft = Some(rendered);
        Ok(Some(output))
    }

    fn help(&self) -> &'static str {
        "/apply [name=value...] - Render the active template into the draft"
    }
}

impl CommandHandler for DraftCommand {
    fn execute(&self, state: &mut ChatState, args: &str) -> Result<Option<String>, AetherError> {
        match args.trim() {
            "" => Ok(Some(match state.draft_text() {
                Some(draft) => draft.to_string(),
                None => "The draft is empty.".to_string(),
            })),
            "clear" => {
                state.draft = None;
                Ok(Some("Draft cleared.".to_string()))
            }
            text => {
                state.draft = Some(text.to_string());
                Ok(Some("Draft updated.".to_string()))
            }
        }
    }

    fn help(&self) -> &'static str {
        "/draft [text|clear] - Show, replace or clear the draft"
    }
}

impl CommandHandler for SendCommand {
    fn execute(&self, state: &mut ChatState, _args: &str) -> Result<Option<String>, AetherError> {
        let draft = state
            .draft_text()
            .ok_or_else(|| AetherError::Input("The draft is empty".to_string()))?
            .to_string();
        state.outbox = Some(draft);
        Ok(None)
    }

    fn help(&self) -> &'static str {
        "/send - Send the draft"
    }
}

impl CommandHandler for PromptsCommand {
    fn execute(&self, state: &mut ChatState, _args: &str) -> Result<Option<String>, AetherError> {
        if state.prompts.is_empty() {
            return Ok(Some("No saved prompts yet.".to_string()));
        }
        let lines: Vec<String> = state
            .prompts
            .list()
            .iter()
            .map(display::format_saved_prompt)
            .collect();
        Ok(Some(lines.join("\n")))
    }

    fn help(&self) -> &'static str {
        "/prompts - List saved prompts"
    }
}

impl CommandHandler for PromptCommand {
    fn execute(&self, state: &mut ChatState, args: &str) -> Result<Option<String>, AetherError> {
        let (action, rest) = split_first_word(args);
        match (action, rest) {
            ("save", rest) if !rest.is_empty() => {
                let (name, category) = rest.split_once('|').unwrap_or((rest, ""));
                let content = state.draft.clone().unwrap_or_default();
                match state.prompts.save(name, &content, category)? {
                    Some(saved) => Ok(Some(format!("Saved prompt {} ({}).", saved.name, saved.id))),
                    None => Ok(Some("Nothing saved: name and draft must not be blank.".to_string())),
                }
            }
            ("load", key) if !key.is_empty() => {
                let saved = state
                    .prompts
                    .find(key)
                    .ok_or_else(|| AetherError::Input(format!("No saved prompt: {}", key)))?;
                let message = format!("Loaded {} into the draft.", saved.name);
                state.draft = Some(saved.content.clone());
                Ok(Some(message))
            }
            ("delete", key) if !key.is_empty() => {
                let id = state
                    .prompts
                    .find(key)
                    .map(|p| p.id.clone())
                    .unwrap_or_else(|| key.to_string());
                if state.prompts.delete(&id)? {
                    Ok(Some("Prompt deleted.".to_string()))
                } else {
                    Ok(Some(format!("No saved prompt: {}", key)))
                }
            }
            _ => Err(AetherError::Input(
                "Usage: /prompt save <name> [| category] | load <id|name> | delete <id|name>"
                    .to_string(),
            )),
        }
    }

    fn help(&self) -> &'static str {
        "/prompt save <name> [| category] | load | delete - Manage saved prompts"
    }
}

impl CommandHandler for HistoryCommand {
    fn execute(&self, state: &mut ChatState, _args: &str) -> Result<Option<String>, AetherError> {
        let messages = &state.session.state().messages;
        if messages.is_empty() {
            return Ok(Some("No messages yet.".to_string()));
        }
        let lines: Vec<String> = messages
            .iter()
            .enumerate()
            .map(|(i, message)| display::format_message(message, i + 1))
            .collect();
        Ok(Some(lines.join("\n")))
    }

    fn help(&self) -> &'static str {
        "/history - Show the conversation"
    }
}

impl CommandHandler for SearchCommand {
    fn execute(&self, state: &mut ChatState, args: &str) -> Result<Option<String>, AetherError> {
        let query = args.trim();
        let total = state.session.state().messages.len();
        let matches = state.session.search(query);
        let mut lines: Vec<String> = matches
            .iter()
            .enumerate()
            .map(|(i, message)| display::format_message(message, i + 1))
            .collect();
        lines.push(
            style(format!("Showing {} of {} messages", matches.len(), total))
                .dim()
                .to_string(),
        );
        Ok(Some(lines.join("\n")))
    }

    fn help(&self) -> &'static str {
        "/search <text> - Find messages by content or role"
    }
}

impl CommandHandler for ExportCommand {
    fn execute(&self, state: &mut ChatState, args: &str) -> Result<Option<String>, AetherError> {
        let path = match Some(args.trim()).filter(|a| !a.is_empty()) {
            Some(path) => {
                let path = Path::new(path).to_path_buf();
                transcript::write_to(state.session.state(), &path)?;
                path
            }
            None => transcript::export(state.session.state(), &state.transcripts_dir)?,
        };
        Ok(Some(format!("Chat exported to: {}", path.display())))
    }

    fn help(&self) -> &'static str {
        "/export [file] - Export the conversation as JSON"
    }
}

impl CommandHandler for ImportCommand {
    fn execute(&self, state: &mut ChatState, args: &str) -> Result<Option<String>, AetherError> {
        let Some(path) = Some(args.trim()).filter(|a| !a.is_empty()) else {
            return Err(AetherError::Input("Please specify a file to import".to_string()));
        };
        let imported = transcript::read_file(Path::new(path))?;
        let count = transcript::import(&mut state.session, imported);
        Ok(Some(format!("Imported chat with {} messages", count)))
    }

    fn help(&self) -> &'static str {
        "/import <file> - Replace the conversation with an exported one"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{ChatState, DynKeyValueStore, create_command_registry};
    use crate::core::ChatMessage;
    use crate::prompts::{MemoryStore, SavedPromptStore};
    use crate::transport::{ModelCatalog, TemplateCatalog, mock};
    use tempfile::TempDir;

    fn chat_state(dir: &Path) -> ChatState {
        let storage: DynKeyValueStore = Box::new(MemoryStore::new());
        let mut state = ChatState::new(SavedPromptStore::open(storage), dir.join("transcripts"));
        let models = mock::builtin_models();
        let templates = mock::builtin_templates();
        state.models = ModelCatalog {
            total: models.len(),
            models,
        };
        state.templates = TemplateCatalog {
            total: templates.len(),
            templates,
        };
        state
    }

    #[test]
    fn model_selection_checks_the_catalog() {
        let temp_dir = TempDir::new().unwrap();
        let mut state = chat_state(temp_dir.path());
        let dispatcher = create_command_registry();

        assert!(dispatcher.execute_line("model nope", &mut state).is_err());
        dispatcher.execute_line("model gemini-pro", &mut state).unwrap();
        assert_eq!(
            state.session.state().selected_model.as_deref(),
            Some("gemini-pro")
        );
    }

    #[test]
    fn params_enforce_ranges_before_dispatch() {
        let temp_dir = TempDir::new().unwrap();
        let mut state = chat_state(temp_dir.path());
        let dispatcher = create_command_registry();

        dispatcher.execute_line("params temperature 1.2", &mut state).unwrap();
        dispatcher.execute_line("params maxTokens 500", &mut state).unwrap();
        assert!(dispatcher.execute_line("params top_p 1.5", &mut state).is_err());
        assert!(dispatcher.execute_line("params max_tokens 0", &mut state).is_err());
        assert!(dispatcher.execute_line("params bogus 1", &mut state).is_err());

        let params = state.session.state().parameters;
        assert_eq!(params.temperature, 1.2);
        assert_eq!(params.max_tokens, 500);
        assert_eq!(params.top_p, 1.0);
    }

    #[test]
    fn template_without_parameters_fills_the_draft() {
        let temp_dir = TempDir::new().unwrap();
        let mut state = chat_state(temp_dir.path());
        state.templates.templates.push(crate::core::PromptTemplate {
            id: "plain".into(),
            name: "Plain".into(),
            description: String::new(),
            category: "Misc".into(),
            content: "Just say hi".into(),
            parameters: vec![],
        });
        let dispatcher = create_command_registry();

        dispatcher.execute_line("template plain", &mut state).unwrap();
        assert_eq!(state.draft.as_deref(), Some("Just say hi"));
        assert_eq!(
            state.session.state().current_template.as_deref(),
            Some("plain")
        );
    }

    #[test]
    fn apply_renders_with_defaults_and_overrides() {
        let temp_dir = TempDir::new().unwrap();
        let mut state = chat_state(temp_dir.path());
        let dispatcher = create_command_registry();

        dispatcher.execute_line("template learning-tutor", &mut state).unwrap();
        assert!(state.draft.is_none());
        dispatcher
            .execute_line("apply subject=physics topic=entropy", &mut state)
            .unwrap();
        let draft = state.draft.clone().unwrap();
        assert!(draft.starts_with("Act as a tutor for physics. Explain entropy at a beginner level."));

        dispatcher.execute_line("template clear", &mut state).unwrap();
        assert!(dispatcher.execute_line("apply", &mut state).is_err());
    }

    #[test]
    fn apply_accepts_values_with_spaces() {
        let temp_dir = TempDir::new().unwrap();
        let mut state = chat_state(temp_dir.path());
        let dispatcher = create_command_registry();

        dispatcher
            .execute_line("template business-strategy", &mut state)
            .unwrap();
        dispatcher
            .execute_line("apply industry=retail challenge=declining sales", &mut state)
            .unwrap();
        let draft = state.draft.clone().unwrap();
        assert!(draft.contains("retail"));
        assert!(draft.contains("facing declining sales"));

        assert!(dispatcher.execute_line("apply declining sales", &mut state).is_err());
    }

    #[test]
    fn draft_keeps_text_as_typed() {
        let temp_dir = TempDir::new().unwrap();
        let mut state = chat_state(temp_dir.path());
        let dispatcher = create_command_registry();

        dispatcher
            .execute_line("draft line  with   gaps", &mut state)
            .unwrap();
        assert_eq!(state.draft.as_deref(), Some("line  with   gaps"));

        dispatcher.execute_line("prompt save Two words", &mut state).unwrap();
        dispatcher.execute_line("draft clear", &mut state).unwrap();
        dispatcher.execute_line("prompt load two words", &mut state).unwrap();
        assert_eq!(state.draft.as_deref(), Some("line  with   gaps"));
    }

    #[test]
    fn saved_prompts_use_the_draft() {
        let temp_dir = TempDir::new().unwrap();
        let mut state = chat_state(temp_dir.path());
        let dispatcher = create_command_registry();

        dispatcher.execute_line("prompt save empty", &mut state).unwrap();
        assert!(state.prompts.is_empty());

        state.draft = Some("Summarise this".into());
        dispatcher.execute_line("prompt save summary", &mut state).unwrap();
        dispatcher
            .execute_line("prompt save Weekly  summary | Writing Help", &mut state)
            .unwrap();
        assert_eq!(state.prompts.list()[0].name, "Weekly  summary");
        assert_eq!(state.prompts.list()[0].category, "Writing Help");
        assert_eq!(state.prompts.list()[1].category, "General");

        state.draft = None;
        dispatcher.execute_line("prompt load summary", &mut state).unwrap();
        assert_eq!(state.draft.as_deref(), Some("Summarise this"));

        dispatcher.execute_line("prompt delete summary", &mut state).unwrap();
        assert_eq!(state.prompts.len(), 1);
    }

    #[test]
    fn send_moves_the_draft_to_the_outbox() {
        let temp_dir = TempDir::new().unwrap();
        let mut state = chat_state(temp_dir.path());
        let dispatcher = create_command_registry();

        assert!(dispatcher.execute_line("send", &mut state).is_err());
        dispatcher.execute_line("draft hello there", &mut state).unwrap();
        dispatcher.execute_line("send", &mut state).unwrap();
        assert_eq!(state.outbox.as_deref(), Some("hello there"));
    }

    #[test]
    fn export_and_import_through_commands() {
        let temp_dir = TempDir::new().unwrap();
        let mut state = chat_state(temp_dir.path());
        let dispatcher = create_command_registry();
        state
            .session
            .dispatch(SessionAction::AddMessage(ChatMessage::user("remember me")));

        let path = temp_dir.path().join("chat.json");
        let path_arg = path.to_string_lossy().to_string();
        dispatcher
            .execute_line(&format!("export {}", path_arg), &mut state)
            .unwrap();
        dispatcher.execute_line("clear", &mut state).unwrap();
        assert!(state.session.state().messages.is_empty());

        let out = dispatcher
            .execute_line(&format!("import {}", path_arg), &mut state)
            .unwrap()
            .unwrap();
        assert_eq!(out, "Imported chat with 1 messages");
        assert_eq!(state.session.state().messages[0].content, "remember me");

        let exported = dispatcher.execute_line("export", &mut state).unwrap().unwrap();
        assert!(exported.contains("transcripts"));
    }

    #[test]
    fn help_lists_every_command() {
        let temp_dir = TempDir::new().unwrap();
        let mut state = chat_state(temp_dir.path());
        let dispatcher = create_command_registry();
        let help = dispatcher.execute_line("help", &mut state).unwrap().unwrap();
        for name in dispatcher.get_command_names() {
            assert!(help.contains(&format!("/{}", name)), "missing /{}", name);
        }
    }

    #[test]
    fn quit_and_unknown_commands() {
        let temp_dir = TempDir::new().unwrap();
        let mut state = chat_state(temp_dir.path());
        let dispatcher = create_command_registry();
        assert!(dispatcher.execute_line("frobnicate", &mut state).is_err());
        dispatcher.execute_line("quit", &mut state).unwrap();
        assert!(!state.should_continue);
    }
}
