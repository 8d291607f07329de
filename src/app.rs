use crate::cli::Args;
use crate::commands::{ChatState, DynKeyValueStore, dispatcher::CommandDispatcher};
use crate::config::Config;
use crate::core::{AetherError, ChatMessage};
use crate::display;
use crate::input;
use crate::prompts::SavedPromptStore;
use crate::session::{Outcome, RequestTracker, SessionAction};
use crate::template;
use crate::transport::{Backend, Catalog, ChatTransport, ModelCatalog, TemplateCatalog};
use is_terminal::IsTerminal;
use std::io::{self, Read};

pub struct Application {
    pub args: Args,
    pub config: Config,
    pub backend: Box<dyn Backend>,
    pub command_dispatcher: CommandDispatcher,
    state: ChatState,
    tracker: RequestTracker,
}

impl Application {
    pub fn new(
        args: Args,
        config: Config,
        backend: Box<dyn Backend>,
        command_dispatcher: CommandDispatcher,
        prompts: SavedPromptStore<DynKeyValueStore>,
    ) -> Self {
        let state = ChatState::new(prompts, config.transcripts_dir());
        Self {
            args,
            config,
            backend,
            command_dispatcher,
            state,
            tracker: RequestTracker::new(),
        }
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    pub async fn run(&mut self) -> Result<(), AetherError> {
        let context = if !std::io::stdin().is_terminal() {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| AetherError::Input(format!("Failed to read from stdin: {}", e)))?;
            Some(buffer)
        } else {
            None
        };

        self.load_catalogs().await;
        self.select_initial_model();

        if self.args.chat {
            self.handle_continuous_chat_mode(context).await
        } else {
            self.handle_chat_mode(context).await
        }
    }

    /// Fetches both catalogs concurrently. A failed catalog is left empty.
    pub async fn load_catalogs(&mut self) {
        let (models, templates) = futures::join!(self.backend.models(), self.backend.templates());

        self.state.models = models.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load models");
            display::display_error(&format!("Could not load models: {}", e));
            ModelCatalog::default()
        });
        self.state.templates = templates.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load templates");
            display::display_error(&format!("Could not load templates: {}", e));
            TemplateCatalog::default()
        });
        tracing::info!(
            models = self.state.models.total,
            templates = self.state.templates.total,
            "catalogs loaded"
        );
    }

    /// `--model`, then the configured default. One-shot mode falls back to the
    /// first catalog entry so a bare query always has somewhere to go.
    fn select_initial_model(&mut self) {
        let chosen = self
            .args
            .model
            .clone()
            .or_else(|| self.config.default_model.clone())
            .or_else(|| {
                (!self.args.chat)
                    .then(|| self.state.models.models.first().map(|m| m.id.clone()))
                    .flatten()
            });

        if let Some(model) = chosen {
            if !self.state.models.models.is_empty() && self.state.models.find(&model).is_none() {
                tracing::warn!(model = %model, "model is not in the catalog");
            }
            self.state.session.dispatch(SessionAction::SetModel(model));
        }
    }

    /// Performs one round trip for `prompt`.
    ///
    /// `Ok(None)` means the reply arrived after the conversation was cleared
    /// and was dropped.
    pub async fn send_prompt(&mut self, prompt: &str) -> Result<Option<ChatMessage>, AetherError> {
        let (ticket, request) = self.tracker.begin(&self.state.session, prompt)?;
        let result = self.backend.send(&request).await;
        match self.tracker.settle(ticket, result, &mut self.state.session)? {
            Outcome::Delivered => Ok(self.state.session.state().messages.last().cloned()),
            Outcome::Discarded | Outcome::Failed => Ok(None),
        }
    }

    /// Sends from the chat loop. On failure the prompt stays in the draft so
    /// `/send` can retry it.
    async fn submit(&mut self, prompt: String) {
        display::display_notice("Thinking...");
        match self.send_prompt(&prompt).await {
            Ok(Some(reply)) => {
                if self.state.draft.as_deref() == Some(prompt.as_str()) {
                    self.state.draft = None;
                }
                display::display_reply(&reply);
            }
            Ok(None) => {
                display::display_notice("Reply dropped: the conversation changed while it was pending.");
            }
            Err(e) => {
                display::display_error(&e.to_string());
                if !prompt.trim().is_empty() {
                    self.state.draft = Some(prompt);
                    display::display_notice("Prompt kept in the draft. Use /send to retry.");
                }
            }
        }
    }

    async fn handle_continuous_chat_mode(
        &mut self,
        context: Option<String>,
    ) -> Result<(), AetherError> {
        if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
            self.state.draft = Some(context);
        }

        display::display_banner(
            self.state.session.state().selected_model.as_deref(),
            &format!("{:?}", self.config.backend).to_lowercase(),
        );
        if self.state.draft.is_some() {
            display::display_notice("Piped input loaded into the draft. Use /draft to view, /send to send.");
        }

        let history_path = self.config.input_history_path();
        let mut editor = input::create_editor(self.command_dispatcher.clone(), &history_path)?;

        loop {
            let line = match input::read_input(&mut editor)? {
                Some(line) => line.trim().to_string(),
                None => break,
            };

            if line.is_empty() {
                continue;
            }

            if let Some(command_line) = line.strip_prefix('/') {
                match self
                    .command_dispatcher
                    .execute_line(command_line, &mut self.state)
                {
                    Ok(Some(output)) => println!("{}", output),
                    Ok(None) => {}
                    Err(e) => display::display_error(&e.to_string()),
                }

                if !self.state.should_continue {
                    break;
                }
                if let Some(outgoing) = self.state.outbox.take() {
                    self.submit(outgoing).await;
                }
                continue;
            }

            self.submit(line).await;
        }

        input::save_history(&mut editor, &history_path)?;

        Ok(())
    }

    async fn handle_chat_mode(&mut self, context: Option<String>) -> Result<(), AetherError> {
        let rendered = self.render_template_arg()?;
        let prompt = compose_prompt(rendered.as_deref(), self.args.query.as_deref(), context.as_deref())?;

        let reply = self
            .send_prompt(&prompt)
            .await?
            .ok_or_else(|| AetherError::Api("No reply received".to_string()))?;

        if display::looks_like_markdown(&reply.content) {
            display::display_markdown(&reply.content);
        } else {
            display::display_response(&reply.content);
        }

        Ok(())
    }

    /// Renders `--template` with its defaults overridden by `--param` values.
    fn render_template_arg(&mut self) -> Result<Option<String>, AetherError> {
        let Some(id) = self.args.template.clone() else {
            if !self.args.params.is_empty() {
                return Err(AetherError::Input(
                    "--param requires --template".to_string(),
                ));
            }
            return Ok(None);
        };

        let t = self
            .state
            .templates
            .find(&id)
            .cloned()
            .ok_or_else(|| AetherError::Input(format!("Unknown template: {}", id)))?;

        let mut values = template::defaults(&t);
        values.extend(template::parse_values(self.args.params.iter().map(String::as_str))?);
        self.state
            .session
            .dispatch(SessionAction::SetTemplate(Some(t.id.clone())));
        Ok(Some(template::render(&t, &values)))
    }
}

/// Joins the rendered template and the query, with piped input wrapped in a
/// `<context>` block ahead of them.
pub fn compose_prompt(
    rendered: Option<&str>,
    query: Option<&str>,
    context: Option<&str>,
) -> Result<String, AetherError> {
    let body: Vec<&str> = [rendered, query]
        .into_iter()
        .flatten()
        .filter(|part| !part.trim().is_empty())
        .collect();
    let context = context.filter(|c| !c.trim().is_empty());

    match (context, body.is_empty()) {
        (Some(ctx), false) => Ok(format!("<context>{}</context>\n\n{}", ctx, body.join("\n\n"))),
        (Some(ctx), true) => Ok(format!("<context>{}</context>", ctx)),
        (None, false) => Ok(body.join("\n\n")),
        (None, true) => Err(AetherError::Input("No query provided".to_string())),
    }
}
