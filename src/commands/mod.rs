pub mod dispatcher;
pub mod handler;
pub mod registry;

use crate::prompts::{KeyValueStore, SavedPromptStore};
use crate::session::SessionStore;
use crate::transport::{ModelCatalog, TemplateCatalog};
use std::path::PathBuf;

pub use dispatcher::{CommandDispatcher, create_command_registry};

pub type DynKeyValueStore = Box<dyn KeyValueStore + Send>;

/// Everything the slash commands can see and change.
pub struct ChatState {
    pub session: SessionStore,
    pub prompts: SavedPromptStore<DynKeyValueStore>,
    pub models: ModelCatalog,
    pub templates: TemplateCatalog,
    /// Prompt text waiting to be sent or saved.
    pub draft: Option<String>,
    /// Set by `/send`; the chat loop picks it up and performs the request.
    pub outbox: Option<String>,
    pub transcripts_dir: PathBuf,
    pub should_continue: bool,
}

impl ChatState {
    pub fn new(prompts: SavedPromptStore<DynKeyValueStore>, transcripts_dir: PathBuf) -> Self {
        Self {
            session: SessionStore::new(),
            prompts,
            models: ModelCatalog::default(),
            templates: TemplateCatalog::default(),
            draft: None,
            outbox: None,
            transcripts_dir,
            should_continue: true,
        }
    }

    /// The draft, if it holds anything but whitespace.
    pub fn draft_text(&self) -> Option<&str> {
        self.draft.as_deref().filter(|d| !d.trim().is_empty())
    }
}
