pub mod error;
pub mod types;

pub use error::AetherError;
pub use types::{
    AIModel, ChatMessage, ModelParameters, ParameterKind, ParameterUpdate, PromptTemplate, Role,
    TemplateParameter,
};
