use crate::config::BackendKind;
use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Prompt to send. Piped stdin is attached as context.
    pub query: Option<String>,

    /// Start an interactive chat session
    #[arg(short, long)]
    pub chat: bool,

    /// Model id to select at startup
    #[arg(short, long)]
    pub model: Option<String>,

    /// Backend to talk to (overrides the config file)
    #[arg(short, long, value_enum)]
    pub backend: Option<BackendKind>,

    /// Base URL of the HTTP backend
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// Template id to render as the prompt
    #[arg(short, long)]
    pub template: Option<String>,

    /// Template value as name=value (repeatable)
    #[arg(short = 'p', long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Log filter implied by `-v`, if any was given.
    pub fn log_level(&self) -> Option<&'static str> {
        match self.verbose {
            0 => None,
            1 => Some("info"),
            2 => Some("debug"),
            _ => Some("trace"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_one_shot_template_invocation() {
        let args = Args::parse_from([
            "aether",
            "--template",
            "code-review",
            "-p",
            "language=rust",
            "--param",
            "code=fn main() {}",
            "-b",
            "http",
            "-vv",
        ]);
        assert!(!args.chat);
        assert_eq!(args.template.as_deref(), Some("code-review"));
        assert_eq!(args.params, ["language=rust", "code=fn main() {}"]);
        assert_eq!(args.backend, Some(BackendKind::Http));
        assert_eq!(args.log_level(), Some("debug"));
    }

    #[test]
    fn chat_mode_without_query() {
        let args = Args::parse_from(["aether", "-c", "-m", "gpt-4"]);
        assert!(args.chat);
        assert!(args.query.is_none());
        assert_eq!(args.model.as_deref(), Some("gpt-4"));
        assert_eq!(args.log_level(), None);
    }
}
