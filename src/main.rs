use aether::app::Application;
use aether::cli::Args;
use aether::commands::{DynKeyValueStore, create_command_registry};
use aether::config::Config;
use aether::core::AetherError;
use aether::display;
use aether::prompts::{FileStore, SavedPromptStore};
use aether::transport::BackendFactory;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn init_logging(args: &Args, config: &Config) {
    // RUST_LOG wins, then -v, then the config file
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(args.log_level().unwrap_or(config.log_level.as_str()))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> Result<(), AetherError> {
    let mut config = Config::load()?;
    init_logging(&args, &config);

    if let Some(backend) = args.backend {
        config.backend = backend;
    }
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = Some(endpoint.clone());
    }
    tracing::info!(backend = ?config.backend, endpoint = config.endpoint(), "starting aether");

    let backend = BackendFactory::new().create(&config)?;
    let file_store = FileStore::new(config.data_dir());
    tracing::debug!(dir = %file_store.dir().display(), "saved prompts location");
    let storage: DynKeyValueStore = Box::new(file_store);
    let prompts = SavedPromptStore::open(storage);
    let command_dispatcher = create_command_registry();

    let mut app = Application::new(args, config, backend, command_dispatcher, prompts);
    app.run().await
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if let Err(e) = run(args).await {
        display::display_error(&e.to_string());
        std::process::exit(1);
    }
}
