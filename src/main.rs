use acrobot::cli::{Cli, Commands, ConfigAction};
use acrobot::config::{validate_config, validate_config_object, Config};
use acrobot::dispatch::Dispatcher;
use acrobot::store::Store;
use acrobot::{channels, logging};
use clap::Parser;
use tracing::{info, warn};

fn open_store(config: &Config) -> anyhow::Result<Store> {
    Ok(Store::open(&config.database_path(), &config.database)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    logging::init(cli.log_json);

    match cli.command {
        Commands::Run(opts) => {
            info!("Starting Acrobot");
            let config = Config::load(opts.config.as_deref())?;
            validate_config_object(&config)?;
            let dispatcher = Dispatcher::new(open_store(&config)?, &config);
            channels::run(&config, dispatcher).await?;
        }
        Commands::Exec(opts) => {
            let config = Config::load(opts.config.as_deref())?;
            validate_config_object(&config)?;
            let dispatcher = Dispatcher::new(open_store(&config)?, &config);
            let reply = dispatcher.handle(&opts.command_text()?).await;
            println!("{}", reply.text);
            if !reply.is_success() {
                std::process::exit(1);
            }
        }
        Commands::InitDb(opts) => {
            let config = Config::load(opts.config.as_deref())?;
            let store = open_store(&config)?;
            info!(
                db = %config.database_path().display(),
                keys = store.key_count()?,
                "Database ready"
            );
        }
        Commands::Doctor(opts) => {
            let config = Config::load(opts.config.as_deref())?;
            for problem in validate_config(&config) {
                warn!("{problem}");
            }
            let store = open_store(&config)?;
            let consistent = store.verify_index()?;
            println!("database: {}", config.database_path().display());
            println!("keys: {}", store.key_count()?);
            println!(
                "search index: {}",
                if consistent { "ok" } else { "out of sync" }
            );
            if !consistent {
                std::process::exit(1);
            }
        }
        Commands::Config(opts) => match opts.action {
            ConfigAction::Init => {
                Config::write_default(opts.config.as_deref().unwrap_or("acrobot.json"))?;
                info!("Configuration file created");
            }
            ConfigAction::Show => {
                let config = Config::load(opts.config.as_deref())?;
                println!("{}", serde_json::to_string_pretty(&config.redacted())?);
            }
            ConfigAction::Validate => {
                let config = Config::load(opts.config.as_deref())?;
                validate_config_object(&config)?;
                info!("Configuration is valid");
            }
        },
        Commands::Version => {
            println!("acrobot {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
