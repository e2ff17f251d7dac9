use app::{AppBuilder, AppDirs};
use clap::Parser;
use color_eyre::Result;
use scribe::{
    cli::{Cli, Cmd},
    config::{Config, Scribe},
    errors,
    scribe::App,
    services,
};
use tracing::info;

#[tokio::main]
pub async fn main() -> Result<()> {
    let cli = Cli::parse();
    let dirs = AppDirs::resolve::<Scribe>();
    errors::init(&dirs)?;

    let mut config = Config::load(&dirs)?;
    config.apply_overrides(&cli.cmd);

    let interactive = matches!(cli.cmd, Cmd::Run { .. });
    let ctx = AppBuilder::<Scribe>::new(env!("CARGO_PKG_VERSION"))
        .console_logging(!interactive)
        .log_filter(config.log_filter.clone())
        .dirs(AppDirs::from_parts(
            Some(config.config_dir.clone()),
            Some(config.data_dir.clone()),
            None,
        ))
        .build()?;

    match cli.cmd {
        Cmd::Run { offline, .. } => {
            let service = services::connect(&config.service, offline)?;
            let mut app = App::new(config, service);
            app.run().await?;
        }
        Cmd::Fields { offline } => {
            let service = services::connect(&config.service, offline)?;
            let descriptors = service.fetch_field_config().await?;
            println!("{}", serde_json::to_string_pretty(&descriptors)?);
        }
        Cmd::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    info!(version = ctx.version(), log = ?ctx.log_file(), "scribe finished");
    Ok(())
}
