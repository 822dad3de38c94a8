mod app;
mod commands;
mod platform;
mod repl;
mod router;
mod terminal_output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use app::App;
use terminal_output::{note_success, render_table, Column};

#[derive(Parser)]
#[command(name = "patto")]
#[command(about = "Patto: chat command framework console runner")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive console session (reads BOT_TOKEN, CLIENT_ID, ...)
    Run {
        /// Override COMMAND_PREFIX
        #[arg(short, long)]
        prefix: Option<String>,
    },
    /// Print the application command schema that would be published
    Schema,
    /// List loaded commands
    Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { prefix } => {
            let config = patto_config::BotConfig::from_env()?;
            patto_logging::init_logger(config.log_dir.as_ref(), &config.log_level);
            patto_config::log_summary(&config);

            let prefix = prefix.unwrap_or_else(|| config.prefix.clone());
            let app = App::build(&prefix, config.text_commands_enabled())?;
            app.register_commands().await?;
            note_success(&format!("Bot ready with prefix `{prefix}`"));

            repl::run(&app).await?;
            app.shutdown().await;
        }
        Commands::Schema => {
            patto_logging::init_logger(None::<&str>, "warn");
            let app = App::build(patto_config::DEFAULT_PREFIX, true)?;
            app.register_commands().await?;
            let schemas: Vec<_> = app.platform.published().into_iter().map(|c| c.schema).collect();
            println!("{}", serde_json::to_string_pretty(&schemas)?);
        }
        Commands::Commands => {
            patto_logging::init_logger(None::<&str>, "warn");
            let app = App::build(patto_config::DEFAULT_PREFIX, true)?;
            let registry = app.router.dispatcher().registry();
            let rows: Vec<Vec<String>> = registry
                .entries()
                .iter()
                .map(|e| {
                    vec![
                        e.descriptor.name.clone(),
                        e.descriptor.category.to_string(),
                        e.descriptor.aliases.join(", "),
                        e.source_path.clone(),
                    ]
                })
                .collect();
            let columns = [
                Column::left("Command"),
                Column::left("Category"),
                Column::left("Aliases"),
                Column::left("Source"),
            ];
            print!("{}", render_table(&columns, &rows));
            println!("\n{} commands loaded", registry.len());
        }
    }

    Ok(())
}
