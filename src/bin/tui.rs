// Binary entry point for the terminal calendar.
use anyhow::{Context, Result, anyhow};
use gcal_tui::cli::{self, Command};
use gcal_tui::client::GoogleProvider;
use gcal_tui::client::auth::{self, ClientSecret};
use gcal_tui::client::core::build_https_client;
use gcal_tui::client::manager::list_all_calendars;
use gcal_tui::config::Config;
use gcal_tui::context::{AppContext, StandardContext, expand_home};
use gcal_tui::model::ViewKind;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = match cli::parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Run 'gcal-tui --help' for usage.");
            std::process::exit(2);
        }
    };

    if cli.command == Command::Help {
        cli::print_help("gcal-tui");
        return Ok(());
    }

    let ctx: Arc<dyn AppContext> = Arc::new(StandardContext::new(cli.root.clone()));

    let cfg = match Config::load(ctx.as_ref()) {
        Ok(c) => c,
        Err(e) => {
            // Syntax or validation problems are reported as-is; only a
            // missing file gets the starter template.
            if !Config::is_missing_config_error(&e) {
                eprintln!("Error loading configuration:\n{}", e);
                std::process::exit(1);
            }
            let path = Config::write_template(ctx.as_ref())?;
            println!("No configuration file found. A starter config was written to:");
            println!("    {}", path);
            println!("Add your accounts and calendars there, then run gcal-tui again.");
            return Ok(());
        }
    };

    if let Err(e) = gcal_tui::logging::init(ctx.as_ref(), cfg.log_level_filter()) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let provider = Arc::new(GoogleProvider::new());

    match cli.command {
        Command::Week { offset } => gcal_tui::tui::run(provider, cfg, ViewKind::Week, offset).await,
        Command::Today { offset } => gcal_tui::tui::run(provider, cfg, ViewKind::Day, offset).await,
        Command::NextMeeting => gcal_tui::tui::run_next_meeting(provider, cfg).await,
        Command::Calendars => {
            let mut failed = false;
            for (account, listed) in list_all_calendars(&provider, &cfg.accounts).await {
                println!("{}:", account);
                match listed {
                    Ok(cals) => {
                        for cal in cals {
                            println!("    {:<50} {}", cal.id, cal.summary);
                        }
                    }
                    Err(e) => {
                        failed = true;
                        eprintln!("    {}", e);
                    }
                }
            }
            if failed {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Auth {
            account,
            client_secret,
        } => run_auth(&cfg, &account, &client_secret).await,
        Command::Help => Ok(()),
    }
}

/// Prints the consent URL, reads the code back from stdin and writes the
/// account's token file.
async fn run_auth(cfg: &Config, account: &str, client_secret: &Path) -> Result<()> {
    let acc = cfg
        .accounts
        .iter()
        .find(|a| a.name == account)
        .ok_or_else(|| anyhow!("no account named '{}' in the config", account))?;
    let token_path = auth::credentials_path(&acc.credentials)?;
    let secret = ClientSecret::load(&expand_home(&client_secret.to_string_lossy())?)?;

    println!("Open this link in your browser and grant access:");
    println!();
    println!("    {}", secret.consent_url()?);
    println!();
    println!("Then paste the authorization code (or the whole address you were sent to):");

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read the authorization code")?;
    let code = auth::code_from_input(&line).ok_or_else(|| anyhow!("no authorization code given"))?;

    auth::authorize(&build_https_client(), &secret, &code, &token_path).await?;
    println!("Saved credential file to: {}", token_path.display());
    Ok(())
}
