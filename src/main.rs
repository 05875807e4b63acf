use clap::Parser;
use price_advisor::utils::error::{AdvisorError, ErrorSeverity};
use price_advisor::utils::{logger, validation::Validate};
use price_advisor::{build_session, AppConfig, CliConfig};

fn exit_with(e: &AdvisorError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    let config = match AppConfig::resolve(&cli) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };
    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    tracing::debug!(
        "Source: {} at {} (ranking {:?}, max {}), model: {}",
        config.source.kind.as_str(),
        config.source.endpoint,
        config.source.ranking,
        config.source.max_results,
        config.model.name
    );
    if config.model.api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; recommendations will be unavailable");
    }

    let session = match build_session(&config) {
        Ok(session) => session,
        Err(e) => exit_with(&e),
    };

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();

    match cli.query() {
        Some(query) => {
            session.handle_query(&query, &mut stdout, &mut stderr).await?;
        }
        None => {
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            session
                .run_interactive(input, &mut stdout, &mut stderr)
                .await?;
        }
    }

    Ok(())
}
