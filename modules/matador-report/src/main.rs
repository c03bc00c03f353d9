use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use matador_common::{
    CompetitorMode, Config, ManualCompetitor, PersonaMode, ServiceStyle, CUISINE_CATALOG,
};
use matador_report::{
    PgReportStore, ReportDeps, ReportForm, ReportGenerator, ReportOutput, ReportRequest,
    ReportStore,
};

#[derive(Parser)]
#[command(name = "matador", about = "Local audience, competitor and whitespace reports")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a report for 1-5 ZIP codes
    Generate(GenerateArgs),
    /// List the service styles and cuisines the form accepts
    Styles,
    /// List saved reports for a user, or print one by id
    Reports {
        #[arg(long, default_value = "local")]
        user: String,
        #[arg(long)]
        id: Option<Uuid>,
    },
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Comma-separated ZIP codes, e.g. "90210, 10001"
    #[arg(long)]
    zips: String,
    #[arg(long, default_value = "")]
    notes: String,
    /// Service style (repeatable), e.g. "Café" or "qsr"
    #[arg(long = "style")]
    styles: Vec<String>,
    /// Cuisine keyword (repeatable)
    #[arg(long = "cuisine")]
    cuisines: Vec<String>,
    /// Manual competitor "Name" or "Name=https://site" (repeatable, max 3).
    /// When given, the places search is skipped.
    #[arg(long = "manual")]
    manual: Vec<ManualCompetitor>,
    #[arg(long, default_value = "combined")]
    mode: PersonaMode,
    /// Drop discovered competitors whose style isn't selected
    #[arg(long)]
    filter_styles: bool,
    #[arg(long, value_enum, default_value_t = Format::Markdown)]
    format: Format,
    #[arg(long, default_value = "local")]
    user: String,
    /// Persist the report (requires DATABASE_URL)
    #[arg(long)]
    save: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Markdown,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("matador=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Generate(args) => generate(args).await,
        Command::Styles => {
            println!("Service styles:");
            for style in ServiceStyle::ALL {
                println!("  {}", style.label());
            }
            println!("\nCuisines:");
            for cuisine in CUISINE_CATALOG {
                println!("  {cuisine}");
            }
            Ok(())
        }
        Command::Reports { user, id } => reports(&user, id).await,
    }
}

async fn generate(args: GenerateArgs) -> Result<()> {
    let competitor_mode = if args.manual.is_empty() {
        CompetitorMode::Auto
    } else {
        CompetitorMode::Manual
    };
    let form = ReportForm {
        zip_codes: args.zips,
        notes: args.notes,
        service_styles: args.styles,
        cuisines: args.cuisines,
        competitor_mode,
        manual_competitors: args.manual,
        persona_mode: args.mode,
        filter_by_style: args.filter_styles,
    };

    // Input errors are reported before any configuration is required.
    let request = match ReportRequest::from_form(form) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("⚠️ {e}");
            std::process::exit(2);
        }
    };

    let config = Config::from_env()?;
    config.log_redacted();

    let generator = ReportGenerator::new(ReportDeps::from_config(&config)?);
    let output = generator.run(request).await;

    if args.save {
        save(&config, &output, &args.user).await;
    }

    match args.format {
        Format::Markdown => print_panels(&output),
        Format::Json => println!("{}", serde_json::to_string_pretty(&output)?),
    }
    Ok(())
}

/// Persistence failures are logged; the report is still printed.
async fn save(config: &Config, output: &ReportOutput, user: &str) {
    let Some(url) = config.database_url.as_deref() else {
        warn!("DATABASE_URL not set, report not saved");
        return;
    };

    let report = output.to_report(user);
    let result = async {
        let store = PgReportStore::connect(url).await?;
        store.migrate().await?;
        store.insert(&report).await
    }
    .await;

    match result {
        Ok(()) => info!(id = %report.id, "Report saved"),
        Err(e) => warn!(error = %e, "Failed to save report"),
    }
}

fn print_panels(output: &ReportOutput) {
    println!("# Patrons\n\n{}\n", output.panels.patrons);
    println!("# Competition\n\n{}\n", output.panels.competition);
    println!("# White Space\n\n{}", output.panels.whitespace);
}

async fn reports(user: &str, id: Option<Uuid>) -> Result<()> {
    let url =
        Config::database_url_from_env().context("DATABASE_URL is required to read reports")?;
    let store = PgReportStore::connect(&url).await?;
    store.migrate().await?;

    match id {
        Some(id) => match store.get(id).await? {
            Some(report) => println!("{}", serde_json::to_string_pretty(&report)?),
            None => println!("No report with id {id}"),
        },
        None => {
            let reports = store.list_for_user(user).await?;
            if reports.is_empty() {
                println!("No saved reports for {user}");
            }
            for report in reports {
                println!(
                    "{}  {}  {}",
                    report.id,
                    report.generated_at.format("%Y-%m-%d %H:%M"),
                    report.zip_codes.join(", ")
                );
            }
        }
    }
    Ok(())
}
