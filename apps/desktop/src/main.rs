use std::{io::Write, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    AppState, ArtifactSource, ClearOutcome, ClientEvent, ClientOptions, ErrorKind, ScreeningClient,
    UploadArtifact, UploadStatus,
};
use shared::domain::{CandidateRecord, FitBand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod config;

use config::load_settings;

#[derive(Parser, Debug)]
#[command(name = "screening", about = "Drive the resume screening service from a terminal")]
struct Args {
    /// Overrides the server url from screening.toml and the environment.
    #[arg(long, global = true)]
    server_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show session, configuration, upload and results summary.
    Status,
    /// Check that the screening API answers.
    Health,
    /// Print the address that starts the sign-in flow.
    Login,
    /// Show the screening configuration, or save a new one.
    Config {
        #[arg(long)]
        job_position: Option<String>,
        #[arg(long = "subject")]
        subjects: Vec<String>,
    },
    /// Upload a PDF job description.
    Upload { path: PathBuf },
    /// Run screening over the matching mailbox messages.
    Run,
    /// List screening results, or show one candidate in full.
    Results {
        #[arg(long)]
        detail: Option<usize>,
    },
    /// Delete every screening result.
    Clear {
        #[arg(long)]
        yes: bool,
    },
    /// Sign out and reset local state.
    Logout,
}

impl Command {
    fn needs_session(&self) -> bool {
        !matches!(self, Command::Health | Command::Login | Command::Logout)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    let server_url = settings.validated_server_url()?;
    let options = ClientOptions {
        timings: settings.timings(),
    };
    let client = ScreeningClient::connect(server_url.as_str(), options)
        .with_context(|| format!("failed to build client for {server_url}"))?;

    if args.command.needs_session() && !client.probe().await {
        let state = client.state();
        if let Some(error) = state.page_error {
            bail!(error);
        }
        println!("Not signed in. Open {} in a browser to sign in.", client.login_url());
        return Ok(());
    }

    match args.command {
        Command::Health => {
            if !client.check_server().await {
                bail!(page_error(&client.state()));
            }
            println!("Screening API at {server_url} is reachable.");
        }
        Command::Login => println!("Open {} in a browser to sign in.", client.login_url()),
        Command::Logout => println!("{}", client.logout().await),
        Command::Status => print_status(&client.state()),
        Command::Config {
            job_position,
            subjects,
        } => configure(&client, job_position, subjects).await?,
        Command::Upload { path } => upload(&client, path).await?,
        Command::Run => run(&client).await?,
        Command::Results { detail } => show_results(&client, detail)?,
        Command::Clear { yes } => clear(&client, yes).await?,
    }
    Ok(())
}

fn page_error(state: &AppState) -> String {
    state
        .page_error
        .clone()
        .unwrap_or_else(|| "request failed".to_string())
}

async fn configure(
    client: &Arc<ScreeningClient>,
    job_position: Option<String>,
    subjects: Vec<String>,
) -> Result<()> {
    if job_position.is_none() && subjects.is_empty() {
        print_config(&client.state());
        return Ok(());
    }

    if let Some(job_position) = job_position {
        client.set_job_position(job_position);
    }
    if !subjects.is_empty() {
        let existing = client.state().config.email_subjects.len();
        for index in (1..existing).rev() {
            client.remove_subject(index);
        }
        for (index, subject) in subjects.into_iter().enumerate() {
            if index > 0 {
                client.add_subject();
            }
            client.update_subject(index, subject);
        }
    }

    let outcome = client.save_config().await;
    let state = client.state();
    if let Some(status) = &state.config_status {
        println!("{status}");
    }
    outcome?;
    print_config(&state);
    Ok(())
}

async fn upload(client: &ScreeningClient, path: PathBuf) -> Result<()> {
    let artifact = UploadArtifact::from_path(&path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    client.select_artifact(ArtifactSource::Picker, artifact)?;

    let outcome = client.upload_job_description().await;
    if let Some(message) = client.state().upload_status.message() {
        println!("{message}");
    }
    outcome?;
    Ok(())
}

async fn run(client: &Arc<ScreeningClient>) -> Result<()> {
    let mut events = client.subscribe_events();
    println!("Screening in progress, this may take a while...");

    match client.start_screening().await {
        Ok(message) => {
            println!("{message}");
            tokio::time::sleep(client.options().timings.refresh_delay + Duration::from_millis(250))
                .await;
            let state = client.state();
            if let Some(status) = &state.screening_status {
                println!("{status}");
            }
            print_results(&state.results.records);
            Ok(())
        }
        Err(err) if err.kind() == Some(ErrorKind::Unauthorized) => {
            if let Some(status) = client.state().screening_status {
                println!("{status}");
            }
            let wait = client.options().timings.redirect_delay + Duration::from_secs(1);
            let deadline = tokio::time::Instant::now() + wait;
            while let Ok(Ok(event)) = tokio::time::timeout_at(deadline, events.recv()).await {
                if let ClientEvent::NavigateToLogin { url } = event {
                    println!("Open {url} in a browser to sign in again.");
                    break;
                }
            }
            Err(err.into())
        }
        Err(err) => Err(err.into()),
    }
}

fn show_results(client: &ScreeningClient, detail: Option<usize>) -> Result<()> {
    let Some(index) = detail else {
        let state = client.state();
        print_summary(&state);
        print_results(&state.results.records);
        return Ok(());
    };

    if !client.focus_candidate_at(index) {
        bail!("no candidate at position {index}");
    }
    if let Some(record) = client.focused_candidate() {
        print_candidate(&record);
    }
    client.clear_focus();
    Ok(())
}

async fn clear(client: &ScreeningClient, yes: bool) -> Result<()> {
    let confirmed = yes || ask(client_core::CLEAR_PROMPT).await?;
    let decision = move |_: &str| confirmed;

    match client.clear_results(&decision).await {
        Ok(ClearOutcome::Cancelled) => println!("Nothing deleted."),
        Ok(ClearOutcome::Cleared { message }) => println!("{message}"),
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

async fn ask(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("failed to read confirmation")?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_status(state: &AppState) {
    println!("Signed in: {}", state.session.authenticated);
    print_config(state);
    match &state.upload_status {
        UploadStatus::Succeeded(message) => println!("Job description: {message}"),
        UploadStatus::Failed(message) => println!("Job description: failed ({message})"),
        UploadStatus::Idle | UploadStatus::Uploading => println!("Job description: not uploaded"),
    }
    print_summary(state);
}

fn print_config(state: &AppState) {
    let config = &state.config;
    let position = if config.job_position.is_empty() {
        "-"
    } else {
        &config.job_position
    };
    println!("Job position: {position}");
    println!("Email subjects: {}", config.email_subjects.persistable().join(", "));
    println!("Saved: {}", config.saved);
    if !state.spreadsheet_name().is_empty() {
        println!("Spreadsheet: {}", state.spreadsheet_name());
    }
    if !config.spreadsheet_url.is_empty() {
        println!("Spreadsheet url: {}", config.spreadsheet_url);
    }
}

fn print_summary(state: &AppState) {
    let summary = state.summary();
    println!(
        "Candidates: {} (high {}, medium {}, low {}), average fit {}%",
        summary.count, summary.high, summary.medium, summary.low, summary.average_fit
    );
}

fn print_results(records: &[CandidateRecord]) {
    if records.is_empty() {
        println!("No screening results yet.");
        return;
    }
    for (index, record) in records.iter().enumerate() {
        let date = record
            .recorded_date()
            .map(|date| date.to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{index:>3}  {:<28} {:>3}% {:<6} {:<30} {}",
            record.name,
            record.overall_fit,
            band_label(record.fit_band()),
            record.contact_email().unwrap_or("-"),
            date
        );
    }
}

fn print_candidate(record: &CandidateRecord) {
    println!("{} ({}% {})", record.name, record.overall_fit, band_label(record.fit_band()));
    println!("Email: {}", record.contact_email().unwrap_or("-"));
    println!("Phone: {}", record.contact_phone().unwrap_or("-"));
    println!("Education: {}", record.education);
    println!("Strengths: {}", record.strengths);
    println!("Weaknesses: {}", record.weaknesses);
    println!("Risk factors: {}", record.risk_factors);
    println!("Reward factors: {}", record.reward_factors);
    println!("Justification: {}", record.justification);
    println!("Resume: {}", record.resume_link().unwrap_or("not available"));
    if let Some(at) = record.recorded_at() {
        println!("Screened at: {}", at.format("%Y-%m-%d %H:%M:%S"));
    }
}

fn band_label(band: FitBand) -> &'static str {
    match band {
        FitBand::High => "high",
        FitBand::Medium => "medium",
        FitBand::Low => "low",
    }
}
