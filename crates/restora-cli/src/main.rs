//! Restora CLI — client for the Restora file-restoration service.
//!
//! Set RESTORA_API_URL (or API_URL) and RESTORA_STORE_URL. The access token
//! is persisted under RESTORA_TOKEN_PATH (default: ~/.restora/token).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;

use restora_api_client::{
    ApiClient, FileTokenStore, JobHistory, SessionGuard, SessionHandle, UploadPipeline,
    UploadStage,
};
use restora_cli::{content_type_for_ext, fit_column, init_tracing};
use restora_core::routes::{Route, RouteDecision};
use restora_core::{Config, LoginRequest, RegisterRequest, SelectedFile, Session};

#[derive(Parser)]
#[command(name = "restora", about = "Restora file-restoration CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and sign in
    Register {
        /// Display name for the new account
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in and persist the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Drop the persisted session token
    Logout,
    /// Show the signed-in identity
    Whoami {
        /// Print the session as JSON
        #[arg(long)]
        json: bool,
    },
    /// Upload a degraded image for restoration
    Upload {
        /// Path to the image file
        file: PathBuf,
    },
    /// List restoration jobs, newest first
    Jobs {
        /// 1-indexed page of the job history
        #[arg(long, default_value = "1")]
        page: u32,
        /// Print the raw page as JSON
        #[arg(long)]
        json: bool,
    },
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

/// Route gate for protected commands: either an active session or the CLI
/// equivalent of the redirect to login.
fn require_session(guard: &SessionGuard, route: Route) -> anyhow::Result<Session> {
    match guard.resolve_route(route) {
        RouteDecision::Allow => guard.current_session().context("No active session"),
        RouteDecision::RedirectToLogin => {
            anyhow::bail!("You are signed out. Run `restora login` to sign in.")
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to read configuration")?;

    let sessions = SessionHandle::new(Box::new(FileTokenStore::new(config.token_path.clone())));
    let client = Arc::new(ApiClient::new(&config, sessions.clone())?);
    let guard = SessionGuard::new(client.clone(), sessions);
    guard.initialize();

    match cli.command {
        Commands::Register {
            name,
            email,
            password,
        } => {
            let session = guard
                .register(&RegisterRequest {
                    user_name: name,
                    email,
                    password,
                })
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!("Welcome, {} <{}>.", session.display_name, session.email);
        }
        Commands::Login { email, password } => {
            let session = guard
                .login(&LoginRequest { email, password })
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            println!(
                "Signed in as {} <{}> until {}.",
                session.display_name,
                session.email,
                session.expires_at.format("%Y-%m-%d %H:%M UTC")
            );
        }
        Commands::Logout => {
            guard.logout();
            println!("Signed out.");
        }
        Commands::Whoami { json } => {
            let session = require_session(&guard, Route::Dashboard)?;
            if json {
                print_json(&session)?;
            } else {
                println!(
                    "{} <{}> (subject {}), session expires {}",
                    session.display_name,
                    session.email,
                    session.subject_id,
                    session.expires_at.format("%Y-%m-%d %H:%M UTC")
                );
            }
        }
        Commands::Upload { file } => {
            require_session(&guard, Route::Upload)?;
            run_upload(client, &file).await?;
        }
        Commands::Jobs { page, json } => {
            require_session(&guard, Route::JobHistory)?;
            run_jobs(client, page, json).await?;
        }
    }

    Ok(())
}

async fn run_upload(client: Arc<ApiClient>, path: &PathBuf) -> anyhow::Result<()> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .context("File path has no usable name")?;

    let mut selected = SelectedFile::from_bytes(name, "application/octet-stream", bytes);
    selected.content_type = content_type_for_ext(selected.extension().as_deref()).to_string();
    let size_bytes = selected.size_bytes;

    let pipeline = UploadPipeline::new(client);
    pipeline.select_files(vec![selected]);
    println!("Restoring: {} ({} bytes)", name, size_bytes);

    match pipeline.upload().await {
        Ok(()) => {
            let view = pipeline.snapshot();
            match view.stage {
                UploadStage::Accepted => {
                    println!("Job accepted! Track its status with `restora jobs`.");
                    pipeline.acknowledge();
                    Ok(())
                }
                stage => anyhow::bail!("Upload ended in unexpected stage: {}", stage),
            }
        }
        Err(err) if err.is_auth_rejection() => {
            anyhow::bail!("Your session has expired. Please sign in again.")
        }
        Err(_) => {
            let view = pipeline.snapshot();
            let message = view
                .error
                .unwrap_or_else(|| "Unexpected error during upload. Please try again.".to_string());
            anyhow::bail!("Upload failed: {}", message)
        }
    }
}

async fn run_jobs(client: Arc<ApiClient>, page: u32, json: bool) -> anyhow::Result<()> {
    let history = JobHistory::new(client);
    if let Err(err) = history.fetch_page(page.max(1)).await {
        if err.is_auth_rejection() {
            anyhow::bail!("Your session has expired. Please sign in again.");
        }
    }

    let view = history.snapshot();
    if let Some(error) = view.error {
        anyhow::bail!(error);
    }

    if json {
        return print_json(&json!({
            "data": view.jobs,
            "page": view.page,
            "lastPage": view.total_pages,
        }));
    }

    if view.jobs.is_empty() {
        println!("No jobs found.");
    } else {
        println!("{:<5} {:<34} {:<12} {}", "#", "IMAGE", "STATUS", "CREATED");
        for (index, job) in view.jobs.iter().enumerate() {
            let row = (view.page - 1) * restora_core::JOB_PAGE_SIZE + index as u32 + 1;
            println!(
                "{:<5} {:<34} {:<12} {}",
                row,
                fit_column(&job.image_name, 34),
                job.status.to_string(),
                job.created_at.format("%Y-%m-%d %H:%M")
            );
        }
    }
    println!("Page {} of {}", view.page, view.total_pages);
    Ok(())
}
