/*
[INPUT]:  CLI arguments, YAML configuration file, TASKDESK_* env, OS shutdown signals
[OUTPUT]: One task operation run against the API, resulting snapshot printed as JSON
[POS]:    Binary entry point
[UPDATE]: When changing CLI commands, startup flow, or shutdown handling
*/

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use console::style;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use taskdesk_adapter::{NotificationSocket, TaskFields, TaskId, NEW_TASK_ID};
use taskdesk_client::{
    ClientSettings, NotificationWaiter, PhotoSource, TaskService, TaskState, TaskStore,
    TracingNotices,
};

#[derive(Parser, Debug)]
#[command(name = "taskdesk", version, about = "Task desk command line client")]
struct Cli {
    #[arg(long = "config", value_name = "PATH", global = true)]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info", global = true)]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a task together with the customer and user lists
    Show { task_id: String },
    /// Create a task, or update it when --id names a saved one
    Save(SaveArgs),
    #[command(subcommand)]
    Comment(CommentCommand),
    #[command(subcommand)]
    Photos(PhotoCommand),
    /// List customers
    Customers,
    /// List users
    Users,
    /// Block until the hub reports completion of a request
    Wait {
        correlation_id: String,
        /// Overrides waiter.timeout_secs; 0 waits forever
        #[arg(long = "timeout-secs")]
        timeout_secs: Option<u64>,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Args, Debug)]
struct SaveArgs {
    #[arg(long, default_value = NEW_TASK_ID)]
    id: String,
    #[arg(long = "user-id")]
    user_id: String,
    #[arg(long, default_value = "")]
    title: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value = "")]
    location: String,
    #[arg(long, default_value = taskdesk_adapter::DEFAULT_TASK_STATUS)]
    status: String,
    #[arg(long = "customer-id", default_value = "")]
    customer_id: String,
}

#[derive(Subcommand, Debug)]
enum CommentCommand {
    /// Add a comment to a task
    Add { task_id: String, text: String },
    /// Delete a comment from a task
    Delete { task_id: String, comment_id: String },
}

#[derive(Subcommand, Debug)]
enum PhotoCommand {
    /// Upload image files to a task
    Add {
        task_id: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Drop a photo from the loaded task (not sent to the server)
    Remove { task_id: String, photo_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(&args.log_level)?;

    let settings = ClientSettings::load(args.config_path.as_deref()).context("load config")?;
    info!(
        api_base_url = %settings.api_base_url,
        notification_url = %settings.notification_url,
        "configuration loaded"
    );

    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    match args.command {
        Command::Config => {
            print!("{}", settings.to_redacted_yaml()?);
            Ok(())
        }
        Command::Wait {
            correlation_id,
            timeout_secs,
        } => wait(&settings, &correlation_id, timeout_secs, &shutdown).await,
        command => {
            let gateway = Arc::new(settings.build_client()?);
            let store = TaskStore::new();
            let service = TaskService::new(store.clone(), gateway, Arc::new(TracingNotices))
                .with_dismiss_label(settings.notices.dismiss_label.clone())
                .with_cancellation(shutdown.clone());

            let heading = run(&service, command).await?;

            if shutdown.is_cancelled() {
                warn!("interrupted; snapshot may be incomplete");
            }
            print_snapshot(heading, &store.snapshot())
        }
    }
}

async fn run(service: &TaskService, command: Command) -> Result<&'static str> {
    let heading = match command {
        Command::Show { task_id } => {
            let task_id = TaskId::new(task_id);
            tokio::join!(
                service.load_customers(),
                service.load_users(),
                service.load_task(&task_id),
            );
            "Task"
        }
        Command::Save(save) => {
            service.load_task(&TaskId::new(save.id)).await;
            let fields = TaskFields {
                title: save.title,
                description: save.description,
                location: save.location,
                status: save.status,
                customer_id: save.customer_id,
            };
            service.save_task(&fields, &save.user_id).await;
            "Saved task"
        }
        Command::Comment(CommentCommand::Add { task_id, text }) => {
            service.load_task(&TaskId::new(task_id)).await;
            service.add_task_comment(&text).await;
            "Comments"
        }
        Command::Comment(CommentCommand::Delete {
            task_id,
            comment_id,
        }) => {
            service.load_task(&TaskId::new(task_id)).await;
            service.delete_task_comment(&comment_id).await;
            "Comments"
        }
        Command::Photos(PhotoCommand::Add { task_id, files }) => {
            service.load_task(&TaskId::new(task_id)).await;
            let sources: Vec<PhotoSource> = files.into_iter().map(PhotoSource::file).collect();
            service.add_task_photos(&sources).await;
            "Photos"
        }
        Command::Photos(PhotoCommand::Remove { task_id, photo_id }) => {
            service.load_task(&TaskId::new(task_id)).await;
            let photo = service
                .snapshot()
                .task
                .as_ref()
                .and_then(|task| task.photos.iter().find(|photo| photo.id == photo_id))
                .cloned();
            match photo {
                Some(photo) => service.remove_task_photo(&photo),
                None => bail!("photo {photo_id} is not attached to the task"),
            }
            "Photos"
        }
        Command::Customers => {
            service.load_customers().await;
            "Customers"
        }
        Command::Users => {
            service.load_users().await;
            "Users"
        }
        Command::Wait { .. } | Command::Config => bail!("command does not operate on a task"),
    };
    Ok(heading)
}

async fn wait(
    settings: &ClientSettings,
    correlation_id: &str,
    timeout_secs: Option<u64>,
    shutdown: &CancellationToken,
) -> Result<()> {
    let timeout = match timeout_secs {
        Some(0) => None,
        Some(secs) => Some(std::time::Duration::from_secs(secs)),
        None => settings.waiter_timeout(),
    };
    let waiter = NotificationWaiter::new(
        Arc::new(NotificationSocket::new(settings.notification_url.clone())),
        Arc::new(TracingNotices),
    )
    .with_timeout(timeout)
    .with_dismiss_label(settings.notices.dismiss_label.clone());

    info!(correlation_id, "waiting for notification");
    let outcome = waiter.wait_for_id_until(correlation_id, shutdown).await;
    waiter.shutdown();

    let result_id = outcome.with_context(|| format!("wait for {correlation_id}"))?;
    println!("{} {}", style("Result:").bold().green(), style(&result_id).cyan());
    Ok(())
}

fn print_snapshot(heading: &str, state: &TaskState) -> Result<()> {
    let json = serde_json::to_string_pretty(state).context("serialize snapshot")?;
    println!("{}", style(heading).bold().cyan());
    println!("{json}");
    Ok(())
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(())
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
