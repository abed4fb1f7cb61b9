use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sakura_client::{ClientError, SakuraClient};
use sakura_core::sakura::CreateWorker;
use sakura_core::task::{TranslateRange, RANGE_END_SENTINEL};

#[derive(Parser, Debug)]
#[command(name = "sakura")]
#[command(about = "Manage Sakura translation jobs and workers", long_about = None)]
struct Cli {
    /// Server root URL.
    #[arg(long, global = true, env = "SAKURA_API_URL", default_value = "http://localhost:3000")]
    url: String,
    /// Bearer token. Anonymous when unset.
    #[arg(long, global = true, env = "SAKURA_TOKEN", hide_env_values = true)]
    token: Option<String>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print queued jobs and registered workers as JSON.
    Status,
    #[command(subcommand)]
    Job(JobCmd),
    #[command(subcommand)]
    Worker(WorkerCmd),
    /// List reported mistranslations (maintainers only).
    IncorrectCases {
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Subcommand, Debug)]
enum JobCmd {
    /// Queue a web novel.
    Web {
        provider_id: String,
        novel_id: String,
        /// First chapter index (inclusive).
        #[arg(long, default_value_t = 0)]
        start: u32,
        /// Last chapter index (exclusive).
        #[arg(long, default_value_t = RANGE_END_SENTINEL)]
        end: u32,
    },
    /// Queue a wenku volume.
    Wenku {
        novel_id: String,
        volume_id: String,
        #[arg(long, default_value_t = 0)]
        start: u32,
        #[arg(long, default_value_t = RANGE_END_SENTINEL)]
        end: u32,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum WorkerCmd {
    /// Register a worker; it starts stopped.
    Add {
        #[arg(long)]
        gpu: String,
        /// Sakura endpoint, e.g. http://10.0.0.2:8080
        #[arg(long)]
        endpoint: String,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        id: String,
    },
    Start {
        id: String,
    },
    Stop {
        id: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sakura_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut client = SakuraClient::new(&cli.url);
    if let Some(token) = cli.token {
        client = client.with_token(token);
    }

    match run(&client, cli.cmd).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(client: &SakuraClient, cmd: Cmd) -> Result<(), ClientError> {
    match cmd {
        Cmd::Status => {
            let status = client.get_status().await?;
            print_json(&status);
        }
        Cmd::Job(JobCmd::Web {
            provider_id,
            novel_id,
            start,
            end,
        }) => {
            let id = client
                .create_job_web_translate(&provider_id, &novel_id, TranslateRange::new(start, end))
                .await?;
            println!("{id}");
        }
        Cmd::Job(JobCmd::Wenku {
            novel_id,
            volume_id,
            start,
            end,
        }) => {
            let id = client
                .create_job_wenku_translate(&novel_id, &volume_id, TranslateRange::new(start, end))
                .await?;
            println!("{id}");
        }
        Cmd::Job(JobCmd::Delete { id }) => {
            client.delete_job(&id).await?;
            println!("deleted job {id}");
        }
        Cmd::Worker(WorkerCmd::Add {
            gpu,
            endpoint,
            description,
        }) => {
            let id = client
                .create_worker(&CreateWorker {
                    gpu,
                    endpoint,
                    description,
                })
                .await?;
            println!("{id}");
        }
        Cmd::Worker(WorkerCmd::Delete { id }) => {
            client.delete_worker(&id).await?;
            println!("deleted worker {id}");
        }
        Cmd::Worker(WorkerCmd::Start { id }) => {
            client.start_worker(&id).await?;
            println!("started worker {id}");
        }
        Cmd::Worker(WorkerCmd::Stop { id }) => {
            client.stop_worker(&id).await?;
            println!("stopped worker {id}");
        }
        Cmd::IncorrectCases { limit } => {
            let cases = client.list_incorrect_cases(limit).await?;
            print_json(&cases);
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("error: cannot render response: {e}"),
    }
}
