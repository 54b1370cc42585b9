use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cubby::api::StoreClient;
use cubby::cli;
use cubby::config;

#[derive(Parser)]
#[command(name = "cubby")]
#[command(version, about = "Signed client for the Cubby object store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(long, global = true)]
    config: Option<String>,

    /// Profile to use from config
    #[arg(long, global = true)]
    profile: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Disable SSL certificate verification
    #[arg(long, global = true)]
    insecure: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Make a bucket
    Mb {
        /// Bucket name
        bucket: String,

        /// Succeed when the bucket already exists
        #[arg(long)]
        if_not_exists: bool,
    },

    /// Remove an empty bucket
    Rb {
        /// Bucket name
        bucket: String,
    },

    /// List buckets
    Buckets,

    /// List objects in a bucket
    Ls {
        /// Bucket name
        bucket: String,

        /// Key prefix filter
        #[arg(long)]
        prefix: Option<String>,

        /// Grouping delimiter (single character)
        #[arg(long)]
        delimiter: Option<String>,

        /// Maximum number of keys to return
        #[arg(long, default_value = "1000")]
        max_keys: u32,
    },

    /// Upload a file
    Put {
        /// Bucket name
        bucket: String,

        /// Object key
        key: String,

        /// Local file to upload
        file: PathBuf,
    },

    /// Download an object
    Get {
        /// Bucket name
        bucket: String,

        /// Object key
        key: String,

        /// Output file (stdout when omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Remove an object
    Rm {
        /// Bucket name
        bucket: String,

        /// Object key
        key: String,
    },

    /// Show object metadata
    Stat {
        /// Bucket name
        bucket: String,

        /// Object key
        key: String,
    },

    /// Mint a client-side presigned download link (no server round trip)
    Presign {
        /// Bucket name
        bucket: String,

        /// Object key
        key: String,

        /// HTTP method the link authorizes
        #[arg(long, default_value = "GET")]
        method: String,

        /// Link lifetime in seconds
        #[arg(long, default_value = "3600")]
        expires_in: i64,
    },

    /// Manage server-registered short download links
    Link {
        #[command(subcommand)]
        command: LinkCommands,
    },
}

#[derive(Subcommand)]
enum LinkCommands {
    /// Register a new link
    Create {
        /// Bucket name
        bucket: String,

        /// Object key
        key: String,

        /// HTTP method the link authorizes
        #[arg(long, default_value = "GET")]
        method: String,

        /// Link lifetime in seconds (omit for no expiry)
        #[arg(long)]
        expires_in: Option<i64>,

        /// Maximum downloads (omit for unlimited)
        #[arg(long)]
        max_downloads: Option<u32>,
    },

    /// Revoke a link by token
    Revoke {
        /// Link token
        token: String,
    },

    /// List registered links
    Ls,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Set insecure TLS if flag is set (before the transport is built)
    if cli.insecure {
        std::env::set_var("CUBBY_INSECURE_TLS", "true");
    }

    // Sequential request/response calls: current_thread is sufficient
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    let config = config::load_config(cli.config.as_deref(), cli.profile.as_deref())?;
    let profile = config
        .get_profile(cli.profile.as_deref())
        .context("No store profile configured")?;

    let client = StoreClient::new(profile.settings(), profile.credentials());

    match cli.command {
        Commands::Mb {
            bucket,
            if_not_exists,
        } => {
            cli::cmd_mb(&client, &bucket, if_not_exists).await?;
        }
        Commands::Rb { bucket } => {
            cli::cmd_rb(&client, &bucket).await?;
        }
        Commands::Buckets => {
            cli::cmd_buckets(&client).await?;
        }
        Commands::Ls {
            bucket,
            prefix,
            delimiter,
            max_keys,
        } => {
            cli::cmd_ls(&client, &bucket, prefix, delimiter, max_keys).await?;
        }
        Commands::Put { bucket, key, file } => {
            cli::cmd_put(&client, &bucket, &key, &file).await?;
        }
        Commands::Get {
            bucket,
            key,
            output,
        } => {
            cli::cmd_get(&client, &bucket, &key, output).await?;
        }
        Commands::Rm { bucket, key } => {
            cli::cmd_rm(&client, &bucket, &key).await?;
        }
        Commands::Stat { bucket, key } => {
            cli::cmd_stat(&client, &bucket, &key).await?;
        }
        Commands::Presign {
            bucket,
            key,
            method,
            expires_in,
        } => {
            cli::cmd_presign(&client, &bucket, &key, &method, expires_in)?;
        }
        Commands::Link { command } => match command {
            LinkCommands::Create {
                bucket,
                key,
                method,
                expires_in,
                max_downloads,
            } => {
                cli::cmd_link_create(&client, &bucket, &key, &method, expires_in, max_downloads)
                    .await?;
            }
            LinkCommands::Revoke { token } => {
                cli::cmd_link_revoke(&client, &token).await?;
            }
            LinkCommands::Ls => {
                cli::cmd_link_ls(&client).await?;
            }
        },
    }

    Ok(())
}
