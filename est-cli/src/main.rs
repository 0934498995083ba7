use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use est::{ClientConfig, EsClient, Protocol, RangeMapping};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "est")]
#[command(about = "est CLI - query Elasticsearch with SQL-like conditions")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct ConnectionArgs {
    /// TOML config file; flags below override its values
    #[arg(short, long, env = "EST_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[arg(long, env = "EST_HOST", global = true)]
    host: Option<String>,

    #[arg(long, env = "EST_PORT", global = true)]
    port: Option<u16>,

    /// http or https
    #[arg(long, env = "EST_PROTOCOL", global = true)]
    protocol: Option<String>,

    #[arg(short, long, env = "EST_USER", global = true)]
    user: Option<String>,

    #[arg(short, long, env = "EST_PASSWORD", global = true, hide_env_values = true)]
    password: Option<String>,

    /// Compile `>` as `gte`, `>=` as `gt` (and likewise for `<`/`<=`)
    #[arg(long, global = true)]
    legacy_ranges: bool,

    /// Skip malformed conditions instead of failing
    #[arg(long, global = true)]
    lenient: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search an index
    Find {
        table: String,

        /// Condition with `?` placeholders, e.g. "age>=? AND status=?"
        #[arg(short = 'w', long = "where")]
        condition: Option<String>,

        /// Value bound to the next placeholder (repeatable)
        #[arg(short, long = "arg")]
        args: Vec<String>,

        /// 1-based page; output becomes a paging envelope
        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        page_size: Option<u32>,

        /// Sort as field:asc or field:desc
        #[arg(long)]
        sort: Option<String>,
    },

    /// Fetch one document by id
    Get { table: String, id: String },

    /// Index a JSON document
    Add {
        table: String,
        /// Document body as JSON
        document: String,
        /// Store under this id instead of a generated one
        #[arg(long)]
        id: Option<String>,
    },

    /// Partially update a document
    Save {
        table: String,
        id: String,
        /// Fields to merge, as JSON
        document: String,
    },

    /// Delete a document by id
    Delete { table: String, id: String },

    /// Increment a numeric field
    Incr {
        table: String,
        id: String,
        field: String,
        #[arg(default_value = "1")]
        value: f64,
    },

    /// Decrement a numeric field
    Decr {
        table: String,
        id: String,
        field: String,
        #[arg(default_value = "1")]
        value: f64,
    },
}

fn build_config(args: &ConnectionArgs) -> Result<ClientConfig> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::load_from(path)?,
        None => ClientConfig::default(),
    };

    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(protocol) = &args.protocol {
        config.protocol = protocol.parse::<Protocol>()?;
    }
    if let Some(user) = &args.user {
        config.user = Some(user.clone());
    }
    if let Some(password) = &args.password {
        config.password = Some(password.clone());
    }
    if args.legacy_ranges {
        config.range_mapping = RangeMapping::Legacy;
    }
    if args.lenient {
        config.strict_conditions = false;
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli.connection)?;
    tracing::debug!("Connecting to {}", config.base_url());
    let client = EsClient::new(config)?;

    match cli.command {
        Commands::Find {
            table,
            condition,
            args,
            page,
            page_size,
            sort,
        } => {
            let opts = commands::FindOptions {
                condition,
                args,
                page,
                page_size,
                sort,
            };
            commands::run_find(&client, &table, opts).await?;
        }
        Commands::Get { table, id } => commands::run_get(&client, &table, &id).await?,
        Commands::Add {
            table,
            document,
            id,
        } => commands::run_add(&client, &table, id.as_deref(), &document).await?,
        Commands::Save {
            table,
            id,
            document,
        } => commands::run_save(&client, &table, &id, &document).await?,
        Commands::Delete { table, id } => commands::run_delete(&client, &table, &id).await?,
        Commands::Incr {
            table,
            id,
            field,
            value,
        } => commands::run_increment(&client, &table, &id, &field, value).await?,
        Commands::Decr {
            table,
            id,
            field,
            value,
        } => commands::run_decrement(&client, &table, &id, &field, value).await?,
    }

    Ok(())
}
