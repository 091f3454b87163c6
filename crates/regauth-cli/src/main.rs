use clap::{Args, Parser, Subcommand};
use regauth_core::config::{CONFIG_ENV, DEFAULT_CONFIG_FILE};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "regauth", version, about = "Registry token authentication service")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug, Clone)]
struct ConfigArgs {
    /// Path to the configuration file
    #[arg(long, env = CONFIG_ENV, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the token endpoint.
    Serve {
        #[command(flatten)]
        config: ConfigArgs,

        /// Override server.listen_addr (host:port)
        #[arg(long)]
        listen: Option<String>,
    },

    /// Token operations (mint/inspect)
    Token {
        #[command(subcommand)]
        cmd: TokenCommand,
    },

    /// Signing key management
    Keys {
        #[command(subcommand)]
        cmd: KeysCommand,
    },

    /// Validate the configuration and load the signing key.
    Check {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Issue a token locally, granting exactly the requested actions.
    Mint {
        /// Scope to grant, e.g. repository:library/alpine:pull,push
        #[arg(long)]
        scope: String,

        /// Subject of the token. Defaults to the scope name.
        #[arg(long)]
        account: Option<String>,

        /// Audience of the token. Defaults to token.audience from the config.
        #[arg(long)]
        service: Option<String>,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Decode a token (or a file containing one) without verifying it.
    Inspect {
        token: String,
    },
}

#[derive(Subcommand, Debug)]
enum KeysCommand {
    /// Generate a self-signed ECDSA P-256 certificate and key for development.
    Generate {
        /// Directory to write the files to
        #[arg(long)]
        output: PathBuf,

        /// File stem for NAME.crt and NAME.key
        #[arg(long, default_value = "token")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so command output stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Serve { config, listen } => commands::serve::run(&config.config, listen).await?,

        Command::Token { cmd } => match cmd {
            TokenCommand::Mint {
                scope,
                account,
                service,
                config,
            } => commands::token::mint(&config.config, &scope, account, service).await?,
            TokenCommand::Inspect { token } => commands::token::inspect(token)?,
        },

        Command::Keys { cmd } => match cmd {
            KeysCommand::Generate { output, name } => {
                commands::keys::generate(&output, &name)?;
            }
        },

        Command::Check { config } => commands::check::run(&config.config)?,
    }

    Ok(())
}
