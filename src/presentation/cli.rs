use crate::application::config_store::ConfigStoreExt;
use crate::infrastructure::config::{DEBUG_KEY, LayeredConfig, VERBOSE_KEY};
use crate::infrastructure::http_client::HyperHttpClient;
use crate::infrastructure::logging::Logging;
use crate::presentation::interactive;
use crate::presentation::session::Session;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// CLI configuration for hurlsh
#[derive(Parser, Debug)]
#[command(name = "hurlsh", version)]
#[command(
    about = "hurlsh: send HTTP requests to named service connections",
    long_about = None
)]
pub struct Cli {
    /// Config file location (default is hurlsh.{yaml,yml,json,toml} in . or ~)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub flags: GlobalFlags,

    #[command(subcommand)]
    pub command: Command,
}

/// Flags accepted by every command, on the command line and at the prompt.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalFlags {
    /// Describe what is happening as it's happening
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Describe details about what's happening
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Print output as plain JSON for easy scripting
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Use the named connection (names defined in config file)
    #[arg(short, long, global = true, value_name = "NAME")]
    pub connection: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a command interpreter where the current connection persists between commands
    Interactive,

    #[command(flatten)]
    Shared(SharedCommand),
}

/// Commands available both on the command line and at the interactive prompt.
#[derive(Subcommand, Debug)]
pub enum SharedCommand {
    /// Print version
    Version,

    /// Display the configuration as set by file, environment and flags
    Config,

    /// Display the global flags and their current settings
    Flags,

    /// Send requests to the current connection with HTTP verbs
    Http {
        #[command(subcommand)]
        verb: HttpCommand,
    },

    /// List things
    List {
        #[command(subcommand)]
        target: ListTarget,
    },

    /// Describe things in detail
    Describe {
        #[command(subcommand)]
        target: DescribeTarget,
    },

    /// Change settings
    Set {
        #[command(subcommand)]
        target: SetTarget,
    },
}

#[derive(Subcommand, Debug)]
pub enum HttpCommand {
    /// HTTP GET <path>
    #[command(alias = "GET")]
    Get {
        path: String,

        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },

    /// HTTP POST <path>; trailing words are joined into the JSON body
    #[command(alias = "POST")]
    Post {
        path: String,

        body: Vec<String>,

        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },

    /// HTTP DELETE <path>; trailing words are joined into the JSON body
    #[command(alias = "DELETE")]
    Delete {
        path: String,

        body: Vec<String>,

        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },

    /// HTTP <method> <path>; trailing words are joined into the JSON body
    #[command(alias = "SEND")]
    Send {
        method: String,

        path: String,

        body: Vec<String>,

        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ListTarget {
    /// List the connections available for sending requests
    #[command(aliases = ["conns", "conn", "con"])]
    Connections,
}

#[derive(Subcommand, Debug)]
pub enum DescribeTarget {
    /// Details about one or more connections
    #[command(aliases = ["connections", "conns", "conn", "con"])]
    Connection {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SetTarget {
    /// Use the named connection
    #[command(aliases = ["connections", "conns", "conn", "con"])]
    Connection { name: String },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let logging = Logging::init(self.flags.debug, self.flags.verbose)
            .context("Failed to initialize logging")?;
        let config = LayeredConfig::load(self.config.as_deref());
        let request_service = HyperHttpClient::new().create_request_service();

        let mut session = Session::new(config, request_service);
        session.apply_app_flags(&self.flags);
        let store = session.connections().store();
        logging.apply(store.get_bool(DEBUG_KEY), store.get_bool(VERBOSE_KEY));
        session.attach_logging(logging);

        session.begin_command(self.flags.connection.clone());
        match self.command {
            Command::Interactive => interactive::run(&mut session).await,
            Command::Shared(command) => session.run(command).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_are_accepted_after_subcommands() {
        let cli = Cli::try_parse_from(["hurlsh", "http", "get", "/users", "-c", "prod", "-v"]).unwrap();
        assert_eq!(cli.flags.connection.as_deref(), Some("prod"));
        assert!(cli.flags.verbose);
        assert!(matches!(
            cli.command,
            Command::Shared(SharedCommand::Http { verb: HttpCommand::Get { ref path, .. } }) if path == "/users"
        ));
    }

    #[test]
    fn connection_aliases_parse() {
        for alias in ["connections", "conns", "conn", "con"] {
            let cli = Cli::try_parse_from(["hurlsh", "list", alias]).unwrap();
            assert!(matches!(
                cli.command,
                Command::Shared(SharedCommand::List { target: ListTarget::Connections })
            ));
        }
    }

    #[test]
    fn post_collects_trailing_words_as_body() {
        let cli = Cli::try_parse_from([
            "hurlsh", "http", "POST", "/groups", r#"{"name":"#, r#""admin"}"#,
        ])
        .unwrap();
        let Command::Shared(SharedCommand::Http { verb: HttpCommand::Post { body, .. } }) = cli.command
        else {
            panic!("expected http post");
        };
        assert_eq!(body.join(" "), r#"{"name": "admin"}"#);
    }

    #[test]
    fn flags_command_parses() {
        let cli = Cli::try_parse_from(["hurlsh", "flags", "-j"]).unwrap();
        assert!(cli.flags.json);
        assert!(matches!(cli.command, Command::Shared(SharedCommand::Flags)));
    }

    #[test]
    fn describe_requires_a_name() {
        assert!(Cli::try_parse_from(["hurlsh", "describe", "connection"]).is_err());
    }
}
