// The verbosity stuff is cribbed from https://github.com/clap-rs/clap-verbosity-flag/blob/c621a6a8a7c0b6df8f1464a985a5d076b4915693/src/lib.rs and updated for tracing

#![deny(unused_crate_dependencies)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use mlhub::{Client, RequestOptions};
use serde::Serialize;
use std::io::Write;
use tracing::metadata::Level;
use tracing_subscriber::{
    fmt::writer::MakeWriterExt, layer::SubscriberExt, util::SubscriberInitExt,
};

/// mlhub: A command-line interface for the Radiant MLHub API
#[derive(Debug, Parser)]
pub struct Mlhub {
    #[command(subcommand)]
    command: Command,

    /// The API token.
    ///
    /// If not provided, the token is read from the MLHUB_API_TOKEN environment
    /// variable, or from the `auth.api_token` field of a `.ml-hub` file in the
    /// current working directory or the home directory.
    #[arg(long = "api-token", global = true, verbatim_doc_comment)]
    api_token: Option<String>,

    /// The root url of the API.
    ///
    /// Defaults to https://api.radiant.earth/mlhub/v1/
    #[arg(long = "url", global = true)]
    url: Option<String>,

    /// Whether to print compact JSON output.
    ///
    /// By default, JSON values are pretty-printed. Items are always printed
    /// as newline-delimited JSON.
    #[arg(
        short = 'c',
        long = "compact-json",
        action = clap::ArgAction::SetTrue,
        global = true
    )]
    compact_json: bool,

    #[arg(
        long,
        short = 'v',
        action = clap::ArgAction::Count,
        global = true,
        help = ErrorLevel::verbose_help(),
        long_help = ErrorLevel::verbose_long_help(),
    )]
    verbose: u8,

    #[arg(
        long,
        short = 'q',
        action = clap::ArgAction::Count,
        global = true,
        help = ErrorLevel::quiet_help(),
        long_help = ErrorLevel::quiet_long_help(),
        conflicts_with = "verbose",
    )]
    quiet: u8,
}

/// A mlhub subcommand.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Lists all collections.
    Collections {
        /// Only print collection ids, one per line.
        #[arg(long = "ids", default_value_t = false)]
        ids: bool,
    },

    /// Fetches a single collection.
    Collection {
        /// The collection id.
        id: String,
    },

    /// Prints a collection's items as newline-delimited JSON.
    Items {
        /// The collection id.
        id: String,

        /// The maximum number of items to print.
        #[arg(short = 'n', long = "max-items")]
        max_items: Option<usize>,
    },

    /// Makes a GET request and prints the JSON response.
    Get {
        /// A path relative to the API root, or an absolute url.
        path: String,
    },
}

#[derive(Copy, Clone, Debug, Default)]
struct ErrorLevel;

impl Mlhub {
    /// Runs this command.
    ///
    /// If `init_tracing_subscriber` is `false`, it is expected that the caller
    /// is setting up the appropriate logging.
    pub fn run(self, init_tracing_subscriber: bool) -> Result<()> {
        if init_tracing_subscriber {
            if let Some(level) = self.log_level() {
                tracing_subscriber::registry()
                    .with(
                        tracing_subscriber::fmt::layer()
                            .with_writer(std::io::stderr.with_max_level(level)),
                    )
                    .init();
            }
        }
        let client = self.client()?;
        match self.command {
            Command::Collections { ids } => {
                let collections = client.collections()?;
                if ids {
                    let mut stdout = std::io::stdout().lock();
                    for collection in collections {
                        writeln!(stdout, "{}", collection.id())?;
                    }
                    Ok(())
                } else {
                    self.put(&collections)
                }
            }
            Command::Collection { ref id } => {
                let collection = client.collection(id)?;
                self.put(&collection)
            }
            Command::Items { ref id, max_items } => {
                let collection = client.collection(id)?;
                let mut stdout = std::io::stdout().lock();
                for item in collection.items(&client, max_items)? {
                    serde_json::to_writer(&mut stdout, &item?)?;
                    writeln!(stdout)?;
                }
                stdout.flush()?;
                Ok(())
            }
            Command::Get { ref path } => {
                let value = client.get(path, None, RequestOptions::default())?;
                self.put(&value)
            }
        }
    }

    /// Creates a client from the global arguments.
    pub fn client(&self) -> Result<Client> {
        let mut client = Client::new();
        if let Some(url) = &self.url {
            client = client.with_base_url(url)?;
        }
        if let Some(api_token) = &self.api_token {
            client = client.with_api_token(api_token);
        }
        Ok(client)
    }

    fn put<T: Serialize>(&self, value: &T) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        if self.compact_json {
            serde_json::to_writer(&mut stdout, value)?;
        } else {
            serde_json::to_writer_pretty(&mut stdout, value)?;
        }
        writeln!(stdout)?;
        stdout.flush()?;
        Ok(())
    }

    pub fn log_level(&self) -> Option<Level> {
        level_enum(self.verbosity())
    }

    fn verbosity(&self) -> i8 {
        level_value(ErrorLevel::default()) - (self.quiet as i8) + (self.verbose as i8)
    }
}

impl ErrorLevel {
    fn default() -> Option<Level> {
        Some(Level::ERROR)
    }

    fn verbose_help() -> Option<&'static str> {
        Some("Increase verbosity")
    }

    fn verbose_long_help() -> Option<&'static str> {
        None
    }

    fn quiet_help() -> Option<&'static str> {
        Some("Decrease verbosity")
    }

    fn quiet_long_help() -> Option<&'static str> {
        None
    }
}

fn level_enum(verbosity: i8) -> Option<Level> {
    match verbosity {
        i8::MIN..=-1 => None,
        0 => Some(Level::ERROR),
        1 => Some(Level::WARN),
        2 => Some(Level::INFO),
        3 => Some(Level::DEBUG),
        4..=i8::MAX => Some(Level::TRACE),
    }
}

fn level_value(level: Option<Level>) -> i8 {
    match level {
        None => -1,
        Some(Level::ERROR) => 0,
        Some(Level::WARN) => 1,
        Some(Level::INFO) => 2,
        Some(Level::DEBUG) => 3,
        Some(Level::TRACE) => 4,
    }
}

#[cfg(test)]
use {assert_cmd as _, mockito as _, rstest as _};
