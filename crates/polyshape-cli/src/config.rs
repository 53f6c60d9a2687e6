use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use polyshape_core::config::AdminConfig;
use polyshape_core::form::RecordForm;
use std::path::PathBuf;
use tracing::Level;

/// CLI configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "polyshape")]
#[command(
    author,
    version,
    about = "Admin console for Polyshape publications and projects"
)]
#[command(after_help = "Examples:
  polyshape list publications --search quantum
  polyshape create projects --title Bridge --date 2024-03-01 --content-file bridge.txt \\
      --partner-name ACME --partner-url acme.example
  polyshape delete publications my-paper.json --yes
  polyshape shell --tab projects")]
pub struct Config {
    /// Base URL of the content API (e.g. https://example.com/api)
    #[arg(long, env = "POLYSHAPE_API_ROOT", global = true)]
    pub api_root: Option<String>,

    /// Bearer token issued by the identity provider
    #[arg(long, env = "POLYSHAPE_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Custom path to config.toml
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List a collection, newest first
    #[command(after_help = "Examples:
  polyshape list publications
  polyshape list projects --search bridge --page 2
  polyshape list publications --json > publications.json")]
    List {
        collection: CollectionArg,
        /// Only show items whose title contains this text
        #[arg(short, long)]
        search: Option<String>,
        /// Page to show (5 items per page)
        #[arg(short, long, default_value = "1")]
        page: usize,
        /// Print the page as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Create a record
    Create {
        collection: CollectionArg,
        #[command(flatten)]
        fields: RecordArgs,
    },
    /// Update a record, keeping any field not given
    #[command(after_help = "Example: polyshape update publications my-paper.json --venue \"Nature\"")]
    Update {
        collection: CollectionArg,
        /// Filename or pathname of the record
        id: String,
        #[command(flatten)]
        fields: RecordArgs,
    },
    /// Delete a record
    Delete {
        collection: CollectionArg,
        /// Filename or pathname of the record
        #[arg(value_name = "ID|PATHNAME")]
        target: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Interactive session with tabs, forms and auto-logout
    Shell {
        /// Tab to open first
        #[arg(long, default_value = "publications")]
        tab: CollectionArg,
    },
}

/// Content collections exposed by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CollectionArg {
    Publications,
    Projects,
}

impl CollectionArg {
    pub fn title(self) -> &'static str {
        match self {
            CollectionArg::Publications => "Publications",
            CollectionArg::Projects => "Projects",
        }
    }
}

/// Record fields given as flags
#[derive(Args, Debug, Default, Clone)]
pub struct RecordArgs {
    #[arg(long)]
    pub title: Option<String>,
    /// Date as YYYY-MM-DD
    #[arg(long)]
    pub date: Option<String>,
    /// Content text; separate paragraphs with a blank line
    #[arg(long, conflicts_with = "content_file")]
    pub content: Option<String>,
    /// Read the content from a file
    #[arg(long, value_name = "PATH")]
    pub content_file: Option<PathBuf>,
    /// Publication URL
    #[arg(long)]
    pub url: Option<String>,
    /// Comma-separated publication authors
    #[arg(long)]
    pub authors: Option<String>,
    /// Publication venue
    #[arg(long)]
    pub venue: Option<String>,
    /// Project partner name
    #[arg(long)]
    pub partner_name: Option<String>,
    /// Project partner URL
    #[arg(long)]
    pub partner_url: Option<String>,
}

impl RecordArgs {
    /// Given fields as `(form key, flag, value)`, reading `--content-file` if set.
    pub fn overrides(&self) -> std::io::Result<Vec<(&'static str, &'static str, String)>> {
        let content = match &self.content_file {
            Some(path) => Some(std::fs::read_to_string(path)?),
            None => self.content.clone(),
        };

        let fields = [
            ("title", "--title", self.title.clone()),
            ("date", "--date", self.date.clone()),
            ("content", "--content", content),
            ("url", "--url", self.url.clone()),
            ("authors", "--authors", self.authors.clone()),
            ("venue", "--venue", self.venue.clone()),
            ("partner_name", "--partner-name", self.partner_name.clone()),
            ("partner_url", "--partner-url", self.partner_url.clone()),
        ];

        Ok(fields
            .into_iter()
            .filter_map(|(key, flag, value)| value.map(|v| (key, flag, v)))
            .collect())
    }

    /// Writes the given fields into `form`.
    ///
    /// Returns the flags the form has no field for.
    pub fn apply<F: RecordForm>(&self, form: &mut F) -> std::io::Result<Vec<&'static str>> {
        let mut rejected = Vec::new();
        for (key, flag, value) in self.overrides()? {
            if !form.set_value(key, value) {
                rejected.push(flag);
            }
        }
        Ok(rejected)
    }
}

impl Config {
    /// Log level from the `-v` count.
    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    }

    /// Applies flags and environment on top of the file settings.
    pub fn merge_into(&self, mut settings: AdminConfig) -> AdminConfig {
        if let Some(api_root) = non_blank(&self.api_root) {
            settings.api_root = Some(api_root);
        }
        if let Some(token) = non_blank(&self.token) {
            settings.token = Some(token);
        }
        settings
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
