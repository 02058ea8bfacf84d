//! Command-line argument definitions.

use clap::{Parser, Subcommand};
use uuid::Uuid;

/// Manage tasks on a primary task API, mirrored to a secondary service
#[derive(Parser, Debug)]
#[command(name = "todo", version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Primary task API base URL (overrides TODO_PRIMARY_URL)
    #[arg(long, global = true)]
    pub primary_url: Option<String>,

    /// Secondary service base URL (overrides TODO_SECONDARY_URL)
    #[arg(long, global = true)]
    pub secondary_url: Option<String>,

    /// Task collection path on both endpoints (overrides TODO_COLLECTION)
    #[arg(long, global = true)]
    pub collection: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log at debug level (twice for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all tasks
    List,

    /// Add a new task
    Add {
        /// Task name; surrounding whitespace is trimmed
        name: String,

        /// Optional longer description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Flip a task between open and completed
    Toggle {
        id: Uuid,
    },

    /// Give a task a new name
    Rename {
        id: Uuid,
        name: String,
    },

    /// Delete a task
    Delete {
        id: Uuid,
    },

    /// Check both endpoints' health
    Health {
        /// Keep polling at the configured interval, logging transitions
        #[arg(long)]
        watch: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_add_with_description() {
        let cli = Cli::parse_from(["todo", "add", "buy milk", "-d", "2 litres", "--json"]);
        assert!(cli.json);
        match cli.command {
            Commands::Add { name, description } => {
                assert_eq!(name, "buy milk");
                assert_eq!(description.as_deref(), Some("2 litres"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_id() {
        assert!(Cli::try_parse_from(["todo", "toggle", "not-a-uuid"]).is_err());
    }

    #[test]
    fn endpoint_overrides_are_global() {
        let cli = Cli::parse_from(["todo", "list", "--primary-url", "http://api:8080"]);
        assert_eq!(cli.primary_url.as_deref(), Some("http://api:8080"));
        assert!(cli.secondary_url.is_none());
    }

    #[test]
    fn collection_override_is_global() {
        let cli = Cli::parse_from(["todo", "--collection", "/api/todos", "list"]);
        assert_eq!(cli.collection.as_deref(), Some("/api/todos"));
        assert!(matches!(cli.command, Commands::List));
    }
}
