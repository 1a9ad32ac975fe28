//! Command line definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tierlist::MediaType;

#[derive(Parser, Debug)]
#[command(name = "tierlist")]
#[command(version)]
#[command(about = "Rank albums, artists and songs on tier list boards")]
pub struct Cli {
    /// Directory holding saved boards (overrides configuration)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a board with the default tiers
    New { title: String },
    /// List saved boards, most recent first
    List {
        #[arg(long)]
        json: bool,
    },
    /// Print a board
    Show {
        board: String,
        #[arg(long)]
        json: bool,
    },
    /// Delete a board
    Delete { board: String },
    /// Edit a board
    Board {
        board: String,
        #[command(subcommand)]
        command: BoardCommand,
    },
    /// Replace a board's contents with a board document
    Import { board: String, file: PathBuf },
    /// Write a board document to stdout or a file
    Export {
        board: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Search the catalog
    Search(SearchArgs),
    /// Read board commands from stdin, one per line (plus undo, redo, show)
    Session { board: String },
}

/// Edits shared by `board <id> ...` and interactive sessions
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum BoardCommand {
    /// Append a tier
    AddTier { label: Option<String> },
    /// Delete a tier; its items move to the first remaining tier
    DeleteTier { tier: String },
    RenameTier { tier: String, label: String },
    RecolorTier { tier: String, color: String },
    /// Move a tier from one position to another (0-based)
    MoveTier { from: usize, to: usize },
    /// Move an item onto another item (inserts before it) or onto a tier (appends)
    Move { item: String, over: String },
    Remove { tier: String, item: String },
    Title { title: String },
    ShuffleColors,
    /// Remove every item, keeping the tiers
    Clear,
    /// Search the catalog and place one of the results
    Place {
        query: String,
        /// Tier or item to drop the result on
        over: String,
        #[arg(short = 't', long = "type", default_value = "album")]
        media_type: MediaType,
        /// Which result to place (0-based)
        #[arg(long, default_value_t = 0)]
        pick: usize,
    },
    /// Fetch missing details for the board's items
    Enrich,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct SearchArgs {
    pub query: String,
    #[arg(short = 't', long = "type", default_value = "album")]
    pub media_type: MediaType,
    #[arg(short, long, default_value_t = 1)]
    pub page: u32,
    #[arg(long)]
    pub year_from: Option<i32>,
    #[arg(long)]
    pub year_to: Option<i32>,
    /// Facet filter as name=value, repeatable
    #[arg(long = "facet", value_parser = parse_facet)]
    pub facets: Vec<(String, String)>,
    /// Require an exact title match
    #[arg(long)]
    pub exact: bool,
    #[arg(long)]
    pub json: bool,
}

fn parse_facet(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() && !value.is_empty() => {
            Ok((name.to_string(), value.to_string()))
        }
        _ => Err(format!("expected name=value, got '{s}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_board_move() {
        let cli = Cli::try_parse_from(["tierlist", "board", "b1", "move", "x", "s"]).unwrap();
        match cli.command {
            Commands::Board { board, command } => {
                assert_eq!(board, "b1");
                assert_eq!(
                    command,
                    BoardCommand::Move {
                        item: "x".into(),
                        over: "s".into()
                    }
                );
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_search_with_facets() {
        let cli = Cli::try_parse_from([
            "tierlist", "search", "thriller", "--type", "song", "--facet", "genre=pop", "-q",
        ])
        .unwrap();
        assert!(cli.quiet);
        match cli.command {
            Commands::Search(args) => {
                assert_eq!(args.media_type, MediaType::Song);
                assert_eq!(args.facets, vec![("genre".into(), "pop".into())]);
                assert_eq!(args.page, 1);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_rejects_bad_facet() {
        assert!(Cli::try_parse_from(["tierlist", "search", "x", "--facet", "genre"]).is_err());
        assert!(Cli::try_parse_from(["tierlist", "search", "x", "--type", "video"]).is_err());
    }
}
