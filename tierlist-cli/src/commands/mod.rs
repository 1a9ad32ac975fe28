//! Command handlers

mod board;
mod search;
mod session;

use crate::cli::Commands;
use anyhow::{anyhow, bail, Context, Result};
use std::sync::Arc;
use tierlist::{
    Board, BoardId, BoardIndex, BoardSession, Catalog, FileStorage, HttpCatalog, ItemId,
    ItemRegistry, SearchController, SessionOptions, Storage, TierId, TierlistConfig,
};

/// Search context shared by every CLI invocation
const SEARCH_CONTEXT: &str = "cli";

/// Everything a command needs: configuration, storage and the item registry
pub struct CliContext {
    pub config: TierlistConfig,
    pub storage: Arc<dyn Storage>,
    pub registry: ItemRegistry,
}

impl CliContext {
    pub fn new(config: TierlistConfig) -> Self {
        let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(config.data_dir.clone()));
        Self {
            config,
            storage,
            registry: ItemRegistry::new(),
        }
    }

    pub fn index(&self) -> BoardIndex {
        BoardIndex::new(Arc::clone(&self.storage))
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions::from(&self.config)
    }

    /// Open a saved board by id
    pub async fn open_board(&self, board: &str) -> Result<BoardSession> {
        let session = BoardSession::open_existing(
            BoardId::from(board),
            Arc::clone(&self.storage),
            self.registry.clone(),
            self.session_options(),
        )
        .await?;
        Ok(session)
    }

    pub fn catalog(&self) -> Result<Arc<dyn Catalog>> {
        let catalog = HttpCatalog::new(
            &self.config.catalog.base_url,
            self.config.catalog_timeout(),
        )
        .with_context(|| format!("invalid catalog url '{}'", self.config.catalog.base_url))?;
        Ok(Arc::new(catalog))
    }

    pub async fn search(&self) -> Result<SearchController> {
        Ok(SearchController::open(
            SEARCH_CONTEXT,
            Arc::clone(&self.storage),
            self.catalog()?,
            self.registry.clone(),
            self.config.search_options(),
        )
        .await)
    }
}

pub async fn run(context: &CliContext, command: Commands) -> Result<()> {
    match command {
        Commands::New { title } => board::new_board(context, &title).await,
        Commands::List { json } => board::list(context, json),
        Commands::Show { board, json } => board::show(context, &board, json).await,
        Commands::Delete { board } => board::delete(context, &board),
        Commands::Board { board, command } => board::run_board(context, &board, command).await,
        Commands::Import { board, file } => board::import(context, &board, &file).await,
        Commands::Export { board, output } => {
            board::export(context, &board, output.as_deref()).await
        }
        Commands::Search(args) => search::run(context, args).await,
        Commands::Session { board } => session::run(context, &board).await,
    }
}

/// Find a tier by id, or by label ignoring case
pub fn resolve_tier(board: &Board, needle: &str) -> Result<TierId> {
    if board.has_tier(needle) {
        return Ok(TierId::from(needle));
    }
    board
        .tier_definitions
        .iter()
        .find(|t| t.label.eq_ignore_ascii_case(needle))
        .map(|t| t.id.clone())
        .ok_or_else(|| anyhow!("no tier '{needle}'"))
}

/// Resolve a drop target: a tier (id or label) or an item on the board
pub fn resolve_over(board: &Board, needle: &str) -> Result<String> {
    if let Ok(tier) = resolve_tier(board, needle) {
        return Ok(tier.to_string());
    }
    let item = ItemId::from(needle);
    if board.contains_item(&item) {
        return Ok(item.to_string());
    }
    bail!("'{needle}' is neither a tier nor an item on this board")
}
