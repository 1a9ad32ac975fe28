//! One open board: the dispatch loop tying reducer, history, persistence and
//! the registry together.
//!
//! All board mutation goes through `&mut self`, so the board itself needs
//! no locking. Persistence writes and enrichment fetches run as tokio tasks
//! and fold back in through later calls.

use crate::action::Action;
use crate::config::TierlistConfig;
use crate::error::{Result, TierlistError};
use crate::history::{History, DEFAULT_HISTORY_LIMIT};
use crate::import::BoardDocument;
use crate::palette::Palette;
use crate::persist::{BoardIndex, PersistenceSync, DEFAULT_PERSIST_DEBOUNCE};
use crate::reducer::BoardReducer;
use crate::registry::ItemRegistry;
use crate::resolver::Resolver;
use crate::storage::{board_key, meta_key, Storage};
use crate::types::{Board, BoardId, BoardMetadata, ItemPatch, MediaItem};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub history_limit: usize,
    pub persist_debounce: Duration,
    pub palette: Palette,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            persist_debounce: DEFAULT_PERSIST_DEBOUNCE,
            palette: Palette::default(),
        }
    }
}

impl From<&TierlistConfig> for SessionOptions {
    fn from(config: &TierlistConfig) -> Self {
        Self {
            history_limit: config.history.limit,
            persist_debounce: config.persist_debounce(),
            palette: config.palette(),
        }
    }
}

pub struct BoardSession {
    id: BoardId,
    board: Arc<Board>,
    metadata: BoardMetadata,
    history: History<Arc<Board>>,
    reducer: BoardReducer,
    board_sync: PersistenceSync<Board>,
    meta_sync: PersistenceSync<BoardMetadata>,
    index: BoardIndex,
    /// False until the board made it into the index
    indexed: bool,
    registry: ItemRegistry,
}

impl std::fmt::Debug for BoardSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardSession")
            .field("id", &self.id)
            .field("title", &self.board.title)
            .field("items", &self.board.item_count())
            .finish_non_exhaustive()
    }
}

impl BoardSession {
    /// Open board `id`, creating it with the default tiers if it has never
    /// been saved
    pub async fn open(
        id: BoardId,
        storage: Arc<dyn Storage>,
        registry: ItemRegistry,
        options: SessionOptions,
    ) -> Result<Self> {
        let board_sync = PersistenceSync::new(
            board_key(id.as_str()),
            Arc::clone(&storage),
            options.persist_debounce,
        );
        let mut board = board_sync.hydrate(Board::default()).await;
        if !board.is_consistent() {
            board.reindex();
        }

        let meta_sync = PersistenceSync::new(
            meta_key(id.as_str()),
            Arc::clone(&storage),
            options.persist_debounce,
        );
        let mut metadata = meta_sync
            .hydrate(BoardMetadata::new(id.clone(), &board))
            .await;
        metadata.id = id.clone();

        let index = BoardIndex::new(storage);
        let indexed = match index.register(&metadata) {
            Ok(()) => true,
            Err(e) => {
                warn!(board = %id, error = %e, "failed to index board, will retry on next change");
                false
            }
        };
        let known = registry.register_all(board.all_items());
        info!(board = %id, items = board.item_count(), known, "board opened");

        Ok(Self {
            id,
            board: Arc::new(board),
            metadata,
            history: History::new(options.history_limit),
            reducer: BoardReducer::new(options.palette),
            board_sync,
            meta_sync,
            index,
            indexed,
            registry,
        })
    }

    /// Open a board that must already be in the index
    pub async fn open_existing(
        id: BoardId,
        storage: Arc<dyn Storage>,
        registry: ItemRegistry,
        options: SessionOptions,
    ) -> Result<Self> {
        if !BoardIndex::new(Arc::clone(&storage)).contains(&id)? {
            return Err(TierlistError::BoardNotFound {
                id: id.to_string(),
            });
        }
        Self::open(id, storage, registry, options).await
    }

    /// Create a fresh board with a new id
    pub async fn create(
        title: &str,
        storage: Arc<dyn Storage>,
        registry: ItemRegistry,
        options: SessionOptions,
    ) -> Result<Self> {
        let mut session = Self::open(BoardId::new(), storage, registry, options).await?;
        session.apply_untracked(&Action::update_title(title));
        Ok(session)
    }

    pub fn id(&self) -> &BoardId {
        &self.id
    }

    pub fn board(&self) -> &Arc<Board> {
        &self.board
    }

    pub fn metadata(&self) -> &BoardMetadata {
        &self.metadata
    }

    pub fn registry(&self) -> &ItemRegistry {
        &self.registry
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Apply a user action. Returns false when it changed nothing.
    pub fn dispatch(&mut self, action: Action) -> bool {
        let next = self.reducer.reduce(&self.board, &action);
        if Arc::ptr_eq(&next, &self.board) {
            return false;
        }
        self.history.push(Arc::clone(&self.board));
        self.commit(next);
        self.notify_registry(&action);
        debug!(board = %self.id, action = %action, "applied");
        true
    }

    pub fn undo(&mut self) -> bool {
        let mut restored = None;
        if !self
            .history
            .undo(Arc::clone(&self.board), |previous| restored = Some(previous))
        {
            return false;
        }
        if let Some(previous) = restored {
            self.commit(previous);
        }
        debug!(board = %self.id, "undo");
        true
    }

    pub fn redo(&mut self) -> bool {
        let mut restored = None;
        if !self
            .history
            .redo(Arc::clone(&self.board), |next| restored = Some(next))
        {
            return false;
        }
        if let Some(next) = restored {
            self.commit(next);
        }
        debug!(board = %self.id, "redo");
        true
    }

    /// Fold enriched copies into the board without touching history.
    ///
    /// Returns how many items actually changed; items no longer on the board
    /// are ignored.
    pub fn apply_enrichment<I>(&mut self, items: I) -> usize
    where
        I: IntoIterator<Item = MediaItem>,
    {
        items
            .into_iter()
            .filter(|item| {
                self.apply_untracked(&Action::update_item(
                    item.id.clone(),
                    ItemPatch::from_item(item),
                ))
            })
            .count()
    }

    /// Run a background enrichment pass over the board's items
    pub async fn enrich(&mut self, resolver: &Resolver) -> usize {
        let items: Vec<MediaItem> = self.board.all_items().cloned().collect();
        let enriched = resolver.enrich_missing(items).await;
        let applied = self.apply_enrichment(enriched);
        info!(board = %self.id, applied, "enrichment applied");
        applied
    }

    /// Replace the board with an imported document. Invalid documents leave
    /// the board untouched.
    pub fn import_json(&mut self, text: &str) -> Result<()> {
        let board = BoardDocument::parse(text)?.into_board();
        self.dispatch(Action::replace_state(board));
        Ok(())
    }

    pub fn export(&self) -> BoardDocument {
        BoardDocument::from_board(&self.board)
    }

    /// The board with every item replaced by its registry version
    pub fn resolved_snapshot(&self) -> Board {
        let mut board = Board::clone(&self.board);
        for list in board.items.values_mut() {
            for item in list.iter_mut() {
                *item = self.registry.overlay(item);
            }
        }
        board
    }

    /// Write pending changes now
    pub fn flush(&mut self) -> Result<()> {
        if !self.indexed {
            self.index.register(&self.metadata)?;
            self.indexed = true;
        }
        self.board_sync.flush()?;
        self.meta_sync.flush()?;
        Ok(())
    }

    pub fn close(mut self) -> Result<()> {
        self.flush()
    }

    /// Reduce and commit without recording an undo step
    fn apply_untracked(&mut self, action: &Action) -> bool {
        let next = self.reducer.reduce(&self.board, action);
        if Arc::ptr_eq(&next, &self.board) {
            return false;
        }
        self.commit(next);
        self.notify_registry(action);
        true
    }

    fn commit(&mut self, next: Arc<Board>) {
        self.board = next;
        self.metadata.touch(&self.board);
        self.board_sync.schedule(&self.board);
        self.meta_sync.schedule(&self.metadata);
        if !self.indexed {
            self.retry_index();
        }
    }

    fn retry_index(&mut self) {
        match self.index.register(&self.metadata) {
            Ok(()) => {
                debug!(board = %self.id, "board indexed");
                self.indexed = true;
            }
            Err(e) => warn!(board = %self.id, error = %e, "still unable to index board"),
        }
    }

    fn notify_registry(&self, action: &Action) {
        match action {
            Action::UpdateItem { item_id, .. } => {
                if let Some(item) = self.board.find_item(item_id) {
                    self.registry.register(item);
                }
            }
            Action::MoveItem {
                new_item: Some(item),
                ..
            } => {
                self.registry.register(item);
            }
            Action::ReplaceState { .. } => {
                self.registry.register_all(self.board.all_items());
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::test_support::ScriptedCatalog;
    use crate::types::{ItemDetails, ItemId, MediaType, TierId};
    use serde_json::json;

    async fn setup() -> (MemoryStorage, BoardSession) {
        let storage = MemoryStorage::new();
        let session = BoardSession::open(
            BoardId::from("b1"),
            Arc::new(storage.clone()),
            ItemRegistry::new(),
            SessionOptions::default(),
        )
        .await
        .unwrap();
        (storage, session)
    }

    fn album(id: &str) -> MediaItem {
        MediaItem::new(id, MediaType::Album, id.to_uppercase())
    }

    #[tokio::test]
    async fn test_open_registers_board() {
        let (storage, session) = setup().await;
        assert_eq!(session.board().title, crate::types::DEFAULT_TITLE);
        assert!(storage.contains("meta/b1"));
        assert_eq!(
            BoardIndex::new(Arc::new(storage)).ids().unwrap(),
            vec![BoardId::from("b1")]
        );
    }

    #[tokio::test]
    async fn test_open_existing_requires_index_entry() {
        let err = BoardSession::open_existing(
            BoardId::from("nope"),
            Arc::new(MemoryStorage::new()),
            ItemRegistry::new(),
            SessionOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, TierlistError::BoardNotFound { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_survives_index_write_failure() {
        let storage = MemoryStorage::new();
        storage.set_fail_writes(true);
        let mut session = BoardSession::open(
            BoardId::from("b1"),
            Arc::new(storage.clone()),
            ItemRegistry::new(),
            SessionOptions::default(),
        )
        .await
        .unwrap();
        assert!(!storage.contains("meta/b1"));
        assert!(!storage.contains("index"));

        assert!(session.dispatch(Action::update_title("Offline")));
        assert_eq!(session.board().title, "Offline");
        assert!(!storage.contains("index"));

        storage.set_fail_writes(false);
        assert!(session.dispatch(Action::update_title("Online")));
        assert_eq!(
            BoardIndex::new(Arc::new(storage.clone())).ids().unwrap(),
            vec![BoardId::from("b1")]
        );
        let meta = storage.read("meta/b1").unwrap().unwrap();
        assert_eq!(meta["title"], json!("Online"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_indexes_board_missed_at_open() {
        let storage = MemoryStorage::new();
        storage.set_fail_writes(true);
        let session = BoardSession::open(
            BoardId::from("b1"),
            Arc::new(storage.clone()),
            ItemRegistry::new(),
            SessionOptions::default(),
        )
        .await
        .unwrap();

        storage.set_fail_writes(false);
        session.close().unwrap();
        assert!(BoardIndex::new(Arc::new(storage.clone()))
            .contains(&BoardId::from("b1"))
            .unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_undo_redo() {
        let (_storage, mut session) = setup().await;
        let original = Arc::clone(session.board());

        assert!(session.dispatch(Action::place_item(album("x"), "s")));
        let placed = Arc::clone(session.board());
        assert!(session.can_undo());

        // No-op leaves history alone
        assert!(!session.dispatch(Action::move_item("x", "s")));

        assert!(session.undo());
        assert!(Arc::ptr_eq(session.board(), &original));
        assert!(session.redo());
        assert!(Arc::ptr_eq(session.board(), &placed));
        assert!(!session.redo());
    }

    #[tokio::test(start_paused = true)]
    async fn test_changes_persist_after_debounce() {
        let (storage, mut session) = setup().await;
        session.dispatch(Action::update_title("Road trip"));
        assert_eq!(storage.read("board/b1").unwrap(), None);

        tokio::time::sleep(Duration::from_millis(600)).await;
        let stored = storage.read("board/b1").unwrap().unwrap();
        assert_eq!(stored["title"], json!("Road trip"));
        let meta = storage.read("meta/b1").unwrap().unwrap();
        assert_eq!(meta["title"], json!("Road trip"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reopen_restores_board() {
        let storage = MemoryStorage::new();
        {
            let mut session = BoardSession::open(
                BoardId::from("b1"),
                Arc::new(storage.clone()),
                ItemRegistry::new(),
                SessionOptions::default(),
            )
            .await
            .unwrap();
            session.dispatch(Action::place_item(album("x"), "a"));
            session.close().unwrap();
        }

        let registry = ItemRegistry::new();
        let session = BoardSession::open(
            BoardId::from("b1"),
            Arc::new(storage),
            registry.clone(),
            SessionOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(
            session.board().container_of(&ItemId::from("x")),
            Some(TierId::from("a"))
        );
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enrichment_skips_history() {
        let (_storage, mut session) = setup().await;
        session.dispatch(Action::place_item(album("x"), "s"));
        session.dispatch(Action::place_item(album("y"), "s"));

        let catalog = Arc::new(ScriptedCatalog::new());
        catalog.set_details(
            "x",
            ItemDetails {
                description: Some("debut".into()),
                ..ItemDetails::default()
            },
        );
        let resolver = Resolver::new(session.registry().clone(), catalog);

        assert_eq!(session.enrich(&resolver).await, 1);
        assert!(session
            .board()
            .find_item(&ItemId::from("x"))
            .unwrap()
            .is_enriched());

        // Undo steps back over the placement of y, not over enrichment
        assert!(session.undo());
        assert!(!session.board().contains_item(&ItemId::from("y")));
        assert!(session
            .board()
            .find_item(&ItemId::from("x"))
            .is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_import_rejects_and_keeps_board() {
        let (_storage, mut session) = setup().await;
        let before = Arc::clone(session.board());
        assert!(session.import_json(r#"{"version": 3, "title": "x", "tiers": []}"#).is_err());
        assert!(Arc::ptr_eq(session.board(), &before));

        let doc = r#"{"version": 1, "title": "Imported", "tiers": [
            {"label": "Top", "color": "red", "items": [{"id": "z", "type": "song", "title": "Z"}]}
        ]}"#;
        session.import_json(doc).unwrap();
        assert_eq!(session.board().title, "Imported");
        assert_eq!(session.export().tiers[0].items[0].id, ItemId::from("z"));
        assert!(session.undo());
        assert!(Arc::ptr_eq(session.board(), &before));
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolved_snapshot_uses_registry() {
        let (_storage, mut session) = setup().await;
        session.dispatch(Action::place_item(album("x"), "s"));
        session.registry().register(&album("x").with_year(2001));

        let snapshot = session.resolved_snapshot();
        assert_eq!(
            snapshot.find_item(&ItemId::from("x")).unwrap().year,
            Some(2001)
        );
        assert_eq!(session.board().find_item(&ItemId::from("x")).unwrap().year, None);
    }
}
