use super::{resolve_over, resolve_tier, CliContext};
use crate::cli::BoardCommand;
use crate::display;
use anyhow::{anyhow, bail, Context, Result};
use std::path::Path;
use tierlist::{Action, BoardId, BoardSession, ItemId, Resolver, TierPatch};

pub async fn new_board(context: &CliContext, title: &str) -> Result<()> {
    let session = BoardSession::create(
        title,
        context.storage.clone(),
        context.registry.clone(),
        context.session_options(),
    )
    .await?;
    println!("{}", session.id());
    session.close()?;
    Ok(())
}

pub fn list(context: &CliContext, json: bool) -> Result<()> {
    let boards = context.index().list()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&boards)?);
    } else if boards.is_empty() {
        println!("No boards yet. Create one with `tierlist new <title>`.");
    } else {
        println!("{}", display::board_list(&boards));
    }
    Ok(())
}

pub async fn show(context: &CliContext, board: &str, json: bool) -> Result<()> {
    let session = context.open_board(board).await?;
    let snapshot = session.resolved_snapshot();
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!("{}", display::board(&snapshot));
    }
    Ok(())
}

pub fn delete(context: &CliContext, board: &str) -> Result<()> {
    if !context.index().remove(&BoardId::from(board))? {
        bail!("board '{board}' not found");
    }
    println!("Deleted {board}");
    Ok(())
}

pub async fn run_board(context: &CliContext, board: &str, command: BoardCommand) -> Result<()> {
    let mut session = context.open_board(board).await?;
    let changed = apply_command(context, &mut session, command).await?;
    if !changed {
        println!("Nothing changed");
    }
    session.close()?;
    Ok(())
}

pub async fn import(context: &CliContext, board: &str, file: &Path) -> Result<()> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let mut session = context.open_board(board).await?;
    session.import_json(&text)?;
    println!(
        "Imported {} items into {}",
        session.board().item_count(),
        session.id()
    );
    session.close()?;
    Ok(())
}

pub async fn export(context: &CliContext, board: &str, output: Option<&Path>) -> Result<()> {
    let session = context.open_board(board).await?;
    let json = session.export().to_json()?;
    match output {
        Some(path) => tokio::fs::write(path, json)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}

/// Translate one board command into actions on `session`.
///
/// Returns whether the board changed.
pub async fn apply_command(
    context: &CliContext,
    session: &mut BoardSession,
    command: BoardCommand,
) -> Result<bool> {
    let board = session.board().clone();
    let action = match command {
        BoardCommand::AddTier { label } => Action::AddTier { label },
        BoardCommand::DeleteTier { tier } => Action::delete_tier(resolve_tier(&board, &tier)?),
        BoardCommand::RenameTier { tier, label } => {
            Action::update_tier(resolve_tier(&board, &tier)?, TierPatch::label(label))
        }
        BoardCommand::RecolorTier { tier, color } => {
            Action::update_tier(resolve_tier(&board, &tier)?, TierPatch::color(color.as_str()))
        }
        BoardCommand::MoveTier { from, to } => Action::ReorderTiers {
            old_index: from,
            new_index: to,
        },
        BoardCommand::Move { item, over } => {
            if !board.contains_item(&ItemId::from(item.as_str())) {
                bail!("no item '{item}' on this board");
            }
            Action::move_item(item.as_str(), resolve_over(&board, &over)?)
        }
        BoardCommand::Remove { tier, item } => {
            Action::remove_item(resolve_tier(&board, &tier)?, item.as_str())
        }
        BoardCommand::Title { title } => Action::update_title(title),
        BoardCommand::ShuffleColors => Action::RandomizeColors,
        BoardCommand::Clear => Action::ClearBoard,
        BoardCommand::Place {
            query,
            over,
            media_type,
            pick,
        } => {
            let over = resolve_over(&board, &over)?;
            let search = context.search().await?;
            search.set_media_type(media_type);
            search.set_query(&query);
            search.search_now();
            let view = search.settled().await;
            if let Some(error) = view.error {
                bail!("search failed: {}", error.message);
            }
            let item = view
                .results
                .into_iter()
                .nth(pick)
                .ok_or_else(|| anyhow!("no result #{pick} for '{query}'"))?;
            println!("Placing {} ({})", item.title, item.id);
            Action::place_item(item, over)
        }
        BoardCommand::Enrich => {
            let resolver = Resolver::new(context.registry.clone(), context.catalog()?);
            let applied = session.enrich(&resolver).await;
            println!("Enriched {applied} items");
            return Ok(applied > 0);
        }
    };
    Ok(session.dispatch(action))
}
