//! Table rendering for terminal output

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use tierlist::{Board, BoardMetadata, MediaItem, SearchView};

fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.to_vec());
    table
}

fn describe(item: &MediaItem) -> String {
    let mut text = format!("{} [{}]", item.title, item.id);
    if let Some(subtitle) = item.subtitle() {
        text.push_str(&format!(" - {subtitle}"));
    }
    if item.is_enriched() {
        text.push_str(" *");
    }
    text
}

pub fn board(board: &Board) -> String {
    let mut table = table(&["Tier", "Id", "Color", "Items"]);
    for tier in &board.tier_definitions {
        let items: Vec<String> = board.tier_items(&tier.id).iter().map(describe).collect();
        table.add_row(vec![
            tier.label.clone(),
            tier.id.to_string(),
            tier.color_id.to_string(),
            items.join("\n"),
        ]);
    }
    format!("{}\n{table}", board.title)
}

pub fn board_list(boards: &[BoardMetadata]) -> String {
    let mut table = table(&["Id", "Title", "Items", "Modified"]);
    for meta in boards {
        table.add_row(vec![
            meta.id.to_string(),
            meta.title.clone(),
            meta.item_count.to_string(),
            meta.last_modified_at.format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }
    table.to_string()
}

pub fn search_results(view: &SearchView) -> String {
    let mut table = table(&["#", "Id", "Title", "Artist", "Year"]);
    for (n, item) in view.results.iter().enumerate() {
        table.add_row(vec![
            n.to_string(),
            item.id.to_string(),
            item.title.clone(),
            item.artist.clone().unwrap_or_default(),
            item.year.map(|y| y.to_string()).unwrap_or_default(),
        ]);
    }
    format!(
        "{table}\nPage {} of {}",
        view.page,
        view.total_pages.max(view.page)
    )
}
