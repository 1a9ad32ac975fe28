use super::CliContext;
use crate::cli::SearchArgs;
use crate::display;
use anyhow::{bail, Result};
use std::collections::BTreeMap;
use tierlist::search::MatchMode;

pub async fn run(context: &CliContext, args: SearchArgs) -> Result<()> {
    let search = context.search().await?;
    search.set_media_type(args.media_type);
    search.set_query(&args.query);
    search.set_year_range(args.year_from, args.year_to);

    let mut facets: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (facet, value) in &args.facets {
        facets.entry(facet.as_str()).or_default().push(value.as_str());
    }
    for stale in search.filters().facets.keys() {
        if !facets.contains_key(stale.as_str()) {
            search.set_facet(stale, &[]);
        }
    }
    for (facet, values) in &facets {
        search.set_facet(facet, values);
    }
    search.set_match_mode(if args.exact {
        MatchMode::Exact
    } else {
        MatchMode::Fuzzy
    });
    search.search_now();
    let mut view = search.settled().await;

    if args.page > 1 && view.error.is_none() {
        search.set_page(args.page);
        view = search.settled().await;
    }
    search.flush()?;

    if let Some(error) = view.error {
        bail!("search failed: {}", error.message);
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&view.results)?);
    } else if view.results.is_empty() {
        println!("No results for '{}'", args.query);
    } else {
        println!("{}", display::search_results(&view));
    }
    Ok(())
}
