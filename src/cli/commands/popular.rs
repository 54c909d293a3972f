//! Popular-search command handlers

use crate::config::Config;
use crate::models::SearchType;
use crate::state::SharedState;

pub async fn cmd_popular(
    config: Config,
    page: u64,
    limit: Option<u64>,
    query: Option<&str>,
    search_type: Option<SearchType>,
    json: bool,
) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;
    let popular = state
        .get_popular_searches(page, limit, query, search_type)
        .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&popular)?);
        return Ok(());
    }

    if popular.searches.is_empty() {
        println!("No popular searches yet.");
        return Ok(());
    }

    println!(
        "Popular searches ({} total, page {}/{})",
        popular.total, popular.page, popular.total_pages
    );
    println!("{:-<70}", "");

    for (i, search) in popular.searches.iter().enumerate() {
        println!(
            "{:>3}. {} [{}] {} searches, {} users",
            i + 1,
            search.query,
            search.search_type,
            search.total_searches,
            search.unique_users
        );
        println!("     {}", search.link);
    }

    Ok(())
}

pub async fn cmd_prune(config: Config, days: i64) -> anyhow::Result<()> {
    if days < 1 {
        println!("--days must be at least 1");
        return Ok(());
    }

    let state = SharedState::new(config).await?;
    let removed = state.prune_search_log(days).await?;
    println!("✓ Removed {removed} search log entries older than {days} days");
    Ok(())
}
