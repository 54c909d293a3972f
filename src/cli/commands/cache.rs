//! Cache maintenance command handlers

use serde_json::json;

use crate::cache::PopularCacheState;
use crate::config::Config;
use crate::state::SharedState;

pub async fn cmd_cache_clear(config: Config) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;
    let removed = state.clear_caches().await?;
    println!("✓ Removed {removed} cached results and the popular-search cache");
    Ok(())
}

pub async fn cmd_cache_stats(config: Config, json: bool) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;
    let (results, popular) = state.cache_status().await?;

    if json {
        let report = json!({ "results": results, "popular": popular });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Result cache ({})", state.search.cache().dir().display());
    println!(
        "  enabled: {} | files: {} | expired: {} | size: {} KiB",
        results.enabled,
        results.total_files,
        results.expired_files,
        results.total_bytes / 1024
    );

    println!("Popular-search cache");
    match popular.state {
        PopularCacheState::Missing => println!("  not built yet"),
        PopularCacheState::Valid | PopularCacheState::Expired => println!(
            "  {:?} | entries: {} | age: {}s / {}s",
            popular.state,
            popular.entries,
            popular.age_secs.unwrap_or_default(),
            popular.max_age_secs
        ),
    }

    Ok(())
}
