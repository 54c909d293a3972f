//! Search command handlers

use crate::cli::PageArgs;
use crate::config::Config;
use crate::models::{Building, Lang, SearchResult};
use crate::search::{LocationQuery, SearchFilters};
use crate::state::SharedState;

#[allow(clippy::too_many_arguments)]
pub async fn cmd_search(
    config: Config,
    query: &[String],
    prefectures: Vec<String>,
    years: Vec<String>,
    types: Vec<String>,
    photos: bool,
    videos: bool,
    session: Option<String>,
    page: PageArgs,
) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;

    let filters = SearchFilters {
        keywords: query.join(" "),
        prefectures: prefectures.into_iter().collect(),
        completion_years: years.into_iter().collect(),
        building_types: types.into_iter().collect(),
        has_photos: photos,
        has_videos: videos,
        session_id: session,
    };

    let result = state
        .search(&filters, page.page, page.limit, page.lang)
        .await;
    print_result(&result, page.lang, page.json)
}

pub async fn cmd_near(
    config: Config,
    lat: f64,
    lng: f64,
    radius: Option<f64>,
    photos: bool,
    videos: bool,
    page: PageArgs,
) -> anyhow::Result<()> {
    let radius_km = radius.unwrap_or(config.search.default_radius_km);
    let state = SharedState::new(config).await?;

    let query = LocationQuery {
        has_photos: photos,
        has_videos: videos,
        ..LocationQuery::new(lat, lng, radius_km)
    };
    if !query.is_valid() {
        println!("Invalid location: lat must be within ±90, lng within ±180 and radius > 0.");
        return Ok(());
    }

    let result = state
        .search_by_location(&query, page.page, page.limit, page.lang)
        .await;
    print_result(&result, page.lang, page.json)
}

pub async fn cmd_architect(config: Config, slug: &str, page: PageArgs) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;
    let result = state
        .search_by_architect_slug(slug, page.page, page.limit, page.lang)
        .await;

    if !page.json {
        match &result.architect_info {
            Some(info) => {
                let name = info.name_en.as_deref().unwrap_or_default();
                println!("{} {} ({})", info.name_ja, name, info.slug);
            }
            None => {
                println!("Architect '{slug}' not found.");
                return Ok(());
            }
        }
    }

    print_result(&result, page.lang, page.json)
}

pub(super) fn print_result(result: &SearchResult, lang: Lang, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    if result.degraded {
        println!("Search is temporarily unavailable. Check the logs for details.");
        return Ok(());
    }

    if result.items.is_empty() {
        println!("No buildings found.");
        return Ok(());
    }

    println!(
        "Buildings ({} total, page {}/{})",
        result.total, result.page, result.total_pages
    );
    if let Some(cache) = result.cache {
        println!("Cache: {:?} (age {}s)", cache.status, cache.age_secs);
    }
    println!("{:-<70}", "");

    for building in &result.items {
        print_building_line(building, lang);
    }

    Ok(())
}

fn print_building_line(building: &Building, lang: Lang) {
    let media = match (building.has_photo(), building.has_video()) {
        (true, true) => "📷🎬",
        (true, false) => "📷",
        (false, true) => "🎬",
        (false, false) => "•",
    };

    let distance = building
        .distance_km
        .map(|d| format!(" [{d:.2} km]"))
        .unwrap_or_default();

    println!("{media} {}{distance}", building.title);

    let architects: Vec<&str> = building
        .architects
        .iter()
        .map(|a| a.display_name(lang))
        .collect();
    println!(
        "  {} | {} | {} | {}",
        building.slug,
        building.prefecture,
        building.completion_years,
        architects.join(", ")
    );
}
