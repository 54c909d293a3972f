//! Building detail command handler

use crate::config::Config;
use crate::models::Lang;
use crate::state::SharedState;

pub async fn cmd_building(
    config: Config,
    slug: &str,
    lang: Lang,
    json: bool,
) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;

    let Some(building) = state.get_by_slug(slug, lang).await else {
        println!("Building '{slug}' not found.");
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&building)?);
        return Ok(());
    }

    println!("{}", building.title);
    if !building.title_other.is_empty() {
        println!("  ({})", building.title_other);
    }
    println!("{:-<70}", "");
    println!("Location:   {} ({})", building.location, building.prefecture);
    println!("Completed:  {}", building.completion_years);
    println!("Types:      {}", building.building_types.join(" / "));

    if let (Some(lat), Some(lng)) = (building.lat, building.lng) {
        println!("Coords:     {lat:.5}, {lng:.5}");
    }

    for architect in &building.architects {
        println!(
            "Architect:  {} ({})",
            architect.display_name(lang),
            architect.slug
        );
    }

    if let Some(url) = &building.thumbnail_url {
        println!("Photo:      {url}");
    }
    if let Some(url) = building.youtube_url.as_deref().filter(|u| !u.is_empty()) {
        println!("Video:      {url}");
    }

    Ok(())
}
