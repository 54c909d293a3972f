//! Result cache decorator and search logging through the shared state.

mod common;

use common::{slugs, spawn_app, spawn_app_with};
use pocketnavi::cache::CacheKey;
use pocketnavi::db::{Dataset, NewArchitect, NewBuilding, PopularQuery};
use pocketnavi::models::{CacheStatus, Lang, SearchResult, SearchType};
use pocketnavi::search::{LocationQuery, SearchFilters};
use pocketnavi::services::PageRequest;

fn without_cache(mut result: SearchResult) -> String {
    result.cache = None;
    serde_json::to_string(&result).expect("result serializes")
}

#[tokio::test]
async fn identical_requests_hit_the_cache() {
    let app = spawn_app().await;
    let filters = SearchFilters::keywords("安藤");

    let first = app.state.search(&filters, 1, Some(10), Lang::Ja).await;
    let second = app.state.search(&filters, 1, Some(10), Lang::Ja).await;

    let first_info = first.cache.expect("annotated");
    let second_info = second.cache.expect("annotated");
    assert_eq!(first_info.status, CacheStatus::Miss);
    assert!(second_info.hit);
    assert_eq!(second_info.created_at, first_info.created_at);
    assert_eq!(without_cache(first), without_cache(second));
}

#[tokio::test]
async fn normalized_variants_share_an_entry() {
    let app = spawn_app().await;

    let a = SearchFilters {
        session_id: Some("alice".into()),
        ..SearchFilters::keywords("  安藤 ")
    };
    let b = SearchFilters {
        session_id: Some("bob".into()),
        ..SearchFilters::keywords("安藤")
    };

    app.state.search(&a, 1, Some(10), Lang::Ja).await;
    let second = app.state.search(&b, 1, Some(10), Lang::Ja).await;
    assert!(second.cache.expect("annotated").hit);

    let other_lang = app.state.search(&b, 1, Some(10), Lang::En).await;
    assert!(!other_lang.cache.expect("annotated").hit);
}

#[tokio::test]
async fn location_results_are_cached_and_hydrated() {
    let app = spawn_app().await;
    let query = LocationQuery::new(35.68, 139.65, 5.0);

    let first = app
        .state
        .search_by_location(&query, 1, Some(10), Lang::Ja)
        .await;
    let second = app
        .state
        .search_by_location(&query, 1, Some(10), Lang::Ja)
        .await;

    assert!(second.cache.expect("annotated").hit);
    assert_eq!(without_cache(first), without_cache(second.clone()));
    assert!(second.items.iter().all(|b| !b.architects.is_empty()));
}

#[tokio::test]
async fn disabled_cache_is_reported() {
    let app = spawn_app_with(|config| config.cache.enabled = false).await;
    let filters = SearchFilters::keywords("住宅");

    let first = app.state.search(&filters, 1, None, Lang::Ja).await;
    let second = app.state.search(&filters, 1, None, Lang::Ja).await;

    assert_eq!(first.cache.expect("annotated").status, CacheStatus::Disabled);
    assert_eq!(second.cache.expect("annotated").status, CacheStatus::Disabled);

    let (stats, _) = app.state.cache_status().await.unwrap();
    assert!(!stats.enabled);
    assert_eq!(stats.total_files, 0);
}

#[tokio::test]
async fn clearing_forces_recomputation() {
    let app = spawn_app().await;
    let filters = SearchFilters::keywords("東京");

    app.state.search(&filters, 1, None, Lang::Ja).await;
    app.state.get_by_slug("tokyo-skytree", Lang::Ja).await;

    let (stats, _) = app.state.cache_status().await.unwrap();
    assert_eq!(stats.total_files, 2);

    assert_eq!(app.state.clear_caches().await.unwrap(), 2);
    let again = app.state.search(&filters, 1, None, Lang::Ja).await;
    assert_eq!(again.cache.expect("annotated").status, CacheStatus::Miss);
}

#[tokio::test]
async fn invalidating_one_key_leaves_others() {
    let app = spawn_app().await;
    let tokyo = SearchFilters::keywords("東京");
    let osaka = SearchFilters::keywords("大阪");

    app.state.search(&tokyo, 1, None, Lang::Ja).await;
    app.state.search(&osaka, 1, None, Lang::Ja).await;

    let page = PageRequest::new(1, 10, Lang::Ja);
    assert!(
        app.state
            .search
            .invalidate(&CacheKey::search(&tokyo, page))
            .await
            .unwrap()
    );

    assert!(!app.state.search(&tokyo, 1, None, Lang::Ja).await.cache.unwrap().hit);
    assert!(app.state.search(&osaka, 1, None, Lang::Ja).await.cache.unwrap().hit);
}

#[tokio::test]
async fn executed_searches_are_logged_with_their_type() {
    let app = spawn_app_with(|config| config.cache.enabled = false).await;

    for session in ["s1", "s2", "s2"] {
        let filters = SearchFilters {
            session_id: Some(session.into()),
            ..SearchFilters::keywords("安藤忠雄")
        };
        app.state.search(&filters, 1, None, Lang::Ja).await;
    }

    let params = PopularQuery {
        page: 1,
        limit: 10,
        text_filter: None,
        type_filter: None,
        since: chrono::Utc::now() - chrono::Duration::days(1),
        min_searches: 1,
    };
    let (rows, total) = app.state.store.popular_searches(&params).await.unwrap();

    assert_eq!(total, 1);
    assert_eq!(rows[0].query, "安藤忠雄");
    assert_eq!(SearchType::from_db(&rows[0].search_type), SearchType::Architect);
    // The repeated s2 search falls inside the duplicate window.
    assert_eq!(rows[0].total_searches, 2);
    assert_eq!(rows[0].unique_users, 2);
}

#[tokio::test]
async fn popular_view_links_to_the_detected_entity() {
    let app = spawn_app_with(|config| config.cache.enabled = false).await;

    for session in ["a", "b"] {
        for query in ["安藤忠雄", "光の教会", "大阪府", "コンクリート"] {
            let filters = SearchFilters {
                session_id: Some(session.into()),
                ..SearchFilters::keywords(query)
            };
            app.state.search(&filters, 1, None, Lang::Ja).await;
        }
    }

    let popular = app.state.get_popular_searches(1, Some(10), None, None).await;
    assert_eq!(popular.total, 4);

    let link = |query: &str| {
        popular
            .searches
            .iter()
            .find(|s| s.query == query)
            .map(|s| (s.search_type, s.link.clone()))
            .expect("query listed")
    };
    assert_eq!(
        link("安藤忠雄"),
        (SearchType::Architect, "/architects/tadao-ando/".to_string())
    );
    assert_eq!(
        link("光の教会"),
        (SearchType::Building, "/buildings/church-of-the-light/".to_string())
    );
    assert_eq!(
        link("大阪府"),
        (SearchType::Prefecture, "/index.php?prefectures=Osaka".to_string())
    );
    assert_eq!(link("コンクリート").0, SearchType::Text);

    let architects = app
        .state
        .get_popular_searches(1, Some(10), None, Some(SearchType::Architect))
        .await;
    assert_eq!(architects.total, 1);
}

#[tokio::test]
async fn import_rejects_unknown_architects_atomically() {
    let app = spawn_app().await;
    let before = app.state.store.count_all_buildings().await.unwrap();

    let dataset: Dataset = serde_json::from_value(serde_json::json!({
        "buildings": [
            { "uid": "x1", "slug": "orphan-a", "title": "孤立A" },
            { "uid": "x2", "slug": "orphan-b", "title": "孤立B", "architects": ["nobody"] }
        ]
    }))
    .unwrap();

    let err = app.state.store.import_dataset(&dataset).await.unwrap_err();
    assert!(err.to_string().contains("nobody"));
    assert_eq!(app.state.store.count_all_buildings().await.unwrap(), before);
}

#[tokio::test]
async fn cached_pages_survive_writes_until_cleared() {
    let app = spawn_app().await;
    let filters = SearchFilters::keywords("直島");

    let before = app.state.search(&filters, 1, None, Lang::Ja).await;
    assert_eq!(before.total, 1);

    let architect_id = app
        .state
        .store
        .add_architect(&NewArchitect {
            slug: "sanaa".into(),
            name_ja: "妹島和世".into(),
            name_en: Some("Kazuyo Sejima".into()),
            website: None,
        })
        .await
        .unwrap();
    let building_id = app
        .state
        .store
        .add_building(&NewBuilding {
            uid: "b010".into(),
            slug: "naoshima-ferry-terminal".into(),
            title: "海の駅なおしま".into(),
            title_en: Some("Naoshima Ferry Terminal".into()),
            location: Some("香川県直島町".into()),
            prefectures: Some("香川県".into()),
            ..NewBuilding::default()
        })
        .await
        .unwrap();
    app.state
        .store
        .link_architect(building_id, architect_id, 0)
        .await
        .unwrap();

    let cached = app.state.search(&filters, 1, None, Lang::Ja).await;
    assert!(cached.cache.expect("annotated").hit);
    assert_eq!(cached.total, 1);

    app.state.clear_caches().await.unwrap();
    let fresh = app.state.search(&filters, 1, None, Lang::Ja).await;
    assert_eq!(fresh.total, 2);
    let added = fresh
        .items
        .iter()
        .find(|b| b.slug == "naoshima-ferry-terminal")
        .expect("new building listed");
    assert_eq!(added.architects[0].slug, "sanaa");
}

#[tokio::test]
async fn removed_cache_root_only_costs_a_rebuild() {
    let app = spawn_app().await;
    let filters = SearchFilters::keywords("安藤");

    let popular = app.state.get_popular_searches(1, Some(20), None, None).await;
    assert_eq!(popular.total, 0);
    app.state.search(&filters, 1, None, Lang::Ja).await;

    std::fs::remove_dir_all(&app.cache_root).unwrap();

    let again = app.state.get_popular_searches(1, Some(20), None, None).await;
    assert_eq!(again, popular);

    let recomputed = app.state.search(&filters, 1, None, Lang::Ja).await;
    assert_eq!(recomputed.cache.expect("annotated").status, CacheStatus::Miss);
    let cached = app.state.search(&filters, 1, None, Lang::Ja).await;
    assert!(cached.cache.expect("annotated").hit);
}

#[tokio::test]
async fn nearby_radii_are_cached_separately() {
    let app = spawn_app().await;
    // Due north of the centre, 4.9998 km away.
    let lat = 10.0 + (4.9998_f64 / 6371.0).to_degrees();
    app.state
        .store
        .add_building(&NewBuilding {
            uid: "b011".into(),
            slug: "edge-pavilion".into(),
            title: "境界のパビリオン".into(),
            lat: Some(lat),
            lng: Some(10.0),
            ..NewBuilding::default()
        })
        .await
        .unwrap();

    let wide = app
        .state
        .search_by_location(&LocationQuery::new(10.0, 10.0, 5.0), 1, None, Lang::Ja)
        .await;
    assert_eq!(slugs(&wide.items), vec!["edge-pavilion"]);

    let narrow = app
        .state
        .search_by_location(&LocationQuery::new(10.0, 10.0, 4.9996), 1, None, Lang::Ja)
        .await;
    assert!(!narrow.cache.expect("annotated").hit);
    assert_eq!(narrow.total, 0);
    assert!(narrow.items.is_empty());
}

#[tokio::test]
async fn equivalent_page_sizes_share_an_entry() {
    let app = spawn_app_with(|config| config.search.max_limit = 50).await;
    let filters = SearchFilters::keywords("東京");
    let default_limit = app.state.config.search.default_limit;

    app.state.search(&filters, 1, Some(0), Lang::Ja).await;
    let same = app
        .state
        .search(&filters, 1, Some(default_limit), Lang::Ja)
        .await;
    assert!(same.cache.expect("annotated").hit);

    let capped = app.state.search(&filters, 1, Some(500), Lang::Ja).await;
    assert_eq!(capped.limit, 50);
    let also_capped = app.state.search(&filters, 1, Some(1000), Lang::Ja).await;
    assert!(also_capped.cache.expect("annotated").hit);

    let (stats, _) = app.state.cache_status().await.unwrap();
    assert_eq!(stats.total_files, 2);
}
