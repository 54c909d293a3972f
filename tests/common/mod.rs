#![allow(dead_code)]

use std::path::PathBuf;

use pocketnavi::config::Config;
use pocketnavi::db::Dataset;
use pocketnavi::models::Building;
use pocketnavi::state::SharedState;
use serde_json::json;

pub struct TestApp {
    pub state: SharedState,
    pub cache_root: PathBuf,
    pub db_path: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        std::fs::remove_dir_all(&self.cache_root).ok();
        std::fs::remove_file(&self.db_path).ok();
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let id = uuid::Uuid::new_v4();
    let db_path = std::env::temp_dir().join(format!("pocketnavi-test-{id}.db"));
    let cache_root = std::env::temp_dir().join(format!("pocketnavi-test-cache-{id}"));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.cache.root = cache_root.clone();
    config.cache.lock_retry_ms = 10;
    configure(&mut config);

    let state = SharedState::new(config)
        .await
        .expect("failed to create shared state");

    state
        .store
        .import_dataset(&fixture_dataset())
        .await
        .expect("failed to import fixture dataset");

    TestApp {
        state,
        cache_root,
        db_path,
    }
}

/// Six buildings in Tokyo plus three elsewhere. Ids follow list order; the
/// last building lists its architects against their id order.
pub fn fixture_dataset() -> Dataset {
    serde_json::from_value(json!({
        "architects": [
            { "slug": "tadao-ando", "name_ja": "安藤忠雄", "name_en": "Tadao Ando" },
            { "slug": "kengo-kuma", "name_ja": "隈研吾", "name_en": "Kengo Kuma" },
            { "slug": "kenzo-tange", "name_ja": "丹下健三", "name_en": "Kenzo Tange" }
        ],
        "buildings": [
            {
                "uid": "b001", "slug": "church-of-the-light",
                "title": "光の教会", "title_en": "Church of the Light",
                "location": "大阪府茨木市", "location_en": "Ibaraki, Osaka",
                "prefectures": "大阪府", "prefectures_en": "Osaka",
                "building_types": "教会", "building_types_en": "Church",
                "completion_years": "1989",
                "lat": 34.8166, "lng": 135.5683,
                "has_photo": "main.jpg",
                "architects": ["tadao-ando"]
            },
            {
                "uid": "b002", "slug": "omotesando-hills",
                "title": "表参道ヒルズ", "title_en": "Omotesando Hills",
                "location": "東京都渋谷区神宮前", "location_en": "Jingumae, Shibuya, Tokyo",
                "prefectures": "東京都", "prefectures_en": "Tokyo",
                "building_types": "商業施設", "building_types_en": "Commercial",
                "completion_years": "2006",
                "lat": 35.6672, "lng": 139.7087,
                "has_photo": "main.jpg",
                "architects": ["tadao-ando", "kengo-kuma"]
            },
            {
                "uid": "b003", "slug": "yoyogi-national-gymnasium",
                "title": "国立代々木競技場", "title_en": "Yoyogi National Gymnasium",
                "location": "東京都渋谷区神南", "location_en": "Jinnan, Shibuya, Tokyo",
                "prefectures": "東京都", "prefectures_en": "Tokyo",
                "building_types": "体育館", "building_types_en": "Gymnasium",
                "completion_years": "1964",
                "lat": 35.6674, "lng": 139.7000,
                "has_photo": "main.jpg",
                "architects": ["kenzo-tange"]
            },
            {
                "uid": "b004", "slug": "japan-national-stadium",
                "title": "国立競技場", "title_en": "Japan National Stadium",
                "location": "東京都新宿区霞ヶ丘町", "location_en": "Kasumigaokamachi, Shinjuku, Tokyo",
                "prefectures": "東京都", "prefectures_en": "Tokyo",
                "building_types": "競技場", "building_types_en": "Stadium",
                "completion_years": "2019",
                "lat": 35.6778, "lng": 139.7145,
                "architects": ["kengo-kuma"]
            },
            {
                "uid": "b005", "slug": "suginami-house",
                "title": "杉並の住宅", "title_en": "Suginami House",
                "location": "東京都杉並区", "location_en": "Suginami, Tokyo",
                "prefectures": "東京都", "prefectures_en": "Tokyo",
                "building_types": "住宅", "building_types_en": "House",
                "completion_years": "2010",
                "lat": 35.6995, "lng": 139.6364,
                "youtube_url": "https://youtu.be/suginami",
                "architects": ["kengo-kuma"]
            },
            {
                "uid": "b006", "slug": "benesse-house",
                "title": "ベネッセハウス", "title_en": "Benesse House",
                "location": "香川県直島町", "location_en": "Naoshima, Kagawa",
                "prefectures": "香川県", "prefectures_en": "Kagawa",
                "building_types": "美術館/ホテル", "building_types_en": "Museum/Hotel",
                "completion_years": "1992",
                "has_photo": "main.jpg",
                "architects": ["tadao-ando"]
            },
            {
                "uid": "b007", "slug": "ando-residence",
                "title": "安藤邸", "title_en": "Ando Residence",
                "location": "東京都中野区", "location_en": "Nakano, Tokyo",
                "prefectures": "東京都", "prefectures_en": "Tokyo",
                "building_types": "住宅", "building_types_en": "House",
                "completion_years": "1975",
                "lat": 35.69, "lng": 139.66,
                "architects": ["kenzo-tange"]
            },
            {
                "uid": "b008", "slug": "tokyo-skytree",
                "title": "東京スカイツリー", "title_en": "Tokyo Skytree",
                "location": "東京都墨田区", "location_en": "Sumida, Tokyo",
                "prefectures": "東京都", "prefectures_en": "Tokyo",
                "building_types": "電波塔", "building_types_en": "Tower",
                "completion_years": "2012",
                "lat": 35.7101, "lng": 139.8107,
                "has_photo": "main.jpg",
                "youtube_url": "https://youtu.be/skytree"
            },
            {
                "uid": "b009", "slug": "setouchi-art-pavilion",
                "title": "瀬戸内アートパビリオン", "title_en": "Setouchi Art Pavilion",
                "location": "広島県広島市", "location_en": "Hiroshima, Hiroshima",
                "prefectures": "広島県", "prefectures_en": "Hiroshima",
                "building_types": "資料館", "building_types_en": "Archive",
                "completion_years": "1955",
                "lat": 34.3915, "lng": 132.4525,
                "architects": ["kenzo-tange", "tadao-ando"]
            }
        ]
    }))
    .expect("fixture dataset is valid")
}

pub fn slugs(items: &[Building]) -> Vec<&str> {
    items.iter().map(|b| b.slug.as_str()).collect()
}

/// Case-insensitive (ASCII) substring match against the keyword fields of a
/// transformed building.
pub fn matches_keyword(building: &Building, token: &str) -> bool {
    let token = token.to_lowercase();
    let hit = |value: &str| value.to_lowercase().contains(&token);

    [
        building.title.as_str(),
        building.title_other.as_str(),
        building.location.as_str(),
        building.location_other.as_str(),
    ]
    .into_iter()
    .chain(building.building_types.iter().map(String::as_str))
    .chain(building.building_types_other.iter().map(String::as_str))
    .any(hit)
        || building
            .architects
            .iter()
            .any(|a| hit(&a.name_ja) || hit(&a.name_en))
}
