//! Bidirectional table between romanized and native prefecture labels.
//!
//! Buildings store the native name (`東京都`); callers may send either label.

const PREFECTURES: [(&str, &str); 47] = [
    ("Hokkaido", "北海道"),
    ("Aomori", "青森県"),
    ("Iwate", "岩手県"),
    ("Miyagi", "宮城県"),
    ("Akita", "秋田県"),
    ("Yamagata", "山形県"),
    ("Fukushima", "福島県"),
    ("Ibaraki", "茨城県"),
    ("Tochigi", "栃木県"),
    ("Gunma", "群馬県"),
    ("Saitama", "埼玉県"),
    ("Chiba", "千葉県"),
    ("Tokyo", "東京都"),
    ("Kanagawa", "神奈川県"),
    ("Niigata", "新潟県"),
    ("Toyama", "富山県"),
    ("Ishikawa", "石川県"),
    ("Fukui", "福井県"),
    ("Yamanashi", "山梨県"),
    ("Nagano", "長野県"),
    ("Gifu", "岐阜県"),
    ("Shizuoka", "静岡県"),
    ("Aichi", "愛知県"),
    ("Mie", "三重県"),
    ("Shiga", "滋賀県"),
    ("Kyoto", "京都府"),
    ("Osaka", "大阪府"),
    ("Hyogo", "兵庫県"),
    ("Nara", "奈良県"),
    ("Wakayama", "和歌山県"),
    ("Tottori", "鳥取県"),
    ("Shimane", "島根県"),
    ("Okayama", "岡山県"),
    ("Hiroshima", "広島県"),
    ("Yamaguchi", "山口県"),
    ("Tokushima", "徳島県"),
    ("Kagawa", "香川県"),
    ("Ehime", "愛媛県"),
    ("Kochi", "高知県"),
    ("Fukuoka", "福岡県"),
    ("Saga", "佐賀県"),
    ("Nagasaki", "長崎県"),
    ("Kumamoto", "熊本県"),
    ("Oita", "大分県"),
    ("Miyazaki", "宮崎県"),
    ("Kagoshima", "鹿児島県"),
    ("Okinawa", "沖縄県"),
];

/// Maps any accepted label to the native name stored on buildings.
/// Unknown labels pass through trimmed.
#[must_use]
pub fn to_native(label: &str) -> String {
    let label = label.trim();
    PREFECTURES
        .iter()
        .find(|(en, ja)| en.eq_ignore_ascii_case(label) || *ja == label)
        .map_or_else(|| label.to_string(), |(_, ja)| (*ja).to_string())
}

/// Maps a native name to its romanized label. Unknown labels pass through trimmed.
#[must_use]
pub fn to_english(label: &str) -> String {
    let label = label.trim();
    PREFECTURES
        .iter()
        .find(|(en, ja)| *ja == label || en.eq_ignore_ascii_case(label))
        .map_or_else(|| label.to_string(), |(en, _)| (*en).to_string())
}

/// Whether the label names a known prefecture in either label space.
#[must_use]
pub fn is_known(label: &str) -> bool {
    let label = label.trim();
    PREFECTURES
        .iter()
        .any(|(en, ja)| en.eq_ignore_ascii_case(label) || *ja == label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn romanized_maps_to_native() {
        assert_eq!(to_native("Tokyo"), "東京都");
        assert_eq!(to_native("osaka"), "大阪府");
        assert_eq!(to_native(" Hokkaido "), "北海道");
    }

    #[test]
    fn native_is_unchanged() {
        assert_eq!(to_native("京都府"), "京都府");
    }

    #[test]
    fn unknown_label_passes_through() {
        assert_eq!(to_native("Atlantis"), "Atlantis");
        assert_eq!(to_english("東京"), "東京");
        assert!(!is_known("Atlantis"));
    }

    #[test]
    fn native_maps_to_english() {
        assert_eq!(to_english("沖縄県"), "Okinawa");
        assert_eq!(to_english("Okinawa"), "Okinawa");
        assert!(is_known("沖縄県"));
    }
}
