//! Categories and schools of the central item database.

pub const API_ROOT: &str = "https://www.wizard101central.com";

/// Every item category, plural, as used in the `category` column.
pub const CATEGORIES: [&str; 10] = [
    "hats", "robes", "boots", "athames", "amulets", "rings", "decks", "mounts", "jewels", "talents",
];

/// Singular spellings of [`CATEGORIES`], position for position.
pub const CATEGORIES_SINGULAR: [&str; 10] = [
    "hat", "robe", "boot", "athame", "amulet", "ring", "deck", "mount", "jewel", "talents",
];

/// Categories stored as [`WearableItem`](crate::records::WearableItem)s:
/// everything but jewels and talents.
pub const WEARABLE_CATEGORIES: [&str; 8] = [
    "hats", "robes", "boots", "athames", "amulets", "rings", "decks", "mounts",
];

pub const SCHOOLS: [&str; 10] = [
    "fire", "storm", "ice", "myth", "death", "life", "balance", "sun", "star", "moon",
];

/// The plural category for a singular or plural spelling, ignoring case.
pub fn normalize_category(name: &str) -> Option<&'static str> {
    let name = name.trim();
    CATEGORIES
        .iter()
        .zip(CATEGORIES_SINGULAR.iter())
        .find(|(plural, singular)| {
            plural.eq_ignore_ascii_case(name) || singular.eq_ignore_ascii_case(name)
        })
        .map(|(plural, _)| *plural)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_category() {
        assert_eq!(normalize_category("hats"), Some("hats"));
        assert_eq!(normalize_category("Hat"), Some("hats"));
        assert_eq!(normalize_category(" ROBE "), Some("robes"));
        assert_eq!(normalize_category("talents"), Some("talents"));
        assert_eq!(normalize_category("pets"), None);
    }

    #[test]
    fn test_wearables_exclude_jewels_and_talents() {
        for category in WEARABLE_CATEGORIES {
            assert!(CATEGORIES.contains(&category));
        }
        assert!(!WEARABLE_CATEGORIES.contains(&"jewels"));
        assert!(!WEARABLE_CATEGORIES.contains(&"talents"));
        assert_eq!(WEARABLE_CATEGORIES.len(), CATEGORIES.len() - 2);
    }
}
