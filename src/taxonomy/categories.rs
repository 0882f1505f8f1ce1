use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

pub const CATEGORIES: &[Category] = &[
    Category {
        id: "community",
        name: "Community",
        description: "Local gatherings, festivals, and community events",
        icon: "🏘️",
    },
    Category {
        id: "music",
        name: "Music",
        description: "Concerts, live performances, and musical events",
        icon: "🎵",
    },
    Category {
        id: "sports",
        name: "Sports",
        description: "Athletic events, tournaments, and recreational activities",
        icon: "⚽",
    },
    Category {
        id: "food",
        name: "Food & Drink",
        description: "Dining experiences, food festivals, and tastings",
        icon: "🍽️",
    },
    Category {
        id: "education",
        name: "Education",
        description: "Workshops, seminars, and learning opportunities",
        icon: "📚",
    },
    Category {
        id: "business",
        name: "Business",
        description: "Networking, conferences, and professional events",
        icon: "💼",
    },
    Category {
        id: "culture",
        name: "Arts & Culture",
        description: "Art exhibitions, theater, and cultural celebrations",
        icon: "🎨",
    },
    Category {
        id: "wellness",
        name: "Health & Wellness",
        description: "Fitness, wellness workshops, and health events",
        icon: "🧘",
    },
];

pub fn category_by_id(id: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|category| category.id == id)
}

/// Resolves free text ("Music", "food & drink", "sports") to a category,
/// matching id or display name case-insensitively.
pub fn resolve_category(text: &str) -> Option<&'static Category> {
    let needle = text.trim();
    if needle.is_empty() {
        return None;
    }
    CATEGORIES.iter().find(|category| {
        category.id.eq_ignore_ascii_case(needle) || category.name.eq_ignore_ascii_case(needle)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_by_id_or_name() {
        assert_eq!(resolve_category("music").map(|c| c.id), Some("music"));
        assert_eq!(resolve_category("Food & Drink").map(|c| c.id), Some("food"));
        assert_eq!(resolve_category("  ARTS & CULTURE ").map(|c| c.id), Some("culture"));
        assert!(resolve_category("a deal").is_none());
        assert!(resolve_category("").is_none());
    }

    #[test]
    fn category_ids_are_unique() {
        for (i, a) in CATEGORIES.iter().enumerate() {
            assert!(CATEGORIES[i + 1..].iter().all(|b| b.id != a.id));
        }
        assert!(category_by_id("wellness").is_some());
    }
}
