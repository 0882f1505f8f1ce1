use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TagGroup {
    pub name: &'static str,
    pub tags: &'static [&'static str],
}

pub const TAG_GROUPS: &[TagGroup] = &[
    TagGroup {
        name: "audience",
        tags: &[
            "family-friendly",
            "kids-only",
            "adults-only",
            "seniors-welcome",
            "teens",
            "all-ages",
        ],
    },
    TagGroup {
        name: "cost",
        tags: &["free", "paid", "donation-based", "bring-cash", "registration-fee"],
    },
    TagGroup {
        name: "setting",
        tags: &["outdoors", "indoors", "hybrid", "online", "rain-or-shine"],
    },
    TagGroup {
        name: "experience",
        tags: &[
            "beginner-friendly",
            "all-levels",
            "intermediate",
            "advanced",
            "no-experience-needed",
        ],
    },
    TagGroup {
        name: "accessibility",
        tags: &[
            "wheelchair-accessible",
            "pet-friendly",
            "parking-available",
            "public-transit",
            "asl-interpreted",
        ],
    },
    TagGroup {
        name: "format",
        tags: &[
            "workshop",
            "hands-on",
            "lecture",
            "interactive",
            "competition",
            "festival",
            "market",
            "networking",
            "drop-in",
            "registration-required",
        ],
    },
    TagGroup {
        name: "special",
        tags: &[
            "recurring",
            "seasonal",
            "limited-capacity",
            "early-bird-pricing",
            "local-vendors",
            "charity",
            "volunteer-opportunity",
            "bring-your-own",
            "refreshments-provided",
        ],
    },
];

/// Flat list of every suggested tag, in group order.
pub fn suggested_tags() -> Vec<&'static str> {
    TAG_GROUPS
        .iter()
        .flat_map(|group| group.tags.iter().copied())
        .collect()
}

/// `family-friendly` -> `Family Friendly`.
pub fn tag_display_name(tag: &str) -> String {
    tag.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Splits a comma separated tag field. Entries are trimmed, empties dropped,
/// and repeats collapsed keeping the first occurrence.
pub fn parse_tag_input(input: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in input.split(',').map(str::trim).filter(|tag| !tag.is_empty()) {
        if !tags.iter().any(|seen| seen == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_title_cases_each_word() {
        assert_eq!(tag_display_name("family-friendly"), "Family Friendly");
        assert_eq!(tag_display_name("free"), "Free");
        assert_eq!(tag_display_name("asl-interpreted"), "Asl Interpreted");
    }

    #[test]
    fn tag_input_is_trimmed_and_deduplicated() {
        assert_eq!(
            parse_tag_input(" free, outdoors ,, free,  "),
            vec!["free".to_string(), "outdoors".to_string()]
        );
        assert!(parse_tag_input("  ,  ").is_empty());
    }

    #[test]
    fn suggested_tags_cover_all_groups() {
        let tags = suggested_tags();
        assert_eq!(tags.len(), 45);
        assert!(tags.contains(&"refreshments-provided"));
    }
}
