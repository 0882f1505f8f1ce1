/// Display names of the towns the district covers.
pub const TOWN_NAMES: &[&str] = &["Timmins", "Kapuskasing", "Cochrane", "Iroquois Falls"];

const POPULAR_TOWNS: &[&str] = &["timmins", "kapuskasing", "cochrane"];

/// `Iroquois Falls` -> `iroquois-falls`.
pub fn town_slug(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "-")
}

/// `iroquois-falls` -> `Iroquois Falls`.
pub fn format_town_name(slug: &str) -> String {
    slug.split(['-', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn is_popular_town(slug: &str) -> bool {
    POPULAR_TOWNS.contains(&slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_and_name_are_inverse_for_known_towns() {
        for name in TOWN_NAMES {
            assert_eq!(format_town_name(&town_slug(name)), *name);
        }
    }

    #[test]
    fn empty_slug_formats_to_empty_name() {
        assert_eq!(format_town_name(""), "");
        assert!(is_popular_town("timmins"));
        assert!(!is_popular_town("iroquois-falls"));
    }
}
