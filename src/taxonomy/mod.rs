//! Static reference data: event categories, suggested tags and the town list.

pub mod categories;
pub mod tags;
pub mod towns;

pub use categories::{resolve_category, Category, CATEGORIES};
pub use tags::{parse_tag_input, tag_display_name, TagGroup, suggested_tags, TAG_GROUPS};
pub use towns::{format_town_name, is_popular_town, town_slug, TOWN_NAMES};
