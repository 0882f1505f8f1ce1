use axum::response::Response;
use serde::Serialize;

use crate::taxonomy::{tag_display_name, CATEGORIES, TAG_GROUPS};
use crate::utils::response::success;

#[derive(Serialize)]
struct TagOption {
    value: &'static str,
    label: String,
}

#[derive(Serialize)]
struct TagGroupPayload {
    name: &'static str,
    tags: Vec<TagOption>,
}

pub async fn list_categories() -> Response {
    success(CATEGORIES, "Categories retrieved")
}

pub async fn list_tags() -> Response {
    let groups: Vec<TagGroupPayload> = TAG_GROUPS
        .iter()
        .map(|group| TagGroupPayload {
            name: group.name,
            tags: group
                .tags
                .iter()
                .map(|tag| TagOption {
                    value: *tag,
                    label: tag_display_name(tag),
                })
                .collect(),
        })
        .collect();
    success(groups, "Tags retrieved")
}
