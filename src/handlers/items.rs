use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    handlers::link_preview::fetch_link_metadata,
    models::{
        ClipboardItem, CreateItemRequest, ItemKind, ListItemsQuery, SortOrder, UpdateItemRequest,
    },
    state::AppState,
};

/// Card gradients for captured links, picked by hostname length.
pub const LINK_COLORS: [&str; 6] = [
    "from-blue-500 to-purple-600",
    "from-green-500 to-blue-600",
    "from-purple-500 to-pink-600",
    "from-orange-500 to-red-600",
    "from-teal-500 to-cyan-600",
    "from-indigo-500 to-blue-600",
];

pub fn color_for_domain(domain: &str) -> &'static str {
    LINK_COLORS[domain.len() % LINK_COLORS.len()]
}

// ============================================================================
// Input validation
// ============================================================================

fn validation_error(e: validator::ValidationErrors) -> AppError {
    AppError::Validation(
        e.field_errors()
            .values()
            .flat_map(|v| v.iter())
            .filter_map(|e| e.message.as_ref())
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    )
}

fn item_not_found() -> AppError {
    AppError::NotFound("Item not found".into())
}

/// Apply search, category, folder and sort options to `items`.
pub fn apply_query(
    mut items: Vec<ClipboardItem>,
    query: &ListItemsQuery,
) -> AppResult<Vec<ClipboardItem>> {
    let kind = match query.kind.as_deref() {
        None | Some("") | Some("all") => None,
        Some(k) => Some(ItemKind::from_str(k).map_err(|_| {
            AppError::Validation(format!(
                "Invalid type '{k}'. Must be one of: all, text, link, image, file"
            ))
        })?),
    };
    let tag = query
        .tag
        .as_deref()
        .filter(|t| !t.is_empty() && *t != "all");
    let needle = query.q.as_deref().unwrap_or_default().to_lowercase();

    items.retain(|item| {
        item.matches_search(&needle)
            && kind.map_or(true, |k| item.kind == k)
            && tag.map_or(true, |t| item.tags.iter().any(|x| x == t))
    });

    match query.sort {
        SortOrder::Newest => items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
        SortOrder::Oldest => items.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
        // Stable: favorites first, otherwise store order.
        SortOrder::MostUsed => items.sort_by_key(|item| !item.favorite),
    }

    Ok(items)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/items
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ListItemsQuery>,
) -> AppResult<Json<Vec<ClipboardItem>>> {
    let items = apply_query(state.store.list()?, &query)?;
    Ok(Json(items))
}

/// GET /api/items/tags
pub async fn list_tags(State(state): State<AppState>) -> AppResult<Json<Vec<String>>> {
    let mut tags: Vec<String> = Vec::new();
    for item in state.store.list()? {
        for tag in item.tags {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    }
    Ok(Json(tags))
}

/// POST /api/items
///
/// Links are enriched with fetched metadata before they are stored; a page
/// that cannot be fetched still yields an item titled with its hostname.
pub async fn create_item(
    State(state): State<AppState>,
    Json(req): Json<CreateItemRequest>,
) -> AppResult<(StatusCode, Json<ClipboardItem>)> {
    req.validate().map_err(validation_error)?;
    if req.content.trim().is_empty() {
        return Err(AppError::Validation("Content is required".into()));
    }

    let kind = req.kind.unwrap_or_else(|| ItemKind::detect(&req.content));
    let mut item = ClipboardItem::new(req.content, kind, req.tags);

    match kind {
        ItemKind::Link => {
            match fetch_link_metadata(&state.http_client, &state.fetch, &item.content).await {
                Ok(metadata) => {
                    item.color = Some(color_for_domain(&metadata.domain).to_string());
                    item.title = Some(metadata.title);
                    item.domain = Some(metadata.domain);
                    item.preview = Some(metadata.description);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Captured link has no usable URL, storing without metadata");
                }
            }
        }
        ItemKind::Text => item.title = Some("New Text".into()),
        ItemKind::Image | ItemKind::File => {}
    }

    let item = state.store.add(item)?;
    info!(id = %item.id, kind = %item.kind, "Clipboard item captured");
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /api/items/:id
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ClipboardItem>> {
    state
        .store
        .get(id)?
        .map(Json)
        .ok_or_else(item_not_found)
}

/// PATCH /api/items/:id
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateItemRequest>,
) -> AppResult<Json<ClipboardItem>> {
    req.validate().map_err(validation_error)?;

    let UpdateItemRequest {
        tags,
        favorite,
        title,
    } = req;

    state
        .store
        .update(id, &mut |item: &mut ClipboardItem| {
            if let Some(ref tags) = tags {
                item.tags = tags.clone();
            }
            if let Some(favorite) = favorite {
                item.favorite = favorite;
            }
            if let Some(ref title) = title {
                item.title = Some(title.clone());
            }
        })?
        .map(Json)
        .ok_or_else(item_not_found)
}

/// POST /api/items/:id/favorite
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ClipboardItem>> {
    state
        .store
        .update(id, &mut |item: &mut ClipboardItem| item.favorite = !item.favorite)?
        .map(Json)
        .ok_or_else(item_not_found)
}

/// DELETE /api/items/:id
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if !state.store.remove(id)? {
        return Err(item_not_found());
    }
    info!(%id, "Clipboard item deleted");
    Ok(StatusCode::NO_CONTENT)
}
