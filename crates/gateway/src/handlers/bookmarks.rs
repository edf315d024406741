//! Shared mark/unmark flow for interesting and downloaded bookmarks

use axum::{http::StatusCode, Json};
use scholarhub_common::{
    db::{BookmarkKind, Repository},
    errors::{AppError, Result},
    metrics,
};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct BookmarkResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<bool>,
}

fn marked_message(kind: BookmarkKind, created: bool) -> String {
    if created {
        format!("{} marked as {}", kind.item(), kind.relation())
    } else {
        format!("{} was already marked as {}", kind.item(), kind.relation())
    }
}

async fn ensure_exists(repo: &Repository, kind: BookmarkKind, item_id: Uuid) -> Result<()> {
    match kind {
        BookmarkKind::InterestingDataset => repo.get_dataset(item_id).await.map(|_| ()),
        BookmarkKind::InterestingPaper | BookmarkKind::DownloadedPaper => {
            repo.get_paper(item_id).await.map(|_| ())
        }
    }
}

/// 201 when the bookmark is new, 200 when it already existed
pub async fn mark(
    repo: &Repository,
    kind: BookmarkKind,
    user_id: Uuid,
    item_id: Uuid,
) -> Result<(StatusCode, Json<BookmarkResponse>)> {
    ensure_exists(repo, kind, item_id).await?;
    let created = repo.add_bookmark(kind, user_id, item_id).await?;

    if created {
        metrics::record_bookmark(kind.label(), "add");
        tracing::info!(user_id = %user_id, item_id = %item_id, kind = kind.label(), "Bookmark added");
    }

    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((
        status,
        Json(BookmarkResponse {
            message: marked_message(kind, created),
            created: Some(created),
        }),
    ))
}

/// 404 when the item was not bookmarked
pub async fn unmark(
    repo: &Repository,
    kind: BookmarkKind,
    user_id: Uuid,
    item_id: Uuid,
) -> Result<Json<BookmarkResponse>> {
    if !repo.remove_bookmark(kind, user_id, item_id).await? {
        return Err(AppError::BookmarkNotFound {
            item: kind.item().to_string(),
            bookmark: kind.relation(),
        });
    }

    metrics::record_bookmark(kind.label(), "remove");
    tracing::info!(user_id = %user_id, item_id = %item_id, kind = kind.label(), "Bookmark removed");

    Ok(Json(BookmarkResponse {
        message: format!("{} unmarked as {}", kind.item(), kind.relation()),
        created: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marked_message() {
        assert_eq!(
            marked_message(BookmarkKind::DownloadedPaper, true),
            "Paper marked as downloaded"
        );
        assert_eq!(
            marked_message(BookmarkKind::InterestingDataset, false),
            "Dataset was already marked as interesting"
        );
    }
}
