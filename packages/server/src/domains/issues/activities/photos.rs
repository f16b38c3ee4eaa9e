use tracing::info;

use crate::common::{CivicResult, IssueId, PhotoId, UserId};
use crate::domains::issues::data::require_text;
use crate::domains::issues::models::{Issue, IssuePhoto};
use crate::kernel::ServerDeps;

/// Attach a blob-store URL to an issue. The URL is stored as given.
pub async fn attach_photo(
    issue_id: IssueId,
    photo_url: String,
    caption: Option<String>,
    uploaded_by: Option<UserId>,
    deps: &ServerDeps,
) -> CivicResult<IssuePhoto> {
    require_text("photo url", &photo_url)?;

    let mut tx = deps.db_pool.begin().await?;
    Issue::lock(issue_id, &mut *tx).await?;
    let photo = IssuePhoto {
        id: PhotoId::new(),
        issue_id,
        photo_url,
        caption: caption.filter(|c| !c.trim().is_empty()),
        uploaded_by,
        created_at: deps.clock.now(),
    }
    .insert(&mut *tx)
    .await?;
    tx.commit().await?;

    info!(issue_id = %issue_id, photo_id = %photo.id, "Photo attached");
    Ok(photo)
}
