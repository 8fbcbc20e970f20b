use axum::{
    Extension, Json,
    extract::{Multipart, Path, State, multipart::Field},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use bytes::{Bytes, BytesMut};
use tracing::{debug, info, warn};
use uuid::Uuid;

use gallery_db::models::ImageRow;
use gallery_db::timestamp_now;
use gallery_types::api::{Claims, MessageResponse, UploadResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::host::ImageUpload;
use crate::{run_db, views};

/// 5 MB upload limit for a single image
pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024;

/// Body limit for the upload route: the image plus room for the text
/// fields and multipart framing.
pub const MAX_UPLOAD_BODY: usize = MAX_IMAGE_SIZE + 64 * 1024;

/// The global feed never returns more than this many images.
pub const FEED_LIMIT: u32 = 50;

/// POST /api/images/upload — multipart `image` + `title` (+ `description`).
///
/// The file's MIME type is checked as soon as its part header arrives, so a
/// non-image never reaches the image host.
pub async fn upload(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(mut multipart, _): WithRejection<Multipart, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let mut file: Option<ImageUpload> = None;
    let mut title: Option<String> = None;
    let mut description: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("image") => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                if !content_type.starts_with("image/") {
                    return Err(ApiError::bad_request("Only image files are allowed"));
                }
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = read_capped(field, MAX_IMAGE_SIZE).await?;
                if !bytes.is_empty() {
                    file = Some(ImageUpload {
                        bytes,
                        file_name,
                        content_type,
                    });
                }
            }
            Some("title") => title = Some(field.text().await?),
            Some("description") => description = Some(field.text().await?),
            _ => {}
        }
    }

    let file = file.ok_or_else(|| ApiError::bad_request("No image file provided"))?;
    let title = title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::bad_request("Title is required"))?;

    let stored = state.host.upload(file).await.map_err(ApiError::Upload)?;

    let row = ImageRow {
        id: Uuid::new_v4().to_string(),
        title,
        description: description.unwrap_or_default(),
        image_url: stored.url,
        storage_ref: stored.storage_ref,
        user_id: claims.sub.to_string(),
        username: claims.username.clone(),
        created_at: timestamp_now(),
    };

    let insert = row.clone();
    if let Err(e) = run_db(&state, move |db| db.insert_image(&insert)).await {
        // Don't leave the hosted object orphaned.
        if let Err(cleanup) = state.host.destroy(&row.storage_ref).await {
            warn!("Failed to release hosted image {}: {:#}", row.storage_ref, cleanup);
        }
        return Err(e);
    }

    info!("Image {} uploaded by {}", row.id, claims.username);

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "Image uploaded successfully".into(),
            image: views::image(row)?,
        }),
    ))
}

/// Reads a multipart field, failing as soon as it grows past `limit`.
async fn read_capped(mut field: Field<'_>, limit: usize) -> Result<Bytes, ApiError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.chunk().await? {
        if buf.len() + chunk.len() > limit {
            return Err(ApiError::PayloadTooLarge);
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

/// GET /api/images/all — global feed, newest first.
pub async fn list_all(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = run_db(&state, |db| db.list_recent_images(FEED_LIMIT)).await?;
    Ok(Json(views::images(rows)?))
}

/// GET /api/images/my-images — the caller's images, newest first.
pub async fn list_mine(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = claims.sub.to_string();
    let rows = run_db(&state, move |db| db.list_images_by_user_id(&uid)).await?;
    Ok(Json(views::images(rows)?))
}

/// GET /api/images/user/{username}
pub async fn list_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = run_db(&state, move |db| db.list_images_by_username(&username)).await?;
    Ok(Json(views::images(rows)?))
}

/// DELETE /api/images/{id}
///
/// Unknown ids, malformed ids and other users' images all get the same 404.
/// The hosted object is released before the record so a host failure leaves
/// the image intact and retryable.
pub async fn delete_image(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(image_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let not_found = || ApiError::not_found("Image not found or unauthorized");

    let image_id = image_id.parse::<Uuid>().map_err(|_| not_found())?.to_string();

    let uid = claims.sub.to_string();
    let iid = image_id.clone();
    let image = run_db(&state, move |db| db.get_owned_image(&iid, &uid))
        .await?
        .ok_or_else(not_found)?;

    state.host.destroy(&image.storage_ref).await?;

    let removed = run_db(&state, move |db| db.delete_image(&image_id)).await?;
    if !removed {
        debug!("Image {} was already removed by a concurrent delete", image.id);
    }

    info!("Image {} deleted by {}", image.id, claims.username);
    Ok(Json(MessageResponse::new("Image deleted successfully")))
}
