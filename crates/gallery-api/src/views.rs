//! Conversions from database rows to the wire models.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use gallery_db::models::{ImageRow, UserRow};
use gallery_types::models::{AccountInfo, Image, PublicUser};

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let ts = DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("bad stored timestamp {:?}", value))?;
    Ok(ts.with_timezone(&Utc))
}

pub fn image(row: ImageRow) -> Result<Image> {
    Ok(Image {
        id: row.id.parse::<Uuid>().context("bad image id")?,
        title: row.title,
        description: row.description,
        image_url: row.image_url,
        storage_ref: row.storage_ref,
        user_id: row.user_id.parse::<Uuid>().context("bad owner id")?,
        username: row.username,
        created_at: parse_timestamp(&row.created_at)?,
    })
}

pub fn images(rows: Vec<ImageRow>) -> Result<Vec<Image>> {
    rows.into_iter().map(image).collect()
}

pub fn public_user(row: UserRow) -> Result<PublicUser> {
    Ok(PublicUser {
        id: row.id.parse::<Uuid>().context("bad user id")?,
        username: row.username,
        created_at: parse_timestamp(&row.created_at)?,
    })
}

pub fn account_info(row: UserRow) -> Result<AccountInfo> {
    Ok(AccountInfo {
        id: row.id.parse::<Uuid>().context("bad user id")?,
        username: row.username,
        email: row.email,
        created_at: parse_timestamp(&row.created_at)?,
    })
}
