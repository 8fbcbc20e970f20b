use crate::models::{ImageRow, UserRow};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};

const USER_COLUMNS: &str = "id, username, email, password, created_at";
const IMAGE_COLUMNS: &str =
    "id, title, description, image_url, storage_ref, user_id, username, created_at";

impl Database {
    // -- Users --

    pub fn create_user(&self, user: &UserRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, email, password, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (&user.id, &user.username, &user.email, &user.password, &user.created_at),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    /// First user holding either the email or the username, if any.
    /// An email match wins when both exist so callers can report it first.
    pub fn find_conflicting_user(&self, email: &str, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users
                 WHERE email = ?1 OR username = ?2
                 ORDER BY (email = ?1) DESC
                 LIMIT 1"
            );
            let row = conn
                .query_row(&sql, (email, username), user_from_row)
                .optional()?;
            Ok(row)
        })
    }

    // -- Images --

    pub fn insert_image(&self, image: &ImageRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO images (id, title, description, image_url, storage_ref, user_id, username, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    image.id,
                    image.title,
                    image.description,
                    image.image_url,
                    image.storage_ref,
                    image.user_id,
                    image.username,
                    image.created_at,
                ],
            )?;
            Ok(())
        })
    }

    /// Global feed, newest first.
    pub fn list_recent_images(&self, limit: u32) -> Result<Vec<ImageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {IMAGE_COLUMNS} FROM images
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?1"
            );
            query_images(conn, &sql, [limit])
        })
    }

    pub fn list_images_by_user_id(&self, user_id: &str) -> Result<Vec<ImageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {IMAGE_COLUMNS} FROM images
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC"
            );
            query_images(conn, &sql, [user_id])
        })
    }

    pub fn list_images_by_username(&self, username: &str) -> Result<Vec<ImageRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {IMAGE_COLUMNS} FROM images
                 WHERE username = ?1
                 ORDER BY created_at DESC, rowid DESC"
            );
            query_images(conn, &sql, [username])
        })
    }

    /// Looks up an image only if `user_id` owns it. A missing image and a
    /// foreign one are indistinguishable to the caller.
    pub fn get_owned_image(&self, id: &str, user_id: &str) -> Result<Option<ImageRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {IMAGE_COLUMNS} FROM images WHERE id = ?1 AND user_id = ?2");
            let row = conn
                .query_row(&sql, (id, user_id), image_from_row)
                .optional()?;
            Ok(row)
        })
    }

    /// Returns whether a row was removed.
    pub fn delete_image(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM images WHERE id = ?1", [id])?;
            Ok(removed > 0)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([value], user_from_row).optional()?;
    Ok(row)
}

fn query_images<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<ImageRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, image_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn image_from_row(row: &Row<'_>) -> rusqlite::Result<ImageRow> {
    Ok(ImageRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        image_url: row.get(3)?,
        storage_ref: row.get(4)?,
        user_id: row.get(5)?,
        username: row.get(6)?,
        created_at: row.get(7)?,
    })
}
