/// Database row types — these map directly to SQLite rows.
/// Distinct from gallery-types API models to keep the DB layer independent.

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string. Never leaves the server.
    pub password: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct ImageRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub storage_ref: String,
    pub user_id: String,
    pub username: String,
    pub created_at: String,
}
