use sqlx::SqlitePool;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub uploads: UploadConfig,
}

#[derive(Clone, Debug)]
pub struct UploadConfig {
    /// Filesystem directory image uploads are written to.
    pub dir: String,
    /// URL prefix the directory is served under.
    pub public_base: String,
}

impl UploadConfig {
    pub fn url_for(&self, file_name: &str) -> String {
        format!("{}/{}", self.public_base.trim_end_matches('/'), file_name)
    }
}
