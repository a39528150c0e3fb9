pub mod account;
pub mod admin;
pub mod public;

#[cfg(test)]
pub mod testing {
    use chrono::Utc;
    use sqlx::sqlite::SqlitePoolOptions;

    use crate::{
        auth::{hash_password, new_id},
        models::ROLE_USER,
        state::{AppState, UploadConfig},
    };

    pub async fn state() -> AppState {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        crate::db::run_migrations(&pool).await.expect("migrations");

        let dir = std::env::temp_dir().join(format!("roomnest-test-{}", new_id()));
        AppState {
            db: pool,
            uploads: UploadConfig {
                dir: dir.to_string_lossy().into_owned(),
                public_base: "/static".to_string(),
            },
        }
    }

    /// Inserts a user plus an active session, returning (user_id, token).
    pub async fn seed_user(state: &AppState, email: &str, role: &str) -> (String, String) {
        let user_id = new_id();
        let password_hash = hash_password("password123").unwrap();
        sqlx::query(
            r#"INSERT INTO users (id, name, email, gender, role, password_hash, created_at)
               VALUES (?, ?, ?, 1, ?, ?, ?)"#,
        )
        .bind(&user_id)
        .bind("Test User")
        .bind(email)
        .bind(role)
        .bind(password_hash)
        .bind(Utc::now().to_rfc3339())
        .execute(&state.db)
        .await
        .unwrap();

        let token = crate::auth::issue_session(&state.db, &user_id).await.unwrap();
        (user_id, token)
    }

    pub async fn seed_guest(state: &AppState) -> (String, String) {
        seed_user(state, "guest@example.com", ROLE_USER).await
    }

    pub async fn seed_location(state: &AppState, name: &str) -> String {
        let id = new_id();
        sqlx::query("INSERT INTO locations (id, name, province, country) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(name)
            .bind("Test Province")
            .bind("Vietnam")
            .execute(&state.db)
            .await
            .unwrap();
        id
    }

    pub async fn seed_room(state: &AppState, name: &str, price: i64, location_id: Option<&str>) -> String {
        let id = new_id();
        sqlx::query(
            r#"INSERT INTO rooms (id, name, description, price, guests, bedrooms, beds, bathrooms, wifi, location_id)
               VALUES (?, ?, '', ?, 2, 1, 1, 1, 1, ?)"#,
        )
        .bind(&id)
        .bind(name)
        .bind(price)
        .bind(location_id)
        .execute(&state.db)
        .await
        .unwrap();
        id
    }

    pub fn bearer(token: &str) -> (&'static str, String) {
        ("Authorization", format!("Bearer {token}"))
    }
}
