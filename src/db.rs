use std::{env, fs, path::Path};

use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    auth::{hash_password, new_id},
    models::{BookingRow, LocationRow, RoomRow, UserRow, ROLE_ADMIN},
};

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub fn ensure_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let path = if let Some(path) = db_url.strip_prefix("sqlite://") {
        Some(path)
    } else if let Some(path) = db_url.strip_prefix("sqlite:") {
        Some(path)
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(());
    };

    let path = path.split('?').next().unwrap_or(path);
    if path == ":memory:" || path.is_empty() {
        return Ok(());
    }

    let path = path.strip_prefix("file:").unwrap_or(path);
    let db_path = Path::new(path);
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub async fn seed_defaults(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    seed_admin(pool).await?;
    seed_demo(pool).await?;
    Ok(())
}

/// Best-effort audit trail for admin-side mutations.
pub async fn log_activity(pool: &SqlitePool, kind: &str, message: &str, user_id: Option<&str>) {
    let _ = sqlx::query(
        "INSERT INTO activities (id, kind, message, created_at, user_id) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(new_id())
    .bind(kind)
    .bind(message)
    .bind(Utc::now().to_rfc3339())
    .bind(user_id)
    .execute(pool)
    .await;
}

pub async fn fetch_room(pool: &SqlitePool, room_id: &str) -> Result<Option<RoomRow>, sqlx::Error> {
    sqlx::query_as::<_, RoomRow>("SELECT * FROM rooms WHERE id = ? LIMIT 1")
        .bind(room_id)
        .fetch_optional(pool)
        .await
}

pub async fn fetch_location(
    pool: &SqlitePool,
    location_id: &str,
) -> Result<Option<LocationRow>, sqlx::Error> {
    sqlx::query_as::<_, LocationRow>(
        "SELECT id, name, province, country, image FROM locations WHERE id = ? LIMIT 1",
    )
    .bind(location_id)
    .fetch_optional(pool)
    .await
}

pub async fn fetch_user(pool: &SqlitePool, user_id: &str) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ? LIMIT 1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn fetch_booking(
    pool: &SqlitePool,
    booking_id: &str,
) -> Result<Option<BookingRow>, sqlx::Error> {
    sqlx::query_as::<_, BookingRow>(
        r#"SELECT b.id, b.room_id, r.name AS room_name, b.user_id, b.check_in, b.check_out,
                  b.guests, b.created_at, r.price
           FROM bookings b
           JOIN rooms r ON b.room_id = r.id
           WHERE b.id = ?
           LIMIT 1"#,
    )
    .bind(booking_id)
    .fetch_optional(pool)
    .await
}

async fn seed_admin(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let existing =
        sqlx::query_as::<_, (String,)>("SELECT id FROM users WHERE role = ? LIMIT 1")
            .bind(ROLE_ADMIN)
            .fetch_optional(pool)
            .await?;

    if existing.is_some() {
        return Ok(());
    }

    let email = env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@roomnest.local".to_string());
    let password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin".to_string());
    let name = env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string());

    if password == "admin" {
        log::warn!("ADMIN_PASSWORD not set. Using default password 'admin'. Set ADMIN_PASSWORD in production.");
    }

    let password_hash =
        hash_password(&password).map_err(|_| sqlx::Error::Protocol("password hash failed".into()))?;

    sqlx::query(
        r#"INSERT INTO users (id, name, email, gender, role, password_hash, created_at)
           VALUES (?, ?, ?, 1, ?, ?, ?)"#,
    )
    .bind(new_id())
    .bind(name)
    .bind(email)
    .bind(ROLE_ADMIN)
    .bind(password_hash)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Seeds a small browsable catalog when SEED_DEMO=true and the database has
/// no locations yet.
async fn seed_demo(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    if env::var("SEED_DEMO").unwrap_or_else(|_| "false".to_string()) != "true" {
        return Ok(());
    }

    let existing = sqlx::query_as::<_, (String,)>("SELECT id FROM locations LIMIT 1")
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let locations = vec![
        ("Da Lat", "Lam Dong", "Vietnam"),
        ("Hoi An", "Quang Nam", "Vietnam"),
    ];

    let mut location_ids = Vec::new();
    for (name, province, country) in locations {
        let id = new_id();
        sqlx::query(
            "INSERT INTO locations (id, name, province, country) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(name)
        .bind(province)
        .bind(country)
        .execute(pool)
        .await?;
        location_ids.push(id);
    }

    let rooms = vec![
        ("Pine Hill Studio", 45, 2, 1, location_ids[0].as_str()),
        ("Valley View Villa", 120, 6, 3, location_ids[0].as_str()),
        ("Old Town Loft", 75, 4, 2, location_ids[1].as_str()),
    ];

    for (name, price, guests, bedrooms, location_id) in rooms {
        sqlx::query(
            r#"INSERT INTO rooms (id, name, description, price, guests, bedrooms, beds, bathrooms, wifi, location_id)
               VALUES (?, ?, '', ?, ?, ?, ?, 1, 1, ?)"#,
        )
        .bind(new_id())
        .bind(name)
        .bind(price)
        .bind(guests)
        .bind(bedrooms)
        .bind(bedrooms)
        .bind(location_id)
        .execute(pool)
        .await?;
    }

    Ok(())
}
