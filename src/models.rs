use chrono::NaiveDate;
use serde::Serialize;

use crate::stay;

pub const ROLE_USER: &str = "USER";
pub const ROLE_ADMIN: &str = "ADMIN";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub birthday: Option<String>,
    pub avatar: Option<String>,
    pub gender: i64,
    pub role: String,
    pub password_hash: String,
    pub created_at: String,
}

/// User shape returned by the API. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub birthday: Option<String>,
    pub avatar: Option<String>,
    pub gender: bool,
    pub role: String,
}

impl From<UserRow> for UserView {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            birthday: row.birthday,
            avatar: row.avatar,
            gender: row.gender == 1,
            role: row.role,
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LocationRow {
    pub id: String,
    pub name: String,
    pub province: String,
    pub country: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RoomRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub guests: i64,
    pub bedrooms: i64,
    pub beds: i64,
    pub bathrooms: i64,
    pub wifi: i64,
    pub kitchen: i64,
    pub air_conditioning: i64,
    pub pool: i64,
    pub washer: i64,
    pub parking: i64,
    pub tv: i64,
    pub iron: i64,
    pub image: Option<String>,
    pub location_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub guests: i64,
    pub bedrooms: i64,
    pub beds: i64,
    pub bathrooms: i64,
    pub wifi: bool,
    pub kitchen: bool,
    pub air_conditioning: bool,
    pub pool: bool,
    pub washer: bool,
    pub parking: bool,
    pub tv: bool,
    pub iron: bool,
    pub image: Option<String>,
    pub location_id: Option<String>,
}

impl From<RoomRow> for RoomView {
    fn from(row: RoomRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            guests: row.guests,
            bedrooms: row.bedrooms,
            beds: row.beds,
            bathrooms: row.bathrooms,
            wifi: row.wifi == 1,
            kitchen: row.kitchen == 1,
            air_conditioning: row.air_conditioning == 1,
            pool: row.pool == 1,
            washer: row.washer == 1,
            parking: row.parking == 1,
            tv: row.tv == 1,
            iron: row.iron == 1,
            image: row.image,
            location_id: row.location_id,
        }
    }
}

/// Booking joined with its room so views can price the stay.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BookingRow {
    pub id: String,
    pub room_id: String,
    pub room_name: String,
    pub user_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: i64,
    pub created_at: String,
    pub price: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    pub id: String,
    pub room_id: String,
    pub room_name: String,
    pub user_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guests: i64,
    pub nights: i64,
    pub total_price: i64,
    pub created_at: String,
}

impl From<BookingRow> for BookingView {
    fn from(row: BookingRow) -> Self {
        let nights = stay::nights(row.check_in, row.check_out);
        Self {
            id: row.id,
            room_id: row.room_id,
            room_name: row.room_name,
            user_id: row.user_id,
            check_in: row.check_in,
            check_out: row.check_out,
            guests: row.guests,
            nights,
            total_price: stay::total(nights, row.price),
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommentRow {
    pub id: String,
    pub room_id: String,
    pub user_id: String,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub content: String,
    pub rating: i64,
    pub posted_on: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub room_id: String,
    pub user_id: String,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub content: String,
    pub rating: i64,
    pub posted_on: String,
}

impl From<CommentRow> for CommentView {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            room_id: row.room_id,
            user_id: row.user_id,
            author_name: row.author_name,
            author_avatar: row.author_avatar,
            content: row.content,
            rating: row.rating,
            posted_on: row.posted_on,
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRow {
    pub message: String,
    pub created_at: String,
}
