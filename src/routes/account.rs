use actix_web::{http::header, http::StatusCode, web, HttpRequest, HttpResponse};
use actix_web_httpauth::{extractors::bearer::BearerAuth, middleware::HttpAuthentication};
use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use crate::{
    auth::{bearer_validator, new_id, revoke_session, AuthUser},
    db::{fetch_booking, fetch_room, fetch_user, log_activity},
    models::{BookingRow, BookingView, CommentRow, CommentView, UserView},
    query::{self, PagedQuery},
    respond,
    routes::public::db_error,
    state::AppState,
    stay, uploads,
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct BookingPayload {
    room_id: String,
    check_in: NaiveDate,
    check_out: NaiveDate,
    #[serde(default = "default_guests")]
    #[validate(range(min = 1, message = "Guest count must be at least 1"))]
    guests: i64,
}

fn default_guests() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentPayload {
    room_id: String,
    content: String,
    rating: Option<i64>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    // explicit mounts, so URLs outside the session surface still 404
    let auth = HttpAuthentication::bearer(bearer_validator);
    cfg.service(
        web::resource("/auth/me")
            .wrap(auth.clone())
            .route(web::get().to(me)),
    )
    .service(
        web::resource("/auth/logout")
            .wrap(auth.clone())
            .route(web::post().to(logout)),
    )
    .service(
        web::resource("/bookings")
            .wrap(auth.clone())
            .route(web::post().to(create_booking))
            .route(web::get().to(my_bookings)),
    )
    .service(
        web::resource("/bookings/{id}")
            .wrap(auth.clone())
            .route(web::get().to(booking_detail))
            .route(web::delete().to(delete_booking)),
    )
    .service(
        web::resource("/comments")
            .wrap(auth.clone())
            .route(web::post().to(create_comment)),
    )
    .service(
        web::resource("/users/{id}/avatar")
            .wrap(auth)
            .route(web::post().to(upload_avatar)),
    );
}

async fn me(state: web::Data<AppState>, auth: web::ReqData<AuthUser>) -> HttpResponse {
    match fetch_user(&state.db, &auth.id).await {
        Ok(Some(user)) => respond::ok("user", UserView::from(user)),
        Ok(None) => respond::not_found("User not found"),
        Err(err) => db_error(err),
    }
}

async fn logout(state: web::Data<AppState>, credentials: BearerAuth) -> HttpResponse {
    if let Err(err) = revoke_session(&state.db, credentials.token()).await {
        return db_error(err);
    }
    respond::done("Logged out")
}

async fn create_booking(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    payload: web::Json<BookingPayload>,
) -> HttpResponse {
    let payload = payload.into_inner();
    if let Err(err) = payload.validate() {
        return respond::bad_request(&err.to_string());
    }
    if let Err(message) = stay::validate(payload.check_in, payload.check_out) {
        return respond::bad_request(message);
    }
    match fetch_room(&state.db, &payload.room_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return respond::not_found("Room not found"),
        Err(err) => return db_error(err),
    }

    let booking_id = new_id();
    let result = sqlx::query(
        r#"INSERT INTO bookings (id, room_id, user_id, check_in, check_out, guests, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&booking_id)
    .bind(&payload.room_id)
    .bind(&auth.id)
    .bind(payload.check_in)
    .bind(payload.check_out)
    .bind(payload.guests)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(&state.db)
    .await;
    if let Err(err) = result {
        return db_error(err);
    }

    match fetch_booking(&state.db, &booking_id).await {
        Ok(Some(booking)) => respond::created("booking", BookingView::from(booking)),
        Ok(None) => respond::internal(),
        Err(err) => db_error(err),
    }
}

async fn my_bookings(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    query: web::Query<PagedQuery>,
) -> HttpResponse {
    let rows = sqlx::query_as::<_, BookingRow>(
        r#"SELECT b.id, b.room_id, r.name AS room_name, b.user_id, b.check_in, b.check_out,
                  b.guests, b.created_at, r.price
           FROM bookings b
           JOIN rooms r ON b.room_id = r.id
           WHERE b.user_id = ?
           ORDER BY b.created_at DESC"#,
    )
    .bind(&auth.id)
    .fetch_all(&state.db)
    .await;
    let rows = match rows {
        Ok(rows) => rows,
        Err(err) => return db_error(err),
    };

    let query = query.into_inner();
    let filtered: Vec<BookingRow> = match query.keyword.as_deref() {
        Some(keyword) => rows
            .into_iter()
            .filter(|booking| query::keyword_matches(&booking.room_name, keyword))
            .collect(),
        None => rows,
    };
    let (page, pagination) = query::paginate(filtered, query.page, query.page_size);
    let bookings: Vec<BookingView> = page.into_iter().map(BookingView::from).collect();

    respond::ok_paged("bookings", bookings, pagination)
}

async fn booking_detail(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> HttpResponse {
    let booking = match fetch_booking(&state.db, &path.into_inner()).await {
        Ok(Some(booking)) => booking,
        Ok(None) => return respond::not_found("Booking not found"),
        Err(err) => return db_error(err),
    };
    if booking.user_id != auth.id && !auth.is_admin() {
        return respond::fail(StatusCode::FORBIDDEN, "Not your booking");
    }
    respond::ok("booking", BookingView::from(booking))
}

async fn delete_booking(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> HttpResponse {
    let booking_id = path.into_inner();
    let booking = match fetch_booking(&state.db, &booking_id).await {
        Ok(Some(booking)) => booking,
        Ok(None) => return respond::not_found("Booking not found"),
        Err(err) => return db_error(err),
    };
    if booking.user_id != auth.id && !auth.is_admin() {
        return respond::fail(StatusCode::FORBIDDEN, "Not your booking");
    }

    let result = sqlx::query("DELETE FROM bookings WHERE id = ?")
        .bind(&booking_id)
        .execute(&state.db)
        .await;
    if let Err(err) = result {
        return db_error(err);
    }

    log_activity(
        &state.db,
        "booking_deleted",
        &format!("{} cancelled booking {} for {}.", auth.name, booking_id, booking.room_name),
        Some(&auth.id),
    )
    .await;

    respond::done("Booking deleted")
}

async fn create_comment(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    payload: web::Json<CommentPayload>,
) -> HttpResponse {
    let payload = payload.into_inner();
    let content = payload.content.trim().to_string();
    if content.is_empty() {
        return respond::bad_request("Comment content is required");
    }
    let rating = payload.rating.unwrap_or(5);
    if !(1..=5).contains(&rating) {
        return respond::bad_request("Rating must be between 1 and 5");
    }
    match fetch_room(&state.db, &payload.room_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return respond::not_found("Room not found"),
        Err(err) => return db_error(err),
    }

    let comment_id = new_id();
    let result = sqlx::query(
        r#"INSERT INTO comments (id, room_id, user_id, content, rating, posted_on)
           VALUES (?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&comment_id)
    .bind(&payload.room_id)
    .bind(&auth.id)
    .bind(&content)
    .bind(rating)
    .bind(chrono::Utc::now().date_naive().to_string())
    .execute(&state.db)
    .await;
    if let Err(err) = result {
        return db_error(err);
    }

    let row = sqlx::query_as::<_, CommentRow>(
        r#"SELECT c.id, c.room_id, c.user_id, u.name AS author_name, u.avatar AS author_avatar,
                  c.content, c.rating, c.posted_on
           FROM comments c
           JOIN users u ON c.user_id = u.id
           WHERE c.id = ?
           LIMIT 1"#,
    )
    .bind(&comment_id)
    .fetch_optional(&state.db)
    .await;
    match row {
        Ok(Some(comment)) => respond::created("comment", CommentView::from(comment)),
        Ok(None) => respond::internal(),
        Err(err) => db_error(err),
    }
}

async fn upload_avatar(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    req: HttpRequest,
    body: web::Bytes,
) -> HttpResponse {
    let user_id = path.into_inner();
    if user_id != auth.id && !auth.is_admin() {
        return respond::fail(StatusCode::FORBIDDEN, "Cannot change another user's avatar");
    }
    match fetch_user(&state.db, &user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return respond::not_found("User not found"),
        Err(err) => return db_error(err),
    }

    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    let Some(extension) = uploads::extension_for(content_type) else {
        return respond::bad_request("Unsupported image type");
    };
    if body.is_empty() {
        return respond::bad_request("Image body is empty");
    }

    let url = match uploads::store_image(
        &state.uploads,
        &format!("avatar-{}", new_id()),
        extension,
        &body,
    ) {
        Ok(url) => url,
        Err(err) => {
            log::error!("Avatar write error: {err}");
            return respond::internal();
        }
    };

    let result = sqlx::query("UPDATE users SET avatar = ? WHERE id = ?")
        .bind(&url)
        .bind(&user_id)
        .execute(&state.db)
        .await;
    if let Err(err) = result {
        return db_error(err);
    }

    respond::ok("url", url)
}
