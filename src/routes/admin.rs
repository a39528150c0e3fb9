use actix_web::{http::header, web, HttpRequest, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::{
    auth::{admin_validator, new_id, AuthUser},
    db::{fetch_booking, fetch_location, fetch_room, fetch_user, log_activity},
    models::{ActivityRow, BookingRow, BookingView, LocationRow, RoomView, UserRow, UserView, ROLE_ADMIN, ROLE_USER},
    query::{self, PagedQuery},
    respond,
    routes::public::db_error,
    state::AppState,
    uploads,
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct RoomPayload {
    #[validate(length(min = 1, message = "Room name is required"))]
    name: String,
    #[serde(default)]
    description: String,
    #[validate(range(min = 0, message = "Price cannot be negative"))]
    price: i64,
    #[serde(default = "default_one")]
    guests: i64,
    #[serde(default = "default_one")]
    bedrooms: i64,
    #[serde(default = "default_one")]
    beds: i64,
    #[serde(default = "default_one")]
    bathrooms: i64,
    #[serde(default)]
    wifi: bool,
    #[serde(default)]
    kitchen: bool,
    #[serde(default)]
    air_conditioning: bool,
    #[serde(default)]
    pool: bool,
    #[serde(default)]
    washer: bool,
    #[serde(default)]
    parking: bool,
    #[serde(default)]
    tv: bool,
    #[serde(default)]
    iron: bool,
    image: Option<String>,
    location_id: Option<String>,
}

fn default_one() -> i64 {
    1
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct RoomUpdatePayload {
    name: Option<String>,
    description: Option<String>,
    #[validate(range(min = 0, message = "Price cannot be negative"))]
    price: Option<i64>,
    guests: Option<i64>,
    bedrooms: Option<i64>,
    beds: Option<i64>,
    bathrooms: Option<i64>,
    wifi: Option<bool>,
    kitchen: Option<bool>,
    air_conditioning: Option<bool>,
    pool: Option<bool>,
    washer: Option<bool>,
    parking: Option<bool>,
    tv: Option<bool>,
    iron: Option<bool>,
    image: Option<String>,
    location_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
struct LocationPayload {
    #[validate(length(min = 1, message = "Location name is required"))]
    name: String,
    #[validate(length(min = 1, message = "Province is required"))]
    province: String,
    #[validate(length(min = 1, message = "Country is required"))]
    country: String,
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LocationUpdatePayload {
    name: Option<String>,
    province: Option<String>,
    country: Option<String>,
    image: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct UserUpdatePayload {
    name: Option<String>,
    #[validate(email(message = "Email is not valid"))]
    email: Option<String>,
    phone: Option<String>,
    birthday: Option<String>,
    gender: Option<bool>,
    role: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .wrap(HttpAuthentication::bearer(admin_validator))
            .service(web::resource("/dashboard").route(web::get().to(dashboard)))
            .service(web::resource("/users").route(web::get().to(list_users)))
            .service(
                web::resource("/users/{id}")
                    .route(web::get().to(user_detail))
                    .route(web::put().to(update_user))
                    .route(web::delete().to(delete_user)),
            )
            .service(web::resource("/rooms").route(web::post().to(create_room)))
            .service(
                web::resource("/rooms/{id}")
                    .route(web::put().to(update_room))
                    .route(web::delete().to(delete_room)),
            )
            .service(web::resource("/rooms/{id}/image").route(web::post().to(upload_room_image)))
            .service(web::resource("/locations").route(web::post().to(create_location)))
            .service(
                web::resource("/locations/{id}")
                    .route(web::put().to(update_location))
                    .route(web::delete().to(delete_location)),
            )
            .service(
                web::resource("/locations/{id}/image")
                    .route(web::post().to(upload_location_image)),
            )
            .service(web::resource("/bookings").route(web::get().to(list_bookings)))
            .service(
                web::resource("/bookings/{id}")
                    .route(web::get().to(booking_detail))
                    .route(web::delete().to(delete_booking)),
            ),
    );
}

async fn dashboard(state: web::Data<AppState>) -> HttpResponse {
    let users = count(&state, "SELECT COUNT(*) FROM users").await;
    let rooms = count(&state, "SELECT COUNT(*) FROM rooms").await;
    let locations = count(&state, "SELECT COUNT(*) FROM locations").await;
    let bookings = count(&state, "SELECT COUNT(*) FROM bookings").await;

    let activities = sqlx::query_as::<_, ActivityRow>(
        "SELECT message, created_at FROM activities ORDER BY created_at DESC LIMIT 10",
    )
    .fetch_all(&state.db)
    .await
    .unwrap_or_default();

    respond::ok_with(
        "stats",
        json!({
            "users": users,
            "rooms": rooms,
            "locations": locations,
            "bookings": bookings,
        }),
        "activities",
        activities,
    )
}

async fn count(state: &web::Data<AppState>, sql: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(sql)
        .fetch_one(&state.db)
        .await
        .unwrap_or(0)
}

async fn list_users(state: web::Data<AppState>, query: web::Query<PagedQuery>) -> HttpResponse {
    let rows = sqlx::query_as::<_, UserRow>("SELECT * FROM users ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await;
    let rows = match rows {
        Ok(rows) => rows,
        Err(err) => return db_error(err),
    };

    let query = query.into_inner();
    let filtered: Vec<UserRow> = match query.keyword.as_deref() {
        Some(keyword) => rows
            .into_iter()
            .filter(|user| query::keyword_matches(&user.name, keyword))
            .collect(),
        None => rows,
    };
    let (page, pagination) = query::paginate(filtered, query.page, query.page_size);
    let users: Vec<UserView> = page.into_iter().map(UserView::from).collect();

    respond::ok_paged("users", users, pagination)
}

async fn user_detail(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    match fetch_user(&state.db, &path.into_inner()).await {
        Ok(Some(user)) => respond::ok("user", UserView::from(user)),
        Ok(None) => respond::not_found("User not found"),
        Err(err) => db_error(err),
    }
}

async fn update_user(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    payload: web::Json<UserUpdatePayload>,
) -> HttpResponse {
    let user_id = path.into_inner();
    let payload = payload.into_inner();
    if let Err(err) = payload.validate() {
        return respond::bad_request(&err.to_string());
    }
    if let Some(role) = payload.role.as_deref() {
        if role != ROLE_USER && role != ROLE_ADMIN {
            return respond::bad_request("Role must be USER or ADMIN");
        }
    }

    let user = match fetch_user(&state.db, &user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return respond::not_found("User not found"),
        Err(err) => return db_error(err),
    };

    let email = payload
        .email
        .map(|email| email.trim().to_lowercase())
        .unwrap_or(user.email);
    let taken = sqlx::query_as::<_, (String,)>(
        "SELECT id FROM users WHERE email = ? AND id != ? LIMIT 1",
    )
    .bind(&email)
    .bind(&user_id)
    .fetch_optional(&state.db)
    .await;
    match taken {
        Ok(Some(_)) => return respond::conflict("Email is already registered"),
        Ok(None) => {}
        Err(err) => return db_error(err),
    }

    let name = payload.name.unwrap_or(user.name);
    let phone = payload.phone.or(user.phone);
    let birthday = payload.birthday.or(user.birthday);
    let gender = payload.gender.map(i64::from).unwrap_or(user.gender);
    let role = payload.role.unwrap_or(user.role);

    let result = sqlx::query(
        r#"UPDATE users SET name = ?, email = ?, phone = ?, birthday = ?, gender = ?, role = ?
           WHERE id = ?"#,
    )
    .bind(&name)
    .bind(&email)
    .bind(&phone)
    .bind(&birthday)
    .bind(gender)
    .bind(&role)
    .bind(&user_id)
    .execute(&state.db)
    .await;
    if let Err(err) = result {
        return db_error(err);
    }

    log_activity(
        &state.db,
        "user_updated",
        &format!("{} updated user {}.", auth.name, name),
        Some(&auth.id),
    )
    .await;

    match fetch_user(&state.db, &user_id).await {
        Ok(Some(user)) => respond::ok("user", UserView::from(user)),
        Ok(None) => respond::internal(),
        Err(err) => db_error(err),
    }
}

async fn delete_user(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> HttpResponse {
    let user_id = path.into_inner();
    if user_id == auth.id {
        return respond::bad_request("Cannot delete your own account");
    }
    let user = match fetch_user(&state.db, &user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return respond::not_found("User not found"),
        Err(err) => return db_error(err),
    };

    for sql in [
        "DELETE FROM comments WHERE user_id = ?",
        "DELETE FROM bookings WHERE user_id = ?",
        "DELETE FROM sessions WHERE user_id = ?",
        "DELETE FROM users WHERE id = ?",
    ] {
        if let Err(err) = sqlx::query(sql).bind(&user_id).execute(&state.db).await {
            return db_error(err);
        }
    }

    log_activity(
        &state.db,
        "user_deleted",
        &format!("{} deleted user {}.", auth.name, user.name),
        Some(&auth.id),
    )
    .await;

    respond::done("User deleted")
}

async fn create_room(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    payload: web::Json<RoomPayload>,
) -> HttpResponse {
    let payload = payload.into_inner();
    if let Err(err) = payload.validate() {
        return respond::bad_request(&err.to_string());
    }
    if let Some(location_id) = payload.location_id.as_deref() {
        match fetch_location(&state.db, location_id).await {
            Ok(Some(_)) => {}
            Ok(None) => return respond::not_found("Location not found"),
            Err(err) => return db_error(err),
        }
    }

    let room_id = new_id();
    let result = sqlx::query(
        r#"INSERT INTO rooms
           (id, name, description, price, guests, bedrooms, beds, bathrooms,
            wifi, kitchen, air_conditioning, pool, washer, parking, tv, iron,
            image, location_id)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&room_id)
    .bind(payload.name.trim())
    .bind(&payload.description)
    .bind(payload.price)
    .bind(payload.guests)
    .bind(payload.bedrooms)
    .bind(payload.beds)
    .bind(payload.bathrooms)
    .bind(payload.wifi as i64)
    .bind(payload.kitchen as i64)
    .bind(payload.air_conditioning as i64)
    .bind(payload.pool as i64)
    .bind(payload.washer as i64)
    .bind(payload.parking as i64)
    .bind(payload.tv as i64)
    .bind(payload.iron as i64)
    .bind(&payload.image)
    .bind(&payload.location_id)
    .execute(&state.db)
    .await;
    if let Err(err) = result {
        return db_error(err);
    }

    log_activity(
        &state.db,
        "room_created",
        &format!("{} created room {}.", auth.name, payload.name.trim()),
        Some(&auth.id),
    )
    .await;

    match fetch_room(&state.db, &room_id).await {
        Ok(Some(room)) => respond::created("room", RoomView::from(room)),
        Ok(None) => respond::internal(),
        Err(err) => db_error(err),
    }
}

async fn update_room(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    payload: web::Json<RoomUpdatePayload>,
) -> HttpResponse {
    let room_id = path.into_inner();
    let payload = payload.into_inner();
    if let Err(err) = payload.validate() {
        return respond::bad_request(&err.to_string());
    }

    let room = match fetch_room(&state.db, &room_id).await {
        Ok(Some(room)) => room,
        Ok(None) => return respond::not_found("Room not found"),
        Err(err) => return db_error(err),
    };
    if let Some(location_id) = payload.location_id.as_deref() {
        match fetch_location(&state.db, location_id).await {
            Ok(Some(_)) => {}
            Ok(None) => return respond::not_found("Location not found"),
            Err(err) => return db_error(err),
        }
    }

    let name = payload.name.unwrap_or(room.name);
    let description = payload.description.unwrap_or(room.description);
    let price = payload.price.unwrap_or(room.price);
    let guests = payload.guests.unwrap_or(room.guests);
    let bedrooms = payload.bedrooms.unwrap_or(room.bedrooms);
    let beds = payload.beds.unwrap_or(room.beds);
    let bathrooms = payload.bathrooms.unwrap_or(room.bathrooms);
    let wifi = payload.wifi.map(i64::from).unwrap_or(room.wifi);
    let kitchen = payload.kitchen.map(i64::from).unwrap_or(room.kitchen);
    let air_conditioning = payload
        .air_conditioning
        .map(i64::from)
        .unwrap_or(room.air_conditioning);
    let pool = payload.pool.map(i64::from).unwrap_or(room.pool);
    let washer = payload.washer.map(i64::from).unwrap_or(room.washer);
    let parking = payload.parking.map(i64::from).unwrap_or(room.parking);
    let tv = payload.tv.map(i64::from).unwrap_or(room.tv);
    let iron = payload.iron.map(i64::from).unwrap_or(room.iron);
    let image = payload.image.or(room.image);
    let location_id_value = payload.location_id.or(room.location_id);

    let result = sqlx::query(
        r#"UPDATE rooms SET name = ?, description = ?, price = ?, guests = ?, bedrooms = ?,
           beds = ?, bathrooms = ?, wifi = ?, kitchen = ?, air_conditioning = ?, pool = ?,
           washer = ?, parking = ?, tv = ?, iron = ?, image = ?, location_id = ?
           WHERE id = ?"#,
    )
    .bind(&name)
    .bind(&description)
    .bind(price)
    .bind(guests)
    .bind(bedrooms)
    .bind(beds)
    .bind(bathrooms)
    .bind(wifi)
    .bind(kitchen)
    .bind(air_conditioning)
    .bind(pool)
    .bind(washer)
    .bind(parking)
    .bind(tv)
    .bind(iron)
    .bind(&image)
    .bind(&location_id_value)
    .bind(&room_id)
    .execute(&state.db)
    .await;
    if let Err(err) = result {
        return db_error(err);
    }

    log_activity(
        &state.db,
        "room_updated",
        &format!("{} updated room {}.", auth.name, name),
        Some(&auth.id),
    )
    .await;

    match fetch_room(&state.db, &room_id).await {
        Ok(Some(room)) => respond::ok("room", RoomView::from(room)),
        Ok(None) => respond::internal(),
        Err(err) => db_error(err),
    }
}

async fn delete_room(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> HttpResponse {
    let room_id = path.into_inner();
    let room = match fetch_room(&state.db, &room_id).await {
        Ok(Some(room)) => room,
        Ok(None) => return respond::not_found("Room not found"),
        Err(err) => return db_error(err),
    };

    for sql in [
        "DELETE FROM comments WHERE room_id = ?",
        "DELETE FROM bookings WHERE room_id = ?",
        "DELETE FROM rooms WHERE id = ?",
    ] {
        if let Err(err) = sqlx::query(sql).bind(&room_id).execute(&state.db).await {
            return db_error(err);
        }
    }

    log_activity(
        &state.db,
        "room_deleted",
        &format!("{} deleted room {}.", auth.name, room.name),
        Some(&auth.id),
    )
    .await;

    respond::done("Room deleted")
}

async fn create_location(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    payload: web::Json<LocationPayload>,
) -> HttpResponse {
    let payload = payload.into_inner();
    if let Err(err) = payload.validate() {
        return respond::bad_request(&err.to_string());
    }

    let location_id = new_id();
    let result = sqlx::query(
        "INSERT INTO locations (id, name, province, country, image) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&location_id)
    .bind(payload.name.trim())
    .bind(payload.province.trim())
    .bind(payload.country.trim())
    .bind(&payload.image)
    .execute(&state.db)
    .await;
    if let Err(err) = result {
        return db_error(err);
    }

    log_activity(
        &state.db,
        "location_created",
        &format!("{} created location {}.", auth.name, payload.name.trim()),
        Some(&auth.id),
    )
    .await;

    match fetch_location(&state.db, &location_id).await {
        Ok(Some(location)) => respond::created("location", location),
        Ok(None) => respond::internal(),
        Err(err) => db_error(err),
    }
}

async fn update_location(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    payload: web::Json<LocationUpdatePayload>,
) -> HttpResponse {
    let location_id = path.into_inner();
    let payload = payload.into_inner();

    let location = match fetch_location(&state.db, &location_id).await {
        Ok(Some(location)) => location,
        Ok(None) => return respond::not_found("Location not found"),
        Err(err) => return db_error(err),
    };

    let LocationRow {
        name: current_name,
        province: current_province,
        country: current_country,
        image: current_image,
        ..
    } = location;
    let name = payload.name.unwrap_or(current_name);
    let province = payload.province.unwrap_or(current_province);
    let country = payload.country.unwrap_or(current_country);
    let image = payload.image.or(current_image);

    let result = sqlx::query(
        "UPDATE locations SET name = ?, province = ?, country = ?, image = ? WHERE id = ?",
    )
    .bind(&name)
    .bind(&province)
    .bind(&country)
    .bind(&image)
    .bind(&location_id)
    .execute(&state.db)
    .await;
    if let Err(err) = result {
        return db_error(err);
    }

    log_activity(
        &state.db,
        "location_updated",
        &format!("{} updated location {}.", auth.name, name),
        Some(&auth.id),
    )
    .await;

    match fetch_location(&state.db, &location_id).await {
        Ok(Some(location)) => respond::ok("location", location),
        Ok(None) => respond::internal(),
        Err(err) => db_error(err),
    }
}

async fn delete_location(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
) -> HttpResponse {
    let location_id = path.into_inner();
    let location = match fetch_location(&state.db, &location_id).await {
        Ok(Some(location)) => location,
        Ok(None) => return respond::not_found("Location not found"),
        Err(err) => return db_error(err),
    };

    let rooms = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM rooms WHERE location_id = ?")
        .bind(&location_id)
        .fetch_one(&state.db)
        .await
        .unwrap_or(0);
    if rooms > 0 {
        return respond::conflict("Location still has rooms");
    }

    let result = sqlx::query("DELETE FROM locations WHERE id = ?")
        .bind(&location_id)
        .execute(&state.db)
        .await;
    if let Err(err) = result {
        return db_error(err);
    }

    log_activity(
        &state.db,
        "location_deleted",
        &format!("{} deleted location {}.", auth.name, location.name),
        Some(&auth.id),
    )
    .await;

    respond::done("Location deleted")
}

async fn list_bookings(state: web::Data<AppState>, query: web::Query<PagedQuery>) -> HttpResponse {
    let rows = sqlx::query_as::<_, BookingRow>(
        r#"SELECT b.id, b.room_id, r.name AS room_name, b.user_id, b.check_in, b.check_out,
                  b.guests, b.created_at, r.price
           FROM bookings b
           JOIN rooms r ON b.room_id = r.id
           ORDER BY b.created_at DESC"#,
    )
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

async fn booking_detail(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    match fetch_booking(&state.db, &path.into_inner()).await {
        Ok(Some(booking)) => respond::ok("booking", BookingView::from(booking)),
        Ok(None) => respond::not_found("Booking not found"),
        Err(err) => db_error(err),
    }
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
        &format!("{} deleted booking {} for {}.", auth.name, booking_id, booking.room_name),
        Some(&auth.id),
    )
    .await;

    respond::done("Booking deleted")
}

async fn upload_room_image(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    req: HttpRequest,
    body: web::Bytes,
) -> HttpResponse {
    let room_id = path.into_inner();
    let room = match fetch_room(&state.db, &room_id).await {
        Ok(Some(room)) => room,
        Ok(None) => return respond::not_found("Room not found"),
        Err(err) => return db_error(err),
    };

    let url = match store_upload(&state, &req, &body, "room") {
        Ok(url) => url,
        Err(response) => return response,
    };

    let result = sqlx::query("UPDATE rooms SET image = ? WHERE id = ?")
        .bind(&url)
        .bind(&room_id)
        .execute(&state.db)
        .await;
    if let Err(err) = result {
        return db_error(err);
    }

    log_activity(
        &state.db,
        "room_image_uploaded",
        &format!("{} updated the photo of {}.", auth.name, room.name),
        Some(&auth.id),
    )
    .await;

    respond::ok("url", url)
}

async fn upload_location_image(
    state: web::Data<AppState>,
    auth: web::ReqData<AuthUser>,
    path: web::Path<String>,
    req: HttpRequest,
    body: web::Bytes,
) -> HttpResponse {
    let location_id = path.into_inner();
    let location = match fetch_location(&state.db, &location_id).await {
        Ok(Some(location)) => location,
        Ok(None) => return respond::not_found("Location not found"),
        Err(err) => return db_error(err),
    };

    let url = match store_upload(&state, &req, &body, "location") {
        Ok(url) => url,
        Err(response) => return response,
    };

    let result = sqlx::query("UPDATE locations SET image = ? WHERE id = ?")
        .bind(&url)
        .bind(&location_id)
        .execute(&state.db)
        .await;
    if let Err(err) = result {
        return db_error(err);
    }

    log_activity(
        &state.db,
        "location_image_uploaded",
        &format!("{} updated the photo of {}.", auth.name, location.name),
        Some(&auth.id),
    )
    .await;

    respond::ok("url", url)
}

fn store_upload(
    state: &web::Data<AppState>,
    req: &HttpRequest,
    body: &web::Bytes,
    kind: &str,
) -> Result<String, HttpResponse> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    let Some(extension) = uploads::extension_for(content_type) else {
        return Err(respond::bad_request("Unsupported image type"));
    };
    if body.is_empty() {
        return Err(respond::bad_request("Image body is empty"));
    }

    uploads::store_image(&state.uploads, &format!("{kind}-{}", new_id()), extension, body).map_err(
        |err| {
            log::error!("Image write error: {err}");
            respond::internal()
        },
    )
}

#[cfg(test)]
mod tests {
    use actix_web::{test, web, App};
    use serde_json::{json, Value};

    use crate::models::{ROLE_ADMIN, ROLE_USER};
    use crate::routes::testing;

    macro_rules! service {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state.clone()))
                    .configure(super::configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn non_admin_sessions_are_forbidden() {
        let state = testing::state().await;
        let (_, token) = testing::seed_user(&state, "guest@example.com", ROLE_USER).await;
        let app = service!(state);

        let req = test::TestRequest::get()
            .uri("/admin/users")
            .insert_header(testing::bearer(&token))
            .to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), 403);
    }

    #[actix_web::test]
    async fn admin_can_create_a_room_in_a_location() {
        let state = testing::state().await;
        let (_, token) = testing::seed_user(&state, "admin@example.com", ROLE_ADMIN).await;
        let location_id = testing::seed_location(&state, "Da Lat").await;
        let app = service!(state);

        let req = test::TestRequest::post()
            .uri("/admin/rooms")
            .insert_header(testing::bearer(&token))
            .set_json(json!({
                "name": "Pine Hill Studio",
                "price": 45,
                "guests": 2,
                "wifi": true,
                "locationId": location_id
            }))
            .to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), 201);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["room"]["name"], json!("Pine Hill Studio"));
        assert_eq!(body["room"]["wifi"], json!(true));
        assert_eq!(body["room"]["pool"], json!(false));
    }

    #[actix_web::test]
    async fn location_with_rooms_cannot_be_deleted() {
        let state = testing::state().await;
        let (_, token) = testing::seed_user(&state, "admin@example.com", ROLE_ADMIN).await;
        let location_id = testing::seed_location(&state, "Da Lat").await;
        let room_id = testing::seed_room(&state, "Pine Hill Studio", 45, Some(&location_id)).await;
        let app = service!(state);

        let req = test::TestRequest::delete()
            .uri(&format!("/admin/locations/{location_id}"))
            .insert_header(testing::bearer(&token))
            .to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), 409);

        let req = test::TestRequest::delete()
            .uri(&format!("/admin/rooms/{room_id}"))
            .insert_header(testing::bearer(&token))
            .to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), 200);

        let req = test::TestRequest::delete()
            .uri(&format!("/admin/locations/{location_id}"))
            .insert_header(testing::bearer(&token))
            .to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), 200);
    }

    #[actix_web::test]
    async fn user_update_can_promote_to_admin_but_rejects_unknown_roles() {
        let state = testing::state().await;
        let (_, token) = testing::seed_user(&state, "admin@example.com", ROLE_ADMIN).await;
        let (user_id, _) = testing::seed_user(&state, "guest@example.com", ROLE_USER).await;
        let app = service!(state);

        let req = test::TestRequest::put()
            .uri(&format!("/admin/users/{user_id}"))
            .insert_header(testing::bearer(&token))
            .set_json(json!({ "role": "SUPERUSER" }))
            .to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), 400);

        let req = test::TestRequest::put()
            .uri(&format!("/admin/users/{user_id}"))
            .insert_header(testing::bearer(&token))
            .set_json(json!({ "role": "ADMIN" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["user"]["role"], json!("ADMIN"));
    }

    #[actix_web::test]
    async fn admins_cannot_delete_themselves() {
        let state = testing::state().await;
        let (admin_id, token) = testing::seed_user(&state, "admin@example.com", ROLE_ADMIN).await;
        let app = service!(state);

        let req = test::TestRequest::delete()
            .uri(&format!("/admin/users/{admin_id}"))
            .insert_header(testing::bearer(&token))
            .to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), 400);
    }

    #[actix_web::test]
    async fn booking_listing_covers_every_guest() {
        let state = testing::state().await;
        let (_, token) = testing::seed_user(&state, "admin@example.com", ROLE_ADMIN).await;
        let (guest_id, _) = testing::seed_user(&state, "guest@example.com", ROLE_USER).await;
        let room_id = testing::seed_room(&state, "Pine Hill Studio", 45, None).await;
        sqlx::query(
            r#"INSERT INTO bookings (id, room_id, user_id, check_in, check_out, guests, created_at)
               VALUES ('b-1', ?, ?, '2024-03-01', '2024-03-05', 2, '2024-02-01T00:00:00Z')"#,
        )
        .bind(&room_id)
        .bind(&guest_id)
        .execute(&state.db)
        .await
        .unwrap();
        let app = service!(state);

        let req = test::TestRequest::get()
            .uri("/admin/bookings")
            .insert_header(testing::bearer(&token))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let bookings = body["bookings"].as_array().unwrap();
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0]["nights"], json!(4));
        assert_eq!(bookings[0]["totalPrice"], json!(180));
    }

    #[actix_web::test]
    async fn dashboard_reports_entity_counts() {
        let state = testing::state().await;
        let (_, token) = testing::seed_user(&state, "admin@example.com", ROLE_ADMIN).await;
        testing::seed_location(&state, "Da Lat").await;
        testing::seed_room(&state, "Pine Hill Studio", 45, None).await;
        let app = service!(state);

        let req = test::TestRequest::get()
            .uri("/admin/dashboard")
            .insert_header(testing::bearer(&token))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["stats"]["users"], json!(1));
        assert_eq!(body["stats"]["rooms"], json!(1));
        assert_eq!(body["stats"]["locations"], json!(1));
        assert_eq!(body["stats"]["bookings"], json!(0));
    }
}
