use actix_web::{http::StatusCode, web, HttpResponse};
use serde::Deserialize;
use validator::Validate;

use crate::{
    auth::{hash_password, issue_session, new_id, verify_password},
    db::{fetch_location, fetch_room},
    models::{CommentRow, CommentView, LocationRow, RoomRow, RoomView, UserRow, UserView, ROLE_USER},
    query::{self, PagedQuery, RoomQuery, SortKey},
    respond,
    state::AppState,
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct RegisterPayload {
    #[validate(length(min = 1, message = "Name is required"))]
    name: String,
    #[validate(email(message = "Email is not valid"))]
    email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    password: String,
    phone: Option<String>,
    birthday: Option<String>,
    #[serde(default = "default_gender")]
    gender: bool,
}

fn default_gender() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    email: String,
    password: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/auth/register").route(web::post().to(register)))
        .service(web::resource("/auth/login").route(web::post().to(login)))
        .service(web::resource("/rooms").route(web::get().to(list_rooms)))
        .service(web::resource("/rooms/{id}").route(web::get().to(room_detail)))
        .service(web::resource("/rooms/{id}/comments").route(web::get().to(list_comments)))
        .service(web::resource("/locations").route(web::get().to(list_locations)))
        .service(web::resource("/locations/paged-search").route(web::get().to(paged_search)))
        .service(web::resource("/locations/{id}").route(web::get().to(location_detail)))
        .service(web::resource("/locations/{id}/rooms").route(web::get().to(location_rooms)));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

async fn register(
    state: web::Data<AppState>,
    payload: web::Json<RegisterPayload>,
) -> HttpResponse {
    let payload = payload.into_inner();
    if let Err(err) = payload.validate() {
        return respond::bad_request(&err.to_string());
    }

    let email = payload.email.trim().to_lowercase();
    let existing = sqlx::query_as::<_, (String,)>("SELECT id FROM users WHERE email = ? LIMIT 1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await;
    match existing {
        Ok(Some(_)) => return respond::conflict("Email is already registered"),
        Ok(None) => {}
        Err(err) => return db_error(err),
    }

    let password_hash = match hash_password(&payload.password) {
        Ok(hash) => hash,
        Err(err) => {
            log::error!("Password hash error: {err}");
            return respond::internal();
        }
    };

    let user_id = new_id();
    let result = sqlx::query(
        r#"INSERT INTO users (id, name, email, phone, birthday, gender, role, password_hash, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&user_id)
    .bind(payload.name.trim())
    .bind(&email)
    .bind(&payload.phone)
    .bind(&payload.birthday)
    .bind(payload.gender as i64)
    .bind(ROLE_USER)
    .bind(password_hash)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(&state.db)
    .await;
    if let Err(err) = result {
        return db_error(err);
    }

    let user = match crate::db::fetch_user(&state.db, &user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return respond::internal(),
        Err(err) => return db_error(err),
    };
    let token = match issue_session(&state.db, &user_id).await {
        Ok(token) => token,
        Err(err) => return db_error(err),
    };

    respond::ok_with("user", UserView::from(user), "token", token)
}

async fn login(state: web::Data<AppState>, payload: web::Json<LoginPayload>) -> HttpResponse {
    let payload = payload.into_inner();
    let email = payload.email.trim().to_lowercase();

    let user = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE email = ? LIMIT 1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await;
    let user = match user {
        Ok(Some(user)) => user,
        Ok(None) => return invalid_credentials(),
        Err(err) => return db_error(err),
    };

    if !verify_password(&payload.password, &user.password_hash) {
        return invalid_credentials();
    }

    let token = match issue_session(&state.db, &user.id).await {
        Ok(token) => token,
        Err(err) => return db_error(err),
    };

    respond::ok_with("user", UserView::from(user), "token", token)
}

fn invalid_credentials() -> HttpResponse {
    respond::fail(StatusCode::UNAUTHORIZED, "Invalid email or password")
}

async fn list_rooms(state: web::Data<AppState>, query: web::Query<RoomQuery>) -> HttpResponse {
    rooms_page(&state, None, query.into_inner()).await
}

async fn location_rooms(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<RoomQuery>,
) -> HttpResponse {
    let location_id = path.into_inner();
    match fetch_location(&state.db, &location_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return respond::not_found("Location not found"),
        Err(err) => return db_error(err),
    }
    rooms_page(&state, Some(&location_id), query.into_inner()).await
}

/// Shared listing path: fetch the candidate set, then filter, sort, and slice
/// it with the query engine.
async fn rooms_page(
    state: &web::Data<AppState>,
    location_id: Option<&str>,
    filter: RoomQuery,
) -> HttpResponse {
    let amenities = match query::parse_amenities(filter.amenities.as_deref()) {
        Ok(amenities) => amenities,
        Err(message) => return respond::bad_request(&message),
    };
    let sort = match filter.sort.as_deref() {
        None => None,
        Some(raw) => match SortKey::parse(raw) {
            Some(key) => Some(key),
            None => return respond::bad_request(&format!("Unknown sort: {raw}")),
        },
    };

    let rows = match location_id {
        Some(location_id) => {
            sqlx::query_as::<_, RoomRow>("SELECT * FROM rooms WHERE location_id = ?")
                .bind(location_id)
                .fetch_all(&state.db)
                .await
        }
        None => {
            sqlx::query_as::<_, RoomRow>("SELECT * FROM rooms")
                .fetch_all(&state.db)
                .await
        }
    };
    let rows = match rows {
        Ok(rows) => rows,
        Err(err) => return db_error(err),
    };

    let mut filtered = query::filter_rooms(rows, &filter, &amenities);
    if let Some(key) = sort {
        query::sort_rooms(&mut filtered, key);
    }
    let (page, pagination) = query::paginate(filtered, filter.page, filter.page_size);
    let rooms: Vec<RoomView> = page.into_iter().map(RoomView::from).collect();

    respond::ok_paged("rooms", rooms, pagination)
}

async fn room_detail(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    match fetch_room(&state.db, &path.into_inner()).await {
        Ok(Some(room)) => respond::ok("room", RoomView::from(room)),
        Ok(None) => respond::not_found("Room not found"),
        Err(err) => db_error(err),
    }
}

async fn list_locations(state: web::Data<AppState>) -> HttpResponse {
    let rows = sqlx::query_as::<_, LocationRow>(
        "SELECT id, name, province, country, image FROM locations ORDER BY name",
    )
    .fetch_all(&state.db)
    .await;
    match rows {
        Ok(locations) => respond::ok("locations", locations),
        Err(err) => db_error(err),
    }
}

async fn paged_search(state: web::Data<AppState>, query: web::Query<PagedQuery>) -> HttpResponse {
    let query = query.into_inner();
    let rows = sqlx::query_as::<_, LocationRow>(
        "SELECT id, name, province, country, image FROM locations ORDER BY name",
    )
    .fetch_all(&state.db)
    .await;
    let rows = match rows {
        Ok(rows) => rows,
        Err(err) => return db_error(err),
    };

    let filtered: Vec<LocationRow> = match query.keyword.as_deref() {
        Some(keyword) => rows
            .into_iter()
            .filter(|location| query::keyword_matches(&location.name, keyword))
            .collect(),
        None => rows,
    };
    let (page, pagination) = query::paginate(filtered, query.page, query.page_size);

    respond::ok_paged("locations", page, pagination)
}

async fn location_detail(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    match fetch_location(&state.db, &path.into_inner()).await {
        Ok(Some(location)) => respond::ok("location", location),
        Ok(None) => respond::not_found("Location not found"),
        Err(err) => db_error(err),
    }
}

async fn list_comments(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PagedQuery>,
) -> HttpResponse {
    let room_id = path.into_inner();
    match fetch_room(&state.db, &room_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return respond::not_found("Room not found"),
        Err(err) => return db_error(err),
    }

    let rows = sqlx::query_as::<_, CommentRow>(
        r#"SELECT c.id, c.room_id, c.user_id, u.name AS author_name, u.avatar AS author_avatar,
                  c.content, c.rating, c.posted_on
           FROM comments c
           JOIN users u ON c.user_id = u.id
           WHERE c.room_id = ?
           ORDER BY c.posted_on DESC"#,
    )
    .bind(&room_id)
    .fetch_all(&state.db)
    .await;
    let rows = match rows {
        Ok(rows) => rows,
        Err(err) => return db_error(err),
    };

    let query = query.into_inner();
    let (page, pagination) = query::paginate(rows, query.page, query.page_size);
    let comments: Vec<CommentView> = page.into_iter().map(CommentView::from).collect();

    respond::ok_paged("comments", comments, pagination)
}

pub(crate) fn db_error(err: sqlx::Error) -> HttpResponse {
    log::error!("Database error: {err}");
    respond::internal()
}

#[cfg(test)]
mod tests {
    use actix_web::{test, web, App};
    use serde_json::{json, Value};

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
    async fn room_listing_filters_sorts_and_paginates() {
        let state = testing::state().await;
        testing::seed_room(&state, "Pricey Penthouse", 300, None).await;
        testing::seed_room(&state, "Budget Bunk", 100, None).await;
        testing::seed_room(&state, "Middle Flat", 200, None).await;
        let app = service!(state);

        let req = test::TestRequest::get()
            .uri("/rooms?price_min=100&price_max=250&sort=price_asc&page=1&page_size=10")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], json!(true));
        let rooms = body["rooms"].as_array().unwrap();
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0]["price"], json!(100));
        assert_eq!(rooms[1]["price"], json!(200));
        assert_eq!(body["pagination"]["totalRow"], json!(2));
        assert_eq!(body["pagination"]["totalPages"], json!(1));
    }

    #[actix_web::test]
    async fn unknown_amenity_returns_bad_request() {
        let state = testing::state().await;
        let app = service!(state);

        let req = test::TestRequest::get()
            .uri("/rooms?amenities=wifi,jacuzzi")
            .to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), 400);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["success"], json!(false));
    }

    #[actix_web::test]
    async fn missing_room_is_a_not_found_envelope() {
        let state = testing::state().await;
        let app = service!(state);

        let req = test::TestRequest::get().uri("/rooms/nope").to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), 404);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["message"], json!("Room not found"));
    }

    #[actix_web::test]
    async fn location_rooms_are_scoped_to_the_location() {
        let state = testing::state().await;
        let dalat = testing::seed_location(&state, "Da Lat").await;
        testing::seed_room(&state, "Pine Studio", 45, Some(&dalat)).await;
        testing::seed_room(&state, "Elsewhere", 45, None).await;
        let app = service!(state);

        let req = test::TestRequest::get()
            .uri(&format!("/locations/{dalat}/rooms"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let rooms = body["rooms"].as_array().unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0]["name"], json!("Pine Studio"));
    }

    #[actix_web::test]
    async fn paged_location_search_matches_keyword_case_insensitively() {
        let state = testing::state().await;
        testing::seed_location(&state, "Da Lat").await;
        testing::seed_location(&state, "Hoi An").await;
        let app = service!(state);

        let req = test::TestRequest::get()
            .uri("/locations/paged-search?keyword=da%20lat&page=1&page_size=5")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let locations = body["locations"].as_array().unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0]["name"], json!("Da Lat"));
        assert_eq!(body["pagination"]["totalRow"], json!(1));
    }

    #[actix_web::test]
    async fn register_then_login_issues_tokens() {
        let state = testing::state().await;
        let app = service!(state);

        let req = test::TestRequest::post()
            .uri("/auth/register")
            .set_json(json!({
                "name": "New Guest",
                "email": "guest@example.com",
                "password": "password123"
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["user"]["role"], json!("USER"));
        assert!(!body["token"].as_str().unwrap().is_empty());

        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({ "email": "guest@example.com", "password": "password123" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], json!(true));
        assert!(!body["token"].as_str().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn duplicate_email_registration_conflicts() {
        let state = testing::state().await;
        testing::seed_guest(&state).await;
        let app = service!(state);

        let req = test::TestRequest::post()
            .uri("/auth/register")
            .set_json(json!({
                "name": "Copy Cat",
                "email": "guest@example.com",
                "password": "password123"
            }))
            .to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), 409);
    }

    #[actix_web::test]
    async fn database_failures_surface_as_internal_errors_not_missing_rows() {
        let state = testing::state().await;
        let app = service!(state);
        state.db.close().await;

        let req = test::TestRequest::get().uri("/rooms/any-id").to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), 500);
        let body: Value = test::read_body_json(response).await;
        assert_eq!(body["success"], json!(false));
    }

    #[actix_web::test]
    async fn wrong_password_is_rejected() {
        let state = testing::state().await;
        testing::seed_guest(&state).await;
        let app = service!(state);

        let req = test::TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({ "email": "guest@example.com", "password": "wrong" }))
            .to_request();
        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), 401);
    }
}
