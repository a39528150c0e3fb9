mod auth;
mod db;
mod models;
mod query;
mod respond;
mod routes;
mod state;
mod stay;
mod uploads;

use actix_files::Files;
use actix_web::{error::InternalError, middleware, web, App, HttpServer};
use dotenv::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::env;
use std::str::FromStr;

use crate::state::{AppState, UploadConfig};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(err) = run().await {
        eprintln!("Startup error: {err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let db_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://./data/roomnest.db".to_string());
    db::ensure_sqlite_dir(&db_url)?;

    let connect_options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await?;

    db::run_migrations(&pool).await?;
    db::seed_defaults(&pool).await?;

    let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "./data/uploads".to_string());
    std::fs::create_dir_all(&upload_dir)?;

    let state = AppState {
        db: pool.clone(),
        uploads: UploadConfig {
            dir: upload_dir.clone(),
            public_base: "/static".to_string(),
        },
    };

    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8080);

    let address = format!("0.0.0.0:{port}");
    log::info!("Starting Roomnest on http://{address}");

    HttpServer::new(move || {
        // Malformed payloads and query strings get the same envelope as
        // handler-level validation failures.
        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            let response = respond::bad_request(&err.to_string());
            InternalError::from_response(err, response).into()
        });
        let query_config = web::QueryConfig::default().error_handler(|err, _req| {
            let response = respond::bad_request(&err.to_string());
            InternalError::from_response(err, response).into()
        });

        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(json_config)
            .app_data(query_config)
            .wrap(middleware::Logger::default())
            .service(Files::new("/static", upload_dir.clone()).prefer_utf8(true))
            .configure(routes::public::configure)
            .configure(routes::admin::configure)
            .configure(routes::account::configure)
    })
    .bind(address)?
    .run()
    .await?;

    Ok(())
}
