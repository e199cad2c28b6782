use actix_web::{middleware::Logger, web, App, HttpServer};
use egresso::auth::SqliteSessionStore;
use egresso::config::Settings;
use egresso::{manage, routes, AppState};
use log::{error, info};
use std::path::Path;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            error!("Couldnt read the configuration: {}", e);
            std::process::exit(1);
        }
    };

    let db = match egresso::connect(&settings.database_url).await {
        Ok(db) => db,
        Err(e) => {
            error!("Couldnt open {}: {}", settings.database_url, e);
            std::process::exit(1);
        }
    };
    info!("Database {} is ready", settings.database_url);

    if let Some(dir) = &settings.seed_dir {
        match manage::load_seed(Path::new(dir), &db).await {
            Ok(report) => info!("Seed {}: {:?}", dir, report),
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        }
    }

    let addr = match settings.addr() {
        Ok(a) => a,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let state = AppState {
        db: db.clone(),
        sessions: Arc::new(SqliteSessionStore::new(db)),
        session_ttl: settings.session_ttl_secs,
    };

    info!("Listening on {}", addr);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(routes::configure)
    })
    .bind(addr)?
    .run()
    .await
}
