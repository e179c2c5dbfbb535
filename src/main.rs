use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};
use car_rental_scraper::config::Config;
use car_rental_scraper::db;
use car_rental_scraper::scrape::{ChromeDriver, Scraper};
use log::{error, info, warn};
use rusqlite::Connection;
use std::sync::Mutex;

/// Shared application state, injected into every handler via `web::Data`.
struct AppState {
    scraper: Scraper<ChromeDriver>,
    db: Mutex<Connection>,
}

/// Run a full scrape and return the listings as a JSON array. Internal
/// failure kinds are logged, never exposed; the client only sees success
/// (possibly an empty array) or a generic 500.
#[get("/cars")]
async fn cars(data: web::Data<AppState>) -> impl Responder {
    let state = data.clone();
    // The browser pipeline is blocking; keep it off the event loop.
    let result = web::block(move || state.scraper.scrape_listings()).await;

    match result {
        Ok(Ok(listings)) => {
            match data.db.lock() {
                Ok(mut conn) => {
                    if let Err(e) = db::replace_listings(&mut conn, &listings) {
                        warn!("Failed to cache listings: {}", e);
                    }
                }
                Err(e) => warn!("Listing cache lock poisoned: {}", e),
            }
            HttpResponse::Ok().json(listings)
        }
        Ok(Err(e)) => {
            error!("Scrape failed: {}", e);
            HttpResponse::InternalServerError().body("Scraping failed.")
        }
        Err(e) => {
            error!("Scrape task failed: {}", e);
            HttpResponse::InternalServerError().body("Scraping failed.")
        }
    }
}

/// Serve the last successful scrape from the SQLite cache without touching
/// the browser.
#[get("/cars/cached")]
async fn cached_cars(data: web::Data<AppState>) -> impl Responder {
    let conn = match data.db.lock() {
        Ok(conn) => conn,
        Err(e) => {
            error!("Listing cache lock poisoned: {}", e);
            return HttpResponse::InternalServerError().body("Cache unavailable.");
        }
    };

    match db::load_listings(&conn) {
        Ok(listings) => HttpResponse::Ok().json(listings),
        Err(e) => {
            error!("Failed to load cached listings: {}", e);
            HttpResponse::InternalServerError().body("Cache unavailable.")
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    log4rs::init_file("log4rs.yml", Default::default()).unwrap();

    let config = Config::load();
    let conn = db::init_db(&config.scraper.cache_path)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    let scraper = Scraper::new(
        ChromeDriver::new(config.browser_config()),
        config.scrape_target(),
    );

    let state = web::Data::new(AppState {
        scraper,
        db: Mutex::new(conn),
    });

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Scraping {} for listings", config.scraper.target_url);
    info!("Listening on {}", addr);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(cars)
            .service(cached_cars)
    })
    .bind(&addr)?
    .run()
    .await
}
