//! Server entry point.
//!
//! # Responsibility
//! - Parse configuration and start logging before anything else.
//! - Open the store, optionally seed it, then serve `/api/users`.

mod config;

use actix_web::middleware::{Logger, NormalizePath};
use actix_web::{App, HttpServer};
use clap::Parser;
use config::{Config, DatabaseLocation};
use log::{error, info, warn};
use roster_core::db::{open_db, open_db_in_memory};
use roster_core::{init_logging, seed_sample_users};
use roster_http::{configure, AppState};
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    let config = Config::parse();
    let target = config.log_target().map_err(io::Error::other)?;
    init_logging(config.log_level(), &target).map_err(io::Error::other)?;

    let conn = match config.database_location() {
        DatabaseLocation::InMemory => open_db_in_memory(),
        DatabaseLocation::File(path) => open_db(path),
    }
    .map_err(|err| {
        error!("event=app_start module=cli status=error error_code=db_open_failed error={err}");
        io::Error::other(err)
    })?;
    let state = AppState::new(conn);

    if config.seed_sample_data {
        seed(&state);
    }

    let bind = config.bind.clone();
    let server_state = state.clone();
    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(NormalizePath::trim())
            .wrap(Logger::default())
            .configure(configure(server_state.clone()))
    });
    if let Some(workers) = config.workers {
        server = server.workers(workers.get());
    }

    let server = server.bind(bind.as_str()).map_err(|err| {
        error!("event=http_server module=cli status=error bind={bind} error={err}");
        err
    })?;
    info!("event=http_server module=cli status=start bind={bind}");

    let result = server.run().await;
    info!("event=http_server module=cli status=stopped");
    result
}

fn seed(state: &AppState) {
    match state.with_service(|service| seed_sample_users(service)) {
        Ok(report) if report.failures.is_empty() => {}
        Ok(report) => warn!(
            "event=sample_data_seed module=cli status=partial failed={}",
            report.failures.len()
        ),
        Err(err) => warn!(
            "event=sample_data_seed module=cli status=error error_code={}",
            err.code()
        ),
    }
}
