mod accounts;
mod api;
mod auth;
mod config;
mod datastore;
mod feed;
mod images;
mod metrics;
mod twoface;

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate prometheus;
#[macro_use]
extern crate guard;
#[macro_use]
extern crate diesel;

use crate::auth::Tokens;
use crate::config::Config;
use crate::datastore::postgres::PostgresStore;
use crate::images::filesystem::FilesystemStore;
use actix_service::Service;
use actix_web::{
    dev::{Server, ServiceResponse},
    middleware, web, App, HttpServer,
};
use futures::future::FutureExt;
use std::io;
use std::sync::Arc;
use tracing::{info, Level};

type AppState = api::State<PostgresStore>;

fn main() {
    let args: Vec<_> = std::env::args().collect();
    guard!(let [_, config_file_path, ..] = &args[..] else {
        eprintln!("First argument should be path to config file");
        return
    });

    let config = Config::from_file(config_file_path);
    init_logging(config.human_logs);
    info!("starting photofeed");

    let sys = actix_rt::System::new("photofeed");

    let db = PostgresStore::connect(&config).expect("couldn't connect to Postgres");
    prometheus::register(Box::new(db.clone())).expect("couldn't register DB metrics");

    let images = FilesystemStore::new(config.upload_dir.clone())
        .expect("couldn't create the upload directory");
    info!(dir = %config.upload_dir.display(), "storing uploaded images");

    // Shared by the userfacing and admin servers
    let state = api::State {
        ds: Arc::new(db),
        images: Arc::new(images),
        max_upload_size: config.max_upload_size,
    };
    let tokens = web::Data::new(Tokens::new(&config.jwt_secret, config.token_ttl_secs));

    userfacing_server(&config, state.clone(), tokens)
        .expect("couldn't start userfacing HTTP server");
    admin_server(&config, state).expect("couldn't start admin HTTP server");
    metrics_server(&config).expect("couldn't start metrics server");

    sys.run().expect("actix runtime terminated");
}

fn init_logging(human_logs: bool) {
    let subscriber_builder = tracing_subscriber::fmt().with_max_level(Level::DEBUG);
    if human_logs {
        subscriber_builder.init();
    } else {
        subscriber_builder.json().init();
    }
}

/// Accounts, posts, likes, follows and image uploads, for the public internet.
fn userfacing_server(
    config: &Config,
    state: AppState,
    tokens: web::Data<Tokens>,
) -> io::Result<Server> {
    let addr = &config.userfacing_listen_address;
    info!(addr = &addr[..], "starting userfacing API server");
    let max_body_size = config.max_body_size;
    let server = HttpServer::new(move || {
        App::new()
            .wrap_fn(|request, srv| srv.call(request).map(count_status))
            .wrap(middleware::Logger::default())
            .data(state.clone())
            .app_data(tokens.clone())
            .app_data(web::JsonConfig::default().limit(max_body_size))
            .configure(api::accounts::configure::<PostgresStore>)
            .configure(api::userfacing::configure::<PostgresStore>)
            .configure(api::uploads::configure::<PostgresStore>)
    })
    .bind(addr)?
    .run();
    Ok(server)
}

/// Unauthenticated listing of every post. Must not be exposed publicly.
fn admin_server(config: &Config, state: AppState) -> io::Result<Server> {
    let addr = &config.admin_listen_address;
    info!(addr = &addr[..], "starting admin API server");
    let server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .data(state.clone())
            .service(web::scope("/admin").configure(api::admin::configure::<PostgresStore>))
    })
    .bind(addr)?
    .run();
    Ok(server)
}

fn metrics_server(config: &Config) -> io::Result<Server> {
    let addr = &config.metrics_address;
    info!(addr = &addr[..], "starting metrics server");
    let server = HttpServer::new(|| {
        App::new().service(
            web::scope("/metrics")
                .service(web::resource("/").route(web::get().to(metrics::endpoint::gather)))
                .service(web::resource("").route(web::get().to(metrics::endpoint::gather))),
        )
    })
    .bind(addr)?
    .run();
    Ok(server)
}

/// Count every response the userfacing server sends, by HTTP status.
fn count_status<E, B>(response: Result<ServiceResponse<B>, E>) -> Result<ServiceResponse<B>, E> {
    if let Ok(response) = &response {
        metrics::HTTP_RESPONSES
            .with_label_values(&[response.status().as_str()])
            .inc();
    }
    response
}
