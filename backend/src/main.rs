use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::info;
use std::io;
use wa_dispatch::config::AppConfig;
use wa_dispatch::job_controller::state::{self, JobsState};
use wa_dispatch::services;
use wa_dispatch::services::dispatch::engine::DispatchEngine;
use wa_dispatch::services::templates::store::TemplateStore;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let config = AppConfig::from_env();
    let url = format!("http://{}:{}", config.host, config.port);

    let store = TemplateStore::open(&config.db_path)
        .map_err(|e| io::Error::other(format!("template store: {e}")))?;
    let engine = DispatchEngine::from_config(&config)
        .map_err(|e| io::Error::other(format!("notification client: {e}")))?;

    // Initialize job controller state
    let (jobs_state, rx) = JobsState::new(100);

    // Start job updater task
    let updater_state = jobs_state.clone();
    tokio::spawn(async move {
        state::start_job_updater(updater_state, rx).await;
    });

    let bind = (config.host.clone(), config.port);
    let config = web::Data::new(config);
    let store = web::Data::new(store);
    let engine = web::Data::new(engine);
    let jobs_state = web::Data::new(jobs_state);

    info!("Server running at {}", url);

    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(10 * 1024 * 1024)) // 10 MB
            .app_data(config.clone())
            .app_data(store.clone())
            .app_data(engine.clone())
            .app_data(jobs_state.clone())
            .service(services::templates::configure_routes())
            .service(services::data_sources::csv::configure_routes())
            .service(services::media::configure_routes())
            .service(services::dispatch::configure_routes())
            .service(services::jobs::configure_routes())
    })
    .bind(bind)?
    .run()
    .await
}
