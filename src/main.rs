use actix_web::{HttpServer, App, web::Data};
use dotenv::dotenv;
use log::{info, error};
use std::{sync::Arc, process::exit};

use step_sync::authtoken::{AuthTokenCache, Credentials};
use step_sync::client::RemoteStepsClient;
use step_sync::routes;
use step_sync::service::StepsSyncService;
use step_sync::source::SampleFileSource;
use step_sync::store::FileStore;
use step_sync::timing::RefreshTimer;
use step_sync::types::{SharedStore, SharedViewModel};
use step_sync::util::{self, Config, VAR_API_BASE_URL, VAR_API_IDENTIFIER, VAR_API_PASSWORD, VAR_STEP_SAMPLES_PATH};
use step_sync::viewmodel::SyncViewModel;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("Required environment variables: {VAR_API_BASE_URL} {VAR_API_IDENTIFIER} {VAR_API_PASSWORD} {VAR_STEP_SAMPLES_PATH}");
            exit(1)
        }
    };
    util::init_logging();

    let http = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(std::io::Error::other)?;

    let store: SharedStore = Arc::new(FileStore::new(&config.token_store_path));
    let credentials = Credentials { identifier: config.identifier.clone(), password: config.password.clone() };
    let auth_token = AuthTokenCache::new(http.clone(), &config.api_base_url, credentials, store);
    let client = RemoteStepsClient::new(http, &config.api_base_url, config.username.clone(), auth_token);
    let source = Arc::new(SampleFileSource::new(&config.step_samples_path));
    let service = Arc::new(StepsSyncService::new(source, client, config.history_days));

    let view_model: SharedViewModel = Arc::new(SyncViewModel::new(service));
    view_model.on_appear().await;
    info!("Initial sync done: {} steps today", view_model.state().await.steps_today());

    info!("Serving on {}:{}", config.host, config.port);
    let mut refresh_timer = RefreshTimer::start(Arc::clone(&view_model), config.refresh_interval);
    let view_model_data = Data::new(view_model);

    let server_handle = HttpServer::new(move || {
        App::new()
            .app_data(Data::clone(&view_model_data))
            .configure(routes::configure)
    })
        .bind((config.host.as_str(), config.port))?
        .run();

    let result = tokio::select! {
        result = server_handle => result,
        _ = refresh_timer.join() => {
            error!("Refresh timer exited unexpectedly");
            Ok(())
        }
    };
    refresh_timer.stop().await;
    result
}
