use restapi::config::Config;
use restapi::controller::ExchangeSettings;
use restapi::controllers;
use restapi::dispatcher::Dispatcher;
use restapi::logger;
use restapi::registry::Registry;
use restapi::server::{self, ServerError, ServerState};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional first argument: config file path, extension optional
    let cfg = match std::env::args().nth(1) {
        Some(path) => Config::load_from(&path)?,
        None => Config::load()?,
    };
    logger::init(&cfg)?;

    // Unknown controller kinds abort startup rather than 404 at request time
    let registry = Registry::from_config(&cfg.api.resources, &controllers::catalog())?;
    if registry.is_empty() {
        logger::log_warning("No resources configured; every request will answer 404");
    }

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg, registry))?;
    Ok(())
}

async fn async_main(cfg: Config, registry: Registry) -> Result<(), ServerError> {
    let addr = cfg.get_socket_addr().map_err(ServerError::Address)?;
    let listener = server::create_reusable_listener(addr)?;

    let names: Vec<&str> = registry.names().collect();
    logger::log_server_start(&addr, &cfg, &names);

    let dispatcher = Dispatcher::new(registry, ExchangeSettings::from(&cfg));
    let state = ServerState::new(cfg, dispatcher);

    // spawn_local needs a LocalSet
    let local = tokio::task::LocalSet::new();
    local.run_until(server::start_server_loop(listener, state)).await
}
