use portfolio_api::app::{create_app, exposes_path};
use portfolio_api::auth::{hash_password, purge_expired_sessions, AppState};
use portfolio_api::config::{load_config, save_default_config, Config};
use portfolio_api::constants::{CONFIG_PATH, DATABASE_PATH, DATA_DIR, GALLERY_DIR, ORIGINALS_DIR};
use portfolio_api::database::{create_pool, init_database};
use portfolio_api::logging::{init_logging, install_panic_hook};
use portfolio_api::processor::Watermarker;
use portfolio_api::storage::{build_store, NoPayments};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

fn init_directories() -> std::io::Result<()> {
    for dir in [&*DATA_DIR, &*GALLERY_DIR, &*ORIGINALS_DIR] {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn exit_with(message: &str, err: impl std::fmt::Display) -> ! {
    error!("{}: {}", message, err);
    eprintln!("{}: {}", message, err);
    std::process::exit(1);
}

fn run_cli_commands() {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|arg| arg == "--init-config") {
        match save_default_config(&CONFIG_PATH) {
            Ok(_) => {
                println!("Default configuration saved to {:?}", *CONFIG_PATH);
                std::process::exit(0);
            }
            Err(e) => {
                eprintln!("Failed to save default configuration: {}", e);
                std::process::exit(1);
            }
        }
    }

    if let Some(pos) = args.iter().position(|arg| arg == "--hash-password") {
        let Some(password) = args.get(pos + 1) else {
            eprintln!("Usage: --hash-password <password>");
            std::process::exit(2);
        };
        match hash_password(password) {
            Ok(hash) => {
                println!("{}", hash);
                std::process::exit(0);
            }
            Err(e) => {
                eprintln!("Failed to hash password: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn build_state(config: Arc<Config>) -> AppState {
    let pool = create_pool(&DATABASE_PATH)
        .unwrap_or_else(|e| exit_with("Failed to create database pool", e));

    {
        let conn = pool
            .get()
            .unwrap_or_else(|e| exit_with("Failed to get connection", e));
        init_database(&conn).unwrap_or_else(|e| exit_with("Failed to initialize database", e));
        match purge_expired_sessions(&conn) {
            Ok(0) => {}
            Ok(n) => info!("Purged {} expired sessions", n),
            Err(e) => error!("Failed to purge expired sessions: {}", e),
        }
    }

    let store = build_store(&config, GALLERY_DIR.clone(), ORIGINALS_DIR.clone())
        .unwrap_or_else(|e| exit_with("Failed to configure photo store", e));
    info!("Photo store: {}", store.backend());

    let watermarker = Arc::new(Watermarker::from_config(&config.watermark));

    AppState {
        config,
        pool,
        store,
        watermarker,
        payments: Arc::new(NoPayments),
    }
}

#[tokio::main]
async fn main() {
    run_cli_commands();

    init_logging();
    install_panic_hook();

    let config = Arc::new(load_config(&CONFIG_PATH));

    if let Err(e) = init_directories() {
        exit_with("Failed to create data directories", e);
    }

    if exposes_path(Path::new(&config.server.static_dir), &DATA_DIR) {
        exit_with(
            "Refusing to start",
            format!(
                "server.static_dir {:?} contains the data directory {:?}",
                config.server.static_dir, *DATA_DIR
            ),
        );
    }

    if config.admin.password_hash.is_none() && config.admin.password == "change-me" {
        tracing::warn!("Admin password is the default; set admin.password or PORTFOLIO_ADMIN_PASSWORD");
    }

    let state = build_state(Arc::clone(&config));
    let app = create_app(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .unwrap_or_else(|e| exit_with("Invalid listen address", e));
    info!("Starting portfolio API on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| exit_with("Failed to bind", e));

    if let Err(e) = axum::serve(listener, app).await {
        exit_with("Server failed", e);
    }
}
