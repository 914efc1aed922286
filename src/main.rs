use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paygate::auth::hash_password;
use paygate::config::Config;
use paygate::db::{AppState, create_pool, init_db, queries};
use paygate::handlers;
use paygate::models::CreateUser;
use paygate::webhook::SignatureVerifier;

#[derive(Parser, Debug)]
#[command(name = "paygate")]
#[command(about = "Payment webhook gateway with an account ledger")]
struct Cli {
    /// Path to the SQLite database file (overrides DATABASE_PATH)
    #[arg(long)]
    database: Option<String>,

    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,
}

/// Create the default admin login unless one already exists.
fn bootstrap_admin_user(state: &AppState) {
    const ADMIN_EMAIL: &str = "admin@example.com";

    let conn = state
        .db
        .get()
        .expect("Failed to get db connection for bootstrap");

    let existing =
        queries::get_user_by_email(&conn, ADMIN_EMAIL).expect("Failed to look up bootstrap admin");
    if existing.is_some() {
        tracing::info!("Admin user already exists, skipping bootstrap");
        return;
    }

    let password_hash = hash_password("admin").expect("Failed to hash bootstrap password");
    let input = CreateUser {
        email: ADMIN_EMAIL.to_string(),
        password: "admin".to_string(),
        full_name: Some("admin".to_string()),
        is_admin: true,
    };
    queries::create_user(&conn, &input, &password_hash).expect("Failed to create bootstrap admin");

    tracing::info!("============================================");
    tracing::info!("BOOTSTRAP ADMIN CREATED");
    tracing::info!("Email: {}", ADMIN_EMAIL);
    tracing::info!("Password: admin (change it before going live)");
    tracing::info!("============================================");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paygate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration, CLI flags win over the environment
    let mut config = Config::from_env();
    if let Some(database) = cli.database {
        config.database_path = database;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    // Create the database pool and initialize the schema
    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let state = AppState {
        db: db_pool,
        verifier: SignatureVerifier::new(config.webhook_secret.clone()),
        jwt_secret: config.jwt_secret.clone(),
    };

    bootstrap_admin_user(&state);

    // Build the application router
    let app = Router::new()
        // Public endpoints (greeting + token-protected user views)
        .merge(handlers::public::router(state.clone()))
        // Login
        .merge(handlers::auth::router())
        // Payment provider webhook (signature auth)
        .merge(handlers::webhook::router())
        // Admin API (admin token auth)
        .merge(handlers::admin::router(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Paygate server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
