use dotenvy::dotenv;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::env;
use std::str::FromStr;

use fne_manager::config::Config;
use fne_manager::database::schema;
use fne_manager::services::user_service;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let [username, password] = args.as_slice() else {
        eprintln!("usage: add_user <username> <password>");
        std::process::exit(2);
    };

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match SqliteConnectOptions::from_str(&config.database.url) {
        Ok(options) => SqlitePoolOptions::new()
            .connect_with(options.create_if_missing(true))
            .await,
        Err(e) => Err(e),
    };
    let pool = match pool {
        Ok(p) => p,
        Err(e) => {
            eprintln!("cannot open {}: {}", config.database.url, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = schema::bootstrap(&pool).await {
        eprintln!("schema bootstrap failed: {}", e);
        std::process::exit(1);
    }

    match user_service::create_user(&pool, username, password).await {
        Ok(id) => println!("created user {} (id={})", username.trim(), id),
        Err(e) => {
            eprintln!("add_user failed: {}", e);
            std::process::exit(1);
        }
    }
}
