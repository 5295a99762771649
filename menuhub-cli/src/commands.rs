use std::sync::Arc;

use anyhow::{Context, Result};
use menuhub_client::{ClientConfig, FileStore, MenuClient};

use crate::cli::{Cli, Commands};

mod catalog_commands_impl {
    pub use crate::catalog_commands::*;
}
mod session_commands_impl {
    pub use crate::session_commands::*;
}

pub async fn run(cli: Cli) -> Result<()> {
    let client = build_client(&cli)?;

    match cli.command {
        Commands::Login { username, password } => {
            session_commands_impl::login(&client, &username, &password).await
        },
        Commands::Logout => session_commands_impl::logout(&client),
        Commands::Whoami { json } => session_commands_impl::whoami(&client, json),
        Commands::Businesses { paging, sort, json } => {
            catalog_commands_impl::list_businesses(&client, &paging, sort, json).await
        },
        Commands::Categories { slug, paging, json } => {
            catalog_commands_impl::list_categories(&client, &slug, &paging, json).await
        },
        Commands::Menu { slug, public, json } => {
            catalog_commands_impl::show_menu(&client, &slug, public, json).await
        },
        Commands::Upload { file, content_type, json } => {
            catalog_commands_impl::upload(&client, &file, content_type, json).await
        },
        Commands::Request { method, path, body, slug, query } => {
            catalog_commands_impl::raw_request(&client, &method, &path, body, slug, query).await
        },
    }
}

fn build_client(cli: &Cli) -> Result<MenuClient> {
    let mut config = ClientConfig::new(cli.api_url.clone());
    config.timeout_secs = cli.timeout;
    if let Some(path) = &cli.refresh_path {
        config.endpoints.refresh = path.clone();
    }

    let store = match &cli.store {
        Some(path) => FileStore::new(path),
        None => FileStore::default_location().context("Failed to locate session file")?,
    };
    tracing::debug!(store = %store.path().display(), api = %config.base_url, "Using session file");

    MenuClient::new(config, Arc::new(store)).context("Failed to create API client")
}
