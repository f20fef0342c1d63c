//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::pagination::{Collection, PaginationOptions};
use serde_json::Value;
use std::io::{self, Write};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    ///
    /// Ctrl-C cancels the in-flight request or rate-limit wait.
    pub async fn run(&self) -> Result<()> {
        let settings = self.load_settings()?;
        let client = build_client(&settings)?;

        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_interrupt.cancel();
            }
        });

        // Stdout locks per write, never across a request
        self.execute(&client, &cancel, &mut io::stdout()).await
    }

    /// Run the command against `client`, writing results to `out`
    pub async fn execute(
        &self,
        client: &HttpClient,
        cancel: &CancellationToken,
        out: &mut dyn Write,
    ) -> Result<()> {
        match &self.cli.command {
            Commands::Get { path } => {
                let body = client.get(cancel, path).await?;
                out.write_all(&body)?;
                writeln!(out)?;
                Ok(())
            }
            Commands::Delete { path } => {
                client.delete(cancel, path).await?;
                info!("Deleted {}", path);
                Ok(())
            }
            Commands::List {
                path,
                key,
                cursor,
                page_size,
                max_pages,
            } => {
                let options = if *cursor {
                    PaginationOptions::cursor(*page_size)
                } else {
                    PaginationOptions::offset(*page_size)
                };
                list(client, cancel, path, key, &options, *max_pages, out).await
            }
        }
    }

    /// Load settings from the `--settings` file
    fn load_settings(&self) -> Result<Settings> {
        let path = self
            .cli
            .settings
            .as_ref()
            .ok_or_else(|| Error::config("Settings file not specified (use -s flag)"))?;
        Ok(Settings::from_file(path)?.with_env_overrides())
    }
}

/// Build a client from settings, attaching the credential when one is set
pub fn build_client(settings: &Settings) -> Result<HttpClient> {
    let client = HttpClient::with_config(settings.to_http_config()?)?;
    Ok(match settings.credential()? {
        Some(credential) => client.with_credential(credential),
        None => client,
    })
}

async fn list(
    client: &HttpClient,
    cancel: &CancellationToken,
    path: &str,
    key: &str,
    options: &PaginationOptions,
    max_pages: Option<usize>,
    out: &mut dyn Write,
) -> Result<()> {
    let collection: Collection<Value> = Collection::new(path, key);
    let mut pages = collection.iter(client, options, cancel.clone());

    let mut fetched = 0usize;
    let mut records = 0usize;
    while pages.has_more() {
        if max_pages.is_some_and(|max| fetched >= max) {
            debug!("Stopping after {} pages", fetched);
            break;
        }
        let page = pages.get_next().await?;
        fetched += 1;
        records += page.len();

        let mut lines = Vec::new();
        for record in &page {
            serde_json::to_writer(&mut lines, record)?;
            lines.push(b'\n');
        }
        out.write_all(&lines)?;
        out.flush()?;
    }

    info!("Listed {} records from {} in {} pages", records, path, fetched);
    Ok(())
}
