use std::io;

use anyhow::Context;

use storefront_cli::{CatalogConfig, Shell};

fn main() -> anyhow::Result<()> {
    storefront_observability::init();

    let catalog = CatalogConfig::from_env().context("failed to load catalog")?;
    let store = catalog.build_store().context("catalog is invalid")?;
    tracing::info!("store opened with {} product(s)", store.len());

    let stdin = io::stdin();
    let stdout = io::stdout();
    Shell::new(&store, stdin.lock(), stdout.lock())
        .run()
        .context("shell terminated unexpectedly")?;

    Ok(())
}
