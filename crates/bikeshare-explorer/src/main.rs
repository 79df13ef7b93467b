mod bootstrap;
mod query;
mod render;
mod session;

use std::io;

use anyhow::Result;
use bikeshare_core::settings::Settings;

use crate::session::Session;

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("Bikeshare explorer v{} starting", env!("CARGO_PKG_VERSION"));

    let catalog = bootstrap::load_catalog(settings.catalog_dir.as_deref())?;
    let data_dir = bootstrap::discover_data_dir(settings.data_dir.as_deref());
    tracing::info!("Reading trip data from {}", data_dir.display());

    let stdout = io::stdout();
    match settings.city.as_deref() {
        Some(city) => {
            tracing::info!(
                "Running query: city={}, month={}, day={}",
                city,
                settings.month,
                settings.day
            );
            query::run(&settings, &catalog, &data_dir, city, &mut stdout.lock())
        }
        None => Session::new(&catalog, data_dir, io::stdin().lock(), stdout.lock()).run(),
    }
}
