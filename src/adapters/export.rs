use crate::core::Listing;
use crate::utils::error::Result;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct CsvRow<'a> {
    name: &'a str,
    price: f64,
    url: &'a str,
}

/// Writes listings as `name,price,url`, replacing any existing file.
pub fn write_listings_csv<P: AsRef<Path>>(path: P, listings: &[Listing]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for listing in listings {
        writer.serialize(CsvRow {
            name: &listing.name,
            price: listing.price,
            url: listing.url.as_deref().unwrap_or(""),
        })?;
    }
    writer.flush()?;

    tracing::debug!("Exported {} listings to {}", listings.len(), path.display());
    Ok(())
}
