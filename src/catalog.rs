//! Ubuntu published image catalog fetcher
//!
//! cloud-images.ubuntu.com publishes a tab-separated flat file per release
//! suite listing every current image. One fetch resolves an AMI id for all
//! target regions; a missing row for any region aborts the run.

use crate::error::GenerateError;
use crate::RegionImages;
use anyhow::{Context, Result};
use tracing::{debug, info};

/// Base URL of the published catalog.
pub const CLOUD_IMAGES_BASE_URL: &str = "http://cloud-images.ubuntu.com";

/// Fields a row must carry, besides the region, to be selected.
const REQUIRED_FIELDS: [&str; 3] = ["amd64", "ebs", "paravirtual"];

/// Zero-based column holding the AMI id in a catalog row.
const AMI_COLUMN: usize = 7;

/// Catalog URL for a release suite.
pub fn catalog_url(suite: &str) -> String {
    format!("{CLOUD_IMAGES_BASE_URL}/query/{suite}/server/released.current.txt")
}

/// Fetch the released-image catalog for `suite` and resolve an AMI id for
/// every region in `regions`.
pub async fn fetch_ubuntu_images(
    client: &reqwest::Client,
    suite: &str,
    regions: &[&str],
) -> Result<RegionImages> {
    let url = catalog_url(suite);
    info!(%url, "Fetching Ubuntu image catalog");

    let response = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch Ubuntu image catalog from {url}"))?;
    let status = response.status();
    if !status.is_success() {
        return Err(GenerateError::CatalogUnavailable {
            url,
            status: status.as_u16(),
        }
        .into());
    }
    let body = response
        .text()
        .await
        .context("Failed to read Ubuntu image catalog body")?;

    let mut images = RegionImages::new();
    for region in regions {
        let ami = image_id_for_region(&body, region)?;
        debug!(%region, %ami, "Resolved Ubuntu image");
        images.insert((*region).to_string(), ami.to_string());
    }
    Ok(images)
}

/// Scan catalog rows for the first one whose fields include `region` plus
/// all of [`REQUIRED_FIELDS`], and return its AMI id.
pub fn image_id_for_region<'a>(
    catalog: &'a str,
    region: &str,
) -> Result<&'a str, GenerateError> {
    for row in catalog.lines() {
        let fields: Vec<&str> = row.split('\t').collect();
        let matches = std::iter::once(region)
            .chain(REQUIRED_FIELDS)
            .all(|needle| fields.contains(&needle));
        if matches {
            if let Some(&ami) = fields.get(AMI_COLUMN) {
                return Ok(ami);
            }
        }
    }
    Err(GenerateError::ImageNotFound {
        region: region.to_string(),
        criteria: REQUIRED_FIELDS.join(" "),
    })
}
