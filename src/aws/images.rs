//! Amazon NAT image lookup
//!
//! Resolves the newest amazon-owned VPC NAT image per region via
//! DescribeImages. Amazon's naming convention ends NAT image names with a
//! date stamp, so the lexicographically greatest non-beta name is the
//! newest release. Fragile if the convention changes, but it is the
//! published contract for these images.

use super::AwsContext;
use crate::error::GenerateError;
use crate::RegionImages;
use anyhow::{Context, Result};
use aws_sdk_ec2::types::Filter;
use tracing::{debug, info};

/// Owner filter for the NAT image lookup.
pub const NAT_IMAGE_OWNER: &str = "amazon";

/// Name pattern matching Amazon's published VPC NAT images.
pub const NAT_IMAGE_NAME_PATTERN: &str = "*ami-vpc-nat*";

/// Marker excluding pre-release builds from selection.
const PRERELEASE_MARKER: &str = "beta";

/// Resolve the newest NAT image for every region in `regions`.
pub async fn fetch_nat_images(regions: &[&str]) -> Result<RegionImages> {
    info!(pattern = NAT_IMAGE_NAME_PATTERN, "Fetching NAT image ids");

    let mut images = RegionImages::new();
    for region in regions {
        let ctx = AwsContext::new(region).await;
        let ami = newest_nat_image(&ctx.ec2_client(), region).await?;
        debug!(%region, %ami, "Resolved NAT image");
        images.insert((*region).to_string(), ami);
    }
    Ok(images)
}

async fn newest_nat_image(client: &aws_sdk_ec2::Client, region: &str) -> Result<String> {
    let response = client
        .describe_images()
        .owners(NAT_IMAGE_OWNER)
        .filters(
            Filter::builder()
                .name("name")
                .values(NAT_IMAGE_NAME_PATTERN)
                .build(),
        )
        .send()
        .await
        .with_context(|| format!("Failed to describe NAT images in {region}"))?;

    let candidates = response.images().iter().filter_map(|image| {
        match (image.name(), image.image_id()) {
            (Some(name), Some(id)) => Some((name.to_string(), id.to_string())),
            _ => None,
        }
    });

    let ami = select_newest(candidates).ok_or_else(|| GenerateError::ImageNotFound {
        region: region.to_string(),
        criteria: NAT_IMAGE_NAME_PATTERN.to_string(),
    })?;
    Ok(ami)
}

/// Pick the image id with the lexicographically greatest name, skipping
/// pre-release builds.
pub fn select_newest(images: impl IntoIterator<Item = (String, String)>) -> Option<String> {
    images
        .into_iter()
        .filter(|(name, _)| !name.contains(PRERELEASE_MARKER))
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, id)| id)
}
