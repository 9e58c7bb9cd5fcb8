//! Error taxonomy for the generation run
//!
//! The taxonomy is deliberately flat: every variant is fatal and aborts the
//! run before any artifact is written. Call sites wrap these in
//! `anyhow::Error` for context, the way the AWS modules do elsewhere.

use thiserror::Error;

/// Fatal conditions a generation run can hit.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The published image catalog request did not return success.
    #[error("image catalog unavailable: {url} returned HTTP {status}")]
    CatalogUnavailable { url: String, status: u16 },

    /// No image satisfied the selection criteria for a region.
    #[error("no image found for {region} matching {criteria}")]
    ImageNotFound { region: String, criteria: String },

    /// CloudFormation rejected the assembled template.
    #[error("template validation rejected: {message}")]
    ValidationRejected { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        let err = GenerateError::CatalogUnavailable {
            url: "http://cloud-images.ubuntu.com/query/trusty".to_string(),
            status: 404,
        };
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("cloud-images.ubuntu.com"));

        let err = GenerateError::ImageNotFound {
            region: "us-east-1".to_string(),
            criteria: "amd64 ebs paravirtual".to_string(),
        };
        assert!(err.to_string().contains("us-east-1"));
        assert!(err.to_string().contains("paravirtual"));
    }

    #[test]
    fn validation_message_surfaced_verbatim() {
        let err = GenerateError::ValidationRejected {
            message: "Template format error: unresolved resource".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "template validation rejected: Template format error: unresolved resource"
        );
    }
}
