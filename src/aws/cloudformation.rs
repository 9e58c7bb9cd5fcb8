//! CloudFormation template validation
//!
//! The assembled document is submitted whole to ValidateTemplate before it
//! is written anywhere. A rejection surfaces the provider's message
//! verbatim and aborts the run.

use super::AwsContext;
use crate::error::GenerateError;
use anyhow::Result;
use aws_sdk_cloudformation::error::ProvideErrorMetadata;
use tracing::info;

/// Validate `template_body` against the CloudFormation API.
pub async fn validate_template(ctx: &AwsContext, template_body: &str) -> Result<()> {
    info!(region = %ctx.region(), "Validating template with CloudFormation");

    ctx.cloudformation_client()
        .validate_template()
        .template_body(template_body)
        .send()
        .await
        .map_err(|e| {
            let message = e
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| e.to_string());
            GenerateError::ValidationRejected { message }
        })?;

    info!("Template accepted by CloudFormation");
    Ok(())
}
