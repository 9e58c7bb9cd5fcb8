//! AWS service wrappers for the generator
//!
//! - context: SDK config loading and client construction
//! - images: NAT AMI lookup via DescribeImages
//! - cloudformation: ValidateTemplate call

pub mod cloudformation;
pub mod context;
pub mod images;

pub use context::AwsContext;
pub use images::fetch_nat_images;
