//! vpc-consul - Consul VPC CloudFormation template generator
//!
//! One-shot generator for a VPC template with public/private subnets, a
//! Consul cluster, per-subnet NAT devices and a bastion host.
//!
//! ## Modules
//!
//! - [`config`]: fixed region/instance-type catalogs and defaults
//! - [`catalog`]: Ubuntu published image catalog fetcher
//! - [`aws`]: NAT image lookup and CloudFormation validation
//! - [`template`]: CloudFormation document model with typed handles
//! - [`stack`]: resource-graph assembly for the Consul VPC layout
//! - [`net`]: IPv4 CIDR arithmetic for subnet derivation
//! - [`error`]: error taxonomy for the generation run

pub mod aws;
pub mod catalog;
pub mod config;
pub mod error;
pub mod net;
pub mod stack;
pub mod template;

/// Region → AMI id table produced by the image fetchers and consumed as a
/// template mapping.
pub type RegionImages = std::collections::BTreeMap<String, String>;
