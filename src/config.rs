//! Fixed catalogs and default configuration values
//!
//! These constants pin down the template's external surface: which regions
//! the AMI mappings cover, which instance types the parameters allow, and
//! the default Ubuntu suite for the published image catalog.

/// Regions covered by the template's AMI mappings.
pub const EC2_REGIONS: [&str; 8] = [
    "us-east-1",
    "us-west-1",
    "us-west-2",
    "eu-west-1",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-northeast-1",
    "sa-east-1",
];

/// Instance types allowed by the template's type parameters.
pub const EC2_INSTANCE_TYPES: [&str; 15] = [
    "t1.micro",
    "m1.small",
    "m1.medium",
    "m1.large",
    "m1.xlarge",
    "m2.xlarge",
    "m2.2xlarge",
    "m2.4xlarge",
    "m3.xlarge",
    "m3.2xlarge",
    "c1.medium",
    "c1.xlarge",
    "cc1.4xlarge",
    "cc2.8xlarge",
    "cg1.4xlarge",
];

/// Match-everything CIDR used by default routes and wide-open rules.
pub const WILDCARD_CIDR: &str = "0.0.0.0/0";

/// Default Ubuntu release suite for the bastion and Consul host images.
pub const DEFAULT_UBUNTU_SUITE: &str = "trusty";

/// Default filename the generated template is written to.
pub const DEFAULT_OUTPUT_PATH: &str = "template.json";
