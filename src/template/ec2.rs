//! Typed EC2 resource properties
//!
//! Each struct serializes to the `Properties` bag of the matching
//! `AWS::EC2::*` resource type. Fields that take references or intrinsics
//! are [`Value`]; fixed strings stay `String`.

use super::{ResourceProperties, Value};
use serde::Serialize;

/// A `Key`/`Value` resource tag. The value may be an intrinsic, e.g. a
/// `Fn::Join` over the region pseudo-parameter.
#[derive(Debug, Clone, Serialize)]
pub struct Tag {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Value")]
    pub value: Value,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The conventional `Name` tag.
    pub fn name(value: impl Into<Value>) -> Self {
        Self::new("Name", value)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Vpc {
    pub cidr_block: String,
    pub tags: Vec<Tag>,
}

impl ResourceProperties for Vpc {
    const TYPE: &'static str = "AWS::EC2::VPC";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InternetGateway {
    pub tags: Vec<Tag>,
}

impl ResourceProperties for InternetGateway {
    const TYPE: &'static str = "AWS::EC2::InternetGateway";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcGatewayAttachment {
    pub vpc_id: Value,
    pub internet_gateway_id: Value,
}

impl ResourceProperties for VpcGatewayAttachment {
    const TYPE: &'static str = "AWS::EC2::VPCGatewayAttachment";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Subnet {
    pub vpc_id: Value,
    pub cidr_block: String,
    pub availability_zone: Value,
    pub tags: Vec<Tag>,
}

impl ResourceProperties for Subnet {
    const TYPE: &'static str = "AWS::EC2::Subnet";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RouteTable {
    pub vpc_id: Value,
    pub tags: Vec<Tag>,
}

impl ResourceProperties for RouteTable {
    const TYPE: &'static str = "AWS::EC2::RouteTable";
}

/// A route entry. Exactly one of `gateway_id` / `instance_id` is set:
/// internet-gateway egress for public traffic, a NAT instance for private.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Route {
    pub route_table_id: Value,
    pub destination_cidr_block: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<Value>,
}

impl ResourceProperties for Route {
    const TYPE: &'static str = "AWS::EC2::Route";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubnetRouteTableAssociation {
    pub subnet_id: Value,
    pub route_table_id: Value,
}

impl ResourceProperties for SubnetRouteTableAssociation {
    const TYPE: &'static str = "AWS::EC2::SubnetRouteTableAssociation";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkAcl {
    pub vpc_id: Value,
    pub tags: Vec<Tag>,
}

impl ResourceProperties for NetworkAcl {
    const TYPE: &'static str = "AWS::EC2::NetworkAcl";
}

#[derive(Debug, Clone, Serialize)]
pub struct PortRange {
    #[serde(rename = "From")]
    pub from: i64,
    #[serde(rename = "To")]
    pub to: i64,
}

/// A numbered allow/deny rule in a network ACL. Rules are evaluated in
/// ascending `rule_number` order per direction.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkAclEntry {
    pub network_acl_id: Value,
    pub rule_number: i64,
    pub protocol: i64,
    pub rule_action: String,
    pub egress: bool,
    pub cidr_block: String,
    pub port_range: PortRange,
}

impl ResourceProperties for NetworkAclEntry {
    const TYPE: &'static str = "AWS::EC2::NetworkAclEntry";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubnetNetworkAclAssociation {
    pub subnet_id: Value,
    pub network_acl_id: Value,
}

impl ResourceProperties for SubnetNetworkAclAssociation {
    const TYPE: &'static str = "AWS::EC2::SubnetNetworkAclAssociation";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityGroupRule {
    pub ip_protocol: String,
    pub cidr_ip: String,
    pub from_port: i64,
    pub to_port: i64,
}

impl SecurityGroupRule {
    pub fn new(protocol: impl Into<String>, cidr: impl Into<String>, from: i64, to: i64) -> Self {
        Self {
            ip_protocol: protocol.into(),
            cidr_ip: cidr.into(),
            from_port: from,
            to_port: to,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityGroup {
    pub group_description: String,
    pub vpc_id: Value,
    pub security_group_ingress: Vec<SecurityGroupRule>,
    pub security_group_egress: Vec<SecurityGroupRule>,
    pub tags: Vec<Tag>,
}

impl ResourceProperties for SecurityGroup {
    const TYPE: &'static str = "AWS::EC2::SecurityGroup";
}

/// Embedded network attachment descriptor for an instance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkInterface {
    pub description: String,
    pub group_set: Vec<Value>,
    pub subnet_id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub associate_public_ip_address: Option<bool>,
    pub device_index: i64,
    pub delete_on_termination: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Instance {
    pub instance_type: Value,
    pub key_name: Value,
    pub image_id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_dest_check: Option<bool>,
    pub network_interfaces: Vec<NetworkInterface>,
    pub tags: Vec<Tag>,
}

impl ResourceProperties for Instance {
    const TYPE: &'static str = "AWS::EC2::Instance";
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn subnet_properties_use_pascal_case() {
        let subnet = Subnet {
            vpc_id: Value::reference("VPC"),
            cidr_block: "10.0.0.0/24".to_string(),
            availability_zone: Value::from("us-east-1a"),
            tags: vec![Tag::name("PublicSubnet0")],
        };
        assert_eq!(
            serde_json::to_value(&subnet).unwrap(),
            json!({
                "VpcId": {"Ref": "VPC"},
                "CidrBlock": "10.0.0.0/24",
                "AvailabilityZone": "us-east-1a",
                "Tags": [{"Key": "Name", "Value": "PublicSubnet0"}]
            })
        );
    }

    #[test]
    fn acl_entry_port_range_keys() {
        let entry = NetworkAclEntry {
            network_acl_id: Value::reference("PublicNetworkAcl"),
            rule_number: 103,
            protocol: 6,
            rule_action: "allow".to_string(),
            egress: false,
            cidr_block: "0.0.0.0/0".to_string(),
            port_range: PortRange {
                from: 1024,
                to: 65535,
            },
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["PortRange"], json!({"From": 1024, "To": 65535}));
        assert_eq!(json["Egress"], json!(false));
    }

    #[test]
    fn instance_omits_unset_optionals() {
        let instance = Instance {
            instance_type: Value::reference("ConsulInstanceType"),
            key_name: Value::reference("KeyName"),
            image_id: Value::find_in_map("UBUNTUAMI", Value::region(), "AMI"),
            source_dest_check: None,
            network_interfaces: vec![NetworkInterface {
                description: "ENI for Consul host".to_string(),
                group_set: vec![Value::reference("ConsulSecurityGroup")],
                subnet_id: Value::reference("PrivateSubnet0"),
                private_ip_address: Some("10.0.16.4".to_string()),
                associate_public_ip_address: None,
                device_index: 0,
                delete_on_termination: true,
            }],
            tags: vec![Tag::name("ConsulHost1")],
        };
        let json = serde_json::to_value(&instance).unwrap();
        assert!(json.get("SourceDestCheck").is_none());
        let eni = &json["NetworkInterfaces"][0];
        assert!(eni.get("AssociatePublicIpAddress").is_none());
        assert_eq!(eni["PrivateIpAddress"], json!("10.0.16.4"));
    }
}
