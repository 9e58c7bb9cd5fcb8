//! Resource-graph assembly for the Consul VPC stack
//!
//! Derives every subnet block, instance address, route, ACL entry and
//! security group from three loop indices plus a handful of parameters.
//! The derivation rules are load-bearing: downstream automation depends on
//! the exact CIDR layout and logical-id naming produced here.
//!
//! Layout per index i = 0, 1, 2:
//!
//! - public subnet `10.0.i.0/24` with a NAT device at `10.0.i.4`
//! - private subnet `10.0.(16+16i).0/20` with a Consul host at
//!   `10.0.(16+16i).4`, routed through the NAT device of the same index
//!
//! Public subnets share one route table pointing at the internet gateway;
//! each private subnet owns a route table pointing at its NAT instance.

use crate::config::{EC2_INSTANCE_TYPES, WILDCARD_CIDR};
use crate::net::Ipv4Cidr;
use crate::template::ec2::{self, SecurityGroupRule, Tag};
use crate::template::{Handle, Output, Parameter, Template, Value};
use crate::RegionImages;
use std::net::Ipv4Addr;

/// Number of public/private subnet pairs, one per availability zone.
pub const SUBNET_PAIRS: u32 = 3;

/// Host offset of the NAT device / Consul host inside its subnet.
const INSTANCE_HOST_OFFSET: u32 = 4;

/// TCP protocol number for ACL entries.
const TCP: i64 = 6;

/// Protocol wildcard for ACL entries matching all traffic.
const ALL_PROTOCOLS: i64 = -1;

/// The VPC's address block.
pub fn vpc_block() -> Ipv4Cidr {
    Ipv4Cidr::new(Ipv4Addr::new(10, 0, 0, 0), 16)
}

/// Address block of public subnet `index`: `10.0.<index>.0/24`.
pub fn public_subnet_block(index: u32) -> Ipv4Cidr {
    Ipv4Cidr::new(Ipv4Addr::new(10, 0, index as u8, 0), 24)
}

/// Address block of private subnet `index`: `10.0.<16 + 16*index>.0/20`.
pub fn private_subnet_block(index: u32) -> Ipv4Cidr {
    Ipv4Cidr::new(Ipv4Addr::new(10, 0, (16 + 16 * index) as u8, 0), 20)
}

/// Assemble the complete template from the two fetched image mappings.
pub fn build_template(nat_images: &RegionImages, ubuntu_images: &RegionImages) -> Template {
    let mut t = Template::new(
        "A VPC stack that includes public and private subnets with a Consul \
         cluster for DNS, service discovery and configuration management",
    );

    let key_name = t.add_parameter(
        "KeyName",
        Parameter::string().with_description("Name of an existing EC2 KeyPair to enable SSH access"),
    );

    let instance_type_param = |description: &str| {
        Parameter::string()
            .with_default("m1.small")
            .with_description(description)
            .with_allowed_values(&EC2_INSTANCE_TYPES)
            .with_constraint_description("must be a valid EC2 instance type.")
    };
    let bastion_instance_type = t.add_parameter(
        "BastionInstanceType",
        instance_type_param("Bastion EC2 instance type"),
    );
    let consul_instance_type = t.add_parameter(
        "ConsulInstanceType",
        instance_type_param("Consul EC2 instance type"),
    );
    let nat_instance_type = t.add_parameter(
        "NATInstanceType",
        instance_type_param("NAT Device EC2 instance type"),
    );

    let availability_zones = t.add_parameter(
        "AvailabilityZones",
        Parameter::comma_delimited_list()
            .with_default("a,b,e")
            .with_description(
                "A list of three availability zone letters to distribute the subnets across.",
            ),
    );

    t.add_mapping("AWSNATAMI", nat_images);
    t.add_mapping("UBUNTUAMI", ubuntu_images);

    let vpc = t.add_resource(
        "VPC",
        ec2::Vpc {
            cidr_block: vpc_block().to_string(),
            tags: vec![Tag::name(Value::join(
                "",
                vec!["vpc-consul-".into(), Value::region()],
            ))],
        },
    );

    let gateway = t.add_resource(
        "InternetGateway",
        ec2::InternetGateway {
            tags: vec![Tag::name("InternetGateway")],
        },
    );

    let gateway_attachment = t.add_resource(
        "GatewayToInternet",
        ec2::VpcGatewayAttachment {
            vpc_id: vpc.reference(),
            internet_gateway_id: gateway.reference(),
        },
    );

    let public_route_table = add_route_table(&mut t, "PublicRouteTable", &vpc);

    // The route is only valid once the gateway is attached to the VPC.
    t.add_resource_depending_on(
        "PublicRoute",
        ec2::Route {
            route_table_id: public_route_table.reference(),
            destination_cidr_block: WILDCARD_CIDR.to_string(),
            gateway_id: Some(gateway.reference()),
            instance_id: None,
        },
        &gateway_attachment,
    );

    let public_network_acl = add_network_acl(&mut t, "PublicNetworkAcl", &vpc);

    add_acl_entry(
        &mut t,
        "InboundHTTPPublicNetworkAclEntry",
        &public_network_acl,
        100,
        (80, 80),
        TCP,
        false,
    );
    add_acl_entry(
        &mut t,
        "InboundHTTPSPublicNetworkAclEntry",
        &public_network_acl,
        101,
        (443, 443),
        TCP,
        false,
    );
    add_acl_entry(
        &mut t,
        "InboundSSHPublicNetworkAclEntry",
        &public_network_acl,
        102,
        (22, 22),
        TCP,
        false,
    );
    add_acl_entry(
        &mut t,
        "InboundEphemeralPublicNetworkAclEntry",
        &public_network_acl,
        103,
        (1024, 65535),
        TCP,
        false,
    );
    add_acl_entry(
        &mut t,
        "OutboundPublicNetworkAclEntry",
        &public_network_acl,
        100,
        (0, 65535),
        ALL_PROTOCOLS,
        true,
    );

    let nat_security_group = t.add_resource(
        "NATSecurityGroup",
        ec2::SecurityGroup {
            group_description: "Enables internal access to the NAT device".to_string(),
            vpc_id: vpc.reference(),
            security_group_ingress: [22, 80, 443]
                .iter()
                .map(|&port| tcp_rule(WILDCARD_CIDR, port))
                .collect(),
            security_group_egress: [80, 443]
                .iter()
                .map(|&port| tcp_rule(WILDCARD_CIDR, port))
                .collect(),
            tags: vec![Tag::name("NATSecurityGroup")],
        },
    );

    let consul_security_group = t.add_resource(
        "ConsulSecurityGroup",
        ec2::SecurityGroup {
            group_description: "Enables internal access to Consul".to_string(),
            vpc_id: vpc.reference(),
            security_group_ingress: consul_rules(&[22, 53, 8400, 8500, 8600]),
            security_group_egress: consul_rules(&[53, 80, 443, 8400, 8500, 8600]),
            tags: vec![Tag::name("ConsulSecurityGroup")],
        },
    );

    // Isolation of the private subnets is enforced by security groups and
    // routing; the private ACL passes everything.
    let private_network_acl = add_network_acl(&mut t, "PrivateNetworkAcl", &vpc);
    add_acl_entry(
        &mut t,
        "InboundPrivateNetworkAclEntry",
        &private_network_acl,
        100,
        (0, 65535),
        ALL_PROTOCOLS,
        false,
    );
    add_acl_entry(
        &mut t,
        "OutBoundPrivateNetworkAclEntry",
        &private_network_acl,
        100,
        (0, 65535),
        ALL_PROTOCOLS,
        true,
    );

    let mut public_subnets: Vec<Handle> = Vec::new();
    let mut public_blocks: Vec<Ipv4Cidr> = Vec::new();
    let mut private_blocks: Vec<Ipv4Cidr> = Vec::new();

    for index in 0..SUBNET_PAIRS {
        let zone = Value::join(
            "",
            vec![
                Value::region(),
                Value::select(index as i64, availability_zones.reference()),
            ],
        );

        let public_block = public_subnet_block(index);
        let public_subnet = add_subnet(
            &mut t,
            &format!("PublicSubnet{index}"),
            &vpc,
            &public_block,
            zone.clone(),
        );

        t.add_resource(
            &format!("{}PublicRouteTableAssociation", public_subnet.logical_id()),
            ec2::SubnetRouteTableAssociation {
                subnet_id: public_subnet.reference(),
                route_table_id: public_route_table.reference(),
            },
        );
        t.add_resource(
            &format!(
                "{}PublicSubnetNetworkAclAssociation",
                public_subnet.logical_id()
            ),
            ec2::SubnetNetworkAclAssociation {
                subnet_id: public_subnet.reference(),
                network_acl_id: public_network_acl.reference(),
            },
        );

        // NAT devices live in the public subnets and forward for the
        // private subnet of the same index. Source/dest checking must be
        // off for forwarding to work.
        let nat_name = format!("NATDevice{}", index + 1);
        let nat_device = t.add_resource(
            &nat_name,
            ec2::Instance {
                instance_type: nat_instance_type.reference(),
                key_name: key_name.reference(),
                image_id: Value::find_in_map("AWSNATAMI", Value::region(), "AMI"),
                source_dest_check: Some(false),
                network_interfaces: vec![ec2::NetworkInterface {
                    description: "ENI for NAT device".to_string(),
                    group_set: vec![nat_security_group.reference()],
                    subnet_id: public_subnet.reference(),
                    private_ip_address: Some(
                        public_block.host(INSTANCE_HOST_OFFSET).to_string(),
                    ),
                    associate_public_ip_address: Some(true),
                    device_index: 0,
                    delete_on_termination: true,
                }],
                tags: vec![Tag::name(nat_name.as_str())],
            },
        );

        let private_block = private_subnet_block(index);
        let private_subnet = add_subnet(
            &mut t,
            &format!("PrivateSubnet{index}"),
            &vpc,
            &private_block,
            zone,
        );

        let private_route_table =
            add_route_table(&mut t, &format!("PrivateRouteTable{}", index + 1), &vpc);

        // All outbound traffic from the private subnet goes through the NAT.
        t.add_resource(
            &format!("PrivateRoute{}", index + 1),
            ec2::Route {
                route_table_id: private_route_table.reference(),
                destination_cidr_block: WILDCARD_CIDR.to_string(),
                gateway_id: None,
                instance_id: Some(nat_device.reference()),
            },
        );

        t.add_resource(
            &format!(
                "{}PrivateSubnetRouteTableAssociation",
                private_subnet.logical_id()
            ),
            ec2::SubnetRouteTableAssociation {
                subnet_id: private_subnet.reference(),
                route_table_id: private_route_table.reference(),
            },
        );
        t.add_resource(
            &format!(
                "{}PrivateSubnetNetworkAclAssociation",
                private_subnet.logical_id()
            ),
            ec2::SubnetNetworkAclAssociation {
                subnet_id: private_subnet.reference(),
                network_acl_id: private_network_acl.reference(),
            },
        );

        // Consul servers go in the private subnets, no public address.
        let consul_name = format!("ConsulHost{}", index + 1);
        t.add_resource(
            &consul_name,
            ec2::Instance {
                instance_type: consul_instance_type.reference(),
                key_name: key_name.reference(),
                image_id: Value::find_in_map("UBUNTUAMI", Value::region(), "AMI"),
                source_dest_check: None,
                network_interfaces: vec![ec2::NetworkInterface {
                    description: "ENI for Consul host".to_string(),
                    group_set: vec![consul_security_group.reference()],
                    subnet_id: private_subnet.reference(),
                    private_ip_address: Some(
                        private_block.host(INSTANCE_HOST_OFFSET).to_string(),
                    ),
                    associate_public_ip_address: None,
                    device_index: 0,
                    delete_on_termination: true,
                }],
                tags: vec![Tag::name(consul_name.as_str())],
            },
        );

        public_subnets.push(public_subnet);
        public_blocks.push(public_block);
        private_blocks.push(private_block);
    }

    // SSH out of the bastion is restricted to the subnet blocks; web
    // egress stays open for package installs.
    let bastion_egress: Vec<SecurityGroupRule> = public_blocks
        .iter()
        .chain(&private_blocks)
        .map(|block| tcp_rule(&block.to_string(), 22))
        .chain([80, 443].iter().map(|&port| tcp_rule(WILDCARD_CIDR, port)))
        .collect();

    let bastion_security_group = t.add_resource(
        "BastionSecurityGroup",
        ec2::SecurityGroup {
            group_description: "Enables access to the bastion host".to_string(),
            vpc_id: vpc.reference(),
            security_group_ingress: vec![tcp_rule(WILDCARD_CIDR, 22)],
            security_group_egress: bastion_egress,
            tags: vec![Tag::name("BastionSecurityGroup")],
        },
    );

    let bastion_host = t.add_resource(
        "BastionHost",
        ec2::Instance {
            instance_type: bastion_instance_type.reference(),
            key_name: key_name.reference(),
            image_id: Value::find_in_map("UBUNTUAMI", Value::region(), "AMI"),
            source_dest_check: None,
            network_interfaces: vec![ec2::NetworkInterface {
                description: "ENI for bastion host".to_string(),
                group_set: vec![bastion_security_group.reference()],
                subnet_id: public_subnets[0].reference(),
                private_ip_address: None,
                associate_public_ip_address: Some(true),
                device_index: 0,
                delete_on_termination: true,
            }],
            tags: vec![Tag::name("BastionHost")],
        },
    );

    t.add_output(
        "BastionIPAddress",
        Output::new(
            "IP address of the bastion host",
            bastion_host.get_att("PublicIp"),
        ),
    );

    t
}

fn add_subnet(
    t: &mut Template,
    name: &str,
    vpc: &Handle,
    block: &Ipv4Cidr,
    availability_zone: Value,
) -> Handle {
    t.add_resource(
        name,
        ec2::Subnet {
            vpc_id: vpc.reference(),
            cidr_block: block.to_string(),
            availability_zone,
            tags: vec![Tag::name(name)],
        },
    )
}

fn add_route_table(t: &mut Template, name: &str, vpc: &Handle) -> Handle {
    t.add_resource(
        name,
        ec2::RouteTable {
            vpc_id: vpc.reference(),
            tags: vec![Tag::name(name)],
        },
    )
}

fn add_network_acl(t: &mut Template, name: &str, vpc: &Handle) -> Handle {
    t.add_resource(
        name,
        ec2::NetworkAcl {
            vpc_id: vpc.reference(),
            tags: vec![Tag::name(name)],
        },
    )
}

/// Allow entry covering `ports` from/to anywhere.
fn add_acl_entry(
    t: &mut Template,
    name: &str,
    acl: &Handle,
    rule_number: i64,
    ports: (i64, i64),
    protocol: i64,
    egress: bool,
) -> Handle {
    t.add_resource(
        name,
        ec2::NetworkAclEntry {
            network_acl_id: acl.reference(),
            rule_number,
            protocol,
            rule_action: "allow".to_string(),
            egress,
            cidr_block: WILDCARD_CIDR.to_string(),
            port_range: ec2::PortRange {
                from: ports.0,
                to: ports.1,
            },
        },
    )
}

fn tcp_rule(cidr: &str, port: i64) -> SecurityGroupRule {
    SecurityGroupRule::new("tcp", cidr, port, port)
}

/// Rules for the Consul ports: DNS (53), RPC (8400), HTTP API (8500), DNS
/// interface (8600) over TCP and UDP, plus the server/serf range 8300-8302.
/// `single_tcp` carries the direction-specific single-port TCP allowances.
fn consul_rules(single_tcp: &[i64]) -> Vec<SecurityGroupRule> {
    let mut rules: Vec<SecurityGroupRule> = single_tcp
        .iter()
        .map(|&port| tcp_rule(WILDCARD_CIDR, port))
        .collect();
    for protocol in ["tcp", "udp"] {
        rules.push(SecurityGroupRule::new(protocol, WILDCARD_CIDR, 8300, 8302));
    }
    rules.extend(
        [53, 8400, 8500, 8600]
            .iter()
            .map(|&port| SecurityGroupRule::new("udp", WILDCARD_CIDR, port, port)),
    );
    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subnet_blocks_fit_inside_the_vpc() {
        let vpc = vpc_block();
        for index in 0..SUBNET_PAIRS {
            assert!(vpc.contains_block(&public_subnet_block(index)));
            assert!(vpc.contains_block(&private_subnet_block(index)));
        }
    }

    #[test]
    fn subnet_blocks_are_disjoint() {
        let blocks: Vec<Ipv4Cidr> = (0..SUBNET_PAIRS)
            .map(public_subnet_block)
            .chain((0..SUBNET_PAIRS).map(private_subnet_block))
            .collect();
        for (i, a) in blocks.iter().enumerate() {
            for b in &blocks[i + 1..] {
                assert!(!a.overlaps(b), "{a} overlaps {b}");
            }
        }
    }

    #[test]
    fn derived_blocks_match_the_convention() {
        assert_eq!(public_subnet_block(0).to_string(), "10.0.0.0/24");
        assert_eq!(public_subnet_block(2).to_string(), "10.0.2.0/24");
        assert_eq!(private_subnet_block(0).to_string(), "10.0.16.0/20");
        assert_eq!(private_subnet_block(1).to_string(), "10.0.32.0/20");
        assert_eq!(private_subnet_block(2).to_string(), "10.0.48.0/20");
    }

    #[test]
    fn instance_addresses_sit_inside_their_blocks() {
        for index in 0..SUBNET_PAIRS {
            let public = public_subnet_block(index);
            let private = private_subnet_block(index);
            assert!(public.contains(public.host(INSTANCE_HOST_OFFSET)));
            assert!(private.contains(private.host(INSTANCE_HOST_OFFSET)));
        }
    }
}
