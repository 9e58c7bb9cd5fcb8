//! Whole-document properties of the assembled Consul VPC template
//!
//! These tests build the template with synthetic image mappings and check
//! the serialized JSON, so they cover the document a downstream consumer
//! actually sees.

use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;

use serde_json::Value;
use vpc_consul::config::{EC2_INSTANCE_TYPES, EC2_REGIONS};
use vpc_consul::net::Ipv4Cidr;
use vpc_consul::stack::{build_template, SUBNET_PAIRS};
use vpc_consul::RegionImages;

fn sample_images(prefix: &str) -> RegionImages {
    EC2_REGIONS
        .iter()
        .enumerate()
        .map(|(i, region)| (region.to_string(), format!("ami-{prefix}{i:04x}")))
        .collect()
}

fn build_document() -> Value {
    let template = build_template(&sample_images("0a"), &sample_images("0b"));
    let body = template.to_json().expect("template serializes");
    serde_json::from_str(&body).expect("template is valid JSON")
}

/// Collect every name the document references: `Ref` targets, the first
/// element of `Fn::GetAtt`, and `DependsOn` values.
fn collect_references(value: &Value, out: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                match (key.as_str(), inner) {
                    ("Ref", Value::String(target)) => {
                        out.insert(target.clone());
                    }
                    ("Fn::GetAtt", Value::Array(args)) => {
                        if let Some(Value::String(target)) = args.first() {
                            out.insert(target.clone());
                        }
                    }
                    ("DependsOn", Value::String(target)) => {
                        out.insert(target.clone());
                    }
                    _ => {}
                }
                collect_references(inner, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_references(item, out);
            }
        }
        _ => {}
    }
}

#[test]
fn every_reference_resolves() {
    let doc = build_document();

    let mut declared: BTreeSet<String> = BTreeSet::new();
    declared.insert("AWS::Region".to_string());
    for section in ["Parameters", "Resources"] {
        declared.extend(doc[section].as_object().unwrap().keys().cloned());
    }

    let mut referenced = BTreeSet::new();
    collect_references(&doc, &mut referenced);
    assert!(!referenced.is_empty());

    for target in &referenced {
        assert!(declared.contains(target), "dangling reference: {target}");
    }
}

#[test]
fn resource_naming_follows_the_convention() {
    let doc = build_document();
    let resources = doc["Resources"].as_object().unwrap();

    for index in 0..SUBNET_PAIRS {
        assert!(resources.contains_key(&format!("PublicSubnet{index}")));
        assert!(resources.contains_key(&format!("PrivateSubnet{index}")));
        assert!(resources.contains_key(&format!("NATDevice{}", index + 1)));
        assert!(resources.contains_key(&format!("ConsulHost{}", index + 1)));
        assert!(resources.contains_key(&format!("PrivateRouteTable{}", index + 1)));
        assert!(resources.contains_key(&format!("PrivateRoute{}", index + 1)));
    }
    assert!(resources.contains_key("BastionHost"));
    assert!(resources.contains_key("PublicRouteTable"));
}

#[test]
fn subnet_blocks_sit_inside_the_vpc_and_stay_disjoint() {
    let doc = build_document();
    let resources = doc["Resources"].as_object().unwrap();

    let vpc: Ipv4Cidr = resources["VPC"]["Properties"]["CidrBlock"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();

    let blocks: Vec<(String, Ipv4Cidr)> = resources
        .iter()
        .filter(|(_, r)| r["Type"] == "AWS::EC2::Subnet")
        .map(|(name, r)| {
            let block = r["Properties"]["CidrBlock"].as_str().unwrap().parse().unwrap();
            (name.clone(), block)
        })
        .collect();
    assert_eq!(blocks.len(), 2 * SUBNET_PAIRS as usize);

    for (name, block) in &blocks {
        assert!(vpc.contains_block(block), "{name} outside the VPC block");
    }
    for (i, (name_a, a)) in blocks.iter().enumerate() {
        for (name_b, b) in &blocks[i + 1..] {
            assert!(!a.overlaps(b), "{name_a} overlaps {name_b}");
        }
    }
}

#[test]
fn instance_addresses_lie_inside_their_subnets() {
    let doc = build_document();
    let resources = doc["Resources"].as_object().unwrap();

    let mut fixed_addresses = 0;
    for (name, resource) in resources {
        if resource["Type"] != "AWS::EC2::Instance" {
            continue;
        }
        for eni in resource["Properties"]["NetworkInterfaces"].as_array().unwrap() {
            let Some(address) = eni.get("PrivateIpAddress") else {
                continue;
            };
            let address: Ipv4Addr = address.as_str().unwrap().parse().unwrap();
            let subnet_id = eni["SubnetId"]["Ref"].as_str().unwrap();
            let block: Ipv4Cidr = resources[subnet_id]["Properties"]["CidrBlock"]
                .as_str()
                .unwrap()
                .parse()
                .unwrap();
            assert!(
                block.contains(address),
                "{name} address {address} outside {subnet_id} block {block}"
            );
            fixed_addresses += 1;
        }
    }
    // one NAT device and one Consul host per index; the bastion has no fixed address
    assert_eq!(fixed_addresses, 2 * SUBNET_PAIRS as usize);
}

#[test]
fn acl_rule_numbers_are_unique_per_direction() {
    let doc = build_document();
    let resources = doc["Resources"].as_object().unwrap();

    let mut seen: BTreeMap<(String, bool), BTreeSet<i64>> = BTreeMap::new();
    for (name, resource) in resources {
        if resource["Type"] != "AWS::EC2::NetworkAclEntry" {
            continue;
        }
        let props = &resource["Properties"];
        let acl = props["NetworkAclId"]["Ref"].as_str().unwrap().to_string();
        let egress = props["Egress"].as_bool().unwrap();
        let rule_number = props["RuleNumber"].as_i64().unwrap();
        let fresh = seen.entry((acl, egress)).or_default().insert(rule_number);
        assert!(fresh, "{name} reuses rule number {rule_number}");
    }
    assert!(!seen.is_empty());
}

#[test]
fn single_output_names_the_bastion_public_ip() {
    let doc = build_document();
    let outputs = doc["Outputs"].as_object().unwrap();

    assert_eq!(outputs.len(), 1);
    let output = &outputs["BastionIPAddress"];
    assert_eq!(
        output["Value"]["Fn::GetAtt"],
        serde_json::json!(["BastionHost", "PublicIp"])
    );
    assert!(output["Description"].as_str().unwrap().contains("bastion"));
}

#[test]
fn mappings_cover_every_region() {
    let doc = build_document();
    for mapping in ["AWSNATAMI", "UBUNTUAMI"] {
        let table = doc["Mappings"][mapping].as_object().unwrap();
        assert_eq!(table.len(), EC2_REGIONS.len());
        for region in EC2_REGIONS {
            let ami = table[region]["AMI"].as_str().unwrap();
            assert!(ami.starts_with("ami-"));
        }
    }
}

#[test]
fn instance_type_parameters_share_the_allowed_list() {
    let doc = build_document();
    for name in ["BastionInstanceType", "ConsulInstanceType", "NATInstanceType"] {
        let param = &doc["Parameters"][name];
        assert_eq!(param["Default"], "m1.small");
        assert_eq!(
            param["AllowedValues"].as_array().unwrap().len(),
            EC2_INSTANCE_TYPES.len()
        );
        assert_eq!(
            param["ConstraintDescription"],
            "must be a valid EC2 instance type."
        );
    }
    assert_eq!(doc["Parameters"]["AvailabilityZones"]["Default"], "a,b,e");
}

#[test]
fn generation_is_deterministic() {
    let nat = sample_images("0a");
    let ubuntu = sample_images("0b");
    let first = build_template(&nat, &ubuntu).to_json().unwrap();
    let second = build_template(&nat, &ubuntu).to_json().unwrap();
    assert_eq!(first, second);
}

#[test]
fn private_routes_target_the_matching_nat_device() {
    let doc = build_document();
    let resources = doc["Resources"].as_object().unwrap();

    for index in 0..SUBNET_PAIRS {
        let route = &resources[&format!("PrivateRoute{}", index + 1)]["Properties"];
        assert_eq!(route["DestinationCidrBlock"], "0.0.0.0/0");
        assert_eq!(
            route["InstanceId"]["Ref"],
            serde_json::json!(format!("NATDevice{}", index + 1))
        );
    }
    // the shared public route goes to the internet gateway instead
    let public_route = &resources["PublicRoute"]["Properties"];
    assert_eq!(public_route["GatewayId"]["Ref"], "InternetGateway");
    assert!(public_route.get("InstanceId").is_none());
}
