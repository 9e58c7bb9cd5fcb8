//! CloudFormation template document model
//!
//! The template is an explicit value threaded through construction: every
//! `add_*` operation returns a [`Handle`] that later steps use to build
//! `Ref` and `Fn::GetAtt` values, so cross-references never reconstruct
//! logical-id strings by hand.
//!
//! Entities are added once and never mutated; the lifecycle is build,
//! serialize, discard. Duplicate logical ids are programmer errors and
//! panic at the `add_*` call site.

pub mod ec2;
pub mod value;

pub use value::Value;

use crate::RegionImages;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Handle to an entity already added to the template.
///
/// Cheap to clone. Holding a handle is proof the entity exists, which rules
/// out dangling references at the type level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handle {
    logical_id: Arc<str>,
}

impl Handle {
    fn new(logical_id: &str) -> Self {
        Self {
            logical_id: Arc::from(logical_id),
        }
    }

    /// The entity's logical id.
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// A `Ref` to this entity.
    pub fn reference(&self) -> Value {
        Value::reference(self.logical_id())
    }

    /// A `Fn::GetAtt` on this entity.
    pub fn get_att(&self, attribute: &str) -> Value {
        Value::get_att(self.logical_id(), attribute)
    }
}

/// Typed properties bag for a CloudFormation resource.
pub trait ResourceProperties: Serialize {
    /// CloudFormation resource type, e.g. `AWS::EC2::VPC`.
    const TYPE: &'static str;
}

/// A template parameter declaration.
#[derive(Debug, Clone, Serialize)]
pub struct Parameter {
    #[serde(rename = "Type")]
    kind: &'static str,
    #[serde(rename = "Default", skip_serializing_if = "Option::is_none")]
    default: Option<String>,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "AllowedValues", skip_serializing_if = "Option::is_none")]
    allowed_values: Option<Vec<String>>,
    #[serde(rename = "ConstraintDescription", skip_serializing_if = "Option::is_none")]
    constraint_description: Option<String>,
}

impl Parameter {
    /// A `String`-typed parameter.
    pub fn string() -> Self {
        Self::of_type("String")
    }

    /// A `CommaDelimitedList`-typed parameter.
    pub fn comma_delimited_list() -> Self {
        Self::of_type("CommaDelimitedList")
    }

    fn of_type(kind: &'static str) -> Self {
        Self {
            kind,
            default: None,
            description: None,
            allowed_values: None,
            constraint_description: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_allowed_values(mut self, values: &[&str]) -> Self {
        self.allowed_values = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn with_constraint_description(mut self, description: impl Into<String>) -> Self {
        self.constraint_description = Some(description.into());
        self
    }
}

/// A declared resource: type tag, properties bag, optional dependency.
#[derive(Debug, Clone, Serialize)]
struct Resource {
    #[serde(rename = "Type")]
    kind: &'static str,
    #[serde(rename = "Properties")]
    properties: serde_json::Value,
    #[serde(rename = "DependsOn", skip_serializing_if = "Option::is_none")]
    depends_on: Option<String>,
}

/// A computed output value exposed by the template.
#[derive(Debug, Clone, Serialize)]
pub struct Output {
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "Value")]
    value: Value,
}

impl Output {
    pub fn new(description: impl Into<String>, value: Value) -> Self {
        Self {
            description: description.into(),
            value,
        }
    }
}

/// The whole template document.
///
/// Every section is a `BTreeMap`, so serialization is byte-deterministic
/// for a given set of entities.
#[derive(Debug, Clone, Serialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    format_version: &'static str,
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "Parameters")]
    parameters: BTreeMap<String, Parameter>,
    #[serde(rename = "Mappings")]
    mappings: BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>>,
    #[serde(rename = "Resources")]
    resources: BTreeMap<String, Resource>,
    #[serde(rename = "Outputs")]
    outputs: BTreeMap<String, Output>,
}

impl Template {
    /// An empty template with the standard format version.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            format_version: "2010-09-09",
            description: description.into(),
            parameters: BTreeMap::new(),
            mappings: BTreeMap::new(),
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Declare a parameter. Panics on a duplicate logical id.
    pub fn add_parameter(&mut self, logical_id: &str, parameter: Parameter) -> Handle {
        assert!(
            !self.parameters.contains_key(logical_id),
            "duplicate logical id: {logical_id}"
        );
        self.parameters.insert(logical_id.to_string(), parameter);
        Handle::new(logical_id)
    }

    /// Declare a region → `{"AMI": id}` mapping table.
    pub fn add_mapping(&mut self, name: &str, images: &RegionImages) {
        assert!(
            !self.mappings.contains_key(name),
            "duplicate mapping name: {name}"
        );
        let table = images
            .iter()
            .map(|(region, ami)| {
                let mut entry = BTreeMap::new();
                entry.insert("AMI".to_string(), ami.clone());
                (region.clone(), entry)
            })
            .collect();
        self.mappings.insert(name.to_string(), table);
    }

    /// Declare a resource. Panics on a duplicate logical id.
    pub fn add_resource<P: ResourceProperties>(
        &mut self,
        logical_id: &str,
        properties: P,
    ) -> Handle {
        self.insert_resource(logical_id, properties, None)
    }

    /// Declare a resource with an explicit `DependsOn` another entity.
    pub fn add_resource_depending_on<P: ResourceProperties>(
        &mut self,
        logical_id: &str,
        properties: P,
        depends_on: &Handle,
    ) -> Handle {
        self.insert_resource(logical_id, properties, Some(depends_on.logical_id().to_string()))
    }

    fn insert_resource<P: ResourceProperties>(
        &mut self,
        logical_id: &str,
        properties: P,
        depends_on: Option<String>,
    ) -> Handle {
        assert!(
            !self.resources.contains_key(logical_id),
            "duplicate logical id: {logical_id}"
        );
        let properties = serde_json::to_value(&properties)
            .unwrap_or_else(|e| panic!("properties of {logical_id} failed to serialize: {e}"));
        self.resources.insert(
            logical_id.to_string(),
            Resource {
                kind: P::TYPE,
                properties,
                depends_on,
            },
        );
        Handle::new(logical_id)
    }

    /// Expose a computed output value.
    pub fn add_output(&mut self, name: &str, output: Output) {
        assert!(
            !self.outputs.contains_key(name),
            "duplicate output name: {name}"
        );
        self.outputs.insert(name.to_string(), output);
    }

    /// Serialize the document to pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
