//! CloudFormation property values and intrinsic functions
//!
//! A [`Value`] is either a plain JSON scalar/list or one of the intrinsic
//! function calls the template uses: `Ref`, `Fn::FindInMap`, `Fn::GetAtt`,
//! `Fn::Join` and `Fn::Select`.

use serde::Serialize;

/// Logical id of the region pseudo-parameter.
pub const AWS_REGION: &str = "AWS::Region";

/// A value in a resource's properties bag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<Value>),
    Ref(RefFn),
    FindInMap(FindInMapFn),
    GetAtt(GetAttFn),
    Join(JoinFn),
    Select(SelectFn),
}

/// `{"Ref": "<logical id>"}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefFn {
    #[serde(rename = "Ref")]
    logical_id: String,
}

/// `{"Fn::FindInMap": [map, key, attribute]}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FindInMapFn {
    #[serde(rename = "Fn::FindInMap")]
    args: (String, Box<Value>, String),
}

/// `{"Fn::GetAtt": [logical id, attribute]}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GetAttFn {
    #[serde(rename = "Fn::GetAtt")]
    args: (String, String),
}

/// `{"Fn::Join": [delimiter, parts]}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinFn {
    #[serde(rename = "Fn::Join")]
    args: (String, Vec<Value>),
}

/// `{"Fn::Select": [index, list]}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectFn {
    #[serde(rename = "Fn::Select")]
    args: (i64, Box<Value>),
}

impl Value {
    /// Reference to a parameter or resource by logical id.
    pub fn reference(logical_id: impl Into<String>) -> Self {
        Value::Ref(RefFn {
            logical_id: logical_id.into(),
        })
    }

    /// Reference to the `AWS::Region` pseudo-parameter.
    pub fn region() -> Self {
        Self::reference(AWS_REGION)
    }

    /// Two-level mapping lookup.
    pub fn find_in_map(
        map: impl Into<String>,
        key: Value,
        attribute: impl Into<String>,
    ) -> Self {
        Value::FindInMap(FindInMapFn {
            args: (map.into(), Box::new(key), attribute.into()),
        })
    }

    /// Attribute of a declared resource.
    pub fn get_att(logical_id: impl Into<String>, attribute: impl Into<String>) -> Self {
        Value::GetAtt(GetAttFn {
            args: (logical_id.into(), attribute.into()),
        })
    }

    /// Concatenate `parts` with `delimiter`.
    pub fn join(delimiter: impl Into<String>, parts: Vec<Value>) -> Self {
        Value::Join(JoinFn {
            args: (delimiter.into(), parts),
        })
    }

    /// Select element `index` from a list value.
    pub fn select(index: i64, list: Value) -> Self {
        Value::Select(SelectFn {
            args: (index, Box::new(list)),
        })
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
