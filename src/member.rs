//! `Member`: the three shapes a name inside a module can resolve to.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::Type;

/// A single named, typed parameter of a `Func`. Order and name both
/// participate in signature identity: reordering or renaming a parameter
/// is a change even when every type stays the same.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name.
    pub name: String,
    /// Parameter type.
    #[serde(rename = "type")]
    pub ty: Type,
}

impl Param {
    /// Construct a parameter.
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Param {
            name: name.into(),
            ty,
        }
    }
}

/// A function, struct, or enum — the three shapes a name inside a module
/// can resolve to. Tagged by `kind` in the serialized schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Member {
    /// A function signature: ordered, named parameters and a return type.
    Func {
        /// Parameters, in declaration order.
        params: Vec<Param>,
        /// Return type.
        #[serde(rename = "return")]
        ret: Type,
    },
    /// A struct: a name-to-type mapping. Declaration order is retained for
    /// display only — it plays no role in diffing or equality.
    Struct {
        /// Field name to field type, in declaration order.
        fields: IndexMap<String, Type>,
    },
    /// An enum: a name to an optional payload type.
    Enum {
        /// Variant name to optional payload type, in declaration order.
        variants: IndexMap<String, Option<Type>>,
    },
}

impl Member {
    /// A short label for the member's kind, used in diff descriptions and
    /// the "change member kind" classification.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Member::Func { .. } => "Func",
            Member::Struct { .. } => "Struct",
            Member::Enum { .. } => "Enum",
        }
    }

    /// Every absolute `Ref` name this member's types mention, used by
    /// validation and by the resolver's used-member propagation.
    pub fn referenced_names(&self) -> Vec<&str> {
        match self {
            Member::Func { params, ret } => {
                let mut names: Vec<&str> =
                    params.iter().flat_map(|p| p.ty.referenced_names()).collect();
                names.extend(ret.referenced_names());
                names
            }
            Member::Struct { fields } => fields
                .values()
                .flat_map(|t| t.referenced_names())
                .collect(),
            Member::Enum { variants } => variants
                .values()
                .flatten()
                .flat_map(|t| t.referenced_names())
                .collect(),
        }
    }
}
