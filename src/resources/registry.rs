use std::collections::HashMap;

use serde_json::{Map, Value};

use super::descriptor::{
    BindValue, FieldDescriptor, FieldKind, ResourceDescriptor, ValueType,
};
use crate::errors::{Error, ErrorCode};
use crate::query::{FilterTerm, Operator, SortSpec};

pub const MOD_VERSION: &str = "modVersion";
pub const GLOBAL_RATING: &str = "globalRating";

/// A resolved filter term: storage column, operator, typed bind
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: &'static str,
    pub operator: Operator,
    pub value: BindValue,
}

/// A resolved sort request
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: &'static str,
    pub descending: bool,
}

static MOD_VERSION_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        name: "id",
        kind: FieldKind::Persisted {
            column: "id",
            value_type: ValueType::Int,
        },
        writable: false,
    },
    FieldDescriptor {
        name: "uid",
        kind: FieldKind::Persisted {
            column: "uid",
            value_type: ValueType::Text,
        },
        writable: false,
    },
    FieldDescriptor {
        name: "type",
        kind: FieldKind::Persisted {
            column: "type",
            value_type: ValueType::ModType,
        },
        writable: false,
    },
    FieldDescriptor {
        name: "description",
        kind: FieldKind::Persisted {
            column: "description",
            value_type: ValueType::Text,
        },
        writable: true,
    },
    FieldDescriptor {
        name: "version",
        kind: FieldKind::Persisted {
            column: "version",
            value_type: ValueType::SmallInt,
        },
        writable: false,
    },
    FieldDescriptor {
        name: "filename",
        kind: FieldKind::Persisted {
            column: "filename",
            value_type: ValueType::Text,
        },
        writable: false,
    },
    FieldDescriptor {
        name: "icon",
        kind: FieldKind::Persisted {
            column: "icon",
            value_type: ValueType::Text,
        },
        writable: false,
    },
    FieldDescriptor {
        name: "ranked",
        kind: FieldKind::Persisted {
            column: "ranked",
            value_type: ValueType::Bool,
        },
        writable: true,
    },
    FieldDescriptor {
        name: "hidden",
        kind: FieldKind::Persisted {
            column: "hidden",
            value_type: ValueType::Bool,
        },
        writable: true,
    },
    FieldDescriptor {
        name: "createTime",
        kind: FieldKind::Persisted {
            column: "create_time",
            value_type: ValueType::Timestamp,
        },
        writable: false,
    },
    FieldDescriptor {
        name: "updateTime",
        kind: FieldKind::Persisted {
            column: "update_time",
            value_type: ValueType::Timestamp,
        },
        writable: false,
    },
    FieldDescriptor {
        name: "mod",
        kind: FieldKind::Relation {
            resource: "mod",
            join_column: "mod_id",
        },
        writable: false,
    },
    FieldDescriptor {
        name: "thumbnailUrl",
        kind: FieldKind::Computed,
        writable: false,
    },
    FieldDescriptor {
        name: "downloadUrl",
        kind: FieldKind::Computed,
        writable: false,
    },
];

static GLOBAL_RATING_FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        name: "id",
        kind: FieldKind::Persisted {
            column: "id",
            value_type: ValueType::Int,
        },
        writable: false,
    },
    FieldDescriptor {
        name: "mean",
        kind: FieldKind::Persisted {
            column: "mean",
            value_type: ValueType::Float,
        },
        writable: false,
    },
    FieldDescriptor {
        name: "deviation",
        kind: FieldKind::Persisted {
            column: "deviation",
            value_type: ValueType::Float,
        },
        writable: false,
    },
    FieldDescriptor {
        name: "rating",
        kind: FieldKind::Persisted {
            column: "rating",
            value_type: ValueType::Float,
        },
        writable: false,
    },
    FieldDescriptor {
        name: "numGames",
        kind: FieldKind::Persisted {
            column: "num_games",
            value_type: ValueType::Int,
        },
        writable: false,
    },
    FieldDescriptor {
        name: "wonGames",
        kind: FieldKind::Persisted {
            column: "won_games",
            value_type: ValueType::Int,
        },
        writable: false,
    },
    FieldDescriptor {
        name: "isActive",
        kind: FieldKind::Persisted {
            column: "is_active",
            value_type: ValueType::Bool,
        },
        writable: false,
    },
    FieldDescriptor {
        name: "ranking",
        kind: FieldKind::Persisted {
            column: "ranking",
            value_type: ValueType::Int,
        },
        writable: false,
    },
];

/// Explicit registry mapping resource type names to their descriptors
///
/// Built once at process start and shared through app state; replaces
/// reflection-driven exposure with a lookup table.
pub struct ResourceRegistry {
    resources: HashMap<&'static str, ResourceDescriptor>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        let mut resources = HashMap::new();

        resources.insert(
            MOD_VERSION,
            ResourceDescriptor {
                type_name: MOD_VERSION,
                table: "mod_version",
                read_only: false,
                fields: MOD_VERSION_FIELDS,
            },
        );
        resources.insert(
            GLOBAL_RATING,
            ResourceDescriptor {
                type_name: GLOBAL_RATING,
                table: "global_rating_rank_view",
                read_only: true,
                fields: GLOBAL_RATING_FIELDS,
            },
        );

        Self { resources }
    }

    pub fn descriptor(&self, type_name: &str) -> Option<&ResourceDescriptor> {
        self.resources.get(type_name)
    }

    fn require(&self, type_name: &str) -> Result<&ResourceDescriptor, Error> {
        self.descriptor(type_name).ok_or_else(|| {
            Error::new(ErrorCode::InternalError)
                .with_arg(format!("resource type '{}' is not registered", type_name))
        })
    }

    /// Validate a mutation payload before anything reaches storage
    ///
    /// Rejects, in order: mutations of read-only projections, unknown
    /// fields, writes to computed attributes, writes to relation links and
    /// writes to immutable persisted attributes.
    pub fn validate_write(
        &self,
        type_name: &str,
        payload: &Map<String, Value>,
    ) -> Result<(), Error> {
        let descriptor = self.require(type_name)?;

        if descriptor.read_only {
            return Err(Error::new(ErrorCode::ResourceReadOnly).with_arg(type_name));
        }

        for field_name in payload.keys() {
            let field = descriptor.field(field_name).ok_or_else(|| {
                Error::new(ErrorCode::UnknownAttribute)
                    .with_arg(type_name)
                    .with_arg(field_name.as_str())
            })?;

            match field.kind {
                FieldKind::Computed => {
                    return Err(Error::new(ErrorCode::ComputedAttributeWrite)
                        .with_arg(type_name)
                        .with_arg(field_name.as_str()));
                }
                FieldKind::Relation { .. } => {
                    return Err(Error::new(ErrorCode::AttributeNotWritable)
                        .with_arg(type_name)
                        .with_arg(field_name.as_str()));
                }
                FieldKind::Persisted { .. } if !field.writable => {
                    return Err(Error::new(ErrorCode::AttributeNotWritable)
                        .with_arg(type_name)
                        .with_arg(field_name.as_str()));
                }
                FieldKind::Persisted { .. } => {}
            }
        }

        Ok(())
    }

    /// Explicitly reject a mutation verb against a read-only projection
    pub fn reject_read_only(&self, type_name: &str) -> Error {
        Error::new(ErrorCode::ResourceReadOnly).with_arg(type_name)
    }

    /// Resolve parsed filter terms to storage predicates
    ///
    /// Relation fields may be addressed as `mod` or `mod.id`, both of
    /// which resolve to the join column. Computed fields never resolve.
    pub fn resolve_filters(
        &self,
        type_name: &str,
        terms: &[FilterTerm],
    ) -> Result<Vec<Predicate>, Error> {
        let descriptor = self.require(type_name)?;
        let mut predicates = Vec::with_capacity(terms.len());

        for term in terms {
            let (column, value_type) = self.resolve_field(descriptor, &term.field)?;

            let value = value_type.parse_value(&term.value).map_err(|reason| {
                if value_type == ValueType::ModType {
                    Error::new(ErrorCode::InvalidEnumValue)
                        .with_arg(term.value.as_str())
                        .with_arg(term.field.as_str())
                } else {
                    Error::new(ErrorCode::InvalidFilter)
                        .with_arg(format!("{}{}{}", term.field, term.operator, term.value))
                        .with_arg(reason)
                }
            })?;

            predicates.push(Predicate {
                column,
                operator: term.operator,
                value,
            });
        }

        Ok(predicates)
    }

    /// Resolve a sort request; only persisted fields are sortable
    pub fn resolve_sort(&self, type_name: &str, sort: &SortSpec) -> Result<OrderBy, Error> {
        let descriptor = self.require(type_name)?;

        match descriptor.field(&sort.field).map(|f| f.kind) {
            Some(FieldKind::Persisted { column, .. }) => Ok(OrderBy {
                column,
                descending: sort.descending,
            }),
            _ => Err(Error::new(ErrorCode::InvalidSortField)
                .with_arg(type_name)
                .with_arg(sort.field.as_str())),
        }
    }

    /// Validate an include path; only relation fields are includable
    pub fn resolve_include(
        &self,
        type_name: &str,
        include: &str,
    ) -> Result<&'static str, Error> {
        let descriptor = self.require(type_name)?;

        match descriptor.field(include).map(|f| f.kind) {
            Some(FieldKind::Relation { resource, .. }) => Ok(resource),
            _ => Err(Error::new(ErrorCode::ValidationFailed).with_arg(format!(
                "'{}' is not an includable relation of resource {}",
                include, type_name
            ))),
        }
    }

    fn resolve_field(
        &self,
        descriptor: &ResourceDescriptor,
        field_name: &str,
    ) -> Result<(&'static str, ValueType), Error> {
        // One-hop relation traversal: "mod" and "mod.id" hit the join column
        let (base, remainder) = match field_name.split_once('.') {
            Some((base, rest)) => (base, Some(rest)),
            None => (field_name, None),
        };

        let field = descriptor.field(base).ok_or_else(|| {
            Error::new(ErrorCode::InvalidFilter)
                .with_arg(field_name)
                .with_arg(format!(
                    "resource {} has no attribute named {}",
                    descriptor.type_name, base
                ))
        })?;

        match field.kind {
            FieldKind::Persisted { column, value_type } => match remainder {
                None => Ok((column, value_type)),
                Some(_) => Err(Error::new(ErrorCode::InvalidFilter)
                    .with_arg(field_name)
                    .with_arg(format!("attribute {} has no nested fields", base))),
            },
            FieldKind::Relation { join_column, .. } => match remainder {
                None | Some("id") => Ok((join_column, ValueType::Int)),
                Some(other) => Err(Error::new(ErrorCode::InvalidFilter)
                    .with_arg(field_name)
                    .with_arg(format!(
                        "relation {} can only be filtered by id, not {}",
                        base, other
                    ))),
            },
            FieldKind::Computed => Err(Error::new(ErrorCode::InvalidFilter)
                .with_arg(field_name)
                .with_arg("computed attributes cannot be filtered")),
        }
    }
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
