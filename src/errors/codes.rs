use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Error codes for structured API responses
///
/// Closed enumeration of known failure kinds. Each code carries a stable
/// numeric identifier, a short title and a detail message template with
/// positional `{0}`, `{1}`, ... placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Requested entity does not exist
    #[serde(rename = "ENTITY_NOT_FOUND")]
    EntityNotFound,

    /// Input validation failed
    #[serde(rename = "VALIDATION_FAILED")]
    ValidationFailed,

    /// Mutation attempted against a read-only projected resource
    #[serde(rename = "RESOURCE_READ_ONLY")]
    ResourceReadOnly,

    /// Write attempted against a computed attribute
    #[serde(rename = "COMPUTED_ATTRIBUTE_WRITE")]
    ComputedAttributeWrite,

    /// Payload referenced an attribute the resource does not have
    #[serde(rename = "UNKNOWN_ATTRIBUTE")]
    UnknownAttribute,

    /// Write attempted against a persisted but immutable attribute
    #[serde(rename = "ATTRIBUTE_NOT_WRITABLE")]
    AttributeNotWritable,

    /// Filter expression could not be parsed or resolved
    #[serde(rename = "INVALID_FILTER")]
    InvalidFilter,

    /// Sort field is unknown or not sortable
    #[serde(rename = "INVALID_SORT_FIELD")]
    InvalidSortField,

    /// Symbolic enumeration name not recognized
    #[serde(rename = "INVALID_ENUM_VALUE")]
    InvalidEnumValue,

    /// Database connection or query error
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError,

    /// Internal server error
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EntityNotFound => write!(f, "ENTITY_NOT_FOUND"),
            Self::ValidationFailed => write!(f, "VALIDATION_FAILED"),
            Self::ResourceReadOnly => write!(f, "RESOURCE_READ_ONLY"),
            Self::ComputedAttributeWrite => write!(f, "COMPUTED_ATTRIBUTE_WRITE"),
            Self::UnknownAttribute => write!(f, "UNKNOWN_ATTRIBUTE"),
            Self::AttributeNotWritable => write!(f, "ATTRIBUTE_NOT_WRITABLE"),
            Self::InvalidFilter => write!(f, "INVALID_FILTER"),
            Self::InvalidSortField => write!(f, "INVALID_SORT_FIELD"),
            Self::InvalidEnumValue => write!(f, "INVALID_ENUM_VALUE"),
            Self::DatabaseError => write!(f, "DATABASE_ERROR"),
            Self::InternalError => write!(f, "INTERNAL_ERROR"),
        }
    }
}

impl ErrorCode {
    /// Stable numeric identifier exposed alongside the symbolic code
    pub fn numeric_code(&self) -> u16 {
        match self {
            Self::EntityNotFound => 100,
            Self::ValidationFailed => 101,
            Self::ResourceReadOnly => 102,
            Self::ComputedAttributeWrite => 103,
            Self::UnknownAttribute => 104,
            Self::AttributeNotWritable => 105,
            Self::InvalidFilter => 106,
            Self::InvalidSortField => 107,
            Self::InvalidEnumValue => 108,
            Self::DatabaseError => 109,
            Self::InternalError => 110,
        }
    }

    /// Short human-readable title
    pub fn title(&self) -> &'static str {
        match self {
            Self::EntityNotFound => "Entity not found",
            Self::ValidationFailed => "Validation failed",
            Self::ResourceReadOnly => "Resource is read-only",
            Self::ComputedAttributeWrite => "Computed attribute is not writable",
            Self::UnknownAttribute => "Unknown attribute",
            Self::AttributeNotWritable => "Attribute is not writable",
            Self::InvalidFilter => "Invalid filter expression",
            Self::InvalidSortField => "Invalid sort field",
            Self::InvalidEnumValue => "Invalid enumeration value",
            Self::DatabaseError => "Database error",
            Self::InternalError => "Internal server error",
        }
    }

    /// Detail message template with positional placeholders
    pub fn detail(&self) -> &'static str {
        match self {
            Self::EntityNotFound => "Entity of type {0} with identifier {1} could not be found",
            Self::ValidationFailed => "{0}",
            Self::ResourceReadOnly => {
                "Resource type {0} is a read-only projection and does not permit create, update or delete operations"
            }
            Self::ComputedAttributeWrite => {
                "Attribute {1} of resource {0} is computed at read time and cannot be written"
            }
            Self::UnknownAttribute => "Resource {0} has no attribute named {1}",
            Self::AttributeNotWritable => {
                "Attribute {1} of resource {0} cannot be modified through the API"
            }
            Self::InvalidFilter => "Filter expression '{0}' is invalid: {1}",
            Self::InvalidSortField => "Resource {0} cannot be sorted by {1}",
            Self::InvalidEnumValue => "'{0}' is not a valid value for {1}",
            Self::DatabaseError => "{0}",
            Self::InternalError => "{0}",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::EntityNotFound => 404,
            Self::ValidationFailed => 400,
            Self::ResourceReadOnly => 403,
            Self::ComputedAttributeWrite => 400,
            Self::UnknownAttribute => 400,
            Self::AttributeNotWritable => 400,
            Self::InvalidFilter => 400,
            Self::InvalidSortField => 400,
            Self::InvalidEnumValue => 400,
            Self::DatabaseError => 503,
            Self::InternalError => 500,
        }
    }
}
