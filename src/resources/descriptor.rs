use chrono::{DateTime, Utc};

use crate::models::mod_version::ModType;

/// Storage value type of a persisted field, used to type filter binds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Int,
    SmallInt,
    Float,
    Text,
    Bool,
    Timestamp,
    /// TEXT column constrained to the [`ModType`] name table
    ModType,
}

/// A filter value converted to its storage type, ready to bind
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Int(i64),
    SmallInt(i16),
    Float(f64),
    Text(String),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

impl ValueType {
    /// Convert a raw filter value into a typed bind
    ///
    /// The error is a short reason phrase; callers wrap it into the
    /// appropriate `ErrorCode`.
    pub fn parse_value(&self, raw: &str) -> Result<BindValue, String> {
        match self {
            ValueType::Int => raw
                .parse::<i64>()
                .map(BindValue::Int)
                .map_err(|_| format!("'{}' is not an integer", raw)),
            ValueType::SmallInt => raw
                .parse::<i16>()
                .map(BindValue::SmallInt)
                .map_err(|_| format!("'{}' is not a small integer", raw)),
            ValueType::Float => raw
                .parse::<f64>()
                .map(BindValue::Float)
                .map_err(|_| format!("'{}' is not a number", raw)),
            ValueType::Text => Ok(BindValue::Text(raw.to_string())),
            ValueType::Bool => match raw {
                "true" => Ok(BindValue::Bool(true)),
                "false" => Ok(BindValue::Bool(false)),
                _ => Err(format!("'{}' is not a boolean", raw)),
            },
            ValueType::Timestamp => DateTime::parse_from_rfc3339(raw)
                .map(|t| BindValue::Timestamp(t.with_timezone(&Utc)))
                .map_err(|_| format!("'{}' is not an RFC 3339 timestamp", raw)),
            ValueType::ModType => ModType::from_name(raw)
                .map(|t| BindValue::Text(t.as_name().to_string()))
                .map_err(|e| e.to_string()),
        }
    }
}

/// Storage kind of a network-exposed field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Read from / written to the backing store verbatim
    Persisted {
        column: &'static str,
        value_type: ValueType,
    },
    /// Derived at read time, never stored and never accepted as input
    Computed,
    /// Ownership/reference link to another resource via a join column
    Relation {
        resource: &'static str,
        join_column: &'static str,
    },
}

/// One field of a resource, as exposed on the network boundary
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// API-facing field name (camelCase)
    pub name: &'static str,
    pub kind: FieldKind,
    /// Whether clients may set this field through mutation verbs
    pub writable: bool,
}

/// Declarative mapping of one entity type to its table and API exposure
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    /// Network-facing resource type name (e.g. "modVersion")
    pub type_name: &'static str,
    /// Backing table or view name
    pub table: &'static str,
    /// Views reject all mutation verbs
    pub read_only: bool,
    pub fields: &'static [FieldDescriptor],
}

impl ResourceDescriptor {
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_values() {
        assert_eq!(ValueType::Int.parse_value("42"), Ok(BindValue::Int(42)));
        assert!(ValueType::Int.parse_value("forty-two").is_err());
    }

    #[test]
    fn test_parse_bool_values() {
        assert_eq!(
            ValueType::Bool.parse_value("true"),
            Ok(BindValue::Bool(true))
        );
        assert!(ValueType::Bool.parse_value("TRUE").is_err());
        assert!(ValueType::Bool.parse_value("1").is_err());
    }

    #[test]
    fn test_parse_timestamp_values() {
        let parsed = ValueType::Timestamp
            .parse_value("2021-06-01T12:00:00Z")
            .unwrap();
        match parsed {
            BindValue::Timestamp(t) => assert_eq!(t.to_rfc3339(), "2021-06-01T12:00:00+00:00"),
            other => panic!("Expected timestamp bind, got {:?}", other),
        }
        assert!(ValueType::Timestamp.parse_value("yesterday").is_err());
    }

    #[test]
    fn test_parse_mod_type_by_name() {
        assert_eq!(
            ValueType::ModType.parse_value("SIM"),
            Ok(BindValue::Text("SIM".to_string()))
        );
        let err = ValueType::ModType.parse_value("sim").unwrap_err();
        assert!(err.contains("not a valid mod type"));
    }
}
