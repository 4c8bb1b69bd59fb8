//! Structural validation of raw JSON payloads.
//!
//! A [`Schema`] names the properties an object must carry and their primitive types.
//! Every declared property is required and no other property is allowed.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    /// A JSON integer. Numbers written with a fraction, even `264.0`, do not match.
    Integer,
}

impl FieldType {
    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
        }
    }

    /// Integers are stored as 32-bit columns.
    fn in_range(&self, value: &Value) -> bool {
        match self {
            FieldType::String => true,
            FieldType::Integer => value
                .as_i64()
                .is_some_and(|value| i32::try_from(value).is_ok()),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => f.write_str("string"),
            FieldType::Integer => f.write_str("integer"),
        }
    }
}

#[derive(Debug)]
pub struct Field {
    pub name: &'static str,
    pub field_type: FieldType,
}

impl Field {
    const fn string(name: &'static str) -> Self {
        Field {
            name,
            field_type: FieldType::String,
        }
    }

    const fn integer(name: &'static str) -> Self {
        Field {
            name,
            field_type: FieldType::Integer,
        }
    }
}

#[derive(Debug)]
pub struct Schema {
    pub name: &'static str,
    pub fields: &'static [Field],
}

/// Payload of `POST /books`.
pub static BOOK_CREATE: Schema = Schema {
    name: "bookCreate",
    fields: &[
        Field::string("isbn"),
        Field::string("amazon_url"),
        Field::string("author"),
        Field::string("language"),
        Field::integer("pages"),
        Field::string("publisher"),
        Field::string("title"),
        Field::integer("year"),
    ],
};

/// Payload of `PUT /books/:isbn`. Same as [`BOOK_CREATE`] without the isbn.
pub static BOOK_UPDATE: Schema = Schema {
    name: "bookUpdate",
    fields: &[
        Field::string("amazon_url"),
        Field::string("author"),
        Field::string("language"),
        Field::integer("pages"),
        Field::string("publisher"),
        Field::string("title"),
        Field::integer("year"),
    ],
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("instance is not of type object")]
    NotAnObject,
    #[error("missing required property {0}")]
    MissingProperty(&'static str),
    #[error("{property} is not of type {expected}")]
    WrongType {
        property: &'static str,
        expected: FieldType,
    },
    #[error("{0} is out of the 32-bit integer range")]
    OutOfRange(&'static str),
    #[error("additional property {0} is not allowed")]
    AdditionalProperty(String),
}

/// Non-empty, ordered list of violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("payload does not match schema `{schema}`")]
pub struct Violations {
    pub schema: &'static str,
    pub violations: Vec<Violation>,
}

impl Violations {
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }
}

impl Schema {
    /// Checks `payload` against the schema.
    pub fn validate(&self, payload: &Value) -> Result<(), Violations> {
        let violations = self.violations(payload);

        if violations.is_empty() {
            return Ok(());
        }

        Err(Violations {
            schema: self.name,
            violations,
        })
    }

    fn violations(&self, payload: &Value) -> Vec<Violation> {
        let Some(object) = payload.as_object() else {
            return vec![Violation::NotAnObject];
        };

        let mut violations = Vec::new();

        for field in self.fields {
            match object.get(field.name) {
                None => violations.push(Violation::MissingProperty(field.name)),
                Some(value) if !field.field_type.matches(value) => {
                    violations.push(Violation::WrongType {
                        property: field.name,
                        expected: field.field_type,
                    })
                }
                Some(value) if !field.field_type.in_range(value) => {
                    violations.push(Violation::OutOfRange(field.name))
                }
                Some(_) => {}
            }
        }

        let mut additional: Vec<&String> = object
            .keys()
            .filter(|key| !self.fields.iter().any(|field| field.name == key.as_str()))
            .collect();
        additional.sort();

        violations.extend(
            additional
                .into_iter()
                .map(|key| Violation::AdditionalProperty(key.clone())),
        );

        violations
    }
}
