// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use lazy_static::lazy_static;
use monostate::MustBe;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::SchemaError;

/// The field name of list elements.
pub const LIST_ELEMENT_NAME: &str = "element";
/// The field name of map keys.
pub const MAP_KEY_NAME: &str = "key";
/// The field name of map values.
pub const MAP_VALUE_NAME: &str = "value";

/// The largest precision of a decimal that fits in 128 bits.
pub const MAX_DECIMAL_PRECISION: u32 = 38;

fn create_regex(regex: Result<regex::Regex, regex::Error>) -> regex::Regex {
    #[allow(clippy::unwrap_used)]
    regex.unwrap()
}

lazy_static! {
    static ref DECIMAL_TYPE: regex::Regex =
        create_regex(regex::Regex::new(r"^decimal\(\s*(\d+)\s*,\s*(\d+)\s*\)$"));
    static ref FIXED_TYPE: regex::Regex =
        create_regex(regex::Regex::new(r"^fixed\[\s*(\d+)\s*\]$"));
}

/// Primitive (scalar) types.
#[derive(Debug, PartialEq, Eq, Clone, Hash)]
pub enum PrimitiveType {
    /// True or false
    Boolean,
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    /// 32-bit IEEE 754 floating point
    Float,
    /// 64-bit IEEE 754 floating point
    Double,
    /// Fixed point decimal
    Decimal { precision: u32, scale: u32 },
    /// Calendar date without timezone or time
    Date,
    /// Time of day in microsecond precision, without date or timezone
    Time,
    /// Timestamp in microsecond precision, without timezone
    Timestamp,
    /// Timestamp in microsecond precision, with timezone
    Timestamptz,
    /// Arbitrary-length character sequence encoded in UTF-8
    String,
    /// Universally Unique Identifiers
    Uuid,
    /// Fixed length byte array
    Fixed(u64),
    /// Arbitrary-length byte array
    Binary,
}

impl PrimitiveType {
    /// Whether the type is one of the floating point types.
    pub fn is_floating_point(&self) -> bool {
        matches!(self, PrimitiveType::Float | PrimitiveType::Double)
    }

    /// Whether the type is a date or timestamp type.
    pub fn is_date_or_timestamp(&self) -> bool {
        matches!(
            self,
            PrimitiveType::Date | PrimitiveType::Timestamp | PrimitiveType::Timestamptz
        )
    }
}

impl Display for PrimitiveType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PrimitiveType::Boolean => write!(f, "boolean"),
            PrimitiveType::Int => write!(f, "int"),
            PrimitiveType::Long => write!(f, "long"),
            PrimitiveType::Float => write!(f, "float"),
            PrimitiveType::Double => write!(f, "double"),
            PrimitiveType::Decimal { precision, scale } => {
                write!(f, "decimal({precision}, {scale})")
            }
            PrimitiveType::Date => write!(f, "date"),
            PrimitiveType::Time => write!(f, "time"),
            PrimitiveType::Timestamp => write!(f, "timestamp"),
            PrimitiveType::Timestamptz => write!(f, "timestamptz"),
            PrimitiveType::String => write!(f, "string"),
            PrimitiveType::Uuid => write!(f, "uuid"),
            PrimitiveType::Fixed(length) => write!(f, "fixed[{length}]"),
            PrimitiveType::Binary => write!(f, "binary"),
        }
    }
}

impl FromStr for PrimitiveType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "boolean" => Ok(PrimitiveType::Boolean),
            "int" => Ok(PrimitiveType::Int),
            "long" => Ok(PrimitiveType::Long),
            "float" => Ok(PrimitiveType::Float),
            "double" => Ok(PrimitiveType::Double),
            "date" => Ok(PrimitiveType::Date),
            "time" => Ok(PrimitiveType::Time),
            "timestamp" => Ok(PrimitiveType::Timestamp),
            "timestamptz" => Ok(PrimitiveType::Timestamptz),
            "string" => Ok(PrimitiveType::String),
            "uuid" => Ok(PrimitiveType::Uuid),
            "binary" => Ok(PrimitiveType::Binary),
            other => {
                if let Some(caps) = DECIMAL_TYPE.captures(other) {
                    let precision: u32 = caps[1]
                        .parse()
                        .map_err(|_| SchemaError::invalid_type(s))?;
                    let scale: u32 = caps[2]
                        .parse()
                        .map_err(|_| SchemaError::invalid_type(s))?;
                    if precision == 0 || precision > MAX_DECIMAL_PRECISION || scale > precision {
                        return Err(SchemaError::invalid_type(format!(
                            "{s}: precision must be in 1..={MAX_DECIMAL_PRECISION} \
                             and scale must not exceed precision"
                        )));
                    }
                    Ok(PrimitiveType::Decimal { precision, scale })
                } else if let Some(caps) = FIXED_TYPE.captures(other) {
                    let length: u64 = caps[1]
                        .parse()
                        .map_err(|_| SchemaError::invalid_type(s))?;
                    Ok(PrimitiveType::Fixed(length))
                } else {
                    Err(SchemaError::invalid_type(s))
                }
            }
        }
    }
}

impl Serialize for PrimitiveType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PrimitiveType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        PrimitiveType::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Reference to [`NestedField`].
pub type NestedFieldRef = Arc<NestedField>;

/// A named, identified field of a struct, list or map.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct NestedField {
    pub id: i32,
    pub name: String,
    pub required: bool,
    #[serde(rename = "type")]
    pub field_type: Box<Type>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl NestedField {
    pub fn new(id: i32, name: impl ToString, field_type: Type, required: bool) -> Self {
        Self {
            id,
            name: name.to_string(),
            required,
            field_type: Box::new(field_type),
            doc: None,
        }
    }

    /// Create a required field.
    pub fn required(id: i32, name: impl ToString, field_type: Type) -> Self {
        Self::new(id, name, field_type, true)
    }

    /// Create an optional field.
    pub fn optional(id: i32, name: impl ToString, field_type: Type) -> Self {
        Self::new(id, name, field_type, false)
    }

    pub fn with_doc(mut self, doc: impl ToString) -> Self {
        self.doc = Some(doc.to_string());
        self
    }
}

impl Display for NestedField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let requirement = if self.required {
            "required"
        } else {
            "optional"
        };
        write!(
            f,
            "{}: {}: {requirement} {}",
            self.id, self.name, self.field_type
        )?;
        if let Some(doc) = &self.doc {
            write!(f, " ({doc})")?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct StructType {
    fields: Vec<NestedFieldRef>,
}

impl StructType {
    pub fn new(fields: Vec<NestedFieldRef>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[NestedFieldRef] {
        &self.fields
    }
}

impl Display for StructType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "struct<")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{field}")?;
        }
        write!(f, ">")
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ListType {
    pub element_field: NestedFieldRef,
}

impl ListType {
    pub fn new(element_id: i32, element_type: Type, element_required: bool) -> Self {
        Self {
            element_field: Arc::new(NestedField::new(
                element_id,
                LIST_ELEMENT_NAME,
                element_type,
                element_required,
            )),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct MapType {
    pub key_field: NestedFieldRef,
    pub value_field: NestedFieldRef,
}

impl MapType {
    pub fn new(
        key_id: i32,
        key_type: Type,
        value_id: i32,
        value_type: Type,
        value_required: bool,
    ) -> Self {
        Self {
            key_field: Arc::new(NestedField::required(key_id, MAP_KEY_NAME, key_type)),
            value_field: Arc::new(NestedField::new(
                value_id,
                MAP_VALUE_NAME,
                value_type,
                value_required,
            )),
        }
    }
}

/// All data types, either primitive or nested.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(from = "SerdeType", into = "SerdeType")]
pub enum Type {
    Primitive(PrimitiveType),
    Struct(StructType),
    List(ListType),
    Map(MapType),
}

impl Type {
    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    pub fn as_primitive(&self) -> Option<&PrimitiveType> {
        match self {
            Type::Primitive(p) => Some(p),
            _ => None,
        }
    }
}

impl From<PrimitiveType> for Type {
    fn from(value: PrimitiveType) -> Self {
        Type::Primitive(value)
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Primitive(p) => write!(f, "{p}"),
            Type::Struct(s) => write!(f, "{s}"),
            Type::List(l) => write!(f, "list<{}>", l.element_field.field_type),
            Type::Map(m) => write!(
                f,
                "map<{}, {}>",
                m.key_field.field_type, m.value_field.field_type
            ),
        }
    }
}

/// The JSON representation of a type in table metadata.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SerdeType {
    Primitive(PrimitiveType),
    Struct {
        r#type: MustBe!("struct"),
        fields: Vec<NestedFieldRef>,
    },
    #[serde(rename_all = "kebab-case")]
    List {
        r#type: MustBe!("list"),
        element_id: i32,
        element_required: bool,
        element: Box<Type>,
    },
    #[serde(rename_all = "kebab-case")]
    Map {
        r#type: MustBe!("map"),
        key_id: i32,
        key: Box<Type>,
        value_id: i32,
        value_required: bool,
        value: Box<Type>,
    },
}

impl From<SerdeType> for Type {
    fn from(value: SerdeType) -> Self {
        match value {
            SerdeType::Primitive(p) => Type::Primitive(p),
            SerdeType::Struct { fields, .. } => Type::Struct(StructType::new(fields)),
            SerdeType::List {
                element_id,
                element_required,
                element,
                ..
            } => Type::List(ListType::new(element_id, *element, element_required)),
            SerdeType::Map {
                key_id,
                key,
                value_id,
                value_required,
                value,
                ..
            } => Type::Map(MapType::new(key_id, *key, value_id, *value, value_required)),
        }
    }
}

impl From<Type> for SerdeType {
    fn from(value: Type) -> Self {
        match value {
            Type::Primitive(p) => SerdeType::Primitive(p),
            Type::Struct(s) => SerdeType::Struct {
                r#type: Default::default(),
                fields: s.fields,
            },
            Type::List(l) => SerdeType::List {
                r#type: Default::default(),
                element_id: l.element_field.id,
                element_required: l.element_field.required,
                element: l.element_field.field_type.clone(),
            },
            Type::Map(m) => SerdeType::Map {
                r#type: Default::default(),
                key_id: m.key_field.id,
                key: m.key_field.field_type.clone(),
                value_id: m.value_field.id,
                value_required: m.value_field.required,
                value: m.value_field.field_type.clone(),
            },
        }
    }
}
