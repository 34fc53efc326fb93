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

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{SchemaError, SchemaResult};
use crate::spec::types::{NestedField, NestedFieldRef, Type};

/// Type alias for schema id.
pub type SchemaId = i32;
/// Default schema id.
pub const DEFAULT_SCHEMA_ID: SchemaId = 0;

/// The column layout of a table.
///
/// Lookups by name only consider top-level fields, while lookups by id
/// also reach fields nested in structs, lists and maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SchemaData", into = "SchemaData")]
pub struct Schema {
    schema_id: SchemaId,
    fields: Vec<NestedFieldRef>,
    highest_field_id: i32,
    id_to_field: HashMap<i32, NestedFieldRef>,
    name_to_id: HashMap<String, i32>,
    lowercase_name_to_id: HashMap<String, i32>,
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.schema_id == other.schema_id && self.fields == other.fields
    }
}

impl Eq for Schema {}

#[derive(Serialize, Deserialize)]
struct SchemaData {
    #[serde(rename = "type")]
    schema_type: monostate::MustBe!("struct"),
    #[serde(rename = "schema-id", default)]
    schema_id: SchemaId,
    fields: Vec<NestedFieldRef>,
}

impl TryFrom<SchemaData> for Schema {
    type Error = SchemaError;

    fn try_from(data: SchemaData) -> Result<Self, Self::Error> {
        Schema::builder()
            .with_schema_id(data.schema_id)
            .with_fields(data.fields)
            .build()
    }
}

impl From<Schema> for SchemaData {
    fn from(schema: Schema) -> Self {
        SchemaData {
            schema_type: Default::default(),
            schema_id: schema.schema_id,
            fields: schema.fields,
        }
    }
}

/// Schema builder.
#[derive(Debug)]
pub struct SchemaBuilder {
    schema_id: SchemaId,
    fields: Vec<NestedFieldRef>,
}

impl SchemaBuilder {
    /// Add fields to schema builder.
    pub fn with_fields(mut self, fields: impl IntoIterator<Item = NestedFieldRef>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Add a single field to schema builder.
    pub fn with_field(mut self, field: NestedField) -> Self {
        self.fields.push(Arc::new(field));
        self
    }

    /// Set schema id.
    pub fn with_schema_id(mut self, schema_id: SchemaId) -> Self {
        self.schema_id = schema_id;
        self
    }

    /// Builds the schema.
    ///
    /// Field ids must be positive and unique across the whole schema,
    /// and top-level field names must be unique.
    pub fn build(self) -> SchemaResult<Schema> {
        let mut id_to_field = HashMap::new();
        Self::index_fields_recursive(&self.fields, &mut id_to_field)?;

        let mut name_to_id = HashMap::new();
        let mut lowercase_name_to_id = HashMap::new();
        for field in &self.fields {
            if name_to_id.insert(field.name.clone(), field.id).is_some() {
                return Err(SchemaError::invalid_field(format!(
                    "duplicate field name: {}",
                    field.name
                )));
            }
            // The first field wins when names only differ in case.
            lowercase_name_to_id
                .entry(field.name.to_lowercase())
                .or_insert(field.id);
        }

        let highest_field_id = id_to_field.keys().max().copied().unwrap_or(0);

        Ok(Schema {
            schema_id: self.schema_id,
            fields: self.fields,
            highest_field_id,
            id_to_field,
            name_to_id,
            lowercase_name_to_id,
        })
    }

    fn index_fields_recursive(
        fields: &[NestedFieldRef],
        id_to_field: &mut HashMap<i32, NestedFieldRef>,
    ) -> SchemaResult<()> {
        for field in fields {
            Self::index_field(field, id_to_field)?;
            match field.field_type.as_ref() {
                Type::Struct(struct_type) => {
                    Self::index_fields_recursive(struct_type.fields(), id_to_field)?;
                }
                Type::List(list_type) => {
                    Self::index_fields_recursive(
                        std::slice::from_ref(&list_type.element_field),
                        id_to_field,
                    )?;
                }
                Type::Map(map_type) => {
                    Self::index_fields_recursive(
                        &[map_type.key_field.clone(), map_type.value_field.clone()],
                        id_to_field,
                    )?;
                }
                Type::Primitive(_) => {}
            }
        }
        Ok(())
    }

    fn index_field(
        field: &NestedFieldRef,
        id_to_field: &mut HashMap<i32, NestedFieldRef>,
    ) -> SchemaResult<()> {
        if field.id <= 0 {
            return Err(SchemaError::invalid_field(format!(
                "field id must be positive: {field}"
            )));
        }
        if id_to_field.insert(field.id, field.clone()).is_some() {
            return Err(SchemaError::invalid_field(format!(
                "duplicate field id: {}",
                field.id
            )));
        }
        Ok(())
    }
}

impl Schema {
    /// Create a schema builder.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder {
            schema_id: DEFAULT_SCHEMA_ID,
            fields: vec![],
        }
    }

    /// Get field by field id.
    pub fn field_by_id(&self, field_id: i32) -> Option<&NestedFieldRef> {
        self.id_to_field.get(&field_id)
    }

    /// Get top-level field by its exact name.
    pub fn field_by_name(&self, field_name: &str) -> Option<&NestedFieldRef> {
        self.name_to_id
            .get(field_name)
            .and_then(|id| self.field_by_id(*id))
    }

    /// Get top-level field by name, ignoring case.
    ///
    /// An exact match is preferred over a match that only differs in case.
    pub fn field_by_name_case_insensitive(&self, field_name: &str) -> Option<&NestedFieldRef> {
        self.field_by_name(field_name).or_else(|| {
            self.lowercase_name_to_id
                .get(&field_name.to_lowercase())
                .and_then(|id| self.field_by_id(*id))
        })
    }

    /// Get the type of a field by field id.
    pub fn field_type_by_id(&self, field_id: i32) -> Option<&Type> {
        self.field_by_id(field_id).map(|f| f.field_type.as_ref())
    }

    #[inline]
    pub fn highest_field_id(&self) -> i32 {
        self.highest_field_id
    }

    #[inline]
    pub fn schema_id(&self) -> SchemaId {
        self.schema_id
    }

    /// Get the top-level fields in the schema.
    pub fn fields(&self) -> &[NestedFieldRef] {
        &self.fields
    }
}

impl Display for Schema {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "table {{")?;
        for field in &self.fields {
            writeln!(f, "  {}", field)?;
        }
        writeln!(f, "}}")
    }
}
