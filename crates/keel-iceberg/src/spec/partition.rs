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

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{PartitionError, PartitionResult};
use crate::spec::schema::Schema;
use crate::spec::transform::Transform;
use crate::spec::types::{NestedField, StructType};

pub const DEFAULT_PARTITION_SPEC_ID: i32 = 0;
/// Partition field ids start after the range reserved for schema fields.
pub const PARTITION_DATA_ID_START: i32 = 1000;

/// A partition field resolved against a schema but not yet placed in a partition spec.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct UnboundPartitionField {
    /// The id of the source column in the schema.
    pub source_id: i32,
    /// The name of the source column, as declared in the schema.
    pub source_name: String,
    /// The partition field name.
    pub name: String,
    pub transform: Transform,
}

/// Partition fields capture the transform from table data to partition values.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct PartitionField {
    /// A source column id from the table's schema
    pub source_id: i32,
    /// A partition field id that is unique within a partition spec.
    pub field_id: i32,
    /// A partition name.
    pub name: String,
    /// A transform that is applied to the source column to produce a partition value.
    pub transform: Transform,
}

impl PartitionField {
    pub fn new(source_id: i32, field_id: i32, name: impl ToString, transform: Transform) -> Self {
        Self {
            source_id,
            field_id,
            name: name.to_string(),
            transform,
        }
    }
}

/// Partition spec that defines how to produce a tuple of partition values from a record.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct PartitionSpec {
    spec_id: i32,
    fields: Vec<PartitionField>,
}

impl PartitionSpec {
    pub fn builder() -> PartitionSpecBuilder {
        PartitionSpecBuilder::new()
    }

    /// Fields of the partition spec, in declaration order.
    pub fn fields(&self) -> &[PartitionField] {
        &self.fields
    }

    pub fn spec_id(&self) -> i32 {
        self.spec_id
    }

    pub fn unpartitioned_spec() -> Self {
        Self {
            spec_id: DEFAULT_PARTITION_SPEC_ID,
            fields: vec![],
        }
    }

    /// A spec is unpartitioned if it has no fields or all fields use the
    /// [`Transform::Void`] transform.
    pub fn is_unpartitioned(&self) -> bool {
        self.fields.iter().all(|f| f.transform == Transform::Void)
    }

    /// Returns the struct type of the partition values of this spec.
    pub fn partition_type(&self, schema: &Schema) -> PartitionResult<StructType> {
        let mut partition_fields = Vec::with_capacity(self.fields.len());
        for partition_field in &self.fields {
            let source_type = schema
                .field_type_by_id(partition_field.source_id)
                .ok_or(PartitionError::MissingSourceField(partition_field.source_id))?;
            let result_type = partition_field.transform.result_type(source_type)?;
            partition_fields.push(Arc::new(NestedField::optional(
                partition_field.field_id,
                &partition_field.name,
                result_type,
            )));
        }
        Ok(StructType::new(partition_fields))
    }

    pub fn highest_field_id(&self) -> Option<i32> {
        self.fields.iter().map(|f| f.field_id).max()
    }

    /// Returns true if the spec is equal to the other spec, ignoring partition field ids
    /// and spec ids.
    pub fn is_compatible_with(&self, other: &PartitionSpec) -> bool {
        self.fields.len() == other.fields.len()
            && self.fields.iter().zip(other.fields.iter()).all(|(a, b)| {
                a.source_id == b.source_id && a.name == b.name && a.transform == b.transform
            })
    }
}

/// Builder for partition spec.
///
/// Field ids are assigned in insertion order. A field whose name is already taken
/// gets the smallest free `_N` suffix, starting at `_2`.
#[derive(Debug)]
pub struct PartitionSpecBuilder {
    spec_id: i32,
    fields: Vec<PartitionField>,
    names: HashSet<String>,
    next_field_id: Option<i32>,
    exhausted: bool,
}

impl PartitionSpecBuilder {
    pub fn new() -> Self {
        Self {
            spec_id: DEFAULT_PARTITION_SPEC_ID,
            fields: Vec::new(),
            names: HashSet::new(),
            next_field_id: Some(PARTITION_DATA_ID_START),
            exhausted: false,
        }
    }

    pub fn with_spec_id(mut self, spec_id: i32) -> Self {
        self.spec_id = spec_id;
        self
    }

    /// Set the id of the next partition field.
    pub fn with_first_field_id(mut self, field_id: i32) -> Self {
        self.next_field_id = Some(field_id);
        self
    }

    /// Append a partition field, assigning the next partition field id.
    pub fn add_field(mut self, source_id: i32, name: impl ToString, transform: Transform) -> Self {
        let Some(field_id) = self.next_field_id else {
            self.exhausted = true;
            return self;
        };
        let name = self.unique_name(name.to_string());
        self.names.insert(name.clone());
        self.fields
            .push(PartitionField::new(source_id, field_id, name, transform));
        self.next_field_id = field_id.checked_add(1);
        self
    }

    pub fn add_unbound_field(self, field: UnboundPartitionField) -> Self {
        self.add_field(field.source_id, field.name, field.transform)
    }

    /// Fails if more fields were added than there are partition field ids left.
    pub fn build(self) -> PartitionResult<PartitionSpec> {
        if self.exhausted {
            return Err(PartitionError::FieldIdOverflow);
        }
        Ok(PartitionSpec {
            spec_id: self.spec_id,
            fields: self.fields,
        })
    }

    fn unique_name(&self, name: String) -> String {
        if !self.names.contains(&name) {
            return name;
        }
        let mut n: usize = 2;
        loop {
            let candidate = format!("{name}_{n}");
            if !self.names.contains(&candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

impl Default for PartitionSpecBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::spec::types::PrimitiveType;

    fn test_schema() -> Schema {
        Schema::builder()
            .with_field(NestedField::required(1, "id", PrimitiveType::Long.into()))
            .with_field(NestedField::required(2, "ts", PrimitiveType::Timestamp.into()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_assigns_field_ids() {
        let spec = PartitionSpec::builder()
            .with_spec_id(1)
            .add_field(2, "ts_day", Transform::Day)
            .add_field(2, "ts_hour", Transform::Hour)
            .add_field(1, "id_bucket", Transform::Bucket(16))
            .build()
            .unwrap();
        assert_eq!(spec.spec_id(), 1);
        let ids = spec.fields().iter().map(|f| f.field_id).collect::<Vec<_>>();
        assert_eq!(ids, vec![1000, 1001, 1002]);
        assert_eq!(spec.highest_field_id(), Some(1002));
        assert!(!spec.is_unpartitioned());

        let spec = PartitionSpec::builder()
            .with_first_field_id(2000)
            .add_field(1, "id_null", Transform::Void)
            .build()
            .unwrap();
        assert_eq!(spec.fields()[0].field_id, 2000);
        assert!(spec.is_unpartitioned());
        assert!(PartitionSpec::unpartitioned_spec().is_unpartitioned());
    }

    #[test]
    fn test_partition_type() {
        let spec = PartitionSpec::builder()
            .add_field(2, "ts_day", Transform::Day)
            .add_field(1, "id_bucket", Transform::Bucket(16))
            .build()
            .unwrap();
        let partition_type = spec.partition_type(&test_schema()).unwrap();
        assert_eq!(
            partition_type.to_string(),
            "struct<1000: ts_day: optional date, 1001: id_bucket: optional int>"
        );

        let dangling = PartitionSpec::builder()
            .add_field(9, "x", Transform::Identity)
            .build()
            .unwrap();
        assert_eq!(
            dangling.partition_type(&test_schema()).unwrap_err(),
            PartitionError::MissingSourceField(9)
        );
    }

    #[test]
    fn test_compatibility() {
        let a = PartitionSpec::builder()
            .add_field(2, "ts_day", Transform::Day)
            .build()
            .unwrap();
        let b = PartitionSpec::builder()
            .with_spec_id(3)
            .with_first_field_id(1005)
            .add_field(2, "ts_day", Transform::Day)
            .build()
            .unwrap();
        let c = PartitionSpec::builder()
            .add_field(2, "ts_day", Transform::Hour)
            .build()
            .unwrap();
        assert!(a.is_compatible_with(&b));
        assert!(!a.is_compatible_with(&c));
    }

    #[test]
    fn test_field_id_overflow() {
        let spec = PartitionSpec::builder()
            .with_first_field_id(i32::MAX)
            .add_field(2, "ts_day", Transform::Day)
            .build()
            .unwrap();
        assert_eq!(spec.fields()[0].field_id, i32::MAX);

        let result = PartitionSpec::builder()
            .with_first_field_id(i32::MAX)
            .add_field(2, "ts_day", Transform::Day)
            .add_field(2, "ts_hour", Transform::Hour)
            .build();
        assert_eq!(result.unwrap_err(), PartitionError::FieldIdOverflow);
    }

    #[test]
    fn test_unique_field_names() {
        let spec = PartitionSpec::builder()
            .add_field(1, "id_bucket", Transform::Bucket(4))
            .add_field(1, "id_bucket", Transform::Bucket(8))
            .add_field(1, "id_bucket_2", Transform::Truncate(3))
            .build()
            .unwrap();
        let names = spec.fields().iter().map(|f| f.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["id_bucket", "id_bucket_2", "id_bucket_2_2"]);

        let partition_type = spec.partition_type(&test_schema()).unwrap();
        let schema = Schema::builder()
            .with_fields(partition_type.fields().to_vec())
            .build()
            .unwrap();
        assert_eq!(schema.fields().len(), 3);
    }

    #[test]
    fn test_spec_json() {
        let spec = PartitionSpec::builder()
            .add_field(1, "id_bucket", Transform::Bucket(16))
            .build()
            .unwrap();
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "spec-id": 0,
                "fields": [
                    {
                        "source-id": 1,
                        "field-id": 1000,
                        "name": "id_bucket",
                        "transform": "bucket[16]"
                    }
                ]
            })
        );
        assert_eq!(serde_json::from_value::<PartitionSpec>(json).unwrap(), spec);
    }
}
