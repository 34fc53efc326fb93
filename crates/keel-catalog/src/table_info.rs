use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use keel_iceberg::{NestedField, PartitionFieldParser, PartitionSpec, Schema, Type};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

/// The probability that a generated column value is null.
pub const NULL_PROBABILITY_PROPERTY: &str = "null_probability";
/// The number of rows returned when a query does not specify a limit.
pub const DEFAULT_LIMIT_PROPERTY: &str = "default_limit";
/// A JSON array of partition field declarations.
pub const PARTITIONING_PROPERTY: &str = "partitioning";

pub type Properties = BTreeMap<String, serde_json::Value>;

/// Identifies a column within a table. The value doubles as the schema field id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnHandle(pub i32);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaTableName {
    pub schema_name: String,
    pub table_name: String,
}

impl Display for SchemaTableName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema_name, self.table_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub handle: ColumnHandle,
    pub name: String,
    pub column_type: Type,
    pub nullable: bool,
    pub comment: Option<String>,
}

impl ColumnInfo {
    pub fn new(handle: ColumnHandle, name: impl ToString, column_type: Type) -> Self {
        Self {
            handle,
            name: name.to_string(),
            column_type,
            nullable: true,
            comment: None,
        }
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_comment(mut self, comment: Option<String>) -> Self {
        self.comment = comment;
        self
    }

    pub fn metadata(&self) -> ColumnMetadata {
        ColumnMetadata {
            name: self.name.clone(),
            column_type: self.column_type.clone(),
            nullable: self.nullable,
            comment: self.comment.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMetadata {
    pub name: String,
    pub column_type: Type,
    pub nullable: bool,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableMetadata {
    pub table: SchemaTableName,
    pub columns: Vec<ColumnMetadata>,
    pub properties: Properties,
    pub comment: Option<String>,
}

/// An immutable description of a table.
///
/// The `with_*` methods return a modified copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInfo {
    pub id: i64,
    pub schema_name: String,
    pub table_name: String,
    pub columns: Vec<ColumnInfo>,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub comment: Option<String>,
}

impl TableInfo {
    pub fn new(
        id: i64,
        schema_name: impl ToString,
        table_name: impl ToString,
        columns: Vec<ColumnInfo>,
    ) -> Self {
        Self {
            id,
            schema_name: schema_name.to_string(),
            table_name: table_name.to_string(),
            columns,
            properties: Properties::new(),
            comment: None,
        }
    }

    pub fn schema_table_name(&self) -> SchemaTableName {
        SchemaTableName {
            schema_name: self.schema_name.clone(),
            table_name: self.table_name.clone(),
        }
    }

    pub fn metadata(&self) -> TableMetadata {
        TableMetadata {
            table: self.schema_table_name(),
            columns: self.columns.iter().map(ColumnInfo::metadata).collect(),
            properties: self.properties.clone(),
            comment: self.comment.clone(),
        }
    }

    pub fn column(&self, handle: &ColumnHandle) -> CatalogResult<&ColumnInfo> {
        self.columns
            .iter()
            .find(|column| column.handle == *handle)
            .ok_or_else(|| {
                CatalogError::not_found(format!(
                    "column {} in table {}",
                    handle.0,
                    self.schema_table_name()
                ))
            })
    }

    pub fn with_columns(&self, columns: Vec<ColumnInfo>) -> Self {
        Self {
            columns,
            ..self.clone()
        }
    }

    pub fn with_properties(&self, properties: Properties) -> Self {
        Self {
            properties,
            ..self.clone()
        }
    }

    pub fn with_comment(&self, comment: Option<String>) -> Self {
        Self {
            comment,
            ..self.clone()
        }
    }

    /// The Iceberg schema of the table, using column handles as field ids.
    pub fn schema(&self) -> CatalogResult<Schema> {
        let fields = self.columns.iter().map(|column| {
            let field = NestedField::new(
                column.handle.0,
                &column.name,
                column.column_type.clone(),
                !column.nullable,
            );
            let field = match &column.comment {
                Some(comment) => field.with_doc(comment),
                None => field,
            };
            Arc::new(field)
        });
        Ok(Schema::builder().with_fields(fields).build()?)
    }

    /// The partition spec declared by the `partitioning` property.
    pub fn partition_spec(&self, parser: &PartitionFieldParser) -> CatalogResult<PartitionSpec> {
        let Some(value) = self.properties.get(PARTITIONING_PROPERTY) else {
            return Ok(PartitionSpec::unpartitioned_spec());
        };
        let declarations: Vec<String> = serde_json::from_value(value.clone()).map_err(|e| {
            CatalogError::invalid(format!(
                "{PARTITIONING_PROPERTY} must be an array of strings: {e}"
            ))
        })?;
        let spec = parser.parse_all(&self.schema()?, &declarations)?;
        debug!(
            "table {} is partitioned by {} field(s)",
            self.schema_table_name(),
            spec.fields().len()
        );
        Ok(spec)
    }

    pub fn null_probability(&self) -> CatalogResult<Option<f64>> {
        let Some(value) = self.properties.get(NULL_PROBABILITY_PROPERTY) else {
            return Ok(None);
        };
        match value.as_f64() {
            Some(p) if (0.0..=1.0).contains(&p) => Ok(Some(p)),
            _ => Err(CatalogError::invalid(format!(
                "{NULL_PROBABILITY_PROPERTY} must be a number between 0 and 1: {value}"
            ))),
        }
    }

    pub fn default_limit(&self) -> CatalogResult<Option<u64>> {
        let Some(value) = self.properties.get(DEFAULT_LIMIT_PROPERTY) else {
            return Ok(None);
        };
        match value.as_u64() {
            Some(limit) if limit > 0 => Ok(Some(limit)),
            _ => Err(CatalogError::invalid(format!(
                "{DEFAULT_LIMIT_PROPERTY} must be a positive integer: {value}"
            ))),
        }
    }
}
