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

use thiserror::Error;

use crate::spec::partition::PARTITION_DATA_ID_START;

pub type PartitionResult<T> = Result<T, PartitionError>;

/// Errors raised while validating partition field declarations against a schema.
///
/// The display form of each variant is the exact user-facing message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PartitionError {
    /// The declaration text does not follow the partition field grammar.
    #[error("{0}")]
    Syntax(String),
    /// The declared column does not exist in the schema.
    #[error("Cannot find source column: {0}")]
    UnresolvedColumn(String),
    /// A partition field refers to a source field id that is not in the schema.
    #[error("Cannot find source column with id {0}")]
    MissingSourceField(i32),
    /// The transform cannot be applied to the type of the source column.
    #[error("{0}")]
    TypeIncompatibility(String),
    /// The first partition field id is outside the partition field id range.
    #[error(
        "Invalid first partition field id: {0} (must be >= {min})",
        min = PARTITION_DATA_ID_START
    )]
    InvalidFirstFieldId(i32),
    /// More partition fields were added than there are ids left.
    #[error("Cannot assign partition field id: ids exhausted")]
    FieldIdOverflow,
}

impl PartitionError {
    pub fn invalid_declaration(declaration: &str) -> Self {
        PartitionError::Syntax(format!(
            "Invalid partition field declaration: {declaration}"
        ))
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        PartitionError::Syntax(message.into())
    }

    pub fn incompatible(message: impl Into<String>) -> Self {
        PartitionError::TypeIncompatibility(message.into())
    }
}

pub type SchemaResult<T> = Result<T, SchemaError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("invalid type: {0}")]
    InvalidType(String),
    #[error("invalid field: {0}")]
    InvalidField(String),
}

impl SchemaError {
    pub fn invalid_type(message: impl Into<String>) -> Self {
        SchemaError::InvalidType(message.into())
    }

    pub fn invalid_field(message: impl Into<String>) -> Self {
        SchemaError::InvalidField(message.into())
    }
}

pub type ConversionResult<T> = Result<T, ConversionError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Unsupported iceberg type: {0}")]
    UnsupportedType(String),
    #[error("Value {value} does not match iceberg type {iceberg_type}")]
    ValueTypeMismatch { value: String, iceberg_type: String },
    #[error("Value {value} overflows iceberg type {iceberg_type}")]
    Overflow { value: String, iceberg_type: String },
    #[error("Value {value} cannot be rescaled to iceberg type {iceberg_type} without rounding")]
    InexactRescale { value: String, iceberg_type: String },
}
