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

//! Textual partition field declarations.
//!
//! A declaration is either a bare column name (identity partitioning) or a
//! transform call on a column:
//!
//! ```text
//! order_key
//! year(ts)  month(ts)  day(ts)  hour(ts)  void(ts)
//! bucket(order_key, 42)  truncate(comment, 13)
//! ```
//!
//! Keywords and column names are matched case-insensitively. The canonical
//! form uses lowercase keywords and the column name as declared in the schema.

use keel_common::config::PartitionConfig;
use lazy_static::lazy_static;
use log::debug;

use crate::error::{PartitionError, PartitionResult};
use crate::spec::partition::{
    PartitionField, PartitionSpec, PartitionSpecBuilder, UnboundPartitionField,
    PARTITION_DATA_ID_START,
};
use crate::spec::schema::Schema;
use crate::spec::transform::Transform;
use crate::spec::types::NestedFieldRef;

fn create_regex(regex: Result<regex::Regex, regex::Error>) -> regex::Regex {
    #[allow(clippy::unwrap_used)]
    regex.unwrap()
}

lazy_static! {
    static ref COLUMN_ARGUMENT: regex::Regex =
        create_regex(regex::Regex::new(r"^\(([^(),]+)\)$"));
    static ref COLUMN_AND_NUMBER_ARGUMENTS: regex::Regex =
        create_regex(regex::Regex::new(r"^\(([^(),]+),([^(),]+)\)$"));
}

/// Parses and renders partition field declarations.
#[derive(Debug, Clone)]
pub struct PartitionFieldParser {
    case_sensitive: bool,
    first_field_id: i32,
}

impl Default for PartitionFieldParser {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            first_field_id: PARTITION_DATA_ID_START,
        }
    }
}

impl PartitionFieldParser {
    /// Create a parser from configuration.
    ///
    /// Partition field ids below [`PARTITION_DATA_ID_START`] are reserved for schema fields.
    pub fn new(config: &PartitionConfig) -> PartitionResult<Self> {
        if config.first_field_id < PARTITION_DATA_ID_START {
            return Err(PartitionError::InvalidFirstFieldId(config.first_field_id));
        }
        Ok(Self {
            case_sensitive: config.case_sensitive,
            first_field_id: config.first_field_id,
        })
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Resolve one declaration against the schema.
    pub fn parse(
        &self,
        schema: &Schema,
        declaration: &str,
    ) -> PartitionResult<UnboundPartitionField> {
        let (column, transform) = parse_declaration(declaration)?;
        let source = self.resolve_column(schema, column)?;
        transform.check_source_type(&source.field_type)?;
        debug!(
            "resolved partition field declaration `{declaration}` to {transform} on field {}",
            source.id
        );
        Ok(UnboundPartitionField {
            source_id: source.id,
            source_name: source.name.clone(),
            name: transform.partition_name(&source.name),
            transform,
        })
    }

    /// Build a partition spec from declarations, stopping at the first invalid one.
    pub fn parse_all<I, S>(
        &self,
        schema: &Schema,
        declarations: I,
    ) -> PartitionResult<PartitionSpec>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = PartitionSpecBuilder::new().with_first_field_id(self.first_field_id);
        for declaration in declarations {
            builder = builder.add_unbound_field(self.parse(schema, declaration.as_ref())?);
        }
        builder.build()
    }

    /// Validate every declaration and collect all the errors.
    pub fn validate_all<I, S>(&self, schema: &Schema, declarations: I) -> Vec<PartitionError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        declarations
            .into_iter()
            .filter_map(|d| self.parse(schema, d.as_ref()).err())
            .collect()
    }

    fn resolve_column<'a>(
        &self,
        schema: &'a Schema,
        column: &str,
    ) -> PartitionResult<&'a NestedFieldRef> {
        if self.case_sensitive {
            schema
                .field_by_name(column)
                .ok_or_else(|| PartitionError::UnresolvedColumn(column.to_string()))
        } else {
            schema
                .field_by_name_case_insensitive(column)
                .ok_or_else(|| PartitionError::UnresolvedColumn(column.to_lowercase()))
        }
    }
}

/// Split a declaration into its column name and transform.
fn parse_declaration(declaration: &str) -> PartitionResult<(&str, Transform)> {
    let Some(open) = declaration.find('(') else {
        if declaration.contains(')') || declaration.trim().is_empty() {
            return Err(PartitionError::invalid_declaration(declaration));
        }
        return Ok((declaration, Transform::Identity));
    };
    let (keyword, arguments) = declaration.split_at(open);
    let transform = match keyword.to_ascii_lowercase().as_str() {
        "year" => Transform::Year,
        "month" => Transform::Month,
        "day" => Transform::Day,
        "hour" => Transform::Hour,
        "void" => Transform::Void,
        "bucket" => {
            let (column, n) = column_and_number(declaration, arguments)?;
            let n = positive(declaration, n, |n| {
                format!("Invalid number of buckets: {n} (must be > 0)")
            })?;
            return Ok((column, Transform::Bucket(n)));
        }
        "truncate" => {
            let (column, w) = column_and_number(declaration, arguments)?;
            let w = positive(declaration, w, |w| {
                format!("Invalid truncate width: {w} (must be > 0)")
            })?;
            return Ok((column, Transform::Truncate(w)));
        }
        _ => return Err(PartitionError::invalid_declaration(declaration)),
    };
    let column = COLUMN_ARGUMENT
        .captures(arguments)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| PartitionError::invalid_declaration(declaration))?;
    Ok((column, transform))
}

fn column_and_number<'a>(
    declaration: &str,
    arguments: &'a str,
) -> PartitionResult<(&'a str, i64)> {
    let invalid = || PartitionError::invalid_declaration(declaration);
    let caps = COLUMN_AND_NUMBER_ARGUMENTS
        .captures(arguments)
        .ok_or_else(invalid)?;
    let (Some(column), Some(number)) = (caps.get(1), caps.get(2)) else {
        return Err(invalid());
    };
    let column = column.as_str().trim();
    if column.is_empty() {
        return Err(invalid());
    }
    let number = number.as_str().trim().parse::<i64>().map_err(|_| invalid())?;
    Ok((column, number))
}

fn positive(
    declaration: &str,
    value: i64,
    message: impl FnOnce(i64) -> String,
) -> PartitionResult<u32> {
    if value <= 0 {
        return Err(PartitionError::syntax(message(value)));
    }
    u32::try_from(value).map_err(|_| PartitionError::invalid_declaration(declaration))
}

/// Types that name a source column and a transform, and so can be rendered as a declaration.
pub trait PartitionSource {
    fn source_id(&self) -> i32;
    fn transform(&self) -> Transform;
}

impl PartitionSource for PartitionField {
    fn source_id(&self) -> i32 {
        self.source_id
    }

    fn transform(&self) -> Transform {
        self.transform
    }
}

impl PartitionSource for UnboundPartitionField {
    fn source_id(&self) -> i32 {
        self.source_id
    }

    fn transform(&self) -> Transform {
        self.transform
    }
}

/// Render the canonical declaration of a column and transform.
pub fn canonical_declaration(column: &str, transform: Transform) -> String {
    match transform {
        Transform::Identity => column.to_string(),
        Transform::Year | Transform::Month | Transform::Day | Transform::Hour | Transform::Void => {
            format!("{transform}({column})")
        }
        Transform::Bucket(n) => format!("bucket({column}, {n})"),
        Transform::Truncate(w) => format!("truncate({column}, {w})"),
    }
}

/// Parse one partition field declaration using case-insensitive column matching.
pub fn parse_partition_field(
    schema: &Schema,
    declaration: &str,
) -> PartitionResult<UnboundPartitionField> {
    PartitionFieldParser::default().parse(schema, declaration)
}

/// Build a partition spec from declarations, stopping at the first invalid one.
pub fn parse_partition_fields<I, S>(
    schema: &Schema,
    declarations: I,
) -> PartitionResult<PartitionSpec>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    PartitionFieldParser::default().parse_all(schema, declarations)
}

/// Validate every declaration and collect all the errors.
pub fn validate_partition_fields<I, S>(schema: &Schema, declarations: I) -> Vec<PartitionError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    PartitionFieldParser::default().validate_all(schema, declarations)
}

/// Render a partition field as its canonical declaration.
pub fn to_partition_field(
    schema: &Schema,
    field: &impl PartitionSource,
) -> PartitionResult<String> {
    let source = schema
        .field_by_id(field.source_id())
        .ok_or(PartitionError::MissingSourceField(field.source_id()))?;
    Ok(canonical_declaration(&source.name, field.transform()))
}

/// Render every field of a partition spec as canonical declarations, in spec order.
pub fn to_partition_fields(schema: &Schema, spec: &PartitionSpec) -> PartitionResult<Vec<String>> {
    spec.fields()
        .iter()
        .map(|field| to_partition_field(schema, field))
        .collect()
}
