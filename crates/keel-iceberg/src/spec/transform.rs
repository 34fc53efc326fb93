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

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{PartitionError, PartitionResult};
use crate::spec::types::{PrimitiveType, Type};

/// Transform is used to map source column values to partition values.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Transform {
    /// Source value, unmodified
    Identity,
    /// Hash of value, mod `N`.
    Bucket(u32),
    /// Value truncated to width `W`
    Truncate(u32),
    /// Extract a date or timestamp year, as years from 1970
    Year,
    /// Extract a date or timestamp month, as months from 1970-01-01
    Month,
    /// Extract a date or timestamp day, as days from 1970-01-01
    Day,
    /// Extract a date or timestamp hour, as hours from 1970-01-01 00:00:00
    Hour,
    /// Always produces `null`
    Void,
}

impl Transform {
    /// Check that the transform can be applied to values of the source type.
    pub fn check_source_type(&self, source_type: &Type) -> PartitionResult<()> {
        let primitive = source_type.as_primitive();
        let supported = match self {
            Transform::Identity => {
                return match primitive {
                    Some(_) => Ok(()),
                    None => Err(PartitionError::incompatible(format!(
                        "Cannot partition by non-primitive source field: {source_type}"
                    ))),
                }
            }
            Transform::Void => true,
            Transform::Year | Transform::Month | Transform::Day | Transform::Hour => {
                primitive.is_some_and(PrimitiveType::is_date_or_timestamp)
            }
            Transform::Bucket(_) => primitive.is_some_and(|p| !p.is_floating_point()),
            Transform::Truncate(_) => primitive.is_some_and(|p| {
                matches!(
                    p,
                    PrimitiveType::Int
                        | PrimitiveType::Long
                        | PrimitiveType::Decimal { .. }
                        | PrimitiveType::String
                        | PrimitiveType::Binary
                )
            }),
        };
        if supported {
            return Ok(());
        }
        let message = match self {
            Transform::Bucket(_) => format!("Cannot bucket by type: {source_type}"),
            Transform::Truncate(_) => format!("Cannot truncate type: {source_type}"),
            _ => format!("Cannot partition type {source_type} by {self}"),
        };
        Err(PartitionError::incompatible(message))
    }

    /// Get the type of the partition values produced from the source type.
    pub fn result_type(&self, source_type: &Type) -> PartitionResult<Type> {
        self.check_source_type(source_type)?;
        let result = match self {
            Transform::Identity | Transform::Truncate(_) | Transform::Void => source_type.clone(),
            Transform::Day => Type::Primitive(PrimitiveType::Date),
            Transform::Year | Transform::Month | Transform::Hour | Transform::Bucket(_) => {
                Type::Primitive(PrimitiveType::Int)
            }
        };
        Ok(result)
    }

    /// The default name of a partition field derived from the source column.
    pub fn partition_name(&self, source_name: &str) -> String {
        match self {
            Transform::Identity => source_name.to_string(),
            Transform::Bucket(_) => format!("{source_name}_bucket"),
            Transform::Truncate(_) => format!("{source_name}_trunc"),
            Transform::Year => format!("{source_name}_year"),
            Transform::Month => format!("{source_name}_month"),
            Transform::Day => format!("{source_name}_day"),
            Transform::Hour => format!("{source_name}_hour"),
            Transform::Void => format!("{source_name}_null"),
        }
    }

    /// Whether the transform preserves the order of values.
    pub fn preserves_order(&self) -> bool {
        !matches!(self, Transform::Void | Transform::Bucket(_))
    }

    /// Whether ordering by this transform satisfies the ordering of another transform.
    pub fn satisfies_order_of(&self, other: &Self) -> bool {
        match self {
            Transform::Identity => other.preserves_order(),
            Transform::Hour => matches!(
                other,
                Transform::Hour | Transform::Day | Transform::Month | Transform::Year
            ),
            Transform::Day => matches!(other, Transform::Day | Transform::Month | Transform::Year),
            Transform::Month => matches!(other, Transform::Month | Transform::Year),
            _ => self == other,
        }
    }
}

impl Display for Transform {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Transform::Identity => write!(f, "identity"),
            Transform::Bucket(n) => write!(f, "bucket[{n}]"),
            Transform::Truncate(w) => write!(f, "truncate[{w}]"),
            Transform::Year => write!(f, "year"),
            Transform::Month => write!(f, "month"),
            Transform::Day => write!(f, "day"),
            Transform::Hour => write!(f, "hour"),
            Transform::Void => write!(f, "void"),
        }
    }
}

impl FromStr for Transform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        fn parameter(s: &str, name: &str) -> Result<u32, String> {
            match s.parse::<u32>() {
                Ok(n) if n > 0 => Ok(n),
                _ => Err(format!("Invalid {name} parameter: {s}")),
            }
        }

        match s {
            "identity" => Ok(Transform::Identity),
            "year" => Ok(Transform::Year),
            "month" => Ok(Transform::Month),
            "day" => Ok(Transform::Day),
            "hour" => Ok(Transform::Hour),
            "void" => Ok(Transform::Void),
            _ => {
                if let Some(n) = s.strip_prefix("bucket[").and_then(|s| s.strip_suffix(']')) {
                    Ok(Transform::Bucket(parameter(n, "bucket")?))
                } else if let Some(w) = s
                    .strip_prefix("truncate[")
                    .and_then(|s| s.strip_suffix(']'))
                {
                    Ok(Transform::Truncate(parameter(w, "truncate")?))
                } else {
                    Err(format!("Unsupported transform: {s}"))
                }
            }
        }
    }
}

impl Serialize for Transform {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Transform {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Transform::from_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::spec::types::{ListType, MapType};

    fn primitive(p: PrimitiveType) -> Type {
        Type::Primitive(p)
    }

    #[test]
    fn test_bucket_source_types() {
        for p in [
            PrimitiveType::Boolean,
            PrimitiveType::Int,
            PrimitiveType::Long,
            PrimitiveType::Decimal {
                precision: 10,
                scale: 2,
            },
            PrimitiveType::Date,
            PrimitiveType::Time,
            PrimitiveType::Timestamp,
            PrimitiveType::Timestamptz,
            PrimitiveType::String,
            PrimitiveType::Uuid,
            PrimitiveType::Fixed(4),
            PrimitiveType::Binary,
        ] {
            assert!(Transform::Bucket(8).check_source_type(&primitive(p)).is_ok());
        }
        assert_eq!(
            Transform::Bucket(8)
                .check_source_type(&primitive(PrimitiveType::Float))
                .unwrap_err()
                .to_string(),
            "Cannot bucket by type: float"
        );
        let map = Type::Map(MapType::new(
            2,
            PrimitiveType::String.into(),
            3,
            PrimitiveType::Long.into(),
            true,
        ));
        assert_eq!(
            Transform::Bucket(8)
                .check_source_type(&map)
                .unwrap_err()
                .to_string(),
            "Cannot bucket by type: map<string, long>"
        );
    }

    #[test]
    fn test_truncate_source_types() {
        for p in [
            PrimitiveType::Int,
            PrimitiveType::Long,
            PrimitiveType::Decimal {
                precision: 38,
                scale: 10,
            },
            PrimitiveType::String,
            PrimitiveType::Binary,
        ] {
            assert!(Transform::Truncate(4).check_source_type(&primitive(p)).is_ok());
        }
        for p in [
            PrimitiveType::Date,
            PrimitiveType::Time,
            PrimitiveType::Timestamptz,
            PrimitiveType::Boolean,
            PrimitiveType::Uuid,
        ] {
            let message = format!("Cannot truncate type: {p}");
            assert_eq!(
                Transform::Truncate(4)
                    .check_source_type(&primitive(p))
                    .unwrap_err(),
                PartitionError::TypeIncompatibility(message)
            );
        }
    }

    #[test]
    fn test_time_source_types() {
        for transform in [
            Transform::Year,
            Transform::Month,
            Transform::Day,
            Transform::Hour,
        ] {
            assert!(transform
                .check_source_type(&primitive(PrimitiveType::Date))
                .is_ok());
            assert!(transform
                .check_source_type(&primitive(PrimitiveType::Timestamptz))
                .is_ok());
            assert_eq!(
                transform
                    .check_source_type(&primitive(PrimitiveType::Time))
                    .unwrap_err()
                    .to_string(),
                format!("Cannot partition type time by {transform}")
            );
        }
    }

    #[test]
    fn test_identity_and_void() {
        let list = Type::List(ListType::new(6, PrimitiveType::String.into(), true));
        assert_eq!(
            Transform::Identity
                .check_source_type(&list)
                .unwrap_err()
                .to_string(),
            "Cannot partition by non-primitive source field: list<string>"
        );
        assert!(Transform::Void.check_source_type(&list).is_ok());
        assert_eq!(Transform::Void.result_type(&list).unwrap(), list);
    }

    #[test]
    fn test_result_type() {
        let ts = primitive(PrimitiveType::Timestamp);
        assert_eq!(Transform::Identity.result_type(&ts).unwrap(), ts);
        assert_eq!(
            Transform::Day.result_type(&ts).unwrap(),
            primitive(PrimitiveType::Date)
        );
        assert_eq!(
            Transform::Hour.result_type(&ts).unwrap(),
            primitive(PrimitiveType::Int)
        );
        assert_eq!(
            Transform::Bucket(16)
                .result_type(&primitive(PrimitiveType::String))
                .unwrap(),
            primitive(PrimitiveType::Int)
        );
        assert!(Transform::Year
            .result_type(&primitive(PrimitiveType::Long))
            .is_err());
    }

    #[test]
    fn test_partition_name() {
        assert_eq!(Transform::Identity.partition_name("ts"), "ts");
        assert_eq!(Transform::Year.partition_name("ts"), "ts_year");
        assert_eq!(Transform::Bucket(4).partition_name("id"), "id_bucket");
        assert_eq!(Transform::Truncate(4).partition_name("id"), "id_trunc");
        assert_eq!(Transform::Void.partition_name("id"), "id_null");
    }

    #[test]
    fn test_metadata_notation() {
        for transform in [
            Transform::Identity,
            Transform::Bucket(16),
            Transform::Truncate(3),
            Transform::Year,
            Transform::Month,
            Transform::Day,
            Transform::Hour,
            Transform::Void,
        ] {
            assert_eq!(transform.to_string().parse::<Transform>(), Ok(transform));
        }
        assert!("bucket[0]".parse::<Transform>().is_err());
        assert!("bucket[x]".parse::<Transform>().is_err());
        assert!("zorder".parse::<Transform>().is_err());
        assert_eq!(
            serde_json::to_string(&Transform::Bucket(16)).unwrap(),
            r#""bucket[16]""#
        );
    }

    #[test]
    fn test_order() {
        assert!(Transform::Identity.satisfies_order_of(&Transform::Day));
        assert!(!Transform::Identity.satisfies_order_of(&Transform::Bucket(4)));
        assert!(Transform::Hour.satisfies_order_of(&Transform::Year));
        assert!(!Transform::Month.satisfies_order_of(&Transform::Day));
        assert!(!Transform::Void.preserves_order());
    }
}
