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

//! Conversions from stored Iceberg values to the query engine's runtime values.
//!
//! Partition values and column statistics are stored in their Iceberg representation
//! and must be converted before the engine can compare them with row values.

use chrono_tz::Tz;

use crate::error::{ConversionError, ConversionResult};
use crate::spec::types::{PrimitiveType, Type};
use crate::spec::values::PrimitiveLiteral;

/// The largest precision of a decimal stored in a single 64-bit value.
pub const MAX_SHORT_DECIMAL_PRECISION: u32 = 18;

const PICOSECONDS_PER_MICROSECOND: i64 = 1_000_000;
const MICROSECONDS_PER_MILLISECOND: i64 = 1_000;

/// A value in the engine's runtime representation.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineValue {
    Boolean(bool),
    /// Integers, dates (days), times (picoseconds), timestamps (microseconds),
    /// float bit patterns and short decimals.
    Long(i64),
    Double(f64),
    /// Long decimals.
    Int128(i128),
    /// Strings, binary values and UUIDs.
    Slice(Vec<u8>),
    TimestampWithTimeZone {
        epoch_millis: i64,
        picos_of_milli: i32,
        zone: Tz,
    },
}

/// Convert a value from its Iceberg representation to the engine representation.
///
/// `None` stands for a null value and is returned unchanged for every type.
pub fn convert_iceberg_value(
    iceberg_type: &Type,
    value: Option<&PrimitiveLiteral>,
) -> ConversionResult<Option<EngineValue>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let Type::Primitive(primitive) = iceberg_type else {
        return Err(ConversionError::UnsupportedType(iceberg_type.to_string()));
    };
    convert_primitive(primitive, value).map(Some)
}

fn convert_primitive(
    primitive: &PrimitiveType,
    value: &PrimitiveLiteral,
) -> ConversionResult<EngineValue> {
    use self::{EngineValue as EV, PrimitiveLiteral as PL};

    let mismatch = || ConversionError::ValueTypeMismatch {
        value: value.to_string(),
        iceberg_type: primitive.to_string(),
    };
    let overflow = || ConversionError::Overflow {
        value: value.to_string(),
        iceberg_type: primitive.to_string(),
    };

    match (primitive, value) {
        (PrimitiveType::Boolean, PL::Boolean(v)) => Ok(EV::Boolean(*v)),
        (PrimitiveType::Int, PL::Int(v)) => Ok(EV::Long(i64::from(*v))),
        (PrimitiveType::Long, PL::Long(v)) => Ok(EV::Long(*v)),
        (PrimitiveType::Float, PL::Float(v)) => Ok(EV::Long(float_bits(v.0))),
        (PrimitiveType::Double, PL::Double(v)) => Ok(EV::Double(v.0)),
        (PrimitiveType::Decimal { precision, scale }, PL::Decimal { unscaled, scale: from }) => {
            let rescaled = rescale(*unscaled, *from, *scale).ok_or_else(|| {
                if *from > *scale {
                    ConversionError::InexactRescale {
                        value: value.to_string(),
                        iceberg_type: primitive.to_string(),
                    }
                } else {
                    overflow()
                }
            })?;
            if !fits_precision(rescaled, *precision) {
                return Err(overflow());
            }
            if *precision <= MAX_SHORT_DECIMAL_PRECISION {
                i64::try_from(rescaled).map(EV::Long).map_err(|_| overflow())
            } else {
                Ok(EV::Int128(rescaled))
            }
        }
        (PrimitiveType::String, PL::String(v)) => Ok(EV::Slice(v.as_bytes().to_vec())),
        (PrimitiveType::Binary, PL::Binary(v)) => Ok(EV::Slice(v.clone())),
        (PrimitiveType::Date, PL::Int(days)) => Ok(EV::Long(i64::from(*days))),
        (PrimitiveType::Time, PL::Long(micros)) => micros
            .checked_mul(PICOSECONDS_PER_MICROSECOND)
            .map(EV::Long)
            .ok_or_else(overflow),
        (PrimitiveType::Timestamp, PL::Long(micros)) => Ok(EV::Long(*micros)),
        (PrimitiveType::Timestamptz, PL::Long(micros)) => Ok(timestamp_tz_from_micros(*micros)),
        (PrimitiveType::Uuid, PL::Uuid(v)) => Ok(EV::Slice(v.as_bytes().to_vec())),
        (PrimitiveType::Fixed(_), _) => {
            Err(ConversionError::UnsupportedType(primitive.to_string()))
        }
        (
            PrimitiveType::Boolean
            | PrimitiveType::Int
            | PrimitiveType::Long
            | PrimitiveType::Float
            | PrimitiveType::Double
            | PrimitiveType::Decimal { .. }
            | PrimitiveType::String
            | PrimitiveType::Binary
            | PrimitiveType::Date
            | PrimitiveType::Time
            | PrimitiveType::Timestamp
            | PrimitiveType::Timestamptz
            | PrimitiveType::Uuid,
            _,
        ) => Err(mismatch()),
    }
}

/// The sign-extended bit pattern of a float, with every NaN folded into the canonical NaN.
fn float_bits(value: f32) -> i64 {
    let value = if value.is_nan() { f32::NAN } else { value };
    i64::from(value.to_bits() as i32)
}

/// Rescale an unscaled decimal value without rounding.
fn rescale(unscaled: i128, from: u32, to: u32) -> Option<i128> {
    if to >= from {
        10i128
            .checked_pow(to - from)
            .and_then(|factor| unscaled.checked_mul(factor))
    } else {
        let factor = 10i128.checked_pow(from - to)?;
        if unscaled % factor != 0 {
            return None;
        }
        Some(unscaled / factor)
    }
}

fn fits_precision(unscaled: i128, precision: u32) -> bool {
    match 10i128.checked_pow(precision) {
        Some(limit) => unscaled.checked_abs().is_some_and(|v| v < limit),
        // every i128 value has fewer than 39 digits
        None => true,
    }
}

fn timestamp_tz_from_micros(micros: i64) -> EngineValue {
    let epoch_millis = micros.div_euclid(MICROSECONDS_PER_MILLISECOND);
    let micros_of_milli = micros.rem_euclid(MICROSECONDS_PER_MILLISECOND);
    // at most 999 * 10^6, which fits in `i32`
    let picos_of_milli = (micros_of_milli * PICOSECONDS_PER_MICROSECOND) as i32;
    EngineValue::TimestampWithTimeZone {
        epoch_millis,
        picos_of_milli,
        zone: Tz::UTC,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use ordered_float::OrderedFloat;
    use uuid::Uuid;

    use super::*;
    use crate::spec::types::{ListType, NestedField, StructType};

    fn convert(p: PrimitiveType, value: PrimitiveLiteral) -> ConversionResult<EngineValue> {
        convert_iceberg_value(&Type::Primitive(p), Some(&value)).map(|v| v.unwrap())
    }

    fn decimal(precision: u32, scale: u32) -> PrimitiveType {
        PrimitiveType::Decimal { precision, scale }
    }

    #[test]
    fn test_null_passes_through() {
        assert_eq!(
            convert_iceberg_value(&Type::Primitive(PrimitiveType::Long), None).unwrap(),
            None
        );
        let list = Type::List(ListType::new(2, PrimitiveType::Int.into(), true));
        assert_eq!(convert_iceberg_value(&list, None).unwrap(), None);
    }

    #[test]
    fn test_scalar_conversions() {
        assert_eq!(
            convert(PrimitiveType::Boolean, PrimitiveLiteral::Boolean(true)).unwrap(),
            EngineValue::Boolean(true)
        );
        assert_eq!(
            convert(PrimitiveType::Int, PrimitiveLiteral::Int(-7)).unwrap(),
            EngineValue::Long(-7)
        );
        assert_eq!(
            convert(PrimitiveType::Long, PrimitiveLiteral::Long(1 << 40)).unwrap(),
            EngineValue::Long(1 << 40)
        );
        assert_eq!(
            convert(PrimitiveType::Float, PrimitiveLiteral::Float(OrderedFloat(1.5))).unwrap(),
            EngineValue::Long(i64::from(1.5f32.to_bits() as i32))
        );
        assert_eq!(
            convert(PrimitiveType::Float, PrimitiveLiteral::Float(OrderedFloat(-2.0))).unwrap(),
            EngineValue::Long(i64::from((-2.0f32).to_bits() as i32))
        );
        assert_eq!(
            convert(PrimitiveType::Double, PrimitiveLiteral::Double(OrderedFloat(2.25))).unwrap(),
            EngineValue::Double(2.25)
        );
        assert_eq!(
            convert(PrimitiveType::String, PrimitiveLiteral::String("héllo".to_string())).unwrap(),
            EngineValue::Slice("héllo".as_bytes().to_vec())
        );
        assert_eq!(
            convert(PrimitiveType::Binary, PrimitiveLiteral::Binary(vec![0, 1, 255])).unwrap(),
            EngineValue::Slice(vec![0, 1, 255])
        );
    }

    #[test]
    fn test_float_nan_is_canonical() {
        let payload = f32::from_bits(0x7fc0_0001);
        let negative = f32::from_bits(0xffc0_0000);
        for nan in [f32::NAN, payload, negative] {
            assert_eq!(
                convert(PrimitiveType::Float, PrimitiveLiteral::Float(OrderedFloat(nan))).unwrap(),
                EngineValue::Long(0x7fc0_0000)
            );
        }
    }

    #[test]
    fn test_decimal_conversions() {
        // 12.3 stored with scale 1 becomes 12.300 for decimal(10, 3)
        assert_eq!(
            convert(
                decimal(10, 3),
                PrimitiveLiteral::Decimal {
                    unscaled: 123,
                    scale: 1
                }
            )
            .unwrap(),
            EngineValue::Long(12300)
        );
        assert_eq!(
            convert(
                decimal(20, 2),
                PrimitiveLiteral::Decimal {
                    unscaled: -12345,
                    scale: 2
                }
            )
            .unwrap(),
            EngineValue::Int128(-12345)
        );
        assert_eq!(
            convert(
                decimal(5, 1),
                PrimitiveLiteral::Decimal {
                    unscaled: 1230,
                    scale: 2
                }
            )
            .unwrap(),
            EngineValue::Long(123)
        );
        assert!(matches!(
            convert(
                decimal(5, 1),
                PrimitiveLiteral::Decimal {
                    unscaled: 1234,
                    scale: 2
                }
            ),
            Err(ConversionError::InexactRescale { .. })
        ));
        assert!(matches!(
            convert(
                decimal(3, 0),
                PrimitiveLiteral::Decimal {
                    unscaled: 1000,
                    scale: 0
                }
            ),
            Err(ConversionError::Overflow { .. })
        ));
    }

    #[test]
    fn test_temporal_conversions() {
        assert_eq!(
            convert(PrimitiveType::Date, PrimitiveLiteral::Int(19000)).unwrap(),
            EngineValue::Long(19000)
        );
        assert_eq!(
            convert(PrimitiveType::Time, PrimitiveLiteral::Long(3_600_000_000)).unwrap(),
            EngineValue::Long(3_600_000_000_000_000)
        );
        assert!(matches!(
            convert(PrimitiveType::Time, PrimitiveLiteral::Long(i64::MAX)),
            Err(ConversionError::Overflow { .. })
        ));
        assert_eq!(
            convert(PrimitiveType::Timestamp, PrimitiveLiteral::Long(1_234_567)).unwrap(),
            EngineValue::Long(1_234_567)
        );
        assert_eq!(
            convert(PrimitiveType::Timestamptz, PrimitiveLiteral::Long(1_234_567)).unwrap(),
            EngineValue::TimestampWithTimeZone {
                epoch_millis: 1_234,
                picos_of_milli: 567_000_000,
                zone: Tz::UTC,
            }
        );
        assert_eq!(
            convert(PrimitiveType::Timestamptz, PrimitiveLiteral::Long(-1)).unwrap(),
            EngineValue::TimestampWithTimeZone {
                epoch_millis: -1,
                picos_of_milli: 999_000_000,
                zone: Tz::UTC,
            }
        );
    }

    #[test]
    fn test_uuid_conversion() {
        let uuid = Uuid::parse_str("a1a2a3a4-b1b2-c1c2-d1d2-d3d4d5d6d7d8").unwrap();
        assert_eq!(
            convert(PrimitiveType::Uuid, PrimitiveLiteral::Uuid(uuid)).unwrap(),
            EngineValue::Slice(vec![
                0xa1, 0xa2, 0xa3, 0xa4, 0xb1, 0xb2, 0xc1, 0xc2, 0xd1, 0xd2, 0xd3, 0xd4, 0xd5,
                0xd6, 0xd7, 0xd8
            ])
        );
    }

    #[test]
    fn test_unsupported_types() {
        let list = Type::List(ListType::new(2, PrimitiveType::Int.into(), true));
        assert_eq!(
            convert_iceberg_value(&list, Some(&PrimitiveLiteral::Int(1)))
                .unwrap_err()
                .to_string(),
            "Unsupported iceberg type: list<int>"
        );
        let r#struct = Type::Struct(StructType::new(vec![Arc::new(NestedField::required(
            3,
            "a",
            PrimitiveType::Int.into(),
        ))]));
        assert!(matches!(
            convert_iceberg_value(&r#struct, Some(&PrimitiveLiteral::Int(1))),
            Err(ConversionError::UnsupportedType(_))
        ));
        assert_eq!(
            convert(PrimitiveType::Fixed(4), PrimitiveLiteral::Binary(vec![1, 2, 3, 4])),
            Err(ConversionError::UnsupportedType("fixed[4]".to_string()))
        );
    }

    #[test]
    fn test_value_type_mismatch() {
        assert_eq!(
            convert(PrimitiveType::Long, PrimitiveLiteral::String("x".to_string()))
                .unwrap_err()
                .to_string(),
            "Value 'x' does not match iceberg type long"
        );
    }
}
