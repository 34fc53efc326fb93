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

use ordered_float::OrderedFloat;
use uuid::Uuid;

/// A primitive value as stored in table metadata, e.g. a partition value
/// or a column lower/upper bound.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrimitiveLiteral {
    Boolean(bool),
    /// Also used for dates, as days from 1970-01-01.
    Int(i32),
    /// Also used for times and timestamps, in microseconds.
    Long(i64),
    Float(OrderedFloat<f32>),
    Double(OrderedFloat<f64>),
    /// Unscaled value together with its scale.
    Decimal {
        unscaled: i128,
        scale: u32,
    },
    String(String),
    Binary(Vec<u8>),
    Uuid(Uuid),
}

impl Display for PrimitiveLiteral {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PrimitiveLiteral::Boolean(v) => write!(f, "{v}"),
            PrimitiveLiteral::Int(v) => write!(f, "{v}"),
            PrimitiveLiteral::Long(v) => write!(f, "{v}"),
            PrimitiveLiteral::Float(v) => write!(f, "{}", v.0),
            PrimitiveLiteral::Double(v) => write!(f, "{}", v.0),
            PrimitiveLiteral::Decimal { unscaled, scale } => {
                write!(f, "{unscaled}E-{scale}")
            }
            PrimitiveLiteral::String(v) => write!(f, "'{v}'"),
            PrimitiveLiteral::Binary(v) => {
                write!(f, "0x")?;
                for b in v {
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
            PrimitiveLiteral::Uuid(v) => write!(f, "{v}"),
        }
    }
}
