// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Annotation records and their tagged argument values.

use crate::codec::{required, Decode, Encode, Reader, Writer};
use crate::error::CorruptionError;
use crate::tables::NameTables;

/// Wire tags for [`ValueRecord`] variants.
pub mod value_tag {
    /// Signed integer.
    pub const INT: u64 = 0;
    /// IEEE-754 double.
    pub const FLOAT: u64 = 1;
    /// Boolean.
    pub const BOOLEAN: u64 = 2;
    /// String-table reference.
    pub const STRING: u64 = 3;
    /// Class literal (qualified-name reference).
    pub const CLASS: u64 = 4;
    /// Enum entry (class qualified name + entry string).
    pub const ENUM: u64 = 5;
    /// Nested annotation.
    pub const ANNOTATION: u64 = 6;
    /// Array of values.
    pub const ARRAY: u64 = 7;
}

/// One annotation instance: its class plus named constructor arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationRecord {
    /// Qualified-name index of the annotation class.
    pub id: u32,
    /// Arguments, ordered by name.
    pub arguments: Vec<ArgumentRecord>,
}

/// A named annotation argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentRecord {
    /// String index of the parameter name.
    pub name_id: u32,
    /// Encoded argument value.
    pub value: ValueRecord,
}

/// Closed set of encodable annotation argument values.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueRecord {
    /// Integer of any width.
    Int(i64),
    /// Floating-point of any width.
    Float(f64),
    /// Boolean.
    Boolean(bool),
    /// String-table index.
    String(u32),
    /// Qualified-name index of the referenced class.
    Class(u32),
    /// Enum entry.
    Enum {
        /// Qualified-name index of the enum class.
        class_id: u32,
        /// String index of the entry name.
        entry_id: u32,
    },
    /// Nested annotation.
    Annotation(AnnotationRecord),
    /// Array of values.
    Array(Vec<ValueRecord>),
}

impl ValueRecord {
    /// Wire tag for this variant.
    pub const fn tag(&self) -> u64 {
        match self {
            Self::Int(_) => value_tag::INT,
            Self::Float(_) => value_tag::FLOAT,
            Self::Boolean(_) => value_tag::BOOLEAN,
            Self::String(_) => value_tag::STRING,
            Self::Class(_) => value_tag::CLASS,
            Self::Enum { .. } => value_tag::ENUM,
            Self::Annotation(_) => value_tag::ANNOTATION,
            Self::Array(_) => value_tag::ARRAY,
        }
    }
}

impl Encode for AnnotationRecord {
    fn encode(&self, writer: &mut Writer) {
        writer.uint_field(1, u64::from(self.id));
        writer.repeated_message_field(2, &self.arguments);
    }
}

impl Decode for AnnotationRecord {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CorruptionError> {
        let mut id = None;
        let mut arguments = Vec::new();
        while let Some((field, wire)) = reader.next_field()? {
            match field {
                1 => id = Some(reader.read_u32(field, wire)?),
                2 => arguments.push(reader.read_message(field, wire)?),
                _ => reader.skip(wire)?,
            }
        }
        Ok(Self {
            id: required(id, "annotation.id")?,
            arguments,
        })
    }
}

impl Encode for ArgumentRecord {
    fn encode(&self, writer: &mut Writer) {
        writer.uint_field(1, u64::from(self.name_id));
        writer.message_field(2, &self.value);
    }
}

impl Decode for ArgumentRecord {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CorruptionError> {
        let mut name_id = None;
        let mut value = None;
        while let Some((field, wire)) = reader.next_field()? {
            match field {
                1 => name_id = Some(reader.read_u32(field, wire)?),
                2 => value = Some(reader.read_message(field, wire)?),
                _ => reader.skip(wire)?,
            }
        }
        Ok(Self {
            name_id: required(name_id, "argument.name")?,
            value: required(value, "argument.value")?,
        })
    }
}

impl Encode for ValueRecord {
    fn encode(&self, writer: &mut Writer) {
        writer.uint_field(1, self.tag());
        match self {
            Self::Int(v) => writer.sint_field(2, *v),
            Self::Float(v) => writer.double_field(3, *v),
            Self::Boolean(v) => writer.sint_field(2, i64::from(*v)),
            Self::String(id) => writer.uint_field(4, u64::from(*id)),
            Self::Class(id) => writer.uint_field(5, u64::from(*id)),
            Self::Enum { class_id, entry_id } => {
                writer.uint_field(5, u64::from(*class_id));
                writer.uint_field(6, u64::from(*entry_id));
            }
            Self::Annotation(annotation) => writer.message_field(7, annotation),
            Self::Array(elements) => writer.repeated_message_field(8, elements),
        }
    }
}

#[derive(Default)]
struct ValueFields {
    tag: Option<u64>,
    int_value: Option<i64>,
    float_value: Option<f64>,
    string_value: Option<u32>,
    class_id: Option<u32>,
    enum_value_id: Option<u32>,
    annotation: Option<AnnotationRecord>,
    array_elements: Vec<ValueRecord>,
}

impl Decode for ValueRecord {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CorruptionError> {
        let mut f = ValueFields::default();
        while let Some((field, wire)) = reader.next_field()? {
            match field {
                1 => f.tag = Some(reader.read_uint(field, wire)?),
                2 => f.int_value = Some(reader.read_sint(field, wire)?),
                3 => f.float_value = Some(reader.read_double(field, wire)?),
                4 => f.string_value = Some(reader.read_u32(field, wire)?),
                5 => f.class_id = Some(reader.read_u32(field, wire)?),
                6 => f.enum_value_id = Some(reader.read_u32(field, wire)?),
                7 => f.annotation = Some(reader.read_message(field, wire)?),
                8 => f.array_elements.push(reader.read_message(field, wire)?),
                _ => reader.skip(wire)?,
            }
        }
        match required(f.tag, "value.tag")? {
            value_tag::INT => Ok(Self::Int(required(f.int_value, "value.int_value")?)),
            value_tag::FLOAT => Ok(Self::Float(required(f.float_value, "value.float_value")?)),
            value_tag::BOOLEAN => Ok(Self::Boolean(required(f.int_value, "value.int_value")? != 0)),
            value_tag::STRING => Ok(Self::String(required(f.string_value, "value.string_value")?)),
            value_tag::CLASS => Ok(Self::Class(required(f.class_id, "value.class_id")?)),
            value_tag::ENUM => Ok(Self::Enum {
                class_id: required(f.class_id, "value.class_id")?,
                entry_id: required(f.enum_value_id, "value.enum_value_id")?,
            }),
            value_tag::ANNOTATION => Ok(Self::Annotation(required(f.annotation, "value.annotation")?)),
            value_tag::ARRAY => Ok(Self::Array(f.array_elements)),
            unknown => Err(CorruptionError::UnknownValueTag(unknown)),
        }
    }
}

impl AnnotationRecord {
    /// Check every index reachable from this annotation against `tables`.
    pub fn validate(&self, tables: &NameTables<'_>) -> Result<(), CorruptionError> {
        tables.check_name(self.id)?;
        for argument in &self.arguments {
            tables.check_string(argument.name_id)?;
            argument.value.validate(tables)?;
        }
        Ok(())
    }
}

impl ValueRecord {
    /// Check every index reachable from this value against `tables`.
    pub fn validate(&self, tables: &NameTables<'_>) -> Result<(), CorruptionError> {
        match self {
            Self::Int(_) | Self::Float(_) | Self::Boolean(_) => Ok(()),
            Self::String(id) => tables.check_string(*id),
            Self::Class(id) => tables.check_name(*id),
            Self::Enum { class_id, entry_id } => {
                tables.check_name(*class_id)?;
                tables.check_string(*entry_id)
            }
            Self::Annotation(annotation) => annotation.validate(tables),
            Self::Array(elements) => elements.iter().try_for_each(|e| e.validate(tables)),
        }
    }
}
