// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Class, member and package-part records.

use crate::annotation::AnnotationRecord;
use crate::codec::{required, Decode, Encode, Reader, Writer};
use crate::error::CorruptionError;
use crate::tables::NameTables;

/// Declaration modifier bits shared by classes and members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DeclarationFlags(pub u32);

impl DeclarationFlags {
    /// `expect` declaration.
    pub const EXPECT: u32 = 1 << 0;
    /// `external` declaration.
    pub const EXTERNAL: u32 = 1 << 1;
    /// Mutable property.
    pub const VAR: u32 = 1 << 2;
    /// Compile-time constant property.
    pub const CONST: u32 = 1 << 3;
    /// Inline function.
    pub const INLINE: u32 = 1 << 4;
    /// Suspending function.
    pub const SUSPEND: u32 = 1 << 5;
    /// Data class.
    pub const DATA: u32 = 1 << 6;
    /// Inner class.
    pub const INNER: u32 = 1 << 7;

    /// Return a copy with `bit` set when `on` holds.
    #[must_use]
    pub const fn with(self, bit: u32, on: bool) -> Self {
        if on {
            Self(self.0 | bit)
        } else {
            self
        }
    }

    /// Check a single bit.
    pub const fn has(self, bit: u32) -> bool {
        self.0 & bit != 0
    }
}

/// Kind of a serialized class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ClassKindRecord {
    /// Ordinary class.
    #[default]
    Class,
    /// Interface.
    Interface,
    /// Enum class.
    EnumClass,
    /// Enum entry with a body.
    EnumEntry,
    /// Annotation class.
    AnnotationClass,
    /// Object declaration.
    Object,
    /// Companion object.
    CompanionObject,
}

impl ClassKindRecord {
    /// Raw wire value.
    pub const fn to_wire(self) -> u64 {
        match self {
            Self::Class => 0,
            Self::Interface => 1,
            Self::EnumClass => 2,
            Self::EnumEntry => 3,
            Self::AnnotationClass => 4,
            Self::Object => 5,
            Self::CompanionObject => 6,
        }
    }

    /// Parse a raw wire value.
    pub fn from_wire(value: u64) -> Result<Self, CorruptionError> {
        Ok(match value {
            0 => Self::Class,
            1 => Self::Interface,
            2 => Self::EnumClass,
            3 => Self::EnumEntry,
            4 => Self::AnnotationClass,
            5 => Self::Object,
            6 => Self::CompanionObject,
            other => {
                return Err(CorruptionError::InvalidEnum {
                    name: "class.kind",
                    value: other,
                })
            }
        })
    }
}

/// Reference to a type: a classifier plus type arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeRecord {
    /// Qualified-name index of the classifier.
    pub class_name: u32,
    /// Nullable type.
    pub nullable: bool,
    /// Type arguments, in declaration order.
    pub arguments: Vec<TypeRecord>,
}

/// Named function parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueParameterRecord {
    /// String index of the parameter name.
    pub name: u32,
    /// Parameter type.
    pub ty: TypeRecord,
}

/// Function declaration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionRecord {
    /// Modifier bits.
    pub flags: DeclarationFlags,
    /// String index of the simple name.
    pub name: u32,
    /// Parameters in declaration order.
    pub value_parameters: Vec<ValueParameterRecord>,
    /// Return type.
    pub return_type: TypeRecord,
    /// Binary-retained annotations.
    pub annotations: Vec<AnnotationRecord>,
    /// File registry id of the declaring file.
    pub containing_file_id: Option<u32>,
}

/// Property declaration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyRecord {
    /// Modifier bits.
    pub flags: DeclarationFlags,
    /// String index of the simple name.
    pub name: u32,
    /// Property type.
    pub return_type: TypeRecord,
    /// Binary-retained annotations.
    pub annotations: Vec<AnnotationRecord>,
    /// File registry id of the declaring file.
    pub containing_file_id: Option<u32>,
}

/// Type alias declaration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeAliasRecord {
    /// Modifier bits.
    pub flags: DeclarationFlags,
    /// String index of the simple name.
    pub name: u32,
    /// Type the alias expands to.
    pub expanded_type: TypeRecord,
    /// Binary-retained annotations.
    pub annotations: Vec<AnnotationRecord>,
}

/// Class declaration (nested classes are separate records).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassRecord {
    /// Modifier bits.
    pub flags: DeclarationFlags,
    /// Qualified-name index of the class.
    pub fq_name: u32,
    /// Class kind.
    pub kind: ClassKindRecord,
    /// Qualified-name indices of direct supertypes.
    pub supertypes: Vec<u32>,
    /// String indices of nested class simple names.
    pub nested_class_names: Vec<u32>,
    /// Member functions.
    pub functions: Vec<FunctionRecord>,
    /// Member properties.
    pub properties: Vec<PropertyRecord>,
    /// Member type aliases.
    pub type_aliases: Vec<TypeAliasRecord>,
    /// Binary-retained annotations.
    pub annotations: Vec<AnnotationRecord>,
    /// File registry id of the declaring file.
    pub containing_file_id: Option<u32>,
}

/// Top-level members of one package.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageRecord {
    /// Top-level functions.
    pub functions: Vec<FunctionRecord>,
    /// Top-level properties.
    pub properties: Vec<PropertyRecord>,
    /// Top-level type aliases.
    pub type_aliases: Vec<TypeAliasRecord>,
    /// Qualified-name index of the package.
    pub package_fq_name: Option<u32>,
}

impl PackageRecord {
    /// True when the package part carries no members.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.properties.is_empty() && self.type_aliases.is_empty()
    }
}

impl Encode for TypeRecord {
    fn encode(&self, writer: &mut Writer) {
        writer.uint_field(1, u64::from(self.class_name));
        writer.bool_field(2, self.nullable);
        writer.repeated_message_field(3, &self.arguments);
    }
}

impl Decode for TypeRecord {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CorruptionError> {
        let mut class_name = None;
        let mut out = Self::default();
        while let Some((field, wire)) = reader.next_field()? {
            match field {
                1 => class_name = Some(reader.read_u32(field, wire)?),
                2 => out.nullable = reader.read_bool(field, wire)?,
                3 => out.arguments.push(reader.read_message(field, wire)?),
                _ => reader.skip(wire)?,
            }
        }
        out.class_name = required(class_name, "type.class_name")?;
        Ok(out)
    }
}

impl Encode for ValueParameterRecord {
    fn encode(&self, writer: &mut Writer) {
        writer.uint_field(1, u64::from(self.name));
        writer.message_field(2, &self.ty);
    }
}

impl Decode for ValueParameterRecord {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CorruptionError> {
        let mut name = None;
        let mut ty = None;
        while let Some((field, wire)) = reader.next_field()? {
            match field {
                1 => name = Some(reader.read_u32(field, wire)?),
                2 => ty = Some(reader.read_message(field, wire)?),
                _ => reader.skip(wire)?,
            }
        }
        Ok(Self {
            name: required(name, "value_parameter.name")?,
            ty: required(ty, "value_parameter.type")?,
        })
    }
}

impl Encode for FunctionRecord {
    fn encode(&self, writer: &mut Writer) {
        writer.uint_field(1, u64::from(self.flags.0));
        writer.uint_field(2, u64::from(self.name));
        writer.repeated_message_field(3, &self.value_parameters);
        writer.message_field(4, &self.return_type);
        writer.repeated_message_field(5, &self.annotations);
        writer.opt_uint_field(6, self.containing_file_id);
    }
}

impl Decode for FunctionRecord {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CorruptionError> {
        let mut name = None;
        let mut return_type = None;
        let mut out = Self::default();
        while let Some((field, wire)) = reader.next_field()? {
            match field {
                1 => out.flags = DeclarationFlags(reader.read_u32(field, wire)?),
                2 => name = Some(reader.read_u32(field, wire)?),
                3 => out.value_parameters.push(reader.read_message(field, wire)?),
                4 => return_type = Some(reader.read_message(field, wire)?),
                5 => out.annotations.push(reader.read_message(field, wire)?),
                6 => out.containing_file_id = Some(reader.read_u32(field, wire)?),
                _ => reader.skip(wire)?,
            }
        }
        out.name = required(name, "function.name")?;
        out.return_type = required(return_type, "function.return_type")?;
        Ok(out)
    }
}

impl Encode for PropertyRecord {
    fn encode(&self, writer: &mut Writer) {
        writer.uint_field(1, u64::from(self.flags.0));
        writer.uint_field(2, u64::from(self.name));
        writer.message_field(3, &self.return_type);
        writer.repeated_message_field(4, &self.annotations);
        writer.opt_uint_field(5, self.containing_file_id);
    }
}

impl Decode for PropertyRecord {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CorruptionError> {
        let mut name = None;
        let mut return_type = None;
        let mut out = Self::default();
        while let Some((field, wire)) = reader.next_field()? {
            match field {
                1 => out.flags = DeclarationFlags(reader.read_u32(field, wire)?),
                2 => name = Some(reader.read_u32(field, wire)?),
                3 => return_type = Some(reader.read_message(field, wire)?),
                4 => out.annotations.push(reader.read_message(field, wire)?),
                5 => out.containing_file_id = Some(reader.read_u32(field, wire)?),
                _ => reader.skip(wire)?,
            }
        }
        out.name = required(name, "property.name")?;
        out.return_type = required(return_type, "property.return_type")?;
        Ok(out)
    }
}

impl Encode for TypeAliasRecord {
    fn encode(&self, writer: &mut Writer) {
        writer.uint_field(1, u64::from(self.flags.0));
        writer.uint_field(2, u64::from(self.name));
        writer.message_field(3, &self.expanded_type);
        writer.repeated_message_field(4, &self.annotations);
    }
}

impl Decode for TypeAliasRecord {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CorruptionError> {
        let mut name = None;
        let mut expanded_type = None;
        let mut out = Self::default();
        while let Some((field, wire)) = reader.next_field()? {
            match field {
                1 => out.flags = DeclarationFlags(reader.read_u32(field, wire)?),
                2 => name = Some(reader.read_u32(field, wire)?),
                3 => expanded_type = Some(reader.read_message(field, wire)?),
                4 => out.annotations.push(reader.read_message(field, wire)?),
                _ => reader.skip(wire)?,
            }
        }
        out.name = required(name, "type_alias.name")?;
        out.expanded_type = required(expanded_type, "type_alias.expanded_type")?;
        Ok(out)
    }
}

impl Encode for ClassRecord {
    fn encode(&self, writer: &mut Writer) {
        writer.uint_field(1, u64::from(self.flags.0));
        writer.uint_field(2, u64::from(self.fq_name));
        writer.uint_field(3, self.kind.to_wire());
        for supertype in &self.supertypes {
            writer.uint_field(4, u64::from(*supertype));
        }
        for nested in &self.nested_class_names {
            writer.uint_field(5, u64::from(*nested));
        }
        writer.repeated_message_field(6, &self.functions);
        writer.repeated_message_field(7, &self.properties);
        writer.repeated_message_field(8, &self.type_aliases);
        writer.repeated_message_field(9, &self.annotations);
        writer.opt_uint_field(10, self.containing_file_id);
    }
}

impl Decode for ClassRecord {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CorruptionError> {
        let mut fq_name = None;
        let mut out = Self::default();
        while let Some((field, wire)) = reader.next_field()? {
            match field {
                1 => out.flags = DeclarationFlags(reader.read_u32(field, wire)?),
                2 => fq_name = Some(reader.read_u32(field, wire)?),
                3 => out.kind = ClassKindRecord::from_wire(reader.read_uint(field, wire)?)?,
                4 => out.supertypes.push(reader.read_u32(field, wire)?),
                5 => out.nested_class_names.push(reader.read_u32(field, wire)?),
                6 => out.functions.push(reader.read_message(field, wire)?),
                7 => out.properties.push(reader.read_message(field, wire)?),
                8 => out.type_aliases.push(reader.read_message(field, wire)?),
                9 => out.annotations.push(reader.read_message(field, wire)?),
                10 => out.containing_file_id = Some(reader.read_u32(field, wire)?),
                _ => reader.skip(wire)?,
            }
        }
        out.fq_name = required(fq_name, "class.fq_name")?;
        Ok(out)
    }
}

impl Encode for PackageRecord {
    fn encode(&self, writer: &mut Writer) {
        writer.repeated_message_field(1, &self.functions);
        writer.repeated_message_field(2, &self.properties);
        writer.repeated_message_field(3, &self.type_aliases);
        writer.opt_uint_field(4, self.package_fq_name);
    }
}

impl Decode for PackageRecord {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CorruptionError> {
        let mut out = Self::default();
        while let Some((field, wire)) = reader.next_field()? {
            match field {
                1 => out.functions.push(reader.read_message(field, wire)?),
                2 => out.properties.push(reader.read_message(field, wire)?),
                3 => out.type_aliases.push(reader.read_message(field, wire)?),
                4 => out.package_fq_name = Some(reader.read_u32(field, wire)?),
                _ => reader.skip(wire)?,
            }
        }
        Ok(out)
    }
}

fn validate_annotations(
    annotations: &[AnnotationRecord],
    tables: &NameTables<'_>,
) -> Result<(), CorruptionError> {
    annotations.iter().try_for_each(|a| a.validate(tables))
}

impl TypeRecord {
    /// Check every index reachable from this type against `tables`.
    pub fn validate(&self, tables: &NameTables<'_>) -> Result<(), CorruptionError> {
        let mut pending = vec![self];
        while let Some(ty) = pending.pop() {
            tables.check_name(ty.class_name)?;
            pending.extend(ty.arguments.iter());
        }
        Ok(())
    }
}

impl FunctionRecord {
    /// Check every index reachable from this function against `tables`.
    pub fn validate(&self, tables: &NameTables<'_>) -> Result<(), CorruptionError> {
        tables.check_string(self.name)?;
        for parameter in &self.value_parameters {
            tables.check_string(parameter.name)?;
            parameter.ty.validate(tables)?;
        }
        self.return_type.validate(tables)?;
        validate_annotations(&self.annotations, tables)
    }
}

impl PropertyRecord {
    /// Check every index reachable from this property against `tables`.
    pub fn validate(&self, tables: &NameTables<'_>) -> Result<(), CorruptionError> {
        tables.check_string(self.name)?;
        self.return_type.validate(tables)?;
        validate_annotations(&self.annotations, tables)
    }
}

impl TypeAliasRecord {
    /// Check every index reachable from this alias against `tables`.
    pub fn validate(&self, tables: &NameTables<'_>) -> Result<(), CorruptionError> {
        tables.check_string(self.name)?;
        self.expanded_type.validate(tables)?;
        validate_annotations(&self.annotations, tables)
    }
}

impl ClassRecord {
    /// Check every index reachable from this class against `tables`.
    pub fn validate(&self, tables: &NameTables<'_>) -> Result<(), CorruptionError> {
        tables.check_name(self.fq_name)?;
        self.supertypes.iter().try_for_each(|s| tables.check_name(*s))?;
        self.nested_class_names
            .iter()
            .try_for_each(|n| tables.check_string(*n))?;
        self.functions.iter().try_for_each(|f| f.validate(tables))?;
        self.properties.iter().try_for_each(|p| p.validate(tables))?;
        self.type_aliases.iter().try_for_each(|t| t.validate(tables))?;
        validate_annotations(&self.annotations, tables)
    }
}

impl PackageRecord {
    /// Check every index reachable from this package part against `tables`.
    pub fn validate(&self, tables: &NameTables<'_>) -> Result<(), CorruptionError> {
        if let Some(name) = self.package_fq_name {
            tables.check_name(name)?;
        }
        self.functions.iter().try_for_each(|f| f.validate(tables))?;
        self.properties.iter().try_for_each(|p| p.validate(tables))?;
        self.type_aliases.iter().try_for_each(|t| t.validate(tables))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::codec::{decode_from_bytes, encode_to_vec};

    #[test]
    fn class_record_survives_the_wire() {
        let record = ClassRecord {
            flags: DeclarationFlags::default().with(DeclarationFlags::DATA, true),
            fq_name: 3,
            kind: ClassKindRecord::Object,
            supertypes: vec![1, 2],
            nested_class_names: vec![4],
            functions: vec![FunctionRecord {
                name: 5,
                return_type: TypeRecord {
                    class_name: 1,
                    nullable: true,
                    arguments: vec![TypeRecord::default()],
                },
                containing_file_id: Some(0),
                ..FunctionRecord::default()
            }],
            containing_file_id: Some(1),
            ..ClassRecord::default()
        };
        let back: ClassRecord = decode_from_bytes(&encode_to_vec(&record)).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn unknown_class_kind_is_rejected() {
        let mut w = Writer::default();
        w.uint_field(2, 0);
        w.uint_field(3, 99);
        let err = decode_from_bytes::<ClassRecord>(&w.into_vec()).unwrap_err();
        assert_eq!(
            err,
            CorruptionError::InvalidEnum {
                name: "class.kind",
                value: 99
            }
        );
    }

    #[test]
    fn function_without_name_is_rejected() {
        let mut w = Writer::default();
        w.uint_field(1, 0);
        let err = decode_from_bytes::<FunctionRecord>(&w.into_vec()).unwrap_err();
        assert_eq!(err, CorruptionError::MissingField("function.name"));
    }

    #[test]
    fn flags_compose() {
        let flags = DeclarationFlags::default()
            .with(DeclarationFlags::EXPECT, true)
            .with(DeclarationFlags::VAR, false);
        assert!(flags.has(DeclarationFlags::EXPECT));
        assert!(!flags.has(DeclarationFlags::VAR));
    }
}
