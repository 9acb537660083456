// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Annotation descriptors to records and back.

use jsmeta_proto::{AnnotationRecord, ArgumentRecord, CorruptionError, NameTables, ValueRecord};

use crate::descriptor::{Annotation, ConstValue};
use crate::error::{MetadataError, Result};
use crate::name::FqName;
use crate::string_table::StringTable;

/// Encodes annotations against a [`StringTable`], bounding argument nesting.
#[derive(Debug, Clone, Copy)]
pub struct AnnotationEncoder {
    max_depth: usize,
}

impl AnnotationEncoder {
    /// Encoder that rejects values nested deeper than `max_depth`.
    pub const fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Encode one annotation. Arguments come out ordered by name.
    pub fn encode(&self, annotation: &Annotation, strings: &mut StringTable) -> Result<AnnotationRecord> {
        self.annotation_record(annotation, strings, 0).map_err(|exceeded| match exceeded {
            MetadataError::AnnotationTooDeep { limit, .. } => MetadataError::AnnotationTooDeep {
                annotation: annotation.class.to_string(),
                limit,
            },
            other => other,
        })
    }

    /// Encode every annotation that survives into metadata, in input order.
    pub fn encode_retained(
        &self,
        annotations: &[Annotation],
        strings: &mut StringTable,
    ) -> Result<Vec<AnnotationRecord>> {
        annotations
            .iter()
            .filter(|a| !a.is_source_only())
            .map(|a| self.encode(a, strings))
            .collect()
    }

    fn annotation_record(
        &self,
        annotation: &Annotation,
        strings: &mut StringTable,
        depth: usize,
    ) -> Result<AnnotationRecord> {
        let id = strings.fq_name_index(&annotation.class);
        let arguments = annotation
            .arguments
            .iter()
            .map(|(name, value)| {
                Ok(ArgumentRecord {
                    name_id: strings.intern(name),
                    value: self.value_record(value, strings, depth + 1)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(AnnotationRecord { id, arguments })
    }

    fn value_record(&self, value: &ConstValue, strings: &mut StringTable, depth: usize) -> Result<ValueRecord> {
        if depth > self.max_depth {
            return Err(MetadataError::AnnotationTooDeep {
                annotation: String::new(),
                limit: self.max_depth,
            });
        }
        Ok(match value {
            ConstValue::Int(v) => ValueRecord::Int(*v),
            ConstValue::Float(v) => ValueRecord::Float(*v),
            ConstValue::Boolean(v) => ValueRecord::Boolean(*v),
            ConstValue::String(s) => ValueRecord::String(strings.intern(s)),
            ConstValue::Class(class) => ValueRecord::Class(strings.fq_name_index(class)),
            ConstValue::Enum { class, entry } => ValueRecord::Enum {
                class_id: strings.fq_name_index(class),
                entry_id: strings.intern(entry),
            },
            ConstValue::Annotation(nested) => {
                ValueRecord::Annotation(self.annotation_record(nested, strings, depth)?)
            }
            ConstValue::Array(elements) => ValueRecord::Array(
                elements
                    .iter()
                    .map(|e| self.value_record(e, strings, depth + 1))
                    .collect::<Result<Vec<_>>>()?,
            ),
        })
    }
}

/// Rebuild an annotation descriptor from a decoded record.
///
/// Retention is not on the wire; decoded annotations read as
/// [`Retention::Binary`](crate::descriptor::Retention::Binary).
pub fn decode_annotation(
    record: &AnnotationRecord,
    tables: &NameTables<'_>,
) -> std::result::Result<Annotation, CorruptionError> {
    let mut annotation = Annotation::new(FqName::new(tables.dotted_name(record.id)?));
    for argument in &record.arguments {
        let name = tables.string(argument.name_id)?;
        annotation
            .arguments
            .insert(name.to_owned(), decode_value(&argument.value, tables)?);
    }
    Ok(annotation)
}

fn decode_value(
    value: &ValueRecord,
    tables: &NameTables<'_>,
) -> std::result::Result<ConstValue, CorruptionError> {
    Ok(match value {
        ValueRecord::Int(v) => ConstValue::Int(*v),
        ValueRecord::Float(v) => ConstValue::Float(*v),
        ValueRecord::Boolean(v) => ConstValue::Boolean(*v),
        ValueRecord::String(id) => ConstValue::String(tables.string(*id)?.to_owned()),
        ValueRecord::Class(id) => ConstValue::Class(FqName::new(tables.dotted_name(*id)?)),
        ValueRecord::Enum { class_id, entry_id } => ConstValue::Enum {
            class: FqName::new(tables.dotted_name(*class_id)?),
            entry: tables.string(*entry_id)?.to_owned(),
        },
        ValueRecord::Annotation(nested) => {
            ConstValue::Annotation(Box::new(decode_annotation(nested, tables)?))
        }
        ValueRecord::Array(elements) => ConstValue::Array(
            elements
                .iter()
                .map(|e| decode_value(e, tables))
                .collect::<std::result::Result<Vec<_>, _>>()?,
        ),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::descriptor::Retention;

    fn experimental_error() -> Annotation {
        Annotation::new("lib.Experimental").with_argument(
            "level",
            ConstValue::Enum {
                class: FqName::new("lib.Experimental.Level"),
                entry: "ERROR".into(),
            },
        )
    }

    #[test]
    fn encode_then_decode_restores_the_descriptor() {
        let annotation = experimental_error()
            .with_argument("since", ConstValue::String("1.4".into()))
            .with_argument(
                "tags",
                ConstValue::Array(vec![ConstValue::Int(-1), ConstValue::Boolean(true)]),
            )
            .with_argument(
                "nested",
                ConstValue::Annotation(Box::new(Annotation::new("lib.Marker"))),
            );
        let mut strings = StringTable::new();
        let record = AnnotationEncoder::new(8).encode(&annotation, &mut strings).unwrap();
        let (s, n) = strings.into_records();
        let back = decode_annotation(&record, &NameTables::new(&s, &n)).unwrap();
        assert_eq!(back, annotation);
    }

    #[test]
    fn arguments_are_ordered_by_name() {
        let annotation = Annotation::new("x.A")
            .with_argument("zeta", ConstValue::Int(1))
            .with_argument("alpha", ConstValue::Int(2));
        let mut strings = StringTable::new();
        let record = AnnotationEncoder::new(8).encode(&annotation, &mut strings).unwrap();
        let (s, _) = strings.into_records();
        let names: Vec<&str> = record
            .arguments
            .iter()
            .map(|a| s.strings[a.name_id as usize].as_str())
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn nesting_beyond_the_limit_fails_fast() {
        let mut value = ConstValue::Int(0);
        for _ in 0..5 {
            value = ConstValue::Array(vec![value]);
        }
        let annotation = Annotation::new("x.Deep").with_argument("v", value);
        let mut strings = StringTable::new();
        let err = AnnotationEncoder::new(3).encode(&annotation, &mut strings).unwrap_err();
        assert!(matches!(
            err,
            MetadataError::AnnotationTooDeep { ref annotation, limit: 3 } if annotation == "x.Deep"
        ));
        assert!(AnnotationEncoder::new(6).encode(&annotation, &mut strings).is_ok());
    }

    #[test]
    fn source_only_annotations_are_not_retained() {
        let annotations = vec![
            Annotation::new("x.Suppress").with_retention(Retention::Source),
            experimental_error(),
        ];
        let mut strings = StringTable::new();
        let records = AnnotationEncoder::new(8)
            .encode_retained(&annotations, &mut strings)
            .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn dangling_argument_name_is_corruption() {
        let record = AnnotationRecord {
            id: 0,
            arguments: vec![ArgumentRecord {
                name_id: 9,
                value: ValueRecord::Int(1),
            }],
        };
        let mut strings = StringTable::new();
        strings.fq_name_index(&FqName::new("x.A"));
        let (s, n) = strings.into_records();
        let err = decode_annotation(&record, &NameTables::new(&s, &n)).unwrap_err();
        assert!(matches!(err, CorruptionError::StringIndexOutOfRange { index: 9, .. }));
    }
}
