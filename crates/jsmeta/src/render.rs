// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Human-readable dump of a decoded library.

use jsmeta_proto::{
    AnnotationRecord, ClassRecord, CorruptionError, DeclarationFlags, FunctionRecord, NameTables,
    PackageFragmentRecord, PropertyRecord, TypeAliasRecord, TypeRecord,
};

use crate::annotation::decode_annotation;
use crate::container::LibraryParts;
use crate::descriptor::{Annotation, ConstValue};
use crate::header::HeaderInfo;

/// Render `parts` as indented text, resolving every index.
///
/// Output depends only on the input, so dumps can be diffed.
pub fn dump(parts: &LibraryParts) -> Result<String, CorruptionError> {
    let header = HeaderInfo::from_record(&parts.header)?;
    let mut out = Dump::default();
    out.line(0, format!("module kind: {:?}", parts.kind));
    out.line(0, format!("imports: [{}]", parts.imported_modules.join(", ")));
    out.line(0, format!("pre-release: {}", header.pre_release));
    for annotation in &header.experimental_annotations {
        out.line(0, format!("experimental: {annotation}"));
    }
    for fragment in &parts.fragments {
        dump_fragment(&mut out, fragment)?;
    }
    Ok(out.text)
}

#[derive(Default)]
struct Dump {
    text: String,
}

impl Dump {
    fn line(&mut self, indent: usize, text: String) {
        for _ in 0..indent {
            self.text.push_str("  ");
        }
        self.text.push_str(&text);
        self.text.push('\n');
    }
}

fn dump_fragment(out: &mut Dump, fragment: &PackageFragmentRecord) -> Result<(), CorruptionError> {
    let tables = fragment.tables();
    let package = match fragment.package.package_fq_name {
        Some(id) => tables.dotted_name(id)?,
        None => String::new(),
    };
    out.line(0, format!("package {package:?}"));
    for class in &fragment.classes {
        dump_class(out, class, &tables)?;
    }
    for function in &fragment.package.functions {
        dump_function(out, 1, function, &tables)?;
    }
    for property in &fragment.package.properties {
        dump_property(out, 1, property, &tables)?;
    }
    for alias in &fragment.package.type_aliases {
        dump_type_alias(out, 1, alias, &tables)?;
    }
    for (file, id) in fragment.files.files.iter().zip(fragment.files.resolved_ids()) {
        out.line(1, format!("file #{id}"));
        dump_annotations(out, 2, &file.annotations, &tables)?;
    }
    Ok(())
}

fn dump_class(out: &mut Dump, class: &ClassRecord, tables: &NameTables<'_>) -> Result<(), CorruptionError> {
    let supertypes = class
        .supertypes
        .iter()
        .map(|s| tables.dotted_name(*s))
        .collect::<Result<Vec<_>, _>>()?;
    let mut line = format!(
        "{}{:?} {}",
        modifiers(class.flags),
        class.kind,
        tables.dotted_name(class.fq_name)?
    );
    if !supertypes.is_empty() {
        line.push_str(&format!(" : {}", supertypes.join(", ")));
    }
    out.line(1, line);
    dump_annotations(out, 2, &class.annotations, tables)?;
    for nested in &class.nested_class_names {
        out.line(2, format!("nested {}", tables.string(*nested)?));
    }
    for function in &class.functions {
        dump_function(out, 2, function, tables)?;
    }
    for property in &class.properties {
        dump_property(out, 2, property, tables)?;
    }
    for alias in &class.type_aliases {
        dump_type_alias(out, 2, alias, tables)?;
    }
    Ok(())
}

fn dump_function(
    out: &mut Dump,
    indent: usize,
    function: &FunctionRecord,
    tables: &NameTables<'_>,
) -> Result<(), CorruptionError> {
    let parameters = function
        .value_parameters
        .iter()
        .map(|p| Ok(format!("{}: {}", tables.string(p.name)?, type_text(&p.ty, tables)?)))
        .collect::<Result<Vec<_>, CorruptionError>>()?;
    out.line(
        indent,
        format!(
            "{}fun {}({}): {}{}",
            modifiers(function.flags),
            tables.string(function.name)?,
            parameters.join(", "),
            type_text(&function.return_type, tables)?,
            file_suffix(function.containing_file_id)
        ),
    );
    dump_annotations(out, indent + 1, &function.annotations, tables)
}

fn dump_property(
    out: &mut Dump,
    indent: usize,
    property: &PropertyRecord,
    tables: &NameTables<'_>,
) -> Result<(), CorruptionError> {
    let keyword = if property.flags.has(DeclarationFlags::VAR) { "var" } else { "val" };
    out.line(
        indent,
        format!(
            "{}{keyword} {}: {}{}",
            modifiers(property.flags),
            tables.string(property.name)?,
            type_text(&property.return_type, tables)?,
            file_suffix(property.containing_file_id)
        ),
    );
    dump_annotations(out, indent + 1, &property.annotations, tables)
}

fn dump_type_alias(
    out: &mut Dump,
    indent: usize,
    alias: &TypeAliasRecord,
    tables: &NameTables<'_>,
) -> Result<(), CorruptionError> {
    out.line(
        indent,
        format!(
            "{}typealias {} = {}",
            modifiers(alias.flags),
            tables.string(alias.name)?,
            type_text(&alias.expanded_type, tables)?
        ),
    );
    dump_annotations(out, indent + 1, &alias.annotations, tables)
}

fn dump_annotations(
    out: &mut Dump,
    indent: usize,
    annotations: &[AnnotationRecord],
    tables: &NameTables<'_>,
) -> Result<(), CorruptionError> {
    for record in annotations {
        out.line(indent, annotation_text(&decode_annotation(record, tables)?));
    }
    Ok(())
}

fn annotation_text(annotation: &Annotation) -> String {
    let arguments: Vec<String> = annotation
        .arguments
        .iter()
        .map(|(name, value)| format!("{name} = {}", value_text(value)))
        .collect();
    format!("@{}({})", annotation.class, arguments.join(", "))
}

fn value_text(value: &ConstValue) -> String {
    match value {
        ConstValue::Int(v) => v.to_string(),
        ConstValue::Float(v) => format!("{v:?}"),
        ConstValue::Boolean(v) => v.to_string(),
        ConstValue::String(s) => format!("{s:?}"),
        ConstValue::Class(class) => format!("{class}::class"),
        ConstValue::Enum { class, entry } => format!("{class}.{entry}"),
        ConstValue::Annotation(nested) => annotation_text(nested),
        ConstValue::Array(elements) => {
            let elements: Vec<String> = elements.iter().map(value_text).collect();
            format!("[{}]", elements.join(", "))
        }
    }
}

fn type_text(ty: &TypeRecord, tables: &NameTables<'_>) -> Result<String, CorruptionError> {
    let mut text = tables.dotted_name(ty.class_name)?;
    if !ty.arguments.is_empty() {
        let arguments = ty
            .arguments
            .iter()
            .map(|a| type_text(a, tables))
            .collect::<Result<Vec<_>, _>>()?;
        text.push('<');
        text.push_str(&arguments.join(", "));
        text.push('>');
    }
    if ty.nullable {
        text.push('?');
    }
    Ok(text)
}

fn modifiers(flags: DeclarationFlags) -> String {
    const NAMES: [(u32, &str); 7] = [
        (DeclarationFlags::EXPECT, "expect"),
        (DeclarationFlags::EXTERNAL, "external"),
        (DeclarationFlags::CONST, "const"),
        (DeclarationFlags::INLINE, "inline"),
        (DeclarationFlags::SUSPEND, "suspend"),
        (DeclarationFlags::DATA, "data"),
        (DeclarationFlags::INNER, "inner"),
    ];
    NAMES
        .iter()
        .filter(|(bit, _)| flags.has(*bit))
        .map(|(_, name)| format!("{name} "))
        .collect()
}

fn file_suffix(file: Option<u32>) -> String {
    file.map(|id| format!(" [file #{id}]")).unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use jsmeta_proto::{HeaderRecord, StringTableRecord};

    #[test]
    fn dangling_index_fails_the_dump() {
        let parts = LibraryParts {
            fragments: vec![PackageFragmentRecord {
                strings: StringTableRecord::default(),
                package: jsmeta_proto::PackageRecord {
                    package_fq_name: Some(3),
                    ..Default::default()
                },
                ..Default::default()
            }],
            ..LibraryParts::default()
        };
        assert!(matches!(
            dump(&parts),
            Err(CorruptionError::QualifiedNameIndexOutOfRange { index: 3, .. })
        ));
    }

    #[test]
    fn empty_library_dump() {
        let parts = LibraryParts {
            header: HeaderRecord::default(),
            imported_modules: vec!["kotlin".into()],
            ..LibraryParts::default()
        };
        assert_eq!(
            dump(&parts).unwrap(),
            "module kind: Plain\nimports: [kotlin]\npre-release: false\n"
        );
    }
}
