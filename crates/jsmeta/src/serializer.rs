// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Declaration serializers and the emit policy deciding what reaches them.

use jsmeta_proto::codec::MAX_NESTING;
use jsmeta_proto::{
    ClassKindRecord, ClassRecord, DeclarationFlags, FunctionRecord, PackageRecord, PropertyRecord,
    TypeAliasRecord, TypeRecord, ValueParameterRecord,
};

use crate::context::SerializerContext;
use crate::descriptor::{
    ClassDescriptor, ClassKind, Declaration, DeclarationMeta, FunctionDescriptor, ModuleId,
    PropertyDescriptor, TypeAliasDescriptor, TypeRef,
};
use crate::error::{MetadataError, Result};
use crate::name::FqName;

/// Deepest type-argument nesting a reader can decode.
///
/// A value parameter's type sits five records below the library (fragment,
/// class or package, function, parameter, type); each argument level adds one.
pub const MAX_TYPE_DEPTH: usize = MAX_NESTING - 5;

/// Decides which declarations a module's metadata carries.
pub trait EmitPolicy {
    /// True when the declaration is owned by the module being serialized.
    fn belongs_to_module(&self, meta: &DeclarationMeta) -> bool;

    /// True when an `expect` class must be kept anyway.
    fn should_emit_expect(&self, class: &ClassDescriptor) -> bool;
}

/// Default policy: own declarations only, expect classes only when the
/// checker asked for them.
#[derive(Debug, Clone)]
pub struct ModuleOwnership {
    module: ModuleId,
}

impl ModuleOwnership {
    /// Policy for `module`.
    pub fn new(module: &ModuleId) -> Self {
        Self {
            module: module.clone(),
        }
    }
}

impl EmitPolicy for ModuleOwnership {
    fn belongs_to_module(&self, meta: &DeclarationMeta) -> bool {
        meta.module == self.module
    }

    fn should_emit_expect(&self, class: &ClassDescriptor) -> bool {
        class.should_generate_expect
    }
}

/// True when `policy` drops the declaration (and, for classes, its nested ones).
pub fn skips(policy: &dyn EmitPolicy, meta: &DeclarationMeta, class: Option<&ClassDescriptor>) -> bool {
    if !policy.belongs_to_module(meta) {
        return true;
    }
    meta.is_expect && !class.is_some_and(|c| policy.should_emit_expect(c))
}

/// Turns descriptors into records, interning through the context.
pub trait DeclarationSerializer {
    /// Serialize one class without its nested classes. `None` means the class
    /// cannot be represented and aborts the pass.
    fn class_record(&self, class: &ClassDescriptor, ctx: &mut SerializerContext<'_>) -> Result<Option<ClassRecord>>;

    /// Serialize the top-level members of `package`.
    fn package_record(
        &self,
        package: &FqName,
        members: &[&Declaration],
        ctx: &mut SerializerContext<'_>,
    ) -> Result<PackageRecord>;
}

/// Standard serializer. Members are emitted sorted by name.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptorSerializer;

impl DeclarationSerializer for DescriptorSerializer {
    fn class_record(&self, class: &ClassDescriptor, ctx: &mut SerializerContext<'_>) -> Result<Option<ClassRecord>> {
        if class.fq_name.is_root() {
            return Ok(None);
        }
        let flags = meta_flags(&class.meta)
            .with(DeclarationFlags::DATA, class.is_data)
            .with(DeclarationFlags::INNER, class.is_inner);
        let fq_name = ctx.name(&class.fq_name);
        let supertypes = class.supertypes.iter().map(|s| ctx.name(s)).collect();
        let nested_class_names = class
            .nested
            .iter()
            .map(|n| ctx.string(n.fq_name.short_name()))
            .collect();
        let functions = sorted_by_name(&class.functions, |f| &f.name)
            .into_iter()
            .map(|f| function_record(f, ctx))
            .collect::<Result<_>>()?;
        let properties = sorted_by_name(&class.properties, |p| &p.name)
            .into_iter()
            .map(|p| property_record(p, ctx))
            .collect::<Result<_>>()?;
        let type_aliases = sorted_by_name(&class.type_aliases, |t| &t.name)
            .into_iter()
            .map(|t| type_alias_record(t, ctx))
            .collect::<Result<_>>()?;
        let annotations = ctx.annotations(&class.meta.annotations)?;
        let containing_file_id = ctx.file_id(class.meta.source.as_ref());
        Ok(Some(ClassRecord {
            flags,
            fq_name,
            kind: class_kind(class.kind),
            supertypes,
            nested_class_names,
            functions,
            properties,
            type_aliases,
            annotations,
            containing_file_id,
        }))
    }

    fn package_record(
        &self,
        package: &FqName,
        members: &[&Declaration],
        ctx: &mut SerializerContext<'_>,
    ) -> Result<PackageRecord> {
        let mut sorted = members.to_vec();
        sorted.sort_by(|a, b| a.name().cmp(b.name()));
        let mut record = PackageRecord {
            package_fq_name: Some(ctx.name(package)),
            ..PackageRecord::default()
        };
        for member in sorted {
            match member {
                Declaration::Function(f) => record.functions.push(function_record(f, ctx)?),
                Declaration::Property(p) => record.properties.push(property_record(p, ctx)?),
                Declaration::TypeAlias(t) => record.type_aliases.push(type_alias_record(t, ctx)?),
                Declaration::Class(_) => {}
            }
        }
        Ok(record)
    }
}

fn sorted_by_name<T>(items: &[T], name: impl Fn(&T) -> &String) -> Vec<&T> {
    let mut sorted: Vec<&T> = items.iter().collect();
    sorted.sort_by(|a, b| name(a).cmp(name(b)));
    sorted
}

fn meta_flags(meta: &DeclarationMeta) -> DeclarationFlags {
    DeclarationFlags::default()
        .with(DeclarationFlags::EXPECT, meta.is_expect)
        .with(DeclarationFlags::EXTERNAL, meta.is_external)
}

const fn class_kind(kind: ClassKind) -> ClassKindRecord {
    match kind {
        ClassKind::Class => ClassKindRecord::Class,
        ClassKind::Interface => ClassKindRecord::Interface,
        ClassKind::EnumClass => ClassKindRecord::EnumClass,
        ClassKind::EnumEntry => ClassKindRecord::EnumEntry,
        ClassKind::AnnotationClass => ClassKindRecord::AnnotationClass,
        ClassKind::Object => ClassKindRecord::Object,
        ClassKind::CompanionObject => ClassKindRecord::CompanionObject,
    }
}

fn type_record(ty: &TypeRef, owner: &str, ctx: &mut SerializerContext<'_>) -> Result<TypeRecord> {
    nested_type_record(ty, owner, ctx, 0)
}

fn nested_type_record(
    ty: &TypeRef,
    owner: &str,
    ctx: &mut SerializerContext<'_>,
    depth: usize,
) -> Result<TypeRecord> {
    if depth > MAX_TYPE_DEPTH {
        return Err(MetadataError::TypeTooDeep {
            declaration: owner.to_owned(),
            limit: MAX_TYPE_DEPTH,
        });
    }
    Ok(TypeRecord {
        class_name: ctx.name(&ty.class),
        nullable: ty.nullable,
        arguments: ty
            .arguments
            .iter()
            .map(|a| nested_type_record(a, owner, ctx, depth + 1))
            .collect::<Result<_>>()?,
    })
}

fn function_record(function: &FunctionDescriptor, ctx: &mut SerializerContext<'_>) -> Result<FunctionRecord> {
    let flags = meta_flags(&function.meta)
        .with(DeclarationFlags::INLINE, function.is_inline)
        .with(DeclarationFlags::SUSPEND, function.is_suspend);
    let name = ctx.string(&function.name);
    let value_parameters = function
        .value_parameters
        .iter()
        .map(|p| {
            Ok(ValueParameterRecord {
                name: ctx.string(&p.name),
                ty: type_record(&p.ty, &function.name, ctx)?,
            })
        })
        .collect::<Result<_>>()?;
    Ok(FunctionRecord {
        flags,
        name,
        value_parameters,
        return_type: type_record(&function.return_type, &function.name, ctx)?,
        annotations: ctx.annotations(&function.meta.annotations)?,
        containing_file_id: ctx.file_id(function.meta.source.as_ref()),
    })
}

fn property_record(property: &PropertyDescriptor, ctx: &mut SerializerContext<'_>) -> Result<PropertyRecord> {
    let flags = meta_flags(&property.meta)
        .with(DeclarationFlags::VAR, property.is_var)
        .with(DeclarationFlags::CONST, property.is_const);
    Ok(PropertyRecord {
        flags,
        name: ctx.string(&property.name),
        return_type: type_record(&property.ty, &property.name, ctx)?,
        annotations: ctx.annotations(&property.meta.annotations)?,
        containing_file_id: ctx.file_id(property.meta.source.as_ref()),
    })
}

fn type_alias_record(alias: &TypeAliasDescriptor, ctx: &mut SerializerContext<'_>) -> Result<TypeAliasRecord> {
    Ok(TypeAliasRecord {
        flags: meta_flags(&alias.meta),
        name: ctx.string(&alias.name),
        expanded_type: type_record(&alias.expanded, &alias.name, ctx)?,
        annotations: ctx.annotations(&alias.meta.annotations)?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::descriptor::WithMeta;
    use crate::settings::Settings;

    fn module() -> ModuleId {
        ModuleId::new("m")
    }

    #[test]
    fn foreign_declarations_are_skipped() {
        let policy = ModuleOwnership::new(&module());
        let own = DeclarationMeta::new(&module());
        let foreign = DeclarationMeta::new(&ModuleId::new("other"));
        assert!(!skips(&policy, &own, None));
        assert!(skips(&policy, &foreign, None));
    }

    #[test]
    fn expect_classes_survive_only_when_requested() {
        let policy = ModuleOwnership::new(&module());
        let plain = ClassDescriptor::new("a.E", ClassKind::Class, &module()).expect();
        let kept = plain.clone().generate_expect();
        assert!(skips(&policy, &plain.meta, Some(&plain)));
        assert!(!skips(&policy, &kept.meta, Some(&kept)));

        let function = FunctionDescriptor::new("f", &module(), TypeRef::named("lib.Unit")).expect();
        assert!(skips(&policy, &function.meta, None));
    }

    #[test]
    fn class_members_are_sorted_and_flagged() {
        let settings = Settings::default();
        let mut ctx = SerializerContext::new(&settings);
        let unit = TypeRef::named("lib.Unit");
        let mut class = ClassDescriptor::new("a.Foo", ClassKind::Class, &module())
            .with_function(FunctionDescriptor::new("zed", &module(), unit.clone()))
            .with_function(FunctionDescriptor::new("alpha", &module(), unit.clone()))
            .with_property(PropertyDescriptor::new("p", &module(), unit).mutable())
            .with_nested(ClassDescriptor::new("a.Foo.Bar", ClassKind::Object, &module()));
        class.is_data = true;
        let record = DescriptorSerializer.class_record(&class, &mut ctx).unwrap().unwrap();
        assert!(record.flags.has(DeclarationFlags::DATA));
        assert!(record.properties[0].flags.has(DeclarationFlags::VAR));
        let (strings, _) = ctx.finish().0.into_records();
        let names: Vec<&str> = record
            .functions
            .iter()
            .map(|f| strings.strings[f.name as usize].as_str())
            .collect();
        assert_eq!(names, vec!["alpha", "zed"]);
        assert_eq!(strings.strings[record.nested_class_names[0] as usize], "Bar");
    }

    fn nested_list(depth: usize) -> TypeRef {
        (0..depth).fold(TypeRef::named("lib.Int"), |inner, _| {
            TypeRef::named("lib.List").with_argument(inner)
        })
    }

    #[test]
    fn type_arguments_nest_up_to_the_limit() {
        let settings = Settings::default();
        let mut ctx = SerializerContext::new(&settings);
        let at_limit = FunctionDescriptor::new("f", &module(), nested_list(MAX_TYPE_DEPTH));
        assert!(function_record(&at_limit, &mut ctx).is_ok());

        let beyond = FunctionDescriptor::new("g", &module(), TypeRef::named("lib.Unit"))
            .with_parameter("xs", nested_list(MAX_TYPE_DEPTH + 1));
        let err = function_record(&beyond, &mut ctx).unwrap_err();
        assert!(matches!(
            err,
            MetadataError::TypeTooDeep { ref declaration, limit } if declaration == "g" && limit == MAX_TYPE_DEPTH
        ));
    }

    #[test]
    fn root_named_class_is_not_representable() {
        let settings = Settings::default();
        let mut ctx = SerializerContext::new(&settings);
        let class = ClassDescriptor::new(FqName::root(), ClassKind::Class, &module());
        assert!(DescriptorSerializer.class_record(&class, &mut ctx).unwrap().is_none());
    }
}
