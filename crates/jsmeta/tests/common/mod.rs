// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]

use jsmeta::proto::PackageFragmentRecord;
use jsmeta::{
    Annotation, ClassDescriptor, ClassKind, ConstValue, FqName, FunctionDescriptor, ModuleGraph,
    ModuleId, ModuleKind, PropertyDescriptor, SourceFile, TypeAliasDescriptor, TypeRef, WithMeta,
};

// =============================================================================
// FIXTURE GRAPHS
// =============================================================================

pub fn unit() -> TypeRef {
    TypeRef::named("lib.Unit")
}

/// Packages `a` and `a.b`: `a.Foo` with nested `a.Foo.Bar`, and `a.b.baz()`.
pub fn scenario_graph() -> ModuleGraph {
    let mut graph = ModuleGraph::new("app");
    let id = graph.id().clone();
    let foo = ClassDescriptor::new("a.Foo", ClassKind::Class, &id)
        .with_nested(ClassDescriptor::new("a.Foo.Bar", ClassKind::Class, &id));
    graph
        .declare("a", foo)
        .declare("a.b", FunctionDescriptor::new("baz", &id, unit()));
    graph
}

/// A broader module touching every declaration kind, annotation value and file form.
pub fn rich_graph() -> ModuleGraph {
    let mut graph = ModuleGraph::new("rich")
        .with_kind(ModuleKind::CommonJs)
        .with_import("kotlin")
        .with_import("zeta-lib")
        .with_import("alpha-lib");
    let id = graph.id().clone();
    let dep = ModuleId::new("kotlin");

    let file = SourceFile::live("src/shapes.kt", vec![experimental()]);
    let other = SourceFile::live("src/util.kt", vec![]);

    let shape = ClassDescriptor::new("geo.Shape", ClassKind::Interface, &id)
        .in_file(&file)
        .with_function(
            FunctionDescriptor::new("area", &id, TypeRef::named("lib.Double"))
                .with_annotation(experimental()),
        );
    let mut circle = ClassDescriptor::new("geo.Circle", ClassKind::Class, &id)
        .in_file(&file)
        .with_supertype("geo.Shape")
        .with_property(PropertyDescriptor::new("radius", &id, TypeRef::named("lib.Double")))
        .with_nested(ClassDescriptor::new(
            "geo.Circle.Companion",
            ClassKind::CompanionObject,
            &id,
        ))
        .with_annotation(
            Annotation::new("lib.Tagged")
                .with_argument("name", ConstValue::String("circle".into()))
                .with_argument(
                    "weights",
                    ConstValue::Array(vec![ConstValue::Float(0.5), ConstValue::Int(-7)]),
                )
                .with_argument("kind", ConstValue::Class(FqName::new("geo.Shape")))
                .with_argument(
                    "inner",
                    ConstValue::Annotation(Box::new(Annotation::new("lib.Marker"))),
                ),
        );
    circle.is_data = true;

    graph
        .declare("geo", circle)
        .declare("geo", shape)
        .declare(
            "geo",
            FunctionDescriptor::new("unitCircle", &id, TypeRef::named("geo.Circle").nullable())
                .with_parameter(
                    "xs",
                    TypeRef::named("lib.List").with_argument(TypeRef::named("lib.Int")),
                )
                .in_file(&other),
        )
        .declare(
            "geo",
            PropertyDescriptor::new("origin", &id, TypeRef::named("geo.Point"))
                .mutable()
                .in_file(&other),
        )
        .declare(
            "geo",
            TypeAliasDescriptor::new("Shapes", &id, TypeRef::named("lib.List")),
        )
        .declare("geo", ClassDescriptor::new("geo.FromDep", ClassKind::Class, &dep))
        .add_package("geo.empty");
    graph
}

/// `@lib.Experimental(level = lib.Level.ERROR)`.
pub fn experimental() -> Annotation {
    Annotation::new("lib.Experimental").with_argument(
        "level",
        ConstValue::Enum {
            class: FqName::new("lib.Level"),
            entry: "ERROR".into(),
        },
    )
}

pub fn class_names(fragment: &PackageFragmentRecord) -> Vec<String> {
    let tables = fragment.tables();
    fragment
        .classes
        .iter()
        .map(|c| tables.dotted_name(c.fq_name).unwrap_or_default())
        .collect()
}

pub fn package_name(fragment: &PackageFragmentRecord) -> String {
    let tables = fragment.tables();
    fragment
        .package
        .package_fq_name
        .and_then(|id| tables.dotted_name(id).ok())
        .unwrap_or_default()
}
