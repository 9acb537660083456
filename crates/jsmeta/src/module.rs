// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Module-level traversal port and its in-memory implementation.

use std::collections::BTreeMap;

use crate::descriptor::{ClassDescriptor, Declaration, ModuleId, ModuleKind};
use crate::name::FqName;

/// Read access to a compiled module's declarations.
///
/// Implemented by front-ends; [`ModuleGraph`] is the in-memory version.
pub trait ModuleDescriptor {
    /// Identity compared against each declaration's owner.
    fn module_id(&self) -> &ModuleId;

    /// Module name used in textual carriers.
    fn name(&self) -> &str;

    /// Module wrapping convention.
    fn kind(&self) -> ModuleKind;

    /// Imported module names in import-declaration order.
    fn imported_modules(&self) -> &[String];

    /// Direct sub-packages of `package`.
    fn sub_packages(&self, package: &FqName) -> Vec<FqName>;

    /// Every declaration visible in `package`, including ones owned by other modules.
    fn package_members(&self, package: &FqName) -> &[Declaration];

    /// Resolve a class, nested or not, by its fully-qualified name.
    fn resolve_class(&self, fq_name: &FqName) -> Option<&ClassDescriptor>;
}

/// Owned module: packages mapped to the declarations visible in them.
#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    id: ModuleId,
    name: String,
    kind: ModuleKind,
    imports: Vec<String>,
    packages: BTreeMap<FqName, Vec<Declaration>>,
}

impl ModuleGraph {
    /// Empty module whose id equals its name. Only the root package exists.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut packages = BTreeMap::new();
        packages.insert(FqName::root(), Vec::new());
        Self {
            id: ModuleId::new(name.clone()),
            name,
            kind: ModuleKind::Plain,
            imports: Vec::new(),
            packages,
        }
    }

    /// Set the module kind.
    #[must_use]
    pub fn with_kind(mut self, kind: ModuleKind) -> Self {
        self.kind = kind;
        self
    }

    /// Append an imported module.
    #[must_use]
    pub fn with_import(mut self, module: impl Into<String>) -> Self {
        self.imports.push(module.into());
        self
    }

    /// Owner id for declarations of this module.
    pub const fn id(&self) -> &ModuleId {
        &self.id
    }

    /// Register `package` and all of its ancestors.
    pub fn add_package(&mut self, package: impl Into<FqName>) -> &mut Self {
        let mut current = Some(package.into());
        while let Some(name) = current {
            if self.packages.contains_key(&name) {
                break;
            }
            current = name.parent();
            self.packages.insert(name, Vec::new());
        }
        self
    }

    /// Make `declaration` visible in `package`.
    pub fn declare(&mut self, package: impl Into<FqName>, declaration: impl Into<Declaration>) -> &mut Self {
        let package = package.into();
        self.add_package(package.clone());
        self.packages.entry(package).or_default().push(declaration.into());
        self
    }

    /// Every registered package, sorted.
    pub fn packages(&self) -> impl Iterator<Item = &FqName> {
        self.packages.keys()
    }
}

impl ModuleDescriptor for ModuleGraph {
    fn module_id(&self) -> &ModuleId {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ModuleKind {
        self.kind
    }

    fn imported_modules(&self) -> &[String] {
        &self.imports
    }

    fn sub_packages(&self, package: &FqName) -> Vec<FqName> {
        self.packages
            .keys()
            .filter(|candidate| candidate.parent().as_ref() == Some(package))
            .cloned()
            .collect()
    }

    fn package_members(&self, package: &FqName) -> &[Declaration] {
        self.packages.get(package).map_or(&[], Vec::as_slice)
    }

    fn resolve_class(&self, fq_name: &FqName) -> Option<&ClassDescriptor> {
        let mut package = fq_name.parent();
        while let Some(candidate) = package {
            let found = self
                .package_members(&candidate)
                .iter()
                .filter_map(Declaration::as_class)
                .find_map(|class| find_nested(class, fq_name));
            if found.is_some() {
                return found;
            }
            package = candidate.parent();
        }
        None
    }
}

fn find_nested<'a>(class: &'a ClassDescriptor, target: &FqName) -> Option<&'a ClassDescriptor> {
    let mut current = class;
    loop {
        if &current.fq_name == target {
            return Some(current);
        }
        if !current.fq_name.is_ancestor_of(target) {
            return None;
        }
        current = current
            .nested
            .iter()
            .find(|nested| nested.fq_name.is_ancestor_of(target))?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{ClassKind, FunctionDescriptor, TypeRef};

    #[test]
    fn declaring_registers_ancestor_packages() {
        let mut graph = ModuleGraph::new("m");
        let id = graph.id().clone();
        graph.declare("a.b", FunctionDescriptor::new("f", &id, TypeRef::named("lib.Unit")));
        let packages: Vec<_> = graph.packages().map(FqName::as_str).collect();
        assert_eq!(packages, vec!["", "a", "a.b"]);
        assert_eq!(graph.sub_packages(&FqName::root()), vec![FqName::new("a")]);
        assert_eq!(graph.sub_packages(&FqName::new("a")), vec![FqName::new("a.b")]);
        assert!(graph.package_members(&FqName::new("zzz")).is_empty());
    }

    #[test]
    fn nested_classes_resolve() {
        let mut graph = ModuleGraph::new("m");
        let id = graph.id().clone();
        let foo = ClassDescriptor::new("a.Foo", ClassKind::Class, &id)
            .with_nested(ClassDescriptor::new("a.Foo.Bar", ClassKind::Object, &id));
        graph.declare("a", foo);
        let bar = graph.resolve_class(&FqName::new("a.Foo.Bar"));
        assert_eq!(bar.map(|c| c.kind), Some(ClassKind::Object));
        assert!(graph.resolve_class(&FqName::new("a.Foo.Baz")).is_none());
        assert!(graph.resolve_class(&FqName::new("b.Foo")).is_none());
    }
}
