// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Input symbol graph handed over by the front-end.
//!
//! These are plain owned values. The front-end builds them once and the
//! serializer only borrows them, so one graph can feed several passes.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::name::FqName;

/// Identity of the module that owns a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(pub String);

impl ModuleId {
    /// Build from any string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Target-platform module wrapping convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModuleKind {
    /// Plain script.
    #[default]
    Plain,
    /// AMD `define`.
    Amd,
    /// CommonJS `require`.
    CommonJs,
    /// Universal module definition.
    Umd,
}

/// How long an annotation survives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Retention {
    /// Meaningful only before compilation; never serialized.
    Source,
    /// Kept in metadata.
    #[default]
    Binary,
    /// Kept in metadata and visible at runtime.
    Runtime,
}

/// Compile-time constant used as an annotation argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    /// Integer of any width.
    Int(i64),
    /// Floating point of any width.
    Float(f64),
    /// Boolean.
    Boolean(bool),
    /// String.
    String(String),
    /// Class literal.
    Class(FqName),
    /// Enum entry.
    Enum {
        /// Enum class.
        class: FqName,
        /// Entry name.
        entry: String,
    },
    /// Nested annotation.
    Annotation(Box<Annotation>),
    /// Array of constants.
    Array(Vec<ConstValue>),
}

/// Annotation instance: class plus argument values keyed by parameter name.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Annotation class.
    pub class: FqName,
    /// Arguments by parameter name.
    pub arguments: BTreeMap<String, ConstValue>,
    /// Retention of the annotation class.
    pub retention: Retention,
}

impl Annotation {
    /// Binary-retained annotation without arguments.
    pub fn new(class: impl Into<FqName>) -> Self {
        Self {
            class: class.into(),
            arguments: BTreeMap::new(),
            retention: Retention::Binary,
        }
    }

    /// Add or replace an argument.
    #[must_use]
    pub fn with_argument(mut self, name: impl Into<String>, value: ConstValue) -> Self {
        self.arguments.insert(name.into(), value);
        self
    }

    /// Set the retention.
    #[must_use]
    pub fn with_retention(mut self, retention: Retention) -> Self {
        self.retention = retention;
        self
    }

    /// True for annotations that are dropped from metadata.
    pub fn is_source_only(&self) -> bool {
        self.retention == Retention::Source
    }
}

/// A file compiled in this pass.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveFile {
    /// Path as given to the compiler.
    pub path: String,
    /// File-level annotations.
    pub annotations: Vec<Annotation>,
}

/// A file known only through a fragment that was itself deserialized.
#[derive(Debug, Clone, PartialEq)]
pub struct DeserializedFileRef {
    /// Package of the fragment the file came from.
    pub package: FqName,
    /// File id inside that fragment.
    pub file_id: u32,
    /// File-level annotations as decoded.
    pub annotations: Vec<Annotation>,
}

/// Source of a declaration, for per-file metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceFile {
    /// Compiled in this pass.
    Live(LiveFile),
    /// Re-exported from an already serialized fragment.
    Deserialized(DeserializedFileRef),
}

/// Identity used to deduplicate files.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileKey {
    /// Live file by path.
    Live(String),
    /// Deserialized file by origin.
    Deserialized {
        /// Origin package.
        package: FqName,
        /// Origin file id.
        file_id: u32,
    },
}

impl SourceFile {
    /// Live file with the given annotations.
    pub fn live(path: impl Into<String>, annotations: Vec<Annotation>) -> Arc<Self> {
        Arc::new(Self::Live(LiveFile {
            path: path.into(),
            annotations,
        }))
    }

    /// File-level annotations, whatever the variant.
    pub fn annotations(&self) -> &[Annotation] {
        match self {
            Self::Live(file) => &file.annotations,
            Self::Deserialized(file) => &file.annotations,
        }
    }

    /// Deduplication key.
    pub fn key(&self) -> FileKey {
        match self {
            Self::Live(file) => FileKey::Live(file.path.clone()),
            Self::Deserialized(file) => FileKey::Deserialized {
                package: file.package.clone(),
                file_id: file.file_id,
            },
        }
    }
}

/// Reference to a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    /// Classifier.
    pub class: FqName,
    /// Nullable type.
    pub nullable: bool,
    /// Type arguments.
    pub arguments: Vec<TypeRef>,
}

impl TypeRef {
    /// Non-null type without arguments.
    pub fn named(class: impl Into<FqName>) -> Self {
        Self {
            class: class.into(),
            nullable: false,
            arguments: Vec::new(),
        }
    }

    /// Make nullable.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Append a type argument.
    #[must_use]
    pub fn with_argument(mut self, argument: Self) -> Self {
        self.arguments.push(argument);
        self
    }
}

/// Data every declaration carries.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclarationMeta {
    /// Owning module.
    pub module: ModuleId,
    /// `expect` declaration.
    pub is_expect: bool,
    /// `external` declaration.
    pub is_external: bool,
    /// Declaration annotations.
    pub annotations: Vec<Annotation>,
    /// Declaring file, if known.
    pub source: Option<Arc<SourceFile>>,
}

impl DeclarationMeta {
    /// Metadata for a plain declaration of `module`.
    pub fn new(module: &ModuleId) -> Self {
        Self {
            module: module.clone(),
            is_expect: false,
            is_external: false,
            annotations: Vec::new(),
            source: None,
        }
    }
}

/// Builder methods shared by every descriptor.
pub trait WithMeta: Sized {
    /// Mutable access to the common declaration data.
    fn meta_mut(&mut self) -> &mut DeclarationMeta;

    /// Mark as declared in `file`.
    #[must_use]
    fn in_file(mut self, file: &Arc<SourceFile>) -> Self {
        self.meta_mut().source = Some(Arc::clone(file));
        self
    }

    /// Mark as an `expect` declaration.
    #[must_use]
    fn expect(mut self) -> Self {
        self.meta_mut().is_expect = true;
        self
    }

    /// Mark as an `external` declaration.
    #[must_use]
    fn external(mut self) -> Self {
        self.meta_mut().is_external = true;
        self
    }

    /// Attach an annotation.
    #[must_use]
    fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.meta_mut().annotations.push(annotation);
        self
    }
}

/// Kind of class declaration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ClassKind {
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

/// Named function parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueParameter {
    /// Parameter name.
    pub name: String,
    /// Parameter type.
    pub ty: TypeRef,
}

/// Function declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDescriptor {
    /// Simple name.
    pub name: String,
    /// `inline` modifier.
    pub is_inline: bool,
    /// `suspend` modifier.
    pub is_suspend: bool,
    /// Parameters in declaration order.
    pub value_parameters: Vec<ValueParameter>,
    /// Return type.
    pub return_type: TypeRef,
    /// Common declaration data.
    pub meta: DeclarationMeta,
}

impl FunctionDescriptor {
    /// Function of `module` without parameters.
    pub fn new(name: impl Into<String>, module: &ModuleId, return_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            is_inline: false,
            is_suspend: false,
            value_parameters: Vec::new(),
            return_type,
            meta: DeclarationMeta::new(module),
        }
    }

    /// Append a parameter.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.value_parameters.push(ValueParameter {
            name: name.into(),
            ty,
        });
        self
    }
}

impl WithMeta for FunctionDescriptor {
    fn meta_mut(&mut self) -> &mut DeclarationMeta {
        &mut self.meta
    }
}

/// Property declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    /// Simple name.
    pub name: String,
    /// `var` rather than `val`.
    pub is_var: bool,
    /// `const` modifier.
    pub is_const: bool,
    /// Property type.
    pub ty: TypeRef,
    /// Common declaration data.
    pub meta: DeclarationMeta,
}

impl PropertyDescriptor {
    /// Read-only property of `module`.
    pub fn new(name: impl Into<String>, module: &ModuleId, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            is_var: false,
            is_const: false,
            ty,
            meta: DeclarationMeta::new(module),
        }
    }

    /// Make mutable.
    #[must_use]
    pub fn mutable(mut self) -> Self {
        self.is_var = true;
        self
    }
}

impl WithMeta for PropertyDescriptor {
    fn meta_mut(&mut self) -> &mut DeclarationMeta {
        &mut self.meta
    }
}

/// Type alias declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAliasDescriptor {
    /// Simple name.
    pub name: String,
    /// Type the alias expands to.
    pub expanded: TypeRef,
    /// Common declaration data.
    pub meta: DeclarationMeta,
}

impl TypeAliasDescriptor {
    /// Alias of `module`.
    pub fn new(name: impl Into<String>, module: &ModuleId, expanded: TypeRef) -> Self {
        Self {
            name: name.into(),
            expanded,
            meta: DeclarationMeta::new(module),
        }
    }
}

impl WithMeta for TypeAliasDescriptor {
    fn meta_mut(&mut self) -> &mut DeclarationMeta {
        &mut self.meta
    }
}

/// Class declaration with its nested classes and members.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDescriptor {
    /// Fully-qualified name (nested classes include their outer class).
    pub fq_name: FqName,
    /// Class kind.
    pub kind: ClassKind,
    /// `data` modifier.
    pub is_data: bool,
    /// `inner` modifier.
    pub is_inner: bool,
    /// Direct supertypes.
    pub supertypes: Vec<FqName>,
    /// Nested classes, in declaration order.
    pub nested: Vec<ClassDescriptor>,
    /// Member functions.
    pub functions: Vec<FunctionDescriptor>,
    /// Member properties.
    pub properties: Vec<PropertyDescriptor>,
    /// Member type aliases.
    pub type_aliases: Vec<TypeAliasDescriptor>,
    /// Set by the expect/actual checker when an expect class must still be emitted.
    pub should_generate_expect: bool,
    /// Common declaration data.
    pub meta: DeclarationMeta,
}

impl ClassDescriptor {
    /// Empty class of `module`.
    pub fn new(fq_name: impl Into<FqName>, kind: ClassKind, module: &ModuleId) -> Self {
        Self {
            fq_name: fq_name.into(),
            kind,
            is_data: false,
            is_inner: false,
            supertypes: Vec::new(),
            nested: Vec::new(),
            functions: Vec::new(),
            properties: Vec::new(),
            type_aliases: Vec::new(),
            should_generate_expect: false,
            meta: DeclarationMeta::new(module),
        }
    }

    /// Add a nested class.
    #[must_use]
    pub fn with_nested(mut self, nested: Self) -> Self {
        self.nested.push(nested);
        self
    }

    /// Add a member function.
    #[must_use]
    pub fn with_function(mut self, function: FunctionDescriptor) -> Self {
        self.functions.push(function);
        self
    }

    /// Add a member property.
    #[must_use]
    pub fn with_property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    /// Add a member type alias.
    #[must_use]
    pub fn with_type_alias(mut self, alias: TypeAliasDescriptor) -> Self {
        self.type_aliases.push(alias);
        self
    }

    /// Add a direct supertype.
    #[must_use]
    pub fn with_supertype(mut self, supertype: impl Into<FqName>) -> Self {
        self.supertypes.push(supertype.into());
        self
    }

    /// Keep this expect class in metadata.
    #[must_use]
    pub fn generate_expect(mut self) -> Self {
        self.should_generate_expect = true;
        self
    }
}

impl WithMeta for ClassDescriptor {
    fn meta_mut(&mut self) -> &mut DeclarationMeta {
        &mut self.meta
    }
}

/// Any declaration contributed to a package scope.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    /// Class (with nested classes).
    Class(ClassDescriptor),
    /// Top-level function.
    Function(FunctionDescriptor),
    /// Top-level property.
    Property(PropertyDescriptor),
    /// Top-level type alias.
    TypeAlias(TypeAliasDescriptor),
}

impl Declaration {
    /// Common declaration data.
    pub fn meta(&self) -> &DeclarationMeta {
        match self {
            Self::Class(d) => &d.meta,
            Self::Function(d) => &d.meta,
            Self::Property(d) => &d.meta,
            Self::TypeAlias(d) => &d.meta,
        }
    }

    /// Simple name.
    pub fn name(&self) -> &str {
        match self {
            Self::Class(d) => d.fq_name.short_name(),
            Self::Function(d) => &d.name,
            Self::Property(d) => &d.name,
            Self::TypeAlias(d) => &d.name,
        }
    }

    /// The class, when this is one.
    pub fn as_class(&self) -> Option<&ClassDescriptor> {
        match self {
            Self::Class(class) => Some(class),
            _ => None,
        }
    }
}

impl From<ClassDescriptor> for Declaration {
    fn from(value: ClassDescriptor) -> Self {
        Self::Class(value)
    }
}

impl From<FunctionDescriptor> for Declaration {
    fn from(value: FunctionDescriptor) -> Self {
        Self::Function(value)
    }
}

impl From<PropertyDescriptor> for Declaration {
    fn from(value: PropertyDescriptor) -> Self {
        Self::Property(value)
    }
}

impl From<TypeAliasDescriptor> for Declaration {
    fn from(value: TypeAliasDescriptor) -> Self {
        Self::TypeAlias(value)
    }
}
