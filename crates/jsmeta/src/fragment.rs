// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Builds the fragment record for one package.

use jsmeta_proto::{FileRecord, FilesRecord, PackageFragmentRecord};
use tracing::{debug, trace};

use crate::annotation::AnnotationEncoder;
use crate::context::SerializerContext;
use crate::descriptor::{ClassDescriptor, Declaration};
use crate::error::{MetadataError, Result};
use crate::module::ModuleDescriptor;
use crate::name::FqName;
use crate::serializer::{skips, DeclarationSerializer, EmitPolicy};
use crate::settings::Settings;

/// Encodes packages of one module with a fixed policy and serializer.
pub struct FragmentEncoder<'a> {
    module: &'a dyn ModuleDescriptor,
    policy: &'a dyn EmitPolicy,
    serializer: &'a dyn DeclarationSerializer,
    settings: &'a Settings,
}

impl<'a> FragmentEncoder<'a> {
    /// Bind the collaborators of one pass.
    pub fn new(
        module: &'a dyn ModuleDescriptor,
        policy: &'a dyn EmitPolicy,
        serializer: &'a dyn DeclarationSerializer,
        settings: &'a Settings,
    ) -> Self {
        Self {
            module,
            policy,
            serializer,
            settings,
        }
    }

    /// Serialize `package`. The result may be empty; callers drop empty fragments.
    ///
    /// Classes come out in pre-order, siblings sorted by fully-qualified name.
    /// A skipped class takes its nested classes with it.
    pub fn encode(&self, package: &FqName) -> Result<PackageFragmentRecord> {
        let members = self.module.package_members(package);
        let mut ctx = SerializerContext::new(self.settings);

        let mut top_level: Vec<&ClassDescriptor> = members.iter().filter_map(Declaration::as_class).collect();
        top_level.sort_by(|a, b| a.fq_name.cmp(&b.fq_name));
        let mut pending: Vec<(&ClassDescriptor, usize)> = top_level.into_iter().rev().map(|c| (c, 0)).collect();

        let mut classes = Vec::new();
        while let Some((class, depth)) = pending.pop() {
            if skips(self.policy, &class.meta, Some(class)) {
                trace!(class = %class.fq_name, depth, "class skipped");
                continue;
            }
            let record = self
                .serializer
                .class_record(class, &mut ctx)?
                .ok_or_else(|| MetadataError::ClassNotSerialized(class.fq_name.to_string()))?;
            classes.push(record);

            let mut nested: Vec<&ClassDescriptor> = class.nested.iter().collect();
            nested.sort_by(|a, b| a.fq_name.cmp(&b.fq_name));
            pending.extend(nested.into_iter().rev().map(|c| (c, depth + 1)));
        }

        let top_level_members: Vec<&Declaration> = members
            .iter()
            .filter(|d| !matches!(d, Declaration::Class(_)))
            .filter(|d| !skips(self.policy, d.meta(), None))
            .collect();
        let package_record = self.serializer.package_record(package, &top_level_members, &mut ctx)?;

        let (mut strings, registry) = ctx.finish();
        let encoder = AnnotationEncoder::new(self.settings.annotation_depth_limit());
        let files = registry
            .snapshot()
            .zip(0u32..)
            .map(|((id, file), position)| {
                Ok(FileRecord {
                    id: (id != position).then_some(id),
                    annotations: encoder.encode_retained(file.annotations(), &mut strings)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let (strings, qualified_names) = strings.into_records();
        let fragment = PackageFragmentRecord {
            strings,
            qualified_names,
            package: package_record,
            classes,
            files: FilesRecord { files },
        };
        debug!(
            package = %package,
            classes = fragment.classes.len(),
            files = fragment.files.files.len(),
            empty = fragment.is_empty(),
            "package fragment encoded"
        );
        Ok(fragment)
    }
}
