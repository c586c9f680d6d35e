//! The unified type catalog.
//!
//! A [`Universe`] holds one [`NominalEntry`] per nominal type, whether it was
//! declared in source or described by a platform manifest, and the alias
//! table mapping every spelling of a type to its [`TypeId`]. It is built once
//! per compilation in a fixed order (platform metadata, then source Pass A
//! over every module, then source Pass B over every module) and is read-only
//! afterwards.

use crate::alias::AliasTable;
use crate::builtin::builtin_manifests;
use crate::entry::{
    MemberEntry, MemberKind, MemberModifiers, NominalEntry, NominalKind, Origin, ParamEntry,
    SignatureEntry, TypeParamEntry,
};
use crate::manifest::{Manifest, ManifestError, ManifestMember, ManifestType, scan_roots};
use crate::type_id::{TypeId, strip_arity};
use crate::type_ref::{TypeRef, parse_type_ref};
use crate::types::{FunctionParam, FunctionShape, IrType, PrimitiveKind};
use crate::{members, skeleton};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use tsharp_binding::{Bindings, DeclId};
use tsharp_syntax::ast::SourceModule;
use tsharp_syntax::{Diagnostic, Diagnostics, codes};

/// Spellings of platform keywords that are not a primitive's surface name.
const KEYWORD_SPELLINGS: &[(&str, PrimitiveKind)] = &[
    ("double", PrimitiveKind::Number),
    ("Double", PrimitiveKind::Number),
    ("bool", PrimitiveKind::Boolean),
    ("Boolean", PrimitiveKind::Boolean),
    ("Int32", PrimitiveKind::Int),
    ("Int64", PrimitiveKind::Long),
    ("Int16", PrimitiveKind::Short),
    ("Single", PrimitiveKind::Float),
    ("String", PrimitiveKind::String),
];

/// Global type names from the TypeScript standard library.
const TS_LIB_TYPES: &[&str] = &[
    "Date", "RegExp", "WeakMap", "WeakSet", "Symbol", "Iterable", "Iterator",
    "IterableIterator", "AsyncIterable", "AsyncIterator", "PromiseLike", "Partial",
    "Required", "Readonly", "Pick", "Omit", "Exclude", "Extract", "NonNullable",
    "ReturnType", "Parameters", "InstanceType", "ArrayLike", "ReadonlyMap", "ReadonlySet",
    "Function", "Object", "Number", "Boolean", "BigInt",
];

pub const OBJECT_TYPE: &str = "System.Object";

/// Options that shape the catalog.
#[derive(Debug, Clone)]
pub struct CatalogOptions {
    /// Namespace that source modules are placed under.
    pub root_namespace: String,
    /// Directories scanned for `*.manifest.json`.
    pub metadata_roots: Vec<PathBuf>,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            root_namespace: "App".to_string(),
            metadata_roots: Vec::new(),
        }
    }
}

/// A member found through the heritage graph, with the substitution that
/// maps the declaring type's parameters into the receiver's type arguments.
#[derive(Debug, Clone)]
pub struct MemberLookup<'u> {
    pub declaring: &'u NominalEntry,
    pub member: &'u MemberEntry,
    pub substitution: HashMap<Arc<str>, IrType>,
}

impl MemberLookup<'_> {
    /// Declared type of a property or field, instantiated for the receiver.
    pub fn instantiated_type(&self) -> Option<IrType> {
        self.member.ty.as_ref().map(|ty| ty.substitute(&self.substitution))
    }

    /// Signatures instantiated for the receiver. Method-level type
    /// parameters are left in place.
    pub fn instantiated_signatures(&self) -> Vec<SignatureEntry> {
        self.member
            .signatures
            .iter()
            .map(|sig| instantiate_signature(sig, &self.substitution))
            .collect()
    }
}

pub fn instantiate_signature(sig: &SignatureEntry, map: &HashMap<Arc<str>, IrType>) -> SignatureEntry {
    SignatureEntry {
        type_params: sig.type_params.clone(),
        params: sig
            .params
            .iter()
            .map(|p| ParamEntry {
                ty: p.ty.substitute(map),
                ..p.clone()
            })
            .collect(),
        ret: sig.ret.substitute(map),
    }
}

#[derive(Debug, Clone, Default)]
pub struct Universe {
    entries: Vec<NominalEntry>,
    index: HashMap<TypeId, usize>,
    aliases: AliasTable,
    primitives: HashMap<TypeId, PrimitiveKind>,
    primitive_ids: BTreeMap<PrimitiveKind, TypeId>,
    source_types: HashMap<DeclId, TypeId>,
    root_namespace: String,
}

impl Universe {
    /// Build the catalog for one compilation.
    pub fn build(
        modules: &[SourceModule],
        bindings: &Bindings,
        options: &CatalogOptions,
        diags: &mut Diagnostics,
    ) -> Self {
        let mut universe = Self::platform(options, diags);
        skeleton::register_source_types(&mut universe, modules, bindings);
        members::complete_source_types(&mut universe, modules, bindings, diags);
        tracing::debug!(
            entries = universe.entries.len(),
            source = universe.source_types.len(),
            aliases = universe.aliases.len(),
            "built type catalog"
        );
        universe
    }

    /// A catalog holding platform metadata only.
    pub fn platform(options: &CatalogOptions, diags: &mut Diagnostics) -> Self {
        let mut universe = Universe {
            root_namespace: options.root_namespace.clone(),
            ..Default::default()
        };

        let (mut manifests, mut errors) = builtin_manifests();
        let (found, found_errors) = scan_roots(&options.metadata_roots);
        manifests.extend(found);
        errors.extend(found_errors);
        for err in &errors {
            report_skipped_manifest(err, diags);
        }

        universe.load_manifests(&manifests);
        tracing::debug!(
            manifests = manifests.len(),
            skipped = errors.len(),
            types = universe.entries.len(),
            "loaded platform metadata"
        );
        universe
    }

    fn load_manifests(&mut self, manifests: &[Manifest]) {
        // Identities first, so that heritage and members may refer to any
        // type regardless of manifest order.
        let mut loaded: Vec<(usize, &ManifestType)> = Vec::new();
        for manifest in manifests {
            for ty in &manifest.types {
                let id = TypeId::new(
                    strip_arity(&ty.name),
                    format!("{}.{}", manifest.namespace, ty.name),
                );
                if self.index.contains_key(&id) {
                    tracing::trace!(ty = %id, "duplicate platform type ignored");
                    continue;
                }
                let mut entry = NominalEntry::skeleton(
                    id.clone(),
                    ty.kind,
                    Origin::Platform {
                        assembly: manifest.assembly.clone(),
                    },
                );
                entry.type_params = ty
                    .type_parameters
                    .iter()
                    .map(|name| TypeParamEntry {
                        name: name.clone(),
                        constraint: None,
                    })
                    .collect();
                entry.is_value_type = ty.is_value_type || entry.is_value_type;
                entry.is_abstract = ty.is_abstract;
                entry.is_sealed = ty.is_sealed;
                entry.is_static = ty.is_static;
                self.aliases.register(&id);
                loaded.push((self.insert_entry(entry), ty));
            }
        }

        self.register_primitives();

        let mut updates = Vec::with_capacity(loaded.len());
        for (slot, ty) in &loaded {
            let scope: Vec<String> = ty.type_parameters.clone();
            let resolve = |text: &str, scope: &[String]| self.platform_type(text, scope);
            let base = ty.base_type.as_deref().map(|b| resolve(b, &scope));
            let interfaces: Vec<IrType> = ty.interfaces.iter().map(|i| resolve(i, &scope)).collect();
            let members: Vec<MemberEntry> = ty
                .members
                .iter()
                .map(|m| self.platform_member(m, &scope))
                .collect();
            updates.push((*slot, base, interfaces, members));
        }
        for (slot, base, interfaces, members) in updates {
            let entry = &mut self.entries[slot];
            entry.base = base;
            entry.interfaces = interfaces;
            entry.members = members;
        }
    }

    fn register_primitives(&mut self) {
        for kind in PrimitiveKind::ALL {
            let Some(platform) = kind.platform_name() else {
                continue;
            };
            let id = TypeId::new(kind.surface_name(), platform);
            self.primitives.insert(id.clone(), kind);
            self.primitive_ids.insert(kind, id.clone());
            self.aliases.register_spelling(kind.surface_name(), &id);
            for alias in kind.keyword_aliases() {
                self.aliases.register_spelling(alias, &id);
            }
            if !self.index.contains_key(&id) {
                self.aliases.register(&id);
            }
        }
        for (spelling, kind) in KEYWORD_SPELLINGS {
            if let Some(id) = self.primitive_ids.get(kind).cloned() {
                self.aliases.register_spelling(spelling, &id);
            }
        }
        let object = TypeId::new("object", OBJECT_TYPE);
        self.aliases.register_spelling("object", &object);
    }

    fn platform_member(&self, member: &ManifestMember, scope: &[String]) -> MemberEntry {
        let modifiers = MemberModifiers {
            is_static: member.is_static,
            visibility: member.visibility,
            overridability: member.virtuality,
            readonly: member.readonly,
            optional: false,
            is_extension: member.is_extension,
        };
        let name = if member.kind == MemberKind::Constructor {
            "constructor".to_string()
        } else {
            member.name.clone()
        };
        let signatures = member
            .signatures
            .iter()
            .map(|sig| {
                let mut scope = scope.to_vec();
                scope.extend(sig.type_parameters.iter().cloned());
                SignatureEntry {
                    type_params: sig
                        .type_parameters
                        .iter()
                        .map(|name| TypeParamEntry {
                            name: name.clone(),
                            constraint: None,
                        })
                        .collect(),
                    params: sig
                        .parameters
                        .iter()
                        .map(|p| ParamEntry {
                            name: p.name.clone(),
                            ty: self.platform_type(&p.ty, &scope),
                            mode: p.mode,
                            optional: p.optional,
                            rest: p.params,
                        })
                        .collect(),
                    ret: self.platform_type(&sig.return_type, &scope),
                }
            })
            .collect();
        MemberEntry {
            name,
            kind: member.kind,
            signatures,
            ty: member.ty.as_deref().map(|t| self.platform_type(t, scope)),
            modifiers,
        }
    }

    /// Convert a manifest type string. Unknown names become `Unknown`.
    fn platform_type(&self, text: &str, scope: &[String]) -> IrType {
        match parse_type_ref(text) {
            Ok(type_ref) => self.platform_type_ref(&type_ref, scope),
            Err(err) => {
                tracing::warn!(%err, "unparsable manifest type");
                IrType::Unknown
            }
        }
    }

    fn platform_type_ref(&self, type_ref: &TypeRef, scope: &[String]) -> IrType {
        match type_ref {
            TypeRef::Array(elem) => IrType::Array(Box::new(self.platform_type_ref(elem, scope))),
            TypeRef::Nullable(inner) => self.platform_type_ref(inner, scope).nullable(),
            TypeRef::Named { name, args } => {
                if args.is_empty() && scope.iter().any(|p| p == name) {
                    return IrType::type_param(name);
                }
                let args: Vec<IrType> = args.iter().map(|a| self.platform_type_ref(a, scope)).collect();
                if let Some(shape) = delegate_shape(name, &args) {
                    return IrType::Function(Box::new(shape));
                }
                let resolved = if name.contains('`') {
                    self.aliases.resolve(name)
                } else {
                    self.aliases.resolve_with_arity(name, args.len())
                };
                match resolved {
                    Some(id) => self.type_for(id, args),
                    None => {
                        tracing::debug!(%name, "unresolved manifest type");
                        IrType::Unknown
                    }
                }
            }
        }
    }

    // ========================================================================
    // Registration (used by the source passes)
    // ========================================================================

    pub(crate) fn insert_entry(&mut self, entry: NominalEntry) -> usize {
        let slot = self.entries.len();
        self.index.insert(entry.id.clone(), slot);
        self.entries.push(entry);
        slot
    }

    pub(crate) fn register_source(&mut self, decl: DeclId, entry: NominalEntry) -> Option<usize> {
        if self.index.contains_key(&entry.id) {
            return None;
        }
        self.aliases.register_qualified(&entry.id);
        self.source_types.insert(decl, entry.id.clone());
        Some(self.insert_entry(entry))
    }

    pub(crate) fn entry_mut(&mut self, id: &TypeId) -> Option<&mut NominalEntry> {
        let slot = *self.index.get(id)?;
        self.entries.get_mut(slot)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn root_namespace(&self) -> &str {
        &self.root_namespace
    }

    pub fn entry(&self, id: &TypeId) -> Option<&NominalEntry> {
        self.index.get(id).and_then(|slot| self.entries.get(*slot))
    }

    pub fn contains(&self, id: &TypeId) -> bool {
        self.index.contains_key(id)
    }

    /// Every entry, in registration order.
    pub fn entries(&self) -> impl Iterator<Item = &NominalEntry> {
        self.entries.iter()
    }

    /// Canonical identity of a spelling.
    pub fn resolve_alias(&self, name: &str) -> Option<TypeId> {
        self.aliases.resolve(name).cloned()
    }

    pub fn resolve_with_arity(&self, name: &str, arity: usize) -> Option<TypeId> {
        self.aliases.resolve_with_arity(name, arity).cloned()
    }

    /// Whether a missing type of this name means the base library is
    /// incomplete rather than a user mistake.
    pub fn is_stdlib_type_name(&self, name: &str) -> bool {
        name == "System" || name.starts_with("System.") || TS_LIB_TYPES.contains(&name)
    }

    /// Type id of a source class, interface, enum or nominalized alias.
    pub fn source_type(&self, decl: DeclId) -> Option<&TypeId> {
        self.source_types.get(&decl)
    }

    pub fn primitive_of(&self, id: &TypeId) -> Option<PrimitiveKind> {
        self.primitives.get(id).copied()
    }

    pub fn primitive_id(&self, kind: PrimitiveKind) -> Option<&TypeId> {
        self.primitive_ids.get(&kind)
    }

    /// `IrType` for a nominal id, mapping primitive-backed ids to
    /// `Primitive`.
    pub fn type_for(&self, id: &TypeId, args: Vec<IrType>) -> IrType {
        match self.primitive_of(id) {
            Some(kind) => IrType::Primitive(kind),
            None => IrType::Reference {
                id: id.clone(),
                args,
            },
        }
    }

    pub fn object_type(&self) -> IrType {
        IrType::reference(TypeId::new("object", OBJECT_TYPE))
    }

    /// Reference to a well-known platform type by platform name.
    pub fn platform_reference(&self, platform_name: &str, args: Vec<IrType>) -> IrType {
        let id = TypeId::new(strip_arity(metadata_tail(platform_name)), platform_name);
        self.type_for(&id, args)
    }

    /// Nominal entry backing a type, if it has one. Arrays use
    /// `System.Array`; primitives use their platform struct.
    pub fn entry_of_type(&self, ty: &IrType) -> Option<(&NominalEntry, Vec<IrType>)> {
        match ty {
            IrType::Reference { id, args } => self.entry(id).map(|e| (e, args.clone())),
            IrType::Primitive(kind) => {
                let id = self.primitive_id(*kind)?;
                self.entry(id).map(|e| (e, Vec::new()))
            }
            IrType::Literal(_) => self.entry_of_type(&ty.widen_literal()),
            IrType::Array(_) => {
                let id = TypeId::new("Array", "System.Array");
                self.entry(&id).map(|e| (e, Vec::new()))
            }
            _ => None,
        }
    }

    /// Nearest member named `name` on `id` or its heritage: base classes
    /// first, then interfaces breadth-first.
    pub fn lookup_member_with_inheritance(
        &self,
        id: &TypeId,
        name: &str,
    ) -> Option<(&NominalEntry, &MemberEntry)> {
        let entry = self.entry(id)?;
        let args = entry
            .type_params
            .iter()
            .map(|p| IrType::type_param(&p.name))
            .collect();
        self.find_member(id, args, name, false)
            .map(|found| (found.declaring, found.member))
    }

    /// Member lookup on a receiver type, with the receiver's type arguments
    /// threaded through the heritage graph.
    pub fn lookup_member(&self, receiver: &IrType, name: &str) -> Option<MemberLookup<'_>> {
        let (entry, args) = self.entry_of_type(receiver)?;
        self.find_member(&entry.id, args, name, false)
    }

    /// Like [`Universe::lookup_member`], but starting above `id` (for
    /// `super.x` and override checks).
    pub fn lookup_inherited_member(&self, id: &TypeId, name: &str) -> Option<MemberLookup<'_>> {
        let entry = self.entry(id)?;
        let args = entry
            .type_params
            .iter()
            .map(|p| IrType::type_param(&p.name))
            .collect();
        self.find_member(id, args, name, true)
    }

    fn find_member(
        &self,
        id: &TypeId,
        args: Vec<IrType>,
        name: &str,
        skip_self: bool,
    ) -> Option<MemberLookup<'_>> {
        let object = TypeId::new("object", OBJECT_TYPE);
        let mut visited: HashSet<TypeId> = HashSet::new();
        let mut interfaces: VecDeque<(TypeId, Vec<IrType>)> = VecDeque::new();

        // Class chain first.
        let mut current = Some((id.clone(), args));
        let mut first = true;
        while let Some((cur_id, cur_args)) = current.take() {
            if !visited.insert(cur_id.clone()) {
                break;
            }
            let Some(entry) = self.entry(&cur_id) else {
                break;
            };
            let map = substitution(entry, &cur_args);
            if !(first && skip_self)
                && let Some(member) = entry.member(name)
            {
                return Some(MemberLookup {
                    declaring: entry,
                    member,
                    substitution: map,
                });
            }
            first = false;
            for iface in &entry.interfaces {
                if let IrType::Reference { id, args } = iface.substitute(&map) {
                    interfaces.push_back((id, args));
                }
            }
            current = match entry.base.as_ref().map(|b| b.substitute(&map)) {
                Some(IrType::Reference { id, args }) => Some((id, args)),
                _ if cur_id != object => Some((object.clone(), Vec::new())),
                _ => None,
            };
        }

        // Then interfaces, breadth-first.
        while let Some((iface_id, iface_args)) = interfaces.pop_front() {
            if !visited.insert(iface_id.clone()) {
                continue;
            }
            let Some(entry) = self.entry(&iface_id) else {
                continue;
            };
            let map = substitution(entry, &iface_args);
            if let Some(member) = entry.member(name) {
                return Some(MemberLookup {
                    declaring: entry,
                    member,
                    substitution: map,
                });
            }
            for parent in &entry.interfaces {
                if let IrType::Reference { id, args } = parent.substitute(&map) {
                    interfaces.push_back((id, args));
                }
            }
        }
        None
    }

    /// Whether `id` is `ancestor` or inherits from it through any path.
    pub fn inherits_from(&self, id: &TypeId, ancestor: &TypeId) -> bool {
        let mut queue = VecDeque::from([id.clone()]);
        let mut seen = HashSet::new();
        while let Some(current) = queue.pop_front() {
            if &current == ancestor {
                return true;
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            let Some(entry) = self.entry(&current) else {
                continue;
            };
            for parent in entry.base.iter().chain(entry.interfaces.iter()) {
                if let IrType::Reference { id, .. } = parent {
                    queue.push_back(id.clone());
                }
            }
        }
        false
    }

    /// Whether the entry is a source interface whose members are all
    /// properties, which is emitted as a class.
    pub fn is_data_shape(&self, entry: &NominalEntry) -> bool {
        entry.kind == NominalKind::Interface
            && entry.origin.is_source()
            && entry
                .members
                .iter()
                .all(|m| matches!(m.kind, MemberKind::Property | MemberKind::Field))
            && !entry.members.is_empty()
    }
}

fn substitution(entry: &NominalEntry, args: &[IrType]) -> HashMap<Arc<str>, IrType> {
    entry
        .type_params
        .iter()
        .zip(args)
        .filter(|(param, arg)| !matches!(arg, IrType::TypeParameter(n) if **n == *param.name))
        .map(|(param, arg)| (Arc::from(param.name.as_str()), arg.clone()))
        .collect()
}

fn metadata_tail(platform_name: &str) -> &str {
    platform_name
        .rsplit_once('.')
        .map(|(_, tail)| tail)
        .unwrap_or(platform_name)
}

/// `System.Func`N` and `System.Action`N` become function shapes.
fn delegate_shape(name: &str, args: &[IrType]) -> Option<FunctionShape> {
    let base = strip_arity(name);
    let base = base.strip_prefix("System.").unwrap_or(base);
    let param = |(i, ty): (usize, &IrType)| FunctionParam {
        name: format!("arg{}", i + 1),
        ty: ty.clone(),
        optional: false,
        rest: false,
    };
    match base {
        "Func" => {
            let (ret, params) = args.split_last()?;
            Some(FunctionShape {
                params: params.iter().enumerate().map(param).collect(),
                ret: ret.clone(),
                is_async: false,
            })
        }
        "Action" => Some(FunctionShape {
            params: args.iter().enumerate().map(param).collect(),
            ret: IrType::void(),
            is_async: false,
        }),
        _ => None,
    }
}

fn report_skipped_manifest(err: &ManifestError, diags: &mut Diagnostics) {
    tracing::warn!(%err, "skipping metadata manifest");
    diags.push(Diagnostic::warning(
        codes::MANIFEST_SKIPPED,
        format!("metadata manifest skipped: {}", err),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PrimitiveKind;

    fn platform() -> Universe {
        let mut diags = Diagnostics::new();
        let universe = Universe::platform(&CatalogOptions::default(), &mut diags);
        assert!(diags.is_empty());
        universe
    }

    #[test]
    fn test_alias_idempotence() {
        let universe = platform();
        let groups: &[&[&str]] = &[
            &["number", "double", "Double", "System.Double"],
            &["int", "Int32", "System.Int32"],
            &["string", "String", "System.String"],
            &["boolean", "bool", "Boolean", "System.Boolean"],
            &[
                "List",
                "List`1",
                "List_1",
                "List_1$instance",
                "System.Collections.Generic.List`1",
                "System.Collections.Generic.List_1",
            ],
            &["Dictionary`2", "Dictionary_2", "System.Collections.Generic.Dictionary`2"],
        ];
        for group in groups {
            let first = universe.resolve_alias(group[0]).unwrap();
            for spelling in &group[1..] {
                assert_eq!(universe.resolve_alias(spelling).as_ref(), Some(&first), "{}", spelling);
            }
        }
    }

    #[test]
    fn test_manifest_types_map_to_primitives() {
        let universe = platform();
        let id = universe.resolve_alias("Math").unwrap();
        let max = universe.entry(&id).unwrap().member("Max").unwrap();
        assert_eq!(max.signatures.len(), 3);
        assert_eq!(max.signatures[1].params[0].ty, IrType::Primitive(PrimitiveKind::Int));
        assert_eq!(max.signatures[0].ret, IrType::number());
    }

    #[test]
    fn test_delegates_become_function_shapes() {
        let universe = platform();
        let id = universe.resolve_alias("Enumerable").unwrap();
        let select = universe.entry(&id).unwrap().member("Select").unwrap();
        assert!(select.modifiers.is_extension);
        match &select.signatures[0].params[1].ty {
            IrType::Function(shape) => {
                assert_eq!(shape.params.len(), 1);
                assert_eq!(shape.ret, IrType::type_param("TResult"));
            }
            other => panic!("expected function shape, got {}", other),
        }
    }

    #[test]
    fn test_lookup_walks_bases_then_interfaces() {
        let universe = platform();
        let list = universe.resolve_alias("List").unwrap();
        let receiver = IrType::Reference {
            id: list.clone(),
            args: vec![IrType::string()],
        };

        let add = universe.lookup_member(&receiver, "Add").unwrap();
        assert_eq!(add.declaring.id, list);
        assert_eq!(add.instantiated_signatures()[0].params[0].ty, IrType::string());

        let to_string = universe.lookup_member(&receiver, "ToString").unwrap();
        assert_eq!(to_string.declaring.id.platform_name.as_ref(), "System.Object");

        let get_enumerator = universe.lookup_member(&receiver, "GetEnumerator").unwrap();
        let ret = &get_enumerator.instantiated_signatures()[0].ret;
        assert_eq!(ret.canonical(), "System.Collections.Generic.IEnumerator`1<System.String>");
    }

    #[test]
    fn test_unregistered_queries_return_none() {
        let universe = platform();
        let missing = TypeId::new("Nope", "Acme.Nope");
        assert!(universe.entry(&missing).is_none());
        assert!(universe.lookup_member_with_inheritance(&missing, "x").is_none());
        assert!(universe.resolve_alias("Nope").is_none());
    }

    #[test]
    fn test_stdlib_names() {
        let universe = platform();
        assert!(universe.is_stdlib_type_name("System.Text.StringBuilder"));
        assert!(universe.is_stdlib_type_name("Date"));
        assert!(!universe.is_stdlib_type_name("Acme.Widget"));
    }

    #[test]
    fn test_broken_manifest_is_skipped_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Bad.manifest.json"), "{").unwrap();
        let options = CatalogOptions {
            metadata_roots: vec![dir.path().to_path_buf()],
            ..Default::default()
        };
        let mut diags = Diagnostics::new();
        let universe = Universe::platform(&options, &mut diags);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.iter().next().unwrap().code, codes::MANIFEST_SKIPPED);
        assert!(universe.resolve_alias("List").is_some());
    }
}
