//! Data model for one version of a package's exported interface.
//!
//! A front end (out of this crate) turns source code into a [`Package`]: a
//! [`Scope`] of named [`Symbol`]s whose types live in a [`TypeArena`]. Types
//! refer to each other by [`TypeId`], so self-referential and mutually
//! recursive declarations need no shared pointers.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::error::{ModelError, Result};

/// Index of a node inside a [`TypeArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(pub usize);

impl TypeId {
    fn shifted(self, offset: usize) -> Self {
        TypeId(self.0 + offset)
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Elementary type kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasicKind {
    Invalid,
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    UnsafePointer,
    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedComplex,
    UntypedString,
    UntypedNil,
}

impl BasicKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BasicKind::Invalid => "invalid",
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
            BasicKind::String => "string",
            BasicKind::UnsafePointer => "unsafe.Pointer",
            BasicKind::UntypedBool => "untyped bool",
            BasicKind::UntypedInt => "untyped int",
            BasicKind::UntypedRune => "untyped rune",
            BasicKind::UntypedFloat => "untyped float",
            BasicKind::UntypedComplex => "untyped complex",
            BasicKind::UntypedString => "untyped string",
            BasicKind::UntypedNil => "untyped nil",
        }
    }
}

impl fmt::Display for BasicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a channel type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelDir {
    #[default]
    SendRecv,
    Send,
    Recv,
}

impl ChannelDir {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelDir::SendRecv => "chan",
            ChannelDir::Send => "chan<-",
            ChannelDir::Recv => "<-chan",
        }
    }
}

/// A struct field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: TypeId,
    pub exported: bool,
    #[serde(default)]
    pub embedded: bool,
    /// Raw struct tag, empty when absent.
    #[serde(default)]
    pub tag: String,
}

impl Field {
    pub fn new(name: &str, ty: TypeId, exported: bool) -> Self {
        Self {
            name: name.to_string(),
            ty,
            exported,
            embedded: false,
            tag: String::new(),
        }
    }

    /// Set the struct tag.
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = tag.to_string();
        self
    }

    /// Mark as an embedded field.
    pub fn embedded(mut self) -> Self {
        self.embedded = true;
        self
    }
}

/// An interface method.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    /// Declaring package, used to qualify unexported method ids.
    #[serde(default)]
    pub pkg: Option<String>,
    pub exported: bool,
    pub signature: TypeId,
}

impl Method {
    pub fn new(name: &str, signature: TypeId, exported: bool) -> Self {
        Self {
            name: name.to_string(),
            pkg: None,
            exported,
            signature,
        }
    }

    /// Set the declaring package.
    pub fn with_pkg(mut self, pkg: &str) -> Self {
        self.pkg = Some(pkg.to_string());
        self
    }

    /// Method id: the bare name when exported, `pkg.name` otherwise.
    pub fn id(&self) -> String {
        match (&self.pkg, self.exported) {
            (Some(pkg), false) => format!("{}.{}", pkg, self.name),
            _ => self.name.clone(),
        }
    }
}

/// One node of the type graph.
///
/// Every variant except `Named` is compared structurally. `Named` carries a
/// name and the id of its underlying type; `underlying` is `None` until the
/// front end resolves it, which lets recursive declarations be built in two
/// steps (see [`TypeArena::declare_named`]).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeNode {
    Basic(BasicKind),
    /// `len` is `None` when the length could not be determined.
    Array {
        len: Option<u64>,
        elem: TypeId,
    },
    Slice {
        elem: TypeId,
    },
    Struct {
        fields: Vec<Field>,
    },
    Pointer {
        elem: TypeId,
    },
    /// Parameter or result list.
    Tuple {
        elems: Vec<TypeId>,
    },
    Signature {
        variadic: bool,
        params: TypeId,
        results: TypeId,
    },
    Interface {
        methods: Vec<Method>,
    },
    Map {
        key: TypeId,
        elem: TypeId,
    },
    Channel {
        dir: ChannelDir,
        elem: TypeId,
    },
    Named {
        name: String,
        underlying: Option<TypeId>,
    },
}

impl TypeNode {
    /// Short variant name used in diagnostics.
    pub fn variant_name(&self) -> &'static str {
        match self {
            TypeNode::Basic(_) => "basic",
            TypeNode::Array { .. } => "array",
            TypeNode::Slice { .. } => "slice",
            TypeNode::Struct { .. } => "struct",
            TypeNode::Pointer { .. } => "pointer",
            TypeNode::Tuple { .. } => "tuple",
            TypeNode::Signature { .. } => "signature",
            TypeNode::Interface { .. } => "interface",
            TypeNode::Map { .. } => "map",
            TypeNode::Channel { .. } => "channel",
            TypeNode::Named { .. } => "named",
        }
    }

    /// Ids of every node this one refers to directly.
    pub fn children(&self) -> Vec<TypeId> {
        match self {
            TypeNode::Basic(_) => Vec::new(),
            TypeNode::Array { elem, .. }
            | TypeNode::Slice { elem }
            | TypeNode::Pointer { elem }
            | TypeNode::Channel { elem, .. } => vec![*elem],
            TypeNode::Struct { fields } => fields.iter().map(|f| f.ty).collect(),
            TypeNode::Tuple { elems } => elems.clone(),
            TypeNode::Signature {
                params, results, ..
            } => vec![*params, *results],
            TypeNode::Interface { methods } => methods.iter().map(|m| m.signature).collect(),
            TypeNode::Map { key, elem } => vec![*key, *elem],
            TypeNode::Named { underlying, .. } => underlying.iter().copied().collect(),
        }
    }

    /// Copy of this node with every referenced id moved by `offset`.
    fn shifted(&self, offset: usize) -> TypeNode {
        let s = |id: &TypeId| id.shifted(offset);
        match self {
            TypeNode::Basic(kind) => TypeNode::Basic(*kind),
            TypeNode::Array { len, elem } => TypeNode::Array {
                len: *len,
                elem: s(elem),
            },
            TypeNode::Slice { elem } => TypeNode::Slice { elem: s(elem) },
            TypeNode::Struct { fields } => TypeNode::Struct {
                fields: fields
                    .iter()
                    .map(|f| Field {
                        ty: s(&f.ty),
                        ..f.clone()
                    })
                    .collect(),
            },
            TypeNode::Pointer { elem } => TypeNode::Pointer { elem: s(elem) },
            TypeNode::Tuple { elems } => TypeNode::Tuple {
                elems: elems.iter().map(s).collect(),
            },
            TypeNode::Signature {
                variadic,
                params,
                results,
            } => TypeNode::Signature {
                variadic: *variadic,
                params: s(params),
                results: s(results),
            },
            TypeNode::Interface { methods } => TypeNode::Interface {
                methods: methods
                    .iter()
                    .map(|m| Method {
                        signature: s(&m.signature),
                        ..m.clone()
                    })
                    .collect(),
            },
            TypeNode::Map { key, elem } => TypeNode::Map {
                key: s(key),
                elem: s(elem),
            },
            TypeNode::Channel { dir, elem } => TypeNode::Channel {
                dir: *dir,
                elem: s(elem),
            },
            TypeNode::Named { name, underlying } => TypeNode::Named {
                name: name.clone(),
                underlying: underlying.as_ref().map(s),
            },
        }
    }
}

/// Owning storage for the type graph of one package version.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeArena {
    nodes: Vec<TypeNode>,
}

impl TypeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node and return its id.
    pub fn add(&mut self, node: TypeNode) -> TypeId {
        self.nodes.push(node);
        TypeId(self.nodes.len() - 1)
    }

    /// Look up a node. `None` means the id is absent from this arena.
    pub fn get(&self, id: TypeId) -> Option<&TypeNode> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &TypeNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (TypeId(i), n))
    }

    /// Follow `Named` links down to the first structural node.
    ///
    /// Returns `None` for absent ids, unresolved names, and `Named` chains
    /// that loop back on themselves.
    pub fn resolve_underlying(&self, id: TypeId) -> Option<&TypeNode> {
        let mut current = id;
        for _ in 0..=self.nodes.len() {
            match self.get(current)? {
                TypeNode::Named { underlying, .. } => current = (*underlying)?,
                node => return Some(node),
            }
        }
        None
    }

    /// Whether following `Named` links from `id` loops forever without
    /// reaching a structural node (`type A B; type B A`).
    pub fn in_named_cycle(&self, id: TypeId) -> bool {
        let mut current = id;
        for _ in 0..=self.nodes.len() {
            match self.get(current) {
                Some(TypeNode::Named {
                    underlying: Some(next),
                    ..
                }) => current = *next,
                _ => return false,
            }
        }
        true
    }

    pub fn basic(&mut self, kind: BasicKind) -> TypeId {
        self.add(TypeNode::Basic(kind))
    }

    pub fn slice(&mut self, elem: TypeId) -> TypeId {
        self.add(TypeNode::Slice { elem })
    }

    pub fn pointer(&mut self, elem: TypeId) -> TypeId {
        self.add(TypeNode::Pointer { elem })
    }

    pub fn array(&mut self, len: Option<u64>, elem: TypeId) -> TypeId {
        self.add(TypeNode::Array { len, elem })
    }

    pub fn map(&mut self, key: TypeId, elem: TypeId) -> TypeId {
        self.add(TypeNode::Map { key, elem })
    }

    pub fn channel(&mut self, dir: ChannelDir, elem: TypeId) -> TypeId {
        self.add(TypeNode::Channel { dir, elem })
    }

    pub fn tuple(&mut self, elems: Vec<TypeId>) -> TypeId {
        self.add(TypeNode::Tuple { elems })
    }

    /// Add a signature along with its parameter and result tuples.
    pub fn signature(&mut self, params: Vec<TypeId>, results: Vec<TypeId>, variadic: bool) -> TypeId {
        let params = self.tuple(params);
        let results = self.tuple(results);
        self.add(TypeNode::Signature {
            variadic,
            params,
            results,
        })
    }

    pub fn structure(&mut self, fields: Vec<Field>) -> TypeId {
        self.add(TypeNode::Struct { fields })
    }

    pub fn interface(&mut self, methods: Vec<Method>) -> TypeId {
        self.add(TypeNode::Interface { methods })
    }

    /// Add a named type with a known underlying type.
    pub fn named(&mut self, name: &str, underlying: TypeId) -> TypeId {
        self.add(TypeNode::Named {
            name: name.to_string(),
            underlying: Some(underlying),
        })
    }

    /// Add a named type whose underlying type is filled in later with
    /// [`set_underlying`](Self::set_underlying). Needed for recursive types.
    pub fn declare_named(&mut self, name: &str) -> TypeId {
        self.add(TypeNode::Named {
            name: name.to_string(),
            underlying: None,
        })
    }

    /// Resolve a named type created by [`declare_named`](Self::declare_named).
    pub fn set_underlying(&mut self, named: TypeId, underlying: TypeId) -> Result<()> {
        match self.nodes.get_mut(named.0) {
            Some(TypeNode::Named { underlying: slot, .. }) => {
                *slot = Some(underlying);
                Ok(())
            }
            Some(_) => Err(ModelError::NotNamed { id: named.0 }),
            None => Err(ModelError::DanglingType {
                id: named.0,
                referrer: "set_underlying".to_string(),
            }),
        }
    }

    /// Check that every reference resolves and that composite member names
    /// are unique.
    pub fn validate(&self) -> Result<()> {
        for (id, node) in self.iter() {
            for child in node.children() {
                if self.get(child).is_none() {
                    return Err(ModelError::DanglingType {
                        id: child.0,
                        referrer: format!("type {}", id),
                    });
                }
            }

            match node {
                TypeNode::Struct { fields } => {
                    let mut seen = HashSet::new();
                    for field in fields.iter().filter(|f| f.exported) {
                        if !seen.insert(field.name.as_str()) {
                            return Err(ModelError::DuplicateField {
                                type_id: id.0,
                                field: field.name.clone(),
                            });
                        }
                    }
                }
                TypeNode::Interface { methods } => {
                    let mut seen = HashSet::new();
                    for method in methods {
                        let method_id = method.id();
                        if !seen.insert(method_id.clone()) {
                            return Err(ModelError::DuplicateMethod {
                                type_id: id.0,
                                method: method_id,
                            });
                        }
                    }
                }
                TypeNode::Named { .. } if self.in_named_cycle(id) => {
                    return Err(ModelError::NamedCycle { id: id.0 });
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn append(&mut self, other: TypeArena) -> usize {
        let offset = self.nodes.len();
        self.nodes
            .extend(other.nodes.iter().map(|node| node.shifted(offset)));
        offset
    }
}

/// What a package-level declaration declares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Constant,
    Variable,
    Struct,
    Interface,
    Function,
    /// Named type that is neither a struct nor an interface.
    Type,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Constant => "constant",
            SymbolKind::Variable => "variable",
            SymbolKind::Struct => "struct",
            SymbolKind::Interface => "interface",
            SymbolKind::Function => "function",
            SymbolKind::Type => "type",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named declaration at package scope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub exported: bool,
    pub kind: SymbolKind,
    pub ty: TypeId,
}

impl Symbol {
    pub fn new(name: &str, exported: bool, kind: SymbolKind, ty: TypeId) -> Self {
        Self {
            name: name.to_string(),
            exported,
            kind,
            ty,
        }
    }

    /// Describe a contradiction between the declared kind and the shape of
    /// the symbol's type, if there is one.
    ///
    /// Types that do not resolve at all are left to the comparator, which
    /// reports them as malformed.
    pub fn shape_mismatch(&self, types: &TypeArena) -> Option<String> {
        let node = types.resolve_underlying(self.ty)?;
        let expected = match self.kind {
            SymbolKind::Function => matches!(node, TypeNode::Signature { .. }),
            SymbolKind::Struct => matches!(node, TypeNode::Struct { .. }),
            SymbolKind::Interface => matches!(node, TypeNode::Interface { .. }),
            SymbolKind::Constant => matches!(node, TypeNode::Basic(_)),
            SymbolKind::Type => matches!(types.get(self.ty), Some(TypeNode::Named { .. })),
            SymbolKind::Variable => true,
        };
        if expected {
            None
        } else {
            Some(format!(
                "{} {:?} declared with {} type",
                self.kind,
                self.name,
                node.variant_name()
            ))
        }
    }
}

/// Name → symbol table for one package version, with the types its symbols
/// refer to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    #[serde(default)]
    pub symbols: BTreeMap<String, Symbol>,
    #[serde(default)]
    pub types: TypeArena,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_types(types: TypeArena) -> Self {
        Self {
            symbols: BTreeMap::new(),
            types,
        }
    }

    /// Insert a symbol, keyed by its own name.
    pub fn insert(&mut self, symbol: Symbol) -> Result<()> {
        if self.symbols.contains_key(&symbol.name) {
            return Err(ModelError::DuplicateSymbol { name: symbol.name });
        }
        self.symbols.insert(symbol.name.clone(), symbol);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.symbols.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Exported symbols in name order.
    pub fn exported(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values().filter(|s| s.exported)
    }

    /// Check the scope invariants: keys match symbol names, symbol types
    /// exist, and the type table is well formed.
    pub fn validate(&self) -> Result<()> {
        for (key, symbol) in &self.symbols {
            if key != &symbol.name {
                return Err(ModelError::KeyMismatch {
                    key: key.clone(),
                    name: symbol.name.clone(),
                });
            }
            if self.types.get(symbol.ty).is_none() {
                return Err(ModelError::DanglingType {
                    id: symbol.ty.0,
                    referrer: format!("symbol {:?}", symbol.name),
                });
            }
        }
        self.types.validate()
    }
}

/// A package version: its name and its scope.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    #[serde(default)]
    pub scope: Scope,
}

impl Package {
    pub fn new(name: &str, scope: Scope) -> Self {
        Self {
            name: name.to_string(),
            scope,
        }
    }

    /// Merge another partial model of the same package (typically one per
    /// source file) into this one.
    ///
    /// The other package's types are appended and its ids shifted. Nothing
    /// is modified if the names differ or a symbol name collides.
    pub fn combine(&mut self, other: Package) -> Result<()> {
        if self.name != other.name {
            return Err(ModelError::PackageNameMismatch {
                left: self.name.clone(),
                right: other.name,
            });
        }
        if let Some(name) = other
            .scope
            .names()
            .find(|name| self.scope.symbols.contains_key(*name))
        {
            return Err(ModelError::DuplicateSymbol {
                name: name.to_string(),
            });
        }

        let Scope { symbols, types } = other.scope;
        let offset = self.scope.types.append(types);
        for (name, mut symbol) in symbols {
            symbol.ty = symbol.ty.shifted(offset);
            self.scope.symbols.insert(name, symbol);
        }
        Ok(())
    }
}
