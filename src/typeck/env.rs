use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::config::TypeErrorPolicy;
use crate::span::Span;
use super::types::{QuackType, TypeTable};

/// Context token threaded through inference: which table a name resolves in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ctx {
    pub class: String,
    /// `None` while inferring the constructor (or the top-level block).
    pub method: Option<String>,
}

impl Ctx {
    pub fn constructor(class: impl Into<String>) -> Self {
        Self { class: class.into(), method: None }
    }

    pub fn method(class: impl Into<String>, method: impl Into<String>) -> Self {
        Self { class: class.into(), method: Some(method.into()) }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodSignature {
    pub name: String,
    pub return_type: QuackType,
    /// False when the return type is inferred from `return` statements.
    pub return_declared: bool,
    pub formal_names: Vec<String>,
    pub formal_param_types: Vec<QuackType>,
    pub locals: TypeTable,
    pub declared_in: String,
    #[serde(skip)]
    pub span: Span,
}

impl MethodSignature {
    /// A fixed signature for a built-in method.
    pub fn builtin(declared_in: &str, name: &str, params: &[&str], ret: &str) -> Self {
        Self {
            name: name.to_string(),
            return_type: QuackType::class(ret),
            return_declared: true,
            formal_names: (0..params.len()).map(|i| format!("arg{i}")).collect(),
            formal_param_types: params.iter().map(|p| QuackType::class(*p)).collect(),
            locals: TypeTable::new(),
            declared_in: declared_in.to_string(),
            span: Span::dummy(),
        }
    }

    pub fn arity(&self) -> usize {
        self.formal_param_types.len()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassDescriptor {
    pub name: String,
    /// `None` only for the root class.
    pub parent: Option<String>,
    pub instance_vars: TypeTable,
    pub methods: BTreeMap<String, MethodSignature>,
    pub constructor: MethodSignature,
    pub method_order: Vec<String>,
    #[serde(skip)]
    pub resolved: bool,
    pub builtin: bool,
    #[serde(skip)]
    pub span: Span,
    #[serde(skip)]
    pub parent_span: Span,
}

impl ClassDescriptor {
    pub fn new(name: &str, parent: Option<&str>, span: Span) -> Self {
        Self {
            name: name.to_string(),
            parent: parent.map(str::to_string),
            instance_vars: TypeTable::new(),
            methods: BTreeMap::new(),
            constructor: MethodSignature {
                name: name.to_string(),
                return_type: QuackType::class(name),
                return_declared: true,
                formal_names: Vec::new(),
                formal_param_types: Vec::new(),
                locals: TypeTable::new(),
                declared_in: name.to_string(),
                span,
            },
            method_order: Vec::new(),
            resolved: false,
            builtin: false,
            span,
            parent_span: span,
        }
    }

    /// Add a locally declared method, keeping declaration order.
    pub fn add_method(&mut self, sig: MethodSignature) {
        if !self.methods.contains_key(&sig.name) {
            self.method_order.push(sig.name.clone());
        }
        self.methods.insert(sig.name.clone(), sig);
    }

    /// Methods this class declares itself, in declaration order.
    pub fn own_methods(&self) -> impl Iterator<Item = &MethodSignature> {
        self.method_order
            .iter()
            .filter_map(|m| self.methods.get(m))
            .filter(|sig| sig.declared_in == self.name)
    }
}

/// Registry of every class descriptor, the single owner of all type tables.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassHierarchy {
    pub classes: BTreeMap<String, ClassDescriptor>,
    /// Root-first order computed by the builder.
    pub order: Vec<String>,
}

impl ClassHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, desc: ClassDescriptor) {
        self.classes.insert(desc.name.clone(), desc);
    }

    pub fn get(&self, name: &str) -> Option<&ClassDescriptor> {
        self.classes.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ClassDescriptor> {
        self.classes.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// The chain `name, parent, grandparent, ...` up to the root. Stops at an
    /// unknown parent and never revisits a class.
    pub fn ancestors(&self, name: &str) -> Vec<&str> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.classes.get(name);
        while let Some(desc) = current {
            if !seen.insert(desc.name.as_str()) {
                break;
            }
            chain.push(desc.name.as_str());
            current = desc.parent.as_deref().and_then(|p| self.classes.get(p));
        }
        chain
    }

    pub fn is_subclass(&self, sub: &str, sup: &str) -> bool {
        self.ancestors(sub).contains(&sup)
    }

    /// `Bottom` conforms to everything and `Error` conforms both ways so one
    /// defect does not cascade.
    pub fn is_subtype(&self, sub: &QuackType, sup: &QuackType) -> bool {
        match (sub, sup) {
            (QuackType::Bottom, _) => true,
            (QuackType::Error, _) | (_, QuackType::Error) => true,
            (QuackType::Class(_), QuackType::Bottom) => false,
            (QuackType::Class(a), QuackType::Class(b)) => self.is_subclass(a, b),
        }
    }

    /// Least common ancestor with sticky `TypeError`.
    pub fn lca(&self, a: &QuackType, b: &QuackType) -> QuackType {
        self.lca_with(a, b, TypeErrorPolicy::Sticky)
    }

    pub fn lca_with(&self, a: &QuackType, b: &QuackType, policy: TypeErrorPolicy) -> QuackType {
        match (a, b) {
            (QuackType::Bottom, other) | (other, QuackType::Bottom) => other.clone(),
            (QuackType::Error, other) | (other, QuackType::Error) => match policy {
                TypeErrorPolicy::Sticky => QuackType::Error,
                TypeErrorPolicy::Heal => other.clone(),
            },
            (QuackType::Class(x), QuackType::Class(y)) => {
                if x == y {
                    return a.clone();
                }
                let path: HashSet<&str> = self.ancestors(x).into_iter().collect();
                self.ancestors(y)
                    .into_iter()
                    .find(|c| path.contains(c))
                    .map(QuackType::class)
                    .unwrap_or(QuackType::Error)
            }
        }
    }

    /// Resolve `method` on `class`, returning the live signature from the
    /// class that declares it. Walks the ancestor chain when the method was
    /// not propagated.
    pub fn lookup_method(&self, class: &str, method: &str) -> Option<&MethodSignature> {
        let found = self
            .ancestors(class)
            .into_iter()
            .find_map(|c| self.classes.get(c).and_then(|d| d.methods.get(method)))?;
        self.classes
            .get(&found.declared_in)
            .and_then(|d| d.methods.get(method))
            .or(Some(found))
    }

    /// Type of field `field` on instances of `class`.
    pub fn field_type(&self, class: &str, field: &str) -> Option<&QuackType> {
        self.ancestors(class)
            .into_iter()
            .find_map(|c| self.classes.get(c).and_then(|d| d.instance_vars.get(field)))
    }

    /// The class type a written type name denotes. The program pseudo-class
    /// cannot be named.
    pub fn resolve_type_name(&self, name: &str) -> Option<QuackType> {
        (self.contains(name) && name != super::builtins::PGM).then(|| QuackType::class(name))
    }

    /// Classes declared in the program, root-first.
    pub fn user_classes(&self) -> impl Iterator<Item = &ClassDescriptor> {
        self.order
            .iter()
            .filter_map(|n| self.classes.get(n))
            .filter(|d| !d.builtin)
    }
}
