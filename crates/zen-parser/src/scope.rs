//! Lexical scopes.
//!
//! Scopes live in a [`Scopes`] arena and refer to their parent by
//! [`ScopeId`]; AST nodes carry the id of the scope they were parsed in.
//! Each scope holds two tables: a function table the parser both fills and
//! consults during disambiguation, and a variable table reserved for the
//! evaluator.

use crate::ast::Param;
use indexmap::IndexMap;

/// Index of a scope inside a [`Scopes`] arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ScopeId(pub(crate) u32);

impl ScopeId {
    /// The global scope, present in every arena.
    pub const GLOBAL: ScopeId = ScopeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Parse-time view of a function definition: the signature, which is all
/// the parser needs for call/object-literal disambiguation.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FunctionSig {
    pub name: String,
    pub params: Vec<Param>,
}

/// A variable binding slot. Runtime values belong to the evaluator and live
/// outside the front end.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct VarBinding {
    pub name: String,
}

/// A single lexical scope with an optional parent.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    parent: Option<ScopeId>,
    functions: IndexMap<String, FunctionSig>,
    variables: IndexMap<String, VarBinding>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_parent(parent: ScopeId) -> Self {
        Self {
            parent: Some(parent),
            ..Self::default()
        }
    }

    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    /// Register a function. Re-definitions replace the previous entry while
    /// keeping its position: latest wins, insertion order preserved.
    pub fn add_function(&mut self, def: FunctionSig) {
        self.functions.insert(def.name.clone(), def);
    }

    /// Look up a function in this scope only; see [`Scopes::function`] for
    /// the chain-walking variant.
    pub fn get_function(&self, name: &str) -> Option<&FunctionSig> {
        self.functions.get(name)
    }

    /// Register a variable. Upsert by name: an existing binding is kept so
    /// the evaluator's runtime state survives re-definition.
    pub fn add_variable(&mut self, def: VarBinding) {
        self.variables.entry(def.name.clone()).or_insert(def);
    }

    pub fn get_variable(&self, name: &str) -> Option<&VarBinding> {
        self.variables.get(name)
    }
}

/// Arena of all scopes created for one program.
#[derive(Debug)]
pub struct Scopes {
    scopes: Vec<Scope>,
}

impl Scopes {
    /// A fresh arena containing only [`ScopeId::GLOBAL`].
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new()],
        }
    }

    /// Create a child of `parent` and return its id.
    pub fn enter(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::with_parent(parent));
        id
    }

    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    pub fn add_function(&mut self, id: ScopeId, def: FunctionSig) {
        self.get_mut(id).add_function(def);
    }

    /// Look up a function starting at `id` and walking the parent chain.
    pub fn function(&self, id: ScopeId, name: &str) -> Option<&FunctionSig> {
        let mut current = Some(id);
        while let Some(id) = current {
            let scope = self.get(id);
            if let Some(def) = scope.get_function(name) {
                return Some(def);
            }
            current = scope.parent();
        }
        None
    }

    /// Whether `name` resolves to a function from `id`.
    pub fn is_function(&self, id: ScopeId, name: &str) -> bool {
        self.function(id, name).is_some()
    }

    pub fn add_variable(&mut self, id: ScopeId, def: VarBinding) {
        self.get_mut(id).add_variable(def);
    }

    /// Look up a variable starting at `id` and walking the parent chain.
    pub fn variable(&self, id: ScopeId, name: &str) -> Option<&VarBinding> {
        let mut current = Some(id);
        while let Some(id) = current {
            let scope = self.get(id);
            if let Some(def) = scope.get_variable(name) {
                return Some(def);
            }
            current = scope.parent();
        }
        None
    }
}

impl Default for Scopes {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(name: &str) -> FunctionSig {
        FunctionSig {
            name: name.into(),
            params: Vec::new(),
        }
    }

    #[test]
    fn function_lookup_walks_the_parent_chain() {
        let mut scopes = Scopes::new();
        scopes.add_function(ScopeId::GLOBAL, sig("outer"));

        let inner = scopes.enter(ScopeId::GLOBAL);
        scopes.add_function(inner, sig("inner"));

        assert!(scopes.is_function(inner, "inner"));
        assert!(scopes.is_function(inner, "outer"));
        assert!(!scopes.is_function(ScopeId::GLOBAL, "inner"));
    }

    #[test]
    fn function_redefinition_latest_wins() {
        let mut scope = Scope::new();
        scope.add_function(FunctionSig {
            name: "f".into(),
            params: vec![Param::Name("a".into())],
        });
        scope.add_function(FunctionSig {
            name: "f".into(),
            params: vec![Param::Name("a".into()), Param::Name("b".into())],
        });

        assert_eq!(scope.get_function("f").unwrap().params.len(), 2);
    }

    #[test]
    fn variable_upsert_keeps_existing_binding() {
        let mut scope = Scope::new();
        scope.add_variable(VarBinding { name: "x".into() });
        scope.add_variable(VarBinding { name: "x".into() });
        scope.add_variable(VarBinding { name: "y".into() });

        assert!(scope.get_variable("x").is_some());
        assert!(scope.get_variable("y").is_some());
        assert!(scope.get_variable("z").is_none());
    }

    #[test]
    fn sibling_scopes_do_not_leak() {
        let mut scopes = Scopes::new();
        let a = scopes.enter(ScopeId::GLOBAL);
        let b = scopes.enter(ScopeId::GLOBAL);
        scopes.add_function(a, sig("only_in_a"));

        assert!(scopes.is_function(a, "only_in_a"));
        assert!(!scopes.is_function(b, "only_in_a"));
    }
}
