//! `Module`: a named, possibly nested, container of members.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::member::Member;

/// A module: a flat mapping of member names to members, plus a mapping of
/// child-module names to child `Module`s. The root module of a package
/// carries the package's own name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// This module's own (non-dotted) name.
    pub name: String,
    /// Child modules, keyed by their own (non-dotted) name.
    #[serde(default)]
    pub modules: IndexMap<String, Module>,
    /// Members declared directly in this module.
    #[serde(default)]
    pub members: IndexMap<String, Member>,
}

impl Module {
    /// An empty module with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Module {
            name: name.into(),
            modules: IndexMap::new(),
            members: IndexMap::new(),
        }
    }

    /// Insert (or replace) a direct child module.
    pub fn add_module(&mut self, module: Module) -> &mut Module {
        let name = module.name.clone();
        self.modules.insert(name.clone(), module);
        self.modules.get_mut(&name).unwrap()
    }

    /// Insert (or replace) a member declared directly in this module.
    pub fn add_member(&mut self, name: impl Into<String>, member: Member) {
        self.members.insert(name.into(), member);
    }

    /// Resolve a dot-separated module path (not including the member name)
    /// relative to this module, e.g. `"geometry.shapes"`. An empty path
    /// resolves to `self`.
    pub fn resolve_module_path(&self, path: &str) -> Option<&Module> {
        if path.is_empty() {
            return Some(self);
        }
        let mut current = self;
        for segment in path.split('.') {
            current = current.modules.get(segment)?;
        }
        Some(current)
    }

    /// Mutable variant of [`Module::resolve_module_path`], creating
    /// intermediate modules as needed. Used by test/demo builders.
    pub fn module_path_mut(&mut self, path: &str) -> &mut Module {
        if path.is_empty() {
            return self;
        }
        let mut current = self;
        for segment in path.split('.') {
            current = current
                .modules
                .entry(segment.to_string())
                .or_insert_with(|| Module::new(segment));
        }
        current
    }

    /// Look up a member by its full dotted path relative to this module,
    /// e.g. `"geometry.shapes.Circle"`.
    pub fn resolve_member(&self, path: &str) -> Option<&Member> {
        let (module_path, member_name) = path.rsplit_once('.').unwrap_or(("", path));
        self.resolve_module_path(module_path)?.members.get(member_name)
    }

    /// Depth-first iterator over every member in this module and its
    /// descendants, yielding `(dotted_path_from_self, member)`.
    pub fn iter_members(&self) -> Vec<(String, &Member)> {
        let mut out = Vec::new();
        self.collect_members(String::new(), &mut out);
        out
    }

    fn collect_members<'a>(&'a self, prefix: String, out: &mut Vec<(String, &'a Member)>) {
        for (name, member) in &self.members {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}.{name}")
            };
            out.push((path, member));
        }
        for (name, module) in &self.modules {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}.{name}")
            };
            module.collect_members(path, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    #[test]
    fn module_path_mut_creates_nesting() {
        let mut root = Module::new("pkg");
        root.module_path_mut("geometry.shapes")
            .add_member("Circle", crate::member::Member::Struct {
                fields: IndexMap::new(),
            });
        assert!(root.resolve_member("geometry.shapes.Circle").is_some());
    }

    #[test]
    fn resolve_member_top_level() {
        let mut root = Module::new("pkg");
        root.add_member(
            "compute",
            crate::member::Member::Func {
                params: vec![],
                ret: Type::int(),
            },
        );
        assert!(root.resolve_member("compute").is_some());
        assert!(root.resolve_member("missing").is_none());
    }

    #[test]
    fn iter_members_is_depth_first_with_dotted_paths() {
        let mut root = Module::new("pkg");
        root.add_member(
            "a",
            crate::member::Member::Func {
                params: vec![],
                ret: Type::int(),
            },
        );
        root.module_path_mut("nested").add_member(
            "b",
            crate::member::Member::Func {
                params: vec![],
                ret: Type::int(),
            },
        );
        let paths: Vec<String> = root.iter_members().into_iter().map(|(p, _)| p).collect();
        assert!(paths.contains(&"a".to_string()));
        assert!(paths.contains(&"nested.b".to_string()));
    }
}
