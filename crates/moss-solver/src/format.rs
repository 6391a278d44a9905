//! Rendering of types in canonical Moss syntax.
//!
//! Used by diagnostics (human-readable receiver/argument types) and by
//! [`crate::header::FunctionHeader::canonical`], whose output backends use as
//! a stable dedup key — so rendering must be deterministic for a given
//! interner state.

use crate::def::{DefinitionStore, TypeParamId};
use crate::intern::TypeInterner;
use crate::types::{StoredType, TypeData, TypeId};

pub struct TypeFormatter<'a> {
    interner: &'a TypeInterner,
    store: &'a DefinitionStore,
    /// When set, these parameters render positionally (`#0`, `#1`, ...)
    /// instead of by name, making output independent of the parsed names.
    positional: Option<&'a [TypeParamId]>,
}

impl<'a> TypeFormatter<'a> {
    pub fn new(interner: &'a TypeInterner, store: &'a DefinitionStore) -> Self {
        Self {
            interner,
            store,
            positional: None,
        }
    }

    pub fn with_positional_params(mut self, params: &'a [TypeParamId]) -> Self {
        self.positional = Some(params);
        self
    }

    pub fn format(&self, id: TypeId) -> String {
        let mut out = String::new();
        self.write(id, &mut out);
        out
    }

    pub fn format_stored(&self, stored: StoredType) -> String {
        match stored.storage {
            Some(storage) => format!("{} {}", storage.name(), self.format(stored.id)),
            None => self.format(stored.id),
        }
    }

    fn write(&self, id: TypeId, out: &mut String) {
        match self.interner.data(id) {
            TypeData::Invalid => out.push_str("<error>"),
            TypeData::Undetermined => out.push_str("undetermined"),
            TypeData::Primitive(kind) => out.push_str(kind.name()),
            TypeData::String => out.push_str("string"),
            TypeData::Array { element, dim } => {
                self.write(element, out);
                out.push('[');
                for _ in 1..dim {
                    out.push(',');
                }
                out.push(']');
            }
            TypeData::Assoc { key, value } => {
                self.write(value, out);
                out.push('[');
                self.write(key, out);
                out.push(']');
            }
            TypeData::GenericMap { value, key } => {
                self.write(value, out);
                out.push_str("[<");
                self.write_param(key, out);
                out.push_str(">]");
            }
            TypeData::Range { element } => {
                self.write(element, out);
                out.push_str(" .. ");
                self.write(element, out);
            }
            TypeData::Optional(inner) => {
                self.write(inner, out);
                out.push('?');
            }
            TypeData::Function(shape_id) => {
                let shape = self.interner.shape(shape_id);
                out.push('(');
                for (i, p) in shape.params.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write(p.ty, out);
                    if p.variadic {
                        out.push_str("...");
                    }
                }
                out.push_str(") => ");
                self.write(shape.return_type, out);
                if let Some(thrown) = shape.thrown_type {
                    out.push_str(" throws ");
                    self.write(thrown, out);
                }
            }
            TypeData::GenericParam(param) => self.write_param(param, out),
            TypeData::Definition { def, type_args } => {
                match self.store.get_name(def) {
                    Some(name) => out.push_str(&self.interner.resolve_atom(name)),
                    None => out.push_str("<unregistered>"),
                }
                if !type_args.is_empty() {
                    out.push('<');
                    for (i, &arg) in type_args.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        self.write(arg, out);
                    }
                    out.push('>');
                }
            }
        }
    }

    fn write_param(&self, param: TypeParamId, out: &mut String) {
        if let Some(params) = self.positional {
            if let Some(index) = params.iter().position(|&p| p == param) {
                out.push('#');
                out.push_str(&index.to_string());
                return;
            }
        }
        match self.store.param_name(param) {
            Some(name) => out.push_str(&self.interner.resolve_atom(name)),
            None => out.push_str("<param>"),
        }
    }
}

#[cfg(test)]
#[path = "../tests/format_tests.rs"]
mod tests;
