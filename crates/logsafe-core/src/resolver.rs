//! Declared safety of symbols, types and expressions
//!
//! Safety comes from annotations on the declaration itself. Overridable
//! methods and their parameters also inherit from the declarations they
//! override, so an implementation cannot silently weaken its interface.

use crate::config::AnnotationNames;
use crate::hir::{Expr, SymbolId, SymbolKind, SymbolTable, Type};
use crate::safety::Safety;
use std::collections::HashSet;
use tracing::warn;

pub struct SafetyResolver<'a, S: SymbolTable + ?Sized> {
    symbols: &'a S,
    annotations: &'a AnnotationNames,
}

impl<'a, S: SymbolTable + ?Sized> SafetyResolver<'a, S> {
    pub fn new(symbols: &'a S, annotations: &'a AnnotationNames) -> Self {
        Self { symbols, annotations }
    }

    pub fn symbols(&self) -> &'a S {
        self.symbols
    }

    /// Safety declared on a symbol or inherited through overrides.
    ///
    /// Unknown ids and unannotated declarations resolve to `Unknown`.
    pub fn resolve_symbol(&self, id: SymbolId) -> Safety {
        let mut visiting = HashSet::new();
        self.resolve_guarded(id, &mut visiting)
    }

    fn resolve_guarded(&self, id: SymbolId, visiting: &mut HashSet<SymbolId>) -> Safety {
        let Some(symbol) = self.symbols.symbol(id) else {
            return Safety::Unknown;
        };
        if let Some(declared) = self.annotations.declared_on(symbol) {
            return declared;
        }

        if !visiting.insert(id) {
            warn!(symbol = %id, name = %symbol.name, "override cycle while resolving safety");
            return Safety::Unknown;
        }

        let resolved = match &symbol.kind {
            SymbolKind::Method { .. } if symbol.is_overridable_method() => self
                .symbols
                .overridden_declarations_of(id)
                .iter()
                .fold(Safety::Unknown, |acc, &overridden| {
                    acc.restrictive_merge(self.resolve_guarded(overridden, visiting))
                }),
            SymbolKind::Parameter { owner, .. } => self.resolve_inherited_parameter(id, *owner, visiting),
            _ => Safety::Unknown,
        };

        visiting.remove(&id);
        resolved
    }

    /// Merge the safety of the parameter at the same position in every
    /// method the owner overrides
    fn resolve_inherited_parameter(&self, param: SymbolId, owner: SymbolId, visiting: &mut HashSet<SymbolId>) -> Safety {
        if !self.symbols.symbol(owner).is_some_and(|m| m.is_overridable_method()) {
            return Safety::Unknown;
        }
        let Some(index) = self.symbols.parameters_of(owner).iter().position(|&p| p == param) else {
            return Safety::Unknown;
        };

        self.symbols
            .overridden_declarations_of(owner)
            .iter()
            .filter_map(|&overridden| self.symbols.parameters_of(overridden).get(index).copied())
            .fold(Safety::Unknown, |acc, inherited| {
                acc.restrictive_merge(self.resolve_guarded(inherited, visiting))
            })
    }

    /// Safety of a type, taken from its declaring symbol
    pub fn resolve_type(&self, ty: &Type) -> Safety {
        ty.declaring_symbol()
            .map_or(Safety::Unknown, |id| self.resolve_symbol(id))
    }

    /// Safety of a declaration combined with that of its declared type
    pub fn resolve_declaration(&self, id: SymbolId) -> Safety {
        let declared_type = self
            .symbols
            .symbol(id)
            .and_then(|s| s.declared_type())
            .map_or(Safety::Unknown, |ty| self.resolve_type(ty));
        declared_type.combine_independent(self.resolve_symbol(id))
    }

    /// Safety of an expression from its static type and referenced symbol
    pub fn resolve_expression(&self, expr: &Expr) -> Safety {
        let expr = expr.skip_parens();
        let type_safety = self.resolve_type(&expr.ty);
        match expr.referenced_symbol() {
            Some(id) => type_safety.combine_independent(self.resolve_symbol(id)),
            None => type_safety,
        }
    }
}
