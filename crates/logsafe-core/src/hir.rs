//! Host model: symbols, types and typed trees handed to the engine
//!
//! The engine never parses source. A host compiler supplies symbol
//! information through [`SymbolTable`] and procedure bodies either as
//! [`Procedure`] trees (lowered by [`crate::dataflow::CfgBuilder`]) or as a
//! ready-made [`crate::dataflow::Cfg`]. [`Program`] is an in-memory symbol
//! table used by tests and by hosts without their own representation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a declaration in the host symbol table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    pub fn is_numeric(self) -> bool {
        !matches!(self, PrimitiveKind::Boolean)
    }

    /// Position in the numeric widening order (`byte < short < int < long < float < double`)
    fn width(self) -> u8 {
        match self {
            PrimitiveKind::Boolean => 0,
            PrimitiveKind::Byte => 1,
            PrimitiveKind::Short | PrimitiveKind::Char => 2,
            PrimitiveKind::Int => 3,
            PrimitiveKind::Long => 4,
            PrimitiveKind::Float => 5,
            PrimitiveKind::Double => 6,
        }
    }

    /// Whether converting `self` to `target` is a widening conversion.
    ///
    /// `char` is unsigned: it widens only to `int` and above, and no other
    /// type widens to it.
    pub fn widens_to(self, target: PrimitiveKind) -> bool {
        match (self, target) {
            _ if self == target => true,
            (_, PrimitiveKind::Char) => false,
            (PrimitiveKind::Char, _) => target.width() >= PrimitiveKind::Int.width(),
            _ => self.width() <= target.width(),
        }
    }
}

/// Static type of an expression or declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Primitive(PrimitiveKind),
    /// A class or interface type, identified by its declaring symbol
    Declared(SymbolId),
    Array(Box<Type>),
    Null,
    Void,
}

impl Type {
    /// Symbol that declares this type, if it has one
    pub fn declaring_symbol(&self) -> Option<SymbolId> {
        match self {
            Type::Declared(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self {
            Type::Primitive(p) => Some(*p),
            _ => None,
        }
    }
}

/// What kind of declaration a symbol is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolKind {
    Method {
        params: Vec<SymbolId>,
        return_type: Type,
        is_static: bool,
        is_constructor: bool,
    },
    StaticInitializer,
    Field {
        ty: Type,
        is_static: bool,
    },
    Parameter {
        ty: Type,
        owner: SymbolId,
    },
    LocalVariable {
        ty: Type,
        is_constant: bool,
    },
    Type,
}

/// A declaration with its annotations and overridden declarations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    /// Fully-qualified annotation names present on the declaration
    pub annotations: Vec<String>,
    /// Declarations this one overrides (methods only)
    pub overrides: Vec<SymbolId>,
}

impl Symbol {
    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.iter().any(|a| a == name)
    }

    /// Declared type of a field, parameter or local variable
    pub fn declared_type(&self) -> Option<&Type> {
        match &self.kind {
            SymbolKind::Field { ty, .. }
            | SymbolKind::Parameter { ty, .. }
            | SymbolKind::LocalVariable { ty, .. } => Some(ty),
            SymbolKind::Method { return_type, .. } => Some(return_type),
            SymbolKind::StaticInitializer | SymbolKind::Type => None,
        }
    }

    pub fn is_static_field(&self) -> bool {
        matches!(self.kind, SymbolKind::Field { is_static: true, .. })
    }

    pub fn is_constant_local(&self) -> bool {
        matches!(self.kind, SymbolKind::LocalVariable { is_constant: true, .. })
    }

    /// Methods that can participate in dynamic dispatch
    pub fn is_overridable_method(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::Method {
                is_static: false,
                is_constructor: false,
                ..
            }
        )
    }
}

/// Read access to the host's symbol information
///
/// Implementations must answer every query for ids they handed out; unknown
/// ids simply yield `None` / an empty slice.
pub trait SymbolTable {
    fn symbol(&self, id: SymbolId) -> Option<&Symbol>;

    /// Declarations directly overridden by `id`
    fn overridden_declarations_of(&self, id: SymbolId) -> &[SymbolId] {
        match self.symbol(id) {
            Some(symbol) => symbol.overrides.as_slice(),
            None => &[],
        }
    }

    /// Formal parameters of a method, in declaration order
    fn parameters_of(&self, method: SymbolId) -> &[SymbolId] {
        match self.symbol(method).map(|s| &s.kind) {
            Some(SymbolKind::Method { params, .. }) => params.as_slice(),
            _ => &[],
        }
    }
}

/// In-memory symbol table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    symbols: Vec<Symbol>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    fn push(&mut self, name: &str, kind: SymbolKind) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol {
            id,
            name: name.to_string(),
            kind,
            annotations: Vec::new(),
            overrides: Vec::new(),
        });
        id
    }

    pub fn add_type(&mut self, name: &str) -> SymbolId {
        self.push(name, SymbolKind::Type)
    }

    /// Add an instance method; parameters are added with [`Program::add_parameter`]
    pub fn add_method(&mut self, name: &str, return_type: Type) -> SymbolId {
        self.push(
            name,
            SymbolKind::Method {
                params: Vec::new(),
                return_type,
                is_static: false,
                is_constructor: false,
            },
        )
    }

    pub fn add_static_method(&mut self, name: &str, return_type: Type) -> SymbolId {
        self.push(
            name,
            SymbolKind::Method {
                params: Vec::new(),
                return_type,
                is_static: true,
                is_constructor: false,
            },
        )
    }

    /// Add a constructor for `class`
    pub fn add_constructor(&mut self, class: SymbolId) -> SymbolId {
        self.push(
            "<init>",
            SymbolKind::Method {
                params: Vec::new(),
                return_type: Type::Declared(class),
                is_static: false,
                is_constructor: true,
            },
        )
    }

    pub fn add_static_initializer(&mut self) -> SymbolId {
        self.push("<clinit>", SymbolKind::StaticInitializer)
    }

    /// Append a parameter to `method`'s parameter list
    pub fn add_parameter(&mut self, method: SymbolId, name: &str, ty: Type) -> SymbolId {
        let id = self.push(name, SymbolKind::Parameter { ty, owner: method });
        if let Some(Symbol {
            kind: SymbolKind::Method { params, .. },
            ..
        }) = self.symbols.get_mut(method.0 as usize)
        {
            params.push(id);
        }
        id
    }

    pub fn add_field(&mut self, name: &str, ty: Type) -> SymbolId {
        self.push(name, SymbolKind::Field { ty, is_static: false })
    }

    pub fn add_static_field(&mut self, name: &str, ty: Type) -> SymbolId {
        self.push(name, SymbolKind::Field { ty, is_static: true })
    }

    pub fn add_local(&mut self, name: &str, ty: Type) -> SymbolId {
        self.push(name, SymbolKind::LocalVariable { ty, is_constant: false })
    }

    /// Add a local holding a compile-time constant
    pub fn add_constant(&mut self, name: &str, ty: Type) -> SymbolId {
        self.push(name, SymbolKind::LocalVariable { ty, is_constant: true })
    }

    pub fn annotate(&mut self, id: SymbolId, annotation: &str) -> &mut Self {
        if let Some(symbol) = self.symbols.get_mut(id.0 as usize) {
            symbol.annotations.push(annotation.to_string());
        }
        self
    }

    /// Record that `method` overrides `overridden`
    pub fn add_override(&mut self, method: SymbolId, overridden: SymbolId) -> &mut Self {
        if let Some(symbol) = self.symbols.get_mut(method.0 as usize) {
            symbol.overrides.push(overridden);
        }
        self
    }
}

impl SymbolTable for Program {
    fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0 as usize)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    Long(i64),
    Float(f32),
    Double(f64),
    Bool(bool),
    Char(char),
    String(String),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Plus,
    BitNot,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    UShr,
    BitAnd,
    BitOr,
    BitXor,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

/// Typed expression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    /// Static result type
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Literal(Literal),
    /// Reference to a local variable or parameter
    Local(SymbolId),
    /// Field read; `receiver` is `None` for static fields and implicit `this`
    Field {
        receiver: Option<Box<Expr>>,
        field: SymbolId,
    },
    Call {
        receiver: Option<Box<Expr>>,
        method: SymbolId,
        args: Vec<Expr>,
    },
    New {
        constructor: SymbolId,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    /// `target op= value`
    CompoundAssign {
        op: BinaryOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    ArrayAccess {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    NewArray {
        dimensions: Vec<Expr>,
        initializers: Vec<Expr>,
    },
    Cast {
        target: Type,
        operand: Box<Expr>,
    },
    InstanceOf {
        operand: Box<Expr>,
        target: Type,
    },
    Paren(Box<Expr>),
    This,
    Super,
    Lambda,
    MethodReference,
    ClassLiteral(Type),
}

impl Expr {
    pub fn new(kind: ExprKind, ty: Type) -> Self {
        Self { kind, ty }
    }

    pub fn literal(lit: Literal, ty: Type) -> Self {
        Self::new(ExprKind::Literal(lit), ty)
    }

    pub fn string(value: &str, string_type: SymbolId) -> Self {
        Self::literal(Literal::String(value.to_string()), Type::Declared(string_type))
    }

    pub fn local(var: SymbolId, ty: Type) -> Self {
        Self::new(ExprKind::Local(var), ty)
    }

    pub fn call(method: SymbolId, args: Vec<Expr>, ty: Type) -> Self {
        Self::new(
            ExprKind::Call {
                receiver: None,
                method,
                args,
            },
            ty,
        )
    }

    pub fn field(receiver: Option<Expr>, field: SymbolId, ty: Type) -> Self {
        Self::new(
            ExprKind::Field {
                receiver: receiver.map(Box::new),
                field,
            },
            ty,
        )
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        let ty = target.ty.clone();
        Self::new(
            ExprKind::Assign {
                target: Box::new(target),
                value: Box::new(value),
            },
            ty,
        )
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr, ty: Type) -> Self {
        Self::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            ty,
        )
    }

    pub fn paren(inner: Expr) -> Self {
        let ty = inner.ty.clone();
        Self::new(ExprKind::Paren(Box::new(inner)), ty)
    }

    /// Remove any number of enclosing parentheses
    pub fn skip_parens(&self) -> &Expr {
        let mut expr = self;
        while let ExprKind::Paren(inner) = &expr.kind {
            expr = inner;
        }
        expr
    }

    /// Declaration this expression directly refers to, if any
    pub fn referenced_symbol(&self) -> Option<SymbolId> {
        match &self.skip_parens().kind {
            ExprKind::Local(id) => Some(*id),
            ExprKind::Field { field, .. } => Some(*field),
            ExprKind::Call { method, .. } => Some(*method),
            ExprKind::New { constructor, .. } => Some(*constructor),
            _ => None,
        }
    }
}

/// Structured statement of a procedure body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    LocalDecl {
        var: SymbolId,
        init: Option<Expr>,
    },
    Expr(Expr),
    If {
        condition: Expr,
        then_body: Vec<Stmt>,
        else_body: Option<Vec<Stmt>>,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
    },
    Switch {
        selector: Expr,
        cases: Vec<SwitchCase>,
        default: Option<Vec<Stmt>>,
    },
    Return(Option<Expr>),
    Throw(Expr),
    Assert {
        condition: Expr,
        detail: Option<Expr>,
    },
    Synchronized {
        lock: Expr,
        body: Vec<Stmt>,
    },
    Block(Vec<Stmt>),
    Break,
    Continue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchCase {
    pub label: Expr,
    pub body: Vec<Stmt>,
}

/// A method body to analyze
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Procedure {
    pub method: SymbolId,
    pub params: Vec<SymbolId>,
    pub body: Vec<Stmt>,
}

impl Procedure {
    /// Procedure for `method` whose parameters are taken from the symbol table
    pub fn for_method<S: SymbolTable + ?Sized>(symbols: &S, method: SymbolId, body: Vec<Stmt>) -> Self {
        Self {
            method,
            params: symbols.parameters_of(method).to_vec(),
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_parameters_attach_to_owner() {
        let mut program = Program::new();
        let m = program.add_method("log", Type::Void);
        let a = program.add_parameter(m, "a", Type::Primitive(PrimitiveKind::Int));
        let b = program.add_parameter(m, "b", Type::Primitive(PrimitiveKind::Int));

        assert_eq!(program.parameters_of(m), &[a, b]);
        assert!(matches!(
            program.symbol(b).map(|s| &s.kind),
            Some(SymbolKind::Parameter { owner, .. }) if *owner == m
        ));
    }

    #[test]
    fn test_unknown_symbol_queries_are_empty() {
        let program = Program::new();
        assert!(program.symbol(SymbolId(7)).is_none());
        assert!(program.overridden_declarations_of(SymbolId(7)).is_empty());
        assert!(program.parameters_of(SymbolId(7)).is_empty());
    }

    #[test]
    fn test_skip_parens_and_referenced_symbol() {
        let mut program = Program::new();
        let string = program.add_type("String");
        let x = program.add_local("x", Type::Declared(string));
        let expr = Expr::paren(Expr::paren(Expr::local(x, Type::Declared(string))));

        assert!(matches!(expr.skip_parens().kind, ExprKind::Local(_)));
        assert_eq!(expr.referenced_symbol(), Some(x));
        assert_eq!(Expr::string("hi", string).referenced_symbol(), None);
    }

    #[test]
    fn test_widening_order() {
        assert!(PrimitiveKind::Int.widens_to(PrimitiveKind::Long));
        assert!(PrimitiveKind::Long.widens_to(PrimitiveKind::Double));
        assert!(!PrimitiveKind::Double.widens_to(PrimitiveKind::Int));
    }

    #[test]
    fn test_char_widening() {
        assert!(PrimitiveKind::Char.widens_to(PrimitiveKind::Char));
        assert!(PrimitiveKind::Char.widens_to(PrimitiveKind::Int));
        assert!(PrimitiveKind::Char.widens_to(PrimitiveKind::Double));
        assert!(!PrimitiveKind::Char.widens_to(PrimitiveKind::Short));
        assert!(!PrimitiveKind::Short.widens_to(PrimitiveKind::Char));
        assert!(!PrimitiveKind::Byte.widens_to(PrimitiveKind::Char));
        assert!(PrimitiveKind::Byte.widens_to(PrimitiveKind::Short));
    }
}
