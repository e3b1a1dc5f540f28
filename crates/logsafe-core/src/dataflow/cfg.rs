//! Control Flow Graph over safety-relevant nodes
//!
//! Each basic block holds an ordered list of nodes. A node is one evaluated
//! construct (literal, operator, assignment, invocation, ...) whose operands
//! are earlier nodes. [`CfgBuilder`] lowers a [`Procedure`] into this form;
//! hosts with their own frontend can populate a [`Cfg`] directly.

use crate::hir::{
    BinaryOp, Expr, ExprKind, Literal, PrimitiveKind, Procedure, Stmt, SwitchCase, SymbolId, SymbolTable, Type,
    UnaryOp,
};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

/// Unique identifier for a basic block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub usize);

/// Unique identifier for a node within one CFG
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

pub type Operands = SmallVec<[NodeId; 4]>;

/// Every node kind the engine distinguishes
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Literal(Literal),
    NullCheck {
        operand: NodeId,
    },
    Unary {
        op: UnaryOp,
        operand: NodeId,
    },
    Binary {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    StringConcat {
        left: NodeId,
        right: NodeId,
    },
    /// `s += t` on strings
    StringConcatAssign {
        left: NodeId,
        right: NodeId,
    },
    Ternary {
        condition: NodeId,
        then_operand: NodeId,
        else_operand: NodeId,
    },
    Assignment {
        target: NodeId,
        value: NodeId,
    },
    LocalVariable {
        var: SymbolId,
    },
    VariableDeclaration {
        var: SymbolId,
    },
    FieldAccess {
        receiver: Option<NodeId>,
        field: SymbolId,
        is_static: bool,
    },
    NumericConversion {
        operand: NodeId,
        target: PrimitiveKind,
        widening: bool,
    },
    TypeCast {
        operand: NodeId,
        target: Type,
    },
    /// Implicit `toString()` of a concatenation operand
    StringConversion {
        operand: NodeId,
    },
    Return {
        result: Option<NodeId>,
    },
    MethodAccess {
        receiver: Option<NodeId>,
        method: SymbolId,
    },
    MethodInvocation {
        target: NodeId,
        method: SymbolId,
        args: Operands,
        result_type: Type,
    },
    ObjectCreation {
        constructor: SymbolId,
        args: Operands,
        ty: Type,
    },
    ArrayAccess {
        array: NodeId,
        index: NodeId,
    },
    ArrayCreation {
        dimensions: Operands,
        initializers: Operands,
    },
    ImplicitThis,
    ExplicitThis,
    Super,
    InstanceOf {
        operand: NodeId,
        target: Type,
    },
    Synchronized {
        lock: NodeId,
    },
    AssertionError {
        condition: NodeId,
        detail: Option<NodeId>,
    },
    Throw {
        exception: NodeId,
    },
    Case {
        selector: NodeId,
        label: NodeId,
    },
    MemberReference,
    Lambda,
    LambdaResult {
        result: NodeId,
    },
    ArrayType,
    ClassName {
        ty: Type,
    },
    PrimitiveType(PrimitiveKind),
    PackageName,
    ParameterizedType,
    ClassDeclaration,
    Marker(String),
}

impl NodeKind {
    /// Operand nodes in evaluation order
    pub fn operands(&self) -> Operands {
        let mut out = Operands::new();
        match self {
            NodeKind::NullCheck { operand }
            | NodeKind::Unary { operand, .. }
            | NodeKind::NumericConversion { operand, .. }
            | NodeKind::TypeCast { operand, .. }
            | NodeKind::StringConversion { operand }
            | NodeKind::InstanceOf { operand, .. } => out.push(*operand),
            NodeKind::Binary { left, right, .. }
            | NodeKind::StringConcat { left, right }
            | NodeKind::StringConcatAssign { left, right } => out.extend([*left, *right]),
            NodeKind::Ternary {
                condition,
                then_operand,
                else_operand,
            } => out.extend([*condition, *then_operand, *else_operand]),
            NodeKind::Assignment { target, value } => out.extend([*target, *value]),
            NodeKind::FieldAccess { receiver, .. } | NodeKind::MethodAccess { receiver, .. } => {
                out.extend(receiver.iter().copied())
            }
            NodeKind::Return { result } => out.extend(result.iter().copied()),
            NodeKind::MethodInvocation { target, args, .. } => {
                out.push(*target);
                out.extend(args.iter().copied());
            }
            NodeKind::ObjectCreation { args, .. } => out.extend(args.iter().copied()),
            NodeKind::ArrayAccess { array, index } => out.extend([*array, *index]),
            NodeKind::ArrayCreation {
                dimensions,
                initializers,
            } => out.extend(dimensions.iter().chain(initializers.iter()).copied()),
            NodeKind::Synchronized { lock } => out.push(*lock),
            NodeKind::AssertionError { condition, detail } => {
                out.push(*condition);
                out.extend(detail.iter().copied());
            }
            NodeKind::Throw { exception } => out.push(*exception),
            NodeKind::Case { selector, label } => out.extend([*selector, *label]),
            NodeKind::LambdaResult { result } => out.push(*result),
            NodeKind::Literal(_)
            | NodeKind::LocalVariable { .. }
            | NodeKind::VariableDeclaration { .. }
            | NodeKind::ImplicitThis
            | NodeKind::ExplicitThis
            | NodeKind::Super
            | NodeKind::MemberReference
            | NodeKind::Lambda
            | NodeKind::ArrayType
            | NodeKind::ClassName { .. }
            | NodeKind::PrimitiveType(_)
            | NodeKind::PackageName
            | NodeKind::ParameterizedType
            | NodeKind::ClassDeclaration
            | NodeKind::Marker(_) => {}
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub block: BlockId,
    pub kind: NodeKind,
}

/// How a basic block terminates
#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    /// Unconditional jump to another block
    Goto(BlockId),
    /// Conditional branch on an already-evaluated node
    Branch {
        condition: NodeId,
        then_block: BlockId,
        else_block: BlockId,
    },
    /// Return from the procedure
    Return(Option<NodeId>),
    /// Loop header test
    Loop {
        condition: NodeId,
        body_block: BlockId,
        exit_block: BlockId,
    },
    /// Control does not continue (throw)
    Unreachable,
}

/// A basic block in the CFG
#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub id: BlockId,
    pub nodes: Vec<NodeId>,
    pub terminator: Option<Terminator>,
    pub predecessors: Vec<BlockId>,
    pub successors: Vec<BlockId>,
}

impl BasicBlock {
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            nodes: Vec::new(),
            terminator: None,
            predecessors: Vec::new(),
            successors: Vec::new(),
        }
    }
}

/// Control Flow Graph of one procedure
#[derive(Debug)]
pub struct Cfg {
    pub blocks: HashMap<BlockId, BasicBlock>,
    pub entry: BlockId,
    pub exit: BlockId,
    /// Method whose body this is, when known
    pub method: Option<SymbolId>,
    /// Formal parameters, seeded into the entry store
    pub parameters: Vec<SymbolId>,
    nodes: Vec<Node>,
    next_block_id: usize,
}

impl Cfg {
    pub fn new() -> Self {
        let mut cfg = Self {
            blocks: HashMap::new(),
            entry: BlockId(0),
            exit: BlockId(0),
            method: None,
            parameters: Vec::new(),
            nodes: Vec::new(),
            next_block_id: 0,
        };

        cfg.entry = cfg.new_block();
        cfg.exit = cfg.new_block();

        cfg
    }

    pub fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.next_block_id);
        self.next_block_id += 1;
        self.blocks.insert(id, BasicBlock::new(id));
        id
    }

    pub fn add_edge(&mut self, from: BlockId, to: BlockId) {
        if let Some(block) = self.blocks.get_mut(&from) {
            if !block.successors.contains(&to) {
                block.successors.push(to);
            }
        }
        if let Some(block) = self.blocks.get_mut(&to) {
            if !block.predecessors.contains(&from) {
                block.predecessors.push(from);
            }
        }
    }

    pub fn set_terminator(&mut self, block: BlockId, terminator: Terminator) {
        if let Some(b) = self.blocks.get_mut(&block) {
            b.terminator = Some(terminator);
        }
    }

    /// Append a node to `block` and return its id
    pub fn add_node(&mut self, block: BlockId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { id, block, kind });
        if let Some(b) = self.blocks.get_mut(&block) {
            b.nodes.push(id);
        }
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.get(&id)
    }

    /// Get blocks in reverse postorder (useful for forward dataflow)
    pub fn reverse_postorder(&self) -> Vec<BlockId> {
        let mut visited = HashSet::new();
        let mut postorder = Vec::new();
        self.dfs_postorder(self.entry, &mut visited, &mut postorder);
        postorder.reverse();
        postorder
    }

    fn dfs_postorder(&self, block: BlockId, visited: &mut HashSet<BlockId>, postorder: &mut Vec<BlockId>) {
        if !visited.insert(block) {
            return;
        }

        if let Some(b) = self.blocks.get(&block) {
            for &succ in &b.successors {
                self.dfs_postorder(succ, visited, postorder);
            }
        }
        postorder.push(block);
    }
}

impl Default for Cfg {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for lowering a [`Procedure`] into a [`Cfg`]
pub struct CfgBuilder<'a, S: SymbolTable + ?Sized> {
    symbols: &'a S,
    cfg: Cfg,
    current_block: BlockId,
    loop_stack: Vec<LoopContext>,
}

struct LoopContext {
    continue_block: BlockId,
    break_block: BlockId,
}

impl<'a, S: SymbolTable + ?Sized> CfgBuilder<'a, S> {
    pub fn new(symbols: &'a S) -> Self {
        let cfg = Cfg::new();
        let entry = cfg.entry;
        Self {
            symbols,
            cfg,
            current_block: entry,
            loop_stack: Vec::new(),
        }
    }

    pub fn build_procedure(mut self, procedure: &Procedure) -> Cfg {
        self.cfg.method = Some(procedure.method);
        self.cfg.parameters = procedure.params.clone();

        self.build_body(&procedure.body);

        // Falling off the end is an implicit void return
        let reachable = self.current_block == self.cfg.entry
            || self
                .cfg
                .block(self.current_block)
                .is_some_and(|b| !b.predecessors.is_empty());
        if reachable && self.is_open(self.current_block) {
            self.cfg.set_terminator(self.current_block, Terminator::Return(None));
            self.cfg.add_edge(self.current_block, self.cfg.exit);
        }

        self.cfg
    }

    fn is_open(&self, block: BlockId) -> bool {
        self.cfg.blocks.get(&block).is_some_and(|b| b.terminator.is_none())
    }

    /// Jump from the current block to `target` unless it already terminated
    fn goto_if_open(&mut self, target: BlockId) {
        if self.is_open(self.current_block) {
            self.cfg.set_terminator(self.current_block, Terminator::Goto(target));
            self.cfg.add_edge(self.current_block, target);
        }
    }

    fn emit(&mut self, kind: NodeKind) -> NodeId {
        self.cfg.add_node(self.current_block, kind)
    }

    fn build_body(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.build_stmt(stmt);
        }
    }

    fn build_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::LocalDecl { var, init } => {
                self.emit(NodeKind::VariableDeclaration { var: *var });
                if let Some(init) = init {
                    let value = self.lower_expr(init);
                    let target = self.emit(NodeKind::LocalVariable { var: *var });
                    self.emit(NodeKind::Assignment { target, value });
                }
            }
            Stmt::Expr(expr) => {
                self.lower_expr(expr);
            }
            Stmt::If {
                condition,
                then_body,
                else_body,
            } => self.build_if(condition, then_body, else_body.as_deref()),
            Stmt::While { condition, body } => self.build_while(condition, body),
            Stmt::Switch {
                selector,
                cases,
                default,
            } => self.build_switch(selector, cases, default.as_deref()),
            Stmt::Return(expr) => {
                let result = expr.as_ref().map(|e| self.lower_expr(e));
                self.emit(NodeKind::Return { result });
                self.cfg.set_terminator(self.current_block, Terminator::Return(result));
                self.cfg.add_edge(self.current_block, self.cfg.exit);
                // Anything after a return is unreachable
                self.current_block = self.cfg.new_block();
            }
            Stmt::Throw(expr) => {
                let exception = self.lower_expr(expr);
                self.emit(NodeKind::Throw { exception });
                self.cfg.set_terminator(self.current_block, Terminator::Unreachable);
                self.current_block = self.cfg.new_block();
            }
            Stmt::Assert { condition, detail } => {
                let condition = self.lower_expr(condition);
                let detail = detail.as_ref().map(|d| self.lower_expr(d));
                self.emit(NodeKind::AssertionError { condition, detail });
            }
            Stmt::Synchronized { lock, body } => {
                let lock = self.lower_expr(lock);
                self.emit(NodeKind::Synchronized { lock });
                self.build_body(body);
            }
            Stmt::Block(stmts) => self.build_body(stmts),
            Stmt::Break => {
                if let Some(ctx) = self.loop_stack.last() {
                    let target = ctx.break_block;
                    self.cfg.set_terminator(self.current_block, Terminator::Goto(target));
                    self.cfg.add_edge(self.current_block, target);
                }
                self.current_block = self.cfg.new_block();
            }
            Stmt::Continue => {
                if let Some(ctx) = self.loop_stack.last() {
                    let target = ctx.continue_block;
                    self.cfg.set_terminator(self.current_block, Terminator::Goto(target));
                    self.cfg.add_edge(self.current_block, target);
                }
                self.current_block = self.cfg.new_block();
            }
        }
    }

    /// End the current block with a two-way branch on `condition`.
    ///
    /// Returns the then, else and merge blocks; the caller fills both arms
    /// and jumps to the merge block.
    fn branch_on(&mut self, condition: NodeId) -> (BlockId, BlockId, BlockId) {
        let then_block = self.cfg.new_block();
        let else_block = self.cfg.new_block();
        let merge_block = self.cfg.new_block();

        self.cfg.set_terminator(
            self.current_block,
            Terminator::Branch {
                condition,
                then_block,
                else_block,
            },
        );
        self.cfg.add_edge(self.current_block, then_block);
        self.cfg.add_edge(self.current_block, else_block);

        (then_block, else_block, merge_block)
    }

    fn build_if(&mut self, condition: &Expr, then_body: &[Stmt], else_body: Option<&[Stmt]>) {
        let condition = self.lower_expr(condition);
        let (then_block, else_block, merge_block) = self.branch_on(condition);

        self.current_block = then_block;
        self.build_body(then_body);
        self.goto_if_open(merge_block);

        self.current_block = else_block;
        if let Some(else_stmts) = else_body {
            self.build_body(else_stmts);
        }
        self.goto_if_open(merge_block);

        self.current_block = merge_block;
    }

    fn build_while(&mut self, condition: &Expr, body: &[Stmt]) {
        let header_block = self.cfg.new_block();
        let body_block = self.cfg.new_block();
        let exit_block = self.cfg.new_block();

        self.goto_if_open(header_block);

        // The condition is re-evaluated on every iteration
        self.current_block = header_block;
        let condition = self.lower_expr(condition);
        self.cfg.set_terminator(
            header_block,
            Terminator::Loop {
                condition,
                body_block,
                exit_block,
            },
        );
        self.cfg.add_edge(header_block, body_block);
        self.cfg.add_edge(header_block, exit_block);

        self.loop_stack.push(LoopContext {
            continue_block: header_block,
            break_block: exit_block,
        });
        self.current_block = body_block;
        self.build_body(body);
        self.loop_stack.pop();

        // Back edge to header
        self.goto_if_open(header_block);

        self.current_block = exit_block;
    }

    fn build_switch(&mut self, selector: &Expr, cases: &[SwitchCase], default: Option<&[Stmt]>) {
        let selector = self.lower_expr(selector);
        let exit_block = self.cfg.new_block();

        let mut bodies: Vec<(BlockId, &[Stmt])> = cases
            .iter()
            .map(|case| (self.cfg.new_block(), case.body.as_slice()))
            .collect();
        let default_block = default.map(|stmts| {
            let block = self.cfg.new_block();
            bodies.push((block, stmts));
            block
        });

        // Chain of case tests; each failed test falls to the next
        for (case, &(body_block, _)) in cases.iter().zip(bodies.iter()) {
            let label = self.lower_expr(&case.label);
            let matched = self.emit(NodeKind::Case { selector, label });
            let next_test = self.cfg.new_block();
            self.cfg.set_terminator(
                self.current_block,
                Terminator::Branch {
                    condition: matched,
                    then_block: body_block,
                    else_block: next_test,
                },
            );
            self.cfg.add_edge(self.current_block, body_block);
            self.cfg.add_edge(self.current_block, next_test);
            self.current_block = next_test;
        }
        self.goto_if_open(default_block.unwrap_or(exit_block));

        let continue_block = self.loop_stack.last().map_or(exit_block, |ctx| ctx.continue_block);
        self.loop_stack.push(LoopContext {
            continue_block,
            break_block: exit_block,
        });
        for (i, &(body_block, stmts)) in bodies.iter().enumerate() {
            self.current_block = body_block;
            self.build_body(stmts);
            // Fall through into the next case body
            let next = bodies.get(i + 1).map_or(exit_block, |&(block, _)| block);
            self.goto_if_open(next);
        }
        self.loop_stack.pop();

        self.current_block = exit_block;
    }

    fn is_static_field(&self, field: SymbolId) -> bool {
        self.symbols.symbol(field).is_some_and(|s| s.is_static_field())
    }

    fn is_instance_method(&self, method: SymbolId) -> bool {
        use crate::hir::SymbolKind;
        matches!(
            self.symbols.symbol(method).map(|s| &s.kind),
            Some(SymbolKind::Method { is_static: false, .. })
        )
    }

    fn lower_receiver(&mut self, receiver: Option<&Expr>, needs_this: bool) -> Option<NodeId> {
        match receiver {
            Some(expr) => Some(self.lower_expr(expr)),
            None if needs_this => Some(self.emit(NodeKind::ImplicitThis)),
            None => None,
        }
    }

    fn lower_all(&mut self, exprs: &[Expr]) -> Operands {
        exprs.iter().map(|e| self.lower_expr(e)).collect()
    }

    /// Lower an expression, returning the node holding its value
    fn lower_expr(&mut self, expr: &Expr) -> NodeId {
        match &expr.kind {
            ExprKind::Literal(lit) => self.emit(NodeKind::Literal(lit.clone())),
            ExprKind::Local(var) => self.emit(NodeKind::LocalVariable { var: *var }),
            ExprKind::Field { receiver, field } => {
                let is_static = self.is_static_field(*field);
                let receiver = self.lower_receiver(receiver.as_deref(), !is_static);
                self.emit(NodeKind::FieldAccess {
                    receiver,
                    field: *field,
                    is_static,
                })
            }
            ExprKind::Call { receiver, method, args } => {
                let needs_this = self.is_instance_method(*method);
                let receiver = self.lower_receiver(receiver.as_deref(), needs_this);
                let target = self.emit(NodeKind::MethodAccess {
                    receiver,
                    method: *method,
                });
                let args = self.lower_all(args);
                self.emit(NodeKind::MethodInvocation {
                    target,
                    method: *method,
                    args,
                    result_type: expr.ty.clone(),
                })
            }
            ExprKind::New { constructor, args } => {
                let args = self.lower_all(args);
                self.emit(NodeKind::ObjectCreation {
                    constructor: *constructor,
                    args,
                    ty: expr.ty.clone(),
                })
            }
            ExprKind::Unary { op, operand } => {
                let operand = self.lower_expr(operand);
                self.emit(NodeKind::Unary { op: *op, operand })
            }
            ExprKind::Binary { op, left, right } => {
                if is_string_concat(*op, &expr.ty) {
                    let left = self.lower_concat_operand(left, &expr.ty);
                    let right = self.lower_concat_operand(right, &expr.ty);
                    self.emit(NodeKind::StringConcat { left, right })
                } else {
                    let left = self.lower_expr(left);
                    let right = self.lower_expr(right);
                    self.emit(NodeKind::Binary { op: *op, left, right })
                }
            }
            ExprKind::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                // Each arm gets its own block; the ternary node sits in the merge block
                let condition = self.lower_expr(condition);
                let (then_block, else_block, merge_block) = self.branch_on(condition);

                self.current_block = then_block;
                let then_operand = self.lower_expr(then_expr);
                self.goto_if_open(merge_block);

                self.current_block = else_block;
                let else_operand = self.lower_expr(else_expr);
                self.goto_if_open(merge_block);

                self.current_block = merge_block;
                self.emit(NodeKind::Ternary {
                    condition,
                    then_operand,
                    else_operand,
                })
            }
            ExprKind::Assign { target, value } => {
                let target = self.lower_expr(target);
                let value = self.lower_expr(value);
                self.emit(NodeKind::Assignment { target, value })
            }
            ExprKind::CompoundAssign { op, target, value } => {
                // `t op= v` becomes `t = t op v`, reading and writing the same target node
                let target_node = self.lower_expr(target);
                let combined = if is_string_concat(*op, &target.ty) {
                    let right = self.lower_concat_operand(value, &target.ty);
                    self.emit(NodeKind::StringConcatAssign {
                        left: target_node,
                        right,
                    })
                } else {
                    let right = self.lower_expr(value);
                    self.emit(NodeKind::Binary {
                        op: *op,
                        left: target_node,
                        right,
                    })
                };
                self.emit(NodeKind::Assignment {
                    target: target_node,
                    value: combined,
                })
            }
            ExprKind::ArrayAccess { array, index } => {
                let array = self.lower_expr(array);
                let index = self.lower_expr(index);
                self.emit(NodeKind::ArrayAccess { array, index })
            }
            ExprKind::NewArray {
                dimensions,
                initializers,
            } => {
                let dimensions = self.lower_all(dimensions);
                let initializers = self.lower_all(initializers);
                self.emit(NodeKind::ArrayCreation {
                    dimensions,
                    initializers,
                })
            }
            ExprKind::Cast { target, operand } => {
                let conversion = operand
                    .ty
                    .as_primitive()
                    .zip(target.as_primitive())
                    .filter(|(from, to)| from.is_numeric() && to.is_numeric());
                let operand = self.lower_expr(operand);
                match conversion {
                    Some((from, to)) => self.emit(NodeKind::NumericConversion {
                        operand,
                        target: to,
                        widening: from.widens_to(to),
                    }),
                    None => self.emit(NodeKind::TypeCast {
                        operand,
                        target: target.clone(),
                    }),
                }
            }
            ExprKind::InstanceOf { operand, target } => {
                let operand = self.lower_expr(operand);
                self.emit(NodeKind::InstanceOf {
                    operand,
                    target: target.clone(),
                })
            }
            ExprKind::Paren(inner) => self.lower_expr(inner),
            ExprKind::This => self.emit(NodeKind::ExplicitThis),
            ExprKind::Super => self.emit(NodeKind::Super),
            ExprKind::Lambda => self.emit(NodeKind::Lambda),
            ExprKind::MethodReference => self.emit(NodeKind::MemberReference),
            ExprKind::ClassLiteral(ty) => self.emit(NodeKind::ClassName { ty: ty.clone() }),
        }
    }

    /// Lower a concatenation operand, converting non-string operands with `toString`
    fn lower_concat_operand(&mut self, operand: &Expr, string_type: &Type) -> NodeId {
        let node = self.lower_expr(operand);
        if &operand.ty == string_type {
            node
        } else {
            self.emit(NodeKind::StringConversion { operand: node })
        }
    }
}

/// `+` producing a reference type is taken to be string concatenation.
///
/// Hosts type numeric `+` with its promoted primitive result, so boxed
/// operands such as `Integer + Integer` never reach here with a declared type.
fn is_string_concat(op: BinaryOp, result: &Type) -> bool {
    op == BinaryOp::Add && matches!(result, Type::Declared(_))
}
