//! End-to-end tests for the safety engine
//!
//! Each test builds a small program, lowers a procedure body to a CFG and
//! checks the classifications the engine reports.

use logsafe_core::config::{DO_NOT_LOG_ANNOTATION, SAFE_ANNOTATION, UNSAFE_ANNOTATION};
use logsafe_core::dataflow::{Cfg, NodeKind};
use logsafe_core::hir::{BinaryOp, PrimitiveKind, SwitchCase};
use logsafe_core::prelude::*;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Fixture {
    program: Program,
    string: SymbolId,
    object: SymbolId,
    method: SymbolId,
}

impl Fixture {
    fn new() -> Self {
        init_tracing();
        let mut program = Program::new();
        let string = program.add_type("java.lang.String");
        let object = program.add_type("java.lang.Object");
        let method = program.add_method("handle", Type::Void);
        Self {
            program,
            string,
            object,
            method,
        }
    }

    fn string_ty(&self) -> Type {
        Type::Declared(self.string)
    }

    fn object_ty(&self) -> Type {
        Type::Declared(self.object)
    }

    fn param(&mut self, name: &str, ty: Type, annotation: Option<&str>) -> SymbolId {
        let id = self.program.add_parameter(self.method, name, ty);
        if let Some(annotation) = annotation {
            self.program.annotate(id, annotation);
        }
        id
    }

    fn analyze(&self, body: Vec<Stmt>) -> (Cfg, SafetyAnalysisResult) {
        self.analyze_with(&SafetyEngine::default(), body)
    }

    fn analyze_with(&self, engine: &SafetyEngine, body: Vec<Stmt>) -> (Cfg, SafetyAnalysisResult) {
        let procedure = Procedure::for_method(&self.program, self.method, body);
        engine.analyze_procedure(&self.program, &procedure)
    }
}

fn boolean() -> Type {
    Type::Primitive(PrimitiveKind::Boolean)
}

fn int() -> Type {
    Type::Primitive(PrimitiveKind::Int)
}

fn assign_local(var: SymbolId, ty: Type, value: Expr) -> Stmt {
    Stmt::Expr(Expr::assign(Expr::local(var, ty), value))
}

fn returned_value(cfg: &Cfg, result: &SafetyAnalysisResult) -> Safety {
    let node = cfg
        .nodes()
        .find(|n| matches!(n.kind, NodeKind::Return { result: Some(_) }))
        .expect("procedure returns a value");
    result.value_of(node.id)
}

#[test]
fn test_if_else_join_at_merge_point() {
    let mut f = Fixture::new();
    let p = f.param("p", f.object_ty(), Some(SAFE_ANNOTATION));
    let cond = f.param("cond", boolean(), None);
    let x = f.program.add_local("x", f.object_ty());
    let unsafe_source = f.program.add_static_method("unsafeSource", f.object_ty());
    f.program.annotate(unsafe_source, UNSAFE_ANNOTATION);

    let object = f.object_ty();
    let (cfg, result) = f.analyze(vec![
        Stmt::If {
            condition: Expr::local(cond, boolean()),
            then_body: vec![assign_local(x, object.clone(), Expr::local(p, object.clone()))],
            else_body: Some(vec![assign_local(
                x,
                object.clone(),
                Expr::call(unsafe_source, vec![], object.clone()),
            )]),
        },
        Stmt::Return(Some(Expr::local(x, object))),
    ]);

    assert!(result.converged);
    assert_eq!(result.exit_safety(&AccessPath::local(x)), Safety::Unsafe);
    assert_eq!(returned_value(&cfg, &result), Safety::Unsafe);

    // Each branch on its own still sees its own value
    let branch_values: Vec<Safety> = cfg
        .nodes()
        .filter(|n| matches!(n.kind, NodeKind::Assignment { .. }))
        .map(|n| result.value_of(n.id))
        .collect();
    assert_eq!(branch_values, vec![Safety::Safe, Safety::Unsafe]);
}

#[test]
fn test_loop_reaches_fixpoint() {
    let mut f = Fixture::new();
    let secret = f.param("secret", f.string_ty(), Some(UNSAFE_ANNOTATION));
    let more = f.param("more", boolean(), None);
    let acc = f.program.add_local("acc", f.string_ty());

    let string = f.string_ty();
    let (cfg, result) = f.analyze(vec![
        Stmt::LocalDecl {
            var: acc,
            init: Some(Expr::string("", f.string)),
        },
        Stmt::While {
            condition: Expr::local(more, boolean()),
            body: vec![assign_local(
                acc,
                string.clone(),
                Expr::binary(
                    BinaryOp::Add,
                    Expr::local(acc, string.clone()),
                    Expr::local(secret, string.clone()),
                    string.clone(),
                ),
            )],
        },
        Stmt::Return(Some(Expr::local(acc, string))),
    ]);

    assert!(result.converged);
    assert_eq!(returned_value(&cfg, &result), Safety::Unsafe);

    // The loop header sees the value carried around the back edge
    let header = cfg
        .blocks
        .values()
        .find(|b| matches!(b.terminator, Some(logsafe_core::dataflow::Terminator::Loop { .. })))
        .expect("loop header");
    let header_store = result.store_at_entry(header.id).expect("header reached");
    assert_eq!(header_store.get(&AccessPath::local(acc)), Safety::Unsafe);
}

#[test]
fn test_loop_without_changes_keeps_safe_values() {
    let mut f = Fixture::new();
    let n = f.param("n", int(), Some(SAFE_ANNOTATION));
    let i = f.program.add_local("i", int());

    let (_, result) = f.analyze(vec![
        Stmt::LocalDecl {
            var: i,
            init: Some(Expr::literal(Literal::Int(0), int())),
        },
        Stmt::While {
            condition: Expr::binary(BinaryOp::Lt, Expr::local(i, int()), Expr::local(n, int()), boolean()),
            body: vec![Stmt::Expr(Expr::new(
                ExprKind::CompoundAssign {
                    op: BinaryOp::Add,
                    target: Box::new(Expr::local(i, int())),
                    value: Box::new(Expr::literal(Literal::Int(1), int())),
                },
                int(),
            ))],
        },
        Stmt::Return(None),
    ]);

    assert!(result.converged);
    assert_eq!(result.exit_safety(&AccessPath::local(i)), Safety::Safe);
}

#[test]
fn test_switch_merges_all_cases() {
    let mut f = Fixture::new();
    let k = f.param("k", int(), None);
    let token = f.param("token", f.string_ty(), Some(DO_NOT_LOG_ANNOTATION));
    let y = f.program.add_local("y", f.string_ty());

    let string = f.string_ty();
    let (_, result) = f.analyze(vec![
        Stmt::Switch {
            selector: Expr::local(k, int()),
            cases: vec![SwitchCase {
                label: Expr::literal(Literal::Int(1), int()),
                body: vec![assign_local(y, string.clone(), Expr::local(token, string.clone())), Stmt::Break],
            }],
            default: Some(vec![assign_local(y, string, Expr::string("none", f.string))]),
        },
        Stmt::Return(None),
    ]);

    assert_eq!(result.exit_safety(&AccessPath::local(y)), Safety::DoNotLog);
}

#[test]
fn test_string_concatenation_propagates() {
    let mut f = Fixture::new();
    let name = f.param("name", f.string_ty(), Some(UNSAFE_ANNOTATION));
    let count = f.param("count", int(), Some(SAFE_ANNOTATION));
    let safe_msg = f.program.add_local("safeMsg", f.string_ty());
    let msg = f.program.add_local("msg", f.string_ty());

    let string = f.string_ty();
    let (cfg, result) = f.analyze(vec![
        Stmt::LocalDecl {
            var: safe_msg,
            init: Some(Expr::binary(
                BinaryOp::Add,
                Expr::string("count=", f.string),
                Expr::local(count, int()),
                string.clone(),
            )),
        },
        Stmt::LocalDecl {
            var: msg,
            init: Some(Expr::binary(
                BinaryOp::Add,
                Expr::local(safe_msg, string.clone()),
                Expr::local(name, string.clone()),
                string,
            )),
        },
    ]);

    assert_eq!(result.exit_safety(&AccessPath::local(safe_msg)), Safety::Safe);
    assert_eq!(result.exit_safety(&AccessPath::local(msg)), Safety::Unsafe);
    let conversion = cfg
        .nodes()
        .find(|n| matches!(n.kind, NodeKind::StringConversion { .. }))
        .expect("int operand is converted");
    assert_eq!(result.value_of(conversion.id), Safety::Safe);
}

#[test]
fn test_compound_string_assignment() {
    let mut f = Fixture::new();
    let token = f.param("token", f.string_ty(), Some(DO_NOT_LOG_ANNOTATION));
    let s = f.program.add_local("s", f.string_ty());

    let string = f.string_ty();
    let (cfg, result) = f.analyze(vec![
        Stmt::LocalDecl {
            var: s,
            init: Some(Expr::string("prefix", f.string)),
        },
        Stmt::Expr(Expr::new(
            ExprKind::CompoundAssign {
                op: BinaryOp::Add,
                target: Box::new(Expr::local(s, string.clone())),
                value: Box::new(Expr::local(token, string.clone())),
            },
            string,
        )),
    ]);

    assert!(cfg.nodes().any(|n| matches!(n.kind, NodeKind::StringConcatAssign { .. })));
    assert_eq!(result.exit_safety(&AccessPath::local(s)), Safety::DoNotLog);
}

#[test]
fn test_instance_field_write_through_this() {
    let mut f = Fixture::new();
    let secret = f.param("secret", f.string_ty(), Some(DO_NOT_LOG_ANNOTATION));
    let cache = f.program.add_field("cache", f.string_ty());

    let string = f.string_ty();
    let (_, result) = f.analyze(vec![Stmt::Expr(Expr::assign(
        Expr::field(Some(Expr::new(ExprKind::This, f.object_ty())), cache, string.clone()),
        Expr::local(secret, string),
    ))]);

    assert_eq!(result.exit_safety(&AccessPath::this().with_field(cache)), Safety::DoNotLog);
    assert_eq!(result.exit_safety(&AccessPath::this()), Safety::DoNotLog);
}

#[test]
fn test_ternary_expression() {
    let mut f = Fixture::new();
    let cond = f.param("cond", boolean(), None);
    let name = f.param("name", f.string_ty(), Some(UNSAFE_ANNOTATION));
    let label = f.program.add_local("label", f.string_ty());

    let string = f.string_ty();
    let (_, result) = f.analyze(vec![Stmt::LocalDecl {
        var: label,
        init: Some(Expr::new(
            ExprKind::Conditional {
                condition: Box::new(Expr::local(cond, boolean())),
                then_expr: Box::new(Expr::string("anonymous", f.string)),
                else_expr: Box::new(Expr::local(name, string.clone())),
            },
            string,
        )),
    }]);

    assert_eq!(result.exit_safety(&AccessPath::local(label)), Safety::Unsafe);
}

#[test]
fn test_ternary_arm_assignments_join_at_merge() {
    let mut f = Fixture::new();
    let cond = f.param("cond", boolean(), None);
    let secret = f.param("secret", f.string_ty(), Some(UNSAFE_ANNOTATION));
    let x = f.program.add_local("x", f.string_ty());

    let string = f.string_ty();
    let (cfg, result) = f.analyze(vec![
        Stmt::Expr(Expr::new(
            ExprKind::Conditional {
                condition: Box::new(Expr::local(cond, boolean())),
                then_expr: Box::new(Expr::paren(Expr::assign(
                    Expr::local(x, string.clone()),
                    Expr::local(secret, string.clone()),
                ))),
                else_expr: Box::new(Expr::paren(Expr::assign(
                    Expr::local(x, string.clone()),
                    Expr::string("ok", f.string),
                ))),
            },
            string,
        )),
        Stmt::Return(None),
    ]);

    assert!(result.converged);
    assert_eq!(result.exit_safety(&AccessPath::local(x)), Safety::Unsafe);

    let ternary = cfg
        .nodes()
        .find(|n| matches!(n.kind, NodeKind::Ternary { .. }))
        .expect("ternary node");
    assert_eq!(result.value_of(ternary.id), Safety::Unsafe);
    assert_eq!(
        result.store_after(ternary.id).map(|store| store.get(&AccessPath::local(x))),
        Some(Safety::Unsafe)
    );
}

#[test]
fn test_invocation_inherits_from_overridden_method() {
    let mut f = Fixture::new();
    let credentials = f.program.add_type("Credentials");
    let interface_secret = f.program.add_method("secret", f.string_ty());
    f.program.annotate(interface_secret, DO_NOT_LOG_ANNOTATION);
    let impl_secret = f.program.add_method("secret", f.string_ty());
    f.program.add_override(impl_secret, interface_secret);
    let creds = f.param("creds", Type::Declared(credentials), None);
    let out = f.program.add_local("out", f.string_ty());

    let string = f.string_ty();
    let call = Expr::new(
        ExprKind::Call {
            receiver: Some(Box::new(Expr::local(creds, Type::Declared(credentials)))),
            method: impl_secret,
            args: vec![],
        },
        string,
    );
    let (_, result) = f.analyze(vec![Stmt::LocalDecl { var: out, init: Some(call) }]);

    assert_eq!(result.exit_safety(&AccessPath::local(out)), Safety::DoNotLog);
}

#[test]
fn test_parenthesized_and_cast_values() {
    let mut f = Fixture::new();
    let raw = f.param("raw", f.object_ty(), Some(UNSAFE_ANNOTATION));
    let text = f.program.add_local("text", f.string_ty());

    let string = f.string_ty();
    let (_, result) = f.analyze(vec![Stmt::LocalDecl {
        var: text,
        init: Some(Expr::new(
            ExprKind::Cast {
                target: string.clone(),
                operand: Box::new(Expr::paren(Expr::local(raw, f.object_ty()))),
            },
            string,
        )),
    }]);

    assert_eq!(result.exit_safety(&AccessPath::local(text)), Safety::Unsafe);
}

#[test]
fn test_custom_annotation_names() {
    let mut f = Fixture::new();
    let key = f.param("key", f.string_ty(), Some("org.example.Secret"));
    let copy = f.program.add_local("copy", f.string_ty());

    let config = AnalysisConfig::from_json_str(r#"{"annotations": {"do_not_log": "org.example.Secret"}}"#).unwrap();
    let string = f.string_ty();
    let body = vec![Stmt::LocalDecl {
        var: copy,
        init: Some(Expr::local(key, string)),
    }];

    let (_, default_result) = f.analyze(body.clone());
    let (_, custom_result) = f.analyze_with(&SafetyEngine::new(config), body);

    assert_eq!(default_result.exit_safety(&AccessPath::local(copy)), Safety::Unknown);
    assert_eq!(custom_result.exit_safety(&AccessPath::local(copy)), Safety::DoNotLog);
}

#[test]
fn test_iteration_bound_marks_result_unconverged() {
    let mut f = Fixture::new();
    let more = f.param("more", boolean(), None);

    let config = AnalysisConfig {
        max_iterations: 1,
        ..AnalysisConfig::default()
    };
    let (_, result) = f.analyze_with(
        &SafetyEngine::new(config),
        vec![Stmt::While {
            condition: Expr::local(more, boolean()),
            body: vec![],
        }],
    );

    assert!(!result.converged);
    assert_eq!(result.iterations, 1);
}

#[test]
fn test_exit_store_requires_a_returning_path() {
    let f = Fixture::new();
    let (_, result) = f.analyze(vec![Stmt::While {
        condition: Expr::literal(Literal::Bool(true), boolean()),
        body: vec![],
    }]);

    // A constant loop condition still has its exit edge
    assert!(result.converged);
    assert!(result.exit_store().is_some());

    let (_, throwing) = f.analyze(vec![Stmt::Throw(Expr::new(ExprKind::Lambda, f.object_ty()))]);
    assert!(throwing.exit_store().is_none());
}
