//! Reader tests over whole modules.

use tsharp_syntax::ast::*;
use tsharp_syntax::{ReadError, read_typescript, reader_for_extension};

fn parse(code: &str) -> SourceModule {
    read_typescript("models/user.ts", code).expect("parse failed")
}

mod statements {
    use super::*;

    #[test]
    fn for_of_with_destructuring() {
        let module = parse("for (const [k, v] of pairs) { total += v; }");
        match &module.body[0].kind {
            StmtKind::ForOf {
                binding, is_await, ..
            } => {
                assert_eq!(binding.kind, Some(VarKind::Const));
                assert_eq!(binding.pattern.bound_names(), vec!["k", "v"]);
                assert!(!is_await);
            }
            other => panic!("expected ForOf, got {:?}", other),
        }
    }

    #[test]
    fn for_in_loop() {
        let module = parse("for (let key in table) {}");
        assert!(matches!(module.body[0].kind, StmtKind::ForIn { .. }));
    }

    #[test]
    fn classic_for_loop() {
        let module = parse("for (let i = 0; i < 10; i++) { f(i); }");
        match &module.body[0].kind {
            StmtKind::For {
                init, test, update, ..
            } => {
                assert!(init.is_some());
                assert!(matches!(
                    test.as_ref().unwrap().kind,
                    ExprKind::Binary {
                        op: BinaryOp::Lt,
                        ..
                    }
                ));
                assert!(matches!(
                    update.as_ref().unwrap().kind,
                    ExprKind::Update { prefix: false, .. }
                ));
            }
            other => panic!("expected For, got {:?}", other),
        }
    }

    #[test]
    fn try_catch_finally() {
        let module = parse("try { risky(); } catch (e) { log(e); } finally { done(); }");
        match &module.body[0].kind {
            StmtKind::Try {
                block,
                handler,
                finalizer,
            } => {
                assert_eq!(block.len(), 1);
                assert_eq!(handler.as_ref().unwrap().param.as_deref(), Some("e"));
                assert_eq!(finalizer.as_ref().unwrap().len(), 1);
            }
            other => panic!("expected Try, got {:?}", other),
        }
    }

    #[test]
    fn switch_with_default() {
        let module = parse(
            r#"
            switch (mode) {
                case "a": run(); break;
                default: stop();
            }
            "#,
        );
        match &module.body[0].kind {
            StmtKind::Switch { cases, .. } => {
                assert_eq!(cases.len(), 2);
                assert!(cases[0].test.is_some());
                assert_eq!(cases[0].body.len(), 2);
                assert!(cases[1].test.is_none());
            }
            other => panic!("expected Switch, got {:?}", other),
        }
    }

    #[test]
    fn spans_are_one_based() {
        let module = parse("\n  let x = 1;");
        let span = module.body[0].span;
        assert_eq!(span.line, 2);
        assert_eq!(span.column, 3);
    }
}

mod declarations {
    use super::*;

    #[test]
    fn interface_with_index_signature() {
        let module = parse(
            r#"
            export interface Bag<T> {
                readonly name: string;
                count?: int;
                [key: string]: T;
                get(key: string): T;
            }
            "#,
        );
        match &module.body[0].kind {
            StmtKind::Interface(iface) => {
                assert!(iface.exported);
                assert_eq!(iface.type_params[0].name, "T");
                assert_eq!(iface.members.len(), 4);
                assert!(matches!(
                    iface.members[0].kind,
                    TypeMemberKind::Property { readonly: true, .. }
                ));
                assert!(matches!(
                    iface.members[1].kind,
                    TypeMemberKind::Property { optional: true, .. }
                ));
                match &iface.members[2].kind {
                    TypeMemberKind::Index { key_name, key, .. } => {
                        assert_eq!(key_name, "key");
                        assert_eq!(key.kind, TypeKind::Keyword(TypeKeyword::String));
                    }
                    other => panic!("expected Index, got {:?}", other),
                }
                assert!(matches!(
                    iface.members[3].kind,
                    TypeMemberKind::Method { .. }
                ));
            }
            other => panic!("expected Interface, got {:?}", other),
        }
    }

    #[test]
    fn enum_members() {
        let module = parse(r#"enum Color { Red, Green = "green" }"#);
        match &module.body[0].kind {
            StmtKind::Enum(decl) => {
                assert_eq!(decl.name, "Color");
                assert!(decl.members[0].init.is_none());
                assert!(matches!(
                    &decl.members[1].init.as_ref().unwrap().kind,
                    ExprKind::String(s) if s == "green"
                ));
            }
            other => panic!("expected Enum, got {:?}", other),
        }
    }

    #[test]
    fn function_overload_signatures() {
        let module = parse(
            r#"
            export function pick(x: string): string;
            export function pick(x: int): int;
            export function pick(x: any): any { return x; }
            "#,
        );
        let bodies: Vec<bool> = module
            .body
            .iter()
            .map(|s| match &s.kind {
                StmtKind::Function(f) => f.body.is_some(),
                other => panic!("expected Function, got {:?}", other),
            })
            .collect();
        assert_eq!(bodies, vec![false, false, true]);
    }

    #[test]
    fn tuple_with_rest() {
        let module = parse("type Row = [string, int, ...boolean[]];");
        match &module.body[0].kind {
            StmtKind::TypeAlias(alias) => match &alias.ty.kind {
                TypeKind::Tuple(elements) => {
                    assert_eq!(elements.len(), 3);
                    assert!(elements[2].rest);
                    assert!(matches!(elements[2].ty.kind, TypeKind::Array(_)));
                }
                other => panic!("expected Tuple, got {:?}", other),
            },
            other => panic!("expected TypeAlias, got {:?}", other),
        }
    }

    #[test]
    fn abstract_class() {
        let module = parse("abstract class Shape { abstract area(): number; }");
        match &module.body[0].kind {
            StmtKind::Class(class) => {
                assert!(class.is_abstract);
                assert!(class.members[0].modifiers.is_abstract);
            }
            other => panic!("expected Class, got {:?}", other),
        }
    }
}

mod expressions {
    use super::*;

    fn expr(code: &str) -> Expr {
        let module = parse(code);
        match module.body.into_iter().next().map(|s| s.kind) {
            Some(StmtKind::Expr(e)) => e,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn arrow_with_expression_body() {
        match expr("(x: int) => x + 1;").kind {
            ExprKind::Function(func) => {
                assert!(func.is_arrow);
                assert_eq!(func.params[0].name(), Some("x"));
                assert!(matches!(func.body, FunctionBody::Expr(_)));
            }
            other => panic!("expected Function, got {:?}", other),
        }
    }

    #[test]
    fn template_string_parts() {
        match expr("`hi ${name}!`;").kind {
            ExprKind::Template(parts) => {
                assert_eq!(parts.len(), 3);
                assert_eq!(parts[0], TemplatePart::Text("hi ".into()));
            }
            other => panic!("expected Template, got {:?}", other),
        }
    }

    #[test]
    fn optional_chaining_and_non_null() {
        match expr("user?.name!;").kind {
            ExprKind::NonNull(inner) => assert!(matches!(
                inner.kind,
                ExprKind::Member { optional: true, .. }
            )),
            other => panic!("expected NonNull, got {:?}", other),
        }
    }

    #[test]
    fn as_const_is_transparent() {
        assert!(matches!(expr("[1, 2] as const;").kind, ExprKind::Array(_)));
    }

    #[test]
    fn generic_call() {
        match expr("make<string>(1, 2);").kind {
            ExprKind::Call {
                type_args, args, ..
            } => {
                assert_eq!(type_args.len(), 1);
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected Call, got {:?}", other),
        }
    }
}

#[test]
fn syntax_error_display() {
    let err = read_typescript("broken.ts", "let = ;").unwrap_err();
    assert!(matches!(err, ReadError::Syntax { .. }));
    assert!(err.to_string().starts_with("broken.ts:1:"));
}

#[test]
fn reader_registry() {
    let reader = reader_for_extension("ts").unwrap();
    let module = reader.read("a.ts", "export const a = 1;").unwrap();
    assert_eq!(module.path, "a.ts");
    match &module.body[0].kind {
        StmtKind::Var(decl) => assert!(decl.exported),
        other => panic!("expected Var, got {:?}", other),
    }
}
