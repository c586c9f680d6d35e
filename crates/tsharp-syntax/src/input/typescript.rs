//! Tree-sitter based TypeScript reader.

use crate::ast::*;
use crate::span::Span;
use crate::traits::{ReadError, Reader};
use tree_sitter::{Node, Parser, Tree};

/// Static instance of the TypeScript reader.
pub static TYPESCRIPT_READER: TypeScriptReader = TypeScriptReader;

/// TypeScript reader using tree-sitter.
pub struct TypeScriptReader;

impl Reader for TypeScriptReader {
    fn language(&self) -> &'static str {
        "typescript"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["ts", "mts"]
    }

    fn read(&self, path: &str, source: &str) -> Result<SourceModule, ReadError> {
        read_typescript(path, source)
    }
}

/// Parse TypeScript source into a syntax tree.
pub fn read_typescript(path: &str, source: &str) -> Result<SourceModule, ReadError> {
    let mut parser = Parser::new();
    parser
        .set_language(&arborium_typescript::language().into())
        .map_err(|err| ReadError::Parse(err.to_string()))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| ReadError::Parse("failed to parse".into()))?;

    let ctx = ReadContext::new(path, source);
    ctx.read_module(&tree)
}

struct ReadContext<'a> {
    path: &'a str,
    source: &'a str,
}

impl<'a> ReadContext<'a> {
    fn new(path: &'a str, source: &'a str) -> Self {
        Self { path, source }
    }

    fn node_text(&self, node: Node) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn span(&self, node: Node) -> Span {
        let start = node.start_position();
        Span::new(
            node.start_byte() as u32,
            node.end_byte() as u32,
            start.row as u32 + 1,
            start.column as u32 + 1,
        )
    }

    fn field<'t>(&self, node: Node<'t>, name: &str) -> Result<Node<'t>, ReadError> {
        node.child_by_field_name(name).ok_or_else(|| {
            ReadError::Parse(format!("{} missing field '{}'", node.kind(), name))
        })
    }

    /// Named children, skipping comments.
    fn named_children<'t>(&self, node: Node<'t>) -> Vec<Node<'t>> {
        let mut cursor = node.walk();
        node.named_children(&mut cursor)
            .filter(|c| c.kind() != "comment")
            .collect()
    }

    fn first_named<'t>(&self, node: Node<'t>) -> Option<Node<'t>> {
        self.named_children(node).into_iter().next()
    }

    /// Whether `node` has an anonymous child token spelled `token`.
    fn has_token(&self, node: Node, token: &str) -> bool {
        let mut cursor = node.walk();
        node.children(&mut cursor)
            .any(|c| !c.is_named() && c.kind() == token)
    }

    fn read_module(&self, tree: &Tree) -> Result<SourceModule, ReadError> {
        let root = tree.root_node();

        if root.has_error() {
            let bad = first_error(root).unwrap_or(root);
            let position = bad.start_position();
            let snippet: String = self.node_text(bad).chars().take(24).collect();
            return Err(ReadError::Syntax {
                path: self.path.to_string(),
                line: position.row as u32 + 1,
                column: position.column as u32 + 1,
                snippet,
            });
        }

        let mut body = Vec::new();
        for child in self.named_children(root) {
            if let Some(stmt) = self.read_stmt(child, false)? {
                body.push(stmt);
            }
        }

        Ok(SourceModule::new(self.path, body))
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn read_stmt(&self, node: Node, exported: bool) -> Result<Option<Stmt>, ReadError> {
        let span = self.span(node);
        let kind = match node.kind() {
            "comment" => return Ok(None),

            "expression_statement" => {
                let expr_node = self.first_named(node).ok_or_else(|| {
                    ReadError::Parse("expression_statement has no child".into())
                })?;
                StmtKind::Expr(self.read_expr(expr_node)?)
            }

            "lexical_declaration" | "variable_declaration" => {
                StmtKind::Var(self.read_var_decl(node, exported)?)
            }

            "function_declaration" | "generator_function_declaration" | "function_signature" => {
                StmtKind::Function(self.read_function_decl(node, exported)?)
            }

            "class_declaration" | "abstract_class_declaration" => {
                StmtKind::Class(self.read_class(node, exported)?)
            }

            "interface_declaration" => StmtKind::Interface(self.read_interface(node, exported)?),

            "type_alias_declaration" => {
                let name = self.node_text(self.field(node, "name")?).to_string();
                let type_params = self.read_type_params_field(node)?;
                let ty = self.read_type(self.field(node, "value")?)?;
                StmtKind::TypeAlias(TypeAliasDecl {
                    name,
                    type_params,
                    ty,
                    exported,
                    span,
                })
            }

            "enum_declaration" => StmtKind::Enum(self.read_enum(node, exported)?),

            "import_statement" => StmtKind::Import(self.read_import(node)?),

            "export_statement" => return self.read_export(node),

            "return_statement" => StmtKind::Return(
                self.first_named(node)
                    .map(|n| self.read_expr(n))
                    .transpose()?,
            ),

            "throw_statement" => {
                let arg = self
                    .first_named(node)
                    .ok_or_else(|| ReadError::Parse("throw without argument".into()))?;
                StmtKind::Throw(self.read_expr(arg)?)
            }

            "if_statement" => {
                let test = self.read_expr(self.field(node, "condition")?)?;
                let consequent = self.read_required_stmt(self.field(node, "consequence")?)?;
                let alternate = match node.child_by_field_name("alternative") {
                    Some(else_clause) => {
                        let inner = self.first_named(else_clause).ok_or_else(|| {
                            ReadError::Parse("else clause without statement".into())
                        })?;
                        Some(Box::new(self.read_required_stmt(inner)?))
                    }
                    None => None,
                };
                StmtKind::If {
                    test,
                    consequent: Box::new(consequent),
                    alternate,
                }
            }

            "while_statement" => StmtKind::While {
                test: self.read_expr(self.field(node, "condition")?)?,
                body: Box::new(self.read_required_stmt(self.field(node, "body")?)?),
            },

            "do_statement" => StmtKind::DoWhile {
                body: Box::new(self.read_required_stmt(self.field(node, "body")?)?),
                test: self.read_expr(self.field(node, "condition")?)?,
            },

            "for_statement" => self.read_for(node)?,

            "for_in_statement" => self.read_for_in(node)?,

            "statement_block" => StmtKind::Block(self.read_block(node)?),

            "break_statement" => StmtKind::Break(
                node.child_by_field_name("label")
                    .map(|l| self.node_text(l).to_string()),
            ),

            "continue_statement" => StmtKind::Continue(
                node.child_by_field_name("label")
                    .map(|l| self.node_text(l).to_string()),
            ),

            "try_statement" => {
                let block = self.read_block(self.field(node, "body")?)?;
                let handler = match node.child_by_field_name("handler") {
                    Some(clause) => Some(CatchClause {
                        param: clause
                            .child_by_field_name("parameter")
                            .map(|p| self.node_text(p).to_string()),
                        body: self.read_block(self.field(clause, "body")?)?,
                    }),
                    None => None,
                };
                let finalizer = match node.child_by_field_name("finalizer") {
                    Some(clause) => Some(self.read_block(self.field(clause, "body")?)?),
                    None => None,
                };
                StmtKind::Try {
                    block,
                    handler,
                    finalizer,
                }
            }

            "switch_statement" => self.read_switch(node)?,

            "empty_statement" => StmtKind::Empty,

            // `declare ...` only describes values provided elsewhere.
            "ambient_declaration" => return Ok(None),

            other => StmtKind::Unsupported(other.to_string()),
        };
        Ok(Some(Stmt::new(kind, span)))
    }

    fn read_required_stmt(&self, node: Node) -> Result<Stmt, ReadError> {
        Ok(self
            .read_stmt(node, false)?
            .unwrap_or_else(|| Stmt::new(StmtKind::Empty, self.span(node))))
    }

    fn read_block(&self, node: Node) -> Result<Vec<Stmt>, ReadError> {
        if node.kind() != "statement_block" {
            return Ok(vec![self.read_required_stmt(node)?]);
        }
        let mut stmts = Vec::new();
        for child in self.named_children(node) {
            if let Some(stmt) = self.read_stmt(child, false)? {
                stmts.push(stmt);
            }
        }
        Ok(stmts)
    }

    fn read_var_decl(&self, node: Node, exported: bool) -> Result<VarDecl, ReadError> {
        let kind = if node.kind() == "variable_declaration" {
            VarKind::Var
        } else {
            match node.child_by_field_name("kind").map(|k| self.node_text(k)) {
                Some("let") => VarKind::Let,
                _ => VarKind::Const,
            }
        };

        let mut declarators = Vec::new();
        for child in self.named_children(node) {
            if child.kind() != "variable_declarator" {
                continue;
            }
            let pattern = self.read_pattern(self.field(child, "name")?)?;
            let ty = child
                .child_by_field_name("type")
                .map(|t| self.read_type(t))
                .transpose()?;
            let init = child
                .child_by_field_name("value")
                .map(|v| self.read_expr(v))
                .transpose()?;
            declarators.push(VarDeclarator {
                pattern,
                ty,
                init,
                span: self.span(child),
            });
        }

        Ok(VarDecl {
            kind,
            declarators,
            exported,
        })
    }

    fn read_for(&self, node: Node) -> Result<StmtKind, ReadError> {
        let init = match node.child_by_field_name("initializer") {
            Some(n) if n.kind() == "empty_statement" => None,
            Some(n) => self.read_stmt(n, false)?.map(Box::new),
            None => None,
        };
        let test = match node.child_by_field_name("condition") {
            Some(n) if n.kind() == "empty_statement" => None,
            Some(n) if n.kind() == "expression_statement" => self
                .first_named(n)
                .map(|e| self.read_expr(e))
                .transpose()?,
            Some(n) => Some(self.read_expr(n)?),
            None => None,
        };
        let update = node
            .child_by_field_name("increment")
            .map(|n| self.read_expr(n))
            .transpose()?;
        let body = Box::new(self.read_required_stmt(self.field(node, "body")?)?);
        Ok(StmtKind::For {
            init,
            test,
            update,
            body,
        })
    }

    fn read_for_in(&self, node: Node) -> Result<StmtKind, ReadError> {
        let kind = node
            .child_by_field_name("kind")
            .map(|k| match self.node_text(k) {
                "let" => VarKind::Let,
                "var" => VarKind::Var,
                _ => VarKind::Const,
            });
        let pattern = self.read_pattern(self.field(node, "left")?)?;
        let right = self.read_expr(self.field(node, "right")?)?;
        let body = Box::new(self.read_required_stmt(self.field(node, "body")?)?);
        let binding = ForBinding { kind, pattern };

        let is_of = node
            .child_by_field_name("operator")
            .map(|op| self.node_text(op) == "of")
            .unwrap_or_else(|| self.has_token(node, "of"));

        if is_of {
            Ok(StmtKind::ForOf {
                binding,
                iterable: right,
                body,
                is_await: self.has_token(node, "await"),
            })
        } else {
            Ok(StmtKind::ForIn {
                binding,
                object: right,
                body,
            })
        }
    }

    fn read_switch(&self, node: Node) -> Result<StmtKind, ReadError> {
        let discriminant = self.read_expr(self.field(node, "value")?)?;
        let body = self.field(node, "body")?;
        let mut cases = Vec::new();
        for case in self.named_children(body) {
            let test = match case.kind() {
                "switch_case" => Some(self.read_expr(self.field(case, "value")?)?),
                "switch_default" => None,
                _ => continue,
            };
            let mut stmts = Vec::new();
            let mut cursor = case.walk();
            for child in case.children_by_field_name("body", &mut cursor) {
                if let Some(stmt) = self.read_stmt(child, false)? {
                    stmts.push(stmt);
                }
            }
            cases.push(SwitchCase { test, body: stmts });
        }
        Ok(StmtKind::Switch {
            discriminant,
            cases,
        })
    }

    fn read_export(&self, node: Node) -> Result<Option<Stmt>, ReadError> {
        if let Some(decl) = node.child_by_field_name("declaration") {
            let stmt = self.read_stmt(decl, true)?;
            return Ok(stmt.map(|mut s| {
                s.span = self.span(node);
                s
            }));
        }
        let span = self.span(node);
        if self.has_token(node, "default") || node.child_by_field_name("source").is_some() {
            return Ok(Some(Stmt::new(
                StmtKind::Unsupported("export_statement".into()),
                span,
            )));
        }
        let mut specifiers = Vec::new();
        for child in self.named_children(node) {
            if child.kind() != "export_clause" {
                continue;
            }
            for spec in self.named_children(child) {
                if spec.kind() != "export_specifier" {
                    continue;
                }
                let local = self.node_text(self.field(spec, "name")?).to_string();
                let exported = spec
                    .child_by_field_name("alias")
                    .map(|a| self.node_text(a).to_string())
                    .unwrap_or_else(|| local.clone());
                specifiers.push(ExportSpecifier { local, exported });
            }
        }
        Ok(Some(Stmt::new(StmtKind::ExportNamed(specifiers), span)))
    }

    fn read_import(&self, node: Node) -> Result<ImportDecl, ReadError> {
        let source = unquote(self.node_text(self.field(node, "source")?));
        let type_only = self.has_token(node, "type");
        let mut specifiers = Vec::new();

        for clause in self.named_children(node) {
            if clause.kind() != "import_clause" {
                continue;
            }
            for part in self.named_children(clause) {
                match part.kind() {
                    "identifier" => specifiers.push(ImportSpecifier::Default {
                        local: self.node_text(part).to_string(),
                    }),
                    "namespace_import" => {
                        if let Some(ident) = self.first_named(part) {
                            specifiers.push(ImportSpecifier::Namespace {
                                local: self.node_text(ident).to_string(),
                            });
                        }
                    }
                    "named_imports" => {
                        for spec in self.named_children(part) {
                            if spec.kind() != "import_specifier" {
                                continue;
                            }
                            let imported = self.node_text(self.field(spec, "name")?).to_string();
                            let local = spec
                                .child_by_field_name("alias")
                                .map(|a| self.node_text(a).to_string())
                                .unwrap_or_else(|| imported.clone());
                            specifiers.push(ImportSpecifier::Named { imported, local });
                        }
                    }
                    _ => {}
                }
            }
        }

        Ok(ImportDecl {
            specifiers,
            source,
            type_only,
        })
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn read_function_decl(&self, node: Node, exported: bool) -> Result<FunctionDecl, ReadError> {
        let name = self.node_text(self.field(node, "name")?).to_string();
        let body = node
            .child_by_field_name("body")
            .map(|b| self.read_block(b))
            .transpose()?;
        Ok(FunctionDecl {
            name,
            type_params: self.read_type_params_field(node)?,
            params: self.read_params_field(node)?,
            return_type: self.read_return_type(node)?,
            body,
            is_async: self.has_token(node, "async"),
            is_generator: node.kind() == "generator_function_declaration"
                || self.has_token(node, "*"),
            exported,
            span: self.span(node),
        })
    }

    fn read_return_type(&self, node: Node) -> Result<Option<TypeNode>, ReadError> {
        node.child_by_field_name("return_type")
            .map(|t| self.read_type(t))
            .transpose()
    }

    fn read_params_field(&self, node: Node) -> Result<Vec<Param>, ReadError> {
        if let Some(single) = node.child_by_field_name("parameter") {
            // `x => ...`
            return Ok(vec![Param {
                pattern: Pattern::ident(self.node_text(single), self.span(single)),
                ty: None,
                optional: false,
                rest: false,
                default: None,
                accessibility: None,
                readonly: false,
                span: self.span(single),
            }]);
        }
        match node.child_by_field_name("parameters") {
            Some(params) => self.read_params(params),
            None => Ok(Vec::new()),
        }
    }

    fn read_params(&self, node: Node) -> Result<Vec<Param>, ReadError> {
        let mut params = Vec::new();
        for child in self.named_children(node) {
            if !matches!(child.kind(), "required_parameter" | "optional_parameter") {
                continue;
            }
            let pattern_node = self.field(child, "pattern")?;
            if pattern_node.kind() == "this" {
                continue;
            }
            let (pattern, rest) = if pattern_node.kind() == "rest_pattern" {
                let inner = self
                    .first_named(pattern_node)
                    .ok_or_else(|| ReadError::Parse("rest parameter without name".into()))?;
                (self.read_pattern(inner)?, true)
            } else {
                (self.read_pattern(pattern_node)?, false)
            };
            let accessibility = self
                .named_children(child)
                .into_iter()
                .find(|c| c.kind() == "accessibility_modifier")
                .map(|c| self.read_accessibility(c));
            params.push(Param {
                pattern,
                ty: child
                    .child_by_field_name("type")
                    .map(|t| self.read_type(t))
                    .transpose()?,
                optional: child.kind() == "optional_parameter",
                rest,
                default: child
                    .child_by_field_name("value")
                    .map(|v| self.read_expr(v))
                    .transpose()?,
                accessibility,
                readonly: self.has_token(child, "readonly"),
                span: self.span(child),
            });
        }
        Ok(params)
    }

    fn read_accessibility(&self, node: Node) -> Accessibility {
        match self.node_text(node) {
            "private" => Accessibility::Private,
            "protected" => Accessibility::Protected,
            _ => Accessibility::Public,
        }
    }

    fn read_type_params_field(&self, node: Node) -> Result<Vec<TypeParam>, ReadError> {
        let Some(list) = node.child_by_field_name("type_parameters") else {
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        for param in self.named_children(list) {
            if param.kind() != "type_parameter" {
                continue;
            }
            let name = self.node_text(self.field(param, "name")?).to_string();
            let constraint = match param.child_by_field_name("constraint") {
                Some(c) => self.first_named(c).map(|t| self.read_type(t)).transpose()?,
                None => None,
            };
            let default = match param.child_by_field_name("value") {
                Some(d) => self.first_named(d).map(|t| self.read_type(t)).transpose()?,
                None => None,
            };
            out.push(TypeParam {
                name,
                constraint,
                default,
                span: self.span(param),
            });
        }
        Ok(out)
    }

    fn read_modifiers(&self, node: Node) -> Modifiers {
        let mut modifiers = Modifiers::default();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "accessibility_modifier" => {
                    modifiers.accessibility = Some(self.read_accessibility(child))
                }
                "override_modifier" => modifiers.is_override = true,
                "static" if !child.is_named() => modifiers.is_static = true,
                "abstract" if !child.is_named() => modifiers.is_abstract = true,
                "readonly" if !child.is_named() => modifiers.readonly = true,
                "async" if !child.is_named() => modifiers.is_async = true,
                _ => {}
            }
        }
        modifiers
    }

    fn read_class(&self, node: Node, exported: bool) -> Result<ClassDecl, ReadError> {
        let name = self.node_text(self.field(node, "name")?).to_string();
        let mut extends = None;
        let mut implements = Vec::new();

        for child in self.named_children(node) {
            if child.kind() != "class_heritage" {
                continue;
            }
            for clause in self.named_children(child) {
                match clause.kind() {
                    "extends_clause" => {
                        let value = self.field(clause, "value")?;
                        let args = match clause.child_by_field_name("type_arguments") {
                            Some(list) => self.read_type_args(list)?,
                            None => Vec::new(),
                        };
                        extends = Some(TypeNode::new(
                            TypeKind::Reference {
                                name: compact(self.node_text(value)),
                                args,
                            },
                            self.span(value),
                        ));
                    }
                    "implements_clause" => {
                        for ty in self.named_children(clause) {
                            implements.push(self.read_type(ty)?);
                        }
                    }
                    _ => {}
                }
            }
        }

        let body = self.field(node, "body")?;
        let mut members = Vec::new();
        for member in self.named_children(body) {
            if let Some(m) = self.read_class_member(member)? {
                members.push(m);
            }
        }

        Ok(ClassDecl {
            name,
            type_params: self.read_type_params_field(node)?,
            extends,
            implements,
            members,
            is_abstract: node.kind() == "abstract_class_declaration",
            exported,
            span: self.span(node),
        })
    }

    fn read_class_member(&self, node: Node) -> Result<Option<ClassMember>, ReadError> {
        let span = self.span(node);
        let modifiers = self.read_modifiers(node);
        let kind = match node.kind() {
            "decorator" => return Ok(None),

            "public_field_definition" => ClassMemberKind::Property {
                name: property_name(self.node_text(self.field(node, "name")?)),
                ty: node
                    .child_by_field_name("type")
                    .map(|t| self.read_type(t))
                    .transpose()?,
                init: node
                    .child_by_field_name("value")
                    .map(|v| self.read_expr(v))
                    .transpose()?,
                optional: self.has_token(node, "?"),
            },

            "method_definition" | "method_signature" | "abstract_method_signature" => {
                let name = property_name(self.node_text(self.field(node, "name")?));
                let params = self.read_params_field(node)?;
                let body = node
                    .child_by_field_name("body")
                    .map(|b| self.read_block(b))
                    .transpose()?;
                if name == "constructor" {
                    ClassMemberKind::Constructor { params, body }
                } else {
                    let kind = if self.has_token(node, "get") {
                        MethodKind::Getter
                    } else if self.has_token(node, "set") {
                        MethodKind::Setter
                    } else {
                        MethodKind::Method
                    };
                    ClassMemberKind::Method {
                        name,
                        kind,
                        type_params: self.read_type_params_field(node)?,
                        params,
                        return_type: self.read_return_type(node)?,
                        body,
                        is_generator: self.has_token(node, "*"),
                    }
                }
            }

            other => ClassMemberKind::Unsupported(other.to_string()),
        };
        let mut modifiers = modifiers;
        if node.kind() == "abstract_method_signature" {
            modifiers.is_abstract = true;
        }
        Ok(Some(ClassMember {
            kind,
            modifiers,
            span,
        }))
    }

    fn read_interface(&self, node: Node, exported: bool) -> Result<InterfaceDecl, ReadError> {
        let name = self.node_text(self.field(node, "name")?).to_string();
        let mut extends = Vec::new();
        for child in self.named_children(node) {
            if child.kind() == "extends_type_clause" {
                for ty in self.named_children(child) {
                    extends.push(self.read_type(ty)?);
                }
            }
        }
        let body = self.field(node, "body")?;
        Ok(InterfaceDecl {
            name,
            type_params: self.read_type_params_field(node)?,
            extends,
            members: self.read_type_members(body)?,
            exported,
            span: self.span(node),
        })
    }

    fn read_type_members(&self, body: Node) -> Result<Vec<TypeMember>, ReadError> {
        let mut members = Vec::new();
        for child in self.named_children(body) {
            let span = self.span(child);
            let kind = match child.kind() {
                "property_signature" => TypeMemberKind::Property {
                    name: property_name(self.node_text(self.field(child, "name")?)),
                    ty: child
                        .child_by_field_name("type")
                        .map(|t| self.read_type(t))
                        .transpose()?,
                    optional: self.has_token(child, "?"),
                    readonly: self.has_token(child, "readonly"),
                },
                "method_signature" => TypeMemberKind::Method {
                    name: property_name(self.node_text(self.field(child, "name")?)),
                    type_params: self.read_type_params_field(child)?,
                    params: self.read_params_field(child)?,
                    return_type: self.read_return_type(child)?,
                    optional: self.has_token(child, "?"),
                },
                "index_signature" => match (
                    child.child_by_field_name("name"),
                    child.child_by_field_name("index_type"),
                    child.child_by_field_name("type"),
                ) {
                    (Some(name), Some(key), Some(value)) => TypeMemberKind::Index {
                        key_name: self.node_text(name).to_string(),
                        key: self.read_type(key)?,
                        value: self.read_type(value)?,
                        readonly: self.has_token(child, "readonly"),
                    },
                    _ => TypeMemberKind::Unsupported("mapped_type".into()),
                },
                "call_signature" => TypeMemberKind::Call {
                    params: self.read_params_field(child)?,
                    return_type: self.read_return_type(child)?,
                },
                other => TypeMemberKind::Unsupported(other.to_string()),
            };
            members.push(TypeMember { kind, span });
        }
        Ok(members)
    }

    fn read_enum(&self, node: Node, exported: bool) -> Result<EnumDecl, ReadError> {
        let name = self.node_text(self.field(node, "name")?).to_string();
        let body = self.field(node, "body")?;
        let mut members = Vec::new();
        for child in self.named_children(body) {
            let span = self.span(child);
            match child.kind() {
                "enum_assignment" => members.push(EnumMember {
                    name: property_name(self.node_text(self.field(child, "name")?)),
                    init: Some(self.read_expr(self.field(child, "value")?)?),
                    span,
                }),
                _ => members.push(EnumMember {
                    name: property_name(self.node_text(child)),
                    init: None,
                    span,
                }),
            }
        }
        Ok(EnumDecl {
            name,
            members,
            is_const: self.has_token(node, "const"),
            exported,
            span: self.span(node),
        })
    }

    // ========================================================================
    // Patterns
    // ========================================================================

    fn read_pattern(&self, node: Node) -> Result<Pattern, ReadError> {
        let span = self.span(node);
        match node.kind() {
            "identifier" | "shorthand_property_identifier_pattern" | "undefined" => {
                Ok(Pattern::ident(self.node_text(node), span))
            }

            "assignment_pattern" | "object_assignment_pattern" => {
                let left = self.read_pattern(self.field(node, "left")?)?;
                let right = self.read_expr(self.field(node, "right")?)?;
                match left {
                    Pattern::Ident { name, span, .. } => Ok(Pattern::Ident {
                        name,
                        default: Some(Box::new(right)),
                        span,
                    }),
                    other => Ok(other),
                }
            }

            "array_pattern" => {
                let mut elements = Vec::new();
                let mut rest = None;
                let mut expecting = true;
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    match child.kind() {
                        "[" | "]" | "comment" => {}
                        "," => {
                            if expecting {
                                elements.push(None);
                            }
                            expecting = true;
                        }
                        "rest_pattern" => {
                            if let Some(inner) = self.first_named(child) {
                                rest = Some(Box::new(self.read_pattern(inner)?));
                            }
                            expecting = false;
                        }
                        _ => {
                            elements.push(Some(self.read_pattern(child)?));
                            expecting = false;
                        }
                    }
                }
                Ok(Pattern::Array {
                    elements,
                    rest,
                    span,
                })
            }

            "object_pattern" => {
                let mut props = Vec::new();
                let mut rest = None;
                for child in self.named_children(node) {
                    match child.kind() {
                        "shorthand_property_identifier_pattern" => {
                            let name = self.node_text(child).to_string();
                            props.push(ObjectPatternProp {
                                key: name.clone(),
                                value: Pattern::ident(name, self.span(child)),
                            });
                        }
                        "object_assignment_pattern" => {
                            let value = self.read_pattern(child)?;
                            let key = value.as_ident().unwrap_or_default().to_string();
                            props.push(ObjectPatternProp { key, value });
                        }
                        "pair_pattern" => {
                            let key = property_name(self.node_text(self.field(child, "key")?));
                            let value = self.read_pattern(self.field(child, "value")?)?;
                            props.push(ObjectPatternProp { key, value });
                        }
                        "rest_pattern" => {
                            rest = self.first_named(child).map(|n| self.node_text(n).to_string());
                        }
                        _ => {}
                    }
                }
                Ok(Pattern::Object { props, rest, span })
            }

            other => Err(ReadError::UnexpectedNode {
                expected: "binding pattern".into(),
                got: other.to_string(),
            }),
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn read_expr(&self, node: Node) -> Result<Expr, ReadError> {
        let span = self.span(node);
        let kind = match node.kind() {
            "parenthesized_expression" => {
                let inner = self
                    .first_named(node)
                    .ok_or_else(|| ReadError::Parse("empty parentheses".into()))?;
                return self.read_expr(inner);
            }

            "number" => ExprKind::Number(self.node_text(node).to_string()),
            "string" => ExprKind::String(unquote(self.node_text(node))),
            "template_string" => ExprKind::Template(self.read_template(node)?),
            "true" => ExprKind::Bool(true),
            "false" => ExprKind::Bool(false),
            "null" => ExprKind::Null,
            "undefined" => ExprKind::Undefined,
            "this" => ExprKind::This,
            "super" => ExprKind::Super,
            "identifier" | "shorthand_property_identifier" => {
                ExprKind::Ident(self.node_text(node).to_string())
            }

            "array" => {
                let mut elements = Vec::new();
                for child in self.named_children(node) {
                    elements.push(self.read_expr(child)?);
                }
                ExprKind::Array(elements)
            }

            "object" => ExprKind::Object(self.read_object(node)?),

            "member_expression" => ExprKind::Member {
                object: Box::new(self.read_expr(self.field(node, "object")?)?),
                property: self.node_text(self.field(node, "property")?).to_string(),
                optional: node.child_by_field_name("optional_chain").is_some(),
            },

            "subscript_expression" => ExprKind::Index {
                object: Box::new(self.read_expr(self.field(node, "object")?)?),
                index: Box::new(self.read_expr(self.field(node, "index")?)?),
                optional: node.child_by_field_name("optional_chain").is_some(),
            },

            "call_expression" => {
                let arguments = self.field(node, "arguments")?;
                if arguments.kind() == "template_string" {
                    ExprKind::Unsupported("tagged template".into())
                } else {
                    ExprKind::Call {
                        callee: Box::new(self.read_expr(self.field(node, "function")?)?),
                        type_args: match node.child_by_field_name("type_arguments") {
                            Some(list) => self.read_type_args(list)?,
                            None => Vec::new(),
                        },
                        args: self.read_arguments(arguments)?,
                        optional: node.child_by_field_name("optional_chain").is_some(),
                    }
                }
            }

            "new_expression" => ExprKind::New {
                callee: Box::new(self.read_expr(self.field(node, "constructor")?)?),
                type_args: match node.child_by_field_name("type_arguments") {
                    Some(list) => self.read_type_args(list)?,
                    None => Vec::new(),
                },
                args: match node.child_by_field_name("arguments") {
                    Some(args) => self.read_arguments(args)?,
                    None => Vec::new(),
                },
            },

            "unary_expression" => {
                let op_text = self.node_text(self.field(node, "operator")?);
                let op = UnaryOp::from_token(op_text).ok_or_else(|| {
                    ReadError::Parse(format!("unknown unary operator: {}", op_text))
                })?;
                ExprKind::Unary {
                    op,
                    operand: Box::new(self.read_expr(self.field(node, "argument")?)?),
                }
            }

            "update_expression" => {
                let op_node = self.field(node, "operator")?;
                let argument = self.field(node, "argument")?;
                let op = if self.node_text(op_node) == "++" {
                    UpdateOp::Increment
                } else {
                    UpdateOp::Decrement
                };
                ExprKind::Update {
                    op,
                    prefix: op_node.start_byte() < argument.start_byte(),
                    operand: Box::new(self.read_expr(argument)?),
                }
            }

            "binary_expression" => {
                let op_text = self.node_text(self.field(node, "operator")?);
                let op = BinaryOp::from_token(op_text).ok_or_else(|| {
                    ReadError::Parse(format!("unknown binary operator: {}", op_text))
                })?;
                ExprKind::Binary {
                    op,
                    left: Box::new(self.read_expr(self.field(node, "left")?)?),
                    right: Box::new(self.read_expr(self.field(node, "right")?)?),
                }
            }

            "assignment_expression" => ExprKind::Assign {
                op: AssignOp::Assign,
                target: Box::new(self.read_expr(self.field(node, "left")?)?),
                value: Box::new(self.read_expr(self.field(node, "right")?)?),
            },

            "augmented_assignment_expression" => {
                let op_text = self.node_text(self.field(node, "operator")?);
                match AssignOp::from_token(op_text) {
                    Some(op) => ExprKind::Assign {
                        op,
                        target: Box::new(self.read_expr(self.field(node, "left")?)?),
                        value: Box::new(self.read_expr(self.field(node, "right")?)?),
                    },
                    None => ExprKind::Unsupported(format!("assignment operator {}", op_text)),
                }
            }

            "ternary_expression" => ExprKind::Conditional {
                test: Box::new(self.read_expr(self.field(node, "condition")?)?),
                consequent: Box::new(self.read_expr(self.field(node, "consequence")?)?),
                alternate: Box::new(self.read_expr(self.field(node, "alternative")?)?),
            },

            "arrow_function" | "function_expression" | "function" | "generator_function" => {
                ExprKind::Function(Box::new(self.read_function_expr(node)?))
            }

            "await_expression" => {
                let inner = self
                    .first_named(node)
                    .ok_or_else(|| ReadError::Parse("await without operand".into()))?;
                ExprKind::Await(Box::new(self.read_expr(inner)?))
            }

            "yield_expression" => ExprKind::Yield {
                argument: self
                    .first_named(node)
                    .map(|n| self.read_expr(n).map(Box::new))
                    .transpose()?,
                delegate: self.has_token(node, "*"),
            },

            "as_expression" | "type_assertion" => {
                let children = self.named_children(node);
                let (expr_node, type_node) = if node.kind() == "type_assertion" {
                    // `<T>expr`
                    let ty = children.first().and_then(|args| self.first_named(*args));
                    (children.get(1).copied(), ty)
                } else {
                    (children.first().copied(), children.get(1).copied())
                };
                let expr_node = expr_node
                    .ok_or_else(|| ReadError::Parse("type assertion without operand".into()))?;
                match type_node {
                    Some(ty) => ExprKind::As {
                        expr: Box::new(self.read_expr(expr_node)?),
                        ty: self.read_type(ty)?,
                    },
                    // `as const`
                    None => return self.read_expr(expr_node),
                }
            }

            "satisfies_expression" => {
                let inner = self
                    .first_named(node)
                    .ok_or_else(|| ReadError::Parse("satisfies without operand".into()))?;
                return self.read_expr(inner);
            }

            "non_null_expression" => {
                let inner = self
                    .first_named(node)
                    .ok_or_else(|| ReadError::Parse("non-null without operand".into()))?;
                ExprKind::NonNull(Box::new(self.read_expr(inner)?))
            }

            "spread_element" => {
                let inner = self
                    .first_named(node)
                    .ok_or_else(|| ReadError::Parse("spread without operand".into()))?;
                ExprKind::Spread(Box::new(self.read_expr(inner)?))
            }

            other => ExprKind::Unsupported(other.to_string()),
        };
        Ok(Expr::new(kind, span))
    }

    fn read_arguments(&self, node: Node) -> Result<Vec<Expr>, ReadError> {
        self.named_children(node)
            .into_iter()
            .map(|arg| self.read_expr(arg))
            .collect()
    }

    fn read_type_args(&self, node: Node) -> Result<Vec<TypeNode>, ReadError> {
        self.named_children(node)
            .into_iter()
            .map(|arg| self.read_type(arg))
            .collect()
    }

    fn read_object(&self, node: Node) -> Result<Vec<ObjectProp>, ReadError> {
        let mut props = Vec::new();
        for child in self.named_children(node) {
            match child.kind() {
                "pair" => {
                    let key_node = self.field(child, "key")?;
                    let value = self.read_expr(self.field(child, "value")?)?;
                    let key = match key_node.kind() {
                        "string" => unquote(self.node_text(key_node)),
                        "computed_property_name" => {
                            props.push(ObjectProp::Spread(Expr::new(
                                ExprKind::Unsupported("computed property name".into()),
                                self.span(key_node),
                            )));
                            continue;
                        }
                        _ => self.node_text(key_node).to_string(),
                    };
                    props.push(ObjectProp::KeyValue { key, value });
                }
                "shorthand_property_identifier" => props.push(ObjectProp::Shorthand {
                    name: self.node_text(child).to_string(),
                    span: self.span(child),
                }),
                "spread_element" => {
                    let inner = self
                        .first_named(child)
                        .ok_or_else(|| ReadError::Parse("spread without operand".into()))?;
                    props.push(ObjectProp::Spread(self.read_expr(inner)?));
                }
                "method_definition" => {
                    let name = property_name(self.node_text(self.field(child, "name")?));
                    let value = Expr::new(
                        ExprKind::Function(Box::new(self.read_function_expr(child)?)),
                        self.span(child),
                    );
                    props.push(ObjectProp::KeyValue { key: name, value });
                }
                _ => {}
            }
        }
        Ok(props)
    }

    fn read_function_expr(&self, node: Node) -> Result<FunctionExpr, ReadError> {
        let body_node = self.field(node, "body")?;
        let body = if body_node.kind() == "statement_block" {
            FunctionBody::Block(self.read_block(body_node)?)
        } else {
            FunctionBody::Expr(Box::new(self.read_expr(body_node)?))
        };
        let name = if node.kind() == "method_definition" {
            None
        } else {
            node.child_by_field_name("name")
                .map(|n| self.node_text(n).to_string())
        };
        Ok(FunctionExpr {
            name,
            type_params: self.read_type_params_field(node)?,
            params: self.read_params_field(node)?,
            return_type: self.read_return_type(node)?,
            body,
            is_async: self.has_token(node, "async"),
            is_generator: node.kind() == "generator_function" || self.has_token(node, "*"),
            is_arrow: node.kind() == "arrow_function",
        })
    }

    fn read_template(&self, node: Node) -> Result<Vec<TemplatePart>, ReadError> {
        let mut parts: Vec<TemplatePart> = Vec::new();
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "string_fragment" | "escape_sequence" => {
                    let text = if child.kind() == "escape_sequence" {
                        unescape(self.node_text(child))
                    } else {
                        self.node_text(child).to_string()
                    };
                    match parts.last_mut() {
                        Some(TemplatePart::Text(existing)) => existing.push_str(&text),
                        _ => parts.push(TemplatePart::Text(text)),
                    }
                }
                "template_substitution" => {
                    let inner = self
                        .first_named(child)
                        .ok_or_else(|| ReadError::Parse("empty template substitution".into()))?;
                    parts.push(TemplatePart::Expr(self.read_expr(inner)?));
                }
                _ => {}
            }
        }
        Ok(parts)
    }

    // ========================================================================
    // Types
    // ========================================================================

    fn read_type(&self, node: Node) -> Result<TypeNode, ReadError> {
        let span = self.span(node);
        let kind = match node.kind() {
            "type_annotation" | "parenthesized_type" | "readonly_type" | "constraint"
            | "default_type" => {
                let inner = self
                    .first_named(node)
                    .ok_or_else(|| ReadError::Parse(format!("empty {}", node.kind())))?;
                return self.read_type(inner);
            }

            "predefined_type" => {
                let text = self.node_text(node);
                match TypeKeyword::from_text(text) {
                    Some(keyword) => TypeKind::Keyword(keyword),
                    None => TypeKind::Unsupported(text.to_string()),
                }
            }

            "type_identifier" | "nested_type_identifier" | "identifier" => TypeKind::Reference {
                name: compact(self.node_text(node)),
                args: Vec::new(),
            },

            "generic_type" => TypeKind::Reference {
                name: compact(self.node_text(self.field(node, "name")?)),
                args: match node.child_by_field_name("type_arguments") {
                    Some(list) => self.read_type_args(list)?,
                    None => Vec::new(),
                },
            },

            "array_type" => {
                let inner = self
                    .first_named(node)
                    .ok_or_else(|| ReadError::Parse("array type without element".into()))?;
                TypeKind::Array(Box::new(self.read_type(inner)?))
            }

            "tuple_type" => {
                let mut elements = Vec::new();
                for child in self.named_children(node) {
                    elements.push(self.read_tuple_element(child)?);
                }
                TypeKind::Tuple(elements)
            }

            "union_type" => {
                let mut members = Vec::new();
                self.flatten_type(node, "union_type", &mut members)?;
                TypeKind::Union(members)
            }

            "intersection_type" => {
                let mut members = Vec::new();
                self.flatten_type(node, "intersection_type", &mut members)?;
                TypeKind::Intersection(members)
            }

            "literal_type" => {
                let inner = self
                    .first_named(node)
                    .ok_or_else(|| ReadError::Parse("empty literal type".into()))?;
                match inner.kind() {
                    "string" => TypeKind::Literal(LiteralType::String(unquote(
                        self.node_text(inner),
                    ))),
                    "number" | "unary_expression" => {
                        TypeKind::Literal(LiteralType::Number(compact(self.node_text(inner))))
                    }
                    "true" => TypeKind::Literal(LiteralType::Boolean(true)),
                    "false" => TypeKind::Literal(LiteralType::Boolean(false)),
                    "null" => TypeKind::Keyword(TypeKeyword::Null),
                    "undefined" => TypeKind::Keyword(TypeKeyword::Undefined),
                    other => TypeKind::Unsupported(other.to_string()),
                }
            }

            "object_type" => TypeKind::Object(self.read_type_members(node)?),

            "function_type" => {
                let ret = self.field(node, "return_type")?;
                TypeKind::Function {
                    type_params: self.read_type_params_field(node)?,
                    params: self.read_params_field(node)?,
                    ret: Box::new(self.read_type(ret)?),
                }
            }

            "this_type" => TypeKind::This,

            other => TypeKind::Unsupported(other.to_string()),
        };
        Ok(TypeNode::new(kind, span))
    }

    fn read_tuple_element(&self, node: Node) -> Result<TupleElement, ReadError> {
        match node.kind() {
            "optional_type" => {
                let inner = self
                    .first_named(node)
                    .ok_or_else(|| ReadError::Parse("empty optional type".into()))?;
                Ok(TupleElement {
                    name: None,
                    ty: self.read_type(inner)?,
                    optional: true,
                    rest: false,
                })
            }
            "rest_type" => {
                let inner = self
                    .first_named(node)
                    .ok_or_else(|| ReadError::Parse("empty rest type".into()))?;
                Ok(TupleElement {
                    name: None,
                    ty: self.read_type(inner)?,
                    optional: false,
                    rest: true,
                })
            }
            "tuple_parameter" | "optional_tuple_parameter" => {
                let name = node
                    .child_by_field_name("name")
                    .map(|n| self.node_text(n).to_string());
                let ty = self.read_type(self.field(node, "type")?)?;
                Ok(TupleElement {
                    name,
                    ty,
                    optional: node.kind() == "optional_tuple_parameter",
                    rest: false,
                })
            }
            _ => Ok(TupleElement {
                name: None,
                ty: self.read_type(node)?,
                optional: false,
                rest: false,
            }),
        }
    }

    fn flatten_type(
        &self,
        node: Node,
        kind: &str,
        out: &mut Vec<TypeNode>,
    ) -> Result<(), ReadError> {
        for child in self.named_children(node) {
            if child.kind() == kind {
                self.flatten_type(child, kind, out)?;
            } else {
                out.push(self.read_type(child)?);
            }
        }
        Ok(())
    }
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|c| c.has_error() || c.is_missing())
        .find_map(first_error)
}

/// Strip whitespace inside dotted names (`ns . Name` → `ns.Name`).
fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn property_name(text: &str) -> String {
    if text.starts_with('"') || text.starts_with('\'') {
        unquote(text)
    } else {
        text.to_string()
    }
}

/// Remove surrounding quotes and decode escapes.
fn unquote(text: &str) -> String {
    let inner = if text.len() >= 2
        && (text.starts_with('"') || text.starts_with('\'') || text.starts_with('`'))
    {
        &text[1..text.len() - 1]
    } else {
        text
    };
    unescape(inner)
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('u') => {
                let mut hex = String::new();
                if chars.peek() == Some(&'{') {
                    chars.next();
                    for h in chars.by_ref() {
                        if h == '}' {
                            break;
                        }
                        hex.push(h);
                    }
                } else {
                    for _ in 0..4 {
                        if let Some(h) = chars.next() {
                            hex.push(h);
                        }
                    }
                }
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some('\n') => {}
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(code: &str) -> SourceModule {
        read_typescript("main.ts", code).unwrap()
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unquote(r#""a\nb""#), "a\nb");
        assert_eq!(unquote(r"'A\u{42}'"), "AB");
        assert_eq!(unquote(r#""q\"q""#), "q\"q");
    }

    #[test]
    fn test_const_with_annotation() {
        let module = parse("const x: int = 42;");
        match &module.body[0].kind {
            StmtKind::Var(decl) => {
                assert_eq!(decl.kind, VarKind::Const);
                let d = &decl.declarators[0];
                assert_eq!(d.pattern.as_ident(), Some("x"));
                assert!(matches!(
                    &d.ty.as_ref().unwrap().kind,
                    TypeKind::Reference { name, .. } if name == "int"
                ));
                assert!(matches!(&d.init.as_ref().unwrap().kind, ExprKind::Number(n) if n == "42"));
            }
            other => panic!("expected Var, got {:?}", other),
        }
    }

    #[test]
    fn test_union_is_flattened() {
        let module = parse(r#"type Mode = "a" | "b" | "c";"#);
        match &module.body[0].kind {
            StmtKind::TypeAlias(alias) => match &alias.ty.kind {
                TypeKind::Union(members) => {
                    assert_eq!(members.len(), 3);
                    assert!(matches!(
                        &members[2].kind,
                        TypeKind::Literal(LiteralType::String(s)) if s == "c"
                    ));
                }
                other => panic!("expected Union, got {:?}", other),
            },
            other => panic!("expected TypeAlias, got {:?}", other),
        }
    }

    #[test]
    fn test_class_members_and_heritage() {
        let module = parse(
            r#"
            export class Dog extends Animal implements Named {
                private readonly age: number = 3;
                constructor(public name: string) { super(); }
                protected speak(): string { return "woof"; }
                static create(): Dog { return new Dog("rex"); }
            }
            "#,
        );
        match &module.body[0].kind {
            StmtKind::Class(class) => {
                assert!(class.exported);
                assert_eq!(class.name, "Dog");
                assert!(matches!(
                    &class.extends.as_ref().unwrap().kind,
                    TypeKind::Reference { name, .. } if name == "Animal"
                ));
                assert_eq!(class.implements.len(), 1);
                assert_eq!(class.members.len(), 4);
                let age = &class.members[0];
                assert_eq!(age.modifiers.accessibility, Some(Accessibility::Private));
                assert!(age.modifiers.readonly);
                match &class.members[1].kind {
                    ClassMemberKind::Constructor { params, .. } => {
                        assert!(params[0].is_parameter_property());
                    }
                    other => panic!("expected Constructor, got {:?}", other),
                }
                assert_eq!(
                    class.members[2].modifiers.accessibility,
                    Some(Accessibility::Protected)
                );
                assert!(class.members[3].modifiers.is_static);
            }
            other => panic!("expected Class, got {:?}", other),
        }
    }

    #[test]
    fn test_generator_with_receive() {
        let module = parse(
            r#"
            function* counter(): Generator<number, void, string> {
                const reply = yield 1;
                yield* other();
            }
            "#,
        );
        match &module.body[0].kind {
            StmtKind::Function(func) => {
                assert!(func.is_generator);
                let body = func.body.as_ref().unwrap();
                match &body[0].kind {
                    StmtKind::Var(decl) => assert!(matches!(
                        decl.declarators[0].init.as_ref().unwrap().kind,
                        ExprKind::Yield { delegate: false, .. }
                    )),
                    other => panic!("expected Var, got {:?}", other),
                }
                match &body[1].kind {
                    StmtKind::Expr(expr) => {
                        assert!(matches!(expr.kind, ExprKind::Yield { delegate: true, .. }))
                    }
                    other => panic!("expected Expr, got {:?}", other),
                }
            }
            other => panic!("expected Function, got {:?}", other),
        }
    }

    #[test]
    fn test_imports() {
        let module = parse(
            r#"
            import { List as Vec, Dictionary } from "@dotnet/System.Collections.Generic";
            import * as util from "./util";
            "#,
        );
        match &module.body[0].kind {
            StmtKind::Import(import) => {
                assert_eq!(import.source, "@dotnet/System.Collections.Generic");
                assert_eq!(
                    import.specifiers[0],
                    ImportSpecifier::Named {
                        imported: "List".into(),
                        local: "Vec".into()
                    }
                );
                assert_eq!(import.specifiers[1].local(), "Dictionary");
            }
            other => panic!("expected Import, got {:?}", other),
        }
        match &module.body[1].kind {
            StmtKind::Import(import) => assert_eq!(
                import.specifiers[0],
                ImportSpecifier::Namespace {
                    local: "util".into()
                }
            ),
            other => panic!("expected Import, got {:?}", other),
        }
    }

    #[test]
    fn test_syntax_error_is_located() {
        let err = read_typescript("bad.ts", "const = ;").unwrap_err();
        match err {
            ReadError::Syntax { path, line, .. } => {
                assert_eq!(path, "bad.ts");
                assert_eq!(line, 1);
            }
            other => panic!("expected Syntax error, got {:?}", other),
        }
    }
}
