//! C# text writer.
//!
//! Layout only: four-space indentation, one member or statement per line,
//! binary and conditional expressions always parenthesized.

use crate::cs::*;

pub struct CsWriter {
    output: String,
    indent: usize,
}

impl Default for CsWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsWriter {
    pub fn new() -> Self {
        Self {
            output: String::new(),
            indent: 0,
        }
    }

    /// Render a whole compilation unit.
    pub fn file(file: &CsFile) -> String {
        let mut writer = Self::new();
        writer.write_file(file);
        writer.output
    }

    /// Render one statement (and anything nested in it).
    pub fn statement(stmt: &CsStmt) -> String {
        let mut writer = Self::new();
        writer.write_stmt(stmt);
        writer.output
    }

    pub fn expression(expr: &CsExpr) -> String {
        let mut writer = Self::new();
        writer.write_expr(expr);
        writer.output
    }

    pub fn type_decl(decl: &CsTypeDecl) -> String {
        let mut writer = Self::new();
        writer.write_type_decl(decl);
        writer.output
    }

    fn write_file(&mut self, file: &CsFile) {
        self.output.push_str("#nullable enable\n");
        for using in &file.usings {
            self.output.push_str("using ");
            self.output.push_str(using);
            self.output.push_str(";\n");
        }
        self.output.push('\n');
        self.output.push_str("namespace ");
        self.output.push_str(&file.namespace);
        self.output.push_str(";\n");
        for decl in &file.types {
            self.output.push('\n');
            self.write_type_decl(decl);
        }
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.output.push_str("    ");
        }
    }

    fn line(&mut self, text: &str) {
        self.write_indent();
        self.output.push_str(text);
        self.output.push('\n');
    }

    fn write_modifiers(&mut self, modifiers: &[&'static str]) {
        for m in modifiers {
            self.output.push_str(m);
            self.output.push(' ');
        }
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn write_type_decl(&mut self, decl: &CsTypeDecl) {
        match decl {
            CsTypeDecl::Class(class) => {
                self.write_type_header(&class.modifiers, "class", &class.name, &class.type_params, &class.bases);
                self.write_members(&class.members);
            }
            CsTypeDecl::Interface(iface) => {
                self.write_type_header(&iface.modifiers, "interface", &iface.name, &iface.type_params, &iface.bases);
                self.write_members(&iface.members);
            }
            CsTypeDecl::Enum(e) => {
                self.write_indent();
                self.write_modifiers(&e.modifiers);
                self.output.push_str("enum ");
                self.output.push_str(&e.name);
                self.output.push('\n');
                self.line("{");
                self.indent += 1;
                for (name, value) in &e.members {
                    self.write_indent();
                    self.output.push_str(name);
                    if let Some(value) = value {
                        self.output.push_str(" = ");
                        self.write_expr(value);
                    }
                    self.output.push_str(",\n");
                }
                self.indent -= 1;
                self.line("}");
            }
        }
    }

    fn write_type_header(
        &mut self,
        modifiers: &[&'static str],
        keyword: &str,
        name: &str,
        type_params: &[CsTypeParam],
        bases: &[CsType],
    ) {
        self.write_indent();
        self.write_modifiers(modifiers);
        self.output.push_str(keyword);
        self.output.push(' ');
        self.output.push_str(name);
        self.write_type_params(type_params);
        if !bases.is_empty() {
            self.output.push_str(" : ");
            self.write_comma_types(bases);
        }
        self.write_constraints(type_params);
        self.output.push('\n');
    }

    fn write_type_params(&mut self, type_params: &[CsTypeParam]) {
        if type_params.is_empty() {
            return;
        }
        self.output.push('<');
        for (i, tp) in type_params.iter().enumerate() {
            if i > 0 {
                self.output.push_str(", ");
            }
            self.output.push_str(&tp.name);
        }
        self.output.push('>');
    }

    fn write_constraints(&mut self, type_params: &[CsTypeParam]) {
        for tp in type_params.iter().filter(|tp| !tp.constraints.is_empty()) {
            self.output.push_str(" where ");
            self.output.push_str(&tp.name);
            self.output.push_str(" : ");
            self.write_comma_types(&tp.constraints);
        }
    }

    fn write_comma_types(&mut self, types: &[CsType]) {
        for (i, ty) in types.iter().enumerate() {
            if i > 0 {
                self.output.push_str(", ");
            }
            self.output.push_str(&ty.to_string());
        }
    }

    fn write_members(&mut self, members: &[CsMember]) {
        self.line("{");
        self.indent += 1;
        for (i, member) in members.iter().enumerate() {
            if i > 0 && needs_blank_line(&members[i - 1], member) {
                self.output.push('\n');
            }
            self.write_member(member);
        }
        self.indent -= 1;
        self.line("}");
    }

    fn write_member(&mut self, member: &CsMember) {
        match member {
            CsMember::Field(field) => {
                self.write_indent();
                self.write_modifiers(&field.modifiers);
                self.output.push_str(&field.ty.to_string());
                self.output.push(' ');
                self.output.push_str(&field.name);
                if let Some(init) = &field.init {
                    self.output.push_str(" = ");
                    self.write_expr(init);
                }
                self.output.push_str(";\n");
            }
            CsMember::Property(prop) => self.write_property(prop),
            CsMember::Method(method) => self.write_method(method),
            CsMember::Constructor(ctor) => {
                self.write_indent();
                self.write_modifiers(&ctor.modifiers);
                self.output.push_str(&ctor.name);
                self.write_params(&ctor.params);
                if let Some(args) = &ctor.base_args {
                    self.output.push_str(" : base");
                    self.write_args(args);
                }
                self.output.push('\n');
                self.write_block(&ctor.body);
            }
            CsMember::Type(decl) => self.write_type_decl(decl),
        }
    }

    fn write_property(&mut self, prop: &CsProperty) {
        self.write_indent();
        self.write_modifiers(&prop.modifiers);
        self.output.push_str(&prop.ty.to_string());
        self.output.push(' ');
        self.output.push_str(&prop.name);
        let all_auto = prop.getter.as_ref().is_none_or(|g| matches!(g, CsAccessor::Auto))
            && prop.setter.as_ref().is_none_or(|s| matches!(s, CsAccessor::Auto));
        let setter_keyword = if prop.init_only { "init" } else { "set" };
        if all_auto {
            self.output.push_str(" {");
            if prop.getter.is_some() {
                self.output.push_str(" get;");
            }
            if prop.setter.is_some() {
                self.output.push(' ');
                self.output.push_str(setter_keyword);
                self.output.push(';');
            }
            self.output.push_str(" }");
            if let Some(init) = &prop.init {
                self.output.push_str(" = ");
                self.write_expr(init);
                self.output.push(';');
            }
            self.output.push('\n');
            return;
        }
        self.output.push('\n');
        self.line("{");
        self.indent += 1;
        for (keyword, accessor) in [("get", &prop.getter), (setter_keyword, &prop.setter)] {
            match accessor {
                None => {}
                Some(CsAccessor::Auto) => self.line(&format!("{};", keyword)),
                Some(CsAccessor::Body(body)) => {
                    self.line(keyword);
                    self.write_block(body);
                }
            }
        }
        self.indent -= 1;
        self.line("}");
    }

    fn write_method(&mut self, method: &CsMethod) {
        self.write_indent();
        self.write_method_signature(method);
        match &method.body {
            None => self.output.push_str(";\n"),
            Some(body) => {
                self.output.push('\n');
                self.write_block(body);
            }
        }
    }

    fn write_method_signature(&mut self, method: &CsMethod) {
        self.write_modifiers(&method.modifiers);
        self.output.push_str(&method.ret.to_string());
        self.output.push(' ');
        self.output.push_str(&method.name);
        self.write_type_params(&method.type_params);
        self.write_params(&method.params);
        self.write_constraints(&method.type_params);
    }

    fn write_params(&mut self, params: &[CsParam]) {
        self.output.push('(');
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.output.push_str(", ");
            }
            if let Some(modifier) = param.modifier {
                self.output.push_str(modifier);
                self.output.push(' ');
            }
            self.output.push_str(&param.ty.to_string());
            self.output.push(' ');
            self.output.push_str(&param.name);
            if let Some(default) = &param.default {
                self.output.push_str(" = ");
                self.write_expr(default);
            }
        }
        self.output.push(')');
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// `{ ... }` on its own lines at the current indentation.
    fn write_block(&mut self, body: &[CsStmt]) {
        self.line("{");
        self.indent += 1;
        for stmt in body {
            self.write_stmt(stmt);
        }
        self.indent -= 1;
        self.line("}");
    }

    fn write_stmt(&mut self, stmt: &CsStmt) {
        match stmt {
            CsStmt::Expr(expr) => {
                self.write_indent();
                self.write_expr(expr);
                self.output.push_str(";\n");
            }
            CsStmt::Local { ty, name, init } => {
                self.write_indent();
                self.write_local(ty, name, init.as_ref());
                self.output.push_str(";\n");
            }
            CsStmt::Return(value) => {
                self.write_indent();
                self.output.push_str("return");
                if let Some(value) = value {
                    self.output.push(' ');
                    self.write_expr(value);
                }
                self.output.push_str(";\n");
            }
            CsStmt::If { test, then, otherwise } => {
                self.write_indent();
                self.write_if(test, then, otherwise.as_deref());
            }
            CsStmt::While { test, body } => {
                self.write_indent();
                self.output.push_str("while (");
                self.write_expr(test);
                self.output.push_str(")\n");
                self.write_block(body);
            }
            CsStmt::DoWhile { body, test } => {
                self.line("do");
                self.write_block(body);
                // Replace the closing newline so `while` follows the brace.
                self.output.pop();
                self.output.push_str(" while (");
                self.write_expr(test);
                self.output.push_str(");\n");
            }
            CsStmt::For { init, test, update, body } => {
                self.write_indent();
                self.output.push_str("for (");
                for (i, s) in init.iter().enumerate() {
                    if i > 0 {
                        self.output.push_str(", ");
                    }
                    match s {
                        CsStmt::Local { ty, name, init } => self.write_local(ty, name, init.as_ref()),
                        CsStmt::Expr(e) => self.write_expr(e),
                        _ => {}
                    }
                }
                self.output.push_str("; ");
                if let Some(test) = test {
                    self.write_expr(test);
                }
                self.output.push_str("; ");
                for (i, e) in update.iter().enumerate() {
                    if i > 0 {
                        self.output.push_str(", ");
                    }
                    self.write_expr(e);
                }
                self.output.push_str(")\n");
                self.write_block(body);
            }
            CsStmt::ForEach {
                ty,
                name,
                iterable,
                body,
                is_await,
            } => {
                self.write_indent();
                if *is_await {
                    self.output.push_str("await ");
                }
                self.output.push_str("foreach (");
                self.output.push_str(&ty.to_string());
                self.output.push(' ');
                self.output.push_str(name);
                self.output.push_str(" in ");
                self.write_expr(iterable);
                self.output.push_str(")\n");
                self.write_block(body);
            }
            CsStmt::Block(body) => self.write_block(body),
            CsStmt::Break => self.line("break;"),
            CsStmt::Continue => self.line("continue;"),
            CsStmt::Throw(value) => {
                self.write_indent();
                self.output.push_str("throw");
                if let Some(value) = value {
                    self.output.push(' ');
                    self.write_expr(value);
                }
                self.output.push_str(";\n");
            }
            CsStmt::Try { block, catches, finally } => {
                self.line("try");
                self.write_block(block);
                for catch in catches {
                    self.write_indent();
                    self.output.push_str("catch");
                    if let Some(ty) = &catch.ty {
                        self.output.push_str(" (");
                        self.output.push_str(&ty.to_string());
                        if let Some(name) = &catch.name {
                            self.output.push(' ');
                            self.output.push_str(name);
                        }
                        self.output.push(')');
                    }
                    self.output.push('\n');
                    self.write_block(&catch.body);
                }
                if let Some(finally) = finally {
                    self.line("finally");
                    self.write_block(finally);
                }
            }
            CsStmt::Switch { subject, sections } => {
                self.write_indent();
                self.output.push_str("switch (");
                self.write_expr(subject);
                self.output.push_str(")\n");
                self.line("{");
                self.indent += 1;
                for section in sections {
                    for label in &section.labels {
                        self.write_indent();
                        match label {
                            Some(value) => {
                                self.output.push_str("case ");
                                self.write_expr(value);
                                self.output.push_str(":\n");
                            }
                            None => self.output.push_str("default:\n"),
                        }
                    }
                    self.indent += 1;
                    for stmt in &section.body {
                        self.write_stmt(stmt);
                    }
                    self.indent -= 1;
                }
                self.indent -= 1;
                self.line("}");
            }
            CsStmt::YieldReturn(value) => {
                self.write_indent();
                self.output.push_str("yield return ");
                self.write_expr(value);
                self.output.push_str(";\n");
            }
            CsStmt::YieldBreak => self.line("yield break;"),
            CsStmt::LocalFunction(method) => self.write_method(method),
            CsStmt::Verbatim(text) => {
                for line in text.lines() {
                    if line.trim().is_empty() {
                        self.output.push('\n');
                    } else {
                        self.line(line);
                    }
                }
            }
        }
    }

    fn write_local(&mut self, ty: &CsType, name: &str, init: Option<&CsExpr>) {
        self.output.push_str(&ty.to_string());
        self.output.push(' ');
        self.output.push_str(name);
        if let Some(init) = init {
            self.output.push_str(" = ");
            self.write_expr(init);
        }
    }

    /// Continues the current line; `else if` chains stay flat.
    fn write_if(&mut self, test: &CsExpr, then: &[CsStmt], otherwise: Option<&[CsStmt]>) {
        self.output.push_str("if (");
        self.write_expr(test);
        self.output.push_str(")\n");
        self.write_block(then);
        let Some(otherwise) = otherwise else {
            return;
        };
        self.write_indent();
        if let [CsStmt::If { test, then, otherwise }] = otherwise {
            self.output.push_str("else ");
            self.write_if(test, then, otherwise.as_deref());
        } else {
            self.output.push_str("else\n");
            self.write_block(otherwise);
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn write_args(&mut self, args: &[CsArg]) {
        self.output.push('(');
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.output.push_str(", ");
            }
            if let Some(modifier) = arg.modifier {
                self.output.push_str(modifier);
                self.output.push(' ');
            }
            self.write_expr(&arg.value);
        }
        self.output.push(')');
    }

    fn write_comma_exprs(&mut self, items: &[CsExpr]) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.output.push_str(", ");
            }
            self.write_expr(item);
        }
    }

    /// Receivers of `.`, `[]`, `()` and postfix operators need parentheses
    /// unless they are primary expressions.
    fn write_primary(&mut self, expr: &CsExpr) {
        let primary = match expr {
            CsExpr::Literal(text) => !text.starts_with('-'),
            other => is_primary(other),
        };
        if primary {
            self.write_expr(expr);
        } else {
            self.output.push('(');
            self.write_expr(expr);
            self.output.push(')');
        }
    }

    fn write_expr(&mut self, expr: &CsExpr) {
        match expr {
            CsExpr::Literal(text) | CsExpr::Ident(text) | CsExpr::Verbatim(text) => self.output.push_str(text),
            CsExpr::Type(ty) => self.output.push_str(&ty.to_string()),
            CsExpr::This => self.output.push_str("this"),
            CsExpr::Base => self.output.push_str("base"),
            CsExpr::Member {
                object,
                name,
                conditional,
            } => {
                self.write_primary(object);
                self.output.push_str(if *conditional { "?." } else { "." });
                self.output.push_str(name);
            }
            CsExpr::Index {
                object,
                index,
                conditional,
            } => {
                self.write_primary(object);
                self.output.push_str(if *conditional { "?[" } else { "[" });
                self.write_expr(index);
                self.output.push(']');
            }
            CsExpr::Call { callee, type_args, args } => {
                self.write_primary(callee);
                if !type_args.is_empty() {
                    self.output.push('<');
                    self.write_comma_types(type_args);
                    self.output.push('>');
                }
                self.write_args(args);
            }
            CsExpr::New { ty, args, initializer } => {
                self.output.push_str("new ");
                self.output.push_str(&ty.to_string());
                if !args.is_empty() || initializer.is_none() {
                    self.write_args(args);
                }
                if let Some(entries) = initializer {
                    self.write_initializer(entries);
                }
            }
            CsExpr::NewArray { elem, size, items } => {
                self.output.push_str("new ");
                self.output.push_str(&elem.to_string());
                match size {
                    Some(size) => {
                        self.output.push('[');
                        self.write_expr(size);
                        self.output.push(']');
                    }
                    None => {
                        self.output.push_str("[] { ");
                        self.write_comma_exprs(items);
                        self.output.push_str(if items.is_empty() { "}" } else { " }" });
                    }
                }
            }
            CsExpr::Collection { ty, items } => {
                self.output.push('(');
                self.output.push_str(&ty.to_string());
                self.output.push_str(")[");
                self.write_comma_exprs(items);
                self.output.push(']');
            }
            CsExpr::Spread(inner) => {
                self.output.push_str("..");
                self.write_primary(inner);
            }
            CsExpr::Unary { op, operand, postfix } => {
                if *postfix {
                    self.write_primary(operand);
                    self.output.push_str(op);
                } else {
                    self.output.push_str(op);
                    self.write_primary(operand);
                }
            }
            CsExpr::Binary { op, left, right } => {
                self.output.push('(');
                self.write_expr(left);
                self.output.push(' ');
                self.output.push_str(op);
                self.output.push(' ');
                self.write_expr(right);
                self.output.push(')');
            }
            CsExpr::Assign { op, target, value } => {
                self.write_expr(target);
                self.output.push(' ');
                self.output.push_str(op);
                self.output.push(' ');
                self.write_expr(value);
            }
            CsExpr::Conditional { test, then, otherwise } => {
                self.output.push('(');
                self.write_expr(test);
                self.output.push_str(" ? ");
                self.write_expr(then);
                self.output.push_str(" : ");
                self.write_expr(otherwise);
                self.output.push(')');
            }
            CsExpr::Lambda { is_async, params, body } => {
                if *is_async {
                    self.output.push_str("async ");
                }
                self.write_params(params);
                self.output.push_str(" =>");
                match body {
                    CsLambdaBody::Expr(e) => {
                        self.output.push(' ');
                        self.write_expr(e);
                    }
                    CsLambdaBody::Block(stmts) => {
                        self.output.push('\n');
                        self.write_block(stmts);
                        // The enclosing statement supplies the terminator.
                        self.write_indent_trim();
                    }
                }
            }
            CsExpr::Cast { ty, expr } => {
                self.output.push_str("((");
                self.output.push_str(&ty.to_string());
                self.output.push(')');
                self.write_primary(expr);
                self.output.push(')');
            }
            CsExpr::Is { expr, ty } => {
                self.output.push('(');
                self.write_primary(expr);
                self.output.push_str(" is ");
                self.output.push_str(&ty.to_string());
                self.output.push(')');
            }
            CsExpr::Await(inner) => {
                self.output.push_str("await ");
                self.write_primary(inner);
            }
            CsExpr::Interpolated(parts) => {
                self.output.push_str("$\"");
                for part in parts {
                    match part {
                        CsInterpolation::Text(text) => {
                            let escaped = escape_text(text).replace('{', "{{").replace('}', "}}");
                            self.output.push_str(&escaped);
                        }
                        CsInterpolation::Expr(e) => {
                            self.output.push('{');
                            self.write_primary(e);
                            self.output.push('}');
                        }
                    }
                }
                self.output.push('"');
            }
            CsExpr::Tuple(items) => {
                self.output.push('(');
                self.write_comma_exprs(items);
                self.output.push(')');
            }
            CsExpr::NullForgiving(inner) => {
                self.write_primary(inner);
                self.output.push('!');
            }
            CsExpr::Default(ty) => {
                self.output.push_str("default");
                if let Some(ty) = ty {
                    self.output.push('(');
                    self.output.push_str(&ty.to_string());
                    self.output.push(')');
                }
            }
            CsExpr::Throw(inner) => {
                self.output.push_str("throw ");
                self.write_expr(inner);
            }
        }
    }

    fn write_initializer(&mut self, entries: &[CsInit]) {
        if entries.is_empty() {
            self.output.push_str(" { }");
            return;
        }
        self.output.push_str(" { ");
        for (i, entry) in entries.iter().enumerate() {
            if i > 0 {
                self.output.push_str(", ");
            }
            match entry {
                CsInit::Named(name, value) => {
                    self.output.push_str(name);
                    self.output.push_str(" = ");
                    self.write_expr(value);
                }
                CsInit::Keyed(key, value) => {
                    self.output.push('[');
                    self.write_expr(key);
                    self.output.push_str("] = ");
                    self.write_expr(value);
                }
                CsInit::Item(value) => self.write_expr(value),
            }
        }
        self.output.push_str(" }");
    }

    /// After a block-bodied lambda the closing brace line ends with a
    /// newline; drop it so the enclosing expression continues on that line.
    fn write_indent_trim(&mut self) {
        if self.output.ends_with('\n') {
            self.output.pop();
        }
    }
}

fn is_primary(expr: &CsExpr) -> bool {
    matches!(
        expr,
        CsExpr::Literal(_)
            | CsExpr::Ident(_)
            | CsExpr::Type(_)
            | CsExpr::This
            | CsExpr::Base
            | CsExpr::Member { .. }
            | CsExpr::Index { .. }
            | CsExpr::Call { .. }
            | CsExpr::New { .. }
            | CsExpr::Interpolated(_)
            | CsExpr::Tuple(_)
            | CsExpr::NullForgiving(_)
            | CsExpr::Default(_)
            | CsExpr::Binary { .. }
            | CsExpr::Conditional { .. }
            | CsExpr::Cast { .. }
            | CsExpr::Is { .. }
    )
}

fn needs_blank_line(prev: &CsMember, next: &CsMember) -> bool {
    let simple = |m: &CsMember| match m {
        CsMember::Field(_) => true,
        CsMember::Property(p) => {
            p.getter.as_ref().is_none_or(|g| matches!(g, CsAccessor::Auto))
                && p.setter.as_ref().is_none_or(|s| matches!(s, CsAccessor::Auto))
        }
        CsMember::Method(m) => m.body.is_none(),
        _ => false,
    };
    !(simple(prev) && simple(next))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_is_parenthesized() {
        let e = CsExpr::binary(
            CsExpr::ident("a"),
            "+",
            CsExpr::binary(CsExpr::ident("b"), "*", CsExpr::ident("c")),
        );
        assert_eq!(CsWriter::expression(&e), "(a + (b * c))");
    }

    #[test]
    fn test_interpolation_escapes_braces() {
        let e = CsExpr::Interpolated(vec![
            CsInterpolation::Text("{x} = ".to_string()),
            CsInterpolation::Expr(CsExpr::ident("x")),
        ]);
        assert_eq!(CsWriter::expression(&e), "$\"{{x}} = {x}\"");
    }

    #[test]
    fn test_else_if_chain_stays_flat() {
        let stmt = CsStmt::If {
            test: CsExpr::ident("a"),
            then: vec![CsStmt::Return(None)],
            otherwise: Some(vec![CsStmt::If {
                test: CsExpr::ident("b"),
                then: vec![CsStmt::Break],
                otherwise: None,
            }]),
        };
        let text = CsWriter::statement(&stmt);
        assert_eq!(
            text.trim(),
            "if (a)\n{\n    return;\n}\nelse if (b)\n{\n    break;\n}"
        );
    }

    #[test]
    fn test_auto_property_with_init_accessor() {
        let mut prop = CsProperty::auto(vec!["public"], CsType::Keyword("string"), "Name");
        prop.init_only = true;
        let class = CsTypeDecl::Class(CsClass {
            members: vec![CsMember::Property(prop)],
            ..CsClass::new(vec!["public", "sealed"], "Shape_1")
        });
        let text = CsWriter::type_decl(&class);
        assert!(text.contains("public string Name { get; init; }"), "{}", text);
    }

    #[test]
    fn test_cast_wraps_operand() {
        let e = CsExpr::cast(CsType::Keyword("int"), CsExpr::binary(CsExpr::ident("a"), "/", CsExpr::ident("b")));
        assert_eq!(CsWriter::expression(&e), "((int)(a / b))");
    }
}
