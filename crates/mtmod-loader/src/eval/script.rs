// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Interpreter for a small CommonJS subset
//!
//! Supported statements, separated by newlines or `;`:
//! - `var|let|const name = expr`
//! - `target = expr` / `target += expr` where target is a local, a member
//!   chain, `exports.x`, `module.exports.x` or `module.exports`
//! - `console.log(expr, ...)`
//! - `throw expr`
//! - any expression, e.g. a bare `require("./setup")`
//!
//! Expressions: string and number literals, `true`/`false`/`null`/`undefined`,
//! `{ key: expr }` objects, member chains, `require(...)`,
//! `require.resolve(...)`, `module.id` and `+`.

use crate::error::EvalError;
use crate::eval::{Bindings, Evaluator};
use crate::module_system::ModuleState;
use crate::value::{Object, Value};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:var|let|const)\s+([A-Za-z_$][\w$]*)(?:\s*=\s*(.+))?$").expect("declaration pattern")
});

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_$][\w$]*(?:\s*\.\s*[A-Za-z_$][\w$]*)*)\s*(\+=|=)\s*([^=].*)$")
        .expect("assignment pattern")
});

static THROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^throw\s+(.+)$").expect("throw pattern"));

static CONSOLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^console\.(?:log|info|warn|error|debug)\((.*)\)$").expect("console pattern")
});

type ConsoleSink = dyn Fn(&str) + Send + Sync;

/// Evaluates module source written in the supported CommonJS subset
pub struct ScriptEvaluator {
    console: Box<ConsoleSink>,
}

impl ScriptEvaluator {
    /// Create an evaluator whose `console.*` output goes to stdout
    pub fn new() -> Self {
        Self::with_console(|line| println!("{}", line))
    }

    /// Create an evaluator with a custom `console.*` sink
    pub fn with_console(sink: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self {
            console: Box::new(sink),
        }
    }
}

impl Default for ScriptEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator for ScriptEvaluator {
    fn evaluate(&self, source: &str, bindings: Bindings<'_>) -> Result<(), EvalError> {
        let mut interp = Interpreter {
            bindings: &bindings,
            locals: HashMap::new(),
            console: self.console.as_ref(),
        };

        for (index, line) in source.lines().enumerate() {
            let line_no = index + 1;
            for statement in split_statements(line) {
                let statement = statement.trim();
                if statement.is_empty() {
                    continue;
                }
                interp.execute(statement, line_no)?;
            }
        }

        Ok(())
    }
}

struct Interpreter<'b, 'a> {
    bindings: &'b Bindings<'a>,
    locals: HashMap<String, Value>,
    console: &'b ConsoleSink,
}

impl Interpreter<'_, '_> {
    fn execute(&mut self, statement: &str, line: usize) -> Result<(), EvalError> {
        if let Some(caps) = DECLARATION.captures(statement) {
            let value = match caps.get(2) {
                Some(expr) => self.eval_source(expr.as_str(), line)?,
                None => Value::Undefined,
            };
            self.locals.insert(caps[1].to_string(), value);
            return Ok(());
        }

        if let Some(caps) = CONSOLE.captures(statement) {
            let args = Parser::new(&caps[1], line).parse_args_to_end()?;
            let rendered = args
                .iter()
                .map(|arg| self.eval(arg).map(|v| v.to_string()))
                .collect::<Result<Vec<_>, _>>()?;
            (self.console)(&rendered.join(" "));
            return Ok(());
        }

        if let Some(caps) = THROW.captures(statement) {
            let value = self.eval_source(&caps[1], line)?;
            return Err(EvalError::Thrown(value.to_string()));
        }

        if let Some(caps) = ASSIGNMENT.captures(statement) {
            let target: Vec<String> = caps[1].split('.').map(|s| s.trim().to_string()).collect();
            let value = self.eval_source(&caps[3], line)?;
            return self.assign(&target, &caps[2] == "+=", value);
        }

        self.eval_source(statement, line).map(|_| ())
    }

    fn eval_source(&mut self, source: &str, line: usize) -> Result<Value, EvalError> {
        let expr = Parser::new(source, line).parse_to_end()?;
        self.eval(&expr)
    }

    fn assign(&mut self, target: &[String], append: bool, value: Value) -> Result<(), EvalError> {
        match target {
            [root] if matches!(root.as_str(), "exports" | "module" | "require") => Err(
                EvalError::type_error(format!("Assignment to '{}' is not supported", root)),
            ),
            [root] => {
                let current = self
                    .locals
                    .get(root)
                    .cloned()
                    .ok_or_else(|| EvalError::reference_error(format!("{} is not defined", root)))?;
                let value = if append { add(&current, &value)? } else { value };
                self.locals.insert(root.clone(), value);
                Ok(())
            }
            [module, exports] if module == "module" && exports == "exports" => {
                if append {
                    return Err(EvalError::type_error("Cannot append to module.exports"));
                }
                self.bindings.module.set_exports(&value)
            }
            [path @ .., key] => {
                let holder = self.lookup_path(path)?;
                let obj = holder.as_object().ok_or_else(|| {
                    EvalError::type_error(format!(
                        "Cannot set properties of {} (setting '{}')",
                        holder.type_of(),
                        key
                    ))
                })?;
                let value = if append {
                    add(&obj.get(key).unwrap_or_default(), &value)?
                } else {
                    value
                };
                obj.set(key.clone(), value);
                Ok(())
            }
            [] => Err(EvalError::type_error("empty assignment target")),
        }
    }

    fn lookup_path(&self, path: &[String]) -> Result<Value, EvalError> {
        let (root, rest) = path
            .split_first()
            .ok_or_else(|| EvalError::type_error("empty member path"))?;
        let mut value = self.lookup(root)?;
        for key in rest {
            value = self.member(&value, key)?;
        }
        Ok(value)
    }

    fn lookup(&self, name: &str) -> Result<Value, EvalError> {
        match name {
            "exports" => Ok(Value::Object(self.bindings.exports.clone())),
            "module" => Ok(Value::Object(self.module_object())),
            "require" => Err(EvalError::type_error("require can only be called")),
            _ => self
                .locals
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::reference_error(format!("{} is not defined", name))),
        }
    }

    /// Snapshot view of `module`; `exports` is the live object
    fn module_object(&self) -> Object {
        let record = self.bindings.module;
        let obj = Object::new();
        obj.set("id", record.location());
        obj.set("name", record.locator().name());
        obj.set("exports", record.exports());
        obj.set("loaded", record.state() == ModuleState::Loaded);
        obj.set(
            "parent",
            record.parent().map(Value::from).unwrap_or(Value::Null),
        );
        obj
    }

    fn member(&self, value: &Value, key: &str) -> Result<Value, EvalError> {
        match value {
            Value::Object(obj) => Ok(obj.get(key).unwrap_or_default()),
            Value::String(s) if key == "length" => Ok(Value::Number(s.chars().count() as f64)),
            Value::Undefined | Value::Null => Err(EvalError::type_error(format!(
                "Cannot read properties of {} (reading '{}')",
                value, key
            ))),
            _ => Ok(Value::Undefined),
        }
    }

    fn eval(&self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Object(props) => {
                let obj = Object::new();
                for (key, value) in props {
                    obj.set(key.clone(), self.eval(value)?);
                }
                Ok(Value::Object(obj))
            }
            Expr::Ident(name) => self.lookup(name),
            Expr::Member(base, key) => {
                if let Expr::Ident(name) = base.as_ref() {
                    if name == "module" && key == "exports" {
                        return Ok(Value::Object(self.bindings.exports.clone()));
                    }
                }
                let base = self.eval(base)?;
                self.member(&base, key)
            }
            Expr::Add(lhs, rhs) => add(&self.eval(lhs)?, &self.eval(rhs)?),
            Expr::Call(callee, args) => self.call(callee, args),
        }
    }

    fn call(&self, callee: &Expr, args: &[Expr]) -> Result<Value, EvalError> {
        let name = callee
            .dotted_path()
            .ok_or_else(|| EvalError::type_error("expression is not a function"))?;
        let identifier = match args {
            [arg] => self.eval(arg)?,
            _ => {
                return Err(EvalError::type_error(format!(
                    "{} expects exactly one argument",
                    name
                )));
            }
        };
        let identifier = identifier.as_str().ok_or_else(|| {
            EvalError::type_error(format!("{} expects a string identifier", name))
        })?;

        match name.as_str() {
            "require" => Ok(Value::Object(self.bindings.require.call(identifier)?)),
            "require.resolve" => Ok(Value::String(self.bindings.require.resolve(identifier)?)),
            _ => Err(EvalError::type_error(format!("{} is not a function", name))),
        }
    }
}

fn add(lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    match (lhs, rhs) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (Value::String(_), _) | (_, Value::String(_)) => Ok(Value::String(format!("{}{}", lhs, rhs))),
        _ => Err(EvalError::type_error(format!(
            "Cannot add {} and {}",
            lhs.type_of(),
            rhs.type_of()
        ))),
    }
}

/// Split a line on `;` outside strings and brackets, dropping any `//` comment
fn split_statements(line: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;
    let mut end = line.len();

    for (i, c) in line.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '{' | '[' => depth += 1,
            ')' | '}' | ']' => depth = depth.saturating_sub(1),
            ';' if depth == 0 => {
                statements.push(&line[start..i]);
                start = i + 1;
            }
            '/' if line[i + 1..].starts_with('/') => {
                end = i;
                break;
            }
            _ => {}
        }
    }
    statements.push(&line[start..end]);
    statements
}

#[derive(Debug, Clone)]
enum Expr {
    Literal(Value),
    Object(Vec<(String, Expr)>),
    Ident(String),
    Member(Box<Expr>, String),
    Add(Box<Expr>, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
}

impl Expr {
    /// `a.b.c` for identifier/member chains
    fn dotted_path(&self) -> Option<String> {
        match self {
            Expr::Ident(name) => Some(name.clone()),
            Expr::Member(base, key) => base.dotted_path().map(|p| format!("{}.{}", p, key)),
            _ => None,
        }
    }
}

struct Parser<'s> {
    src: &'s str,
    pos: usize,
    line: usize,
}

impl<'s> Parser<'s> {
    fn new(src: &'s str, line: usize) -> Self {
        Self { src, pos: 0, line }
    }

    fn error(&self, message: impl Into<String>) -> EvalError {
        EvalError::Syntax {
            line: self.line,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), EvalError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}' in `{}`", expected, self.src)))
        }
    }

    fn finish(&mut self) -> Result<(), EvalError> {
        self.skip_ws();
        match self.peek() {
            None => Ok(()),
            Some(c) => Err(self.error(format!("unexpected '{}' in `{}`", c, self.src))),
        }
    }

    fn parse_to_end(mut self) -> Result<Expr, EvalError> {
        let expr = self.parse_expr()?;
        self.finish()?;
        Ok(expr)
    }

    fn parse_args_to_end(mut self) -> Result<Vec<Expr>, EvalError> {
        let mut args = Vec::new();
        self.skip_ws();
        if self.peek().is_none() {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            if !self.eat(',') {
                break;
            }
        }
        self.finish()?;
        Ok(args)
    }

    fn parse_expr(&mut self) -> Result<Expr, EvalError> {
        let mut lhs = self.parse_postfix()?;
        while self.eat('+') {
            let rhs = self.parse_postfix()?;
            lhs = Expr::Add(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_postfix(&mut self) -> Result<Expr, EvalError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat('.') {
                self.skip_ws();
                let key = self.parse_ident()?;
                expr = Expr::Member(Box::new(expr), key);
            } else if self.eat('(') {
                let mut args = Vec::new();
                if !self.eat(')') {
                    loop {
                        args.push(self.parse_expr()?);
                        if !self.eat(',') {
                            break;
                        }
                    }
                    self.expect(')')?;
                }
                expr = Expr::Call(Box::new(expr), args);
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, EvalError> {
        self.skip_ws();
        match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.bump();
                self.parse_string(q).map(|s| Expr::Literal(Value::String(s)))
            }
            Some(c) if c.is_ascii_digit() || c == '-' => self.parse_number(),
            Some('{') => {
                self.bump();
                self.parse_object()
            }
            Some('(') => {
                self.bump();
                let expr = self.parse_expr()?;
                self.expect(')')?;
                Ok(expr)
            }
            Some(c) if is_ident_start(c) => {
                let ident = self.parse_ident()?;
                Ok(match ident.as_str() {
                    "true" => Expr::Literal(Value::Boolean(true)),
                    "false" => Expr::Literal(Value::Boolean(false)),
                    "null" => Expr::Literal(Value::Null),
                    "undefined" => Expr::Literal(Value::Undefined),
                    _ => Expr::Ident(ident),
                })
            }
            Some(c) => Err(self.error(format!("unexpected '{}' in `{}`", c, self.src))),
            None => Err(self.error(format!("unexpected end of `{}`", self.src))),
        }
    }

    fn parse_ident(&mut self) -> Result<String, EvalError> {
        let start = self.pos;
        match self.peek() {
            Some(c) if is_ident_start(c) => {
                self.bump();
            }
            _ => return Err(self.error(format!("expected identifier in `{}`", self.src))),
        }
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$') {
            self.bump();
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn parse_string(&mut self, quote: char) -> Result<String, EvalError> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string literal")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some(c) => out.push(c),
                    None => return Err(self.error("unterminated string literal")),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn parse_number(&mut self) -> Result<Expr, EvalError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.bump();
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || c == '.' || c == '_')
        {
            self.bump();
        }
        let text = self.src[start..self.pos].replace('_', "");
        text.parse::<f64>()
            .map(|n| Expr::Literal(Value::Number(n)))
            .map_err(|_| self.error(format!("invalid number '{}'", text)))
    }

    fn parse_object(&mut self) -> Result<Expr, EvalError> {
        let mut props = Vec::new();
        loop {
            if self.eat('}') {
                return Ok(Expr::Object(props));
            }
            self.skip_ws();
            let key = match self.peek() {
                Some(q @ ('"' | '\'')) => {
                    self.bump();
                    self.parse_string(q)?
                }
                _ => self.parse_ident()?,
            };
            self.expect(':')?;
            let value = self.parse_expr()?;
            props.push((key, value));
            if !self.eat(',') {
                self.expect('}')?;
                return Ok(Expr::Object(props));
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MemoryFetcher;
    use crate::module_system::ModuleLoader;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn run(sources: &[(&str, &str)], entry: &str) -> (Result<Object, crate::LoadError>, Vec<String>) {
        let fetcher = sources
            .iter()
            .fold(MemoryFetcher::new(), |f, (loc, src)| f.with(*loc, *src));
        let output = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&output);
        let evaluator = ScriptEvaluator::with_console(move |line| sink.lock().push(line.to_string()));
        let loader = ModuleLoader::new(fetcher, evaluator);
        let result = loader.load_entry(entry);
        let lines = output.lock().clone();
        (result, lines)
    }

    #[test]
    fn test_split_statements() {
        assert_eq!(
            split_statements(r#"var a = "x;y"; exports.a = a;"#),
            vec![r#"var a = "x;y""#, " exports.a = a", ""]
        );
        assert_eq!(split_statements("exports.o = { a: 1; }"), vec!["exports.o = { a: 1; }"]);
        assert_eq!(split_statements("// a; b"), vec![""]);
        assert_eq!(split_statements("exports.ok = true // flag"), vec!["exports.ok = true "]);
        assert_eq!(
            split_statements(r#"exports.url = "http://x/y"; // note"#),
            vec![r#"exports.url = "http://x/y""#, " "]
        );
    }

    #[test]
    fn test_comments_are_ignored() {
        let (result, _) = run(
            &[(
                "main.js",
                "// load config; then init\nexports.ok = true // flag\nexports.url = 'http://host/a' // trailing; note",
            )],
            "main",
        );
        let exports = result.unwrap();
        assert_eq!(exports.get("ok"), Some(Value::Boolean(true)));
        assert_eq!(exports.get("url"), Some(Value::from("http://host/a")));
    }

    #[test]
    fn test_exports_and_locals() {
        let (result, _) = run(
            &[(
                "main.js",
                r#"
                "use strict";
                const greeting = "hello";
                var n = 40
                n += 2
                exports.greeting = greeting + " world";
                exports.answer = n;
                module.exports.nested = { inner: { ok: true }, "quoted key": null };
                "#,
            )],
            "main",
        );
        let exports = result.unwrap();
        assert_eq!(exports.get("greeting"), Some(Value::from("hello world")));
        assert_eq!(exports.get("answer"), Some(Value::Number(42.0)));
        let nested = exports.get("nested").unwrap();
        let nested = nested.as_object().unwrap();
        assert!(nested.has("quoted key"));
        assert_eq!(
            nested.get("inner").unwrap().as_object().unwrap().get("ok"),
            Some(Value::Boolean(true))
        );
    }

    #[test]
    fn test_module_exports_assignment_keeps_identity() {
        let (result, lines) = run(
            &[
                ("main.js", "const b = require('./b')\nconsole.log(b.kind, b.old)"),
                ("b.js", "exports.old = 1\nmodule.exports = { kind: 'replaced' }"),
            ],
            "main",
        );
        assert!(result.is_ok());
        assert_eq!(lines, vec!["replaced undefined"]);
    }

    #[test]
    fn test_module_metadata() {
        let (result, lines) = run(
            &[
                ("lib/main.js", "console.log(module.id, module.loaded, require.resolve('../x/y'))"),
            ],
            "lib/main",
        );
        assert!(result.is_ok());
        assert_eq!(lines, vec!["lib/main.js false x/y.js"]);
    }

    #[test]
    fn test_throw_and_reference_errors() {
        let (result, _) = run(&[("main.js", "throw 'nope'")], "main");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Uncaught nope"));

        let (result, _) = run(&[("main.js", "exports.x = missing")], "main");
        assert!(result.unwrap_err().to_string().contains("missing is not defined"));
    }

    #[test]
    fn test_syntax_error_reports_line() {
        let (result, _) = run(&[("main.js", "exports.a = 1\nexports.b = {\n")], "main");
        match result.unwrap_err() {
            crate::LoadError::Evaluation {
                source: EvalError::Syntax { line, .. },
                ..
            } => assert_eq!(line, 2),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_primitive_module_exports_is_type_error() {
        let (result, _) = run(&[("main.js", "module.exports = 'text'")], "main");
        assert!(matches!(
            result.unwrap_err(),
            crate::LoadError::Evaluation {
                source: EvalError::Type(_),
                ..
            }
        ));
    }

    #[test]
    fn test_nested_require_failure_propagates() {
        let (result, _) = run(&[("main.js", "require('./missing')")], "main");
        match result.unwrap_err() {
            crate::LoadError::Evaluation {
                source: EvalError::Require(inner),
                ..
            } => assert_eq!(inner.kind(), crate::ErrorKind::Fetch),
            other => panic!("unexpected error: {}", other),
        }
    }
}
