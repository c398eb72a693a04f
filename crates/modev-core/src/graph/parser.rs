//! Parser for marimo-style notebook files.
//!
//! A notebook is a Python module declaring `app = marimo.App(...)` whose
//! cells are functions decorated with `@app.cell`. Parameters name the
//! values a cell reads; the returned tuple names the values it defines.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::types::{Cell, CellId, Language};
use crate::error::{Error, Result};

static APP_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^app\s*=\s*(?:marimo|mo)\.App\(").expect("app declaration pattern")
});

static SQL_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*\s*=\s*mo\.sql\(").expect("sql cell pattern")
});

/// What a top-level decorator turns the following definition into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decorated {
    /// `@app.cell`: the function body is the cell.
    Cell,
    /// `@app.function` / `@app.class_definition`: the whole definition is the cell.
    Definition,
}

/// Function or class header spanning one or more lines.
#[derive(Debug)]
struct Signature {
    name: String,
    params: Vec<String>,
}

/// Parser for extracting cells from notebook files.
#[derive(Debug, Default, Clone, Copy)]
pub struct AppParser;

impl AppParser {
    /// Create a new parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a notebook file and extract its cells in definition order.
    pub fn parse_file(&self, path: &Path) -> Result<Vec<Cell>> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| Error::Parse(format!("Failed to read file {}: {}", path.display(), e)))?;

        self.parse_str(&source, path)
    }

    /// Parse notebook source and extract its cells in definition order.
    pub fn parse_str(&self, source: &str, path: &Path) -> Result<Vec<Cell>> {
        if !APP_DECLARATION.is_match(source) {
            return Err(Error::MissingApp(path.to_path_buf()));
        }

        let lines: Vec<&str> = source.lines().collect();
        let mut cells = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let Some(kind) = Self::decorator_kind(lines[i]) else {
                i += 1;
                continue;
            };

            // Stacked decorators and blank lines may sit between the
            // decorator and the definition
            let after_decorator = Self::decorator_end(&lines, i);
            let mut def_line = after_decorator;
            while def_line < lines.len() {
                if lines[def_line].trim().is_empty() {
                    def_line += 1;
                } else if lines[def_line].starts_with('@') {
                    def_line = Self::decorator_end(&lines, def_line);
                } else {
                    break;
                }
            }
            if def_line >= lines.len() {
                return Err(Error::Parse(format!(
                    "{}:{}: decorator is not followed by a definition",
                    path.display(),
                    i + 1
                )));
            }

            let (signature, body_start) = Self::read_signature(&lines, def_line, path)?;
            let end = Self::find_block_end(&lines, body_start);
            let id = CellId::from_index(cells.len());

            let cell = match kind {
                Decorated::Cell => Self::build_cell(id, signature, &lines[body_start..end]),
                Decorated::Definition => {
                    Self::build_definition(id, signature, &lines[after_decorator..end])
                }
            };
            tracing::debug!(cell = %cell.id, name = %cell.name, "parsed cell");
            cells.push(cell);

            i = end;
        }

        Ok(cells)
    }

    /// Classify a top-level line as one of the app decorators.
    fn decorator_kind(line: &str) -> Option<Decorated> {
        let line = line.trim_end();
        let matches = |decorator: &str| {
            line.strip_prefix(decorator)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('('))
        };

        if matches("@app.cell") {
            Some(Decorated::Cell)
        } else if matches("@app.function") || matches("@app.class_definition") {
            Some(Decorated::Definition)
        } else {
            None
        }
    }

    /// Net count of opening over closing brackets on a line.
    fn bracket_balance(line: &str) -> i32 {
        line.chars()
            .map(|ch| match ch {
                '(' | '[' | '{' => 1,
                ')' | ']' | '}' => -1,
                _ => 0,
            })
            .sum()
    }

    /// First line after the decorator at `start`, past any argument lines.
    fn decorator_end(lines: &[&str], start: usize) -> usize {
        let mut depth = 0;
        for (offset, line) in lines[start..].iter().enumerate() {
            depth += Self::bracket_balance(line);
            if depth <= 0 {
                return start + offset + 1;
            }
        }
        lines.len()
    }

    /// Read a `def`/`class` header, returning it and the first body line.
    fn read_signature(lines: &[&str], start: usize, path: &Path) -> Result<(Signature, usize)> {
        let first = lines[start].trim_start();
        let header = first
            .strip_prefix("async def ")
            .or_else(|| first.strip_prefix("def "))
            .map(|rest| (rest, true))
            .or_else(|| first.strip_prefix("class ").map(|rest| (rest, false)));

        let Some((_, is_function)) = header else {
            return Err(Error::Parse(format!(
                "{}:{}: expected a function or class definition",
                path.display(),
                start + 1
            )));
        };

        let mut text = String::new();
        let mut depth: i32 = 0;
        for (offset, line) in lines[start..].iter().enumerate() {
            depth += Self::bracket_balance(line);
            text.push_str(line.trim());
            text.push(' ');

            if depth <= 0 && line.trim_end().ends_with(':') {
                let signature = Self::parse_signature(&text, is_function);
                return Ok((signature, start + offset + 1));
            }
        }

        Err(Error::Parse(format!(
            "{}:{}: unterminated definition header",
            path.display(),
            start + 1
        )))
    }

    /// Split a collapsed header into the definition name and parameter names.
    fn parse_signature(text: &str, is_function: bool) -> Signature {
        let rest = text
            .trim_start()
            .trim_start_matches("async ")
            .trim_start_matches("def ")
            .trim_start_matches("class ");

        let name_end = rest
            .find(|c: char| c == '(' || c == ':' || c.is_whitespace())
            .unwrap_or(rest.len());
        let name = rest[..name_end].to_string();

        // Class bases are not cell references
        if !is_function {
            return Signature {
                name,
                params: Vec::new(),
            };
        }

        let params = rest[name_end..]
            .find('(')
            .map(|open| Self::parameter_names(&rest[name_end + open + 1..]))
            .unwrap_or_default();

        Signature { name, params }
    }

    /// Extract parameter names from the text following a `(`.
    fn parameter_names(text: &str) -> Vec<String> {
        let mut params = Vec::new();
        let mut current = String::new();
        let mut depth = 0;

        for ch in text.chars() {
            match ch {
                '(' | '[' | '{' => {
                    depth += 1;
                    current.push(ch);
                }
                ')' | ']' | '}' if depth == 0 => break,
                ')' | ']' | '}' => {
                    depth -= 1;
                    current.push(ch);
                }
                ',' if depth == 0 => params.push(std::mem::take(&mut current)),
                _ => current.push(ch),
            }
        }
        params.push(current);

        params
            .iter()
            .filter_map(|param| {
                let name = param
                    .split([':', '='])
                    .next()
                    .unwrap_or("")
                    .trim()
                    .trim_start_matches('*');
                (!name.is_empty() && name != "/").then(|| name.to_string())
            })
            .collect()
    }

    /// Find the first line after an indented block.
    ///
    /// The block ends at the next non-blank line in column zero that is
    /// not inside a triple-quoted string.
    fn find_block_end(lines: &[&str], start: usize) -> usize {
        let mut in_string: Option<&str> = None;

        for (offset, line) in lines[start..].iter().enumerate() {
            let at_column_zero = !line.trim().is_empty() && !line.starts_with([' ', '\t']);
            if in_string.is_none() && at_column_zero {
                return start + offset;
            }

            for quote in ["\"\"\"", "'''"] {
                let count = line.matches(quote).count();
                if count % 2 == 1 {
                    in_string = match in_string {
                        Some(open) if open == quote => None,
                        None => Some(quote),
                        other => other,
                    };
                }
            }
        }

        lines.len()
    }

    /// Remove the block indentation from every line.
    ///
    /// The first statement sets the indentation; lines indented less (such
    /// as the inside of a triple-quoted string) lose only what they have.
    fn dedent(lines: &[&str]) -> Vec<String> {
        let leading = |line: &str| line.len() - line.trim_start_matches([' ', '\t']).len();
        let indent = lines
            .iter()
            .find(|line| !line.trim().is_empty())
            .map(|line| leading(*line))
            .unwrap_or(0);

        lines
            .iter()
            .map(|line| {
                if line.trim().is_empty() {
                    String::new()
                } else {
                    line[indent.min(leading(*line))..].trim_end().to_string()
                }
            })
            .collect()
    }

    /// Join lines, dropping leading blank lines and trailing whitespace.
    fn join_code(lines: &[String]) -> String {
        let first = lines
            .iter()
            .position(|line| !line.is_empty())
            .unwrap_or(lines.len());
        lines[first..].join("\n").trim_end().to_string()
    }

    /// Build a cell from an `@app.cell` function body.
    fn build_cell(id: CellId, signature: Signature, body: &[&str]) -> Cell {
        let body = Self::dedent(body);

        let return_line = body.iter().rposition(|line| {
            line == "return" || line.starts_with("return ") || line.starts_with("return(")
        });

        let (code, defs) = match return_line {
            Some(r) => (
                Self::join_code(&body[..r]),
                Self::returned_names(&body[r..].join(" ")),
            ),
            None => (Self::join_code(&body), Some(BTreeSet::new())),
        };

        let language = Self::detect_language(&code);

        Cell {
            id,
            name: signature.name,
            code,
            language,
            defs,
            refs: signature.params,
        }
    }

    /// Build a cell from an `@app.function` or `@app.class_definition` item.
    fn build_definition(id: CellId, signature: Signature, lines: &[&str]) -> Cell {
        let code = Self::join_code(&Self::dedent(lines));
        let defs = BTreeSet::from([signature.name.clone()]);

        Cell {
            id,
            name: signature.name,
            code,
            language: Language::Python,
            defs: Some(defs),
            refs: Vec::new(),
        }
    }

    /// Names in a `return (a, b)` statement.
    ///
    /// Returns `None` when the statement returns anything but plain names.
    fn returned_names(statement: &str) -> Option<BTreeSet<String>> {
        let expr = statement.trim().trim_start_matches("return");
        let expr: String = expr.chars().filter(|c| *c != '(' && *c != ')').collect();

        let mut names = BTreeSet::new();
        for part in expr.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            if !Self::is_identifier(part) {
                return None;
            }
            names.insert(part.to_string());
        }
        Some(names)
    }

    fn is_identifier(text: &str) -> bool {
        let mut chars = text.chars();
        chars
            .next()
            .is_some_and(|c| c == '_' || c.is_alphabetic())
            && chars.all(|c| c == '_' || c.is_alphanumeric())
    }

    /// SQL cells are a single `name = mo.sql(...)` assignment.
    ///
    /// Leading comments are ignored. Any code after the closing parenthesis
    /// makes the cell Python.
    fn detect_language(code: &str) -> Language {
        let mut offset = 0;
        for line in code.split_inclusive('\n') {
            let trimmed = line.trim();
            if !trimmed.is_empty() && !trimmed.starts_with('#') {
                break;
            }
            offset += line.len();
        }
        let body = code[offset..].trim_start();

        let Some(assignment) = SQL_ASSIGNMENT.find(body) else {
            return Language::Python;
        };
        let args = &body[assignment.end()..];

        match Self::call_end(args) {
            Some(end) if Self::only_comments(&args[end..]) => Language::Sql,
            _ => Language::Python,
        }
    }

    /// Byte offset just past the parenthesis closing a call whose arguments
    /// start at `text`. String literals and comments are skipped.
    fn call_end(text: &str) -> Option<usize> {
        let bytes = text.as_bytes();
        let mut depth = 1;
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                quote @ (b'"' | b'\'') => {
                    let delimiter = [quote; 3];
                    let width = if bytes[i..].starts_with(&delimiter) { 3 } else { 1 };
                    i += width;
                    loop {
                        if i >= bytes.len() || (width == 1 && bytes[i] == b'\n') {
                            return None;
                        }
                        if bytes[i] == b'\\' {
                            i += 2;
                        } else if bytes[i..].starts_with(&delimiter[..width]) {
                            i += width;
                            break;
                        } else {
                            i += 1;
                        }
                    }
                    continue;
                }
                b'#' => {
                    while i < bytes.len() && bytes[i] != b'\n' {
                        i += 1;
                    }
                    continue;
                }
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i + 1);
                    }
                }
                _ => {}
            }
            i += 1;
        }

        None
    }

    fn only_comments(text: &str) -> bool {
        text.lines().map(str::trim).all(|line| line.is_empty() || line.starts_with('#'))
    }
}
