//! Textual preprocessing ahead of the parser: `#include` splicing and
//! `#define` constant substitution. Nothing in here survives into the
//! compiled output; defined names feed the generator's constant folding
//! as ordinary literals.

use std::fs;
use std::path::Path;

use errors::CompileError;
use regex::Regex;

/// Expands directives in `source`, resolving `#include` paths relative
/// to `base_dir`. Includes are spliced recursively and carry no cycle
/// detection; a self-including file will recurse until the file system
/// or stack gives out, exactly as a textual substitution pass implies.
pub fn preprocess(source: &str, base_dir: &Path) -> Result<String, CompileError> {
    let mut text = String::new();
    let mut defines: Vec<(String, String)> = vec![];

    expand(source, base_dir, &mut text, &mut defines)?;

    for (name, replacement) in &defines {
        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(name)))
            .expect("escaped identifier is a valid pattern");
        text = pattern.replace_all(&text, replacement.as_str()).into_owned();
    }

    Ok(text)
}

fn expand(
    source: &str,
    base_dir: &Path,
    out: &mut String,
    defines: &mut Vec<(String, String)>,
) -> Result<(), CompileError> {
    for line in source.lines() {
        let trimmed = line.trim_start();
        if let Some(rest) = strip_directive(trimmed, "#include") {
            let path = base_dir.join(parse_include_path(rest)?);
            let included = fs::read_to_string(&path)
                .map_err(|e| CompileError::Io(format!("cannot read include {:?}: {}", path, e)))?;
            let included_dir = path.parent().unwrap_or(base_dir).to_path_buf();
            expand(&included, &included_dir, out, defines)?;
        } else if let Some(rest) = strip_directive(trimmed, "#define") {
            let (name, replacement) = parse_define(rest)?;
            match defines.iter_mut().find(|d| d.0 == name) {
                // A redefinition replaces the binding in place.
                Some(existing) => existing.1 = replacement,
                None => defines.push((name, replacement)),
            }
        } else if trimmed.starts_with('#') {
            return Err(CompileError::Syntax(format!(
                "unknown preprocessor directive: {}",
                trimmed
            )));
        } else {
            out.push_str(line);
            out.push('\n');
        }
    }
    Ok(())
}

fn strip_directive<'a>(line: &'a str, directive: &str) -> Option<&'a str> {
    if line.starts_with(directive) {
        Some(line[directive.len()..].trim())
    } else {
        None
    }
}

fn parse_include_path(rest: &str) -> Result<&str, CompileError> {
    let inner = rest
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .ok_or_else(|| {
            CompileError::Syntax(format!("#include expects a quoted path, got: {}", rest))
        })?;
    if inner.is_empty() {
        return Err(CompileError::Syntax("#include path is empty".to_string()));
    }
    Ok(inner)
}

fn parse_define(rest: &str) -> Result<(String, String), CompileError> {
    let mut parts = rest.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("");
    if name.is_empty() || !is_identifier(name) {
        return Err(CompileError::Syntax(format!(
            "#define expects an identifier, got: {}",
            rest
        )));
    }
    let replacement = parts.next().unwrap_or("").trim();
    if replacement.is_empty() {
        return Err(CompileError::Syntax(format!(
            "#define {} has no replacement text",
            name
        )));
    }
    Ok((name.to_string(), replacement.to_string()))
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[test]
fn define_substitution_test() {
    let out = preprocess("#define WIDTH 12\nsize_t w = WIDTH;\n", Path::new(".")).unwrap();
    assert_eq!(out, "size_t w = 12;\n");
}

#[test]
fn define_is_word_bounded_test() {
    let out = preprocess("#define W 9\nsize_t WX = W;\n", Path::new(".")).unwrap();
    assert_eq!(out, "size_t WX = 9;\n");
}

#[test]
fn define_redefinition_test() {
    let src = "#define N 1\n#define N 2\nsize_t x = N;\n";
    let out = preprocess(src, Path::new(".")).unwrap();
    assert_eq!(out, "size_t x = 2;\n");
}

#[test]
fn unknown_directive_test() {
    let err = preprocess("#pragma once\n", Path::new(".")).unwrap_err();
    assert!(matches!(err, CompileError::Syntax(_)));
}
