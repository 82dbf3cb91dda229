//! Text printers for node trees.
//!
//! Markup prints with two-space indentation:
//!
//! ```text
//! <path>
//!   <groupId>org.projectlombok</groupId>
//!   <artifactId>lombok</artifactId>
//! </path>
//! ```
//!
//! Warning markers print on their own line directly before the node they
//! are attached to, as `<!--~~(message)~~>-->` in markup and
//! `# ~~(message)~~>` in properties. Output carries no trailing newline.

use std::borrow::Cow;
use std::fmt;
use std::fmt::Write;

use crate::document::{Document, DocumentKind};
use crate::node::{Node, NodeKind};

// ============================================================================
// Public API
// ============================================================================

/// Print a node (and its subtree) as markup.
pub fn print_markup(node: &Node) -> String {
    let mut out = String::new();
    write_markup(&mut out, node, 0).expect("fmt::Write to String never fails");
    trim_trailing_newline(out)
}

/// Print a `properties` root as `key=value` lines.
pub fn print_properties(root: &Node) -> String {
    let mut out = String::new();
    write_properties(&mut out, root).expect("fmt::Write to String never fails");
    trim_trailing_newline(out)
}

/// Print a document in the format its kind implies.
pub fn print_document(document: &Document) -> String {
    match document.kind() {
        DocumentKind::Properties => print_properties(document.root()),
        DocumentKind::Markup | DocumentKind::Yaml | DocumentKind::Source => {
            print_markup(document.root())
        }
    }
}

fn trim_trailing_newline(mut out: String) -> String {
    let len = out.trim_end_matches('\n').len();
    out.truncate(len);
    out
}

// ============================================================================
// Markup
// ============================================================================

fn indent(f: &mut impl Write, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        f.write_str("  ")?;
    }
    Ok(())
}

/// Comments may not contain `--`, so split every run of dashes apart.
fn comment_safe(text: &str) -> Cow<'_, str> {
    if !text.contains("--") {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 4);
    for c in text.chars() {
        if c == '-' && out.ends_with('-') {
            out.push(' ');
        }
        out.push(c);
    }
    Cow::Owned(out)
}

fn write_markup(f: &mut impl Write, node: &Node, depth: usize) -> fmt::Result {
    for warning in node.warnings() {
        indent(f, depth)?;
        writeln!(f, "<!--~~({})~~>-->", comment_safe(warning))?;
    }
    indent(f, depth)?;
    match node.kind() {
        NodeKind::Element(element) => {
            write!(f, "<{}", element.name())?;
            for (key, value) in element.attributes() {
                write!(f, " {key}=\"")?;
                write_escaped(f, value, true)?;
                f.write_char('"')?;
            }
            match element.children() {
                [] => writeln!(f, "/>"),
                [only] if only.as_text().is_some() && only.markers().is_empty() => {
                    f.write_char('>')?;
                    write_escaped(f, only.as_text().unwrap_or_default(), false)?;
                    writeln!(f, "</{}>", element.name())
                }
                children => {
                    writeln!(f, ">")?;
                    for child in children {
                        write_markup(f, child, depth + 1)?;
                    }
                    indent(f, depth)?;
                    writeln!(f, "</{}>", element.name())
                }
            }
        }
        NodeKind::Text(text) => {
            write_escaped(f, text, false)?;
            writeln!(f)
        }
        NodeKind::Comment(text) => writeln!(f, "<!-- {text} -->"),
        NodeKind::Entry(entry) => writeln!(f, "{}={}", entry.key(), entry.value()),
    }
}

fn write_escaped(f: &mut impl Write, text: &str, in_attribute: bool) -> fmt::Result {
    for c in text.chars() {
        match c {
            '<' => f.write_str("&lt;")?,
            '>' => f.write_str("&gt;")?,
            '&' => f.write_str("&amp;")?,
            '"' if in_attribute => f.write_str("&quot;")?,
            c => f.write_char(c)?,
        }
    }
    Ok(())
}

// ============================================================================
// Properties
// ============================================================================

fn write_properties(f: &mut impl Write, root: &Node) -> fmt::Result {
    for warning in root.warnings() {
        writeln!(f, "# ~~({warning})~~>")?;
    }
    for child in root.children() {
        for warning in child.warnings() {
            writeln!(f, "# ~~({warning})~~>")?;
        }
        match child.kind() {
            NodeKind::Entry(entry) => writeln!(f, "{}={}", entry.key(), entry.value())?,
            NodeKind::Comment(text) => writeln!(f, "# {text}")?,
            NodeKind::Text(text) => writeln!(f, "{text}")?,
            NodeKind::Element(_) => write_markup(f, child, 0)?,
        }
    }
    Ok(())
}
