//! Minimal markup and properties readers.
//!
//! Real parsing of build files belongs to the caller; these readers exist so
//! rules and tests can state fragments and small documents as text:
//!
//! ```
//! let node = graft_tree::markup::parse_element(
//!     "<path><groupId>org.projectlombok</groupId><artifactId>lombok</artifactId></path>",
//! )
//! .unwrap();
//! assert_eq!(node.child_value("artifactId"), Some("lombok"));
//! ```
//!
//! Whitespace-only text between elements is dropped and other text is
//! trimmed, so pretty-printed input reads the same as compact input.

use crate::errors::{TreeError, TreeResult};
use crate::node::{Node, NodeVec};
use crate::symbol::Symbol;

/// Parse a single markup element (with optional prolog and surrounding comments).
pub fn parse_element(text: &str) -> TreeResult<Node> {
    let mut parser = Parser { src: text, pos: 0 };
    parser.skip_misc()?;
    let root = parser.element()?;
    parser.skip_misc()?;
    if !parser.rest().is_empty() {
        return Err(parser.error("unexpected content after root element"));
    }
    Ok(root)
}

/// Parse `key=value` / `key: value` lines into a `properties` root element.
///
/// Lines starting with `#` or `!` become comments; blank lines are skipped.
pub fn parse_properties(text: &str) -> TreeResult<Node> {
    let mut entries = NodeVec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('#').or_else(|| line.strip_prefix('!')) {
            entries.push(Node::comment(comment.trim())?);
            continue;
        }
        let Some(split) = line.find(['=', ':']) else {
            return Err(TreeError::malformed(format!(
                "line {}: expected `key=value`, found {line:?}",
                index + 1
            )));
        };
        let (key, value) = (&line[..split], &line[split + 1..]);
        entries.push(Node::entry(key.trim(), value.trim())?);
    }
    Node::element("properties").children(entries).build()
}

struct Parser<'s> {
    src: &'s str,
    pos: usize,
}

impl<'s> Parser<'s> {
    fn rest(&self) -> &'s str {
        &self.src[self.pos..]
    }

    fn error(&self, msg: &str) -> TreeError {
        TreeError::malformed(format!("{msg} at offset {}", self.pos))
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> TreeResult<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(&format!("expected `{token}`")))
        }
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Consume up to (and including) `end`, returning the text before it.
    fn until(&mut self, end: &str) -> TreeResult<&'s str> {
        let rest = self.rest();
        let Some(idx) = rest.find(end) else {
            return Err(self.error(&format!("unterminated construct, expected `{end}`")));
        };
        self.pos += idx + end.len();
        Ok(&rest[..idx])
    }

    /// Skip whitespace, prolog and comments outside the root element.
    fn skip_misc(&mut self) -> TreeResult<()> {
        loop {
            self.skip_ws();
            if self.eat("<?") {
                self.until("?>")?;
            } else if self.eat("<!--") {
                self.until("-->")?;
            } else {
                return Ok(());
            }
        }
    }

    fn name(&mut self) -> TreeResult<&'s str> {
        let rest = self.rest();
        let len = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '/' | '>' | '<' | '=' | '"' | '\''))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error("expected a name"));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn quoted(&mut self) -> TreeResult<String> {
        let quote = if self.eat("\"") {
            "\""
        } else if self.eat("'") {
            "'"
        } else {
            return Err(self.error("expected quoted attribute value"));
        };
        let raw = self.until(quote)?;
        decode_entities(raw).map_err(|msg| self.error(&msg))
    }

    fn element(&mut self) -> TreeResult<Node> {
        self.expect("<")?;
        let name = self.name()?;
        let mut builder = Node::element(Symbol::from_dynamic(name));
        loop {
            self.skip_ws();
            if self.eat("/>") {
                return builder.build();
            }
            if self.eat(">") {
                break;
            }
            let key = self.name()?;
            self.skip_ws();
            self.expect("=")?;
            self.skip_ws();
            let value = self.quoted()?;
            builder = builder.attr(Symbol::from_dynamic(key), value);
        }
        loop {
            if self.eat("</") {
                let close = self.name()?;
                if close != name {
                    return Err(self.error(&format!("expected `</{name}>`, found `</{close}>`")));
                }
                self.skip_ws();
                self.expect(">")?;
                return builder.build();
            }
            if self.eat("<!--") {
                let body = self.until("-->")?;
                builder = builder.child(Node::comment(body.trim())?);
            } else if self.eat("<![CDATA[") {
                let body = self.until("]]>")?;
                builder = builder.text(body);
            } else if self.rest().starts_with('<') {
                builder = builder.child(self.element()?);
            } else if self.rest().is_empty() {
                return Err(self.error(&format!("unclosed element `{name}`")));
            } else {
                let rest = self.rest();
                let len = rest.find('<').unwrap_or(rest.len());
                self.pos += len;
                let raw = rest[..len].trim();
                if !raw.is_empty() {
                    let text = decode_entities(raw).map_err(|msg| self.error(&msg))?;
                    builder = builder.text(text);
                }
            }
        }
    }
}

fn decode_entities(raw: &str) -> Result<String, String> {
    if !raw.contains('&') {
        return Ok(raw.to_owned());
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let Some(semi) = after.find(';') else {
            return Err("unterminated entity reference".to_owned());
        };
        let entity = &after[..semi];
        let decoded = match entity {
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "quot" => '"',
            "apos" => '\'',
            _ => entity
                .strip_prefix("#x")
                .map(|hex| u32::from_str_radix(hex, 16))
                .or_else(|| entity.strip_prefix('#').map(str::parse::<u32>))
                .and_then(Result::ok)
                .and_then(char::from_u32)
                .ok_or_else(|| format!("unknown entity `&{entity};`"))?,
        };
        out.push(decoded);
        rest = &after[semi + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_nested_elements_and_attributes() {
        let node = parse_element(
            r#"<?xml version="1.0"?>
            <!-- header -->
            <project xmlns="http://maven.apache.org/POM/4.0.0">
              <build>
                <plugins>
                  <plugin>
                    <artifactId>maven-compiler-plugin</artifactId>
                    <configuration/>
                  </plugin>
                </plugins>
              </build>
            </project>"#,
        )
        .unwrap();
        assert!(node.is_element_named("project"));
        assert_eq!(
            node.as_element().unwrap().attribute("xmlns"),
            Some("http://maven.apache.org/POM/4.0.0")
        );
        let plugin = node.child("build").unwrap().child("plugins").unwrap().child("plugin").unwrap();
        assert_eq!(plugin.child_value("artifactId"), Some("maven-compiler-plugin"));
        assert_eq!(plugin.child("configuration").unwrap().children().len(), 0);
    }

    #[test]
    fn test_decodes_entities_and_keeps_comments() {
        let node = parse_element("<a x='1 &amp; 2'><!-- note -->&lt;b&gt;&#65;&#x42;</a>").unwrap();
        assert_eq!(node.as_element().unwrap().attribute("x"), Some("1 & 2"));
        assert_eq!(node.children().len(), 2);
        assert_eq!(node.children()[1].as_text(), Some("<b>AB"));
    }

    #[test]
    fn test_malformed_input_is_an_error() {
        for text in [
            "",
            "<a>",
            "<a></b>",
            "<a x=1/>",
            "<a>&bogus;</a>",
            "<a/><b/>",
            "<1a/>",
        ] {
            assert!(
                matches!(parse_element(text), Err(TreeError::MalformedFragment(_))),
                "{text:?} should fail"
            );
        }
    }

    #[test]
    fn test_parses_properties() {
        let root = parse_properties(
            "# build settings\nmicronautVersion=3.0.0\n\nkapt.incremental.apt : true\n",
        )
        .unwrap();
        assert!(root.is_element_named("properties"));
        assert_eq!(root.children().len(), 3);
        let entry = root.children()[1].as_entry().unwrap();
        assert_eq!((entry.key(), entry.value()), ("micronautVersion", "3.0.0"));
        let entry = root.children()[2].as_entry().unwrap();
        assert_eq!((entry.key(), entry.value()), ("kapt.incremental.apt", "true"));
        assert!(parse_properties("no separator here").is_err());
    }
}
