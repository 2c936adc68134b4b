use weft_diagnostic::{Diagnostic, ErrorCode};
use weft_engine::{same_as, Batch, Binding};
use weft_ir::Precedence;

use super::token_kind;
use crate::value::{Literal, TokenKind};

/// Replaces integer and string tokens with [`Literal`] values.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ParseLiteral;

impl Binding for ParseLiteral {
    fn precedence(&self) -> Precedence {
        Precedence::LITERAL
    }

    fn is_same(&self, other: &dyn Binding) -> bool {
        same_as(self, other)
    }

    fn process(&self, batch: &mut Batch<'_>) {
        for &node in batch.nodes() {
            let text = batch.text(node);
            let parsed = match token_kind(batch.engine(), node) {
                Some(TokenKind::Integer) => text
                    .parse::<i64>()
                    .map(Literal::Int)
                    .map_err(|_| format!("integer literal `{text}` is out of range")),
                Some(TokenKind::Str) => unescape(&text).map(Literal::Str),
                _ => continue,
            };
            match parsed {
                Ok(literal) => {
                    batch.replace_with_value(node, literal);
                }
                Err(message) => {
                    batch.error(
                        Diagnostic::error(ErrorCode::E1005)
                            .with_message(message)
                            .with_label(batch.span(node), "invalid literal"),
                    );
                }
            }
        }
    }
}

/// Contents of a quoted string with escapes applied.
fn unescape(quoted: &str) -> Result<String, String> {
    let inner = quoted
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(quoted);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
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
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => return Err(format!("unknown escape `\\{}`", other.escape_debug())),
            None => return Err("string ends with a lone `\\`".to_owned()),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::unescape;

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r#""a\tb\n""#), Ok("a\tb\n".to_owned()));
        assert_eq!(unescape(r#""say \"hi\" \\""#), Ok(r#"say "hi" \"#.to_owned()));
    }

    #[test]
    fn test_unescape_rejects_unknown_escape() {
        assert_eq!(unescape(r#""\q""#), Err("unknown escape `\\q`".to_owned()));
    }
}
