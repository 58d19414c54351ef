//! Message sanitizing and template rendering
//!
//! Templates use brace placeholders: `{}` takes the next positional
//! argument, `{0}` a positional argument by index, and `{name}` a named
//! argument. `{{` and `}}` render literal braces.

use crate::error::{BuzzError, Result};
use serde_json::{Map, Value};

/// Escape every brace so `text` renders back to itself
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '{' => out.push_str("{{"),
            '}' => out.push_str("}}"),
            _ => out.push(c),
        }
    }
    out
}

/// Render `template` with positional and named arguments
pub fn render(template: &str, args: &[Value], kwargs: &Map<String, Value>) -> Result<String> {
    let fail = |reason: String| BuzzError::Format {
        template: template.to_string(),
        reason,
    };

    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut next_positional = 0;

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => return Err(fail("single '}' encountered".to_string())),
            '{' => {
                let mut field = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') => return Err(fail("unexpected '{' in field name".to_string())),
                        Some(ch) => field.push(ch),
                        None => return Err(fail("unterminated placeholder".to_string())),
                    }
                }
                let value = if field.is_empty() {
                    let value = args.get(next_positional).ok_or_else(|| {
                        fail(format!("missing positional argument {}", next_positional))
                    })?;
                    next_positional += 1;
                    value
                } else if field.contains(':') || field.contains('!') {
                    return Err(fail(format!("format spec not supported in '{{{}}}'", field)));
                } else if let Ok(index) = field.parse::<usize>() {
                    args.get(index)
                        .ok_or_else(|| fail(format!("missing positional argument {}", index)))?
                } else {
                    kwargs
                        .get(&field)
                        .ok_or_else(|| fail(format!("missing named argument '{}'", field)))?
                };
                push_value(&mut out, value);
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

fn push_value(out: &mut String, value: &Value) {
    match value {
        Value::String(s) => out.push_str(s),
        other => out.push_str(&other.to_string()),
    }
}

/// Produce the final message for one raise path
///
/// Without arguments the message is free-form text: it is sanitized and
/// rendered, which reproduces it exactly and cannot fail. With arguments it
/// is a template and is rendered as written.
pub fn prepare_message(
    template: &str,
    format_args: &[Value],
    format_kwargs: &Map<String, Value>,
) -> Result<String> {
    if format_args.is_empty() && format_kwargs.is_empty() {
        render(&sanitize(template), &[], format_kwargs)
    } else {
        render(template, format_args, format_kwargs)
    }
}
