use serde_json::Value;
use std::fmt;

use super::codes::ErrorCode;

/// A single failure occurrence: a symbolic code plus positional arguments
///
/// Immutable after construction. The detail message is rendered from the
/// code's template at the moment of reporting, not at construction, so the
/// same value stays renderable any number of times.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    code: ErrorCode,
    args: Vec<Value>,
}

impl Error {
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            args: Vec::new(),
        }
    }

    /// Append a positional argument for the detail template
    pub fn with_arg(mut self, arg: impl Into<Value>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Render the code's detail template with the positional arguments
    pub fn detail_message(&self) -> String {
        render_template(self.code.detail(), &self.args)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error(code={}, args=[", self.code)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, "])")
    }
}

/// Substitute positional `{N}` placeholders with argument values
///
/// The template is scanned once; substituted argument text is never
/// re-scanned, so brace sequences inside argument values (which may carry
/// client input verbatim) render as-is. A placeholder with no matching
/// argument is a defect at the construction site: it is left verbatim in
/// the output and logged, never a panic.
fn render_template(template: &str, args: &[Value]) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut missing = false;
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        rendered.push_str(&rest[..start]);
        let tail = &rest[start + 1..];

        match tail.find('}') {
            Some(end)
                if !tail[..end].is_empty()
                    && tail[..end].bytes().all(|b| b.is_ascii_digit()) =>
            {
                let index = &tail[..end];
                match index.parse::<usize>().ok().and_then(|i| args.get(i)) {
                    Some(arg) => rendered.push_str(&value_to_display(arg)),
                    None => {
                        missing = true;
                        rendered.push('{');
                        rendered.push_str(index);
                        rendered.push('}');
                    }
                }
                rest = &tail[end + 1..];
            }
            // Not a positional placeholder: keep the brace literally
            _ => {
                rendered.push('{');
                rest = tail;
            }
        }
    }
    rendered.push_str(rest);

    if missing {
        tracing::error!(
            template = %template,
            arg_count = args.len(),
            "Error detail template has placeholders with no matching argument"
        );
    }

    rendered
}

/// Display form of an argument: strings unquoted, everything else as JSON
fn value_to_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
