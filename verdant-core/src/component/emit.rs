//! Component events.
//!
//! `emit("change-value", ..)` calls the handler prop `onChangeValue`.

use crate::value::{RawObject, Value};

/// Convert `kebab-case` to `camelCase`.
pub fn camelize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '-' {
            if let Some(&next) = chars.peek() {
                if next.is_ascii_alphanumeric() || next == '_' {
                    chars.next();
                    out.push(next.to_ascii_uppercase());
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The handler prop for an event: `click` becomes `onClick`.
pub fn to_handler_key(event: &str) -> String {
    if event.is_empty() {
        return String::new();
    }
    format!("on{}", capitalize(event))
}

/// Call the handler for `event` found in `props`, if it is a callback.
pub(crate) fn emit(props: &RawObject, event: &str, args: &[Value]) -> Option<Value> {
    let handler_key = to_handler_key(&camelize(event));
    let handler = props.get(&handler_key)?;
    match handler.as_callback() {
        Some(callback) => Some(callback.call(args)),
        None => {
            tracing::debug!(event, handler_key, "emitted event has no callable handler");
            None
        }
    }
}
