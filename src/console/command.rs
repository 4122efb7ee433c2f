//! Parser for the dotted alternate syntax, `Kind.method(args)`.
//!
//! Arguments are recognized with a small literal grammar (quoted strings,
//! decimal integers, decimal floats, and for `update` a brace-delimited
//! mapping) and never evaluated as code. Anything outside the grammar makes
//! the whole line unrecognized, which the interpreter ignores silently.

use crate::entity::EntityKind;

/// A desugared dotted call, ready for dispatch onto the primary commands.
#[derive(Debug, Clone, PartialEq)]
pub enum DottedCall {
    All(EntityKind),
    Count(EntityKind),
    Show(EntityKind, String),
    Destroy(EntityKind, String),
    Update {
        kind: EntityKind,
        id: String,
        field: String,
        value: String,
    },
    /// One update dispatch per pair, in source order.
    UpdateMap {
        kind: EntityKind,
        id: String,
        pairs: Vec<(String, String)>,
    },
}

/// Parse one line as a dotted call. `None` means the line is not a call the
/// interpreter recognizes.
pub fn parse_dotted(line: &str) -> Option<DottedCall> {
    let line = line.trim();
    let (kind_name, rest) = line.split_once('.')?;
    let kind = EntityKind::from_name(kind_name)?;
    let open = rest.find('(')?;
    let close = rest.rfind(')')?;
    if close != rest.len() - 1 || close < open {
        return None;
    }
    let method = &rest[..open];
    let args = &rest[open + 1..close];

    match method {
        "all" if args.trim().is_empty() => Some(DottedCall::All(kind)),
        "count" if args.trim().is_empty() => Some(DottedCall::Count(kind)),
        "show" => Some(DottedCall::Show(kind, parse_literal(args)?.into_text())),
        "destroy" => Some(DottedCall::Destroy(kind, parse_literal(args)?.into_text())),
        "update" => parse_update_args(kind, args),
        _ => None,
    }
}

fn parse_update_args(kind: EntityKind, args: &str) -> Option<DottedCall> {
    let (id_text, rest) = args.split_once(',')?;
    let id = parse_literal(id_text)?.into_text();
    let rest = rest.trim();

    if rest.starts_with('{') {
        let pairs = parse_map(rest)?;
        return Some(DottedCall::UpdateMap { kind, id, pairs });
    }

    let (field_text, value_text) = rest.split_once(',')?;
    let field = parse_literal(field_text)?.into_text();
    let value = value_text.trim();
    if value.is_empty() {
        return None;
    }
    Some(DottedCall::Update {
        kind,
        id,
        field,
        value: value.to_string(),
    })
}

/// Brace-delimited field mapping: string keys, literal values.
fn parse_map(text: &str) -> Option<Vec<(String, String)>> {
    let inner = text.strip_prefix('{')?.strip_suffix('}')?;
    let mut pairs = Vec::new();
    for part in inner.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (key_text, value_text) = part.split_once(':')?;
        let Literal::Str(key) = parse_literal(key_text)? else {
            return None;
        };
        pairs.push((key, parse_literal(value_text)?.into_text()));
    }
    Some(pairs)
}

#[derive(Debug, Clone, PartialEq)]
enum Literal {
    Str(String),
    Int(i64),
    Float(f64),
}

impl Literal {
    /// Canonical command-line text: string content without quotes, numbers
    /// in their decimal form.
    fn into_text(self) -> String {
        match self {
            Literal::Str(s) => s,
            Literal::Int(n) => n.to_string(),
            Literal::Float(x) => x.to_string(),
        }
    }
}

/// Quoted strings (no escapes), decimal integers, decimal floats.
fn parse_literal(text: &str) -> Option<Literal> {
    let text = text.trim();
    for quote in ['"', '\''] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            return Some(Literal::Str(text[1..text.len() - 1].to_string()));
        }
    }
    if let Ok(n) = text.parse::<i64>() {
        return Some(Literal::Int(n));
    }
    if let Ok(x) = text.parse::<f64>() {
        return Some(Literal::Float(x));
    }
    None
}
