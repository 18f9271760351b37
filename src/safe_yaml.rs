//! Restricted YAML deserialization.
//!
//! Documents are streamed out of `serde_yaml::Deserializer` straight into a
//! `serde_json::Value` through an allow-list: scalars, sequences, mappings, and
//! aliases bounded by [`YamlLimits`]. The limits are charged as each node is
//! visited, and `serde_yaml` replays every alias through the visitor, so an
//! alias bomb stops at the cap instead of after full expansion. Anything
//! carrying an explicit tag is rejected, so no document can ask for a language
//! object, a binary blob, or a custom constructor. Merge keys (`<<`) are applied
//! here so that explicit keys in the child mapping always take precedence over
//! merged-in values.
//!
//! `serde_yaml` resolves `!!`-handle tags itself and only surfaces local `!`
//! tags as enums, so tags are also rejected lexically before the document
//! reaches the parser.

use crate::error::YamlError;
use serde::de::{self, DeserializeSeed, EnumAccess, MapAccess, SeqAccess, Visitor};
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::fmt;

const MERGE_KEY: &str = "<<";

/// Caps applied to every restricted parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct YamlLimits {
    /// Total nodes visited, counting every alias expansion.
    pub max_nodes: usize,
    /// Maximum nesting depth; the document root is depth 1.
    pub max_depth: usize,
}

impl YamlLimits {
    pub const DEFAULT_MAX_NODES: usize = 10_000;
    pub const DEFAULT_MAX_DEPTH: usize = 64;
}

impl Default for YamlLimits {
    fn default() -> Self {
        Self {
            max_nodes: Self::DEFAULT_MAX_NODES,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }
}

/// Parse `source` with the restricted schema.
///
/// An empty document yields `Value::Null`.
pub fn parse_restricted(source: &str, limits: &YamlLimits) -> Result<Value, YamlError> {
    reject_explicit_tags(source)?;
    let has_content = source.lines().any(|line| {
        let trimmed = line.trim();
        !trimmed.is_empty() && !trimmed.starts_with('#')
    });
    if !has_content {
        return Ok(Value::Null);
    }
    let budget = Budget::new(*limits);
    let root = NodeSeed {
        budget: &budget,
        depth: 1,
    };
    root.deserialize(serde_yaml::Deserializer::from_str(source))
        .map_err(|err| {
            budget
                .take_failure()
                .unwrap_or_else(|| YamlError::Yaml(err.to_string()))
        })
}

/// Scan for node properties that carry a tag (`!x`, `!!x`, `!<uri>`) or a
/// `%TAG` directive.
///
/// A tag can only appear where a node starts: at the beginning of a line, after
/// a `- `, `? ` or `: ` indicator, after a `---` document marker, or after a
/// flow indicator. In flow context and after a quoted key any `:` is a value
/// indicator. Plain scalars cannot start with `!`, so a `!` in the middle of
/// prose is not a tag, and neither is one that opens a more-indented
/// continuation line of a plain scalar. Quoted scalars, comments, and block
/// scalar bodies are skipped.
fn reject_explicit_tags(source: &str) -> Result<(), YamlError> {
    let mut quote: Option<char> = None;
    let mut block_parent_indent: Option<usize> = None;
    let mut flow_depth = 0usize;
    let mut expecting_node = true;
    let mut in_plain = false;
    let mut plain_min_indent = 0usize;
    // Smallest indent at which the next line continues the open plain scalar.
    let mut continuation_indent: Option<usize> = None;

    for line in source.lines() {
        let indent = line.len() - line.trim_start_matches(' ').len();
        let body = line.trim_start();
        if let Some(parent) = block_parent_indent {
            if body.is_empty() || indent > parent {
                continue;
            }
            block_parent_indent = None;
        }
        if quote.is_none() && body.starts_with("%TAG") {
            return Err(YamlError::ForbiddenTag {
                tag: "%TAG".to_string(),
            });
        }
        if body.is_empty() {
            continue;
        }

        let chars: Vec<char> = line.chars().collect();
        let mut idx = 0;
        if quote.is_none() && is_document_marker(line) {
            flow_depth = 0;
            expecting_node = true;
            in_plain = false;
            continuation_indent = None;
            idx = 3;
        } else if quote.is_some() {
            expecting_node = false;
        } else if flow_depth > 0 {
            // Flow collections carry their state across line breaks.
        } else if continuation_indent.is_some_and(|min| indent >= min) && !body.starts_with('#')
        {
            expecting_node = false;
        } else {
            expecting_node = true;
            in_plain = false;
            continuation_indent = None;
        }

        // Column of the innermost block collection entry started on this line.
        let mut structure_col = indent;
        let mut node_col = indent;
        let mut after_indicator = idx > 0;
        while idx < chars.len() {
            let c = chars[idx];
            if let Some(open) = quote {
                if open == '"' && c == '\\' {
                    idx += 2;
                    continue;
                }
                if c == open {
                    if open == '\'' && chars.get(idx + 1) == Some(&'\'') {
                        idx += 2;
                        continue;
                    }
                    quote = None;
                }
                idx += 1;
                continue;
            }

            let next_blank = chars.get(idx + 1).is_none_or(|n| n.is_whitespace());
            match c {
                ' ' | '\t' => {}
                '#' if idx == 0 || chars[idx - 1].is_whitespace() => {
                    in_plain = false;
                    break;
                }
                '!' if expecting_node => {
                    let tag: String = chars[idx..]
                        .iter()
                        .take_while(|ch| !ch.is_whitespace() && !matches!(ch, ',' | ']' | '}'))
                        .collect();
                    return Err(YamlError::ForbiddenTag { tag });
                }
                '&' if expecting_node => {
                    idx = skip_anchor_name(&chars, idx + 1);
                    continue;
                }
                '*' if expecting_node => {
                    idx = skip_anchor_name(&chars, idx + 1);
                    expecting_node = false;
                    in_plain = false;
                    continue;
                }
                '"' | '\'' if expecting_node => {
                    quote = Some(c);
                    node_col = idx;
                    expecting_node = false;
                    in_plain = false;
                }
                '-' | '?' if expecting_node && next_blank => {
                    structure_col = idx;
                    after_indicator = true;
                }
                ':' if next_blank || !in_plain => {
                    if flow_depth == 0 {
                        structure_col = node_col;
                    }
                    expecting_node = true;
                    in_plain = false;
                    after_indicator = true;
                }
                '[' | '{' if expecting_node => {
                    flow_depth += 1;
                    node_col = idx;
                    in_plain = false;
                }
                ']' | '}' if flow_depth > 0 => {
                    flow_depth -= 1;
                    expecting_node = false;
                    in_plain = false;
                }
                ',' if flow_depth > 0 => {
                    expecting_node = true;
                    in_plain = false;
                }
                '|' | '>' if expecting_node => {
                    block_parent_indent = Some(structure_col);
                    in_plain = false;
                    break;
                }
                _ => {
                    if expecting_node {
                        in_plain = true;
                        node_col = idx;
                        plain_min_indent = if after_indicator {
                            structure_col + 1
                        } else {
                            idx
                        };
                    }
                    expecting_node = false;
                }
            }
            idx += 1;
        }

        if quote.is_none() && flow_depth == 0 {
            continuation_indent = in_plain.then_some(plain_min_indent);
        }
    }
    Ok(())
}

fn skip_anchor_name(chars: &[char], mut idx: usize) -> usize {
    while chars
        .get(idx)
        .is_some_and(|ch| ch.is_alphanumeric() || matches!(ch, '-' | '_'))
    {
        idx += 1;
    }
    idx
}

// `---` or `...` at column 0, followed by a blank or the end of the line.
fn is_document_marker(line: &str) -> bool {
    (line.starts_with("---") || line.starts_with("..."))
        && line[3..].chars().next().is_none_or(char::is_whitespace)
}

/// Node and depth accounting shared by every seed of one parse.
struct Budget {
    limits: YamlLimits,
    nodes: Cell<usize>,
    failure: RefCell<Option<YamlError>>,
}

impl Budget {
    fn new(limits: YamlLimits) -> Self {
        Self {
            limits,
            nodes: Cell::new(0),
            failure: RefCell::new(None),
        }
    }

    fn enter<E: de::Error>(&self, depth: usize) -> Result<(), E> {
        if depth > self.limits.max_depth {
            return Err(self.fail(YamlError::LimitExceeded {
                what: "levels of nesting",
                limit: self.limits.max_depth,
            }));
        }
        let nodes = self.nodes.get() + 1;
        self.nodes.set(nodes);
        if nodes > self.limits.max_nodes {
            return Err(self.fail(YamlError::LimitExceeded {
                what: "nodes",
                limit: self.limits.max_nodes,
            }));
        }
        Ok(())
    }

    /// Record `err` and hand `serde_yaml` an opaque error to unwind with.
    fn fail<E: de::Error>(&self, err: YamlError) -> E {
        let message = err.to_string();
        self.failure.borrow_mut().get_or_insert(err);
        E::custom(message)
    }

    fn take_failure(&self) -> Option<YamlError> {
        self.failure.borrow_mut().take()
    }
}

#[derive(Clone, Copy)]
struct NodeSeed<'b> {
    budget: &'b Budget,
    depth: usize,
}

impl NodeSeed<'_> {
    fn child(self) -> Self {
        Self {
            depth: self.depth + 1,
            ..self
        }
    }
}

impl<'de> DeserializeSeed<'de> for NodeSeed<'_> {
    type Value = Value;

    fn deserialize<D: de::Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        self.budget.enter::<D::Error>(self.depth)?;
        deserializer.deserialize_any(NodeVisitor(self))
    }
}

struct NodeVisitor<'b>(NodeSeed<'b>);

impl<'de> Visitor<'de> for NodeVisitor<'_> {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar, sequence or mapping")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<Value, E> {
        Ok(i64::try_from(v)
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(v.to_string())))
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<Value, E> {
        Ok(u64::try_from(v)
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(v.to_string())))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let child = self.0.child();
        let mut items = Vec::new();
        while let Some(item) = seq.next_element_seed(child)? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let budget = self.0.budget;
        let child = self.0.child();
        let mut explicit = Map::new();
        let mut merges = Vec::new();
        while let Some(key) = map.next_key_seed(KeySeed { budget })? {
            let value = map.next_value_seed(child)?;
            if key == MERGE_KEY {
                merges.push(value);
                continue;
            }
            if explicit.contains_key(&key) {
                return Err(budget.fail(YamlError::Yaml(format!(
                    "duplicate entry with key \"{key}\""
                ))));
            }
            explicit.insert(key, value);
        }

        // Earlier merge sources win over later ones; explicit keys win over all.
        for source in merges {
            merge_source(&mut explicit, source).map_err(|err| budget.fail::<A::Error>(err))?;
        }
        Ok(Value::Object(explicit))
    }

    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<Value, A::Error> {
        Err(forbidden_tag(self.0.budget, data))
    }
}

/// Mapping keys must be scalars; they are stringified the way YAML prints them.
#[derive(Clone, Copy)]
struct KeySeed<'b> {
    budget: &'b Budget,
}

impl<'de> DeserializeSeed<'de> for KeySeed<'_> {
    type Value = String;

    fn deserialize<D: de::Deserializer<'de>>(self, deserializer: D) -> Result<String, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for KeySeed<'_> {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar mapping key")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i128<E: de::Error>(self, v: i128) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_u128<E: de::Error>(self, v: u128) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.to_owned())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
        Ok(v)
    }

    fn visit_unit<E: de::Error>(self) -> Result<String, E> {
        Ok("null".to_string())
    }

    fn visit_none<E: de::Error>(self) -> Result<String, E> {
        Ok("null".to_string())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, _seq: A) -> Result<String, A::Error> {
        Err(self.budget.fail(YamlError::NonScalarKey))
    }

    fn visit_map<A: MapAccess<'de>>(self, _map: A) -> Result<String, A::Error> {
        Err(self.budget.fail(YamlError::NonScalarKey))
    }

    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<String, A::Error> {
        Err(forbidden_tag(self.budget, data))
    }
}

// Local tags reach the visitor as enums whose variant name is the tag suffix.
fn forbidden_tag<'de, A: EnumAccess<'de>>(budget: &Budget, data: A) -> A::Error {
    let tag = data
        .variant::<String>()
        .map(|(suffix, _)| format!("!{suffix}"))
        .unwrap_or_else(|_| "!".to_string());
    budget.fail(YamlError::ForbiddenTag { tag })
}

fn merge_source(target: &mut Map<String, Value>, source: Value) -> Result<(), YamlError> {
    match source {
        Value::Object(inner) => merge_mapping(target, inner),
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::Object(inner) => merge_mapping(target, inner),
                    _ => return Err(YamlError::InvalidMerge),
                }
            }
        }
        _ => return Err(YamlError::InvalidMerge),
    }
    Ok(())
}

fn merge_mapping(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        target.entry(key).or_insert(value);
    }
}

fn float(v: f64) -> Value {
    serde_json::Number::from_f64(v)
        .map(Value::Number)
        .unwrap_or_else(|| {
            let text = if v.is_nan() {
                ".nan"
            } else if v.is_sign_negative() {
                "-.inf"
            } else {
                ".inf"
            };
            Value::String(text.to_string())
        })
}
