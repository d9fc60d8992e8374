//! Builders for the common input and paste rule shapes.

use std::sync::Arc;

use regex::Regex;
use tracing::warn;

use crate::core::{Attrs, char_len};
use crate::error::ApplyError;
use crate::ops::Transaction;
use crate::plugin::{InputRule, PasteRule, RuleMatch};
use crate::transforms::lists::wrap_in_list;

pub type AttrsFromMatch = Arc<dyn Fn(&RuleMatch) -> Option<Attrs> + Send + Sync>;

pub fn symmetric_input_pattern(delimiter: &str) -> String {
    let escaped = regex::escape(delimiter);
    let first = regex::escape(&delimiter[..delimiter.chars().next().map_or(0, char::len_utf8)]);
    format!(r"(?:^|\s)({escaped}([^{first}]+){escaped})$")
}

pub fn symmetric_paste_pattern(delimiter: &str) -> String {
    let escaped = regex::escape(delimiter);
    let first = regex::escape(&delimiter[..delimiter.chars().next().map_or(0, char::len_utf8)]);
    format!(r"{escaped}([^{first}]+){escaped}")
}

fn compile(name: &str, pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(err) => {
            warn!(rule = name, %err, "invalid rule pattern");
            None
        }
    }
}

fn apply_mark_rule(tr: &mut Transaction, found: &RuleMatch, kind: &str, attrs: Option<Attrs>) -> bool {
    let Some(inner) = found.last_group() else {
        return false;
    };
    let full = found.text.as_str();
    let Some(byte_at) = full.find(inner) else {
        return false;
    };
    let leading = full.chars().take_while(|c| c.is_whitespace()).count();
    let text_start = found.from + char_len(&full[..byte_at]);
    let text_end = text_start + char_len(inner);

    let schema = tr.schema_arc();
    let mut blocked = false;
    tr.doc().nodes_between(found.from, found.to.max(found.from + 1), |node, _, _, _| {
        blocked |= node
            .marks
            .iter()
            .any(|mark| mark.kind != kind && schema.excludes(&mark.kind, kind));
        !blocked
    });
    if blocked {
        return false;
    }

    let mark = match schema.mark(kind, attrs.as_ref()) {
        Ok(mark) => mark,
        Err(err) => {
            warn!(mark = kind, %err, "mark rule skipped");
            return false;
        }
    };
    let result = (|| {
        if text_end < found.to {
            tr.delete(text_end, found.to)?;
        }
        let mark_start = found.from + leading;
        if text_start > mark_start {
            tr.delete(mark_start, text_start)?;
        }
        let mark_end = mark_start + char_len(inner);
        tr.add_mark(mark_start, mark_end, mark)?;
        tr.remove_stored_mark(kind);
        Ok::<_, ApplyError>(())
    })();
    match result {
        Ok(()) => true,
        Err(err) => {
            warn!(mark = kind, %err, "mark rule failed");
            false
        }
    }
}

pub fn mark_input_rule(name: &str, pattern: &str, kind: &str, attrs: Option<AttrsFromMatch>) -> Option<InputRule> {
    let find = compile(name, pattern)?;
    let kind = kind.to_string();
    Some(InputRule::new(name, find, move |tr, found| {
        let attrs = attrs.as_ref().and_then(|f| f(found));
        apply_mark_rule(tr, found, &kind, attrs)
    }))
}

pub fn mark_paste_rule(name: &str, pattern: &str, kind: &str, attrs: Option<AttrsFromMatch>) -> Option<PasteRule> {
    let find = compile(name, pattern)?;
    let kind = kind.to_string();
    Some(PasteRule::new(name, find, move |tr, found| {
        let attrs = attrs.as_ref().and_then(|f| f(found));
        apply_mark_rule(tr, found, &kind, attrs)
    }))
}

pub fn symmetric_mark_input_rule(kind: &str, delimiter: &str) -> Option<InputRule> {
    mark_input_rule(
        &format!("{kind}:{delimiter}"),
        &symmetric_input_pattern(delimiter),
        kind,
        None,
    )
}

pub fn symmetric_mark_paste_rule(kind: &str, delimiter: &str) -> Option<PasteRule> {
    mark_paste_rule(
        &format!("{kind}:{delimiter}"),
        &symmetric_paste_pattern(delimiter),
        kind,
        None,
    )
}

/// Turns the text block into `kind` once its start matches, dropping the
/// matched text.
pub fn textblock_type_input_rule(
    name: &str,
    pattern: &str,
    kind: &str,
    attrs: Option<AttrsFromMatch>,
) -> Option<InputRule> {
    let find = compile(name, pattern)?;
    let kind = kind.to_string();
    Some(InputRule::new(name, find, move |tr, found| {
        let attrs = attrs.as_ref().and_then(|f| f(found));
        let result = (|| {
            tr.delete(found.from, found.to)?;
            tr.set_block_type(found.from, found.from, &kind, attrs.as_ref())
        })();
        match result {
            Ok(_) => true,
            Err(err) => {
                warn!(node = %kind, %err, "block type rule failed");
                false
            }
        }
    }))
}

/// Wraps the text block in a `kind` list once its start matches, joining
/// a directly preceding list of the same kind.
pub fn wrapping_input_rule(
    name: &str,
    pattern: &str,
    kind: &str,
    attrs: Option<AttrsFromMatch>,
) -> Option<InputRule> {
    let find = compile(name, pattern)?;
    let kind = kind.to_string();
    Some(InputRule::new(name, find, move |tr, found| {
        let attrs = attrs.as_ref().and_then(|f| f(found));
        let result = (|| {
            tr.delete(found.from, found.to)?;
            wrap_in_list(tr, found.from, found.from, &kind, attrs.as_ref(), true)
        })();
        match result {
            Ok(wrapped) => wrapped,
            Err(err) => {
                warn!(node = %kind, %err, "wrapping rule failed");
                false
            }
        }
    }))
}
