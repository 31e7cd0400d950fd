//! Asset Schema Registry
//!
//! Declares which fields of which source and transition types hold file
//! references. Supporting a new asset-bearing type means adding one row here.
//!
//! The read pass (collecting assets) and the mutate pass (rewriting paths) both
//! go through [`asset_patterns`], so they always visit the same fields.

use serde_json::{Map, Value};

use super::tree;

/// Field path inside a source, transition or the document itself
pub type FieldPath = &'static [&'static str];

/// Asset fields of sources, keyed by `versioned_id`
pub const SOURCE_ASSET_FIELDS: &[(&str, FieldPath)] = &[
    ("ffmpeg_source", &["settings", "local_file"]),
    ("image_source", &["settings", "file"]),
    ("slideshow", &["settings", "files", "value"]),
    ("vlc_source", &["settings", "playlist", "value"]),
];

/// Asset fields of transitions, keyed by `id`
pub const TRANSITION_ASSET_FIELDS: &[(&str, FieldPath)] =
    &[("obs_stinger_transition", &["settings", "path"])];

/// Asset fields that hang off the document root (scripts attached to the collection)
pub const DOCUMENT_ASSET_FIELDS: &[FieldPath] = &[&["modules", "scripts-tool", "path"]];

/// Which table an entry of the document is looked up in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Source,
    Transition,
}

impl EntryKind {
    /// Top-level document key holding entries of this kind
    pub fn collection_key(self) -> &'static str {
        match self {
            EntryKind::Source => "sources",
            EntryKind::Transition => "transitions",
        }
    }
}

/// Type identifier of a source (`versioned_id`, falling back to `id`) or transition (`id`)
pub fn entry_type_id(entry: &Value, kind: EntryKind) -> Option<&str> {
    let field = |key: &str| entry.get(key).and_then(Value::as_str);
    match kind {
        EntryKind::Source => field("versioned_id").or_else(|| field("id")),
        EntryKind::Transition => field("id"),
    }
}

/// Field paths holding assets for an entry, or an empty slice for unregistered types
pub fn asset_patterns(entry: &Value, kind: EntryKind) -> &'static [FieldPath] {
    let table = match kind {
        EntryKind::Source => SOURCE_ASSET_FIELDS,
        EntryKind::Transition => TRANSITION_ASSET_FIELDS,
    };
    let row = entry_type_id(entry, kind)
        .and_then(|type_id| table.iter().find(|(id, _)| *id == type_id));
    match row {
        Some((_, pattern)) => std::slice::from_ref(pattern),
        None => &[],
    }
}

const KINDS: [EntryKind; 2] = [EntryKind::Source, EntryKind::Transition];

/// Calls `f(container, key)` for every registered asset field in the document.
///
/// Order: sources, then transitions, then document-level fields, each in
/// document order.
pub fn for_each_asset_field<'a, F>(document: &'a Value, mut f: F)
where
    F: FnMut(&'a Map<String, Value>, &str),
{
    for kind in KINDS {
        let Some(entries) = document.get(kind.collection_key()).and_then(Value::as_array) else {
            continue;
        };
        for entry in entries {
            for pattern in asset_patterns(entry, kind) {
                tree::visit(entry, pattern, &mut f);
            }
        }
    }
    for pattern in DOCUMENT_ASSET_FIELDS {
        tree::visit(document, pattern, &mut f);
    }
}

/// Mutable counterpart of [`for_each_asset_field`], visiting the same fields in the same order.
pub fn for_each_asset_field_mut<F>(document: &mut Value, mut f: F)
where
    F: FnMut(&mut Map<String, Value>, &str),
{
    for kind in KINDS {
        let Some(entries) = document
            .get_mut(kind.collection_key())
            .and_then(Value::as_array_mut)
        else {
            continue;
        };
        for entry in entries.iter_mut() {
            let patterns = asset_patterns(entry, kind);
            for pattern in patterns {
                tree::visit_mut(entry, pattern, &mut f);
            }
        }
    }
    for pattern in DOCUMENT_ASSET_FIELDS {
        tree::visit_mut(document, pattern, &mut f);
    }
}

/// Collects the string values of every registered asset field of one kind.
pub fn asset_values_of(document: &Value, kind: EntryKind) -> Vec<String> {
    let mut values = Vec::new();
    if let Some(entries) = document.get(kind.collection_key()).and_then(Value::as_array) {
        for entry in entries {
            for pattern in asset_patterns(entry, kind) {
                tree::visit(entry, pattern, &mut |map, key| {
                    if let Some(v) = map.get(key).and_then(Value::as_str) {
                        values.push(v.to_string());
                    }
                });
            }
        }
    }
    values
}
