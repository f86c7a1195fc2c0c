//! In-memory remote store.
//!
//! Implements [`RemoteStore`] over a single JSON tree, with the same path
//! semantics as the hosted database: `/a/b` addresses `tree["a"]["b"]`,
//! writes create intermediate objects, deletes prune parents left empty,
//! and pushes append children under generated, order-preserving keys.
//!
//! Used by host tests and simulation runs.  Failure injection lets tests
//! take the link down, reject single paths, or make clears fail.

use serde_json::{Map, Value};

use crate::app::ports::RemoteStore;
use crate::error::TransportError;

/// One recorded store operation and whether it succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Get(String, bool),
    Set(String, bool),
    Update(String, bool),
    Push(String, bool),
    Delete(String, bool),
}

/// JSON-tree store with failure injection and an operation log.
#[derive(Debug, Default)]
pub struct MemoryStore {
    root: Value,
    offline: bool,
    failing: Vec<(String, TransportError)>,
    failing_deletes: Vec<String>,
    push_seq: u32,
    ops: Vec<Op>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            root: Value::Object(Map::new()),
            ..Self::default()
        }
    }

    // ── Failure injection ─────────────────────────────────────

    /// Every operation fails with `Unreachable` while set.
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    /// Operations on `path` or below fail with `err`.
    pub fn fail_path(&mut self, path: &str, err: TransportError) {
        self.failing.push((normalize(path), err));
    }

    /// Deletes of `path` fail with `Unreachable`; reads and writes succeed.
    pub fn fail_delete(&mut self, path: &str) {
        self.failing_deletes.push(normalize(path));
    }

    /// Clear all injected failures.
    pub fn heal(&mut self) {
        self.offline = false;
        self.failing.clear();
        self.failing_deletes.clear();
    }

    // ── Inspection ────────────────────────────────────────────

    /// Write `value` at `path` without logging or failure checks.
    pub fn seed(&mut self, path: &str, value: Value) {
        write_at(&mut self.root, &segments(path), value);
    }

    pub fn value(&self, path: &str) -> Option<&Value> {
        read_at(&self.root, &segments(path))
    }

    /// Children appended with [`RemoteStore::push`] under `path`, oldest first.
    pub fn pushed(&self, path: &str) -> Vec<&Value> {
        match self.value(path) {
            Some(Value::Object(map)) => map
                .iter()
                .filter(|(k, _)| k.starts_with('-'))
                .map(|(_, v)| v)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    // ── Internal ──────────────────────────────────────────────

    fn check(&self, path: &str) -> Result<(), TransportError> {
        if self.offline {
            return Err(TransportError::Unreachable);
        }
        let path = normalize(path);
        match self.failing.iter().find(|(p, _)| covers(p, &path)) {
            Some((_, err)) => Err(*err),
            None => Ok(()),
        }
    }

    fn record(&mut self, op: fn(String, bool) -> Op, path: &str, ok: bool) {
        self.ops.push(op(normalize(path), ok));
    }
}

impl RemoteStore for MemoryStore {
    fn get(&mut self, path: &str) -> Result<Option<Value>, TransportError> {
        let result = self.check(path).map(|()| self.value(path).cloned());
        self.record(Op::Get, path, result.is_ok());
        result
    }

    fn set(&mut self, path: &str, value: &Value) -> Result<(), TransportError> {
        let result = self.check(path);
        if result.is_ok() {
            write_at(&mut self.root, &segments(path), value.clone());
        }
        self.record(Op::Set, path, result.is_ok());
        result
    }

    fn update(&mut self, path: &str, fields: &Value) -> Result<(), TransportError> {
        let result = match fields {
            Value::Object(_) => self.check(path),
            _ => Err(TransportError::Malformed),
        };
        if let (Ok(()), Value::Object(fields)) = (&result, fields) {
            let base = segments(path);
            for (key, value) in fields {
                let mut at = base.clone();
                at.extend(key.split('/').filter(|s| !s.is_empty()).map(str::to_owned));
                write_at(&mut self.root, &at, value.clone());
            }
        }
        self.record(Op::Update, path, result.is_ok());
        result
    }

    fn push(&mut self, path: &str, value: &Value) -> Result<String, TransportError> {
        let result = self.check(path).map(|()| {
            self.push_seq += 1;
            let key = format!("-N{:08}", self.push_seq);
            let mut at = segments(path);
            at.push(key.clone());
            write_at(&mut self.root, &at, value.clone());
            key
        });
        self.record(Op::Push, path, result.is_ok());
        result
    }

    fn delete(&mut self, path: &str) -> Result<(), TransportError> {
        let norm = normalize(path);
        let result = self.check(path).and_then(|()| {
            if self.failing_deletes.iter().any(|p| *p == norm) {
                Err(TransportError::Unreachable)
            } else {
                Ok(())
            }
        });
        if result.is_ok() {
            remove_at(&mut self.root, &segments(path));
        }
        self.record(Op::Delete, path, result.is_ok());
        result
    }
}

// ── Tree helpers ──────────────────────────────────────────────

fn segments(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

fn normalize(path: &str) -> String {
    let mut out = String::new();
    for seg in segments(path) {
        out.push('/');
        out.push_str(&seg);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// `prefix` equals `path` or is one of its ancestors.
fn covers(prefix: &str, path: &str) -> bool {
    prefix == "/"
        || path == prefix
        || (path.starts_with(prefix) && path.as_bytes().get(prefix.len()) == Some(&b'/'))
}

fn read_at<'a>(root: &'a Value, segs: &[String]) -> Option<&'a Value> {
    let mut node = root;
    for seg in segs {
        node = node.as_object()?.get(seg)?;
    }
    match node {
        Value::Null => None,
        Value::Object(map) if map.is_empty() => None,
        other => Some(other),
    }
}

fn write_at(root: &mut Value, segs: &[String], value: Value) {
    // Null is a delete in the hosted database.
    if value.is_null() {
        remove_at(root, segs);
        return;
    }
    let Some((last, parents)) = segs.split_last() else {
        *root = value;
        return;
    };
    let mut node = root;
    for seg in parents {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Value::Object(map) = node else { return };
        node = map
            .entry(seg.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        map.insert(last.clone(), value);
    }
}

/// Remove the node at `segs`, then prune ancestors left empty.
fn remove_at(node: &mut Value, segs: &[String]) -> bool {
    let Some((first, rest)) = segs.split_first() else {
        *node = Value::Object(Map::new());
        return true;
    };
    let Value::Object(map) = node else {
        return false;
    };
    if rest.is_empty() {
        map.remove(first);
    } else if let Some(child) = map.get_mut(first) {
        if remove_at(child, rest) {
            map.remove(first);
        }
    }
    map.is_empty()
}
