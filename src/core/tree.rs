//! In-memory referral tree as delivered by the backend.
//!
//! A [`TreeNode`] owns its children outright, so the tree is acyclic and rooted
//! by construction.  Decoding is deliberately forgiving: a node with missing or
//! mistyped fields comes through with blank/zero values instead of failing the
//! whole payload.  A node without an id is keyed by its position instead
//! (`#0.1` is the root's first child's second child).  The one thing we do
//! refuse is a duplicated `id`, since ids key both the expansion set and the
//! selection.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

// ───────────────────────────────────────── errors ────────────

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("tree payload is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("duplicate referral id '{0}' in tree")]
    DuplicateId(String),
}

// ───────────────────────────────────────── node ──────────────

/// One referral (a user in the network).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TreeNode {
    #[serde(deserialize_with = "lenient_id")]
    pub id: String,
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub email: String,
    /// Initials or an image reference.
    #[serde(deserialize_with = "lenient_opt_string")]
    pub avatar: Option<String>,
    #[serde(deserialize_with = "lenient_earnings")]
    pub earnings: f64,
    #[serde(deserialize_with = "lenient_bool")]
    pub is_active: bool,
    #[serde(deserialize_with = "lenient_datetime")]
    pub joined_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "lenient_opt_u64")]
    pub clicks: Option<u64>,
    #[serde(deserialize_with = "lenient_opt_f64")]
    pub conversion_rate: Option<f64>,
    /// Direct referrals, in display order.
    #[serde(deserialize_with = "lenient_children")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Initials shown when no avatar is set (`"Ada Lovelace"` → `"AL"`).
    pub fn initials(&self) -> String {
        if let Some(avatar) = self.avatar.as_deref().filter(|a| a.chars().count() <= 3) {
            return avatar.to_uppercase();
        }
        self.name
            .split_whitespace()
            .filter_map(|w| w.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}

// ───────────────────────────────────────── tree ──────────────

/// A validated referral tree: every id is unique.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferralTree {
    root: TreeNode,
}

impl ReferralTree {
    /// Wrap `root`, rejecting the tree if any id appears twice.  Blank ids
    /// are replaced with a positional key first.
    pub fn new(mut root: TreeNode) -> Result<Self, TreeError> {
        fill_blank_ids(&mut root, "#");
        let mut seen = HashSet::new();
        let mut stack = vec![&root];
        while let Some(node) = stack.pop() {
            if !seen.insert(node.id.as_str()) {
                return Err(TreeError::DuplicateId(node.id.clone()));
            }
            stack.extend(node.children.iter());
        }
        Ok(Self { root })
    }

    /// Decode and validate a JSON tree payload.
    pub fn from_json(bytes: &[u8]) -> Result<Self, TreeError> {
        let root: TreeNode = serde_json::from_slice(bytes)?;
        Self::new(root)
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Find a node anywhere in the tree.
    pub fn find(&self, id: &str) -> Option<&TreeNode> {
        self.walk().into_iter().find(|(n, _)| n.id == id).map(|(n, _)| n)
    }

    /// Level (depth from root) of the node with `id`.
    pub fn level_of(&self, id: &str) -> Option<usize> {
        self.walk()
            .into_iter()
            .find(|(n, _)| n.id == id)
            .map(|(_, level)| level)
    }

    /// Every node paired with its level, in pre-order (display order).
    pub fn walk(&self) -> Vec<(&TreeNode, usize)> {
        let mut out = Vec::new();
        collect_preorder(&self.root, 0, &mut out);
        out
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.walk().len()
    }

    /// Deepest level in the tree (0 for a lone root).
    pub fn deepest_level(&self) -> usize {
        self.walk().iter().map(|(_, l)| *l).max().unwrap_or(0)
    }
}

fn fill_blank_ids(node: &mut TreeNode, path: &str) {
    if node.id.is_empty() {
        node.id = path.to_string();
    }
    for (i, child) in node.children.iter_mut().enumerate() {
        let child_path = if path == "#" {
            format!("#{i}")
        } else {
            format!("{path}.{i}")
        };
        fill_blank_ids(child, &child_path);
    }
}

fn collect_preorder<'a>(node: &'a TreeNode, level: usize, out: &mut Vec<(&'a TreeNode, usize)>) {
    out.push((node, level));
    for child in &node.children {
        collect_preorder(child, level + 1, out);
    }
}

// ───────────────────────────────────────── lenient decoding ──

fn lenient_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(lenient_opt_string(d)?.unwrap_or_default())
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn number_of(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn lenient_earnings<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(number_of(&Value::deserialize(d)?).unwrap_or(0.0).max(0.0))
}

fn lenient_opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(number_of(&Value::deserialize(d)?))
}

fn lenient_opt_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    Ok(number_of(&Value::deserialize(d)?)
        .filter(|n| *n >= 0.0)
        .map(|n| n.round() as u64))
}

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => matches!(s.to_ascii_lowercase().as_str(), "true" | "1" | "active"),
        _ => false,
    })
}

fn lenient_datetime<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        _ => None,
    })
}

fn lenient_children<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<TreeNode>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect(),
        _ => Vec::new(),
    })
}

// ───────────────────────────────────────── tests ─────────────
