/*
 * Description: Convert between serialized documents and the node arena.
 *
 * Copyright (C) 2022 Danny McClanahan <dmcC2@hypnicjerk.ai>
 * SPDX-License-Identifier: AGPL-3.0-or-later
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published
 * by the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! Convert between serialized documents and the node arena.
//!
//! The interchange format is JSON. Every node is an object tagged with its kind under `"t"`, with
//! any payload fields alongside and its children under `"c"`:
//!
//!```
//! # fn main() -> Result<(), docmap_overlay::ast::AstError> {
//! use docmap_overlay::ast;
//!
//! let doc = ast::parse(r#"{"blocks": [{"t": "Para", "c": [{"t": "Str", "text": "hey"}]}]}"#)?;
//! assert_eq!(
//!   ast::to_json(&doc)?,
//!   r#"{"api-version":[1,0],"blocks":[{"t":"Para","c":[{"t":"Str","text":"hey"}]}]}"#,
//! );
//! # Ok(())
//! # }
//!```

use crate::tree::{Document, NodeId, NodeKind, TreeError};

use displaydoc::Display;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Display, Error)]
pub enum AstError {
  /// unknown node kind {0:?} at {1}
  UnknownNodeKind(String, String),
  /// malformed node at {0}: {1}
  MalformedNode(String, &'static str),
  /// {0} cannot be serialized as a node
  Unserializable(NodeId),
  /// json error: {0}
  Json(#[from] serde_json::Error),
  /// tree error: {0}
  Tree(#[from] TreeError),
}

/// A serialized node with its subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AstNode {
  #[serde(flatten)]
  pub kind: NodeKind,
  #[serde(rename = "c", default, skip_serializing_if = "Vec::is_empty")]
  pub children: Vec<AstNode>,
}

impl AstNode {
  pub fn new(kind: NodeKind, children: Vec<AstNode>) -> Self { Self { kind, children } }

  pub fn leaf(kind: NodeKind) -> Self { Self::new(kind, Vec::new()) }

  pub fn str(text: impl Into<String>) -> Self { Self::leaf(NodeKind::Str { text: text.into() }) }

  /// Break `text` into inline nodes: spaces become [`NodeKind::Space`], newlines become
  /// [`NodeKind::SoftBreak`], and everything in between becomes [`NodeKind::Str`].
  ///
  ///```
  /// use docmap_overlay::{ast::AstNode, tree::NodeKind};
  ///
  /// let nodes = AstNode::inlines_from_text("a b");
  /// assert_eq!(nodes, vec![AstNode::str("a"), AstNode::leaf(NodeKind::Space), AstNode::str("b")]);
  ///```
  pub fn inlines_from_text(text: &str) -> Vec<Self> {
    let mut nodes: Vec<Self> = Vec::new();
    let mut run = String::new();
    for c in text.chars() {
      let brk = match c {
        ' ' => NodeKind::Space,
        '\n' => NodeKind::SoftBreak,
        c => {
          run.push(c);
          continue;
        },
      };
      if !run.is_empty() {
        nodes.push(Self::str(std::mem::take(&mut run)));
      }
      nodes.push(Self::leaf(brk));
    }
    if !run.is_empty() {
      nodes.push(Self::str(run));
    }
    nodes
  }
}

fn default_api_version() -> Vec<u32> { vec![1, 0] }

/// The top-level serialized form of a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AstDocument {
  #[serde(rename = "api-version", default = "default_api_version")]
  pub api_version: Vec<u32>,
  /// [`NodeKind::MetaEntry`] nodes.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub meta: Vec<AstNode>,
  #[serde(default)]
  pub blocks: Vec<AstNode>,
}

impl Default for AstDocument {
  fn default() -> Self {
    Self {
      api_version: default_api_version(),
      meta: Vec::new(),
      blocks: Vec::new(),
    }
  }
}

/// Walk the node positions of a raw json document, rejecting any kind tag we don't know.
///
/// Doing this before deserializing gives a precise error instead of serde's generic message for an
/// unmatched internal tag.
fn validate_kinds(value: &Value) -> Result<(), AstError> {
  fn validate_nodes(nodes: Option<&Value>, path: &str) -> Result<(), AstError> {
    let nodes = match nodes {
      None | Some(Value::Null) => return Ok(()),
      Some(Value::Array(nodes)) => nodes,
      Some(_) => return Err(AstError::MalformedNode(path.to_string(), "expected an array")),
    };
    for (i, node) in nodes.iter().enumerate() {
      let path = format!("{}[{}]", path, i);
      let tag = match node.get("t") {
        Some(Value::String(tag)) => tag,
        Some(_) => return Err(AstError::MalformedNode(path, "\"t\" must be a string")),
        None => return Err(AstError::MalformedNode(path, "missing \"t\"")),
      };
      if !NodeKind::NAMES.contains(&tag.as_str()) {
        return Err(AstError::UnknownNodeKind(tag.clone(), path));
      }
      validate_nodes(node.get("c"), &format!("{}.c", path))?;
    }
    Ok(())
  }

  if !value.is_object() {
    return Err(AstError::MalformedNode("$".to_string(), "expected an object"));
  }
  validate_nodes(value.get("meta"), "$.meta")?;
  validate_nodes(value.get("blocks"), "$.blocks")
}

/// Deserialize a document. Empty (or all-whitespace) input produces an empty document.
pub fn parse(json: &str) -> Result<Document, AstError> {
  if json.trim().is_empty() {
    return Ok(Document::new());
  }
  let value: Value = serde_json::from_str(json)?;
  validate_kinds(&value)?;
  let ast: AstDocument = serde_json::from_value(value)?;
  Document::from_ast(&ast)
}

pub fn to_json(doc: &Document) -> Result<String, AstError> {
  Ok(serde_json::to_string(&doc.to_ast()?)?)
}

impl Document {
  pub fn from_ast(ast: &AstDocument) -> Result<Self, AstError> {
    let mut doc = Self::new();
    let (root, meta) = (doc.root(), doc.meta());
    for block in ast.blocks.iter() {
      let id = doc.graft(block)?;
      let index = doc.children(root)?.len();
      doc.insert_children(root, index, &[id])?;
    }
    for entry in ast.meta.iter() {
      let id = doc.graft(entry)?;
      let index = doc.children(meta)?.len();
      doc.insert_children(meta, index, &[id])?;
    }
    Ok(doc)
  }

  /// Copy `node` and its subtree into the arena, returning the detached copy.
  pub fn graft(&mut self, node: &AstNode) -> Result<NodeId, TreeError> {
    let id = self.create(node.kind.clone());
    let children = node
      .children
      .iter()
      .map(|child| self.graft(child))
      .collect::<Result<Vec<_>, _>>()?;
    self.insert_children(id, 0, &children)?;
    Ok(id)
  }

  /// Serialize the subtree rooted at `id`.
  pub fn subtree(&self, id: NodeId) -> Result<AstNode, AstError> {
    let kind = self.kind(id)?;
    if let NodeKind::Document = kind {
      return Err(AstError::Unserializable(id));
    }
    let children = self
      .children(id)?
      .iter()
      .map(|child| self.subtree(*child))
      .collect::<Result<Vec<_>, _>>()?;
    Ok(AstNode::new(kind.clone(), children))
  }

  pub fn to_ast(&self) -> Result<AstDocument, AstError> {
    let collect = |parent: NodeId| -> Result<Vec<AstNode>, AstError> {
      self
        .children(parent)?
        .iter()
        .map(|child| self.subtree(*child))
        .collect()
    };
    Ok(AstDocument {
      api_version: default_api_version(),
      meta: collect(self.meta())?,
      blocks: collect(self.root())?,
    })
  }
}

/// Documents are equal when their reachable trees serialize identically.
impl PartialEq for Document {
  fn eq(&self, other: &Self) -> bool {
    match (self.to_ast(), other.to_ast()) {
      (Ok(a), Ok(b)) => a == b,
      _ => false,
    }
  }
}


#[cfg(test)]
mod test {
  use super::{proptest_strategies::*, *};

  use proptest::prelude::*;

  #[test]
  fn test_empty_input() {
    let doc = parse("  ").unwrap();
    assert!(doc.children(doc.root()).unwrap().is_empty());
    assert_eq!(to_json(&doc).unwrap(), r#"{"api-version":[1,0],"blocks":[]}"#);
  }

  #[test]
  fn test_unknown_kind() {
    let json = r#"{"blocks": [{"t": "Para", "c": [{"t": "Blink", "c": []}]}]}"#;
    match parse(json) {
      Err(AstError::UnknownNodeKind(kind, path)) => {
        assert_eq!(kind, "Blink");
        assert_eq!(path, "$.blocks[0].c[0]");
      },
      r => panic!("unexpected result {:?}", r),
    }
    assert!(matches!(
      parse(r#"{"blocks": [{"c": []}]}"#),
      Err(AstError::MalformedNode(_, "missing \"t\""))
    ));
  }

  #[test]
  fn test_payload_fields() {
    let json = r#"{"meta": [{"t": "MetaEntry", "key": "title", "c": [{"t": "MetaString", "text": "T"}]}],
                  "blocks": [{"t": "Header", "level": 2, "c": [{"t": "Str", "text": "h"}]},
                             {"t": "CodeBlock", "attr": {"classes": ["rust"]}, "text": "fn x() {}"},
                             {"t": "Para", "c": [{"t": "Link", "url": "u", "c": [{"t": "Str", "text": "l"}]}]}]}"#;
    let doc = parse(json).unwrap();
    let blocks = doc.children(doc.root()).unwrap();
    assert_eq!(blocks.len(), 3);
    assert!(matches!(doc.kind(blocks[0]).unwrap(), NodeKind::Header { level: 2, .. }));
    match doc.kind(blocks[1]).unwrap() {
      NodeKind::CodeBlock { attr, text } => {
        assert_eq!(attr.classes, vec!["rust".to_string()]);
        assert_eq!(text, "fn x() {}");
      },
      k => panic!("unexpected kind {:?}", k),
    }
    let entry = doc.children(doc.meta()).unwrap()[0];
    assert_eq!(doc.kind(entry).unwrap(), &NodeKind::MetaEntry {
      key: "title".to_string()
    });

    let reparsed = parse(&to_json(&doc).unwrap()).unwrap();
    assert!(doc == reparsed);
  }

  #[test]
  fn test_subtree_of_root_fails() {
    let doc = Document::new();
    assert!(matches!(doc.subtree(doc.root()), Err(AstError::Unserializable(_))));
  }

  proptest! {
    #[test]
    fn test_round_trip(ast in document()) {
      let json = serde_json::to_string(&ast).unwrap();
      let doc = parse(&json).unwrap();
      let out = to_json(&doc).unwrap();
      let a: Value = serde_json::from_str(&json).unwrap();
      let b: Value = serde_json::from_str(&out).unwrap();
      prop_assert_eq!(a, b);
    }
  }
}
