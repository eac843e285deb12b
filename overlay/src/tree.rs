/*
 * Description: An arena of document tree nodes.
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

//! An arena of document tree nodes.
//!
//! Every node is owned by the [`Document`] arena and addressed by a [`NodeId`]. Nodes record the
//! index of their parent, so removing a node can walk upwards and prune any ancestor which is left
//! empty and has no reason to exist without children (see [`NodeKind::is_useless_when_empty`]).
//! Detached nodes are never freed; they simply become unreachable from the root.
//!
//!```
//! # fn main() -> Result<(), docmap_overlay::tree::TreeError> {
//! use docmap_overlay::tree::*;
//!
//! let mut doc = Document::new();
//! let para = doc.append_child(doc.root(), NodeKind::Para)?;
//! let emph = doc.append_child(para, NodeKind::Emph)?;
//! let word = doc.append_child(emph, NodeKind::Str { text: "hey".to_string() })?;
//!
//! /* Removing the only word also removes the emphasis and the paragraph around it. */
//! assert_eq!(doc.detach_and_prune(word)?, 3);
//! assert!(doc.children(doc.root())?.is_empty());
//! assert!(!doc.is_attached(emph));
//! # Ok(())
//! # }
//!```

use displaydoc::Display;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::borrow::Cow;

/// <node #{0}>
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
  /// {0} does not exist in this document
  NodeNotFound(NodeId),
  /// {0} has no parent to be detached from
  NotAttached(NodeId),
  /// {0} of kind {1} carries no text payload
  NoPayload(NodeId, &'static str),
  /// {0} of kind {1} cannot be split
  NotSplittable(NodeId, &'static str),
  /// offset {1} is not an interior char boundary of {0}
  BadSplitOffset(NodeId, usize),
  /// {0} is still attached to {1}
  AlreadyAttached(NodeId, NodeId),
  /// index {1} is past the end of the children of {0}
  ChildIndexOutOfBounds(NodeId, usize),
}

/// Identifier, classes, and key-value pairs attached to some node kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attr {
  #[serde(default, skip_serializing_if = "String::is_empty")]
  pub id: String,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub classes: Vec<String>,
  #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
  pub attributes: IndexMap<String, String>,
}

impl Attr {
  pub fn is_empty(&self) -> bool {
    self.id.is_empty() && self.classes.is_empty() && self.attributes.is_empty()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuoteType {
  SingleQuote,
  DoubleQuote,
}

fn default_list_start() -> i64 { 1 }

fn default_span() -> u32 { 1 }

fn is_one(n: &u32) -> bool { *n == 1 }

/// The closed set of node kinds a document tree may contain.
///
/// Kinds which carry text keep it inline as a payload; children are kept by the arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum NodeKind {
  /// The root of the block tree. Never serialized as a node.
  #[serde(skip)]
  Document,
  /* Blocks. */
  Para,
  Plain,
  Header {
    level: u8,
    #[serde(default, skip_serializing_if = "Attr::is_empty")]
    attr: Attr,
  },
  BlockQuote,
  Div {
    #[serde(default, skip_serializing_if = "Attr::is_empty")]
    attr: Attr,
  },
  BulletList,
  OrderedList {
    #[serde(default = "default_list_start")]
    start: i64,
  },
  ListItem,
  DefinitionList,
  DefinitionItem,
  Term,
  Definition,
  LineBlock,
  LineItem,
  CodeBlock {
    #[serde(default, skip_serializing_if = "Attr::is_empty")]
    attr: Attr,
    text: String,
  },
  RawBlock {
    format: String,
    text: String,
  },
  HorizontalRule,
  /* Tables. */
  Table {
    #[serde(default, skip_serializing_if = "Attr::is_empty")]
    attr: Attr,
  },
  Caption,
  TableHead,
  TableBody,
  TableFoot,
  TableRow,
  TableCell {
    #[serde(default = "default_span", skip_serializing_if = "is_one")]
    col_span: u32,
    #[serde(default = "default_span", skip_serializing_if = "is_one")]
    row_span: u32,
  },
  /* Inlines. */
  Str {
    text: String,
  },
  Space,
  SoftBreak,
  LineBreak,
  Emph,
  Strong,
  Underline,
  Strikeout,
  Superscript,
  Subscript,
  SmallCaps,
  Quoted {
    quote: QuoteType,
  },
  Cite,
  Code {
    #[serde(default, skip_serializing_if = "Attr::is_empty")]
    attr: Attr,
    text: String,
  },
  Math {
    #[serde(default)]
    display: bool,
    text: String,
  },
  RawInline {
    format: String,
    text: String,
  },
  Link {
    #[serde(default, skip_serializing_if = "Attr::is_empty")]
    attr: Attr,
    url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    title: String,
  },
  Image {
    #[serde(default, skip_serializing_if = "Attr::is_empty")]
    attr: Attr,
    url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    title: String,
  },
  Note,
  Span {
    #[serde(default, skip_serializing_if = "Attr::is_empty")]
    attr: Attr,
  },
  /* Metadata. */
  MetaMap,
  MetaEntry {
    key: String,
  },
  MetaList,
  MetaInlines,
  MetaBlocks,
  MetaString {
    text: String,
  },
  MetaBool {
    value: bool,
  },
}

impl NodeKind {
  /// The tag of every kind which may appear in a serialized document.
  pub const NAMES: &'static [&'static str] = &[
    "Para",
    "Plain",
    "Header",
    "BlockQuote",
    "Div",
    "BulletList",
    "OrderedList",
    "ListItem",
    "DefinitionList",
    "DefinitionItem",
    "Term",
    "Definition",
    "LineBlock",
    "LineItem",
    "CodeBlock",
    "RawBlock",
    "HorizontalRule",
    "Table",
    "Caption",
    "TableHead",
    "TableBody",
    "TableFoot",
    "TableRow",
    "TableCell",
    "Str",
    "Space",
    "SoftBreak",
    "LineBreak",
    "Emph",
    "Strong",
    "Underline",
    "Strikeout",
    "Superscript",
    "Subscript",
    "SmallCaps",
    "Quoted",
    "Cite",
    "Code",
    "Math",
    "RawInline",
    "Link",
    "Image",
    "Note",
    "Span",
    "MetaMap",
    "MetaEntry",
    "MetaList",
    "MetaInlines",
    "MetaBlocks",
    "MetaString",
    "MetaBool",
  ];

  pub fn name(&self) -> &'static str {
    match self {
      Self::Document => "Document",
      Self::Para => "Para",
      Self::Plain => "Plain",
      Self::Header { .. } => "Header",
      Self::BlockQuote => "BlockQuote",
      Self::Div { .. } => "Div",
      Self::BulletList => "BulletList",
      Self::OrderedList { .. } => "OrderedList",
      Self::ListItem => "ListItem",
      Self::DefinitionList => "DefinitionList",
      Self::DefinitionItem => "DefinitionItem",
      Self::Term => "Term",
      Self::Definition => "Definition",
      Self::LineBlock => "LineBlock",
      Self::LineItem => "LineItem",
      Self::CodeBlock { .. } => "CodeBlock",
      Self::RawBlock { .. } => "RawBlock",
      Self::HorizontalRule => "HorizontalRule",
      Self::Table { .. } => "Table",
      Self::Caption => "Caption",
      Self::TableHead => "TableHead",
      Self::TableBody => "TableBody",
      Self::TableFoot => "TableFoot",
      Self::TableRow => "TableRow",
      Self::TableCell { .. } => "TableCell",
      Self::Str { .. } => "Str",
      Self::Space => "Space",
      Self::SoftBreak => "SoftBreak",
      Self::LineBreak => "LineBreak",
      Self::Emph => "Emph",
      Self::Strong => "Strong",
      Self::Underline => "Underline",
      Self::Strikeout => "Strikeout",
      Self::Superscript => "Superscript",
      Self::Subscript => "Subscript",
      Self::SmallCaps => "SmallCaps",
      Self::Quoted { .. } => "Quoted",
      Self::Cite => "Cite",
      Self::Code { .. } => "Code",
      Self::Math { .. } => "Math",
      Self::RawInline { .. } => "RawInline",
      Self::Link { .. } => "Link",
      Self::Image { .. } => "Image",
      Self::Note => "Note",
      Self::Span { .. } => "Span",
      Self::MetaMap => "MetaMap",
      Self::MetaEntry { .. } => "MetaEntry",
      Self::MetaList => "MetaList",
      Self::MetaInlines => "MetaInlines",
      Self::MetaBlocks => "MetaBlocks",
      Self::MetaString { .. } => "MetaString",
      Self::MetaBool { .. } => "MetaBool",
    }
  }

  /// Whether a node of this kind should be removed once its last child is removed.
  ///
  /// Table structure, images, metadata containers and the root keep their shape even when empty.
  pub fn is_useless_when_empty(&self) -> bool {
    matches!(
      self,
      Self::Para
        | Self::Plain
        | Self::Header { .. }
        | Self::BlockQuote
        | Self::Div { .. }
        | Self::BulletList
        | Self::OrderedList { .. }
        | Self::ListItem
        | Self::DefinitionList
        | Self::DefinitionItem
        | Self::Definition
        | Self::LineBlock
        | Self::LineItem
        | Self::Emph
        | Self::Strong
        | Self::Underline
        | Self::Strikeout
        | Self::Superscript
        | Self::Subscript
        | Self::SmallCaps
        | Self::Quoted { .. }
        | Self::Cite
        | Self::Span { .. }
        | Self::Link { .. }
        | Self::Note
    )
  }

  /// Whether children of a node of this kind are inlines.
  pub fn holds_inlines(&self) -> bool {
    matches!(
      self,
      Self::Para
        | Self::Plain
        | Self::Header { .. }
        | Self::Term
        | Self::LineItem
        | Self::Emph
        | Self::Strong
        | Self::Underline
        | Self::Strikeout
        | Self::Superscript
        | Self::Subscript
        | Self::SmallCaps
        | Self::Quoted { .. }
        | Self::Cite
        | Self::Link { .. }
        | Self::Image { .. }
        | Self::Span { .. }
        | Self::MetaInlines
    )
  }

  pub fn is_inline(&self) -> bool {
    matches!(
      self,
      Self::Str { .. }
        | Self::Space
        | Self::SoftBreak
        | Self::LineBreak
        | Self::Emph
        | Self::Strong
        | Self::Underline
        | Self::Strikeout
        | Self::Superscript
        | Self::Subscript
        | Self::SmallCaps
        | Self::Quoted { .. }
        | Self::Cite
        | Self::Code { .. }
        | Self::Math { .. }
        | Self::RawInline { .. }
        | Self::Link { .. }
        | Self::Image { .. }
        | Self::Note
        | Self::Span { .. }
    )
  }

  /// The text payload carried by this kind, if any.
  pub fn payload(&self) -> Option<&str> {
    match self {
      Self::Str { text }
      | Self::MetaString { text }
      | Self::Code { text, .. }
      | Self::Math { text, .. }
      | Self::CodeBlock { text, .. }
      | Self::RawBlock { text, .. }
      | Self::RawInline { text, .. } => Some(text),
      _ => None,
    }
  }

  pub fn payload_mut(&mut self) -> Option<&mut String> {
    match self {
      Self::Str { text }
      | Self::MetaString { text }
      | Self::Code { text, .. }
      | Self::Math { text, .. }
      | Self::CodeBlock { text, .. }
      | Self::RawBlock { text, .. }
      | Self::RawInline { text, .. } => Some(text),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
  kind: NodeKind,
  parent: Option<NodeId>,
  children: Vec<NodeId>,
}

impl Node {
  fn new(kind: NodeKind) -> Self {
    Self {
      kind,
      parent: None,
      children: Vec::new(),
    }
  }

  pub fn kind(&self) -> &NodeKind { &self.kind }

  pub fn parent(&self) -> Option<NodeId> { self.parent }

  pub fn children(&self) -> &[NodeId] { &self.children }
}

/// A document tree: a block tree under [`Self::root`] and a metadata tree under [`Self::meta`].
#[derive(Debug, Clone)]
pub struct Document {
  nodes: Vec<Node>,
  root: NodeId,
  meta: NodeId,
}

impl Default for Document {
  fn default() -> Self { Self::new() }
}

impl Document {
  pub fn new() -> Self {
    Self {
      nodes: vec![Node::new(NodeKind::Document), Node::new(NodeKind::MetaMap)],
      root: NodeId(0),
      meta: NodeId(1),
    }
  }

  pub fn root(&self) -> NodeId { self.root }

  pub fn meta(&self) -> NodeId { self.meta }

  /// The number of nodes ever allocated, attached or not.
  pub fn arena_len(&self) -> usize { self.nodes.len() }

  pub fn get(&self, id: NodeId) -> Result<&Node, TreeError> {
    self.nodes.get(id.0).ok_or(TreeError::NodeNotFound(id))
  }

  fn get_mut(&mut self, id: NodeId) -> Result<&mut Node, TreeError> {
    self.nodes.get_mut(id.0).ok_or(TreeError::NodeNotFound(id))
  }

  pub fn kind(&self, id: NodeId) -> Result<&NodeKind, TreeError> { Ok(&self.get(id)?.kind) }

  pub fn kind_mut(&mut self, id: NodeId) -> Result<&mut NodeKind, TreeError> {
    Ok(&mut self.get_mut(id)?.kind)
  }

  pub fn children(&self, id: NodeId) -> Result<&[NodeId], TreeError> {
    Ok(&self.get(id)?.children)
  }

  pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>, TreeError> {
    Ok(self.get(id)?.parent)
  }

  /// Allocate a detached node.
  pub fn create(&mut self, kind: NodeKind) -> NodeId {
    let id = NodeId(self.nodes.len());
    self.nodes.push(Node::new(kind));
    id
  }

  pub fn append_child(&mut self, parent: NodeId, kind: NodeKind) -> Result<NodeId, TreeError> {
    let index = self.children(parent)?.len();
    let child = self.create(kind);
    self.insert_children(parent, index, &[child])?;
    Ok(child)
  }

  /// Attach the detached nodes `new_children` under `parent`, starting at `index`.
  pub fn insert_children(
    &mut self,
    parent: NodeId,
    index: usize,
    new_children: &[NodeId],
  ) -> Result<(), TreeError> {
    if index > self.children(parent)?.len() {
      return Err(TreeError::ChildIndexOutOfBounds(parent, index));
    }
    for child in new_children.iter() {
      if let Some(existing) = self.parent(*child)? {
        return Err(TreeError::AlreadyAttached(*child, existing));
      }
    }
    for child in new_children.iter() {
      self.get_mut(*child)?.parent = Some(parent);
    }
    let children = &mut self.get_mut(parent)?.children;
    children.splice(index..index, new_children.iter().copied());
    Ok(())
  }

  /// Locate `id` within its parent's children.
  pub fn position(&self, id: NodeId) -> Result<(NodeId, usize), TreeError> {
    let parent = self.parent(id)?.ok_or(TreeError::NotAttached(id))?;
    let index = self
      .children(parent)?
      .iter()
      .position(|child| *child == id)
      .ok_or(TreeError::NotAttached(id))?;
    Ok((parent, index))
  }

  /// Remove `id` from its parent's children, returning the former parent.
  pub fn detach(&mut self, id: NodeId) -> Result<NodeId, TreeError> {
    let (parent, index) = self.position(id)?;
    self.get_mut(parent)?.children.remove(index);
    self.get_mut(id)?.parent = None;
    Ok(parent)
  }

  /// Detach `id`, then detach every ancestor left empty whose kind is useless when empty.
  ///
  /// Returns the number of nodes detached.
  pub fn detach_and_prune(&mut self, id: NodeId) -> Result<usize, TreeError> {
    let mut parent = self.detach(id)?;
    let mut detached: usize = 1;
    loop {
      let node = self.get(parent)?;
      if !node.children.is_empty() || !node.kind.is_useless_when_empty() || node.parent.is_none()
      {
        break;
      }
      parent = self.detach(parent)?;
      detached += 1;
    }
    log::trace!("detached {} nodes starting from {}", detached, id);
    Ok(detached)
  }

  /// Whether `id` is reachable from the root or from the metadata tree.
  pub fn is_attached(&self, id: NodeId) -> bool {
    let mut cur = id;
    loop {
      if cur == self.root || cur == self.meta {
        return true;
      }
      match self.parent(cur) {
        Ok(Some(parent)) => cur = parent,
        _ => return false,
      }
    }
  }

  /// Replace `id` in its parent by its own children.
  pub fn unwrap_node(&mut self, id: NodeId) -> Result<(), TreeError> {
    let (parent, index) = self.position(id)?;
    let children = std::mem::take(&mut self.get_mut(id)?.children);
    for child in children.iter() {
      self.get_mut(*child)?.parent = None;
    }
    self.detach(id)?;
    self.insert_children(parent, index, &children)
  }

  /// The text payload of `id`, if its kind carries one.
  pub fn payload(&self, id: NodeId) -> Result<Option<&str>, TreeError> {
    Ok(self.kind(id)?.payload())
  }

  pub fn payload_mut(&mut self, id: NodeId) -> Result<&mut String, TreeError> {
    let kind = &mut self.get_mut(id)?.kind;
    let name = kind.name();
    kind.payload_mut().ok_or(TreeError::NoPayload(id, name))
  }

  /// The text of `id` as it appears in flattened text, if it contributes any of its own.
  pub fn unit_text(&self, id: NodeId) -> Result<Option<Cow<'_, str>>, TreeError> {
    Ok(match self.kind(id)? {
      NodeKind::Space | NodeKind::SoftBreak => Some(Cow::Borrowed(" ")),
      NodeKind::LineBreak => Some(Cow::Borrowed("\n")),
      NodeKind::Str { text }
      | NodeKind::MetaString { text }
      | NodeKind::Code { text, .. }
      | NodeKind::Math { text, .. }
      | NodeKind::CodeBlock { text, .. } => Some(Cow::Borrowed(text)),
      _ => None,
    })
  }

  /// Split the `Str` node `id` at byte offset `at`, so that `id` keeps the text before `at` and a
  /// new sibling inserted directly after it receives the rest.
  pub fn split_text(&mut self, id: NodeId, at: usize) -> Result<NodeId, TreeError> {
    let text = match self.kind(id)? {
      NodeKind::Str { text } => text,
      kind => return Err(TreeError::NotSplittable(id, kind.name())),
    };
    if at == 0 || at >= text.len() || !text.is_char_boundary(at) {
      return Err(TreeError::BadSplitOffset(id, at));
    }
    let suffix = text[at..].to_string();
    let (parent, index) = self.position(id)?;
    self.payload_mut(id)?.truncate(at);
    let right = self.create(NodeKind::Str { text: suffix });
    self.insert_children(parent, index + 1, &[right])?;
    Ok(right)
  }

  /// Iterate over `id` and all of its descendants in document order.
  pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
    Descendants {
      doc: self,
      stack: vec![id],
    }
  }
}

/// Pre-order iterator over a subtree.
pub struct Descendants<'d> {
  doc: &'d Document,
  stack: Vec<NodeId>,
}

impl<'d> Iterator for Descendants<'d> {
  type Item = NodeId;

  fn next(&mut self) -> Option<NodeId> {
    let id = self.stack.pop()?;
    if let Ok(children) = self.doc.children(id) {
      self.stack.extend(children.iter().rev());
    }
    Some(id)
  }
}

#[cfg(test)]
mod test {
  use super::*;

  fn word(text: &str) -> NodeKind {
    NodeKind::Str {
      text: text.to_string(),
    }
  }

  #[test]
  fn test_prune_stops_at_structural_kinds() {
    let mut doc = Document::new();
    let table = doc
      .append_child(doc.root(), NodeKind::Table {
        attr: Attr::default(),
      })
      .unwrap();
    let body = doc.append_child(table, NodeKind::TableBody).unwrap();
    let row = doc.append_child(body, NodeKind::TableRow).unwrap();
    let cell = doc
      .append_child(row, NodeKind::TableCell {
        col_span: 1,
        row_span: 1,
      })
      .unwrap();
    let para = doc.append_child(cell, NodeKind::Plain).unwrap();
    let a = doc.append_child(para, word("a")).unwrap();

    assert_eq!(doc.detach_and_prune(a).unwrap(), 2);
    assert!(doc.is_attached(cell));
    assert!(!doc.is_attached(para));
    assert!(doc.children(cell).unwrap().is_empty());
  }

  #[test]
  fn test_prune_stops_at_non_empty_parent() {
    let mut doc = Document::new();
    let para = doc.append_child(doc.root(), NodeKind::Para).unwrap();
    let emph = doc.append_child(para, NodeKind::Emph).unwrap();
    let a = doc.append_child(emph, word("a")).unwrap();
    let b = doc.append_child(para, word("b")).unwrap();

    assert_eq!(doc.detach_and_prune(a).unwrap(), 2);
    assert_eq!(doc.children(para).unwrap(), &[b]);
    assert!(doc.is_attached(b));
    assert_eq!(doc.detach(a), Err(TreeError::NotAttached(a)));
  }

  #[test]
  fn test_split_text() {
    let mut doc = Document::new();
    let para = doc.append_child(doc.root(), NodeKind::Para).unwrap();
    let a = doc.append_child(para, word("héllo")).unwrap();

    assert_eq!(doc.split_text(a, 2), Err(TreeError::BadSplitOffset(a, 2)));
    assert_eq!(doc.split_text(a, 0), Err(TreeError::BadSplitOffset(a, 0)));
    let right = doc.split_text(a, 3).unwrap();
    assert_eq!(doc.children(para).unwrap(), &[a, right]);
    assert_eq!(doc.payload(a).unwrap(), Some("hé"));
    assert_eq!(doc.payload(right).unwrap(), Some("llo"));

    let space = doc.append_child(para, NodeKind::Space).unwrap();
    assert_eq!(
      doc.split_text(space, 1),
      Err(TreeError::NotSplittable(space, "Space"))
    );
  }

  #[test]
  fn test_unwrap_and_descendants() {
    let mut doc = Document::new();
    let para = doc.append_child(doc.root(), NodeKind::Para).unwrap();
    let span = doc
      .append_child(para, NodeKind::Span {
        attr: Attr::default(),
      })
      .unwrap();
    let a = doc.append_child(span, word("a")).unwrap();
    let b = doc.append_child(span, word("b")).unwrap();
    let c = doc.append_child(para, word("c")).unwrap();

    let order: Vec<NodeId> = doc.descendants(doc.root()).collect();
    assert_eq!(order, vec![doc.root(), para, span, a, b, c]);

    doc.unwrap_node(span).unwrap();
    assert_eq!(doc.children(para).unwrap(), &[a, b, c]);
    assert_eq!(doc.parent(a).unwrap(), Some(para));
    assert!(!doc.is_attached(span));
  }

  #[test]
  fn test_insert_rejects_attached_nodes() {
    let mut doc = Document::new();
    let para = doc.append_child(doc.root(), NodeKind::Para).unwrap();
    let a = doc.append_child(para, word("a")).unwrap();
    assert_eq!(
      doc.insert_children(para, 0, &[a]),
      Err(TreeError::AlreadyAttached(a, para))
    );
    let b = doc.create(word("b"));
    assert_eq!(
      doc.insert_children(para, 5, &[b]),
      Err(TreeError::ChildIndexOutOfBounds(para, 5))
    );
    doc.insert_children(para, 0, &[b]).unwrap();
    assert_eq!(doc.children(para).unwrap(), &[b, a]);
  }
}
