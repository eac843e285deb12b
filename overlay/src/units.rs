/*
 * Description: Editable views of the text contributed by individual nodes.
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

//! Editable views of the text contributed by individual nodes.
//!
//! A [`Unit`] is the smallest piece of flattened text: the payload of one tree node, or a synthetic
//! [`Boundary`] the [sequencer](crate::sequencer) inserts between unrelated regions. A
//! [`TextUnit`] is either a whole unit or a [`SlicedUnit`] covering part of one.
//!
//! Units never own their node. They keep its [`NodeId`] along with a snapshot of its text, and
//! every edit first checks that the node still carries that text, failing with
//! [`UnitError::Stale`] otherwise.

use crate::{
  error::RangeError,
  tree::{Document, NodeId, NodeKind, TreeError},
};

use displaydoc::Display;
use thiserror::Error;

use std::{ops::Range, rc::Rc};

/// Separates consecutive paragraphs in flattened text.
pub const PARAGRAPH_BREAK: &str = "\n";
/// ZERO WIDTH NON-JOINER: keeps unrelated regions from appearing adjacent in flattened text.
pub const LINKAGE_BREAK: &str = "\u{200C}";

#[derive(Debug, Display, Copy, Clone, PartialEq, Eq)]
pub enum Op {
  /// delete
  Delete,
  /// delete completely
  DeleteCompletely,
  /// replace
  Replace,
  /// replace completely
  ReplaceCompletely,
  /// insert
  Insert,
}

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum UnitError {
  /// {unit} does not support the {op} operation
  UnsupportedOperation { op: Op, unit: &'static str },
  /// {0}
  Range(#[from] RangeError),
  /// {0} no longer carries the text this unit was read from
  Stale(NodeId),
  /// {0}
  Tree(#[from] TreeError),
}

/// Which edits a unit supports.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
  pub delete: bool,
  pub delete_completely: bool,
  pub replace: bool,
  pub replace_completely: bool,
  pub insert: bool,
}

impl Capabilities {
  pub const NONE: Self = Self {
    delete: false,
    delete_completely: false,
    replace: false,
    replace_completely: false,
    insert: false,
  };

  pub const ALL: Self = Self {
    delete: true,
    delete_completely: true,
    replace: true,
    replace_completely: true,
    insert: true,
  };

  pub fn supports(&self, op: Op) -> bool {
    match op {
      Op::Delete => self.delete,
      Op::DeleteCompletely => self.delete_completely,
      Op::Replace => self.replace,
      Op::ReplaceCompletely => self.replace_completely,
      Op::Insert => self.insert,
    }
  }
}

/// How a node's payload may be edited.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Access {
  /// The payload is edited in place.
  Spliced,
  /// The payload is only ever replaced as a whole; partial edits are spliced into a copy first.
  Whole,
  /// The text is implied by the kind and can only be removed along with the node.
  Fixed,
}

impl Access {
  pub fn of(kind: &NodeKind) -> Option<Self> {
    match kind {
      NodeKind::Str { .. } | NodeKind::MetaString { .. } => Some(Self::Spliced),
      NodeKind::Code { .. } | NodeKind::Math { .. } | NodeKind::CodeBlock { .. } => {
        Some(Self::Whole)
      },
      NodeKind::Space | NodeKind::SoftBreak | NodeKind::LineBreak => Some(Self::Fixed),
      _ => None,
    }
  }

  pub fn capabilities(&self) -> Capabilities {
    match self {
      Self::Spliced | Self::Whole => Capabilities::ALL,
      Self::Fixed => Capabilities {
        delete_completely: true,
        ..Capabilities::NONE
      },
    }
  }
}

#[derive(Debug, Display, Copy, Clone, PartialEq, Eq)]
pub enum Boundary {
  /// paragraph break
  Paragraph,
  /// linkage break
  Linkage,
}

impl Boundary {
  pub fn text(&self) -> &'static str {
    match self {
      Self::Paragraph => PARAGRAPH_BREAK,
      Self::Linkage => LINKAGE_BREAK,
    }
  }
}

/// The text of one node, as read during a traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeText {
  pub node: NodeId,
  pub kind: &'static str,
  pub access: Access,
  pub text: Rc<str>,
}

impl NodeText {
  /// Read the text `id` contributes, if its kind contributes any.
  pub fn read(doc: &Document, id: NodeId) -> Result<Option<Self>, TreeError> {
    let kind = doc.kind(id)?;
    let access = match Access::of(kind) {
      Some(access) => access,
      None => return Ok(None),
    };
    let text = match doc.unit_text(id)? {
      Some(text) => text,
      None => return Ok(None),
    };
    Ok(Some(Self {
      node: id,
      kind: kind.name(),
      access,
      text: Rc::from(text.as_ref()),
    }))
  }

  fn check_fresh(&self, doc: &Document) -> Result<(), UnitError> {
    let current = doc.unit_text(self.node)?;
    if !doc.is_attached(self.node) || current.as_deref() != Some(&*self.text) {
      return Err(UnitError::Stale(self.node));
    }
    Ok(())
  }

  fn set_payload(&self, doc: &mut Document, text: String) -> Result<(), UnitError> {
    *doc.payload_mut(self.node)? = text;
    Ok(())
  }

  fn splice(&self, doc: &mut Document, range: Range<usize>, new: &str) -> Result<(), UnitError> {
    match self.access {
      Access::Spliced => {
        doc.payload_mut(self.node)?.replace_range(range, new);
        Ok(())
      },
      Access::Whole => {
        let mut spliced = self.text.to_string();
        spliced.replace_range(range, new);
        self.set_payload(doc, spliced)
      },
      Access::Fixed => Err(UnitError::UnsupportedOperation {
        op: Op::Replace,
        unit: self.kind,
      }),
    }
  }
}

/// A contiguous piece of flattened text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
  Node(NodeText),
  Boundary(Boundary),
  /// Text with no backing node, as produced by sequencing a plain string.
  Literal(Rc<str>),
}

impl Unit {
  pub fn text(&self) -> &str {
    match self {
      Self::Node(nt) => &nt.text,
      Self::Boundary(b) => b.text(),
      Self::Literal(s) => s,
    }
  }

  pub fn text_len(&self) -> usize { self.text().len() }

  pub fn node(&self) -> Option<NodeId> {
    match self {
      Self::Node(nt) => Some(nt.node),
      _ => None,
    }
  }

  pub fn is_synthetic(&self) -> bool { self.node().is_none() }

  pub fn capabilities(&self) -> Capabilities {
    match self {
      Self::Node(nt) => nt.access.capabilities(),
      Self::Boundary(_) | Self::Literal(_) => Capabilities::NONE,
    }
  }

  fn describe(&self) -> &'static str {
    match self {
      Self::Node(nt) => nt.kind,
      Self::Boundary(Boundary::Paragraph) => "paragraph break",
      Self::Boundary(Boundary::Linkage) => "linkage break",
      Self::Literal(_) => "literal",
    }
  }

  fn check_range(&self, start: usize, len: usize) -> Result<(), RangeError> {
    RangeError::check(start, len, 0..self.text_len(), true)?;
    RangeError::check_char_boundaries(self.text(), 0, start, len)
  }

  /// Check that `op` may be applied over `[start, start+len)` right now.
  pub fn validate(
    &self,
    doc: &Document,
    op: Op,
    start: usize,
    len: usize,
  ) -> Result<(), UnitError> {
    if !self.capabilities().supports(op) {
      return Err(UnitError::UnsupportedOperation {
        op,
        unit: self.describe(),
      });
    }
    self.check_range(start, len)?;
    match self {
      Self::Node(nt) => nt.check_fresh(doc),
      _ => Ok(()),
    }
  }

  fn node_text(&self, op: Op) -> Result<&NodeText, UnitError> {
    match self {
      Self::Node(nt) => Ok(nt),
      _ => Err(UnitError::UnsupportedOperation {
        op,
        unit: self.describe(),
      }),
    }
  }

  pub fn delete_text(&self, doc: &mut Document, start: usize, end: usize) -> Result<(), UnitError> {
    let len = end
      .checked_sub(start)
      .ok_or_else(|| RangeError::new(start, 0, 0..self.text_len(), "range end precedes start"))?;
    self.validate(doc, Op::Delete, start, len)?;
    self.node_text(Op::Delete)?.splice(doc, start..end, "")
  }

  /// Detach the backing node, pruning any ancestors left useless. Returns the number of nodes
  /// detached.
  pub fn delete_text_completely(&self, doc: &mut Document) -> Result<usize, UnitError> {
    self.validate(doc, Op::DeleteCompletely, 0, self.text_len())?;
    Ok(doc.detach_and_prune(self.node_text(Op::DeleteCompletely)?.node)?)
  }

  pub fn replace_text(
    &self,
    doc: &mut Document,
    start: usize,
    end: usize,
    new: &str,
  ) -> Result<(), UnitError> {
    let len = end
      .checked_sub(start)
      .ok_or_else(|| RangeError::new(start, 0, 0..self.text_len(), "range end precedes start"))?;
    self.validate(doc, Op::Replace, start, len)?;
    self.node_text(Op::Replace)?.splice(doc, start..end, new)
  }

  pub fn replace_text_completely(&self, doc: &mut Document, new: &str) -> Result<(), UnitError> {
    self.validate(doc, Op::ReplaceCompletely, 0, self.text_len())?;
    self.node_text(Op::ReplaceCompletely)?.set_payload(doc, new.to_string())
  }

  pub fn insert_text(&self, doc: &mut Document, at: usize, new: &str) -> Result<(), UnitError> {
    self.validate(doc, Op::Insert, at, 0)?;
    self.node_text(Op::Insert)?.splice(doc, at..at, new)
  }
}

/// A view over `[start, start+len)` of a [`Unit`], never covering all of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlicedUnit {
  adapted: Unit,
  start: usize,
  len: usize,
}

impl SlicedUnit {
  pub fn adapted(&self) -> &Unit { &self.adapted }

  pub fn start(&self) -> usize { self.start }

  pub fn text(&self) -> &str { &self.adapted.text()[self.start..(self.start + self.len)] }

  pub fn text_len(&self) -> usize { self.len }

  fn end(&self) -> usize { self.start + self.len }

  /// Partial edits of the adapted unit stand in for whole edits of the slice.
  pub fn capabilities(&self) -> Capabilities {
    let Capabilities {
      delete,
      replace,
      insert,
      ..
    } = self.adapted.capabilities();
    Capabilities {
      delete,
      delete_completely: delete,
      replace,
      replace_completely: replace,
      insert,
    }
  }

  fn lower(&self, op: Op, start: usize, len: usize) -> (Op, usize, usize) {
    match op {
      Op::DeleteCompletely => (Op::Delete, self.start, self.len),
      Op::ReplaceCompletely => (Op::Replace, self.start, self.len),
      op => (op, self.start + start, len),
    }
  }

  pub fn validate(
    &self,
    doc: &Document,
    op: Op,
    start: usize,
    len: usize,
  ) -> Result<(), UnitError> {
    RangeError::check(start, len, 0..self.len, true)?;
    let (op, start, len) = self.lower(op, start, len);
    self.adapted.validate(doc, op, start, len)
  }

  pub fn delete_text(&self, doc: &mut Document, start: usize, end: usize) -> Result<(), UnitError> {
    RangeError::check(start, end.saturating_sub(start), 0..self.len, true)?;
    self
      .adapted
      .delete_text(doc, self.start + start, self.start + end)
  }

  /// Delete the covered range from the adapted unit. Never detaches anything, so returns 0.
  pub fn delete_text_completely(&self, doc: &mut Document) -> Result<usize, UnitError> {
    self.adapted.delete_text(doc, self.start, self.end())?;
    Ok(0)
  }

  pub fn replace_text(
    &self,
    doc: &mut Document,
    start: usize,
    end: usize,
    new: &str,
  ) -> Result<(), UnitError> {
    RangeError::check(start, end.saturating_sub(start), 0..self.len, true)?;
    self
      .adapted
      .replace_text(doc, self.start + start, self.start + end, new)
  }

  pub fn replace_text_completely(&self, doc: &mut Document, new: &str) -> Result<(), UnitError> {
    self
      .adapted
      .replace_text(doc, self.start, self.end(), new)
  }

  pub fn insert_text(&self, doc: &mut Document, at: usize, new: &str) -> Result<(), UnitError> {
    RangeError::check(at, 0, 0..self.len, true)?;
    self.adapted.insert_text(doc, self.start + at, new)
  }
}

/// Either a whole [`Unit`] or a slice of one.
///
///```
/// use docmap_overlay::units::*;
///
/// let unit = TextUnit::Whole(Unit::Literal("hello".into()));
/// let slice = unit.slice(1, 3).unwrap();
/// assert_eq!(slice.text(), "ell");
/// /* Offsets compose onto the concrete unit. */
/// let inner = slice.slice(1, 1).unwrap();
/// assert_eq!(inner.text(), "l");
/// assert!(matches!(inner, TextUnit::Slice(ref s) if s.start() == 2));
/// /* Covering the whole unit gives back the unit. */
/// assert!(matches!(unit.slice(0, 5).unwrap(), TextUnit::Whole(_)));
///```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextUnit {
  Whole(Unit),
  Slice(SlicedUnit),
}

impl From<Unit> for TextUnit {
  fn from(unit: Unit) -> Self { Self::Whole(unit) }
}

impl TextUnit {
  /// The concrete unit this refers to.
  pub fn unit(&self) -> &Unit {
    match self {
      Self::Whole(u) => u,
      Self::Slice(s) => &s.adapted,
    }
  }

  pub fn text(&self) -> &str {
    match self {
      Self::Whole(u) => u.text(),
      Self::Slice(s) => s.text(),
    }
  }

  pub fn text_len(&self) -> usize {
    match self {
      Self::Whole(u) => u.text_len(),
      Self::Slice(s) => s.text_len(),
    }
  }

  pub fn node(&self) -> Option<NodeId> { self.unit().node() }

  pub fn is_synthetic(&self) -> bool { self.unit().is_synthetic() }

  pub fn capabilities(&self) -> Capabilities {
    match self {
      Self::Whole(u) => u.capabilities(),
      Self::Slice(s) => s.capabilities(),
    }
  }

  /// Offset of this view within the concrete unit.
  pub fn offset(&self) -> usize {
    match self {
      Self::Whole(_) => 0,
      Self::Slice(s) => s.start,
    }
  }

  /// View `[start, start+len)` of this unit's text.
  pub fn slice(&self, start: usize, len: usize) -> Result<Self, RangeError> {
    RangeError::check(start, len, 0..self.text_len(), false)?;
    let (adapted, start) = match self {
      Self::Whole(u) => (u, start),
      Self::Slice(s) => (&s.adapted, s.start + start),
    };
    RangeError::check_char_boundaries(adapted.text(), 0, start, len)?;
    if start == 0 && len == adapted.text_len() {
      return Ok(Self::Whole(adapted.clone()));
    }
    Ok(Self::Slice(SlicedUnit {
      adapted: adapted.clone(),
      start,
      len,
    }))
  }

  pub fn validate(
    &self,
    doc: &Document,
    op: Op,
    start: usize,
    len: usize,
  ) -> Result<(), UnitError> {
    match self {
      Self::Whole(u) => u.validate(doc, op, start, len),
      Self::Slice(s) => s.validate(doc, op, start, len),
    }
  }

  pub fn delete_text(&self, doc: &mut Document, start: usize, end: usize) -> Result<(), UnitError> {
    match self {
      Self::Whole(u) => u.delete_text(doc, start, end),
      Self::Slice(s) => s.delete_text(doc, start, end),
    }
  }

  pub fn delete_text_completely(&self, doc: &mut Document) -> Result<usize, UnitError> {
    match self {
      Self::Whole(u) => u.delete_text_completely(doc),
      Self::Slice(s) => s.delete_text_completely(doc),
    }
  }

  pub fn replace_text(
    &self,
    doc: &mut Document,
    start: usize,
    end: usize,
    new: &str,
  ) -> Result<(), UnitError> {
    match self {
      Self::Whole(u) => u.replace_text(doc, start, end, new),
      Self::Slice(s) => s.replace_text(doc, start, end, new),
    }
  }

  pub fn replace_text_completely(&self, doc: &mut Document, new: &str) -> Result<(), UnitError> {
    match self {
      Self::Whole(u) => u.replace_text_completely(doc, new),
      Self::Slice(s) => s.replace_text_completely(doc, new),
    }
  }

  pub fn insert_text(&self, doc: &mut Document, at: usize, new: &str) -> Result<(), UnitError> {
    match self {
      Self::Whole(u) => u.insert_text(doc, at, new),
      Self::Slice(s) => s.insert_text(doc, at, new),
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::tree::Attr;

  fn doc_with(kinds: Vec<NodeKind>) -> (Document, Vec<NodeId>) {
    let mut doc = Document::new();
    let para = doc.append_child(doc.root(), NodeKind::Para).unwrap();
    let ids = kinds
      .into_iter()
      .map(|k| doc.append_child(para, k).unwrap())
      .collect();
    (doc, ids)
  }

  fn unit(doc: &Document, id: NodeId) -> Unit { Unit::Node(NodeText::read(doc, id).unwrap().unwrap()) }

  #[test]
  fn test_spliced_edits() {
    let (mut doc, ids) = doc_with(vec![NodeKind::Str {
      text: "hello".to_string(),
    }]);
    unit(&doc, ids[0]).delete_text(&mut doc, 1, 3).unwrap();
    assert_eq!(doc.payload(ids[0]).unwrap(), Some("hlo"));
    unit(&doc, ids[0]).insert_text(&mut doc, 3, "!").unwrap();
    assert_eq!(doc.payload(ids[0]).unwrap(), Some("hlo!"));
    unit(&doc, ids[0])
      .replace_text(&mut doc, 0, 1, "HH")
      .unwrap();
    assert_eq!(doc.payload(ids[0]).unwrap(), Some("HHlo!"));
    assert!(matches!(
      unit(&doc, ids[0]).delete_text(&mut doc, 3, 9),
      Err(UnitError::Range(_))
    ));
  }

  #[test]
  fn test_whole_payload_derived_edits() {
    let (mut doc, ids) = doc_with(vec![NodeKind::Code {
      attr: Attr::default(),
      text: "let  x".to_string(),
    }]);
    let u = unit(&doc, ids[0]);
    assert_eq!(u.capabilities(), Capabilities::ALL);
    u.delete_text(&mut doc, 3, 4).unwrap();
    assert_eq!(doc.payload(ids[0]).unwrap(), Some("let x"));
    unit(&doc, ids[0])
      .replace_text(&mut doc, 0, 3, "const")
      .unwrap();
    assert_eq!(doc.payload(ids[0]).unwrap(), Some("const x"));
    unit(&doc, ids[0]).insert_text(&mut doc, 7, ": u8").unwrap();
    assert_eq!(doc.payload(ids[0]).unwrap(), Some("const x: u8"));
    unit(&doc, ids[0]).insert_text(&mut doc, 0, "").unwrap();
    assert_eq!(doc.payload(ids[0]).unwrap(), Some("const x: u8"));
  }

  #[test]
  fn test_whole_payload_multibyte_offsets() {
    let (mut doc, ids) = doc_with(vec![NodeKind::Math {
      display: false,
      text: "α+β".to_string(),
    }]);
    unit(&doc, ids[0])
      .replace_text(&mut doc, 0, 2, "γδ")
      .unwrap();
    assert_eq!(doc.payload(ids[0]).unwrap(), Some("γδ+β"));
    unit(&doc, ids[0]).insert_text(&mut doc, 4, "=").unwrap();
    assert_eq!(doc.payload(ids[0]).unwrap(), Some("γδ=+β"));
    unit(&doc, ids[0]).delete_text(&mut doc, 5, 6).unwrap();
    assert_eq!(doc.payload(ids[0]).unwrap(), Some("γδ=β"));

    /* Offsets inside a code point are rejected before anything changes. */
    let u = unit(&doc, ids[0]);
    assert!(matches!(u.delete_text(&mut doc, 1, 2), Err(UnitError::Range(_))));
    assert!(matches!(u.insert_text(&mut doc, 3, "x"), Err(UnitError::Range(_))));
    assert!(matches!(
      u.replace_text(&mut doc, 0, 1, "x"),
      Err(UnitError::Range(_))
    ));
    assert_eq!(doc.payload(ids[0]).unwrap(), Some("γδ=β"));
    assert!(TextUnit::Whole(u).slice(1, 2).is_err());
  }

  #[test]
  fn test_slice_of_whole_payload() {
    let mut doc = Document::new();
    let block = doc
      .append_child(doc.root(), NodeKind::CodeBlock {
        attr: Attr::default(),
        text: "fn main() {}".to_string(),
      })
      .unwrap();
    let whole = TextUnit::Whole(unit(&doc, block));

    let slice = whole.slice(3, 6).unwrap();
    assert_eq!(slice.text(), "main()");
    assert_eq!(slice.capabilities(), Capabilities::ALL);
    slice.replace_text_completely(&mut doc, "run()").unwrap();
    assert_eq!(doc.payload(block).unwrap(), Some("fn run() {}"));

    let whole = TextUnit::Whole(unit(&doc, block));
    let slice = whole.slice(3, 3).unwrap();
    assert_eq!(slice.text(), "run");
    slice.insert_text(&mut doc, 3, "_it").unwrap();
    assert_eq!(doc.payload(block).unwrap(), Some("fn run_it() {}"));

    let whole = TextUnit::Whole(unit(&doc, block));
    let slice = whole.slice(3, 6).unwrap();
    slice.replace_text(&mut doc, 3, 6, "").unwrap();
    assert_eq!(doc.payload(block).unwrap(), Some("fn run() {}"));

    let whole = TextUnit::Whole(unit(&doc, block));
    let slice = whole.slice(8, 3).unwrap();
    assert_eq!(slice.text(), " {}");
    assert_eq!(slice.delete_text_completely(&mut doc).unwrap(), 0);
    assert_eq!(doc.payload(block).unwrap(), Some("fn run()"));
    assert!(doc.is_attached(block));

    /* Edits outside the slice are refused, even where the node has text. */
    let whole = TextUnit::Whole(unit(&doc, block));
    let slice = whole.slice(0, 2).unwrap();
    assert!(matches!(
      slice.insert_text(&mut doc, 3, "x"),
      Err(UnitError::Range(_))
    ));
    assert_eq!(doc.payload(block).unwrap(), Some("fn run()"));
  }

  #[test]
  fn test_fixed_units() {
    let (mut doc, ids) = doc_with(vec![
      NodeKind::Str {
        text: "a".to_string(),
      },
      NodeKind::Space,
    ]);
    let space = unit(&doc, ids[1]);
    assert_eq!(space.text(), " ");
    assert_eq!(
      space.insert_text(&mut doc, 0, "x"),
      Err(UnitError::UnsupportedOperation {
        op: Op::Insert,
        unit: "Space"
      })
    );
    assert_eq!(space.delete_text_completely(&mut doc).unwrap(), 1);
    assert!(!doc.is_attached(ids[1]));
    assert!(doc.is_attached(ids[0]));
  }

  #[test]
  fn test_stale_unit() {
    let (mut doc, ids) = doc_with(vec![NodeKind::Str {
      text: "abc".to_string(),
    }]);
    let u = unit(&doc, ids[0]);
    u.delete_text(&mut doc, 0, 1).unwrap();
    assert_eq!(u.delete_text(&mut doc, 0, 1), Err(UnitError::Stale(ids[0])));
  }

  #[test]
  fn test_synthetic_units() {
    let mut doc = Document::new();
    let b = Unit::Boundary(Boundary::Linkage);
    assert_eq!(b.text_len(), 3);
    assert!(b.is_synthetic());
    assert!(matches!(
      b.delete_text_completely(&mut doc),
      Err(UnitError::UnsupportedOperation { .. })
    ));
    assert!(TextUnit::Whole(b).slice(1, 1).is_err());
  }

  #[test]
  fn test_slice_edits() {
    let (mut doc, ids) = doc_with(vec![NodeKind::Str {
      text: "abcdef".to_string(),
    }]);
    let whole = TextUnit::Whole(unit(&doc, ids[0]));
    let slice = whole.slice(1, 4).unwrap().slice(1, 2).unwrap();
    assert_eq!(slice.text(), "cd");
    assert_eq!(slice.offset(), 2);
    assert_eq!(slice.delete_text_completely(&mut doc).unwrap(), 0);
    assert_eq!(doc.payload(ids[0]).unwrap(), Some("abef"));

    let whole = TextUnit::Whole(unit(&doc, ids[0]));
    whole
      .slice(0, 2)
      .unwrap()
      .replace_text_completely(&mut doc, "X")
      .unwrap();
    assert_eq!(doc.payload(ids[0]).unwrap(), Some("Xef"));
  }
}
