/*
 * Description: Address and edit flattened document text by offset.
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

//! Address and edit flattened document text by offset.
//!
//! A [`TextMap`] lays out the units produced by the [sequencer](crate::sequencer) end to end. Every
//! map, including every slice of a map, addresses the same absolute byte offsets into the
//! document's flattened text.
//!
//! Maps are snapshots. The mutating operations consume the map they are called on, and a fresh map
//! must be built from the document before editing it again.
//!
//!```
//! # fn main() -> Result<(), docmap_overlay::Error> {
//! use docmap_overlay::{ast, map::TextMap, sequencer::Sequencer};
//!
//! let mut doc = ast::parse(r#"{"blocks": [{"t": "Para", "c": [
//!   {"t": "Str", "text": "hello"}, {"t": "Space"}, {"t": "Str", "text": "world"}]}]}"#)?;
//! let seq = Sequencer::default();
//!
//! let map = TextMap::for_document(&doc, &seq)?;
//! assert_eq!(map.text(), "hello world\n");
//! assert_eq!(map.get_slice_by_doc_text_range(3, 5)?.text(), "lo wo");
//!
//! let removal = map.remove_slice_by_doc_text_range(&mut doc, 3, 5)?;
//! assert_eq!(removal.removed, 5);
//! assert_eq!(TextMap::for_document(&doc, &seq)?.text(), "helrld\n");
//! # Ok(())
//! # }
//!```

use crate::{
  ast::AstNode,
  error::RangeError,
  sequencer::{SequenceInput, Sequencer},
  tree::{Document, NodeId, NodeKind, TreeError},
  units::{NodeText, Op, TextUnit, Unit, UnitError},
};

use displaydoc::Display;
use thiserror::Error;

use std::{cell::OnceCell, ops::Range, rc::Rc};

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum MapError {
  /// {0}
  Range(#[from] RangeError),
  /// {0}
  Unit(#[from] UnitError),
  /// {0}
  Tree(#[from] TreeError),
  /// expected an entry starting at {expected}, but found one at {found}
  Discontiguous { expected: usize, found: usize },
  /// no node at offset {0} can anchor new content
  NoAnchor(usize),
  /// a {parent} node cannot hold the given content
  IncompatibleContent { parent: &'static str },
}

/// New content for a replacement or insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
  /// Plain text, inserted as inline nodes.
  Text(String),
  Nodes(Vec<AstNode>),
}

impl Content {
  pub fn is_empty(&self) -> bool {
    match self {
      Self::Text(text) => text.is_empty(),
      Self::Nodes(nodes) => nodes.is_empty(),
    }
  }

  fn nodes(&self) -> Vec<AstNode> {
    match self {
      Self::Text(text) => AstNode::inlines_from_text(text),
      Self::Nodes(nodes) => nodes.clone(),
    }
  }

  /// Inline content goes into inline containers, and block content everywhere else.
  fn fits(&self, parent: &NodeKind) -> bool {
    match self {
      Self::Text(_) => parent.holds_inlines(),
      Self::Nodes(nodes) => nodes
        .iter()
        .all(|node| node.kind.is_inline() == parent.holds_inlines()),
    }
  }
}

/// What a removal did.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Removal {
  /// Bytes of flattened text removed from the tree.
  pub removed: usize,
  /// Bytes of synthetic boundaries in the range, which have no node to remove.
  pub skipped: usize,
  /// Nodes detached, counting pruned ancestors.
  pub detached: usize,
}

/// What a replacement or insertion did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Replacement {
  pub removal: Removal,
  /// Bytes of flattened text the new content contributes.
  pub inserted: usize,
  /// Top-level nodes created for the new content. Empty when text was edited in place.
  pub nodes: Vec<NodeId>,
}

/// Where new nodes go.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Anchor {
  Before(NodeId),
  After(NodeId),
  /// Between the halves of the `Str` node split at the given byte offset.
  Split(NodeId, usize),
}

impl Anchor {
  fn node(&self) -> NodeId {
    match self {
      Self::Before(id) | Self::After(id) | Self::Split(id, _) => *id,
    }
  }

  /// The anchor for offset `local` within `unit`, if a node backs it.
  fn at(unit: &TextUnit, local: usize) -> Option<Self> {
    let node = unit.node()?;
    let pos = unit.offset() + local;
    Some(if pos == 0 {
      Self::Before(node)
    } else if pos == unit.unit().text_len() {
      Self::After(node)
    } else {
      Self::Split(node, pos)
    })
  }

  fn fits(&self, doc: &Document, content: &Content) -> Result<bool, TreeError> {
    let (parent, _) = doc.position(self.node())?;
    Ok(content.fits(doc.kind(parent)?))
  }

  /// Graft `content` at this anchor, returning the new top-level nodes and the second half of any
  /// split node.
  fn place(
    &self,
    doc: &mut Document,
    content: &Content,
  ) -> Result<(Vec<NodeId>, Option<NodeId>), MapError> {
    let (parent, index) = doc.position(self.node())?;
    let parent_kind = doc.kind(parent)?;
    if !content.fits(parent_kind) {
      return Err(MapError::IncompatibleContent {
        parent: parent_kind.name(),
      });
    }
    let (index, right) = match self {
      Self::Before(_) => (index, None),
      Self::After(_) => (index + 1, None),
      Self::Split(id, at) => (index + 1, Some(doc.split_text(*id, *at)?)),
    };
    let nodes = content
      .nodes()
      .iter()
      .map(|node| doc.graft(node))
      .collect::<Result<Vec<_>, _>>()?;
    doc.insert_children(parent, index, &nodes)?;
    Ok((nodes, right))
  }
}

/// One unit at a fixed offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafEntry {
  unit: TextUnit,
  start: usize,
}

impl LeafEntry {
  pub fn unit(&self) -> &TextUnit { &self.unit }

  pub fn start(&self) -> usize { self.start }

  pub fn end(&self) -> usize { self.start + self.unit.text_len() }
}

/// Contiguous entries sharing one address space. Text and length are computed on first use.
#[derive(Debug, Clone)]
pub struct CompoundMap {
  start: usize,
  entries: Vec<Rc<TextMap>>,
  text: OnceCell<String>,
  len: OnceCell<usize>,
}

impl CompoundMap {
  pub fn new(start: usize, entries: Vec<Rc<TextMap>>) -> Result<Self, MapError> {
    let mut expected = start;
    for entry in entries.iter() {
      let found = entry.doc_text_start_index();
      if found != expected {
        return Err(MapError::Discontiguous { expected, found });
      }
      expected = entry.doc_text_end_index();
    }
    Ok(Self {
      start,
      entries,
      text: OnceCell::new(),
      len: OnceCell::new(),
    })
  }

  pub fn entries(&self) -> &[Rc<TextMap>] { &self.entries }

  fn bounds(&self) -> Range<usize> { self.start..(self.start + self.len()) }

  fn len(&self) -> usize {
    *self
      .len
      .get_or_init(|| self.entries.iter().map(|entry| entry.text_len()).sum())
  }

  /// The minimal run of entries overlapping `[start, start+len)`.
  fn partition(&self, start: usize, len: usize) -> Result<(usize, usize), RangeError> {
    let end = start + len;
    let first = self
      .entries
      .iter()
      .position(|entry| entry.doc_text_end_index() > start);
    let last = self
      .entries
      .iter()
      .rposition(|entry| entry.doc_text_start_index() < end);
    match (first, last) {
      (Some(first), Some(last)) if first <= last => Ok((first, last)),
      _ => Err(RangeError::new(
        start,
        len,
        self.bounds(),
        "range matches no entries",
      )),
    }
  }

  /// The lengths covered within the first and last entries of a run spanning several entries.
  fn edge_lengths(&self, first: usize, last: usize, start: usize, len: usize) -> (usize, usize) {
    let first_entry = &self.entries[first];
    let first_len = first_entry.text_len() - (start - first_entry.doc_text_start_index());
    let middle_len: usize = self.entries[(first + 1)..last]
      .iter()
      .map(|entry| entry.text_len())
      .sum();
    (first_len, len - (first_len + middle_len))
  }
}

#[derive(Debug, Clone)]
pub enum TextMap {
  Leaf(LeafEntry),
  Compound(CompoundMap),
}

impl TextMap {
  /// Map the metadata and then the body of `doc`.
  pub fn for_document(doc: &Document, seq: &Sequencer) -> Result<Self, MapError> {
    Self::build(doc, seq, SequenceInput::Nodes(&[doc.meta(), doc.root()]))
  }

  pub fn build(doc: &Document, seq: &Sequencer, input: SequenceInput) -> Result<Self, MapError> {
    let mut start: usize = 0;
    let entries: Vec<Rc<TextMap>> = seq
      .units(doc, input)?
      .into_iter()
      .map(|unit| {
        let entry = LeafEntry {
          unit: TextUnit::Whole(unit),
          start,
        };
        start = entry.end();
        Rc::new(Self::Leaf(entry))
      })
      .collect();
    Ok(Self::Compound(CompoundMap::new(0, entries)?))
  }

  /// A map with no text at `at`.
  pub fn empty_at(at: usize) -> Self {
    Self::Compound(CompoundMap {
      start: at,
      entries: Vec::new(),
      text: OnceCell::new(),
      len: OnceCell::new(),
    })
  }

  pub fn text(&self) -> &str {
    match self {
      Self::Leaf(leaf) => leaf.unit.text(),
      Self::Compound(c) => c
        .text
        .get_or_init(|| c.entries.iter().map(|entry| entry.text()).collect()),
    }
  }

  pub fn text_len(&self) -> usize {
    match self {
      Self::Leaf(leaf) => leaf.unit.text_len(),
      Self::Compound(c) => c.len(),
    }
  }

  pub fn doc_text_start_index(&self) -> usize {
    match self {
      Self::Leaf(leaf) => leaf.start,
      Self::Compound(c) => c.start,
    }
  }

  pub fn doc_text_end_index(&self) -> usize { self.doc_text_start_index() + self.text_len() }

  fn bounds(&self) -> Range<usize> { self.doc_text_start_index()..self.doc_text_end_index() }

  /// Every leaf entry, in order.
  pub fn leaves(&self) -> Vec<&LeafEntry> {
    fn collect<'m>(map: &'m TextMap, out: &mut Vec<&'m LeafEntry>) {
      match map {
        TextMap::Leaf(leaf) => out.push(leaf),
        TextMap::Compound(c) => {
          for entry in c.entries.iter() {
            collect(entry, out);
          }
        },
      }
    }
    let mut out = Vec::new();
    collect(self, &mut out);
    out
  }

  fn reslice(entry: &Rc<Self>, start: usize, len: usize) -> Result<Rc<Self>, MapError> {
    if start == entry.doc_text_start_index() && len == entry.text_len() {
      Ok(Rc::clone(entry))
    } else {
      Ok(Rc::new(entry.get_slice_by_doc_text_range(start, len)?))
    }
  }

  /// A map over `[start, start+len)`, in absolute offsets.
  ///
  /// Entries entirely within the range are shared with this map rather than copied.
  pub fn get_slice_by_doc_text_range(&self, start: usize, len: usize) -> Result<Self, MapError> {
    RangeError::check(start, len, self.bounds(), false)?;
    match self {
      Self::Leaf(leaf) => Ok(Self::Leaf(LeafEntry {
        unit: leaf.unit.slice(start - leaf.start, len)?,
        start,
      })),
      Self::Compound(c) => {
        let (first, last) = c.partition(start, len)?;
        if first == last {
          return c.entries[first].get_slice_by_doc_text_range(start, len);
        }
        let (first_len, last_len) = c.edge_lengths(first, last, start, len);
        let last_entry = &c.entries[last];

        let mut entries: Vec<Rc<Self>> = Vec::with_capacity(last - first + 1);
        entries.push(Self::reslice(&c.entries[first], start, first_len)?);
        entries.extend(c.entries[(first + 1)..last].iter().cloned());
        entries.push(Self::reslice(
          last_entry,
          last_entry.doc_text_start_index(),
          last_len,
        )?);
        Ok(Self::Compound(CompoundMap::new(start, entries)?))
      },
    }
  }

  /// Push the unit edits removing `[start, start+len)` onto `steps`, in reverse document order.
  fn plan_removal(
    &self,
    start: usize,
    len: usize,
    steps: &mut Vec<TextUnit>,
  ) -> Result<(), MapError> {
    RangeError::check(start, len, self.bounds(), false)?;
    match self {
      Self::Leaf(leaf) => steps.push(leaf.unit.slice(start - leaf.start, len)?),
      Self::Compound(c) => {
        let (first, last) = c.partition(start, len)?;
        if first == last {
          return c.entries[first].plan_removal(start, len, steps);
        }
        let (first_len, last_len) = c.edge_lengths(first, last, start, len);
        let last_entry = &c.entries[last];
        last_entry.plan_removal(last_entry.doc_text_start_index(), last_len, steps)?;
        for entry in c.entries[(first + 1)..last].iter().rev() {
          entry.plan_all(steps);
        }
        c.entries[first].plan_removal(start, first_len, steps)?;
      },
    }
    Ok(())
  }

  fn plan_all(&self, steps: &mut Vec<TextUnit>) {
    match self {
      Self::Leaf(leaf) => steps.push(leaf.unit.clone()),
      Self::Compound(c) => {
        for entry in c.entries.iter().rev() {
          entry.plan_all(steps);
        }
      },
    }
  }

  fn validate_removal(doc: &Document, steps: &[TextUnit]) -> Result<(), MapError> {
    for step in steps.iter().filter(|step| !step.is_synthetic()) {
      step.validate(doc, Op::DeleteCompletely, 0, step.text_len())?;
    }
    Ok(())
  }

  fn apply_removal(doc: &mut Document, steps: &[TextUnit]) -> Result<Removal, MapError> {
    Self::validate_removal(doc, steps)?;
    let mut removal = Removal::default();
    for step in steps.iter() {
      if step.is_synthetic() {
        removal.skipped += step.text_len();
        continue;
      }
      removal.detached += step.delete_text_completely(doc)?;
      removal.removed += step.text_len();
    }
    Ok(removal)
  }

  /// Remove `[start, start+len)` from the tree.
  ///
  /// Units covered entirely are removed along with their node, pruning ancestors left empty. Units
  /// covered in part lose just the covered text. Synthetic boundaries are left alone, since they
  /// are regenerated by the next traversal.
  ///
  /// Every unit edit is checked before any is applied, so a stale map or an unsupported edit
  /// leaves the tree untouched.
  pub fn remove_slice_by_doc_text_range(
    self,
    doc: &mut Document,
    start: usize,
    len: usize,
  ) -> Result<Removal, MapError> {
    let mut steps: Vec<TextUnit> = Vec::new();
    self.plan_removal(start, len, &mut steps)?;
    let removal = Self::apply_removal(doc, &steps)?;
    log::debug!(
      "removed [{}, {}): {:?}",
      start,
      start + len,
      removal
    );
    Ok(removal)
  }

  /// Replace `[start, start+len)` with `content`.
  ///
  /// Text is written in place over the first node-backed unit in the range, when that unit
  /// accepts it, and the rest of the range is removed. Otherwise the new nodes are placed where
  /// the first removed node-backed text began, splitting a `Str` if the range starts inside one,
  /// and then the range is removed.
  pub fn replace_slice_by_doc_text_range(
    self,
    doc: &mut Document,
    seq: &Sequencer,
    start: usize,
    len: usize,
    content: &Content,
  ) -> Result<Replacement, MapError> {
    if content.is_empty() {
      return Ok(Replacement {
        removal: self.remove_slice_by_doc_text_range(doc, start, len)?,
        ..Default::default()
      });
    }

    let mut steps: Vec<TextUnit> = Vec::new();
    self.plan_removal(start, len, &mut steps)?;
    Self::validate_removal(doc, &steps)?;

    /* Steps are in reverse document order, so the last node-backed one comes first in the text. */
    let index = steps
      .iter()
      .rposition(|step| !step.is_synthetic())
      .ok_or(MapError::NoAnchor(start))?;

    if let Content::Text(text) = content {
      if steps[index].capabilities().replace_completely {
        let first = steps.remove(index);
        first.replace_text_completely(doc, text)?;
        let mut removal = Self::apply_removal(doc, &steps)?;
        removal.removed += first.text_len();
        log::debug!(
          "replaced [{}, {}) in place: {:?}",
          start,
          start + len,
          removal
        );
        return Ok(Replacement {
          removal,
          inserted: text.len(),
          nodes: Vec::new(),
        });
      }
    }

    let anchor = Anchor::at(&steps[index], 0).ok_or(MapError::NoAnchor(start))?;
    let (nodes, right) = anchor.place(doc, content)?;
    if let Some(right) = right {
      /* The text to remove now begins the second half. */
      let len = steps[index].text_len();
      let right = NodeText::read(doc, right)?.ok_or(MapError::NoAnchor(start))?;
      steps[index] = TextUnit::Whole(Unit::Node(right)).slice(0, len)?;
    }
    let removal = Self::apply_removal(doc, &steps)?;

    let inserted = seq
      .units(doc, SequenceInput::Nodes(&nodes))?
      .iter()
      .map(|unit| unit.text_len())
      .sum();
    log::debug!(
      "replaced [{}, {}) with {} nodes: {:?}",
      start,
      start + len,
      nodes.len(),
      removal
    );
    Ok(Replacement {
      removal,
      inserted,
      nodes,
    })
  }

  /// Insert `content` at offset `at`.
  ///
  /// Text lands inside an adjacent unit when one accepts insertions, preferring the unit ending at
  /// `at`. Otherwise new nodes are placed next to an adjacent node whose parent can hold them.
  pub fn insert_at_doc_text_index(
    self,
    doc: &mut Document,
    seq: &Sequencer,
    at: usize,
    content: &Content,
  ) -> Result<Replacement, MapError> {
    RangeError::check(at, 0, self.bounds(), true)?;
    if content.is_empty() {
      return Ok(Replacement::default());
    }

    let leaves = self.leaves();
    let candidates: Vec<(&TextUnit, usize)> =
      match leaves.iter().find(|leaf| leaf.start < at && at < leaf.end()) {
        Some(leaf) => vec![(&leaf.unit, at - leaf.start)],
        None => {
          let before = leaves
            .iter()
            .rev()
            .find(|leaf| leaf.end() == at && leaf.unit.text_len() > 0)
            .map(|leaf| (&leaf.unit, leaf.unit.text_len()));
          let after = leaves
            .iter()
            .find(|leaf| leaf.start == at && leaf.unit.text_len() > 0)
            .map(|leaf| (&leaf.unit, 0));
          before.into_iter().chain(after).collect()
        },
      };

    if let Content::Text(text) = content {
      for (unit, local) in candidates.iter() {
        if !unit.is_synthetic() && unit.capabilities().insert {
          unit.insert_text(doc, *local, text)?;
          log::debug!("inserted {} bytes at {} in place", text.len(), at);
          return Ok(Replacement {
            inserted: text.len(),
            ..Default::default()
          });
        }
      }
    }

    let anchors: Vec<Anchor> = candidates
      .iter()
      .filter_map(|(unit, local)| Anchor::at(unit, *local))
      .collect();
    let mut anchor: Option<Anchor> = None;
    for candidate in anchors.iter() {
      if candidate.fits(doc, content)? {
        anchor = Some(*candidate);
        break;
      }
    }
    let anchor = match (anchor, anchors.first()) {
      (Some(anchor), _) => anchor,
      /* Report why the preferred anchor was rejected. */
      (None, Some(first)) => *first,
      (None, None) => return Err(MapError::NoAnchor(at)),
    };
    let (nodes, _) = anchor.place(doc, content)?;
    let inserted = seq
      .units(doc, SequenceInput::Nodes(&nodes))?
      .iter()
      .map(|unit| unit.text_len())
      .sum();
    log::debug!("inserted {} nodes at {}", nodes.len(), at);
    Ok(Replacement {
      removal: Removal::default(),
      inserted,
      nodes,
    })
  }
}

#[cfg(test)]
pub mod proptest_strategies {
  use super::*;
  use crate::ast::{proptest_strategies::document, AstDocument};

  use proptest::{prelude::*, sample::Index, strategy::Strategy};

  /// Every offset of `text` which falls on a char boundary.
  pub fn boundaries(text: &str) -> Vec<usize> {
    text
      .char_indices()
      .map(|(i, _)| i)
      .chain(std::iter::once(text.len()))
      .collect()
  }

  /// A non-empty range of `text` on char boundaries.
  pub fn range_of(text: &str, a: Index, b: Index) -> (usize, usize) {
    let bounds = boundaries(text);
    let i = a.index(bounds.len() - 1);
    let j = i + 1 + b.index(bounds.len() - 1 - i);
    (bounds[i], bounds[j] - bounds[i])
  }

  /// A document, along with indices to pick a range of its text with [`range_of`].
  pub fn sliceable() -> impl Strategy<Value=(AstDocument, Index, Index)> {
    (document(), any::<Index>(), any::<Index>())
  }
}
