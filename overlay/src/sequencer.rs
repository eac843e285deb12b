/*
 * Description: Walk a document tree in rendered order, yielding its text units.
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

//! Walk a document tree in rendered order, yielding its text units.
//!
//!```
//! # fn main() -> Result<(), docmap_overlay::Error> {
//! use docmap_overlay::{ast, sequencer::*};
//!
//! let doc = ast::parse(r#"{"blocks": [{"t": "BulletList", "c": [
//!   {"t": "ListItem", "c": [{"t": "Plain", "c": [{"t": "Str", "text": "a"}]}]},
//!   {"t": "ListItem", "c": [{"t": "Plain", "c": [{"t": "Str", "text": "b"}]}]}]}]}"#)?;
//! let seq = Sequencer::default();
//! assert_eq!(seq.text(&doc, SequenceInput::Node(doc.root()))?, "a\nb\n");
//!
//! /* Without paragraph breaks, a linkage break still keeps the items apart. */
//! let seq = Sequencer { paragraph_breaks: false };
//! assert_eq!(seq.text(&doc, SequenceInput::Node(doc.root()))?, "a\u{200C}b\u{200C}");
//! # Ok(())
//! # }
//!```

use crate::{
  tree::{Document, NodeId, NodeKind, TreeError},
  units::{Boundary, NodeText, Unit},
};

use std::rc::Rc;

/// What to sequence.
#[derive(Debug, Copy, Clone)]
pub enum SequenceInput<'a> {
  Node(NodeId),
  Nodes(&'a [NodeId]),
  /// A one-off string with no backing node.
  Literal(&'a str),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Sequencer {
  /// Emit a paragraph break after each paragraph-like block.
  pub paragraph_breaks: bool,
}

impl Default for Sequencer {
  fn default() -> Self {
    Self {
      paragraph_breaks: true,
    }
  }
}

impl Sequencer {
  pub fn units(&self, doc: &Document, input: SequenceInput) -> Result<Vec<Unit>, TreeError> {
    let mut walk = Walk {
      doc,
      paragraph_breaks: self.paragraph_breaks,
      units: Vec::new(),
    };
    match input {
      SequenceInput::Node(id) => walk.visit(id)?,
      SequenceInput::Nodes(ids) => {
        for id in ids.iter() {
          walk.visit(*id)?;
        }
      },
      SequenceInput::Literal(s) => {
        if !s.is_empty() {
          walk.units.push(Unit::Literal(Rc::from(s)));
        }
      },
    }
    Ok(walk.units)
  }

  pub fn text(&self, doc: &Document, input: SequenceInput) -> Result<String, TreeError> {
    Ok(
      self
        .units(doc, input)?
        .iter()
        .map(|unit| unit.text())
        .collect(),
    )
  }
}

fn table_section_rank(kind: &NodeKind) -> u8 {
  match kind {
    NodeKind::TableHead => 0,
    NodeKind::TableBody => 1,
    NodeKind::TableFoot => 2,
    NodeKind::Caption => 3,
    _ => 4,
  }
}

struct Walk<'d> {
  doc: &'d Document,
  paragraph_breaks: bool,
  units: Vec<Unit>,
}

impl<'d> Walk<'d> {
  /// Close a paragraph-like block. Without paragraph breaks, a linkage break stands in.
  fn paragraph(&mut self) {
    if self.paragraph_breaks {
      self.units.push(Unit::Boundary(Boundary::Paragraph));
    } else {
      self.linkage();
    }
  }

  /// Linkage breaks never lead, and never follow another boundary.
  fn linkage(&mut self) {
    match self.units.last() {
      None | Some(Unit::Boundary(_)) => (),
      Some(_) => self.units.push(Unit::Boundary(Boundary::Linkage)),
    }
  }

  fn children(&mut self, id: NodeId) -> Result<(), TreeError> {
    let doc = self.doc;
    for child in doc.children(id)?.iter() {
      self.visit(*child)?;
    }
    Ok(())
  }

  fn leaf(&mut self, id: NodeId) -> Result<(), TreeError> {
    if let Some(nt) = NodeText::read(self.doc, id)? {
      if !nt.text.is_empty() {
        self.units.push(Unit::Node(nt));
      }
    }
    Ok(())
  }

  fn visit(&mut self, id: NodeId) -> Result<(), TreeError> {
    match self.doc.kind(id)? {
      NodeKind::Document
      | NodeKind::MetaMap
      | NodeKind::MetaList
      | NodeKind::MetaInlines
      | NodeKind::MetaBlocks
      | NodeKind::BlockQuote
      | NodeKind::Div { .. }
      | NodeKind::BulletList
      | NodeKind::OrderedList { .. }
      | NodeKind::DefinitionList
      | NodeKind::DefinitionItem
      | NodeKind::LineBlock
      | NodeKind::TableRow
      | NodeKind::Emph
      | NodeKind::Strong
      | NodeKind::Underline
      | NodeKind::Strikeout
      | NodeKind::Superscript
      | NodeKind::Subscript
      | NodeKind::SmallCaps
      | NodeKind::Quoted { .. }
      | NodeKind::Cite
      | NodeKind::Span { .. } => self.children(id)?,
      NodeKind::Para
      | NodeKind::Plain
      | NodeKind::Header { .. }
      | NodeKind::LineItem
      | NodeKind::Term => {
        self.children(id)?;
        self.paragraph();
      },
      NodeKind::CodeBlock { .. } => {
        self.leaf(id)?;
        self.paragraph();
      },
      NodeKind::ListItem
      | NodeKind::Definition
      | NodeKind::Link { .. }
      | NodeKind::Image { .. }
      | NodeKind::MetaEntry { .. }
      | NodeKind::TableCell { .. }
      | NodeKind::Caption
      | NodeKind::TableHead
      | NodeKind::TableBody
      | NodeKind::TableFoot => {
        self.children(id)?;
        self.linkage();
      },
      NodeKind::Note => {
        self.linkage();
        self.children(id)?;
        self.linkage();
      },
      NodeKind::Table { .. } => {
        let doc = self.doc;
        let mut sections: Vec<(u8, NodeId)> = Vec::new();
        for section in doc.children(id)?.iter() {
          sections.push((table_section_rank(doc.kind(*section)?), *section));
        }
        /* Stable, so multiple bodies keep their order. */
        sections.sort_by_key(|(rank, _)| *rank);
        for (_, section) in sections.into_iter() {
          self.visit(section)?;
        }
      },
      NodeKind::HorizontalRule
      | NodeKind::RawBlock { .. }
      | NodeKind::RawInline { .. }
      | NodeKind::MetaBool { .. } => self.linkage(),
      NodeKind::Str { .. }
      | NodeKind::MetaString { .. }
      | NodeKind::Code { .. }
      | NodeKind::Math { .. }
      | NodeKind::Space
      | NodeKind::SoftBreak
      | NodeKind::LineBreak => self.leaf(id)?,
    }
    Ok(())
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{ast, units::LINKAGE_BREAK};

  fn text_of(json: &str, seq: Sequencer) -> String {
    let doc = ast::parse(json).unwrap();
    seq.text(&doc, SequenceInput::Node(doc.root())).unwrap()
  }

  #[test]
  fn test_inlines_and_paragraphs() {
    let json = r#"{"blocks": [
      {"t": "Para", "c": [{"t": "Str", "text": "a"}, {"t": "Space"}, {"t": "Emph", "c": [{"t": "Str", "text": "b"}]},
                          {"t": "SoftBreak"}, {"t": "Code", "text": "c"}, {"t": "LineBreak"}, {"t": "Math", "text": "x"}]},
      {"t": "CodeBlock", "text": "fn"},
      {"t": "HorizontalRule"},
      {"t": "Para", "c": [{"t": "Str", "text": "d"}]}]}"#;
    assert_eq!(text_of(json, Sequencer::default()), "a b c\nx\nfn\nd\n");
    assert_eq!(
      text_of(json, Sequencer {
        paragraph_breaks: false
      }),
      format!("a b c\nx{z}fn{z}d{z}", z = LINKAGE_BREAK),
    );
  }

  #[test]
  fn test_adjacent_paragraphs_are_separated() {
    let json = r#"{"blocks": [
      {"t": "Para", "c": [{"t": "Str", "text": "a"}]},
      {"t": "Para", "c": [{"t": "Str", "text": "b"}]},
      {"t": "CodeBlock", "text": "c"}]}"#;
    let z = LINKAGE_BREAK;
    assert_eq!(
      text_of(json, Sequencer {
        paragraph_breaks: false
      }),
      format!("a{z}b{z}c{z}", z = z),
    );
    /* An empty paragraph adds nothing, so breaks never double up. */
    let json = r#"{"blocks": [
      {"t": "Para", "c": [{"t": "Str", "text": "a"}]},
      {"t": "Para", "c": []},
      {"t": "Para", "c": [{"t": "Str", "text": "b"}]}]}"#;
    assert_eq!(
      text_of(json, Sequencer {
        paragraph_breaks: false
      }),
      format!("a{z}b{z}", z = z),
    );
  }

  #[test]
  fn test_adjacent_list_items_are_separated() {
    let json = r#"{"blocks": [{"t": "BulletList", "c": [
      {"t": "ListItem", "c": [{"t": "Plain", "c": [{"t": "Str", "text": "one"}]}]},
      {"t": "ListItem", "c": [{"t": "Plain", "c": [{"t": "Str", "text": "two"}]}]}]}]}"#;
    let text = text_of(json, Sequencer {
      paragraph_breaks: false,
    });
    assert_ne!(text, "onetwo");
    assert_eq!(text, format!("one{}two{}", LINKAGE_BREAK, LINKAGE_BREAK));
  }

  #[test]
  fn test_table_section_order() {
    let json = r#"{"blocks": [{"t": "Table", "c": [
      {"t": "Caption", "c": [{"t": "Plain", "c": [{"t": "Str", "text": "cap"}]}]},
      {"t": "TableFoot", "c": [{"t": "TableRow", "c": [{"t": "TableCell", "c": [{"t": "Plain", "c": [{"t": "Str", "text": "foot"}]}]}]}]},
      {"t": "TableBody", "c": [{"t": "TableRow", "c": [
        {"t": "TableCell", "c": [{"t": "Plain", "c": [{"t": "Str", "text": "x"}]}]},
        {"t": "TableCell", "c": [{"t": "Plain", "c": [{"t": "Str", "text": "y"}]}]}]}]},
      {"t": "TableHead", "c": [{"t": "TableRow", "c": [{"t": "TableCell", "c": [{"t": "Plain", "c": [{"t": "Str", "text": "head"}]}]}]}]}]}]}"#;
    let z = LINKAGE_BREAK;
    assert_eq!(
      text_of(json, Sequencer {
        paragraph_breaks: false
      }),
      format!("head{z}x{z}y{z}foot{z}cap{z}", z = z),
    );
  }

  #[test]
  fn test_notes_and_links() {
    let json = r#"{"blocks": [{"t": "Para", "c": [
      {"t": "Str", "text": "see"},
      {"t": "Note", "c": [{"t": "Para", "c": [{"t": "Str", "text": "n"}]}]},
      {"t": "Link", "url": "u", "c": [{"t": "Str", "text": "l"}]},
      {"t": "Str", "text": "end"}]}]}"#;
    let z = LINKAGE_BREAK;
    assert_eq!(
      text_of(json, Sequencer::default()),
      format!("see{z}n\nl{z}end\n", z = z),
    );
  }

  #[test]
  fn test_metadata_and_literals() {
    let json = r#"{"meta": [{"t": "MetaEntry", "key": "k", "c": [{"t": "MetaString", "text": "v"}]},
                            {"t": "MetaEntry", "key": "b", "c": [{"t": "MetaBool", "value": true}]}]}"#;
    let doc = ast::parse(json).unwrap();
    let seq = Sequencer::default();
    assert_eq!(
      seq.text(&doc, SequenceInput::Node(doc.meta())).unwrap(),
      format!("v{}", LINKAGE_BREAK)
    );
    let units = seq.units(&doc, SequenceInput::Literal("lit")).unwrap();
    assert_eq!(units, vec![Unit::Literal(Rc::from("lit"))]);
    assert!(seq
      .units(&doc, SequenceInput::Literal(""))
      .unwrap()
      .is_empty());
  }
}
