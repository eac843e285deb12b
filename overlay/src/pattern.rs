/*
 * Description: Regex search and substitution over flattened document text.
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

//! Regex search and substitution over flattened document text.
//!
//! Matches keep the [`TextMap`] they were found in, so a matched group can be handed straight back
//! to the map to edit exactly that span of the tree.
//!
//!```
//! # fn main() -> Result<(), docmap_overlay::Error> {
//! use docmap_overlay::{ast, map::TextMap, pattern::Pattern, sequencer::Sequencer};
//!
//! let mut doc = ast::parse(r#"{"blocks": [{"t": "Para", "c": [
//!   {"t": "Str", "text": "one"}, {"t": "Space"}, {"t": "Emph", "c": [{"t": "Str", "text": "two"}]}]}]}"#)?;
//! let seq = Sequencer::default();
//!
//! let n = Pattern::new(r"(\w+) (\w+)")?.subn(&mut doc, &seq, "$2 $1", 0)?;
//! assert_eq!(n, 1);
//! assert_eq!(TextMap::for_document(&doc, &seq)?.text(), "two one\n");
//! # Ok(())
//! # }
//!```

use crate::{
  ast::AstNode,
  map::{Content, MapError, Replacement, TextMap},
  sequencer::Sequencer,
  tree::Document,
};

use displaydoc::Display;
use regex::{Captures, Regex};
use thiserror::Error;

use std::ops::Range;

#[derive(Debug, Display, Error)]
pub enum PatternError {
  /// {0}
  Regex(#[from] regex::Error),
  /// {0}
  Map(#[from] MapError),
}

/// The offset of the char after the one starting at `at`.
fn next_char_boundary(text: &str, at: usize) -> Option<usize> {
  text
    .get(at..)?
    .chars()
    .next()
    .map(|c| at + c.len_utf8())
}

/// Find the leftmost match at or after `pos`, never accepting an empty match at `forbid_empty_at`.
fn captures_from<'h>(
  regex: &Regex,
  text: &'h str,
  mut pos: usize,
  forbid_empty_at: Option<usize>,
) -> Option<Captures<'h>> {
  loop {
    if pos > text.len() {
      return None;
    }
    let caps = regex.captures_at(text, pos)?;
    let whole = caps.get(0)?;
    if whole.is_empty() && Some(whole.start()) == forbid_empty_at {
      pos = next_char_boundary(text, whole.start())?;
      continue;
    }
    return Some(caps);
  }
}

#[derive(Debug, Clone)]
pub struct Pattern {
  regex: Regex,
  /// The same pattern, anchored at the end of the text.
  full: Regex,
}

impl Pattern {
  pub fn new(pattern: &str) -> Result<Self, PatternError> {
    Ok(Self {
      regex: Regex::new(pattern)?,
      full: Regex::new(&format!(r"(?:{})\z", pattern))?,
    })
  }

  pub fn as_str(&self) -> &str { self.regex.as_str() }

  pub fn regex(&self) -> &Regex { &self.regex }

  /// The leftmost match starting at or after byte offset `pos` of `map.text()`.
  pub fn search<'m>(&'m self, map: &'m TextMap, pos: usize) -> Option<Match<'m>> {
    let caps = captures_from(&self.regex, map.text(), pos, None)?;
    Some(Match::new(self, map, &caps))
  }

  /// A match starting exactly at `pos`.
  pub fn r#match<'m>(&'m self, map: &'m TextMap, pos: usize) -> Option<Match<'m>> {
    let caps = captures_from(&self.regex, map.text(), pos, None)?;
    if caps.get(0)?.start() != pos {
      return None;
    }
    Some(Match::new(self, map, &caps))
  }

  /// A match spanning everything from `pos` to the end of the text.
  pub fn fullmatch<'m>(&'m self, map: &'m TextMap, pos: usize) -> Option<Match<'m>> {
    let caps = captures_from(&self.full, map.text(), pos, None)?;
    if caps.get(0)?.start() != pos {
      return None;
    }
    Some(Match::new(self, map, &caps))
  }

  /// Successive non-overlapping matches, starting at `pos`.
  pub fn finditer<'m>(&'m self, map: &'m TextMap, pos: usize) -> Matches<'m> {
    Matches {
      pattern: self,
      map,
      pos,
      forbid_empty_at: None,
    }
  }

  /// The text of every match. Nothing links these back to the tree.
  pub fn findall(&self, map: &TextMap) -> Vec<String> {
    self
      .finditer(map, 0)
      .filter_map(|m| m.group_text(0).map(|s| s.to_string()))
      .collect()
  }

  /// Replace up to `count` matches (all of them if `count` is 0), re-reading the document after
  /// each edit. Returns the number of matches which changed the tree.
  ///
  /// Matches covering only synthetic boundaries have no node to edit. They are passed over and
  /// do not count, nor does an empty match replaced with nothing.
  ///
  /// `make_content` produces the replacement from each match's captures.
  fn substitute<F>(
    &self,
    doc: &mut Document,
    seq: &Sequencer,
    count: usize,
    mut make_content: F,
  ) -> Result<usize, PatternError>
  where
    F: FnMut(&Captures) -> Content,
  {
    let mut map = TextMap::for_document(doc, seq)?;
    let mut pos: usize = 0;
    let mut forbid_empty_at: Option<usize> = None;
    let mut n: usize = 0;
    while count == 0 || n < count {
      let base = map.doc_text_start_index();
      let (start, end, content) = match captures_from(&self.regex, map.text(), pos, forbid_empty_at)
      {
        None => break,
        Some(caps) => match caps.get(0) {
          None => break,
          Some(whole) => (base + whole.start(), base + whole.end(), make_content(&caps)),
        },
      };
      let old_len = map.text_len();

      let result = if start == end {
        if content.is_empty() {
          Ok(Replacement::default())
        } else {
          map.insert_at_doc_text_index(doc, seq, start, &content)
        }
      } else {
        map.replace_slice_by_doc_text_range(doc, seq, start, end - start, &content)
      };
      match result {
        /* Only edits that touched the tree count. */
        Ok(r) if r.removal.removed > 0 || r.inserted > 0 => n += 1,
        Ok(_) => (),
        /* Nothing here can hold new content, e.g. a match of synthetic boundaries alone. */
        Err(MapError::NoAnchor(at)) => log::debug!("no anchor for [{}, {}) at {}", start, end, at),
        Err(e) => return Err(e.into()),
      }

      map = TextMap::for_document(doc, seq)?;
      /* Text after the match is unchanged, so it moved by however much the text grew or shrank. */
      let new_len = map.text_len();
      pos = (end + new_len).saturating_sub(old_len).max(start) - base;
      let text = map.text();
      while pos < text.len() && !text.is_char_boundary(pos) {
        pos += 1;
      }
      forbid_empty_at = Some(pos);
      log::trace!(
        "substituted [{}, {}) with {:?}, resuming at {}",
        start,
        end,
        content,
        pos
      );
    }
    Ok(n)
  }

  /// Replace matches with `replacement`, expanding `$1`/`${name}` references to groups.
  pub fn subn(
    &self,
    doc: &mut Document,
    seq: &Sequencer,
    replacement: &str,
    count: usize,
  ) -> Result<usize, PatternError> {
    self.substitute(doc, seq, count, |caps| {
      let mut expanded = String::new();
      caps.expand(replacement, &mut expanded);
      Content::Text(expanded)
    })
  }

  pub fn sub(
    &self,
    doc: &mut Document,
    seq: &Sequencer,
    replacement: &str,
    count: usize,
  ) -> Result<(), PatternError> {
    self.subn(doc, seq, replacement, count)?;
    Ok(())
  }

  /// Replace matches with copies of `nodes`.
  pub fn sub_nodes(
    &self,
    doc: &mut Document,
    seq: &Sequencer,
    nodes: &[AstNode],
    count: usize,
  ) -> Result<usize, PatternError> {
    self.substitute(doc, seq, count, |_| Content::Nodes(nodes.to_vec()))
  }

  /// Remove matches.
  pub fn rm(&self, doc: &mut Document, seq: &Sequencer, count: usize) -> Result<usize, PatternError> {
    self.substitute(doc, seq, count, |_| Content::Text(String::new()))
  }
}

/// A match, along with the map it was found in.
#[derive(Debug, Clone)]
pub struct Match<'m> {
  pattern: &'m Pattern,
  map: &'m TextMap,
  /// Absolute spans of each group.
  spans: Vec<Option<Range<usize>>>,
}

impl<'m> Match<'m> {
  fn new(pattern: &'m Pattern, map: &'m TextMap, caps: &Captures) -> Self {
    let base = map.doc_text_start_index();
    Self {
      pattern,
      map,
      spans: caps
        .iter()
        .map(|group| group.map(|m| (base + m.start())..(base + m.end())))
        .collect(),
    }
  }

  pub fn map(&self) -> &'m TextMap { self.map }

  pub fn span(&self, group: usize) -> Option<Range<usize>> { self.spans.get(group)?.clone() }

  pub fn start(&self) -> usize { self.span(0).map(|r| r.start).unwrap_or(0) }

  pub fn end(&self) -> usize { self.span(0).map(|r| r.end).unwrap_or(0) }

  pub fn len(&self) -> usize { self.end() - self.start() }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  /// The number of groups, including the whole match.
  pub fn groups(&self) -> usize { self.spans.len() }

  /// The matched text of `group`, if it participated.
  pub fn group_text(&self, group: usize) -> Option<&'m str> {
    let span = self.span(group)?;
    let base = self.map.doc_text_start_index();
    self.map.text().get((span.start - base)..(span.end - base))
  }

  /// The part of the map `group` matched, if it participated.
  pub fn group(&self, group: usize) -> Result<Option<TextMap>, PatternError> {
    let span = match self.span(group) {
      Some(span) => span,
      None => return Ok(None),
    };
    if span.is_empty() {
      return Ok(Some(TextMap::empty_at(span.start)));
    }
    Ok(Some(
      self
        .map
        .get_slice_by_doc_text_range(span.start, span.end - span.start)?,
    ))
  }

  /// The group index for `name`.
  pub fn index_of(&self, name: &str) -> Option<usize> {
    self
      .pattern
      .regex
      .capture_names()
      .position(|n| n == Some(name))
  }

  /// The part of the map the group called `name` matched.
  pub fn name(&self, name: &str) -> Result<Option<TextMap>, PatternError> {
    match self.index_of(name) {
      Some(index) => self.group(index),
      None => Ok(None),
    }
  }
}

/// Iterator returned by [`Pattern::finditer`].
pub struct Matches<'m> {
  pattern: &'m Pattern,
  map: &'m TextMap,
  pos: usize,
  forbid_empty_at: Option<usize>,
}

impl<'m> Iterator for Matches<'m> {
  type Item = Match<'m>;

  fn next(&mut self) -> Option<Match<'m>> {
    let caps = captures_from(
      &self.pattern.regex,
      self.map.text(),
      self.pos,
      self.forbid_empty_at,
    )?;
    let end = caps.get(0)?.end();
    self.pos = end;
    self.forbid_empty_at = Some(end);
    Some(Match::new(self.pattern, self.map, &caps))
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{ast, sequencer::SequenceInput, tree::NodeKind};

  const HELLO: &str = r#"{"blocks": [{"t": "Para", "c": [
    {"t": "Str", "text": "hello"}, {"t": "Space"}, {"t": "Str", "text": "world"}]}]}"#;

  fn text_of(doc: &Document) -> String {
    Sequencer::default()
      .text(doc, SequenceInput::Nodes(&[doc.meta(), doc.root()]))
      .unwrap()
  }

  #[test]
  fn test_rm_removes_only_matching_units() {
    let mut doc = ast::parse(
      r#"{"blocks": [{"t": "Para", "c": [
        {"t": "Str", "text": "a"}, {"t": "Str", "text": "X"}, {"t": "Str", "text": "b"},
        {"t": "Str", "text": "X"}, {"t": "Str", "text": "c"}]}]}"#,
    )
    .unwrap();
    let para = doc.children(doc.root()).unwrap()[0];
    let nodes = doc.children(para).unwrap().to_vec();
    let seq = Sequencer::default();

    assert_eq!(Pattern::new("X").unwrap().rm(&mut doc, &seq, 0).unwrap(), 2);
    assert_eq!(text_of(&doc), "abc\n");
    assert!(doc.is_attached(nodes[0]));
    assert!(!doc.is_attached(nodes[1]));
    assert!(doc.is_attached(nodes[2]));
    assert!(!doc.is_attached(nodes[3]));
    assert!(doc.is_attached(nodes[4]));
  }

  #[test]
  fn test_rm_within_one_unit() {
    let mut doc =
      ast::parse(r#"{"blocks": [{"t": "Para", "c": [{"t": "Str", "text": "aXbXc"}]}]}"#).unwrap();
    let seq = Sequencer::default();
    assert_eq!(Pattern::new("X").unwrap().rm(&mut doc, &seq, 0).unwrap(), 2);
    assert_eq!(text_of(&doc), "abc\n");
  }

  #[test]
  fn test_rm_count() {
    let mut doc =
      ast::parse(r#"{"blocks": [{"t": "Para", "c": [{"t": "Str", "text": "aXbXc"}]}]}"#).unwrap();
    let seq = Sequencer::default();
    assert_eq!(Pattern::new("X").unwrap().rm(&mut doc, &seq, 1).unwrap(), 1);
    assert_eq!(text_of(&doc), "abXc\n");
  }

  #[test]
  fn test_group_removes_matched_text() {
    let mut doc = ast::parse(HELLO).unwrap();
    let seq = Sequencer::default();
    let map = TextMap::for_document(&doc, &seq).unwrap();
    let pattern = Pattern::new("(?P<head>wor)ld").unwrap();
    let m = pattern.search(&map, 0).unwrap();
    assert_eq!(m.span(0), Some(6..11));
    assert_eq!(m.group_text(1), Some("wor"));
    assert_eq!(m.index_of("head"), Some(1));
    let group = m.name("head").unwrap().unwrap();
    assert_eq!(group.text(), "wor");
    assert_eq!(group.doc_text_start_index(), 6);

    group
      .remove_slice_by_doc_text_range(&mut doc, 6, 3)
      .unwrap();
    let text = text_of(&doc);
    assert_eq!(text, "hello ld\n");
    assert!(!text.contains("wor"));
  }

  #[test]
  fn test_match_variants() {
    let doc = ast::parse(HELLO).unwrap();
    let map = TextMap::for_document(&doc, &Sequencer::default()).unwrap();
    let world = Pattern::new("world").unwrap();
    assert!(world.r#match(&map, 0).is_none());
    assert_eq!(world.r#match(&map, 6).unwrap().start(), 6);
    assert!(world.fullmatch(&map, 6).is_none());
    assert!(Pattern::new(r"world\n")
      .unwrap()
      .fullmatch(&map, 6)
      .is_some());
    assert!(world.search(&map, 7).is_none());
    assert_eq!(
      Pattern::new("[a-z]+").unwrap().findall(&map),
      vec!["hello".to_string(), "world".to_string()]
    );
    let empty = Pattern::new("(x)?o").unwrap();
    let m = empty.search(&map, 0).unwrap();
    assert!(m.group(1).unwrap().is_none());
    let spans: Vec<usize> = empty.finditer(&map, 0).map(|m| m.start()).collect();
    assert_eq!(spans, vec![4, 7]);
  }

  #[test]
  fn test_sub_with_template_and_count() {
    let mut doc = ast::parse(HELLO).unwrap();
    let seq = Sequencer::default();
    Pattern::new(r"([a-z]+)")
      .unwrap()
      .sub(&mut doc, &seq, "<$1>", 1)
      .unwrap();
    assert_eq!(text_of(&doc), "<hello> world\n");
  }

  #[test]
  fn test_sub_empty_matches() {
    let mut doc =
      ast::parse(r#"{"blocks": [{"t": "Para", "c": [{"t": "Str", "text": "ab"}]}]}"#).unwrap();
    let seq = Sequencer::default();
    assert_eq!(
      Pattern::new("").unwrap().subn(&mut doc, &seq, "-", 0).unwrap(),
      3
    );
    assert_eq!(text_of(&doc), "-a-b-\n");
  }

  #[test]
  fn test_boundary_matches_are_passed_over() {
    let two = r#"{"blocks": [{"t": "Para", "c": [{"t": "Str", "text": "a"}]},
                             {"t": "Para", "c": [{"t": "Str", "text": "b"}]}]}"#;
    let seq = Sequencer::default();
    let newline = Pattern::new("\n").unwrap();

    let mut doc = ast::parse(two).unwrap();
    assert_eq!(newline.subn(&mut doc, &seq, " ", 0).unwrap(), 0);
    assert_eq!(text_of(&doc), "a\nb\n");
    assert_eq!(newline.rm(&mut doc, &seq, 0).unwrap(), 0);
    assert_eq!(text_of(&doc), "a\nb\n");

    /* Matches elsewhere in the same pass are still replaced. */
    assert_eq!(
      Pattern::new("\n|b")
        .unwrap()
        .subn(&mut doc, &seq, "-", 0)
        .unwrap(),
      1
    );
    assert_eq!(text_of(&doc), "a\n-\n");

    let mut doc = ast::parse(two).unwrap();
    assert_eq!(
      Pattern::new("a\n").unwrap().subn(&mut doc, &seq, "x", 0).unwrap(),
      1
    );
    assert_eq!(text_of(&doc), "x\nb\n");
  }

  #[test]
  fn test_empty_matches_removed_with_nothing_do_not_count() {
    let mut doc =
      ast::parse(r#"{"blocks": [{"t": "Para", "c": [{"t": "Str", "text": "ab"}]}]}"#).unwrap();
    let seq = Sequencer::default();
    assert_eq!(Pattern::new("x*").unwrap().rm(&mut doc, &seq, 0).unwrap(), 0);
    assert_eq!(text_of(&doc), "ab\n");
  }

  #[test]
  fn test_sub_growing_replacement_terminates() {
    let mut doc = ast::parse(HELLO).unwrap();
    let seq = Sequencer::default();
    assert_eq!(
      Pattern::new("o").unwrap().subn(&mut doc, &seq, "oo", 0).unwrap(),
      2
    );
    assert_eq!(text_of(&doc), "helloo woorld\n");
  }

  #[test]
  fn test_sub_nodes() {
    let mut doc = ast::parse(HELLO).unwrap();
    let seq = Sequencer::default();
    let link = AstNode::new(
      NodeKind::Link {
        attr: Default::default(),
        url: "https://example.com".to_string(),
        title: String::new(),
      },
      vec![AstNode::str("earth")],
    );
    assert_eq!(
      Pattern::new("world")
        .unwrap()
        .sub_nodes(&mut doc, &seq, &[link], 0)
        .unwrap(),
      1
    );
    assert_eq!(text_of(&doc), "hello earth\u{200C}\n");
  }

  #[test]
  fn test_bad_pattern() {
    assert!(matches!(Pattern::new("("), Err(PatternError::Regex(_))));
  }
}
