/*
 * Description: Apply named rewriting rules to a document until it stops changing.
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

//! Apply named rewriting rules to a document until it stops changing.
//!
//! Every rule runs once per pass, in the order the rule set lists them. After each pass the
//! serialized tree is fingerprinted with a [`TextChecksum`]; the loop ends once a pass leaves the
//! fingerprint unchanged.
//!
//!```
//! # fn main() -> Result<(), docmap_overlay::Error> {
//! use docmap_overlay::{ast, map::TextMap, rules::RuleSet, sequencer::Sequencer};
//!
//! let rules = RuleSet::from_json(r#"{"rules": {
//!   "no-emphasis": {"rule": "unwrap_kind", "kinds": ["Emph"]},
//!   "collapse": {"rule": "substitute", "pattern": "--", "replacement": "-"}
//! }}"#)?;
//! let mut doc = ast::parse(r#"{"blocks": [{"t": "Para", "c": [
//!   {"t": "Emph", "c": [{"t": "Str", "text": "a----b"}]}]}]}"#)?;
//! let seq = Sequencer::default();
//!
//! let result = rules.converge(&mut doc, &seq)?;
//! assert_eq!(TextMap::for_document(&doc, &seq)?.text(), "a-b\n");
//! assert_eq!(result.passes, 3);
//! # Ok(())
//! # }
//!```

use crate::{
  ast::{self, AstError},
  checksum::TextChecksum,
  pattern::{Pattern, PatternError},
  sequencer::Sequencer,
  tree::{Document, NodeId, NodeKind, TreeError},
};

use displaydoc::Display;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Display, Error)]
pub enum RuleError {
  /// rule set did not converge after {0} passes
  DidNotConverge(usize),
  /// rule {rule:?} names unknown node kind {kind:?}
  UnknownKind { rule: String, kind: String },
  /// rule {0:?} failed: {1}
  Pattern(String, #[source] PatternError),
  /// {0}
  Tree(#[from] TreeError),
  /// {0}
  Ast(#[from] AstError),
  /// failed to parse rule set: {0}
  Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rule {
  /// Detach every node of the given kinds, along with ancestors left useless.
  RemoveKind { kinds: Vec<String> },
  /// Replace every node of the given kinds with its children.
  UnwrapKind { kinds: Vec<String> },
  RemovePattern { pattern: String },
  Substitute { pattern: String, replacement: String },
}

fn default_max_passes() -> usize { 16 }

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
  #[serde(default = "default_max_passes")]
  pub max_passes: usize,
  pub rules: IndexMap<String, Rule>,
}

impl Default for RuleSet {
  fn default() -> Self {
    Self {
      max_passes: default_max_passes(),
      rules: IndexMap::new(),
    }
  }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Convergence {
  /// Passes run, counting the final one which changed nothing.
  pub passes: usize,
  pub checksum: TextChecksum,
}

/// A rule with its patterns compiled and its kinds checked.
enum Compiled<'r> {
  RemoveKind(&'r [String]),
  UnwrapKind(&'r [String]),
  Substitute(Pattern, Option<&'r str>),
}

impl Rule {
  fn compile<'r>(&'r self, name: &str) -> Result<Compiled<'r>, RuleError> {
    let check = |kinds: &'r [String]| -> Result<&'r [String], RuleError> {
      match kinds.iter().find(|k| !NodeKind::NAMES.contains(&k.as_str())) {
        Some(kind) => Err(RuleError::UnknownKind {
          rule: name.to_string(),
          kind: kind.clone(),
        }),
        None => Ok(kinds),
      }
    };
    let pattern = |p: &str| Pattern::new(p).map_err(|e| RuleError::Pattern(name.to_string(), e));
    Ok(match self {
      Self::RemoveKind { kinds } => Compiled::RemoveKind(check(kinds)?),
      Self::UnwrapKind { kinds } => Compiled::UnwrapKind(check(kinds)?),
      Self::RemovePattern { pattern: p } => Compiled::Substitute(pattern(p)?, None),
      Self::Substitute {
        pattern: p,
        replacement,
      } => Compiled::Substitute(pattern(p)?, Some(replacement.as_str())),
    })
  }
}

/// Attached nodes of the given kinds, in document order.
fn nodes_of_kinds(doc: &Document, kinds: &[String]) -> Vec<NodeId> {
  [doc.meta(), doc.root()]
    .iter()
    .flat_map(|top| doc.descendants(*top))
    .filter(|id| {
      doc
        .kind(*id)
        .map(|kind| kinds.iter().any(|k| k == kind.name()))
        .unwrap_or(false)
    })
    .collect()
}

impl<'r> Compiled<'r> {
  fn apply(&self, name: &str, doc: &mut Document, seq: &Sequencer) -> Result<(), RuleError> {
    match self {
      Self::RemoveKind(kinds) => {
        for id in nodes_of_kinds(doc, kinds).into_iter() {
          /* An earlier removal may have taken this one along with it. */
          if doc.is_attached(id) {
            doc.detach_and_prune(id)?;
          }
        }
      },
      Self::UnwrapKind(kinds) => {
        for id in nodes_of_kinds(doc, kinds).into_iter() {
          doc.unwrap_node(id)?;
        }
      },
      Self::Substitute(pattern, replacement) => {
        let result = match replacement {
          Some(replacement) => pattern.subn(doc, seq, replacement, 0),
          None => pattern.rm(doc, seq, 0),
        };
        let n = result.map_err(|e| RuleError::Pattern(name.to_string(), e))?;
        log::trace!("rule {:?} made {} edits", name, n);
      },
    }
    Ok(())
  }
}

impl RuleSet {
  pub fn from_json(json: &str) -> Result<Self, RuleError> { Ok(serde_json::from_str(json)?) }

  /// Apply every rule, pass after pass, until a pass leaves the serialized tree unchanged.
  pub fn converge(&self, doc: &mut Document, seq: &Sequencer) -> Result<Convergence, RuleError> {
    let mut compiled: Vec<(&str, Compiled)> = Vec::with_capacity(self.rules.len());
    for (name, rule) in self.rules.iter() {
      compiled.push((name.as_str(), rule.compile(name)?));
    }

    let mut checksum = TextChecksum::extract(&ast::to_json(doc)?);
    for pass in 1..=self.max_passes {
      for (name, rule) in compiled.iter() {
        rule.apply(name, doc, seq)?;
      }
      let next = TextChecksum::extract(&ast::to_json(doc)?);
      log::debug!("pass {}: {} -> {}", pass, checksum, next);
      if next == checksum {
        return Ok(Convergence {
          passes: pass,
          checksum,
        });
      }
      checksum = next;
    }
    Err(RuleError::DidNotConverge(self.max_passes))
  }
}
