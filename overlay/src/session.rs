/*
 * Description: Track whether edits to a document have diverged from its last saved form.
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

//! Track whether edits to a document have diverged from its last saved form.
//!
//! A [`Session`] holds the committed serialization of a document, and materializes the tree from
//! it on first access. All access happens in read or write *turns*. A write turn hands its closure
//! a [`WriteTurn`], which derefs to the document and opens nested writes within the same turn.
//! When the outermost write turn ends, the tree is serialized again and compared to the committed
//! form.
//!
//!```
//! # fn main() -> Result<(), docmap_overlay::Error> {
//! use docmap_overlay::{map::TextMap, pattern::Pattern, sequencer::Sequencer, session::Session};
//!
//! let session = Session::new(Some(
//!   r#"{"blocks": [{"t": "Para", "c": [{"t": "Str", "text": "aXb"}]}]}"#.to_string(),
//! ));
//! let seq = Sequencer::default();
//!
//! session.write(|doc| Ok::<_, docmap_overlay::Error>(Pattern::new("X")?.rm(doc, &seq, 0)?))?;
//! assert!(session.is_dirty()?);
//! session.commit_changes()?;
//! assert!(!session.is_dirty()?);
//!
//! let text = session.read(|doc| Ok::<_, docmap_overlay::Error>(TextMap::for_document(doc, &seq)?.text().to_string()))?;
//! assert_eq!(text, "ab\n");
//! # Ok(())
//! # }
//!```

use crate::{
  ast::{self, AstError},
  tree::Document,
};

use displaydoc::Display;
use thiserror::Error;

use std::{
  cell::{Cell, RefCell},
  ops::{Deref, DerefMut},
};

#[derive(Debug, Display, Copy, Clone, PartialEq, Eq)]
pub enum Turn {
  /// idle
  Idle,
  /// reading (depth {0})
  Reading(usize),
  /// writing (depth {0})
  Writing(usize),
}

#[derive(Debug, Display, Error)]
pub enum SessionError {
  /// {0} is only allowed while idle
  InvalidState(&'static str),
  /// cannot begin {requested} while {current}
  ConcurrentAccess {
    requested: &'static str,
    current: Turn,
  },
  /// {0}
  Ast(#[from] AstError),
}

/// Restores the previous turn when dropped.
struct TurnGuard<'s> {
  turn: &'s Cell<Turn>,
  previous: Turn,
}

impl<'s> Drop for TurnGuard<'s> {
  fn drop(&mut self) { self.turn.set(self.previous); }
}

/// The document as lent to one write turn.
pub struct WriteTurn<'t> {
  session: &'t Session,
  doc: &'t mut Document,
  depth: usize,
}

impl<'t> WriteTurn<'t> {
  /// How many writes deep this turn is. The outermost write is 1.
  pub fn depth(&self) -> usize { self.depth }

  /// Run `f` as a nested write within this turn. Only the outermost write records changes.
  pub fn write<T, E, F>(&mut self, f: F) -> Result<T, E>
  where
    F: FnOnce(&mut WriteTurn<'_>) -> Result<T, E>,
  {
    let session = self.session;
    let depth = self.depth + 1;
    let _guard = session.enter(Turn::Writing(depth));
    f(&mut WriteTurn {
      session,
      doc: &mut *self.doc,
      depth,
    })
  }
}

impl<'t> Deref for WriteTurn<'t> {
  type Target = Document;

  fn deref(&self) -> &Document { &*self.doc }
}

impl<'t> DerefMut for WriteTurn<'t> {
  fn deref_mut(&mut self) -> &mut Document { &mut *self.doc }
}

#[derive(Debug, Default)]
pub struct Session {
  turn: Cell<Turn>,
  tree: RefCell<Option<Document>>,
  committed: RefCell<String>,
  /// A serialization differing from `committed`, if the tree has diverged.
  staged: RefCell<Option<String>>,
}

impl Default for Turn {
  fn default() -> Self { Self::Idle }
}

impl Session {
  /// Start from a serialized document. No source, or an empty one, means an empty document.
  pub fn new(source: Option<String>) -> Self {
    Self {
      committed: RefCell::new(source.unwrap_or_default()),
      ..Default::default()
    }
  }

  pub fn turn(&self) -> Turn { self.turn.get() }

  fn enter(&self, next: Turn) -> TurnGuard<'_> {
    let previous = self.turn.replace(next);
    TurnGuard {
      turn: &self.turn,
      previous,
    }
  }

  fn ensure_idle(&self, operation: &'static str) -> Result<(), SessionError> {
    match self.turn.get() {
      Turn::Idle => Ok(()),
      _ => Err(SessionError::InvalidState(operation)),
    }
  }

  /// Parse the committed form, adopting its re-serialization as the committed form.
  fn parse_committed(&self) -> Result<Document, SessionError> {
    let doc = ast::parse(&self.committed.borrow())?;
    *self.committed.borrow_mut() = ast::to_json(&doc)?;
    log::debug!("materialized session tree");
    Ok(doc)
  }

  /// Parse the committed form, if that hasn't happened yet. Never called during a write.
  fn materialize(&self) -> Result<(), SessionError> {
    if self.tree.borrow().is_some() {
      return Ok(());
    }
    let doc = self.parse_committed()?;
    *self.tree.borrow_mut() = Some(doc);
    Ok(())
  }

  /// Run `f` against the document. Reads nest, but cannot begin during a write.
  pub fn read<T, E, F>(&self, f: F) -> Result<T, E>
  where
    F: FnOnce(&Document) -> Result<T, E>,
    E: From<SessionError>,
  {
    let next = match self.turn.get() {
      Turn::Idle => Turn::Reading(1),
      Turn::Reading(depth) => Turn::Reading(depth + 1),
      current @ Turn::Writing(_) => {
        return Err(
          SessionError::ConcurrentAccess {
            requested: "read",
            current,
          }
          .into(),
        )
      },
    };
    let _guard = self.enter(next);
    self.materialize()?;
    let tree = self.tree.borrow();
    match tree.as_ref() {
      Some(doc) => f(doc),
      None => Err(SessionError::InvalidState("reading an unmaterialized tree").into()),
    }
  }

  /// Run `f` against the document, then record whether the document has diverged from its
  /// committed form.
  ///
  /// A write can only begin while idle. Nested writes go through [`WriteTurn::write`], since the
  /// document is already lent out to the open turn.
  pub fn write<T, E, F>(&self, f: F) -> Result<T, E>
  where
    F: FnOnce(&mut WriteTurn<'_>) -> Result<T, E>,
    E: From<SessionError>,
  {
    let current = self.turn.get();
    let busy = SessionError::ConcurrentAccess {
      requested: "write",
      current,
    };
    if current != Turn::Idle {
      return Err(busy.into());
    }
    let _guard = self.enter(Turn::Writing(1));

    let result = {
      let mut tree = match self.tree.try_borrow_mut() {
        Ok(tree) => tree,
        Err(_) => return Err(busy.into()),
      };
      if tree.is_none() {
        *tree = Some(self.parse_committed()?);
      }
      match tree.as_mut() {
        Some(doc) => f(&mut WriteTurn {
          session: self,
          doc,
          depth: 1,
        }),
        None => return Err(SessionError::InvalidState("writing an unmaterialized tree").into()),
      }
    };

    self.stage()?;
    result
  }

  /// Serialize the tree and compare it to the committed form.
  fn stage(&self) -> Result<(), SessionError> {
    let json = match self.tree.borrow().as_ref() {
      Some(doc) => ast::to_json(doc)?,
      None => return Ok(()),
    };
    let diverged = json != *self.committed.borrow();
    log::debug!("write turn finished, diverged: {}", diverged);
    *self.staged.borrow_mut() = if diverged { Some(json) } else { None };
    Ok(())
  }

  pub fn is_dirty(&self) -> Result<bool, SessionError> {
    self.ensure_idle("checking for changes")?;
    Ok(self.staged.borrow().is_some())
  }

  /// Adopt the current tree as the committed form.
  pub fn commit_changes(&self) -> Result<(), SessionError> {
    self.ensure_idle("committing")?;
    if let Some(staged) = self.staged.borrow_mut().take() {
      *self.committed.borrow_mut() = staged;
      log::debug!("committed changes");
    }
    Ok(())
  }

  /// Drop the current tree, so the next turn starts again from the committed form.
  pub fn discard_changes(&self) -> Result<(), SessionError> {
    self.ensure_idle("discarding")?;
    if self.staged.borrow_mut().take().is_some() {
      *self.tree.borrow_mut() = None;
      log::debug!("discarded changes");
    }
    Ok(())
  }

  /// The serialized form of the current tree.
  pub fn to_json(&self) -> Result<String, SessionError> {
    self.ensure_idle("serializing")?;
    self.materialize()?;
    let staged = self.staged.borrow();
    Ok(match staged.as_ref() {
      Some(json) => json.clone(),
      None => self.committed.borrow().clone(),
    })
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::{map::TextMap, pattern::Pattern, sequencer::Sequencer, tree::NodeKind, Error};

  const SOURCE: &str = r#"{"blocks": [{"t": "Para", "c": [{"t": "Str", "text": "aXb"}]}]}"#;

  fn session() -> Session { Session::new(Some(SOURCE.to_string())) }

  fn text(session: &Session) -> String {
    session
      .read(|doc| {
        Ok::<_, Error>(
          TextMap::for_document(doc, &Sequencer::default())?
            .text()
            .to_string(),
        )
      })
      .unwrap()
  }

  #[test]
  fn test_dirty_tracking() {
    let session = session();
    assert!(!session.is_dirty().unwrap());

    /* A write which changes nothing leaves the session clean. */
    session.write(|_| Ok::<_, Error>(())).unwrap();
    assert!(!session.is_dirty().unwrap());

    session
      .write(|doc| Pattern::new("X")?.rm(doc, &Sequencer::default(), 0).map_err(Error::from))
      .unwrap();
    assert!(session.is_dirty().unwrap());

    session.commit_changes().unwrap();
    assert!(!session.is_dirty().unwrap());
    assert_eq!(text(&session), "ab\n");
  }

  #[test]
  fn test_discard_restores_committed() {
    let session = session();
    session
      .write(|doc| {
        let root = doc.root();
        doc.append_child(root, NodeKind::HorizontalRule)?;
        Ok::<_, Error>(())
      })
      .unwrap();
    assert!(session.is_dirty().unwrap());
    session.discard_changes().unwrap();
    assert!(!session.is_dirty().unwrap());
    let json = session.to_json().unwrap();
    assert!(!json.contains("HorizontalRule"));
    assert_eq!(text(&session), "aXb\n");
  }

  #[test]
  fn test_turn_exclusion() {
    let session = session();
    let result = session.read(|_| {
      let nested: Result<(), SessionError> = session.write(|_| Ok(()));
      assert!(matches!(
        nested,
        Err(SessionError::ConcurrentAccess {
          requested: "write",
          current: Turn::Reading(1)
        })
      ));
      assert!(matches!(
        session.is_dirty(),
        Err(SessionError::InvalidState(_))
      ));
      assert!(matches!(
        session.commit_changes(),
        Err(SessionError::InvalidState(_))
      ));
      /* Reads nest. */
      session.read(|_| {
        assert_eq!(session.turn(), Turn::Reading(2));
        Ok::<_, SessionError>(())
      })
    });
    assert!(result.is_ok());
    assert_eq!(session.turn(), Turn::Idle);

    let result = session.write(|_| {
      let read: Result<(), SessionError> = session.read(|_| Ok(()));
      assert!(matches!(read, Err(SessionError::ConcurrentAccess { .. })));
      let detached: Result<(), SessionError> = session.write(|_| Ok(()));
      assert!(matches!(
        detached,
        Err(SessionError::ConcurrentAccess {
          requested: "write",
          current: Turn::Writing(1)
        })
      ));
      Ok::<_, SessionError>(())
    });
    assert!(result.is_ok());
    assert_eq!(session.turn(), Turn::Idle);
  }

  #[test]
  fn test_nested_writes_share_the_turn() {
    let session = session();
    let seq = Sequencer::default();
    let n = session
      .write(|outer| {
        assert_eq!(outer.depth(), 1);
        let inner = outer.write(|inner| {
          assert_eq!(session.turn(), Turn::Writing(2));
          let n = Pattern::new("X")?.rm(inner, &seq, 0)?;
          /* Nothing is recorded until the outermost write ends. */
          assert!(matches!(
            session.is_dirty(),
            Err(SessionError::InvalidState(_))
          ));
          Ok::<_, Error>(n)
        })?;
        assert_eq!(session.turn(), Turn::Writing(1));
        /* The outer turn sees the inner edit. */
        assert_eq!(TextMap::for_document(outer, &seq)?.text(), "ab\n");
        Ok::<_, Error>(inner)
      })
      .unwrap();
    assert_eq!(n, 1);
    assert_eq!(session.turn(), Turn::Idle);
    assert!(session.is_dirty().unwrap());
    assert_eq!(text(&session), "ab\n");
  }

  #[test]
  fn test_round_trip_is_semantically_equal() {
    let session = session();
    let json = session.to_json().unwrap();
    let a: serde_json::Value = serde_json::from_str(SOURCE).unwrap();
    let mut b: serde_json::Value = serde_json::from_str(&json).unwrap();
    b.as_object_mut().unwrap().remove("api-version");
    assert_eq!(a, b);
    assert!(!session.is_dirty().unwrap());
  }

  #[test]
  fn test_empty_source() {
    let session = Session::new(None);
    assert_eq!(text(&session), "");
    assert_eq!(
      session.to_json().unwrap(),
      r#"{"api-version":[1,0],"blocks":[]}"#
    );
  }
}
