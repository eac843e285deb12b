/*
 * Description: The JSON interface to a document editing session.
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

//! The JSON interface to a document editing session.

use docmap_overlay::{map::TextMap, pattern::Pattern, sequencer::Sequencer, session::Session, Error};

use serde::{Deserialize, Serialize};

/// The JSON interface from editors to this executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum Request {
  /// Replace the session with a new document. No source means an empty document.
  load {
    #[serde(default)]
    source: Option<String>,
  },
  text,
  search {
    pattern: String,
    #[serde(default)]
    pos: usize,
  },
  sub {
    pattern: String,
    replacement: String,
    #[serde(default)]
    count: usize,
  },
  rm {
    pattern: String,
    #[serde(default)]
    count: usize,
  },
  remove_range {
    start: usize,
    len: usize,
  },
  commit,
  discard,
  dirty,
  dump,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Found {
  pub start: usize,
  pub end: usize,
  pub text: String,
}

/// The JSON interface from this executable to editors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum Response {
  ok,
  text(String),
  found(Vec<Found>),
  count(usize),
  dirty(bool),
  ast(String),
  error(String),
}

/// One session, driven by one request at a time.
#[derive(Debug, Default)]
pub struct Server {
  session: Session,
  seq: Sequencer,
}

impl Server {
  pub fn new(session: Session, seq: Sequencer) -> Self { Self { session, seq } }

  pub fn process(&mut self, request: Request) -> Response {
    match self.dispatch(request) {
      Ok(response) => response,
      Err(e) => {
        log::warn!("request failed: {}", e);
        Response::error(e.to_string())
      },
    }
  }

  fn dispatch(&mut self, request: Request) -> Result<Response, Error> {
    let seq = &self.seq;
    Ok(match request {
      Request::load { source } => {
        self.session = Session::new(source);
        /* Parse eagerly, so a bad document is reported here. */
        self.session.to_json()?;
        Response::ok
      },
      Request::text => Response::text(self.session.read(|doc| {
        Ok::<_, Error>(TextMap::for_document(doc, seq)?.text().to_string())
      })?),
      Request::search { pattern, pos } => {
        let pattern = Pattern::new(&pattern)?;
        Response::found(self.session.read(|doc| {
          let map = TextMap::for_document(doc, seq)?;
          let found = pattern
            .finditer(&map, pos)
            .map(|m| Found {
              start: m.start(),
              end: m.end(),
              text: m.group_text(0).unwrap_or_default().to_string(),
            })
            .collect();
          Ok::<_, Error>(found)
        })?)
      },
      Request::sub {
        pattern,
        replacement,
        count,
      } => {
        let pattern = Pattern::new(&pattern)?;
        Response::count(
          self
            .session
            .write(|doc| Ok::<_, Error>(pattern.subn(doc, seq, &replacement, count)?))?,
        )
      },
      Request::rm { pattern, count } => {
        let pattern = Pattern::new(&pattern)?;
        Response::count(
          self
            .session
            .write(|doc| Ok::<_, Error>(pattern.rm(doc, seq, count)?))?,
        )
      },
      Request::remove_range { start, len } => Response::count(self.session.write(|doc| {
        let removal =
          TextMap::for_document(doc, seq)?.remove_slice_by_doc_text_range(doc, start, len)?;
        Ok::<_, Error>(removal.removed)
      })?),
      Request::commit => {
        self.session.commit_changes()?;
        Response::ok
      },
      Request::discard => {
        self.session.discard_changes()?;
        Response::ok
      },
      Request::dirty => Response::dirty(self.session.is_dirty()?),
      Request::dump => Response::ast(self.session.to_json()?),
    })
  }
}
