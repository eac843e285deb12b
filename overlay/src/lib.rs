/*
 * Description: A flattened, editable text overlay over a heterogeneous document tree.
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

//! A flattened, editable text overlay over a heterogeneous document tree.
//!
//! A [`tree::Document`] is walked in rendered order by a [`sequencer::Sequencer`], which yields
//! [`units::Unit`]s: pieces of text backed by tree nodes, plus synthetic breaks between blocks. A
//! [`map::TextMap`] lays those units end to end into one string addressed by byte offsets, so
//! that a [`pattern::Pattern`] can search it like any other text. Removing or replacing a range
//! of that string edits the nodes underneath it.
//!
//!```
//! # fn main() -> Result<(), docmap_overlay::Error> {
//! use docmap_overlay::{ast, map::TextMap, pattern::Pattern, sequencer::Sequencer};
//!
//! let mut doc = ast::parse(r#"{"blocks": [{"t": "Para", "c": [
//!   {"t": "Str", "text": "a"}, {"t": "Emph", "c": [{"t": "Str", "text": "X"}]},
//!   {"t": "Str", "text": "b"}]}]}"#)?;
//! let seq = Sequencer::default();
//!
//! assert_eq!(Pattern::new("X")?.rm(&mut doc, &seq, 0)?, 1);
//! assert_eq!(TextMap::for_document(&doc, &seq)?.text(), "ab\n");
//! /* The emphasis was left empty, so it went too. */
//! assert!(!ast::to_json(&doc)?.contains("Emph"));
//! # Ok(())
//! # }
//!```

#![deny(rustdoc::missing_crate_level_docs)]
/* Make all doctests fail if they produce any warnings. */
#![doc(test(attr(deny(warnings))))]
#![deny(clippy::all)]

pub mod ast;
pub mod checksum;
pub mod error;
pub mod map;
pub mod pattern;
pub mod rules;
pub mod sequencer;
pub mod session;
pub mod tree;
pub mod units;

pub use error::Error;
