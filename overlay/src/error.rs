/*
 * Description: Define top-level error types.
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

//! Define top-level [enum@Error] types.

use displaydoc::Display;
use thiserror::Error;

use std::ops::Range;

/// Parent error type for this crate.
#[derive(Debug, Display, Error)]
pub enum Error {
  /// an error {0} occurred when manipulating the document tree
  Tree(#[from] crate::tree::TreeError),
  /// an error {0} occurred when (de)serializing a document
  Ast(#[from] crate::ast::AstError),
  /// an error {0} occurred when editing a text unit
  Unit(#[from] crate::units::UnitError),
  /// an error {0} occurred when slicing or editing a text map
  Map(#[from] crate::map::MapError),
  /// an error {0} occurred when matching a pattern
  Pattern(#[from] crate::pattern::PatternError),
  /// an error {0} occurred when accessing a session
  Session(#[from] crate::session::SessionError),
  /// an error {0} occurred when applying a rule set
  Rule(#[from] crate::rules::RuleError),
}

/// range of {len} bytes at {start} is invalid within {bounds:?}: {reason}
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub struct RangeError {
  pub start: usize,
  pub len: usize,
  pub bounds: Range<usize>,
  pub reason: &'static str,
}

impl RangeError {
  pub fn new(start: usize, len: usize, bounds: Range<usize>, reason: &'static str) -> Self {
    Self {
      start,
      len,
      bounds,
      reason,
    }
  }

  /// Check that `[start, start+len)` lies within `bounds`, optionally allowing an empty range.
  pub fn check(
    start: usize,
    len: usize,
    bounds: Range<usize>,
    allow_empty: bool,
  ) -> Result<(), Self> {
    if len == 0 && !allow_empty {
      return Err(Self::new(start, len, bounds, "range must not be empty"));
    }
    let end = start
      .checked_add(len)
      .ok_or_else(|| Self::new(start, len, bounds.clone(), "range end overflows"))?;
    if start < bounds.start || end > bounds.end {
      return Err(Self::new(start, len, bounds, "range exceeds bounds"));
    }
    Ok(())
  }

  /// Check that both ends of `[start, start+len)` fall on char boundaries of `text`, where `text`
  /// begins at `offset`.
  pub fn check_char_boundaries(
    text: &str,
    offset: usize,
    start: usize,
    len: usize,
  ) -> Result<(), Self> {
    let local = start - offset;
    if !text.is_char_boundary(local) || !text.is_char_boundary(local + len) {
      return Err(Self::new(
        start,
        len,
        offset..(offset + text.len()),
        "range does not fall on char boundaries",
      ));
    }
    Ok(())
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn test_check_range() {
    assert!(RangeError::check(0, 3, 0..3, false).is_ok());
    assert!(RangeError::check(2, 0, 0..3, true).is_ok());
    assert_eq!(
      RangeError::check(1, 0, 0..3, false).unwrap_err().reason,
      "range must not be empty"
    );
    assert_eq!(
      RangeError::check(2, 2, 0..3, false).unwrap_err().reason,
      "range exceeds bounds"
    );
    assert_eq!(
      RangeError::check(0, 1, 1..3, false).unwrap_err().reason,
      "range exceeds bounds"
    );
    assert!(RangeError::check(usize::MAX, 2, 0..3, false).is_err());
  }

  #[test]
  fn test_char_boundaries() {
    let text = "a\u{200C}b";
    assert!(RangeError::check_char_boundaries(text, 10, 11, 3).is_ok());
    assert!(RangeError::check_char_boundaries(text, 10, 12, 1).is_err());
  }
}
