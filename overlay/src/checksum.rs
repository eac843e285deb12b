/*
 * Description: Cheap fingerprints of text, for noticing when a document stops changing.
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

//! Cheap fingerprints of text, for noticing when a document stops changing.

use displaydoc::Display;

use std::{collections::hash_map::DefaultHasher, hash::Hasher};

/// <checksum hash: {hash}, length: {length}>
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextChecksum {
  /// [`DefaultHasher`] output. Not stable across releases, so never persist it.
  pub hash: u64,
  /// Number of **bytes** in the string.
  pub length: usize,
  /// Number of unicode code points in the string.
  pub code_points: usize,
}

impl TextChecksum {
  pub fn extract(text: &str) -> Self {
    let mut hasher = DefaultHasher::new();
    hasher.write(text.as_bytes());
    Self {
      hash: hasher.finish(),
      length: text.len(),
      code_points: text.chars().count(),
    }
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn test_extract() {
    let a = TextChecksum::extract("héllo");
    assert_eq!(a.length, 6);
    assert_eq!(a.code_points, 5);
    assert_eq!(a, TextChecksum::extract("héllo"));
    assert_ne!(a, TextChecksum::extract("hello"));
    assert_eq!(
      format!("{}", TextChecksum::extract("")),
      format!("<checksum hash: {}, length: 0>", TextChecksum::extract("").hash)
    );
  }
}
