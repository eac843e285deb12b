/*
 * Description: Search and edit exported documents through a flattened text overlay of their AST.
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

//! Search and edit exported documents through a flattened text overlay of their AST.

#![deny(rustdoc::missing_crate_level_docs)]
/* Make all doctests fail if they produce any warnings. */
#![doc(test(attr(deny(warnings))))]
#![deny(clippy::all)]

mod json_client;

use docmap_overlay::{
  map::TextMap, pattern::Pattern, rules::RuleSet, sequencer::Sequencer, session::Session, Error,
};

use clap::{Parser, Subcommand};

use std::{
  fs,
  io::{self, BufRead, Read, Write},
  path::PathBuf,
};

#[derive(Debug, Parser)]
#[clap(author, version, about, long_about = None)]
struct Opts {
  /// Read the document's JSON from this file instead of stdin.
  #[clap(long, global = true)]
  input: Option<PathBuf>,
  /// Separate blocks with zero-width non-joiners instead of newlines.
  #[clap(long, global = true)]
  no_paragraph_breaks: bool,
  #[clap(subcommand)]
  action: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
  /// Print the document's flattened text.
  Text,
  /// Replace matches of a regex, then print the edited document.
  Sub {
    pattern: String,
    replacement: String,
    /// Stop after this many replacements. 0 replaces every match.
    #[clap(short, long, default_value_t = 0)]
    count: usize,
  },
  /// Remove matches of a regex, then print the edited document.
  Rm {
    pattern: String,
    #[clap(short, long, default_value_t = 0)]
    count: usize,
  },
  /// Apply a rule set until the document stops changing, then print it.
  Scrub {
    /// A JSON rule set.
    rules: PathBuf,
  },
  /// Communicate via lines of JSON over stdio.
  Serve,
}

fn read_document(input: Option<&PathBuf>) -> io::Result<String> {
  match input {
    Some(path) => fs::read_to_string(path),
    None => {
      let mut source = String::new();
      io::stdin().lock().read_to_string(&mut source)?;
      Ok(source)
    },
  }
}

fn print_document(session: &Session) -> Result<(), Box<dyn std::error::Error>> {
  let mut json = session.to_json()?.into_bytes();
  json.push(b'\n');
  io::stdout().write_all(&json)?;
  Ok(())
}

/* echo '{"blocks": [{"t": "Para", "c": [{"t": "Str", "text": "aXb"}]}]}' | cargo run -- rm X */
fn main() -> Result<(), Box<dyn std::error::Error>> {
  env_logger::init();
  let Opts {
    input,
    no_paragraph_breaks,
    action,
  } = Opts::parse();
  let seq = Sequencer {
    paragraph_breaks: !no_paragraph_breaks,
  };

  match action {
    Action::Serve => {
      /* Stdin carries requests here, so only an explicit file seeds the session. */
      let source = input.as_ref().map(fs::read_to_string).transpose()?;
      let mut server = json_client::Server::new(Session::new(source), seq);

      /* Hook up stdio to the session by JSON en/decoding lines. */
      for line in io::stdin().lock().lines() {
        let request: json_client::Request = serde_json::from_str(&line?)?;
        let response = server.process(request);
        let mut response: Vec<u8> = serde_json::to_vec(&response)?;
        /* Ensure we have clear lines between entries in stdout. */
        response.push(b'\n');
        io::stdout().write_all(&response)?;
      }
    },
    Action::Text => {
      let session = Session::new(Some(read_document(input.as_ref())?));
      let text = session
        .read(|doc| Ok::<_, Error>(TextMap::for_document(doc, &seq)?.text().to_string()))?;
      io::stdout().write_all(text.as_bytes())?;
    },
    Action::Sub {
      pattern,
      replacement,
      count,
    } => {
      let pattern = Pattern::new(&pattern)?;
      let session = Session::new(Some(read_document(input.as_ref())?));
      let n = session.write(|doc| Ok::<_, Error>(pattern.subn(doc, &seq, &replacement, count)?))?;
      log::info!("made {} replacements", n);
      print_document(&session)?;
    },
    Action::Rm { pattern, count } => {
      let pattern = Pattern::new(&pattern)?;
      let session = Session::new(Some(read_document(input.as_ref())?));
      let n = session.write(|doc| Ok::<_, Error>(pattern.rm(doc, &seq, count)?))?;
      log::info!("made {} removals", n);
      print_document(&session)?;
    },
    Action::Scrub { rules } => {
      let rules = RuleSet::from_json(&fs::read_to_string(rules)?)?;
      let session = Session::new(Some(read_document(input.as_ref())?));
      let result = session.write(|doc| Ok::<_, Error>(rules.converge(doc, &seq)?))?;
      log::info!(
        "converged after {} passes at {}",
        result.passes,
        result.checksum
      );
      print_document(&session)?;
    },
  }

  Ok(())
}
