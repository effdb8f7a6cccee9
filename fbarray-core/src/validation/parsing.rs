//! Parsing utilities for selector strings
//!
//! Accepted forms: `:` (everything), `start:stop`, `start:stop:step`, and a
//! comma-separated index list such as `3,1,4`.

use alloc::format;
use alloc::vec::Vec;

use crate::selection::Selector;
use crate::{Error, Result};

/// Parse a selector string
pub fn parse_selector(text: &str) -> Result<Selector> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::InvalidSelector("empty selector".into()));
    }
    if text == ":" {
        return Ok(Selector::All);
    }

    if text.contains(':') {
        let parts: Vec<&str> = text.split(':').collect();
        if parts.len() > 3 {
            return Err(Error::InvalidSelector(format!("too many fields in {text:?}")));
        }
        let start = parse_usize(parts[0])?;
        let stop = parse_usize(parts[1])?;
        let step = match parts.get(2) {
            Some(step) => parse_usize(step)?,
            None => 1,
        };
        return Selector::step(start, stop, step);
    }

    text.split(',')
        .map(parse_usize)
        .collect::<Result<Vec<_>>>()
        .map(Selector::List)
}

/// Parse a usize from a string with error handling
fn parse_usize(s: &str) -> Result<usize> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidSelector(format!("not an index: {s:?}")));
    }
    s.parse()
        .map_err(|_| Error::InvalidSelector(format!("index too large: {s:?}")))
}
