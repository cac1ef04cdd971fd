//! Tick scripts for replaying input through an [`InputSystem`](crate::input::InputSystem)
//!
//! One tick per line:
//!
//! ```text
//! # comment
//! A, B        keys held this tick (commas and/or whitespace)
//! -           no keys held
//! ~           input capture unavailable
//! ```
//!
//! Blank lines and comment lines are not ticks.

use std::path::Path;

use crate::error::{InputError, Result};
use crate::input::{KeyId, KeySnapshot};

/// Parse a tick script into the snapshots fed to `on_tick`
pub fn parse_script(source: &str) -> Result<Vec<Option<KeySnapshot>>> {
    let mut ticks = Vec::new();

    for (idx, raw) in source.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let tick = match line {
            "~" => None,
            "-" => Some(KeySnapshot::new()),
            _ => Some(parse_keys(line, idx + 1)?),
        };
        ticks.push(tick);
    }

    Ok(ticks)
}

fn parse_keys(line: &str, line_no: usize) -> Result<KeySnapshot> {
    let mut keys = Vec::new();
    for name in line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
    {
        let key = name.parse::<KeyId>().map_err(|e| InputError::Script {
            line: line_no,
            message: e.to_string(),
        })?;
        if key.is_wildcard() {
            return Err(InputError::Script {
                line: line_no,
                message: format!("wildcard {:?} cannot be held", name),
            });
        }
        keys.push(key);
    }
    Ok(keys.into_iter().collect())
}

/// Read and parse a tick script file
pub fn load_script(path: &Path) -> Result<Vec<Option<KeySnapshot>>> {
    let source = std::fs::read_to_string(path).map_err(|source| InputError::ConfigIo {
        path: path.to_path_buf(),
        source,
    })?;
    parse_script(&source)
}
