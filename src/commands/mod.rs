pub mod invoke;
pub mod plan;
pub mod serve;

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

/// Read an event from a file, or from stdin when the path is `-`
pub fn read_event(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut body = String::new();
        std::io::stdin()
            .read_to_string(&mut body)
            .context("Could not read event from stdin")?;
        return Ok(body);
    }
    std::fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))
}
