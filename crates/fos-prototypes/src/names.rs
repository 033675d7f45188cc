//! Event-name lists

use crate::{Error, Result};

/// Split a whitespace-separated list such as `"click mouseover"`
pub(crate) fn event_names(names: &str) -> Result<Vec<&str>> {
    let list: Vec<&str> = names.split_ascii_whitespace().collect();
    if list.is_empty() {
        return Err(Error::NoEventNames);
    }
    Ok(list)
}
