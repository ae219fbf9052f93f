use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{error::Result, model::NotificationRequest};

/// Sorts `pending` by each identifier's first position in `order`. Requests
/// the ordering has never seen keep their relative order and go last.
pub fn arrange(pending: Vec<NotificationRequest>, order: &[String]) -> Vec<NotificationRequest> {
    let mut rank: HashMap<&str, usize> = HashMap::with_capacity(order.len());
    for (idx, id) in order.iter().enumerate() {
        rank.entry(id.as_str()).or_insert(idx);
    }
    let mut indexed: Vec<(usize, usize, NotificationRequest)> = pending
        .into_iter()
        .enumerate()
        .map(|(arrival, request)| {
            let position = rank
                .get(request.identifier.as_str())
                .copied()
                .unwrap_or(usize::MAX);
            (position, arrival, request)
        })
        .collect();
    indexed.sort_by_key(|(position, arrival, _)| (*position, *arrival));
    indexed.into_iter().map(|(_, _, request)| request).collect()
}

/// Moves the items at `from` so they sit just before the item that was at
/// `to`, keeping their relative order. Out-of-range positions are ignored and
/// `to` is clamped to the end. Returns whether anything moved.
pub fn move_positions<T>(items: &mut Vec<T>, from: &BTreeSet<usize>, to: usize) -> bool {
    let len = items.len();
    let to = to.min(len);
    let from: Vec<usize> = from.iter().copied().filter(|idx| *idx < len).collect();
    if from.is_empty() {
        return false;
    }
    let before_target = from.iter().filter(|idx| **idx < to).count();
    let insert_at = to - before_target;

    let mut moved = Vec::with_capacity(from.len());
    for idx in from.iter().rev() {
        moved.push(items.remove(*idx));
    }
    moved.reverse();

    let unchanged = from
        .iter()
        .enumerate()
        .all(|(offset, idx)| *idx == insert_at + offset);
    items.splice(insert_at..insert_at, moved);
    !unchanged
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct JournalFile {
    order: Vec<String>,
}

/// JSON file that remembers the user's ordering across restarts.
#[derive(Debug, Clone)]
pub struct OrderJournal {
    path: PathBuf,
}

impl OrderJournal {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty ordering.
    pub fn load(&self) -> Result<Vec<String>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let file: JournalFile = serde_json::from_str(&raw)?;
        Ok(file.order)
    }

    pub fn save(&self, order: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let payload = serde_json::to_string_pretty(&JournalFile {
            order: order.to_vec(),
        })?;
        fs::write(&self.path, payload)?;
        Ok(())
    }
}
