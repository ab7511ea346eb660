// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! File-system watcher feeding the database event queue
//!
//! The watcher callback runs on the backend's thread and only pushes into a
//! lock-free queue. The database drains it on its own tick, pairing the
//! halves of a move with [`RenameCoalescer`] first.

use crate::error::Result;
use crossbeam::queue::SegQueue;
use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use smallvec::SmallVec;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Raw change reported for a full filesystem path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSystemEvent {
    Changed(PathBuf),
    Created(PathBuf),
    Deleted(PathBuf),
    Renamed { from: PathBuf, to: PathBuf },
    /// One side of a move reported on its own. Paired before handling,
    /// otherwise it counts as a delete or a create.
    RenameHalf { path: PathBuf, side: RenameSide },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameSide {
    From,
    To,
}

pub type EventQueue = Arc<SegQueue<FileSystemEvent>>;

impl FileSystemEvent {
    /// Translate a backend event. Access and unclassified events map to
    /// nothing.
    pub fn from_notify(event: &notify::Event) -> SmallVec<[FileSystemEvent; 2]> {
        let paths = &event.paths;
        let each = |make: fn(PathBuf) -> FileSystemEvent| -> SmallVec<[FileSystemEvent; 2]> {
            paths.iter().cloned().map(make).collect()
        };

        match event.kind {
            EventKind::Create(_) => each(FileSystemEvent::Created),
            EventKind::Remove(_) => each(FileSystemEvent::Deleted),
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if paths.len() >= 2 => {
                smallvec::smallvec![FileSystemEvent::Renamed {
                    from: paths[0].clone(),
                    to: paths[1].clone(),
                }]
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => each(FileSystemEvent::moved_from),
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => each(FileSystemEvent::moved_to),
            // Backends that cannot tell the sides apart report each path alone.
            EventKind::Modify(ModifyKind::Name(_)) => paths
                .iter()
                .map(|path| {
                    if path.exists() {
                        FileSystemEvent::moved_to(path.clone())
                    } else {
                        FileSystemEvent::moved_from(path.clone())
                    }
                })
                .collect(),
            EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Metadata(_) | ModifyKind::Any) => {
                each(FileSystemEvent::Changed)
            }
            _ => SmallVec::new(),
        }
    }

    /// Path the event refers to now.
    pub fn path(&self) -> &Path {
        match self {
            Self::Changed(path) | Self::Created(path) | Self::Deleted(path) => path,
            Self::Renamed { to, .. } => to,
            Self::RenameHalf { path, .. } => path,
        }
    }

    fn moved_from(path: PathBuf) -> Self {
        Self::RenameHalf {
            path,
            side: RenameSide::From,
        }
    }

    fn moved_to(path: PathBuf) -> Self {
        Self::RenameHalf {
            path,
            side: RenameSide::To,
        }
    }

    fn is_half(&self, side: RenameSide) -> bool {
        matches!(self, Self::RenameHalf { side: s, .. } if *s == side)
    }
}

/// Joins the separately reported sides of a move into one
/// [`FileSystemEvent::Renamed`].
///
/// inotify reports a move as `From`, `To` and then `Both`; other backends
/// stop after the two halves. A `From` that ends a batch is held for one
/// more batch since its `To` may still be in flight.
#[derive(Debug, Default)]
pub struct RenameCoalescer {
    held: Option<FileSystemEvent>,
    /// Pairs built from halves in the last batch, so a late `Both` is dropped.
    paired: Vec<(PathBuf, PathBuf)>,
}

impl RenameCoalescer {
    pub fn has_held(&self) -> bool {
        self.held.is_some()
    }

    pub fn coalesce(&mut self, incoming: Vec<FileSystemEvent>) -> Vec<FileSystemEvent> {
        let carried = usize::from(self.held.is_some());
        let mut paired_before = std::mem::take(&mut self.paired);
        let mut events: Vec<Option<FileSystemEvent>> =
            self.held.take().into_iter().chain(incoming).map(Some).collect();

        let whole: Vec<(PathBuf, PathBuf)> = events
            .iter()
            .flatten()
            .filter_map(|event| match event {
                FileSystemEvent::Renamed { from, to } => Some((from.clone(), to.clone())),
                _ => None,
            })
            .collect();

        for slot in &mut events {
            let redundant = match slot.as_ref() {
                Some(FileSystemEvent::RenameHalf { path, side }) => {
                    whole.iter().any(|(from, to)| match side {
                        RenameSide::From => from == path,
                        RenameSide::To => to == path,
                    })
                }
                Some(FileSystemEvent::Renamed { from, to }) => {
                    match paired_before.iter().position(|(f, t)| f == from && t == to) {
                        Some(index) => {
                            paired_before.swap_remove(index);
                            true
                        }
                        None => false,
                    }
                }
                _ => false,
            };
            if redundant {
                *slot = None;
            }
        }

        let mut out = Vec::with_capacity(events.len());
        for index in 0..events.len() {
            let Some(event) = events[index].take() else {
                continue;
            };
            match event {
                FileSystemEvent::RenameHalf {
                    path,
                    side: RenameSide::From,
                } => {
                    let next = (index + 1..events.len()).find(|&j| events[j].is_some());
                    match next {
                        Some(j) if events[j].as_ref().is_some_and(|e| e.is_half(RenameSide::To)) => {
                            if let Some(FileSystemEvent::RenameHalf { path: to, .. }) = events[j].take() {
                                self.paired.push((path.clone(), to.clone()));
                                out.push(FileSystemEvent::Renamed { from: path, to });
                            }
                        }
                        None if index >= carried => self.held = Some(FileSystemEvent::moved_from(path)),
                        _ => out.push(FileSystemEvent::Deleted(path)),
                    }
                }
                FileSystemEvent::RenameHalf {
                    path,
                    side: RenameSide::To,
                } => out.push(FileSystemEvent::Created(path)),
                other => out.push(other),
            }
        }
        out
    }
}

/// Recursive watcher on one root. Dropping it stops watching.
pub struct FileWatcher {
    root: PathBuf,
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    pub fn watch(root: impl Into<PathBuf>, queue: EventQueue) -> Result<Self> {
        let root = root.into();
        let mut watcher = notify::recommended_watcher(move |event: notify::Result<notify::Event>| {
            match event {
                Ok(event) => {
                    for translated in FileSystemEvent::from_notify(&event) {
                        queue.push(translated);
                    }
                }
                Err(err) => warn!(error = %err, "file watcher error"),
            }
        })?;
        watcher.watch(&root, RecursiveMode::Recursive)?;
        debug!(root = %root.display(), "watching directory");

        Ok(Self {
            root,
            _watcher: watcher,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
