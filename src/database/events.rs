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


//! Database notifications and their observers

use crate::error::Result;
use crate::location::AssetLocation;
use tracing::warn;

/// Something happened to an asset on disk or in the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetNotification {
    /// The source changed and the asset was reimported
    Changed {
        location: AssetLocation,
        is_folder: bool,
    },
    /// A new file or folder was picked up
    Imported {
        location: AssetLocation,
        is_folder: bool,
    },
    Removed {
        location: AssetLocation,
        is_folder: bool,
    },
    Renamed {
        from: AssetLocation,
        to: AssetLocation,
        is_folder: bool,
    },
    /// An import pass finished successfully. Cascades report in order.
    Reimported {
        location: AssetLocation,
        is_folder: bool,
    },
}

impl AssetNotification {
    /// Current location of the asset; the new one for renames.
    pub fn location(&self) -> &AssetLocation {
        match self {
            Self::Changed { location, .. }
            | Self::Imported { location, .. }
            | Self::Removed { location, .. }
            | Self::Reimported { location, .. } => location,
            Self::Renamed { to, .. } => to,
        }
    }

    pub fn is_folder(&self) -> bool {
        match self {
            Self::Changed { is_folder, .. }
            | Self::Imported { is_folder, .. }
            | Self::Removed { is_folder, .. }
            | Self::Renamed { is_folder, .. }
            | Self::Reimported { is_folder, .. } => *is_folder,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Changed { .. } => "changed",
            Self::Imported { .. } => "imported",
            Self::Removed { .. } => "removed",
            Self::Renamed { .. } => "renamed",
            Self::Reimported { .. } => "reimported",
        }
    }
}

/// Receives database notifications
pub trait AssetObserver: Send + Sync {
    /// Errors are logged by the database and never stop delivery.
    fn on_notification(&mut self, notification: &AssetNotification) -> Result<()>;

    fn name(&self) -> &str {
        "AssetObserver"
    }
}

type NotificationCallback = Box<dyn FnMut(&AssetNotification) -> Result<()> + Send + Sync>;

/// Closure-based observer
pub struct CallbackObserver {
    name: String,
    callback: NotificationCallback,
}

impl CallbackObserver {
    pub fn new<F>(callback: F) -> Self
    where
        F: FnMut(&AssetNotification) -> Result<()> + Send + Sync + 'static,
    {
        Self::named("CallbackObserver", callback)
    }

    pub fn named<F>(name: impl Into<String>, callback: F) -> Self
    where
        F: FnMut(&AssetNotification) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            callback: Box::new(callback),
        }
    }
}

impl AssetObserver for CallbackObserver {
    fn on_notification(&mut self, notification: &AssetNotification) -> Result<()> {
        (self.callback)(notification)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Registered observers, notified in registration order
#[derive(Default)]
pub struct ObserverList {
    observers: Vec<Box<dyn AssetObserver>>,
}

impl ObserverList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index to unregister with.
    pub fn register(&mut self, observer: Box<dyn AssetObserver>) -> usize {
        self.observers.push(observer);
        self.observers.len() - 1
    }

    pub fn unregister(&mut self, index: usize) -> Option<Box<dyn AssetObserver>> {
        (index < self.observers.len()).then(|| self.observers.remove(index))
    }

    pub fn broadcast(&mut self, notification: &AssetNotification) {
        for observer in &mut self.observers {
            if let Err(err) = observer.on_notification(notification) {
                warn!(
                    observer = observer.name(),
                    kind = notification.kind(),
                    path = %notification.location(),
                    error = %err,
                    "observer failed"
                );
            }
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::error::AssetError;
    use crate::location::AssetRoots;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn location(path: &str) -> AssetLocation {
        let roots = AssetRoots::from_config(&DatabaseConfig::for_project("/project"));
        AssetLocation::from_path(path, &roots)
    }

    #[test]
    fn test_renamed_reports_new_location() {
        let notification = AssetNotification::Renamed {
            from: location("Assets/a.txt"),
            to: location("Assets/b.txt"),
            is_folder: false,
        };
        assert_eq!(notification.location().asset_path, "Assets/b.txt");
        assert_eq!(notification.kind(), "renamed");
        assert!(!notification.is_folder());
    }

    #[test]
    fn test_failing_observer_does_not_stop_delivery() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut list = ObserverList::new();
        list.register(Box::new(CallbackObserver::named("broken", |_| {
            Err(AssetError::ImportFailed("observer".into()))
        })));
        let sink = seen.clone();
        list.register(Box::new(CallbackObserver::new(move |n| {
            sink.lock().push(n.kind());
            Ok(())
        })));

        list.broadcast(&AssetNotification::Imported {
            location: location("Assets/a.txt"),
            is_folder: false,
        });

        assert_eq!(*seen.lock(), vec!["imported"]);
    }

    #[test]
    fn test_unregister() {
        let mut list = ObserverList::new();
        let index = list.register(Box::new(CallbackObserver::new(|_| Ok(()))));
        assert_eq!(list.len(), 1);
        assert!(list.unregister(index + 1).is_none());
        assert_eq!(list.unregister(index).unwrap().name(), "CallbackObserver");
        assert!(list.is_empty());
    }
}
