//! Android runtime-permission handling.
//!
//! This crate decides the grant status of a logical [`PermissionGroup`],
//! drives the OS request flow for ungranted groups, and reports whether a
//! rationale should be shown before asking again.
//!
//! The OS is reached through the [`Platform`] and [`ManifestInspector`]
//! traits. On Android, `sys::android` implements both over JNI; any other
//! implementation (a test double, another bridge) plugs into the same
//! [`PermissionCoordinator`].

#![warn(missing_docs)]

mod config;
mod coordinator;
mod error;
pub mod manifest;
mod platform;
pub mod settings;
mod status;

#[cfg(test)]
mod testing;

/// Platform-specific implementations.
pub mod sys;

pub use config::CoordinatorConfig;
pub use coordinator::{PendingRequest, PermissionCoordinator};
pub use error::{ERROR_DOMAIN, PermissionError};
pub use platform::{GrantState, ManifestInspector, Platform, sdk};
pub use status::{check_status, should_show_rationale};

/// Logical capabilities an application can ask for.
///
/// A group maps to zero, one or many Android permission names. Groups that
/// only exist on other platforms map to none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PermissionGroup {
    /// Read and write the user's calendar.
    Calendar,
    /// Access to device camera.
    Camera,
    /// Read and write contacts.
    Contacts,
    /// Access to device location.
    Location,
    /// Location access while the app is in the background.
    LocationAlways,
    /// Location access while the app is in use.
    LocationWhenInUse,
    /// Media library (iOS only).
    MediaLibrary,
    /// Access to device microphone.
    Microphone,
    /// Telephony state and calls.
    Phone,
    /// Access to photo library (iOS only).
    Photos,
    /// Add-only photo library access (iOS only).
    PhotosAddOnly,
    /// Reminders (iOS only).
    Reminders,
    /// Body sensors.
    Sensors,
    /// Send and receive SMS.
    Sms,
    /// Speech recognition.
    Speech,
    /// External storage.
    Storage,
    /// Exemption from battery optimizations.
    IgnoreBatteryOptimizations,
    /// Posting notifications.
    Notification,
    /// Location metadata in shared media.
    AccessMediaLocation,
    /// Physical activity recognition.
    ActivityRecognition,
    /// Drawing over other apps.
    SystemAlertWindow,
    /// Placeholder for unrecognised groups.
    Unknown,
}

/// The current status of a permission group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionStatus {
    /// Permission has been granted by the user.
    Granted,
    /// Permission has been denied by the user.
    Denied,
    /// Permission is unsupported or legacy-only on this OS version.
    Restricted,
    /// Permission was denied and the OS will no longer show the dialog.
    NeverAskAgain,
    /// Permission has not been requested yet.
    NotDetermined,
}

impl PermissionStatus {
    /// Whether the permission is granted.
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }

    /// Whether the permission is denied, temporarily or permanently.
    #[must_use]
    pub const fn is_denied(self) -> bool {
        matches!(self, Self::Denied | Self::NeverAskAgain)
    }
}

/// Statuses keyed by group, in insertion order.
///
/// Each group appears at most once. Re-inserting a group replaces its status
/// in place, keeping its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionMap {
    entries: Vec<(PermissionGroup, PermissionStatus)>,
}

impl PermissionMap {
    /// Create an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record `status` for `group`, returning the status it replaced.
    pub fn insert(
        &mut self,
        group: PermissionGroup,
        status: PermissionStatus,
    ) -> Option<PermissionStatus> {
        if let Some(entry) = self.entries.iter_mut().find(|(g, _)| *g == group) {
            return Some(std::mem::replace(&mut entry.1, status));
        }
        self.entries.push((group, status));
        None
    }

    /// The status recorded for `group`, if any.
    #[must_use]
    pub fn get(&self, group: PermissionGroup) -> Option<PermissionStatus> {
        self.entries
            .iter()
            .find(|(g, _)| *g == group)
            .map(|(_, status)| *status)
    }

    /// Whether `group` has a recorded status.
    #[must_use]
    pub fn contains(&self, group: PermissionGroup) -> bool {
        self.get(group).is_some()
    }

    /// Number of recorded groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(group, status)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (PermissionGroup, PermissionStatus)> + '_ {
        self.entries.iter().copied()
    }
}

impl FromIterator<(PermissionGroup, PermissionStatus)> for PermissionMap {
    fn from_iter<I: IntoIterator<Item = (PermissionGroup, PermissionStatus)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (group, status) in iter {
            map.insert(group, status);
        }
        map
    }
}

impl IntoIterator for PermissionMap {
    type Item = (PermissionGroup, PermissionStatus);
    type IntoIter = std::vec::IntoIter<(PermissionGroup, PermissionStatus)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
