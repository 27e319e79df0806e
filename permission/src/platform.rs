//! Seams between the coordinator and the operating system.

use std::io;
use std::path::Path;

use crate::settings::SettingsIntent;
use crate::{PermissionError, PermissionGroup};

/// Android API levels the decision logic branches on.
pub mod sdk {
    /// Android 4.4W, first release with body sensors.
    pub const KITKAT_WATCH: u32 = 20;
    /// Android 6.0, runtime permissions.
    pub const M: u32 = 23;
    /// Android 7.0, notification enablement query.
    pub const N: u32 = 24;
    /// Android 8.0.
    pub const O: u32 = 26;
    /// Android 10, background location and activity recognition.
    pub const Q: u32 = 29;
    /// Android 13, notification runtime permission.
    pub const TIRAMISU: u32 = 33;
}

/// Raw result of a single permission-name grant query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrantState {
    /// `PERMISSION_GRANTED`.
    Granted,
    /// `PERMISSION_DENIED`.
    Denied,
    /// Any other value the OS returned.
    Other(i32),
}

impl GrantState {
    /// Decode a `PackageManager` grant constant.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::Granted,
            -1 => Self::Denied,
            other => Self::Other(other),
        }
    }
}

/// Resolves the platform permission names backing a group.
pub trait ManifestInspector {
    /// Names declared by the host app for `group`.
    ///
    /// `None` means the group does not apply on this platform. An empty list
    /// means it applies but the app declares none of its names.
    fn declared_names(&self, group: PermissionGroup) -> Option<Vec<String>>;
}

/// Operating-system services the coordinator relies on.
///
/// Every method is called from the UI sequencing context. Requests and
/// launches return immediately; their outcome comes back through
/// [`PermissionCoordinator::on_request_permissions_result`] and
/// [`PermissionCoordinator::on_activity_result`].
///
/// [`PermissionCoordinator::on_request_permissions_result`]: crate::PermissionCoordinator::on_request_permissions_result
/// [`PermissionCoordinator::on_activity_result`]: crate::PermissionCoordinator::on_activity_result
pub trait Platform {
    /// API level of the running OS.
    fn sdk_int(&self) -> u32;

    /// API level the host app targets.
    fn target_sdk(&self) -> u32;

    /// Package name of the host app.
    fn package_name(&self) -> String;

    /// Whether a foreground activity is attached.
    fn has_activity(&self) -> bool;

    /// Grant state of a single permission name.
    fn check_permission(&self, name: &str) -> GrantState;

    /// Whether `name` was ever submitted to the permission dialog.
    fn requested_before(&self, name: &str) -> bool;

    /// Remember that `name` has been submitted to the permission dialog.
    fn mark_requested(&self, name: &str);

    /// The OS recommendation to show a rationale for `name`.
    fn should_show_rationale(&self, name: &str) -> bool;

    /// Whether the user chose "don't ask again" for `name`.
    fn is_never_ask_again(&self, name: &str) -> bool {
        !self.should_show_rationale(name)
    }

    /// Whether the app is exempted from battery optimizations.
    fn is_ignoring_battery_optimizations(&self) -> bool;

    /// Whether the app may draw over other apps.
    fn can_draw_overlays(&self) -> bool;

    /// Whether notifications are enabled for the app.
    fn notifications_enabled(&self) -> bool;

    /// Show the standard permission dialog for `names`.
    ///
    /// # Errors
    /// Returns a [`PermissionError`] if the dialog could not be requested.
    fn request_permissions(&self, names: &[String], request_code: i32)
    -> Result<(), PermissionError>;

    /// Start a settings screen, expecting an activity result for `request_code`.
    ///
    /// # Errors
    /// Returns [`PermissionError::Launch`] if the screen cannot be started.
    fn start_settings(
        &self,
        intent: &SettingsIntent,
        request_code: i32,
    ) -> Result<(), PermissionError>;

    /// Device manufacturer string.
    fn manufacturer(&self) -> String;

    /// Contents of the system properties file.
    ///
    /// # Errors
    /// Returns the underlying I/O error if the file cannot be read.
    fn read_build_props(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}
