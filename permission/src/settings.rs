//! Settings screens for permissions the OS will not grant through a dialog.

use std::collections::HashMap;
use std::io;

use log::{info, warn};

use crate::Platform;

/// `Settings.ACTION_REQUEST_IGNORE_BATTERY_OPTIMIZATIONS`.
pub const ACTION_REQUEST_IGNORE_BATTERY_OPTIMIZATIONS: &str =
    "android.settings.REQUEST_IGNORE_BATTERY_OPTIMIZATIONS";
/// `Settings.ACTION_MANAGE_OVERLAY_PERMISSION`.
pub const ACTION_MANAGE_OVERLAY_PERMISSION: &str =
    "android.settings.action.MANAGE_OVERLAY_PERMISSION";
/// `Settings.ACTION_APPLICATION_DETAILS_SETTINGS`.
pub const ACTION_APPLICATION_DETAILS_SETTINGS: &str =
    "android.settings.APPLICATION_DETAILS_SETTINGS";

const MIUI_ACTION_APP_PERM_EDITOR: &str = "miui.intent.action.APP_PERM_EDITOR";
const MIUI_SECURITY_CENTER: &str = "com.miui.securitycenter";
const MIUI_PERMISSIONS_EDITOR: &str = "com.miui.permcenter.permissions.PermissionsEditorActivity";
const MIUI_APP_PERMISSIONS_EDITOR: &str =
    "com.miui.permcenter.permissions.AppPermissionsEditorActivity";
const MIUI_EXTRA_PACKAGE: &str = "extra_pkgname";

const MIUI_MARKER_PROPERTIES: [&str; 3] = [
    "ro.miui.ui.version.code",
    "ro.miui.ui.version.name",
    "ro.miui.internal.storage",
];

/// A settings screen to open, described independently of the JNI `Intent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsIntent {
    /// Intent action.
    pub action: String,
    /// Data URI, e.g. `package:com.example`.
    pub data: Option<String>,
    /// Explicit `(package, class)` component.
    pub component: Option<(String, String)>,
    /// A single string extra.
    pub extra: Option<(String, String)>,
}

impl SettingsIntent {
    fn new(action: &str) -> Self {
        Self {
            action: action.to_string(),
            data: None,
            component: None,
            extra: None,
        }
    }

    fn with_package_data(mut self, package: &str) -> Self {
        self.data = Some(format!("package:{package}"));
        self
    }

    /// Ask the user to exempt `package` from battery optimizations.
    #[must_use]
    pub fn ignore_battery_optimizations(package: &str) -> Self {
        Self::new(ACTION_REQUEST_IGNORE_BATTERY_OPTIMIZATIONS).with_package_data(package)
    }

    /// The stock overlay-permission screen for `package`.
    #[must_use]
    pub fn manage_overlay(package: &str) -> Self {
        Self::new(ACTION_MANAGE_OVERLAY_PERMISSION).with_package_data(package)
    }

    /// The generic application details screen for `package`.
    #[must_use]
    pub fn application_details(package: &str) -> Self {
        Self::new(ACTION_APPLICATION_DETAILS_SETTINGS).with_package_data(package)
    }

    fn miui_editor(class: &str, package: &str) -> Self {
        let mut intent = Self::new(MIUI_ACTION_APP_PERM_EDITOR);
        intent.component = Some((MIUI_SECURITY_CENTER.to_string(), class.to_string()));
        intent.extra = Some((MIUI_EXTRA_PACKAGE.to_string(), package.to_string()));
        intent
    }
}

/// One way of reaching the overlay-permission toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayRoute {
    /// MIUI security center permission editor (current releases).
    MiuiPermissionsEditor,
    /// MIUI 5/6/7 permission editor.
    MiuiAppPermissionsEditor,
    /// Stock `MANAGE_OVERLAY_PERMISSION` screen.
    ManageOverlayPermission,
    /// Application details screen.
    ApplicationDetails,
}

impl OverlayRoute {
    /// The intent this route launches for `package`.
    #[must_use]
    pub fn intent(self, package: &str) -> SettingsIntent {
        match self {
            Self::MiuiPermissionsEditor => SettingsIntent::miui_editor(MIUI_PERMISSIONS_EDITOR, package),
            Self::MiuiAppPermissionsEditor => {
                SettingsIntent::miui_editor(MIUI_APP_PERMISSIONS_EDITOR, package)
            }
            Self::ManageOverlayPermission => SettingsIntent::manage_overlay(package),
            Self::ApplicationDetails => SettingsIntent::application_details(package),
        }
    }
}

/// Overlay routes in the order they should be attempted.
///
/// The application details screen is always the last resort.
#[must_use]
pub const fn overlay_routes(miui: bool) -> &'static [OverlayRoute] {
    if miui {
        &[
            OverlayRoute::MiuiPermissionsEditor,
            OverlayRoute::MiuiAppPermissionsEditor,
            OverlayRoute::ManageOverlayPermission,
            OverlayRoute::ApplicationDetails,
        ]
    } else {
        &[
            OverlayRoute::ManageOverlayPermission,
            OverlayRoute::ApplicationDetails,
        ]
    }
}

/// Launch the first intent that starts, returning its index.
///
/// Failures are logged and the next intent is tried.
pub fn launch_first<P, I>(platform: &P, intents: I, request_code: i32) -> Option<usize>
where
    P: Platform + ?Sized,
    I: IntoIterator<Item = SettingsIntent>,
{
    for (index, intent) in intents.into_iter().enumerate() {
        match platform.start_settings(&intent, request_code) {
            Ok(()) => {
                info!("Opened settings {} (request code {request_code})", intent.action);
                return Some(index);
            }
            Err(e) => warn!("Settings route {} failed: {e}", intent.action),
        }
    }
    None
}

/// Parsed system properties (`key=value` lines).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildProps {
    values: HashMap<String, String>,
}

impl BuildProps {
    /// Parse a properties file. Blank lines and `#`/`!` comments are skipped.
    #[must_use]
    pub fn parse(source: &str) -> Self {
        let values = source
            .lines()
            .map(str::trim_start)
            .filter(|line| !line.is_empty() && !line.starts_with(['#', '!']))
            .map(|line| match line.find(['=', ':']) {
                Some(at) => (line[..at].trim_end(), line[at + 1..].trim()),
                None => (line.trim_end(), ""),
            })
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Self { values }
    }

    /// The value of `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

/// Whether the device runs MIUI.
///
/// Only Xiaomi devices are considered. An unreadable properties file on such a
/// device counts as MIUI.
pub fn is_miui(manufacturer: &str, read_props: impl FnOnce() -> io::Result<String>) -> bool {
    if !manufacturer.eq_ignore_ascii_case("xiaomi") {
        return false;
    }
    match read_props() {
        Ok(source) => {
            let props = BuildProps::parse(&source);
            MIUI_MARKER_PROPERTIES
                .iter()
                .any(|key| props.get(key).is_some())
        }
        Err(e) => {
            warn!("Unable to read build.prop: {e}");
            true
        }
    }
}
