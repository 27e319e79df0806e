use std::path::PathBuf;

/// Tunables for a [`PermissionCoordinator`](crate::PermissionCoordinator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Request code for the standard permission dialog.
    pub permission_request_code: i32,
    /// Request code for the battery-optimization exemption screen.
    pub battery_request_code: i32,
    /// Request code for the overlay-permission screens.
    pub overlay_request_code: i32,
    /// Name of the preference store tracking previously requested names.
    pub preferences_name: String,
    /// System properties file consulted for manufacturer detection.
    pub build_prop_path: PathBuf,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            permission_request_code: 24,
            battery_request_code: 5672,
            overlay_request_code: 5674,
            preferences_name: "permkit_permission".to_string(),
            build_prop_path: PathBuf::from("/system/build.prop"),
        }
    }
}

impl CoordinatorConfig {
    /// Set the request code used for the standard permission dialog.
    #[must_use]
    pub fn with_permission_request_code(mut self, code: i32) -> Self {
        self.permission_request_code = code;
        self
    }

    /// Set the request code used for the battery-optimization screen.
    #[must_use]
    pub fn with_battery_request_code(mut self, code: i32) -> Self {
        self.battery_request_code = code;
        self
    }

    /// Set the request code used for the overlay screens.
    #[must_use]
    pub fn with_overlay_request_code(mut self, code: i32) -> Self {
        self.overlay_request_code = code;
        self
    }

    /// Set the preference store name.
    #[must_use]
    pub fn with_preferences_name(mut self, name: impl Into<String>) -> Self {
        self.preferences_name = name.into();
        self
    }

    /// Set the system properties file path.
    #[must_use]
    pub fn with_build_prop_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.build_prop_path = path.into();
        self
    }
}
