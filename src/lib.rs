//! # Permkit
//!
//! Runtime-permission coordination for WaterUI applications on Android.
//!
//! Permkit decides the grant status of logical permission groups, drives the
//! OS request flow (the standard permission dialog or a system settings
//! screen), and reports whether a rationale should be shown before asking
//! again.
//!
//! ## Features
//!
//! - `permission` (default): the permission coordinator.
//!
//! Use the `full` feature to enable everything.
//!
//! ## Example
//!
//! ```toml
//! [dependencies]
//! permkit = { version = "0.1", features = ["permission"] }
//! ```
//!
//! ```rust,ignore
//! use permkit::permission::{PermissionCoordinator, PermissionGroup};
//!
//! let coordinator = PermissionCoordinator::new(platform, manifest);
//! let results = coordinator.request(&[PermissionGroup::Camera])?.await?;
//! println!("camera: {:?}", results.get(PermissionGroup::Camera));
//! ```

#[cfg(feature = "permission")]
pub use permkit_permission as permission;
