//! Scripted platform double for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::Path;

use crate::settings::SettingsIntent;
use crate::{GrantState, PermissionError, Platform};

#[derive(Debug)]
pub struct FakePlatform {
    pub sdk_int: Cell<u32>,
    pub target_sdk: Cell<u32>,
    pub activity: Cell<bool>,
    pub battery_exempt: Cell<bool>,
    pub overlays: Cell<bool>,
    pub notifications: Cell<bool>,
    pub dialog_fails: Cell<bool>,
    pub rationale_queries: Cell<usize>,
    pub manufacturer: RefCell<String>,
    pub build_props: RefCell<Option<String>>,
    pub grants: RefCell<HashMap<String, GrantState>>,
    pub requested: RefCell<HashSet<String>>,
    pub rationale: RefCell<HashSet<String>>,
    pub failing_launches: RefCell<HashSet<String>>,
    pub launches: RefCell<Vec<(SettingsIntent, i32)>>,
    pub dialogs: RefCell<Vec<(Vec<String>, i32)>>,
}

impl FakePlatform {
    /// A modern device with an attached activity and nothing granted.
    pub fn modern() -> Self {
        Self {
            sdk_int: Cell::new(33),
            target_sdk: Cell::new(33),
            activity: Cell::new(true),
            battery_exempt: Cell::new(false),
            overlays: Cell::new(false),
            notifications: Cell::new(true),
            dialog_fails: Cell::new(false),
            rationale_queries: Cell::new(0),
            manufacturer: RefCell::new("Google".to_string()),
            build_props: RefCell::new(None),
            grants: RefCell::new(HashMap::new()),
            requested: RefCell::new(HashSet::new()),
            rationale: RefCell::new(HashSet::new()),
            failing_launches: RefCell::new(HashSet::new()),
            launches: RefCell::new(Vec::new()),
            dialogs: RefCell::new(Vec::new()),
        }
    }

    pub fn grant(&self, name: &str) {
        self.grants
            .borrow_mut()
            .insert(name.to_string(), GrantState::Granted);
    }

    pub fn set_grant(&self, name: &str, state: GrantState) {
        self.grants.borrow_mut().insert(name.to_string(), state);
    }

    pub fn fail_launch(&self, key: &str) {
        self.failing_launches.borrow_mut().insert(key.to_string());
    }
}

impl Platform for FakePlatform {
    fn sdk_int(&self) -> u32 {
        self.sdk_int.get()
    }

    fn target_sdk(&self) -> u32 {
        self.target_sdk.get()
    }

    fn package_name(&self) -> String {
        "dev.waterui.demo".to_string()
    }

    fn has_activity(&self) -> bool {
        self.activity.get()
    }

    fn check_permission(&self, name: &str) -> GrantState {
        self.grants
            .borrow()
            .get(name)
            .copied()
            .unwrap_or(GrantState::Denied)
    }

    fn requested_before(&self, name: &str) -> bool {
        self.requested.borrow().contains(name)
    }

    fn mark_requested(&self, name: &str) {
        self.requested.borrow_mut().insert(name.to_string());
    }

    fn should_show_rationale(&self, name: &str) -> bool {
        self.rationale_queries.set(self.rationale_queries.get() + 1);
        self.rationale.borrow().contains(name)
    }

    fn is_ignoring_battery_optimizations(&self) -> bool {
        self.battery_exempt.get()
    }

    fn can_draw_overlays(&self) -> bool {
        self.overlays.get()
    }

    fn notifications_enabled(&self) -> bool {
        self.notifications.get()
    }

    fn request_permissions(
        &self,
        names: &[String],
        request_code: i32,
    ) -> Result<(), PermissionError> {
        if self.dialog_fails.get() {
            return Err(PermissionError::Platform("activity is finishing".into()));
        }
        self.dialogs.borrow_mut().push((names.to_vec(), request_code));
        Ok(())
    }

    fn start_settings(
        &self,
        intent: &SettingsIntent,
        request_code: i32,
    ) -> Result<(), PermissionError> {
        let key = intent
            .component
            .as_ref()
            .map_or(intent.action.as_str(), |(_, class)| class.as_str());
        if self.failing_launches.borrow().contains(key) {
            return Err(PermissionError::Launch(format!("no activity for {key}")));
        }
        self.launches
            .borrow_mut()
            .push((intent.clone(), request_code));
        Ok(())
    }

    fn manufacturer(&self) -> String {
        self.manufacturer.borrow().clone()
    }

    fn read_build_props(&self, _path: &Path) -> io::Result<String> {
        self.build_props
            .borrow()
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "build.prop"))
    }
}
