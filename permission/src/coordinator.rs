//! Serialised batch permission requests.
//!
//! At most one request session exists at a time. A session records a status
//! for every requested group, either immediately or once the OS reports back
//! through [`PermissionCoordinator::on_request_permissions_result`] or
//! [`PermissionCoordinator::on_activity_result`]. Its completion is delivered
//! exactly once, after nothing remains outstanding.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use futures::channel::oneshot;
use log::{debug, error, info, warn};

use crate::platform::sdk;
use crate::settings::{self, SettingsIntent};
use crate::status;
use crate::{
    CoordinatorConfig, GrantState, ManifestInspector, PermissionError, PermissionGroup,
    PermissionMap, PermissionStatus, Platform,
};

type Completion = oneshot::Sender<Result<PermissionMap, PermissionError>>;

/// Results of a batch request, resolved once every group has a final status.
#[derive(Debug)]
#[must_use = "the results are only observable by awaiting the request"]
pub struct PendingRequest {
    receiver: oneshot::Receiver<Result<PermissionMap, PermissionError>>,
}

impl Future for PendingRequest {
    type Output = Result<PermissionMap, PermissionError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.unwrap_or(Err(PermissionError::Cancelled)))
    }
}

#[derive(Debug)]
struct Session {
    /// Requested groups, deduplicated, in request order.
    groups: Vec<PermissionGroup>,
    /// Statuses recorded so far. Settings-intent groups hold a placeholder
    /// until their activity result arrives; a later status overwrites it.
    results: PermissionMap,
    /// Groups waiting on the standard dialog, with their permission names.
    dialog: Option<Vec<(PermissionGroup, Vec<String>)>>,
    /// Settings screens still open, keyed by request code.
    settings: Vec<(i32, PermissionGroup)>,
    completion: Completion,
}

impl Session {
    fn is_settled(&self) -> bool {
        self.dialog.is_none() && self.settings.is_empty()
    }

    fn complete(self) {
        let results: PermissionMap = self
            .groups
            .iter()
            .filter_map(|group| self.results.get(*group).map(|status| (*group, status)))
            .collect();
        if self.completion.send(Ok(results)).is_err() {
            debug!("Permission request was dropped before its results arrived");
        }
    }
}

/// Coordinates permission status checks and batch requests.
#[derive(Debug)]
pub struct PermissionCoordinator<P, M> {
    platform: P,
    manifest: M,
    config: CoordinatorConfig,
    session: Mutex<Option<Session>>,
}

impl<P: Platform, M: ManifestInspector> PermissionCoordinator<P, M> {
    /// Create a coordinator with the default configuration.
    pub fn new(platform: P, manifest: M) -> Self {
        Self::with_config(platform, manifest, CoordinatorConfig::default())
    }

    /// Create a coordinator with an explicit configuration.
    pub const fn with_config(platform: P, manifest: M, config: CoordinatorConfig) -> Self {
        Self {
            platform,
            manifest,
            config,
            session: Mutex::new(None),
        }
    }

    /// The underlying platform.
    pub const fn platform(&self) -> &P {
        &self.platform
    }

    /// The active configuration.
    pub const fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Current status of `group`. Never prompts the user.
    pub fn check_status(&self, group: PermissionGroup) -> PermissionStatus {
        status::check_status(&self.platform, &self.manifest, group)
    }

    /// Whether a rationale should be shown before requesting `group` again.
    ///
    /// # Errors
    /// Returns [`PermissionError::NoActivity`] if no activity is attached.
    pub fn should_show_rationale(&self, group: PermissionGroup) -> Result<bool, PermissionError> {
        status::should_show_rationale(&self.platform, &self.manifest, group)
    }

    /// Whether a request session is active.
    pub fn is_ongoing(&self) -> bool {
        self.lock().is_some()
    }

    /// Number of settings screens the active session is waiting on.
    pub fn pending_settings_intents(&self) -> usize {
        self.lock().as_ref().map_or(0, |session| session.settings.len())
    }

    /// Statuses recorded so far by the active session, in recording order.
    ///
    /// Settings-intent groups show [`PermissionStatus::NotDetermined`] until
    /// their screen returns.
    pub fn pending_results(&self) -> Option<PermissionMap> {
        self.lock().as_ref().map(|session| session.results.clone())
    }

    /// Request every group in `groups` that is not already granted.
    ///
    /// The returned [`PendingRequest`] resolves with one status per distinct
    /// requested group, in request order.
    ///
    /// # Errors
    /// Fails without touching any state if a request is already running
    /// ([`PermissionError::RequestInProgress`]) or no activity is attached
    /// ([`PermissionError::NoActivity`]). A request stays running until its
    /// results are delivered, including while a settings screen is open.
    pub fn request(&self, groups: &[PermissionGroup]) -> Result<PendingRequest, PermissionError> {
        let mut slot = self.lock();
        if slot.is_some() {
            warn!("Rejected permission request while another is running");
            return Err(PermissionError::RequestInProgress);
        }
        if !self.platform.has_activity() {
            debug!("Unable to detect current Activity.");
            return Err(PermissionError::NoActivity);
        }

        let (sender, receiver) = oneshot::channel();
        let mut seen = HashSet::new();
        let mut session = Session {
            groups: groups.iter().copied().filter(|g| seen.insert(*g)).collect(),
            results: PermissionMap::new(),
            dialog: None,
            settings: Vec::new(),
            completion: sender,
        };

        let mut dialog = Vec::new();
        for group in session.groups.clone() {
            let current = self.check_status(group);
            if current == PermissionStatus::Granted || group == PermissionGroup::Notification {
                session.results.insert(group, current);
                continue;
            }

            let names = match self.manifest.declared_names(group) {
                Some(names) if !names.is_empty() => names,
                _ => {
                    session.results.insert(group, PermissionStatus::NotDetermined);
                    continue;
                }
            };

            let supports_settings = self.platform.sdk_int() >= sdk::M;
            match group {
                PermissionGroup::IgnoreBatteryOptimizations if supports_settings => {
                    let package = self.platform.package_name();
                    let intents = [SettingsIntent::ignore_battery_optimizations(&package)];
                    self.open_settings(&mut session, group, intents, self.config.battery_request_code);
                }
                PermissionGroup::SystemAlertWindow if supports_settings => {
                    let package = self.platform.package_name();
                    let intents = settings::overlay_routes(self.is_miui())
                        .iter()
                        .map(|route| route.intent(&package));
                    self.open_settings(&mut session, group, intents, self.config.overlay_request_code);
                }
                _ => dialog.push((group, names)),
            }
        }

        if dialog.is_empty() {
            if session.is_settled() {
                drop(slot);
                session.complete();
            } else {
                *slot = Some(session);
            }
            return Ok(PendingRequest { receiver });
        }

        let mut unique = HashSet::new();
        let names: Vec<String> = dialog
            .iter()
            .flat_map(|(_, names)| names.iter())
            .filter(|name| unique.insert(name.as_str()))
            .cloned()
            .collect();
        session.dialog = Some(dialog);
        *slot = Some(session);
        drop(slot);

        self.show_dialog(&names);
        Ok(PendingRequest { receiver })
    }

    /// Feed the result of the standard permission dialog.
    ///
    /// `names` and `grants` are the parallel arrays the OS delivers. Returns
    /// `false` if the result does not belong to the active session.
    pub fn on_request_permissions_result(
        &self,
        request_code: i32,
        names: &[String],
        grants: &[GrantState],
    ) -> bool {
        if request_code != self.config.permission_request_code {
            return false;
        }

        let mut slot = self.lock();
        let Some(session) = slot.as_mut() else {
            return false;
        };
        let Some(dialog) = session.dialog.take() else {
            return false;
        };

        // Only names the OS actually answered for count as asked.
        for name in names {
            self.platform.mark_requested(name);
        }

        let granted: HashSet<&str> = names
            .iter()
            .zip(grants)
            .filter(|(_, grant)| **grant == GrantState::Granted)
            .map(|(name, _)| name.as_str())
            .collect();

        for (group, group_names) in dialog {
            if session.results.contains(group) {
                continue;
            }
            let status = if group_names.iter().all(|name| granted.contains(name.as_str())) {
                PermissionStatus::Granted
            } else {
                PermissionStatus::Denied
            };
            session.results.insert(group, status);
        }

        self.finish_if_settled(slot);
        true
    }

    /// Feed the return from a settings screen.
    ///
    /// The group opened under `request_code` is re-checked and its
    /// placeholder replaced. Returns `false` if no screen with that code is
    /// pending.
    pub fn on_activity_result(&self, request_code: i32) -> bool {
        let mut slot = self.lock();
        let Some(session) = slot.as_mut() else {
            return false;
        };
        let Some(index) = session
            .settings
            .iter()
            .position(|(code, _)| *code == request_code)
        else {
            return false;
        };

        let (_, group) = session.settings.remove(index);
        let status = self.check_status(group);
        info!("Settings for {group:?} returned with {status:?}");
        session.results.insert(group, status);

        self.finish_if_settled(slot);
        true
    }

    fn open_settings<I>(&self, session: &mut Session, group: PermissionGroup, intents: I, code: i32)
    where
        I: IntoIterator<Item = SettingsIntent>,
    {
        if settings::launch_first(&self.platform, intents, code).is_some() {
            session.results.insert(group, PermissionStatus::NotDetermined);
            session.settings.push((code, group));
        } else {
            error!("No settings screen could be opened for {group:?}");
            session.results.insert(group, self.check_status(group));
        }
    }

    fn show_dialog(&self, names: &[String]) {
        info!("Requesting permissions: {names:?}");
        let Err(e) = self
            .platform
            .request_permissions(names, self.config.permission_request_code)
        else {
            return;
        };

        error!("Failed to request permissions: {e}");
        let mut slot = self.lock();
        let Some(session) = slot.as_mut() else {
            return;
        };
        if let Some(dialog) = session.dialog.take() {
            for (group, _) in dialog {
                if !session.results.contains(group) {
                    session.results.insert(group, self.check_status(group));
                }
            }
        }
        self.finish_if_settled(slot);
    }

    fn finish_if_settled(&self, mut slot: MutexGuard<'_, Option<Session>>) {
        if !slot.as_ref().is_some_and(Session::is_settled) {
            return;
        }
        let finished = slot.take();
        drop(slot);
        if let Some(session) = finished {
            session.complete();
        }
    }

    fn is_miui(&self) -> bool {
        settings::is_miui(&self.platform.manufacturer(), || {
            self.platform.read_build_props(&self.config.build_prop_path)
        })
    }

    fn lock(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
