//! Mapping raw OS permission state to a [`PermissionStatus`].

use log::{debug, warn};

use crate::platform::sdk;
use crate::{
    GrantState, ManifestInspector, PermissionError, PermissionGroup, PermissionStatus, Platform,
};

/// Determine the current status of `group` without requesting anything.
pub fn check_status<P, M>(platform: &P, manifest: &M, group: PermissionGroup) -> PermissionStatus
where
    P: Platform + ?Sized,
    M: ManifestInspector + ?Sized,
{
    if group == PermissionGroup::Notification {
        return if platform.notifications_enabled() {
            PermissionStatus::Granted
        } else {
            PermissionStatus::Denied
        };
    }

    let Some(names) = manifest.declared_names(group) else {
        debug!("No android specific permissions needed for: {group:?}");
        return PermissionStatus::Granted;
    };

    if names.is_empty() {
        debug!("No permissions found in manifest for: {group:?}");
        return PermissionStatus::NotDetermined;
    }

    // Apps targeting pre-M keep install-time grants.
    if platform.target_sdk() < sdk::M {
        return PermissionStatus::Granted;
    }

    match group {
        PermissionGroup::IgnoreBatteryOptimizations => {
            return settings_status(platform, Platform::is_ignoring_battery_optimizations);
        }
        PermissionGroup::SystemAlertWindow => {
            return settings_status(platform, Platform::can_draw_overlays);
        }
        _ => {}
    }

    for name in &names {
        match platform.check_permission(name) {
            GrantState::Granted => {}
            GrantState::Denied => return denied_status(platform, name),
            GrantState::Other(raw) => {
                warn!("Unexpected grant state {raw} for {name}, treating as denied");
                return PermissionStatus::Denied;
            }
        }
    }

    PermissionStatus::Granted
}

/// Whether a rationale should be shown before requesting `group` again.
///
/// Only the first backing permission name is consulted.
///
/// # Errors
/// Returns [`PermissionError::NoActivity`] if no activity is attached.
pub fn should_show_rationale<P, M>(
    platform: &P,
    manifest: &M,
    group: PermissionGroup,
) -> Result<bool, PermissionError>
where
    P: Platform + ?Sized,
    M: ManifestInspector + ?Sized,
{
    if !platform.has_activity() {
        debug!("Unable to detect current Activity.");
        return Err(PermissionError::NoActivity);
    }

    let Some(names) = manifest.declared_names(group) else {
        debug!("No android specific permissions needed for: {group:?}");
        return Ok(false);
    };

    let Some(first) = names.first() else {
        debug!("No permissions found in manifest for: {group:?}, no need to show request rationale");
        return Ok(false);
    };

    Ok(platform.should_show_rationale(first))
}

fn settings_status<P: Platform + ?Sized>(
    platform: &P,
    query: impl FnOnce(&P) -> bool,
) -> PermissionStatus {
    if platform.sdk_int() < sdk::M {
        return PermissionStatus::Restricted;
    }
    if query(platform) {
        PermissionStatus::Granted
    } else {
        PermissionStatus::Denied
    }
}

fn denied_status<P: Platform + ?Sized>(platform: &P, name: &str) -> PermissionStatus {
    if !platform.requested_before(name) {
        PermissionStatus::NotDetermined
    } else if platform.sdk_int() >= sdk::M && platform.is_never_ask_again(name) {
        PermissionStatus::NeverAskAgain
    } else {
        PermissionStatus::Denied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::AndroidManifest;
    use crate::manifest::names::*;
    use crate::testing::FakePlatform;

    fn manifest(declared: &[&str]) -> AndroidManifest {
        AndroidManifest::new(declared.iter().copied(), 33)
    }

    #[test]
    fn not_applicable_group_is_granted() {
        let platform = FakePlatform::modern();
        let status = check_status(&platform, &manifest(&[]), PermissionGroup::Photos);
        assert_eq!(status, PermissionStatus::Granted);
    }

    #[test]
    fn undeclared_group_is_not_determined() {
        let platform = FakePlatform::modern();
        let status = check_status(&platform, &manifest(&[CAMERA]), PermissionGroup::Calendar);
        assert_eq!(status, PermissionStatus::NotDetermined);
    }

    #[test]
    fn all_names_granted() {
        let platform = FakePlatform::modern();
        platform.grant(READ_CALENDAR);
        platform.grant(WRITE_CALENDAR);

        let status = check_status(
            &platform,
            &manifest(&[READ_CALENDAR, WRITE_CALENDAR]),
            PermissionGroup::Calendar,
        );
        assert_eq!(status, PermissionStatus::Granted);
    }

    #[test]
    fn unrequested_denied_name_is_not_determined() {
        let platform = FakePlatform::modern();
        platform.grant(READ_CALENDAR);
        platform.requested.borrow_mut().insert(READ_CALENDAR.into());

        let status = check_status(
            &platform,
            &manifest(&[READ_CALENDAR, WRITE_CALENDAR]),
            PermissionGroup::Calendar,
        );
        assert_eq!(status, PermissionStatus::NotDetermined);
    }

    #[test]
    fn first_failing_name_decides() {
        let platform = FakePlatform::modern();
        platform.requested.borrow_mut().insert(READ_CALENDAR.into());
        platform.rationale.borrow_mut().insert(READ_CALENDAR.into());

        // WRITE_CALENDAR was never requested, but READ_CALENDAR fails first.
        let status = check_status(
            &platform,
            &manifest(&[READ_CALENDAR, WRITE_CALENDAR]),
            PermissionGroup::Calendar,
        );
        assert_eq!(status, PermissionStatus::Denied);
    }

    #[test]
    fn requested_without_rationale_is_never_ask_again() {
        let platform = FakePlatform::modern();
        platform.requested.borrow_mut().insert(CAMERA.into());

        let status = check_status(&platform, &manifest(&[CAMERA]), PermissionGroup::Camera);
        assert_eq!(status, PermissionStatus::NeverAskAgain);
    }

    #[test]
    fn anomalous_grant_state_is_denied() {
        let platform = FakePlatform::modern();
        platform.set_grant(CAMERA, GrantState::Other(7));

        let status = check_status(&platform, &manifest(&[CAMERA]), PermissionGroup::Camera);
        assert_eq!(status, PermissionStatus::Denied);
    }

    #[test]
    fn legacy_target_is_granted() {
        let platform = FakePlatform::modern();
        platform.target_sdk.set(22);

        let status = check_status(&platform, &manifest(&[CAMERA]), PermissionGroup::Camera);
        assert_eq!(status, PermissionStatus::Granted);
    }

    #[test]
    fn notification_follows_enablement() {
        let platform = FakePlatform::modern();
        let manifest = manifest(&[]);

        assert_eq!(
            check_status(&platform, &manifest, PermissionGroup::Notification),
            PermissionStatus::Granted
        );
        platform.notifications.set(false);
        assert_eq!(
            check_status(&platform, &manifest, PermissionGroup::Notification),
            PermissionStatus::Denied
        );
    }

    #[test]
    fn battery_optimization_status() {
        let platform = FakePlatform::modern();
        let manifest = manifest(&[REQUEST_IGNORE_BATTERY_OPTIMIZATIONS]);
        let group = PermissionGroup::IgnoreBatteryOptimizations;

        assert_eq!(
            check_status(&platform, &manifest, group),
            PermissionStatus::Denied
        );
        platform.battery_exempt.set(true);
        assert_eq!(
            check_status(&platform, &manifest, group),
            PermissionStatus::Granted
        );
    }

    #[test]
    fn battery_optimization_on_old_os_is_restricted() {
        let platform = FakePlatform::modern();
        platform.sdk_int.set(22);
        platform.battery_exempt.set(true);

        let status = check_status(
            &platform,
            &manifest(&[REQUEST_IGNORE_BATTERY_OPTIMIZATIONS]),
            PermissionGroup::IgnoreBatteryOptimizations,
        );
        assert_eq!(status, PermissionStatus::Restricted);
    }

    #[test]
    fn overlay_on_old_os_is_restricted() {
        let platform = FakePlatform::modern();
        platform.sdk_int.set(22);
        platform.overlays.set(true);

        let status = check_status(
            &platform,
            &manifest(&[SYSTEM_ALERT_WINDOW]),
            PermissionGroup::SystemAlertWindow,
        );
        assert_eq!(status, PermissionStatus::Restricted);
    }

    #[test]
    fn rationale_without_names_skips_os() {
        let platform = FakePlatform::modern();

        let show = should_show_rationale(&platform, &manifest(&[]), PermissionGroup::Photos);
        assert_eq!(show, Ok(false));
        let show = should_show_rationale(&platform, &manifest(&[]), PermissionGroup::Camera);
        assert_eq!(show, Ok(false));
        assert_eq!(platform.rationale_queries.get(), 0);
    }

    #[test]
    fn rationale_uses_first_name_only() {
        let platform = FakePlatform::modern();
        platform.rationale.borrow_mut().insert(WRITE_CONTACTS.into());
        let manifest = manifest(&[READ_CONTACTS, WRITE_CONTACTS]);

        let show = should_show_rationale(&platform, &manifest, PermissionGroup::Contacts);
        assert_eq!(show, Ok(false));
        assert_eq!(platform.rationale_queries.get(), 1);
    }

    #[test]
    fn rationale_needs_activity() {
        let platform = FakePlatform::modern();
        platform.activity.set(false);

        let show = should_show_rationale(&platform, &manifest(&[CAMERA]), PermissionGroup::Camera);
        assert_eq!(show, Err(PermissionError::NoActivity));
    }
}
