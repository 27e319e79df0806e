//! Mapping from permission groups to declared Android permission names.

use crate::platform::sdk;
use crate::{ManifestInspector, PermissionGroup};

/// Android permission name constants.
pub mod names {
    #![allow(missing_docs)]

    pub const READ_CALENDAR: &str = "android.permission.READ_CALENDAR";
    pub const WRITE_CALENDAR: &str = "android.permission.WRITE_CALENDAR";
    pub const CAMERA: &str = "android.permission.CAMERA";
    pub const READ_CONTACTS: &str = "android.permission.READ_CONTACTS";
    pub const WRITE_CONTACTS: &str = "android.permission.WRITE_CONTACTS";
    pub const GET_ACCOUNTS: &str = "android.permission.GET_ACCOUNTS";
    pub const ACCESS_COARSE_LOCATION: &str = "android.permission.ACCESS_COARSE_LOCATION";
    pub const ACCESS_FINE_LOCATION: &str = "android.permission.ACCESS_FINE_LOCATION";
    pub const ACCESS_BACKGROUND_LOCATION: &str = "android.permission.ACCESS_BACKGROUND_LOCATION";
    pub const RECORD_AUDIO: &str = "android.permission.RECORD_AUDIO";
    pub const READ_PHONE_STATE: &str = "android.permission.READ_PHONE_STATE";
    pub const READ_PHONE_NUMBERS: &str = "android.permission.READ_PHONE_NUMBERS";
    pub const CALL_PHONE: &str = "android.permission.CALL_PHONE";
    pub const READ_CALL_LOG: &str = "android.permission.READ_CALL_LOG";
    pub const WRITE_CALL_LOG: &str = "android.permission.WRITE_CALL_LOG";
    pub const ADD_VOICEMAIL: &str = "com.android.voicemail.permission.ADD_VOICEMAIL";
    pub const USE_SIP: &str = "android.permission.USE_SIP";
    pub const ANSWER_PHONE_CALLS: &str = "android.permission.ANSWER_PHONE_CALLS";
    pub const BODY_SENSORS: &str = "android.permission.BODY_SENSORS";
    pub const SEND_SMS: &str = "android.permission.SEND_SMS";
    pub const RECEIVE_SMS: &str = "android.permission.RECEIVE_SMS";
    pub const READ_SMS: &str = "android.permission.READ_SMS";
    pub const RECEIVE_WAP_PUSH: &str = "android.permission.RECEIVE_WAP_PUSH";
    pub const RECEIVE_MMS: &str = "android.permission.RECEIVE_MMS";
    pub const READ_EXTERNAL_STORAGE: &str = "android.permission.READ_EXTERNAL_STORAGE";
    pub const WRITE_EXTERNAL_STORAGE: &str = "android.permission.WRITE_EXTERNAL_STORAGE";
    pub const REQUEST_IGNORE_BATTERY_OPTIMIZATIONS: &str =
        "android.permission.REQUEST_IGNORE_BATTERY_OPTIMIZATIONS";
    pub const ACCESS_MEDIA_LOCATION: &str = "android.permission.ACCESS_MEDIA_LOCATION";
    pub const ACTIVITY_RECOGNITION: &str = "android.permission.ACTIVITY_RECOGNITION";
    pub const POST_NOTIFICATIONS: &str = "android.permission.POST_NOTIFICATIONS";
    pub const SYSTEM_ALERT_WINDOW: &str = "android.permission.SYSTEM_ALERT_WINDOW";
}

/// Candidate permission names for `group` on API level `sdk_int`.
///
/// Returns `None` when the group has no Android counterpart at that level.
#[must_use]
pub fn candidate_names(group: PermissionGroup, sdk_int: u32) -> Option<Vec<&'static str>> {
    use PermissionGroup as G;
    use names::*;

    let candidates = match group {
        G::Calendar => vec![READ_CALENDAR, WRITE_CALENDAR],
        G::Camera => vec![CAMERA],
        G::Contacts => vec![READ_CONTACTS, WRITE_CONTACTS, GET_ACCOUNTS],
        G::Location | G::LocationWhenInUse => {
            vec![ACCESS_COARSE_LOCATION, ACCESS_FINE_LOCATION]
        }
        G::LocationAlways => {
            let mut list = Vec::with_capacity(3);
            if sdk_int >= sdk::Q {
                list.push(ACCESS_BACKGROUND_LOCATION);
            }
            list.extend([ACCESS_COARSE_LOCATION, ACCESS_FINE_LOCATION]);
            list
        }
        G::Microphone | G::Speech => vec![RECORD_AUDIO],
        G::Phone => {
            let mut list = vec![READ_PHONE_STATE];
            if sdk_int >= sdk::O {
                list.push(READ_PHONE_NUMBERS);
            }
            list.extend([CALL_PHONE, READ_CALL_LOG, WRITE_CALL_LOG, ADD_VOICEMAIL, USE_SIP]);
            if sdk_int >= sdk::O {
                list.push(ANSWER_PHONE_CALLS);
            }
            list
        }
        G::Sensors if sdk_int >= sdk::KITKAT_WATCH => vec![BODY_SENSORS],
        G::Sms => vec![SEND_SMS, RECEIVE_SMS, READ_SMS, RECEIVE_WAP_PUSH, RECEIVE_MMS],
        G::Storage => vec![READ_EXTERNAL_STORAGE, WRITE_EXTERNAL_STORAGE],
        G::IgnoreBatteryOptimizations if sdk_int >= sdk::M => {
            vec![REQUEST_IGNORE_BATTERY_OPTIMIZATIONS]
        }
        G::AccessMediaLocation if sdk_int >= sdk::Q => vec![ACCESS_MEDIA_LOCATION],
        G::ActivityRecognition if sdk_int >= sdk::Q => vec![ACTIVITY_RECOGNITION],
        G::Notification if sdk_int >= sdk::TIRAMISU => vec![POST_NOTIFICATIONS],
        G::SystemAlertWindow => vec![SYSTEM_ALERT_WINDOW],
        _ => return None,
    };
    Some(candidates)
}

/// Manifest inspector over the permission names an app declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AndroidManifest {
    declared: Vec<String>,
    sdk_int: u32,
}

impl AndroidManifest {
    /// Create an inspector from the declared names and the running API level.
    pub fn new<I, S>(declared: I, sdk_int: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            declared: declared.into_iter().map(Into::into).collect(),
            sdk_int,
        }
    }

    /// Whether the app declares `name`.
    #[must_use]
    pub fn declares(&self, name: &str) -> bool {
        self.declared.iter().any(|declared| declared == name)
    }
}

impl ManifestInspector for AndroidManifest {
    fn declared_names(&self, group: PermissionGroup) -> Option<Vec<String>> {
        let candidates = candidate_names(group, self.sdk_int)?;
        Some(
            candidates
                .into_iter()
                .filter(|name| self.declares(name))
                .map(str::to_string)
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::names::*;
    use super::*;

    #[test]
    fn only_declared_names_are_returned() {
        let manifest = AndroidManifest::new([READ_CONTACTS, CAMERA], 30);

        assert_eq!(
            manifest.declared_names(PermissionGroup::Contacts),
            Some(vec![READ_CONTACTS.to_string()])
        );
        assert_eq!(
            manifest.declared_names(PermissionGroup::Calendar),
            Some(Vec::new())
        );
    }

    #[test]
    fn ios_only_groups_are_not_applicable() {
        let manifest = AndroidManifest::new([CAMERA], 34);

        for group in [
            PermissionGroup::Photos,
            PermissionGroup::PhotosAddOnly,
            PermissionGroup::MediaLibrary,
            PermissionGroup::Reminders,
            PermissionGroup::Unknown,
        ] {
            assert_eq!(manifest.declared_names(group), None, "{group:?}");
        }
    }

    #[test]
    fn version_gated_groups() {
        assert_eq!(candidate_names(PermissionGroup::Notification, 32), None);
        assert_eq!(
            candidate_names(PermissionGroup::Notification, 33),
            Some(vec![POST_NOTIFICATIONS])
        );
        assert_eq!(
            candidate_names(PermissionGroup::IgnoreBatteryOptimizations, 22),
            None
        );
        assert_eq!(
            candidate_names(PermissionGroup::LocationAlways, 28),
            Some(vec![ACCESS_COARSE_LOCATION, ACCESS_FINE_LOCATION])
        );
        assert_eq!(
            candidate_names(PermissionGroup::LocationAlways, 29).map(|names| names[0]),
            Some(ACCESS_BACKGROUND_LOCATION)
        );
    }

    #[test]
    fn phone_names_follow_api_level() {
        let legacy = candidate_names(PermissionGroup::Phone, 25).unwrap_or_default();
        let modern = candidate_names(PermissionGroup::Phone, 26).unwrap_or_default();

        assert!(!legacy.contains(&ANSWER_PHONE_CALLS));
        assert!(modern.contains(&ANSWER_PHONE_CALLS));
        assert!(modern.contains(&READ_PHONE_NUMBERS));
    }
}
