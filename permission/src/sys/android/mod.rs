//! Android permission implementation using JNI.
//!
//! [`AndroidPlatform`] talks to the host `Activity` directly. The host
//! forwards `onRequestPermissionsResult` through
//! [`deliver_permissions_result`] and `onActivityResult` through
//! [`PermissionCoordinator::on_activity_result`].

use std::sync::{Mutex, PoisonError};

use jni::errors::Result as JniResult;
use jni::objects::{GlobalRef, JIntArray, JObject, JObjectArray, JString, JValue};
use jni::{JNIEnv, JavaVM};
use log::warn;

use crate::manifest::AndroidManifest;
use crate::platform::sdk;
use crate::settings::SettingsIntent;
use crate::{
    CoordinatorConfig, GrantState, ManifestInspector, PermissionCoordinator, PermissionError,
    Platform,
};

/// `PackageManager.GET_PERMISSIONS`.
const GET_PERMISSIONS: i32 = 4096;
/// `Context.MODE_PRIVATE`.
const MODE_PRIVATE: i32 = 0;
/// Local references reserved per platform call.
const LOCAL_FRAME_CAPACITY: i32 = 16;

/// [`Platform`] backed by an Android `Context` and, while in the foreground,
/// an `Activity`.
pub struct AndroidPlatform {
    vm: JavaVM,
    context: GlobalRef,
    activity: Mutex<Option<GlobalRef>>,
    preferences: String,
    sdk_int: u32,
    target_sdk: u32,
    package: String,
}

impl std::fmt::Debug for AndroidPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AndroidPlatform")
            .field("package", &self.package)
            .field("sdk_int", &self.sdk_int)
            .field("target_sdk", &self.target_sdk)
            .field("has_activity", &self.has_activity())
            .finish_non_exhaustive()
    }
}

impl AndroidPlatform {
    /// Create a platform bound to `context`, without a foreground activity.
    ///
    /// # Errors
    /// Returns [`PermissionError::Platform`] if the device facts cannot be read.
    pub fn from_context(
        env: &mut JNIEnv,
        context: &JObject,
        config: &CoordinatorConfig,
    ) -> Result<Self, PermissionError> {
        let jni_err = |what: &str| {
            let what = what.to_string();
            move |e: jni::errors::Error| PermissionError::Platform(format!("{what}: {e}"))
        };

        let vm = env.get_java_vm().map_err(jni_err("get_java_vm"))?;
        let context_ref = env.new_global_ref(context).map_err(jni_err("new_global_ref"))?;
        let sdk_int = read_sdk_int(env).map_err(jni_err("SDK_INT"))?;
        let target_sdk = read_target_sdk(env, context).map_err(jni_err("targetSdkVersion"))?;
        let package = env
            .call_method(context, "getPackageName", "()Ljava/lang/String;", &[])
            .and_then(|value| value.l())
            .and_then(|name| java_string(env, name))
            .map_err(jni_err("getPackageName"))?;

        Ok(Self {
            vm,
            context: context_ref,
            activity: Mutex::new(None),
            preferences: config.preferences_name.clone(),
            sdk_int,
            target_sdk,
            package,
        })
    }

    /// Create a platform bound to a foreground `activity`.
    ///
    /// # Errors
    /// Returns [`PermissionError::Platform`] if the device facts cannot be read.
    pub fn from_activity(
        env: &mut JNIEnv,
        activity: &JObject,
        config: &CoordinatorConfig,
    ) -> Result<Self, PermissionError> {
        let platform = Self::from_context(env, activity, config)?;
        platform.attach_activity(env, activity)?;
        Ok(platform)
    }

    /// Attach the foreground activity (`onAttachedToActivity`).
    ///
    /// # Errors
    /// Returns [`PermissionError::Platform`] if a global reference cannot be created.
    pub fn attach_activity(&self, env: &mut JNIEnv, activity: &JObject) -> Result<(), PermissionError> {
        let activity = env
            .new_global_ref(activity)
            .map_err(|e| PermissionError::Platform(format!("new_global_ref: {e}")))?;
        *self.activity.lock().unwrap_or_else(PoisonError::into_inner) = Some(activity);
        Ok(())
    }

    /// Drop the foreground activity (`onDetachedFromActivity`).
    pub fn detach_activity(&self) {
        self.activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Manifest inspector over the permissions this app declares.
    ///
    /// # Errors
    /// Returns [`PermissionError::Platform`] if the package info cannot be read.
    pub fn manifest(&self) -> Result<AndroidManifest, PermissionError> {
        let declared = self.with_env("getPackageInfo", |env, context| {
            let manager = env
                .call_method(
                    context,
                    "getPackageManager",
                    "()Landroid/content/pm/PackageManager;",
                    &[],
                )?
                .l()?;
            let package = env.new_string(&self.package)?;
            let info = env
                .call_method(
                    &manager,
                    "getPackageInfo",
                    "(Ljava/lang/String;I)Landroid/content/pm/PackageInfo;",
                    &[JValue::Object(&package), JValue::Int(GET_PERMISSIONS)],
                )?
                .l()?;
            let requested = env
                .get_field(&info, "requestedPermissions", "[Ljava/lang/String;")?
                .l()?;
            if requested.is_null() {
                return Ok(Vec::new());
            }
            string_array(env, &JObjectArray::from(requested))
        })?;
        Ok(AndroidManifest::new(declared, self.sdk_int))
    }

    fn with_env<T>(
        &self,
        what: &str,
        f: impl FnOnce(&mut JNIEnv, &JObject) -> JniResult<T>,
    ) -> Result<T, PermissionError> {
        let mut env = self
            .vm
            .attach_current_thread()
            .map_err(|e| PermissionError::Platform(format!("attach_current_thread: {e}")))?;
        let context = self.context.as_obj();
        let result = env.with_local_frame(LOCAL_FRAME_CAPACITY, |env| f(env, context));
        result.map_err(|e| {
            clear_exception(&mut env);
            PermissionError::Platform(format!("{what}: {e}"))
        })
    }

    fn with_activity<T>(
        &self,
        what: &str,
        f: impl FnOnce(&mut JNIEnv, &JObject) -> JniResult<T>,
    ) -> Result<T, PermissionError> {
        let activity = self
            .activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(PermissionError::NoActivity)?;
        let mut env = self
            .vm
            .attach_current_thread()
            .map_err(|e| PermissionError::Platform(format!("attach_current_thread: {e}")))?;
        let result = env.with_local_frame(LOCAL_FRAME_CAPACITY, |env| f(env, activity.as_obj()));
        result.map_err(|e| {
            clear_exception(&mut env);
            PermissionError::Platform(format!("{what}: {e}"))
        })
    }

    fn query<T>(
        &self,
        what: &str,
        fallback: T,
        f: impl FnOnce(&mut JNIEnv, &JObject) -> JniResult<T>,
    ) -> T {
        self.with_env(what, f).unwrap_or_else(|e| {
            warn!("{e}");
            fallback
        })
    }

    fn preferences<'local>(
        &self,
        env: &mut JNIEnv<'local>,
        context: &JObject,
    ) -> JniResult<JObject<'local>> {
        let name = env.new_string(&self.preferences)?;
        env.call_method(
            context,
            "getSharedPreferences",
            "(Ljava/lang/String;I)Landroid/content/SharedPreferences;",
            &[JValue::Object(&name), JValue::Int(MODE_PRIVATE)],
        )?
        .l()
    }

    fn system_service<'local>(
        env: &mut JNIEnv<'local>,
        context: &JObject,
        name: &str,
    ) -> JniResult<JObject<'local>> {
        let name = env.new_string(name)?;
        env.call_method(
            context,
            "getSystemService",
            "(Ljava/lang/String;)Ljava/lang/Object;",
            &[JValue::Object(&name)],
        )?
        .l()
    }
}

impl Platform for AndroidPlatform {
    fn sdk_int(&self) -> u32 {
        self.sdk_int
    }

    fn target_sdk(&self) -> u32 {
        self.target_sdk
    }

    fn package_name(&self) -> String {
        self.package.clone()
    }

    fn has_activity(&self) -> bool {
        self.activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn check_permission(&self, name: &str) -> GrantState {
        self.query("checkPermission", GrantState::Denied, |env, context| {
            let pid = env
                .call_static_method("android/os/Process", "myPid", "()I", &[])?
                .i()?;
            let uid = env
                .call_static_method("android/os/Process", "myUid", "()I", &[])?
                .i()?;
            let name = env.new_string(name)?;
            let raw = env
                .call_method(
                    context,
                    "checkPermission",
                    "(Ljava/lang/String;II)I",
                    &[JValue::Object(&name), JValue::Int(pid), JValue::Int(uid)],
                )?
                .i()?;
            Ok(GrantState::from_raw(raw))
        })
    }

    fn requested_before(&self, name: &str) -> bool {
        self.query("getBoolean", false, |env, context| {
            let preferences = self.preferences(env, context)?;
            let key = env.new_string(name)?;
            env.call_method(
                &preferences,
                "getBoolean",
                "(Ljava/lang/String;Z)Z",
                &[JValue::Object(&key), JValue::Bool(0)],
            )?
            .z()
        })
    }

    fn mark_requested(&self, name: &str) {
        self.query("putBoolean", (), |env, context| {
            let preferences = self.preferences(env, context)?;
            let editor = env
                .call_method(
                    &preferences,
                    "edit",
                    "()Landroid/content/SharedPreferences$Editor;",
                    &[],
                )?
                .l()?;
            let key = env.new_string(name)?;
            env.call_method(
                &editor,
                "putBoolean",
                "(Ljava/lang/String;Z)Landroid/content/SharedPreferences$Editor;",
                &[JValue::Object(&key), JValue::Bool(1)],
            )?;
            env.call_method(&editor, "apply", "()V", &[])?;
            Ok(())
        });
    }

    fn should_show_rationale(&self, name: &str) -> bool {
        if self.sdk_int < sdk::M {
            return false;
        }
        self.with_activity("shouldShowRequestPermissionRationale", |env, activity| {
            let name = env.new_string(name)?;
            env.call_method(
                activity,
                "shouldShowRequestPermissionRationale",
                "(Ljava/lang/String;)Z",
                &[JValue::Object(&name)],
            )?
            .z()
        })
        .unwrap_or_else(|e| {
            warn!("{e}");
            false
        })
    }

    fn is_ignoring_battery_optimizations(&self) -> bool {
        self.query("isIgnoringBatteryOptimizations", false, |env, context| {
            let power = Self::system_service(env, context, "power")?;
            if power.is_null() {
                return Ok(false);
            }
            let package = env.new_string(&self.package)?;
            env.call_method(
                &power,
                "isIgnoringBatteryOptimizations",
                "(Ljava/lang/String;)Z",
                &[JValue::Object(&package)],
            )?
            .z()
        })
    }

    fn can_draw_overlays(&self) -> bool {
        if self.sdk_int < sdk::M {
            return true;
        }
        self.query("canDrawOverlays", false, |env, context| {
            env.call_static_method(
                "android/provider/Settings",
                "canDrawOverlays",
                "(Landroid/content/Context;)Z",
                &[JValue::Object(context)],
            )?
            .z()
        })
    }

    fn notifications_enabled(&self) -> bool {
        if self.sdk_int < sdk::N {
            return true;
        }
        self.query("areNotificationsEnabled", false, |env, context| {
            let manager = Self::system_service(env, context, "notification")?;
            if manager.is_null() {
                return Ok(false);
            }
            env.call_method(&manager, "areNotificationsEnabled", "()Z", &[])?
                .z()
        })
    }

    fn request_permissions(
        &self,
        names: &[String],
        request_code: i32,
    ) -> Result<(), PermissionError> {
        let len = i32::try_from(names.len())
            .map_err(|_| PermissionError::Platform("too many permission names".into()))?;
        self.with_activity("requestPermissions", |env, activity| {
            let array = env.new_object_array(len, "java/lang/String", JObject::null())?;
            for (index, name) in (0..).zip(names) {
                let name = env.new_string(name)?;
                env.set_object_array_element(&array, index, &name)?;
            }
            env.call_method(
                activity,
                "requestPermissions",
                "([Ljava/lang/String;I)V",
                &[JValue::Object(&array), JValue::Int(request_code)],
            )?;
            Ok(())
        })
    }

    fn start_settings(
        &self,
        intent: &SettingsIntent,
        request_code: i32,
    ) -> Result<(), PermissionError> {
        self.with_activity("startActivityForResult", |env, activity| {
            let action = env.new_string(&intent.action)?;
            let java_intent = env.new_object(
                "android/content/Intent",
                "(Ljava/lang/String;)V",
                &[JValue::Object(&action)],
            )?;
            if let Some(data) = &intent.data {
                let data = env.new_string(data)?;
                let uri = env
                    .call_static_method(
                        "android/net/Uri",
                        "parse",
                        "(Ljava/lang/String;)Landroid/net/Uri;",
                        &[JValue::Object(&data)],
                    )?
                    .l()?;
                env.call_method(
                    &java_intent,
                    "setData",
                    "(Landroid/net/Uri;)Landroid/content/Intent;",
                    &[JValue::Object(&uri)],
                )?;
            }
            if let Some((package, class)) = &intent.component {
                let package = env.new_string(package)?;
                let class = env.new_string(class)?;
                env.call_method(
                    &java_intent,
                    "setClassName",
                    "(Ljava/lang/String;Ljava/lang/String;)Landroid/content/Intent;",
                    &[JValue::Object(&package), JValue::Object(&class)],
                )?;
            }
            if let Some((key, value)) = &intent.extra {
                let key = env.new_string(key)?;
                let value = env.new_string(value)?;
                env.call_method(
                    &java_intent,
                    "putExtra",
                    "(Ljava/lang/String;Ljava/lang/String;)Landroid/content/Intent;",
                    &[JValue::Object(&key), JValue::Object(&value)],
                )?;
            }
            env.call_method(
                activity,
                "startActivityForResult",
                "(Landroid/content/Intent;I)V",
                &[JValue::Object(&java_intent), JValue::Int(request_code)],
            )?;
            Ok(())
        })
        .map_err(|e| match e {
            PermissionError::Platform(message) => PermissionError::Launch(message),
            other => other,
        })
    }

    fn manufacturer(&self) -> String {
        self.query("Build.MANUFACTURER", String::new(), |env, _| {
            let value = env
                .get_static_field("android/os/Build", "MANUFACTURER", "Ljava/lang/String;")?
                .l()?;
            java_string(env, value)
        })
    }
}

/// Decode the arguments of `onRequestPermissionsResult`.
///
/// # Errors
/// Returns [`PermissionError::Platform`] if the arrays cannot be read.
pub fn decode_permissions_result(
    env: &mut JNIEnv,
    permissions: &JObjectArray,
    grant_results: &JIntArray,
) -> Result<(Vec<String>, Vec<GrantState>), PermissionError> {
    read_permissions_result(env, permissions, grant_results).map_err(|e| {
        clear_exception(env);
        PermissionError::Platform(format!("onRequestPermissionsResult: {e}"))
    })
}

/// Forward `onRequestPermissionsResult` to `coordinator`.
///
/// Returns whether the result belonged to the coordinator's active request.
///
/// # Errors
/// Returns [`PermissionError::Platform`] if the arrays cannot be read.
pub fn deliver_permissions_result<M: ManifestInspector>(
    coordinator: &PermissionCoordinator<AndroidPlatform, M>,
    env: &mut JNIEnv,
    request_code: i32,
    permissions: &JObjectArray,
    grant_results: &JIntArray,
) -> Result<bool, PermissionError> {
    if request_code != coordinator.config().permission_request_code {
        return Ok(false);
    }
    let (names, grants) = decode_permissions_result(env, permissions, grant_results)?;
    Ok(coordinator.on_request_permissions_result(request_code, &names, &grants))
}

fn read_permissions_result(
    env: &mut JNIEnv,
    permissions: &JObjectArray,
    grant_results: &JIntArray,
) -> JniResult<(Vec<String>, Vec<GrantState>)> {
    let names = string_array(env, permissions)?;
    let len = env.get_array_length(grant_results)?;
    let mut raw = vec![0; usize::try_from(len).unwrap_or_default()];
    env.get_int_array_region(grant_results, 0, &mut raw)?;
    Ok((names, raw.into_iter().map(GrantState::from_raw).collect()))
}

fn read_sdk_int(env: &mut JNIEnv) -> JniResult<u32> {
    let value = env
        .get_static_field("android/os/Build$VERSION", "SDK_INT", "I")?
        .i()?;
    Ok(u32::try_from(value).unwrap_or_default())
}

fn read_target_sdk(env: &mut JNIEnv, context: &JObject) -> JniResult<u32> {
    let info = env
        .call_method(
            context,
            "getApplicationInfo",
            "()Landroid/content/pm/ApplicationInfo;",
            &[],
        )?
        .l()?;
    let value = env.get_field(&info, "targetSdkVersion", "I")?.i()?;
    Ok(u32::try_from(value).unwrap_or_default())
}

fn java_string(env: &mut JNIEnv, value: JObject) -> JniResult<String> {
    let value = JString::from(value);
    let string = env.get_string(&value)?.into();
    Ok(string)
}

fn string_array(env: &mut JNIEnv, array: &JObjectArray) -> JniResult<Vec<String>> {
    let len = env.get_array_length(array)?;
    let mut strings = Vec::with_capacity(usize::try_from(len).unwrap_or_default());
    for index in 0..len {
        let item = JString::from(env.get_object_array_element(array, index)?);
        let string = env.get_string(&item)?.into();
        env.delete_local_ref(item)?;
        strings.push(string);
    }
    Ok(strings)
}

fn clear_exception(env: &mut JNIEnv) {
    if env.exception_check().unwrap_or(false) {
        let _ = env.exception_clear();
    }
}
