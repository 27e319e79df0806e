//! Platform-specific permission implementations.
//!
//! Only Android has a runtime-permission model to coordinate. Elsewhere the
//! coordinator is driven by a caller-supplied [`Platform`](crate::Platform).

#[cfg(target_os = "android")]
pub mod android;
