//! The slice of the tracking runtime API this program consumes.
//!
//! Backends implement [`TrackingRuntime`]; [`connect`] picks the one compiled in.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;

use strum::Display;

use crate::error::SessionError;

/// Number of device slots the runtime exposes.
pub const MAX_TRACKED_DEVICE_COUNT: u32 = 64;

/// Slot index the runtime assigns to a connected peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceIndex(pub u32);

impl DeviceIndex {
    /// Every slot from 0 up to [`MAX_TRACKED_DEVICE_COUNT`].
    pub fn all() -> impl Iterator<Item = DeviceIndex> {
        (0..MAX_TRACKED_DEVICE_COUNT).map(DeviceIndex)
    }
}

impl fmt::Display for DeviceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DeviceClass {
    Invalid,
    #[strum(to_string = "head-mounted display")]
    HeadMountedDisplay,
    #[strum(to_string = "controller")]
    Controller,
    #[strum(to_string = "generic tracker")]
    GenericTracker,
    #[strum(to_string = "tracking reference")]
    TrackingReference,
    #[strum(to_string = "display redirect")]
    DisplayRedirect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ControllerRole {
    Invalid,
    #[strum(to_string = "left hand")]
    LeftHand,
    #[strum(to_string = "right hand")]
    RightHand,
    #[strum(to_string = "opt out")]
    OptOut,
    Treadmill,
    Stylus,
}

impl ControllerRole {
    /// Maps the integer role hint reported by the runtime.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            1 => ControllerRole::LeftHand,
            2 => ControllerRole::RightHand,
            3 => ControllerRole::OptOut,
            4 => ControllerRole::Treadmill,
            5 => ControllerRole::Stylus,
            _ => ControllerRole::Invalid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntProperty {
    ControllerRoleHint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatProperty {
    /// Charge as a fraction in `[0.0, 1.0]`.
    DeviceBatteryPercentage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationMode {
    /// Lightweight client: no scene rendering, does not start the runtime.
    Utility,
}

/// An open connection to the tracking runtime.
///
/// Property reads have no error channel: a failed read yields whatever value
/// the runtime reports for it.
pub trait TrackingRuntime {
    fn is_connected(&self, index: DeviceIndex) -> bool;

    fn device_class(&self, index: DeviceIndex) -> DeviceClass;

    fn int_property(&self, index: DeviceIndex, property: IntProperty) -> i32;

    fn float_property(&self, index: DeviceIndex, property: FloatProperty) -> f32;

    /// Releases the connection. Called at most once.
    fn shutdown(&mut self);
}

impl<R: TrackingRuntime + ?Sized> TrackingRuntime for Box<R> {
    fn is_connected(&self, index: DeviceIndex) -> bool {
        (**self).is_connected(index)
    }

    fn device_class(&self, index: DeviceIndex) -> DeviceClass {
        (**self).device_class(index)
    }

    fn int_property(&self, index: DeviceIndex, property: IntProperty) -> i32 {
        (**self).int_property(index, property)
    }

    fn float_property(&self, index: DeviceIndex, property: FloatProperty) -> f32 {
        (**self).float_property(index, property)
    }

    fn shutdown(&mut self) {
        (**self).shutdown()
    }
}

/// Remembers which devices already had a failed read reported, so a
/// disconnected controller is logged once instead of on every poll.
#[derive(Debug, Default)]
pub struct ReadFailures {
    reported: RefCell<HashSet<DeviceIndex>>,
}

impl ReadFailures {
    /// True the first time `index` fails.
    pub fn first_failure(&self, index: DeviceIndex) -> bool {
        self.reported.borrow_mut().insert(index)
    }

    /// Forgets `index` after a successful read.
    pub fn recovered(&self, index: DeviceIndex) {
        self.reported.borrow_mut().remove(&index);
    }
}

#[cfg(feature = "openvr")]
pub fn connect(mode: ApplicationMode) -> Result<Box<dyn TrackingRuntime>, SessionError> {
    let runtime = crate::openvr_backend::OpenVrRuntime::init(mode)?;
    Ok(Box::new(runtime))
}

#[cfg(not(feature = "openvr"))]
pub fn connect(mode: ApplicationMode) -> Result<Box<dyn TrackingRuntime>, SessionError> {
    log::debug!("No tracking backend compiled in; cannot start in {mode:?} mode");
    Err(SessionError::RuntimeUnavailable(
        "This build has no tracking runtime support. \
         Rebuild with --features openvr (needs cmake and a C++ toolchain)"
            .to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_hint_maps_known_values() {
        assert_eq!(ControllerRole::from_raw(1), ControllerRole::LeftHand);
        assert_eq!(ControllerRole::from_raw(2), ControllerRole::RightHand);
        assert_eq!(ControllerRole::from_raw(5), ControllerRole::Stylus);
    }

    #[test]
    fn role_hint_falls_back_to_invalid() {
        assert_eq!(ControllerRole::from_raw(0), ControllerRole::Invalid);
        assert_eq!(ControllerRole::from_raw(-1), ControllerRole::Invalid);
        assert_eq!(ControllerRole::from_raw(42), ControllerRole::Invalid);
    }

    #[test]
    fn device_slots_cover_the_runtime_range() {
        let slots: Vec<DeviceIndex> = DeviceIndex::all().collect();
        assert_eq!(slots.len(), MAX_TRACKED_DEVICE_COUNT as usize);
        assert_eq!(slots.first(), Some(&DeviceIndex(0)));
        assert_eq!(slots.last(), Some(&DeviceIndex(63)));
    }

    #[test]
    fn labels_read_naturally() {
        assert_eq!(ControllerRole::LeftHand.to_string(), "left hand");
        assert_eq!(DeviceClass::Controller.to_string(), "controller");
    }

    #[test]
    fn read_failures_are_reported_once_per_device() {
        let failures = ReadFailures::default();
        assert!(failures.first_failure(DeviceIndex(1)));
        assert!(!failures.first_failure(DeviceIndex(1)));
        assert!(failures.first_failure(DeviceIndex(2)));
        failures.recovered(DeviceIndex(1));
        assert!(failures.first_failure(DeviceIndex(1)));
    }

    #[cfg(not(feature = "openvr"))]
    #[test]
    fn connect_without_backend_reports_unavailable() {
        let err = connect(ApplicationMode::Utility).err().unwrap();
        assert_eq!(err.exit_code(), -3);
        assert!(err.to_string().contains("--features openvr"));
    }
}
