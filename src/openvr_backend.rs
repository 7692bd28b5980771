//! OpenVR (SteamVR) backend.

use log::debug;
use openvr::{property, ApplicationType, Context, System, TrackedDeviceClass};

use crate::error::SessionError;
use crate::runtime::{
    ApplicationMode, DeviceClass, DeviceIndex, FloatProperty, IntProperty, ReadFailures,
    TrackingRuntime,
};

pub struct OpenVrRuntime {
    context: Option<Context>,
    system: System,
    failures: ReadFailures,
}

impl OpenVrRuntime {
    pub fn init(mode: ApplicationMode) -> Result<Self, SessionError> {
        let application = match mode {
            ApplicationMode::Utility => ApplicationType::Utility,
        };
        // SAFETY: a single context is created per process and torn down in `shutdown`.
        let context = unsafe { openvr::init(application) }
            .map_err(|err| SessionError::RuntimeUnavailable(err.to_string()))?;
        let system = context
            .system()
            .map_err(|err| SessionError::RuntimeUnavailable(err.to_string()))?;
        Ok(Self {
            context: Some(context),
            system,
            failures: ReadFailures::default(),
        })
    }
}

impl TrackingRuntime for OpenVrRuntime {
    fn is_connected(&self, index: DeviceIndex) -> bool {
        self.system.is_tracked_device_connected(index.0)
    }

    fn device_class(&self, index: DeviceIndex) -> DeviceClass {
        match self.system.tracked_device_class(index.0) {
            TrackedDeviceClass::HMD => DeviceClass::HeadMountedDisplay,
            TrackedDeviceClass::Controller => DeviceClass::Controller,
            TrackedDeviceClass::GenericTracker => DeviceClass::GenericTracker,
            TrackedDeviceClass::TrackingReference => DeviceClass::TrackingReference,
            TrackedDeviceClass::DisplayRedirect => DeviceClass::DisplayRedirect,
            _ => DeviceClass::Invalid,
        }
    }

    fn int_property(&self, index: DeviceIndex, prop: IntProperty) -> i32 {
        let id = match prop {
            IntProperty::ControllerRoleHint => property::ControllerRoleHint_Int32,
        };
        self.system
            .int32_tracked_device_property(index.0, id)
            .unwrap_or_else(|err| {
                debug!("Reading {prop:?} from device {index} failed: {err}");
                0
            })
    }

    fn float_property(&self, index: DeviceIndex, prop: FloatProperty) -> f32 {
        let id = match prop {
            FloatProperty::DeviceBatteryPercentage => property::DeviceBatteryPercentage_Float,
        };
        match self.system.float_tracked_device_property(index.0, id) {
            Ok(value) => {
                self.failures.recovered(index);
                value
            }
            Err(err) => {
                // Once per outage, the status line is overwritten in place.
                if self.failures.first_failure(index) {
                    debug!("Reading {prop:?} from device {index} failed: {err}");
                }
                0.0
            }
        }
    }

    fn shutdown(&mut self) {
        if let Some(context) = self.context.take() {
            // SAFETY: `system` is never used after the context is gone.
            unsafe { context.shutdown() };
        }
    }
}
