use log::debug;

use crate::error::SessionError;
use crate::runtime::{
    self, ApplicationMode, ControllerRole, DeviceClass, DeviceIndex, IntProperty,
    TrackingRuntime,
};

/// The two hand controllers the poll loop reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controllers {
    pub left: DeviceIndex,
    pub right: DeviceIndex,
}

/// A live connection to the tracking runtime. Closed on drop.
pub struct TrackingSession<R: TrackingRuntime> {
    runtime: R,
    open: bool,
}

impl TrackingSession<Box<dyn TrackingRuntime>> {
    pub fn open() -> Result<Self, SessionError> {
        debug!("Initializing tracking runtime...");
        let runtime = runtime::connect(ApplicationMode::Utility)?;
        Ok(Self::with_runtime(runtime))
    }
}

impl<R: TrackingRuntime> TrackingSession<R> {
    pub fn with_runtime(runtime: R) -> Self {
        Self {
            runtime,
            open: true,
        }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Binds the first connected left-hand and right-hand controllers.
    pub fn resolve_controllers(&self) -> Result<Controllers, SessionError> {
        let mut left: Option<DeviceIndex> = None;
        let mut right: Option<DeviceIndex> = None;

        for index in DeviceIndex::all() {
            if left.is_some() && right.is_some() {
                break;
            }
            if !self.runtime.is_connected(index) {
                continue;
            }
            let class = self.runtime.device_class(index);
            if class != DeviceClass::Controller {
                debug!("Skipping {class} at index {index}");
                continue;
            }

            let raw = self
                .runtime
                .int_property(index, IntProperty::ControllerRoleHint);
            let role = ControllerRole::from_raw(raw);
            let slot = match role {
                ControllerRole::LeftHand => &mut left,
                ControllerRole::RightHand => &mut right,
                other => {
                    debug!("Ignoring controller at index {index} with role {other}");
                    continue;
                }
            };
            if slot.is_none() {
                *slot = Some(index);
                debug!("Bound {role} controller to index {index}");
            }
        }

        match (left, right) {
            (Some(left), Some(right)) => Ok(Controllers { left, right }),
            _ => Err(SessionError::ControllersNotFound),
        }
    }

    /// Releases the runtime connection. Further calls are no-ops.
    pub fn close(&mut self) {
        if self.open {
            debug!("Shutting down tracking runtime...");
            self.runtime.shutdown();
            self.open = false;
        }
    }
}

impl<R: TrackingRuntime> Drop for TrackingSession<R> {
    fn drop(&mut self) {
        self.close();
    }
}
