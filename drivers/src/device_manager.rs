use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use common::sync::SpinLock;

use crate::hal::timer::TimerDevice;

/// Device types that can be managed
pub enum Device {
    Timer(Arc<TimerDevice>),
}

impl Device {
    /// Create a timer device entry from a bound instance
    pub fn new_timer(timer: Arc<TimerDevice>) -> Self {
        Device::Timer(timer)
    }
}

pub struct DeviceManager {
    devices: BTreeMap<String, Device>,
}

impl DeviceManager {
    pub const fn new() -> Self {
        Self {
            devices: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, name: String, device: Device) {
        self.devices.insert(name, device);
    }

    pub fn get(&self, name: &str) -> Option<&Device> {
        self.devices.get(name)
    }

    pub fn list(&self) -> impl Iterator<Item = &String> {
        self.devices.keys()
    }

    pub fn timer(&self, name: &str) -> Option<Arc<TimerDevice>> {
        match self.get(name)? {
            Device::Timer(timer) => Some(timer.clone()),
        }
    }
}

static DEVICE_MANAGER: SpinLock<DeviceManager> = SpinLock::new(DeviceManager::new());

pub fn devices() -> &'static SpinLock<DeviceManager> {
    &DEVICE_MANAGER
}
