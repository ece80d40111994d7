use evdev::uinput::{VirtualDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, Key, RelativeAxisType};
use std::thread;
use std::time::Duration;

use crate::error::Result;

/// Creates a relative pointer device
///
/// Buttons are registered only so that compositors classify the device as
/// a mouse; nothing here presses them.
pub fn create_pointer() -> Result<VirtualDevice> {
    let mut buttons = AttributeSet::<Key>::new();
    for key in [Key::BTN_LEFT, Key::BTN_RIGHT, Key::BTN_MIDDLE] {
        buttons.insert(key);
    }

    let mut rel_axes = AttributeSet::<RelativeAxisType>::new();
    rel_axes.insert(RelativeAxisType::REL_X);
    rel_axes.insert(RelativeAxisType::REL_Y);

    let device = VirtualDeviceBuilder::new()?
        .name("windctl virtual pointer")
        .with_keys(&buttons)?
        .with_relative_axes(&rel_axes)?
        .build()?;

    // Events sent before the kernel has registered the device are dropped
    thread::sleep(Duration::from_secs(1));

    Ok(device)
}
