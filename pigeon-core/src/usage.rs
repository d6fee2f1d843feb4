//! How a handle is attached to its device, and the usage reports each
//! attachment emits.
//!
//! Usage reporting is the host framework's resource accounting. It happens
//! once, at construction, and is explicit in the attachment variant:
//! a ribbon-cable attachment reports one resource more than a direct one.

use pigeon_proto::{DeviceAddress, ErrorCode, Route};

/// Resource kinds reported to the host framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UsageResource {
    /// Any Pigeon handle.
    PigeonImu,
    /// Pigeon reached through a Talon SRX ribbon cable.
    PigeonViaTalon,
}

/// Sink for usage reports.
pub trait UsageReporter {
    /// Record that `instance` of `resource` is in use.
    fn report(&mut self, resource: UsageResource, instance: u32);
}

/// Reporter that discards all reports.
///
/// Use this when the host has no resource accounting.
pub struct NullUsageReporter;

impl UsageReporter for NullUsageReporter {
    fn report(&mut self, _resource: UsageResource, _instance: u32) {}
}

impl<R: UsageReporter + ?Sized> UsageReporter for &mut R {
    fn report(&mut self, resource: UsageResource, instance: u32) {
        (**self).report(resource, instance);
    }
}

/// How the device is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Attachment {
    /// On the CAN bus under its own device id.
    Direct { device_id: u8 },
    /// Over the ribbon cable of a Talon SRX; the Pigeon answers to the Talon's id.
    ViaTalon { talon_id: u8 },
}

impl Attachment {
    /// Device id the handle binds to.
    #[must_use]
    pub const fn device_id(self) -> u8 {
        match self {
            Self::Direct { device_id } => device_id,
            Self::ViaTalon { talon_id } => talon_id,
        }
    }

    #[must_use]
    pub const fn route(self) -> Route {
        match self {
            Self::Direct { .. } => Route::Can,
            Self::ViaTalon { .. } => Route::TalonRibbon,
        }
    }

    /// Validate the id and bind an address.
    pub fn bind(self) -> Result<DeviceAddress, ErrorCode> {
        DeviceAddress::new(self.device_id(), self.route()).ok_or(ErrorCode::INVALID_PARAM_VALUE)
    }

    /// Emit this attachment's usage reports. Instances are 1-based.
    pub fn report_usage<R: UsageReporter + ?Sized>(self, reporter: &mut R) {
        let instance = u32::from(self.device_id()) + 1;
        reporter.report(UsageResource::PigeonImu, instance);
        if let Self::ViaTalon { .. } = self {
            reporter.report(UsageResource::PigeonViaTalon, instance);
        }
    }
}
