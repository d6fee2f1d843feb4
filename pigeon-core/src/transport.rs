//! Transport boundary: the CAN session a device handle talks through.
//!
//! Framing, arbitration and device discovery live behind this trait and are
//! not part of this crate.

use pigeon_proto::{
    DeviceAddress, ErrorCode, FaultSet, RawFusionStatus, RawGeneralStatus, Register, Signal,
    VectorSignal,
};

/// A value read from the device together with the error code of that read.
///
/// On failure `value` holds whatever the transport had (possibly stale or
/// zeroed), so decoders can still populate their fields.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sample<T> {
    pub value: T,
    pub error: ErrorCode,
}

impl<T> Sample<T> {
    #[inline]
    pub const fn ok(value: T) -> Self {
        Self {
            value,
            error: ErrorCode::OK,
        }
    }

    #[inline]
    pub const fn failed(value: T, error: ErrorCode) -> Self {
        Self { value, error }
    }

    /// Drop the value on failure.
    #[inline]
    pub fn into_result(self) -> Result<T, ErrorCode> {
        match self.error.into_result() {
            Ok(()) => Ok(self.value),
            Err(e) => Err(e),
        }
    }

    #[inline]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sample<U> {
        Sample {
            value: f(self.value),
            error: self.error,
        }
    }
}

/// Blocking register-level access to one or more devices.
///
/// Every call is a single-shot transaction: no retries, no waiting. A
/// failure is reported through the returned error code, never by panicking.
///
/// # Blocking
///
/// Implementations must return promptly; bounded waits for configuration
/// acknowledgment are done by the caller (see [`crate::config`]).
pub trait Transport {
    /// Latest general status frame.
    fn read_status(&mut self, address: DeviceAddress) -> Sample<RawGeneralStatus>;

    /// Latest sensor-fusion frame.
    fn read_fusion(&mut self, address: DeviceAddress) -> Sample<RawFusionStatus>;

    /// Live or sticky fault bitmask.
    fn read_fault_bits(&mut self, address: DeviceAddress, set: FaultSet) -> Sample<u32>;

    /// A scalar signal.
    fn read_signal(&mut self, address: DeviceAddress, signal: Signal) -> Sample<f64>;

    /// A multi-axis signal, all components from the same frame.
    fn read_vector(&mut self, address: DeviceAddress, signal: VectorSignal) -> Sample<[f64; 4]>;

    /// Issue a configuration write. Returns as soon as the frame is queued.
    fn write_register(
        &mut self,
        address: DeviceAddress,
        register: Register,
        value: f64,
    ) -> Result<(), ErrorCode>;

    /// Current value of a configuration register, as last reported by the device.
    fn read_register(&mut self, address: DeviceAddress, register: Register) -> Sample<f64>;

    /// Whether the device has acknowledged the most recent write to `register`.
    fn poll_acknowledgment(&mut self, address: DeviceAddress, register: Register) -> Sample<bool>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn read_status(&mut self, address: DeviceAddress) -> Sample<RawGeneralStatus> {
        (**self).read_status(address)
    }

    fn read_fusion(&mut self, address: DeviceAddress) -> Sample<RawFusionStatus> {
        (**self).read_fusion(address)
    }

    fn read_fault_bits(&mut self, address: DeviceAddress, set: FaultSet) -> Sample<u32> {
        (**self).read_fault_bits(address, set)
    }

    fn read_signal(&mut self, address: DeviceAddress, signal: Signal) -> Sample<f64> {
        (**self).read_signal(address, signal)
    }

    fn read_vector(&mut self, address: DeviceAddress, signal: VectorSignal) -> Sample<[f64; 4]> {
        (**self).read_vector(address, signal)
    }

    fn write_register(
        &mut self,
        address: DeviceAddress,
        register: Register,
        value: f64,
    ) -> Result<(), ErrorCode> {
        (**self).write_register(address, register, value)
    }

    fn read_register(&mut self, address: DeviceAddress, register: Register) -> Sample<f64> {
        (**self).read_register(address, register)
    }

    fn poll_acknowledgment(&mut self, address: DeviceAddress, register: Register) -> Sample<bool> {
        (**self).poll_acknowledgment(address, register)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_into_result() {
        assert_eq!(Sample::ok(3.5).into_result(), Ok(3.5));
        assert_eq!(
            Sample::failed(3.5, ErrorCode::RX_TIMEOUT).into_result(),
            Err(ErrorCode::RX_TIMEOUT)
        );
    }

    #[test]
    fn test_sample_map_keeps_error() {
        let sample = Sample::failed(2.0_f64, ErrorCode::CAN_MSG_STALE).map(|v| v as u32);
        assert_eq!(sample.value, 2);
        assert_eq!(sample.error, ErrorCode::CAN_MSG_STALE);
    }
}
