//! Configuration-write contract shared by every mutating operation.
//!
//! Each write takes a `timeout_ms`:
//!
//! - `0`: fire-and-forget. The write is issued and the call returns; no
//!   confirmation read and no delay happen.
//! - `> 0`: after issuing, poll for confirmation and sleep between polls
//!   until confirmed or `timeout_ms` of delay has accumulated, then fail with
//!   [`ErrorCode::RX_TIMEOUT`]. A timed-out write may still have taken
//!   effect: treat it as unconfirmed, not as failed.

use embedded_hal::delay::DelayNs;
use pigeon_proto::{DeviceAddress, ErrorCode, Register};

use crate::transport::Transport;

/// Runtime tuning of confirmation waits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WriteConfig {
    /// Delay between confirmation polls.
    pub poll_interval_ms: u32,
    /// Largest difference between written and read-back values accepted as equal.
    pub readback_tolerance: f64,
}

/// Default write configuration: poll every millisecond, 1e-3 read-back tolerance.
pub const DEFAULT_WRITE_CONFIG: WriteConfig = WriteConfig {
    poll_interval_ms: 1,
    readback_tolerance: 1e-3,
};

impl Default for WriteConfig {
    fn default() -> Self {
        DEFAULT_WRITE_CONFIG
    }
}

/// How a write is confirmed when a timeout is given.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Confirmation {
    /// Read the register back and compare it to the written value.
    Readback,
    /// Wait for the device's configuration acknowledgment for the register.
    Acknowledgment,
}

/// One configuration write.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfigWrite {
    pub register: Register,
    pub value: f64,
    pub confirmation: Confirmation,
}

impl ConfigWrite {
    /// Write confirmed by reading the value back.
    #[must_use]
    pub const fn readback(register: Register, value: f64) -> Self {
        Self {
            register,
            value,
            confirmation: Confirmation::Readback,
        }
    }

    /// Write confirmed by the device's acknowledgment.
    #[must_use]
    pub const fn acknowledged(register: Register, value: f64) -> Self {
        Self {
            register,
            value,
            confirmation: Confirmation::Acknowledgment,
        }
    }
}

/// Issue `write` and, if `timeout_ms > 0`, block until it is confirmed.
pub fn write_config<T, D>(
    transport: &mut T,
    delay: &mut D,
    address: DeviceAddress,
    write: &ConfigWrite,
    timeout_ms: u32,
    config: &WriteConfig,
) -> Result<(), ErrorCode>
where
    T: Transport + ?Sized,
    D: DelayNs + ?Sized,
{
    log_debug!(
        "write {:?} = {} (timeout {} ms)",
        write.register,
        write.value,
        timeout_ms
    );

    if let Err(e) = transport.write_register(address, write.register, write.value) {
        log_warn!("write {:?} failed: {}", write.register, e);
        return Err(e);
    }

    if timeout_ms == 0 {
        return Ok(());
    }

    let confirmed = wait_until(delay, timeout_ms, config, || {
        is_confirmed(transport, address, write, config)
    });

    if !confirmed {
        log_warn!(
            "write {:?} not confirmed within {} ms",
            write.register,
            timeout_ms
        );
        return Err(ErrorCode::RX_TIMEOUT);
    }

    Ok(())
}

/// Read a configuration register.
///
/// `timeout_ms == 0` is a single read. Otherwise the read is repeated until
/// it succeeds or `timeout_ms` elapses, in which case the last read's error
/// is returned ([`ErrorCode::RX_TIMEOUT`] if that read reported none).
pub fn read_config<T, D>(
    transport: &mut T,
    delay: &mut D,
    address: DeviceAddress,
    register: Register,
    timeout_ms: u32,
    config: &WriteConfig,
) -> Result<f64, ErrorCode>
where
    T: Transport + ?Sized,
    D: DelayNs + ?Sized,
{
    let mut last = transport.read_register(address, register);
    if timeout_ms == 0 || last.error.is_ok() {
        return last.into_result();
    }

    let answered = wait_until(delay, timeout_ms, config, || {
        last = transport.read_register(address, register);
        last.error.is_ok()
    });

    if answered {
        Ok(last.value)
    } else {
        log_warn!("read {:?} timed out after {} ms", register, timeout_ms);
        Err(if last.error.is_err() {
            last.error
        } else {
            ErrorCode::RX_TIMEOUT
        })
    }
}

fn is_confirmed<T>(
    transport: &mut T,
    address: DeviceAddress,
    write: &ConfigWrite,
    config: &WriteConfig,
) -> bool
where
    T: Transport + ?Sized,
{
    match write.confirmation {
        Confirmation::Readback => {
            let sample = transport.read_register(address, write.register);
            let diff = sample.value - write.value;
            sample.error.is_ok()
                && -config.readback_tolerance <= diff
                && diff <= config.readback_tolerance
        }
        Confirmation::Acknowledgment => {
            let sample = transport.poll_acknowledgment(address, write.register);
            sample.error.is_ok() && sample.value
        }
    }
}

/// Poll `check` until it returns true or `timeout_ms` of delay has been spent.
///
/// `check` runs once more after the last delay, so a confirmation arriving at
/// the deadline is still seen.
fn wait_until<D>(
    delay: &mut D,
    timeout_ms: u32,
    config: &WriteConfig,
    mut check: impl FnMut() -> bool,
) -> bool
where
    D: DelayNs + ?Sized,
{
    let step = config.poll_interval_ms.max(1);
    let mut waited = 0u32;

    loop {
        if check() {
            return true;
        }
        if waited >= timeout_ms {
            return false;
        }
        let sleep = step.min(timeout_ms - waited);
        delay.delay_ms(sleep);
        waited += sleep;
    }
}
