//! Host-side Pigeon IMU handle built on a pluggable transport.
//!
//! This crate binds the pure decoders of [`pigeon_proto`] to a device: it
//! polls status frames through a [`Transport`], decodes them, and issues
//! configuration writes with bounded confirmation waits. It has no platform
//! dependencies beyond `embedded-hal`'s blocking delay.
//!
//! # Overview
//!
//! - [`transport`]: CAN session boundary ([`Transport`], [`Sample`])
//! - [`config`]: Configuration-write contract ([`write_config`], [`WriteConfig`])
//! - [`usage`]: Device binding and usage reporting ([`Attachment`], [`UsageReporter`])
//! - [`device`]: The device handle ([`PigeonImu`])
//!
//! # Timeouts
//!
//! Every mutating operation takes `timeout_ms`. With `0` the write is
//! fire-and-forget; otherwise the call blocks until the device confirms or
//! the timeout elapses, failing with [`ErrorCode::RX_TIMEOUT`].
//!
//! # Example
//!
//! ```rust
//! use embedded_hal::delay::DelayNs;
//! use pigeon_core::{Attachment, NullUsageReporter, PigeonImu, Sample, Transport};
//! use pigeon_core::pigeon_proto::*;
//!
//! struct Offline;
//!
//! impl Transport for Offline {
//!     fn read_status(&mut self, _: DeviceAddress) -> Sample<RawGeneralStatus> {
//!         Sample::failed(RawGeneralStatus::default(), ErrorCode::RX_TIMEOUT)
//!     }
//!     fn read_fusion(&mut self, _: DeviceAddress) -> Sample<RawFusionStatus> {
//!         Sample::failed(RawFusionStatus::default(), ErrorCode::RX_TIMEOUT)
//!     }
//!     fn read_fault_bits(&mut self, _: DeviceAddress, _: FaultSet) -> Sample<u32> {
//!         Sample::failed(0, ErrorCode::RX_TIMEOUT)
//!     }
//!     fn read_signal(&mut self, _: DeviceAddress, _: Signal) -> Sample<f64> {
//!         Sample::failed(0.0, ErrorCode::RX_TIMEOUT)
//!     }
//!     fn read_vector(&mut self, _: DeviceAddress, _: VectorSignal) -> Sample<[f64; 4]> {
//!         Sample::failed([0.0; 4], ErrorCode::RX_TIMEOUT)
//!     }
//!     fn write_register(&mut self, _: DeviceAddress, _: Register, _: f64) -> Result<(), ErrorCode> {
//!         Err(ErrorCode::TX_FAILED)
//!     }
//!     fn read_register(&mut self, _: DeviceAddress, _: Register) -> Sample<f64> {
//!         Sample::failed(0.0, ErrorCode::RX_TIMEOUT)
//!     }
//!     fn poll_acknowledgment(&mut self, _: DeviceAddress, _: Register) -> Sample<bool> {
//!         Sample::failed(false, ErrorCode::RX_TIMEOUT)
//!     }
//! }
//!
//! struct Spin;
//! impl DelayNs for Spin {
//!     fn delay_ns(&mut self, _: u32) {}
//! }
//!
//! let attachment = Attachment::Direct { device_id: 0 };
//! let mut pigeon = PigeonImu::new(Offline, Spin, attachment, &mut NullUsageReporter).unwrap();
//!
//! let status = pigeon.general_status();
//! assert_eq!(status.rule, StatusRule::NoStatusFrame);
//! assert_eq!(pigeon.set_yaw(0.0, 0), Err(ErrorCode::TX_FAILED));
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//! - **`log`**: Route diagnostics through the `log` facade (for host logging)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

// This must go first so the logging macros are visible to every module
#[macro_use]
mod fmt;

pub mod config;
pub mod device;
pub mod transport;
pub mod usage;

pub use pigeon_proto;

// Re-export main types at crate root
pub use config::{
    read_config, write_config, ConfigWrite, Confirmation, WriteConfig, DEFAULT_WRITE_CONFIG,
};
pub use device::PigeonImu;
pub use pigeon_proto::ErrorCode;
pub use transport::{Sample, Transport};
pub use usage::{Attachment, NullUsageReporter, UsageReporter, UsageResource};
