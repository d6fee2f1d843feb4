//! PigeonImu: a handle bound to one device.

use embedded_hal::delay::DelayNs;
use pigeon_proto::{
    CalibrationMode, ControlFrame, DeviceAddress, ErrorCode, FaultSet, Faults, FusionStatus,
    GeneralStatus, ParamId, PigeonState, Register, Signal, StatusFrame, StatusRule, StickyFaults,
    VectorSignal, CUSTOM_PARAM_COUNT,
};

use crate::config::{read_config, write_config, ConfigWrite, WriteConfig, DEFAULT_WRITE_CONFIG};
use crate::transport::Transport;
use crate::usage::{Attachment, UsageReporter};

/// Handle to one Pigeon IMU.
///
/// Owns its transport exclusively and performs no locking: concurrent use
/// from several threads must be serialized by the caller. Every call is an
/// independent transaction; use [`general_status`](Self::general_status)
/// rather than several single-field reads when fields must come from the
/// same poll.
///
/// # Error Handling
///
/// Every call returns its own error code (in the `Err` of a `Result`, or in
/// the `last_error` field of a decoded status). The code of the most recent
/// call is also kept and available from [`last_error`](Self::last_error).
/// Nothing is retried.
pub struct PigeonImu<T, D> {
    transport: T,
    delay: D,
    attachment: Attachment,
    address: DeviceAddress,
    config: WriteConfig,
    last_error: ErrorCode,
    last_rule: Option<StatusRule>,
}

impl<T: Transport, D: DelayNs> PigeonImu<T, D> {
    /// Bind a handle to the device reached through `attachment`.
    ///
    /// Fails with [`ErrorCode::INVALID_PARAM_VALUE`] for ids above 62, in
    /// which case nothing is reported. Otherwise the attachment's usage
    /// reports are sent to `reporter`.
    pub fn new<R: UsageReporter + ?Sized>(
        transport: T,
        delay: D,
        attachment: Attachment,
        reporter: &mut R,
    ) -> Result<Self, ErrorCode> {
        let address = attachment.bind()?;
        attachment.report_usage(reporter);
        log_info!("bound Pigeon {} via {:?}", address.device_id, address.route);

        Ok(Self {
            transport,
            delay,
            attachment,
            address,
            config: DEFAULT_WRITE_CONFIG,
            last_error: ErrorCode::OK,
            last_rule: None,
        })
    }

    /// Replace the confirmation-wait tuning.
    #[must_use]
    pub fn with_config(mut self, config: WriteConfig) -> Self {
        self.config = config;
        self
    }

    pub fn address(&self) -> DeviceAddress {
        self.address
    }

    pub fn attachment(&self) -> Attachment {
        self.attachment
    }

    pub fn device_id(&self) -> u8 {
        self.address.device_id
    }

    /// Error code of the most recent call on this handle.
    pub fn last_error(&self) -> ErrorCode {
        self.last_error
    }

    /// Get a reference to the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Decompose the handle into its transport and delay.
    pub fn into_parts(self) -> (T, D) {
        (self.transport, self.delay)
    }

    // ----- Configuration writes -----

    /// Set the yaw register (degrees, +/- 23040).
    pub fn set_yaw(&mut self, angle_deg: f64, timeout_ms: u32) -> Result<(), ErrorCode> {
        self.write(ConfigWrite::acknowledged(Register::Yaw, angle_deg), timeout_ms)
    }

    /// Atomically add to the yaw register.
    pub fn add_yaw(&mut self, angle_deg: f64, timeout_ms: u32) -> Result<(), ErrorCode> {
        self.write(ConfigWrite::acknowledged(Register::AddYaw, angle_deg), timeout_ms)
    }

    /// Set yaw to the current compass heading.
    pub fn set_yaw_to_compass(&mut self, timeout_ms: u32) -> Result<(), ErrorCode> {
        self.write(ConfigWrite::acknowledged(Register::YawToCompass, 0.0), timeout_ms)
    }

    /// Set the fused heading (degrees, +/- 23040).
    pub fn set_fused_heading(&mut self, angle_deg: f64, timeout_ms: u32) -> Result<(), ErrorCode> {
        self.write(
            ConfigWrite::acknowledged(Register::FusedHeading, angle_deg),
            timeout_ms,
        )
    }

    /// Atomically add to the fused heading.
    pub fn add_fused_heading(&mut self, angle_deg: f64, timeout_ms: u32) -> Result<(), ErrorCode> {
        self.write(
            ConfigWrite::acknowledged(Register::AddFusedHeading, angle_deg),
            timeout_ms,
        )
    }

    /// Set the fused heading to the current compass heading.
    pub fn set_fused_heading_to_compass(&mut self, timeout_ms: u32) -> Result<(), ErrorCode> {
        self.write(
            ConfigWrite::acknowledged(Register::FusedHeadingToCompass, 0.0),
            timeout_ms,
        )
    }

    pub fn set_accum_z_angle(&mut self, angle_deg: f64, timeout_ms: u32) -> Result<(), ErrorCode> {
        self.write(
            ConfigWrite::acknowledged(Register::AccumZAngle, angle_deg),
            timeout_ms,
        )
    }

    /// Enable or disable temperature compensation (on at boot).
    pub fn config_temperature_compensation_enable(
        &mut self,
        enable: bool,
        timeout_ms: u32,
    ) -> Result<(), ErrorCode> {
        let value = if enable { 1.0 } else { 0.0 };
        self.write(
            ConfigWrite::readback(Register::TemperatureCompensation, value),
            timeout_ms,
        )
    }

    /// Set the offset between magnetic north and true north.
    pub fn set_compass_declination(
        &mut self,
        angle_deg_offset: f64,
        timeout_ms: u32,
    ) -> Result<(), ErrorCode> {
        self.write(
            ConfigWrite::readback(Register::CompassDeclination, angle_deg_offset),
            timeout_ms,
        )
    }

    /// Set the continuous compass angle (the wrap-around part of the heading).
    pub fn set_compass_angle(&mut self, angle_deg: f64, timeout_ms: u32) -> Result<(), ErrorCode> {
        self.write(
            ConfigWrite::acknowledged(Register::CompassAngle, angle_deg),
            timeout_ms,
        )
    }

    /// Start a calibration procedure.
    ///
    /// Unrecognized modes are rejected with [`ErrorCode::INVALID_PARAM_VALUE`]
    /// before anything is sent.
    pub fn enter_calibration_mode(
        &mut self,
        mode: CalibrationMode,
        timeout_ms: u32,
    ) -> Result<(), ErrorCode> {
        if !mode.is_recognized() {
            return self.record(Err(ErrorCode::INVALID_PARAM_VALUE));
        }
        self.write(
            ConfigWrite::acknowledged(Register::CalibrationMode, f64::from(mode.raw())),
            timeout_ms,
        )
    }

    /// Store a value in a persistent custom parameter slot (`0..=1`).
    pub fn config_set_custom_param(
        &mut self,
        value: i32,
        index: u8,
        timeout_ms: u32,
    ) -> Result<(), ErrorCode> {
        Self::check_custom_index(index).or_else(|e| self.record(Err(e)))?;
        self.write(
            ConfigWrite::readback(Register::CustomParam(index), f64::from(value)),
            timeout_ms,
        )
    }

    pub fn config_get_custom_param(&mut self, index: u8, timeout_ms: u32) -> Result<i32, ErrorCode> {
        Self::check_custom_index(index).or_else(|e| self.record(Err(e)))?;
        let value = self.read_config(Register::CustomParam(index), timeout_ms)?;
        // Round half away from zero
        let rounded = if value < 0.0 { value - 0.5 } else { value + 0.5 };
        Ok(rounded as i32)
    }

    /// Set a firmware parameter by number. For features without a named accessor.
    ///
    /// `sub_value` travels with the write; reads address the parameter by
    /// `param` and `ordinal` only.
    pub fn config_set_parameter(
        &mut self,
        param: ParamId,
        value: f64,
        sub_value: u8,
        ordinal: i32,
        timeout_ms: u32,
    ) -> Result<(), ErrorCode> {
        let register = Register::Parameter {
            param,
            sub_value,
            ordinal,
        };
        self.write(ConfigWrite::readback(register, value), timeout_ms)
    }

    pub fn config_get_parameter(
        &mut self,
        param: ParamId,
        ordinal: i32,
        timeout_ms: u32,
    ) -> Result<f64, ErrorCode> {
        let register = Register::Parameter {
            param,
            sub_value: 0,
            ordinal,
        };
        self.read_config(register, timeout_ms)
    }

    pub fn set_status_frame_period(
        &mut self,
        frame: StatusFrame,
        period_ms: u32,
        timeout_ms: u32,
    ) -> Result<(), ErrorCode> {
        self.write(
            ConfigWrite::readback(Register::StatusFramePeriod(frame), f64::from(period_ms)),
            timeout_ms,
        )
    }

    pub fn get_status_frame_period(
        &mut self,
        frame: StatusFrame,
        timeout_ms: u32,
    ) -> Result<u32, ErrorCode> {
        let value = self.read_config(Register::StatusFramePeriod(frame), timeout_ms)?;
        Ok(value as u32)
    }

    /// Set the period of a control frame. Always fire-and-forget.
    pub fn set_control_frame_period(
        &mut self,
        frame: ControlFrame,
        period_ms: u32,
    ) -> Result<(), ErrorCode> {
        self.write(
            ConfigWrite::acknowledged(Register::ControlFramePeriod(frame), f64::from(period_ms)),
            0,
        )
    }

    /// Reset the sticky-fault accumulation. Live faults are unaffected.
    pub fn clear_sticky_faults(&mut self, timeout_ms: u32) -> Result<(), ErrorCode> {
        self.write(
            ConfigWrite::acknowledged(Register::ClearStickyFaults, 0.0),
            timeout_ms,
        )
    }

    // ----- Decoded status -----

    /// Poll and decode the general status frame.
    pub fn general_status(&mut self) -> GeneralStatus {
        let sample = self.transport.read_status(self.address);
        let status = GeneralStatus::decode(&sample.value, sample.error);
        self.last_error = sample.error;

        if sample.error.is_err() {
            log_warn!(
                "Pigeon {} status frame not received: {}",
                self.address.device_id,
                sample.error
            );
        }
        if status.state == PigeonState::UserCalibration && !status.current_mode.is_recognized() {
            log_warn!(
                "Pigeon {} reports unrecognized calibration mode {}",
                self.address.device_id,
                status.current_mode.raw()
            );
        }
        if self.last_rule != Some(status.rule) {
            log_trace!(
                "Pigeon {} state {} rule {:?}",
                self.address.device_id,
                status.state,
                status.rule
            );
            self.last_rule = Some(status.rule);
        }
        status
    }

    /// Poll the fused heading together with its validity classification.
    pub fn fusion_status(&mut self) -> FusionStatus {
        let sample = self.transport.read_fusion(self.address);
        self.last_error = sample.error;
        FusionStatus::decode(&sample.value, sample.error)
    }

    /// Fused heading in degrees, without classification.
    pub fn fused_heading(&mut self) -> Result<f64, ErrorCode> {
        self.read_signal(Signal::FusedHeading)
    }

    pub fn faults(&mut self) -> Result<Faults, ErrorCode> {
        let sample = self.transport.read_fault_bits(self.address, FaultSet::Live);
        self.record(sample.into_result()).map(Faults::decode)
    }

    pub fn sticky_faults(&mut self) -> Result<StickyFaults, ErrorCode> {
        let sample = self.transport.read_fault_bits(self.address, FaultSet::Sticky);
        self.record(sample.into_result()).map(StickyFaults::decode)
    }

    // ----- Signals -----

    /// `[w, x, y, z]`
    pub fn six_d_quaternion(&mut self) -> Result<[f64; 4], ErrorCode> {
        self.read_axes(VectorSignal::SixDQuaternion)
    }

    /// `[yaw, pitch, roll]` in degrees.
    pub fn yaw_pitch_roll(&mut self) -> Result<[f64; 3], ErrorCode> {
        self.read_axes(VectorSignal::YawPitchRoll)
    }

    /// Integrated gyro per axis, degrees.
    pub fn accum_gyro(&mut self) -> Result<[f64; 3], ErrorCode> {
        self.read_axes(VectorSignal::AccumGyro)
    }

    pub fn raw_magnetometer(&mut self) -> Result<[i16; 3], ErrorCode> {
        self.read_i16_axes(VectorSignal::RawMagnetometer)
    }

    pub fn biased_magnetometer(&mut self) -> Result<[i16; 3], ErrorCode> {
        self.read_i16_axes(VectorSignal::BiasedMagnetometer)
    }

    pub fn biased_accelerometer(&mut self) -> Result<[i16; 3], ErrorCode> {
        self.read_i16_axes(VectorSignal::BiasedAccelerometer)
    }

    /// Degrees per second.
    pub fn raw_gyro(&mut self) -> Result<[f64; 3], ErrorCode> {
        self.read_axes(VectorSignal::RawGyro)
    }

    pub fn accelerometer_angles(&mut self) -> Result<[f64; 3], ErrorCode> {
        self.read_axes(VectorSignal::AccelerometerAngles)
    }

    /// Compass heading in `[0, 360)` degrees.
    pub fn absolute_compass_heading(&mut self) -> Result<f64, ErrorCode> {
        self.read_signal(Signal::AbsoluteCompassHeading)
    }

    /// Continuous compass heading, including wrap-arounds.
    pub fn compass_heading(&mut self) -> Result<f64, ErrorCode> {
        self.read_signal(Signal::CompassHeading)
    }

    /// Measured magnetic field strength in microteslas.
    pub fn compass_field_strength(&mut self) -> Result<f64, ErrorCode> {
        self.read_signal(Signal::CompassFieldStrength)
    }

    pub fn temperature(&mut self) -> Result<f64, ErrorCode> {
        self.read_signal(Signal::TemperatureC)
    }

    /// Fails with [`ErrorCode::INVALID_PARAM_VALUE`] if the signal is not an exact integer.
    pub fn state(&mut self) -> Result<PigeonState, ErrorCode> {
        let raw = self.read_signal(Signal::State)?;
        match PigeonState::from_signal(raw) {
            Some(state) => Ok(state),
            None => {
                log_warn!("Pigeon {} sent non-integral state {}", self.address.device_id, raw);
                self.record(Err(ErrorCode::INVALID_PARAM_VALUE))
            }
        }
    }

    /// Seconds since boot; the firmware caps this at 255.
    pub fn up_time(&mut self) -> Result<u32, ErrorCode> {
        Ok(self.read_signal(Signal::UpTime)? as u32)
    }

    pub fn reset_count(&mut self) -> Result<u32, ErrorCode> {
        Ok(self.read_signal(Signal::ResetCount)? as u32)
    }

    pub fn reset_flags(&mut self) -> Result<u32, ErrorCode> {
        Ok(self.read_signal(Signal::ResetFlags)? as u32)
    }

    /// Valid once the device has been power cycled at least once.
    pub fn firmware_version(&mut self) -> Result<u32, ErrorCode> {
        Ok(self.read_signal(Signal::FirmwareVersion)? as u32)
    }

    /// True if the device reset since the previous call.
    pub fn has_reset_occurred(&mut self) -> Result<bool, ErrorCode> {
        Ok(self.read_signal(Signal::ResetOccurred)? != 0.0)
    }

    // ----- Internals -----

    fn record<X>(&mut self, result: Result<X, ErrorCode>) -> Result<X, ErrorCode> {
        self.last_error = match &result {
            Ok(_) => ErrorCode::OK,
            Err(e) => *e,
        };
        result
    }

    fn write(&mut self, write: ConfigWrite, timeout_ms: u32) -> Result<(), ErrorCode> {
        let result = write_config(
            &mut self.transport,
            &mut self.delay,
            self.address,
            &write,
            timeout_ms,
            &self.config,
        );
        self.record(result)
    }

    fn read_config(&mut self, register: Register, timeout_ms: u32) -> Result<f64, ErrorCode> {
        let result = read_config(
            &mut self.transport,
            &mut self.delay,
            self.address,
            register,
            timeout_ms,
            &self.config,
        );
        self.record(result)
    }

    fn read_signal(&mut self, signal: Signal) -> Result<f64, ErrorCode> {
        let sample = self.transport.read_signal(self.address, signal);
        self.record(sample.into_result())
    }

    fn read_axes<const N: usize>(&mut self, signal: VectorSignal) -> Result<[f64; N], ErrorCode> {
        debug_assert!(N <= signal.axes());
        let sample = self.transport.read_vector(self.address, signal);
        let values = self.record(sample.into_result())?;
        Ok(core::array::from_fn(|i| values[i]))
    }

    fn read_i16_axes(&mut self, signal: VectorSignal) -> Result<[i16; 3], ErrorCode> {
        let values: [f64; 3] = self.read_axes(signal)?;
        Ok(values.map(|v| v as i16))
    }

    fn check_custom_index(index: u8) -> Result<(), ErrorCode> {
        if index < CUSTOM_PARAM_COUNT {
            Ok(())
        } else {
            Err(ErrorCode::INVALID_PARAM_VALUE)
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::transport::Sample;
    use crate::usage::{NullUsageReporter, UsageResource};
    use pigeon_proto::{RawFusionStatus, RawGeneralStatus};
    use std::vec;
    use std::vec::Vec;

    /// Answers reads from fixed fields, acknowledges every write at once.
    #[derive(Default)]
    struct ScriptedTransport {
        status: RawGeneralStatus,
        fusion: RawFusionStatus,
        live_faults: u32,
        sticky_faults: u32,
        vector: [f64; 4],
        signal: f64,
        read_error: Option<ErrorCode>,
        writes: Vec<(Register, f64)>,
        acks: u32,
    }

    impl ScriptedTransport {
        fn error(&self) -> ErrorCode {
            self.read_error.unwrap_or(ErrorCode::OK)
        }
    }

    impl Transport for ScriptedTransport {
        fn read_status(&mut self, _: DeviceAddress) -> Sample<RawGeneralStatus> {
            Sample::failed(self.status, self.error())
        }

        fn read_fusion(&mut self, _: DeviceAddress) -> Sample<RawFusionStatus> {
            Sample::failed(self.fusion, self.error())
        }

        fn read_fault_bits(&mut self, _: DeviceAddress, set: FaultSet) -> Sample<u32> {
            let bits = match set {
                FaultSet::Live => self.live_faults,
                FaultSet::Sticky => self.sticky_faults,
            };
            Sample::failed(bits, self.error())
        }

        fn read_signal(&mut self, _: DeviceAddress, _: Signal) -> Sample<f64> {
            Sample::failed(self.signal, self.error())
        }

        fn read_vector(&mut self, _: DeviceAddress, _: VectorSignal) -> Sample<[f64; 4]> {
            Sample::failed(self.vector, self.error())
        }

        fn write_register(
            &mut self,
            _: DeviceAddress,
            register: Register,
            value: f64,
        ) -> Result<(), ErrorCode> {
            self.writes.push((register, value));
            Ok(())
        }

        fn read_register(&mut self, _: DeviceAddress, register: Register) -> Sample<f64> {
            let value = self
                .writes
                .iter()
                .rev()
                .find(|(r, _)| *r == register)
                .map_or(0.0, |&(_, v)| v);
            Sample::ok(value)
        }

        fn poll_acknowledgment(&mut self, _: DeviceAddress, _: Register) -> Sample<bool> {
            self.acks += 1;
            Sample::ok(true)
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _: u32) {}
    }

    #[derive(Default)]
    struct RecordingReporter {
        reports: Vec<(UsageResource, u32)>,
    }

    impl UsageReporter for RecordingReporter {
        fn report(&mut self, resource: UsageResource, instance: u32) {
            self.reports.push((resource, instance));
        }
    }

    fn pigeon(transport: ScriptedTransport) -> PigeonImu<ScriptedTransport, NoDelay> {
        PigeonImu::new(
            transport,
            NoDelay,
            Attachment::Direct { device_id: 3 },
            &mut NullUsageReporter,
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_out_of_range_without_reporting() {
        let mut reporter = RecordingReporter::default();
        let result = PigeonImu::new(
            ScriptedTransport::default(),
            NoDelay,
            Attachment::Direct { device_id: 63 },
            &mut reporter,
        );
        assert!(matches!(result, Err(ErrorCode::INVALID_PARAM_VALUE)));
        assert!(reporter.reports.is_empty());
    }

    #[test]
    fn test_new_via_talon_reports_both() {
        let mut reporter = RecordingReporter::default();
        let pigeon = PigeonImu::new(
            ScriptedTransport::default(),
            NoDelay,
            Attachment::ViaTalon { talon_id: 9 },
            &mut reporter,
        )
        .unwrap();

        assert_eq!(pigeon.device_id(), 9);
        assert_eq!(
            reporter.reports,
            vec![
                (UsageResource::PigeonImu, 10),
                (UsageResource::PigeonViaTalon, 10)
            ]
        );
    }

    #[test]
    fn test_general_status_comm_failure() {
        let mut pigeon = pigeon(ScriptedTransport {
            status: RawGeneralStatus {
                state: 2,
                ..RawGeneralStatus::default()
            },
            read_error: Some(ErrorCode::RX_TIMEOUT),
            ..ScriptedTransport::default()
        });

        let status = pigeon.general_status();

        assert_eq!(status.rule, StatusRule::NoStatusFrame);
        assert_eq!(status.state, PigeonState::Ready);
        assert_eq!(status.last_error, ErrorCode::RX_TIMEOUT);
        assert_eq!(pigeon.last_error(), ErrorCode::RX_TIMEOUT);
    }

    #[test]
    fn test_general_status_user_calibration() {
        let mut pigeon = pigeon(ScriptedTransport {
            status: RawGeneralStatus {
                state: 3,
                current_mode: 3,
                ..RawGeneralStatus::default()
            },
            ..ScriptedTransport::default()
        });

        let status = pigeon.general_status();

        assert_eq!(status.rule, StatusRule::UserCalibration);
        assert_eq!(status.current_mode, CalibrationMode::Magnetometer360);
        assert!(status.description.contains("360"));
        assert_eq!(pigeon.last_error(), ErrorCode::OK);
    }

    #[test]
    fn test_fusion_status_failure_clears_flags() {
        let mut pigeon = pigeon(ScriptedTransport {
            fusion: RawFusionStatus {
                is_fusing: true,
                is_valid: true,
                heading_deg: 45.0,
            },
            read_error: Some(ErrorCode::CAN_MSG_STALE),
            ..ScriptedTransport::default()
        });

        let fusion = pigeon.fusion_status();

        assert!(!fusion.is_fusing);
        assert!(!fusion.is_valid);
        assert_eq!(fusion.last_error, ErrorCode::CAN_MSG_STALE);
    }

    #[test]
    fn test_sticky_faults_read_their_own_set() {
        let mut pigeon = pigeon(ScriptedTransport {
            live_faults: 0,
            sticky_faults: Faults::UNDER_VOLTAGE.bits(),
            ..ScriptedTransport::default()
        });

        assert!(!pigeon.faults().unwrap().has_any_fault());
        let sticky = pigeon.sticky_faults().unwrap();
        assert!(sticky.contains(Faults::UNDER_VOLTAGE));
    }

    #[test]
    fn test_custom_param_index_rejected_before_transport() {
        let mut pigeon = pigeon(ScriptedTransport::default());

        assert_eq!(
            pigeon.config_set_custom_param(5, 2, 10),
            Err(ErrorCode::INVALID_PARAM_VALUE)
        );
        assert_eq!(
            pigeon.config_get_custom_param(2, 10),
            Err(ErrorCode::INVALID_PARAM_VALUE)
        );
        assert!(pigeon.transport().writes.is_empty());
        assert_eq!(pigeon.last_error(), ErrorCode::INVALID_PARAM_VALUE);
    }

    #[test]
    fn test_custom_param_round_trip() {
        let mut pigeon = pigeon(ScriptedTransport::default());

        assert_eq!(pigeon.config_set_custom_param(-42, 1, 10), Ok(()));
        assert_eq!(pigeon.config_get_custom_param(1, 10), Ok(-42));
        assert_eq!(pigeon.last_error(), ErrorCode::OK);
    }

    #[test]
    fn test_zero_timeout_write_is_fire_and_forget() {
        let mut pigeon = pigeon(ScriptedTransport::default());

        assert_eq!(pigeon.set_yaw(90.0, 0), Ok(()));

        assert_eq!(pigeon.transport().writes, vec![(Register::Yaw, 90.0)]);
        assert_eq!(pigeon.transport().acks, 0);
    }

    #[test]
    fn test_control_frame_period_never_waits() {
        let mut pigeon = pigeon(ScriptedTransport::default());

        assert_eq!(
            pigeon.set_control_frame_period(ControlFrame::Control1, 20),
            Ok(())
        );

        assert_eq!(
            pigeon.transport().writes,
            vec![(Register::ControlFramePeriod(ControlFrame::Control1), 20.0)]
        );
        assert_eq!(pigeon.transport().acks, 0);
    }

    #[test]
    fn test_enter_calibration_mode_sends_raw_value() {
        let mut pigeon = pigeon(ScriptedTransport::default());

        assert_eq!(
            pigeon.enter_calibration_mode(CalibrationMode::Accelerometer, 10),
            Ok(())
        );
        assert_eq!(
            pigeon.enter_calibration_mode(CalibrationMode::Unrecognized(4), 10),
            Err(ErrorCode::INVALID_PARAM_VALUE)
        );
        assert_eq!(
            pigeon.transport().writes,
            vec![(Register::CalibrationMode, 5.0)]
        );
    }

    #[test]
    fn test_status_frame_period_readback() {
        let mut pigeon = pigeon(ScriptedTransport::default());

        assert_eq!(
            pigeon.set_status_frame_period(StatusFrame::CondStatus9SixDegYpr, 100, 10),
            Ok(())
        );
        assert_eq!(
            pigeon.get_status_frame_period(StatusFrame::CondStatus9SixDegYpr, 10),
            Ok(100)
        );
    }

    #[test]
    fn test_vector_reads() {
        let mut pigeon = pigeon(ScriptedTransport {
            vector: [1.0, -2.0, 3.0, 4.0],
            ..ScriptedTransport::default()
        });

        assert_eq!(pigeon.six_d_quaternion(), Ok([1.0, -2.0, 3.0, 4.0]));
        assert_eq!(pigeon.yaw_pitch_roll(), Ok([1.0, -2.0, 3.0]));
        assert_eq!(pigeon.raw_magnetometer(), Ok([1, -2, 3]));
    }

    #[test]
    fn test_last_error_tracks_latest_call() {
        let mut pigeon = pigeon(ScriptedTransport {
            signal: 2.0,
            read_error: Some(ErrorCode::RX_TIMEOUT),
            ..ScriptedTransport::default()
        });

        assert_eq!(pigeon.state(), Err(ErrorCode::RX_TIMEOUT));
        assert_eq!(pigeon.last_error(), ErrorCode::RX_TIMEOUT);

        pigeon.transport_mut().read_error = None;
        assert_eq!(pigeon.state(), Ok(PigeonState::Ready));
        assert_eq!(pigeon.last_error(), ErrorCode::OK);
    }

    #[test]
    fn test_state_rejects_inexact_signal() {
        for raw in [f64::NAN, 2.7, 3.999, -0.5] {
            let mut pigeon = pigeon(ScriptedTransport {
                signal: raw,
                ..ScriptedTransport::default()
            });

            assert_eq!(pigeon.state(), Err(ErrorCode::INVALID_PARAM_VALUE));
            assert_eq!(pigeon.last_error(), ErrorCode::INVALID_PARAM_VALUE);
        }
    }

    #[test]
    fn test_state_keeps_unknown_integer() {
        let mut pigeon = pigeon(ScriptedTransport {
            signal: 12.0,
            ..ScriptedTransport::default()
        });

        assert_eq!(pigeon.state(), Ok(PigeonState::Unrecognized(12)));
    }

    #[test]
    fn test_status_rule_tracked_across_polls() {
        let mut pigeon = pigeon(ScriptedTransport {
            status: RawGeneralStatus {
                state: 2,
                ..RawGeneralStatus::default()
            },
            ..ScriptedTransport::default()
        });
        assert_eq!(pigeon.last_rule, None);

        pigeon.general_status();
        pigeon.general_status();
        assert_eq!(pigeon.last_rule, Some(StatusRule::Running));

        pigeon.transport_mut().read_error = Some(ErrorCode::RX_TIMEOUT);
        pigeon.general_status();
        assert_eq!(pigeon.last_rule, Some(StatusRule::NoStatusFrame));
    }
}
