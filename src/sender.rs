//! Sender node: remote-control main-loop logic.
//!
//! One [`SenderNode::run_cycle`] call is one pass of the firmware loop:
//!
//! ```text
//! debounce ─▶ arbitrate ─▶ dispatch ─▶ delivery outcome ─▶ battery ─▶ power
//! ```
//!
//! Time comes from the board's [`Clock`], so the whole cycle runs on a host
//! with a mock board and a virtual clock.

use embedded_hal::delay::DelayNs;
use log::info;

use crate::battery::{BatteryMonitor, BatteryStatus};
use crate::buttons::{Arbitration, ButtonArbiter, ButtonMask, InputDebouncer};
use crate::config::SenderConfig;
use crate::dispatch::{Dispatch, Telemetry, TransmitDispatcher};
use crate::hal::{BatterySensor, ButtonInputs, Clock, SleepControl, StatusIndicator, Transport};
use crate::link::SendOutcome;
use crate::power::{report_wake, PowerState, SenderPowerController, SleepError, WakeCause};
use crate::status::StatusPattern;

/// Everything the remote's main loop touches.
pub trait SenderBoard:
    ButtonInputs + DelayNs + Transport + StatusIndicator + SleepControl + BatterySensor + Clock
{
}

impl<T> SenderBoard for T where
    T: ButtonInputs + DelayNs + Transport + StatusIndicator + SleepControl + BatterySensor + Clock
{
}

/// What one loop pass did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CycleReport {
    pub mask: ButtonMask,
    pub arbitration: Arbitration,
    pub dispatch: Option<Dispatch>,
    pub outcome: Option<SendOutcome>,
    pub battery: Option<BatteryStatus>,
    pub power: PowerState,
    pub sleep_error: Option<SleepError>,
}

/// Sender state owned by the main loop.
#[derive(Debug)]
pub struct SenderNode {
    debouncer: InputDebouncer,
    arbiter: ButtonArbiter,
    dispatcher: TransmitDispatcher,
    battery: BatteryMonitor,
    power: SenderPowerController,
    wake: WakeCause,
}

impl SenderNode {
    /// Boot the remote: report the wake reason, flash, take a battery reading.
    ///
    /// Every boot starts here, including every wake from deep sleep.
    pub fn boot<B: SenderBoard>(config: &SenderConfig, board: &mut B) -> Self {
        let wake = board.wake_cause();
        report_wake(wake);
        board.display(StatusPattern::Awake);

        let now = board.now_ms();
        let mut battery = BatteryMonitor::new(config.battery_check_interval_ms);
        let status = battery.check(board, now);
        show_battery(board, status);

        info!("sending to {}", config.receiver);

        Self {
            debouncer: InputDebouncer::new(config.debounce_ms),
            arbiter: ButtonArbiter::new(config.hold_timeout_ms),
            dispatcher: TransmitDispatcher::new(config.receiver),
            battery,
            power: SenderPowerController::new(config.inactivity_timeout_ms, board.now_ms()),
            wake,
        }
    }

    pub fn wake_cause(&self) -> WakeCause {
        self.wake
    }

    pub fn power_state(&self) -> PowerState {
        self.power.state()
    }

    pub fn dispatcher(&self) -> &TransmitDispatcher {
        &self.dispatcher
    }

    pub fn battery_volts(&self) -> f32 {
        self.battery.volts()
    }

    /// One pass of the main loop.
    ///
    /// On hardware a cycle that reaches deep sleep never returns.
    pub fn run_cycle<B: SenderBoard>(&mut self, board: &mut B) -> CycleReport {
        let mask = self.debouncer.sample(board);
        let now = board.now_ms();

        let arbitration = self.arbiter.arbitrate(mask, now);
        if arbitration.is_activity() {
            self.power.record_activity(now);
        }

        let dispatch = match arbitration {
            Arbitration::Transmit(command) => {
                info!("button {} pressed", command.number());
                board.display(StatusPattern::ButtonOk);
                let telemetry = Telemetry {
                    battery_volts: self.battery.volts(),
                    link_quality: board.link_quality(),
                };
                Some(self.dispatcher.dispatch(board, command, telemetry))
            }
            Arbitration::Rejected { .. } => {
                board.display(StatusPattern::MultiButtonError);
                None
            }
            Arbitration::Idle | Arbitration::Held(_) => None,
        };

        let outcome = board.poll_outcome();
        if let Some(outcome) = outcome {
            self.dispatcher.report_outcome(board, outcome);
        }

        let battery = self.battery.poll(board, now);
        if let Some(status) = battery {
            show_battery(board, status);
        }

        let mut sleep_error = None;
        if self.power.poll(now) == PowerState::InactivityPending {
            board.display(StatusPattern::InactivityTimeout);
            self.arbiter.reset();
            sleep_error = self.power.enter_deep_sleep(board, now).err();
        }

        CycleReport {
            mask,
            arbitration,
            dispatch,
            outcome,
            battery,
            power: self.power.state(),
            sleep_error,
        }
    }
}

fn show_battery<I: StatusIndicator>(indicator: &mut I, status: BatteryStatus) {
    if let Some(pattern) = status.pattern() {
        indicator.display(pattern);
    }
}
