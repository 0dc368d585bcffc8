//! Sender power state machine.
//!
//! ```text
//! Active ──(no button activity for inactivity_timeout)──▶ InactivityPending
//!   ▲                                                         │
//!   │ activity / wake config failed                 configure wake sources
//!   │                                                         ▼
//!   └────────────────── fresh boot ◀──────────────────── DeepSleep
//! ```
//!
//! Deep sleep loses all RAM. There is no resume path: waking is a reboot, and
//! every component is rebuilt from its initial configuration. The only thing
//! carried across is the platform wake-cause register, reported here for
//! observability. No behavior depends on which button woke the remote.

use core::fmt;

use log::{error, info};

use crate::buttons::{ButtonMask, BUTTON_COUNT};
use crate::config::INACTIVITY_TIMEOUT_MS;
use crate::hal::{SleepControl, WakeTrigger};

/// Power state of the remote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerState {
    /// Sampling buttons.
    Active,
    /// Inactivity timeout reached, sleep transition pending.
    InactivityPending,
    /// Suspended (only observable on host: hardware never returns).
    DeepSleep,
}

/// Why the remote booted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WakeCause {
    /// Button line(s) pulled low during deep sleep.
    ExternalPin(ButtonMask),
    /// RTC timer wake (not configured by this firmware).
    Timer,
    /// Power-on or any other reset.
    PowerOn,
}

impl WakeCause {
    /// Translate an ext1 wake status (bit n = GPIO n) into button lines.
    pub fn from_ext1_status(status: u64, gpios: &[u8; BUTTON_COUNT]) -> Self {
        let lines = gpios
            .iter()
            .enumerate()
            .filter(|&(_, &gpio)| status & (1u64 << gpio) != 0)
            .fold(ButtonMask::NONE, |mask, (line, _)| mask.with(line));
        WakeCause::ExternalPin(lines)
    }
}

/// Sleep transition failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepError {
    /// Called while not in `InactivityPending`.
    NotPending,
    /// Wake sources could not be armed; sleeping now could never wake.
    WakeConfig,
}

impl fmt::Display for SleepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPending => write!(f, "no sleep transition pending"),
            Self::WakeConfig => write!(f, "wake source configuration failed"),
        }
    }
}

/// Owns the inactivity timer and the deep-sleep transition.
#[derive(Debug)]
pub struct SenderPowerController {
    state: PowerState,
    last_activity_ms: u64,
    inactivity_timeout_ms: u64,
}

impl SenderPowerController {
    /// Start `Active` with the inactivity timer running from `now_ms`.
    pub fn new(inactivity_timeout_ms: u64, now_ms: u64) -> Self {
        Self {
            state: PowerState::Active,
            last_activity_ms: now_ms,
            inactivity_timeout_ms,
        }
    }

    /// Controller with the default 30 s timeout.
    pub fn with_defaults(now_ms: u64) -> Self {
        Self::new(INACTIVITY_TIMEOUT_MS, now_ms)
    }

    #[inline]
    pub fn state(&self) -> PowerState {
        self.state
    }

    #[inline]
    pub fn last_activity_ms(&self) -> u64 {
        self.last_activity_ms
    }

    /// Button activity: restart the timer and return to `Active`.
    pub fn record_activity(&mut self, now_ms: u64) {
        self.last_activity_ms = now_ms;
        if self.state == PowerState::InactivityPending {
            self.state = PowerState::Active;
        }
    }

    /// Check the inactivity timer.
    pub fn poll(&mut self, now_ms: u64) -> PowerState {
        if self.state == PowerState::Active
            && now_ms.saturating_sub(self.last_activity_ms) >= self.inactivity_timeout_ms
        {
            info!(
                "no button activity for {} ms, preparing to sleep",
                self.inactivity_timeout_ms
            );
            self.state = PowerState::InactivityPending;
        }
        self.state
    }

    /// Arm "any button low" wake on all six lines and suspend.
    ///
    /// If arming fails the remote stays `Active` with a fresh timer: sleeping
    /// without a wake path would brick it until the battery is pulled.
    pub fn enter_deep_sleep<S: SleepControl>(
        &mut self,
        sleep: &mut S,
        now_ms: u64,
    ) -> Result<(), SleepError> {
        if self.state != PowerState::InactivityPending {
            return Err(SleepError::NotPending);
        }

        if let Err(e) = sleep.configure_wake_sources(ButtonMask::ALL, WakeTrigger::AnyLow) {
            error!("wake source configuration failed ({:?}), staying awake", e);
            self.state = PowerState::Active;
            self.last_activity_ms = now_ms;
            return Err(SleepError::WakeConfig);
        }

        info!("entering deep sleep");
        self.state = PowerState::DeepSleep;
        sleep.suspend();
        Ok(())
    }
}

/// Log the boot reason. Purely informational.
pub fn report_wake(cause: WakeCause) {
    match cause {
        WakeCause::ExternalPin(lines) => {
            info!("woken by button press");
            for line in lines.pressed() {
                info!("  wake line: button {}", line + 1);
            }
        }
        WakeCause::Timer => info!("woken by timer"),
        WakeCause::PowerOn => info!("power-on reset"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SENDER_BUTTON_GPIOS;

    #[test]
    fn test_ext1_status_to_lines() {
        // GPIO 4 and 7 -> buttons 3 and 6
        let status = (1u64 << 4) | (1u64 << 7) | (1u64 << 20);
        let cause = WakeCause::from_ext1_status(status, &SENDER_BUTTON_GPIOS);
        assert_eq!(cause, WakeCause::ExternalPin(ButtonMask::from_bits(0b0010_0100)));
    }

    #[test]
    fn test_activity_cancels_pending() {
        let mut power = SenderPowerController::new(1_000, 0);
        assert_eq!(power.poll(1_000), PowerState::InactivityPending);
        power.record_activity(1_010);
        assert_eq!(power.state(), PowerState::Active);
        assert_eq!(power.poll(1_500), PowerState::Active);
    }
}
