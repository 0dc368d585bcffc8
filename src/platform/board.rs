//! The remote as one [`SenderBoard`](crate::sender::SenderBoard).

use std::time::Duration;

use embedded_hal::delay::DelayNs;
use esp_idf_svc::hal::adc::ADCPin;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::{AnyIOPin, Input, PinDriver};
use esp_idf_svc::sys::{EspError, ESP_ERR_INVALID_STATE};

use crate::buttons::{ButtonMask, BUTTON_COUNT};
use crate::hal::{
    BatterySensor, ButtonInputs, Clock, SleepControl, StatusIndicator, Transport, WakeTrigger,
};
use crate::link::{PeerAddress, SendOutcome};
use crate::power::WakeCause;
use crate::status::StatusPattern;

use super::{AdcBattery, DeepSleep, EspClock, EspNowTransport, StatusLed};

const LED_DRAIN_TIMEOUT: Duration = Duration::from_secs(3);

/// Sender hardware bundle.
///
/// `transport` is `None` when the radio failed to come up: every send is
/// refused, but buttons, LED and the sleep timeout keep working.
pub struct RemoteBoard<T: ADCPin + 'static> {
    pub buttons: [PinDriver<'static, AnyIOPin, Input>; BUTTON_COUNT],
    pub transport: Option<EspNowTransport>,
    pub led: StatusLed,
    pub sleep: DeepSleep,
    pub battery: AdcBattery<T>,
    pub clock: EspClock,
}

impl<T: ADCPin + 'static> ButtonInputs for RemoteBoard<T> {
    fn is_asserted(&mut self, line: usize) -> bool {
        self.buttons.is_asserted(line)
    }
}

impl<T: ADCPin + 'static> DelayNs for RemoteBoard<T> {
    fn delay_ns(&mut self, ns: u32) {
        DelayNs::delay_ns(&mut FreeRtos, ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        FreeRtos::delay_ms(ms);
    }
}

impl<T: ADCPin + 'static> Transport for RemoteBoard<T> {
    type Error = EspError;

    fn send(&mut self, peer: &PeerAddress, payload: &[u8]) -> Result<(), EspError> {
        match self.transport.as_mut() {
            Some(transport) => transport.send(peer, payload),
            None => Err(EspError::from_infallible::<{ ESP_ERR_INVALID_STATE as i32 }>()),
        }
    }

    fn poll_outcome(&mut self) -> Option<SendOutcome> {
        self.transport.as_mut().and_then(|t| t.poll_outcome())
    }
}

impl<T: ADCPin + 'static> StatusIndicator for RemoteBoard<T> {
    fn display(&mut self, pattern: StatusPattern) {
        self.led.display(pattern);
    }
}

impl<T: ADCPin + 'static> SleepControl for RemoteBoard<T> {
    type Error = EspError;

    fn configure_wake_sources(
        &mut self,
        lines: ButtonMask,
        trigger: WakeTrigger,
    ) -> Result<(), EspError> {
        self.sleep.configure_wake_sources(lines, trigger)
    }

    /// Let the LED finish its last pattern before the power goes.
    fn suspend(&mut self) {
        self.led.flush(LED_DRAIN_TIMEOUT);
        self.sleep.suspend();
    }

    fn wake_cause(&self) -> WakeCause {
        self.sleep.wake_cause()
    }
}

impl<T: ADCPin + 'static> BatterySensor for RemoteBoard<T> {
    type Error = EspError;

    fn read_voltage(&mut self) -> Result<f32, EspError> {
        self.battery.read_voltage()
    }

    fn usb_powered(&mut self) -> bool {
        self.battery.usb_powered()
    }
}

impl<T: ADCPin + 'static> Clock for RemoteBoard<T> {
    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }
}
