//! Battery divider on an ADC1 pin plus the USB-present input.

use esp_idf_svc::hal::adc::attenuation::DB_11;
use esp_idf_svc::hal::adc::oneshot::config::AdcChannelConfig;
use esp_idf_svc::hal::adc::oneshot::{AdcChannelDriver, AdcDriver};
use esp_idf_svc::hal::adc::ADCPin;
use esp_idf_svc::hal::gpio::{AnyIOPin, Input, PinDriver};
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::sys::EspError;

use crate::battery::volts_from_raw;
use crate::hal::BatterySensor;

/// Oneshot ADC battery sensor.
pub struct AdcBattery<T: ADCPin + 'static> {
    channel: AdcChannelDriver<'static, T, AdcDriver<'static, T::Adc>>,
    usb: PinDriver<'static, AnyIOPin, Input>,
}

impl<T: ADCPin + 'static> AdcBattery<T> {
    pub fn new(
        adc: impl Peripheral<P = T::Adc> + 'static,
        pin: impl Peripheral<P = T> + 'static,
        usb_gpio: u8,
    ) -> Result<Self, EspError> {
        let config = AdcChannelConfig {
            attenuation: DB_11,
            ..Default::default()
        };
        let channel = AdcChannelDriver::new(AdcDriver::new(adc)?, pin, &config)?;
        // SAFETY: the USB detect GPIO is claimed once, at boot.
        let usb = PinDriver::input(unsafe { AnyIOPin::new(usb_gpio as i32) })?;
        Ok(Self { channel, usb })
    }
}

impl<T: ADCPin + 'static> BatterySensor for AdcBattery<T> {
    type Error = EspError;

    fn read_voltage(&mut self) -> Result<f32, EspError> {
        Ok(volts_from_raw(self.channel.read_raw()?))
    }

    fn usb_powered(&mut self) -> bool {
        self.usb.is_high()
    }
}
