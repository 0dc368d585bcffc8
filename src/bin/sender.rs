//! AwningLink remote (sender) firmware.
//!
//! Battery-powered ESP32-S3 with six buttons and an RGB status LED. Every
//! wake from deep sleep is a fresh boot through `main`.

#[cfg(all(target_os = "espidf", not(esp32)))]
fn main() -> anyhow::Result<()> {
    use std::time::Duration;

    use awning_link::config::{
        SenderConfig, LED_BLUE_GPIO, LED_GREEN_GPIO, LED_RED_GPIO, SENDER_BUTTON_GPIOS,
        SENDER_LOOP_PERIOD_MS, USB_DETECT_GPIO,
    };
    use awning_link::hal::StatusIndicator;
    use awning_link::link::SendOutcomeSlot;
    use awning_link::platform::{
        button_lines, start_radio, AdcBattery, DeepSleep, EspClock, EspNowTransport, RemoteBoard,
        StatusLed,
    };
    use awning_link::{SenderNode, StatusPattern};
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use log::{error, info};

    static SEND_OUTCOMES: SendOutcomeSlot = SendOutcomeSlot::new();

    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("=== {} (sender) ===", env!("VERSION_STRING"));

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let config = SenderConfig::default();

    let mut led = StatusLed::start(LED_RED_GPIO, LED_GREEN_GPIO, LED_BLUE_GPIO)?;
    let buttons = button_lines(&SENDER_BUTTON_GPIOS)?;
    let battery = AdcBattery::new(peripherals.adc1, peripherals.pins.gpio3, USB_DETECT_GPIO)?;

    // Without a radio the remote still runs into its sleep timeout.
    let radio = start_radio(peripherals.modem, sysloop, nvs).and_then(|(wifi, espnow)| {
        EspNowTransport::new(espnow, config.receiver, &SEND_OUTCOMES).map(|t| (wifi, t))
    });
    let (_wifi, transport) = match radio {
        Ok((wifi, transport)) => (Some(wifi), Some(transport)),
        Err(e) => {
            error!("ESP-NOW bring-up failed: {:?}, every send will be refused", e);
            led.display(StatusPattern::SendError);
            led.flush(Duration::from_secs(1));
            (None, None)
        }
    };

    let mut board = RemoteBoard {
        buttons,
        transport,
        led,
        sleep: DeepSleep::new(SENDER_BUTTON_GPIOS),
        battery,
        clock: EspClock,
    };

    let mut node = SenderNode::boot(&config, &mut board);
    info!("remote ready");

    loop {
        node.run_cycle(&mut board);
        FreeRtos::delay_ms(SENDER_LOOP_PERIOD_MS);
    }
}

#[cfg(not(all(target_os = "espidf", not(esp32))))]
fn main() {
    eprintln!("awning-sender needs an ESP-IDF target with ext1 any-low wake (not the classic ESP32); use `cargo test` on the host");
    std::process::exit(1);
}
