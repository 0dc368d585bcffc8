//! AwningLink relay board (receiver) firmware.
//!
//! Six relay lines driving three awning motors. The radio callback only
//! screens frames into a mailbox; the loop below owns every output.

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use anyhow::anyhow;
    use awning_link::config::{
        ReceiverConfig, DIAGNOSTICS_INTERVAL_MS, RECEIVER_LOOP_PERIOD_MS, RECEIVER_OUTPUT_GPIOS,
    };
    use awning_link::platform::{attach_receiver, now_ms, relay_lines, start_radio};
    use awning_link::{FaultLog, Mailbox, ReceiverNode};
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use log::info;

    static MAILBOX: Mailbox = Mailbox::new();
    static FAULTS: FaultLog = FaultLog::new();

    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("=== {} (receiver) ===", env!("VERSION_STRING"));

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let config = ReceiverConfig::default();

    // Outputs first: the relays must be off before the radio can deliver anything.
    let lines = relay_lines(&RECEIVER_OUTPUT_GPIOS)?;
    let mut node = ReceiverNode::new(&config, lines, now_ms())
        .map_err(|e| anyhow!("invalid motor pair table: {}", e))?;

    let (_wifi, espnow) = start_radio(peripherals.modem, sysloop, nvs)?;
    attach_receiver(&espnow, *node.validator(), &MAILBOX, &FAULTS)?;
    info!("receiver ready");

    let mut reported = FAULTS.snapshot();
    let mut last_summary = now_ms();

    loop {
        let now = now_ms();
        node.service(&MAILBOX, &FAULTS, now);

        let faults = FAULTS.snapshot();
        if faults != reported {
            faults.log_changes(&reported);
            reported = faults;
        }
        if now.saturating_sub(last_summary) >= DIAGNOSTICS_INTERVAL_MS {
            faults.log_summary();
            info!(
                "link silent for {} ms, {} timeouts since boot",
                node.health().silence_ms(now),
                node.watchdog().trips()
            );
            last_summary = now;
        }

        FreeRtos::delay_ms(RECEIVER_LOOP_PERIOD_MS);
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!("awning-receiver only runs on ESP-IDF targets; use `cargo test` on the host");
    std::process::exit(1);
}
