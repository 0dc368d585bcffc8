//! ESP-NOW bring-up and the [`Transport`] implementation.
//!
//! ESP-NOW needs the WiFi driver started in station mode; no association
//! takes place. Callbacks registered here run on the WiFi task and only
//! touch the static handoff slots.

use esp_idf_svc::espnow::{EspNow, PeerInfo, ReceiveInfo, SendStatus};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::modem::Modem;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys::{esp, esp_wifi_get_mac, wifi_interface_t_WIFI_IF_STA, EspError};
use esp_idf_svc::wifi::{ClientConfiguration, Configuration, EspWifi};
use log::info;

use crate::fault::FaultLog;
use crate::hal::Transport;
use crate::link::{Mailbox, PeerAddress, SendOutcome, SendOutcomeSlot};
use crate::receiver::{on_receive, ReceiveValidator};

/// Start WiFi in station mode and initialise ESP-NOW.
///
/// The returned WiFi driver must stay alive for as long as ESP-NOW is used.
pub fn start_radio(
    modem: Modem,
    sysloop: EspSystemEventLoop,
    nvs: EspDefaultNvsPartition,
) -> Result<(EspWifi<'static>, EspNow<'static>), EspError> {
    let mut wifi = EspWifi::new(modem, sysloop, Some(nvs))?;
    wifi.set_configuration(&Configuration::Client(ClientConfiguration::default()))?;
    wifi.start()?;

    let espnow = EspNow::take()?;
    info!("ESP-NOW initialized, station MAC {}", local_mac()?);
    Ok((wifi, espnow))
}

/// Station MAC of this node (what the peer has to be configured with).
pub fn local_mac() -> Result<PeerAddress, EspError> {
    let mut mac = [0u8; 6];
    // SAFETY: `mac` is a valid 6-byte buffer; WiFi is initialised by the caller.
    esp!(unsafe { esp_wifi_get_mac(wifi_interface_t_WIFI_IF_STA, mac.as_mut_ptr()) })?;
    Ok(PeerAddress::new(mac))
}

/// Sender-side transport: unicast to one registered peer.
pub struct EspNowTransport {
    espnow: EspNow<'static>,
    outcomes: &'static SendOutcomeSlot,
}

impl EspNowTransport {
    /// Register `peer` and route delivery callbacks into `outcomes`.
    pub fn new(
        espnow: EspNow<'static>,
        peer: PeerAddress,
        outcomes: &'static SendOutcomeSlot,
    ) -> Result<Self, EspError> {
        espnow.add_peer(PeerInfo {
            peer_addr: peer.octets(),
            channel: 0,
            encrypt: false,
            ..Default::default()
        })?;

        espnow.register_send_cb(move |_mac: &[u8], status: SendStatus| {
            outcomes.post(match status {
                SendStatus::SUCCESS => SendOutcome::Delivered,
                _ => SendOutcome::Failed,
            });
        })?;

        info!("peer {} registered", peer);
        Ok(Self { espnow, outcomes })
    }
}

impl Transport for EspNowTransport {
    type Error = EspError;

    fn send(&mut self, peer: &PeerAddress, payload: &[u8]) -> Result<(), EspError> {
        self.espnow.send(peer.octets(), payload)
    }

    fn poll_outcome(&mut self) -> Option<SendOutcome> {
        self.outcomes.take()
    }
}

/// Receiver side: screen every frame in the callback and post it to `mailbox`.
pub fn attach_receiver(
    espnow: &EspNow<'static>,
    validator: ReceiveValidator,
    mailbox: &'static Mailbox,
    faults: &'static FaultLog,
) -> Result<(), EspError> {
    info!("listening for {}", validator.paired());
    espnow.register_recv_cb(move |info: &ReceiveInfo, data: &[u8]| {
        let sender = PeerAddress::new(*info.src_addr);
        on_receive(&validator, mailbox, faults, &sender, data);
    })
}
