//! Common-anode RGB status LED played by a worker thread.
//!
//! The main loop never waits on a pattern: [`StatusLed::display`] queues it
//! with `try_send` and drops it if the queue is full.

use std::sync::mpsc::{sync_channel, RecvTimeoutError, SyncSender, TrySendError};
use std::thread;
use std::time::Duration;

use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::{AnyOutputPin, Output, PinDriver};
use log::{debug, warn};

use crate::hal::StatusIndicator;
use crate::status::{Rgb, StatusPattern};

const QUEUE_DEPTH: usize = 4;
const WORKER_STACK: usize = 4096;

enum Command {
    Show(StatusPattern),
    Flush(SyncSender<()>),
}

struct Channels {
    red: PinDriver<'static, AnyOutputPin, Output>,
    green: PinDriver<'static, AnyOutputPin, Output>,
    blue: PinDriver<'static, AnyOutputPin, Output>,
}

impl Channels {
    /// Common anode: a channel is lit when its pin is low.
    fn set(&mut self, color: Rgb) {
        for (pin, on) in [
            (&mut self.red, color.red),
            (&mut self.green, color.green),
            (&mut self.blue, color.blue),
        ] {
            let result = if on { pin.set_low() } else { pin.set_high() };
            if let Err(e) = result {
                warn!("status LED write failed: {:?}", e);
            }
        }
    }

    fn play(&mut self, pattern: StatusPattern) {
        for step in pattern.steps() {
            self.set(step.color);
            if step.hold_ms > 0 {
                FreeRtos::delay_ms(step.hold_ms);
            }
        }
    }
}

/// Handle to the LED worker.
pub struct StatusLed {
    queue: SyncSender<Command>,
}

impl StatusLed {
    /// Claim the three LED pins and start the worker.
    pub fn start(red: u8, green: u8, blue: u8) -> anyhow::Result<Self> {
        // SAFETY: the LED GPIO numbers are claimed once, at boot.
        let mut channels = unsafe {
            Channels {
                red: PinDriver::output(AnyOutputPin::new(red as i32))?,
                green: PinDriver::output(AnyOutputPin::new(green as i32))?,
                blue: PinDriver::output(AnyOutputPin::new(blue as i32))?,
            }
        };
        channels.set(Rgb::OFF);

        let (queue, commands) = sync_channel::<Command>(QUEUE_DEPTH);
        thread::Builder::new()
            .name("status-led".into())
            .stack_size(WORKER_STACK)
            .spawn(move || {
                for command in commands {
                    match command {
                        Command::Show(pattern) => channels.play(pattern),
                        Command::Flush(done) => {
                            channels.set(Rgb::OFF);
                            let _ = done.send(());
                        }
                    }
                }
            })?;

        Ok(Self { queue })
    }

    /// Wait until every queued pattern has played, then turn the LED off.
    pub fn flush(&self, timeout: Duration) {
        let (done, finished) = sync_channel(1);
        if self.queue.send(Command::Flush(done)).is_err() {
            return;
        }
        if let Err(RecvTimeoutError::Timeout) = finished.recv_timeout(timeout) {
            warn!("status LED did not drain within {:?}", timeout);
        }
    }
}

impl StatusIndicator for StatusLed {
    fn display(&mut self, pattern: StatusPattern) {
        match self.queue.try_send(Command::Show(pattern)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => debug!("LED busy, {:?} dropped", pattern),
            Err(TrySendError::Disconnected(_)) => warn!("LED worker gone"),
        }
    }
}
