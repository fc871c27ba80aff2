//! Transport trait implementations
//!
//! Bridges the async RFM95 driver and UART onto the core's synchronous,
//! bounded-wait transport traits. The control loop services one
//! transport at a time, so blocking here (with an upper bound) is the
//! intended behavior, not a hazard.

use embassy_futures::block_on;
use embassy_stm32::mode::Async;
use embassy_stm32::usart::UartTx;
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::channel::{Channel, Receiver};
use embassy_time::{with_timeout, Duration};
use embedded_hal::digital::OutputPin;
use embedded_hal_async::digital::Wait;
use embedded_hal_async::spi::SpiBus;

use crate::comms::{RadioLink, RadioPayload, SerialLink};
use crate::config::RADIO_MAX_PAYLOAD;
use crate::drivers::rfm95::Rfm95;

/// Queue depth between the UART receive task and the arbiter
pub const SERIAL_QUEUE_LEN: usize = 64;

/// Byte queue fed by the UART receive task
pub type SerialQueue = Channel<ThreadModeRawMutex, u8, SERIAL_QUEUE_LEN>;

/// Radio transport over the RFM95 driver
///
/// Holds `None` when the modem failed to initialize; the failure is
/// permanent for the session and every poll falls through to serial.
pub struct RadioPort<SPI, CS, RST, DIO0> {
    radio: Option<Rfm95<SPI, CS, RST, DIO0>>,
}

impl<SPI, CS, RST, DIO0> RadioPort<SPI, CS, RST, DIO0> {
    /// Wrap a successfully initialized radio
    #[must_use]
    pub const fn ready(radio: Rfm95<SPI, CS, RST, DIO0>) -> Self {
        Self { radio: Some(radio) }
    }

    /// Placeholder for a modem that failed bring-up
    #[must_use]
    pub const fn offline() -> Self {
        Self { radio: None }
    }
}

impl<SPI, CS, RST, DIO0> RadioLink for RadioPort<SPI, CS, RST, DIO0>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    RST: OutputPin,
    DIO0: Wait,
{
    fn is_ready(&self) -> bool {
        self.radio.is_some()
    }

    fn recv(&mut self, timeout_ms: u64) -> Option<RadioPayload> {
        let radio = self.radio.as_mut()?;
        let mut buf = [0u8; RADIO_MAX_PAYLOAD];
        match block_on(with_timeout(
            Duration::from_millis(timeout_ms),
            radio.receive(&mut buf),
        )) {
            Ok(Ok(len)) => RadioPayload::from_slice(&buf[..len]).ok(),
            // Timeout or a CRC-failed packet: nothing this tick
            Ok(Err(_)) | Err(_) => None,
        }
    }

    fn send(&mut self, payload: &[u8]) {
        if let Some(radio) = self.radio.as_mut() {
            let _ = block_on(radio.transmit(payload));
        }
    }

    fn last_rssi(&self) -> i16 {
        self.radio.as_ref().map_or(0, Rfm95::last_rssi)
    }
}

/// Serial transport over the console UART
pub struct SerialPort {
    rx: Receiver<'static, ThreadModeRawMutex, u8, SERIAL_QUEUE_LEN>,
    tx: UartTx<'static, Async>,
}

impl SerialPort {
    /// Wrap the receive queue and the transmit half of the UART
    #[must_use]
    pub const fn new(
        rx: Receiver<'static, ThreadModeRawMutex, u8, SERIAL_QUEUE_LEN>,
        tx: UartTx<'static, Async>,
    ) -> Self {
        Self { rx, tx }
    }
}

impl SerialLink for SerialPort {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let mut count = 0;
        while count < buf.len() {
            match self.rx.try_receive() {
                Ok(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                Err(_) => break,
            }
        }
        count
    }

    fn send(&mut self, payload: &[u8]) {
        let _ = block_on(self.tx.write(payload));
    }
}
