//! RFM95 LoRa Transceiver Driver
//!
//! Drives the RFM95/96/97/98 module over SPI with manual chip-select,
//! the way the RadioHead firmware on the previous board revision did.
//! The radio is kept in continuous receive mode between operations;
//! transmitting drops to standby, pushes the FIFO, and returns to RX.
//!
//! DIO0 must be wired to an edge-capable GPIO: the driver waits on a
//! rising edge for both RX-done and TX-done. The control loop bounds
//! every wait with a timeout at the call site.

use embassy_time::{Duration, Timer};
use embedded_hal::digital::OutputPin;
use embedded_hal_async::digital::Wait;
use embedded_hal_async::spi::SpiBus;

use crate::config::{RadioConfig, RADIO_MAX_PAYLOAD};

/// RFM95 register addresses (LoRa mode)
mod reg {
    pub const FIFO: u8 = 0x00;
    pub const OP_MODE: u8 = 0x01;
    pub const FR_MSB: u8 = 0x06;
    pub const FR_MID: u8 = 0x07;
    pub const FR_LSB: u8 = 0x08;
    pub const PA_CONFIG: u8 = 0x09;
    pub const LNA: u8 = 0x0C;
    pub const FIFO_ADDR_PTR: u8 = 0x0D;
    pub const FIFO_TX_BASE_ADDR: u8 = 0x0E;
    pub const FIFO_RX_BASE_ADDR: u8 = 0x0F;
    pub const FIFO_RX_CURRENT_ADDR: u8 = 0x10;
    pub const IRQ_FLAGS: u8 = 0x12;
    pub const RX_NB_BYTES: u8 = 0x13;
    pub const PKT_RSSI_VALUE: u8 = 0x1A;
    pub const MODEM_CONFIG1: u8 = 0x1D;
    pub const MODEM_CONFIG2: u8 = 0x1E;
    pub const MODEM_CONFIG3: u8 = 0x26;
    pub const PAYLOAD_LENGTH: u8 = 0x22;
    pub const MAX_PAYLOAD_LENGTH: u8 = 0x23;
    pub const SYNC_WORD: u8 = 0x39;
    pub const DIO_MAPPING1: u8 = 0x40;
    pub const VERSION: u8 = 0x42;
    pub const PA_DAC: u8 = 0x4D;
}

// IRQ flag bits
const IRQ_RX_DONE: u8 = 0x40;
const IRQ_TX_DONE: u8 = 0x08;
const IRQ_PAYLOAD_CRC_ERROR: u8 = 0x20;

// OpMode register values
const MODE_SLEEP: u8 = 0x00;
const MODE_STDBY: u8 = 0x01;
const MODE_TX: u8 = 0x03;
const MODE_RX_CONTINUOUS: u8 = 0x05;
const MODE_LONG_RANGE: u8 = 0x80;

// PA_CONFIG: PA_BOOST output pin (the only one wired on RFM95)
const PA_BOOST: u8 = 0x80;

// Sync word for a private network
const LORA_SYNC_WORD: u8 = 0x12;

// Expected VERSION register value for RFM95/96/97/98
const RFM95_VERSION: u8 = 0x12;

// Crystal oscillator frequency used for carrier calculation
const FXOSC: u64 = 32_000_000;

// RSSI offset for the low-frequency port (433 MHz band)
const RSSI_OFFSET_LF: i16 = -164;

// Modem settings: Bw 125 kHz, Cr 4/5, explicit header, SF7, CRC on.
// These match the RadioHead defaults the operator consoles expect.
const MODEM_CONFIG1_VALUE: u8 = 0x72;
const MODEM_CONFIG2_VALUE: u8 = 0x74;
const MODEM_CONFIG3_VALUE: u8 = 0x04;

/// Radio driver error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// SPI transaction failed
    Spi,
    /// VERSION register returned an unexpected value, check wiring
    InvalidVersion(u8),
    /// Hardware CRC error on a received packet
    Crc,
    /// Payload does not fit the FIFO window
    PayloadTooLarge,
}

impl defmt::Format for RadioError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Spi => defmt::write!(f, "SPI error"),
            Self::InvalidVersion(v) => defmt::write!(f, "bad version {:#04x}", v),
            Self::Crc => defmt::write!(f, "CRC error"),
            Self::PayloadTooLarge => defmt::write!(f, "payload too large"),
        }
    }
}

/// RFM95 LoRa driver
///
/// Generic over the SPI bus, chip select, reset, and DIO0 pins so the
/// board support layer owns the concrete peripheral types.
pub struct Rfm95<SPI, CS, RST, DIO0> {
    spi: SPI,
    cs: CS,
    reset: RST,
    dio0: DIO0,
    last_rssi: i16,
}

impl<SPI, CS, RST, DIO0> Rfm95<SPI, CS, RST, DIO0>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    RST: OutputPin,
    DIO0: Wait,
{
    /// Initialize the radio
    ///
    /// Performs a hardware reset, verifies the chip version, applies the
    /// startup configuration, and leaves the radio listening in
    /// continuous receive mode.
    ///
    /// # Errors
    /// [`RadioError::InvalidVersion`] usually means a wiring or power
    /// problem; the caller latches it as a permanent serial-only session.
    pub async fn new(
        spi: SPI,
        cs: CS,
        reset: RST,
        dio0: DIO0,
        config: RadioConfig,
    ) -> Result<Self, RadioError> {
        let mut radio = Self {
            spi,
            cs,
            reset,
            dio0,
            last_rssi: 0,
        };

        // Hardware reset: pull low for 10ms, release, wait for boot
        radio.reset.set_low().ok();
        Timer::after(Duration::from_millis(10)).await;
        radio.reset.set_high().ok();
        Timer::after(Duration::from_millis(100)).await;

        let version = radio.read_reg(reg::VERSION).await?;
        if version != RFM95_VERSION {
            return Err(RadioError::InvalidVersion(version));
        }

        // LoRa mode can only be selected from sleep
        radio.write_reg(reg::OP_MODE, MODE_SLEEP).await?;
        Timer::after(Duration::from_millis(10)).await;
        radio.write_reg(reg::OP_MODE, MODE_SLEEP | MODE_LONG_RANGE).await?;
        Timer::after(Duration::from_millis(10)).await;

        // Whole FIFO for each direction, one direction at a time
        radio.write_reg(reg::FIFO_TX_BASE_ADDR, 0x00).await?;
        radio.write_reg(reg::FIFO_RX_BASE_ADDR, 0x00).await?;

        // LNA: max gain, boost on
        radio.write_reg(reg::LNA, 0x23).await?;

        radio.write_reg(reg::MODEM_CONFIG1, MODEM_CONFIG1_VALUE).await?;
        radio.write_reg(reg::MODEM_CONFIG2, MODEM_CONFIG2_VALUE).await?;
        radio.write_reg(reg::MODEM_CONFIG3, MODEM_CONFIG3_VALUE).await?;
        radio.write_reg(reg::SYNC_WORD, LORA_SYNC_WORD).await?;
        radio
            .write_reg(reg::MAX_PAYLOAD_LENGTH, RADIO_MAX_PAYLOAD as u8)
            .await?;

        radio.set_frequency(config.frequency_hz).await?;
        radio.set_tx_power(config.tx_power_dbm).await?;

        radio.write_reg(reg::OP_MODE, MODE_LONG_RANGE | MODE_STDBY).await?;
        radio.enter_rx().await?;

        Ok(radio)
    }

    /// Await one received packet, copying it into `buf`
    ///
    /// The radio stays in continuous RX mode; the caller bounds the wait
    /// with a timeout. Packets failing the hardware CRC are dropped.
    pub async fn receive(&mut self, buf: &mut [u8]) -> Result<usize, RadioError> {
        self.dio0
            .wait_for_rising_edge()
            .await
            .map_err(|_| RadioError::Spi)?;

        let irq = self.read_reg(reg::IRQ_FLAGS).await?;
        if irq & IRQ_PAYLOAD_CRC_ERROR != 0 || irq & IRQ_RX_DONE == 0 {
            self.write_reg(reg::IRQ_FLAGS, 0xFF).await?;
            return Err(RadioError::Crc);
        }

        let raw_rssi = self.read_reg(reg::PKT_RSSI_VALUE).await?;
        self.last_rssi = RSSI_OFFSET_LF + i16::from(raw_rssi);

        let len = usize::from(self.read_reg(reg::RX_NB_BYTES).await?);
        let fifo_addr = self.read_reg(reg::FIFO_RX_CURRENT_ADDR).await?;
        let len = len.min(buf.len());

        self.write_reg(reg::FIFO_ADDR_PTR, fifo_addr).await?;
        self.read_fifo(&mut buf[..len]).await?;
        self.write_reg(reg::IRQ_FLAGS, 0xFF).await?;

        Ok(len)
    }

    /// Transmit a payload and wait (bounded by LoRa airtime) for TX-done
    ///
    /// Returns the radio to continuous receive afterwards.
    pub async fn transmit(&mut self, payload: &[u8]) -> Result<(), RadioError> {
        if payload.len() > RADIO_MAX_PAYLOAD {
            return Err(RadioError::PayloadTooLarge);
        }

        // Standby before touching the FIFO
        self.write_reg(reg::OP_MODE, MODE_LONG_RANGE | MODE_STDBY).await?;
        self.write_reg(reg::FIFO_ADDR_PTR, 0x00).await?;
        self.write_reg(reg::PAYLOAD_LENGTH, payload.len() as u8).await?;
        self.write_fifo(payload).await?;

        // DIO0 → TxDone (bits [7:6] = 01)
        self.write_reg(reg::DIO_MAPPING1, 0x40).await?;
        self.write_reg(reg::IRQ_FLAGS, 0xFF).await?;
        self.write_reg(reg::OP_MODE, MODE_LONG_RANGE | MODE_TX).await?;

        self.dio0
            .wait_for_rising_edge()
            .await
            .map_err(|_| RadioError::Spi)?;
        self.write_reg(reg::IRQ_FLAGS, IRQ_TX_DONE).await?;

        self.enter_rx().await
    }

    /// RSSI of the most recently received packet, in dBm
    #[must_use]
    pub const fn last_rssi(&self) -> i16 {
        self.last_rssi
    }

    /// Enter continuous receive mode with DIO0 mapped to RxDone
    async fn enter_rx(&mut self) -> Result<(), RadioError> {
        self.write_reg(reg::DIO_MAPPING1, 0x00).await?;
        self.write_reg(reg::IRQ_FLAGS, 0xFF).await?;
        self.write_reg(reg::FIFO_ADDR_PTR, 0x00).await?;
        self.write_reg(reg::OP_MODE, MODE_LONG_RANGE | MODE_RX_CONTINUOUS)
            .await
    }

    /// Program the carrier frequency: frf = freq * 2^19 / FXOSC
    async fn set_frequency(&mut self, frequency_hz: u32) -> Result<(), RadioError> {
        let frf = (u64::from(frequency_hz) << 19) / FXOSC;
        self.write_reg(reg::FR_MSB, (frf >> 16) as u8).await?;
        self.write_reg(reg::FR_MID, (frf >> 8) as u8).await?;
        self.write_reg(reg::FR_LSB, frf as u8).await
    }

    /// Program TX power on the PA_BOOST path
    ///
    /// Pout = 2 + OutputPower dBm; 20 dBm additionally needs the PA_DAC
    /// boost register.
    async fn set_tx_power(&mut self, dbm: i8) -> Result<(), RadioError> {
        let (pa_config, pa_dac) = match dbm {
            p if p >= 20 => (PA_BOOST | 0x0F, 0x87u8),
            p if p >= 2 => (PA_BOOST | ((p - 2) as u8 & 0x0F), 0x84u8),
            _ => (PA_BOOST, 0x84u8),
        };
        self.write_reg(reg::PA_CONFIG, pa_config).await?;
        self.write_reg(reg::PA_DAC, pa_dac).await
    }

    /// Write a single register (address bit 7 set)
    async fn write_reg(&mut self, register: u8, value: u8) -> Result<(), RadioError> {
        let buf = [register | 0x80, value];
        self.cs.set_low().ok();
        let result = self.spi.write(&buf).await;
        self.cs.set_high().ok();
        result.map_err(|_| RadioError::Spi)
    }

    /// Read a single register (address bit 7 clear)
    async fn read_reg(&mut self, register: u8) -> Result<u8, RadioError> {
        let mut buf = [register & 0x7F, 0x00];
        self.cs.set_low().ok();
        let result = self.spi.transfer_in_place(&mut buf).await;
        self.cs.set_high().ok();
        result.map_err(|_| RadioError::Spi)?;
        Ok(buf[1])
    }

    /// Burst-write bytes into the FIFO register
    async fn write_fifo(&mut self, data: &[u8]) -> Result<(), RadioError> {
        let mut buf = [0u8; RADIO_MAX_PAYLOAD + 1];
        buf[0] = reg::FIFO | 0x80;
        buf[1..=data.len()].copy_from_slice(data);
        self.cs.set_low().ok();
        let result = self.spi.write(&buf[..=data.len()]).await;
        self.cs.set_high().ok();
        result.map_err(|_| RadioError::Spi)
    }

    /// Burst-read bytes from the FIFO register
    async fn read_fifo(&mut self, data: &mut [u8]) -> Result<(), RadioError> {
        let mut buf = [0u8; RADIO_MAX_PAYLOAD + 1];
        buf[0] = reg::FIFO & 0x7F;
        let len = data.len();
        self.cs.set_low().ok();
        let result = self.spi.transfer_in_place(&mut buf[..=len]).await;
        self.cs.set_high().ok();
        result.map_err(|_| RadioError::Spi)?;
        data.copy_from_slice(&buf[1..=len]);
        Ok(())
    }
}
