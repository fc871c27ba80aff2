//! System configuration and hardware constants
//!
//! This module defines compile-time constants for the launchpad controller
//! board. Wire-protocol framing, interlock timing, and pin assignments are
//! centralized here.

/// Serial console baud rate
pub const BAUDRATE: u32 = 115_200;

/// Greeting banner printed on the serial link at startup
pub const GREETING: &str = "LAUNCHPADSTATION";

/// LoRa carrier frequency (433 MHz ISM band)
pub const RADIO_FREQ_HZ: u32 = 433_000_000;

/// LoRa transmit power in dBm (PA_BOOST path, 5..=23)
pub const RADIO_TX_POWER_DBM: i8 = 5;

/// Bounded wait applied to each radio poll, in milliseconds
pub const RADIO_POLL_TIMEOUT_MS: u64 = 100;

/// Start-of-frame marker for serial command frames ('&')
pub const START_BYTE: u8 = 0x26;

/// Source ID byte for frames addressed to the controller ('c')
pub const SOURCE_ID_CONTROLLER: u8 = 0x63;

/// Source ID byte for frames addressed through the gateway ('g')
pub const SOURCE_ID_GATEWAY: u8 = 0x67;

/// Number of payload bytes in a command frame (opcode + argument)
pub const DATA_LEN: usize = 2;

/// Total serial command frame length: start byte, ID byte, payload
pub const FRAME_LEN: usize = 2 + DATA_LEN;

/// Capacity of the serial decode queue in bytes
pub const DECODE_QUEUE_LEN: usize = 64;

/// Maximum radio payload accepted from the modem
pub const RADIO_MAX_PAYLOAD: usize = 64;

/// Number of consecutive exit-safe commands required to leave safe mode
pub const SAFE_EXIT_THRESHOLD: u8 = 3;

/// Duration of the calibration ombilical pulse in milliseconds
pub const CALIBRATION_PULSE_MS: u32 = 100;

/// Watchdog duration after which an active auxiliary output is forced off
pub const AUX_AUTO_OFF_MS: u64 = 10_000;

/// Number of general-purpose auxiliary outputs on the board
pub const NUM_AUX_OUTPUTS: usize = 4;

/// Number of servo channels on the board
pub const NUM_SERVOS: usize = 3;

/// Highest servo deflection accepted, in degrees
pub const SERVO_MAX_ANGLE: u8 = 180;

/// Servo pulse width at 0 degrees, in microseconds
pub const SERVO_MIN_PULSE_US: u16 = 544;

/// Servo pulse width at 180 degrees, in microseconds
pub const SERVO_MAX_PULSE_US: u16 = 2_400;

/// Number of battery voltage inputs sampled for telemetry
pub const MAX_BATTERY_INPUTS: usize = 2;

/// Battery voltage divider ratio on the BAT inputs
pub const BATTERY_DIVIDER_RATIO: f32 = 4.0;

/// ADC reference voltage
pub const ADC_VREF: f32 = 3.3;

/// Telemetry line terminator (carriage return, line feed)
pub const TERMINATOR: [u8; 2] = [0x0D, 0x0A];

/// Maximum encoded telemetry frame length:
/// status byte, two RSSI bytes, two bytes per battery input, terminator
pub const TELEMETRY_MAX_LEN: usize = 1 + 2 + 2 * MAX_BATTERY_INPUTS + 2;

/// Control loop period in milliseconds
pub const TICK_PERIOD_MS: u64 = 10;

/// Immutable radio bring-up parameters, applied once at startup.
///
/// The core never re-reads or mutates this after initialization.
#[derive(Clone, Copy, Debug)]
pub struct RadioConfig {
    /// Carrier frequency in Hz
    pub frequency_hz: u32,
    /// TX output power in dBm (PA_BOOST path)
    pub tx_power_dbm: i8,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            frequency_hz: RADIO_FREQ_HZ,
            tx_power_dbm: RADIO_TX_POWER_DBM,
        }
    }
}

/// Pin assignments for GPIO
pub mod pins {
    //! GPIO pin assignments matching the schematic

    /// Status LED (lit while the radio link is down)
    pub const LED_STATUS: &str = "PC6";

    /// Serial console TX
    pub const UART_TX: &str = "PA2";

    /// Serial console RX
    pub const UART_RX: &str = "PA3";

    /// LoRa transceiver SPI SCK
    pub const RFM_SCK: &str = "PA5";

    /// LoRa transceiver SPI MISO
    pub const RFM_MISO: &str = "PA6";

    /// LoRa transceiver SPI MOSI
    pub const RFM_MOSI: &str = "PA7";

    /// LoRa transceiver chip select (active low)
    pub const RFM_NSS: &str = "PA4";

    /// LoRa transceiver hardware reset
    pub const RFM_RESET: &str = "PB0";

    /// LoRa transceiver DIO0 interrupt line
    pub const RFM_DIO0: &str = "PB1";

    /// Fill solenoid relay (drive low to open)
    pub const RELAY_FILL: &str = "PC0";

    /// Vent solenoid relay (drive low to open)
    pub const RELAY_VENT: &str = "PC1";

    /// Ignition relay (drive low to energize)
    pub const RELAY_FIRE: &str = "PC2";

    /// Telemetry ombilical to the rocket (high while transmitters enabled)
    pub const OMBI_TM: &str = "PC3";

    /// Calibration ombilical to the rocket (pulse low to trigger)
    pub const OMBI_CA: &str = "PC4";

    /// Auxiliary output 1
    pub const AUX_OUTPUT1: &str = "PB10";

    /// Auxiliary output 2
    pub const AUX_OUTPUT2: &str = "PB11";

    /// Auxiliary output 3
    pub const AUX_OUTPUT3: &str = "PB12";

    /// Auxiliary output 4
    pub const AUX_OUTPUT4: &str = "PB13";

    /// Battery 1 voltage sense (ADC)
    pub const BAT1_SENSE: &str = "PA0";

    /// Battery 2 voltage sense (ADC)
    pub const BAT2_SENSE: &str = "PA1";
}
