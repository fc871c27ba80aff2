//! Launchpad Controller Main Application
//!
//! Entry point for the launchpad ground-support controller firmware.
//! Brings up the serial console, the LoRa modem, and the actuator
//! lines, then runs the synchronous control loop.

#![no_std]
#![no_main]

use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Level, Output, OutputType, Pull, Speed};
use embassy_stm32::mode::Async;
use embassy_stm32::spi::{self, Spi};
use embassy_stm32::time::Hertz;
use embassy_stm32::timer::low_level::CountingMode;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_stm32::usart::{self, Uart, UartRx};
use embassy_stm32::{bind_interrupts, peripherals};
use {defmt_rtt as _, panic_probe as _};

use launchpad_firmware::controller::Controller;
use launchpad_firmware::drivers::rfm95::Rfm95;
use launchpad_firmware::hal::battery::BatterySense;
use launchpad_firmware::hal::gpio::StatusLed;
use launchpad_firmware::hal::lines::PadLines;
use launchpad_firmware::hal::links::{RadioPort, SerialPort, SerialQueue};
use launchpad_firmware::prelude::*;

// Bind interrupt handlers
bind_interrupts!(struct Irqs {
    USART2 => usart::InterruptHandler<peripherals::USART2>;
});

static SERIAL_QUEUE: SerialQueue = SerialQueue::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Launchpad Controller Firmware v{}", env!("CARGO_PKG_VERSION"));

    let p = embassy_stm32::init(embassy_stm32::Config::default());

    // Status LED, lit while the radio link is down
    let led = Output::new(p.PC6, Level::Low, Speed::Low);
    let mut status_led = StatusLed::new(led);

    // Console UART
    let mut uart_config = usart::Config::default();
    uart_config.baudrate = BAUDRATE;
    let uart = Uart::new(
        p.USART2,
        p.PA3, // RX
        p.PA2, // TX
        Irqs,
        p.DMA1_CH1,
        p.DMA1_CH2,
        uart_config,
    )
    .unwrap();
    let (mut uart_tx, uart_rx) = uart.split();

    // Greeting banner so the console knows who answered the port
    let _ = uart_tx.write(GREETING.as_bytes()).await;
    let _ = uart_tx.write(&TERMINATOR).await;

    spawner.spawn(serial_rx_task(uart_rx)).unwrap();

    // LoRa modem on SPI1
    let mut spi_config = spi::Config::default();
    spi_config.frequency = Hertz(1_000_000);
    let radio_spi = Spi::new(
        p.SPI1,
        p.PA5, // SCK
        p.PA7, // MOSI
        p.PA6, // MISO
        p.DMA1_CH3,
        p.DMA1_CH4,
        spi_config,
    );
    let radio_cs = Output::new(p.PA4, Level::High, Speed::VeryHigh);
    let radio_reset = Output::new(p.PB0, Level::High, Speed::Low);
    let radio_dio0 = ExtiInput::new(p.PB1, p.EXTI1, Pull::None);

    // A failed bring-up is permanent for the session: the controller
    // falls back to serial-only and reports it once on the LED.
    let radio = match Rfm95::new(radio_spi, radio_cs, radio_reset, radio_dio0, RadioConfig::default()).await {
        Ok(radio) => {
            info!("radio up at {} Hz", RADIO_FREQ_HZ);
            status_led.off();
            RadioPort::ready(radio)
        }
        Err(err) => {
            warn!("radio init failed: {}, serial-only session", err);
            status_led.on();
            RadioPort::offline()
        }
    };

    let serial = SerialPort::new(SERIAL_QUEUE.receiver(), uart_tx);

    // Actuator lines, everything released at power-up
    let fill = Output::new(p.PC0, Level::High, Speed::Low);
    let vent = Output::new(p.PC1, Level::High, Speed::Low);
    let ignition = Output::new(p.PC2, Level::High, Speed::Low);
    let telemetry = Output::new(p.PC3, Level::High, Speed::Low);
    let calibration = Output::new(p.PC4, Level::High, Speed::Low);
    let aux = [
        Output::new(p.PB10, Level::Low, Speed::Low),
        Output::new(p.PB11, Level::Low, Speed::Low),
        Output::new(p.PB12, Level::Low, Speed::Low),
        Output::new(p.PB13, Level::Low, Speed::Low),
    ];

    // Servo PWM at the 50 Hz hobby-servo frame rate
    let servo_pwm = SimplePwm::new(
        p.TIM3,
        Some(PwmPin::new_ch1(p.PB4, OutputType::PushPull)),
        Some(PwmPin::new_ch2(p.PB5, OutputType::PushPull)),
        Some(PwmPin::new_ch3(p.PC8, OutputType::PushPull)),
        None,
        Hertz(50),
        CountingMode::EdgeAlignedUp,
    );
    let channels = servo_pwm.split();
    let mut servo1 = channels.ch1;
    let mut servo2 = channels.ch2;
    let mut servo3 = channels.ch3;
    servo1.enable();
    servo2.enable();
    servo3.enable();

    let lines = PadLines::new(
        fill,
        vent,
        ignition,
        telemetry,
        calibration,
        aux,
        [servo1, servo2, servo3],
    );

    let mut controller = Controller::new(radio, serial, lines);

    // Battery sense inputs
    let mut battery = BatterySense::new(p.ADC1);
    battery.configure();
    let mut bat1 = p.PA0;
    let mut bat2 = p.PA1;

    info!("entering control loop");

    loop {
        let readings = [
            battery.read(&mut bat1).millivolts(),
            battery.read(&mut bat2).millivolts(),
        ];
        controller.set_battery(&readings);

        let now_ms = Instant::now().as_millis();
        if let Some(outcome) = controller.tick(now_ms) {
            info!("command {}: {}", outcome, *controller.state());
        }

        Timer::after(Duration::from_millis(TICK_PERIOD_MS)).await;
    }
}

/// Feeds received console bytes into the arbiter's queue
#[embassy_executor::task]
async fn serial_rx_task(mut rx: UartRx<'static, Async>) {
    let mut byte = [0u8; 1];
    loop {
        if rx.read(&mut byte).await.is_ok() {
            SERIAL_QUEUE.send(byte[0]).await;
        }
    }
}
