//! Textpanel - I2C character display firmware
//!
//! Finds an HD44780 (PCF8574 backpack) or SSD1306 panel on I2C2 and keeps
//! it refreshed from interrupts. Foreground code only writes text into the
//! shared [`Panel`].

#![no_std]
#![no_main]

use core::cell::RefCell;

use critical_section::Mutex;
use defmt::*;
use embassy_executor::Spawner;
use embassy_stm32::interrupt;
use embassy_stm32::time::Hertz;
use embassy_time::Timer;
use {defmt_rtt as _, panic_probe as _};

use textpanel_core::{Config, Engine, ExpiryLatch, Panel, Peripherals};
use textpanel_hal_stm32f1::{
    dma, CycleClock, DeadlineSignal, I2c2, I2cTxDma, Nvic, PortBLine, SignalDeadline, Stm32,
};

mod tasks;

/// Core clock after PLL setup
const SYSCLK_HZ: u32 = 72_000_000;
/// APB1 clock feeding I2C2
const PCLK1_HZ: u32 = 36_000_000;

/// Text shown on the panel
pub static PANEL: Panel = Panel::new();

/// Deadline requests from the engine to the watchdog task
static DEADLINE: DeadlineSignal = DeadlineSignal::new();

/// Set by the watchdog task when it pends I2C2_ER
static EXPIRY: ExpiryLatch = ExpiryLatch::new();

/// The engine, shared between init and the interrupt handlers
static ENGINE: Mutex<RefCell<Option<Engine<'static, Stm32>>>> = Mutex::new(RefCell::new(None));

/// Run `f` on the engine inside a critical section, if it exists yet
fn with_engine<R>(f: impl FnOnce(&mut Engine<'static, Stm32>) -> R) -> Option<R> {
    critical_section::with(|cs| ENGINE.borrow_ref_mut(cs).as_mut().map(f))
}

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Textpanel firmware starting...");

    let mut config = embassy_stm32::Config::default();
    {
        use embassy_stm32::rcc::*;
        config.rcc.hse = Some(Hse {
            freq: Hertz(8_000_000),
            mode: HseMode::Oscillator,
        });
        config.rcc.pll = Some(Pll {
            src: PllSource::HSE,
            prediv: PllPreDiv::DIV1,
            mul: PllMul::MUL9,
        });
        config.rcc.sys = Sysclk::PLL1_P;
        config.rcc.ahb_pre = AHBPrescaler::DIV1;
        config.rcc.apb1_pre = APBPrescaler::DIV2;
        config.rcc.apb2_pre = APBPrescaler::DIV1;
    }
    let p = embassy_stm32::init(config);
    // Driven at register level from here on
    let _owned = (p.I2C2, p.DMA1_CH4, p.PB10, p.PB11);

    let mut core = unwrap!(cortex_m::Peripherals::take());
    core.DCB.enable_trace();
    core.DWT.enable_cycle_counter();

    spawner.spawn(tasks::deadline_task(&DEADLINE)).unwrap();

    let hw = Peripherals {
        i2c: I2c2::new(PCLK1_HZ),
        dma: I2cTxDma::new(),
        irq: Nvic::new(),
        timer: SignalDeadline::new(&DEADLINE),
        clock: CycleClock::new(SYSCLK_HZ),
        scl: PortBLine::scl(),
        sda: PortBLine::sda(),
    };

    // Interrupts the engine enables stay pending until this section ends
    let result = critical_section::with(|cs| {
        let mut slot = ENGINE.borrow_ref_mut(cs);
        slot.insert(Engine::new(hw, &PANEL, Config::default()))
            .initialize()
    });

    match result {
        Ok(device) => {
            info!("Display {} at {=u8:#x}", device.kind, device.address);
            PANEL.write(0, 0, 16, "textpanel");

            let start = PANEL.refresh_count();
            while !PANEL.swept_since(start, 2) {
                Timer::after_millis(1).await;
            }
            PANEL.set_backlight(true);

            spawner.spawn(tasks::status_task()).unwrap();
        }
        Err(e) => {
            error!("Display init failed: {}", e);
        }
    }
}

#[interrupt]
fn I2C2_EV() {
    with_engine(|engine| {
        if dma::transfer_done() {
            engine.on_transfer_complete();
        } else {
            engine.on_i2c_event();
        }
    });
}

#[interrupt]
fn I2C2_ER() {
    with_engine(|engine| {
        if EXPIRY.take() {
            engine.on_deadline();
        } else {
            engine.on_i2c_error();
        }
    });
}

/// Called by the watchdog task when an armed deadline passes
pub(crate) fn deadline_expired() {
    EXPIRY.fire(&mut Nvic::new());
}

/// Diagnostics for the status screen
pub(crate) fn fault_stats() -> Option<textpanel_core::FaultStats> {
    with_engine(|engine| engine.fault_stats())
}
