//! Interrupt/DMA transaction engine
//!
//! After [`Engine::initialize`] the engine runs entirely from interrupts:
//!
//! ```text
//!            StartSent        AddressAcked
//!   Opening ───────────▶ Addressing ─────────▶ Transferring ◀─┐
//!      ▲                                          │           │
//!      │             reopen (OLED)                │ Transfer- │
//!      └──────────────────────────────────────────┤ Complete  │
//!                                                 └───────────┘
//! ```
//!
//! Each completion snapshots the [`Panel`], asks the active protocol for
//! the next payload and restarts the DMA, forever. Every transfer runs
//! under a watchdog deadline; an expiry or an error interrupt resets the
//! peripheral and replays protocol bring-up without touching the text.

use textpanel_hal::{
    BusError, BusLine, DmaChannel, I2cConfig, I2cController, InterruptControl, IrqLine, LineMode,
    Platform, StatusFlags,
};

use crate::bus::BlockingBus;
use crate::config::Config;
use crate::discovery::{self, Device};
use crate::error::InitError;
use crate::fault::{Fault, FaultStats, Watchdog};
use crate::font::Font;
use crate::protocol::{DisplayProtocol, Opening, Protocol, TxBuffer};
use crate::text::Panel;

/// Everything that drives the engine forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// START condition is on the bus
    StartSent,
    /// Slave acknowledged its address
    AddressAcked,
    /// DMA finished the transmit buffer
    TransferComplete,
    /// Watchdog deadline passed
    TimeoutFired,
    /// Peripheral raised an error flag
    ErrorFlagged,
}

/// Where the current transaction is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// No transaction in progress
    Idle,
    /// START requested, waiting for it to go out
    Opening,
    /// Address byte written, waiting for the acknowledge
    Addressing,
    /// DMA is feeding the transmit buffer
    Transferring,
}

/// The hardware an engine owns
pub struct Peripherals<P: Platform> {
    pub i2c: P::I2c,
    pub dma: P::Dma,
    pub irq: P::Irq,
    pub timer: P::Timer,
    pub clock: P::Clock,
    pub scl: P::Line,
    pub sda: P::Line,
}

/// What discovery settled for this boot
#[derive(Debug, Clone, Copy)]
struct Session {
    device: Device,
    protocol: Protocol,
}

/// The display engine
pub struct Engine<'a, P: Platform> {
    i2c: P::I2c,
    dma: P::Dma,
    irq: P::Irq,
    clock: P::Clock,
    scl: P::Line,
    sda: P::Line,
    watchdog: Watchdog<P::Timer>,
    panel: &'a Panel,
    config: Config,
    font: Font,
    session: Option<Session>,
    phase: Phase,
    tx: TxBuffer,
    stats: FaultStats,
}

impl<'a, P: Platform> Engine<'a, P> {
    /// Create an idle engine rendering `panel`
    pub fn new(hw: Peripherals<P>, panel: &'a Panel, config: Config) -> Self {
        Self {
            i2c: hw.i2c,
            dma: hw.dma,
            irq: hw.irq,
            clock: hw.clock,
            scl: hw.scl,
            sda: hw.sda,
            watchdog: Watchdog::new(hw.timer, config.transfer_timeout_ms),
            panel,
            config,
            font: Font::default(),
            session: None,
            phase: Phase::Idle,
            tx: TxBuffer::new(),
            stats: FaultStats::new(),
        }
    }

    /// Render OLED text with `font` instead of the default 8x16
    ///
    /// Takes effect at the next discovery.
    pub fn with_font(mut self, font: Font) -> Self {
        self.font = font;
        self
    }

    /// Current transaction phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The discovered device, once initialization has succeeded
    pub fn device(&self) -> Option<Device> {
        self.session.map(|s| s.device)
    }

    /// The protocol in use, once initialization has succeeded
    pub fn protocol(&self) -> Option<&Protocol> {
        self.session.as_ref().map(|s| &s.protocol)
    }

    /// Fault counters
    pub fn fault_stats(&self) -> FaultStats {
        self.stats
    }

    /// Recover the bus, find the display and start the refresh loop
    ///
    /// The first successful call discovers the device and clears the text.
    /// Later calls re-initialize the same device: no wiring check, no
    /// probing, text kept.
    ///
    /// Run with the engine's interrupts masked (e.g. inside a critical
    /// section); the loop starts when they are next taken.
    pub fn initialize(&mut self) -> Result<Device, InitError> {
        let reinit = self.session.is_some();
        self.quiesce();

        let result = self.discover(reinit);
        if let Err(_e) = result {
            #[cfg(feature = "defmt")]
            defmt::error!("I2C: initialization failed: {}", _e);
            if !reinit {
                self.shutdown();
            }
        }
        result
    }

    fn discover(&mut self, reinit: bool) -> Result<Device, InitError> {
        let settle_us = self.config.settle_us;
        discovery::unwedge(&mut self.scl, &mut self.sda, &mut self.clock, settle_us);
        if !reinit {
            discovery::check_wiring(&mut self.scl, &mut self.sda, &mut self.clock, settle_us)?;
        }

        self.scl.set_mode(LineMode::Peripheral);
        self.sda.set_mode(LineMode::Peripheral);
        self.i2c.configure(I2cConfig::STANDARD);

        let device = match self.session {
            Some(session) => session.device,
            None => {
                let mut bus =
                    BlockingBus::new(&mut self.i2c, &mut self.clock, self.config.wait_timeout_us);
                let address = discovery::probe(&mut bus, &self.config.probe_ranges)?;
                let device = Device::classify(address, self.config.oled_address);
                #[cfg(feature = "defmt")]
                defmt::info!("I2C: {} at {=u8:#x}", device.kind, device.address);

                self.panel.clear();
                self.session = Some(Session {
                    device,
                    protocol: Protocol::for_device(&device, self.font),
                });
                device
            }
        };

        self.resume()?;
        Ok(device)
    }

    /// Give the lines back and mask everything after a failed discovery
    fn shutdown(&mut self) {
        for line in IrqLine::ALL {
            self.irq.disable(line);
        }
        self.watchdog.cancel();
        self.i2c.release();
        self.scl.set_mode(LineMode::PullUpInput);
        self.sda.set_mode(LineMode::PullUpInput);
    }

    /// Stop whatever is in flight
    fn quiesce(&mut self) {
        self.watchdog.cancel();
        self.dma.stop();
        self.phase = Phase::Idle;
    }

    /// Bring the discovered device up and start the loop
    ///
    /// The watchdog and the error interrupt are armed before bring-up. If
    /// this fails, whichever fires first (a latched error flag or the
    /// deadline) comes back through [`recover`](Self::recover) and tries
    /// again.
    fn resume(&mut self) -> Result<(), BusError> {
        let Some(session) = self.session.as_mut() else {
            return Err(BusError::Other);
        };
        let backlight = self.panel.snapshot().backlight;

        self.i2c.configure(session.protocol.bus_config());
        for line in IrqLine::ALL {
            self.irq.set_priority(line, self.config.irq_priority);
            self.irq.clear_pending(line);
            self.irq.enable(line);
        }
        self.i2c.set_error_interrupt(true);
        self.watchdog.arm();

        let mut bus = BlockingBus::new(&mut self.i2c, &mut self.clock, self.config.wait_timeout_us);
        let opening =
            session
                .protocol
                .bring_up(&mut bus, session.device.address, backlight, &mut self.tx)?;

        self.i2c.set_dma_requests(true);
        match opening {
            Opening::Established => self.start_dma(),
            Opening::Deferred => self.open_transaction(),
        }
        Ok(())
    }

    /// Dispatch one event
    pub fn handle(&mut self, event: Event) {
        match (self.phase, event) {
            (Phase::Opening, Event::StartSent) => self.send_address(),
            (Phase::Addressing, Event::AddressAcked) => self.begin_transfer(),
            (Phase::Transferring, Event::TransferComplete) => self.refill(),
            (_, Event::TimeoutFired) => {
                if self.watchdog.expire() {
                    self.recover(Fault::Timeout);
                } else {
                    #[cfg(feature = "defmt")]
                    defmt::debug!("I2C: stale deadline ignored");
                }
            }
            (_, Event::ErrorFlagged) if self.session.is_some() => {
                let status = self.i2c.status().errors();
                self.recover(Fault::Bus(status));
            }
            (_phase, _event) => {
                #[cfg(feature = "defmt")]
                defmt::debug!("I2C: {} ignored in {}", _event, _phase);
            }
        }
    }

    /// I2C event interrupt
    pub fn on_i2c_event(&mut self) {
        let status = self.i2c.status();
        if status.contains(StatusFlags::START) {
            self.handle(Event::StartSent);
        }
        if status.contains(StatusFlags::ADDRESS) {
            self.handle(Event::AddressAcked);
        }
    }

    /// I2C error interrupt (not a watchdog expiry)
    pub fn on_i2c_error(&mut self) {
        self.handle(Event::ErrorFlagged);
    }

    /// DMA transfer-complete interrupt
    pub fn on_transfer_complete(&mut self) {
        self.handle(Event::TransferComplete);
    }

    /// Watchdog deadline expiry
    pub fn on_deadline(&mut self) {
        self.handle(Event::TimeoutFired);
    }

    fn send_address(&mut self) {
        if let Some(session) = &self.session {
            self.i2c.write_data(session.device.address << 1);
            self.phase = Phase::Addressing;
        }
    }

    fn begin_transfer(&mut self) {
        self.i2c.acknowledge_address();
        // Data phase is paced by DMA requests from here on
        self.i2c.set_event_interrupt(false);
        self.start_dma();
    }

    fn start_dma(&mut self) {
        self.dma.start(&self.tx);
        self.watchdog.arm();
        self.phase = Phase::Transferring;
    }

    fn open_transaction(&mut self) {
        self.i2c.set_event_interrupt(true);
        self.i2c.generate_start();
        self.watchdog.arm();
        self.phase = Phase::Opening;
    }

    /// Build and send the next payload
    fn refill(&mut self) {
        self.watchdog.cancel();
        self.dma.stop();

        let Some(session) = self.session.as_mut() else {
            self.phase = Phase::Idle;
            return;
        };
        let snapshot = self.panel.snapshot();
        let payload = session.protocol.next_payload(&snapshot, &mut self.tx);
        if payload.sweep_complete {
            self.panel.refresh().advance();
        }

        if !payload.reopen {
            self.start_dma();
            return;
        }

        let mut bus = BlockingBus::new(&mut self.i2c, &mut self.clock, self.config.wait_timeout_us);
        match bus.finish() {
            Ok(()) => self.open_transaction(),
            Err(BusError::Timeout) => self.recover(Fault::Timeout),
            Err(e) => self.recover(Fault::Bus(e.flag())),
        }
    }

    /// Tear down and bring the same device back up
    fn recover(&mut self, fault: Fault) {
        let mut status = self.i2c.clear_errors();
        if let Fault::Bus(flags) = fault {
            status = status | flags;
        }
        #[cfg(feature = "defmt")]
        defmt::warn!("I2C: {} (status {=u16:#x}), resetting", fault, status.bits());

        self.i2c.reset();
        self.dma.stop();
        self.watchdog.cancel();
        self.phase = Phase::Idle;
        self.stats.record(fault, status);

        if let Err(_e) = self.resume() {
            #[cfg(feature = "defmt")]
            defmt::warn!("I2C: resume failed ({}), retrying on next fault", _e);
        }
    }
}
