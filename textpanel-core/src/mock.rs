//! Recording mock platform for host tests
//!
//! The I2C mock models just enough of a master transmitter: START sets the
//! start flag, the next data write is the address byte (acknowledged if a
//! device answers there, NACK otherwise), and in the data phase the
//! byte-transferred flag is set whenever nothing is in flight.

use std::cell::{Cell, Ref, RefCell};
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use textpanel_hal::{
    BusLine, Clock, DeadlineTimer, DmaChannel, I2cConfig, I2cController, InputPin,
    InterruptControl, IrqLine, LineMode, OutputPin, Platform, StatusFlags,
};

use crate::engine::Peripherals;

/// Recorded controller activity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I2cOp {
    Configure(I2cConfig),
    Reset,
    Release,
    Start,
    Stop,
    Write(u8),
    AckAddress,
}

#[derive(Debug, Default)]
pub struct MockI2c {
    pub ops: Vec<I2cOp>,
    pub devices: Vec<u8>,
    pub status: StatusFlags,
    /// START never completes
    pub start_hangs: bool,
    /// STOP never completes
    pub stop_hangs: bool,
    pub event_irq: bool,
    pub error_irq: bool,
    pub dma_requests: bool,
    address_phase: bool,
}

impl MockI2c {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(address: u8) -> Self {
        Self {
            devices: vec![address],
            ..Self::default()
        }
    }

    pub fn count(&self, op: I2cOp) -> usize {
        self.ops.iter().filter(|&&o| o == op).count()
    }

    pub fn last_config(&self) -> Option<I2cConfig> {
        self.ops.iter().rev().find_map(|op| match op {
            I2cOp::Configure(config) => Some(*config),
            _ => None,
        })
    }

    fn set(&mut self, flags: StatusFlags) {
        self.status = self.status | flags;
    }

    fn unset(&mut self, flags: StatusFlags) {
        self.status = StatusFlags(self.status.0 & !flags.0);
    }
}

impl I2cController for MockI2c {
    fn configure(&mut self, config: I2cConfig) {
        self.ops.push(I2cOp::Configure(config));
        self.status = StatusFlags::empty();
        self.event_irq = false;
        self.error_irq = false;
        self.dma_requests = false;
        self.address_phase = false;
    }

    fn reset(&mut self) {
        self.ops.push(I2cOp::Reset);
        self.status = StatusFlags::empty();
        self.address_phase = false;
    }

    fn release(&mut self) {
        self.ops.push(I2cOp::Release);
    }

    fn status(&self) -> StatusFlags {
        self.status
    }

    fn clear_errors(&mut self) -> StatusFlags {
        let errors = self.status.errors();
        self.unset(StatusFlags::ERRORS);
        errors
    }

    fn generate_start(&mut self) {
        self.ops.push(I2cOp::Start);
        self.unset(StatusFlags::BYTE_TRANSFERRED);
        if !self.start_hangs {
            self.set(StatusFlags::START);
            self.address_phase = true;
        }
    }

    fn generate_stop(&mut self) {
        self.ops.push(I2cOp::Stop);
        self.unset(StatusFlags::BYTE_TRANSFERRED);
    }

    fn stop_pending(&self) -> bool {
        self.stop_hangs
    }

    fn write_data(&mut self, byte: u8) {
        self.ops.push(I2cOp::Write(byte));
        if self.address_phase {
            self.address_phase = false;
            self.unset(StatusFlags::START);
            if self.devices.contains(&(byte >> 1)) {
                self.set(StatusFlags::ADDRESS);
            } else {
                self.set(StatusFlags::NACK);
            }
        } else {
            self.set(StatusFlags::BYTE_TRANSFERRED);
        }
    }

    fn acknowledge_address(&mut self) {
        self.ops.push(I2cOp::AckAddress);
        self.unset(StatusFlags::ADDRESS);
        self.set(StatusFlags::BYTE_TRANSFERRED);
    }

    fn set_event_interrupt(&mut self, enabled: bool) {
        self.event_irq = enabled;
    }

    fn set_error_interrupt(&mut self, enabled: bool) {
        self.error_irq = enabled;
    }

    fn set_dma_requests(&mut self, enabled: bool) {
        self.dma_requests = enabled;
    }
}

#[derive(Debug, Default)]
pub struct MockDma {
    pub transfers: Vec<Vec<u8>>,
    pub stops: usize,
}

impl MockDma {
    pub fn last(&self) -> &[u8] {
        self.transfers.last().map(Vec::as_slice).unwrap_or(&[])
    }
}

impl DmaChannel for MockDma {
    fn start(&mut self, data: &[u8]) {
        self.transfers.push(data.to_vec());
    }

    fn stop(&mut self) {
        self.stops += 1;
    }
}

#[derive(Debug, Default)]
pub struct MockIrq {
    pub enabled: Vec<IrqLine>,
    pub pending: Vec<IrqLine>,
    pub priorities: Vec<(IrqLine, u8)>,
}

impl InterruptControl for MockIrq {
    fn set_priority(&mut self, line: IrqLine, priority: u8) {
        self.priorities.retain(|&(l, _)| l != line);
        self.priorities.push((line, priority));
    }

    fn enable(&mut self, line: IrqLine) {
        if !self.enabled.contains(&line) {
            self.enabled.push(line);
        }
    }

    fn disable(&mut self, line: IrqLine) {
        self.enabled.retain(|&l| l != line);
    }

    fn clear_pending(&mut self, line: IrqLine) {
        self.pending.retain(|&l| l != line);
    }

    fn set_pending(&mut self, line: IrqLine) {
        self.pending.push(line);
    }
}

#[derive(Debug, Default)]
pub struct MockTimer {
    pub armed_ms: Option<u32>,
}

impl DeadlineTimer for MockTimer {
    fn arm(&mut self, timeout_ms: u32) {
        self.armed_ms = Some(timeout_ms);
    }

    fn cancel(&mut self) {
        self.armed_ms = None;
    }
}

/// One tick per microsecond; every read of the clock costs a few ticks so
/// polling loops make progress
#[derive(Debug, Default)]
pub struct MockClock {
    ticks: Cell<u32>,
    delayed_ns: u64,
}

impl MockClock {
    const TICKS_PER_READ: u32 = 7;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn delayed_us(&self) -> u64 {
        self.delayed_ns / 1000
    }
}

impl Clock for MockClock {
    fn now(&self) -> u32 {
        let now = self.ticks.get().wrapping_add(Self::TICKS_PER_READ);
        self.ticks.set(now);
        now
    }

    fn ticks_per_us(&self) -> u32 {
        1
    }
}

impl DelayNs for MockClock {
    fn delay_ns(&mut self, ns: u32) {
        self.delayed_ns += u64::from(ns);
        self.ticks.set(self.ticks.get().wrapping_add(ns / 1000));
    }
}

/// Electrical state of the two bus lines and the slave on them
#[derive(Debug)]
pub struct Wires {
    /// External pull-up resistors fitted
    pub pull_ups: bool,
    /// A slave is driving SDA low
    pub slave_holds_sda: bool,
    /// The slave ignores clocking
    pub slave_stuck: bool,
    /// Times software drove SDA low
    pub sda_pulls: usize,
    /// Times SCL was switched to a pull-down input
    pub pull_down_checks: usize,
    scl: Drive,
    sda: Drive,
}

#[derive(Debug, Clone, Copy)]
struct Drive {
    mode: LineMode,
    high: bool,
}

impl Wires {
    pub fn healthy() -> Self {
        let idle = Drive {
            mode: LineMode::PullUpInput,
            high: true,
        };
        Self {
            pull_ups: true,
            slave_holds_sda: false,
            slave_stuck: false,
            sda_pulls: 0,
            pull_down_checks: 0,
            scl: idle,
            sda: idle,
        }
    }

    fn drive(&mut self, role: Role) -> &mut Drive {
        match role {
            Role::Scl => &mut self.scl,
            Role::Sda => &mut self.sda,
        }
    }

    fn level(&self, role: Role) -> bool {
        let drive = match role {
            Role::Scl => self.scl,
            Role::Sda => self.sda,
        };
        let driven_low = drive.mode == LineMode::OpenDrainOutput && !drive.high;
        let slave_low = role == Role::Sda && self.slave_holds_sda;
        if driven_low || slave_low {
            false
        } else if self.pull_ups {
            true
        } else {
            drive.mode == LineMode::PullUpInput
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Scl,
    Sda,
}

#[derive(Debug)]
pub struct MockLine {
    role: Role,
    wires: Rc<RefCell<Wires>>,
}

impl MockLine {
    pub fn wires(&self) -> Ref<'_, Wires> {
        self.wires.borrow()
    }

    pub fn mode(&self) -> LineMode {
        let mut wires = self.wires.borrow_mut();
        wires.drive(self.role).mode
    }
}

/// SCL and SDA sharing one set of wires
pub fn wires(state: Wires) -> (MockLine, MockLine) {
    let shared = Rc::new(RefCell::new(state));
    (
        MockLine {
            role: Role::Scl,
            wires: shared.clone(),
        },
        MockLine {
            role: Role::Sda,
            wires: shared,
        },
    )
}

impl OutputPin for MockLine {
    fn set_high(&mut self) {
        self.wires.borrow_mut().drive(self.role).high = true;
    }

    fn set_low(&mut self) {
        let mut wires = self.wires.borrow_mut();
        let drive = wires.drive(self.role);
        let falling = drive.mode == LineMode::OpenDrainOutput && drive.high;
        drive.high = false;
        match self.role {
            // The slave finishes its ACK bit on the falling clock edge
            Role::Scl if falling && !wires.slave_stuck => wires.slave_holds_sda = false,
            Role::Sda => wires.sda_pulls += 1,
            Role::Scl => {}
        }
    }
}

impl InputPin for MockLine {
    fn is_high(&self) -> bool {
        self.wires.borrow().level(self.role)
    }
}

impl BusLine for MockLine {
    fn set_mode(&mut self, mode: LineMode) {
        let mut wires = self.wires.borrow_mut();
        if mode == LineMode::PullDownInput && self.role == Role::Scl {
            wires.pull_down_checks += 1;
        }
        wires.drive(self.role).mode = mode;
    }
}

pub struct MockPlatform;

impl Platform for MockPlatform {
    type I2c = MockI2c;
    type Dma = MockDma;
    type Line = MockLine;
    type Irq = MockIrq;
    type Timer = MockTimer;
    type Clock = MockClock;
}

/// A board with healthy wiring and one device at `address`
pub fn board(address: u8) -> Peripherals<MockPlatform> {
    board_with(MockI2c::with_device(address), Wires::healthy())
}

pub fn board_with(i2c: MockI2c, state: Wires) -> Peripherals<MockPlatform> {
    let (scl, sda) = wires(state);
    Peripherals {
        i2c,
        dma: MockDma::default(),
        irq: MockIrq::default(),
        timer: MockTimer::default(),
        clock: MockClock::new(),
        scl,
        sda,
    }
}
