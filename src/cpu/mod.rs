//! The CPU: a state machine stepped one M-cycle at a time (spec §4.3).
//!
//! [`Cpu::step`] is the single public operation. Internally, each call
//! dispatches on the currently latched `opcode` to a per-instruction-family
//! routine (see [`ops`]), passing along `m_cycle` so that routine knows
//! which slice of the instruction's documented micro-sequence to run. The
//! *last* M-cycle of every instruction ends by calling [`Cpu::prefetch`],
//! which reads the next opcode, advances `PC`, and resets `m_cycle` — the
//! fetch/execute overlap that makes this cycle-accurate.

mod decode;
mod ops;

use crate::bus::Bus;
use crate::interrupt::Interrupt;
use crate::registers::{R16, R8, Registers};

pub use decode::{Cond, R16Mem, R16Stk};

/// An `r8` operand (spec §4.3.2): either one of the seven plain registers,
/// or `[HL]`, which costs one extra M-cycle whenever it's touched.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operand8 {
    Reg(R8),
    Indirect,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    Running,
    Halted,
    /// Modeled as halting indefinitely (spec §4.3.4); nothing in this core
    /// wakes a stopped CPU, since joypad input is out of scope.
    Stopped,
    /// Reached via one of the eleven documented invalid opcodes. Permanent;
    /// the CPU performs no further bus access or state change.
    Stuck,
}

const INVALID_OPCODES: [u8; 11] = [
    0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD,
];

fn is_invalid_opcode(op: u8) -> bool {
    INVALID_OPCODES.contains(&op)
}

pub struct Cpu {
    pub reg: Registers,

    /// The currently executing opcode, fetched one M-cycle earlier.
    opcode: u8,

    /// Second byte of a `0xCB`-prefixed instruction; only meaningful while
    /// `opcode == 0xCB`.
    cb_sub: u8,

    /// Zero-based index of the next M-cycle to run within `opcode`.
    m_cycle: u8,

    /// Scratch latch for assembling multi-byte operands and addresses.
    tmp: u16,

    ime: bool,

    /// Counts down the one-instruction delay of `EI` (spec §4.3.4): set to
    /// 2 when `EI` runs, decremented at each instruction boundary; `ime`
    /// flips true the boundary it reaches zero.
    ime_delay: u8,

    state: State,

    /// `Some` while the 5-M-cycle interrupt dispatch sequence (spec
    /// §4.3.5) is in progress; holds which interrupt is being serviced.
    interrupt_dispatch: Option<Interrupt>,

    /// True until the very first M-cycle has run: that cycle is nothing
    /// but the implicit initial prefetch at `PC = 0` (spec §4.3.1).
    booted: bool,

    /// When set, per-instruction completions are logged via `log::trace!`
    /// (spec §4.3, ambient tracing).
    pub trace: bool,
}

impl Cpu {
    pub fn new() -> Cpu {
        Cpu {
            reg: Registers::new(),
            opcode: 0,
            cb_sub: 0,
            m_cycle: 0,
            tmp: 0,
            ime: false,
            ime_delay: 0,
            state: State::Running,
            interrupt_dispatch: None,
            booted: false,
            trace: false,
        }
    }

    pub fn ime(&self) -> bool {
        self.ime
    }

    pub fn is_stuck(&self) -> bool {
        matches!(self.state, State::Stuck)
    }

    pub fn is_halted(&self) -> bool {
        matches!(self.state, State::Halted)
    }

    /// Advances the CPU by exactly one M-cycle, issuing at most one bus
    /// read or write in the process (spec §4.3.1).
    pub fn step<B: Bus>(&mut self, bus: &mut B) {
        if !self.booted {
            self.booted = true;
            self.prefetch(bus);
            return;
        }

        match self.state {
            State::Stuck | State::Stopped => return,
            State::Halted => {
                if !bus.any_interrupt_pending() {
                    return;
                }
                self.state = State::Running;
            }
            State::Running => {}
        }

        if self.m_cycle == 0 {
            self.apply_ei_delay();

            if self.ime {
                if let Some(interrupt) = bus.pending_interrupt() {
                    self.begin_interrupt_dispatch(interrupt);
                    return self.run_interrupt_dispatch(bus);
                }
            }
        }

        if self.dispatching_interrupt() {
            self.run_interrupt_dispatch(bus);
        } else {
            self.step_opcode(bus);
        }
    }

    fn apply_ei_delay(&mut self) {
        if self.ime_delay > 0 {
            self.ime_delay -= 1;
            if self.ime_delay == 0 {
                self.ime = true;
            }
        }
    }

    fn schedule_ei(&mut self) {
        self.ime_delay = 2;
    }

    fn disable_ime(&mut self) {
        self.ime = false;
        self.ime_delay = 0;
    }

    fn enter_halted(&mut self) {
        self.state = State::Halted;
    }

    fn enter_stopped(&mut self) {
        self.state = State::Stopped;
    }

    /// Reached via one of the eleven documented invalid opcodes: the CPU
    /// performs no further bus access or state change from here on.
    fn enter_stuck(&mut self) {
        self.state = State::Stuck;
    }

    /// Reads `[PC]`, stores it as the new `opcode`, advances `PC`, and
    /// resets `m_cycle` to 0 — the prefetch overlapped with the last cycle
    /// of every instruction.
    fn prefetch<B: Bus>(&mut self, bus: &mut B) {
        self.opcode = bus.read(self.reg.pc());
        self.reg.set_pc(self.reg.pc().wrapping_add(1));
        self.m_cycle = 0;

        if self.trace {
            log::trace!("pc={:#06x} opcode={:#04x}", self.reg.pc().wrapping_sub(1), self.opcode);
        }
    }

    /// Like [`Cpu::prefetch`], but does not advance `PC`. Used only to
    /// reproduce the `HALT` bug (spec §4.3.4): the byte after `HALT` gets
    /// fetched-and-executed twice because the fetch that should have moved
    /// past it never did.
    fn prefetch_without_advancing_pc<B: Bus>(&mut self, bus: &mut B) {
        self.opcode = bus.read(self.reg.pc());
        self.m_cycle = 0;
    }

    fn dispatching_interrupt(&self) -> bool {
        self.interrupt_dispatch.is_some()
    }

    /// Ends the current opcode: the instruction's own work is done, so the
    /// next bus access is the prefetch of whatever comes after it.
    fn finish<B: Bus>(&mut self, bus: &mut B) {
        self.prefetch(bus);
    }

    /// Like [`Cpu::finish`], for the one opcode (`HALT`) whose prefetch must
    /// not advance `PC` (spec §4.3.4, the HALT bug).
    fn finish_without_advancing_pc<B: Bus>(&mut self, bus: &mut B) {
        self.prefetch_without_advancing_pc(bus);
    }

    fn read_operand8<B: Bus>(&self, bus: &mut B, operand: Operand8) -> u8 {
        match operand {
            Operand8::Reg(r) => self.reg.get_r8(r),
            Operand8::Indirect => bus.read(self.reg.hl()),
        }
    }

    fn write_operand8<B: Bus>(&mut self, bus: &mut B, operand: Operand8, val: u8) {
        match operand {
            Operand8::Reg(r) => self.reg.set_r8(r, val),
            Operand8::Indirect => bus.write(self.reg.hl(), val),
        }
    }

    /// `PC`-relative fetch of the byte immediately following the opcode,
    /// without touching `m_cycle` bookkeeping — callers are already inside
    /// the right cycle when they call this.
    fn fetch_imm8<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let val = bus.read(self.reg.pc());
        self.reg.set_pc(self.reg.pc().wrapping_add(1));
        val
    }

    fn step_opcode<B: Bus>(&mut self, bus: &mut B) {
        ops::dispatch(self, bus);
    }

    fn begin_interrupt_dispatch(&mut self, interrupt: Interrupt) {
        self.interrupt_dispatch = Some(interrupt);
        self.m_cycle = 0;
    }

    /// The 5-M-cycle interrupt dispatch sequence (spec §4.3.5): two internal
    /// cycles, then `PC` is pushed high-byte-first, then on the last cycle
    /// the serviced bit is cleared in `IF`, `IME` is cleared, `PC` jumps to
    /// the handler vector, and the next opcode is prefetched.
    fn run_interrupt_dispatch<B: Bus>(&mut self, bus: &mut B) {
        let interrupt = self.interrupt_dispatch.expect("run_interrupt_dispatch without a pending interrupt");

        match self.m_cycle {
            0 | 1 => {
                self.m_cycle += 1;
            }
            2 => {
                let sp = self.reg.sp().wrapping_sub(1);
                self.reg.set_sp(sp);
                bus.write(sp, (self.reg.pc() >> 8) as u8);
                self.m_cycle = 3;
            }
            3 => {
                let sp = self.reg.sp().wrapping_sub(1);
                self.reg.set_sp(sp);
                bus.write(sp, (self.reg.pc() & 0xFF) as u8);
                self.m_cycle = 4;
            }
            4 => {
                bus.ack_interrupt(interrupt);
                self.ime = false;
                self.reg.set_pc(interrupt.vector());
                self.interrupt_dispatch = None;
                self.prefetch(bus);
            }
            _ => unreachable!("interrupt dispatch m_cycle out of range"),
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
