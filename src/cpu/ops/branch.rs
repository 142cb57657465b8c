//! `JR`/`JP`/`CALL`/`RET`/`RST` (spec §4.3.4). The conditional forms share
//! one quirk: the untaken path is always shorter than the taken one by
//! exactly the M-cycles spent actually moving `PC`/`SP`, never by skipping
//! the immediate-operand fetch that already happened.

use crate::bus::Bus;
use crate::cpu::Cpu;
use crate::registers::{Cond, Flags};

fn cond_met(cpu: &Cpu, cond: Cond) -> bool {
    let flags = cpu.reg.flags();
    match cond {
        Cond::NZ => !flags.contains(Flags::Z),
        Cond::Z => flags.contains(Flags::Z),
        Cond::NC => !flags.contains(Flags::C),
        Cond::C => flags.contains(Flags::C),
    }
}

/// `JR e8` — unconditional, always three M-cycles.
pub fn jr<B: Bus>(cpu: &mut Cpu, bus: &mut B) {
    match cpu.m_cycle {
        0 => {
            cpu.tmp = cpu.fetch_imm8(bus) as u16;
            cpu.m_cycle = 1;
        }
        1 => {
            let offset = cpu.tmp as u8 as i8 as i16;
            cpu.reg.set_pc(cpu.reg.pc().wrapping_add(offset as u16));
            cpu.m_cycle = 2;
        }
        2 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

/// `JR cc, e8` — two M-cycles untaken, three taken.
pub fn jr_cond<B: Bus>(cpu: &mut Cpu, bus: &mut B, cond: Cond) {
    match cpu.m_cycle {
        0 => {
            cpu.tmp = cpu.fetch_imm8(bus) as u16;
            cpu.m_cycle = 1;
        }
        1 => {
            if cond_met(cpu, cond) {
                let offset = cpu.tmp as u8 as i8 as i16;
                cpu.reg.set_pc(cpu.reg.pc().wrapping_add(offset as u16));
                cpu.m_cycle = 2;
            } else {
                cpu.finish(bus);
            }
        }
        2 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

/// `JP a16` — always four M-cycles.
pub fn jp<B: Bus>(cpu: &mut Cpu, bus: &mut B) {
    match cpu.m_cycle {
        0 => {
            cpu.tmp = cpu.fetch_imm8(bus) as u16;
            cpu.m_cycle = 1;
        }
        1 => {
            let hi = cpu.fetch_imm8(bus);
            cpu.tmp |= (hi as u16) << 8;
            cpu.m_cycle = 2;
        }
        2 => {
            cpu.reg.set_pc(cpu.tmp);
            cpu.m_cycle = 3;
        }
        3 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

/// `JP cc, a16` — three M-cycles untaken, four taken.
pub fn jp_cond<B: Bus>(cpu: &mut Cpu, bus: &mut B, cond: Cond) {
    match cpu.m_cycle {
        0 => {
            cpu.tmp = cpu.fetch_imm8(bus) as u16;
            cpu.m_cycle = 1;
        }
        1 => {
            let hi = cpu.fetch_imm8(bus);
            cpu.tmp |= (hi as u16) << 8;
            cpu.m_cycle = 2;
        }
        2 => {
            if cond_met(cpu, cond) {
                cpu.reg.set_pc(cpu.tmp);
                cpu.m_cycle = 3;
            } else {
                cpu.finish(bus);
            }
        }
        3 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

/// `JP HL` — one M-cycle: no memory access beyond the opcode fetch that
/// already happened, since the target comes straight from a register.
pub fn jp_hl<B: Bus>(cpu: &mut Cpu, bus: &mut B) {
    cpu.reg.set_pc(cpu.reg.hl());
    cpu.finish(bus);
}

/// `CALL a16` — always six M-cycles.
pub fn call<B: Bus>(cpu: &mut Cpu, bus: &mut B) {
    match cpu.m_cycle {
        0 => {
            cpu.tmp = cpu.fetch_imm8(bus) as u16;
            cpu.m_cycle = 1;
        }
        1 => {
            let hi = cpu.fetch_imm8(bus);
            cpu.tmp |= (hi as u16) << 8;
            cpu.m_cycle = 2;
        }
        2 => {
            cpu.reg.set_sp(cpu.reg.sp().wrapping_sub(1));
            cpu.m_cycle = 3;
        }
        3 => {
            bus.write(cpu.reg.sp(), (cpu.reg.pc() >> 8) as u8);
            cpu.reg.set_sp(cpu.reg.sp().wrapping_sub(1));
            cpu.m_cycle = 4;
        }
        4 => {
            bus.write(cpu.reg.sp(), (cpu.reg.pc() & 0xFF) as u8);
            cpu.reg.set_pc(cpu.tmp);
            cpu.m_cycle = 5;
        }
        5 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

/// `CALL cc, a16` — three M-cycles untaken, six taken.
pub fn call_cond<B: Bus>(cpu: &mut Cpu, bus: &mut B, cond: Cond) {
    match cpu.m_cycle {
        0 => {
            cpu.tmp = cpu.fetch_imm8(bus) as u16;
            cpu.m_cycle = 1;
        }
        1 => {
            let hi = cpu.fetch_imm8(bus);
            cpu.tmp |= (hi as u16) << 8;
            cpu.m_cycle = 2;
        }
        2 => {
            if cond_met(cpu, cond) {
                cpu.reg.set_sp(cpu.reg.sp().wrapping_sub(1));
                cpu.m_cycle = 3;
            } else {
                cpu.finish(bus);
            }
        }
        3 => {
            bus.write(cpu.reg.sp(), (cpu.reg.pc() >> 8) as u8);
            cpu.reg.set_sp(cpu.reg.sp().wrapping_sub(1));
            cpu.m_cycle = 4;
        }
        4 => {
            bus.write(cpu.reg.sp(), (cpu.reg.pc() & 0xFF) as u8);
            cpu.reg.set_pc(cpu.tmp);
            cpu.m_cycle = 5;
        }
        5 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

fn pop_pc_byte<B: Bus>(cpu: &mut Cpu, bus: &mut B, shift: u32) {
    let byte = bus.read(cpu.reg.sp());
    cpu.tmp |= (byte as u16) << shift;
    cpu.reg.set_sp(cpu.reg.sp().wrapping_add(1));
}

/// `RET` — always four M-cycles.
pub fn ret<B: Bus>(cpu: &mut Cpu, bus: &mut B) {
    match cpu.m_cycle {
        0 => {
            cpu.tmp = 0;
            pop_pc_byte(cpu, bus, 0);
            cpu.m_cycle = 1;
        }
        1 => {
            pop_pc_byte(cpu, bus, 8);
            cpu.m_cycle = 2;
        }
        2 => {
            cpu.reg.set_pc(cpu.tmp);
            cpu.m_cycle = 3;
        }
        3 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

/// `RETI` — identical timing to `RET`, but `IME` is set the instant the
/// interrupt-enable-flag cycle completes, not after the one-instruction
/// delay `EI` imposes.
pub fn reti<B: Bus>(cpu: &mut Cpu, bus: &mut B) {
    match cpu.m_cycle {
        0 => {
            cpu.tmp = 0;
            pop_pc_byte(cpu, bus, 0);
            cpu.m_cycle = 1;
        }
        1 => {
            pop_pc_byte(cpu, bus, 8);
            cpu.m_cycle = 2;
        }
        2 => {
            cpu.reg.set_pc(cpu.tmp);
            cpu.ime = true;
            cpu.m_cycle = 3;
        }
        3 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

/// `RET cc` — two M-cycles untaken, five taken: the condition test is its
/// own internal cycle before `RET`'s own sequence even begins.
pub fn ret_cond<B: Bus>(cpu: &mut Cpu, bus: &mut B, cond: Cond) {
    match cpu.m_cycle {
        0 => {
            cpu.tmp = cond_met(cpu, cond) as u16;
            cpu.m_cycle = 1;
        }
        1 if cpu.tmp == 0 => cpu.finish(bus),
        1 => {
            cpu.tmp = 0;
            pop_pc_byte(cpu, bus, 0);
            cpu.m_cycle = 2;
        }
        2 => {
            pop_pc_byte(cpu, bus, 8);
            cpu.m_cycle = 3;
        }
        3 => {
            cpu.reg.set_pc(cpu.tmp);
            cpu.m_cycle = 4;
        }
        4 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

/// `RST n` — always four M-cycles, identical shape to `CALL` minus the
/// two-byte immediate fetch.
pub fn rst<B: Bus>(cpu: &mut Cpu, bus: &mut B, target: u16) {
    match cpu.m_cycle {
        0 => {
            cpu.reg.set_sp(cpu.reg.sp().wrapping_sub(1));
            cpu.m_cycle = 1;
        }
        1 => {
            bus.write(cpu.reg.sp(), (cpu.reg.pc() >> 8) as u8);
            cpu.reg.set_sp(cpu.reg.sp().wrapping_sub(1));
            cpu.m_cycle = 2;
        }
        2 => {
            bus.write(cpu.reg.sp(), (cpu.reg.pc() & 0xFF) as u8);
            cpu.reg.set_pc(target);
            cpu.m_cycle = 3;
        }
        3 => cpu.finish(bus),
        _ => unreachable!(),
    }
}
