//! `LD`/`LDH` family micro-sequences (spec §4.3.4).
//!
//! Every function here is careful to spend at most one bus read or write per
//! `m_cycle`, including the implicit one inside [`Cpu::finish`] — which is
//! why the "just write the result and finish" cycle is its own branch
//! whenever the immediately preceding cycle already touched the bus.

use crate::bus::Bus;
use crate::cpu::{Cpu, Operand8};
use crate::registers::{Flags, R16, R16Mem, R8};

/// `LD r8, r8'` and the `[HL]` variants of it — one M-cycle if neither side
/// touches memory, two if either does (both sides touching memory is
/// `HALT`, handled separately).
pub fn ld_r8_r8<B: Bus>(cpu: &mut Cpu, bus: &mut B, dst: Operand8, src: Operand8) {
    if dst != Operand8::Indirect && src != Operand8::Indirect {
        let val = cpu.read_operand8(bus, src);
        cpu.write_operand8(bus, dst, val);
        cpu.finish(bus);
        return;
    }

    match cpu.m_cycle {
        0 => {
            let val = cpu.read_operand8(bus, src);
            if dst == Operand8::Indirect {
                cpu.write_operand8(bus, dst, val);
            } else {
                cpu.tmp = val as u16;
            }
            cpu.m_cycle = 1;
        }
        1 => {
            if dst != Operand8::Indirect {
                let val = cpu.tmp as u8;
                cpu.write_operand8(bus, dst, val);
            }
            cpu.finish(bus);
        }
        _ => unreachable!(),
    }
}

/// `LD r8, n8` / `LD [HL], n8`.
pub fn ld_r8_imm8<B: Bus>(cpu: &mut Cpu, bus: &mut B, dst: Operand8) {
    match cpu.m_cycle {
        0 => {
            cpu.tmp = cpu.fetch_imm8(bus) as u16;
            cpu.m_cycle = 1;
        }
        1 if dst == Operand8::Indirect => {
            cpu.write_operand8(bus, dst, cpu.tmp as u8);
            cpu.m_cycle = 2;
        }
        1 => {
            let val = cpu.tmp as u8;
            cpu.write_operand8(bus, dst, val);
            cpu.finish(bus);
        }
        2 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

/// `LD r16, n16`.
pub fn ld_r16_imm16<B: Bus>(cpu: &mut Cpu, bus: &mut B, rr: R16) {
    match cpu.m_cycle {
        0 => {
            cpu.tmp = cpu.fetch_imm8(bus) as u16;
            cpu.m_cycle = 1;
        }
        1 => {
            let hi = cpu.fetch_imm8(bus);
            cpu.tmp |= (hi as u16) << 8;
            cpu.reg.set_r16(rr, cpu.tmp);
            cpu.m_cycle = 2;
        }
        2 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

/// `LD [r16mem], A`, applying `HL+`/`HL-` after the write.
pub fn ld_r16mem_a<B: Bus>(cpu: &mut Cpu, bus: &mut B, rr: R16Mem) {
    match cpu.m_cycle {
        0 => {
            let addr = cpu.reg.get_r16(rr.reg());
            bus.write(addr, cpu.reg.a());
            step_hl(cpu, rr);
            cpu.m_cycle = 1;
        }
        1 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

/// `LD A, [r16mem]`, applying `HL+`/`HL-` after the read.
pub fn ld_a_r16mem<B: Bus>(cpu: &mut Cpu, bus: &mut B, rr: R16Mem) {
    match cpu.m_cycle {
        0 => {
            let addr = cpu.reg.get_r16(rr.reg());
            let val = bus.read(addr);
            cpu.reg.set_a(val);
            step_hl(cpu, rr);
            cpu.m_cycle = 1;
        }
        1 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

fn step_hl(cpu: &mut Cpu, rr: R16Mem) {
    match rr {
        R16Mem::HLIncr => cpu.reg.set_hl(cpu.reg.hl().wrapping_add(1)),
        R16Mem::HLDecr => cpu.reg.set_hl(cpu.reg.hl().wrapping_sub(1)),
        R16Mem::BC | R16Mem::DE => {}
    }
}

/// `LD [a16], SP` — five M-cycles: two immediate reads, two stack-pointer
/// byte writes, then the prefetch.
pub fn ld_a16_sp<B: Bus>(cpu: &mut Cpu, bus: &mut B) {
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
            bus.write(cpu.tmp, (cpu.reg.sp() & 0xFF) as u8);
            cpu.m_cycle = 3;
        }
        3 => {
            bus.write(cpu.tmp.wrapping_add(1), (cpu.reg.sp() >> 8) as u8);
            cpu.m_cycle = 4;
        }
        4 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

/// `LD SP, HL` — one internal M-cycle beyond the fetch.
pub fn ld_sp_hl<B: Bus>(cpu: &mut Cpu, bus: &mut B) {
    match cpu.m_cycle {
        0 => {
            cpu.reg.set_sp(cpu.reg.hl());
            cpu.m_cycle = 1;
        }
        1 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

/// `LD HL, SP+e8`. Shares its flag formula with `ADD SP, e8` (spec §4.3.3):
/// `H`/`C` are computed on the low byte of `SP`, never on `HL`'s own bits.
/// Three M-cycles: the immediate fetch, an internal cycle doing the 16-bit
/// add and flag update, then the prefetch.
pub fn ld_hl_sp_e8<B: Bus>(cpu: &mut Cpu, bus: &mut B) {
    match cpu.m_cycle {
        0 => {
            cpu.tmp = cpu.fetch_imm8(bus) as u16;
            cpu.m_cycle = 1;
        }
        1 => {
            let offset = cpu.tmp as u8 as i8 as i32;
            let sp = cpu.reg.sp() as i32;
            cpu.reg.set_hl((sp + offset) as u16);

            let flags = cpu.reg.flags_mut();
            flags.remove(Flags::Z | Flags::N);
            flags.set(Flags::H, (sp & 0xF) + (offset & 0xF) > 0xF);
            flags.set(Flags::C, (sp & 0xFF) + (offset & 0xFF) > 0xFF);

            cpu.m_cycle = 2;
        }
        2 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

/// `LDH [a8], A` — reads the immediate offset, writes to `0xFF00+a8`, then
/// prefetches; three M-cycles total.
pub fn ldh_a8_a<B: Bus>(cpu: &mut Cpu, bus: &mut B) {
    match cpu.m_cycle {
        0 => {
            cpu.tmp = cpu.fetch_imm8(bus) as u16;
            cpu.m_cycle = 1;
        }
        1 => {
            bus.write(0xFF00 | cpu.tmp, cpu.reg.a());
            cpu.m_cycle = 2;
        }
        2 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

/// `LDH A, [a8]`.
pub fn ldh_a_a8<B: Bus>(cpu: &mut Cpu, bus: &mut B) {
    match cpu.m_cycle {
        0 => {
            cpu.tmp = cpu.fetch_imm8(bus) as u16;
            cpu.m_cycle = 1;
        }
        1 => {
            let val = bus.read(0xFF00 | cpu.tmp);
            cpu.reg.set_a(val);
            cpu.m_cycle = 2;
        }
        2 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

/// `LD [C], A` (`0xFF00+C` addressing, no immediate byte) — two M-cycles.
pub fn ldh_c_a<B: Bus>(cpu: &mut Cpu, bus: &mut B) {
    match cpu.m_cycle {
        0 => {
            let addr = 0xFF00 | cpu.reg.get_r8(R8::C) as u16;
            bus.write(addr, cpu.reg.a());
            cpu.m_cycle = 1;
        }
        1 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

/// `LD A, [C]`.
pub fn ldh_a_c<B: Bus>(cpu: &mut Cpu, bus: &mut B) {
    match cpu.m_cycle {
        0 => {
            let addr = 0xFF00 | cpu.reg.get_r8(R8::C) as u16;
            let val = bus.read(addr);
            cpu.reg.set_a(val);
            cpu.m_cycle = 1;
        }
        1 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

/// `LD [a16], A` — full 16-bit address, unlike `LDH`; four M-cycles.
pub fn ld_a16_a<B: Bus>(cpu: &mut Cpu, bus: &mut B) {
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
            bus.write(cpu.tmp, cpu.reg.a());
            cpu.m_cycle = 3;
        }
        3 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

/// `LD A, [a16]`.
pub fn ld_a_a16<B: Bus>(cpu: &mut Cpu, bus: &mut B) {
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
            let val = bus.read(cpu.tmp);
            cpu.reg.set_a(val);
            cpu.m_cycle = 3;
        }
        3 => cpu.finish(bus),
        _ => unreachable!(),
    }
}
