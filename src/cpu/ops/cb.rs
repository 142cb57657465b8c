//! `0xCB`-prefixed instructions (spec §4.3.4, §9): rotate/shift, `BIT`,
//! `RES`, `SET`, all sharing the same `x,y,z` decomposition as the
//! unprefixed table, just read from the second opcode byte instead of the
//! first. That second byte (`cb_sub`) gets its own dedicated M-cycle —
//! it's a real bus read, on top of whatever the addressed operand costs.

use crate::bus::Bus;
use crate::cpu::decode;
use crate::cpu::{Cpu, Operand8};
use crate::registers::Flags;

fn rotate_or_shift(y: u8, val: u8, carry_in: bool) -> (u8, bool) {
    match y {
        0 => (val.rotate_left(1), val & 0x80 != 0),
        1 => (val.rotate_right(1), val & 0x01 != 0),
        2 => ((val << 1) | carry_in as u8, val & 0x80 != 0),
        3 => ((val >> 1) | ((carry_in as u8) << 7), val & 0x01 != 0),
        4 => (val << 1, val & 0x80 != 0),
        5 => ((val >> 1) | (val & 0x80), val & 0x01 != 0),
        6 => ((val >> 4) | (val << 4), false),
        7 => (val >> 1, val & 0x01 != 0),
        _ => unreachable!("cb y out of range: {}", y),
    }
}

fn apply_shift(cpu: &mut Cpu, y: u8, val: u8) -> u8 {
    let carry_in = cpu.reg.flags().contains(Flags::C);
    let (new, carry) = rotate_or_shift(y, val, carry_in);

    let flags = cpu.reg.flags_mut();
    flags.set(Flags::Z, new == 0);
    flags.remove(Flags::N | Flags::H);
    flags.set(Flags::C, carry);

    new
}

fn set_bit_flags(cpu: &mut Cpu, bit: u8, val: u8) {
    let flags = cpu.reg.flags_mut();
    flags.set(Flags::Z, val & (1 << bit) == 0);
    flags.remove(Flags::N);
    flags.insert(Flags::H);
}

fn res_bit(val: u8, bit: u8) -> u8 {
    val & !(1 << bit)
}

fn set_bit(val: u8, bit: u8) -> u8 {
    val | (1 << bit)
}

/// Entry point for `opcode == 0xCB`. `m_cycle == 0` is always the fetch of
/// the sub-opcode; everything after that is keyed on the decoded `x,y,z`
/// fields of `cb_sub`.
pub fn dispatch<B: Bus>(cpu: &mut Cpu, bus: &mut B) {
    if cpu.m_cycle == 0 {
        cpu.cb_sub = cpu.fetch_imm8(bus);
        cpu.m_cycle = 1;
        return;
    }

    let op = cpu.cb_sub;
    let xx = decode::x(op);
    let yy = decode::y(op);
    let zz = decode::z(op);
    let operand = decode::r8(zz);

    if operand != Operand8::Indirect {
        // Register operand: the one execution cycle does the read, the
        // modification, and the write-back, all free; the finish is this
        // opcode's only bus access.
        let val = cpu.read_operand8(bus, operand);
        match xx {
            0 => {
                let new = apply_shift(cpu, yy, val);
                cpu.write_operand8(bus, operand, new);
            }
            1 => set_bit_flags(cpu, yy, val),
            2 => cpu.write_operand8(bus, operand, res_bit(val, yy)),
            3 => cpu.write_operand8(bus, operand, set_bit(val, yy)),
            _ => unreachable!(),
        }
        cpu.finish(bus);
        return;
    }

    // `[HL]` operand. `BIT b,[HL]` never writes back, so it's one M-cycle
    // shorter than the other three families.
    if xx == 1 {
        match cpu.m_cycle {
            1 => {
                let val = bus.read(cpu.reg.hl());
                set_bit_flags(cpu, yy, val);
                cpu.m_cycle = 2;
            }
            2 => cpu.finish(bus),
            _ => unreachable!(),
        }
        return;
    }

    match cpu.m_cycle {
        1 => {
            cpu.tmp = bus.read(cpu.reg.hl()) as u16;
            cpu.m_cycle = 2;
        }
        2 => {
            let val = cpu.tmp as u8;
            let new = match xx {
                0 => apply_shift(cpu, yy, val),
                2 => res_bit(val, yy),
                3 => set_bit(val, yy),
                _ => unreachable!(),
            };
            bus.write(cpu.reg.hl(), new);
            cpu.m_cycle = 3;
        }
        3 => cpu.finish(bus),
        _ => unreachable!(),
    }
}
