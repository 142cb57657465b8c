//! 8-bit ALU, 8/16-bit `INC`/`DEC`, 16-bit `ADD HL,r16`/`ADD SP,e8`, the
//! rotate-A family, `CPL`/`SCF`/`CCF`, and `DAA` (spec §4.3.3, §4.3.4).
//!
//! `DAA` here is the pandocs single-shot-correction algorithm rather than
//! the source's sequential mutate-and-recheck version — spec §9 licenses
//! the divergence explicitly where the two disagree on intermediate state.

use crate::bus::Bus;
use crate::cpu::{Cpu, Operand8};
use crate::registers::{Flags, R16};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

fn apply_alu(cpu: &mut Cpu, op: AluOp, rhs: u8) {
    let a = cpu.reg.a();

    match op {
        AluOp::Add | AluOp::Adc => {
            let carry_in = (op == AluOp::Adc && cpu.reg.flags().contains(Flags::C)) as u8;
            let (partial, c1) = a.overflowing_add(rhs);
            let (sum, c2) = partial.overflowing_add(carry_in);
            let half = (a & 0xF) + (rhs & 0xF) + carry_in > 0xF;

            cpu.reg.set_a(sum);
            let flags = cpu.reg.flags_mut();
            flags.set(Flags::Z, sum == 0);
            flags.remove(Flags::N);
            flags.set(Flags::H, half);
            flags.set(Flags::C, c1 || c2);
        }
        AluOp::Sub | AluOp::Sbc | AluOp::Cp => {
            let carry_in = (op == AluOp::Sbc && cpu.reg.flags().contains(Flags::C)) as u8;
            let (partial, b1) = a.overflowing_sub(rhs);
            let (diff, b2) = partial.overflowing_sub(carry_in);
            let half = (a & 0xF) < (rhs & 0xF) + carry_in;

            if op != AluOp::Cp {
                cpu.reg.set_a(diff);
            }
            let flags = cpu.reg.flags_mut();
            flags.set(Flags::Z, diff == 0);
            flags.insert(Flags::N);
            flags.set(Flags::H, half);
            flags.set(Flags::C, b1 || b2);
        }
        AluOp::And => {
            let new = a & rhs;
            cpu.reg.set_a(new);
            let flags = cpu.reg.flags_mut();
            flags.set(Flags::Z, new == 0);
            flags.remove(Flags::N | Flags::C);
            flags.insert(Flags::H);
        }
        AluOp::Xor => {
            let new = a ^ rhs;
            cpu.reg.set_a(new);
            let flags = cpu.reg.flags_mut();
            flags.set(Flags::Z, new == 0);
            flags.remove(Flags::N | Flags::H | Flags::C);
        }
        AluOp::Or => {
            let new = a | rhs;
            cpu.reg.set_a(new);
            let flags = cpu.reg.flags_mut();
            flags.set(Flags::Z, new == 0);
            flags.remove(Flags::N | Flags::H | Flags::C);
        }
    }
}

/// `<alu> A, r8` / `<alu> A, [HL]` — one M-cycle for a plain register, two
/// if the right-hand side is `[HL]`.
pub fn alu_r8<B: Bus>(cpu: &mut Cpu, bus: &mut B, op: AluOp, operand: Operand8) {
    if operand != Operand8::Indirect {
        let rhs = cpu.read_operand8(bus, operand);
        apply_alu(cpu, op, rhs);
        cpu.finish(bus);
        return;
    }

    match cpu.m_cycle {
        0 => {
            let rhs = cpu.read_operand8(bus, operand);
            apply_alu(cpu, op, rhs);
            cpu.m_cycle = 1;
        }
        1 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

/// `<alu> A, n8`.
pub fn alu_imm8<B: Bus>(cpu: &mut Cpu, bus: &mut B, op: AluOp) {
    match cpu.m_cycle {
        0 => {
            let rhs = cpu.fetch_imm8(bus);
            apply_alu(cpu, op, rhs);
            cpu.m_cycle = 1;
        }
        1 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

fn set_inc_flags(cpu: &mut Cpu, old: u8, new: u8) {
    let flags = cpu.reg.flags_mut();
    flags.set(Flags::Z, new == 0);
    flags.remove(Flags::N);
    flags.set(Flags::H, (old & 0x0F) == 0x0F);
}

fn set_dec_flags(cpu: &mut Cpu, new: u8) {
    let flags = cpu.reg.flags_mut();
    flags.set(Flags::Z, new == 0);
    flags.insert(Flags::N);
    flags.set(Flags::H, (new & 0x0F) == 0x0F);
}

/// `INC r8` / `INC [HL]` — one M-cycle for a register, three for `[HL]`
/// (read, modify-and-write, finish).
pub fn inc_r8<B: Bus>(cpu: &mut Cpu, bus: &mut B, operand: Operand8) {
    if operand != Operand8::Indirect {
        let old = cpu.read_operand8(bus, operand);
        let new = old.wrapping_add(1);
        cpu.write_operand8(bus, operand, new);
        set_inc_flags(cpu, old, new);
        cpu.finish(bus);
        return;
    }

    match cpu.m_cycle {
        0 => {
            cpu.tmp = cpu.read_operand8(bus, operand) as u16;
            cpu.m_cycle = 1;
        }
        1 => {
            let old = cpu.tmp as u8;
            let new = old.wrapping_add(1);
            cpu.write_operand8(bus, operand, new);
            set_inc_flags(cpu, old, new);
            cpu.m_cycle = 2;
        }
        2 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

/// `DEC r8` / `DEC [HL]`.
pub fn dec_r8<B: Bus>(cpu: &mut Cpu, bus: &mut B, operand: Operand8) {
    if operand != Operand8::Indirect {
        let old = cpu.read_operand8(bus, operand);
        let new = old.wrapping_sub(1);
        cpu.write_operand8(bus, operand, new);
        set_dec_flags(cpu, new);
        cpu.finish(bus);
        return;
    }

    match cpu.m_cycle {
        0 => {
            cpu.tmp = cpu.read_operand8(bus, operand) as u16;
            cpu.m_cycle = 1;
        }
        1 => {
            let old = cpu.tmp as u8;
            let new = old.wrapping_sub(1);
            cpu.write_operand8(bus, operand, new);
            set_dec_flags(cpu, new);
            cpu.m_cycle = 2;
        }
        2 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

/// `INC r16` — no flags, two M-cycles (the 16-bit add is internal).
pub fn inc_r16<B: Bus>(cpu: &mut Cpu, bus: &mut B, rr: R16) {
    match cpu.m_cycle {
        0 => {
            cpu.reg.set_r16(rr, cpu.reg.get_r16(rr).wrapping_add(1));
            cpu.m_cycle = 1;
        }
        1 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

/// `DEC r16`.
pub fn dec_r16<B: Bus>(cpu: &mut Cpu, bus: &mut B, rr: R16) {
    match cpu.m_cycle {
        0 => {
            cpu.reg.set_r16(rr, cpu.reg.get_r16(rr).wrapping_sub(1));
            cpu.m_cycle = 1;
        }
        1 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

/// `ADD HL, r16`.
pub fn add_hl_r16<B: Bus>(cpu: &mut Cpu, bus: &mut B, rr: R16) {
    match cpu.m_cycle {
        0 => {
            let old = cpu.reg.hl();
            let addend = cpu.reg.get_r16(rr);
            let (new, carry) = old.overflowing_add(addend);
            cpu.reg.set_hl(new);

            let flags = cpu.reg.flags_mut();
            flags.remove(Flags::N);
            flags.set(Flags::H, (old & 0x0FFF) + (addend & 0x0FFF) > 0x0FFF);
            flags.set(Flags::C, carry);

            cpu.m_cycle = 1;
        }
        1 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

/// `ADD SP, e8` — shares its flag formula with `LD HL,SP+e8` but spends one
/// more internal M-cycle, since the result lands back in `SP` itself
/// (four M-cycles total: fetch, add, an extra internal cycle, finish).
pub fn add_sp_e8<B: Bus>(cpu: &mut Cpu, bus: &mut B) {
    match cpu.m_cycle {
        0 => {
            cpu.tmp = cpu.fetch_imm8(bus) as u16;
            cpu.m_cycle = 1;
        }
        1 => {
            let offset = cpu.tmp as u8 as i8 as i32;
            let sp = cpu.reg.sp() as i32;
            cpu.reg.set_sp((sp + offset) as u16);

            let flags = cpu.reg.flags_mut();
            flags.remove(Flags::Z | Flags::N);
            flags.set(Flags::H, (sp & 0xF) + (offset & 0xF) > 0xF);
            flags.set(Flags::C, (sp & 0xFF) + (offset & 0xFF) > 0xFF);

            cpu.m_cycle = 2;
        }
        2 => cpu.m_cycle = 3,
        3 => cpu.finish(bus),
        _ => unreachable!(),
    }
}

pub fn rlca<B: Bus>(cpu: &mut Cpu, bus: &mut B) {
    let old = cpu.reg.a();
    cpu.reg.set_a(old.rotate_left(1));

    let flags = cpu.reg.flags_mut();
    flags.remove(Flags::Z | Flags::N | Flags::H);
    flags.set(Flags::C, old & 0x80 != 0);

    cpu.finish(bus);
}

pub fn rrca<B: Bus>(cpu: &mut Cpu, bus: &mut B) {
    let old = cpu.reg.a();
    cpu.reg.set_a(old.rotate_right(1));

    let flags = cpu.reg.flags_mut();
    flags.remove(Flags::Z | Flags::N | Flags::H);
    flags.set(Flags::C, old & 0x01 != 0);

    cpu.finish(bus);
}

pub fn rla<B: Bus>(cpu: &mut Cpu, bus: &mut B) {
    let old = cpu.reg.a();
    let carry_in = cpu.reg.flags().contains(Flags::C) as u8;
    cpu.reg.set_a((old << 1) | carry_in);

    let flags = cpu.reg.flags_mut();
    flags.remove(Flags::Z | Flags::N | Flags::H);
    flags.set(Flags::C, old & 0x80 != 0);

    cpu.finish(bus);
}

pub fn rra<B: Bus>(cpu: &mut Cpu, bus: &mut B) {
    let old = cpu.reg.a();
    let carry_in = cpu.reg.flags().contains(Flags::C) as u8;
    cpu.reg.set_a((old >> 1) | (carry_in << 7));

    let flags = cpu.reg.flags_mut();
    flags.remove(Flags::Z | Flags::N | Flags::H);
    flags.set(Flags::C, old & 0x01 != 0);

    cpu.finish(bus);
}

pub fn cpl<B: Bus>(cpu: &mut Cpu, bus: &mut B) {
    cpu.reg.set_a(!cpu.reg.a());
    cpu.reg.flags_mut().insert(Flags::N | Flags::H);
    cpu.finish(bus);
}

pub fn scf<B: Bus>(cpu: &mut Cpu, bus: &mut B) {
    let flags = cpu.reg.flags_mut();
    flags.remove(Flags::N | Flags::H);
    flags.insert(Flags::C);
    cpu.finish(bus);
}

pub fn ccf<B: Bus>(cpu: &mut Cpu, bus: &mut B) {
    let flags = cpu.reg.flags_mut();
    flags.remove(Flags::N | Flags::H);
    flags.toggle(Flags::C);
    cpu.finish(bus);
}

/// `DAA`: corrects `A` into packed BCD after an 8-bit add/subtract, using
/// the original (pre-correction) `A`/flags to compute a single combined
/// correction rather than mutating `A` twice (spec §4.3.3, §9).
pub fn daa<B: Bus>(cpu: &mut Cpu, bus: &mut B) {
    let a = cpu.reg.a();
    let flags = cpu.reg.flags();
    let n = flags.contains(Flags::N);
    let h = flags.contains(Flags::H);
    let c = flags.contains(Flags::C);

    let mut correction = 0u8;
    let mut carry = c;

    if h || (!n && (a & 0xF) > 0x9) {
        correction |= 0x06;
    }
    if c || (!n && a > 0x99) {
        correction |= 0x60;
        carry = true;
    }

    let new = if n { a.wrapping_sub(correction) } else { a.wrapping_add(correction) };
    cpu.reg.set_a(new);

    let flags = cpu.reg.flags_mut();
    flags.set(Flags::Z, new == 0);
    flags.remove(Flags::H);
    flags.set(Flags::C, carry);

    cpu.finish(bus);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullBus;
    impl Bus for NullBus {
        fn read(&mut self, _addr: u16) -> u8 {
            0
        }
        fn write(&mut self, _addr: u16, _val: u8) {}
        fn any_interrupt_pending(&self) -> bool {
            false
        }
        fn pending_interrupt(&self) -> Option<crate::interrupt::Interrupt> {
            None
        }
        fn ack_interrupt(&mut self, _interrupt: crate::interrupt::Interrupt) {}
    }

    fn cpu_with_a(a: u8, flags: Flags) -> Cpu {
        let mut cpu = Cpu::new();
        cpu.reg.set_a(a);
        *cpu.reg.flags_mut() = flags;
        cpu
    }

    #[test]
    fn daa_after_addition_without_carry_out() {
        let mut cpu = cpu_with_a(0x45, Flags::empty());
        let mut bus = NullBus;
        apply_alu(&mut cpu, AluOp::Add, 0x38);
        assert_eq!(cpu.reg.a(), 0x7D);

        daa(&mut cpu, &mut bus);
        assert_eq!(cpu.reg.a(), 0x83);
        assert!(!cpu.reg.flags().contains(Flags::Z));
        assert!(!cpu.reg.flags().contains(Flags::H));
        assert!(!cpu.reg.flags().contains(Flags::C));
    }

    #[test]
    fn daa_after_addition_with_carry_out() {
        let mut cpu = cpu_with_a(0x99, Flags::empty());
        let mut bus = NullBus;
        apply_alu(&mut cpu, AluOp::Add, 0x01);
        assert_eq!(cpu.reg.a(), 0x9A);
        daa(&mut cpu, &mut bus);
        assert_eq!(cpu.reg.a(), 0x00);
        assert!(cpu.reg.flags().contains(Flags::Z));
        assert!(cpu.reg.flags().contains(Flags::C));
    }

    #[test]
    fn sub_sets_half_carry_on_low_nibble_borrow() {
        let mut cpu = cpu_with_a(0x10, Flags::empty());
        apply_alu(&mut cpu, AluOp::Sub, 0x01);
        assert_eq!(cpu.reg.a(), 0x0F);
        assert!(cpu.reg.flags().contains(Flags::H));
        assert!(cpu.reg.flags().contains(Flags::N));
        assert!(!cpu.reg.flags().contains(Flags::C));
    }

    #[test]
    fn cp_leaves_a_unchanged() {
        let mut cpu = cpu_with_a(0x05, Flags::empty());
        apply_alu(&mut cpu, AluOp::Cp, 0x05);
        assert_eq!(cpu.reg.a(), 0x05);
        assert!(cpu.reg.flags().contains(Flags::Z));
    }
}
