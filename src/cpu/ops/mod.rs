//! Per-instruction-family micro-sequences, and the `x,y,z,p,q`-keyed
//! dispatch table that routes a latched opcode to one of them.
//!
//! None of the family functions below run an instruction to completion in
//! a single call — each runs only the slice of work that belongs to the
//! *current* `m_cycle`, since [`crate::cpu::Cpu::step`] only ever asks for
//! one M-cycle at a time. They reach into [`crate::cpu::Cpu`]'s private
//! cursor fields (`m_cycle`, `tmp`, `cb_sub`) directly; the arithmetic
//! itself is grounded in the teacher's whole-register formulas, just
//! replayed at whichever M-cycle the operand's addressing mode makes it
//! available.

pub mod arith;
pub mod branch;
pub mod cb;
pub mod control;
pub mod load;
pub mod stack;

use crate::bus::Bus;
use crate::cpu::decode::{self, x, y, z, p, q};
use crate::cpu::Cpu;
use arith::AluOp;

/// Routes the CPU's currently latched `opcode` to its micro-sequence.
/// Called once per M-cycle, same as every function it dispatches to.
pub fn dispatch<B: Bus>(cpu: &mut Cpu, bus: &mut B) {
    let op = cpu.opcode;

    if op == 0xCB {
        return cb::dispatch(cpu, bus);
    }

    if crate::cpu::is_invalid_opcode(op) {
        cpu.enter_stuck();
        return;
    }

    match x(op) {
        0 => dispatch_x0(cpu, bus, op),
        1 => dispatch_x1(cpu, bus, op),
        2 => dispatch_x2(cpu, bus, op),
        3 => dispatch_x3(cpu, bus, op),
        _ => unreachable!(),
    }
}

fn dispatch_x0<B: Bus>(cpu: &mut Cpu, bus: &mut B, op: u8) {
    match z(op) {
        0 => match y(op) {
            0 => control::nop(cpu, bus),
            1 => load::ld_a16_sp(cpu, bus),
            2 => control::stop(cpu, bus),
            3 => branch::jr(cpu, bus),
            yy => branch::jr_cond(cpu, bus, decode::cond(yy - 4)),
        },
        1 => {
            if q(op) == 0 {
                load::ld_r16_imm16(cpu, bus, decode::r16(p(op)))
            } else {
                arith::add_hl_r16(cpu, bus, decode::r16(p(op)))
            }
        }
        2 => {
            if q(op) == 0 {
                load::ld_r16mem_a(cpu, bus, decode::r16mem(p(op)))
            } else {
                load::ld_a_r16mem(cpu, bus, decode::r16mem(p(op)))
            }
        }
        3 => {
            if q(op) == 0 {
                arith::inc_r16(cpu, bus, decode::r16(p(op)))
            } else {
                arith::dec_r16(cpu, bus, decode::r16(p(op)))
            }
        }
        4 => arith::inc_r8(cpu, bus, decode::r8(y(op))),
        5 => arith::dec_r8(cpu, bus, decode::r8(y(op))),
        6 => load::ld_r8_imm8(cpu, bus, decode::r8(y(op))),
        7 => match y(op) {
            0 => arith::rlca(cpu, bus),
            1 => arith::rrca(cpu, bus),
            2 => arith::rla(cpu, bus),
            3 => arith::rra(cpu, bus),
            4 => arith::daa(cpu, bus),
            5 => arith::cpl(cpu, bus),
            6 => arith::scf(cpu, bus),
            7 => arith::ccf(cpu, bus),
            _ => unreachable!(),
        },
        _ => unreachable!(),
    }
}

fn dispatch_x1<B: Bus>(cpu: &mut Cpu, bus: &mut B, op: u8) {
    let dst = decode::r8(y(op));
    let src = decode::r8(z(op));
    if dst == crate::cpu::Operand8::Indirect && src == crate::cpu::Operand8::Indirect {
        control::halt(cpu, bus);
    } else {
        load::ld_r8_r8(cpu, bus, dst, src);
    }
}

fn alu_op(y: u8) -> AluOp {
    match y {
        0 => AluOp::Add,
        1 => AluOp::Adc,
        2 => AluOp::Sub,
        3 => AluOp::Sbc,
        4 => AluOp::And,
        5 => AluOp::Xor,
        6 => AluOp::Or,
        7 => AluOp::Cp,
        _ => unreachable!("alu y out of range: {}", y),
    }
}

fn dispatch_x2<B: Bus>(cpu: &mut Cpu, bus: &mut B, op: u8) {
    arith::alu_r8(cpu, bus, alu_op(y(op)), decode::r8(z(op)));
}

fn dispatch_x3<B: Bus>(cpu: &mut Cpu, bus: &mut B, op: u8) {
    match z(op) {
        0 => match y(op) {
            0..=3 => branch::ret_cond(cpu, bus, decode::cond(y(op))),
            4 => load::ldh_a8_a(cpu, bus),
            5 => arith::add_sp_e8(cpu, bus),
            6 => load::ldh_a_a8(cpu, bus),
            7 => load::ld_hl_sp_e8(cpu, bus),
            _ => unreachable!(),
        },
        1 => {
            if q(op) == 0 {
                stack::pop(cpu, bus, decode::r16stk(p(op)))
            } else {
                match p(op) {
                    0 => branch::ret(cpu, bus),
                    1 => branch::reti(cpu, bus),
                    2 => branch::jp_hl(cpu, bus),
                    3 => load::ld_sp_hl(cpu, bus),
                    _ => unreachable!(),
                }
            }
        }
        2 => match y(op) {
            0..=3 => branch::jp_cond(cpu, bus, decode::cond(y(op))),
            4 => load::ldh_c_a(cpu, bus),
            5 => load::ld_a16_a(cpu, bus),
            6 => load::ldh_a_c(cpu, bus),
            7 => load::ld_a_a16(cpu, bus),
            _ => unreachable!(),
        },
        3 => match y(op) {
            0 => branch::jp(cpu, bus),
            // y=1 is the 0xCB prefix, handled before we ever get here.
            6 => control::di(cpu, bus),
            7 => control::ei(cpu, bus),
            _ => unreachable!("opcode {:#04x} should have been caught as invalid", op),
        },
        4 => match y(op) {
            0..=3 => branch::call_cond(cpu, bus, decode::cond(y(op))),
            _ => unreachable!("opcode {:#04x} should have been caught as invalid", op),
        },
        5 => {
            if q(op) == 0 {
                stack::push(cpu, bus, decode::r16stk(p(op)))
            } else if p(op) == 0 {
                branch::call(cpu, bus)
            } else {
                unreachable!("opcode {:#04x} should have been caught as invalid", op)
            }
        }
        6 => arith::alu_imm8(cpu, bus, alu_op(y(op))),
        7 => branch::rst(cpu, bus, (y(op) as u16) * 8),
        _ => unreachable!(),
    }
}
