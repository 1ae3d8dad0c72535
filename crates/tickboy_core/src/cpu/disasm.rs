//! Mnemonic tables for trace logging and diagnostics.

use lazy_static::lazy_static;

#[rustfmt::skip]
const PRIMARY: [&str; 256] = [
    // 0x00
    "NOP", "LD BC,d16", "LD (BC),A", "INC BC", "INC B", "DEC B", "LD B,d8", "RLCA",
    "LD (a16),SP", "ADD HL,BC", "LD A,(BC)", "DEC BC", "INC C", "DEC C", "LD C,d8", "RRCA",
    // 0x10
    "STOP", "LD DE,d16", "LD (DE),A", "INC DE", "INC D", "DEC D", "LD D,d8", "RLA",
    "JR e8", "ADD HL,DE", "LD A,(DE)", "DEC DE", "INC E", "DEC E", "LD E,d8", "RRA",
    // 0x20
    "JR NZ,e8", "LD HL,d16", "LD (HL+),A", "INC HL", "INC H", "DEC H", "LD H,d8", "DAA",
    "JR Z,e8", "ADD HL,HL", "LD A,(HL+)", "DEC HL", "INC L", "DEC L", "LD L,d8", "CPL",
    // 0x30
    "JR NC,e8", "LD SP,d16", "LD (HL-),A", "INC SP", "INC (HL)", "DEC (HL)", "LD (HL),d8", "SCF",
    "JR C,e8", "ADD HL,SP", "LD A,(HL-)", "DEC SP", "INC A", "DEC A", "LD A,d8", "CCF",
    // 0x40
    "LD B,B", "LD B,C", "LD B,D", "LD B,E", "LD B,H", "LD B,L", "LD B,(HL)", "LD B,A",
    "LD C,B", "LD C,C", "LD C,D", "LD C,E", "LD C,H", "LD C,L", "LD C,(HL)", "LD C,A",
    // 0x50
    "LD D,B", "LD D,C", "LD D,D", "LD D,E", "LD D,H", "LD D,L", "LD D,(HL)", "LD D,A",
    "LD E,B", "LD E,C", "LD E,D", "LD E,E", "LD E,H", "LD E,L", "LD E,(HL)", "LD E,A",
    // 0x60
    "LD H,B", "LD H,C", "LD H,D", "LD H,E", "LD H,H", "LD H,L", "LD H,(HL)", "LD H,A",
    "LD L,B", "LD L,C", "LD L,D", "LD L,E", "LD L,H", "LD L,L", "LD L,(HL)", "LD L,A",
    // 0x70
    "LD (HL),B", "LD (HL),C", "LD (HL),D", "LD (HL),E", "LD (HL),H", "LD (HL),L", "HALT", "LD (HL),A",
    "LD A,B", "LD A,C", "LD A,D", "LD A,E", "LD A,H", "LD A,L", "LD A,(HL)", "LD A,A",
    // 0x80
    "ADD A,B", "ADD A,C", "ADD A,D", "ADD A,E", "ADD A,H", "ADD A,L", "ADD A,(HL)", "ADD A,A",
    "ADC A,B", "ADC A,C", "ADC A,D", "ADC A,E", "ADC A,H", "ADC A,L", "ADC A,(HL)", "ADC A,A",
    // 0x90
    "SUB B", "SUB C", "SUB D", "SUB E", "SUB H", "SUB L", "SUB (HL)", "SUB A",
    "SBC A,B", "SBC A,C", "SBC A,D", "SBC A,E", "SBC A,H", "SBC A,L", "SBC A,(HL)", "SBC A,A",
    // 0xA0
    "AND B", "AND C", "AND D", "AND E", "AND H", "AND L", "AND (HL)", "AND A",
    "XOR B", "XOR C", "XOR D", "XOR E", "XOR H", "XOR L", "XOR (HL)", "XOR A",
    // 0xB0
    "OR B", "OR C", "OR D", "OR E", "OR H", "OR L", "OR (HL)", "OR A",
    "CP B", "CP C", "CP D", "CP E", "CP H", "CP L", "CP (HL)", "CP A",
    // 0xC0
    "RET NZ", "POP BC", "JP NZ,a16", "JP a16", "CALL NZ,a16", "PUSH BC", "ADD A,d8", "RST 00h",
    "RET Z", "RET", "JP Z,a16", "PREFIX CB", "CALL Z,a16", "CALL a16", "ADC A,d8", "RST 08h",
    // 0xD0
    "RET NC", "POP DE", "JP NC,a16", "ILLEGAL_D3", "CALL NC,a16", "PUSH DE", "SUB d8", "RST 10h",
    "RET C", "RETI", "JP C,a16", "ILLEGAL_DB", "CALL C,a16", "ILLEGAL_DD", "SBC A,d8", "RST 18h",
    // 0xE0
    "LDH (a8),A", "POP HL", "LD (C),A", "ILLEGAL_E3", "ILLEGAL_E4", "PUSH HL", "AND d8", "RST 20h",
    "ADD SP,e8", "JP HL", "LD (a16),A", "ILLEGAL_EB", "ILLEGAL_EC", "ILLEGAL_ED", "XOR d8", "RST 28h",
    // 0xF0
    "LDH A,(a8)", "POP AF", "LD A,(C)", "DI", "ILLEGAL_F4", "PUSH AF", "OR d8", "RST 30h",
    "LD HL,SP+e8", "LD SP,HL", "LD A,(a16)", "EI", "ILLEGAL_FC", "ILLEGAL_FD", "CP d8", "RST 38h",
];

const REGISTER_NAMES: [&str; 8] = ["B", "C", "D", "E", "H", "L", "(HL)", "A"];
const SHIFT_NAMES: [&str; 8] = ["RLC", "RRC", "RL", "RR", "SLA", "SRA", "SWAP", "SRL"];

lazy_static! {
    static ref EXTENDED: Vec<String> = (0..=255u8)
        .map(|cb| {
            let y = usize::from((cb >> 3) & 0x07);
            let reg = REGISTER_NAMES[usize::from(cb & 0x07)];
            match cb >> 6 {
                0 => format!("{} {reg}", SHIFT_NAMES[y]),
                1 => format!("BIT {y},{reg}"),
                2 => format!("RES {y},{reg}"),
                _ => format!("SET {y},{reg}"),
            }
        })
        .collect();
}

/// Mnemonic of a primary opcode.
pub fn mnemonic(opcode: u8) -> &'static str {
    PRIMARY[usize::from(opcode)]
}

/// Mnemonic of a CB-prefixed opcode.
pub fn extended_mnemonic(opcode: u8) -> &'static str {
    EXTENDED[usize::from(opcode)].as_str()
}

/// Whether the primary opcode is one of the hardware opcode holes.
pub fn is_illegal(opcode: u8) -> bool {
    matches!(
        opcode,
        0xD3 | 0xDB | 0xDD | 0xE3 | 0xE4 | 0xEB | 0xEC | 0xED | 0xF4 | 0xFC | 0xFD
    )
}
