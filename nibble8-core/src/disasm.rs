//! Instruction disassembler
//!
//! Turns instruction words back into assembly text, one mnemonic per
//! instruction form. Registers print as `V0`..`VF`, immediates and addresses
//! as `$`-prefixed hex.

use crate::PROGRAM_START;

/// Suffix marking a word that is not a known instruction
pub const UNRECOGNIZED: &str = "(!)";

/// Formats the instruction made of `high` and `low`
///
/// Words that don't decode to an instruction render as `$HHLL (!)`; this
/// never fails.
pub fn mnemonic(high: u8, low: u8) -> String {
    let x = high & 0x0F;
    let y = low >> 4;
    let n = low & 0x0F;
    let address = (x as u16) << 8 | low as u16;

    match [high >> 4, x, y, n] {
        [0x0, 0x0, 0xE, 0x0] => "CLS".into(),
        [0x0, 0x0, 0xE, 0xE] => "RET".into(),
        [0x1, ..] => format!("JP ${address:03X}"),
        [0x2, ..] => format!("CALL ${address:03X}"),
        [0x3, ..] => format!("SE V{x:X}, ${low:02X}"),
        [0x4, ..] => format!("SNE V{x:X}, ${low:02X}"),
        [0x5, ..] => format!("SE V{x:X}, V{y:X}"),
        [0x6, ..] => format!("LD V{x:X}, ${low:02X}"),
        [0x7, ..] => format!("ADD V{x:X}, ${low:02X}"),
        [0x8, _, _, 0x0] => format!("LD V{x:X}, V{y:X}"),
        [0x8, _, _, 0x1] => format!("OR V{x:X}, V{y:X}"),
        [0x8, _, _, 0x2] => format!("AND V{x:X}, V{y:X}"),
        [0x8, _, _, 0x3] => format!("XOR V{x:X}, V{y:X}"),
        [0x8, _, _, 0x4] => format!("ADD V{x:X}, V{y:X}"),
        [0x8, _, _, 0x5] => format!("SUB V{x:X}, V{y:X}"),
        [0x8, _, _, 0x6] => format!("SHR V{x:X}, V{y:X}"),
        [0x8, _, _, 0x7] => format!("SUBN V{x:X}, V{y:X}"),
        [0x8, _, _, 0xE] => format!("SHL V{x:X}, V{y:X}"),
        [0x9, ..] => format!("SNE V{x:X}, V{y:X}"),
        [0xA, ..] => format!("LD I, ${address:03X}"),
        [0xB, ..] => format!("JP V0, ${address:03X}"),
        [0xC, ..] => format!("RND V{x:X}, ${low:02X}"),
        [0xD, ..] => format!("DRW V{x:X}, V{y:X}, {n:X}"),
        [0xE, _, 0x9, 0xE] => format!("SKP V{x:X}"),
        [0xE, _, 0xA, 0x1] => format!("SKNP V{x:X}"),
        [0xF, _, 0x0, 0x7] => format!("LD V{x:X}, DT"),
        [0xF, _, 0x0, 0xA] => format!("LD V{x:X}, K"),
        [0xF, _, 0x1, 0x5] => format!("LD DT, V{x:X}"),
        [0xF, _, 0x1, 0x8] => format!("LD ST, V{x:X}"),
        [0xF, _, 0x1, 0xE] => format!("ADD I, V{x:X}"),
        [0xF, _, 0x2, 0x9] => format!("LD F, V{x:X}"),
        [0xF, _, 0x3, 0x3] => format!("LD B, V{x:X}"),
        [0xF, _, 0x5, 0x5] => format!("LD [I], V{x:X}"),
        [0xF, _, 0x6, 0x5] => format!("LD V{x:X}, [I]"),
        _ => format!("${high:02X}{low:02X} {UNRECOGNIZED}"),
    }
}

/// Lists every word of `program` with the address it loads at
///
/// A trailing odd byte is shown as if followed by a zero byte.
pub fn disassemble(program: &[u8]) -> impl Iterator<Item = (u16, String)> + '_ {
    program.chunks(2).enumerate().map(|(i, word)| {
        let address = PROGRAM_START + 2 * i as u16;
        let low = word.get(1).copied().unwrap_or(0);
        (address, mnemonic(word[0], low))
    })
}
