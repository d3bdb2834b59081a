//! Instruction decoder: renders binary words back to assembly text that the
//! assembler accepts unchanged.

use std::fmt::Write as _;

use indexmap::IndexMap;

use crate::{
    tables::{self, Opcode, OpcodeKind, ParamKind},
    Settings,
};

pub struct Disassembler {
    settings: Settings,
    names: IndexMap<u16, String>,
}

impl Disassembler {
    /// Starts with the hardware device addresses already named.
    pub fn new(settings: Settings) -> Self {
        let mut names = IndexMap::new();
        for &(addr, name) in tables::PDLABELS {
            names.insert(addr, name.to_owned());
        }
        Self { settings, names }
    }

    /// Adds or replaces a named address for the name-decoding renderings.
    pub fn add_name(&mut self, addr: u16, name: impl Into<String>) {
        self.names.insert(addr, name.into());
    }

    fn name_for(&self, addr: u16) -> Option<&str> {
        self.names.get(&addr).map(String::as_str)
    }

    /// Decodes one instruction at `*pc` (wrapped to 15 bits) into `dest` and
    /// advances `*pc` past it. Returns false when the word could not be
    /// rendered as an instruction; a note is appended instead.
    pub fn disassemble_opcode(&self, code: &[u16], pc: &mut u16, dest: &mut String) -> bool {
        let wrapped_pc = *pc & 0x7fff;
        if wrapped_pc as usize >= code.len() {
            dest.push_str("; outside memory");
            *pc = pc.wrapping_add(1);
            return false;
        }
        let op1 = code[wrapped_pc as usize];

        let opc = tables::find_by_bits(op1, OpcodeKind::Primary).unwrap_or(&tables::CW);

        let mut opc_ext = None;
        if opc.extendable {
            // Main ops in the 0x3xxx row keep only seven extension bits.
            let ext_bits = if (op1 >> 12) == 0x3 {
                op1 & 0x007f
            } else {
                op1 & 0x00ff
            };
            if ext_bits != 0 {
                opc_ext = tables::find_by_bits(ext_bits, OpcodeKind::Extension);
            }
        }

        let op2 = if opc.size == 2 {
            if wrapped_pc as usize + 1 >= code.len() {
                if self.settings.show_pc {
                    let _ = write!(dest, "{wrapped_pc:04x} ");
                }
                if self.settings.show_hex {
                    let _ = write!(dest, "{op1:04x} ???? ");
                }
                dest.push_str("; Insufficient data for large immediate");
                *pc = pc.wrapping_add(1);
                return false;
            }
            code[wrapped_pc as usize + 1]
        } else {
            0
        };

        if self.settings.show_pc {
            let _ = write!(dest, "{wrapped_pc:04x} ");
        }
        if self.settings.show_hex {
            let _ = write!(dest, "{op1:04x} ");
            if opc.size == 2 {
                let _ = write!(dest, "{op2:04x} ");
            } else {
                dest.push_str("     ");
            }
        }

        let mut opname = opc.name.to_owned();
        if let Some(ext) = opc_ext {
            opname.push(self.settings.ext_separator);
            opname.push_str(ext.name);
        }
        if self.settings.lower_case_ops {
            opname.make_ascii_lowercase();
        }
        if self.settings.print_tabs {
            let _ = write!(dest, "{opname}\t");
        } else {
            let _ = write!(dest, "{opname:<12}");
            if opname.len() >= 12 {
                dest.push(' ');
            }
        }

        let mut params = String::new();
        self.disassemble_parameters(opc, op1, op2, &mut params);
        dest.push_str(&params);
        if let Some(ext) = opc_ext {
            let mut ext_params = String::new();
            self.disassemble_parameters(ext, op1, op2, &mut ext_params);
            if !ext_params.is_empty() {
                dest.push_str(" : ");
                dest.push_str(&ext_params);
            }
        }

        let advance = opc_ext.map_or(opc.size, |ext| ext.size) as u16;
        *pc = pc.wrapping_add(advance);
        true
    }

    fn disassemble_parameters(&self, opc: &Opcode, op1: u16, op2: u16, dest: &mut String) {
        for (i, spec) in opc.params.iter().enumerate() {
            if i > 0 {
                dest.push_str(", ");
            }
            let source = if spec.loc >= 1 { op2 } else { op1 };
            let mut val = source & spec.mask;
            val = if spec.lshift < 0 {
                val.wrapping_shl((-(spec.lshift as i32)) as u32)
            } else {
                val.wrapping_shr(spec.lshift as u32)
            };

            let mut kind = spec.kind;
            if kind.0 & 0xff == 0x10 {
                // The M variants render as their plain register families.
                kind = ParamKind(kind.0 & 0xff00);
            }

            match kind {
                ParamKind::REG => self.write_register(dest, "$", val),
                ParamKind::PRG => self.write_register(dest, "@$", val),
                ParamKind::VAL | ParamKind::ADDR_I | ParamKind::ADDR_D => {
                    match self.decoded_name(val) {
                        Some(name) => dest.push_str(name),
                        None => {
                            let _ = write!(dest, "0x{val:04x}");
                        }
                    }
                }
                ParamKind::IMM => {
                    if spec.size == 2 {
                        let _ = write!(dest, "#0x{val:04x}");
                    } else if spec.mask == 0x003f {
                        // 6-bit signed shift count.
                        let signed = if val & 0x20 != 0 {
                            (val | 0xffc0) as i16
                        } else {
                            val as i16
                        };
                        let _ = write!(dest, "#{signed}");
                    } else {
                        let _ = write!(dest, "#0x{val:02x}");
                    }
                }
                ParamKind::MEM => {
                    let addr = if spec.size == 2 {
                        val
                    } else {
                        (val as u8 as i8) as i16 as u16
                    };
                    match self.decoded_name(addr) {
                        Some(name) => {
                            let _ = write!(dest, "@{name}");
                        }
                        None => {
                            let _ = write!(dest, "@0x{addr:04x}");
                        }
                    }
                }
                _ => {
                    // Register families encode an offset from their base.
                    let reg = if kind == ParamKind::ACC_D || kind == ParamKind::ACCM_D {
                        (!val & 1) | kind.family_base()
                    } else {
                        val | kind.family_base()
                    };
                    self.write_register(dest, "$", reg);
                }
            }
        }
    }

    fn decoded_name(&self, addr: u16) -> Option<&str> {
        if self.settings.decode_names {
            self.name_for(addr)
        } else {
            None
        }
    }

    fn write_register(&self, dest: &mut String, sigil: &str, reg: u16) {
        let name = if self.settings.decode_registers {
            tables::regname(reg)
        } else {
            None
        };
        match name {
            Some(name) => {
                let _ = write!(dest, "{sigil}{name}");
            }
            None => {
                let _ = write!(dest, "{sigil}{reg}");
            }
        }
    }

    /// Decodes a whole buffer, one instruction per line. Returns true only
    /// when every instruction decoded cleanly.
    pub fn disassemble(&self, code: &[u16], dest: &mut String) -> bool {
        let mut ok = true;
        let mut pc: u16 = 0;
        while (pc as usize) < code.len() {
            let prev = pc;
            ok &= self.disassemble_opcode(code, &mut pc, dest);
            dest.push('\n');
            if pc <= prev {
                break;
            }
        }
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dis(code: &[u16]) -> (String, bool) {
        let mut text = String::new();
        let ok = Disassembler::new(Settings::default()).disassemble(code, &mut text);
        (text, ok)
    }

    #[test]
    fn plain_ops_render_in_a_padded_column() {
        let (text, ok) = dis(&[0x0000, 0x0021]);
        assert!(ok);
        assert_eq!(text, "NOP         \nHALT        \n");
    }

    #[test]
    fn extended_ops_render_with_the_separator() {
        let (text, ok) = dis(&[0x4150]);
        assert!(ok);
        assert_eq!(text, "ADDR'L      $ACC1, $AX0.L : $AX0.H, @$AR0\n");
    }

    #[test]
    fn unmatched_words_fall_back_to_raw() {
        let (text, ok) = dis(&[0x0022]);
        assert!(ok);
        assert_eq!(text, "CW          0x0022\n");
    }

    #[test]
    fn two_word_ops_pull_the_immediate() {
        let (text, ok) = dis(&[0x0080, 0x1234]);
        assert!(ok);
        assert_eq!(text, "LRI         $AR0, #0x1234\n");
    }

    #[test]
    fn memory_operands_sign_extend_and_take_names() {
        let (text, ok) = dis(&[0x16fc, 0x8888]);
        assert!(ok);
        assert_eq!(text, "SI          @DMBH, #0x8888\n");

        let settings = Settings {
            decode_names: false,
            ..Settings::default()
        };
        let mut text = String::new();
        assert!(Disassembler::new(settings).disassemble(&[0x16fc, 0x8888], &mut text));
        assert_eq!(text, "SI          @0xfffc, #0x8888\n");
    }

    #[test]
    fn shift_counts_render_signed() {
        let (text, ok) = dis(&[0x143d]);
        assert!(ok);
        assert_eq!(text, "LSL         $ACC0, #-3\n");
    }

    #[test]
    fn truncated_pairs_are_flagged() {
        let (text, ok) = dis(&[0x0080]);
        assert!(!ok);
        assert_eq!(text, "; Insufficient data for large immediate\n");
    }

    #[test]
    fn out_of_range_pc_is_noted() {
        let dis = Disassembler::new(Settings::default());
        let mut pc: u16 = 5;
        let mut text = String::new();
        assert!(!dis.disassemble_opcode(&[0x0000], &mut pc, &mut text));
        assert_eq!(text, "; outside memory");
        assert_eq!(pc, 6);
    }

    #[test]
    fn pc_and_hex_prefixes_line_up() {
        let settings = Settings {
            show_pc: true,
            show_hex: true,
            ..Settings::default()
        };
        let mut text = String::new();
        assert!(Disassembler::new(settings).disassemble(&[0x0000, 0x0080, 0x1234], &mut text));
        assert_eq!(
            text,
            "0000 0000      NOP         \n0001 0080 1234 LRI         $AR0, #0x1234\n"
        );
    }

    #[test]
    fn lower_case_and_tab_layout() {
        let settings = Settings {
            lower_case_ops: true,
            print_tabs: true,
            ..Settings::default()
        };
        let mut text = String::new();
        assert!(Disassembler::new(settings).disassemble(&[0x0021], &mut text));
        assert_eq!(text, "halt\t\n");
    }

    #[test]
    fn registers_can_render_as_numbers() {
        let settings = Settings {
            decode_registers: false,
            ..Settings::default()
        };
        let mut text = String::new();
        assert!(Disassembler::new(settings).disassemble(&[0x0080, 0x1234], &mut text));
        assert_eq!(text, "LRI         $0, #0x1234\n");
    }

    #[test]
    fn added_names_take_part_in_decoding() {
        let mut dis = Disassembler::new(Settings::default());
        dis.add_name(0x0022, "MAGIC");
        let mut text = String::new();
        assert!(dis.disassemble(&[0x0022], &mut text));
        assert_eq!(text, "CW          MAGIC\n");
    }
}
