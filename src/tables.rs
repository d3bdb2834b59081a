//! Instruction catalog for the GameCube audio DSP: opcode templates for the
//! primary and extension tables, register names, and named I/O addresses.
//! Both the assembler and the disassembler drive off these tables; nothing
//! here is mutable at runtime.

/// Parameter kind tag. Value kinds live in the low bits; bit 15 marks a
/// register kind, bits 7..=13 carry the register family base, a low byte of
/// 0x10 marks the crossed-operand variant of a family and 0x80 the implicit
/// "other accumulator" variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamKind(pub u16);

impl ParamKind {
    pub const NONE: Self = Self(0x0000);
    pub const VAL: Self = Self(0x0001);
    pub const IMM: Self = Self(0x0002);
    pub const MEM: Self = Self(0x0003);
    pub const STR: Self = Self(0x0004);
    pub const ADDR_I: Self = Self(0x0005);
    pub const ADDR_D: Self = Self(0x0006);

    pub const REG: Self = Self(0x8000);
    pub const REG04: Self = Self(0x8400);
    pub const REG08: Self = Self(0x8800);
    pub const ACCH: Self = Self(0x9000);
    pub const REG18: Self = Self(0x9800);
    pub const REGM18: Self = Self(0x9810);
    pub const REG19: Self = Self(0x9900);
    pub const REGM19: Self = Self(0x9910);
    pub const REG1A: Self = Self(0x9a80);
    pub const REG1C: Self = Self(0x9c00);
    pub const ACCL: Self = Self(0x9c00);
    pub const ACCM: Self = Self(0x9e00);
    pub const ACCM_D: Self = Self(0x9e80);
    pub const ACC: Self = Self(0xa000);
    pub const ACC_D: Self = Self(0xa080);
    pub const AX: Self = Self(0xa200);
    pub const PRG: Self = Self(0xc000);

    /// Bits of a register kind that encode the family base.
    pub const REGS_MASK: u16 = 0x3f80;

    pub fn is_register(self) -> bool {
        self.0 & Self::REG.0 != 0
    }

    /// First register number of the family a register kind stands for.
    pub fn family_base(self) -> u16 {
        (self.0 & Self::REGS_MASK) >> 8
    }
}

/// One encoded field of an instruction: where the value sits and how it is
/// shifted and masked into its word.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub kind: ParamKind,
    /// Byte size hint; 2 selects the wide immediate renderings.
    pub size: u8,
    /// Word index the field lives in (1 = the extension word).
    pub loc: u8,
    /// Positive shifts left on encode (right on decode), negative the reverse.
    pub lshift: i8,
    pub mask: u16,
}

impl ParamSpec {
    pub const NONE: Self = Self {
        kind: ParamKind::NONE,
        size: 0,
        loc: 0,
        lshift: 0,
        mask: 0,
    };
}

#[derive(Debug, Clone, Copy)]
pub struct Opcode {
    pub name: &'static str,
    /// Base bit pattern of the instruction word.
    pub bits: u16,
    /// Mask of the bits that identify the instruction.
    pub mask: u16,
    /// Word count, 1 or 2.
    pub size: u8,
    pub params: &'static [ParamSpec],
    pub extendable: bool,
}

/// Which of the two opcode tables a lookup targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeKind {
    Primary,
    Extension,
}

const fn p(kind: ParamKind, size: u8, loc: u8, lshift: i8, mask: u16) -> ParamSpec {
    ParamSpec {
        kind,
        size,
        loc,
        lshift,
        mask,
    }
}

const fn op(
    name: &'static str,
    bits: u16,
    mask: u16,
    size: u8,
    params: &'static [ParamSpec],
    extendable: bool,
) -> Opcode {
    Opcode {
        name,
        bits,
        mask,
        size,
        params,
        extendable,
    }
}

// Row shorthands.
const VAL: ParamKind = ParamKind::VAL;
const IMM: ParamKind = ParamKind::IMM;
const MEM: ParamKind = ParamKind::MEM;
const ADDR_I: ParamKind = ParamKind::ADDR_I;
const REG: ParamKind = ParamKind::REG;
const REG04: ParamKind = ParamKind::REG04;
const ACCH: ParamKind = ParamKind::ACCH;
const REG18: ParamKind = ParamKind::REG18;
const REGM18: ParamKind = ParamKind::REGM18;
const REG19: ParamKind = ParamKind::REG19;
const REGM19: ParamKind = ParamKind::REGM19;
const REG1A: ParamKind = ParamKind::REG1A;
const REG1C: ParamKind = ParamKind::REG1C;
const ACCL: ParamKind = ParamKind::ACCL;
const ACCM: ParamKind = ParamKind::ACCM;
const ACCM_D: ParamKind = ParamKind::ACCM_D;
const ACC: ParamKind = ParamKind::ACC;
const ACC_D: ParamKind = ParamKind::ACC_D;
const AX: ParamKind = ParamKind::AX;
const PRG: ParamKind = ParamKind::PRG;

/// Fallback template: emits or displays one raw instruction word.
pub const CW: Opcode = op("CW", 0x0000, 0x0000, 1, &[p(VAL, 2, 0, 0, 0xffff)], false);

/// Primary opcode table. Bit-pattern lookups scan in this order, so more
/// specific patterns must precede the ones their mask shadows.
#[rustfmt::skip]
pub const OPCODES: &[Opcode] = &[
    //  name        bits    mask   size  params                                                                              extendable
    op("NOP",      0x0000, 0xfffc, 1, &[],                                                                                  false),

    op("DAR",      0x0004, 0xfffc, 1, &[p(REG, 1, 0, 0, 0x0003)],                                                           false),
    op("IAR",      0x0008, 0xfffc, 1, &[p(REG, 1, 0, 0, 0x0003)],                                                           false),
    op("SUBARN",   0x000c, 0xfffc, 1, &[p(REG, 1, 0, 0, 0x0003)],                                                           false),
    op("ADDARN",   0x0010, 0xfff0, 1, &[p(REG, 1, 0, 0, 0x0003), p(REG04, 1, 0, 2, 0x000c)],                                false),

    op("HALT",     0x0021, 0xffff, 1, &[],                                                                                  false),

    // Conditional and unconditional returns.
    op("RETGE",    0x02d0, 0xffff, 1, &[],                                                                                  false),
    op("RETL",     0x02d1, 0xffff, 1, &[],                                                                                  false),
    op("RETG",     0x02d2, 0xffff, 1, &[],                                                                                  false),
    op("RETLE",    0x02d3, 0xffff, 1, &[],                                                                                  false),
    op("RETNZ",    0x02d4, 0xffff, 1, &[],                                                                                  false),
    op("RETZ",     0x02d5, 0xffff, 1, &[],                                                                                  false),
    op("RETNC",    0x02d6, 0xffff, 1, &[],                                                                                  false),
    op("RETC",     0x02d7, 0xffff, 1, &[],                                                                                  false),
    op("RETX8",    0x02d8, 0xffff, 1, &[],                                                                                  false),
    op("RETX9",    0x02d9, 0xffff, 1, &[],                                                                                  false),
    op("RETXA",    0x02da, 0xffff, 1, &[],                                                                                  false),
    op("RETXB",    0x02db, 0xffff, 1, &[],                                                                                  false),
    op("RETLNZ",   0x02dc, 0xffff, 1, &[],                                                                                  false),
    op("RETLZ",    0x02dd, 0xffff, 1, &[],                                                                                  false),
    op("RETO",     0x02de, 0xffff, 1, &[],                                                                                  false),
    op("RET",      0x02df, 0xffff, 1, &[],                                                                                  false),

    // Returns from interrupt.
    op("RTIGE",    0x02f0, 0xffff, 1, &[],                                                                                  false),
    op("RTIL",     0x02f1, 0xffff, 1, &[],                                                                                  false),
    op("RTIG",     0x02f2, 0xffff, 1, &[],                                                                                  false),
    op("RTILE",    0x02f3, 0xffff, 1, &[],                                                                                  false),
    op("RTINZ",    0x02f4, 0xffff, 1, &[],                                                                                  false),
    op("RTIZ",     0x02f5, 0xffff, 1, &[],                                                                                  false),
    op("RTINC",    0x02f6, 0xffff, 1, &[],                                                                                  false),
    op("RTIC",     0x02f7, 0xffff, 1, &[],                                                                                  false),
    op("RTIX8",    0x02f8, 0xffff, 1, &[],                                                                                  false),
    op("RTIX9",    0x02f9, 0xffff, 1, &[],                                                                                  false),
    op("RTIXA",    0x02fa, 0xffff, 1, &[],                                                                                  false),
    op("RTIXB",    0x02fb, 0xffff, 1, &[],                                                                                  false),
    op("RTILNZ",   0x02fc, 0xffff, 1, &[],                                                                                  false),
    op("RTILZ",    0x02fd, 0xffff, 1, &[],                                                                                  false),
    op("RTIO",     0x02fe, 0xffff, 1, &[],                                                                                  false),
    op("RTI",      0x02ff, 0xffff, 1, &[],                                                                                  false),

    // Conditional calls to a 16-bit address in the second word.
    op("CALLGE",   0x02b0, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("CALLL",    0x02b1, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("CALLG",    0x02b2, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("CALLLE",   0x02b3, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("CALLNZ",   0x02b4, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("CALLZ",    0x02b5, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("CALLNC",   0x02b6, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("CALLC",    0x02b7, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("CALLX8",   0x02b8, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("CALLX9",   0x02b9, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("CALLXA",   0x02ba, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("CALLXB",   0x02bb, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("CALLLNZ",  0x02bc, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("CALLLZ",   0x02bd, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("CALLO",    0x02be, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("CALL",     0x02bf, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),

    // Conditional execution of the next instruction.
    op("IFGE",     0x0270, 0xffff, 1, &[],                                                                                  false),
    op("IFL",      0x0271, 0xffff, 1, &[],                                                                                  false),
    op("IFG",      0x0272, 0xffff, 1, &[],                                                                                  false),
    op("IFLE",     0x0273, 0xffff, 1, &[],                                                                                  false),
    op("IFNZ",     0x0274, 0xffff, 1, &[],                                                                                  false),
    op("IFZ",      0x0275, 0xffff, 1, &[],                                                                                  false),
    op("IFNC",     0x0276, 0xffff, 1, &[],                                                                                  false),
    op("IFC",      0x0277, 0xffff, 1, &[],                                                                                  false),
    op("IFX8",     0x0278, 0xffff, 1, &[],                                                                                  false),
    op("IFX9",     0x0279, 0xffff, 1, &[],                                                                                  false),
    op("IFXA",     0x027a, 0xffff, 1, &[],                                                                                  false),
    op("IFXB",     0x027b, 0xffff, 1, &[],                                                                                  false),
    op("IFLNZ",    0x027c, 0xffff, 1, &[],                                                                                  false),
    op("IFLZ",     0x027d, 0xffff, 1, &[],                                                                                  false),
    op("IFO",      0x027e, 0xffff, 1, &[],                                                                                  false),
    op("IF",       0x027f, 0xffff, 1, &[],                                                                                  false),

    // Conditional jumps to a 16-bit address in the second word.
    op("JGE",      0x0290, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("JL",       0x0291, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("JG",       0x0292, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("JLE",      0x0293, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("JNZ",      0x0294, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("JZ",       0x0295, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("JNC",      0x0296, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("JC",       0x0297, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("JMPX8",    0x0298, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("JMPX9",    0x0299, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("JMPXA",    0x029a, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("JMPXB",    0x029b, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("JLNZ",     0x029c, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("JLZ",      0x029d, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("JO",       0x029e, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),
    op("JMP",      0x029f, 0xffff, 2, &[p(ADDR_I, 2, 1, 0, 0xffff)],                                                        false),

    // Conditional register-indirect jumps.
    op("JRGE",     0x1700, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("JRL",      0x1701, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("JRG",      0x1702, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("JRLE",     0x1703, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("JRNZ",     0x1704, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("JRZ",      0x1705, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("JRNC",     0x1706, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("JRC",      0x1707, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("JMPRX8",   0x1708, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("JMPRX9",   0x1709, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("JMPRXA",   0x170a, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("JMPRXB",   0x170b, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("JRLNZ",    0x170c, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("JRLZ",     0x170d, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("JRO",      0x170e, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("JMPR",     0x170f, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),

    // Conditional register-indirect calls.
    op("CALLRGE",  0x1710, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("CALLRL",   0x1711, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("CALLRG",   0x1712, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("CALLRLE",  0x1713, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("CALLRNZ",  0x1714, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("CALLRZ",   0x1715, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("CALLRNC",  0x1716, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("CALLRC",   0x1717, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("CALLRX8",  0x1718, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("CALLRX9",  0x1719, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("CALLRXA",  0x171a, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("CALLRXB",  0x171b, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("CALLRLNZ", 0x171c, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("CALLRLZ",  0x171d, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("CALLRO",   0x171e, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),
    op("CALLR",    0x171f, 0xff1f, 1, &[p(REG, 1, 0, 5, 0x00e0)],                                                           false),

    op("SBCLR",    0x1200, 0xff00, 1, &[p(IMM, 1, 0, 0, 0x0007)],                                                           false),
    op("SBSET",    0x1300, 0xff00, 1, &[p(IMM, 1, 0, 0, 0x0007)],                                                           false),

    op("LSL",      0x1400, 0xfec0, 1, &[p(ACC, 1, 0, 8, 0x0100), p(IMM, 1, 0, 0, 0x003f)],                                  false),
    op("LSR",      0x1440, 0xfec0, 1, &[p(ACC, 1, 0, 8, 0x0100), p(IMM, 1, 0, 0, 0x003f)],                                  false),
    op("ASL",      0x1480, 0xfec0, 1, &[p(ACC, 1, 0, 8, 0x0100), p(IMM, 1, 0, 0, 0x003f)],                                  false),
    op("ASR",      0x14c0, 0xfec0, 1, &[p(ACC, 1, 0, 8, 0x0100), p(IMM, 1, 0, 0, 0x003f)],                                  false),

    op("LSRN",     0x02ca, 0xffff, 1, &[],                                                                                  false),
    op("ASRN",     0x02cb, 0xffff, 1, &[],                                                                                  false),

    op("LRI",      0x0080, 0xffe0, 2, &[p(REG, 1, 0, 0, 0x001f), p(IMM, 2, 1, 0, 0xffff)],                                  false),
    op("LR",       0x00c0, 0xffe0, 2, &[p(REG, 1, 0, 0, 0x001f), p(MEM, 2, 1, 0, 0xffff)],                                  false),
    op("SR",       0x00e0, 0xffe0, 2, &[p(MEM, 2, 1, 0, 0xffff), p(REG, 1, 0, 0, 0x001f)],                                  false),

    op("MRR",      0x1c00, 0xfc00, 1, &[p(REG, 1, 0, 5, 0x03e0), p(REG, 1, 0, 0, 0x001f)],                                  false),

    op("SI",       0x1600, 0xff00, 2, &[p(MEM, 1, 0, 0, 0x00ff), p(IMM, 2, 1, 0, 0xffff)],                                  false),

    op("ADDIS",    0x0400, 0xfe00, 1, &[p(ACCM, 1, 0, 8, 0x0100), p(IMM, 1, 0, 0, 0x00ff)],                                 false),
    op("CMPIS",    0x0600, 0xfe00, 1, &[p(ACCM, 1, 0, 8, 0x0100), p(IMM, 1, 0, 0, 0x00ff)],                                 false),
    op("LRIS",     0x0800, 0xf800, 1, &[p(REG18, 1, 0, 8, 0x0700), p(IMM, 1, 0, 0, 0x00ff)],                                false),

    op("ADDI",     0x0200, 0xfeff, 2, &[p(ACCM, 1, 0, 8, 0x0100), p(IMM, 2, 1, 0, 0xffff)],                                 false),
    op("XORI",     0x0220, 0xfeff, 2, &[p(ACCM, 1, 0, 8, 0x0100), p(IMM, 2, 1, 0, 0xffff)],                                 false),
    op("ANDI",     0x0240, 0xfeff, 2, &[p(ACCM, 1, 0, 8, 0x0100), p(IMM, 2, 1, 0, 0xffff)],                                 false),
    op("ORI",      0x0260, 0xfeff, 2, &[p(ACCM, 1, 0, 8, 0x0100), p(IMM, 2, 1, 0, 0xffff)],                                 false),
    op("CMPI",     0x0280, 0xfeff, 2, &[p(ACCM, 1, 0, 8, 0x0100), p(IMM, 2, 1, 0, 0xffff)],                                 false),

    op("ANDF",     0x02a0, 0xfeff, 2, &[p(ACCM, 1, 0, 8, 0x0100), p(IMM, 2, 1, 0, 0xffff)],                                 false),
    op("ANDCF",    0x02c0, 0xfeff, 2, &[p(ACCM, 1, 0, 8, 0x0100), p(IMM, 2, 1, 0, 0xffff)],                                 false),

    op("ILRR",     0x0210, 0xfefc, 1, &[p(ACCM, 1, 0, 8, 0x0100), p(PRG, 1, 0, 0, 0x0003)],                                 false),
    op("ILRRD",    0x0214, 0xfefc, 1, &[p(ACCM, 1, 0, 8, 0x0100), p(PRG, 1, 0, 0, 0x0003)],                                 false),
    op("ILRRI",    0x0218, 0xfefc, 1, &[p(ACCM, 1, 0, 8, 0x0100), p(PRG, 1, 0, 0, 0x0003)],                                 false),
    op("ILRRN",    0x021c, 0xfefc, 1, &[p(ACCM, 1, 0, 8, 0x0100), p(PRG, 1, 0, 0, 0x0003)],                                 false),

    op("LOOP",     0x0040, 0xffe0, 1, &[p(REG, 1, 0, 0, 0x001f)],                                                           false),
    op("BLOOP",    0x0060, 0xffe0, 2, &[p(REG, 1, 0, 0, 0x001f), p(ADDR_I, 2, 1, 0, 0xffff)],                               false),
    op("LOOPI",    0x1000, 0xff00, 1, &[p(IMM, 1, 0, 0, 0x00ff)],                                                           false),
    op("BLOOPI",   0x1100, 0xff00, 2, &[p(IMM, 1, 0, 0, 0x00ff), p(ADDR_I, 2, 1, 0, 0xffff)],                               false),

    op("LRR",      0x1800, 0xff80, 1, &[p(REG, 1, 0, 0, 0x001f), p(PRG, 1, 0, 5, 0x0060)],                                  false),
    op("LRRD",     0x1880, 0xff80, 1, &[p(REG, 1, 0, 0, 0x001f), p(PRG, 1, 0, 5, 0x0060)],                                  false),
    op("LRRI",     0x1900, 0xff80, 1, &[p(REG, 1, 0, 0, 0x001f), p(PRG, 1, 0, 5, 0x0060)],                                  false),
    op("LRRN",     0x1980, 0xff80, 1, &[p(REG, 1, 0, 0, 0x001f), p(PRG, 1, 0, 5, 0x0060)],                                  false),

    op("SRR",      0x1a00, 0xff80, 1, &[p(PRG, 1, 0, 5, 0x0060), p(REG, 1, 0, 0, 0x001f)],                                  false),
    op("SRRD",     0x1a80, 0xff80, 1, &[p(PRG, 1, 0, 5, 0x0060), p(REG, 1, 0, 0, 0x001f)],                                  false),
    op("SRRI",     0x1b00, 0xff80, 1, &[p(PRG, 1, 0, 5, 0x0060), p(REG, 1, 0, 0, 0x001f)],                                  false),
    op("SRRN",     0x1b80, 0xff80, 1, &[p(PRG, 1, 0, 5, 0x0060), p(REG, 1, 0, 0, 0x001f)],                                  false),

    op("LRS",      0x2000, 0xf800, 1, &[p(REG18, 1, 0, 8, 0x0700), p(MEM, 1, 0, 0, 0x00ff)],                                false),
    op("SRSH",     0x2800, 0xfe00, 1, &[p(MEM, 1, 0, 0, 0x00ff), p(ACCH, 1, 0, 8, 0x0100)],                                 false),
    op("SRS",      0x2c00, 0xfc00, 1, &[p(MEM, 1, 0, 0, 0x00ff), p(REG1C, 1, 0, 8, 0x0300)],                                false),

    // Extendable block: 0x3xxx carries a 7-bit extension field, everything
    // above an 8-bit one.
    op("XORR",     0x3000, 0xfc80, 1, &[p(ACCM, 1, 0, 8, 0x0100), p(REG1A, 1, 0, 9, 0x0200)],                               true),
    op("ANDR",     0x3400, 0xfc80, 1, &[p(ACCM, 1, 0, 8, 0x0100), p(REG1A, 1, 0, 9, 0x0200)],                               true),
    op("ORR",      0x3800, 0xfc80, 1, &[p(ACCM, 1, 0, 8, 0x0100), p(REG1A, 1, 0, 9, 0x0200)],                               true),
    op("ANDC",     0x3c00, 0xfe80, 1, &[p(ACCM, 1, 0, 8, 0x0100), p(ACCM_D, 1, 0, 8, 0x0100)],                              true),
    op("ORC",      0x3e00, 0xfe80, 1, &[p(ACCM, 1, 0, 8, 0x0100), p(ACCM_D, 1, 0, 8, 0x0100)],                              true),
    op("XORC",     0x3080, 0xfe80, 1, &[p(ACCM, 1, 0, 8, 0x0100), p(ACCM_D, 1, 0, 8, 0x0100)],                              true),
    op("NOT",      0x3280, 0xfe80, 1, &[p(ACCM, 1, 0, 8, 0x0100)],                                                          true),
    op("LSRNRX",   0x3480, 0xfc80, 1, &[p(ACC, 1, 0, 8, 0x0100), p(REG1A, 1, 0, 9, 0x0200)],                                true),
    op("ASRNRX",   0x3880, 0xfc80, 1, &[p(ACC, 1, 0, 8, 0x0100), p(REG1A, 1, 0, 9, 0x0200)],                                true),
    op("LSRNR",    0x3c80, 0xfe80, 1, &[p(ACC, 1, 0, 8, 0x0100), p(ACCM_D, 1, 0, 8, 0x0100)],                               true),
    op("ASRNR",    0x3e80, 0xfe80, 1, &[p(ACC, 1, 0, 8, 0x0100), p(ACCM_D, 1, 0, 8, 0x0100)],                               true),

    op("ADDR",     0x4000, 0xf800, 1, &[p(ACC, 1, 0, 8, 0x0100), p(REG18, 1, 0, 9, 0x0600)],                                true),
    op("ADDAX",    0x4800, 0xfc00, 1, &[p(ACC, 1, 0, 8, 0x0100), p(AX, 1, 0, 9, 0x0200)],                                   true),
    op("ADD",      0x4c00, 0xfe00, 1, &[p(ACC, 1, 0, 8, 0x0100), p(ACC_D, 1, 0, 8, 0x0100)],                                true),
    op("ADDP",     0x4e00, 0xfe00, 1, &[p(ACC, 1, 0, 8, 0x0100)],                                                           true),

    op("SUBR",     0x5000, 0xf800, 1, &[p(ACC, 1, 0, 8, 0x0100), p(REG18, 1, 0, 9, 0x0600)],                                true),
    op("SUBAX",    0x5800, 0xfc00, 1, &[p(ACC, 1, 0, 8, 0x0100), p(AX, 1, 0, 9, 0x0200)],                                   true),
    op("SUB",      0x5c00, 0xfe00, 1, &[p(ACC, 1, 0, 8, 0x0100), p(ACC_D, 1, 0, 8, 0x0100)],                                true),
    op("SUBP",     0x5e00, 0xfe00, 1, &[p(ACC, 1, 0, 8, 0x0100)],                                                           true),

    op("MOVR",     0x6000, 0xf800, 1, &[p(ACC, 1, 0, 8, 0x0100), p(REG18, 1, 0, 9, 0x0600)],                                true),
    op("MOVAX",    0x6800, 0xfc00, 1, &[p(ACC, 1, 0, 8, 0x0100), p(AX, 1, 0, 9, 0x0200)],                                   true),
    op("MOV",      0x6c00, 0xfe00, 1, &[p(ACC, 1, 0, 8, 0x0100), p(ACC_D, 1, 0, 8, 0x0100)],                                true),
    op("MOVP",     0x6e00, 0xfe00, 1, &[p(ACC, 1, 0, 8, 0x0100)],                                                           true),

    op("ADDAXL",   0x7000, 0xfc00, 1, &[p(ACC, 1, 0, 8, 0x0100), p(REG18, 1, 0, 9, 0x0200)],                                true),
    op("INCM",     0x7400, 0xfe00, 1, &[p(ACCM, 1, 0, 8, 0x0100)],                                                          true),
    op("INC",      0x7600, 0xfe00, 1, &[p(ACC, 1, 0, 8, 0x0100)],                                                           true),
    op("DECM",     0x7800, 0xfe00, 1, &[p(ACCM, 1, 0, 8, 0x0100)],                                                          true),
    op("DEC",      0x7a00, 0xfe00, 1, &[p(ACC, 1, 0, 8, 0x0100)],                                                           true),
    op("NEG",      0x7c00, 0xfe00, 1, &[p(ACC, 1, 0, 8, 0x0100)],                                                           true),
    op("MOVNP",    0x7e00, 0xfe00, 1, &[p(ACC, 1, 0, 8, 0x0100)],                                                           true),

    op("NX",       0x8000, 0xf700, 1, &[],                                                                                  true),
    op("CLR",      0x8100, 0xf700, 1, &[p(ACC, 1, 0, 11, 0x0800)],                                                          true),
    op("CMP",      0x8200, 0xff00, 1, &[],                                                                                  true),
    op("MULAXH",   0x8300, 0xff00, 1, &[],                                                                                  true),
    op("CLRP",     0x8400, 0xff00, 1, &[],                                                                                  true),
    op("TSTPROD",  0x8500, 0xff00, 1, &[],                                                                                  true),
    op("TSTAXH",   0x8600, 0xfe00, 1, &[p(REG1A, 1, 0, 8, 0x0100)],                                                         true),
    op("M2",       0x8a00, 0xff00, 1, &[],                                                                                  true),
    op("M0",       0x8b00, 0xff00, 1, &[],                                                                                  true),
    op("CLR15",    0x8c00, 0xff00, 1, &[],                                                                                  true),
    op("SET15",    0x8d00, 0xff00, 1, &[],                                                                                  true),
    op("SET16",    0x8e00, 0xff00, 1, &[],                                                                                  true),
    op("SET40",    0x8f00, 0xff00, 1, &[],                                                                                  true),

    op("MUL",      0x9000, 0xf700, 1, &[p(REG18, 1, 0, 11, 0x0800), p(REG1A, 1, 0, 11, 0x0800)],                            true),
    op("ASR16",    0x9100, 0xf700, 1, &[p(ACC, 1, 0, 11, 0x0800)],                                                          true),
    op("MULMVZ",   0x9200, 0xf600, 1, &[p(REG18, 1, 0, 11, 0x0800), p(REG1A, 1, 0, 11, 0x0800), p(ACC, 1, 0, 8, 0x0100)],   true),
    op("MULAC",    0x9400, 0xf600, 1, &[p(REG18, 1, 0, 11, 0x0800), p(REG1A, 1, 0, 11, 0x0800), p(ACC, 1, 0, 8, 0x0100)],   true),
    op("MULMV",    0x9600, 0xf600, 1, &[p(REG18, 1, 0, 11, 0x0800), p(REG1A, 1, 0, 11, 0x0800), p(ACC, 1, 0, 8, 0x0100)],   true),

    op("MULX",     0xa000, 0xe700, 1, &[p(REGM18, 1, 0, 11, 0x1000), p(REGM19, 1, 0, 10, 0x0800)],                          true),
    op("ABS",      0xa100, 0xf700, 1, &[p(ACC, 1, 0, 11, 0x0800)],                                                          true),
    op("MULXMVZ",  0xa200, 0xe600, 1, &[p(REGM18, 1, 0, 11, 0x1000), p(REGM19, 1, 0, 10, 0x0800), p(ACC, 1, 0, 8, 0x0100)], true),
    op("MULXAC",   0xa400, 0xe600, 1, &[p(REGM18, 1, 0, 11, 0x1000), p(REGM19, 1, 0, 10, 0x0800), p(ACC, 1, 0, 8, 0x0100)], true),
    op("MULXMV",   0xa600, 0xe600, 1, &[p(REGM18, 1, 0, 11, 0x1000), p(REGM19, 1, 0, 10, 0x0800), p(ACC, 1, 0, 8, 0x0100)], true),
    op("TST",      0xb100, 0xf700, 1, &[p(ACC, 1, 0, 11, 0x0800)],                                                          true),

    op("MULC",     0xc000, 0xe700, 1, &[p(ACCM, 1, 0, 12, 0x1000), p(REG1A, 1, 0, 11, 0x0800)],                             true),
    op("CMPAXH",   0xc100, 0xe700, 1, &[p(ACC, 1, 0, 11, 0x0800), p(REG1A, 1, 0, 12, 0x1000)],                              true),
    op("MULCMVZ",  0xc200, 0xe600, 1, &[p(ACCM, 1, 0, 12, 0x1000), p(REG1A, 1, 0, 11, 0x0800), p(ACC, 1, 0, 8, 0x0100)],    true),
    op("MULCAC",   0xc400, 0xe600, 1, &[p(ACCM, 1, 0, 12, 0x1000), p(REG1A, 1, 0, 11, 0x0800), p(ACC, 1, 0, 8, 0x0100)],    true),
    op("MULCMV",   0xc600, 0xe600, 1, &[p(ACCM, 1, 0, 12, 0x1000), p(REG1A, 1, 0, 11, 0x0800), p(ACC, 1, 0, 8, 0x0100)],    true),

    op("MADDX",    0xe000, 0xfc00, 1, &[p(REGM18, 1, 0, 8, 0x0200), p(REGM19, 1, 0, 7, 0x0100)],                            true),
    op("MSUBX",    0xe400, 0xfc00, 1, &[p(REGM18, 1, 0, 8, 0x0200), p(REGM19, 1, 0, 7, 0x0100)],                            true),
    op("MADDC",    0xe800, 0xfc00, 1, &[p(ACCM, 1, 0, 9, 0x0200), p(REG19, 1, 0, 7, 0x0100)],                               true),
    op("MSUBC",    0xec00, 0xfc00, 1, &[p(ACCM, 1, 0, 9, 0x0200), p(REG19, 1, 0, 7, 0x0100)],                               true),

    op("LSL16",    0xf000, 0xfe00, 1, &[p(ACC, 1, 0, 8, 0x0100)],                                                           true),
    op("MADD",     0xf200, 0xfe00, 1, &[p(REG18, 1, 0, 8, 0x0100), p(REG1A, 1, 0, 8, 0x0100)],                              true),
    op("LSR16",    0xf400, 0xfe00, 1, &[p(ACC, 1, 0, 8, 0x0100)],                                                           true),
    op("MSUB",     0xf600, 0xfe00, 1, &[p(REG18, 1, 0, 8, 0x0100), p(REG1A, 1, 0, 8, 0x0100)],                              true),
    op("ADDPAXZ",  0xf800, 0xfc00, 1, &[p(ACC, 1, 0, 9, 0x0200), p(AX, 1, 0, 8, 0x0100)],                                   true),
    op("CLRL",     0xfc00, 0xfe00, 1, &[p(ACCL, 1, 0, 11, 0x0800)],                                                         true),
    op("MOVPZ",    0xfe00, 0xfe00, 1, &[p(ACC, 1, 0, 8, 0x0100)],                                                           true),
];

/// Extension opcode table, matched against the low 7 or 8 bits of an
/// extendable instruction word. The LDAX group precedes LD because its
/// patterns are the LD encodings with extra low bits set.
#[rustfmt::skip]
pub const OPCODES_EXT: &[Opcode] = &[
    op("XXX",    0x0000, 0x00fc, 1, &[p(VAL, 1, 0, 0, 0x00ff)],                                              false),

    op("DR",     0x0004, 0x00fc, 1, &[p(REG, 1, 0, 0, 0x0003)],                                              false),
    op("IR",     0x0008, 0x00fc, 1, &[p(REG, 1, 0, 0, 0x0003)],                                              false),
    op("NR",     0x000c, 0x00fc, 1, &[p(REG, 1, 0, 0, 0x0003)],                                              false),
    op("MV",     0x0010, 0x00f0, 1, &[p(REG18, 1, 0, 2, 0x000c), p(REG1C, 1, 0, 0, 0x0003)],                 false),

    op("S",      0x0020, 0x00e4, 1, &[p(PRG, 1, 0, 0, 0x0003), p(REG1C, 1, 0, 3, 0x0018)],                   false),
    op("SN",     0x0024, 0x00e4, 1, &[p(PRG, 1, 0, 0, 0x0003), p(REG1C, 1, 0, 3, 0x0018)],                   false),

    op("L",      0x0040, 0x00c4, 1, &[p(REG18, 1, 0, 3, 0x0038), p(PRG, 1, 0, 0, 0x0003)],                   false),
    op("LN",     0x0044, 0x00c4, 1, &[p(REG18, 1, 0, 3, 0x0038), p(PRG, 1, 0, 0, 0x0003)],                   false),

    op("LS",     0x0080, 0x00ce, 1, &[p(REG18, 1, 0, 4, 0x0030), p(ACCM, 1, 0, 0, 0x0001)],                  false),
    op("SL",     0x0082, 0x00ce, 1, &[p(ACCM, 1, 0, 0, 0x0001), p(REG18, 1, 0, 4, 0x0030)],                  false),
    op("LSN",    0x0084, 0x00ce, 1, &[p(REG18, 1, 0, 4, 0x0030), p(ACCM, 1, 0, 0, 0x0001)],                  false),
    op("SLN",    0x0086, 0x00ce, 1, &[p(ACCM, 1, 0, 0, 0x0001), p(REG18, 1, 0, 4, 0x0030)],                  false),
    op("LSM",    0x0088, 0x00ce, 1, &[p(REG18, 1, 0, 4, 0x0030), p(ACCM, 1, 0, 0, 0x0001)],                  false),
    op("SLM",    0x008a, 0x00ce, 1, &[p(ACCM, 1, 0, 0, 0x0001), p(REG18, 1, 0, 4, 0x0030)],                  false),
    op("LSNM",   0x008c, 0x00ce, 1, &[p(REG18, 1, 0, 4, 0x0030), p(ACCM, 1, 0, 0, 0x0001)],                  false),
    op("SLNM",   0x008e, 0x00ce, 1, &[p(ACCM, 1, 0, 0, 0x0001), p(REG18, 1, 0, 4, 0x0030)],                  false),

    op("LDAX",   0x00c3, 0x00cf, 1, &[p(AX, 1, 0, 4, 0x0010), p(PRG, 1, 0, 5, 0x0020)],                      false),
    op("LDAXN",  0x00c7, 0x00cf, 1, &[p(AX, 1, 0, 4, 0x0010), p(PRG, 1, 0, 5, 0x0020)],                      false),
    op("LDAXM",  0x00cb, 0x00cf, 1, &[p(AX, 1, 0, 4, 0x0010), p(PRG, 1, 0, 5, 0x0020)],                      false),
    op("LDAXNM", 0x00cf, 0x00cf, 1, &[p(AX, 1, 0, 4, 0x0010), p(PRG, 1, 0, 5, 0x0020)],                      false),

    op("LD",     0x00c0, 0x00cc, 1, &[p(REGM18, 1, 0, 4, 0x0020), p(REGM19, 1, 0, 3, 0x0010), p(PRG, 1, 0, 0, 0x0003)], false),
    op("LDN",    0x00c4, 0x00cc, 1, &[p(REGM18, 1, 0, 4, 0x0020), p(REGM19, 1, 0, 3, 0x0010), p(PRG, 1, 0, 0, 0x0003)], false),
    op("LDM",    0x00c8, 0x00cc, 1, &[p(REGM18, 1, 0, 4, 0x0020), p(REGM19, 1, 0, 3, 0x0010), p(PRG, 1, 0, 0, 0x0003)], false),
    op("LDNM",   0x00cc, 0x00cc, 1, &[p(REGM18, 1, 0, 4, 0x0020), p(REGM19, 1, 0, 3, 0x0010), p(PRG, 1, 0, 0, 0x0003)], false),
];

/// Core register names, indexed by register number.
#[rustfmt::skip]
pub const REG_NAMES: [&str; 36] = [
    "AR0",    "AR1",     "AR2",    "AR3",
    "IX0",    "IX1",     "IX2",    "IX3",
    "WR0",    "WR1",     "WR2",    "WR3",
    "ST0",    "ST1",     "ST2",    "ST3",
    "AC0.H",  "AC1.H",   "CR",     "SR",
    "PROD.L", "PROD.M1", "PROD.H", "PROD.M2",
    "AX0.L",  "AX1.L",   "AX0.H",  "AX1.H",
    "AC0.L",  "AC1.L",   "AC0.M",  "AC1.M",
    // Combined register names resolve through the same number space.
    "ACC0",   "ACC1",    "AX0",    "AX1",
];

/// Named hardware I/O addresses in the 0xffa0..=0xffff window: ADPCM
/// coefficients, DMA, accelerator, and mailbox registers. Unnamed slots in
/// that window render as plain hex.
#[rustfmt::skip]
pub const PDLABELS: &[(u16, &str)] = &[
    (0xffa0, "COEF_A1_0"), (0xffa1, "COEF_A2_0"),
    (0xffa2, "COEF_A1_1"), (0xffa3, "COEF_A2_1"),
    (0xffa4, "COEF_A1_2"), (0xffa5, "COEF_A2_2"),
    (0xffa6, "COEF_A1_3"), (0xffa7, "COEF_A2_3"),
    (0xffa8, "COEF_A1_4"), (0xffa9, "COEF_A2_4"),
    (0xffaa, "COEF_A1_5"), (0xffab, "COEF_A2_5"),
    (0xffac, "COEF_A1_6"), (0xffad, "COEF_A2_6"),
    (0xffae, "COEF_A1_7"), (0xffaf, "COEF_A2_7"),

    (0xffc9, "DSCR"),
    (0xffcb, "DSBL"),
    (0xffcd, "DSPA"),
    (0xffce, "DSMAH"),
    (0xffcf, "DSMAL"),

    (0xffd1, "FORMAT"),
    (0xffd3, "ACDRAW"),
    (0xffd4, "ACSAH"),
    (0xffd5, "ACSAL"),
    (0xffd6, "ACEAH"),
    (0xffd7, "ACEAL"),
    (0xffd8, "ACCAH"),
    (0xffd9, "ACCAL"),
    (0xffda, "PRED_SCALE"),
    (0xffdb, "YN1"),
    (0xffdc, "YN2"),
    (0xffdd, "ACDSAMP"),
    (0xffde, "GAIN"),
    (0xffdf, "ACIN"),

    (0xffef, "AMDM"),

    (0xfffb, "DIRQ"),
    (0xfffc, "DMBH"),
    (0xfffd, "DMBL"),
    (0xfffe, "CMBH"),
    (0xffff, "CMBL"),
];

fn table(kind: OpcodeKind) -> &'static [Opcode] {
    match kind {
        OpcodeKind::Primary => OPCODES,
        OpcodeKind::Extension => OPCODES_EXT,
    }
}

/// Exact-name lookup in the given table.
pub fn find_by_name(name: &str, kind: OpcodeKind) -> Option<&'static Opcode> {
    table(kind).iter().find(|opc| opc.name == name)
}

/// Masked bit-pattern lookup in the given table; first match in table order
/// wins.
pub fn find_by_bits(bits: u16, kind: OpcodeKind) -> Option<&'static Opcode> {
    table(kind).iter().find(|opc| bits & opc.mask == opc.bits)
}

/// Name of the register with the given number, if it has one.
pub fn regname(reg: u16) -> Option<&'static str> {
    REG_NAMES.get(reg as usize).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_sizes_match_the_instruction_set() {
        assert_eq!(OPCODES.len(), 230);
        assert_eq!(OPCODES_EXT.len(), 25);
    }

    #[test]
    fn name_lookup_is_exact() {
        let neg = find_by_name("NEG", OpcodeKind::Primary).unwrap();
        assert_eq!(neg.bits, 0x7c00);
        assert!(neg.extendable);
        assert!(find_by_name("NE", OpcodeKind::Primary).is_none());
        assert!(find_by_name("NEG", OpcodeKind::Extension).is_none());
    }

    #[test]
    fn bit_lookup_respects_masks() {
        assert_eq!(find_by_bits(0x0000, OpcodeKind::Primary).unwrap().name, "NOP");
        assert_eq!(find_by_bits(0x0021, OpcodeKind::Primary).unwrap().name, "HALT");
        assert_eq!(find_by_bits(0x8100, OpcodeKind::Primary).unwrap().name, "CLR");
        assert_eq!(find_by_bits(0x8071, OpcodeKind::Primary).unwrap().name, "NX");
        // 0x0022 sits in none of the patterns.
        assert!(find_by_bits(0x0022, OpcodeKind::Primary).is_none());
    }

    #[test]
    fn extension_order_keeps_ldax_ahead_of_ld() {
        assert_eq!(find_by_bits(0x00c3, OpcodeKind::Extension).unwrap().name, "LDAX");
        assert_eq!(find_by_bits(0x00c4, OpcodeKind::Extension).unwrap().name, "LDN");
        assert_eq!(find_by_bits(0x0004, OpcodeKind::Extension).unwrap().name, "DR");
    }

    #[test]
    fn register_kind_helpers() {
        assert!(ParamKind::ACC.is_register());
        assert!(!ParamKind::IMM.is_register());
        assert_eq!(ParamKind::REG1A.family_base(), 0x1a);
        assert_eq!(ParamKind::REG18.family_base(), 0x18);
        assert_eq!(ParamKind::ACCM.family_base(), 0x1e);
        // The crossed variant folds onto the same family.
        assert_eq!(ParamKind::REGM19.family_base(), 0x19);
    }

    #[test]
    fn register_names_line_up_with_numbers() {
        assert_eq!(regname(0x00), Some("AR0"));
        assert_eq!(regname(0x1e), Some("AC0.M"));
        assert_eq!(regname(0x20), Some("ACC0"));
        assert_eq!(regname(0x23), Some("AX1"));
        assert_eq!(regname(0x24), None);
    }

    #[test]
    fn device_labels_cover_the_mailboxes() {
        assert!(PDLABELS.contains(&(0xfffb, "DIRQ")));
        assert!(PDLABELS.contains(&(0xfffc, "DMBH")));
        assert!(PDLABELS.contains(&(0xffff, "CMBL")));
    }
}
