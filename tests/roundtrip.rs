use std::fs;

use dspasm::{
    bytes_to_words_be, error::ErrorKind, words_to_bytes_be, Assembler, Disassembler, Settings,
};

fn assemble(text: &str) -> Vec<u16> {
    Assembler::new(Settings::default())
        .assemble(text)
        .expect("assembly failed")
}

#[test]
fn disassembled_text_reassembles_to_the_same_words() {
    let source = "\
START: LRI $AR0, #0X0010
       LRI $AX0.H, #0X8000
       SI @DSCR, #0X0001
       LR $AC0.M, @DSMAH
       ADDR'L $ACC1, $AX0.L : $AX0.H, @$AR0
       LSL $ACC0, #-3
       SBSET #3
       CW 0X0022
       JMP START
       HALT
";
    let words = assemble(source);

    let mut text = String::new();
    assert!(Disassembler::new(Settings::default()).disassemble(&words, &mut text));
    assert_eq!(assemble(&text), words);
}

#[test]
fn repeated_nops_render_canonically() {
    let words = assemble("NOP\nNOP\nNOP\n");
    assert_eq!(words, vec![0x0000, 0x0000, 0x0000]);

    let mut text = String::new();
    assert!(Disassembler::new(Settings::default()).disassemble(&words, &mut text));
    assert_eq!(text, "NOP         \n".repeat(3));
    assert_eq!(assemble(&text), words);
}

#[test]
fn buffer_length_matches_the_pass_one_sizing() {
    assert_eq!(assemble("NOP\nORG 0X10\nNOP").len(), 0x11);
    assert_eq!(assemble("LRI $AR0, #1\nHALT").len(), 3);
}

#[test]
fn big_endian_words_survive_byte_io() {
    let words = vec![0x16fc, 0x8888, 0x0021];
    let bytes = words_to_bytes_be(&words);
    assert_eq!(bytes, [0x16, 0xfc, 0x88, 0x88, 0x00, 0x21]);
    assert_eq!(bytes_to_words_be(&bytes), words);
}

#[test]
fn include_pulls_nested_source() {
    let dir = std::env::temp_dir().join(format!("dspasm-inc-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("defs.inc"), "IRQ_VEC: EQU 0X8\nNOP\n").unwrap();

    let mut asm = Assembler::new(Settings::default());
    asm.set_include_dir(&dir);
    let words = asm.assemble("INCLUDE \"defs.inc\"\nJMP IRQ_VEC").unwrap();
    assert_eq!(words, vec![0x0000, 0x029f, 0x0008]);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn incdir_sets_the_search_directory() {
    let dir = std::env::temp_dir().join(format!("dspasm-incdir-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("more.inc"), "CW 0X42\n").unwrap();

    let source = format!("INCDIR \"{}\"\nINCLUDE \"more.inc\"", dir.display());
    let words = Assembler::new(Settings::default()).assemble(&source).unwrap();
    assert_eq!(words, vec![0x0042]);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn self_including_files_hit_the_depth_limit() {
    let dir = std::env::temp_dir().join(format!("dspasm-incloop-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("loop.inc"), "INCLUDE \"loop.inc\"\n").unwrap();

    let mut asm = Assembler::new(Settings::default());
    asm.set_include_dir(&dir);
    let err = asm.assemble("INCLUDE \"loop.inc\"\nNOP").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IncludeNestingTooDeep);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_includes_are_reported() {
    let err = Assembler::new(Settings::default())
        .assemble("INCLUDE \"no-such-file.inc\"\nNOP")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unknown);
}
