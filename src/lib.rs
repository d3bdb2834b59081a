use std::{error::Error, str::FromStr};

pub mod assembler;
pub mod disassembler;
pub mod error;
pub mod labels;
pub mod tables;

pub use assembler::Assembler;
pub use disassembler::Disassembler;

/// Knobs shared by the assembler and the disassembler. `Default` matches the
/// defaults of both command line tools.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Keep going after errors and still produce output.
    pub force: bool,
    /// Prefix each disassembled line with its address.
    pub show_pc: bool,
    /// Prefix each disassembled line with its raw instruction words.
    pub show_hex: bool,
    /// Separate mnemonics from parameters with a tab instead of padding.
    pub print_tabs: bool,
    /// Render known hardware addresses by name.
    pub decode_names: bool,
    /// Render register numbers by name.
    pub decode_registers: bool,
    /// Character between a primary mnemonic and its extension.
    pub ext_separator: char,
    /// Emit lower case mnemonics.
    pub lower_case_ops: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            force: false,
            show_pc: false,
            show_hex: false,
            print_tabs: false,
            decode_names: true,
            decode_registers: true,
            ext_separator: '\'',
            lower_case_ops: false,
        }
    }
}

pub fn parse_defines<T, U>(s: &str) -> Result<(T, U), Box<dyn Error + Send + Sync + 'static>>
where
    T: FromStr,
    T::Err: Error + Send + Sync + 'static,
    U: FromStr,
    U::Err: Error + Send + Sync + 'static,
{
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid SYMBOL=value: no `=` found in `{s}`"))?;
    Ok((s[..pos].parse()?, s[pos + 1..].parse()?))
}

/// Serializes instruction words in big-endian order, the DSP's ROM byte
/// order.
pub fn words_to_bytes_be(words: &[u16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(words.len() * 2);
    for word in words {
        bytes.extend_from_slice(&word.to_be_bytes());
    }
    bytes
}

/// Reassembles big-endian bytes into instruction words. A trailing odd byte
/// is dropped.
pub fn bytes_to_words_be(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_pairs_split_on_the_first_equals() {
        let (key, value) = parse_defines::<String, i32>("RATE=32000").unwrap();
        assert_eq!(key, "RATE");
        assert_eq!(value, 32000);
        assert!(parse_defines::<String, i32>("RATE").is_err());
    }

    #[test]
    fn word_serialization_is_big_endian() {
        assert_eq!(words_to_bytes_be(&[0x8100, 0x0021]), [0x81, 0x00, 0x00, 0x21]);
        assert_eq!(bytes_to_words_be(&[0x81, 0x00, 0x00, 0x21]), [0x8100, 0x0021]);
    }

    #[test]
    fn odd_trailing_byte_is_dropped() {
        assert_eq!(bytes_to_words_be(&[0x12, 0x34, 0x56]), [0x1234]);
        assert!(bytes_to_words_be(&[0x99]).is_empty());
    }
}
