//! Two-pass assembler: pass 1 sizes the program and collects labels, pass 2
//! encodes instruction words into a buffer sized by pass 1. Errors are
//! recorded and the pass keeps going so one run surfaces every problem.

use std::{fs, mem, path::PathBuf};

use indexmap::IndexMap;

use crate::{
    error::{AsmError, ErrorKind},
    labels::LabelMap,
    tables::{self, Opcode, OpcodeKind, ParamKind, ParamSpec},
    Settings,
};

const MAX_PARAMS: usize = 10;
const MAX_EXPR_DEPTH: u32 = 100;
const MAX_INCLUDE_DEPTH: u32 = 16;

/// Counters indexed by segment; the third slot belongs to the overlay
/// segment, which no directive keyword selects.
const SEGMENT_SLOTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    Code,
    Data,
}

impl Segment {
    fn index(self) -> usize {
        self as usize
    }
}

/// One classified parameter token.
#[derive(Debug, Clone)]
struct Param {
    kind: ParamKind,
    val: i32,
    text: String,
}

/// Where diagnostics point: the file being assembled (if any), the 1-based
/// line number within it, and the raw line text.
#[derive(Debug, Clone, Default)]
struct Location {
    file: Option<PathBuf>,
    code_line: u32,
    line_text: String,
}

enum Brackets {
    None,
    Unbalanced(String),
    Inner {
        prefix: String,
        inner: String,
        suffix: String,
    },
}

/// Shifts a field mask down to its lowest set bit, giving the largest raw
/// value the field can hold.
fn mask_shifted_down(mut mask: u16) -> u16 {
    if mask == 0 {
        return 0;
    }
    while mask & 1 == 0 {
        mask >>= 1;
    }
    mask
}

/// Splits a leading `NAME:` off the line. The name may be empty; the colon
/// is consumed either way. A candidate with characters outside
/// `[A-Z0-9_]` (or not starting with a letter or underscore) leaves the
/// line untouched.
fn split_label(line: &str) -> (Option<&str>, &str) {
    if let Some(col) = line.find(':') {
        let candidate = &line[..col];
        let mut valid = true;
        for (i, c) in candidate.chars().enumerate() {
            if i == 0 && !(c.is_ascii_uppercase() || c == '_') {
                valid = false;
            }
            if !(c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_') {
                valid = false;
            }
        }
        if valid {
            return (Some(candidate), &line[col + 1..]);
        }
    }
    (None, line)
}

pub struct Assembler {
    settings: Settings,
    labels: LabelMap,
    aliases: IndexMap<&'static str, &'static str>,
    defines: IndexMap<String, u16>,
    include_dir: Option<PathBuf>,
    output: Vec<u16>,
    cur_addr: u32,
    total_size: u32,
    cur_pass: u32,
    cur_segment: Segment,
    segment_addr: [u32; SEGMENT_SLOTS],
    failed: bool,
    block_comment: bool,
    include_depth: u32,
    loc: Location,
    cur_param: usize,
    cur_slot: OpcodeKind,
    last_error: Option<AsmError>,
}

impl Assembler {
    pub fn new(settings: Settings) -> Self {
        let mut aliases = IndexMap::new();
        aliases.insert("S15", "SET15");
        aliases.insert("S16", "SET16");
        aliases.insert("S40", "SET40");
        Self {
            settings,
            labels: LabelMap::new(),
            aliases,
            defines: IndexMap::new(),
            include_dir: None,
            output: Vec::new(),
            cur_addr: 0,
            total_size: 0,
            cur_pass: 0,
            cur_segment: Segment::Code,
            segment_addr: [0; SEGMENT_SLOTS],
            failed: false,
            block_comment: false,
            include_depth: 0,
            loc: Location::default(),
            cur_param: 0,
            cur_slot: OpcodeKind::Primary,
            last_error: None,
        }
    }

    /// Predefines a label for every following run. The name is uppercased
    /// to match uppercased source.
    pub fn define(&mut self, name: &str, value: u16) {
        self.defines.insert(name.to_uppercase(), value);
    }

    /// Directory prepended to `INCLUDE` paths, until source overrides it
    /// with `INCDIR`.
    pub fn set_include_dir(&mut self, dir: impl Into<PathBuf>) {
        self.include_dir = Some(dir.into());
    }

    pub fn last_error(&self) -> Option<&AsmError> {
        self.last_error.as_ref()
    }

    /// Runs both passes over `text` and returns the assembled words.
    pub fn assemble(&mut self, text: &str) -> Result<Vec<u16>, AsmError> {
        self.init_pass(1);
        self.assemble_text(text);
        if self.failed {
            return Err(self.take_last_error());
        }
        if self.total_size == 0 {
            return Err(AsmError::new(
                ErrorKind::Unknown,
                "source produced no instruction words",
            ));
        }
        self.output = vec![0; self.total_size as usize];
        self.init_pass(2);
        self.assemble_text(text);
        if self.failed {
            return Err(self.take_last_error());
        }
        Ok(mem::take(&mut self.output))
    }

    fn take_last_error(&mut self) -> AsmError {
        self.last_error
            .take()
            .unwrap_or_else(|| AsmError::new(ErrorKind::Unknown, "assembly failed"))
    }

    fn init_pass(&mut self, pass: u32) {
        self.cur_pass = pass;
        self.failed = false;
        self.cur_addr = 0;
        self.total_size = 0;
        self.cur_segment = Segment::Code;
        self.segment_addr = [0; SEGMENT_SLOTS];
        self.block_comment = false;
        self.include_depth = 0;
        self.loc = Location::default();
        self.cur_param = 0;
        self.cur_slot = OpcodeKind::Primary;
        if pass == 1 {
            self.labels.clear();
            self.labels.register_defaults();
            let defines: Vec<(String, u16)> = self
                .defines
                .iter()
                .map(|(name, value)| (name.clone(), *value))
                .collect();
            for (name, value) in defines {
                if self.labels.register(&name, value).is_err() {
                    self.show_error(ErrorKind::LabelAlreadyExists, &name);
                }
            }
        }
    }

    fn assemble_text(&mut self, text: &str) {
        for line in text.lines() {
            self.loc.code_line += 1;
            self.assemble_line(line);
        }
    }

    fn assemble_line(&mut self, raw: &str) {
        self.loc.line_text = raw.to_owned();
        let line = self.preprocess_line(raw);

        let (label, rest) = split_label(&line);
        let rest = rest.trim_start_matches(' ');

        let (mnemonic_tok, param_text) = match rest.split_once(' ') {
            Some((mnemonic, params)) => (mnemonic, params),
            None => (rest, ""),
        };
        let (opcode_name, ext_name) = match mnemonic_tok.split_once('\'') {
            Some((primary, ext)) => (primary, Some(ext)),
            None => (mnemonic_tok, None),
        };
        let (primary_text, ext_text) = match param_text.split_once(':') {
            Some((primary, ext)) => (primary, Some(ext)),
            None => (param_text, None),
        };

        let params = self.get_params(primary_text);
        let params_ext = ext_text.map(|text| self.get_params(text)).unwrap_or_default();

        let mut opcode = (!rest.is_empty()).then_some(opcode_name);

        // EQU rebinds the line's label away from the current address. Without
        // a label it is not a directive and falls through to opcode lookup.
        let mut lval = self.cur_addr as i32;
        if opcode == Some("EQU") && label.is_some() {
            lval = params.first().map_or(0, |param| param.val);
            opcode = None;
        }

        if self.cur_pass == 1 {
            if let Some(label) = label {
                if !label.is_empty() && self.labels.register(label, lval as u16).is_err() {
                    self.show_error(ErrorKind::LabelAlreadyExists, label);
                }
            }
        }

        let Some(name) = opcode else { return };

        match name {
            "INCLUDE" => {
                match params.first() {
                    Some(param) if param.kind == ParamKind::STR => {
                        let file = param.text.clone();
                        self.include_file(&file);
                    }
                    _ => self.show_error(ErrorKind::ExpectedParamStr, "-"),
                }
                return;
            }
            "INCDIR" => {
                match params.first() {
                    Some(param) if param.kind == ParamKind::STR => {
                        self.include_dir = Some(PathBuf::from(&param.text));
                    }
                    _ => self.show_error(ErrorKind::ExpectedParamStr, "-"),
                }
                return;
            }
            "ORG" => {
                match params.first() {
                    Some(param) if param.kind == ParamKind::VAL => {
                        if !(0..=0xffff).contains(&param.val) {
                            self.show_error(
                                ErrorKind::NumberOutOfRange,
                                &format!(
                                    "Address value must be from 0x0 to 0xffff, is {}",
                                    param.val
                                ),
                            );
                            return;
                        }
                        let value = param.val as u32;
                        self.total_size = self.total_size.max(value);
                        self.cur_addr = value;
                    }
                    _ => self.show_error(ErrorKind::ExpectedParamVal, "-"),
                }
                return;
            }
            "WARNPC" => {
                match params.first() {
                    Some(param) if param.kind == ParamKind::VAL => {
                        let value = param.val as u32;
                        if self.cur_addr > value {
                            let message = format!(
                                "WARNPC at 0x{:04x}, expected 0x{:04x} or less",
                                self.cur_addr, value
                            );
                            self.show_error(ErrorKind::PCOutOfRange, &message);
                        }
                    }
                    _ => self.show_error(ErrorKind::ExpectedParamVal, "-"),
                }
                return;
            }
            "SEGMENT" => {
                match params.first() {
                    Some(param) if param.kind == ParamKind::STR => {
                        self.segment_addr[self.cur_segment.index()] = self.cur_addr;
                        match param.text.as_str() {
                            "CODE" => self.cur_segment = Segment::Code,
                            "DATA" => self.cur_segment = Segment::Data,
                            _ => {}
                        }
                        self.cur_addr = self.segment_addr[self.cur_segment.index()];
                    }
                    _ => self.show_error(ErrorKind::ExpectedParamStr, "-"),
                }
                return;
            }
            _ => {}
        }

        let opc = match self.find_opcode(name, params.len(), OpcodeKind::Primary) {
            Some(opc) => opc,
            None => &tables::CW,
        };

        self.verify_params(opc, &params, OpcodeKind::Primary);

        let mut opc_ext = None;
        if opc.extendable {
            if let Some(ext_name) = ext_name {
                opc_ext = self.find_opcode(ext_name, params_ext.len(), OpcodeKind::Extension);
                if let Some(ext) = opc_ext {
                    self.verify_params(ext, &params_ext, OpcodeKind::Extension);
                }
            } else if !params_ext.is_empty() {
                self.show_error(ErrorKind::ExtensionParamsOnNonExtendableOpcode, name);
            }
        } else {
            if ext_name.is_some() {
                self.show_error(ErrorKind::CantExtendOpcode, name);
            }
            if !params_ext.is_empty() {
                self.show_error(ErrorKind::ExtensionParamsOnNonExtendableOpcode, name);
            }
        }

        if self.cur_pass == 2 {
            self.build_code(opc, &params);
            if let Some(ext) = opc_ext {
                self.build_code(ext, &params_ext);
            }
        }

        let size = opc_ext.map_or(opc.size, |ext| opc.size.max(ext.size)) as u32;
        self.cur_addr += size;
        self.total_size += size;
    }

    /// Strips comments, maps tabs to spaces, and uppercases everything
    /// outside double quotes. `//` and `;` end the line; `/*` toggles the
    /// block comment state, which lives on across lines.
    fn preprocess_line(&mut self, raw: &str) -> String {
        let chars: Vec<char> = raw.chars().collect();
        let mut out = String::with_capacity(raw.len());
        let mut upper = true;
        let mut i = 0;
        while i < chars.len() {
            let mut c = chars[i];
            if c == '/' {
                match chars.get(i + 1) {
                    Some('/') => break,
                    Some('*') => self.block_comment = !self.block_comment,
                    _ => {}
                }
            } else if c == '*' && self.block_comment && chars.get(i + 1) == Some(&'/') {
                self.block_comment = false;
                out.push_str("  ");
                i += 2;
                continue;
            }
            if self.block_comment && c as u32 > 32 {
                c = ' ';
            }
            if c == '\n' || c == '\r' || c == ';' {
                break;
            }
            if c == '\t' {
                c = ' ';
            }
            if c == '"' {
                upper = !upper;
            }
            if upper {
                c = c.to_ascii_uppercase();
            }
            out.push(c);
            i += 1;
        }
        out
    }

    /// Splits a parameter list on commas and classifies each token by its
    /// first character. Empty tokens are dropped; at most ten are kept.
    fn get_params(&mut self, list: &str) -> Vec<Param> {
        let mut params = Vec::new();
        for tok in list.split(',') {
            if params.len() >= MAX_PARAMS {
                break;
            }
            let tok = tok.trim_start_matches(' ');
            if tok.is_empty() {
                continue;
            }
            let param = if let Some(rest) = tok.strip_prefix('"') {
                let text = match rest.find('"') {
                    Some(end) => &rest[..end],
                    None => rest,
                };
                Param {
                    kind: ParamKind::STR,
                    val: 0,
                    text: text.to_owned(),
                }
            } else if let Some(rest) = tok.strip_prefix('#') {
                Param {
                    kind: ParamKind::IMM,
                    val: self.parse_expression(rest),
                    text: String::new(),
                }
            } else if let Some(rest) = tok.strip_prefix('@') {
                if let Some(reg) = rest.strip_prefix('$') {
                    Param {
                        kind: ParamKind::PRG,
                        val: self.parse_expression(reg),
                        text: String::new(),
                    }
                } else {
                    Param {
                        kind: ParamKind::MEM,
                        val: self.parse_expression(rest),
                        text: String::new(),
                    }
                }
            } else if let Some(rest) = tok.strip_prefix('$') {
                Param {
                    kind: ParamKind::REG,
                    val: self.parse_expression(rest),
                    text: String::new(),
                }
            } else {
                Param {
                    kind: ParamKind::VAL,
                    val: self.parse_expression(tok),
                    text: String::new(),
                }
            };
            params.push(param);
        }
        params
    }

    fn parse_expression(&mut self, text: &str) -> i32 {
        self.parse_expression_at(text, 0)
    }

    /// Evaluates left to right in operator waves (`+`, `-`, `*`, `/`, `|`,
    /// `&`), brackets first, with no precedence between waves. A leading
    /// `-`, or one right after `/ % *`, marks the operand negative.
    fn parse_expression_at(&mut self, text: &str, depth: u32) -> i32 {
        if depth > MAX_EXPR_DEPTH {
            self.show_error(ErrorKind::ExpressionNestingTooDeep, text);
            return 0;
        }

        let mut buf = text.to_owned();
        loop {
            match self.find_brackets(&buf) {
                Brackets::None => break,
                Brackets::Unbalanced(prefix) => {
                    buf = prefix;
                    break;
                }
                Brackets::Inner {
                    prefix,
                    inner,
                    suffix,
                } => {
                    let val = self.parse_expression_at(&inner, depth + 1);
                    buf = format!("{prefix}{val}{suffix}");
                }
            }
        }

        buf.retain(|c| c != ' ');

        let chars: Vec<char> = buf.chars().collect();
        let mut rewritten = String::with_capacity(buf.len());
        for (i, &c) in chars.iter().enumerate() {
            if c == '-' && (i == 0 || matches!(chars[i - 1], '/' | '%' | '*')) {
                rewritten.push('#');
            } else {
                rewritten.push(c);
            }
        }
        let mut buf = rewritten;

        while let Some(pos) = buf.find('+') {
            let left = self.parse_expression_at(&buf[..pos], depth + 1);
            let right = self.parse_expression_at(&buf[pos + 1..], depth + 1);
            buf = left.wrapping_add(right).to_string();
        }
        while let Some(pos) = buf.find('-') {
            let left = self.parse_expression_at(&buf[..pos], depth + 1);
            let right = self.parse_expression_at(&buf[pos + 1..], depth + 1);
            let mut val = left.wrapping_sub(right);
            if val < 0 {
                // Keep the low 16 bits so the textual substitution never
                // reinjects a minus sign.
                val = 0x10000 + (val & 0xffff);
                tracing::warn!("number underflow at line {}", self.loc.code_line);
            }
            buf = val.to_string();
        }
        while let Some(pos) = buf.find('*') {
            let left = self.parse_expression_at(&buf[..pos], depth + 1);
            let right = self.parse_expression_at(&buf[pos + 1..], depth + 1);
            buf = left.wrapping_mul(right).to_string();
        }
        while let Some(pos) = buf.find('/') {
            let left = self.parse_expression_at(&buf[..pos], depth + 1);
            let right = self.parse_expression_at(&buf[pos + 1..], depth + 1);
            buf = left.checked_div(right).unwrap_or(0).to_string();
        }
        while let Some(pos) = buf.find('|') {
            let left = self.parse_expression_at(&buf[..pos], depth + 1);
            let right = self.parse_expression_at(&buf[pos + 1..], depth + 1);
            buf = (left | right).to_string();
        }
        while let Some(pos) = buf.find('&') {
            let left = self.parse_expression_at(&buf[..pos], depth + 1);
            let right = self.parse_expression_at(&buf[pos + 1..], depth + 1);
            buf = (left & right).to_string();
        }

        self.parse_value(&buf)
    }

    /// Finds the innermost-first bracket group: the text before the first
    /// `(`, the group's interior, and the text after its matching `)`.
    fn find_brackets(&mut self, src: &str) -> Brackets {
        let Some(first) = src.find('(') else {
            return Brackets::None;
        };
        let tail = &src[first..];
        let mut depth = 0u32;
        for (i, c) in tail.char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Brackets::Inner {
                            prefix: src[..first].to_owned(),
                            inner: tail[1..i].to_owned(),
                            suffix: tail[i + 1..].to_owned(),
                        };
                    }
                }
                _ => {}
            }
        }
        self.show_error(ErrorKind::NoMatchingBrackets, src);
        Brackets::Unbalanced(src[..first].to_owned())
    }

    /// Parses one operand: `#` or `-` prefix negates, `0X` is hex, `0'` is
    /// binary, a leading digit is decimal, anything else is looked up as a
    /// label. A label found in the table is returned as-is, unnegated; one
    /// missing in pass 1 quietly becomes zero.
    fn parse_value(&mut self, text: &str) -> i32 {
        let mut negative = false;
        let mut ptr = text;
        if let Some(rest) = ptr.strip_prefix('#') {
            negative = true;
            ptr = rest;
        }
        if let Some(rest) = ptr.strip_prefix('-') {
            negative = true;
            ptr = rest;
        }

        let mut val: i32 = 0;
        let bytes = ptr.as_bytes();
        if bytes.first() == Some(&b'0') {
            if bytes.len() > 1 && bytes[1].is_ascii_digit() {
                for &b in bytes {
                    val = val.wrapping_mul(10);
                    if b.is_ascii_digit() {
                        val = val.wrapping_add((b - b'0') as i32);
                    } else {
                        self.show_error(ErrorKind::IncorrectDecimal, text);
                    }
                }
            } else {
                match bytes.get(1) {
                    Some(b'X') => {
                        for &b in &bytes[2..] {
                            val = val.wrapping_shl(4);
                            match b {
                                b'a'..=b'f' => val = val.wrapping_add((b - b'a' + 10) as i32),
                                b'A'..=b'F' => val = val.wrapping_add((b - b'A' + 10) as i32),
                                b'0'..=b'9' => val = val.wrapping_add((b - b'0') as i32),
                                _ => self.show_error(ErrorKind::IncorrectHex, text),
                            }
                        }
                    }
                    Some(b'\'') => {
                        for &b in &bytes[2..] {
                            val = val.wrapping_mul(2);
                            match b {
                                b'0' | b'1' => val = val.wrapping_add((b - b'0') as i32),
                                _ => self.show_error(ErrorKind::IncorrectBinary, text),
                            }
                        }
                    }
                    _ => {}
                }
            }
        } else if bytes.first().is_some_and(|b| b.is_ascii_digit()) {
            for &b in bytes {
                val = val.wrapping_mul(10);
                if b.is_ascii_digit() {
                    val = val.wrapping_add((b - b'0') as i32);
                } else {
                    self.show_error(ErrorKind::IncorrectDecimal, text);
                }
            }
        } else {
            if let Some(value) = self.labels.lookup(ptr) {
                return value as i32;
            }
            if self.cur_pass == 2 {
                self.show_error(ErrorKind::UnknownLabel, text);
            }
        }

        if negative {
            val.wrapping_neg()
        } else {
            val
        }
    }

    /// Looks a mnemonic up in one of the opcode tables. Any name starting
    /// with `CW` short-circuits to the raw-word template before aliasing
    /// and skips the parameter count checks. Unknown names are recorded
    /// and `None` is returned for the caller to fall back on.
    fn find_opcode(
        &mut self,
        name: &str,
        count: usize,
        kind: OpcodeKind,
    ) -> Option<&'static Opcode> {
        if name.starts_with("CW") {
            return Some(&tables::CW);
        }
        let name = self.aliases.get(name).copied().unwrap_or(name);
        let Some(opc) = tables::find_by_name(name, kind) else {
            self.show_error(ErrorKind::UnknownOpcode, name);
            return None;
        };
        if count < opc.params.len() {
            self.show_error(ErrorKind::NotEnoughParameters, name);
        } else if count > opc.params.len() {
            self.show_error(ErrorKind::TooManyParameters, name);
        }
        Some(opc)
    }

    fn warn_substitution(&self, used: &str, wanted: &str, n: i32) {
        tracing::warn!(
            "{} : {} ${used}{n} register used instead of ${wanted}{n} register",
            self.loc.code_line,
            self.loc.line_text
        );
    }

    fn verify_params(&mut self, opc: &Opcode, params: &[Param], slot: OpcodeKind) {
        self.cur_slot = slot;
        for (i, param) in params.iter().enumerate() {
            self.cur_param = i + 1;
            let spec = opc.params.get(i).copied().unwrap_or(ParamSpec::NONE);
            let expected = spec.kind;

            if expected != param.kind || param.kind.is_register() {
                if param.kind == ParamKind::VAL
                    && (expected == ParamKind::ADDR_I || expected == ParamKind::ADDR_D)
                {
                    // Labels and computed values stand in for addresses.
                    continue;
                }
                if param.kind.is_register() && expected.is_register() {
                    let val = param.val;
                    match expected {
                        ParamKind::REG18 | ParamKind::REG19 | ParamKind::REG1A => {
                            let base = ((expected.0 >> 8) & 31) as i32;
                            let span = mask_shifted_down(spec.mask) as i32;
                            if val < base || val > base + span {
                                self.show_error(ErrorKind::InvalidRegister, "-");
                            }
                        }
                        ParamKind::PRG => {
                            if !(0..=3).contains(&val) {
                                self.show_error(ErrorKind::InvalidRegister, "-");
                            }
                        }
                        ParamKind::ACC => {
                            if !(0x20..=0x21).contains(&val) {
                                if (0x1e..=0x1f).contains(&val) {
                                    self.warn_substitution("ACM", "ACC", val & 1);
                                } else if (0x1c..=0x1d).contains(&val) {
                                    self.warn_substitution("ACL", "ACC", val & 1);
                                } else {
                                    self.show_error(
                                        ErrorKind::WrongParameterExpectedAccumulator,
                                        "-",
                                    );
                                }
                            }
                        }
                        ParamKind::ACCM => {
                            if !(0x1e..=0x1f).contains(&val) {
                                if (0x1c..=0x1d).contains(&val) {
                                    self.warn_substitution("ACL", "ACM", val & 1);
                                } else if (0x20..=0x21).contains(&val) {
                                    self.warn_substitution("ACC", "ACM", val & 1);
                                } else {
                                    self.show_error(
                                        ErrorKind::WrongParameterExpectedMidAccumulator,
                                        "-",
                                    );
                                }
                            }
                        }
                        ParamKind::ACCL => {
                            if !(0x1c..=0x1d).contains(&val) {
                                if (0x1e..=0x1f).contains(&val) {
                                    self.warn_substitution("ACM", "ACL", val & 1);
                                } else if (0x20..=0x21).contains(&val) {
                                    self.warn_substitution("ACC", "ACL", val & 1);
                                } else {
                                    self.show_error(
                                        ErrorKind::WrongParameterExpectedAccumulator,
                                        "-",
                                    );
                                }
                            }
                        }
                        _ => {}
                    }
                } else {
                    match ParamKind(expected.0 & (ParamKind::REG.0 | 7)) {
                        ParamKind::REG => self.show_error(ErrorKind::ExpectedParamReg, "-"),
                        ParamKind::MEM => self.show_error(ErrorKind::ExpectedParamMem, "-"),
                        ParamKind::VAL => self.show_error(ErrorKind::ExpectedParamVal, "-"),
                        ParamKind::IMM => self.show_error(ErrorKind::ExpectedParamImm, "-"),
                        ParamKind::STR => self.show_error(ErrorKind::ExpectedParamStr, "-"),
                        _ => {}
                    }
                    self.show_error(ErrorKind::WrongParameter, "-");
                }
                continue;
            }

            // Kinds agree; bounds-check the numeric against its field.
            let mut value = mask_shifted_down(spec.mask) as i32;
            let valueu = 0xffff & !(value >> 1);
            if param.val < 0 {
                if value == 7 {
                    self.show_error(
                        ErrorKind::NumberOutOfRange,
                        &format!("Value must be from 0x0 to 0x{value:x}"),
                    );
                } else if expected == ParamKind::MEM {
                    let message = if value < 256 {
                        format!(
                            "Address value must be from 0x{valueu:x} to 0x{:x}",
                            value >> 1
                        )
                    } else {
                        format!("Address value must be from 0x0 to 0x{value:x}")
                    };
                    self.show_error(ErrorKind::NumberOutOfRange, &message);
                } else if param.val < -((value >> 1) + 1) {
                    let message = if value < 128 {
                        format!(
                            "Value must be from -0x{:x} to 0x{:x}, is {}",
                            (value >> 1) + 1,
                            value >> 1,
                            param.val
                        )
                    } else {
                        format!(
                            "Value must be from -0x{:x} to 0x{:x} or 0x0 to 0x{:x}, is {}",
                            (value >> 1) + 1,
                            value >> 1,
                            value,
                            param.val
                        )
                    };
                    self.show_error(ErrorKind::NumberOutOfRange, &message);
                }
            } else if value == 7 {
                if param.val > value {
                    self.show_error(
                        ErrorKind::NumberOutOfRange,
                        &format!("Value must be from 0x0 to 0x{value:x}, is 0x{:x}", param.val),
                    );
                }
            } else if expected == ParamKind::MEM {
                if value < 256 {
                    value >>= 1;
                }
                if param.val > value && ((param.val) < valueu || param.val > 0xffff) {
                    self.show_error(
                        ErrorKind::NumberOutOfRange,
                        &format!("Address value must be from 0x0 to 0x{value:x}, is 0x{:x}", param.val),
                    );
                }
            } else {
                if value < 128 {
                    value >>= 1;
                }
                if param.val > value {
                    let message = if value < 64 {
                        format!(
                            "Value must be from -0x{:x} to 0x{:x}, is {}",
                            value + 1,
                            value,
                            param.val
                        )
                    } else {
                        format!("Value must be from 0x0 to 0x{value:x}, is {}", param.val)
                    };
                    self.show_error(ErrorKind::NumberOutOfRange, &message);
                }
            }
        }
        self.cur_param = 0;
        self.cur_slot = OpcodeKind::Primary;
    }

    /// ORs the template's base pattern and every encoded field into the
    /// output. The "reverse" accumulator kinds contribute no bits.
    fn build_code(&mut self, opc: &Opcode, params: &[Param]) {
        self.or_word(0, opc.bits);
        for (param, spec) in params.iter().zip(opc.params) {
            if spec.kind == ParamKind::ACC_D || spec.kind == ParamKind::ACCM_D {
                continue;
            }
            let mut field = param.val as u16;
            field = if spec.lshift > 0 {
                field.wrapping_shl(spec.lshift as u32)
            } else {
                field.wrapping_shr((-(spec.lshift as i32)) as u32)
            };
            field &= spec.mask;
            self.or_word(spec.loc as u32, field);
        }
    }

    fn or_word(&mut self, loc: u32, bits: u16) {
        let index = (self.cur_addr + loc) as usize;
        if index < self.output.len() {
            self.output[index] |= bits;
        } else {
            self.show_error(ErrorKind::Unknown, "emission outside the sized buffer");
        }
    }

    fn include_file(&mut self, name: &str) {
        if self.include_depth >= MAX_INCLUDE_DEPTH {
            self.show_error(ErrorKind::IncludeNestingTooDeep, name);
            return;
        }
        let path = match &self.include_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        };
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                self.show_error(ErrorKind::Unknown, &format!("{}: {err}", path.display()));
                return;
            }
        };
        let saved_loc = mem::take(&mut self.loc);
        let saved_comment = self.block_comment;
        self.loc.file = Some(path);
        self.block_comment = false;
        self.include_depth += 1;
        self.assemble_text(&text);
        self.include_depth -= 1;
        self.block_comment = saved_comment;
        self.loc = saved_loc;
    }

    fn show_error(&mut self, kind: ErrorKind, extra: &str) {
        if !self.settings.force {
            self.failed = true;
        }
        let place = match &self.loc.file {
            Some(file) => format!("{}: {}", file.display(), self.loc.code_line),
            None => self.loc.code_line.to_string(),
        };
        let slot = if self.cur_slot == OpcodeKind::Extension {
            "(ext) "
        } else {
            ""
        };
        let message = if self.cur_param == 0 {
            format!("{place} : {} {slot}ERROR: {kind} : {extra}", self.loc.line_text)
        } else {
            format!(
                "{place} : {} {slot}ERROR: {kind} Param: {} : {extra}",
                self.loc.line_text, self.cur_param
            )
        };
        tracing::error!("{message}");
        self.last_error = Some(AsmError::new(kind, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asm(text: &str) -> Result<Vec<u16>, AsmError> {
        Assembler::new(Settings::default()).assemble(text)
    }

    fn asm_force(text: &str) -> Result<Vec<u16>, AsmError> {
        let settings = Settings {
            force: true,
            ..Settings::default()
        };
        Assembler::new(settings).assemble(text)
    }

    #[test]
    fn plain_words_assemble() {
        assert_eq!(asm("NOP\nNOP\nNOP\n").unwrap(), [0x0000, 0x0000, 0x0000]);
        assert_eq!(asm("HALT").unwrap(), [0x0021]);
        assert_eq!(asm("SBCLR #5").unwrap(), [0x1205]);
    }

    #[test]
    fn two_word_instructions_take_two_slots() {
        assert_eq!(asm("LRI $AR0, #0X1234").unwrap(), [0x0080, 0x1234]);
        assert_eq!(asm("SI @0XFFFC, #0X8888").unwrap(), [0x16fc, 0x8888]);
    }

    #[test]
    fn lowercase_source_is_folded_up() {
        assert_eq!(asm("si @0xfffc, #0x8888").unwrap(), [0x16fc, 0x8888]);
        assert_eq!(asm("halt").unwrap(), [0x0021]);
    }

    #[test]
    fn expressions_evaluate_in_operator_waves() {
        assert_eq!(asm("CW 1+2").unwrap(), [3]);
        assert_eq!(asm("CW (1+2)*3").unwrap(), [9]);
        assert_eq!(asm("CW 10/3").unwrap(), [3]);
        assert_eq!(asm("CW 0X10").unwrap(), [16]);
        assert_eq!(asm("CW 0'1010").unwrap(), [10]);
        assert_eq!(asm("CW -5").unwrap(), [0xfffb]);
        // The first `+` splits the text and each side evaluates whole, so
        // the multiply binds tighter than the addition.
        assert_eq!(asm("CW 2+3*4").unwrap(), [14]);
    }

    #[test]
    fn subtraction_underflow_wraps_into_label_values() {
        assert_eq!(asm("X: EQU 1-2\nCW X").unwrap(), [0xffff]);
    }

    #[test]
    fn a_second_negation_sigil_still_negates_once() {
        // The classifier strips the first `#`, the value parser the second.
        assert_eq!(asm("LRI $AR0, ##5").unwrap(), [0x0080, 0xfffb]);
    }

    #[test]
    fn signed_immediates_encode_in_their_field() {
        // 6-bit shift field, -3 masked to 0x3d.
        assert_eq!(asm("LSL $ACC0, #-3").unwrap(), [0x143d]);
    }

    #[test]
    fn forward_labels_resolve_in_pass_two() {
        let code = asm("JMP SKIP\nNOP\nSKIP: HALT").unwrap();
        assert_eq!(code, [0x029f, 0x0003, 0x0000, 0x0021]);
    }

    #[test]
    fn equ_labels_address_hardware() {
        let literal = asm("SI @0XFFFB, #0X1").unwrap();
        let named = asm("DIRQ_TEST: EQU 0XFFFB\nSI @DIRQ_TEST, #0X1").unwrap();
        assert_eq!(literal, named);
        // The built-in hardware name resolves to the same address.
        assert_eq!(asm("SI @DIRQ, #0X1").unwrap(), literal);
    }

    #[test]
    fn found_labels_ignore_a_negation_prefix() {
        assert_eq!(asm("X: EQU 5\nCW -X").unwrap(), [5]);
    }

    #[test]
    fn duplicate_labels_fail_even_at_the_same_value() {
        let err = asm("A: EQU 1\nA: EQU 1\nNOP").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LabelAlreadyExists);
    }

    #[test]
    fn segment_counters_are_independent() {
        let code = asm("NOP\nSEGMENT \"DATA\"\nCW 1\nCW 2\nSEGMENT \"CODE\"\nSBSET #1").unwrap();
        // CODE resumes at address 1, overlapping the DATA words by OR.
        assert_eq!(code, [0x0001, 0x1303, 0x0000, 0x0000]);
    }

    #[test]
    fn segment_names_match_exactly() {
        // A quoted lowercase name is preserved and matches nothing, so the
        // address keeps running in the current segment.
        let code = asm("NOP\nSEGMENT \"data\"\nCW 9").unwrap();
        assert_eq!(code, [0x0000, 0x0009]);
    }

    #[test]
    fn extensions_merge_into_the_instruction_word() {
        assert_eq!(
            asm("ADDR'L $ACC1, $AX0.L : $AX0.H, @$AR0").unwrap(),
            [0x4150]
        );
    }

    #[test]
    fn extending_a_plain_opcode_fails() {
        let err = asm("LRI'L $AR0, #1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CantExtendOpcode);
    }

    #[test]
    fn extension_params_need_an_extension_mnemonic() {
        let err = asm("ADDR $ACC0, $AX0.L : $AX0.H, @$AR0").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExtensionParamsOnNonExtendableOpcode);
    }

    #[test]
    fn accumulator_substitution_warns_but_encodes_alike() {
        assert_eq!(asm("NEG $AC0.M").unwrap(), asm("NEG $ACC0").unwrap());
        assert_eq!(asm("NEG $AC1.L").unwrap(), [0x7d00]);
    }

    #[test]
    fn wrong_accumulator_family_is_an_error() {
        let err = asm("NEG $AR0").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WrongParameterExpectedAccumulator);
    }

    #[test]
    fn set_aliases_resolve() {
        assert_eq!(asm("S40\nS16\nS15").unwrap(), [0x8f00, 0x8e00, 0x8d00]);
    }

    #[test]
    fn unknown_opcodes_fall_back_to_raw_words() {
        let err = asm("BOGUS").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownOpcode);
        // Force mode still emits the raw-word fallback.
        assert_eq!(asm_force("BOGUS").unwrap(), [0x0000]);
    }

    #[test]
    fn cw_prefix_skips_count_checks() {
        assert_eq!(asm("CW 0X1234").unwrap(), [0x1234]);
        assert_eq!(asm("CWX 7").unwrap(), [7]);
    }

    #[test]
    fn comments_are_stripped() {
        assert_eq!(asm("NOP ; CW 5").unwrap(), [0x0000]);
        assert_eq!(asm("NOP // CW 5\nNOP").unwrap(), [0x0000, 0x0000]);
    }

    #[test]
    fn block_comments_span_lines() {
        let code = asm("NOP /* hidden\nCW 9\nstill hidden */ NOP\nNOP").unwrap();
        assert_eq!(code, [0x0000, 0x0000, 0x0000]);
    }

    #[test]
    fn out_of_range_immediates_are_rejected() {
        let err = asm("SBCLR #9").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NumberOutOfRange);
        let err = asm("LRIS $AX0.L, #300").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NumberOutOfRange);
    }

    #[test]
    fn memory_addresses_accept_the_high_window() {
        // 0xffxx addresses pass the 8-bit page check.
        assert!(asm("SRS @0XFFFD, $AC0.L").is_ok());
        let err = asm("SRS @0X1234, $AC0.L").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NumberOutOfRange);
    }

    #[test]
    fn empty_programs_are_refused() {
        let err = asm("").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);
        let err = asm("// nothing but comments\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn warnpc_flags_overrun() {
        assert!(asm("NOP\nWARNPC 0X1").is_ok());
        let err = asm("NOP\nNOP\nWARNPC 0X1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PCOutOfRange);
    }

    #[test]
    fn org_moves_the_cursor_and_grows_the_image() {
        let code = asm("NOP\nORG 0X4\nHALT").unwrap();
        assert_eq!(code, [0x0000, 0x0000, 0x0000, 0x0000, 0x0021]);
    }

    #[test]
    fn org_rejects_addresses_outside_the_word_space() {
        let err = asm("ORG -1\nNOP").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NumberOutOfRange);
        let err = asm("ORG 0X10000\nNOP").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NumberOutOfRange);
    }

    #[test]
    fn equ_without_a_label_is_not_a_directive() {
        let err = asm("NOP\nEQU 5").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownOpcode);
    }

    #[test]
    fn deep_operator_chains_are_cut_off() {
        let mut text = String::from("CW ");
        for _ in 0..110 {
            text.push_str("1+");
        }
        text.push('1');
        let err = asm(&text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExpressionNestingTooDeep);
    }

    #[test]
    fn unbalanced_brackets_are_reported() {
        let err = asm("CW (1+2").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoMatchingBrackets);
    }

    #[test]
    fn stray_value_digits_are_reported() {
        let err = asm("CW 0XG1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncorrectHex);
        let err = asm("CW 0'1021").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncorrectBinary);
        let err = asm("CW 12Q").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IncorrectDecimal);
    }

    #[test]
    fn predefines_act_as_labels() {
        let mut assembler = Assembler::new(Settings::default());
        assembler.define("rate", 0x50);
        assert_eq!(assembler.assemble("CW RATE").unwrap(), [0x50]);
    }
}
