//! Symbol table shared by both assembler passes.

use indexmap::IndexMap;

use crate::{
    error::ErrorKind,
    tables::{PDLABELS, REG_NAMES},
};

/// Label table for one assembly run. The tokenizer uppercases source before
/// names reach this table, so lookups are byte-exact.
#[derive(Debug, Default)]
pub struct LabelMap {
    labels: IndexMap<String, u16>,
}

impl LabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.labels.clear();
    }

    /// Registers a new label. Redefinition is refused even when the value is
    /// unchanged.
    pub fn register(&mut self, name: &str, value: u16) -> Result<(), ErrorKind> {
        if self.labels.contains_key(name) {
            return Err(ErrorKind::LabelAlreadyExists);
        }
        self.labels.insert(name.to_owned(), value);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Option<u16> {
        self.labels.get(name).copied()
    }

    /// Seeds the table with the core register names and the named hardware
    /// addresses so source can use them anywhere a value is accepted.
    pub fn register_defaults(&mut self) {
        for (number, name) in REG_NAMES.iter().enumerate() {
            self.labels.insert((*name).to_owned(), number as u16);
        }
        for &(addr, name) in PDLABELS {
            self.labels.insert(name.to_owned(), addr);
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_lookup() {
        let mut labels = LabelMap::new();
        assert!(labels.register("MAIN", 0x0010).is_ok());
        assert_eq!(labels.lookup("MAIN"), Some(0x0010));
        assert_eq!(labels.lookup("OTHER"), None);
    }

    #[test]
    fn redefinition_is_refused() {
        let mut labels = LabelMap::new();
        labels.register("TWICE", 1).unwrap();
        assert_eq!(labels.register("TWICE", 1), Err(ErrorKind::LabelAlreadyExists));
        assert_eq!(labels.register("TWICE", 2), Err(ErrorKind::LabelAlreadyExists));
        assert_eq!(labels.lookup("TWICE"), Some(1));
    }

    #[test]
    fn defaults_cover_registers_and_hardware_names() {
        let mut labels = LabelMap::new();
        labels.register_defaults();
        assert_eq!(labels.lookup("AR0"), Some(0x00));
        assert_eq!(labels.lookup("AC0.M"), Some(0x1e));
        assert_eq!(labels.lookup("ACC1"), Some(0x21));
        assert_eq!(labels.lookup("DIRQ"), Some(0xfffb));
        assert_eq!(labels.lookup("COEF_A1_0"), Some(0xffa0));
    }

    #[test]
    fn clear_forgets_everything() {
        let mut labels = LabelMap::new();
        labels.register_defaults();
        labels.register("LOOP_TOP", 4).unwrap();
        assert!(!labels.is_empty());
        labels.clear();
        assert!(labels.is_empty());
        assert_eq!(labels.lookup("LOOP_TOP"), None);
    }
}
