use std::{error::Error, fmt};

/// Everything the assembler can complain about while chewing through a
/// source line. Most of these are recorded and the run keeps going; see
/// `Assembler` for the record-and-continue protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unknown,
    UnknownOpcode,
    NotEnoughParameters,
    TooManyParameters,
    WrongParameter,
    ExpectedParamStr,
    ExpectedParamVal,
    ExpectedParamReg,
    ExpectedParamMem,
    ExpectedParamImm,
    IncorrectBinary,
    IncorrectHex,
    IncorrectDecimal,
    LabelAlreadyExists,
    UnknownLabel,
    NoMatchingBrackets,
    CantExtendOpcode,
    ExtensionParamsOnNonExtendableOpcode,
    WrongParameterExpectedAccumulator,
    WrongParameterExpectedMidAccumulator,
    InvalidRegister,
    NumberOutOfRange,
    PCOutOfRange,
    ExpressionNestingTooDeep,
    IncludeNestingTooDeep,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ErrorKind::Unknown => "Unknown Error",
            ErrorKind::UnknownOpcode => "Unknown opcode",
            ErrorKind::NotEnoughParameters => "Not enough parameters",
            ErrorKind::TooManyParameters => "Too many parameters",
            ErrorKind::WrongParameter => "Wrong parameter",
            ErrorKind::ExpectedParamStr => "Expected parameter of type 'string'",
            ErrorKind::ExpectedParamVal => "Expected parameter of type 'value'",
            ErrorKind::ExpectedParamReg => "Expected parameter of type 'register'",
            ErrorKind::ExpectedParamMem => "Expected parameter of type 'memory pointer'",
            ErrorKind::ExpectedParamImm => "Expected parameter of type 'immediate'",
            ErrorKind::IncorrectBinary => "Incorrect binary value",
            ErrorKind::IncorrectHex => "Incorrect hexadecimal value",
            ErrorKind::IncorrectDecimal => "Incorrect decimal value",
            ErrorKind::LabelAlreadyExists => "Label already exists",
            ErrorKind::UnknownLabel => "Label not defined",
            ErrorKind::NoMatchingBrackets => "No matching brackets",
            ErrorKind::CantExtendOpcode => "This opcode cannot be extended",
            ErrorKind::ExtensionParamsOnNonExtendableOpcode => {
                "Given extending parameters for non extended opcode"
            }
            ErrorKind::WrongParameterExpectedAccumulator => {
                "Wrong parameter: must be accumulator register"
            }
            ErrorKind::WrongParameterExpectedMidAccumulator => {
                "Wrong parameter: must be mid accumulator register"
            }
            ErrorKind::InvalidRegister => "Invalid register",
            ErrorKind::NumberOutOfRange => "Number out of range",
            ErrorKind::PCOutOfRange => "Program counter out of range",
            ErrorKind::ExpressionNestingTooDeep => "Expression nested too deeply",
            ErrorKind::IncludeNestingTooDeep => "Includes nested too deeply",
        };
        f.write_str(msg)
    }
}

/// A recorded error with its formatted line context.
#[derive(Debug, Clone)]
pub struct AsmError {
    kind: ErrorKind,
    message: String,
}

impl AsmError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for AsmError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_messages_match_reporting_strings() {
        assert_eq!(ErrorKind::UnknownLabel.to_string(), "Label not defined");
        assert_eq!(
            ErrorKind::WrongParameterExpectedMidAccumulator.to_string(),
            "Wrong parameter: must be mid accumulator register"
        );
    }

    #[test]
    fn error_carries_kind_and_context() {
        let err = AsmError::new(ErrorKind::UnknownOpcode, "4 : FOO. ERROR: Unknown opcode");
        assert_eq!(err.kind(), ErrorKind::UnknownOpcode);
        assert!(err.to_string().contains("Unknown opcode"));
    }
}
