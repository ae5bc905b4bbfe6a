use std::error::Error as StdError;
use std::fmt;

#[derive(Debug, PartialEq)]
pub enum Error {
    NotCfgCommand,
    UnknownCommand,
    ValsetArgCount,
    ValsetKeyFormat,
    UnknownValsetKey,
    BufferTooSmall,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::NotCfgCommand => f.write_str("command is not a CFG- message"),
            Error::UnknownCommand => f.write_str("unknown CFG message name"),
            Error::ValsetArgCount => f.write_str("VALSET takes exactly one key/value pair"),
            Error::ValsetKeyFormat => f.write_str("VALSET key must start with CFG-"),
            Error::UnknownValsetKey => f.write_str("unknown VALSET key name"),
            Error::BufferTooSmall => f.write_str("output buffer too small for frame"),
        }
    }
}

impl StdError for Error {}
