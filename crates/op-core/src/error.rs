//! Error types for the oxidized-psp emulator

use thiserror::Error;

/// Main error type for the emulator
#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("Save state error: {0}")]
    SaveState(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Unsupported feature: {0}")]
    Unsupported(String),
}

/// Memory-related errors
#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Out of memory")]
    OutOfMemory,

    #[error("Invalid address: 0x{0:08x}")]
    InvalidAddress(u32),

    #[error("Invalid range: 0x{addr:08x}..+0x{size:x}")]
    InvalidRange { addr: u32, size: u32 },

    #[error("Double free at 0x{0:08x}")]
    DoubleFree(u32),
}

/// Result type alias for emulator operations
pub type Result<T> = std::result::Result<T, EmulatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MemoryError::InvalidAddress(0x12345678);
        assert_eq!(format!("{}", err), "Invalid address: 0x12345678");

        let err = MemoryError::InvalidRange {
            addr: 0x0880_0000,
            size: 0x100,
        };
        assert_eq!(format!("{}", err), "Invalid range: 0x08800000..+0x100");
    }

    #[test]
    fn test_error_conversion() {
        let mem_err = MemoryError::OutOfMemory;
        let emu_err: EmulatorError = mem_err.into();
        assert!(matches!(emu_err, EmulatorError::Memory(_)));
    }
}
