use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures reported by construction and by [`step`](crate::Chip8Interpreter::step)
///
/// A runtime failure is raised before any machine state changes, so the
/// engine can be inspected (or the host can give up) afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("program is too large ({size} bytes), max size is {max} bytes")]
    ProgramTooLarge { size: usize, max: usize },

    #[error("memory access out of bounds at address {address:#06X}")]
    OutOfBounds { address: usize },

    #[error("write into the glyph region at address {address:#06X}")]
    ProtectedWrite { address: usize },

    #[error("jump to odd address {target:#06X}")]
    UnalignedJump { target: u16 },

    #[error("stack overflow: call at {pc:#06X} with a full call stack")]
    StackOverflow { pc: u16 },

    #[error("stack underflow: return at {pc:#06X} with an empty call stack")]
    StackUnderflow { pc: u16 },
}
