pub mod chunk;
pub mod compiler;
pub mod debug;
pub mod opcode;
pub mod vm;

pub use chunk::Chunk;
pub use compiler::Compilador;
pub use opcode::OpCode;
pub use vm::VM;
