pub mod memory;

pub use memory::MemoryKernel;
