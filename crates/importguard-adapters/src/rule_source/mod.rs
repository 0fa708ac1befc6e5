//! Rule source implementations.

mod file;
mod memory;

pub use file::FileRuleSource;
pub use memory::InMemoryRuleSource;
