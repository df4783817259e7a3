/// Scripted edit command.
pub mod edit;
/// Reference heap listing command.
pub mod heap;
/// Document-level information command.
pub mod info;
/// Tree display command.
pub mod show;
/// Schema listing command.
pub mod types;

mod util;

#[cfg(test)]
mod test_support;
