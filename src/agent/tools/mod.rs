pub mod shell;

pub use shell::RunBashTool;
