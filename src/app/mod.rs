pub mod ports;
pub mod tool_usecases;
