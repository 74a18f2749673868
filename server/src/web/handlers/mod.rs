// server/src/web/handlers/mod.rs

pub mod tool_handlers;
