//! Tipos compartilhados: configuração, erros e tipos da CLI.

pub mod config;
pub mod errors;
pub mod ops;
pub mod reports;
