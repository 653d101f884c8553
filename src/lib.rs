//! # flightcache
//!
//! Dois primitivos pequenos e independentes para serviços maiores:
//!
//! - supressão de chamadas concorrentes duplicadas ("single flight");
//! - cache LRU limitado, com callback de remoção.
//!
//! ## Módulos
//!
//! - [`singleflight`] - Grupos de deduplicação (bloqueante e `tokio`)
//! - [`cache`] - Cache LRU ordenado por recência
//! - [`types`] - Configuração, erros e relatórios
//! - `cli` - Interface de linha de comando (feature `cli`)

pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod singleflight;
pub mod types;

pub use cache::RecencyCache;
pub use singleflight::{AsyncGroup, Group};
pub use types::config::Config;
pub use types::errors::{FlightError, FlightResult};
