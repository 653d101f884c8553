//! Interface de linha de comando do flightcache.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::types::ops::CacheOp;

/// flightcache - demonstra deduplicação de chamadas e o cache LRU.
#[derive(Parser, Debug)]
#[command(name = "flightcache")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Arquivo de configuração.
    #[arg(short, long, default_value = "flightcache.toml")]
    pub config: PathBuf,

    /// Modo verbose.
    #[arg(short, long)]
    pub verbose: bool,

    /// Modo silencioso.
    #[arg(short, long)]
    pub quiet: bool,

    /// Comando a executar.
    #[command(subcommand)]
    pub command: Commands,
}

/// Comandos disponíveis.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inicializa configuração no diretório atual.
    Init {
        /// Diretório de destino (padrão: diretório atual).
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Dispara chamadores concorrentes na mesma chave e conta as execuções.
    Dedup {
        /// Número de chamadores (padrão: config).
        #[arg(short = 'n', long)]
        callers: Option<usize>,

        /// Latência simulada da função, em ms (padrão: config).
        #[arg(short, long)]
        delay_ms: Option<u64>,

        /// Chave compartilhada.
        #[arg(short, long, default_value = "demo")]
        key: String,

        /// Usa threads e o grupo bloqueante em vez de tasks tokio.
        #[arg(long)]
        threads: bool,

        /// Saída em JSON.
        #[arg(long)]
        json: bool,
    },

    /// Aplica operações ao cache LRU e mostra remoções e conteúdo final.
    Cache {
        /// Capacidade (0 = ilimitado; padrão: config).
        #[arg(short = 'n', long)]
        capacity: Option<usize>,

        /// Operações: add:k=v, get:k, remove:k, oldest, clear.
        #[arg(required = true)]
        ops: Vec<CacheOp>,

        /// Saída em JSON.
        #[arg(long)]
        json: bool,
    },

    /// Mostra versão.
    Version,
}
