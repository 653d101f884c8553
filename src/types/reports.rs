//! Relatórios produzidos pelos comandos da CLI.

use serde::{Deserialize, Serialize};

use super::ops::CacheOp;

/// Resultado do comando `dedup`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupReport {
    /// Chave compartilhada por todos os chamadores.
    pub key: String,

    /// Número de chamadores concorrentes.
    pub callers: usize,

    /// Quantas vezes a função realmente executou.
    pub executions: usize,

    /// Chamadores que receberam o mesmo valor do líder.
    pub shared: usize,

    /// Tempo total (em milissegundos).
    pub elapsed_ms: u128,
}

impl std::fmt::Display for DedupReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Chave: {}", self.key)?;
        writeln!(f, "Chamadores: {}", self.callers)?;
        writeln!(f, "Execuções: {}", self.executions)?;
        writeln!(f, "Resultado compartilhado: {}/{}", self.shared, self.callers)?;
        write!(f, "Tempo total: {}ms", self.elapsed_ms)
    }
}

/// Uma entrada removida do cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eviction {
    pub key: String,
    pub value: String,
}

/// Resultado de uma operação `get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lookup {
    pub key: String,
    pub value: Option<String>,
}

/// Resultado do comando `cache`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheReport {
    /// Capacidade usada (0 = ilimitado).
    pub capacity: usize,

    /// Operações aplicadas, em ordem.
    pub operations: Vec<CacheOp>,

    /// Resultados dos `get`, em ordem.
    pub lookups: Vec<Lookup>,

    /// Entradas removidas, na ordem em que o callback foi chamado.
    pub evictions: Vec<Eviction>,

    /// Conteúdo final, da mais recente para a menos recente.
    pub entries: Vec<(String, String)>,
}

impl std::fmt::Display for CacheReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.capacity == 0 {
            writeln!(f, "Capacidade: ilimitada")?;
        } else {
            writeln!(f, "Capacidade: {}", self.capacity)?;
        }

        for lookup in &self.lookups {
            match &lookup.value {
                Some(value) => writeln!(f, "  get {} → {}", lookup.key, value)?,
                None => writeln!(f, "  get {} → (ausente)", lookup.key)?,
            }
        }

        for eviction in &self.evictions {
            writeln!(f, "  removido {}={}", eviction.key, eviction.value)?;
        }

        let entries: Vec<String> = self
            .entries
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        write!(f, "Entradas (MRU → LRU): [{}]", entries.join(", "))
    }
}
