//! Operações de cache aceitas pela CLI.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::FlightError;

/// Uma operação sobre o cache, na forma textual usada pela CLI.
///
/// - `add:chave=valor`
/// - `get:chave`
/// - `remove:chave`
/// - `oldest`
/// - `clear`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CacheOp {
    /// Adiciona ou atualiza.
    Add { key: String, value: String },

    /// Busca (promove a entrada).
    Get { key: String },

    /// Remove a chave.
    Remove { key: String },

    /// Remove a entrada menos recente.
    Oldest,

    /// Remove tudo.
    Clear,
}

impl FromStr for CacheOp {
    type Err = FlightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, arg) = match s.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (s, None),
        };

        let key_arg = |arg: Option<&str>| match arg {
            Some(key) if !key.is_empty() => Ok(key.to_string()),
            _ => Err(FlightError::invalid_operation(s)),
        };

        match name {
            "add" => {
                let (key, value) = arg
                    .and_then(|a| a.split_once('='))
                    .filter(|(key, _)| !key.is_empty())
                    .ok_or_else(|| FlightError::invalid_operation(s))?;
                Ok(CacheOp::Add {
                    key: key.to_string(),
                    value: value.to_string(),
                })
            }
            "get" => Ok(CacheOp::Get { key: key_arg(arg)? }),
            "remove" => Ok(CacheOp::Remove { key: key_arg(arg)? }),
            "oldest" if arg.is_none() => Ok(CacheOp::Oldest),
            "clear" if arg.is_none() => Ok(CacheOp::Clear),
            _ => Err(FlightError::invalid_operation(s)),
        }
    }
}

impl std::fmt::Display for CacheOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheOp::Add { key, value } => write!(f, "add:{}={}", key, value),
            CacheOp::Get { key } => write!(f, "get:{}", key),
            CacheOp::Remove { key } => write!(f, "remove:{}", key),
            CacheOp::Oldest => write!(f, "oldest"),
            CacheOp::Clear => write!(f, "clear"),
        }
    }
}
