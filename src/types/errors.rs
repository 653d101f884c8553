//! Tipos de erro do flightcache.
//!
//! Os primitivos (`singleflight` e `cache`) não definem erros próprios:
//! o grupo repassa o erro da função do chamador e o cache sinaliza
//! ausência com `None`. Este tipo cobre apenas configuração e CLI.

use thiserror::Error;

/// Tipo de resultado padrão do flightcache.
pub type FlightResult<T> = Result<T, FlightError>;

/// Erros possíveis no flightcache.
#[derive(Error, Debug)]
pub enum FlightError {
    #[error("Erro de configuração: {0}")]
    Config(String),

    #[error("Erro de IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("Erro ao parsear TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Erro ao serializar TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Erro de JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Operação inválida '{0}'")]
    InvalidOperation(String),

    #[error("{0}")]
    Other(String),
}

impl FlightError {
    /// Cria um erro genérico.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Cria um erro de configuração.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Cria um erro de operação inválida.
    pub fn invalid_operation<S: Into<String>>(op: S) -> Self {
        Self::InvalidOperation(op.into())
    }
}
