//! Cache LRU em memória.
//!
//! Este módulo implementa um cache Least Recently Used (LRU) limitado por
//! número de entradas, com callback opcional chamado a cada remoção
//! (explícita, da mais antiga ou por excesso de capacidade).

mod lru;

pub use self::lru::{EvictionCallback, RecencyCache};
