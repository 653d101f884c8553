//! Cache LRU com callback de remoção.

use std::borrow::Borrow;
use std::hash::Hash;

use ::lru::LruCache;

/// Callback chamado com a chave e o valor de cada entrada removida.
///
/// O limite `Send` permite compartilhar o cache entre threads atrás de um
/// `Mutex`; por isso o callback não pode capturar um `Rc`.
pub type EvictionCallback<K, V> = Box<dyn FnMut(K, V) + Send>;

/// Cache limitado, ordenado por uso mais recente.
///
/// Não é seguro para acesso concorrente: envolva em um `Mutex` para
/// compartilhar entre threads.
///
/// A sequência de recência é um `LruCache` criado sem limite; a
/// capacidade é aplicada aqui para que toda remoção passe pelo callback.
pub struct RecencyCache<K, V> {
    /// Máximo de entradas. Zero desliga a remoção por tamanho.
    capacity: usize,
    on_evicted: Option<EvictionCallback<K, V>>,
    entries: LruCache<K, V>,
}

impl<K: Hash + Eq, V> RecencyCache<K, V> {
    /// Cria um cache vazio.
    ///
    /// Com `capacity == 0` o cache não tem limite e a remoção fica a cargo
    /// de quem chama.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            on_evicted: None,
            entries: LruCache::unbounded(),
        }
    }

    /// Cria um cache vazio com callback de remoção.
    pub fn with_on_evicted<F>(capacity: usize, on_evicted: F) -> Self
    where
        F: FnMut(K, V) + Send + 'static,
    {
        let mut cache = Self::new(capacity);
        cache.set_on_evicted(on_evicted);
        cache
    }

    /// Define (ou substitui) o callback de remoção.
    pub fn set_on_evicted<F>(&mut self, on_evicted: F)
    where
        F: FnMut(K, V) + Send + 'static,
    {
        self.on_evicted = Some(Box::new(on_evicted));
    }

    /// Adiciona ou atualiza uma entrada.
    ///
    /// Chave existente: o valor é trocado e a entrada vira a mais recente,
    /// sem callback. Chave nova: se o total passar da capacidade, as
    /// entradas menos recentes são removidas nesta mesma chamada.
    pub fn add(&mut self, key: K, value: V) {
        if let Some(slot) = self.entries.get_mut(&key) {
            *slot = value;
            return;
        }

        self.entries.put(key, value);
        self.trim();
    }

    /// Busca uma entrada, tornando-a a mais recente.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key)
    }

    /// Busca uma entrada sem alterar a ordem de recência.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.peek(key)
    }

    /// Verifica se a chave existe, sem alterar a ordem de recência.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains(key)
    }

    /// Remove a entrada de `key`, se existir.
    pub fn remove<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if let Some((key, value)) = self.entries.pop_entry(key) {
            self.evicted(key, value);
        }
    }

    /// Remove a entrada menos recente, se houver.
    pub fn remove_oldest(&mut self) {
        if let Some((key, value)) = self.entries.pop_lru() {
            self.evicted(key, value);
        }
    }

    /// Remove todas as entradas, da menos para a mais recente.
    pub fn clear(&mut self) {
        while let Some((key, value)) = self.entries.pop_lru() {
            self.evicted(key, value);
        }
    }

    /// Número de entradas.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Verifica se o cache não tem entradas.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Capacidade atual (0 = ilimitado).
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Altera a capacidade.
    ///
    /// Reduzir a capacidade não remove nada de imediato: o excesso sai na
    /// próxima inserção de chave nova.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    /// Chaves da mais recente para a menos recente.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(key, _)| key)
    }

    fn trim(&mut self) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() > self.capacity {
            self.remove_oldest();
        }
    }

    /// A entrada já saiu da estrutura quando o callback roda.
    fn evicted(&mut self, key: K, value: V) {
        tracing::trace!(remaining = self.entries.len(), "Cache entry removed");
        if let Some(on_evicted) = self.on_evicted.as_mut() {
            on_evicted(key, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<(String, i32)>>>;

    fn recording_cache(capacity: usize) -> (RecencyCache<String, i32>, Log) {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let cache = RecencyCache::with_on_evicted(capacity, move |key, value| {
            sink.lock().unwrap().push((key, value));
        });
        (cache, log)
    }

    fn keys(cache: &RecencyCache<String, i32>) -> Vec<&str> {
        cache.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_get_hit_and_miss() {
        let mut cache = RecencyCache::new(0);
        cache.add("myKey".to_string(), 1234);

        assert_eq!(cache.get("myKey"), Some(&1234));
        assert_eq!(cache.get("nonsense"), None);
    }

    #[test]
    fn test_capacity_eviction() {
        let (mut cache, log) = recording_cache(2);
        cache.add("a".to_string(), 1);
        cache.add("b".to_string(), 2);
        cache.add("c".to_string(), 3);

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains("a"));
        assert_eq!(keys(&cache), vec!["c", "b"]);
        assert_eq!(*log.lock().unwrap(), vec![("a".to_string(), 1)]);
    }

    #[test]
    fn test_get_promotes_entry() {
        let (mut cache, log) = recording_cache(2);
        cache.add("a".to_string(), 1);
        cache.add("b".to_string(), 2);
        assert_eq!(cache.get("a"), Some(&1));
        cache.add("c".to_string(), 3);

        assert_eq!(keys(&cache), vec!["c", "a"]);
        assert_eq!(*log.lock().unwrap(), vec![("b".to_string(), 2)]);
    }

    #[test]
    fn test_update_promotes_without_callback() {
        let (mut cache, log) = recording_cache(2);
        cache.add("a".to_string(), 1);
        cache.add("b".to_string(), 2);
        cache.add("a".to_string(), 10);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.peek("a"), Some(&10));
        assert_eq!(keys(&cache), vec!["a", "b"]);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_peek_keeps_order() {
        let mut cache = RecencyCache::new(2);
        cache.add("a".to_string(), 1);
        cache.add("b".to_string(), 2);
        assert_eq!(cache.peek("a"), Some(&1));
        cache.add("c".to_string(), 3);

        // "a" continua sendo a menos recente.
        assert!(!cache.contains("a"));
    }

    #[test]
    fn test_remove_fires_callback() {
        let (mut cache, log) = recording_cache(0);
        cache.add("a".to_string(), 1);
        cache.remove("a");

        assert!(cache.is_empty());
        assert_eq!(*log.lock().unwrap(), vec![("a".to_string(), 1)]);
    }

    #[test]
    fn test_remove_absent_key_is_noop() {
        let (mut cache, log) = recording_cache(2);
        cache.add("a".to_string(), 1);
        cache.remove("zzz");

        assert_eq!(cache.len(), 1);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_remove_oldest() {
        let (mut cache, log) = recording_cache(0);
        cache.remove_oldest();
        assert!(log.lock().unwrap().is_empty());

        cache.add("a".to_string(), 1);
        cache.add("b".to_string(), 2);
        cache.remove_oldest();

        assert_eq!(keys(&cache), vec!["b"]);
        assert_eq!(*log.lock().unwrap(), vec![("a".to_string(), 1)]);
    }

    #[test]
    fn test_unbounded_never_evicts() {
        let (mut cache, log) = recording_cache(0);
        for i in 0..1000 {
            cache.add(format!("k{i}"), i);
        }

        assert_eq!(cache.len(), 1000);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_clear_fires_callback_for_each_entry() {
        let (mut cache, log) = recording_cache(0);
        cache.add("a".to_string(), 1);
        cache.add("b".to_string(), 2);
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(
            *log.lock().unwrap(),
            vec![("a".to_string(), 1), ("b".to_string(), 2)]
        );
    }

    #[test]
    fn test_shrink_capacity_trims_on_next_add() {
        let (mut cache, log) = recording_cache(4);
        for (i, key) in ["a", "b", "c", "d"].iter().enumerate() {
            cache.add(key.to_string(), i as i32);
        }

        cache.set_capacity(2);
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.capacity(), 2);

        cache.add("e".to_string(), 4);
        assert_eq!(keys(&cache), vec!["e", "d"]);
        assert_eq!(log.lock().unwrap().len(), 3);
    }
}
