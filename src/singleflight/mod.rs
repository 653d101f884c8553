//! Supressão de chamadas duplicadas ("single flight").
//!
//! Um grupo forma um namespace no qual unidades de trabalho identificadas
//! por chave são executadas com supressão de duplicatas: se várias
//! chamadas para a mesma chave chegam enquanto uma execução está em voo,
//! apenas a primeira (o *líder*) executa a função; as demais aguardam e
//! recebem uma cópia do mesmo resultado.
//!
//! - [`Group`] - versão bloqueante, para threads
//! - [`AsyncGroup`] - versão para tasks `tokio`
//!
//! Deduplicação não é cache: assim que a função retorna, o registro da
//! chamada sai do mapa e a próxima chamada para a chave executa de novo.
//!
//! Se o líder entra em pânico (ou, no caso assíncrono, o future é
//! descartado antes de terminar), a chamada é marcada como abandonada e
//! cada chamador em espera tenta de novo com a própria função.

mod async_group;
mod group;

pub use async_group::AsyncGroup;
pub use group::Group;

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// ═══════════════════════════════════════════════════════════════════════════
// Estado de uma chamada
// ═══════════════════════════════════════════════════════════════════════════

/// Estado observado pelos chamadores em espera.
#[derive(Debug)]
pub(crate) enum CallState<R> {
    /// Função ainda executando.
    Pending,

    /// Função retornou; resultado compartilhado.
    Done(R),

    /// Líder terminou sem produzir resultado (pânico ou cancelamento).
    Abandoned,
}

/// Barreira de conclusão de uma chamada em voo.
///
/// `release` é chamado exatamente uma vez por chamada, pelo [`Flight`].
pub(crate) trait Barrier {
    /// Resultado compartilhado com os chamadores em espera.
    type Output;

    /// Publica o estado final e acorda todos os chamadores em espera.
    fn release(&self, state: CallState<Self::Output>);
}

/// Trava um mutex ignorando envenenamento; os dados protegidos aqui
/// continuam consistentes mesmo após pânico de outra thread.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ═══════════════════════════════════════════════════════════════════════════
// Registro de chamadas em voo
// ═══════════════════════════════════════════════════════════════════════════

/// Papel de um chamador ao entrar no grupo.
pub(crate) enum Role<C> {
    /// Primeiro chamador: executa a função.
    Leader(Arc<C>),

    /// Já existe uma chamada em voo: aguarda a barreira.
    Waiter(Arc<C>),
}

/// Mapa chave → chamada em voo.
///
/// O mutex protege apenas o mapa; nunca é mantido durante a execução da
/// função do chamador.
pub(crate) struct Registry<K, C> {
    calls: Mutex<HashMap<K, Arc<C>>>,
}

impl<K, C> Registry<K, C>
where
    K: Hash + Eq + Clone,
{
    pub(crate) fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Junta-se à chamada em voo para `key` ou registra uma nova.
    pub(crate) fn join_or_register(&self, key: &K, make: impl FnOnce() -> C) -> Role<C> {
        let mut calls = lock(&self.calls);
        match calls.entry(key.clone()) {
            Entry::Occupied(entry) => Role::Waiter(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let call = Arc::new(make());
                entry.insert(Arc::clone(&call));
                Role::Leader(call)
            }
        }
    }

    /// Remove `call` do mapa se ela ainda for a chamada registrada para `key`.
    ///
    /// Depois de um `forget`, outra chamada pode ocupar a chave; essa não é
    /// tocada.
    pub(crate) fn unregister(&self, key: &K, call: &Arc<C>) -> bool {
        let mut calls = lock(&self.calls);
        match calls.get(key) {
            Some(current) if Arc::ptr_eq(current, call) => {
                calls.remove(key);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn forget(&self, key: &K) -> bool {
        lock(&self.calls).remove(key).is_some()
    }

    pub(crate) fn contains(&self, key: &K) -> bool {
        lock(&self.calls).contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.calls).len()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Guarda do líder
// ═══════════════════════════════════════════════════════════════════════════

/// Guarda mantida pelo líder enquanto a função executa.
///
/// [`Flight::land`] remove a chamada do mapa e só então libera a barreira.
/// Se a guarda for descartada sem `land` (pânico ou future cancelado), a
/// chamada é removida e liberada como [`CallState::Abandoned`].
pub(crate) struct Flight<'a, K, C>
where
    K: Hash + Eq + Clone,
    C: Barrier,
{
    registry: &'a Registry<K, C>,
    key: &'a K,
    call: Arc<C>,
    landed: bool,
}

impl<'a, K, C> Flight<'a, K, C>
where
    K: Hash + Eq + Clone,
    C: Barrier,
{
    pub(crate) fn new(registry: &'a Registry<K, C>, key: &'a K, call: Arc<C>) -> Self {
        Self {
            registry,
            key,
            call,
            landed: false,
        }
    }

    /// Conclui a chamada, compartilhando `output` com quem estiver esperando.
    pub(crate) fn land(mut self, output: C::Output) {
        self.registry.unregister(self.key, &self.call);
        self.call.release(CallState::Done(output));
        self.landed = true;
    }
}

impl<K, C> Drop for Flight<'_, K, C>
where
    K: Hash + Eq + Clone,
    C: Barrier,
{
    fn drop(&mut self) {
        if self.landed {
            return;
        }

        tracing::debug!(
            panicking = std::thread::panicking(),
            "Single flight leader ended without a result, releasing waiters"
        );
        self.registry.unregister(self.key, &self.call);
        self.call.release(CallState::Abandoned);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingBarrier {
        released: AtomicUsize,
        abandoned: AtomicUsize,
    }

    impl Barrier for CountingBarrier {
        type Output = u32;

        fn release(&self, state: CallState<u32>) {
            self.released.fetch_add(1, Ordering::SeqCst);
            if matches!(state, CallState::Abandoned) {
                self.abandoned.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn test_first_caller_leads() {
        let registry: Registry<String, CountingBarrier> = Registry::new();
        let key = "k".to_string();

        assert!(matches!(
            registry.join_or_register(&key, CountingBarrier::default),
            Role::Leader(_)
        ));
        assert!(matches!(
            registry.join_or_register(&key, CountingBarrier::default),
            Role::Waiter(_)
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_land_unregisters_before_release() {
        let registry: Registry<String, CountingBarrier> = Registry::new();
        let key = "k".to_string();

        let Role::Leader(call) = registry.join_or_register(&key, CountingBarrier::default) else {
            panic!("expected leader");
        };
        Flight::new(&registry, &key, Arc::clone(&call)).land(7);

        assert!(!registry.contains(&key));
        assert_eq!(call.released.load(Ordering::SeqCst), 1);
        assert_eq!(call.abandoned.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dropped_flight_is_abandoned() {
        let registry: Registry<String, CountingBarrier> = Registry::new();
        let key = "k".to_string();

        let Role::Leader(call) = registry.join_or_register(&key, CountingBarrier::default) else {
            panic!("expected leader");
        };
        drop(Flight::new(&registry, &key, Arc::clone(&call)));

        assert!(!registry.contains(&key));
        assert_eq!(call.released.load(Ordering::SeqCst), 1);
        assert_eq!(call.abandoned.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unregister_keeps_newer_call() {
        let registry: Registry<String, CountingBarrier> = Registry::new();
        let key = "k".to_string();

        let Role::Leader(old) = registry.join_or_register(&key, CountingBarrier::default) else {
            panic!("expected leader");
        };
        assert!(registry.forget(&key));
        let Role::Leader(_new) = registry.join_or_register(&key, CountingBarrier::default) else {
            panic!("expected leader after forget");
        };

        assert!(!registry.unregister(&key, &old));
        assert!(registry.contains(&key));
    }
}
