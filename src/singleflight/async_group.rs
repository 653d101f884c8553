//! Grupo assíncrono de supressão de chamadas duplicadas.

use std::future::Future;
use std::hash::Hash;

use tokio::sync::watch;

use super::{Barrier, CallState, Flight, Registry, Role};

/// Chamada em voo publicada por um canal `watch`.
///
/// `watch` guarda o último valor, então quem se inscreve depois da
/// conclusão ainda observa o resultado sem esperar.
struct AsyncCall<T, E> {
    tx: watch::Sender<CallState<Result<T, E>>>,
}

impl<T, E> AsyncCall<T, E> {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(CallState::Pending);
        Self { tx }
    }
}

impl<T: Clone, E: Clone> AsyncCall<T, E> {
    /// Aguarda a conclusão. `None` se a chamada foi abandonada.
    async fn wait(&self) -> Option<Result<T, E>> {
        let mut rx = self.tx.subscribe();
        let state = rx
            .wait_for(|state| !matches!(state, CallState::Pending))
            .await
            .ok()?;

        let output = match &*state {
            CallState::Done(result) => Some(result.clone()),
            CallState::Pending | CallState::Abandoned => None,
        };
        output
    }
}

impl<T, E> Barrier for AsyncCall<T, E> {
    type Output = Result<T, E>;

    fn release(&self, state: CallState<Result<T, E>>) {
        // send_replace grava o valor mesmo sem receptores inscritos.
        self.tx.send_replace(state);
    }
}

/// Versão assíncrona de [`Group`](super::Group), para tasks `tokio`.
///
/// A trava do mapa é síncrona e nunca atravessa um `.await`.
pub struct AsyncGroup<K, T, E> {
    registry: Registry<K, AsyncCall<T, E>>,
}

impl<K, T, E> AsyncGroup<K, T, E>
where
    K: Hash + Eq + Clone,
    T: Clone,
    E: Clone,
{
    /// Cria um grupo vazio.
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
        }
    }

    /// Executa o future produzido por `f` uma única vez por chave em voo.
    ///
    /// Mesmas garantias de [`Group::execute`](super::Group::execute). Se o
    /// future do líder for descartado antes de terminar (cancelamento ou
    /// pânico), os chamadores em espera tentam de novo com a própria função.
    pub async fn execute<F, Fut>(&self, key: K, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        loop {
            match self.registry.join_or_register(&key, AsyncCall::new) {
                Role::Waiter(call) => {
                    tracing::trace!("Joining in-flight call");
                    if let Some(result) = call.wait().await {
                        return result;
                    }
                    tracing::debug!("In-flight call was abandoned, retrying");
                }
                Role::Leader(call) => {
                    tracing::trace!(in_flight = self.registry.len(), "Leading new call");
                    let flight = Flight::new(&self.registry, &key, call);
                    let result = f().await;
                    flight.land(result.clone());
                    return result;
                }
            }
        }
    }

    /// Esquece a chamada em voo para `key`. Ver [`Group::forget`](super::Group::forget).
    pub fn forget(&self, key: &K) -> bool {
        self.registry.forget(key)
    }

    /// Verifica se há uma chamada em voo para `key`.
    pub fn is_in_flight(&self, key: &K) -> bool {
        self.registry.contains(key)
    }

    /// Número de chaves com chamada em voo.
    pub fn in_flight(&self) -> usize {
        self.registry.len()
    }
}

impl<K, T, E> Default for AsyncGroup<K, T, E>
where
    K: Hash + Eq + Clone,
    T: Clone,
    E: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
