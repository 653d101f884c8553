//! Grupo bloqueante de supressão de chamadas duplicadas.

use std::hash::Hash;
use std::sync::{Condvar, Mutex, PoisonError};

use super::{lock, Barrier, CallState, Flight, Registry, Role};

/// Chamada em voo: resultado protegido por mutex e uma condvar de conclusão.
struct Call<T, E> {
    state: Mutex<CallState<Result<T, E>>>,
    done: Condvar,
}

impl<T, E> Call<T, E> {
    fn new() -> Self {
        Self {
            state: Mutex::new(CallState::Pending),
            done: Condvar::new(),
        }
    }
}

impl<T: Clone, E: Clone> Call<T, E> {
    /// Bloqueia até a conclusão. `None` se a chamada foi abandonada.
    fn wait(&self) -> Option<Result<T, E>> {
        let state = self
            .done
            .wait_while(lock(&self.state), |state| {
                matches!(state, CallState::Pending)
            })
            .unwrap_or_else(PoisonError::into_inner);

        match &*state {
            CallState::Done(result) => Some(result.clone()),
            CallState::Pending | CallState::Abandoned => None,
        }
    }
}

impl<T, E> Barrier for Call<T, E> {
    type Output = Result<T, E>;

    fn release(&self, state: CallState<Result<T, E>>) {
        *lock(&self.state) = state;
        self.done.notify_all();
    }
}

/// Namespace de trabalho com supressão de chamadas duplicadas.
///
/// Seguro para uso concorrente; compartilhe com `Arc<Group<..>>`.
///
/// ```
/// use flightcache::singleflight::Group;
///
/// let group: Group<String, u64, String> = Group::new();
/// let value = group.execute("user:42".to_string(), || Ok(42));
/// assert_eq!(value, Ok(42));
/// ```
pub struct Group<K, T, E> {
    registry: Registry<K, Call<T, E>>,
}

impl<K, T, E> Group<K, T, E>
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

    /// Executa `f` garantindo uma única execução em voo por chave.
    ///
    /// Se já houver uma chamada em voo para `key`, bloqueia até ela terminar
    /// e retorna uma cópia do mesmo resultado (valor ou erro), sem chamar
    /// `f`. A trava do grupo não é mantida enquanto `f` executa, então
    /// chaves diferentes nunca se bloqueiam.
    ///
    /// Não há timeout: se `f` nunca retornar, os chamadores em espera
    /// também não retornam. Se `f` entrar em pânico, o pânico segue no
    /// chamador atual e os que esperavam tentam de novo com a própria função.
    pub fn execute<F>(&self, key: K, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        loop {
            match self.registry.join_or_register(&key, Call::new) {
                Role::Waiter(call) => {
                    tracing::trace!("Joining in-flight call");
                    if let Some(result) = call.wait() {
                        return result;
                    }
                    tracing::debug!("In-flight call was abandoned, retrying");
                }
                Role::Leader(call) => {
                    tracing::trace!(in_flight = self.registry.len(), "Leading new call");
                    let flight = Flight::new(&self.registry, &key, call);
                    let result = f();
                    flight.land(result.clone());
                    return result;
                }
            }
        }
    }

    /// Esquece a chamada em voo para `key`.
    ///
    /// Chamadas futuras para a chave executam de novo em vez de esperar;
    /// quem já estava esperando ainda recebe o resultado original.
    /// Retorna `true` se havia uma chamada registrada.
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

impl<K, T, E> Default for Group<K, T, E>
where
    K: Hash + Eq + Clone,
    T: Clone,
    E: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
