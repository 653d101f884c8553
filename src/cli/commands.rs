//! Implementação dos comandos CLI do flightcache.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Barrier};
use std::time::{Duration, Instant};

use crate::cache::RecencyCache;
use crate::singleflight::{AsyncGroup, Group};
use crate::types::config::Config;
use crate::types::ops::CacheOp;
use crate::types::reports::{CacheReport, DedupReport, Eviction, Lookup};
use crate::{FlightError, FlightResult};

/// Initializes configuration in the specified directory.
pub fn init(path: Option<PathBuf>) -> FlightResult<()> {
    let target_dir = path.unwrap_or_else(|| PathBuf::from("."));

    // Create directory if it doesn't exist
    if !target_dir.exists() {
        std::fs::create_dir_all(&target_dir)?;
        tracing::info!("Directory created: {}", target_dir.display());
    }

    let config_path = target_dir.join("flightcache.toml");

    if config_path.exists() {
        println!("Configuration already exists at: {}", config_path.display());
        return Ok(());
    }

    Config::default_config().save(&config_path)?;

    println!("flightcache initialized successfully!");
    println!("Configuration created at: {}", config_path.display());

    Ok(())
}

/// Executa o comando `dedup`.
pub async fn dedup(
    key: String,
    callers: Option<usize>,
    delay_ms: Option<u64>,
    threads: bool,
    json: bool,
    config: &Config,
) -> FlightResult<()> {
    let callers = callers.unwrap_or(config.dedup.callers);
    let delay = Duration::from_millis(delay_ms.unwrap_or(config.dedup.delay_ms));

    tracing::debug!(callers, delay_ms = delay.as_millis() as u64, threads, "Running dedup");

    let report = if threads {
        tokio::task::spawn_blocking(move || run_dedup_blocking(key, callers, delay))
            .await
            .map_err(|e| FlightError::other(format!("Thread de dedup falhou: {}", e)))??
    } else {
        run_dedup_async(key, callers, delay).await?
    };

    print_report(&report, json)
}

/// Executa o comando `cache`.
pub fn cache(
    capacity: Option<usize>,
    ops: &[CacheOp],
    json: bool,
    config: &Config,
) -> FlightResult<()> {
    let capacity = capacity.unwrap_or(config.cache.capacity);
    let report = run_cache(capacity, ops);
    print_report(&report, json)
}

/// Mostra versão.
pub fn version() {
    println!("flightcache {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Deduplicação de chamadas concorrentes e cache LRU");
}

fn print_report<R>(report: &R, json: bool) -> FlightResult<()>
where
    R: serde::Serialize + std::fmt::Display,
{
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}", report);
    }
    Ok(())
}

/// Dispara `callers` tasks na mesma chave usando [`AsyncGroup`].
///
/// A função deduplicada devolve o número da execução; quem recebeu `1`
/// compartilhou o resultado do primeiro líder.
pub async fn run_dedup_async(
    key: String,
    callers: usize,
    delay: Duration,
) -> FlightResult<DedupReport> {
    let group: Arc<AsyncGroup<String, usize, String>> = Arc::new(AsyncGroup::new());
    let executions = Arc::new(AtomicUsize::new(0));
    let started = Instant::now();

    let handles: Vec<_> = (0..callers)
        .map(|_| {
            let group = Arc::clone(&group);
            let executions = Arc::clone(&executions);
            let key = key.clone();
            tokio::spawn(async move {
                group
                    .execute(key, || async move {
                        let n = executions.fetch_add(1, Ordering::SeqCst) + 1;
                        tokio::time::sleep(delay).await;
                        Ok(n)
                    })
                    .await
            })
        })
        .collect();

    let mut results = Vec::with_capacity(callers);
    for handle in handles {
        let result = handle
            .await
            .map_err(|e| FlightError::other(format!("Task de dedup falhou: {}", e)))?;
        results.push(result);
    }

    Ok(build_dedup_report(key, &results, &executions, started))
}

/// Dispara `callers` threads na mesma chave usando [`Group`].
pub fn run_dedup_blocking(
    key: String,
    callers: usize,
    delay: Duration,
) -> FlightResult<DedupReport> {
    let group: Arc<Group<String, usize, String>> = Arc::new(Group::new());
    let executions = Arc::new(AtomicUsize::new(0));
    let start_line = Arc::new(Barrier::new(callers.max(1)));
    let started = Instant::now();

    let handles: Vec<_> = (0..callers)
        .map(|_| {
            let group = Arc::clone(&group);
            let executions = Arc::clone(&executions);
            let start_line = Arc::clone(&start_line);
            let key = key.clone();
            std::thread::spawn(move || {
                start_line.wait();
                group.execute(key, || {
                    let n = executions.fetch_add(1, Ordering::SeqCst) + 1;
                    std::thread::sleep(delay);
                    Ok(n)
                })
            })
        })
        .collect();

    let mut results = Vec::with_capacity(callers);
    for handle in handles {
        let result = handle
            .join()
            .map_err(|_| FlightError::other("Thread de dedup entrou em pânico"))?;
        results.push(result);
    }

    Ok(build_dedup_report(key, &results, &executions, started))
}

fn build_dedup_report(
    key: String,
    results: &[Result<usize, String>],
    executions: &AtomicUsize,
    started: Instant,
) -> DedupReport {
    DedupReport {
        key,
        callers: results.len(),
        executions: executions.load(Ordering::SeqCst),
        shared: results.iter().filter(|r| **r == Ok(1)).count(),
        elapsed_ms: started.elapsed().as_millis(),
    }
}

/// Aplica `ops` a um cache novo e registra lookups, remoções e o estado final.
pub fn run_cache(capacity: usize, ops: &[CacheOp]) -> CacheReport {
    let (tx, rx) = mpsc::channel();
    let mut cache: RecencyCache<String, String> =
        RecencyCache::with_on_evicted(capacity, move |key, value| {
            // O receptor vive até o fim desta função.
            let _ = tx.send(Eviction { key, value });
        });

    let mut lookups = Vec::new();
    for op in ops {
        tracing::debug!(op = %op, "Applying cache operation");
        match op {
            CacheOp::Add { key, value } => cache.add(key.clone(), value.clone()),
            CacheOp::Get { key } => lookups.push(Lookup {
                key: key.clone(),
                value: cache.get(key.as_str()).cloned(),
            }),
            CacheOp::Remove { key } => cache.remove(key.as_str()),
            CacheOp::Oldest => cache.remove_oldest(),
            CacheOp::Clear => cache.clear(),
        }
    }

    let entries = cache
        .keys()
        .filter_map(|key| cache.peek(key).map(|value| (key.clone(), value.clone())))
        .collect();

    CacheReport {
        capacity,
        operations: ops.to_vec(),
        lookups,
        evictions: rx.try_iter().collect(),
        entries,
    }
}

/// Carrega a configuração de `path`; usa o padrão se o arquivo não existir
/// ou for inválido.
pub fn load_config(path: &Path) -> Config {
    if !path.exists() {
        return Config::default_config();
    }

    match Config::load(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Aviso: configuração inválida em {} ({}), usando padrão",
                path.display(),
                e
            );
            Config::default_config()
        }
    }
}
