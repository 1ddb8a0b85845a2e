//! Subcommand implementations. Each returns the text to print.

use color_eyre::Result;
use color_eyre::eyre::{WrapErr, eyre};
use serde::Deserialize;
use silica_core::{
    Circuit, DigestAlgorithm, decode_circuit, decode_share, encode_circuit, encode_share,
    hash_circuit_state_with, hash_runtime_state,
};
use silica_log::{EventLog, decode_event_log};
use silica_replay::{
    Inspector, ReplayConfig, Replayer, diff_state, validate_event_log, verify_replay,
};
use silica_sim::{CompositeNodeDef, EvaluatorConfig, EvaluatorFactory, Registry};
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Contents of `--config`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    evaluator: EvaluatorConfig,
    replay: ReplayConfig,
}

/// Registry and settings shared by every command
#[derive(Debug)]
pub struct Context {
    registry: Arc<Registry>,
    evaluator: EvaluatorConfig,
    replay: ReplayConfig,
}

impl Context {
    /// Built-in gates plus any chips, with settings from `config`
    pub fn load(config: Option<&Path>, chips: Option<&Path>) -> Result<Self> {
        let file_config: FileConfig = match config {
            Some(path) => serde_json::from_str(&read(path)?)
                .wrap_err_with(|| format!("invalid config {}", path.display()))?,
            None => FileConfig::default(),
        };

        let mut registry = Registry::with_builtins();
        if let Some(path) = chips {
            let defs: Vec<CompositeNodeDef> = serde_json::from_str(&read(path)?)
                .wrap_err_with(|| format!("invalid chip definitions in {}", path.display()))?;
            for def in defs {
                let name = def.name.clone();
                registry
                    .register_composite(def)
                    .wrap_err_with(|| format!("cannot register chip {}", name))?;
                tracing::info!(chip = %name, "registered composite");
            }
        }

        Ok(Self {
            registry: Arc::new(registry),
            evaluator: file_config.evaluator,
            replay: file_config.replay,
        })
    }

    fn replayer(&self) -> Replayer<EvaluatorFactory> {
        let factory =
            EvaluatorFactory::new(Arc::clone(&self.registry)).with_config(self.evaluator.clone());
        Replayer::new(factory).with_config(self.replay.clone())
    }

    fn inspector(&self) -> Inspector<EvaluatorFactory> {
        Inspector::new(self.replayer())
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).wrap_err_with(|| format!("failed to read {}", path.display()))
}

fn load_log(path: &Path) -> Result<EventLog> {
    decode_event_log(&read(path)?).wrap_err_with(|| format!("invalid event log {}", path.display()))
}

fn load_circuit(path: &Path) -> Result<Circuit> {
    decode_circuit(&read(path)?).wrap_err_with(|| format!("invalid circuit {}", path.display()))
}

fn initial_circuit(log: &EventLog) -> Result<Circuit> {
    validate_event_log(log)?;
    log.initial_circuit()
        .cloned()
        .ok_or_else(|| eyre!("log does not start with a circuit"))
}

pub fn validate(log_path: &Path) -> Result<String> {
    let log = load_log(log_path)?;
    validate_event_log(&log)?;
    Ok(format!("ok: {} events", log.len()))
}

pub fn replay(ctx: &Context, log_path: &Path) -> Result<String> {
    let log = load_log(log_path)?;
    let outcome = ctx.replayer().run(&log)?;
    let signals = outcome.engine.get_all_signals();
    let hash = hash_runtime_state(&outcome.circuit, signals)?;
    let report = serde_json::json!({
        "eventsProcessed": outcome.events_processed,
        "hash": hash,
        "signals": signals,
    });
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Returns the report and whether the hashes matched
pub fn verify(ctx: &Context, log_path: &Path, initial: Option<&Path>) -> Result<(String, bool)> {
    let log = load_log(log_path)?;
    let initial = match initial {
        Some(path) => load_circuit(path)?,
        None => initial_circuit(&log)?,
    };
    let verification = verify_replay(&ctx.replayer(), &initial, &log)?;
    Ok((serde_json::to_string_pretty(&verification)?, verification.equal))
}

pub fn inspect(ctx: &Context, log_path: &Path, index: usize) -> Result<String> {
    let log = load_log(log_path)?;
    let initial = initial_circuit(&log)?;
    let snapshot = ctx.inspector().get_state_at_index(&initial, &log, index)?;
    Ok(String::from_utf8(snapshot.encode()?)?)
}

pub fn diff(ctx: &Context, log_path: &Path, from: usize, to: usize, json: bool) -> Result<String> {
    let log = load_log(log_path)?;
    let initial = initial_circuit(&log)?;
    let inspector = ctx.inspector();
    let before = inspector.get_state_at_index(&initial, &log, from)?;
    let after = inspector.get_state_at_index(&initial, &log, to)?;
    let diff = diff_state(&before, &after);
    if json {
        let report = serde_json::json!({ "summary": diff.summary(), "diff": diff });
        return Ok(serde_json::to_string_pretty(&report)?);
    }
    Ok(diff.to_string().trim_end().to_string())
}

pub fn hash(circuit_path: &Path, algorithm: DigestAlgorithm) -> Result<String> {
    let circuit = load_circuit(circuit_path)?;
    Ok(hash_circuit_state_with(&circuit, algorithm)?.to_hex())
}

pub fn share_encode(circuit_path: &Path) -> Result<String> {
    Ok(encode_share(&load_circuit(circuit_path)?)?)
}

pub fn share_decode(share: &str) -> Result<String> {
    let circuit = decode_share(share.trim()).wrap_err("invalid share string")?;
    Ok(encode_circuit(&circuit)?)
}
