//! Runtime: one `Engine` per cleaning run.
//!
//! - `prepare` discovers and probes the inputs and lowers the cleaning plan.
//! - `run` instantiates operators from the program's bindings, streams each
//!   file in `batch_rows` blocks through them into the parquet sink, then
//!   verifies the written file with an independent reader.
//! - All run resources (staged temp file, readers, writer) are scoped to
//!   `run` and released on every exit path.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::{debug, info, trace, warn};

use tripclean_core::config::CleanConfig;
use tripclean_core::dag::{LogicalPlan, ScanSpec};
use tripclean_core::error::Error as CoreError;
use tripclean_core::hash::Hash256;
use tripclean_core::id::OpId;
use tripclean_core::manifest::RunManifest;
use tripclean_core::prelude::Schema;
use tripclean_core::types::RowBatch;

use tripclean_io::readers::parquet::count_rows;
use tripclean_io::{probe, resolve_inputs, CsvBatchReader, CsvOptions, ParquetWriter};

use tripclean_operators::{Filter, Map, OpError, Operator};

use tripclean_planner::physical::{OperatorBinding, PhysicalProgram};
use tripclean_planner::{lower_to_physical, Relation, TripCleaningPolicy};

use crate::metrics::StageCounters;
use crate::replay::{hash_inputs, hash_output, hash_program};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("operator registry: {0}")]
    Registry(String),
    #[error("invalid plan: {0}")]
    Invalid(String),
}

impl From<OpError> for ExecError {
    fn from(e: OpError) -> Self {
        ExecError::Core(e.into())
    }
}

impl ExecError {
    /// The run-level error this failure corresponds to.
    pub fn into_core(self) -> CoreError {
        match self {
            ExecError::Core(e) => e,
            ExecError::Registry(m) | ExecError::Invalid(m) => CoreError::Plan(m),
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub files: usize,
    pub raw_rows: u64,
    pub clean_rows: u64,
    /// Row count read back from the written file; equals `clean_rows`.
    pub verified_rows: u64,
    pub output: PathBuf,
    pub manifest: RunManifest,
}

/// Everything `prepare` produced: the input set, the clean relation's logical
/// plan (sink included), and its lowered program.
#[derive(Debug, Clone)]
pub struct PreparedRun {
    pub files: Vec<PathBuf>,
    pub logical: LogicalPlan,
    pub program: PhysicalProgram,
}

/// Per-run session: owns the configuration and cleaning policy.
pub struct Engine {
    cfg: CleanConfig,
    policy: TripCleaningPolicy,
}

impl Engine {
    pub fn new(cfg: CleanConfig) -> Result<Self, ExecError> {
        cfg.validate()?;
        let policy = TripCleaningPolicy::new(cfg.duration);
        Ok(Self { cfg, policy })
    }

    pub fn config(&self) -> &CleanConfig {
        &self.cfg
    }

    pub fn policy(&self) -> &TripCleaningPolicy {
        &self.policy
    }

    /// CSV options for this run; coerced columns are always read as text.
    pub fn csv_options(&self) -> CsvOptions {
        CsvOptions {
            sample_rows: self.cfg.inference_limit(),
            type_overrides: TripCleaningPolicy::type_overrides(),
            ..CsvOptions::default()
        }
    }

    /// Resolve, probe, and plan. Reads only headers and the inference sample.
    pub fn prepare(&self) -> Result<PreparedRun, ExecError> {
        let files = resolve_inputs(Path::new(&self.cfg.raw_dir), &self.cfg.pattern)?;
        info!(count = files.len(), raw_dir = %self.cfg.raw_dir, "found input files");

        let spec = probe(&files, &self.csv_options())?;
        let clean = Relation::scan(spec)
            .typed()?
            .enriched()?
            .clean(&self.policy)?;
        let output = self.cfg.output_path();
        let logical = clean.sink(output.to_string_lossy(), "parquet")?;
        let program = lower_to_physical(&logical)?;
        debug!(plan = %logical.explain(), "planned cleaning pipeline");

        Ok(PreparedRun {
            files,
            logical,
            program,
        })
    }

    /// `prepare` followed by `run`.
    pub fn execute(&mut self) -> Result<RunReport, ExecError> {
        let prepared = self.prepare()?;
        self.run(&prepared.program)
    }

    /// Execute a prepared `PhysicalProgram` and return the verified report.
    pub fn run(&mut self, program: &PhysicalProgram) -> Result<RunReport, ExecError> {
        let plan_hash = hash_program(program)?;
        let started = now_millis();

        let stages = program.stages();
        let (spec, middle, dest) = match stages.as_slice() {
            [(_, source), middle @ .., (_, sink)] => {
                (decode_source(source)?, middle, decode_sink(sink)?)
            }
            _ => return Err(ExecError::Invalid("pipeline needs a source and a sink".into())),
        };

        // Instantiate and plan the operator chain against the scan schema.
        let mut ops: Vec<(OpId, Box<dyn Operator>)> = Vec::with_capacity(middle.len());
        let mut counters = StageCounters::default();
        let mut schema: Schema = spec.schema.clone();
        for (op_id, binding) in middle {
            let op = instantiate(binding)?;
            schema = op.plan(std::slice::from_ref(&schema))?.output_schema;
            counters.register(*op_id, op.name());
            ops.push((*op_id, op));
        }

        let inputs_digest = hash_inputs(&spec.files)?;
        let options = self.csv_options();
        let batch_rows = self.cfg.batch_rows;

        let mut writer = ParquetWriter::create(&dest, &schema)?;
        let mut raw_rows = 0u64;
        for file in &spec.files {
            let path = Path::new(file);
            let mut reader = CsvBatchReader::open(path, &spec, &options)?;
            while let Some(batch) = reader.next_batch(batch_rows)? {
                let n = batch.num_rows();
                let out = run_chain(&ops, &mut counters, batch)?;
                trace!(file = %path.display(), rows_in = n, rows_out = out.num_rows(), "block");
                writer.write_batch(&out)?;
            }
            raw_rows += reader.rows_read();
            debug!(file = %path.display(), rows = reader.rows_read(), "file done");
        }
        info!(raw_rows, "scanned raw rows");

        let clean_rows = writer.finish()?;
        counters.emit();
        info!(clean_rows, output = %dest.display(), "wrote cleaned parquet");

        let verified_rows = verify(&dest, clean_rows)?;
        let manifest = RunManifest::new(plan_hash, started)
            .with_inputs(inputs_digest)
            .finish(now_millis(), output_digest(&dest));
        info!(
            manifest = %manifest.id.0,
            plan_hash = %manifest.plan_hash,
            elapsed_ms = manifest.elapsed_ms(),
            "run complete"
        );

        Ok(RunReport {
            files: spec.files.len(),
            raw_rows,
            clean_rows,
            verified_rows,
            output: dest,
            manifest,
        })
    }
}

fn run_chain(
    ops: &[(OpId, Box<dyn Operator>)],
    counters: &mut StageCounters,
    batch: RowBatch,
) -> Result<RowBatch, ExecError> {
    let mut cur = batch;
    for (idx, (_, op)) in ops.iter().enumerate() {
        let next = op.eval_block(std::slice::from_ref(&cur))?;
        counters.record(idx, cur.num_rows(), next.num_rows());
        cur = next;
    }
    Ok(cur)
}

fn instantiate(binding: &OperatorBinding) -> Result<Box<dyn Operator>, ExecError> {
    let config = binding.config.clone();
    let op: Box<dyn Operator> = match binding.key.as_str() {
        "map" => Box::new(
            serde_json::from_value::<Map>(config)
                .map_err(|e| ExecError::Registry(format!("map config: {e}")))?,
        ),
        "filter" => Box::new(
            serde_json::from_value::<Filter>(config)
                .map_err(|e| ExecError::Registry(format!("filter config: {e}")))?,
        ),
        other => {
            return Err(ExecError::Registry(format!(
                "unknown operator key '{other}'"
            )))
        }
    };
    Ok(op)
}

fn decode_source(binding: &OperatorBinding) -> Result<ScanSpec, ExecError> {
    if binding.key != "source" {
        return Err(ExecError::Invalid(format!(
            "first stage must be a source, got '{}'",
            binding.key
        )));
    }
    serde_json::from_value(binding.config.clone())
        .map_err(|e| ExecError::Registry(format!("source config: {e}")))
}

fn decode_sink(binding: &OperatorBinding) -> Result<PathBuf, ExecError> {
    if binding.key != "sink" {
        return Err(ExecError::Invalid(format!(
            "last stage must be a sink, got '{}'",
            binding.key
        )));
    }
    let format = binding.config.get("format").and_then(|v| v.as_str());
    if format != Some("parquet") {
        return Err(ExecError::Invalid(format!(
            "unsupported sink format {format:?}"
        )));
    }
    binding
        .config
        .get("destination")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
        .ok_or_else(|| ExecError::Registry("sink config: missing destination".into()))
}

/// Re-read `dest` and compare with the writer's count. A mismatching file is
/// removed.
fn verify(dest: &Path, expected: u64) -> Result<u64, ExecError> {
    let found = count_rows(dest)?;
    if found != expected {
        if let Err(e) = std::fs::remove_file(dest) {
            warn!(path = %dest.display(), error = %e, "failed to remove unverified output");
        }
        return Err(CoreError::VerificationMismatch(format!(
            "{}: wrote {expected} rows, read back {found}",
            dest.display()
        ))
        .into());
    }
    debug!(rows = found, "verified output");
    Ok(found)
}

/// Digest of the published output for the manifest. The file is already
/// committed and verified here, so a failure only drops the digest.
fn output_digest(dest: &Path) -> Option<Hash256> {
    match hash_output(dest) {
        Ok(h) => Some(h),
        Err(e) => {
            warn!(
                path = %dest.display(),
                error = %e,
                "could not digest output; manifest omits it"
            );
            None
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
