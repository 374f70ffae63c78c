//! Tessera Sim: an in-process table engine behind the `EngineBridge` contract
//!
//! `SimEngine` keeps every remote object in memory and answers the entry points in
//! [`tessera_core_interface::entry`] the way a live engine would: tables are partitioned,
//! temporary views live in a session catalog, storage levels are validated engine-side,
//! and failures come back as engine diagnostics.
//!
//! It exists so the proxy layer can be exercised end to end without a cluster.
//!
//! # Example
//!
//! ```
//! use tessera_core_interface::{EngineBridge, EngineVersion, LocalTable, Value};
//! use tessera_sim::SimEngine;
//!
//! let engine = SimEngine::new(EngineVersion::new(2, 4, 0)).with_default_partitions(3);
//! let table = LocalTable::from_columns([("x", vec![Value::Int(1), Value::Int(2)])]).unwrap();
//! let handle = engine.upload_table(&table, "numbers", 0).unwrap();
//!
//! assert_eq!(engine.views(), vec!["numbers"]);
//! assert_eq!(engine.partition_sizes(&handle).unwrap().len(), 3);
//! ```
//!
//! # Test hooks
//!
//! - [`SimEngine::fail_on`] makes one method fail with a given diagnostic
//! - [`SimEngine::calls`] records every method name in call order
//! - [`SimEngine::register_transformer`] adds column transformers

mod frame;
mod transformers;

pub use transformers::Transformer;

use frame::{compare_values, describe, dtype, ColumnExpr, Frame, Row};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tessera_core_interface::{
    entry, BridgeError, EngineBridge, EngineVersion, LocalTable, RemoteHandle, Result, Value,
};
use tracing::trace;

/// Storage levels the engine accepts
const STORAGE_LEVELS: &[&str] = &[
    "NONE",
    "DISK_ONLY",
    "DISK_ONLY_2",
    "MEMORY_ONLY",
    "MEMORY_ONLY_2",
    "MEMORY_ONLY_SER",
    "MEMORY_ONLY_SER_2",
    "MEMORY_AND_DISK",
    "MEMORY_AND_DISK_2",
    "MEMORY_AND_DISK_SER",
    "MEMORY_AND_DISK_SER_2",
    "OFF_HEAP",
];

/// Method name recorded for uploads (also usable with `fail_on`)
pub const UPLOAD_TABLE: &str = "uploadTable";

enum Object {
    Frame(Frame),
    Column(ColumnExpr),
    StorageLevel(String),
    Stat(Frame),
}

struct SimState {
    next_id: u64,
    objects: HashMap<u64, Object>,
    views: BTreeMap<String, u64>,
    transformers: HashMap<String, Transformer>,
    failures: HashMap<String, String>,
    calls: Vec<String>,
    checkpoint_dir: Option<String>,
}

impl SimState {
    fn alloc(&mut self, object: Object) -> u64 {
        self.next_id += 1;
        self.objects.insert(self.next_id, object);
        self.next_id
    }

    /// Log the call and apply failure injection
    fn record(&mut self, method: &str) -> Result<()> {
        self.calls.push(method.to_string());
        match self.failures.get(method) {
            Some(message) => Err(BridgeError::Remote(message.clone())),
            None => Ok(()),
        }
    }

    fn frame(&self, id: u64) -> Result<&Frame> {
        match self.objects.get(&id) {
            Some(Object::Frame(frame)) => Ok(frame),
            Some(_) => Err(BridgeError::Remote(format!("Object {} is not a table", id))),
            None => Err(BridgeError::Remote(format!("Object {} not found", id))),
        }
    }
}

/// In-process engine session
pub struct SimEngine {
    session: Arc<str>,
    version: EngineVersion,
    default_partitions: usize,
    state: Mutex<SimState>,
}

impl SimEngine {
    pub fn new(version: EngineVersion) -> Self {
        Self {
            session: Arc::from("sim-session"),
            version,
            default_partitions: 2,
            state: Mutex::new(SimState {
                next_id: 0,
                objects: HashMap::new(),
                views: BTreeMap::new(),
                transformers: transformers::builtin(),
                failures: HashMap::new(),
                calls: Vec::new(),
                checkpoint_dir: None,
            }),
        }
    }

    pub fn with_session(mut self, session: &str) -> Self {
        self.session = Arc::from(session);
        self
    }

    /// Partition count used when an upload or shuffle does not ask for one
    pub fn with_default_partitions(mut self, partitions: usize) -> Self {
        self.default_partitions = partitions.max(1);
        self
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self, id: u64) -> RemoteHandle {
        RemoteHandle::new(self.session.clone(), id)
    }

    fn own(&self, handle: &RemoteHandle) -> Result<u64> {
        handle.ensure_session(&self.session)?;
        Ok(handle.object_id())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Test hooks
    // ═══════════════════════════════════════════════════════════════════════

    pub fn register_transformer(&self, name: &str, transformer: Transformer) {
        self.state().transformers.insert(name.to_string(), transformer);
    }

    /// Make every call to `method` fail with `message`
    pub fn fail_on(&self, method: &str, message: &str) {
        self.state()
            .failures
            .insert(method.to_string(), message.to_string());
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// Method names in call order
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Registered temporary view names, sorted
    pub fn views(&self) -> Vec<String> {
        self.state().views.keys().cloned().collect()
    }

    pub fn view(&self, name: &str) -> Option<RemoteHandle> {
        self.state().views.get(name).map(|&id| self.handle(id))
    }

    pub fn checkpoint_dir(&self) -> Option<String> {
        self.state().checkpoint_dir.clone()
    }

    fn inspect<T>(&self, handle: &RemoteHandle, f: impl FnOnce(&Frame) -> T) -> Option<T> {
        let id = self.own(handle).ok()?;
        let state = self.state();
        let out = state.frame(id).ok().map(f);
        out
    }

    pub fn storage_level(&self, handle: &RemoteHandle) -> Option<String> {
        self.inspect(handle, |f| f.storage.clone()).flatten()
    }

    pub fn partition_sizes(&self, handle: &RemoteHandle) -> Option<Vec<usize>> {
        self.inspect(handle, |f| f.partitions.iter().map(Vec::len).collect())
    }

    pub fn is_broadcast(&self, handle: &RemoteHandle) -> bool {
        self.inspect(handle, |f| f.broadcast).unwrap_or(false)
    }

    pub fn is_checkpointed(&self, handle: &RemoteHandle) -> bool {
        self.inspect(handle, |f| f.checkpointed).unwrap_or(false)
    }

    /// All rows in partition order
    pub fn rows(&self, handle: &RemoteHandle) -> Option<Vec<Vec<Value>>> {
        self.inspect(handle, |f| f.rows().cloned().collect())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Dispatch
    // ═══════════════════════════════════════════════════════════════════════

    fn frame_method(
        &self,
        state: &mut SimState,
        id: u64,
        method: &str,
        args: &[Value],
    ) -> Result<Value> {
        let frame = state.frame(id)?.clone();

        match method {
            entry::CREATE_OR_REPLACE_TEMP_VIEW => {
                let name = arg_str(args, 0, method)?;
                state.views.insert(name.to_string(), id);
                Ok(Value::Null)
            }
            entry::CACHE => self.set_storage(state, id, frame, Some("MEMORY_AND_DISK".to_string())),
            entry::PERSIST => {
                let level = match state.objects.get(&arg_handle(args, 0, method)?.object_id()) {
                    Some(Object::StorageLevel(level)) => level.clone(),
                    _ => return Err(remote("persist: argument is not a StorageLevel")),
                };
                self.set_storage(state, id, frame, Some(level))
            }
            entry::UNPERSIST => self.set_storage(state, id, frame, None),
            entry::CHECKPOINT => {
                if state.checkpoint_dir.is_none() {
                    return Err(remote(
                        "org.apache.spark.SparkException: Checkpoint directory has not been set in the SparkContext",
                    ));
                }
                let mut out = frame.derive(frame.partitions.clone());
                out.checkpointed = true;
                Ok(self.new_frame(state, out))
            }
            entry::REPARTITION => {
                let (count, columns) = match args {
                    [Value::Int(n)] => (*n, Vec::new()),
                    [Value::Int(n), cols @ Value::Array(_)] => (*n, cols.clone().into_strings()?),
                    [cols @ Value::Array(_)] => (0, cols.clone().into_strings()?),
                    _ => return Err(remote("repartition: unsupported arguments")),
                };
                let count = if count > 0 {
                    count as usize
                } else {
                    self.default_partitions
                };
                let partitions = if columns.is_empty() {
                    frame.round_robin(count)
                } else {
                    let keys = columns
                        .iter()
                        .map(|c| frame.column_index(c))
                        .collect::<Result<Vec<_>>>()?;
                    frame.hash_partitioned(&keys, count)
                };
                Ok(self.new_frame(state, frame.derive(partitions)))
            }
            entry::COALESCE => {
                let n = arg_i64(args, 0, method)?;
                if n < 1 {
                    return Err(remote(&format!(
                        "java.lang.IllegalArgumentException: requirement failed: Number of partitions ({}) must be positive.",
                        n
                    )));
                }
                Ok(self.new_frame(state, frame.derive(frame.coalesced(n as usize))))
            }
            entry::SORT => {
                let mut columns = vec![arg_str(args, 0, method)?.to_string()];
                if let Some(rest) = args.get(1) {
                    columns.extend(rest.clone().into_strings()?);
                }
                let keys = columns
                    .iter()
                    .map(|c| frame.column_index(c))
                    .collect::<Result<Vec<_>>>()?;
                let mut rows: Vec<Row> = frame.rows().cloned().collect();
                rows.sort_by(|a, b| {
                    keys.iter()
                        .map(|&k| compare_values(&a[k], &b[k]))
                        .find(|o| o.is_ne())
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                let sorted = Frame::sliced(frame.columns.clone(), rows, frame.partitions.len());
                Ok(self.new_frame(state, sorted))
            }
            entry::SAMPLE => {
                let with_replacement = arg_bool(args, 0, method)?;
                let fraction = arg_f64(args, 1, method)?;
                let mut rng = rng_for(args.get(2).map(Value::as_i64).transpose()?);
                let partitions = frame
                    .partitions
                    .iter()
                    .map(|rows| {
                        let mut kept = Vec::new();
                        for row in rows {
                            let copies = if with_replacement {
                                fraction.floor() as usize
                                    + usize::from(rng.random::<f64>() < fraction.fract())
                            } else {
                                usize::from(rng.random::<f64>() < fraction)
                            };
                            kept.extend(std::iter::repeat(row.clone()).take(copies));
                        }
                        kept
                    })
                    .collect();
                Ok(self.new_frame(state, frame.derive(partitions)))
            }
            entry::RANDOM_SPLIT => {
                let weights = args
                    .first()
                    .cloned()
                    .ok_or_else(|| remote("randomSplit: missing weights"))?
                    .into_array()?
                    .iter()
                    .map(Value::as_f64)
                    .collect::<Result<Vec<_>>>()?;
                let total: f64 = weights.iter().sum();
                if total <= 0.0 || weights.iter().any(|w| *w < 0.0) {
                    return Err(remote(
                        "java.lang.IllegalArgumentException: requirement failed: Weights must be nonnegative with a positive sum",
                    ));
                }
                let mut rng = rng_for(args.get(1).map(Value::as_i64).transpose()?);
                let mut splits: Vec<Vec<Vec<Row>>> = weights
                    .iter()
                    .map(|_| frame.partitions.iter().map(|_| Vec::new()).collect())
                    .collect();
                for (p, rows) in frame.partitions.iter().enumerate() {
                    for row in rows {
                        let draw = rng.random::<f64>() * total;
                        let mut acc = 0.0;
                        let mut bucket = weights.len() - 1;
                        for (i, w) in weights.iter().enumerate() {
                            acc += w;
                            if draw < acc {
                                bucket = i;
                                break;
                            }
                        }
                        splits[bucket][p].push(row.clone());
                    }
                }
                let handles = splits
                    .into_iter()
                    .map(|partitions| self.new_frame(state, frame.derive(partitions)))
                    .collect();
                Ok(Value::Array(handles))
            }
            entry::WITH_COLUMN => {
                let name = arg_str(args, 0, method)?;
                let expr = match state.objects.get(&arg_handle(args, 1, method)?.object_id()) {
                    Some(Object::Column(expr)) => expr.clone(),
                    _ => return Err(remote("withColumn: argument is not a Column")),
                };
                let values = expr.evaluate(&frame)?;
                Ok(self.new_frame(state, frame.with_column(name, values)))
            }
            entry::COL => {
                let name = arg_str(args, 0, method)?;
                frame.column_index(name)?;
                let id = state.alloc(Object::Column(ColumnExpr::Ref(name.to_string())));
                Ok(Value::Handle(self.handle(id)))
            }
            entry::COLUMNS => Ok(Value::strings(frame.columns.iter().cloned())),
            entry::DTYPES => Ok(Value::Array(
                frame
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(i, name)| {
                        Value::strings([name.clone(), dtype(frame.rows().map(|r| &r[i])).to_string()])
                    })
                    .collect(),
            )),
            entry::COUNT => Ok(Value::Int(frame.num_rows() as i64)),
            entry::COLLECT_COLUMN => {
                let name = arg_str(args, 0, method)?;
                Ok(Value::Array(frame.column_values(name)?))
            }
            entry::STAT => {
                let id = state.alloc(Object::Stat(frame));
                Ok(Value::Handle(self.handle(id)))
            }
            entry::DESCRIBE => {
                let columns = match args.first() {
                    Some(cols) => cols.clone().into_strings()?,
                    None => Vec::new(),
                };
                let columns = if columns.is_empty() {
                    frame.columns.clone()
                } else {
                    columns
                };
                let summary = describe(&frame, &columns)?;
                Ok(self.new_frame(state, summary))
            }
            entry::GET_NUM_PARTITIONS => Ok(Value::Int(frame.partitions.len() as i64)),
            other => Err(no_method("Dataset", other)),
        }
    }

    fn set_storage(
        &self,
        state: &mut SimState,
        id: u64,
        mut frame: Frame,
        level: Option<String>,
    ) -> Result<Value> {
        frame.storage = level;
        state.objects.insert(id, Object::Frame(frame));
        Ok(Value::Handle(self.handle(id)))
    }

    fn new_frame(&self, state: &mut SimState, frame: Frame) -> Value {
        let id = state.alloc(Object::Frame(frame));
        Value::Handle(self.handle(id))
    }

    fn column_method(
        &self,
        state: &mut SimState,
        expr: ColumnExpr,
        method: &str,
        args: &[Value],
    ) -> Result<Value> {
        match method {
            entry::CAST => {
                let target = arg_str(args, 0, method)?.to_lowercase();
                let id = state.alloc(Object::Column(ColumnExpr::Cast(Box::new(expr), target)));
                Ok(Value::Handle(self.handle(id)))
            }
            other => Err(no_method("Column", other)),
        }
    }

    fn stat_method(frame: &Frame, method: &str, args: &[Value]) -> Result<Value> {
        match method {
            entry::APPROX_QUANTILE => {
                let column = arg_str(args, 0, method)?;
                let probabilities = args
                    .get(1)
                    .cloned()
                    .ok_or_else(|| remote("approxQuantile: missing probabilities"))?
                    .into_array()?;
                let mut values: Vec<f64> = frame
                    .column_values(column)?
                    .iter()
                    .filter_map(|v| v.as_f64().ok())
                    .collect();
                if values.is_empty() {
                    return Ok(Value::Array(Vec::new()));
                }
                values.sort_by(f64::total_cmp);
                probabilities
                    .iter()
                    .map(|p| {
                        let p = p.as_f64()?;
                        let rank = (p * values.len() as f64).ceil() as usize;
                        let index = rank.saturating_sub(1).min(values.len() - 1);
                        Ok(Value::Double(values[index]))
                    })
                    .collect::<Result<Vec<_>>>()
                    .map(Value::Array)
            }
            other => Err(no_method("DataFrameStatFunctions", other)),
        }
    }

    fn static_method(
        &self,
        state: &mut SimState,
        class: &str,
        method: &str,
        args: &[Value],
    ) -> Result<Value> {
        match (class, method) {
            (entry::STORAGE_LEVEL_CLASS, entry::STORAGE_LEVEL_FROM_STRING) => {
                let level = arg_str(args, 0, method)?;
                if !STORAGE_LEVELS.contains(&level) {
                    return Err(remote(&format!(
                        "java.lang.IllegalArgumentException: Invalid StorageLevel: {}",
                        level
                    )));
                }
                let id = state.alloc(Object::StorageLevel(level.to_string()));
                Ok(Value::Handle(self.handle(id)))
            }
            (entry::FUNCTIONS_CLASS, entry::BROADCAST) => {
                let id = self.own(arg_handle(args, 0, method)?)?;
                let mut frame = state.frame(id)?.clone();
                frame.broadcast = true;
                frame.storage = None;
                Ok(self.new_frame(state, frame))
            }
            (entry::FUNCTIONS_CLASS, entry::MONOTONICALLY_INCREASING_ID) => {
                let id = state.alloc(Object::Column(ColumnExpr::MonotonicId));
                Ok(Value::Handle(self.handle(id)))
            }
            (entry::UTILS_CLASS, entry::ADD_SEQUENTIAL_INDEX) => {
                let id = self.own(arg_handle(args, 0, method)?)?;
                let from = arg_i64(args, 1, method)?;
                let column = arg_str(args, 2, method)?;
                let frame = state.frame(id)?.clone();
                let mut next = from;
                let values: Vec<Vec<Value>> = frame
                    .partitions
                    .iter()
                    .map(|rows| {
                        rows.iter()
                            .map(|_| {
                                let value = Value::Double(next as f64);
                                next += 1;
                                value
                            })
                            .collect()
                    })
                    .collect();
                Ok(self.new_frame(state, frame.with_column(column, values)))
            }
            (entry::UTILS_CLASS, entry::GET_LAST_INDEX) => {
                let id = self.own(arg_handle(args, 0, method)?)?;
                let column = arg_str(args, 1, method)?;
                let frame = state.frame(id)?;
                let index = frame.column_index(column)?;
                let last = frame
                    .partitions
                    .iter()
                    .rev()
                    .find(|rows| !rows.is_empty())
                    .and_then(|rows| {
                        rows.iter()
                            .filter_map(|row| row[index].as_f64().ok())
                            .max_by(f64::total_cmp)
                    });
                Ok(last.map(Value::Double).unwrap_or(Value::Null))
            }
            (entry::UTILS_CLASS, entry::SET_CHECKPOINT_DIR) => {
                state.checkpoint_dir = Some(arg_str(args, 0, method)?.to_string());
                Ok(Value::Null)
            }
            (entry::CATALOG_CLASS, entry::DROP_TEMP_VIEW) => {
                let name = arg_str(args, 0, method)?;
                Ok(Value::Bool(state.views.remove(name).is_some()))
            }
            (entry::TRANSFORMERS_CLASS, name) => {
                let transformer = state.transformers.get(name).cloned().ok_or_else(|| {
                    remote(&format!("java.lang.NoSuchMethodException: no transformer named '{}'", name))
                })?;
                let id = self.own(arg_handle(args, 0, method)?)?;
                let input = arg_str(args, 1, method)?;
                let output = arg_str(args, 2, method)?;
                let extra = args.get(3..).unwrap_or_default();
                let frame = state.frame(id)?.clone();
                let index = frame.column_index(input)?;
                let values = frame
                    .partitions
                    .iter()
                    .map(|rows| {
                        rows.iter()
                            .map(|row| transformer(&row[index], extra).map_err(BridgeError::Remote))
                            .collect::<Result<Vec<_>>>()
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(self.new_frame(state, frame.with_column(output, values)))
            }
            (class, method) => Err(no_method(class, method)),
        }
    }
}

impl EngineBridge for SimEngine {
    fn session_id(&self) -> &str {
        &self.session
    }

    fn engine_version(&self) -> Result<EngineVersion> {
        Ok(self.version)
    }

    fn invoke(&self, handle: &RemoteHandle, method: &str, args: &[Value]) -> Result<Value> {
        let id = self.own(handle)?;
        let mut state = self.state();
        state.record(method)?;
        trace!(handle = %handle, method, "sim invoke");

        let column = match state.objects.get(&id) {
            Some(Object::Frame(_)) => None,
            Some(Object::Column(expr)) => Some(expr.clone()),
            Some(Object::Stat(frame)) => return Self::stat_method(frame, method, args),
            Some(Object::StorageLevel(_)) => return Err(no_method("StorageLevel", method)),
            None => return Err(remote(&format!("Object {} not found", handle))),
        };

        match column {
            Some(expr) => self.column_method(&mut state, expr, method, args),
            None => self.frame_method(&mut state, id, method, args),
        }
    }

    fn invoke_static(&self, class: &str, method: &str, args: &[Value]) -> Result<Value> {
        let mut state = self.state();
        state.record(method)?;
        trace!(class, method, "sim invoke_static");
        self.static_method(&mut state, class, method, args)
    }

    fn upload_table(&self, table: &LocalTable, name: &str, repartition: u32) -> Result<RemoteHandle> {
        let mut state = self.state();
        state.record(UPLOAD_TABLE)?;
        let partitions = if repartition > 0 {
            repartition as usize
        } else {
            self.default_partitions
        };
        let id = state.alloc(Object::Frame(Frame::from_table(table, partitions)));
        state.views.insert(name.to_string(), id);
        trace!(name, rows = table.num_rows(), partitions, "sim upload");
        Ok(self.handle(id))
    }
}

fn remote(message: &str) -> BridgeError {
    BridgeError::Remote(message.to_string())
}

fn no_method(class: &str, method: &str) -> BridgeError {
    remote(&format!(
        "java.lang.NoSuchMethodException: {}.{}",
        class, method
    ))
}

fn rng_for(seed: Option<i64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed as u64),
        None => StdRng::seed_from_u64(rand::random()),
    }
}

fn arg<'a>(args: &'a [Value], index: usize, method: &str) -> Result<&'a Value> {
    args.get(index)
        .ok_or_else(|| remote(&format!("{}: missing argument {}", method, index)))
}

fn arg_str<'a>(args: &'a [Value], index: usize, method: &str) -> Result<&'a str> {
    arg(args, index, method)?.as_str()
}

fn arg_i64(args: &[Value], index: usize, method: &str) -> Result<i64> {
    arg(args, index, method)?.as_i64()
}

fn arg_f64(args: &[Value], index: usize, method: &str) -> Result<f64> {
    arg(args, index, method)?.as_f64()
}

fn arg_bool(args: &[Value], index: usize, method: &str) -> Result<bool> {
    arg(args, index, method)?.as_bool()
}

fn arg_handle<'a>(args: &'a [Value], index: usize, method: &str) -> Result<&'a RemoteHandle> {
    arg(args, index, method)?.as_handle()
}
