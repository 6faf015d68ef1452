//! Event ledger for the warehouse simulation.
//!
//! A `tracing` subscriber that files every INFO event under its target and
//! keeps one column per field name. Tables are shaped by whatever the
//! simulation emits, so adding a field to an event adds a column here.
//!
//! ```ignore
//! // simulation side
//! tracing::info!(target: "bulk_remove", warehouse_id, loads);
//!
//! // test side
//! let recorder = tracing::subscriber::with_default(instrument::LedgerSubscriber, || {
//!     run_city();
//!     instrument::drain()
//! });
//! let drains = recorder.table("bulk_remove").unwrap();
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;

use polars::prelude::*;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Record};
use tracing::{Event, Id, Metadata, Subscriber};

/// Values of one field across every row of a table.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedColumn {
    U64(Vec<u64>),
    I64(Vec<i64>),
    Bool(Vec<bool>),
    Str(Vec<String>),
}

impl TypedColumn {
    fn empty_like(value: &FieldValue, rows: usize) -> Self {
        match value {
            FieldValue::U64(_) => TypedColumn::U64(vec![0; rows]),
            FieldValue::I64(_) => TypedColumn::I64(vec![0; rows]),
            FieldValue::Bool(_) => TypedColumn::Bool(vec![false; rows]),
            FieldValue::Str(_) => TypedColumn::Str(vec![String::new(); rows]),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TypedColumn::U64(v) => v.len(),
            TypedColumn::I64(v) => v.len(),
            TypedColumn::Bool(v) => v.len(),
            TypedColumn::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a value, or the column's zero value when the field is
    /// missing from the row or arrives with a different type.
    fn push(&mut self, value: Option<FieldValue>) {
        match (self, value) {
            (TypedColumn::U64(v), Some(FieldValue::U64(x))) => v.push(x),
            (TypedColumn::I64(v), Some(FieldValue::I64(x))) => v.push(x),
            (TypedColumn::Bool(v), Some(FieldValue::Bool(x))) => v.push(x),
            (TypedColumn::Str(v), Some(FieldValue::Str(x))) => v.push(x),
            (TypedColumn::U64(v), _) => v.push(0),
            (TypedColumn::I64(v), _) => v.push(0),
            (TypedColumn::Bool(v), _) => v.push(false),
            (TypedColumn::Str(v), _) => v.push(String::new()),
        }
    }

    fn to_column(&self, name: &str) -> Column {
        match self {
            TypedColumn::U64(v) => Column::new(name.into(), v),
            TypedColumn::I64(v) => Column::new(name.into(), v),
            TypedColumn::Bool(v) => Column::new(name.into(), v),
            TypedColumn::Str(v) => Column::new(name.into(), v),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum FieldValue {
    U64(u64),
    I64(i64),
    Bool(bool),
    Str(String),
}

/// Rows recorded under one event target.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    pub columns: BTreeMap<String, TypedColumn>,
    pub row_count: usize,
}

impl EventTable {
    /// Append one row. Every column ends up `row_count` long.
    fn push_row(&mut self, mut row: BTreeMap<String, FieldValue>) {
        for (name, column) in self.columns.iter_mut() {
            column.push(row.remove(name));
        }
        // Fields seen for the first time get a zero-filled history
        for (name, value) in row {
            let mut column = TypedColumn::empty_like(&value, self.row_count);
            column.push(Some(value));
            self.columns.insert(name, column);
        }
        self.row_count += 1;
    }

    pub fn u64_column(&self, name: &str) -> Option<&[u64]> {
        match self.columns.get(name)? {
            TypedColumn::U64(v) => Some(v),
            _ => None,
        }
    }

    pub fn str_column(&self, name: &str) -> Option<&[String]> {
        match self.columns.get(name)? {
            TypedColumn::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        DataFrame::new(
            self.columns
                .iter()
                .map(|(name, column)| column.to_column(name))
                .collect(),
        )
    }
}

/// Every table recorded on this thread, keyed by event target.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub tables: BTreeMap<String, EventTable>,
}

impl Recorder {
    pub fn table(&self, target: &str) -> Option<&EventTable> {
        self.tables.get(target)
    }

    /// Rows recorded under `target`, zero if it never fired
    pub fn rows(&self, target: &str) -> usize {
        self.table(target).map_or(0, |t| t.row_count)
    }

    pub fn to_dataframes(&self) -> PolarsResult<BTreeMap<String, DataFrame>> {
        self.tables
            .iter()
            .map(|(target, table)| Ok((target.clone(), table.to_dataframe()?)))
            .collect()
    }
}

thread_local! {
    static LEDGER: RefCell<Recorder> = RefCell::default();
}

#[derive(Default)]
struct RowVisitor {
    row: BTreeMap<String, FieldValue>,
}

impl RowVisitor {
    fn put(&mut self, field: &Field, value: FieldValue) {
        self.row.insert(field.name().to_string(), value);
    }
}

impl Visit for RowVisitor {
    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, FieldValue::U64(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, FieldValue::I64(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, FieldValue::Bool(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, FieldValue::Str(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, FieldValue::Str(format!("{value:?}")));
    }
}

/// Subscriber that writes INFO-and-above events into the thread-local ledger.
/// Spans are accepted but not tracked.
pub struct LedgerSubscriber;

impl Subscriber for LedgerSubscriber {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.is_event() && *metadata.level() <= tracing::Level::INFO
    }

    fn new_span(&self, _span: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let mut visitor = RowVisitor::default();
        event.record(&mut visitor);
        let target = event.metadata().target();

        LEDGER.with(|ledger| {
            ledger
                .borrow_mut()
                .tables
                .entry(target.to_string())
                .or_default()
                .push_row(visitor.row);
        });
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

/// Make `LedgerSubscriber` the process-wide default. Later calls are ignored.
pub fn install_subscriber() {
    let _ = tracing::subscriber::set_global_default(LedgerSubscriber);
}

/// Take everything recorded on this thread, leaving the ledger empty.
pub fn drain() -> Recorder {
    LEDGER.with(|ledger| std::mem::take(&mut *ledger.borrow_mut()))
}

pub fn clear() {
    LEDGER.with(|ledger| *ledger.borrow_mut() = Recorder::default());
}
