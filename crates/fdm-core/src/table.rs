//! The Lookup Table Engine: 1D/2D/3D piecewise-linear interpolation with
//! monotonic-key validation and cached last-index search.
//!
//! Axis keys are validated strictly increasing at construction time; there
//! is no extrapolation beyond the first/last breakpoint — queries outside
//! the key range clamp to the boundary value. See the module-level
//! discussion in `DESIGN.md` for the boundary-softening question the
//! source specification leaves open; this implementation clamps
//! uniformly on every axis and every rank.

use std::cell::Cell;

use crate::registry::{PropertyRef, PropertyRegistry, RegistryError};

/// Failure kinds raised while constructing or querying a [`Table`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum TableError {
    #[error("malformed table in <{element}>: {detail}")]
    Malformed { element: String, detail: String },

    #[error("non-monotonic {axis} axis in <{element}> at index {index}")]
    NonMonotonic {
        axis: &'static str,
        index: usize,
        element: String,
    },

    #[error("empty table data in <{element}>")]
    EmptyData { element: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Locate the straddling pair `(r-1, r)` for `k` within `keys`, seeding the
/// walk from `last` and updating it. Returns the upper index `r` and a
/// blend factor in `[0, 1]`; `(1-factor)*v[r-1] + factor*v[r]` reproduces
/// the table value. Queries at or beyond either boundary clamp the factor
/// to 0 or 1, which is equivalent to returning the boundary value outright.
fn locate(keys: &[f64], last: &Cell<usize>, k: f64) -> (usize, f64) {
    let n = keys.len();
    debug_assert!(n >= 2, "tables must have at least two keys");

    if k <= keys[0] {
        last.set(1);
        return (1, 0.0);
    }
    if k >= keys[n - 1] {
        last.set(n - 1);
        return (n - 1, 1.0);
    }

    let mut r = last.get().clamp(1, n - 1);
    while r > 1 && keys[r - 1] > k {
        r -= 1;
    }
    while r < n - 1 && keys[r] <= k {
        r += 1;
    }
    last.set(r);

    let span = keys[r] - keys[r - 1];
    let factor = if span == 0.0 {
        1.0
    } else {
        ((k - keys[r - 1]) / span).clamp(0.0, 1.0)
    };
    (r, factor)
}

fn blend(values: &[f64], r: usize, factor: f64) -> f64 {
    (1.0 - factor) * values[r - 1] + factor * values[r]
}

/// Validate that `keys` is strictly increasing, reporting the first
/// violation against `axis`/`element`.
fn validate_monotonic(keys: &[f64], axis: &'static str, element: &str) -> Result<(), TableError> {
    for i in 1..keys.len() {
        if keys[i] <= keys[i - 1] {
            return Err(TableError::NonMonotonic {
                axis,
                index: i,
                element: element.to_owned(),
            });
        }
    }
    Ok(())
}

/// A rank-2 grid plus its own cached-index hints. Used both as the
/// top-level storage for a rank-2 `Table` and as the per-breakpoint
/// subtable of a rank-3 `Table`.
#[derive(Debug)]
struct Grid2D {
    row_keys: Vec<f64>,
    col_keys: Vec<f64>,
    /// Row-major: `data[row][col]`.
    data: Vec<Vec<f64>>,
    last_row: Cell<usize>,
    last_col: Cell<usize>,
}

impl Grid2D {
    fn new(row_keys: Vec<f64>, col_keys: Vec<f64>, data: Vec<Vec<f64>>, element: &str) -> Result<Self, TableError> {
        if row_keys.is_empty() || col_keys.is_empty() || data.is_empty() {
            return Err(TableError::EmptyData {
                element: element.to_owned(),
            });
        }
        if data.len() != row_keys.len() || data.iter().any(|row| row.len() != col_keys.len()) {
            return Err(TableError::Malformed {
                element: element.to_owned(),
                detail: "row/column count mismatch with table data".to_owned(),
            });
        }
        validate_monotonic(&row_keys, "row", element)?;
        validate_monotonic(&col_keys, "column", element)?;
        Ok(Self {
            row_keys,
            col_keys,
            data,
            last_row: Cell::new(1),
            last_col: Cell::new(1),
        })
    }

    fn lookup(&self, row_key: f64, col_key: f64) -> f64 {
        let (r, rf) = locate(&self.row_keys, &self.last_row, row_key);
        let (c, cf) = locate(&self.col_keys, &self.last_col, col_key);
        let top = (1.0 - cf) * self.data[r - 1][c - 1] + cf * self.data[r - 1][c];
        let bottom = (1.0 - cf) * self.data[r][c - 1] + cf * self.data[r][c];
        (1.0 - rf) * top + rf * bottom
    }
}

#[derive(Debug)]
enum TableData {
    Rank1 {
        keys: Vec<f64>,
        values: Vec<f64>,
        last: Cell<usize>,
    },
    Rank2(Grid2D),
    Rank3 {
        breakpoints: Vec<f64>,
        subtables: Vec<Grid2D>,
        last: Cell<usize>,
    },
}

/// A 1D/2D/3D piecewise-linear lookup table.
///
/// Axis bindings (`row`/`column`/`table`) are late-bound [`PropertyRef`]s,
/// resolved against the registry supplied to [`Table::get_value`]. Tables
/// built for internal, programmatic use (engine or propeller models) skip
/// axis binding and call [`Table::get_value_at`] directly.
#[derive(Debug)]
pub struct Table {
    data: TableData,
    row_ref: Option<PropertyRef>,
    col_ref: Option<PropertyRef>,
    table_ref: Option<PropertyRef>,
}

impl Table {
    /// Rank of this table: 1, 2, or 3.
    pub fn rank(&self) -> u8 {
        match &self.data {
            TableData::Rank1 { .. } => 1,
            TableData::Rank2(_) => 2,
            TableData::Rank3 { .. } => 3,
        }
    }

    /// Evaluate the table by first reading its bound axis properties from
    /// `registry`, then interpolating.
    pub fn get_value(&self, registry: &PropertyRegistry) -> Result<f64, TableError> {
        let row = match &self.row_ref {
            Some(r) => Some(r.read(registry)?),
            None => None,
        };
        let col = match &self.col_ref {
            Some(r) => Some(r.read(registry)?),
            None => None,
        };
        let table = match &self.table_ref {
            Some(r) => Some(r.read(registry)?),
            None => None,
        };
        Ok(self.get_value_at(row, col, table))
    }

    /// Evaluate the table directly against explicit axis values, for
    /// programmatic (internal) tables with no property bindings.
    pub fn get_value_at(&self, row: Option<f64>, col: Option<f64>, table: Option<f64>) -> f64 {
        match &self.data {
            TableData::Rank1 { keys, values, last } => {
                let k = row.expect("rank-1 table requires a row key");
                let (r, factor) = locate(keys, last, k);
                blend(values, r, factor)
            }
            TableData::Rank2(grid) => {
                let rk = row.expect("rank-2 table requires a row key");
                let ck = col.expect("rank-2 table requires a column key");
                grid.lookup(rk, ck)
            }
            TableData::Rank3 {
                breakpoints,
                subtables,
                last,
            } => {
                let tk = table.expect("rank-3 table requires a table key");
                let rk = row.expect("rank-3 table requires a row key");
                let ck = col.expect("rank-3 table requires a column key");
                let (t, factor) = locate(breakpoints, last, tk);
                let low = subtables[t - 1].lookup(rk, ck);
                let high = subtables[t].lookup(rk, ck);
                (1.0 - factor) * low + factor * high
            }
        }
    }

    /// Axis `PropertyRef`s bound to this table, in (row, column, table)
    /// order.
    pub fn axis_refs(&self) -> (Option<&PropertyRef>, Option<&PropertyRef>, Option<&PropertyRef>) {
        (self.row_ref.as_ref(), self.col_ref.as_ref(), self.table_ref.as_ref())
    }
}

/// Builder for constructing a [`Table`] programmatically or from parsed
/// document data. Mirrors the raw-to-typed conversion idiom used elsewhere
/// in this workspace: assemble a plain description, then validate it once
/// into the immutable [`Table`].
#[derive(Debug, Default)]
pub struct TableBuilder {
    element: String,
    row_ref: Option<PropertyRef>,
    col_ref: Option<PropertyRef>,
    table_ref: Option<PropertyRef>,
}

impl TableBuilder {
    pub fn new(element: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            row_ref: None,
            col_ref: None,
            table_ref: None,
        }
    }

    pub fn row_ref(mut self, r: PropertyRef) -> Self {
        self.row_ref = Some(r);
        self
    }

    pub fn col_ref(mut self, r: PropertyRef) -> Self {
        self.col_ref = Some(r);
        self
    }

    pub fn table_ref(mut self, r: PropertyRef) -> Self {
        self.table_ref = Some(r);
        self
    }

    /// Build a rank-1 table from parallel `keys`/`values` vectors.
    pub fn build_rank1(self, keys: Vec<f64>, values: Vec<f64>) -> Result<Table, TableError> {
        if keys.is_empty() || values.len() != keys.len() {
            return Err(TableError::EmptyData {
                element: self.element.clone(),
            });
        }
        validate_monotonic(&keys, "row", &self.element)?;
        Ok(Table {
            data: TableData::Rank1 {
                keys,
                values,
                last: Cell::new(1),
            },
            row_ref: self.row_ref,
            col_ref: self.col_ref,
            table_ref: self.table_ref,
        })
    }

    /// Build a rank-2 table from row keys, column keys, and a row-major
    /// `data[row][col]` grid.
    pub fn build_rank2(
        self,
        row_keys: Vec<f64>,
        col_keys: Vec<f64>,
        data: Vec<Vec<f64>>,
    ) -> Result<Table, TableError> {
        let grid = Grid2D::new(row_keys, col_keys, data, &self.element)?;
        Ok(Table {
            data: TableData::Rank2(grid),
            row_ref: self.row_ref,
            col_ref: self.col_ref,
            table_ref: self.table_ref,
        })
    }

    /// Build a rank-3 table from a breakpoint list and one rank-2 subtable
    /// per breakpoint (row/column keys may differ per subtable).
    pub fn build_rank3(
        self,
        breakpoints: Vec<f64>,
        subtables: Vec<(Vec<f64>, Vec<f64>, Vec<Vec<f64>>)>,
    ) -> Result<Table, TableError> {
        if breakpoints.is_empty() || subtables.len() != breakpoints.len() {
            return Err(TableError::EmptyData {
                element: self.element.clone(),
            });
        }
        validate_monotonic(&breakpoints, "breakpoint", &self.element)?;
        let grids = subtables
            .into_iter()
            .map(|(rk, ck, d)| Grid2D::new(rk, ck, d, &self.element))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Table {
            data: TableData::Rank3 {
                breakpoints,
                subtables: grids,
                last: Cell::new(1),
            },
            row_ref: self.row_ref,
            col_ref: self.col_ref,
            table_ref: self.table_ref,
        })
    }
}

#[cfg(test)]
mod table_tests;
