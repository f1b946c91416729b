//! One-hot expansion of the categorical feature columns.

use std::collections::BTreeSet;
use std::fmt;

use crate::records::EnrichedTrip;

/// A categorical value drawn from one source column. Numeric categories
/// sort numerically, text categories lexicographically; a single column
/// only ever holds one kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    Number(u32),
    Text(String),
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Number(n) => write!(f, "{}", n),
            Category::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A named categorical source column selected for one-hot expansion.
pub struct ColumnSpec {
    pub name: &'static str,
    pub extract: fn(&EnrichedTrip) -> Category,
}

/// The encoded column set: the four zone categories plus the calendar
/// categories. `dropoff_weekday` and `dropoff_is_weekend` are derived but
/// deliberately not encoded, matching the upstream dataset this pipeline
/// reproduces.
pub fn default_columns() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec {
            name: "pickup_borough",
            extract: |t| Category::Text(t.pickup_borough.clone()),
        },
        ColumnSpec {
            name: "pickup_zone",
            extract: |t| Category::Text(t.pickup_zone.clone()),
        },
        ColumnSpec {
            name: "pickup_service_zone",
            extract: |t| Category::Text(t.pickup_service_zone.clone()),
        },
        ColumnSpec {
            name: "dropoff_zone",
            extract: |t| Category::Text(t.dropoff_zone.clone()),
        },
        ColumnSpec {
            name: "dropoff_month",
            extract: |t| Category::Number(t.dropoff_month),
        },
        ColumnSpec {
            name: "dropoff_week_of_year",
            extract: |t| Category::Number(t.dropoff_week_of_year),
        },
        ColumnSpec {
            name: "dropoff_day_of_year",
            extract: |t| Category::Number(t.dropoff_day_of_year),
        },
        ColumnSpec {
            name: "dropoff_day_of_month",
            extract: |t| Category::Number(t.dropoff_day_of_month),
        },
        ColumnSpec {
            name: "dropoff_hour",
            extract: |t| Category::Number(t.dropoff_hour),
        },
    ]
}

/// The indicator columns spanned by one source column.
#[derive(Debug)]
pub struct ColumnGroup {
    pub source: String,
    pub start: usize,
    pub len: usize,
}

/// Indicator block for a batch: one 0/1 row per input row, columns grouped
/// by source column.
///
/// The vocabulary is the sorted distinct values observed in the batch, so
/// two different batches can produce different column sets.
#[derive(Debug)]
pub struct OneHotEncoding {
    pub columns: Vec<String>,
    pub groups: Vec<ColumnGroup>,
    pub rows: Vec<Vec<u8>>,
}

/// One-hot encodes `trips` over the given source columns.
///
/// Indicator columns are named `{source}_{value}`. Within a group the
/// columns follow the [`Category`] ordering; groups follow spec order.
pub fn one_hot_encode(trips: &[EnrichedTrip], specs: &[ColumnSpec]) -> OneHotEncoding {
    let vocabs: Vec<Vec<Category>> = specs
        .iter()
        .map(|spec| {
            let distinct: BTreeSet<Category> =
                trips.iter().map(|trip| (spec.extract)(trip)).collect();
            distinct.into_iter().collect()
        })
        .collect();

    let mut columns = Vec::new();
    let mut groups = Vec::with_capacity(specs.len());
    for (spec, vocab) in specs.iter().zip(&vocabs) {
        groups.push(ColumnGroup {
            source: spec.name.to_string(),
            start: columns.len(),
            len: vocab.len(),
        });
        for value in vocab {
            columns.push(format!("{}_{}", spec.name, value));
        }
    }

    let width = columns.len();
    let mut rows = Vec::with_capacity(trips.len());
    for trip in trips {
        let mut row = vec![0u8; width];
        for ((spec, vocab), group) in specs.iter().zip(&vocabs).zip(&groups) {
            let value = (spec.extract)(trip);
            // the vocabulary was built from this same batch
            let offset = vocab
                .binary_search(&value)
                .expect("category present in batch vocabulary");
            row[group.start + offset] = 1;
        }
        rows.push(row);
    }

    OneHotEncoding {
        columns,
        groups,
        rows,
    }
}
