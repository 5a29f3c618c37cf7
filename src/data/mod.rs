/// Data layer: core types, JSON records and row filtering.
///
/// Architecture:
/// ```text
///  caller-built columns / JSON records
///        │
///        ▼
///   ┌──────────┐
///   │  model    │  Value, Column, Table (+ optional row labels)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  parse expr → Predicate → retained rows
///   └──────────┘
/// ```

pub mod expr;
pub mod filter;
pub mod model;
pub mod records;
