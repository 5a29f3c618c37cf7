/// Statistics layer: per-column description, grouped summaries and
/// polynomial fits.
///
/// ```text
///   Table ──filter──▶ Table ──select/partition──▶ groups
///                                      │
///                                      ▼
///                                  describe ──▶ summary Table
///
///   Table ──filter──▶ (x, y) sorted by x ──SVD──▶ Polynomial
/// ```

pub mod confidence;
pub mod describe;
pub mod polyfit;
pub mod summary;
