/// Data layer: core types, loading, cleaning and persistence.
///
/// Architecture:
/// ```text
///  messages.csv   categories.csv
///        │              │
///        ▼              ▼
///   ┌──────────────────────┐
///   │  loader + merge       │  parse files → left join on key → Table
///   └──────────────────────┘
///        │
///        ▼
///   ┌──────────────────────┐
///   │  clean                │  categories → 0/1 label columns, dedup
///   └──────────────────────┘
///        │
///        ▼
///   ┌──────────────────────┐
///   │  persist              │  Table → SQLite `<name>_table`
///   └──────────────────────┘
/// ```

pub mod clean;
pub mod loader;
pub mod merge;
pub mod model;
pub mod persist;
