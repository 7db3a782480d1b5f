pub mod parser;

pub use parser::{parse_filter, parse_sort, FilterTerm, Operator, SortSpec};
