//! Flatten nested JSON documents into tables and export them as CSV.
//!
//! ```text
//! {"kit": {"name": "a"}, "files": [{"md5": "1"}, {"md5": "2"}]}
//!
//! files.md5,kit.name
//! 1,a
//! 2,a
//! ```
//!
//! Objects contribute one column per leaf path; arrays multiply rows. Sibling
//! arrays under one object produce their Cartesian product.

pub mod flatten;
pub mod table;

pub use flatten::{cross_join, flatten, FlatRow, PATH_SEPARATOR};
pub use table::{CsvOptions, ExportError, Table};
