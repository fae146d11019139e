// Series and option chain files for the command-line tools
pub mod series_file;

pub use series_file::{ChainFile, FileFormat, SeriesCollection, SeriesFile};
