//! EDF / EDF+ file format.
//!
//! # Quick start
//! ```no_run
//! use eegstd::edf::open_edf;
//!
//! let edf = open_edf("chb01_03.edf").unwrap();
//! println!("{} channels, {} s", edf.n_channels(), edf.duration_secs());
//! let signal = edf.read_all().unwrap(); // [C, T] f32, physical units
//! ```
pub mod header;
pub mod reader;
pub mod writer;

pub use header::{EdfHeader, SignalHeader, ANNOTATION_LABEL};
pub use reader::{open_edf, EdfFile};
pub use writer::{edf_header, encode_edf, record_layout, write_edf, EdfMeta};
