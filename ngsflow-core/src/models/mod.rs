pub mod gene;
pub mod region;
pub mod strand;

// re-export for cleaner imports
pub use self::gene::{Gene, GeneCatalog, NO_DYAD, read_selection};
pub use self::region::{Region, is_header_line};
pub use self::strand::Strand;
