pub mod cups;
pub mod paper;
pub mod profile;
pub mod traits;

pub use cups::CupsPrinter;
pub use paper::{PaperCatalog, PaperSize, STANDARD_PAPER_SIZE};
pub use profile::{
    select_default_printer, DefaultPrinterSetup, Orientation, PageRange, PageScaling,
    PrinterProfile, PrinterProfileResolver, ResolvedProfile,
};
pub use traits::{DocumentRenderer, PrinterDirectory, PrinterInfo};
