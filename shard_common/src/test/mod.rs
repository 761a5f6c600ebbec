pub use clock::*;
pub use logger::*;
