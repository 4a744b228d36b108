pub mod objects;
pub use objects::*;

pub mod helpers;

pub mod provider;
pub use provider::*;

pub mod yahoo;
pub use yahoo::*;

pub mod csv_file;
pub use csv_file::*;

pub mod errors;
pub use errors::ProviderError;
