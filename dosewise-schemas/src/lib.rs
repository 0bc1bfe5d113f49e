pub mod dosage;
pub mod file_formats;
pub mod offer;
pub mod product;
