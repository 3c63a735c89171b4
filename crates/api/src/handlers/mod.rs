pub mod pages;
pub mod versions;
