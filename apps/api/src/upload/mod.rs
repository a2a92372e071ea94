// CV/JD upload: multipart collection, scratch spooling, PDF text extraction.

pub mod extract;
pub mod form;
pub mod handlers;
