// HR intake: candidate JD/CV records and their approval flags.
// The flags are flipped by an external workflow; this service only reads them.

pub mod handlers;
pub mod records;
