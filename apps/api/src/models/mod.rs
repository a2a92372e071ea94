pub mod interview_record;
pub mod transcript;
