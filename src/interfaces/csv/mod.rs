pub mod history_writer;
pub mod request_reader;
