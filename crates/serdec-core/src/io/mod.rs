pub mod ser;
pub mod ser_writer;
pub mod store;
