// # Record Store
//
// Disk-backed cache of the records sent to the name server.

pub mod file;

pub use file::RecordStore;
