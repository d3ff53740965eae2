//! Source record decoder
//!
//! Raw catalog and event files arrive as JSON. A file may hold a single
//! object, a top-level array of objects, or a sequence of objects
//! (one per line or simply concatenated). All of these decode to a flat list
//! of JSON objects.

mod decoders;

pub use decoders::decode_json_records;
