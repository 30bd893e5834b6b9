//! Global constants used throughout the Pokedex codebase
//!
//! Key segment names are part of the persisted layout: changing them orphans
//! every record already written by the disk backend.

/// First key segment of every record: `["pokemons", id]`
pub const COLLECTION_SEGMENT: &str = "pokemons";

/// First key segment of the id counter: `["counter", "pokemon"]`
pub const COUNTER_SEGMENT: &str = "counter";

/// Second key segment of the id counter
pub const COUNTER_NAME: &str = "pokemon";

/// Server-generated record field holding the id
pub const ID_FIELD: &str = "id";

/// Server-generated record field holding the creation timestamp
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Form field carrying the JSON-encoded record on create and update
pub const RECORD_FORM_FIELD: &str = "record";

/// Public path of the collection resource
pub const COLLECTION_PATH: &str = "/api/pokemons";

/// File name of the disk backend journal inside the data directory
pub const JOURNAL_FILENAME: &str = "pokedex.journal";
