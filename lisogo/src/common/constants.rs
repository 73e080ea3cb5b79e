// document constants
pub const DOC_ID: &str = "_id";
pub const DOC_TYPE: &str = "_type";
pub const DOC_TYPES_MAPPING: &str = "_types_mapping";
pub const RESERVED_PREFIX: char = '_';
pub const METADATA_FIELDS: [&str; 2] = [DOC_TYPE, DOC_TYPES_MAPPING];

// entity constants
pub const DEFAULT_IGNORED_FIELDS: [&str; 2] = ["id", "modified"];

// database constants
pub const DEFAULT_DATABASE_NAME: &str = "lisogo";
pub const DEFAULT_NAMESPACE: &str = "lisogo.model";
pub const NAMESPACE_SEPARATOR: &str = ".";
pub const SYSTEM_COLLECTION_PREFIX: &str = "system.";
pub const INVALID_COLLECTION_CHARS: [char; 2] = ['$', '\0'];
