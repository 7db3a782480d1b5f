pub mod mod_version;
pub mod rating;
