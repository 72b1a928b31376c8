//! Configuration access port trait.
//!
//! Lookups are by INI-style `[section] key`. Typed getters fall back to the
//! supplied default when the key is missing or does not parse; the `parse_*`
//! lookups report a present but unparseable value as an error instead.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    fn parse_int(&self, section: &str, key: &str) -> Result<Option<i64>, String>;
    fn parse_double(&self, section: &str, key: &str) -> Result<Option<f64>, String>;
    fn parse_bool(&self, section: &str, key: &str) -> Result<Option<bool>, String>;
}
