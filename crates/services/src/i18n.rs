/// Translation lookup, consumed as an opaque formatter.
///
/// The platform's string catalog lives elsewhere; this crate only ever
/// resolves keys through this trait.
pub trait Translator: Send + Sync {
    fn t(&self, key: &str) -> String;
}

/// Fallback translator that echoes the key, useful in tests and as a
/// last-resort default.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyEcho;

impl Translator for KeyEcho {
    fn t(&self, key: &str) -> String {
        key.to_owned()
    }
}
