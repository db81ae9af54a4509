//! Capability registration for native classes.
//!
//! A native class is exposed to scripts through an explicit table: one
//! namespace symbol on the global object, one constructor taking a boolean
//! flag, and a fixed set of string-returning methods. Nothing is registered
//! ad hoc; the engine installs exactly what the table lists.

use crate::host_functions::HostResult;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("identifier pattern"));

/// Native method reachable from scripts
pub type NativeMethod<T> = fn(&T) -> HostResult<String>;

/// Native constructor invoked with the script's boolean flag
pub type NativeConstructor<T> = Box<dyn Fn(bool) -> HostResult<T>>;

/// Mapping from exposed method name to native function
pub struct CapabilityTable<T> {
    methods: BTreeMap<String, NativeMethod<T>>,
}

impl<T> CapabilityTable<T> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            methods: BTreeMap::new(),
        }
    }

    /// Register a method, returning any entry it replaced
    pub fn register(
        &mut self,
        name: impl Into<String>,
        method: NativeMethod<T>,
    ) -> Option<NativeMethod<T>> {
        self.methods.insert(name.into(), method)
    }

    /// Register a method (builder form)
    pub fn with_method(mut self, name: impl Into<String>, method: NativeMethod<T>) -> Self {
        self.register(name, method);
        self
    }

    /// Look up a method by exposed name
    pub fn get(&self, name: &str) -> Option<NativeMethod<T>> {
        self.methods.get(name).copied()
    }

    /// Exposed method names, in registration-independent sorted order
    pub fn method_names(&self) -> Vec<&str> {
        self.methods.keys().map(String::as_str).collect()
    }

    /// Iterate over name/method pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, NativeMethod<T>)> {
        self.methods.iter().map(|(name, method)| (name.as_str(), *method))
    }

    /// Number of registered methods
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Whether no methods are registered
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl<T> Default for CapabilityTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for CapabilityTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.methods.keys()).finish()
    }
}

/// A native class bound under `namespace.class_name` on the global object
pub struct NativeClass<T> {
    namespace: String,
    class_name: String,
    constructor: NativeConstructor<T>,
    methods: CapabilityTable<T>,
}

impl<T> NativeClass<T> {
    /// Create a class with no methods
    pub fn new(
        namespace: impl Into<String>,
        class_name: impl Into<String>,
        constructor: impl Fn(bool) -> HostResult<T> + 'static,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            class_name: class_name.into(),
            constructor: Box::new(constructor),
            methods: CapabilityTable::new(),
        }
    }

    /// Add a method to the class table
    pub fn with_method(mut self, name: impl Into<String>, method: NativeMethod<T>) -> Self {
        self.methods.register(name, method);
        self
    }

    /// Namespace symbol on the global object
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Class name inside the namespace
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Dotted path scripts use to reach the class
    pub fn exposed_path(&self) -> String {
        format!("{}.{}", self.namespace, self.class_name)
    }

    /// The method table
    pub fn methods(&self) -> &CapabilityTable<T> {
        &self.methods
    }

    /// Construct the native object directly
    pub fn construct(&self, flag: bool) -> HostResult<T> {
        (self.constructor)(flag)
    }

    /// Check that every exposed name is a JavaScript identifier
    pub fn validate(&self) -> Result<(), String> {
        let names = [self.namespace.as_str(), self.class_name.as_str()]
            .into_iter()
            .chain(self.methods.method_names());

        for name in names {
            if !IDENTIFIER.is_match(name) {
                return Err(format!(
                    "'{}' is not a valid identifier for {}",
                    name,
                    self.exposed_path()
                ));
            }
        }

        Ok(())
    }

    pub(crate) fn into_parts(self) -> (String, String, NativeConstructor<T>, CapabilityTable<T>) {
        (self.namespace, self.class_name, self.constructor, self.methods)
    }
}

impl<T> fmt::Debug for NativeClass<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeClass")
            .field("path", &self.exposed_path())
            .field("methods", &self.methods)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host_functions::HostError;

    struct Counter(u32);

    fn describe(counter: &Counter) -> HostResult<String> {
        Ok(format!("count={}", counter.0))
    }

    fn fail(_: &Counter) -> HostResult<String> {
        Err(HostError::KeyMaterial("no material".into()))
    }

    #[test]
    fn test_table_register_and_get() {
        let mut table = CapabilityTable::new();
        assert!(table.is_empty());
        assert!(table.register("describe", describe as NativeMethod<Counter>).is_none());
        assert!(table.register("describe", fail).is_some());
        assert_eq!(table.len(), 1);

        let method = table.get("describe").unwrap();
        assert!(method(&Counter(3)).is_err());
        assert!(table.get("missing").is_none());
    }

    #[test]
    fn test_method_names_sorted() {
        let table = CapabilityTable::new()
            .with_method("zeta", describe as NativeMethod<Counter>)
            .with_method("alpha", describe);
        assert_eq!(table.method_names(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_native_class_path_and_construct() {
        let class = NativeClass::new("NS", "Counter", |flag| Ok(Counter(flag as u32)))
            .with_method("describe", describe);

        assert_eq!(class.exposed_path(), "NS.Counter");
        let counter = class.construct(true).unwrap();
        let method = class.methods().get("describe").unwrap();
        assert_eq!(method(&counter).unwrap(), "count=1");
    }

    #[test]
    fn test_validate_identifiers() {
        let valid = NativeClass::new("CK", "Crypto", |_| Ok(Counter(0)))
            .with_method("getPublicKey", describe)
            .with_method("$private_1", describe);
        assert!(valid.validate().is_ok());

        let bad_method = NativeClass::new("CK", "Crypto", |_| Ok(Counter(0)))
            .with_method("get-key", describe);
        let err = bad_method.validate().unwrap_err();
        assert!(err.contains("get-key"));

        let bad_namespace = NativeClass::new("1CK", "Crypto", |_| Ok(Counter(0)));
        assert!(bad_namespace.validate().is_err());
    }
}
