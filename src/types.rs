use std::fmt;

pub const INT: &str = "int";
pub const STRING: &str = "string";
pub const BOOL: &str = "bool";

/// Prefix marking a list type tag, as in `list-int`.
pub const LIST_PREFIX: &str = "list-";

/// A flattened type descriptor.
///
/// Either a scalar name (`int`, `string`, `bool`, or a datatype name) or a
/// list of a scalar, spelled `list-<scalar>`. Lists never nest.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeTag(Box<str>);

impl TypeTag {
    pub fn scalar(name: &str) -> TypeTag {
        debug_assert!(!name.starts_with(LIST_PREFIX));
        TypeTag(name.into())
    }

    pub fn list_of(element: &str) -> TypeTag {
        debug_assert!(!element.starts_with(LIST_PREFIX));
        TypeTag(format!("{LIST_PREFIX}{element}").into_boxed_str())
    }

    pub fn int() -> TypeTag {
        TypeTag::scalar(INT)
    }

    pub fn string() -> TypeTag {
        TypeTag::scalar(STRING)
    }

    pub fn bool() -> TypeTag {
        TypeTag::scalar(BOOL)
    }

    /// Re-derives a tag from its string form.
    pub fn parse(tag: &str) -> TypeTag {
        match tag.strip_prefix(LIST_PREFIX) {
            Some(element) => TypeTag::list_of(element),
            None => TypeTag::scalar(tag),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_list(&self) -> bool {
        self.0.starts_with(LIST_PREFIX)
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for TypeTag {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for TypeTag {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}
