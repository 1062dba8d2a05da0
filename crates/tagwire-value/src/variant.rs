use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;

use crate::error::{Result, ValueError};

/// Ordered sequence of variants.
pub type VariantList = Vec<Variant>;

/// Byte-string keyed map. Iteration is always in ascending key order.
pub type VariantMap = BTreeMap<Bytes, Variant>;

/// The tag of a [`Variant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VariantType {
    Invalid,
    Null,
    Boolean,
    Integer,
    Real,
    String,
    List,
    Map,
}

impl VariantType {
    /// Every tag, in declaration order.
    pub const ALL: [VariantType; 8] = [
        VariantType::Invalid,
        VariantType::Null,
        VariantType::Boolean,
        VariantType::Integer,
        VariantType::Real,
        VariantType::String,
        VariantType::List,
        VariantType::Map,
    ];

    /// The one-byte wire signature for this tag.
    pub fn signature(self) -> u8 {
        match self {
            VariantType::Invalid => b'X',
            VariantType::Null => b'N',
            VariantType::Boolean => b'B',
            VariantType::Integer => b'I',
            VariantType::Real => b'R',
            VariantType::String => b'S',
            VariantType::List => b'L',
            VariantType::Map => b'M',
        }
    }

    /// Look up the tag for a wire signature byte.
    pub fn from_signature(byte: u8) -> Option<Self> {
        match byte {
            b'X' => Some(VariantType::Invalid),
            b'N' => Some(VariantType::Null),
            b'B' => Some(VariantType::Boolean),
            b'I' => Some(VariantType::Integer),
            b'R' => Some(VariantType::Real),
            b'S' => Some(VariantType::String),
            b'L' => Some(VariantType::List),
            b'M' => Some(VariantType::Map),
            _ => None,
        }
    }

    /// Human-readable tag name.
    pub fn name(self) -> &'static str {
        match self {
            VariantType::Invalid => "Invalid",
            VariantType::Null => "Null",
            VariantType::Boolean => "Boolean",
            VariantType::Integer => "Integer",
            VariantType::Real => "Real",
            VariantType::String => "String",
            VariantType::List => "List",
            VariantType::Map => "Map",
        }
    }
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A dynamically-tagged value.
///
/// Variants are plain owned values: cloning is a deep copy and equality is
/// structural. Strings are byte-strings and need not be valid UTF-8.
///
/// ## Equality Rules
///
/// - Different tags are never equal (`Integer(1) != Real(1.0)`)
/// - `Real` uses IEEE-754 equality, so `NaN != NaN`
/// - `Map` equality ignores construction order because keys are kept sorted
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Variant {
    /// No value at all. This is what `Variant::default()` yields.
    #[default]
    Invalid,
    Null,
    Boolean(bool),
    Integer(i32),
    Real(f64),
    String(Bytes),
    List(VariantList),
    Map(VariantMap),
}

impl Variant {
    /// A variant of the given tag carrying that tag's default payload.
    pub fn of_type(ty: VariantType) -> Self {
        match ty {
            VariantType::Invalid => Variant::Invalid,
            VariantType::Null => Variant::Null,
            VariantType::Boolean => Variant::Boolean(false),
            VariantType::Integer => Variant::Integer(0),
            VariantType::Real => Variant::Real(0.0),
            VariantType::String => Variant::String(Bytes::new()),
            VariantType::List => Variant::List(VariantList::new()),
            VariantType::Map => Variant::Map(VariantMap::new()),
        }
    }

    /// Build a string variant from anything byte-like.
    pub fn string(value: impl AsRef<[u8]>) -> Self {
        Variant::String(Bytes::copy_from_slice(value.as_ref()))
    }

    /// Build a list variant.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Variant>,
    {
        Variant::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a map variant. Later duplicates of a key replace earlier ones.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<[u8]>,
        V: Into<Variant>,
    {
        Variant::Map(
            entries
                .into_iter()
                .map(|(key, value)| (Bytes::copy_from_slice(key.as_ref()), value.into()))
                .collect(),
        )
    }

    /// The active tag.
    pub fn variant_type(&self) -> VariantType {
        match self {
            Variant::Invalid => VariantType::Invalid,
            Variant::Null => VariantType::Null,
            Variant::Boolean(_) => VariantType::Boolean,
            Variant::Integer(_) => VariantType::Integer,
            Variant::Real(_) => VariantType::Real,
            Variant::String(_) => VariantType::String,
            Variant::List(_) => VariantType::List,
            Variant::Map(_) => VariantType::Map,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Variant::Invalid)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Variant::Null)
    }

    pub fn to_boolean(&self) -> Result<bool> {
        match self {
            Variant::Boolean(value) => Ok(*value),
            other => Err(other.mismatch(VariantType::Boolean)),
        }
    }

    pub fn to_integer(&self) -> Result<i32> {
        match self {
            Variant::Integer(value) => Ok(*value),
            other => Err(other.mismatch(VariantType::Integer)),
        }
    }

    /// Real payload. An `Integer` variant is a mismatch, not a cast.
    pub fn to_real(&self) -> Result<f64> {
        match self {
            Variant::Real(value) => Ok(*value),
            other => Err(other.mismatch(VariantType::Real)),
        }
    }

    /// Raw bytes of a `String` variant.
    pub fn as_bytes(&self) -> Result<&[u8]> {
        match self {
            Variant::String(value) => Ok(value.as_ref()),
            other => Err(other.mismatch(VariantType::String)),
        }
    }

    /// `String` payload decoded as UTF-8, replacing invalid sequences.
    pub fn to_string_lossy(&self) -> Result<Cow<'_, str>> {
        self.as_bytes().map(String::from_utf8_lossy)
    }

    pub fn as_list(&self) -> Result<&[Variant]> {
        match self {
            Variant::List(items) => Ok(items.as_slice()),
            other => Err(other.mismatch(VariantType::List)),
        }
    }

    pub fn as_list_mut(&mut self) -> Result<&mut VariantList> {
        match self {
            Variant::List(items) => Ok(items),
            other => Err(other.mismatch(VariantType::List)),
        }
    }

    pub fn into_list(self) -> Result<VariantList> {
        match self {
            Variant::List(items) => Ok(items),
            other => Err(other.mismatch(VariantType::List)),
        }
    }

    pub fn as_map(&self) -> Result<&VariantMap> {
        match self {
            Variant::Map(map) => Ok(map),
            other => Err(other.mismatch(VariantType::Map)),
        }
    }

    pub fn as_map_mut(&mut self) -> Result<&mut VariantMap> {
        match self {
            Variant::Map(map) => Ok(map),
            other => Err(other.mismatch(VariantType::Map)),
        }
    }

    pub fn into_map(self) -> Result<VariantMap> {
        match self {
            Variant::Map(map) => Ok(map),
            other => Err(other.mismatch(VariantType::Map)),
        }
    }

    fn mismatch(&self, expected: VariantType) -> ValueError {
        ValueError::TypeMismatch {
            expected,
            found: self.variant_type(),
        }
    }
}

impl From<bool> for Variant {
    fn from(value: bool) -> Self {
        Variant::Boolean(value)
    }
}

impl From<i32> for Variant {
    fn from(value: i32) -> Self {
        Variant::Integer(value)
    }
}

impl From<f64> for Variant {
    fn from(value: f64) -> Self {
        Variant::Real(value)
    }
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Variant::string(value)
    }
}

impl From<String> for Variant {
    fn from(value: String) -> Self {
        Variant::String(Bytes::from(value))
    }
}

impl From<&[u8]> for Variant {
    fn from(value: &[u8]) -> Self {
        Variant::string(value)
    }
}

impl From<Vec<u8>> for Variant {
    fn from(value: Vec<u8>) -> Self {
        Variant::String(Bytes::from(value))
    }
}

impl From<Bytes> for Variant {
    fn from(value: Bytes) -> Self {
        Variant::String(value)
    }
}

impl From<VariantList> for Variant {
    fn from(value: VariantList) -> Self {
        Variant::List(value)
    }
}

impl From<VariantMap> for Variant {
    fn from(value: VariantMap) -> Self {
        Variant::Map(value)
    }
}

impl FromIterator<Variant> for Variant {
    fn from_iter<I: IntoIterator<Item = Variant>>(iter: I) -> Self {
        Variant::List(iter.into_iter().collect())
    }
}

impl<K, V> FromIterator<(K, V)> for Variant
where
    K: AsRef<[u8]>,
    V: Into<Variant>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Variant::map(iter)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Invalid => f.write_str("<invalid>"),
            Variant::Null => f.write_str("null"),
            Variant::Boolean(value) => write!(f, "{value}"),
            Variant::Integer(value) => write!(f, "{value}"),
            Variant::Real(value) => write!(f, "{value:?}"),
            Variant::String(value) => write!(f, "{:?}", String::from_utf8_lossy(value)),
            Variant::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Variant::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{:?}: {value}", String::from_utf8_lossy(key))?;
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_lookup_is_bijective() {
        for ty in VariantType::ALL {
            assert_eq!(VariantType::from_signature(ty.signature()), Some(ty));
        }
        assert_eq!(VariantType::from_signature(b'Z'), None);
        assert_eq!(VariantType::from_signature(0), None);
    }

    #[test]
    fn default_is_invalid() {
        let value = Variant::default();
        assert_eq!(value.variant_type(), VariantType::Invalid);
        assert!(!value.is_valid());
    }

    #[test]
    fn of_type_matches_requested_tag() {
        for ty in VariantType::ALL {
            assert_eq!(Variant::of_type(ty).variant_type(), ty);
        }
    }

    #[test]
    fn constructors_pick_the_right_tag() {
        assert_eq!(Variant::from(true), Variant::Boolean(true));
        assert_eq!(Variant::from(-7), Variant::Integer(-7));
        assert_eq!(Variant::from(2.5), Variant::Real(2.5));
        assert_eq!(Variant::from("hi").as_bytes().unwrap(), b"hi");
        assert_eq!(Variant::from(vec![0xFFu8, 0x00]).as_bytes().unwrap(), &[0xFF, 0x00]);
        assert_eq!(
            Variant::list([1, 2]).as_list().unwrap(),
            &[Variant::Integer(1), Variant::Integer(2)]
        );
    }

    #[test]
    fn strict_accessors_reject_other_tags() {
        let value = Variant::Integer(3);
        assert_eq!(value.to_integer(), Ok(3));
        assert_eq!(
            value.to_real(),
            Err(ValueError::TypeMismatch {
                expected: VariantType::Real,
                found: VariantType::Integer,
            })
        );
        assert!(Variant::Real(1.0).to_integer().is_err());
        assert!(Variant::Null.to_boolean().is_err());
        assert!(Variant::from("x").as_list().is_err());
        assert!(Variant::list(Vec::<Variant>::new()).as_map().is_err());
        assert!(Variant::Invalid.into_map().is_err());
    }

    #[test]
    fn mutable_accessors_edit_in_place() {
        let mut value = Variant::list([1]);
        value.as_list_mut().unwrap().push(Variant::Null);
        assert_eq!(value.as_list().unwrap().len(), 2);

        let mut map = Variant::map([("a", 1)]);
        map.as_map_mut()
            .unwrap()
            .insert(Bytes::from_static(b"b"), Variant::Boolean(true));
        assert_eq!(map.into_map().unwrap().len(), 2);
    }

    #[test]
    fn map_equality_ignores_insertion_order() {
        let first = Variant::map([("b", 1), ("a", 2)]);
        let second = Variant::map([("a", 2), ("b", 1)]);
        assert_eq!(first, second);

        let keys: Vec<&[u8]> = first.as_map().unwrap().keys().map(|k| k.as_ref()).collect();
        assert_eq!(keys, vec![&b"a"[..], &b"b"[..]]);
    }

    #[test]
    fn clone_is_deep() {
        let original = Variant::list([Variant::list([1, 2]), Variant::from("x")]);
        let mut copy = original.clone();
        copy.as_list_mut().unwrap()[0]
            .as_list_mut()
            .unwrap()
            .push(Variant::Integer(3));

        assert_ne!(original, copy);
        assert_eq!(original.as_list().unwrap()[0].as_list().unwrap().len(), 2);
    }

    #[test]
    fn different_tags_never_equal() {
        assert_ne!(Variant::Integer(1), Variant::Real(1.0));
        assert_ne!(Variant::Null, Variant::Invalid);
        assert_ne!(Variant::Real(f64::NAN), Variant::Real(f64::NAN));
    }

    #[test]
    fn collect_into_list_and_map() {
        let list: Variant = (0..3).map(Variant::Integer).collect();
        assert_eq!(list.as_list().unwrap().len(), 3);

        let map: Variant = vec![("k", Variant::Null)].into_iter().collect();
        assert_eq!(map.variant_type(), VariantType::Map);
    }

    #[test]
    fn lossy_text_of_binary_string() {
        let value = Variant::from(vec![b'o', b'k', 0xFF]);
        assert_eq!(value.to_string_lossy().unwrap(), "ok\u{FFFD}");
    }

    #[test]
    fn display_renders_nested_values() {
        let value = Variant::map([
            ("list", Variant::list([Variant::Integer(1), Variant::Real(0.5)])),
            ("name", Variant::from("x")),
            ("none", Variant::Null),
        ]);
        assert_eq!(
            value.to_string(),
            r#"{"list": [1, 0.5], "name": "x", "none": null}"#
        );
        assert_eq!(Variant::Invalid.to_string(), "<invalid>");
    }
}
