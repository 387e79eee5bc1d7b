use std::fmt;

use async_graphql_parser::types as ast;

/// The type of a field or argument, written the way it appears in SDL, e.g. `[Car]!`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct MetaFieldType(String);

impl MetaFieldType {
    /// The named type at the bottom of any list wrapping.
    pub fn base_type_name(&self) -> &str {
        self.0
            .trim_start_matches('[')
            .trim_end_matches(|c| c == ']' || c == '!')
    }

    pub fn is_non_null(&self) -> bool {
        self.0.ends_with('!')
    }

    pub fn is_nullable(&self) -> bool {
        !self.is_non_null()
    }

    pub fn is_list(&self) -> bool {
        self.list_item_type().is_some()
    }

    /// The type of the elements when this is a list type.
    pub fn list_item_type(&self) -> Option<MetaFieldType> {
        let inner = self.0.strip_suffix('!').unwrap_or(&self.0);
        inner
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .map(|item| MetaFieldType(item.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MetaFieldType {
    fn from(value: &str) -> Self {
        MetaFieldType(value.to_string())
    }
}

impl From<String> for MetaFieldType {
    fn from(value: String) -> Self {
        MetaFieldType(value)
    }
}

impl From<&ast::Type> for MetaFieldType {
    fn from(value: &ast::Type) -> Self {
        MetaFieldType(value.to_string())
    }
}

impl fmt::Display for MetaFieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapping() {
        let ty = MetaFieldType::from("[Car]!");
        assert_eq!(ty.base_type_name(), "Car");
        assert!(ty.is_non_null());
        assert!(ty.is_list());
        assert_eq!(ty.list_item_type(), Some(MetaFieldType::from("Car")));

        let ty = MetaFieldType::from("[Car!]");
        assert!(ty.is_nullable());
        assert_eq!(ty.list_item_type(), Some(MetaFieldType::from("Car!")));

        let ty = MetaFieldType::from("ID!");
        assert_eq!(ty.base_type_name(), "ID");
        assert!(!ty.is_list());
        assert_eq!(ty.list_item_type(), None);
    }

    #[test]
    fn from_parsed_type() {
        let parsed = ast::Type::new("[[Int!]]!").unwrap();
        let ty = MetaFieldType::from(&parsed);
        assert_eq!(ty.as_str(), "[[Int!]]!");
        assert_eq!(ty.base_type_name(), "Int");
        assert_eq!(ty.list_item_type().unwrap().list_item_type(), Some(MetaFieldType::from("Int!")));
    }
}
