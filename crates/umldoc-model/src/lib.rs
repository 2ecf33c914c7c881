//! Documentable element model for umldoc.
//!
//! These types describe what the documentation generator documented:
//! packages containing types, and types containing enum constants, fields,
//! constructors and methods. The host tool builds a [`Model`] and hands it
//! to the renderer; this crate owns no behavior beyond small accessors.
//!
//! All structs are plain owned data and implement serde `Deserialize`, so
//! a host can also supply the model as JSON/TOML data instead of building
//! it in code.

use serde::Deserialize;

/// The kind of a documented type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
}

/// Member visibility, with the conventional UML marker character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Package,
    Private,
}

impl Visibility {
    /// UML visibility marker: `+`, `#`, `~` or `-`.
    #[must_use]
    pub fn marker(self) -> char {
        match self {
            Visibility::Public => '+',
            Visibility::Protected => '#',
            Visibility::Package => '~',
            Visibility::Private => '-',
        }
    }
}

/// A documentation tag attached to a type (e.g. a freeform `note` tag).
#[derive(Debug, Clone, Deserialize)]
pub struct DocTag {
    /// Tag name without any leading marker (e.g. `note`).
    pub name: String,
    /// Tag body text.
    pub text: String,
}

/// A documented field or enum constant.
#[derive(Debug, Clone, Deserialize)]
pub struct Field {
    pub name: String,
    /// Declared type, if the generator reported one. Enum constants
    /// usually carry none.
    #[serde(default)]
    pub type_name: Option<String>,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub visibility: Visibility,
}

/// A single method or constructor parameter.
#[derive(Debug, Clone, Deserialize)]
pub struct Param {
    pub name: String,
    pub type_name: String,
}

/// A documented method or constructor.
///
/// Constructors are methods whose `return_type` is `None` and whose name
/// equals the simple type name; the renderer does not care about the
/// distinction beyond ordering.
#[derive(Debug, Clone, Deserialize)]
pub struct Method {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub return_type: Option<String>,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub visibility: Visibility,
}

/// A documented class, interface or enum.
#[derive(Debug, Clone, Deserialize)]
pub struct TypeElement {
    /// Fully qualified name, e.g. `com.acme.Widget`.
    pub qualified_name: String,
    /// Name of the containing package, e.g. `com.acme`. Empty for the
    /// unnamed package.
    #[serde(default)]
    pub package: String,
    pub kind: TypeKind,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_deprecated: bool,
    /// Generic type parameter names, in declaration order.
    #[serde(default)]
    pub type_params: Vec<String>,
    /// Enum constants in declaration order. Empty for non-enums.
    #[serde(default)]
    pub enum_constants: Vec<Field>,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub constructors: Vec<Method>,
    #[serde(default)]
    pub methods: Vec<Method>,
    /// Documentation tags attached to the type, in declaration order.
    #[serde(default)]
    pub tags: Vec<DocTag>,
}

impl TypeElement {
    /// Simple (unqualified) type name.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.qualified_name
            .rsplit('.')
            .next()
            .unwrap_or(&self.qualified_name)
    }
}

/// A documented package and the types it contains.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageElement {
    /// Package name, e.g. `com.acme`.
    pub name: String,
    /// Types in model-declared order.
    #[serde(default)]
    pub types: Vec<TypeElement>,
}

/// The complete documentable model for one documentation run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Model {
    #[serde(default)]
    pub packages: Vec<PackageElement>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_name() {
        let element = TypeElement {
            qualified_name: "com.acme.Widget".to_owned(),
            package: "com.acme".to_owned(),
            kind: TypeKind::Class,
            is_abstract: false,
            is_deprecated: false,
            type_params: Vec::new(),
            enum_constants: Vec::new(),
            fields: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            tags: Vec::new(),
        };
        assert_eq!(element.simple_name(), "Widget");
    }

    #[test]
    fn test_simple_name_unqualified() {
        let element = TypeElement {
            qualified_name: "Widget".to_owned(),
            package: String::new(),
            kind: TypeKind::Class,
            is_abstract: false,
            is_deprecated: false,
            type_params: Vec::new(),
            enum_constants: Vec::new(),
            fields: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            tags: Vec::new(),
        };
        assert_eq!(element.simple_name(), "Widget");
    }

    #[test]
    fn test_visibility_markers() {
        assert_eq!(Visibility::Public.marker(), '+');
        assert_eq!(Visibility::Protected.marker(), '#');
        assert_eq!(Visibility::Package.marker(), '~');
        assert_eq!(Visibility::Private.marker(), '-');
    }
}
