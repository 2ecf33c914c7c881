//! Render tree nodes for class and package scopes.
//!
//! Nodes are built from the documentable model up front (validating the
//! model in the process) and then written to an [`IndentingWriter`]. The
//! tree is rooted at the diagram; every node knows its children, while the
//! parent is passed down explicitly as a [`ParentScope`] during writing.

use std::collections::HashSet;
use std::path::Path;

use umldoc_config::Config;
use umldoc_links::{ExternalLink, ResolvedLink};
use umldoc_model::{Field, Method, TypeElement, TypeKind};

use crate::RenderError;
use crate::path::relativize;
use crate::writer::IndentingWriter;

/// Identity key of a class-like node: the fully qualified type name.
///
/// Two nodes with the same key are interchangeable regardless of their
/// structural content, which intentionally collapses structurally
/// different renders of the same type in sets and maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(String);

impl TypeKey {
    #[must_use]
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self(qualified_name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TypeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The node a class-like node is written under.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ParentScope<'a> {
    /// Directly under the diagram root.
    DiagramRoot,
    /// Nested inside the named package scope.
    Package(&'a str),
}

/// Shared state threaded through one render pass.
pub(crate) struct RenderContext<'a> {
    pub(crate) config: &'a Config,
    pub(crate) links: &'a [ExternalLink],
    /// Directory of the diagram source file, for relativizing local
    /// cross references.
    pub(crate) diagram_dir: &'a Path,
    /// Fully qualified names of every type written so far.
    pub(crate) encountered: &'a mut HashSet<TypeKey>,
}

/// A field or enum constant line.
#[derive(Debug)]
struct FieldMember {
    name: String,
    type_name: Option<String>,
    is_static: bool,
    marker: char,
}

impl FieldMember {
    fn from_model(field: &Field, owner: &str) -> Result<Self, RenderError> {
        if field.name.trim().is_empty() {
            return Err(RenderError::InvalidModel(format!(
                "field of {owner} has no name"
            )));
        }
        Ok(Self {
            name: field.name.clone(),
            type_name: field.type_name.clone(),
            is_static: field.is_static,
            marker: field.visibility.marker(),
        })
    }

    fn render_line(&self) -> String {
        let mut line = String::new();
        if self.is_static {
            line.push_str("{static} ");
        }
        line.push(self.marker);
        line.push_str(&self.name);
        if let Some(type_name) = &self.type_name {
            line.push_str(": ");
            line.push_str(type_name);
        }
        line
    }
}

/// A method or constructor line.
#[derive(Debug)]
struct MethodMember {
    name: String,
    params: Vec<(String, String)>,
    return_type: Option<String>,
    is_abstract: bool,
    is_static: bool,
    marker: char,
}

impl MethodMember {
    fn from_model(method: &Method, owner: &str) -> Result<Self, RenderError> {
        if method.name.trim().is_empty() {
            return Err(RenderError::InvalidModel(format!(
                "method of {owner} has no name"
            )));
        }
        Ok(Self {
            name: method.name.clone(),
            params: method
                .params
                .iter()
                .map(|p| (p.name.clone(), p.type_name.clone()))
                .collect(),
            return_type: method.return_type.clone(),
            is_abstract: method.is_abstract,
            is_static: method.is_static,
            marker: method.visibility.marker(),
        })
    }

    fn render_line(&self) -> String {
        let mut line = String::new();
        if self.is_static {
            line.push_str("{static} ");
        }
        if self.is_abstract {
            line.push_str("{abstract} ");
        }
        line.push(self.marker);
        line.push_str(&self.name);
        line.push('(');
        let mut sep = "";
        for (name, type_name) in &self.params {
            line.push_str(sep);
            line.push_str(name);
            line.push_str(": ");
            line.push_str(type_name);
            sep = ", ";
        }
        line.push(')');
        if let Some(return_type) = &self.return_type {
            line.push_str(": ");
            line.push_str(return_type);
        }
        line
    }
}

#[derive(Debug)]
enum MemberNode {
    Field(FieldMember),
    Method(MethodMember),
}

impl MemberNode {
    fn render_line(&self) -> String {
        match self {
            MemberNode::Field(field) => field.render_line(),
            MemberNode::Method(method) => method.render_line(),
        }
    }
}

/// A class, interface or enum in the render tree.
///
/// Children are ordered at construction time: enum constants first (in
/// declared order), then static fields, instance fields, constructors,
/// concrete methods, and abstract methods last.
#[derive(Debug)]
pub(crate) struct ClassNode {
    key: TypeKey,
    package: String,
    kind: TypeKind,
    is_abstract: bool,
    is_deprecated: bool,
    type_params: Vec<String>,
    members: Vec<MemberNode>,
    notes: Vec<String>,
}

impl ClassNode {
    /// Build a node from a documented type, validating the model data.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidModel`] for missing names; the whole
    /// render pass fails rather than emitting a partial diagram.
    pub(crate) fn from_element(element: &TypeElement) -> Result<Self, RenderError> {
        if element.qualified_name.trim().is_empty() {
            return Err(RenderError::InvalidModel(
                "type element has no qualified name".to_owned(),
            ));
        }
        let owner = element.qualified_name.as_str();

        let mut members = Vec::new();
        for constant in &element.enum_constants {
            members.push(MemberNode::Field(FieldMember::from_model(constant, owner)?));
        }
        // Static fields come before instance fields.
        let mut instance_fields = Vec::new();
        for field in &element.fields {
            let member = MemberNode::Field(FieldMember::from_model(field, owner)?);
            if field.is_static {
                members.push(member);
            } else {
                instance_fields.push(member);
            }
        }
        members.append(&mut instance_fields);
        for constructor in &element.constructors {
            members.push(MemberNode::Method(MethodMember::from_model(constructor, owner)?));
        }
        // Abstract methods come after concrete methods.
        let mut abstract_methods = Vec::new();
        for method in &element.methods {
            let member = MemberNode::Method(MethodMember::from_model(method, owner)?);
            if method.is_abstract {
                abstract_methods.push(member);
            } else {
                members.push(member);
            }
        }
        members.append(&mut abstract_methods);

        let notes = element
            .tags
            .iter()
            .filter(|tag| tag.name == "note")
            .map(|tag| tag.text.clone())
            .collect();

        Ok(Self {
            key: TypeKey::new(element.qualified_name.clone()),
            package: element.package.clone(),
            kind: element.kind,
            is_abstract: element.is_abstract,
            is_deprecated: element.is_deprecated,
            type_params: element.type_params.clone(),
            members,
            notes,
        })
    }

    pub(crate) fn key(&self) -> &TypeKey {
        &self.key
    }

    fn simple_name(&self) -> &str {
        self.key.as_str().rsplit('.').next().unwrap_or(self.key.as_str())
    }

    /// The UML keyword for this node: `enum`, `interface`,
    /// `abstract class` or `class`.
    fn uml_keyword(&self) -> &'static str {
        match self.kind {
            TypeKind::Enum => "enum",
            TypeKind::Interface => "interface",
            TypeKind::Class if self.is_abstract => "abstract class",
            TypeKind::Class => "class",
        }
    }

    /// The name under which this node is written.
    ///
    /// Directly under the diagram root the fully qualified name is used.
    /// Inside a package scope the `<package>.` prefix is stripped, unless
    /// qualified names are forced by configuration or the name does not
    /// carry the expected prefix.
    fn display_name(&self, parent: ParentScope<'_>, config: &Config) -> String {
        let qualified = self.key.as_str();
        match parent {
            ParentScope::Package(package) if !config.always_qualified_names => {
                let prefix = format!("{package}.");
                qualified
                    .strip_prefix(&prefix)
                    .map_or_else(|| qualified.to_owned(), str::to_owned)
            }
            ParentScope::DiagramRoot | ParentScope::Package(_) => qualified.to_owned(),
        }
    }

    /// Resolve an external cross reference for this type, if any target
    /// claims its package.
    ///
    /// Local targets are relativized against the diagram directory; when
    /// that fails the reference is dropped (no link) rather than failing
    /// the render.
    fn external_reference(&self, ctx: &RenderContext<'_>) -> Option<String> {
        for link in ctx.links {
            match link.resolve_type(&self.package, self.simple_name()) {
                Some(ResolvedLink::Remote(url)) => return Some(url),
                Some(ResolvedLink::Local(path)) => {
                    match relativize(ctx.diagram_dir, &path) {
                        Ok(relative) => return Some(relative),
                        Err(e) => {
                            tracing::warn!(
                                target_type = %self.key,
                                error = %e,
                                "Cannot relativize external reference; omitting link"
                            );
                            return None;
                        }
                    }
                }
                None => {}
            }
        }
        None
    }

    /// Write this node and its trailing notes.
    ///
    /// Writing the name registers the fully qualified name in the
    /// diagram's encountered-types set.
    pub(crate) fn write_to(
        &self,
        ctx: &mut RenderContext<'_>,
        parent: ParentScope<'_>,
        writer: &mut IndentingWriter,
    ) {
        let name = self.display_name(parent, ctx.config);
        ctx.encountered.insert(self.key.clone());

        let mut header = format!("{} {name}", self.uml_keyword());
        if !self.type_params.is_empty() {
            header.push('<');
            header.push_str(&self.type_params.join(", "));
            header.push('>');
        }
        if self.is_deprecated {
            header.push_str(" <<deprecated>>");
        }
        if let Some(reference) = self.external_reference(ctx) {
            header.push_str(&format!(" [[{reference} {}]]", self.simple_name()));
        }
        header.push_str(" {");

        writer.line(&header);
        writer.indent();
        for member in &self.members {
            writer.line(&member.render_line());
        }
        writer.outdent();
        writer.line("}");

        for note in &self.notes {
            writer.blank();
            writer.line(&format!("note bottom of {name}"));
            writer.indent();
            for text_line in note.lines() {
                writer.line(text_line);
            }
            writer.outdent();
            writer.line("end note");
        }
    }
}

impl PartialEq for ClassNode {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ClassNode {}

impl std::hash::Hash for ClassNode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

/// A package scope containing class-like nodes.
#[derive(Debug)]
pub(crate) struct PackageNode {
    name: String,
    classes: Vec<ClassNode>,
}

impl PackageNode {
    pub(crate) fn from_types(
        name: &str,
        types: &[TypeElement],
    ) -> Result<Self, RenderError> {
        if name.trim().is_empty() {
            return Err(RenderError::InvalidModel(
                "package element has no name".to_owned(),
            ));
        }
        let classes = types
            .iter()
            .map(ClassNode::from_element)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: name.to_owned(),
            classes,
        })
    }

    pub(crate) fn write_to(&self, ctx: &mut RenderContext<'_>, writer: &mut IndentingWriter) {
        writer.line(&format!("package {} {{", self.name));
        writer.indent();
        for class in &self.classes {
            writer.blank();
            class.write_to(ctx, ParentScope::Package(&self.name), writer);
        }
        writer.outdent();
        writer.blank();
        writer.line("}");
    }
}
