//! Declarative configuration document model and rendering.
//!
//! A configuration document is an ordered list of `data`/`resource` blocks
//! that the external orchestration engine consumes as text. Rendering is
//! plain substitution: builders validate their inputs up front so a
//! malformed document is rejected before anything reaches the engine.

use thiserror::Error;

/// Errors raised while building configuration blocks.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum DocumentError {
    /// Raised when a required field is missing or empty.
    #[error("missing or empty field: {0}")]
    EmptyField(String),
    /// Raised when an image query specifies no selection field at all.
    #[error(
        "image query needs at least one selector (name, name_regex, os_version, visibility, or tag)"
    )]
    MissingSelector,
    /// Raised when a tag filter is not of the form `key=value`.
    #[error("tag filter '{0}' must be of the form key=value")]
    InvalidTagFilter(String),
}

/// Attribute value rendered on the right-hand side of `key = value`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AttrValue {
    /// Quoted string literal.
    Str(String),
    /// Bare boolean literal.
    Bool(bool),
    /// Bare integer literal.
    Int(i64),
    /// Unquoted expression, used for references to other blocks
    /// (for example `cumulus_compute_instance.test.id`).
    Ref(String),
    /// List of quoted strings (`["default"]`).
    List(Vec<String>),
    /// Inline map assignment (`key = { ... }`), used for tag maps.
    Map(Vec<(String, String)>),
}

impl AttrValue {
    fn render(&self, indent: &str, out: &mut String) {
        match self {
            Self::Str(value) => {
                out.push('"');
                out.push_str(&escape(value));
                out.push('"');
            }
            Self::Bool(value) => out.push_str(if *value { "true" } else { "false" }),
            Self::Int(value) => out.push_str(&value.to_string()),
            Self::Ref(expr) => out.push_str(expr),
            Self::List(items) => {
                out.push('[');
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        out.push_str(", ");
                    }
                    out.push('"');
                    out.push_str(&escape(item));
                    out.push('"');
                }
                out.push(']');
            }
            Self::Map(entries) => {
                out.push_str("{\n");
                let width = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
                for (key, value) in entries {
                    out.push_str(&format!(
                        "{indent}  {key:<width$} = \"{}\"\n",
                        escape(value)
                    ));
                }
                out.push_str(indent);
                out.push('}');
            }
        }
    }
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Whether a block describes a data source lookup or a managed resource.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BlockKind {
    /// A read-only lookup (`data "..." "..."`).
    Data,
    /// A managed resource (`resource "..." "..."`).
    Resource,
}

impl BlockKind {
    const fn keyword(self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Resource => "resource",
        }
    }
}

/// A single `data` or `resource` block.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Block {
    kind: BlockKind,
    type_name: String,
    label: String,
    attrs: Vec<(String, AttrValue)>,
    nested: Vec<(String, Vec<(String, AttrValue)>)>,
}

impl Block {
    /// Starts an empty block of the given kind.
    #[must_use]
    pub fn new(kind: BlockKind, type_name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind,
            type_name: type_name.into(),
            label: label.into(),
            attrs: Vec::new(),
            nested: Vec::new(),
        }
    }

    /// Appends a top-level attribute.
    #[must_use]
    pub fn attr(mut self, key: impl Into<String>, value: AttrValue) -> Self {
        self.attrs.push((key.into(), value));
        self
    }

    /// Appends a quoted string attribute.
    #[must_use]
    pub fn attr_str(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attr(key, AttrValue::Str(value.into()))
    }

    /// Appends a nested sub-block (for example `network { ... }`).
    #[must_use]
    pub fn nested(mut self, name: impl Into<String>, attrs: Vec<(String, AttrValue)>) -> Self {
        self.nested.push((name.into(), attrs));
        self
    }

    /// Address of this block in the resulting state record.
    ///
    /// Data sources are addressed as `data.<type>.<label>`, managed
    /// resources as `<type>.<label>`.
    #[must_use]
    pub fn address(&self) -> String {
        match self.kind {
            BlockKind::Data => format!("data.{}.{}", self.type_name, self.label),
            BlockKind::Resource => format!("{}.{}", self.type_name, self.label),
        }
    }

    /// Reference expression for an attribute of this block, usable from
    /// other blocks in the same document.
    #[must_use]
    pub fn reference(&self, attribute: &str) -> String {
        format!("{}.{attribute}", self.address())
    }

    fn render(&self, out: &mut String) {
        out.push_str(&format!(
            "{} \"{}\" \"{}\" {{\n",
            self.kind.keyword(),
            self.type_name,
            self.label
        ));
        let width = self
            .attrs
            .iter()
            .map(|(key, _)| key.len())
            .max()
            .unwrap_or(0);
        for (key, value) in &self.attrs {
            out.push_str(&format!("  {key:<width$} = "));
            value.render("  ", out);
            out.push('\n');
        }
        for (name, attrs) in &self.nested {
            out.push_str(&format!("\n  {name} {{\n"));
            let nested_width = attrs.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
            for (key, value) in attrs {
                out.push_str(&format!("    {key:<nested_width$} = "));
                value.render("    ", out);
                out.push('\n');
            }
            out.push_str("  }\n");
        }
        out.push_str("}\n");
    }
}

/// An ordered collection of blocks forming one configuration document.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub const fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    /// Appends a block, returning the document for chaining.
    #[must_use]
    pub fn with(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    /// Appends a block in place.
    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Appends every block of another document.
    pub fn extend(&mut self, other: Self) {
        self.blocks.extend(other.blocks);
    }

    /// Returns `true` when the document holds no blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Renders the document as configuration text, one blank line between
    /// blocks.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (index, block) in self.blocks.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            block.render(&mut out);
        }
        out
    }
}
